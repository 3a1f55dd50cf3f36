//! Transaction - Draft or enriched transfer intent
//!
//! Common fields (`amount`, `recipient`) plus one family payload. Fee fields
//! are `Option<Amount>` with three meaningful states, see [`FeeState`].
//! Derived fields (`network_info`, `estimated_fees`, `estimated_gas_limit`)
//! are owned by `prepare_transaction`; clients set the rest.

mod raw;
mod status;

pub use raw::{from_transaction_raw, to_transaction_raw, FeeLevelsRaw, TransactionRaw};
pub use status::TransactionStatus;

use crate::amount::Amount;
use crate::currency::CurrencyFamily;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub amount: Amount,
    /// Empty string means unset
    pub recipient: String,
    pub family: FamilyTransaction,
}

impl Transaction {
    pub fn with_amount(mut self, amount: impl Into<Amount>) -> Self { self.amount = amount.into(); self }
    pub fn with_recipient(mut self, recipient: impl Into<String>) -> Self { self.recipient = recipient.into(); self }

    pub fn family_kind(&self) -> CurrencyFamily { self.family.kind() }

    /// Override the user fee: fee per byte, gas price or ripple fee.
    pub fn with_fee(mut self, fee: Option<Amount>) -> Self {
        match &mut self.family {
            FamilyTransaction::Bitcoin(t) => t.fee_per_byte = fee,
            FamilyTransaction::Ethereum(t) => t.gas_price = fee,
            FamilyTransaction::Ripple(t) => t.fee = fee,
        }
        self
    }

    /// The user-facing fee field, whatever the family calls it.
    pub fn fee(&self) -> Option<&Amount> {
        match &self.family {
            FamilyTransaction::Bitcoin(t) => t.fee_per_byte.as_ref(),
            FamilyTransaction::Ethereum(t) => t.gas_price.as_ref(),
            FamilyTransaction::Ripple(t) => t.fee.as_ref(),
        }
    }

    pub fn fee_state(&self) -> FeeState { FeeState::of(self.fee()) }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FamilyTransaction {
    Bitcoin(BitcoinTransaction),
    Ethereum(EthereumTransaction),
    Ripple(RippleTransaction),
}

impl FamilyTransaction {
    pub fn kind(&self) -> CurrencyFamily {
        match self {
            FamilyTransaction::Bitcoin(_) => CurrencyFamily::Bitcoin,
            FamilyTransaction::Ethereum(_) => CurrencyFamily::Ethereum,
            FamilyTransaction::Ripple(_) => CurrencyFamily::Ripple,
        }
    }
}

/// Unset (not loaded yet), explicit zero, or positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeState { Unset, Zero, Positive }

impl FeeState {
    pub fn of(fee: Option<&Amount>) -> Self {
        match fee {
            None => FeeState::Unset,
            Some(f) if f.is_zero() => FeeState::Zero,
            Some(_) => FeeState::Positive,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UtxoStrategy {
    /// Oldest confirmed outputs first
    #[default]
    DeepOutputsFirst,
    /// Largest outputs first, fewest inputs
    OptimizeSize,
    /// Smallest outputs first, consolidates dust
    MergeOutputs,
}

/// Fee market snapshot: per-byte on bitcoin, gas price on ethereum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeLevels {
    pub slow: Amount,
    pub standard: Amount,
    pub fast: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RippleNetworkInfo {
    pub server_fee: Amount,
    pub base_reserve: Amount,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitcoinTransaction {
    pub fee_per_byte: Option<Amount>,
    pub utxo_strategy: UtxoStrategy,
    pub network_info: Option<FeeLevels>,
    /// Total fee of the selected inputs, `None` when selection failed
    pub estimated_fees: Option<Amount>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EthereumTransaction {
    pub gas_price: Option<Amount>,
    pub user_gas_limit: Option<Amount>,
    pub estimated_gas_limit: Option<Amount>,
    pub network_info: Option<FeeLevels>,
}

impl EthereumTransaction {
    pub fn gas_limit(&self) -> Option<&Amount> {
        self.user_gas_limit.as_ref().or(self.estimated_gas_limit.as_ref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RippleTransaction {
    pub fee: Option<Amount>,
    pub tag: Option<u32>,
    pub network_info: Option<RippleNetworkInfo>,
}

//! Raw transaction - flat serde form of [`Transaction`]

use super::{
    BitcoinTransaction, EthereumTransaction, FamilyTransaction, FeeLevels, RippleNetworkInfo,
    RippleTransaction, Transaction, UtxoStrategy,
};
use crate::account::raw::parse_amount;
use crate::amount::Amount;
use crate::currency::CurrencyFamily;
use crate::error::{BridgeError, BridgeResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRaw {
    pub family: CurrencyFamily,
    pub amount: String,
    pub recipient: String,
    // bitcoin
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_per_byte: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utxo_strategy: Option<UtxoStrategy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_fees: Option<String>,
    // ethereum
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_gas_limit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_gas_limit: Option<String>,
    // bitcoin + ethereum
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_levels: Option<FeeLevelsRaw>,
    // ripple
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_fee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_reserve: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeLevelsRaw {
    pub slow: String,
    pub standard: String,
    pub fast: String,
}

impl TransactionRaw {
    fn empty(family: CurrencyFamily, amount: String, recipient: String) -> Self {
        Self {
            family, amount, recipient,
            fee_per_byte: None, utxo_strategy: None, estimated_fees: None,
            gas_price: None, user_gas_limit: None, estimated_gas_limit: None,
            fee_levels: None,
            fee: None, tag: None, server_fee: None, base_reserve: None,
        }
    }
}

pub fn to_transaction_raw(tx: &Transaction) -> TransactionRaw {
    let mut raw = TransactionRaw::empty(tx.family_kind(), tx.amount.to_string(), tx.recipient.clone());
    let s = |a: &Option<Amount>| a.as_ref().map(Amount::to_string);
    match &tx.family {
        FamilyTransaction::Bitcoin(t) => {
            raw.fee_per_byte = s(&t.fee_per_byte);
            raw.utxo_strategy = Some(t.utxo_strategy);
            raw.estimated_fees = s(&t.estimated_fees);
            raw.fee_levels = t.network_info.as_ref().map(to_levels_raw);
        }
        FamilyTransaction::Ethereum(t) => {
            raw.gas_price = s(&t.gas_price);
            raw.user_gas_limit = s(&t.user_gas_limit);
            raw.estimated_gas_limit = s(&t.estimated_gas_limit);
            raw.fee_levels = t.network_info.as_ref().map(to_levels_raw);
        }
        FamilyTransaction::Ripple(t) => {
            raw.fee = s(&t.fee);
            raw.tag = t.tag;
            if let Some(info) = &t.network_info {
                raw.server_fee = Some(info.server_fee.to_string());
                raw.base_reserve = Some(info.base_reserve.to_string());
            }
        }
    }
    raw
}

pub fn from_transaction_raw(raw: &TransactionRaw) -> BridgeResult<Transaction> {
    let opt = |field: &str, v: &Option<String>| v.as_deref().map(|s| parse_amount(field, s)).transpose();
    let family = match raw.family {
        CurrencyFamily::Bitcoin => FamilyTransaction::Bitcoin(BitcoinTransaction {
            fee_per_byte: opt("fee_per_byte", &raw.fee_per_byte)?,
            utxo_strategy: raw.utxo_strategy.unwrap_or_default(),
            network_info: raw.fee_levels.as_ref().map(from_levels_raw).transpose()?,
            estimated_fees: opt("estimated_fees", &raw.estimated_fees)?,
        }),
        CurrencyFamily::Ethereum => FamilyTransaction::Ethereum(EthereumTransaction {
            gas_price: opt("gas_price", &raw.gas_price)?,
            user_gas_limit: opt("user_gas_limit", &raw.user_gas_limit)?,
            estimated_gas_limit: opt("estimated_gas_limit", &raw.estimated_gas_limit)?,
            network_info: raw.fee_levels.as_ref().map(from_levels_raw).transpose()?,
        }),
        CurrencyFamily::Ripple => FamilyTransaction::Ripple(RippleTransaction {
            fee: opt("fee", &raw.fee)?,
            tag: raw.tag,
            network_info: match (&raw.server_fee, &raw.base_reserve) {
                (Some(fee), Some(reserve)) => Some(RippleNetworkInfo {
                    server_fee: parse_amount("server_fee", fee)?,
                    base_reserve: parse_amount("base_reserve", reserve)?,
                }),
                (None, None) => None,
                _ => return Err(BridgeError::raw("server_fee and base_reserve go together")),
            },
        }),
    };
    Ok(Transaction { amount: parse_amount("amount", &raw.amount)?, recipient: raw.recipient.clone(), family })
}

fn to_levels_raw(levels: &FeeLevels) -> FeeLevelsRaw {
    FeeLevelsRaw { slow: levels.slow.to_string(), standard: levels.standard.to_string(), fast: levels.fast.to_string() }
}

fn from_levels_raw(raw: &FeeLevelsRaw) -> BridgeResult<FeeLevels> {
    Ok(FeeLevels {
        slow: parse_amount("fee_levels.slow", &raw.slow)?,
        standard: parse_amount("fee_levels.standard", &raw.standard)?,
        fast: parse_amount("fee_levels.fast", &raw.fast)?,
    })
}

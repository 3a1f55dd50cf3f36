//! Account - Synced view of one wallet on one currency
//!
//! Accounts are values. Only a sync patch produces a new one; builders and
//! validators only read them.

pub mod id;
pub(crate) mod raw;

pub use id::{decode_account_id, encode_account_id, switch_account_bridge, AccountIdentity};
pub use raw::{from_account_raw, to_account_raw, AccountRaw, OperationRaw, ResourcesRaw, UtxoRaw};

use crate::amount::Amount;
use crate::currency::{Currency, CurrencyFamily};
use crate::error::BridgeResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: String,
    pub currency: &'static Currency,
    /// Next unused receive address
    pub fresh_address: String,
    pub fresh_address_path: String,
    pub balance: Amount,
    /// Sync cursor: last seen block height (ledger index on ripple)
    pub block_height: u64,
    /// Newest first
    pub operations: Vec<Operation>,
    pub last_sync_date: Option<DateTime<Utc>>,
    pub resources: AccountResources,
}

impl Account {
    pub fn identity(&self) -> BridgeResult<AccountIdentity> { decode_account_id(&self.id) }

    pub fn family(&self) -> CurrencyFamily { self.currency.family }

    /// Same account bound to another bridge variant.
    pub fn switch_bridge(&self, type_: &str, version: &str) -> BridgeResult<Account> {
        Ok(Account { id: switch_account_bridge(&self.id, type_, version)?, ..self.clone() })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountResources {
    Bitcoin { utxos: Vec<Utxo> },
    Ethereum { nonce: u64 },
    Ripple { sequence: u32, reserve: Amount },
}

impl AccountResources {
    pub fn empty(family: CurrencyFamily) -> Self {
        match family {
            CurrencyFamily::Bitcoin => AccountResources::Bitcoin { utxos: Vec::new() },
            CurrencyFamily::Ethereum => AccountResources::Ethereum { nonce: 0 },
            CurrencyFamily::Ripple => AccountResources::Ripple { sequence: 0, reserve: Amount::zero() },
        }
    }

    pub fn family(&self) -> CurrencyFamily {
        match self {
            AccountResources::Bitcoin { .. } => CurrencyFamily::Bitcoin,
            AccountResources::Ethereum { .. } => CurrencyFamily::Ethereum,
            AccountResources::Ripple { .. } => CurrencyFamily::Ripple,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Utxo {
    pub txid: String,
    pub vout: u32,
    pub value: Amount,
    /// `None` while unconfirmed
    pub block_height: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OperationType { In, Out, Fees }

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self { OperationType::In => "IN", OperationType::Out => "OUT", OperationType::Fees => "FEES" }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub id: String,
    pub hash: String,
    pub type_: OperationType,
    pub value: Amount,
    pub fee: Amount,
    pub block_height: Option<u64>,
    pub date: DateTime<Utc>,
    pub senders: Vec<String>,
    pub recipients: Vec<String>,
}

impl Operation {
    pub fn make_id(account_id: &str, hash: &str, type_: OperationType) -> String {
        format!("{}-{}-{}", account_id, hash, type_.as_str())
    }
}

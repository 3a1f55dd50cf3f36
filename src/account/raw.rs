//! Raw account snapshot - flat, serde friendly, lossless
//!
//! Amounts are decimal strings, dates RFC 3339 with nanoseconds, family
//! resources flattened into optional fields.

use super::{Account, AccountResources, Operation, OperationType, Utxo};
use crate::amount::Amount;
use crate::currency::{find_currency, CurrencyFamily};
use crate::error::{BridgeError, BridgeResult};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRaw {
    pub id: String,
    pub currency_id: String,
    pub fresh_address: String,
    pub fresh_address_path: String,
    pub balance: String,
    pub block_height: u64,
    #[serde(default)]
    pub operations: Vec<OperationRaw>,
    #[serde(default)]
    pub last_sync_date: Option<String>,
    #[serde(flatten)]
    pub resources: ResourcesRaw,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcesRaw {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utxos: Option<Vec<UtxoRaw>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reserve: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtxoRaw {
    pub txid: String,
    pub vout: u32,
    pub value: String,
    pub block_height: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationRaw {
    pub id: String,
    pub hash: String,
    #[serde(rename = "type")]
    pub type_: OperationType,
    pub value: String,
    pub fee: String,
    pub block_height: Option<u64>,
    pub date: String,
    pub senders: Vec<String>,
    pub recipients: Vec<String>,
}

pub fn to_account_raw(account: &Account) -> AccountRaw {
    let resources = match &account.resources {
        AccountResources::Bitcoin { utxos } => ResourcesRaw {
            utxos: Some(utxos.iter().map(|u| UtxoRaw {
                txid: u.txid.clone(),
                vout: u.vout,
                value: u.value.to_string(),
                block_height: u.block_height,
            }).collect()),
            ..Default::default()
        },
        AccountResources::Ethereum { nonce } => ResourcesRaw { nonce: Some(*nonce), ..Default::default() },
        AccountResources::Ripple { sequence, reserve } => ResourcesRaw {
            sequence: Some(*sequence),
            reserve: Some(reserve.to_string()),
            ..Default::default()
        },
    };
    AccountRaw {
        id: account.id.clone(),
        currency_id: account.currency.id.to_string(),
        fresh_address: account.fresh_address.clone(),
        fresh_address_path: account.fresh_address_path.clone(),
        balance: account.balance.to_string(),
        block_height: account.block_height,
        operations: account.operations.iter().map(to_operation_raw).collect(),
        last_sync_date: account.last_sync_date.as_ref().map(format_date),
        resources,
    }
}

pub fn from_account_raw(raw: &AccountRaw) -> BridgeResult<Account> {
    let currency = find_currency(&raw.currency_id)
        .ok_or_else(|| BridgeError::raw(format!("unknown currency '{}'", raw.currency_id)))?;
    let r = &raw.resources;
    let resources = match currency.family {
        CurrencyFamily::Bitcoin => AccountResources::Bitcoin {
            utxos: r.utxos.as_deref().unwrap_or_default().iter().map(|u| -> BridgeResult<Utxo> {
                Ok(Utxo {
                    txid: u.txid.clone(),
                    vout: u.vout,
                    value: parse_amount("utxo value", &u.value)?,
                    block_height: u.block_height,
                })
            }).collect::<BridgeResult<Vec<_>>>()?,
        },
        CurrencyFamily::Ethereum => AccountResources::Ethereum { nonce: r.nonce.unwrap_or(0) },
        CurrencyFamily::Ripple => AccountResources::Ripple {
            sequence: r.sequence.unwrap_or(0),
            reserve: r.reserve.as_deref().map(|s| parse_amount("reserve", s)).transpose()?.unwrap_or_default(),
        },
    };
    Ok(Account {
        id: raw.id.clone(),
        currency,
        fresh_address: raw.fresh_address.clone(),
        fresh_address_path: raw.fresh_address_path.clone(),
        balance: parse_amount("balance", &raw.balance)?,
        block_height: raw.block_height,
        operations: raw.operations.iter().map(from_operation_raw).collect::<BridgeResult<_>>()?,
        last_sync_date: raw.last_sync_date.as_deref().map(parse_date).transpose()?,
        resources,
    })
}

fn to_operation_raw(op: &Operation) -> OperationRaw {
    OperationRaw {
        id: op.id.clone(),
        hash: op.hash.clone(),
        type_: op.type_,
        value: op.value.to_string(),
        fee: op.fee.to_string(),
        block_height: op.block_height,
        date: format_date(&op.date),
        senders: op.senders.clone(),
        recipients: op.recipients.clone(),
    }
}

fn from_operation_raw(raw: &OperationRaw) -> BridgeResult<Operation> {
    Ok(Operation {
        id: raw.id.clone(),
        hash: raw.hash.clone(),
        type_: raw.type_,
        value: parse_amount("operation value", &raw.value)?,
        fee: parse_amount("operation fee", &raw.fee)?,
        block_height: raw.block_height,
        date: parse_date(&raw.date)?,
        senders: raw.senders.clone(),
        recipients: raw.recipients.clone(),
    })
}

pub(crate) fn parse_amount(field: &str, value: &str) -> BridgeResult<Amount> {
    Amount::from_str(value).map_err(|e| BridgeError::raw(format!("{}: {}", field, e)))
}

fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_date(value: &str) -> BridgeResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| BridgeError::raw(format!("date '{}': {}", value, e)))
}

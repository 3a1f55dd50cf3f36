//! Errors surfaced by bridges.
//!
//! Two families:
//!
//! - [`BridgeError`] fails a call: configuration problems (`UnsupportedBridge`,
//!   `MalformedIdentity`) fail fast at resolution, `Network` fails a sync or a
//!   fee lookup and leaves every value untouched.
//! - [`StatusError`] / [`StatusWarning`] are data inside a
//!   [`TransactionStatus`](crate::transaction::TransactionStatus). The validator
//!   never returns them as `Err`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Comparable error kind, so callers can switch without matching payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidAddress,
    FeeNotLoaded,
    FeeRequired,
    NotEnoughBalance,
    UnsupportedBridge,
    MalformedIdentity,
    NetworkError,
    InvalidRaw,
    Config,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error("no bridge registered for {currency} ({type_} v{version})")]
    UnsupportedBridge {
        currency: String,
        type_: String,
        version: String,
    },

    #[error("malformed account id '{id}': {reason}")]
    MalformedIdentity { id: String, reason: String },

    #[error("network: {0}")]
    Network(String),

    #[error("invalid raw snapshot: {0}")]
    InvalidRaw(String),

    #[error("config: {0}")]
    Config(String),
}

impl BridgeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BridgeError::UnsupportedBridge { .. } => ErrorKind::UnsupportedBridge,
            BridgeError::MalformedIdentity { .. } => ErrorKind::MalformedIdentity,
            BridgeError::Network(_) => ErrorKind::NetworkError,
            BridgeError::InvalidRaw(_) => ErrorKind::InvalidRaw,
            BridgeError::Config(_) => ErrorKind::Config,
        }
    }

    pub(crate) fn malformed(id: &str, reason: impl Into<String>) -> Self {
        BridgeError::MalformedIdentity { id: id.to_string(), reason: reason.into() }
    }

    pub(crate) fn raw(reason: impl Into<String>) -> Self {
        BridgeError::InvalidRaw(reason.into())
    }
}

pub type BridgeResult<T> = Result<T, BridgeError>;

/// Validation errors reported in a transaction status.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StatusError {
    #[error("invalid recipient address")]
    InvalidAddress,

    #[error("recipient is the sending account")]
    InvalidAddressBecauseDestinationIsAlsoSource,

    #[error("fees are not loaded")]
    FeeNotLoaded,

    #[error("a positive fee is required")]
    FeeRequired,

    #[error("not enough balance")]
    NotEnoughBalance,

    #[error("transaction family {found} does not match account family {expected}")]
    InvalidTransactionFamily { expected: String, found: String },
}

impl StatusError {
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            StatusError::InvalidAddress
            | StatusError::InvalidAddressBecauseDestinationIsAlsoSource => Some(ErrorKind::InvalidAddress),
            StatusError::FeeNotLoaded => Some(ErrorKind::FeeNotLoaded),
            StatusError::FeeRequired => Some(ErrorKind::FeeRequired),
            StatusError::NotEnoughBalance => Some(ErrorKind::NotEnoughBalance),
            StatusError::InvalidTransactionFamily { .. } => None,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StatusWarning {
    #[error("fee is above {percent}% of the amount")]
    FeeTooHigh { percent: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_are_comparable() {
        let err = BridgeError::Network("timeout".into());
        assert_eq!(err.kind(), ErrorKind::NetworkError);
        assert_ne!(err.kind(), ErrorKind::UnsupportedBridge);
        assert_eq!(StatusError::InvalidAddressBecauseDestinationIsAlsoSource.kind(), Some(ErrorKind::InvalidAddress));
    }

    #[test]
    fn test_status_error_serializes_as_kind() {
        let json = serde_json::to_value(StatusError::FeeRequired).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "fee_required"}));
        let back: StatusError = serde_json::from_value(json).unwrap();
        assert_eq!(back, StatusError::FeeRequired);
    }
}

//! TransactionStatus - What the validator found
//!
//! Both error slots are always present. `None` serializes as `null` and means
//! "currently valid" for that slot.

use super::FeeState;
use crate::amount::Amount;
use crate::currency::CurrencyFamily;
use crate::error::{StatusError, StatusWarning};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionStatus {
    pub recipient_error: Option<StatusError>,
    pub transaction_error: Option<StatusError>,
    #[serde(default)]
    pub warnings: BTreeMap<String, StatusWarning>,
    pub estimated_fees: Amount,
    pub total_spent: Amount,
}

impl TransactionStatus {
    pub fn is_valid(&self) -> bool { self.recipient_error.is_none() && self.transaction_error.is_none() }

    pub(crate) fn warn(&mut self, name: &str, warning: StatusWarning) {
        self.warnings.insert(name.to_string(), warning);
    }

    /// Status for a transaction built for another family than the account.
    pub(crate) fn wrong_family(recipient_error: Option<StatusError>, expected: CurrencyFamily, found: CurrencyFamily) -> Self {
        Self {
            recipient_error,
            transaction_error: Some(StatusError::InvalidTransactionFamily { expected: expected.to_string(), found: found.to_string() }),
            ..Self::default()
        }
    }

    pub(crate) fn fee_error(state: FeeState) -> Option<StatusError> {
        match state {
            FeeState::Unset => Some(StatusError::FeeNotLoaded),
            FeeState::Zero => Some(StatusError::FeeRequired),
            FeeState::Positive => None,
        }
    }

    /// Fill `estimated_fees` and `total_spent`, warn when fees exceed
    /// `too_high_percent` of a non-zero amount.
    pub(crate) fn with_fees(mut self, amount: &Amount, fees: Amount, too_high_percent: u32) -> Self {
        if !amount.is_zero() && fees > amount.percent(too_high_percent) {
            self.warn("fee", StatusWarning::FeeTooHigh { percent: too_high_percent });
        }
        self.total_spent = amount + &fees;
        self.estimated_fees = fees;
        self
    }
}

//! Ripple bridge - flat fee in drops, balance locked under a reserve

pub mod address;

use crate::account::{Account, AccountResources};
use crate::amount::Amount;
use crate::bridge::{settle, unexpected_network_info, AccountBridge, BridgeContext, SyncPlan, SyncStream};
use crate::chain::NetworkInfo;
use crate::currency::CurrencyFamily;
use crate::error::{BridgeResult, StatusError};
use crate::transaction::{FamilyTransaction, RippleTransaction, Transaction, TransactionStatus};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct RippleBridge {
    context: BridgeContext,
}

/// First `node` revision that resumes from the stored ledger index.
pub const LEDGER_INDEX_RESYNC_VERSION: u32 = 2;

impl RippleBridge {
    pub fn new(context: BridgeContext) -> Self { Self { context } }
    pub fn context(&self) -> &BridgeContext { &self.context }

    fn sync_plan(&self) -> SyncPlan {
        if self.context.type_() == "node" && self.context.version() < LEDGER_INDEX_RESYNC_VERSION {
            SyncPlan::full_history()
        } else {
            SyncPlan::incremental()
        }
    }
}

fn recipient_error(account: &Account, recipient: &str) -> Option<StatusError> {
    if !address::is_valid_address(recipient) {
        Some(StatusError::InvalidAddress)
    } else if recipient == account.fresh_address {
        Some(StatusError::InvalidAddressBecauseDestinationIsAlsoSource)
    } else {
        None
    }
}

/// Synced account reserve, else the network base reserve once known.
fn reserve(account: &Account, xrp: &RippleTransaction) -> Amount {
    match &account.resources {
        AccountResources::Ripple { reserve, .. } if !reserve.is_zero() => reserve.clone(),
        _ => xrp.network_info.as_ref().map(|info| info.base_reserve.clone()).unwrap_or_default(),
    }
}

#[async_trait]
impl AccountBridge for RippleBridge {
    fn family(&self) -> CurrencyFamily { CurrencyFamily::Ripple }

    fn start_sync(&self, account: &Account, should_clear_cache: bool) -> SyncStream {
        self.context.sync_stream(account, should_clear_cache, self.sync_plan())
    }

    fn create_transaction(&self, _account: &Account) -> Transaction {
        Transaction {
            amount: Amount::zero(),
            recipient: String::new(),
            family: FamilyTransaction::Ripple(RippleTransaction::default()),
        }
    }

    async fn prepare_transaction(&self, account: &Account, transaction: &Arc<Transaction>) -> BridgeResult<Arc<Transaction>> {
        let FamilyTransaction::Ripple(xrp) = &transaction.family else { return Ok(Arc::clone(transaction)) };

        let network_info = match &xrp.network_info {
            Some(info) => info.clone(),
            None => match self.context.network_info(account.currency).await? {
                NetworkInfo::Ripple(info) => info,
                other => return Err(unexpected_network_info(&other, CurrencyFamily::Ripple)),
            },
        };
        let fee = xrp.fee.clone().unwrap_or_else(|| network_info.server_fee.clone());
        debug!(account = %account.id, fee = %fee, "prepared");

        let candidate = Transaction {
            family: FamilyTransaction::Ripple(RippleTransaction { fee: Some(fee), network_info: Some(network_info), ..xrp.clone() }),
            ..(**transaction).clone()
        };
        Ok(settle(transaction, candidate))
    }

    fn get_transaction_status(&self, account: &Account, transaction: &Transaction) -> TransactionStatus {
        let recipient_error = recipient_error(account, &transaction.recipient);
        let FamilyTransaction::Ripple(xrp) = &transaction.family else {
            return TransactionStatus::wrong_family(recipient_error, CurrencyFamily::Ripple, transaction.family_kind());
        };

        let fee_error = TransactionStatus::fee_error(transaction.fee_state());
        let fees = xrp.fee.clone().unwrap_or_default();
        let spendable = account.balance.saturating_sub(&reserve(account, xrp));
        let balance_error = (!transaction.amount.is_zero() && &transaction.amount + &fees > spendable)
            .then_some(StatusError::NotEnoughBalance);

        TransactionStatus { recipient_error, transaction_error: fee_error.or(balance_error), ..TransactionStatus::default() }
            .with_fees(&transaction.amount, fees, self.context.config().fee_too_high_percent)
    }
}

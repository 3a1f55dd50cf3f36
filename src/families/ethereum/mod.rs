//! Ethereum bridge - account model, `gas_price × gas_limit` fees

pub mod address;

use crate::account::Account;
use crate::amount::Amount;
use crate::bridge::{settle, unexpected_network_info, AccountBridge, BridgeContext, SyncPlan, SyncStream};
use crate::chain::NetworkInfo;
use crate::currency::CurrencyFamily;
use crate::error::{BridgeResult, StatusError};
use crate::transaction::{EthereumTransaction, FamilyTransaction, Transaction, TransactionStatus};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Gas used by a plain value transfer.
pub const TRANSFER_GAS_LIMIT: u64 = 21_000;

#[derive(Debug, Clone)]
pub struct EthereumBridge {
    context: BridgeContext,
}

impl EthereumBridge {
    pub fn new(context: BridgeContext) -> Self { Self { context } }
    pub fn context(&self) -> &BridgeContext { &self.context }
}

fn recipient_error(account: &Account, recipient: &str) -> Option<StatusError> {
    if !address::is_valid_address(recipient) {
        Some(StatusError::InvalidAddress)
    } else if address::same_address(recipient, &account.fresh_address) {
        Some(StatusError::InvalidAddressBecauseDestinationIsAlsoSource)
    } else {
        None
    }
}

fn max_fees(eth: &EthereumTransaction) -> Amount {
    let gas_limit = eth.gas_limit().cloned().unwrap_or_else(|| Amount::from(TRANSFER_GAS_LIMIT));
    match &eth.gas_price {
        Some(price) => price * &gas_limit,
        None => Amount::zero(),
    }
}

#[async_trait]
impl AccountBridge for EthereumBridge {
    fn family(&self) -> CurrencyFamily { CurrencyFamily::Ethereum }

    fn start_sync(&self, account: &Account, should_clear_cache: bool) -> SyncStream {
        self.context.sync_stream(account, should_clear_cache, SyncPlan::incremental())
    }

    fn create_transaction(&self, _account: &Account) -> Transaction {
        Transaction {
            amount: Amount::zero(),
            recipient: String::new(),
            family: FamilyTransaction::Ethereum(EthereumTransaction::default()),
        }
    }

    async fn prepare_transaction(&self, account: &Account, transaction: &Arc<Transaction>) -> BridgeResult<Arc<Transaction>> {
        let FamilyTransaction::Ethereum(eth) = &transaction.family else { return Ok(Arc::clone(transaction)) };

        let network_info = match &eth.network_info {
            Some(levels) => levels.clone(),
            None => match self.context.network_info(account.currency).await? {
                NetworkInfo::Ethereum(levels) => levels,
                other => return Err(unexpected_network_info(&other, CurrencyFamily::Ethereum)),
            },
        };
        let gas_price = eth.gas_price.clone().unwrap_or_else(|| network_info.standard.clone());
        debug!(account = %account.id, gas_price = %gas_price, "prepared");

        let candidate = Transaction {
            family: FamilyTransaction::Ethereum(EthereumTransaction {
                gas_price: Some(gas_price),
                estimated_gas_limit: Some(Amount::from(TRANSFER_GAS_LIMIT)),
                network_info: Some(network_info),
                ..eth.clone()
            }),
            ..(**transaction).clone()
        };
        Ok(settle(transaction, candidate))
    }

    fn get_transaction_status(&self, account: &Account, transaction: &Transaction) -> TransactionStatus {
        let recipient_error = recipient_error(account, &transaction.recipient);
        let FamilyTransaction::Ethereum(eth) = &transaction.family else {
            return TransactionStatus::wrong_family(recipient_error, CurrencyFamily::Ethereum, transaction.family_kind());
        };

        let fee_error = TransactionStatus::fee_error(transaction.fee_state());
        let fees = max_fees(eth);
        let balance_error = (!transaction.amount.is_zero() && &transaction.amount + &fees > account.balance)
            .then_some(StatusError::NotEnoughBalance);

        TransactionStatus { recipient_error, transaction_error: fee_error.or(balance_error), ..TransactionStatus::default() }
            .with_fees(&transaction.amount, fees, self.context.config().fee_too_high_percent)
    }
}

//! Bitcoin bridge - UTXO accounts priced per byte
//!
//! Fees depend on which outputs get spent, so `prepare_transaction` runs a
//! UTXO selection and stores its fee in `estimated_fees`. The validator runs
//! the same selection to decide `NotEnoughBalance`.

pub mod address;
pub mod utxo;

use crate::account::{Account, AccountResources, Utxo};
use crate::amount::Amount;
use crate::bridge::{settle, unexpected_network_info, AccountBridge, BridgeContext, SyncPlan, SyncStream};
use crate::chain::{ChainSnapshot, NetworkInfo};
use crate::currency::CurrencyFamily;
use crate::error::{BridgeError, BridgeResult, StatusError};
use crate::transaction::{BitcoinTransaction, FamilyTransaction, Transaction, TransactionStatus};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct BitcoinBridge {
    context: BridgeContext,
}

impl BitcoinBridge {
    pub fn new(context: BridgeContext) -> Self { Self { context } }
    pub fn context(&self) -> &BridgeContext { &self.context }

    fn select(&self, account: &Account, transaction: &Transaction, btc: &BitcoinTransaction, fee_per_byte: &Amount) -> Option<utxo::Selection> {
        utxo::select(utxos(account), &transaction.amount, fee_per_byte, btc.utxo_strategy, &self.context.config().dust())
    }
}

fn utxos(account: &Account) -> &[Utxo] {
    match &account.resources {
        AccountResources::Bitcoin { utxos } => utxos,
        _ => &[],
    }
}

fn check_snapshot(snapshot: &ChainSnapshot) -> BridgeResult<()> {
    let AccountResources::Bitcoin { utxos } = &snapshot.resources else { return Ok(()) };
    let total: Amount = utxos.iter().map(|u| &u.value).sum();
    if total != snapshot.balance {
        return Err(BridgeError::Network(format!("balance {} does not match utxo total {}", snapshot.balance, total)));
    }
    Ok(())
}

fn recipient_error(account: &Account, recipient: &str) -> Option<StatusError> {
    let network = account.currency.bitcoin_network.unwrap_or(::bitcoin::Network::Bitcoin);
    (!address::is_valid_address(recipient, network)).then_some(StatusError::InvalidAddress)
}

#[async_trait]
impl AccountBridge for BitcoinBridge {
    fn family(&self) -> CurrencyFamily { CurrencyFamily::Bitcoin }

    fn start_sync(&self, account: &Account, should_clear_cache: bool) -> SyncStream {
        self.context.sync_stream(account, should_clear_cache, SyncPlan::incremental().checked(check_snapshot))
    }

    fn create_transaction(&self, _account: &Account) -> Transaction {
        Transaction {
            amount: Amount::zero(),
            recipient: String::new(),
            family: FamilyTransaction::Bitcoin(BitcoinTransaction::default()),
        }
    }

    async fn prepare_transaction(&self, account: &Account, transaction: &Arc<Transaction>) -> BridgeResult<Arc<Transaction>> {
        let FamilyTransaction::Bitcoin(btc) = &transaction.family else { return Ok(Arc::clone(transaction)) };

        let network_info = match &btc.network_info {
            Some(levels) => levels.clone(),
            None => match self.context.network_info(account.currency).await? {
                NetworkInfo::Bitcoin(levels) => levels,
                other => return Err(unexpected_network_info(&other, CurrencyFamily::Bitcoin)),
            },
        };
        let fee_per_byte = btc.fee_per_byte.clone().unwrap_or_else(|| network_info.standard.clone());
        let estimated_fees = if transaction.amount.is_zero() {
            None
        } else {
            self.select(account, transaction, btc, &fee_per_byte).map(|s| s.fee)
        };
        debug!(account = %account.id, fee_per_byte = %fee_per_byte, estimated_fees = ?estimated_fees.as_ref().map(|f| f.to_string()), "prepared");

        let candidate = Transaction {
            family: FamilyTransaction::Bitcoin(BitcoinTransaction {
                fee_per_byte: Some(fee_per_byte),
                network_info: Some(network_info),
                estimated_fees,
                ..btc.clone()
            }),
            ..(**transaction).clone()
        };
        Ok(settle(transaction, candidate))
    }

    fn get_transaction_status(&self, account: &Account, transaction: &Transaction) -> TransactionStatus {
        let recipient_error = recipient_error(account, &transaction.recipient);
        let FamilyTransaction::Bitcoin(btc) = &transaction.family else {
            return TransactionStatus::wrong_family(recipient_error, CurrencyFamily::Bitcoin, transaction.family_kind());
        };

        let fee_error = TransactionStatus::fee_error(transaction.fee_state());
        let fee_per_byte = btc.fee_per_byte.clone().unwrap_or_default();
        let selection = if transaction.amount.is_zero() { None } else { self.select(account, transaction, btc, &fee_per_byte) };
        let balance_error = (!transaction.amount.is_zero() && selection.is_none()).then_some(StatusError::NotEnoughBalance);
        let fees = selection.map(|s| s.fee).unwrap_or_default();

        TransactionStatus { recipient_error, transaction_error: fee_error.or(balance_error), ..TransactionStatus::default() }
            .with_fees(&transaction.amount, fees, self.context.config().fee_too_high_percent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::MockChain;
    use crate::config::BridgeConfig;
    use crate::currency::BITCOIN;
    use crate::transaction::UtxoStrategy;
    use std::time::Duration;

    fn bridge(chain: MockChain) -> BitcoinBridge {
        BitcoinBridge::new(BridgeContext::new("mock", 1, Arc::new(chain), Arc::new(BridgeConfig::default())))
    }

    fn account(values: &[u64]) -> Account {
        let utxos: Vec<Utxo> = values
            .iter()
            .enumerate()
            .map(|(i, v)| Utxo { txid: format!("{:064x}", i), vout: 0, value: Amount::from(*v), block_height: Some(100 + i as u64) })
            .collect();
        Account {
            id: "mock:1:bitcoin:xpub6test:".into(),
            currency: &BITCOIN,
            fresh_address: "1FMpdbiC8dj7kHJ8tPWFcihvAcqEqramoN".into(),
            fresh_address_path: "44'/0'/0'/0/0".into(),
            balance: values.iter().map(|v| Amount::from(*v)).sum(),
            block_height: 110,
            operations: vec![],
            last_sync_date: None,
            resources: AccountResources::Bitcoin { utxos },
        }
    }

    fn tx(amount: u64, fee_per_byte: Option<u64>) -> Transaction {
        Transaction {
            amount: Amount::from(amount),
            recipient: "bc1qwqfns0rs5zxrrwf80k4xlp4lpnuyc69feh2r3d".into(),
            family: FamilyTransaction::Bitcoin(BitcoinTransaction { fee_per_byte: fee_per_byte.map(Amount::from), ..Default::default() }),
        }
    }

    #[tokio::test]
    async fn test_prepare_fills_standard_fee_and_estimate() {
        let bridge = bridge(MockChain::new());
        let account = account(&[50_000]);
        let prepared = bridge.prepare_transaction(&account, &Arc::new(tx(10_000, None))).await.unwrap();
        let FamilyTransaction::Bitcoin(btc) = &prepared.family else { panic!("bitcoin") };
        assert_eq!(btc.fee_per_byte, Some(Amount::from(5)));
        assert_eq!(btc.estimated_fees, Some(Amount::from(5 * utxo::estimate_size(1, 2))));
        assert!(btc.network_info.is_some());
    }

    #[tokio::test]
    async fn test_prepare_keeps_explicit_zero_fee() {
        let bridge = bridge(MockChain::new());
        let prepared = bridge.prepare_transaction(&account(&[50_000]), &Arc::new(tx(0, Some(0)))).await.unwrap();
        assert_eq!(prepared.fee(), Some(&Amount::zero()));
        let status = bridge.get_transaction_status(&account(&[50_000]), &prepared);
        assert_eq!(status.transaction_error, Some(StatusError::FeeRequired));
    }

    #[tokio::test]
    async fn test_prepare_converges_to_same_arc() {
        let chain = Arc::new(MockChain::new());
        let bridge = BitcoinBridge::new(BridgeContext::new("mock", 1, chain.clone(), Arc::new(BridgeConfig::default())));
        let account = account(&[50_000, 20_000]);
        let first = bridge.prepare_transaction(&account, &Arc::new(tx(30_000, None))).await.unwrap();
        let second = bridge.prepare_transaction(&account, &first).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(chain.network_info_fetches(), 1);
    }

    #[tokio::test]
    async fn test_prepare_failure_keeps_input() {
        let bridge = bridge(MockChain::new().failing("offline"));
        let input = Arc::new(tx(1_000, None));
        assert!(bridge.prepare_transaction(&account(&[50_000]), &input).await.is_err());
        assert_eq!(input.fee(), None);
    }

    #[tokio::test]
    async fn test_prepare_timeout_uses_fallback() {
        let config = BridgeConfig::default().with_fee_timeout(Duration::from_millis(5));
        let bridge = BitcoinBridge::new(BridgeContext::new(
            "mock",
            1,
            Arc::new(MockChain::new().with_latency(Duration::from_secs(10))),
            Arc::new(config.clone()),
        ));
        let prepared = bridge.prepare_transaction(&account(&[50_000]), &Arc::new(tx(1_000, None))).await.unwrap();
        assert_eq!(prepared.fee(), Some(&Amount::from(config.fallback_fee_per_byte)));
    }

    #[test]
    fn test_status_balance() {
        let bridge = bridge(MockChain::new());
        let account = account(&[10_000]);
        let ok = bridge.get_transaction_status(&account, &tx(5_000, Some(2)));
        assert!(ok.is_valid());
        assert_eq!(ok.estimated_fees, Amount::from(2 * utxo::estimate_size(1, 2)));

        let short = bridge.get_transaction_status(&account, &tx(10_000, Some(1)));
        assert_eq!(short.transaction_error, Some(StatusError::NotEnoughBalance));
    }

    #[test]
    fn test_status_fee_error_wins_over_balance() {
        let bridge = bridge(MockChain::new());
        let status = bridge.get_transaction_status(&account(&[10_000]), &tx(1_000_000, None));
        assert_eq!(status.transaction_error, Some(StatusError::FeeNotLoaded));
    }

    #[test]
    fn test_status_fee_too_high() {
        let bridge = bridge(MockChain::new());
        let status = bridge.get_transaction_status(&account(&[100_000]), &tx(1_000, Some(10)));
        assert!(status.warnings.contains_key("fee"));
        assert!(status.is_valid());
    }

    #[test]
    fn test_status_wrong_family() {
        let bridge = bridge(MockChain::new());
        let mut transaction = tx(1_000, Some(1));
        transaction.family = FamilyTransaction::Ethereum(Default::default());
        let status = bridge.get_transaction_status(&account(&[10_000]), &transaction);
        assert!(matches!(status.transaction_error, Some(StatusError::InvalidTransactionFamily { .. })));
        assert_eq!(status.recipient_error, None);
    }

    #[test]
    fn test_strategy_changes_fee() {
        let bridge = bridge(MockChain::new());
        let account = account(&[3_000, 3_000, 3_000, 60_000]);
        let mut deep = tx(5_000, Some(1));
        let FamilyTransaction::Bitcoin(btc) = &mut deep.family else { panic!("bitcoin") };
        btc.utxo_strategy = UtxoStrategy::DeepOutputsFirst;
        let mut large = deep.clone();
        let FamilyTransaction::Bitcoin(btc) = &mut large.family else { panic!("bitcoin") };
        btc.utxo_strategy = UtxoStrategy::OptimizeSize;
        let deep_fees = bridge.get_transaction_status(&account, &deep).estimated_fees;
        let large_fees = bridge.get_transaction_status(&account, &large).estimated_fees;
        assert!(deep_fees > large_fees);
    }

    #[test]
    fn test_snapshot_check() {
        let AccountResources::Bitcoin { utxos } = account(&[1, 2]).resources else { unreachable!() };
        let mut snapshot = ChainSnapshot {
            cursor: 1,
            fresh_address: String::new(),
            fresh_address_path: String::new(),
            balance: Amount::from(3),
            operations: vec![],
            resources: AccountResources::Bitcoin { utxos: vec![] },
        };
        assert!(check_snapshot(&snapshot).is_err());
        snapshot.resources = AccountResources::Bitcoin { utxos };
        assert!(check_snapshot(&snapshot).is_ok());
    }
}

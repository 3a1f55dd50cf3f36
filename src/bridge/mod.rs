//! Bridge - Uniform capability set over every currency family
//!
//! ```text
//! Account ──registry.resolve──▶ Bridge ─┬─ BitcoinBridge  ─┐
//!                                       ├─ EthereumBridge ─┼─ BridgeContext { ChainSource, BridgeConfig }
//!                                       └─ RippleBridge   ─┘
//! ```
//!
//! | Operation | Network | Fails |
//! |-----------|---------|-------|
//! | `start_sync` | fetch account | stream yields `Err(Network)` |
//! | `create_transaction` | no | never |
//! | `prepare_transaction` | fee lookup when missing | `Err(Network)` |
//! | `get_transaction_status` | no | never, errors are data |

pub mod registry;
pub mod sync;

pub use registry::{get_account_bridge, global, install_global, BridgeRegistry, BridgeRegistryBuilder};
pub use sync::{AccountPatch, SyncStream};

use crate::account::{Account, AccountIdentity};
use crate::chain::{ChainSnapshot, ChainSource, NetworkInfo, SyncRequest};
use crate::config::BridgeConfig;
use crate::currency::{Currency, CurrencyFamily};
use crate::error::{BridgeError, BridgeResult};
use crate::families::{BitcoinBridge, EthereumBridge, RippleBridge};
use crate::transaction::{Transaction, TransactionStatus};
use async_trait::async_trait;
use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[async_trait]
pub trait AccountBridge: Send + Sync {
    fn family(&self) -> CurrencyFamily;

    /// Cold stream of patches; nothing happens until it is polled.
    fn start_sync(&self, account: &Account, should_clear_cache: bool) -> SyncStream;

    fn create_transaction(&self, account: &Account) -> Transaction;

    /// Returns the input `Arc` itself when nothing changed.
    async fn prepare_transaction(&self, account: &Account, transaction: &Arc<Transaction>) -> BridgeResult<Arc<Transaction>>;

    fn get_transaction_status(&self, account: &Account, transaction: &Transaction) -> TransactionStatus;
}

/// How a family bridge fetches and vets one sync.
#[derive(Clone, Copy)]
pub(crate) struct SyncPlan {
    /// Resume from the stored block height. Without it every sync fetches
    /// the full history and merges it into the account.
    resume: bool,
    /// Rejects snapshots the family cannot apply.
    check: Option<fn(&ChainSnapshot) -> BridgeResult<()>>,
}

impl SyncPlan {
    pub(crate) fn incremental() -> Self { Self { resume: true, check: None } }
    pub(crate) fn full_history() -> Self { Self { resume: false, check: None } }

    pub(crate) fn checked(self, check: fn(&ChainSnapshot) -> BridgeResult<()>) -> Self {
        Self { check: Some(check), ..self }
    }

    fn cursor(&self, account: &Account, should_clear_cache: bool) -> Option<u64> {
        (self.resume && !should_clear_cache && account.block_height > 0).then_some(account.block_height)
    }
}

/// Per-variant state shared by every family bridge.
#[derive(Clone)]
pub struct BridgeContext {
    type_: String,
    version: u32,
    source: Arc<dyn ChainSource>,
    config: Arc<BridgeConfig>,
}

impl BridgeContext {
    pub fn new(type_: impl Into<String>, version: u32, source: Arc<dyn ChainSource>, config: Arc<BridgeConfig>) -> Self {
        Self { type_: type_.into(), version, source, config }
    }

    pub fn type_(&self) -> &str { &self.type_ }
    pub fn version(&self) -> u32 { self.version }
    pub fn config(&self) -> &BridgeConfig { &self.config }
    pub fn source(&self) -> &Arc<dyn ChainSource> { &self.source }

    /// Sync stream that fetches from the chain source and reconciles.
    pub(crate) fn sync_stream(&self, account: &Account, should_clear_cache: bool, plan: SyncPlan) -> SyncStream {
        let identity = account.identity();
        let account_id = account.id.clone();
        let currency = account.currency;
        let cursor = plan.cursor(account, should_clear_cache);
        let source = Arc::clone(&self.source);
        let timeout = self.config.sync_timeout();

        SyncStream::new(async move {
            let AccountIdentity { xpub_or_address, .. } = identity?;
            let request = SyncRequest { account_id, currency, xpub_or_address, cursor };
            debug!(account = %request.account_id, source = source.name(), cursor = ?cursor, "sync started");

            let snapshot = match tokio::time::timeout(timeout, source.fetch_account(&request)).await {
                Ok(Ok(snapshot)) => snapshot,
                Ok(Err(e)) => {
                    warn!(account = %request.account_id, error = %e, "sync failed");
                    return Err(e);
                }
                Err(_) => {
                    warn!(account = %request.account_id, timeout_ms = timeout.as_millis() as u64, "sync timed out");
                    return Err(BridgeError::Network(format!("{} sync timed out after {:?}", source.name(), timeout)));
                }
            };
            if snapshot.resources.family() != currency.family {
                return Err(BridgeError::Network(format!(
                    "{} returned {} resources for a {} account",
                    source.name(),
                    snapshot.resources.family(),
                    currency.family
                )));
            }
            if let Some(check) = plan.check {
                check(&snapshot)?;
            }

            info!(
                account = %request.account_id,
                block_height = snapshot.cursor,
                operations = snapshot.operations.len(),
                full = should_clear_cache,
                "sync complete"
            );
            Ok(AccountPatch::reconcile(snapshot, should_clear_cache, Utc::now()))
        })
    }

    /// Network info for `currency`, or the configured fallback when the
    /// lookup outlives `fee_timeout`.
    pub(crate) async fn network_info(&self, currency: &Currency) -> BridgeResult<NetworkInfo> {
        let timeout = self.config.fee_timeout();
        let info = match tokio::time::timeout(timeout, self.source.fetch_network_info(currency)).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(currency = currency.id, timeout_ms = timeout.as_millis() as u64, "fee lookup timed out, using fallback");
                self.config.fallback_network_info(currency.family)
            }
        };
        if info.family() != currency.family {
            return Err(unexpected_network_info(&info, currency.family));
        }
        Ok(info)
    }
}

impl fmt::Debug for BridgeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeContext")
            .field("type_", &self.type_)
            .field("version", &self.version)
            .field("source", &self.source.name())
            .finish()
    }
}

pub(crate) fn unexpected_network_info(info: &NetworkInfo, expected: CurrencyFamily) -> BridgeError {
    BridgeError::Network(format!("expected {} network info, got {}", expected, info.family()))
}

/// Keep the caller's allocation when the candidate is equal by value.
pub fn settle(input: &Arc<Transaction>, candidate: Transaction) -> Arc<Transaction> {
    if **input == candidate { Arc::clone(input) } else { Arc::new(candidate) }
}

/// A resolved bridge: one family implementation bound to one variant.
#[derive(Debug, Clone)]
pub enum Bridge {
    Bitcoin(BitcoinBridge),
    Ethereum(EthereumBridge),
    Ripple(RippleBridge),
}

impl Bridge {
    pub fn new(family: CurrencyFamily, context: BridgeContext) -> Self {
        match family {
            CurrencyFamily::Bitcoin => Bridge::Bitcoin(BitcoinBridge::new(context)),
            CurrencyFamily::Ethereum => Bridge::Ethereum(EthereumBridge::new(context)),
            CurrencyFamily::Ripple => Bridge::Ripple(RippleBridge::new(context)),
        }
    }

    pub fn context(&self) -> &BridgeContext {
        match self {
            Bridge::Bitcoin(b) => b.context(),
            Bridge::Ethereum(b) => b.context(),
            Bridge::Ripple(b) => b.context(),
        }
    }

    fn inner(&self) -> &dyn AccountBridge {
        match self {
            Bridge::Bitcoin(b) => b,
            Bridge::Ethereum(b) => b,
            Bridge::Ripple(b) => b,
        }
    }

    pub fn type_(&self) -> &str { self.context().type_() }
    pub fn version(&self) -> u32 { self.context().version() }

    /// Run a sync to completion and apply its last patch.
    pub async fn sync(&self, account: &Account, should_clear_cache: bool) -> BridgeResult<Account> {
        Ok(match self.start_sync(account, should_clear_cache).last_patch().await? {
            Some(patch) => patch.apply(account),
            None => account.clone(),
        })
    }
}

#[async_trait]
impl AccountBridge for Bridge {
    fn family(&self) -> CurrencyFamily { self.inner().family() }

    fn start_sync(&self, account: &Account, should_clear_cache: bool) -> SyncStream {
        self.inner().start_sync(account, should_clear_cache)
    }

    fn create_transaction(&self, account: &Account) -> Transaction { self.inner().create_transaction(account) }

    async fn prepare_transaction(&self, account: &Account, transaction: &Arc<Transaction>) -> BridgeResult<Arc<Transaction>> {
        self.inner().prepare_transaction(account, transaction).await
    }

    fn get_transaction_status(&self, account: &Account, transaction: &Transaction) -> TransactionStatus {
        self.inner().get_transaction_status(account, transaction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amount::Amount;
    use crate::chain::MockChain;
    use crate::currency::{BITCOIN, RIPPLE};
    use crate::transaction::FamilyTransaction;
    use std::time::Duration;

    fn context(chain: MockChain, config: BridgeConfig) -> BridgeContext {
        BridgeContext::new("mock", 1, Arc::new(chain), Arc::new(config))
    }

    #[test]
    fn test_settle_keeps_allocation() {
        let bridge = RippleBridge::new(context(MockChain::new(), BridgeConfig::default()));
        let account = crate::account::Account {
            id: "mock:1:ripple:rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh:".into(),
            currency: &RIPPLE,
            fresh_address: String::new(),
            fresh_address_path: String::new(),
            balance: Amount::zero(),
            block_height: 0,
            operations: vec![],
            last_sync_date: None,
            resources: crate::account::AccountResources::empty(CurrencyFamily::Ripple),
        };
        let input = Arc::new(bridge.create_transaction(&account));
        let same = settle(&input, (*input).clone());
        assert!(Arc::ptr_eq(&input, &same));
        let changed = settle(&input, (*input).clone().with_amount(5u64));
        assert!(!Arc::ptr_eq(&input, &changed));
        assert!(matches!(changed.family, FamilyTransaction::Ripple(_)));
    }

    #[test]
    fn test_sync_plan_cursor() {
        let mut account = crate::account::Account {
            id: "mock:1:ripple:rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh:".into(),
            currency: &RIPPLE,
            fresh_address: String::new(),
            fresh_address_path: String::new(),
            balance: Amount::zero(),
            block_height: 0,
            operations: vec![],
            last_sync_date: None,
            resources: crate::account::AccountResources::empty(CurrencyFamily::Ripple),
        };
        assert_eq!(SyncPlan::incremental().cursor(&account, false), None);

        account.block_height = 42;
        assert_eq!(SyncPlan::incremental().cursor(&account, false), Some(42));
        assert_eq!(SyncPlan::incremental().cursor(&account, true), None);
        assert_eq!(SyncPlan::full_history().cursor(&account, false), None);
    }

    #[tokio::test]
    async fn test_network_info_falls_back_on_timeout() {
        let config = BridgeConfig::default().with_fee_timeout(Duration::from_millis(10));
        let ctx = context(MockChain::new().with_latency(Duration::from_secs(5)), config.clone());
        let info = ctx.network_info(&BITCOIN).await.unwrap();
        assert_eq!(info, config.fallback_network_info(CurrencyFamily::Bitcoin));
    }

    #[tokio::test]
    async fn test_network_info_error_propagates() {
        let ctx = context(MockChain::new().failing("offline"), BridgeConfig::default());
        let err = ctx.network_info(&RIPPLE).await.unwrap_err();
        assert_eq!(err, BridgeError::Network("offline".into()));
    }
}

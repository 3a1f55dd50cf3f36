//! Sync Tests: cold streams, cancellation, timeouts, failures, resync

use account_bridge::currency::{Currency, ETHEREUM, RIPPLE};
use account_bridge::{
    get_account_bridge, install_global, Account, AccountBridge, AccountResources, Amount, BridgeConfig, BridgeError, BridgeRegistry,
    BridgeResult, ChainSnapshot, ChainSource, CurrencyFamily, ErrorKind, MockChain, NetworkInfo, SyncRequest,
};
use async_trait::async_trait;
use futures::StreamExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const OWN: &str = "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh";
const PEER: &str = "rrrrrrrrrrrrrrrrrrrrrhoLvTp";

fn ripple_account(id_type: &str) -> Account {
    ripple_account_at(id_type, 1, OWN)
}

fn ripple_account_at(id_type: &str, version: u32, address: &str) -> Account {
    Account {
        id: format!("{}:{}:ripple:{}:", id_type, version, address),
        currency: &RIPPLE,
        fresh_address: address.into(),
        fresh_address_path: "44'/144'/0'/0/0".into(),
        balance: Amount::zero(),
        block_height: 0,
        operations: vec![],
        last_sync_date: None,
        resources: AccountResources::empty(CurrencyFamily::Ripple),
    }
}

/// Sets its flag when dropped.
struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) { self.0.store(true, Ordering::SeqCst); }
}

/// Mock chain that records when an account fetch starts and when its
/// future is dropped.
struct TrackedChain {
    inner: MockChain,
    started: Arc<AtomicBool>,
    released: Arc<AtomicBool>,
}

#[async_trait]
impl ChainSource for TrackedChain {
    fn name(&self) -> &str { "tracked" }

    async fn fetch_account(&self, request: &SyncRequest) -> BridgeResult<ChainSnapshot> {
        let _held = DropFlag(Arc::clone(&self.released));
        self.started.store(true, Ordering::SeqCst);
        self.inner.fetch_account(request).await
    }

    async fn fetch_network_info(&self, currency: &Currency) -> BridgeResult<NetworkInfo> {
        self.inner.fetch_network_info(currency).await
    }
}

fn registry_with(chain: Arc<MockChain>, config: BridgeConfig) -> BridgeRegistry {
    let source: Arc<dyn ChainSource> = chain;
    BridgeRegistry::builder().with_config(config).register_all("mock", 1, source).build()
}

/// Test: nothing is fetched until the stream is polled
#[tokio::test]
async fn stream_is_cold() {
    let chain = Arc::new(MockChain::new());
    let registry = registry_with(chain.clone(), BridgeConfig::default());
    let account = ripple_account("mock");
    let bridge = registry.resolve(&account).expect("resolve");

    let mut stream = bridge.start_sync(&account, false);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(chain.account_fetches(), 0);

    let patch = stream.next().await.expect("one item").expect("patch");
    assert!(stream.next().await.is_none());
    assert_eq!(chain.account_fetches(), 1);
    assert!(patch.apply(&account).block_height > 0);
}

/// Test: dropping a stream mid-fetch releases the in-flight fetch
#[tokio::test]
async fn drop_cancels_sync() {
    let started = Arc::new(AtomicBool::new(false));
    let released = Arc::new(AtomicBool::new(false));
    let source: Arc<dyn ChainSource> = Arc::new(TrackedChain {
        inner: MockChain::new().with_latency(Duration::from_secs(30)),
        started: Arc::clone(&started),
        released: Arc::clone(&released),
    });
    let registry = BridgeRegistry::builder().register_all("mock", 1, source).build();
    let account = ripple_account("mock");
    let bridge = registry.resolve(&account).expect("resolve");

    let mut stream = bridge.start_sync(&account, false);
    let polled = tokio::time::timeout(Duration::from_millis(20), stream.next()).await;
    assert!(polled.is_err(), "fetch should still be pending");
    assert!(started.load(Ordering::SeqCst));
    assert!(!released.load(Ordering::SeqCst));

    drop(stream);
    tokio::time::timeout(Duration::from_secs(1), async {
        while !released.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("fetch future dropped after cancel");
}

/// Test: concurrent syncs of different accounts each reconcile their own account
#[tokio::test]
async fn concurrent_syncs_are_independent() {
    let chain = Arc::new(MockChain::new().with_latency(Duration::from_millis(20)));
    let registry = registry_with(chain.clone(), BridgeConfig::default());
    let own = ripple_account_at("mock", 1, OWN);
    let peer = ripple_account_at("mock", 1, PEER);
    let bridge = registry.resolve(&own).expect("resolve");

    let (a, b) = futures::join!(bridge.start_sync(&own, false).last_patch(), bridge.start_sync(&peer, false).last_patch());
    assert_eq!(chain.account_fetches(), 2);

    for (account, patch) in [(&own, a), (&peer, b)] {
        let synced = patch.expect("sync").expect("patch").apply(account);
        assert_eq!(synced.id, account.id);
        assert_eq!(synced.fresh_address, account.fresh_address);
        assert!(!synced.operations.is_empty());
        assert!(synced.operations.iter().all(|op| op.id.starts_with(&account.id)), "{}", account.id);
    }
}

/// Test: a fetch slower than sync_timeout yields a network error and no patch
#[tokio::test]
async fn sync_timeout_is_network_error() {
    let chain = Arc::new(MockChain::new().with_latency(Duration::from_secs(30)));
    let config = BridgeConfig::default().with_sync_timeout(Duration::from_millis(20));
    let registry = registry_with(chain, config);
    let account = ripple_account("mock");
    let bridge = registry.resolve(&account).expect("resolve");

    let mut stream = bridge.start_sync(&account, false);
    let err = stream.next().await.expect("one item").expect_err("timeout");
    assert_eq!(err.kind(), ErrorKind::NetworkError);
    assert!(stream.next().await.is_none());
}

/// Test: a failing source leaves the account unchanged
#[tokio::test]
async fn failure_leaves_account_unchanged() {
    let chain = Arc::new(MockChain::new().failing("503 service unavailable"));
    let registry = registry_with(chain, BridgeConfig::default());
    let account = ripple_account("mock");
    let bridge = registry.resolve(&account).expect("resolve");

    let err = bridge.sync(&account, false).await.expect_err("network");
    assert_eq!(err, BridgeError::Network("503 service unavailable".into()));
    assert_eq!(account.balance, Amount::zero());
    assert!(account.operations.is_empty());
}

/// Test: incremental resync keeps history, clear-cache rebuilds it
#[tokio::test]
async fn incremental_and_full_resync() {
    let registry = BridgeRegistry::mock(BridgeConfig::default());
    let account = ripple_account_at("node", 2, OWN);
    let bridge = registry.resolve(&account).expect("resolve");

    let first = bridge.sync(&account, false).await.expect("sync");
    let again = bridge.sync(&first, false).await.expect("resync");
    assert_eq!(again.operations, first.operations);
    assert_eq!(again.block_height, first.block_height);
    assert!(again.last_sync_date >= first.last_sync_date);

    let mut stale = first.clone();
    stale.operations.truncate(1);
    let full = bridge.sync(&stale, true).await.expect("full resync");
    assert_eq!(full.operations, first.operations);

    // an incremental sync from the tip cannot restore truncated history
    let partial = bridge.sync(&stale, false).await.expect("resync");
    assert_eq!(partial.operations.len(), 1);
}

/// Test: ripple node v1 refetches full history, v2 resumes from the ledger index
#[tokio::test]
async fn node_revisions_resync_differently() {
    let registry = BridgeRegistry::mock(BridgeConfig::default());
    let mut counts = Vec::new();
    for version in [1, 2] {
        let account = ripple_account_at("node", version, OWN);
        let bridge = registry.resolve(&account).expect("resolve");
        assert_eq!(bridge.version(), version);

        let first = bridge.sync(&account, false).await.expect("sync");
        let mut stale = first.clone();
        stale.operations.truncate(1);
        let resynced = bridge.sync(&stale, false).await.expect("resync");
        counts.push((first.operations.len(), resynced.operations.len()));
    }
    let (v1_full, v1_resync) = counts[0];
    let (_, v2_resync) = counts[1];
    assert!(v1_full > 1);
    assert_eq!(v1_resync, v1_full);
    assert_eq!(v2_resync, 1);
}

/// Test: the patch is a pure function of its input
#[tokio::test]
async fn patch_applies_to_any_snapshot() {
    let registry = BridgeRegistry::mock(BridgeConfig::default());
    let account = ripple_account("mock");
    let bridge = registry.resolve(&account).expect("resolve");
    let patch = bridge.start_sync(&account, false).last_patch().await.expect("sync").expect("patch");
    let a = patch.apply(&account);
    let b = patch.apply(&account);
    assert_eq!(a, b);
    assert_eq!(account.block_height, 0);
}

/// Test: global registry resolves once installed
#[tokio::test]
async fn global_registry() {
    let account = Account {
        id: "mock:1:ethereum:0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed:".into(),
        currency: &ETHEREUM,
        fresh_address: String::new(),
        fresh_address_path: String::new(),
        balance: Amount::zero(),
        block_height: 0,
        operations: vec![],
        last_sync_date: None,
        resources: AccountResources::empty(CurrencyFamily::Ethereum),
    };
    assert_eq!(get_account_bridge(&account).expect_err("not installed").kind(), ErrorKind::Config);

    install_global(BridgeRegistry::mock(BridgeConfig::default())).expect("install");
    let err = install_global(BridgeRegistry::default()).expect_err("second install");
    assert_eq!(err.kind(), ErrorKind::Config);

    let bridge = get_account_bridge(&account).expect("resolve");
    assert_eq!(bridge.family(), CurrencyFamily::Ethereum);
    let synced = bridge.sync(&account, false).await.expect("sync");
    assert_eq!(synced.fresh_address, "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");
}

//! Sync - Cold, cancellable stream of account patches
//!
//! ```text
//! start_sync ──▶ SyncStream (cold)
//!                   │ first poll
//!                   ▼
//!              tokio::spawn(fetch + reconcile) ──mpsc──▶ Ok(AccountPatch) | Err(Network)
//! ```
//!
//! Dropping the stream aborts the task, which drops any in-flight request.
//! Nothing is applied to an account until the caller applies a patch.

use crate::account::{Account, Operation};
use crate::chain::ChainSnapshot;
use crate::error::BridgeResult;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use futures::{FutureExt, Stream, StreamExt};
use std::cmp::Reverse;
use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Pure `Account -> Account` transformer produced by a sync.
#[derive(Clone)]
pub struct AccountPatch(Arc<dyn Fn(&Account) -> Account + Send + Sync>);

impl AccountPatch {
    pub fn new(f: impl Fn(&Account) -> Account + Send + Sync + 'static) -> Self { Self(Arc::new(f)) }

    pub fn apply(&self, account: &Account) -> Account { (self.0)(account) }

    /// Patch that reconciles an account with a fetched snapshot.
    pub(crate) fn reconcile(snapshot: ChainSnapshot, clear_cache: bool, synced_at: DateTime<Utc>) -> Self {
        Self::new(move |account| reconcile(account, &snapshot, clear_cache, synced_at))
    }
}

impl fmt::Debug for AccountPatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str("AccountPatch") }
}

pub struct SyncStream {
    job: Option<BoxFuture<'static, ()>>,
    rx: mpsc::Receiver<BridgeResult<AccountPatch>>,
    task: Option<JoinHandle<()>>,
}

impl SyncStream {
    pub(crate) fn new<F>(work: F) -> Self
    where
        F: Future<Output = BridgeResult<AccountPatch>> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(1);
        let job = async move {
            let result = work.await;
            let _ = tx.send(result).await;
        }
        .boxed();
        Self { job: Some(job), rx, task: None }
    }

    /// Drive the stream to completion and return the last patch.
    pub async fn last_patch(mut self) -> BridgeResult<Option<AccountPatch>> {
        let mut last = None;
        while let Some(item) = self.next().await {
            last = Some(item?);
        }
        Ok(last)
    }
}

impl Stream for SyncStream {
    type Item = BridgeResult<AccountPatch>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if let Some(job) = this.job.take() {
            this.task = Some(tokio::spawn(job));
        }
        this.rx.poll_recv(cx)
    }
}

impl Drop for SyncStream {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

fn reconcile(account: &Account, snapshot: &ChainSnapshot, clear_cache: bool, synced_at: DateTime<Utc>) -> Account {
    let operations = if clear_cache {
        sort_operations(snapshot.operations.clone())
    } else {
        merge_operations(&account.operations, &snapshot.operations)
    };
    Account {
        fresh_address: snapshot.fresh_address.clone(),
        fresh_address_path: snapshot.fresh_address_path.clone(),
        balance: snapshot.balance.clone(),
        block_height: snapshot.cursor,
        operations,
        last_sync_date: Some(synced_at),
        resources: snapshot.resources.clone(),
        ..account.clone()
    }
}

/// New operations replace known ones with the same id.
fn merge_operations(existing: &[Operation], fresh: &[Operation]) -> Vec<Operation> {
    let fresh_ids: HashSet<&str> = fresh.iter().map(|op| op.id.as_str()).collect();
    let merged = fresh
        .iter()
        .chain(existing.iter().filter(|op| !fresh_ids.contains(op.id.as_str())))
        .cloned()
        .collect();
    sort_operations(merged)
}

/// Pending first, then by height and date, newest first.
fn sort_operations(mut operations: Vec<Operation>) -> Vec<Operation> {
    operations.sort_by_key(|op| (Reverse(op.block_height.unwrap_or(u64::MAX)), Reverse(op.date), op.id.clone()));
    operations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{AccountResources, OperationType};
    use crate::amount::Amount;
    use crate::currency::{CurrencyFamily, ETHEREUM};
    use crate::error::BridgeError;

    fn op(hash: &str, height: Option<u64>) -> Operation {
        Operation {
            id: Operation::make_id("acc", hash, OperationType::In),
            hash: hash.into(),
            type_: OperationType::In,
            value: Amount::from(1),
            fee: Amount::zero(),
            block_height: height,
            date: DateTime::from_timestamp(1_600_000_000 + height.unwrap_or(999) as i64, 0).unwrap(),
            senders: vec![],
            recipients: vec![],
        }
    }

    fn account(operations: Vec<Operation>) -> Account {
        Account {
            id: "mock:1:ethereum:0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed:".into(),
            currency: &ETHEREUM,
            fresh_address: "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed".into(),
            fresh_address_path: "44'/60'/0'/0/0".into(),
            balance: Amount::zero(),
            block_height: 10,
            operations,
            last_sync_date: None,
            resources: AccountResources::empty(CurrencyFamily::Ethereum),
        }
    }

    fn snapshot(operations: Vec<Operation>) -> ChainSnapshot {
        ChainSnapshot {
            cursor: 20,
            fresh_address: "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed".into(),
            fresh_address_path: "44'/60'/0'/0/0".into(),
            balance: Amount::from(5),
            operations,
            resources: AccountResources::Ethereum { nonce: 1 },
        }
    }

    #[test]
    fn test_incremental_merge_replaces_pending() {
        let before = account(vec![op("a", Some(5)), op("b", None)]);
        let patch = AccountPatch::reconcile(snapshot(vec![op("b", Some(15)), op("c", Some(18))]), false, Utc::now());
        let after = patch.apply(&before);
        let hashes: Vec<&str> = after.operations.iter().map(|o| o.hash.as_str()).collect();
        assert_eq!(hashes, vec!["c", "b", "a"]);
        assert_eq!(after.operations[1].block_height, Some(15));
        assert_eq!(after.block_height, 20);
        assert_eq!(after.balance, Amount::from(5));
        assert_eq!(after.id, before.id);
    }

    #[test]
    fn test_clear_cache_replaces_history() {
        let before = account(vec![op("a", Some(5))]);
        let after = AccountPatch::reconcile(snapshot(vec![op("c", Some(18))]), true, Utc::now()).apply(&before);
        assert_eq!(after.operations.len(), 1);
        assert_eq!(after.operations[0].hash, "c");
    }

    #[test]
    fn test_patch_is_pure() {
        let before = account(vec![]);
        let patch = AccountPatch::reconcile(snapshot(vec![op("c", Some(18))]), false, Utc::now());
        assert_eq!(patch.apply(&before), patch.apply(&before));
        assert!(before.operations.is_empty());
    }

    #[tokio::test]
    async fn test_stream_is_cold() {
        let (tx, mut rx) = mpsc::channel::<()>(1);
        let stream = SyncStream::new(async move {
            let _ = tx.send(()).await;
            Ok(AccountPatch::new(|a| a.clone()))
        });
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());
        let patch = stream.last_patch().await.unwrap();
        assert!(patch.is_some());
        assert!(rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_failure_ends_without_patch() {
        let mut stream = SyncStream::new(async { Err(BridgeError::Network("down".into())) });
        assert_eq!(stream.next().await.map(|r| r.unwrap_err()), Some(BridgeError::Network("down".into())));
        assert!(stream.next().await.is_none());
    }
}

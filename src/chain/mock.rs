//! MockChain - Deterministic chain data without a network
//!
//! Every value is derived from `sha256(currency_id ":" xpub_or_address)`, so
//! the same account always syncs to the same state whichever bridge variant it
//! is bound to. Latency and failures can be injected for tests.

use super::{ChainSnapshot, ChainSource, NetworkInfo, SyncRequest};
use crate::account::{AccountResources, Operation, OperationType, Utxo};
use crate::amount::Amount;
use crate::currency::{Currency, CurrencyFamily};
use crate::error::{BridgeError, BridgeResult};
use crate::families::{bitcoin as btc, ethereum as eth, ripple as xrp};
use crate::transaction::{FeeLevels, RippleNetworkInfo};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

const GENESIS_TIME: i64 = 1_500_000_000;
const GWEI: u64 = 1_000_000_000;
const RIPPLE_OWNER_RESERVE: u64 = 20_000_000;

#[derive(Debug, Default)]
pub struct MockChain {
    latency: Option<Duration>,
    failure: Option<String>,
    account_fetches: AtomicUsize,
    network_info_fetches: AtomicUsize,
}

impl MockChain {
    pub fn new() -> Self { Self::default() }

    /// Delay every answer, e.g. to exercise timeouts and cancellation.
    pub fn with_latency(mut self, latency: Duration) -> Self { self.latency = Some(latency); self }

    /// Fail every call with `BridgeError::Network`.
    pub fn failing(mut self, message: impl Into<String>) -> Self { self.failure = Some(message.into()); self }

    pub fn account_fetches(&self) -> usize { self.account_fetches.load(Ordering::SeqCst) }
    pub fn network_info_fetches(&self) -> usize { self.network_info_fetches.load(Ordering::SeqCst) }

    async fn respond(&self) -> BridgeResult<()> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        match &self.failure {
            Some(message) => Err(BridgeError::Network(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ChainSource for MockChain {
    fn name(&self) -> &str { "mock" }

    async fn fetch_account(&self, request: &SyncRequest) -> BridgeResult<ChainSnapshot> {
        self.account_fetches.fetch_add(1, Ordering::SeqCst);
        self.respond().await?;
        let snapshot = MockAccount::derive(request).snapshot();
        Ok(match request.cursor {
            Some(cursor) => ChainSnapshot {
                operations: snapshot.operations.into_iter().filter(|op| op.block_height.map_or(true, |h| h > cursor)).collect(),
                ..snapshot
            },
            None => snapshot,
        })
    }

    async fn fetch_network_info(&self, currency: &Currency) -> BridgeResult<NetworkInfo> {
        self.network_info_fetches.fetch_add(1, Ordering::SeqCst);
        self.respond().await?;
        let levels = |slow: u64, standard: u64, fast: u64| FeeLevels {
            slow: Amount::from(slow),
            standard: Amount::from(standard),
            fast: Amount::from(fast),
        };
        Ok(match currency.family {
            CurrencyFamily::Bitcoin => NetworkInfo::Bitcoin(levels(2, 5, 12)),
            CurrencyFamily::Ethereum => NetworkInfo::Ethereum(levels(GWEI, 20 * GWEI, 50 * GWEI)),
            CurrencyFamily::Ripple => NetworkInfo::Ripple(RippleNetworkInfo {
                server_fee: Amount::from(10),
                base_reserve: Amount::from(10_000_000),
            }),
        })
    }
}

struct MockAccount<'a> {
    request: &'a SyncRequest,
    seed: [u8; 32],
}

impl<'a> MockAccount<'a> {
    fn derive(request: &'a SyncRequest) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(request.currency.id.as_bytes());
        hasher.update(b":");
        hasher.update(request.xpub_or_address.as_bytes());
        Self { request, seed: hasher.finalize().into() }
    }

    fn hash(&self, label: &str, index: u64) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.seed);
        hasher.update(label.as_bytes());
        hasher.update(index.to_be_bytes());
        hasher.finalize().into()
    }

    fn number(&self, label: &str, index: u64) -> u64 {
        let h = self.hash(label, index);
        u64::from_be_bytes([h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7]])
    }

    fn key_hash(&self, label: &str, index: u64) -> [u8; 20] {
        let mut out = [0u8; 20];
        out.copy_from_slice(&self.hash(label, index)[..20]);
        out
    }

    fn tip(&self) -> u64 {
        let base = match self.request.currency.family {
            CurrencyFamily::Bitcoin => 600_000,
            CurrencyFamily::Ethereum => 9_000_000,
            CurrencyFamily::Ripple => 50_000_000,
        };
        base + self.number("tip", 0) % 1_000
    }

    fn date(&self, height: u64) -> DateTime<Utc> {
        let seconds = match self.request.currency.family {
            CurrencyFamily::Bitcoin => 600,
            CurrencyFamily::Ethereum => 13,
            CurrencyFamily::Ripple => 4,
        };
        DateTime::from_timestamp(GENESIS_TIME + (height * seconds) as i64, 0).unwrap_or_default()
    }

    fn address(&self, label: &str, index: u64) -> String {
        let key_hash = self.key_hash(label, index);
        let currency = self.request.currency;
        match currency.family {
            CurrencyFamily::Bitcoin => btc::address::p2pkh_address(key_hash, currency.bitcoin_network.unwrap_or(::bitcoin::Network::Bitcoin)),
            CurrencyFamily::Ethereum => eth::address::to_checksum_address(&key_hash),
            CurrencyFamily::Ripple => xrp::address::encode_address(&key_hash),
        }
    }

    fn fresh_address(&self) -> String {
        let own = &self.request.xpub_or_address;
        let usable = match self.request.currency.family {
            CurrencyFamily::Bitcoin => false,
            CurrencyFamily::Ethereum => eth::address::is_valid_address(own),
            CurrencyFamily::Ripple => xrp::address::is_valid_address(own),
        };
        if usable { own.clone() } else { self.address("fresh", 0) }
    }

    fn snapshot(&self) -> ChainSnapshot {
        let family = self.request.currency.family;
        let tip = self.tip();
        let fresh_address = self.fresh_address();
        let count = 3 + self.number("count", 0) % 4;
        let (in_base, in_spread, fee) = match family {
            CurrencyFamily::Bitcoin => (10_000, 990_000, 226),
            CurrencyFamily::Ethereum => (GWEI * 100_000_000, GWEI * 900_000_000, 21_000 * 20 * GWEI),
            CurrencyFamily::Ripple => (30_000_000, 970_000_000, 12),
        };

        let mut operations = Vec::new();
        let mut utxos = Vec::new();
        let mut balance = Amount::zero();
        let mut sent = 0u64;
        let mut last_in = 0u64;
        for i in 0..count {
            let hash = hex::encode(self.hash("tx", i));
            let height = tip - (count - i) * 7;
            // bitcoin accounts only receive, so every output stays unspent
            let outgoing = family != CurrencyFamily::Bitcoin && i % 2 == 1;
            let (type_, value, senders, recipients) = if outgoing {
                (OperationType::Out, last_in / 4, vec![fresh_address.clone()], vec![self.address("peer", i)])
            } else {
                last_in = in_base + self.number("value", i) % in_spread;
                (OperationType::In, last_in, vec![self.address("peer", i)], vec![fresh_address.clone()])
            };
            let value = Amount::from(value);
            if outgoing {
                balance = balance.saturating_sub(&(&value + &Amount::from(fee)));
                sent += 1;
            } else {
                balance = &balance + &value;
            }
            if family == CurrencyFamily::Bitcoin {
                utxos.push(Utxo { txid: hash.clone(), vout: (i % 2) as u32, value: value.clone(), block_height: Some(height) });
            }
            operations.push(Operation {
                id: Operation::make_id(&self.request.account_id, &hash, type_),
                hash,
                type_,
                value,
                fee: Amount::from(fee),
                block_height: Some(height),
                date: self.date(height),
                senders,
                recipients,
            });
        }
        operations.reverse();

        let resources = match family {
            CurrencyFamily::Bitcoin => AccountResources::Bitcoin { utxos },
            CurrencyFamily::Ethereum => AccountResources::Ethereum { nonce: sent },
            CurrencyFamily::Ripple => AccountResources::Ripple { sequence: 1 + sent as u32, reserve: Amount::from(RIPPLE_OWNER_RESERVE) },
        };
        ChainSnapshot {
            cursor: tip,
            fresh_address,
            fresh_address_path: format!("44'/{}'/0'/0/0", coin_type(family)),
            balance,
            operations,
            resources,
        }
    }
}

fn coin_type(family: CurrencyFamily) -> u32 {
    match family { CurrencyFamily::Bitcoin => 0, CurrencyFamily::Ethereum => 60, CurrencyFamily::Ripple => 144 }
}

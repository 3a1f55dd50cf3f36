//! Chain - Boundary to whatever fetches raw blockchain data
//!
//! Bridges never talk to nodes or indexers directly. They hold an
//! `Arc<dyn ChainSource>` chosen at registration time and call it at the two
//! network-dependent points: sync and fee estimation.
//!
//! ```text
//! Bridge ──start_sync──▶ ChainSource::fetch_account(SyncRequest) ──▶ ChainSnapshot
//!        ──prepare─────▶ ChainSource::fetch_network_info(Currency) ──▶ NetworkInfo
//! ```
//!
//! Implementations report every transport failure as `BridgeError::Network`.
//! Timeouts are applied by the bridge, not here.

pub mod mock;

pub use mock::MockChain;

use crate::account::{AccountResources, Operation};
use crate::amount::Amount;
use crate::currency::{Currency, CurrencyFamily};
use crate::error::BridgeResult;
use crate::transaction::{FeeLevels, RippleNetworkInfo};
use async_trait::async_trait;

#[async_trait]
pub trait ChainSource: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;
    async fn fetch_account(&self, request: &SyncRequest) -> BridgeResult<ChainSnapshot>;
    async fn fetch_network_info(&self, currency: &Currency) -> BridgeResult<NetworkInfo>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRequest {
    pub account_id: String,
    pub currency: &'static Currency,
    pub xpub_or_address: String,
    /// `None` requests full history
    pub cursor: Option<u64>,
}

/// Chain state at `cursor`, plus operations newer than the request cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainSnapshot {
    pub cursor: u64,
    pub fresh_address: String,
    pub fresh_address_path: String,
    pub balance: Amount,
    pub operations: Vec<Operation>,
    pub resources: AccountResources,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkInfo {
    /// Fee per byte levels
    Bitcoin(FeeLevels),
    /// Gas price levels
    Ethereum(FeeLevels),
    Ripple(RippleNetworkInfo),
}

impl NetworkInfo {
    pub fn family(&self) -> CurrencyFamily {
        match self {
            NetworkInfo::Bitcoin(_) => CurrencyFamily::Bitcoin,
            NetworkInfo::Ethereum(_) => CurrencyFamily::Ethereum,
            NetworkInfo::Ripple(_) => CurrencyFamily::Ripple,
        }
    }
}

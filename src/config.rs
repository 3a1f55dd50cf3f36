//! Bridge configuration - timeouts, thresholds, fallback fees
//!
//! Built in code with the `with_*` methods or loaded from TOML. Missing keys
//! take their defaults.

use crate::amount::Amount;
use crate::chain::NetworkInfo;
use crate::currency::CurrencyFamily;
use crate::error::{BridgeError, BridgeResult};
use crate::transaction::{FeeLevels, RippleNetworkInfo};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Upper bound on a fee estimation lookup before falling back
    pub fee_timeout_ms: u64,
    /// Upper bound on a chain fetch during sync
    pub sync_timeout_ms: u64,
    /// Bitcoin change below this is folded into the fee
    pub dust_threshold: u64,
    /// `FeeTooHigh` warning once fees exceed this share of the amount
    pub fee_too_high_percent: u32,
    pub fallback_fee_per_byte: u64,
    pub fallback_gas_price: u64,
    pub fallback_ripple_fee: u64,
    pub fallback_ripple_reserve: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            fee_timeout_ms: 5_000,
            sync_timeout_ms: 30_000,
            dust_threshold: 546,
            fee_too_high_percent: 10,
            fallback_fee_per_byte: 10,
            fallback_gas_price: 20_000_000_000,
            fallback_ripple_fee: 12,
            fallback_ripple_reserve: 10_000_000,
        }
    }
}

impl BridgeConfig {
    pub fn from_toml_str(s: &str) -> BridgeResult<Self> {
        toml::from_str(s).map_err(|e| BridgeError::Config(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> BridgeResult<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .map_err(|e| BridgeError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&s)
    }

    pub fn with_fee_timeout(mut self, timeout: Duration) -> Self { self.fee_timeout_ms = timeout.as_millis() as u64; self }
    pub fn with_sync_timeout(mut self, timeout: Duration) -> Self { self.sync_timeout_ms = timeout.as_millis() as u64; self }
    pub fn with_dust_threshold(mut self, sats: u64) -> Self { self.dust_threshold = sats; self }
    pub fn with_fee_too_high_percent(mut self, percent: u32) -> Self { self.fee_too_high_percent = percent; self }

    pub fn fee_timeout(&self) -> Duration { Duration::from_millis(self.fee_timeout_ms) }
    pub fn sync_timeout(&self) -> Duration { Duration::from_millis(self.sync_timeout_ms) }
    pub fn dust(&self) -> Amount { Amount::from(self.dust_threshold) }

    /// Used when a fee lookup does not answer within `fee_timeout`.
    pub fn fallback_network_info(&self, family: CurrencyFamily) -> NetworkInfo {
        let flat = |v: u64| FeeLevels { slow: Amount::from(v), standard: Amount::from(v), fast: Amount::from(v) };
        match family {
            CurrencyFamily::Bitcoin => NetworkInfo::Bitcoin(flat(self.fallback_fee_per_byte)),
            CurrencyFamily::Ethereum => NetworkInfo::Ethereum(flat(self.fallback_gas_price)),
            CurrencyFamily::Ripple => NetworkInfo::Ripple(RippleNetworkInfo {
                server_fee: Amount::from(self.fallback_ripple_fee),
                base_reserve: Amount::from(self.fallback_ripple_reserve),
            }),
        }
    }
}

//! Registry - `(family, type, version)` to bridge
//!
//! Built once, immutable afterwards. A requested version resolves to the
//! exact revision or the highest registered one below it, so accounts
//! written by a newer client still find a compatible bridge.
//!
//! ```text
//! account.id ──decode──▶ (type, version, currency) ──▶ currency.family
//!                                                          │
//!               bridges[(family, type)] ── range(..=version).next_back()
//! ```

use super::{Bridge, BridgeContext};
use crate::account::Account;
use crate::chain::{ChainSource, MockChain};
use crate::config::BridgeConfig;
use crate::currency::{find_currency, CurrencyFamily};
use crate::error::{BridgeError, BridgeResult};
use once_cell::sync::OnceCell;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::debug;

static GLOBAL: OnceCell<BridgeRegistry> = OnceCell::new();

#[derive(Debug, Clone, Default)]
pub struct BridgeRegistry {
    bridges: HashMap<(CurrencyFamily, String), BTreeMap<u32, Bridge>>,
}

impl BridgeRegistry {
    pub fn builder() -> BridgeRegistryBuilder { BridgeRegistryBuilder::default() }

    /// Every family wired to a deterministic [`MockChain`] under each
    /// variant name (`explorer`, `node`, `node` v2 for ripple, `mock`).
    pub fn mock(config: BridgeConfig) -> Self {
        let chain: Arc<dyn ChainSource> = Arc::new(MockChain::new());
        Self::builder()
            .with_config(config)
            .register_all("explorer", 1, Arc::clone(&chain))
            .register(CurrencyFamily::Ethereum, "node", 1, Arc::clone(&chain))
            .register(CurrencyFamily::Ripple, "node", 1, Arc::clone(&chain))
            .register(CurrencyFamily::Ripple, "node", 2, Arc::clone(&chain))
            .register_all("mock", 1, chain)
            .build()
    }

    pub fn resolve(&self, account: &Account) -> BridgeResult<Bridge> {
        let identity = account.identity()?;
        if identity.currency_id != account.currency.id {
            return Err(BridgeError::malformed(
                &account.id,
                format!("currency '{}' does not match account currency '{}'", identity.currency_id, account.currency.id),
            ));
        }
        self.lookup(&identity.currency_id, &identity.type_, &identity.version)
    }

    /// Resolve by identity fields alone.
    pub fn lookup(&self, currency_id: &str, type_: &str, version: &str) -> BridgeResult<Bridge> {
        let unsupported = || BridgeError::UnsupportedBridge {
            currency: currency_id.to_string(),
            type_: type_.to_string(),
            version: version.to_string(),
        };
        let requested: u32 = version
            .parse()
            .map_err(|_| BridgeError::malformed(version, format!("version '{}' is not a number", version)))?;
        let currency = find_currency(currency_id).ok_or_else(unsupported)?;
        let (resolved, bridge) = self
            .bridges
            .get(&(currency.family, type_.to_string()))
            .and_then(|versions| versions.range(..=requested).next_back())
            .ok_or_else(unsupported)?;
        debug!(currency = currency_id, type_ = type_, requested, resolved = *resolved, "bridge resolved");
        Ok(bridge.clone())
    }

    /// Registered `(family, type, version)` triples, sorted.
    pub fn variants(&self) -> Vec<(CurrencyFamily, String, u32)> {
        let mut out: Vec<_> = self
            .bridges
            .iter()
            .flat_map(|((family, type_), versions)| versions.keys().map(move |v| (*family, type_.clone(), *v)))
            .collect();
        out.sort_by(|a, b| (a.0.as_str(), &a.1, a.2).cmp(&(b.0.as_str(), &b.1, b.2)));
        out
    }
}

#[derive(Default)]
pub struct BridgeRegistryBuilder {
    config: Arc<BridgeConfig>,
    entries: Vec<(CurrencyFamily, String, u32, Arc<dyn ChainSource>)>,
}

impl BridgeRegistryBuilder {
    /// Applies to every bridge, including those registered before.
    pub fn with_config(mut self, config: BridgeConfig) -> Self { self.config = Arc::new(config); self }

    pub fn register(mut self, family: CurrencyFamily, type_: impl Into<String>, version: u32, source: Arc<dyn ChainSource>) -> Self {
        self.entries.push((family, type_.into(), version, source));
        self
    }

    pub fn register_all(self, type_: &str, version: u32, source: Arc<dyn ChainSource>) -> Self {
        CurrencyFamily::ALL
            .iter()
            .fold(self, |builder, family| builder.register(*family, type_, version, Arc::clone(&source)))
    }

    /// Later registrations of the same triple replace earlier ones.
    pub fn build(self) -> BridgeRegistry {
        let mut bridges: HashMap<(CurrencyFamily, String), BTreeMap<u32, Bridge>> = HashMap::new();
        for (family, type_, version, source) in self.entries {
            let context = BridgeContext::new(type_.clone(), version, source, Arc::clone(&self.config));
            bridges.entry((family, type_)).or_default().insert(version, Bridge::new(family, context));
        }
        BridgeRegistry { bridges }
    }
}

/// Install the process-wide registry. Fails if one is already installed.
pub fn install_global(registry: BridgeRegistry) -> BridgeResult<()> {
    GLOBAL
        .set(registry)
        .map_err(|_| BridgeError::Config("global bridge registry already installed".into()))
}

pub fn global() -> BridgeResult<&'static BridgeRegistry> {
    GLOBAL.get().ok_or_else(|| BridgeError::Config("global bridge registry not installed".into()))
}

/// Resolve against the global registry.
pub fn get_account_bridge(account: &Account) -> BridgeResult<Bridge> { global()?.resolve(account) }

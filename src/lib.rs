//! Account Bridge: sync, build, validate and price transactions the same way
//! for every currency family.
//!
//! # Architecture
//!
//! ```text
//! BridgeRegistry (immutable, built once)
//!   │ resolve(account)  ← account.id = "type:version:currency:xpub:mode"
//!   ▼
//! Bridge ─┬── BitcoinBridge   (UTXO selection, fee per byte)
//!         ├── EthereumBridge  (gas price × gas limit)
//!         └── RippleBridge    (flat fee, reserve)
//!              │
//!              └── BridgeContext
//!                    ├── ChainSource  (fetch_account, fetch_network_info)
//!                    └── BridgeConfig (timeouts, dust, fallback fees)
//! ```
//!
//! # Capabilities
//!
//! | Method | Returns | Description |
//! |--------|---------|-------------|
//! | start_sync | `SyncStream` | Cold stream of `AccountPatch`, cancelled on drop |
//! | create_transaction | `Transaction` | Empty draft, pure |
//! | prepare_transaction | `Arc<Transaction>` | Loads fees, same `Arc` once stable |
//! | get_transaction_status | `TransactionStatus` | Recipient and transaction errors as data |
//!
//! # Usage
//!
//! ```ignore
//! use account_bridge::{AccountBridge, BridgeConfig, BridgeRegistry};
//! use std::sync::Arc;
//!
//! let registry = BridgeRegistry::mock(BridgeConfig::default());
//! let bridge = registry.resolve(&account)?;
//!
//! let account = bridge.sync(&account, false).await?;
//! let draft = Arc::new(bridge.create_transaction(&account).with_recipient(to).with_amount(1_000u64));
//! let prepared = bridge.prepare_transaction(&account, &draft).await?;
//! let status = bridge.get_transaction_status(&account, &prepared);
//! ```

pub mod account;
pub mod amount;
pub mod bridge;
pub mod chain;
pub mod config;
pub mod currency;
pub mod error;
pub mod families;
pub mod logging;
pub mod transaction;

pub use account::{
    decode_account_id, encode_account_id, from_account_raw, switch_account_bridge, to_account_raw, Account, AccountIdentity,
    AccountRaw, AccountResources, Operation, OperationType, Utxo,
};
pub use amount::Amount;
pub use bridge::{
    get_account_bridge, install_global, settle, AccountBridge, AccountPatch, Bridge, BridgeContext, BridgeRegistry, SyncStream,
};
pub use chain::{ChainSnapshot, ChainSource, MockChain, NetworkInfo, SyncRequest};
pub use config::BridgeConfig;
pub use currency::{find_currency, Currency, CurrencyFamily};
pub use error::{BridgeError, BridgeResult, ErrorKind, StatusError, StatusWarning};
pub use transaction::{
    from_transaction_raw, to_transaction_raw, BitcoinTransaction, EthereumTransaction, FamilyTransaction, FeeLevels, FeeState,
    RippleNetworkInfo, RippleTransaction, Transaction, TransactionRaw, TransactionStatus, UtxoStrategy,
};

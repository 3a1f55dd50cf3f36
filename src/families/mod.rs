//! Per-family bridges
//!
//! | Family | Fee field | Spendable | Address check |
//! |--------|-----------|-----------|---------------|
//! | bitcoin | `fee_per_byte` × estimated size | UTXO selection | base58check / bech32 |
//! | ethereum | `gas_price` × gas limit | balance | hex + EIP-55 |
//! | ripple | `fee` in drops | balance − reserve | ripple base58check |

pub mod bitcoin;
pub mod ethereum;
pub mod ripple;

pub use self::bitcoin::BitcoinBridge;
pub use self::ethereum::EthereumBridge;
pub use self::ripple::RippleBridge;

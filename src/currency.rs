//! Currencies and their families

use serde::{Deserialize, Serialize};
use std::fmt;

/// Protocol family. One bridge implementation per family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurrencyFamily { Bitcoin, Ethereum, Ripple }

impl CurrencyFamily {
    pub const ALL: [CurrencyFamily; 3] = [CurrencyFamily::Bitcoin, CurrencyFamily::Ethereum, CurrencyFamily::Ripple];

    pub fn as_str(&self) -> &'static str {
        match self { CurrencyFamily::Bitcoin => "bitcoin", CurrencyFamily::Ethereum => "ethereum", CurrencyFamily::Ripple => "ripple" }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "bitcoin" => Some(CurrencyFamily::Bitcoin),
            "ethereum" => Some(CurrencyFamily::Ethereum),
            "ripple" => Some(CurrencyFamily::Ripple),
            _ => None,
        }
    }
}

impl fmt::Display for CurrencyFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Currency {
    pub id: &'static str,
    pub family: CurrencyFamily,
    pub ticker: &'static str,
    /// Decimal places of the display unit
    pub magnitude: u32,
    /// Address network for bitcoin-like currencies
    pub bitcoin_network: Option<bitcoin::Network>,
}

pub const BITCOIN: Currency = Currency { id: "bitcoin", family: CurrencyFamily::Bitcoin, ticker: "BTC", magnitude: 8, bitcoin_network: Some(bitcoin::Network::Bitcoin) };
pub const BITCOIN_TESTNET: Currency = Currency { id: "bitcoin_testnet", family: CurrencyFamily::Bitcoin, ticker: "tBTC", magnitude: 8, bitcoin_network: Some(bitcoin::Network::Testnet) };
pub const ETHEREUM: Currency = Currency { id: "ethereum", family: CurrencyFamily::Ethereum, ticker: "ETH", magnitude: 18, bitcoin_network: None };
pub const ETHEREUM_ROPSTEN: Currency = Currency { id: "ethereum_ropsten", family: CurrencyFamily::Ethereum, ticker: "tETH", magnitude: 18, bitcoin_network: None };
pub const RIPPLE: Currency = Currency { id: "ripple", family: CurrencyFamily::Ripple, ticker: "XRP", magnitude: 6, bitcoin_network: None };

pub const ALL: &[Currency] = &[BITCOIN, BITCOIN_TESTNET, ETHEREUM, ETHEREUM_ROPSTEN, RIPPLE];

pub fn find_currency(id: &str) -> Option<&'static Currency> {
    ALL.iter().find(|c| c.id == id)
}

//! Account identity codec
//!
//! `type:version:currency_id:xpub_or_address:derivation_mode`
//!
//! Five fields, `:` separated. A literal `%` or `:` inside a field is written
//! `%25` / `%3A`, so splitting on `:` is always unambiguous.

use crate::error::{BridgeError, BridgeResult};
use serde::{Deserialize, Serialize};

const DELIMITER: char = ':';
const FIELDS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountIdentity {
    /// Bridge implementation variant (`explorer`, `node`, `mock`, ...)
    #[serde(rename = "type")]
    pub type_: String,
    /// Revision of that variant
    pub version: String,
    pub currency_id: String,
    pub xpub_or_address: String,
    pub derivation_mode: String,
}

impl AccountIdentity {
    pub fn new(type_: impl Into<String>, version: impl Into<String>, currency_id: impl Into<String>, xpub_or_address: impl Into<String>) -> Self {
        Self {
            type_: type_.into(),
            version: version.into(),
            currency_id: currency_id.into(),
            xpub_or_address: xpub_or_address.into(),
            derivation_mode: String::new(),
        }
    }

    pub fn with_derivation_mode(mut self, mode: impl Into<String>) -> Self { self.derivation_mode = mode.into(); self }

    /// Same account bound to another bridge variant. Every other field is kept.
    pub fn with_bridge(mut self, type_: impl Into<String>, version: impl Into<String>) -> Self {
        self.type_ = type_.into();
        self.version = version.into();
        self
    }

    pub fn encode(&self) -> String { encode_account_id(self) }
}

pub fn encode_account_id(identity: &AccountIdentity) -> String {
    [
        identity.type_.as_str(),
        identity.version.as_str(),
        identity.currency_id.as_str(),
        identity.xpub_or_address.as_str(),
        identity.derivation_mode.as_str(),
    ]
    .iter()
    .map(|field| escape(field))
    .collect::<Vec<_>>()
    .join(":")
}

pub fn decode_account_id(id: &str) -> BridgeResult<AccountIdentity> {
    let parts: Vec<&str> = id.split(DELIMITER).collect();
    if parts.len() != FIELDS {
        return Err(BridgeError::malformed(id, format!("expected {} fields, got {}", FIELDS, parts.len())));
    }
    let fields = parts
        .iter()
        .map(|p| unescape(p).ok_or_else(|| BridgeError::malformed(id, format!("bad escape in '{}'", p))))
        .collect::<BridgeResult<Vec<String>>>()?;

    let mut fields = fields.into_iter();
    let mut next = || fields.next().unwrap_or_default();
    let identity = AccountIdentity {
        type_: next(),
        version: next(),
        currency_id: next(),
        xpub_or_address: next(),
        derivation_mode: next(),
    };
    if identity.type_.is_empty() { return Err(BridgeError::malformed(id, "empty type")); }
    if identity.version.is_empty() { return Err(BridgeError::malformed(id, "empty version")); }
    if identity.currency_id.is_empty() { return Err(BridgeError::malformed(id, "empty currency")); }
    Ok(identity)
}

/// Rebind an encoded account id to another bridge variant.
pub fn switch_account_bridge(id: &str, type_: &str, version: &str) -> BridgeResult<String> {
    Ok(decode_account_id(id)?.with_bridge(type_, version).encode())
}

fn escape(field: &str) -> String {
    field.replace('%', "%25").replace(':', "%3A")
}

fn unescape(field: &str) -> Option<String> {
    let mut out = String::with_capacity(field.len());
    let mut chars = field.chars();
    while let Some(c) = chars.next() {
        if c != '%' { out.push(c); continue; }
        let code: String = chars.by_ref().take(2).collect();
        match code.as_str() {
            "25" => out.push('%'),
            "3A" => out.push(':'),
            _ => return None,
        }
    }
    Some(out)
}

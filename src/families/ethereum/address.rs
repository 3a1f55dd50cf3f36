//! Ethereum addresses: `0x` + 40 hex digits, EIP-55 checksum when mixed case

use sha3::{Digest, Keccak256};

pub fn is_valid_address(address: &str) -> bool {
    let Some(body) = address.strip_prefix("0x") else { return false };
    if body.len() != 40 || !body.bytes().all(|b| b.is_ascii_hexdigit()) {
        return false;
    }
    let has_lower = body.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = body.bytes().any(|b| b.is_ascii_uppercase());
    if !(has_lower && has_upper) {
        return true;
    }
    checksum_encode(&body.to_ascii_lowercase()) == address
}

/// EIP-55 mixed case encoding of a 20-byte address.
pub(crate) fn to_checksum_address(bytes: &[u8; 20]) -> String {
    checksum_encode(&hex::encode(bytes))
}

fn checksum_encode(lower_hex: &str) -> String {
    let hash = Keccak256::digest(lower_hex.as_bytes());
    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (i, c) in lower_hex.chars().enumerate() {
        let nibble = (hash[i / 2] >> if i % 2 == 0 { 4 } else { 0 }) & 0x0f;
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

pub(crate) fn same_address(a: &str, b: &str) -> bool { a.eq_ignore_ascii_case(b) }

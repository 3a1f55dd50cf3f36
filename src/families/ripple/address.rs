//! Ripple classic addresses: version 0 + 20-byte account id, base58check with
//! the ripple alphabet.

const ACCOUNT_ID_VERSION: u8 = 0;

pub fn is_valid_address(address: &str) -> bool {
    address.starts_with('r')
        && bs58::decode(address)
            .with_alphabet(bs58::Alphabet::RIPPLE)
            .with_check(Some(ACCOUNT_ID_VERSION))
            .into_vec()
            .map(|payload| payload.len() == 21)
            .unwrap_or(false)
}

pub(crate) fn encode_address(account_id: &[u8; 20]) -> String {
    bs58::encode(account_id)
        .with_alphabet(bs58::Alphabet::RIPPLE)
        .with_check_version(ACCOUNT_ID_VERSION)
        .into_string()
}

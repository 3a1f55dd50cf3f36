//! Bitcoin address checks, delegated to the `bitcoin` crate

use ::bitcoin::address::NetworkUnchecked;
use ::bitcoin::hashes::Hash;
use ::bitcoin::{Address, Network, PubkeyHash};

/// Valid base58check or bech32(m) address for `network`.
pub fn is_valid_address(address: &str, network: Network) -> bool {
    address
        .parse::<Address<NetworkUnchecked>>()
        .ok()
        .and_then(|a| a.require_network(network).ok())
        .is_some()
}

/// P2PKH address for a 20-byte key hash.
pub(crate) fn p2pkh_address(key_hash: [u8; 20], network: Network) -> String {
    Address::p2pkh(PubkeyHash::from_byte_array(key_hash), network).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mainnet_formats() {
        assert!(is_valid_address("39KaU7ksuQqmEGzLUCZzb9VYMm2H5yQ3QL", Network::Bitcoin));
        assert!(is_valid_address("1FMpdbiC8dj7kHJ8tPWFcihvAcqEqramoN", Network::Bitcoin));
        assert!(is_valid_address("bc1qwqfns0rs5zxrrwf80k4xlp4lpnuyc69feh2r3d", Network::Bitcoin));
    }

    #[test]
    fn test_rejects() {
        assert!(!is_valid_address("", Network::Bitcoin));
        assert!(!is_valid_address("invalidADDRESS", Network::Bitcoin));
        // lowercased base58 address
        assert!(!is_valid_address("dcovduyafuefmk2qvuw5xdtaunla2lp72n", Network::Bitcoin));
        // right format, wrong network
        assert!(!is_valid_address("1FMpdbiC8dj7kHJ8tPWFcihvAcqEqramoN", Network::Testnet));
    }

    #[test]
    fn test_p2pkh_round_trip() {
        let address = p2pkh_address([7u8; 20], Network::Testnet);
        assert!(is_valid_address(&address, Network::Testnet));
        assert!(!is_valid_address(&address, Network::Bitcoin));
    }
}

//! Hashing used to identify Bitcoin blocks and transactions.

use sha2::{Digest, Sha256};
use crate::types::Hash;

/// Compute the SHA-256 hash of the input data.
pub fn hash_sha256(data: &[u8]) -> Hash {
    let result = Sha256::digest(data);
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}

/// SHA-256 applied twice, as Bitcoin hashes headers and transactions.
pub fn double_sha256(data: &[u8]) -> Hash {
    hash_sha256(&hash_sha256(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_sha256_known_vector() {
        assert_eq!(
            hash_sha256(b"abc"),
            hex!("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
        );
    }

    #[test]
    fn test_double_sha256_empty() {
        assert_eq!(
            double_sha256(b""),
            hex!("5df6e0e2761359d30a8275058e299fcc0381534545f55cf43e41983f5d4c9456")
        );
    }

    #[test]
    fn test_double_sha256_deterministic() {
        assert_eq!(double_sha256(b"block"), double_sha256(b"block"));
        assert_ne!(double_sha256(b"block"), double_sha256(b"blocks"));
    }
}

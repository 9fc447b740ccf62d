//! Core type aliases and constants shared by the Bitcoin and Ethereum records.

use alloc::string::String;
use alloc::vec::Vec;

/// 32-byte hash (block hashes, merkle roots, trie roots).
pub type Hash = [u8; 32];

/// 20-byte Ethereum account address.
pub type Address = [u8; 20];

/// Length of an Ethereum logs bloom filter in bytes.
pub const BLOOM_LEN: usize = 256;

/// Length of the fixed Bitcoin block header in bytes.
pub const BITCOIN_HEADER_LEN: usize = 80;

/// Length of the `magic | size` preamble in front of every block in a blk file.
pub const BLK_PREAMBLE_LEN: usize = 8;

/// A zero-valued hash (32 zero bytes).
pub const ZERO_HASH: Hash = [0u8; 32];

/// A zero-valued address (20 zero bytes).
pub const ZERO_ADDRESS: Address = [0u8; 20];

/// Lowercase hex of a byte string, `0x` prefixed.
pub fn hash_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(2 + bytes.len() * 2);
    s.push_str("0x");
    s.push_str(&hex::encode(bytes));
    s
}

/// Hex of a hash in Bitcoin's display order (byte-reversed, no prefix).
pub fn reversed_hex(hash: &Hash) -> String {
    let mut reversed = *hash;
    reversed.reverse();
    hex::encode(reversed)
}

/// Interpret a big-endian byte string as a `u64`.
///
/// Leading zero bytes are ignored. Returns `None` when more than eight
/// significant bytes remain.
pub fn be_bytes_to_u64(bytes: &[u8]) -> Option<u64> {
    let significant = match bytes.iter().position(|b| *b != 0) {
        Some(first) => &bytes[first..],
        None => return Some(0),
    };
    if significant.len() > 8 {
        return None;
    }
    Some(significant.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b)))
}

/// Minimal big-endian representation of a `u64` (empty for zero).
pub fn u64_to_be_trimmed(value: u64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    bytes[first..].to_vec()
}

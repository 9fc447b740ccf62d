//! `blocksplit-primitives`: block record types and wire codecs.
//!
//! This crate provides the Bitcoin and Ethereum block records, the VarInt
//! and RLP codecs they are framed with, and the hashing used to identify
//! Bitcoin blocks and transactions. Decoding works on in-memory byte
//! slices; streaming and split handling live in `blocksplit-reader`.
//!
//! Supports `#![no_std]` (use `default-features = false`).

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod types;
pub mod error;
pub mod codec;
pub mod varint;
pub mod rlp;
pub mod crypto;
pub mod bitcoin;
pub mod ethereum;

// Re-export commonly used types at the crate root for convenience.
pub use types::{Hash, Address, BITCOIN_HEADER_LEN, BLK_PREAMBLE_LEN, BLOOM_LEN};
pub use error::{CodecError, CodecResult};
pub use codec::ByteReader;
pub use rlp::{RlpHeader, RlpItem};
pub use bitcoin::{
    BitcoinBlock, BitcoinBlockHeader, BitcoinTransaction, BitcoinTxInput, BitcoinTxOutput,
    BlockMagic,
};
pub use ethereum::{
    EthereumBlock, EthereumBlockHeader, EthereumTransaction, DEFAULT_MAX_EXTRA_DATA,
};

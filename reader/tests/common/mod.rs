//! Shared test helpers for integration tests.
//!
//! Provides block fixtures, blk-file builders, a short-read source and
//! decoder shortcuts used across all integration test files.

#![allow(dead_code)]

use std::io::{self, Cursor, Read, Seek, SeekFrom};

use hex_literal::hex;

use blocksplit_primitives::{
    BitcoinBlock, BitcoinBlockHeader, BitcoinTransaction, BitcoinTxInput, BitcoinTxOutput,
    BlockMagic,
};
use blocksplit_reader::{BlockDecoder, ChainFormat, ReadError, ReaderConfig, Record, SplitRange};

// ── Fixtures ──

/// The Ethereum main-net genesis block as stored in a block file.
pub const ETH_GENESIS: [u8; 540] = hex!(
    "f90219f90214a000000000000000000000000000000000000000000000000000"
    "00000000000000a01dcc4de8dec75d7aab85b567b6ccd41ad312451b948a7413"
    "f0a142fd40d49347940000000000000000000000000000000000000000a0d7f8"
    "974fb5ac78d9ac099b9ad5018bedc2ce0a72dad1827a1709da30580f0544a056"
    "e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421a0"
    "56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421"
    "b901000000000000000000000000000000000000000000000000000000000000"
    "0000000000000000000000000000000000000000000000000000000000000000"
    "0000000000000000000000000000000000000000000000000000000000000000"
    "0000000000000000000000000000000000000000000000000000000000000000"
    "0000000000000000000000000000000000000000000000000000000000000000"
    "0000000000000000000000000000000000000000000000000000000000000000"
    "0000000000000000000000000000000000000000000000000000000000000000"
    "0000000000000000000000000000000000000000000000000000000000000000"
    "000000850400000000808213888080a011bbe8db4e347b4e8c937c1c8370e4b5"
    "ed33adb3db69cbdb7a38e1e50b1b82faa0000000000000000000000000000000"
    "0000000000000000000000000000000000880000000000000042c0c0"
);

/// The Bitcoin main-net genesis block body (after magic and size).
pub const BTC_GENESIS_BODY: [u8; 285] = hex!(
    "0100000000000000000000000000000000000000000000000000000000000000"
    "000000003ba3edfd7a7b12b27ac72c3e67768f617fc81bc3888a51323a9fb8aa"
    "4b1e5e4a29ab5f49ffff001d1dac2b7c01010000000100000000000000000000"
    "00000000000000000000000000000000000000000000ffffffff4d04ffff001d"
    "0104455468652054696d65732030332f4a616e2f32303039204368616e63656c"
    "6c6f72206f6e206272696e6b206f66207365636f6e64206261696c6f75742066"
    "6f722062616e6b73ffffffff0100f2052a01000000434104678afdb0fe554827"
    "1967f1a67130b7105cd6a828e03909a67962e0ea1f61deb649f6bc3f4cef38c4"
    "f35504e51ec112de5c384df7ba0b8d578a4c702b6bf11d5fac00000000"
);

pub const BTC_GENESIS_HASH: &str =
    "000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f";

// ── Bitcoin Block Builders ──

/// Deterministic transaction; odd indices carry witness data.
pub fn sample_tx(seed: u8, index: usize) -> BitcoinTransaction {
    let segwit = index % 2 == 1;
    BitcoinTransaction {
        version: 2,
        flag: segwit.then_some(1),
        inputs: vec![BitcoinTxInput {
            previous_tx_hash: [index as u8; 32],
            previous_output_index: index as u32,
            script_sig: vec![seed, index as u8, 0x51],
            sequence: 0xffff_fffe,
            witness: if segwit {
                vec![vec![seed; 3], vec![0x21; 33]]
            } else {
                Vec::new()
            },
        }],
        outputs: vec![
            BitcoinTxOutput {
                value: 50_000 * (index as u64 + 1),
                script_pubkey: vec![0x00, 0x14, seed, 0x22],
            },
            BitcoinTxOutput {
                value: 1_000,
                script_pubkey: vec![0x6a],
            },
        ],
        lock_time: 0,
    }
}

/// Deterministic block with `tx_count` transactions.
pub fn sample_block(magic: BlockMagic, seed: u8, tx_count: usize) -> BitcoinBlock {
    let draft = BitcoinBlock {
        magic,
        block_size: 0,
        header: BitcoinBlockHeader {
            version: 0x2000_0000,
            previous_block_hash: [seed; 32],
            merkle_root: [seed.wrapping_add(1); 32],
            time: 1_600_000_000 + u32::from(seed),
            bits: 0x1d00_ffff,
            nonce: u32::from(seed) * 7,
        },
        transaction_count: tx_count as u64,
        transactions: (0..tx_count).map(|i| sample_tx(seed, i)).collect(),
    };
    // decode the canonical body so `block_size` matches what a reader reports
    BitcoinBlock::decode_body(magic, &draft.encode()).expect("sample block decodes")
}

/// Main-net blocks with 1..=n transactions each.
pub fn sample_chain(n: usize) -> Vec<BitcoinBlock> {
    (0..n)
        .map(|i| sample_block(BlockMagic::MAINNET, i as u8 + 1, i % 4 + 1))
        .collect()
}

/// Concatenate blocks into a blk file.
pub fn blk_file(blocks: &[BitcoinBlock]) -> Vec<u8> {
    blocks.iter().flat_map(|b| b.to_blk_bytes().expect("blk entry")).collect()
}

/// Absolute offsets of each block's magic in [`blk_file`] output.
pub fn blk_offsets(blocks: &[BitcoinBlock]) -> Vec<u64> {
    let mut offset = 0u64;
    blocks
        .iter()
        .map(|b| {
            let start = offset;
            offset += 8 + u64::from(b.block_size);
            start
        })
        .collect()
}

// ── Configuration ──

/// Bitcoin config with small records so tests allocate little.
pub fn bitcoin_config() -> ReaderConfig {
    ReaderConfig::bitcoin()
        .with_max_record_size(4096)
        .with_buffer_capacity(4096)
}

pub fn ethereum_config() -> ReaderConfig {
    ReaderConfig::ethereum()
        .with_max_record_size(4096)
        .with_buffer_capacity(8192)
}

// ── Sources ──

/// In-memory source that returns at most `chunk` bytes per read.
pub struct ChunkedReader {
    inner: Cursor<Vec<u8>>,
    chunk: usize,
}

impl ChunkedReader {
    pub fn new(data: Vec<u8>, chunk: usize) -> Self {
        Self {
            inner: Cursor::new(data),
            chunk,
        }
    }
}

impl Read for ChunkedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.chunk);
        self.inner.read(&mut buf[..n])
    }
}

impl Seek for ChunkedReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

// ── Decoding Shortcuts ──

/// Every result a decoder produces over `range`, errors included.
pub fn collect<R: Read + Seek>(
    source: R,
    range: SplitRange,
    format: ChainFormat,
    config: &ReaderConfig,
) -> Vec<Result<Record, ReadError>> {
    BlockDecoder::open(source, range, format, config)
        .expect("decoder opens")
        .collect()
}

/// Records over `range`, failing the test on any error.
pub fn decode_range<R: Read + Seek>(
    source: R,
    range: SplitRange,
    format: ChainFormat,
    config: &ReaderConfig,
) -> Vec<Record> {
    collect(source, range, format, config)
        .into_iter()
        .map(|r| r.expect("record decodes"))
        .collect()
}

pub fn bitcoin_blocks(records: Vec<Record>) -> Vec<BitcoinBlock> {
    records
        .into_iter()
        .map(|r| r.into_bitcoin().expect("bitcoin record"))
        .collect()
}

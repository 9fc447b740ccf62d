//! Determinism tests: identical input must give identical records,
//! whatever the buffer backing, buffer size or read chunking.

mod common;

use std::io::Cursor;

use blocksplit_reader::{BufferBacking, ChainFormat, Record, SplitRange};

use common::*;

fn bitcoin_file() -> Vec<u8> {
    blk_file(&sample_chain(12))
}

fn ethereum_file() -> Vec<u8> {
    (0..6).flat_map(|_| ETH_GENESIS).collect()
}

// ── Test: 5-run identical output ──

#[test]
fn test_five_run_identical_output() {
    let data = bitcoin_file();
    let runs: Vec<Vec<Record>> = (0..5)
        .map(|_| {
            decode_range(
                Cursor::new(data.clone()),
                SplitRange::whole(),
                ChainFormat::Bitcoin,
                &bitcoin_config(),
            )
        })
        .collect();

    let first = &runs[0];
    assert_eq!(first.len(), 12);
    for (i, run) in runs.iter().enumerate().skip(1) {
        assert_eq!(first, run, "run {} differs", i);
    }
}

// ── Test: buffer configuration does not change results ──

#[test]
fn test_backing_and_capacity_invariance() {
    for (format, data) in [
        (ChainFormat::Bitcoin, bitcoin_file()),
        (ChainFormat::Ethereum, ethereum_file()),
    ] {
        let base = match format {
            ChainFormat::Bitcoin => bitcoin_config(),
            ChainFormat::Ethereum => ethereum_config(),
        };
        let reference = decode_range(Cursor::new(data.clone()), SplitRange::whole(), format, &base);
        assert!(!reference.is_empty());

        for backing in [BufferBacking::Heap, BufferBacking::PageAligned] {
            for capacity in [4096, 5000, 65536] {
                let config = base
                    .clone()
                    .with_max_record_size(4096)
                    .with_buffer_capacity(capacity)
                    .with_backing(backing);
                let records = decode_range(
                    ChunkedReader::new(data.clone(), 333),
                    SplitRange::whole(),
                    format,
                    &config,
                );
                assert_eq!(records, reference, "{format} {backing:?} capacity {capacity}");
            }
        }
    }
}

// ── Test: canonical re-encoding ──

#[test]
fn test_reencoding_reproduces_source_bytes() {
    let data = bitcoin_file();
    let encoded: Vec<u8> = decode_range(
        Cursor::new(data.clone()),
        SplitRange::whole(),
        ChainFormat::Bitcoin,
        &bitcoin_config(),
    )
    .into_iter()
    .flat_map(|r| r.into_bitcoin().unwrap().to_blk_bytes().unwrap())
    .collect();
    assert_eq!(encoded, data);

    let data = ethereum_file();
    let encoded: Vec<u8> = decode_range(
        Cursor::new(data.clone()),
        SplitRange::whole(),
        ChainFormat::Ethereum,
        &ethereum_config(),
    )
    .into_iter()
    .flat_map(|r| r.into_ethereum().unwrap().encode())
    .collect();
    assert_eq!(encoded, data);
}

#[test]
fn test_block_hashes_stable_across_splits() {
    let data = bitcoin_file();
    let hashes = |split_size: u64| -> Vec<String> {
        SplitRange::partition(data.len() as u64, split_size)
            .into_iter()
            .flat_map(|range| {
                bitcoin_blocks(decode_range(
                    Cursor::new(data.clone()),
                    range,
                    ChainFormat::Bitcoin,
                    &bitcoin_config(),
                ))
            })
            .map(|block| block.hash_hex())
            .collect()
    };

    let whole = hashes(data.len() as u64);
    assert_eq!(whole.len(), 12);
    assert_eq!(hashes(128), whole);
    assert_eq!(hashes(1000), whole);
}

//! Ethereum block, header and transaction records.
//!
//! A block is one RLP list of exactly three items:
//!
//! ```text
//! [ header: [15 fields], transactions: [[9 fields], ...], uncles: [[15 fields], ...] ]
//! ```
//!
//! Fields are positional. Integer fields (difficulty, number, gas, timestamp,
//! transaction nonce/value/signature) stay raw big-endian byte strings
//! because RLP strips leading zeros and values may exceed 64 bits.

use alloc::vec;
use alloc::vec::Vec;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use crate::error::{CodecError, CodecResult};
use crate::rlp::{self, RlpItem};
use crate::types::{be_bytes_to_u64, Address, Hash, BLOOM_LEN};

/// Fields in a block or uncle header.
pub const HEADER_FIELDS: usize = 15;

/// Fields in a legacy transaction.
pub const TRANSACTION_FIELDS: usize = 9;

/// Upper bound on header extra data used by [`EthereumBlock::decode`] callers
/// that have no configuration of their own.
pub const DEFAULT_MAX_EXTRA_DATA: usize = 32;

/// Block header (also the schema of uncle headers).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EthereumBlockHeader {
    pub parent_hash: Hash,
    pub uncle_hash: Hash,
    /// Beneficiary address.
    pub coinbase: Address,
    pub state_root: Hash,
    pub tx_trie_root: Hash,
    pub receipt_trie_root: Hash,
    /// 256-byte logs bloom filter.
    pub logs_bloom: Vec<u8>,
    pub difficulty: Vec<u8>,
    pub number: Vec<u8>,
    pub gas_limit: Vec<u8>,
    pub gas_used: Vec<u8>,
    /// Seconds since the Unix epoch, big-endian.
    pub timestamp: Vec<u8>,
    pub extra_data: Vec<u8>,
    pub mix_hash: Hash,
    pub nonce: [u8; 8],
}

impl EthereumBlockHeader {
    /// Map a decoded header list onto its fields.
    pub fn from_rlp(item: &RlpItem, max_extra_data: usize) -> CodecResult<Self> {
        let f = fields(item, "block header", HEADER_FIELDS)?;

        let extra_data = bytes(&f[12], "extra data")?;
        if extra_data.len() > max_extra_data {
            return Err(CodecError::invalid_field(
                "extra data",
                alloc::format!("{} bytes exceeds maximum of {}", extra_data.len(), max_extra_data),
            ));
        }
        let logs_bloom = bytes(&f[6], "logs bloom")?;
        if logs_bloom.len() != BLOOM_LEN {
            return Err(width_error("logs bloom", BLOOM_LEN, logs_bloom.len()));
        }

        Ok(Self {
            parent_hash: fixed(&f[0], "parent hash")?,
            uncle_hash: fixed(&f[1], "uncle hash")?,
            coinbase: fixed(&f[2], "coinbase")?,
            state_root: fixed(&f[3], "state root")?,
            tx_trie_root: fixed(&f[4], "transactions root")?,
            receipt_trie_root: fixed(&f[5], "receipts root")?,
            logs_bloom: logs_bloom.to_vec(),
            difficulty: bytes(&f[7], "difficulty")?.to_vec(),
            number: bytes(&f[8], "number")?.to_vec(),
            gas_limit: bytes(&f[9], "gas limit")?.to_vec(),
            gas_used: bytes(&f[10], "gas used")?.to_vec(),
            timestamp: bytes(&f[11], "timestamp")?.to_vec(),
            extra_data: extra_data.to_vec(),
            mix_hash: fixed(&f[13], "mix hash")?,
            nonce: fixed(&f[14], "nonce")?,
        })
    }

    pub fn to_rlp(&self) -> RlpItem {
        RlpItem::list(vec![
            RlpItem::bytes(self.parent_hash),
            RlpItem::bytes(self.uncle_hash),
            RlpItem::bytes(self.coinbase),
            RlpItem::bytes(self.state_root),
            RlpItem::bytes(self.tx_trie_root),
            RlpItem::bytes(self.receipt_trie_root),
            RlpItem::bytes(self.logs_bloom.clone()),
            RlpItem::bytes(self.difficulty.clone()),
            RlpItem::bytes(self.number.clone()),
            RlpItem::bytes(self.gas_limit.clone()),
            RlpItem::bytes(self.gas_used.clone()),
            RlpItem::bytes(self.timestamp.clone()),
            RlpItem::bytes(self.extra_data.clone()),
            RlpItem::bytes(self.mix_hash),
            RlpItem::bytes(self.nonce),
        ])
    }

    pub fn number_u64(&self) -> Option<u64> {
        be_bytes_to_u64(&self.number)
    }

    pub fn gas_limit_u64(&self) -> Option<u64> {
        be_bytes_to_u64(&self.gas_limit)
    }

    pub fn gas_used_u64(&self) -> Option<u64> {
        be_bytes_to_u64(&self.gas_used)
    }

    pub fn timestamp_u64(&self) -> Option<u64> {
        be_bytes_to_u64(&self.timestamp)
    }

    /// Difficulty as an arbitrary-precision integer.
    pub fn difficulty_biguint(&self) -> BigUint {
        BigUint::from_bytes_be(&self.difficulty)
    }
}

/// A legacy (pre-typed-envelope) transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EthereumTransaction {
    pub nonce: Vec<u8>,
    pub gas_price: Vec<u8>,
    pub gas_limit: Vec<u8>,
    /// Recipient; `None` for contract creation.
    pub to: Option<Address>,
    pub value: Vec<u8>,
    pub data: Vec<u8>,
    pub v: Vec<u8>,
    pub r: Vec<u8>,
    pub s: Vec<u8>,
}

impl EthereumTransaction {
    pub fn from_rlp(item: &RlpItem) -> CodecResult<Self> {
        let f = fields(item, "transaction", TRANSACTION_FIELDS)?;

        let to = match bytes(&f[3], "recipient")? {
            [] => None,
            _ => Some(fixed(&f[3], "recipient")?),
        };

        Ok(Self {
            nonce: bytes(&f[0], "nonce")?.to_vec(),
            gas_price: bytes(&f[1], "gas price")?.to_vec(),
            gas_limit: bytes(&f[2], "gas limit")?.to_vec(),
            to,
            value: bytes(&f[4], "value")?.to_vec(),
            data: bytes(&f[5], "data")?.to_vec(),
            v: bytes(&f[6], "v")?.to_vec(),
            r: bytes(&f[7], "r")?.to_vec(),
            s: bytes(&f[8], "s")?.to_vec(),
        })
    }

    pub fn to_rlp(&self) -> RlpItem {
        let to = match &self.to {
            Some(address) => address.to_vec(),
            None => Vec::new(),
        };
        RlpItem::list(vec![
            RlpItem::bytes(self.nonce.clone()),
            RlpItem::bytes(self.gas_price.clone()),
            RlpItem::bytes(self.gas_limit.clone()),
            RlpItem::bytes(to),
            RlpItem::bytes(self.value.clone()),
            RlpItem::bytes(self.data.clone()),
            RlpItem::bytes(self.v.clone()),
            RlpItem::bytes(self.r.clone()),
            RlpItem::bytes(self.s.clone()),
        ])
    }

    pub fn is_contract_creation(&self) -> bool {
        self.to.is_none()
    }

    /// EIP-155 chain id encoded in `v`, if any.
    ///
    /// `v` is `27`/`28` for unprotected transactions and
    /// `chain_id * 2 + 35/36` for replay-protected ones.
    pub fn chain_id(&self) -> Option<u64> {
        let v = be_bytes_to_u64(&self.v)?;
        if v >= 35 {
            Some((v - 35) / 2)
        } else {
            None
        }
    }
}

/// A full block: header, transactions and uncle headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EthereumBlock {
    pub header: EthereumBlockHeader,
    pub transactions: Vec<EthereumTransaction>,
    pub uncles: Vec<EthereumBlockHeader>,
}

impl EthereumBlock {
    /// Decode one encoded block spanning all of `data`.
    pub fn decode(data: &[u8], max_extra_data: usize) -> CodecResult<Self> {
        let item = rlp::decode(data)?;
        Self::from_rlp(&item, max_extra_data)
    }

    pub fn from_rlp(item: &RlpItem, max_extra_data: usize) -> CodecResult<Self> {
        let parts = fields(item, "block", 3)?;
        let header = EthereumBlockHeader::from_rlp(&parts[0], max_extra_data)?;

        let transactions = list(&parts[1], "transaction list")?
            .iter()
            .map(EthereumTransaction::from_rlp)
            .collect::<CodecResult<Vec<_>>>()?;

        let uncles = list(&parts[2], "uncle list")?
            .iter()
            .map(|uncle| EthereumBlockHeader::from_rlp(uncle, max_extra_data))
            .collect::<CodecResult<Vec<_>>>()?;

        Ok(Self {
            header,
            transactions,
            uncles,
        })
    }

    pub fn to_rlp(&self) -> RlpItem {
        RlpItem::list(vec![
            self.header.to_rlp(),
            RlpItem::list(self.transactions.iter().map(EthereumTransaction::to_rlp).collect()),
            RlpItem::list(self.uncles.iter().map(EthereumBlockHeader::to_rlp).collect()),
        ])
    }

    pub fn encode(&self) -> Vec<u8> {
        rlp::encode(&self.to_rlp())
    }
}

// ── Field mapping helpers ──

fn list<'a>(item: &'a RlpItem, field: &'static str) -> CodecResult<&'a [RlpItem]> {
    item.as_list()
        .ok_or_else(|| CodecError::invalid_field(field, "expected a list, found a byte string"))
}

fn fields<'a>(item: &'a RlpItem, structure: &'static str, expected: usize) -> CodecResult<&'a [RlpItem]> {
    let items = list(item, structure)?;
    if items.len() != expected {
        return Err(CodecError::FieldCount {
            structure,
            expected,
            got: items.len(),
        });
    }
    Ok(items)
}

fn bytes<'a>(item: &'a RlpItem, field: &'static str) -> CodecResult<&'a [u8]> {
    item.as_bytes()
        .ok_or_else(|| CodecError::invalid_field(field, "expected a byte string, found a list"))
}

fn fixed<const N: usize>(item: &RlpItem, field: &'static str) -> CodecResult<[u8; N]> {
    let data = bytes(item, field)?;
    <[u8; N]>::try_from(data).map_err(|_| width_error(field, N, data.len()))
}

fn width_error(field: &'static str, expected: usize, got: usize) -> CodecError {
    CodecError::invalid_field(field, alloc::format!("expected {} bytes, got {}", expected, got))
}

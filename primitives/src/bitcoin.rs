//! Bitcoin block and transaction records as stored in blk files.
//!
//! ## Layout (little-endian)
//!
//! ```text
//! [magic: 4] [block_size: 4]                     <- preamble, read by the stream reader
//! [version: 4] [prev_block: 32] [merkle_root: 32]
//! [time: 4] [bits: 4] [nonce: 4]                 <- 80-byte header
//! [tx_count: varint] [transactions...]
//!
//! transaction:
//! [version: 4] ([0x00] [flag != 0])? [input_count: varint] [inputs...]
//! [output_count: varint] [outputs...] ([witness stacks...])? [lock_time: 4]
//! ```
//!
//! Scripts are kept as raw bytes and never interpreted.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};
use crate::codec::{write_hash, write_i32_le, write_u32_le, write_u64_le, ByteReader};
use crate::crypto::double_sha256;
use crate::error::{CodecError, CodecResult};
use crate::types::{Hash, BITCOIN_HEADER_LEN, ZERO_HASH};
use crate::varint::{encode_varint, encode_varint_bytes, read_varint_bytes, read_varint_len};

// Smallest encodings of each element; counts are bounded by what the input can still hold.
const MIN_TRANSACTION_LEN: usize = 10;
const MIN_INPUT_LEN: usize = 41;
const MIN_OUTPUT_LEN: usize = 9;
const MIN_WITNESS_ITEM_LEN: usize = 1;

/// Most elements reserved up front; longer vectors grow as items decode.
const MAX_PREALLOCATED: usize = 1024;

/// Capacity to reserve for `count` declared elements of at least `min_len` bytes each.
fn bounded_capacity(count: usize, remaining: usize, min_len: usize) -> usize {
    count.min(remaining / min_len).min(MAX_PREALLOCATED)
}

/// Four bytes marking the start of a block for one network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockMagic(pub [u8; 4]);

impl BlockMagic {
    pub const MAINNET: Self = Self([0xf9, 0xbe, 0xb4, 0xd9]);
    pub const TESTNET3: Self = Self([0x0b, 0x11, 0x09, 0x07]);
    pub const TESTNET4: Self = Self([0x1c, 0x16, 0x3f, 0x28]);
    pub const SIGNET: Self = Self([0x0a, 0x03, 0xcf, 0x40]);
    pub const REGTEST: Self = Self([0xfa, 0xbf, 0xb5, 0xda]);
    pub const NAMECOIN: Self = Self([0xf9, 0xbe, 0xb4, 0xfe]);

    pub const LEN: usize = 4;

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    pub fn matches(&self, candidate: &[u8]) -> bool {
        candidate.starts_with(&self.0)
    }
}

impl fmt::Display for BlockMagic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{:02X}", byte)?;
        }
        Ok(())
    }
}

impl FromStr for BlockMagic {
    type Err = CodecError;

    /// Parse eight hex digits such as `"F9BEB4D9"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut out = [0u8; 4];
        hex::decode_to_slice(s.trim(), &mut out)
            .map_err(|err| CodecError::invalid_field("magic", alloc::format!("{}", err)))?;
        Ok(Self(out))
    }
}

/// The fixed 80-byte block header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitcoinBlockHeader {
    pub version: i32,
    pub previous_block_hash: Hash,
    pub merkle_root: Hash,
    /// Seconds since the Unix epoch.
    pub time: u32,
    /// Compact difficulty target.
    pub bits: u32,
    pub nonce: u32,
}

impl BitcoinBlockHeader {
    pub fn decode(r: &mut ByteReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            version: r.read_i32_le()?,
            previous_block_hash: r.read_hash()?,
            merkle_root: r.read_hash()?,
            time: r.read_u32_le()?,
            bits: r.read_u32_le()?,
            nonce: r.read_u32_le()?,
        })
    }

    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        write_i32_le(buf, self.version);
        write_hash(buf, &self.previous_block_hash);
        write_hash(buf, &self.merkle_root);
        write_u32_le(buf, self.time);
        write_u32_le(buf, self.bits);
        write_u32_le(buf, self.nonce);
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(BITCOIN_HEADER_LEN);
        self.encode_into(&mut buf);
        buf
    }

    /// Block hash in internal byte order. Display with [`crate::types::reversed_hex`].
    pub fn hash(&self) -> Hash {
        double_sha256(&self.encode())
    }
}

/// A transaction input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitcoinTxInput {
    pub previous_tx_hash: Hash,
    pub previous_output_index: u32,
    pub script_sig: Vec<u8>,
    pub sequence: u32,
    /// Witness stack; empty for inputs of non-segwit transactions.
    pub witness: Vec<Vec<u8>>,
}

impl BitcoinTxInput {
    fn decode(r: &mut ByteReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            previous_tx_hash: r.read_hash()?,
            previous_output_index: r.read_u32_le()?,
            script_sig: read_varint_bytes(r)?.to_vec(),
            sequence: r.read_u32_le()?,
            witness: Vec::new(),
        })
    }

    fn encode_into(&self, buf: &mut Vec<u8>) {
        write_hash(buf, &self.previous_tx_hash);
        write_u32_le(buf, self.previous_output_index);
        encode_varint_bytes(&self.script_sig, buf);
        write_u32_le(buf, self.sequence);
    }
}

/// A transaction output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitcoinTxOutput {
    /// Amount in satoshis.
    pub value: u64,
    pub script_pubkey: Vec<u8>,
}

impl BitcoinTxOutput {
    fn decode(r: &mut ByteReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            value: r.read_u64_le()?,
            script_pubkey: read_varint_bytes(r)?.to_vec(),
        })
    }

    fn encode_into(&self, buf: &mut Vec<u8>) {
        write_u64_le(buf, self.value);
        encode_varint_bytes(&self.script_pubkey, buf);
    }
}

/// A transaction, with or without segregated witness data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitcoinTransaction {
    pub version: i32,
    /// Segwit flag byte; `None` for transactions in the original format.
    pub flag: Option<u8>,
    pub inputs: Vec<BitcoinTxInput>,
    pub outputs: Vec<BitcoinTxOutput>,
    pub lock_time: u32,
}

impl BitcoinTransaction {
    pub fn decode(r: &mut ByteReader<'_>) -> CodecResult<Self> {
        let version = r.read_i32_le()?;

        // marker 0x00 where the input count would be, followed by a non-zero flag
        let flag = match r.peek_bytes(2) {
            Some(&[0x00, flag]) if flag != 0 => {
                r.read_bytes(2)?;
                Some(flag)
            }
            _ => None,
        };

        let input_count = read_varint_len(r)?;
        let mut inputs =
            Vec::with_capacity(bounded_capacity(input_count, r.remaining(), MIN_INPUT_LEN));
        for _ in 0..input_count {
            inputs.push(BitcoinTxInput::decode(r)?);
        }

        let output_count = read_varint_len(r)?;
        let mut outputs =
            Vec::with_capacity(bounded_capacity(output_count, r.remaining(), MIN_OUTPUT_LEN));
        for _ in 0..output_count {
            outputs.push(BitcoinTxOutput::decode(r)?);
        }

        if flag.is_some() {
            for input in &mut inputs {
                let item_count = read_varint_len(r)?;
                let mut witness = Vec::with_capacity(bounded_capacity(
                    item_count,
                    r.remaining(),
                    MIN_WITNESS_ITEM_LEN,
                ));
                for _ in 0..item_count {
                    witness.push(read_varint_bytes(r)?.to_vec());
                }
                input.witness = witness;
            }
        }

        let lock_time = r.read_u32_le()?;

        Ok(Self {
            version,
            flag,
            inputs,
            outputs,
            lock_time,
        })
    }

    /// Serialize; witness data is only written when `include_witness` is set
    /// and the transaction carries a segwit flag.
    pub fn encode(&self, include_witness: bool) -> Vec<u8> {
        let mut buf = Vec::new();
        self.encode_into(include_witness, &mut buf);
        buf
    }

    pub fn encode_into(&self, include_witness: bool, buf: &mut Vec<u8>) {
        let flag = self.flag.filter(|_| include_witness);
        write_i32_le(buf, self.version);
        if let Some(flag) = flag {
            buf.push(0x00);
            buf.push(flag);
        }
        encode_varint(self.inputs.len() as u64, buf);
        for input in &self.inputs {
            input.encode_into(buf);
        }
        encode_varint(self.outputs.len() as u64, buf);
        for output in &self.outputs {
            output.encode_into(buf);
        }
        if flag.is_some() {
            for input in &self.inputs {
                encode_varint(input.witness.len() as u64, buf);
                for item in &input.witness {
                    encode_varint_bytes(item, buf);
                }
            }
        }
        write_u32_le(buf, self.lock_time);
    }

    pub fn is_segwit(&self) -> bool {
        self.flag.is_some()
    }

    pub fn is_coinbase(&self) -> bool {
        matches!(
            self.inputs.as_slice(),
            [input] if input.previous_tx_hash == ZERO_HASH && input.previous_output_index == u32::MAX
        )
    }

    /// Transaction id: hash of the serialization without witness data.
    pub fn txid(&self) -> Hash {
        double_sha256(&self.encode(false))
    }

    /// Witness transaction id; equals [`txid`](Self::txid) for non-segwit transactions.
    pub fn wtxid(&self) -> Hash {
        double_sha256(&self.encode(true))
    }
}

/// A decoded block together with the preamble it was framed by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitcoinBlock {
    pub magic: BlockMagic,
    /// Size declared in the preamble, in bytes.
    pub block_size: u32,
    pub header: BitcoinBlockHeader,
    /// Transaction count as declared by the varint in front of the transactions.
    pub transaction_count: u64,
    pub transactions: Vec<BitcoinTransaction>,
}

impl BitcoinBlock {
    /// Decode a block body, i.e. everything that follows `magic | size`.
    ///
    /// `body` must be exactly the declared size: a body that ends early is
    /// [`CodecError::UnexpectedEnd`], one with bytes left over is
    /// [`CodecError::TrailingBytes`].
    pub fn decode_body(magic: BlockMagic, body: &[u8]) -> CodecResult<Self> {
        let block_size = u32::try_from(body.len())
            .map_err(|_| CodecError::LengthOverflow { offset: 0 })?;
        let mut r = ByteReader::new(body);

        let header = BitcoinBlockHeader::decode(&mut r)?;
        let count = read_varint_len(&mut r)?;
        let mut transactions =
            Vec::with_capacity(bounded_capacity(count, r.remaining(), MIN_TRANSACTION_LEN));
        for _ in 0..count {
            transactions.push(BitcoinTransaction::decode(&mut r)?);
        }
        r.expect_end()?;

        Ok(Self {
            magic,
            block_size,
            header,
            transaction_count: count as u64,
            transactions,
        })
    }

    /// Serialize the body (header and transactions, witness included).
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.block_size as usize);
        self.header.encode_into(&mut buf);
        encode_varint(self.transactions.len() as u64, &mut buf);
        for tx in &self.transactions {
            tx.encode_into(true, &mut buf);
        }
        buf
    }

    /// Serialize as a blk file entry: magic, body size, body.
    ///
    /// Fails with [`CodecError::LengthOverflow`] if the body does not fit
    /// the 32-bit size field.
    pub fn to_blk_bytes(&self) -> CodecResult<Vec<u8>> {
        let body = self.encode();
        let size = u32::try_from(body.len())
            .map_err(|_| CodecError::LengthOverflow { offset: 4 })?;
        let mut buf = Vec::with_capacity(8 + body.len());
        buf.extend_from_slice(self.magic.as_bytes());
        write_u32_le(&mut buf, size);
        buf.extend_from_slice(&body);
        Ok(buf)
    }

    pub fn hash(&self) -> Hash {
        self.header.hash()
    }

    pub fn tx_count(&self) -> usize {
        self.transactions.len()
    }

    /// Hex of the block hash in display order.
    pub fn hash_hex(&self) -> String {
        crate::types::reversed_hex(&self.hash())
    }
}

//! Byte cursor and little-endian write helpers.
//!
//! Bitcoin's wire format is little-endian throughout. Fixed-size fields are
//! read directly, variable-length fields are VarInt-prefixed
//! (see [`crate::varint`]).

use alloc::vec::Vec;
use crate::error::{CodecError, CodecResult};
use crate::types::Hash;

/// A cursor for reading bytes during decoding.
///
/// Never reads past the end of its slice: every accessor checks the
/// remaining length first and reports [`CodecError::UnexpectedEnd`].
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Look at the next `n` bytes without consuming them.
    pub fn peek_bytes(&self, n: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(n)?;
        self.data.get(self.pos..end)
    }

    pub fn read_bytes(&mut self, n: usize) -> CodecResult<&'a [u8]> {
        let slice = self.peek_bytes(n).ok_or(CodecError::UnexpectedEnd {
            offset: self.pos,
            needed: n - self.remaining().min(n),
        })?;
        self.pos += n;
        Ok(slice)
    }

    pub fn read_array<const N: usize>(&mut self) -> CodecResult<[u8; N]> {
        let bytes = self.read_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> CodecResult<u8> {
        let bytes = self.read_bytes(1)?;
        Ok(bytes[0])
    }

    pub fn read_u16_le(&mut self) -> CodecResult<u16> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32_le(&mut self) -> CodecResult<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_i32_le(&mut self) -> CodecResult<i32> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u64_le(&mut self) -> CodecResult<u64> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    pub fn read_hash(&mut self) -> CodecResult<Hash> {
        self.read_array()
    }

    /// Fail with [`CodecError::TrailingBytes`] unless the input is fully consumed.
    pub fn expect_end(&self) -> CodecResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(CodecError::TrailingBytes {
                offset: self.pos,
                remaining: self.remaining(),
            })
        }
    }
}

// ── Encoding helpers ──

pub fn write_u32_le(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

pub fn write_i32_le(buf: &mut Vec<u8>, v: i32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

pub fn write_u64_le(buf: &mut Vec<u8>, v: u64) {
    buf.extend_from_slice(&v.to_le_bytes());
}

pub fn write_hash(buf: &mut Vec<u8>, h: &Hash) {
    buf.extend_from_slice(h);
}

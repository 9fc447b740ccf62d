//! Recursive Length Prefix encoding.
//!
//! Every item is either a byte string or a list of items. The first byte
//! selects the form:
//!
//! ```text
//! 0x00..=0x7f   the byte itself is a one-byte string
//! 0x80..=0xb7   string, length = b - 0x80, payload follows
//! 0xb8..=0xbf   string, next (b - 0xb7) bytes are the big-endian length
//! 0xc0..=0xf7   list, payload length = b - 0xc0
//! 0xf8..=0xff   list, next (b - 0xf7) bytes are the big-endian payload length
//! ```
//!
//! List payloads are decoded one item at a time until the declared length
//! is consumed exactly; no allocation is sized from a length prefix.

use alloc::vec::Vec;
use serde::{Deserialize, Serialize};
use crate::error::{CodecError, CodecResult};
use crate::types::u64_to_be_trimmed;

/// Maximum list nesting accepted by the decoder.
pub const MAX_DEPTH: usize = 64;

const STRING_OFFSET: u8 = 0x80;
const LIST_OFFSET: u8 = 0xc0;
const SHORT_LIMIT: usize = 55;

/// A decoded RLP value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RlpItem {
    /// A byte string. May be empty, which is distinct from an absent item.
    Bytes(Vec<u8>),
    /// An ordered list of items.
    List(Vec<RlpItem>),
}

impl RlpItem {
    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(data.into())
    }

    pub fn list(items: Vec<RlpItem>) -> Self {
        Self::List(items)
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            Self::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[RlpItem]> {
        match self {
            Self::List(items) => Some(items),
            Self::Bytes(_) => None,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }
}

/// The prefix of an encoded item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RlpHeader {
    pub list: bool,
    /// Bytes taken by the prefix itself (0 for a self-encoded single byte).
    pub header_len: usize,
    pub payload_len: usize,
}

impl RlpHeader {
    /// Size of the complete encoded item.
    pub fn total_len(&self) -> Option<usize> {
        self.header_len.checked_add(self.payload_len)
    }
}

/// Parse the prefix at the start of `data`.
///
/// Returns `Ok(None)` when `data` is too short to contain the whole prefix,
/// so stream readers can fetch more bytes and retry.
pub fn peek_header(data: &[u8]) -> CodecResult<Option<RlpHeader>> {
    let Some(&first) = data.first() else {
        return Ok(None);
    };
    let (list, len_of_len, short_len) = classify(first);
    if len_of_len == 0 {
        let header_len = usize::from(first >= STRING_OFFSET);
        return Ok(Some(RlpHeader {
            list,
            header_len,
            payload_len: short_len,
        }));
    }
    let Some(len_bytes) = data.get(1..1 + len_of_len) else {
        return Ok(None);
    };
    let payload_len = be_length(len_bytes).ok_or(CodecError::LengthOverflow { offset: 0 })?;
    Ok(Some(RlpHeader {
        list,
        header_len: 1 + len_of_len,
        payload_len,
    }))
}

/// Split a prefix byte into (is_list, length-of-length, short length).
fn classify(first: u8) -> (bool, usize, usize) {
    match first {
        0x00..=0x7f => (false, 0, 1),
        0x80..=0xb7 => (false, 0, usize::from(first - STRING_OFFSET)),
        0xb8..=0xbf => (false, usize::from(first - 0xb7), 0),
        0xc0..=0xf7 => (true, 0, usize::from(first - LIST_OFFSET)),
        0xf8..=0xff => (true, usize::from(first - 0xf7), 0),
    }
}

fn be_length(bytes: &[u8]) -> Option<usize> {
    let value = bytes.iter().try_fold(0u64, |acc, b| {
        acc.checked_mul(256).map(|v| v | u64::from(*b))
    })?;
    usize::try_from(value).ok()
}

/// Decode exactly one item spanning all of `data`.
pub fn decode(data: &[u8]) -> CodecResult<RlpItem> {
    let (item, consumed) = decode_prefix(data)?;
    if consumed != data.len() {
        return Err(CodecError::TrailingBytes {
            offset: consumed,
            remaining: data.len() - consumed,
        });
    }
    Ok(item)
}

/// Decode the first item of `data`, returning it with the number of bytes it spans.
pub fn decode_prefix(data: &[u8]) -> CodecResult<(RlpItem, usize)> {
    decode_item(data, 0, data.len(), 0)
}

/// Decode the item at `pos`, which must end no later than `end`.
///
/// `end < data.len()` means the item sits inside a list payload, in which
/// case overruns are reported as [`CodecError::PayloadOverrun`].
fn decode_item(data: &[u8], pos: usize, end: usize, depth: usize) -> CodecResult<(RlpItem, usize)> {
    let header = match peek_header(&data[pos..end]) {
        Ok(Some(header)) => header,
        Ok(None) => {
            let prefix_len = data[pos..end].first().map_or(1, |&first| 1 + classify(first).1);
            return Err(short_read(data, pos, end, prefix_len));
        }
        Err(CodecError::LengthOverflow { .. }) => {
            return Err(CodecError::LengthOverflow { offset: pos })
        }
        Err(other) => return Err(other),
    };

    let payload_start = pos + header.header_len;
    let payload_end = payload_start
        .checked_add(header.payload_len)
        .ok_or(CodecError::LengthOverflow { offset: pos })?;
    if payload_end > end {
        return Err(short_read(data, pos, end, payload_end - pos));
    }

    if !header.list {
        let payload = data[payload_start..payload_end].to_vec();
        return Ok((RlpItem::Bytes(payload), payload_end));
    }

    if depth >= MAX_DEPTH {
        return Err(CodecError::NestingTooDeep {
            offset: pos,
            limit: MAX_DEPTH,
        });
    }

    let mut items = Vec::new();
    let mut cursor = payload_start;
    while cursor < payload_end {
        let (item, next) = decode_item(data, cursor, payload_end, depth + 1)?;
        items.push(item);
        cursor = next;
    }
    Ok((RlpItem::List(items), payload_end))
}

fn short_read(data: &[u8], pos: usize, end: usize, declared: usize) -> CodecError {
    let available = end - pos;
    if end < data.len() {
        CodecError::PayloadOverrun {
            offset: pos,
            declared,
            available,
        }
    } else {
        CodecError::UnexpectedEnd {
            offset: pos,
            needed: declared.saturating_sub(available).max(1),
        }
    }
}

// ── Encoding ──

/// Encode an item.
pub fn encode(item: &RlpItem) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_into(item, &mut buf);
    buf
}

/// Append the encoding of `item` to `buf`.
pub fn encode_into(item: &RlpItem, buf: &mut Vec<u8>) {
    match item {
        RlpItem::Bytes(b) if b.len() == 1 && b[0] < STRING_OFFSET => buf.push(b[0]),
        RlpItem::Bytes(b) => {
            write_length(b.len(), STRING_OFFSET, buf);
            buf.extend_from_slice(b);
        }
        RlpItem::List(items) => {
            let mut payload = Vec::new();
            for item in items {
                encode_into(item, &mut payload);
            }
            write_length(payload.len(), LIST_OFFSET, buf);
            buf.extend_from_slice(&payload);
        }
    }
}

fn write_length(len: usize, offset: u8, buf: &mut Vec<u8>) {
    if len <= SHORT_LIMIT {
        buf.push(offset + len as u8);
    } else {
        let be = u64_to_be_trimmed(len as u64);
        buf.push(offset + SHORT_LIMIT as u8 + be.len() as u8);
        buf.extend_from_slice(&be);
    }
}

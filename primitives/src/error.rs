//! Error type for the byte-level codecs.
//!
//! Offsets are relative to the start of the slice handed to the decoder.
//! Stream readers add the absolute position of that slice when reporting.

use alloc::string::String;
use core::fmt;

/// Codec error type.
///
/// Produced by the VarInt and RLP decoders and by the mapping of decoded
/// items onto Bitcoin and Ethereum records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The input ended before `needed` more bytes could be read at `offset`.
    UnexpectedEnd { offset: usize, needed: usize },

    /// A length prefix does not fit into the platform's `usize`.
    LengthOverflow { offset: usize },

    /// An item declares more payload than its enclosing list has left.
    PayloadOverrun {
        offset: usize,
        declared: usize,
        available: usize,
    },

    /// RLP lists nested deeper than the decoder allows.
    NestingTooDeep { offset: usize, limit: usize },

    /// Bytes left over after a complete structure was decoded.
    TrailingBytes { offset: usize, remaining: usize },

    /// A positional structure has the wrong number of fields.
    FieldCount {
        structure: &'static str,
        expected: usize,
        got: usize,
    },

    /// A field has the wrong shape (list instead of bytes, bad width, ...).
    InvalidField {
        field: &'static str,
        reason: String,
    },
}

impl CodecError {
    /// Offset at which the error was detected, when it is tied to one.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::UnexpectedEnd { offset, .. }
            | Self::LengthOverflow { offset }
            | Self::PayloadOverrun { offset, .. }
            | Self::NestingTooDeep { offset, .. }
            | Self::TrailingBytes { offset, .. } => Some(*offset),
            Self::FieldCount { .. } | Self::InvalidField { .. } => None,
        }
    }

    pub(crate) fn invalid_field(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEnd { offset, needed } => {
                write!(f, "unexpected end of data at {}: {} more bytes needed", offset, needed)
            }
            Self::LengthOverflow { offset } => write!(f, "length prefix at {} overflows", offset),
            Self::PayloadOverrun {
                offset,
                declared,
                available,
            } => write!(
                f,
                "item at {} declares {} bytes but only {} remain in its list",
                offset, declared, available
            ),
            Self::NestingTooDeep { offset, limit } => {
                write!(f, "list at {} nests deeper than {}", offset, limit)
            }
            Self::TrailingBytes { offset, remaining } => {
                write!(f, "{} trailing bytes at {}", remaining, offset)
            }
            Self::FieldCount {
                structure,
                expected,
                got,
            } => write!(f, "{} has {} fields, expected {}", structure, got, expected),
            Self::InvalidField { field, reason } => write!(f, "invalid {}: {}", field, reason),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CodecError {}

/// Convenience result type for the codecs.
pub type CodecResult<T> = core::result::Result<T, CodecError>;

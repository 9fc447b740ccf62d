//! Reader error types.

use blocksplit_primitives::CodecError;

/// Top-level error type for the reader crate.
///
/// Offsets are absolute byte positions in the underlying source.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    /// Invalid size, capacity, magic or range parameters. Raised at open time.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A record declared a length above the configured maximum.
    #[error("record at offset {offset} declares {declared} bytes, maximum is {max}")]
    OversizedRecord { offset: u64, declared: u64, max: usize },

    /// The bytes of a record do not decode (bad varint, RLP length mismatch,
    /// declared size not matching the consumed size, ...).
    #[error("malformed record at offset {offset}: {source}")]
    MalformedFraming {
        offset: u64,
        #[source]
        source: CodecError,
    },

    /// The source ended in the middle of the record starting at `offset`.
    ///
    /// [`BlockDecoder::next_record`](crate::BlockDecoder::next_record)
    /// reports this as the end of the range.
    #[error("source ends inside the record starting at offset {offset}")]
    TruncatedSource { offset: u64 },

    /// Error from the underlying byte source.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReadError {
    /// Build a framing error from a codec error detected inside the record
    /// that starts at `record_offset`.
    pub(crate) fn framing(record_offset: u64, source: CodecError) -> Self {
        let relative = source.offset().unwrap_or(0) as u64;
        Self::MalformedFraming {
            offset: record_offset + relative,
            source,
        }
    }

    /// Whether decoding can continue after this error.
    ///
    /// Only meaningful for Bitcoin readers, which resynchronize on the next
    /// magic after an oversized or malformed block.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::OversizedRecord { .. } | Self::MalformedFraming { .. }
        )
    }
}

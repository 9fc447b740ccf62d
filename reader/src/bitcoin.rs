//! Bitcoin `blk*.dat` reader.
//!
//! Each entry is `magic(4) | size(u32 LE) | block`. Entries carry no
//! self-delimiting framing beyond the size, so the reader aligns on the
//! magic first and resynchronizes the same way after a bad entry.

use std::io::Read;

use bytes::Bytes;
use blocksplit_primitives::{BitcoinBlock, BlockMagic, BLK_PREAMBLE_LEN};

use crate::error::ReadError;
use crate::magic::MagicScanner;
use crate::window::ByteWindow;
use crate::LOG_TARGET;

/// An undecoded block body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBitcoinBlock {
    /// Absolute offset of the magic.
    pub offset: u64,
    pub magic: BlockMagic,
    /// The declared-size body following magic and size.
    pub data: Bytes,
}

/// Location of a block whose preamble has been consumed.
struct Frame {
    offset: u64,
    magic: BlockMagic,
    size: usize,
}

pub struct BitcoinBlockReader<R> {
    window: ByteWindow<R>,
    scanner: MagicScanner,
    range_end: u64,
    max_record_size: usize,
    finished: bool,
}

impl<R: Read> BitcoinBlockReader<R> {
    /// Read blocks whose magic starts before `range_end`.
    pub fn new(
        window: ByteWindow<R>,
        magics: Vec<BlockMagic>,
        range_end: u64,
        max_record_size: usize,
    ) -> Self {
        Self {
            window,
            scanner: MagicScanner::new(magics),
            range_end,
            max_record_size,
            finished: false,
        }
    }

    /// Decode the next block of the range.
    ///
    /// `OversizedRecord` and `MalformedFraming` abandon the current block
    /// only: the cursor stays right after its preamble and the next call
    /// scans forward from there. A block that runs past the range end is
    /// still read in full; `TruncatedSource` means the source ended inside
    /// it, after which the reader is finished.
    ///
    /// An I/O error from the source also finishes the reader.
    pub fn read_block(&mut self) -> Result<Option<BitcoinBlock>, ReadError> {
        let next = self.next_block();
        self.stop_on_io(next)
    }

    /// Return the next block body without decoding it.
    ///
    /// Alignment, range and size rules are the same as for
    /// [`read_block`](Self::read_block).
    pub fn read_raw_block(&mut self) -> Result<Option<RawBitcoinBlock>, ReadError> {
        let next = self.next_raw_block();
        self.stop_on_io(next)
    }

    fn next_block(&mut self) -> Result<Option<BitcoinBlock>, ReadError> {
        let Some(frame) = self.next_frame()? else {
            return Ok(None);
        };
        let body_offset = frame.offset + BLK_PREAMBLE_LEN as u64;
        let Some(body) = self.window.peek(frame.size)? else {
            return Err(self.truncated(frame.offset));
        };

        match BitcoinBlock::decode_body(frame.magic, body) {
            Ok(block) => {
                self.window.advance(frame.size);
                tracing::trace!(
                    target: LOG_TARGET,
                    offset = frame.offset,
                    size = frame.size,
                    txs = block.tx_count(),
                    "decoded bitcoin block {}",
                    block.hash_hex()
                );
                Ok(Some(block))
            }
            Err(source) => {
                let err = ReadError::framing(body_offset, source);
                tracing::warn!(
                    target: LOG_TARGET,
                    offset = frame.offset,
                    "skipping malformed bitcoin block: {err}"
                );
                Err(err)
            }
        }
    }

    fn next_raw_block(&mut self) -> Result<Option<RawBitcoinBlock>, ReadError> {
        let Some(frame) = self.next_frame()? else {
            return Ok(None);
        };
        let Some(body) = self.window.read(frame.size)? else {
            return Err(self.truncated(frame.offset));
        };
        Ok(Some(RawBitcoinBlock {
            offset: frame.offset,
            magic: frame.magic,
            data: Bytes::copy_from_slice(body),
        }))
    }

    /// Absolute offset of the next unread byte.
    pub fn position(&self) -> u64 {
        self.window.position()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn into_inner(self) -> R {
        self.window.into_inner()
    }

    /// Align on the next magic and consume the preamble.
    fn next_frame(&mut self) -> Result<Option<Frame>, ReadError> {
        if self.finished {
            return Ok(None);
        }
        let Some(magic) = self.scanner.scan(&mut self.window, self.range_end)? else {
            self.finished = true;
            tracing::debug!(
                target: LOG_TARGET,
                position = self.window.position(),
                "no further bitcoin block in range"
            );
            return Ok(None);
        };

        let offset = self.window.position();
        // peeked, not read: the record size limit applies to the body only
        let Some(preamble) = self.window.peek(BLK_PREAMBLE_LEN)? else {
            return Err(self.truncated(offset));
        };
        let size = u32::from_le_bytes([preamble[4], preamble[5], preamble[6], preamble[7]]) as usize;
        self.window.advance(BLK_PREAMBLE_LEN);

        if size > self.max_record_size {
            tracing::warn!(
                target: LOG_TARGET,
                offset,
                size,
                max = self.max_record_size,
                "skipping oversized bitcoin block"
            );
            return Err(ReadError::OversizedRecord {
                offset,
                declared: size as u64,
                max: self.max_record_size,
            });
        }
        Ok(Some(Frame { offset, magic, size }))
    }

    fn stop_on_io<T>(&mut self, next: Result<T, ReadError>) -> Result<T, ReadError> {
        if let Err(ReadError::Io(err)) = &next {
            self.finished = true;
            tracing::warn!(
                target: LOG_TARGET,
                position = self.window.position(),
                "source failed, bitcoin range ends: {err}"
            );
        }
        next
    }

    fn truncated(&mut self, offset: u64) -> ReadError {
        self.finished = true;
        tracing::debug!(target: LOG_TARGET, offset, "source ends inside bitcoin block");
        ReadError::TruncatedSource { offset }
    }
}

//! Ethereum block reader.
//!
//! Blocks are concatenated RLP items and delimit themselves, so no
//! alignment step exists: the reader decodes from the range start and
//! stops once the cursor reaches the range end. Any error ends the range.

use std::io::Read;

use bytes::Bytes;
use blocksplit_primitives::{rlp, EthereumBlock};

use crate::error::ReadError;
use crate::window::ByteWindow;
use crate::LOG_TARGET;

/// Longest RLP prefix: one tag byte plus up to eight length bytes.
const MAX_RLP_PREFIX: usize = 9;

pub struct EthereumBlockReader<R> {
    window: ByteWindow<R>,
    range_end: u64,
    max_record_size: usize,
    max_extra_data: usize,
    finished: bool,
}

impl<R: Read> EthereumBlockReader<R> {
    pub fn new(
        window: ByteWindow<R>,
        range_end: u64,
        max_record_size: usize,
        max_extra_data: usize,
    ) -> Self {
        Self {
            window,
            range_end,
            max_record_size,
            max_extra_data,
            finished: false,
        }
    }

    /// Decode the next block.
    ///
    /// After any error the reader is finished and further calls return
    /// `Ok(None)`.
    pub fn read_block(&mut self) -> Result<Option<EthereumBlock>, ReadError> {
        let next = self.next_block();
        self.stop_on_io(next)
    }

    /// Return the next top-level RLP item without decoding it.
    pub fn read_raw_block(&mut self) -> Result<Option<Bytes>, ReadError> {
        let next = self.next_raw_block();
        self.stop_on_io(next)
    }

    fn next_block(&mut self) -> Result<Option<EthereumBlock>, ReadError> {
        let Some((offset, len)) = self.next_item()? else {
            return Ok(None);
        };
        let decoded = match self.window.peek(len)? {
            Some(item) => EthereumBlock::decode(item, self.max_extra_data),
            None => return Err(self.abandon(ReadError::TruncatedSource { offset })),
        };

        match decoded {
            Ok(block) => {
                self.window.advance(len);
                tracing::trace!(
                    target: LOG_TARGET,
                    offset,
                    size = len,
                    txs = block.transactions.len(),
                    uncles = block.uncles.len(),
                    "decoded ethereum block"
                );
                Ok(Some(block))
            }
            Err(source) => Err(self.abandon(ReadError::framing(offset, source))),
        }
    }

    fn next_raw_block(&mut self) -> Result<Option<Bytes>, ReadError> {
        let Some((offset, len)) = self.next_item()? else {
            return Ok(None);
        };
        match self.window.read(len)? {
            Some(item) => Ok(Some(Bytes::copy_from_slice(item))),
            None => Err(self.abandon(ReadError::TruncatedSource { offset })),
        }
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

    /// Offset and total encoded length of the item at the cursor.
    fn next_item(&mut self) -> Result<Option<(u64, usize)>, ReadError> {
        if self.finished {
            return Ok(None);
        }
        let offset = self.window.position();
        if offset >= self.range_end {
            return Ok(self.end(offset));
        }

        let prefix = self.window.peek_available(MAX_RLP_PREFIX)?;
        if prefix.is_empty() {
            return Ok(self.end(offset));
        }
        let header = match rlp::peek_header(prefix) {
            Ok(Some(header)) => header,
            Ok(None) => return Err(self.abandon(ReadError::TruncatedSource { offset })),
            Err(source) => return Err(self.abandon(ReadError::framing(offset, source))),
        };

        match header.total_len() {
            Some(len) if len <= self.max_record_size => Ok(Some((offset, len))),
            total => Err(self.abandon(ReadError::OversizedRecord {
                offset,
                declared: total.map_or(u64::MAX, |len| len as u64),
                max: self.max_record_size,
            })),
        }
    }

    fn end(&mut self, offset: u64) -> Option<(u64, usize)> {
        self.finished = true;
        tracing::debug!(target: LOG_TARGET, offset, "ethereum range ended");
        None
    }

    fn stop_on_io<T>(&mut self, next: Result<T, ReadError>) -> Result<T, ReadError> {
        match next {
            Err(err @ ReadError::Io(_)) => Err(self.abandon(err)),
            other => other,
        }
    }

    fn abandon(&mut self, err: ReadError) -> ReadError {
        self.finished = true;
        match &err {
            ReadError::TruncatedSource { offset } => {
                tracing::debug!(target: LOG_TARGET, offset, "source ends inside ethereum block")
            }
            _ => tracing::warn!(target: LOG_TARGET, "abandoning ethereum range: {err}"),
        }
        err
    }
}

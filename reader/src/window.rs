//! Bounded, compacting read buffer over a byte source.
//!
//! The window holds `[cursor, fill)` unread bytes inside a buffer of fixed
//! capacity. When a request would run past the end of the buffer, unread
//! bytes are moved to the front before the source is read again, so the
//! buffer never grows.
//!
//! ```text
//!  base                cursor              fill              capacity
//!   |------consumed------|------unread-------|------free--------|
//! ```

use std::io::{ErrorKind, Read};

use crate::config::{BufferBacking, ReaderConfig};
use crate::error::ReadError;

/// Alignment used for [`BufferBacking::PageAligned`].
pub const PAGE_SIZE: usize = 4096;

pub struct ByteWindow<R> {
    source: R,
    storage: Vec<u8>,
    /// Start of the usable region inside `storage`.
    base: usize,
    capacity: usize,
    cursor: usize,
    fill: usize,
    /// Absolute source offset of `storage[base]`.
    origin: u64,
    exhausted: bool,
    max_record_size: usize,
}

impl<R: Read> ByteWindow<R> {
    /// Wrap `source`, whose next byte sits at absolute offset `start`.
    ///
    /// The configuration is expected to have been validated.
    pub fn new(source: R, start: u64, config: &ReaderConfig) -> Self {
        let capacity = config.buffer_capacity;
        let (storage, base) = match config.backing {
            BufferBacking::Heap => (vec![0u8; capacity], 0),
            BufferBacking::PageAligned => {
                let storage = vec![0u8; capacity.saturating_add(PAGE_SIZE - 1)];
                let base = match storage.as_ptr().align_offset(PAGE_SIZE) {
                    offset if offset < PAGE_SIZE => offset,
                    _ => 0,
                };
                (storage, base)
            }
        };
        Self {
            source,
            storage,
            base,
            capacity,
            cursor: 0,
            fill: 0,
            origin: start,
            exhausted: false,
            max_record_size: config.max_record_size,
        }
    }

    /// Consume `count` bytes.
    ///
    /// Returns `Ok(None)` if the source ends before `count` bytes are
    /// available; nothing is consumed in that case.
    pub fn read(&mut self, count: usize) -> Result<Option<&[u8]>, ReadError> {
        if count > self.max_record_size {
            return Err(ReadError::OversizedRecord {
                offset: self.position(),
                declared: count as u64,
                max: self.max_record_size,
            });
        }
        if !self.ensure(count)? {
            return Ok(None);
        }
        let start = self.base + self.cursor;
        self.cursor += count;
        Ok(Some(&self.storage[start..start + count]))
    }

    /// Look at the next `count` bytes without consuming them.
    pub fn peek(&mut self, count: usize) -> Result<Option<&[u8]>, ReadError> {
        if count > self.capacity {
            return Err(ReadError::OversizedRecord {
                offset: self.position(),
                declared: count as u64,
                max: self.capacity,
            });
        }
        if !self.ensure(count)? {
            return Ok(None);
        }
        Ok(Some(self.unread(count)))
    }

    /// Look at up to `count` bytes; shorter only at the end of the source.
    pub fn peek_available(&mut self, count: usize) -> Result<&[u8], ReadError> {
        let count = count.min(self.capacity);
        self.ensure(count)?;
        let available = (self.fill - self.cursor).min(count);
        Ok(self.unread(available))
    }

    /// Consume bytes that a preceding peek made available.
    pub fn advance(&mut self, count: usize) {
        self.cursor = (self.cursor + count).min(self.fill);
    }

    /// Absolute offset of the next unread byte.
    pub fn position(&self) -> u64 {
        self.origin + self.cursor as u64
    }

    /// Whether the source has reported end of data.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Address of the first usable buffer byte.
    pub fn buffer_ptr(&self) -> *const u8 {
        self.storage[self.base..].as_ptr()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Give the source back. Its position is past whatever was read ahead.
    pub fn into_inner(self) -> R {
        self.source
    }

    fn unread(&self, count: usize) -> &[u8] {
        let start = self.base + self.cursor;
        &self.storage[start..start + count]
    }

    /// Make `count` unread bytes available. `Ok(false)` if the source ends
    /// first. `count` must not exceed the capacity.
    fn ensure(&mut self, count: usize) -> Result<bool, ReadError> {
        if self.fill - self.cursor >= count {
            return Ok(true);
        }
        if self.cursor + count > self.capacity {
            self.compact();
        }
        while self.fill - self.cursor < count {
            if self.exhausted {
                return Ok(false);
            }
            let free = &mut self.storage[self.base + self.fill..self.base + self.capacity];
            match self.source.read(free) {
                Ok(0) => self.exhausted = true,
                Ok(n) => self.fill += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            }
        }
        Ok(true)
    }

    fn compact(&mut self) {
        let (start, end) = (self.base + self.cursor, self.base + self.fill);
        self.storage.copy_within(start..end, self.base);
        self.origin += self.cursor as u64;
        self.fill -= self.cursor;
        self.cursor = 0;
    }
}

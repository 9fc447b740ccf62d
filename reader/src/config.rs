//! Reader configuration.

use std::fmt;
use std::str::FromStr;

use blocksplit_primitives::{BlockMagic, BLK_PREAMBLE_LEN, DEFAULT_MAX_EXTRA_DATA};

use crate::error::ReadError;

/// Smallest buffer the window accepts: a Bitcoin preamble or a full RLP
/// list prefix must always fit.
pub const MIN_BUFFER_CAPACITY: usize = 16;

/// Record layout of the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainFormat {
    /// `magic | size | block` entries as written to `blk*.dat` files.
    Bitcoin,
    /// Concatenated RLP-encoded blocks.
    Ethereum,
}

impl fmt::Display for ChainFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bitcoin => f.write_str("bitcoin"),
            Self::Ethereum => f.write_str("ethereum"),
        }
    }
}

impl FromStr for ChainFormat {
    type Err = ReadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bitcoin" | "btc" => Ok(Self::Bitcoin),
            "ethereum" | "eth" => Ok(Self::Ethereum),
            other => Err(ReadError::Configuration(format!("unknown chain format `{other}`"))),
        }
    }
}

/// How the window's buffer is allocated.
///
/// Decoding does not depend on the choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BufferBacking {
    #[default]
    Heap,
    /// Start the buffer on a 4 KiB page boundary, for sources that do
    /// direct or memory-mapped I/O.
    PageAligned,
}

/// Configuration for a block decoder.
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Largest record (Bitcoin body or whole Ethereum RLP item) accepted.
    pub max_record_size: usize,

    /// Window buffer size. Must be at least `max_record_size`.
    pub buffer_capacity: usize,

    pub backing: BufferBacking,

    /// Magics the Bitcoin scanner aligns on. Ignored for Ethereum.
    pub magics: Vec<BlockMagic>,

    /// Largest accepted Ethereum header extra-data field.
    pub max_extra_data: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            max_record_size: 1024 * 1024,   // 1 MiB
            buffer_capacity: 1024 * 1024,
            backing: BufferBacking::Heap,
            magics: vec![BlockMagic::MAINNET],
            max_extra_data: DEFAULT_MAX_EXTRA_DATA,
        }
    }
}

impl ReaderConfig {
    /// Main-net Bitcoin with room for 8 MiB blocks.
    pub fn bitcoin() -> Self {
        Self {
            max_record_size: 8 * 1024 * 1024,
            buffer_capacity: 8 * 1024 * 1024,
            ..Self::default()
        }
    }

    /// Ethereum blocks up to 1 MiB.
    pub fn ethereum() -> Self {
        Self {
            magics: Vec::new(),
            ..Self::default()
        }
    }

    /// Replace the recognized magics.
    pub fn with_magics(mut self, magics: impl IntoIterator<Item = BlockMagic>) -> Self {
        self.magics = magics.into_iter().collect();
        self
    }

    /// Parse magics from hex strings such as `"F9BEB4D9"`.
    pub fn with_magic_strs<'a>(
        self,
        magics: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, ReadError> {
        let parsed = magics
            .into_iter()
            .map(|s| {
                s.parse::<BlockMagic>()
                    .map_err(|err| ReadError::Configuration(format!("bad magic `{s}`: {err}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.with_magics(parsed))
    }

    pub fn with_max_record_size(mut self, max_record_size: usize) -> Self {
        self.max_record_size = max_record_size;
        self
    }

    pub fn with_buffer_capacity(mut self, buffer_capacity: usize) -> Self {
        self.buffer_capacity = buffer_capacity;
        self
    }

    pub fn with_backing(mut self, backing: BufferBacking) -> Self {
        self.backing = backing;
        self
    }

    /// Check the parameters for use with `format`.
    pub fn validate(&self, format: ChainFormat) -> Result<(), ReadError> {
        if self.max_record_size == 0 {
            return Err(ReadError::Configuration(
                "max_record_size must be greater than zero".into(),
            ));
        }
        if self.buffer_capacity < self.max_record_size {
            return Err(ReadError::Configuration(format!(
                "max_record_size ({}) exceeds buffer_capacity ({})",
                self.max_record_size, self.buffer_capacity
            )));
        }
        if self.buffer_capacity < MIN_BUFFER_CAPACITY {
            return Err(ReadError::Configuration(format!(
                "buffer_capacity must be at least {MIN_BUFFER_CAPACITY} bytes"
            )));
        }
        if format == ChainFormat::Bitcoin && self.max_record_size < BLK_PREAMBLE_LEN {
            return Err(ReadError::Configuration(format!(
                "max_record_size must be at least {BLK_PREAMBLE_LEN} bytes for bitcoin sources"
            )));
        }
        if format == ChainFormat::Bitcoin && self.magics.is_empty() {
            return Err(ReadError::Configuration(
                "at least one block magic is required for bitcoin sources".into(),
            ));
        }
        Ok(())
    }
}

/// Byte range of the source assigned to one decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitRange {
    pub start: u64,
    pub length: u64,
}

impl SplitRange {
    pub fn new(start: u64, length: u64) -> Self {
        Self { start, length }
    }

    /// The whole source, however long it is.
    pub fn whole() -> Self {
        Self {
            start: 0,
            length: u64::MAX,
        }
    }

    /// Exclusive end offset.
    pub fn end(&self) -> Result<u64, ReadError> {
        self.start.checked_add(self.length).ok_or_else(|| {
            ReadError::Configuration(format!(
                "range start {} plus length {} overflows",
                self.start, self.length
            ))
        })
    }

    /// Cut `[0, total)` into consecutive ranges of at most `split_size` bytes.
    pub fn partition(total: u64, split_size: u64) -> Vec<SplitRange> {
        if split_size == 0 {
            return vec![Self::new(0, total)];
        }
        (0..total)
            .step_by(split_size as usize)
            .map(|start| Self::new(start, split_size.min(total - start)))
            .collect()
    }
}

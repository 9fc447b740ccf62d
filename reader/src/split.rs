//! Decoder handle over one split of a block file.
//!
//! [`BlockDecoder::open`] validates the configuration, seeks the source to
//! the range start and picks the reader for the chain format. Records are
//! then pulled one at a time with [`BlockDecoder::next_record`] or through
//! the `Iterator` impl.

use std::io::{Read, Seek, SeekFrom};

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use blocksplit_primitives::{BitcoinBlock, EthereumBlock};

use crate::bitcoin::BitcoinBlockReader;
use crate::config::{ChainFormat, ReaderConfig, SplitRange};
use crate::error::ReadError;
use crate::ethereum::EthereumBlockReader;
use crate::window::ByteWindow;
use crate::LOG_TARGET;

/// A decoded block of either chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Record {
    Bitcoin(BitcoinBlock),
    Ethereum(EthereumBlock),
}

impl Record {
    pub fn format(&self) -> ChainFormat {
        match self {
            Self::Bitcoin(_) => ChainFormat::Bitcoin,
            Self::Ethereum(_) => ChainFormat::Ethereum,
        }
    }

    pub fn as_bitcoin(&self) -> Option<&BitcoinBlock> {
        match self {
            Self::Bitcoin(block) => Some(block),
            Self::Ethereum(_) => None,
        }
    }

    pub fn as_ethereum(&self) -> Option<&EthereumBlock> {
        match self {
            Self::Ethereum(block) => Some(block),
            Self::Bitcoin(_) => None,
        }
    }

    pub fn into_bitcoin(self) -> Option<BitcoinBlock> {
        match self {
            Self::Bitcoin(block) => Some(block),
            Self::Ethereum(_) => None,
        }
    }

    pub fn into_ethereum(self) -> Option<EthereumBlock> {
        match self {
            Self::Ethereum(block) => Some(block),
            Self::Bitcoin(_) => None,
        }
    }
}

/// Reads the records of one split.
///
/// Dropping the decoder releases the buffer and the source;
/// [`close`](Self::close) hands the source back instead.
pub enum BlockDecoder<R> {
    Bitcoin(BitcoinBlockReader<R>),
    Ethereum(EthereumBlockReader<R>),
}

impl<R: Read + Seek> BlockDecoder<R> {
    /// Open a decoder over `range` of `source`.
    ///
    /// Fails with [`ReadError::Configuration`] for invalid parameters and
    /// with [`ReadError::Io`] if the source cannot seek to the range start.
    pub fn open(
        mut source: R,
        range: SplitRange,
        format: ChainFormat,
        config: &ReaderConfig,
    ) -> Result<Self, ReadError> {
        config.validate(format)?;
        let range_end = range.end()?;
        source.seek(SeekFrom::Start(range.start))?;

        tracing::debug!(
            target: LOG_TARGET,
            %format,
            start = range.start,
            end = range_end,
            "opening block decoder"
        );

        let window = ByteWindow::new(source, range.start, config);
        Ok(match format {
            ChainFormat::Bitcoin => Self::Bitcoin(BitcoinBlockReader::new(
                window,
                config.magics.clone(),
                range_end,
                config.max_record_size,
            )),
            ChainFormat::Ethereum => Self::Ethereum(EthereumBlockReader::new(
                window,
                range_end,
                config.max_record_size,
                config.max_extra_data,
            )),
        })
    }
}

impl<R: Read> BlockDecoder<R> {
    /// Decode the next record, or `Ok(None)` once the range is done.
    ///
    /// A source that ends inside a record ends the range, as does an I/O
    /// error from the source. Bitcoin decoders keep going after
    /// `OversizedRecord` and `MalformedFraming`; Ethereum decoders report
    /// the error and then end.
    pub fn next_record(&mut self) -> Result<Option<Record>, ReadError> {
        let next = match self {
            Self::Bitcoin(reader) => reader.read_block().map(|b| b.map(Record::Bitcoin)),
            Self::Ethereum(reader) => reader.read_block().map(|b| b.map(Record::Ethereum)),
        };
        end_on_truncation(next)
    }

    /// Return the exact bytes of the next record without decoding it.
    ///
    /// For Bitcoin this is the body after magic and size.
    pub fn next_raw_record(&mut self) -> Result<Option<Bytes>, ReadError> {
        let next = match self {
            Self::Bitcoin(reader) => reader.read_raw_block().map(|b| b.map(|raw| raw.data)),
            Self::Ethereum(reader) => reader.read_raw_block(),
        };
        end_on_truncation(next)
    }

    pub fn format(&self) -> ChainFormat {
        match self {
            Self::Bitcoin(_) => ChainFormat::Bitcoin,
            Self::Ethereum(_) => ChainFormat::Ethereum,
        }
    }

    /// Absolute offset of the next unread byte.
    pub fn position(&self) -> u64 {
        match self {
            Self::Bitcoin(reader) => reader.position(),
            Self::Ethereum(reader) => reader.position(),
        }
    }

    /// Release the buffer and return the source.
    pub fn close(self) -> R {
        tracing::debug!(target: LOG_TARGET, position = self.position(), "closing block decoder");
        match self {
            Self::Bitcoin(reader) => reader.into_inner(),
            Self::Ethereum(reader) => reader.into_inner(),
        }
    }
}

impl<R: Read> Iterator for BlockDecoder<R> {
    type Item = Result<Record, ReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

fn end_on_truncation<T>(next: Result<Option<T>, ReadError>) -> Result<Option<T>, ReadError> {
    match next {
        Err(ReadError::TruncatedSource { offset }) => {
            tracing::debug!(target: LOG_TARGET, offset, "last record incomplete, range ends");
            Ok(None)
        }
        other => other,
    }
}

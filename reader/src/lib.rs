//! `blocksplit-reader`: split-aware streaming readers for block files.
//!
//! A block file (Bitcoin `blk*.dat` or concatenated RLP Ethereum blocks) is
//! cut into byte ranges that independent decoders process in parallel.
//! Each decoder owns its buffer and cursor; nothing is shared between them.
//!
//! ## Architecture
//!
//! - [`window::ByteWindow`]: bounded, compacting buffer over a `Read` source
//! - [`magic::MagicScanner`]: aligns a Bitcoin range on the next block magic
//! - [`bitcoin::BitcoinBlockReader`]: magic/size framed blocks, resynchronizes after bad blocks
//! - [`ethereum::EthereumBlockReader`]: self-delimiting RLP blocks, ends the range on errors
//! - [`split::BlockDecoder`]: `open` / `next_record` / `close` over one range
//!
//! Logging goes through `tracing` under the `blocksplit::reader` target;
//! no subscriber is installed.

pub mod config;
pub mod error;
pub mod window;
pub mod magic;
pub mod bitcoin;
pub mod ethereum;
pub mod split;

pub(crate) const LOG_TARGET: &str = "blocksplit::reader";

// Re-export key types for convenience
pub use bitcoin::{BitcoinBlockReader, RawBitcoinBlock};
pub use config::{BufferBacking, ChainFormat, ReaderConfig, SplitRange};
pub use error::ReadError;
pub use ethereum::EthereumBlockReader;
pub use magic::MagicScanner;
pub use split::{BlockDecoder, Record};
pub use window::ByteWindow;

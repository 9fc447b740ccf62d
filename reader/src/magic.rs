//! Aligns a window on the next block magic.
//!
//! Splits cut files at arbitrary offsets. A reader owns exactly the blocks
//! whose magic starts inside its range, so the scanner skips the tail of
//! whatever block the range starts in and stops looking once the range end
//! is reached.

use std::io::Read;

use blocksplit_primitives::BlockMagic;

use crate::error::ReadError;
use crate::window::ByteWindow;

#[derive(Debug, Clone)]
pub struct MagicScanner {
    magics: Vec<BlockMagic>,
}

impl MagicScanner {
    pub fn new(magics: Vec<BlockMagic>) -> Self {
        Self { magics }
    }

    pub fn magics(&self) -> &[BlockMagic] {
        &self.magics
    }

    /// Advance `window` byte by byte until one of the magics starts at the
    /// cursor.
    ///
    /// Only magics starting before `limit` count. Returns `Ok(None)` when
    /// the limit or the end of the source is reached first; the cursor is
    /// then left wherever scanning stopped.
    pub fn scan<R: Read>(
        &self,
        window: &mut ByteWindow<R>,
        limit: u64,
    ) -> Result<Option<BlockMagic>, ReadError> {
        while window.position() < limit {
            let Some(candidate) = window.peek(BlockMagic::LEN)? else {
                return Ok(None);
            };
            if let Some(magic) = self.magics.iter().find(|m| m.matches(candidate)) {
                return Ok(Some(*magic));
            }
            window.advance(1);
        }
        Ok(None)
    }
}

//! Consumers of row blocks

use super::RowBlock;
use crate::error::Result;

/// Receives each block of a sheet, in row order
///
/// The producer blocks until `write_block` returns, so at most one block per
/// sheet is ever in memory. An error aborts the sheet.
pub trait RowBlockSink {
    /// Encode one block; the block is reused after this returns
    fn write_block(&mut self, block: &RowBlock) -> Result<()>;

    /// Called once after the last block of a successfully finished sheet
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<S: RowBlockSink + ?Sized> RowBlockSink for &mut S {
    fn write_block(&mut self, block: &RowBlock) -> Result<()> {
        (**self).write_block(block)
    }

    fn finish(&mut self) -> Result<()> {
        (**self).finish()
    }
}

impl<S: RowBlockSink + ?Sized> RowBlockSink for Box<S> {
    fn write_block(&mut self, block: &RowBlock) -> Result<()> {
        (**self).write_block(block)
    }

    fn finish(&mut self) -> Result<()> {
        (**self).finish()
    }
}

/// Keeps a copy of every block; handy for inspection
impl RowBlockSink for Vec<RowBlock> {
    fn write_block(&mut self, block: &RowBlock) -> Result<()> {
        self.push(block.clone());
        Ok(())
    }
}

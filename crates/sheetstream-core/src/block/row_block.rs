//! Fixed-capacity blocks of rows

use crate::cell::CellValue;
use crate::style::StyleCode;

/// Rows per block unless configured otherwise
pub const DEFAULT_BLOCK_ROWS: usize = 32;

/// A single cell record inside a block
#[derive(Debug, Clone, PartialEq)]
pub struct BlockCell {
    /// 0-based column
    pub col: u32,
    pub style: StyleCode,
    pub value: CellValue,
    /// Shared string id for string values
    pub sst_id: Option<u32>,
}

/// A row record: 0-based index plus cells in column order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BlockRow {
    pub index: u32,
    pub cells: Vec<BlockCell>,
}

/// Lifecycle of a [`RowBlock`]
///
/// `Empty -> Filling -> Full | Flushed -> Empty`; a flushed block is reset
/// lazily when the next row arrives, so the final block of a sheet stays
/// `Flushed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockState {
    Empty,
    Filling,
    Full,
    Flushed,
}

/// An ordered, fixed-capacity sequence of rows handed to a sink as a unit
#[derive(Debug, Clone)]
pub struct RowBlock {
    rows: Vec<BlockRow>,
    capacity: usize,
    state: BlockState,
    /// 0-based number of this block within its sheet
    sequence: u64,
    /// Cell buffers recycled from previous blocks
    spare: Vec<Vec<BlockCell>>,
}

impl RowBlock {
    /// Create an empty block holding up to `capacity` rows (at least 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            rows: Vec::with_capacity(capacity),
            capacity,
            state: BlockState::Empty,
            sequence: 0,
            spare: Vec::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of rows currently held
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.rows.len() >= self.capacity
    }

    pub fn state(&self) -> BlockState {
        self.state
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn rows(&self) -> &[BlockRow] {
        &self.rows
    }

    /// Index of the first row in the block
    pub fn first_row(&self) -> Option<u32> {
        self.rows.first().map(|r| r.index)
    }

    /// Index of the last row in the block
    pub fn last_row(&self) -> Option<u32> {
        self.rows.last().map(|r| r.index)
    }

    /// Total cells across all rows
    pub fn cell_count(&self) -> usize {
        self.rows.iter().map(|r| r.cells.len()).sum()
    }

    /// A cleared cell buffer, reused from earlier blocks when possible
    pub(crate) fn take_cell_buffer(&mut self) -> Vec<BlockCell> {
        self.spare.pop().unwrap_or_default()
    }

    /// Take back a buffer from a row that never reached the block
    pub(crate) fn return_cell_buffer(&mut self, mut cells: Vec<BlockCell>) {
        if cells.capacity() == 0 || self.spare.len() >= self.capacity {
            return;
        }
        cells.clear();
        self.spare.push(cells);
    }

    /// Append a finished row; the block becomes `Full` at capacity
    pub(crate) fn push_row(&mut self, row: BlockRow) {
        if self.state == BlockState::Flushed {
            self.reset();
        }
        debug_assert!(!self.is_full(), "push into a full block");
        self.rows.push(row);
        self.state = if self.is_full() {
            BlockState::Full
        } else {
            BlockState::Filling
        };
    }

    pub(crate) fn mark_flushed(&mut self) {
        self.state = BlockState::Flushed;
    }

    /// Reuse a flushed block; cell buffers are kept for the next rows
    pub(crate) fn reset(&mut self) {
        if self.state == BlockState::Flushed {
            self.sequence += 1;
        }
        for mut row in self.rows.drain(..) {
            row.cells.clear();
            self.spare.push(row.cells);
        }
        self.spare.truncate(self.capacity);
        self.state = BlockState::Empty;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(index: u32) -> BlockRow {
        BlockRow {
            index,
            cells: vec![BlockCell {
                col: 0,
                style: StyleCode::DEFAULT,
                value: CellValue::Number(index as f64),
                sst_id: None,
            }],
        }
    }

    #[test]
    fn test_state_transitions() {
        let mut block = RowBlock::new(2);
        assert_eq!(block.state(), BlockState::Empty);

        block.push_row(row(0));
        assert_eq!(block.state(), BlockState::Filling);

        block.push_row(row(1));
        assert_eq!(block.state(), BlockState::Full);
        assert!(block.is_full());

        block.mark_flushed();
        assert_eq!(block.state(), BlockState::Flushed);
        assert_eq!(block.len(), 2);

        block.push_row(row(2));
        assert_eq!(block.state(), BlockState::Filling);
        assert_eq!(block.sequence(), 1);
        assert_eq!(block.first_row(), Some(2));
    }

    #[test]
    fn test_cell_buffers_are_recycled() {
        let mut block = RowBlock::new(4);
        block.push_row(row(0));
        block.mark_flushed();
        block.reset();

        let buf = block.take_cell_buffer();
        assert!(buf.is_empty());
        assert!(buf.capacity() >= 1);
    }

    #[test]
    fn test_returned_buffers_are_bounded() {
        let mut block = RowBlock::new(1);
        block.return_cell_buffer(Vec::with_capacity(8));
        block.return_cell_buffer(Vec::with_capacity(8));
        block.return_cell_buffer(Vec::new());
        assert_eq!(block.spare.len(), 1);
        assert!(block.take_cell_buffer().capacity() >= 8);
        assert_eq!(block.take_cell_buffer().capacity(), 0);
    }

    #[test]
    fn test_minimum_capacity() {
        assert_eq!(RowBlock::new(0).capacity(), 1);
    }
}

//! Row-by-row producer side of the block pipeline

use std::sync::Arc;

use super::{BlockCell, BlockRow, BlockState, RowBlock, RowBlockSink, SheetLimits};
use crate::cell::{cell_reference, CellValue, Dimension};
use crate::error::{Error, Result};
use crate::sst::SharedStringTable;
use crate::style::StyleCode;

#[derive(Debug, Clone, PartialEq, Eq)]
enum StreamState {
    Open,
    Aborted(String),
    Failed(String),
    Finished,
}

/// Streams one worksheet through a [`RowBlock`] into a [`RowBlockSink`]
///
/// Rows must arrive in strictly increasing order. Each time the block fills
/// it is handed to the sink and reused, so memory stays bounded by the block
/// size. The first capacity violation aborts the stream: blocks already
/// flushed stay as they were, and every later call returns
/// [`Error::SheetAborted`]. A write failure (see [`Error::is_write_failure`])
/// marks the stream failed instead, and later calls return
/// [`Error::SheetFailed`].
#[derive(Debug)]
pub struct SheetStream<S> {
    name: String,
    sink: S,
    sst: Arc<SharedStringTable>,
    limits: SheetLimits,
    block: RowBlock,
    state: StreamState,
    last_row: Option<u32>,
    dimension: Dimension,
    rows_written: u64,
    blocks_flushed: u64,
}

impl<S: RowBlockSink> SheetStream<S> {
    /// Create a stream with the given block size (rows per block)
    pub fn new<N: Into<String>>(
        name: N,
        sink: S,
        sst: Arc<SharedStringTable>,
        limits: SheetLimits,
        block_rows: usize,
    ) -> Self {
        Self {
            name: name.into(),
            sink,
            sst,
            limits,
            block: RowBlock::new(block_rows),
            state: StreamState::Open,
            last_row: None,
            dimension: Dimension::new(),
            rows_written: 0,
            blocks_flushed: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn limits(&self) -> &SheetLimits {
        &self.limits
    }

    /// The block currently being filled (or the last one flushed)
    pub fn block(&self) -> &RowBlock {
        &self.block
    }

    pub fn block_state(&self) -> BlockState {
        self.block.state()
    }

    /// Used range of all rows ended so far
    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    pub fn blocks_flushed(&self) -> u64 {
        self.blocks_flushed
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self.state, StreamState::Aborted(_))
    }

    /// Why the stream was aborted, if it was
    pub fn abort_reason(&self) -> Option<&str> {
        match &self.state {
            StreamState::Aborted(reason) => Some(reason),
            _ => None,
        }
    }

    /// Whether a write failure stopped the stream
    pub fn is_failed(&self) -> bool {
        matches!(self.state, StreamState::Failed(_))
    }

    /// The error that stopped the stream, if one did
    pub fn failure(&self) -> Option<&str> {
        match &self.state {
            StreamState::Failed(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.state == StreamState::Finished
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Give back the sink
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Start the row after the last one written (row 0 first)
    pub fn begin_row(&mut self) -> Result<RowBuilder<'_, S>> {
        let index = match self.last_row {
            None => Ok(0),
            Some(last) => last.checked_add(1).ok_or(Error::TooManyRows {
                row: last,
                limit: self.limits.max_rows,
            }),
        };
        match index {
            Ok(index) => self.begin_row_at(index),
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Start a specific row; skipped rows are simply absent
    pub fn begin_row_at(&mut self, index: u32) -> Result<RowBuilder<'_, S>> {
        self.ensure_open()?;

        if let Some(last) = self.last_row {
            if index <= last {
                return Err(Error::RowOutOfOrder { row: index, last });
            }
        }
        if index >= self.limits.max_rows {
            return Err(self.fail(Error::TooManyRows {
                row: index,
                limit: self.limits.max_rows,
            }));
        }

        let cells = self.block.take_cell_buffer();
        Ok(RowBuilder {
            stream: self,
            row: BlockRow { index, cells },
            next_col: 0,
        })
    }

    /// Hand the current block to the sink even if it is not full
    pub fn flush(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.flush_block()
    }

    /// Flush the last block and finish the sink
    ///
    /// Calling `finish` again after success is a no-op.
    pub fn finish(&mut self) -> Result<()> {
        if self.state == StreamState::Finished {
            return Ok(());
        }
        self.ensure_open()?;
        self.flush_block()?;
        if let Err(err) = self.sink.finish() {
            return Err(self.fail(err));
        }
        self.state = StreamState::Finished;
        log::debug!(
            "sheet '{}' finished: {} rows in {} blocks, dimension {}",
            self.name,
            self.rows_written,
            self.blocks_flushed,
            self.dimension
        );
        Ok(())
    }

    /// Abort the stream; later calls fail with [`Error::SheetAborted`]
    pub fn abort<R: Into<String>>(&mut self, reason: R) {
        if self.state == StreamState::Open {
            let reason = reason.into();
            log::debug!("sheet '{}' aborted: {}", self.name, reason);
            self.state = StreamState::Aborted(reason);
        }
    }

    fn ensure_open(&self) -> Result<()> {
        match &self.state {
            StreamState::Open => Ok(()),
            StreamState::Aborted(reason) => Err(Error::SheetAborted(reason.clone())),
            StreamState::Failed(reason) => Err(Error::SheetFailed(reason.clone())),
            StreamState::Finished => Err(Error::SheetFinished),
        }
    }

    /// Stop the stream because of `err` and hand it back
    ///
    /// Write failures mark the stream failed; anything else aborts it.
    fn fail(&mut self, err: Error) -> Error {
        if !err.is_write_failure() {
            self.abort(err.to_string());
        } else if self.state == StreamState::Open {
            log::warn!("sheet '{}' failed: {}", self.name, err);
            self.state = StreamState::Failed(err.to_string());
        }
        err
    }

    fn intern_strings(&self, cells: &mut [BlockCell]) -> Result<()> {
        for cell in cells {
            if let CellValue::String(s) = &cell.value {
                cell.sst_id = Some(self.sst.intern(s)?);
            }
        }
        Ok(())
    }

    fn flush_block(&mut self) -> Result<()> {
        if self.block.is_empty() || self.block.state() == BlockState::Flushed {
            return Ok(());
        }

        log::trace!(
            "sheet '{}': flushing block {} ({} rows, {} cells)",
            self.name,
            self.block.sequence(),
            self.block.len(),
            self.block.cell_count()
        );
        if let Err(err) = self.sink.write_block(&self.block) {
            return Err(self.fail(err));
        }
        self.block.mark_flushed();
        self.blocks_flushed += 1;
        Ok(())
    }

    fn push_row(&mut self, mut row: BlockRow) -> Result<()> {
        if let Err(err) = self.intern_strings(&mut row.cells) {
            self.block.return_cell_buffer(row.cells);
            return Err(self.fail(err));
        }
        for cell in &row.cells {
            self.dimension.extend(row.index, cell.col);
        }
        self.last_row = Some(row.index);
        self.rows_written += 1;
        self.block.push_row(row);

        if self.block.state() == BlockState::Full {
            self.flush_block()?;
        }
        Ok(())
    }
}

/// Builder for one row; cells are appended left to right
///
/// The row only becomes part of the sheet on [`RowBuilder::end_row`];
/// dropping the builder discards it. Strings are interned when the row
/// ends, so a discarded row leaves nothing in the shared string table.
#[derive(Debug)]
pub struct RowBuilder<'a, S: RowBlockSink> {
    stream: &'a mut SheetStream<S>,
    row: BlockRow,
    next_col: u32,
}

impl<'a, S: RowBlockSink> RowBuilder<'a, S> {
    /// 0-based index of this row
    pub fn index(&self) -> u32 {
        self.row.index
    }

    /// Column the next appended cell lands in
    pub fn next_col(&self) -> u32 {
        self.next_col
    }

    /// Append a cell in the next column
    pub fn append_cell<V: Into<CellValue>>(&mut self, value: V, style: StyleCode) -> Result<()> {
        self.append_cell_at(self.next_col, value, style)
    }

    /// Append a cell at `col`, leaving any skipped columns empty
    pub fn append_cell_at<V: Into<CellValue>>(
        &mut self,
        col: u32,
        value: V,
        style: StyleCode,
    ) -> Result<()> {
        self.stream.ensure_open()?;
        if col < self.next_col {
            return Err(Error::other(format!(
                "column {} written after column {} in row {}",
                col,
                self.next_col.saturating_sub(1),
                self.row.index + 1
            )));
        }
        let value = value.into();
        if let Err(err) = self.check_cell(col, &value) {
            return Err(self.stream.fail(err));
        }

        self.next_col = col + 1;
        if value.is_empty() && style.is_default() {
            return Ok(());
        }
        self.row.cells.push(BlockCell {
            col,
            style,
            value,
            sst_id: None,
        });
        Ok(())
    }

    /// Finish the row and append it to the current block
    ///
    /// Flushes the block to the sink when this row fills it.
    pub fn end_row(mut self) -> Result<()> {
        self.stream.ensure_open()?;
        let row = std::mem::take(&mut self.row);
        self.stream.push_row(row)
    }

    fn check_cell(&self, col: u32, value: &CellValue) -> Result<()> {
        let limits = &self.stream.limits;
        if col >= limits.max_cols {
            return Err(Error::TooManyColumns {
                row: self.row.index,
                col,
                limit: limits.max_cols,
            });
        }

        if let Some(text) = value.text() {
            let chars = text.chars().count();
            if chars > limits.max_chars_per_cell {
                return Err(Error::CellTooLong {
                    cell: cell_reference(self.row.index, col),
                    chars,
                    limit: limits.max_chars_per_cell,
                });
            }
            let line_feeds = text.bytes().filter(|&b| b == b'\n').count();
            if line_feeds > limits.max_line_feeds_per_cell {
                return Err(Error::TooManyLineFeeds {
                    cell: cell_reference(self.row.index, col),
                    line_feeds,
                    limit: limits.max_line_feeds_per_cell,
                });
            }
        }
        Ok(())
    }
}

impl<S: RowBlockSink> Drop for RowBuilder<'_, S> {
    fn drop(&mut self) {
        let cells = std::mem::take(&mut self.row.cells);
        self.stream.block.return_cell_buffer(cells);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sst::SstOptions;
    use pretty_assertions::assert_eq;

    fn sst() -> Arc<SharedStringTable> {
        Arc::new(SharedStringTable::new(SstOptions::default()).unwrap())
    }

    fn stream(limits: SheetLimits) -> SheetStream<Vec<RowBlock>> {
        SheetStream::new("Sheet1", Vec::new(), sst(), limits, 32)
    }

    fn write_rows<S: RowBlockSink>(stream: &mut SheetStream<S>, count: u32) -> Result<()> {
        for i in 0..count {
            let mut row = stream.begin_row()?;
            row.append_cell(i, StyleCode::DEFAULT)?;
            row.end_row()?;
        }
        Ok(())
    }

    #[test]
    fn test_full_block_flushes_once() {
        let mut stream = stream(SheetLimits::default());
        write_rows(&mut stream, 32).unwrap();

        assert_eq!(stream.blocks_flushed(), 1);
        assert_eq!(stream.sink().len(), 1);
        assert_eq!(stream.sink()[0].len(), 32);
        assert_eq!(stream.block_state(), BlockState::Flushed);

        write_rows(&mut stream, 1).unwrap();
        assert_eq!(stream.blocks_flushed(), 1);
        assert_eq!(stream.block_state(), BlockState::Filling);
        assert_eq!(stream.block().len(), 1);
        assert_eq!(stream.block().first_row(), Some(32));
    }

    #[test]
    fn test_finish_flushes_partial_block() {
        let mut stream = stream(SheetLimits::default());
        write_rows(&mut stream, 40).unwrap();
        stream.finish().unwrap();

        assert!(stream.is_finished());
        assert_eq!(stream.block_state(), BlockState::Flushed);
        let blocks = stream.into_sink();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].first_row(), Some(32));
        assert_eq!(blocks[1].last_row(), Some(39));
        assert_eq!(blocks[1].sequence(), 1);
    }

    #[test]
    fn test_finish_twice_is_noop() {
        let mut stream = stream(SheetLimits::default());
        write_rows(&mut stream, 3).unwrap();
        stream.finish().unwrap();
        stream.finish().unwrap();
        assert_eq!(stream.sink().len(), 1);
        assert!(matches!(stream.begin_row(), Err(Error::SheetFinished)));
    }

    #[test]
    fn test_strings_are_interned() {
        let sst = sst();
        let mut stream = SheetStream::new("S", Vec::new(), Arc::clone(&sst), SheetLimits::default(), 4);

        let mut row = stream.begin_row().unwrap();
        row.append_cell("alpha", StyleCode::DEFAULT).unwrap();
        row.append_cell("beta", StyleCode::DEFAULT).unwrap();
        row.append_cell("alpha", StyleCode::DEFAULT).unwrap();
        row.end_row().unwrap();
        stream.finish().unwrap();

        let ids: Vec<_> = stream.sink()[0].rows()[0]
            .cells
            .iter()
            .map(|c| c.sst_id)
            .collect();
        assert_eq!(ids, vec![Some(0), Some(1), Some(0)]);
        assert_eq!(sst.len(), 2);
    }

    #[test]
    fn test_empty_default_cells_are_skipped() {
        let mut stream = stream(SheetLimits::default());
        let styled = StyleCode::from_raw(1 << 16);

        let mut row = stream.begin_row().unwrap();
        row.append_cell(CellValue::Empty, StyleCode::DEFAULT).unwrap();
        row.append_cell(CellValue::Empty, styled).unwrap();
        row.append_cell(1.5, StyleCode::DEFAULT).unwrap();
        row.end_row().unwrap();
        stream.finish().unwrap();

        let cols: Vec<_> = stream.sink()[0].rows()[0].cells.iter().map(|c| c.col).collect();
        assert_eq!(cols, vec![1, 2]);
        assert_eq!(stream.dimension().to_string(), "B1:C1");
    }

    #[test]
    fn test_row_limit_aborts_without_touching_flushed_blocks() {
        let mut stream = stream(SheetLimits::default().with_max_rows(40));
        write_rows(&mut stream, 40).unwrap();

        let err = stream.begin_row().unwrap_err();
        assert!(matches!(err, Error::TooManyRows { row: 40, limit: 40 }));
        assert!(stream.is_aborted());
        assert!(matches!(stream.begin_row(), Err(Error::SheetAborted(_))));
        assert!(matches!(stream.finish(), Err(Error::SheetAborted(_))));

        let blocks = stream.into_sink();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].len(), 32);
        assert_eq!(blocks[0].last_row(), Some(31));
    }

    #[test]
    fn test_column_limit() {
        let mut stream = stream(SheetLimits::default());
        let mut row = stream.begin_row().unwrap();
        row.append_cell_at(16_383, 1, StyleCode::DEFAULT).unwrap();
        let err = row.append_cell(2, StyleCode::DEFAULT).unwrap_err();
        assert!(matches!(
            err,
            Error::TooManyColumns {
                row: 0,
                col: 16_384,
                limit: 16_384
            }
        ));
        assert!(matches!(row.end_row(), Err(Error::SheetAborted(_))));
    }

    #[test]
    fn test_column_limit_keeps_flushed_blocks() {
        let mut stream = stream(SheetLimits::default());
        write_rows(&mut stream, 33).unwrap();
        assert_eq!(stream.blocks_flushed(), 1);

        let mut row = stream.begin_row().unwrap();
        let err = row.append_cell_at(16_384, 1, StyleCode::DEFAULT).unwrap_err();
        assert!(err.is_capacity_violation());
        drop(row);
        assert!(stream.is_aborted());
        assert!(matches!(stream.flush(), Err(Error::SheetAborted(_))));

        // Row 33 never ended and row 32 stays buffered; block 0 is intact
        let blocks = stream.into_sink();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].len(), 32);
        assert_eq!(blocks[0].first_row(), Some(0));
        assert_eq!(blocks[0].last_row(), Some(31));
        assert!(blocks[0].rows().iter().all(|r| r.cells.len() == 1));
    }

    #[test]
    fn test_text_limits() {
        let mut stream = stream(SheetLimits::default());
        let mut row = stream.begin_row().unwrap();
        row.append_cell("x".repeat(32_767), StyleCode::DEFAULT).unwrap();
        let err = row
            .append_cell("x".repeat(32_768), StyleCode::DEFAULT)
            .unwrap_err();
        assert!(matches!(err, Error::CellTooLong { ref cell, chars: 32_768, .. } if cell == "B1"));

        let mut stream = SheetStream::new("S", Vec::new(), sst(), SheetLimits::default(), 32);
        let mut row = stream.begin_row().unwrap();
        row.append_cell("a\n".repeat(253), StyleCode::DEFAULT).unwrap();
        let err = row
            .append_cell("a\n".repeat(254), StyleCode::DEFAULT)
            .unwrap_err();
        assert!(matches!(err, Error::TooManyLineFeeds { line_feeds: 254, .. }));
    }

    #[test]
    fn test_row_order() {
        let mut stream = stream(SheetLimits::default());
        stream.begin_row_at(5).unwrap().end_row().unwrap();
        assert!(matches!(
            stream.begin_row_at(5),
            Err(Error::RowOutOfOrder { row: 5, last: 5 })
        ));
        // Ordering mistakes are not capacity violations.
        assert!(!stream.is_aborted());
        assert_eq!(stream.begin_row().unwrap().index(), 6);
    }

    #[test]
    fn test_dropped_builder_discards_row() {
        let mut stream = stream(SheetLimits::default());
        {
            let mut row = stream.begin_row().unwrap();
            row.append_cell(1, StyleCode::DEFAULT).unwrap();
        }
        assert_eq!(stream.rows_written(), 0);
        assert_eq!(stream.begin_row().unwrap().index(), 0);
    }

    #[test]
    fn test_dropped_builder_leaves_no_strings() {
        let sst = sst();
        let mut stream = SheetStream::new("S", Vec::new(), Arc::clone(&sst), SheetLimits::default(), 4);
        {
            let mut row = stream.begin_row().unwrap();
            row.append_cell("discarded", StyleCode::DEFAULT).unwrap();
            row.append_cell("also discarded", StyleCode::DEFAULT).unwrap();
        }
        assert_eq!(sst.len(), 0);

        // The discarded row's buffer is handed to the next row
        let row = stream.begin_row().unwrap();
        assert!(row.row.cells.is_empty());
        assert!(row.row.cells.capacity() >= 2);
        row.end_row().unwrap();

        let mut row = stream.begin_row().unwrap();
        row.append_cell("kept", StyleCode::DEFAULT).unwrap();
        row.end_row().unwrap();
        assert_eq!(sst.len(), 1);
        assert_eq!(sst.get(0).unwrap(), "kept");
    }

    struct FailingSink;

    impl RowBlockSink for FailingSink {
        fn write_block(&mut self, _block: &RowBlock) -> Result<()> {
            Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk full",
            )))
        }
    }

    #[test]
    fn test_sink_failure_fails_stream() {
        let mut stream = SheetStream::new("S", FailingSink, sst(), SheetLimits::default(), 2);
        write_rows(&mut stream, 1).unwrap();
        let err = write_rows(&mut stream, 1).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert!(stream.is_failed());
        assert!(!stream.is_aborted());
        assert_eq!(stream.failure(), Some("IO error: disk full"));
        assert!(matches!(stream.begin_row(), Err(Error::SheetFailed(_))));
        assert!(matches!(stream.finish(), Err(Error::SheetFailed(_))));
    }

    #[test]
    fn test_string_table_failure_fails_stream() {
        let sst = sst();
        let mut stream = SheetStream::new("S", Vec::new(), Arc::clone(&sst), SheetLimits::default(), 4);
        sst.close().unwrap();

        let mut row = stream.begin_row().unwrap();
        row.append_cell("late", StyleCode::DEFAULT).unwrap();
        assert!(matches!(row.end_row(), Err(Error::Closed)));
        assert!(stream.is_failed());
        assert_eq!(stream.rows_written(), 0);
    }
}

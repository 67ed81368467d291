//! Bounded row-block pipeline
//!
//! A [`SheetStream`] collects rows into a fixed-capacity [`RowBlock`]
//! (32 rows by default). When the block fills it is handed to a
//! [`RowBlockSink`] by reference and reused once the sink returns, which
//! keeps a sheet of any length within one block of memory.
//!
//! ```rust
//! use std::sync::Arc;
//! use sheetstream_core::block::{RowBlock, SheetLimits, SheetStream};
//! use sheetstream_core::sst::{SharedStringTable, SstOptions};
//! use sheetstream_core::StyleCode;
//!
//! let sst = Arc::new(SharedStringTable::new(SstOptions::default())?);
//! let mut stream = SheetStream::new("Data", Vec::<RowBlock>::new(), sst, SheetLimits::default(), 32);
//!
//! let mut row = stream.begin_row()?;
//! row.append_cell("name", StyleCode::DEFAULT)?;
//! row.append_cell(42, StyleCode::DEFAULT)?;
//! row.end_row()?;
//! stream.finish()?;
//!
//! assert_eq!(stream.sink().len(), 1);
//! # Ok::<(), sheetstream_core::Error>(())
//! ```

mod limits;
mod row_block;
mod sink;
mod stream;

pub use limits::{SheetLimits, SpreadsheetFormat};
pub use row_block::{BlockCell, BlockRow, BlockState, RowBlock, DEFAULT_BLOCK_ROWS};
pub use sink::RowBlockSink;
pub use stream::{RowBuilder, SheetStream};

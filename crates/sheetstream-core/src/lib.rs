//! # sheetstream-core
//!
//! Core data structures for streaming spreadsheet output with bounded
//! memory.
//!
//! - [`SharedStringTable`] - Disk-backed, deduplicating string interner
//! - [`StyleRegistry`] - Packed 32-bit style codes and component pools
//! - [`SheetStream`] - Row-block pipeline with per-format limits
//! - [`PrimitiveIndexMap`], [`BoundedLruCache`], [`BloomFilter`] - The
//!   index structures behind them
//!
//! ## Example
//!
//! ```rust
//! use sheetstream_core::{SharedStringTable, SstOptions, Style, StyleRegistry};
//!
//! let sst = SharedStringTable::new(SstOptions::default())?;
//! let hello = sst.intern("hello")?;
//! assert_eq!(sst.intern("hello")?, hello);
//! assert_eq!(sst.get(hello)?, "hello");
//!
//! let styles = StyleRegistry::new();
//! let bold = styles.register_style(&Style::new().bold(true))?;
//! assert_eq!(styles.register_style(&Style::new().bold(true))?, bold);
//! # Ok::<(), sheetstream_core::Error>(())
//! ```

pub mod block;
pub mod bloom;
pub mod cell;
pub mod error;
pub mod index_map;
pub mod lru;
pub mod sst;
pub mod style;

pub use block::{
    BlockCell, BlockRow, BlockState, RowBlock, RowBlockSink, RowBuilder, SheetLimits,
    SheetStream, SpreadsheetFormat, DEFAULT_BLOCK_ROWS,
};
pub use bloom::{BloomFilter, StreamingHasher};
pub use cell::{cell_reference, column_index, column_letters, CellError, CellValue, Dimension};
pub use error::{Error, Result};
pub use index_map::{PrimitiveIndexMap, PrimitiveKey};
pub use lru::BoundedLruCache;
pub use sst::{SharedStringTable, SstOptions};

// Re-export all style types for convenience
pub use style::{
    Alignment, BorderEdge, BorderLineStyle, BorderSide, BorderStyle, Color, FillStyle, FontSize,
    FontStyle, HorizontalAlignment, NumberFormat, PatternType, Style, StyleCode, StyleDescriptor,
    StyleField, StyleRegistry, StyleSheet, Underline, VerticalAlignment,
};

/// Maximum number of rows in an OOXML worksheet
pub const MAX_ROWS: u32 = SheetLimits::MAX_ROWS_XLSX;

/// Maximum number of rows in a legacy binary worksheet
pub const MAX_ROWS_XLS: u32 = SheetLimits::MAX_ROWS_XLS;

/// Maximum number of columns in a worksheet
pub const MAX_COLS: u32 = SheetLimits::MAX_COLS;

/// Maximum characters in a single cell
pub const MAX_CELL_CHARS: usize = SheetLimits::MAX_CHARS_PER_CELL;

/// Maximum line feeds in a single cell
pub const MAX_CELL_LINE_FEEDS: usize = SheetLimits::MAX_LINE_FEEDS_PER_CELL;

/// Maximum length of a sheet name
pub const MAX_SHEET_NAME_LEN: usize = 31;

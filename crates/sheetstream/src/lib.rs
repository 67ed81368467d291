//! # sheetstream
//!
//! Write spreadsheets with millions of rows in bounded memory.
//!
//! Rows are buffered in fixed-size blocks and encoded as soon as a block
//! fills, strings are deduplicated through a disk-backed shared string
//! table, and styles are packed into 32-bit codes. Memory use depends on
//! the block size, not on the number of rows.
//!
//! ## Features
//!
//! - Streaming XLSX (Office Open XML) output
//! - Several sheets written concurrently, sharing strings and styles
//! - Per-format capacity limits (rows, columns, cell text) that abort only
//!   the offending sheet
//! - Fonts, fills, borders, alignment and number formats
//!
//! ## Example
//!
//! ```rust
//! use sheetstream::prelude::*;
//!
//! # fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! # let dir = tempfile::tempdir()?;
//! # let path = dir.path().join("report.xlsx");
//! let workbook = sheetstream::create(&path)?;
//! let bold = workbook.register_style(&Style::new().bold(true))?;
//!
//! let mut sheet = workbook.add_worksheet("Report")?;
//! sheet.write_styled_row([("Item", bold), ("Amount", bold)])?;
//! for i in 0..1000u32 {
//!     sheet.write_row([CellValue::from(format!("item {}", i)), CellValue::from(i * 10)])?;
//! }
//! sheet.finish()?;
//!
//! workbook.close()?;
//! # Ok(())
//! # }
//! ```

pub mod prelude;

use std::path::Path;

// Re-export core types
pub use sheetstream_core::{
    cell_reference,
    column_index,
    column_letters,
    Alignment,
    // Index structures
    BloomFilter,
    BorderEdge,
    BorderLineStyle,
    BorderSide,
    BorderStyle,
    BoundedLruCache,
    // Cell types
    CellError,
    CellValue,
    Color,
    Dimension,
    // Error types
    Error,
    FillStyle,
    FontSize,
    FontStyle,
    HorizontalAlignment,
    NumberFormat,
    PatternType,
    PrimitiveIndexMap,
    Result,
    // Row-block pipeline
    RowBlock,
    RowBlockSink,
    RowBuilder,
    // Shared strings
    SharedStringTable,
    SheetLimits,
    SheetStream,
    SpreadsheetFormat,
    SstOptions,
    StreamingHasher,
    // Style types
    Style,
    StyleCode,
    StyleDescriptor,
    StyleField,
    StyleRegistry,
    Underline,
    VerticalAlignment,
    // Constants
    MAX_CELL_CHARS,
    MAX_CELL_LINE_FEEDS,
    MAX_COLS,
    MAX_ROWS,
    MAX_ROWS_XLS,
    MAX_SHEET_NAME_LEN,
};

// Re-export I/O types
pub use sheetstream_xlsx::{
    SheetWriter, StreamingWorkbook, WriterOptions, XlsxError, XlsxResult, XlsxSheetSink,
};

/// Start a streaming XLSX workbook at `path` with default options
pub fn create<P: AsRef<Path>>(path: P) -> XlsxResult<StreamingWorkbook> {
    StreamingWorkbook::create(path, WriterOptions::default())
}

/// Start a streaming workbook whose sheets obey the limits of `format`
///
/// The package is always OOXML; choosing [`SpreadsheetFormat::Xls`] only
/// tightens the row limit so the data also fits the legacy binary format.
pub fn create_with_format<P: AsRef<Path>>(
    path: P,
    format: SpreadsheetFormat,
) -> XlsxResult<StreamingWorkbook> {
    StreamingWorkbook::create(path, WriterOptions::for_format(format))
}

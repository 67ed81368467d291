//! # sheetstream-xlsx
//!
//! Streaming XLSX (Office Open XML) writer for sheetstream.
//!
//! Rows flow through the row-block pipeline from `sheetstream-core` and are
//! encoded block by block into per-sheet temporary files. Shared strings
//! live in the disk-backed table and styles in the packed-code registry, so
//! memory stays bounded no matter how many rows are written. The package is
//! assembled when the workbook is closed.

pub mod error;
pub mod options;
pub mod workbook;

mod package;
mod sink;
mod styles;
mod xml;

pub use error::{XlsxError, XlsxResult};
pub use options::WriterOptions;
pub use sink::XlsxSheetSink;
pub use workbook::{validate_sheet_name, SheetWriter, StreamingWorkbook};

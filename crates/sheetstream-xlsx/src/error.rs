//! XLSX error types

use thiserror::Error;

/// Result type for XLSX operations
pub type XlsxResult<T> = std::result::Result<T, XlsxError>;

/// Errors that can occur while writing a workbook
#[derive(Debug, Error)]
pub enum XlsxError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Core error (limits, shared strings, styles)
    #[error("Core error: {0}")]
    Core(#[from] sheetstream_core::Error),

    /// Sheet name rejected by the package format
    #[error("Invalid sheet name '{name}': {reason}")]
    InvalidSheetName { name: String, reason: &'static str },

    /// Sheet name already used in this workbook (names are case-insensitive)
    #[error("Duplicate sheet name '{0}'")]
    DuplicateSheetName(String),

    /// No sheet was finished successfully, so there is nothing to package
    #[error("Workbook has no finished worksheets")]
    NoWorksheets,

    /// Workbook was already closed
    #[error("Workbook is closed")]
    Closed,

    /// A sheet's data could not be written, so the workbook cannot be
    /// completed
    #[error("Sheet '{sheet}' failed: {reason}")]
    SheetFailed { sheet: String, reason: String },
}

impl XlsxError {
    /// Whether this error aborted only the sheet being written
    pub fn is_sheet_local(&self) -> bool {
        matches!(self, XlsxError::Core(e) if e.is_capacity_violation())
            || matches!(self, XlsxError::Core(sheetstream_core::Error::SheetAborted(_)))
    }
}

//! Error types for sheetstream-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in sheetstream-core
#[derive(Debug, Error)]
pub enum Error {
    /// IO error from the shared string store or a block sink
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Shared string id was never assigned
    #[error("Shared string {id} not found (table holds {len} strings)")]
    StringNotFound { id: u32, len: u32 },

    /// Shared string table was closed
    #[error("Shared string table is closed")]
    Closed,

    /// A previous commit or close failed; the table must not be used further
    #[error("Shared string table is unusable after a failed write")]
    Poisoned,

    /// Shared string store on disk is not readable
    #[error("Corrupt shared string store: {0}")]
    CorruptStore(String),

    /// Shared string table ran out of 32-bit ids
    #[error("Shared string table is full ({0} strings)")]
    StringTableFull(u32),

    /// Style descriptor field does not fit its bit range
    #[error("Style field {field} value {value} exceeds maximum {max}")]
    StyleFieldOverflow {
        field: &'static str,
        value: u32,
        max: u32,
    },

    /// Packed style code holds an impossible field value
    #[error("Malformed style code {code:#010x}: {reason}")]
    MalformedStyleCode { code: u32, reason: &'static str },

    /// Row index past the format's row limit
    #[error("Too many rows: row {row} exceeds limit of {limit}")]
    TooManyRows { row: u32, limit: u32 },

    /// Column index past the column limit
    #[error("Too many columns: column {col} in row {row} exceeds limit of {limit}")]
    TooManyColumns { row: u32, col: u32, limit: u32 },

    /// Cell text longer than the per-cell character limit
    #[error("Cell {cell} has {chars} characters (limit {limit})")]
    CellTooLong {
        cell: String,
        chars: usize,
        limit: usize,
    },

    /// Cell text with more line feeds than allowed
    #[error("Cell {cell} has {line_feeds} line feeds (limit {limit})")]
    TooManyLineFeeds {
        cell: String,
        line_feeds: usize,
        limit: usize,
    },

    /// Rows must be written in strictly increasing order
    #[error("Row {row} written out of order (last row was {last})")]
    RowOutOfOrder { row: u32, last: u32 },

    /// Sheet write was aborted by an earlier error
    #[error("Sheet write aborted: {0}")]
    SheetAborted(String),

    /// Sheet write stopped by an I/O or string table failure
    #[error("Sheet write failed: {0}")]
    SheetFailed(String),

    /// Sheet stream already finished
    #[error("Sheet stream already finished")]
    SheetFinished,

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a new "other" error with a message
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }

    /// Whether this error is a sheet capacity violation
    ///
    /// Capacity violations abort the current sheet only; the rest of the
    /// workbook can still be written.
    pub fn is_capacity_violation(&self) -> bool {
        matches!(
            self,
            Error::TooManyRows { .. }
                | Error::TooManyColumns { .. }
                | Error::CellTooLong { .. }
                | Error::TooManyLineFeeds { .. }
        )
    }

    /// Whether this error means sheet data could not be stored
    ///
    /// These cover the sink and the shared string store. A sheet stopped by
    /// one of them cannot be trusted, and neither can the workbook.
    pub fn is_write_failure(&self) -> bool {
        matches!(
            self,
            Error::Io(_) | Error::Closed | Error::Poisoned | Error::CorruptStore(_)
        )
    }
}

//! Prelude module - common imports for sheetstream users
//!
//! ```rust
//! use sheetstream::prelude::*;
//! ```

pub use crate::{
    // Style types
    Alignment,
    BorderEdge,
    BorderLineStyle,
    BorderStyle,
    // Cell types
    CellError,
    CellValue,

    Color,
    // Error types
    Error,
    FillStyle,
    FontStyle,
    HorizontalAlignment,
    NumberFormat,
    Result,

    // Main types
    SheetLimits,
    SheetWriter,
    SpreadsheetFormat,
    StreamingWorkbook,
    Style,
    StyleCode,
    VerticalAlignment,
    WriterOptions,
    XlsxError,
    XlsxResult,
};

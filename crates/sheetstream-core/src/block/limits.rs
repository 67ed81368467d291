//! Per-format worksheet limits

/// Target spreadsheet format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SpreadsheetFormat {
    /// Office Open XML (`.xlsx`)
    #[default]
    Xlsx,
    /// Legacy binary workbook (`.xls`)
    Xls,
}

/// Capacity limits enforced while streaming a sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetLimits {
    /// Rows per sheet
    pub max_rows: u32,
    /// Columns per row
    pub max_cols: u32,
    /// Characters per text cell
    pub max_chars_per_cell: usize,
    /// Line feeds per text cell
    pub max_line_feeds_per_cell: usize,
}

impl SheetLimits {
    pub const MAX_COLS: u32 = 16_384;
    pub const MAX_ROWS_XLSX: u32 = 1_048_576;
    pub const MAX_ROWS_XLS: u32 = 65_536;
    pub const MAX_CHARS_PER_CELL: usize = 32_767;
    pub const MAX_LINE_FEEDS_PER_CELL: usize = 253;

    pub const XLSX: SheetLimits = SheetLimits {
        max_rows: Self::MAX_ROWS_XLSX,
        max_cols: Self::MAX_COLS,
        max_chars_per_cell: Self::MAX_CHARS_PER_CELL,
        max_line_feeds_per_cell: Self::MAX_LINE_FEEDS_PER_CELL,
    };

    pub const XLS: SheetLimits = SheetLimits {
        max_rows: Self::MAX_ROWS_XLS,
        ..Self::XLSX
    };

    /// Limits of the given format
    pub const fn for_format(format: SpreadsheetFormat) -> Self {
        match format {
            SpreadsheetFormat::Xlsx => Self::XLSX,
            SpreadsheetFormat::Xls => Self::XLS,
        }
    }

    pub fn with_max_rows(mut self, max_rows: u32) -> Self {
        self.max_rows = max_rows;
        self
    }

    pub fn with_max_cols(mut self, max_cols: u32) -> Self {
        self.max_cols = max_cols;
        self
    }
}

impl Default for SheetLimits {
    fn default() -> Self {
        Self::XLSX
    }
}

impl From<SpreadsheetFormat> for SheetLimits {
    fn from(format: SpreadsheetFormat) -> Self {
        Self::for_format(format)
    }
}

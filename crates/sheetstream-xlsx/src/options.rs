//! Writer configuration

use std::path::PathBuf;

use sheetstream_core::{SheetLimits, SpreadsheetFormat, SstOptions, DEFAULT_BLOCK_ROWS};

/// Options for a [`StreamingWorkbook`](crate::StreamingWorkbook)
#[derive(Debug, Clone)]
pub struct WriterOptions {
    /// Limits enforced on every sheet
    pub limits: SheetLimits,
    /// Rows buffered per block before they are encoded
    pub block_rows: usize,
    /// Shared string table tuning
    pub sst: SstOptions,
    /// Deflate level for package parts (`None` uses the zip default)
    pub compression_level: Option<i64>,
    /// Directory for temporary sheet parts (`None` uses the system default)
    pub temp_dir: Option<PathBuf>,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            limits: SheetLimits::XLSX,
            block_rows: DEFAULT_BLOCK_ROWS,
            sst: SstOptions::default(),
            compression_level: None,
            temp_dir: None,
        }
    }
}

impl WriterOptions {
    /// Default options with the limits of `format`
    pub fn for_format(format: SpreadsheetFormat) -> Self {
        Self {
            limits: SheetLimits::for_format(format),
            ..Self::default()
        }
    }

    pub fn with_limits(mut self, limits: SheetLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_block_rows(mut self, block_rows: usize) -> Self {
        self.block_rows = block_rows;
        self
    }

    pub fn with_sst(mut self, sst: SstOptions) -> Self {
        self.sst = sst;
        self
    }

    pub fn with_compression_level(mut self, level: i64) -> Self {
        self.compression_level = Some(level);
        self
    }

    pub fn with_temp_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }
}

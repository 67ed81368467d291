//! Streaming workbook writer

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex, MutexGuard};
use sheetstream_core::{
    CellValue, Dimension, RowBuilder, SharedStringTable, SheetStream, StyleCode, StyleRegistry,
    MAX_SHEET_NAME_LEN,
};
use tempfile::NamedTempFile;

use crate::error::{XlsxError, XlsxResult};
use crate::options::WriterOptions;
use crate::package::{PackageWriter, SheetPart};
use crate::sink::{FailureSlot, XlsxSheetSink};

/// Characters the package format forbids in sheet names
const FORBIDDEN_NAME_CHARS: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];

#[derive(Debug)]
enum SheetState {
    Writing,
    /// `finish` is running; `close` waits for it to settle
    Finishing,
    Finished(SheetPart),
    Aborted(String),
    /// Sheet data could not be written; the workbook cannot be closed
    Failed(String),
    Abandoned,
}

#[derive(Debug)]
struct SheetEntry {
    name: String,
    state: SheetState,
    /// Set by the sheet's sink as soon as a write fails
    failure: FailureSlot,
}

#[derive(Debug, Default)]
struct Registry {
    entries: Vec<SheetEntry>,
    closed: bool,
}

impl Registry {
    fn set_state(&mut self, index: usize, state: SheetState) {
        if let Some(entry) = self.entries.get_mut(index) {
            entry.state = state;
        }
    }

    fn finishing(&self) -> bool {
        self.entries
            .iter()
            .any(|e| matches!(e.state, SheetState::Finishing))
    }

    /// Name and reason of the first sheet that hit a write failure
    fn first_failure(&self) -> Option<XlsxError> {
        self.entries.iter().find_map(|e| {
            let reason = match &e.state {
                SheetState::Failed(reason) => Some(reason.clone()),
                _ => e.failure.get(),
            }?;
            Some(XlsxError::SheetFailed {
                sheet: e.name.clone(),
                reason,
            })
        })
    }
}

/// Sheet registry shared between the workbook and its sheet writers
#[derive(Debug, Default)]
struct Sheets {
    registry: Mutex<Registry>,
    /// Signalled whenever a sheet leaves `Finishing`
    settled: Condvar,
}

impl Sheets {
    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock()
    }

    fn set_state(&self, index: usize, state: SheetState) {
        self.lock().set_state(index, state);
        self.settled.notify_all();
    }
}

/// Writes an XLSX workbook sheet by sheet with bounded memory
///
/// Each [`SheetWriter`] streams its rows to a temporary file as blocks
/// fill. Strings and styles are shared across sheets, and sheet writers
/// may live on different threads. Nothing appears at the target path until
/// [`StreamingWorkbook::close`] succeeds; the archive is assembled in a
/// temporary file next to it and renamed into place.
///
/// ```no_run
/// use sheetstream_xlsx::{StreamingWorkbook, WriterOptions};
/// use sheetstream_core::{CellValue, Style};
///
/// let workbook = StreamingWorkbook::create("report.xlsx", WriterOptions::default())?;
/// let header = workbook.register_style(&Style::new().bold(true))?;
///
/// let mut sheet = workbook.add_worksheet("Data")?;
/// sheet.write_styled_row([("id", header), ("name", header)])?;
/// for i in 0..1_000_000u32 {
///     sheet.write_row([CellValue::from(i), CellValue::from(format!("item {}", i))])?;
/// }
/// sheet.finish()?;
///
/// workbook.close()?;
/// # Ok::<(), sheetstream_xlsx::XlsxError>(())
/// ```
#[derive(Debug)]
pub struct StreamingWorkbook {
    path: PathBuf,
    options: WriterOptions,
    sst: Arc<SharedStringTable>,
    styles: Arc<StyleRegistry>,
    sheets: Arc<Sheets>,
}

impl StreamingWorkbook {
    /// Start a workbook that will be written to `path` on close
    pub fn create<P: AsRef<Path>>(path: P, options: WriterOptions) -> XlsxResult<Self> {
        let sst = SharedStringTable::new(options.sst.clone())?;
        Ok(Self {
            path: path.as_ref().to_path_buf(),
            options,
            sst: Arc::new(sst),
            styles: Arc::new(StyleRegistry::new()),
            sheets: Arc::new(Sheets::default()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn options(&self) -> &WriterOptions {
        &self.options
    }

    /// The workbook-wide shared string table
    pub fn shared_strings(&self) -> &Arc<SharedStringTable> {
        &self.sst
    }

    /// The workbook-wide style registry
    pub fn styles(&self) -> &Arc<StyleRegistry> {
        &self.styles
    }

    /// Register a style for use in any sheet of this workbook
    pub fn register_style(&self, style: &sheetstream_core::Style) -> XlsxResult<StyleCode> {
        Ok(self.styles.register_style(style)?)
    }

    /// Names of all sheets added so far, in order
    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets
            .lock()
            .entries
            .iter()
            .map(|e| e.name.clone())
            .collect()
    }

    /// Add a worksheet and return its writer
    ///
    /// Sheets appear in the package in the order they were added.
    pub fn add_worksheet<S: Into<String>>(&self, name: S) -> XlsxResult<SheetWriter> {
        let styles = Arc::clone(&self.styles);
        let temp_dir = self.options.temp_dir.clone();
        self.add_worksheet_with(name.into(), move || {
            XlsxSheetSink::new(styles, temp_dir.as_deref())
        })
    }

    fn add_worksheet_with<F>(&self, name: String, make_sink: F) -> XlsxResult<SheetWriter>
    where
        F: FnOnce() -> std::io::Result<XlsxSheetSink>,
    {
        validate_sheet_name(&name)?;
        let failure = FailureSlot::default();

        let index = {
            let mut sheets = self.sheets.lock();
            if sheets.closed {
                return Err(XlsxError::Closed);
            }
            if let Some(err) = sheets.first_failure() {
                return Err(err);
            }
            let lower = name.to_lowercase();
            if sheets.entries.iter().any(|e| e.name.to_lowercase() == lower) {
                return Err(XlsxError::DuplicateSheetName(name));
            }
            sheets.entries.push(SheetEntry {
                name: name.clone(),
                state: SheetState::Writing,
                failure: failure.clone(),
            });
            sheets.entries.len() - 1
        };

        let sink = match make_sink() {
            Ok(sink) => sink.with_failure_slot(failure),
            Err(err) => {
                log::warn!("sheet '{}' failed: {}", name, err);
                self.sheets
                    .set_state(index, SheetState::Failed(err.to_string()));
                return Err(err.into());
            }
        };
        let stream = SheetStream::new(
            name.clone(),
            sink,
            Arc::clone(&self.sst),
            self.options.limits,
            self.options.block_rows,
        );
        log::debug!("sheet '{}' started", name);

        Ok(SheetWriter {
            index,
            stream: Some(stream),
            sheets: Arc::clone(&self.sheets),
        })
    }

    /// Assemble the package and move it to the target path
    ///
    /// Sheets that were aborted, abandoned or are still being written are
    /// left out with a warning. Sheets in the middle of
    /// [`SheetWriter::finish`] are waited for. Fails with
    /// [`XlsxError::NoWorksheets`] when no sheet was finished, and with
    /// [`XlsxError::SheetFailed`] when any sheet hit a write failure; in
    /// both cases nothing is written to the target path.
    pub fn close(self) -> XlsxResult<()> {
        let entries = {
            let mut sheets = self.sheets.lock();
            sheets.closed = true;
            while sheets.finishing() {
                self.sheets.settled.wait(&mut sheets);
            }
            if let Some(err) = sheets.first_failure() {
                log::error!("not writing {}: {}", self.path.display(), err);
                return Err(err);
            }
            std::mem::take(&mut sheets.entries)
        };

        let mut parts = Vec::with_capacity(entries.len());
        for entry in entries {
            match entry.state {
                SheetState::Finished(part) => parts.push(part),
                SheetState::Aborted(reason) => {
                    log::warn!("omitting aborted sheet '{}': {}", entry.name, reason)
                }
                SheetState::Abandoned => {
                    log::warn!("omitting sheet '{}': dropped before finish", entry.name)
                }
                SheetState::Writing => {
                    log::warn!("omitting sheet '{}': still being written", entry.name)
                }
                SheetState::Finishing | SheetState::Failed(_) => {}
            }
        }
        if parts.is_empty() {
            return Err(XlsxError::NoWorksheets);
        }

        self.sst.commit()?;
        let styles = self.styles.snapshot()?;

        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let temp = NamedTempFile::new_in(&dir)?;
        let package = PackageWriter::new(temp, self.options.compression_level);
        let temp = package.write_package(&mut parts, &styles, &self.sst)?;

        let strings = self.sst.len();
        self.sst.close()?;
        temp.persist(&self.path).map_err(|e| e.error)?;
        log::debug!(
            "wrote {} with {} sheets and {} shared strings",
            self.path.display(),
            parts.len(),
            strings
        );
        Ok(())
    }
}

/// Writer for a single worksheet
///
/// Dropping a writer without calling [`SheetWriter::finish`] abandons the
/// sheet; it is left out of the package.
#[derive(Debug)]
pub struct SheetWriter {
    index: usize,
    stream: Option<SheetStream<XlsxSheetSink>>,
    sheets: Arc<Sheets>,
}

impl SheetWriter {
    fn stream(&mut self) -> XlsxResult<&mut SheetStream<XlsxSheetSink>> {
        self.stream
            .as_mut()
            .ok_or(XlsxError::Core(sheetstream_core::Error::SheetFinished))
    }

    pub fn name(&self) -> &str {
        self.stream.as_ref().map_or("", |s| s.name())
    }

    /// Rows ended so far
    pub fn rows_written(&self) -> u64 {
        self.stream.as_ref().map_or(0, |s| s.rows_written())
    }

    /// Used range so far
    pub fn dimension(&self) -> Dimension {
        self.stream.as_ref().map(|s| s.dimension()).unwrap_or_default()
    }

    pub fn is_aborted(&self) -> bool {
        self.stream.as_ref().is_some_and(|s| s.is_aborted())
    }

    /// Start the next row
    pub fn begin_row(&mut self) -> XlsxResult<RowBuilder<'_, XlsxSheetSink>> {
        Ok(self.stream()?.begin_row()?)
    }

    /// Start the row at a 0-based index past the last one written
    pub fn begin_row_at(&mut self, index: u32) -> XlsxResult<RowBuilder<'_, XlsxSheetSink>> {
        Ok(self.stream()?.begin_row_at(index)?)
    }

    /// Write a row of unstyled values
    pub fn write_row<I>(&mut self, values: I) -> XlsxResult<()>
    where
        I: IntoIterator,
        I::Item: Into<CellValue>,
    {
        let mut row = self.begin_row()?;
        for value in values {
            row.append_cell(value, StyleCode::DEFAULT)?;
        }
        row.end_row()?;
        Ok(())
    }

    /// Write a row of `(value, style)` pairs
    pub fn write_styled_row<I, V>(&mut self, cells: I) -> XlsxResult<()>
    where
        I: IntoIterator<Item = (V, StyleCode)>,
        V: Into<CellValue>,
    {
        let mut row = self.begin_row()?;
        for (value, style) in cells {
            row.append_cell(value, style)?;
        }
        row.end_row()?;
        Ok(())
    }

    /// Encode the rows buffered so far
    pub fn flush(&mut self) -> XlsxResult<()> {
        Ok(self.stream()?.flush()?)
    }

    /// Complete the sheet so it is included when the workbook closes
    ///
    /// A `close` that starts while this runs waits for it.
    pub fn finish(mut self) -> XlsxResult<()> {
        self.begin_finish()?;
        self.complete_finish()
    }

    /// Claim the sheet for finishing, unless the workbook already closed
    fn begin_finish(&mut self) -> XlsxResult<()> {
        self.stream()?;
        let mut sheets = self.sheets.lock();
        if sheets.closed {
            drop(sheets);
            self.stream()?
                .abort("workbook closed before the sheet finished");
            return Err(XlsxError::Closed);
        }
        sheets.set_state(self.index, SheetState::Finishing);
        Ok(())
    }

    /// Flush the stream and hand its body to the registry
    ///
    /// Every path out of here leaves `Finishing`: errors from the stream
    /// are recorded when `self` drops.
    fn complete_finish(mut self) -> XlsxResult<()> {
        self.stream()?.finish()?;

        let Some(stream) = self.stream.take() else {
            return Err(XlsxError::Core(sheetstream_core::Error::SheetFinished));
        };
        let name = stream.name().to_string();
        let dimension = stream.dimension();
        let rows = stream.rows_written();

        let state = match stream.into_sink().into_body() {
            Ok((body, body_len)) => SheetState::Finished(SheetPart {
                name: name.clone(),
                body,
                body_len,
                dimension,
            }),
            Err(err) => {
                log::warn!("sheet '{}' failed: {}", name, err);
                self.sheets
                    .set_state(self.index, SheetState::Failed(err.to_string()));
                return Err(err.into());
            }
        };
        self.sheets.set_state(self.index, state);
        log::debug!("sheet '{}' ready for packaging ({} rows)", name, rows);
        Ok(())
    }

    /// Give up on this sheet; it is left out of the package
    pub fn abort<R: Into<String>>(mut self, reason: R) {
        if let Some(stream) = self.stream.as_mut() {
            stream.abort(reason);
        }
    }
}

impl Drop for SheetWriter {
    fn drop(&mut self) {
        let Some(stream) = self.stream.take() else {
            return;
        };
        let state = if let Some(reason) = stream.failure() {
            SheetState::Failed(reason.to_string())
        } else if let Some(reason) = stream.abort_reason() {
            SheetState::Aborted(reason.to_string())
        } else {
            log::debug!("sheet '{}' dropped before finish", stream.name());
            SheetState::Abandoned
        };
        self.sheets.set_state(self.index, state);
    }
}

/// Check a sheet name against the package format's rules
pub fn validate_sheet_name(name: &str) -> XlsxResult<()> {
    let invalid = |reason| XlsxError::InvalidSheetName {
        name: name.to_string(),
        reason,
    };

    if name.trim().is_empty() {
        return Err(invalid("name is empty"));
    }
    if name.chars().count() > MAX_SHEET_NAME_LEN {
        return Err(invalid("name is longer than 31 characters"));
    }
    if name.contains(FORBIDDEN_NAME_CHARS) {
        return Err(invalid("name contains one of [ ] : * ? / \\"));
    }
    if name.starts_with('\'') || name.ends_with('\'') {
        return Err(invalid("name starts or ends with an apostrophe"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sheet_name_rules() {
        assert!(validate_sheet_name("Data").is_ok());
        assert!(validate_sheet_name(&"x".repeat(31)).is_ok());
        assert!(validate_sheet_name("Q1 'draft'x").is_ok());

        for bad in ["", "   ", "a/b", "a[1]", "what?", "x:y", "a*", "back\\slash", "'quoted'"] {
            assert!(
                matches!(validate_sheet_name(bad), Err(XlsxError::InvalidSheetName { .. })),
                "{bad:?} should be rejected"
            );
        }
        assert!(validate_sheet_name(&"x".repeat(32)).is_err());
    }

    #[test]
    fn test_duplicate_names_are_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let workbook =
            StreamingWorkbook::create(dir.path().join("dup.xlsx"), WriterOptions::default())
                .unwrap();

        let _first = workbook.add_worksheet("Sales").unwrap();
        assert!(matches!(
            workbook.add_worksheet("SALES"),
            Err(XlsxError::DuplicateSheetName(_))
        ));
        assert_eq!(workbook.sheet_names(), vec!["Sales".to_string()]);
    }

    fn sheet_xml_names(path: &Path) -> Vec<String> {
        let archive = zip::ZipArchive::new(std::fs::File::open(path).unwrap()).unwrap();
        let mut names: Vec<String> = archive
            .file_names()
            .filter(|n| n.starts_with("xl/worksheets/"))
            .map(str::to_string)
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_close_waits_for_finish_in_progress() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("race.xlsx");
        let workbook = StreamingWorkbook::create(&path, WriterOptions::default()).unwrap();

        let mut first = workbook.add_worksheet("First").unwrap();
        first.write_row([CellValue::from(1)]).unwrap();
        first.finish().unwrap();

        let mut second = workbook.add_worksheet("Second").unwrap();
        second.write_row([CellValue::from(2)]).unwrap();
        second.begin_finish().unwrap();

        std::thread::scope(|scope| {
            let closer = scope.spawn(move || workbook.close());
            std::thread::sleep(std::time::Duration::from_millis(50));
            assert!(!closer.is_finished());

            second.complete_finish().unwrap();
            closer.join().unwrap().unwrap();
        });

        assert_eq!(
            sheet_xml_names(&path),
            vec!["xl/worksheets/sheet1.xml", "xl/worksheets/sheet2.xml"]
        );
    }

    #[test]
    fn test_finish_after_close_started_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let workbook =
            StreamingWorkbook::create(dir.path().join("late.xlsx"), WriterOptions::default())
                .unwrap();
        let mut done = workbook.add_worksheet("Done").unwrap();
        done.write_row([CellValue::from(1)]).unwrap();
        done.finish().unwrap();

        let late = workbook.add_worksheet("Late").unwrap();
        let sheets = Arc::clone(&workbook.sheets);
        workbook.close().unwrap();

        assert!(sheets.lock().closed);
        assert!(matches!(late.finish(), Err(XlsxError::Closed)));
    }

    #[test]
    fn test_sink_failure_fails_close() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("failed.xlsx");
        let workbook = StreamingWorkbook::create(&path, WriterOptions::default()).unwrap();

        let mut good = workbook.add_worksheet("Good").unwrap();
        good.write_row([CellValue::from("fine")]).unwrap();
        good.finish().unwrap();

        let body = dir.path().join("body.xml");
        std::fs::write(&body, b"").unwrap();
        let styles = Arc::clone(&workbook.styles);
        let mut broken = workbook
            .add_worksheet_with("Broken".to_string(), || {
                let read_only = std::fs::File::open(&body)?;
                Ok(XlsxSheetSink::from_file(styles, read_only))
            })
            .unwrap();
        broken.write_row([CellValue::from(1)]).unwrap();
        // The writer stays alive; the sink's failure alone blocks close
        assert!(broken.flush().is_ok());
        let err = broken.stream().unwrap().finish().unwrap_err();
        assert!(matches!(err, sheetstream_core::Error::Io(_)));

        assert!(matches!(
            workbook.add_worksheet("After"),
            Err(XlsxError::SheetFailed { ref sheet, .. }) if sheet == "Broken"
        ));
        let err = workbook.close().unwrap_err();
        assert!(matches!(err, XlsxError::SheetFailed { ref sheet, .. } if sheet == "Broken"));
        assert!(!err.is_sheet_local());
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
        drop(broken);
    }

    #[test]
    fn test_close_releases_string_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("closed.xlsx");
        let workbook = StreamingWorkbook::create(&path, WriterOptions::default()).unwrap();
        let sst = Arc::clone(workbook.shared_strings());

        let mut sheet = workbook.add_worksheet("Data").unwrap();
        sheet.write_row([CellValue::from("a")]).unwrap();
        sheet.finish().unwrap();
        workbook.close().unwrap();

        assert!(path.exists());
        assert!(matches!(sst.intern("b"), Err(sheetstream_core::Error::Closed)));
    }

    #[test]
    fn test_sink_creation_failure_fails_close() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nodir.xlsx");
        let options = WriterOptions::default().with_temp_dir(dir.path().join("missing"));
        let workbook = StreamingWorkbook::create(&path, options).unwrap();

        assert!(matches!(workbook.add_worksheet("Data"), Err(XlsxError::Io(_))));
        assert!(matches!(
            workbook.close(),
            Err(XlsxError::SheetFailed { ref sheet, .. }) if sheet == "Data"
        ));
        assert!(!path.exists());
    }
}

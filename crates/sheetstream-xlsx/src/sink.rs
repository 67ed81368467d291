//! Worksheet `<sheetData>` encoder

use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use sheetstream_core::{
    cell_reference, CellValue, PrimitiveIndexMap, RowBlock, RowBlockSink, StyleCode,
    StyleRegistry,
};

use crate::xml::{escape_text, needs_space_preserve};

/// First write failure seen by a sink, shared with the workbook
///
/// A sheet whose sink failed must keep the workbook from closing even while
/// its writer is still alive.
#[derive(Debug, Clone, Default)]
pub(crate) struct FailureSlot(Arc<Mutex<Option<String>>>);

impl FailureSlot {
    fn record(&self, err: &sheetstream_core::Error) {
        if err.is_write_failure() {
            self.0.lock().get_or_insert_with(|| err.to_string());
        }
    }

    pub(crate) fn get(&self) -> Option<String> {
        self.0.lock().clone()
    }
}

/// Encodes row blocks as `<row>`/`<c>` markup into a temporary file
///
/// The file holds only the body of `<sheetData>`; the worksheet part is
/// assembled around it when the package is written, once the sheet's
/// dimension is known.
#[derive(Debug)]
pub struct XlsxSheetSink {
    out: BufWriter<File>,
    styles: Arc<StyleRegistry>,
    /// Packed style code -> `xf` slot, to spare the shared registry lock
    slots: PrimitiveIndexMap<u32, u32>,
    scratch: String,
    failure: FailureSlot,
}

impl XlsxSheetSink {
    pub(crate) fn new(styles: Arc<StyleRegistry>, temp_dir: Option<&Path>) -> std::io::Result<Self> {
        let file = match temp_dir {
            Some(dir) => tempfile::tempfile_in(dir)?,
            None => tempfile::tempfile()?,
        };
        Ok(Self::from_file(styles, file))
    }

    /// Encode into an already open file
    pub(crate) fn from_file(styles: Arc<StyleRegistry>, file: File) -> Self {
        Self {
            out: BufWriter::with_capacity(64 * 1024, file),
            styles,
            slots: PrimitiveIndexMap::with_capacity(64),
            scratch: String::with_capacity(4096),
            failure: FailureSlot::default(),
        }
    }

    /// Report write failures to `slot`
    pub(crate) fn with_failure_slot(mut self, slot: FailureSlot) -> Self {
        self.failure = slot;
        self
    }

    /// Flush and rewind, handing back the encoded body
    pub(crate) fn into_body(self) -> std::io::Result<(File, u64)> {
        let mut file = self.out.into_inner().map_err(|e| e.into_error())?;
        let len = file.stream_position()?;
        file.seek(SeekFrom::Start(0))?;
        Ok((file, len))
    }

    fn slot(&mut self, code: StyleCode) -> sheetstream_core::Result<u32> {
        if let Some(slot) = self.slots.get(code.raw()) {
            return Ok(slot);
        }
        let slot = self.styles.slot_for(code)?;
        self.slots.insert(code.raw(), slot);
        Ok(slot)
    }

    fn encode_block(&mut self, block: &RowBlock) -> sheetstream_core::Result<()> {
        let mut xml = std::mem::take(&mut self.scratch);
        xml.clear();

        for row in block.rows() {
            if row.cells.is_empty() {
                continue;
            }
            xml.push_str(&format!("<row r=\"{}\">", u64::from(row.index) + 1));
            for cell in &row.cells {
                let slot = self.slot(cell.style)?;
                let reference = cell_reference(row.index, cell.col);
                encode_cell(&mut xml, &reference, slot, &cell.value, cell.sst_id);
            }
            xml.push_str("</row>");
        }

        let result = self.out.write_all(xml.as_bytes());
        self.scratch = xml;
        Ok(result?)
    }
}

impl RowBlockSink for XlsxSheetSink {
    fn write_block(&mut self, block: &RowBlock) -> sheetstream_core::Result<()> {
        let result = self.encode_block(block);
        if let Err(err) = &result {
            self.failure.record(err);
        }
        result
    }

    fn finish(&mut self) -> sheetstream_core::Result<()> {
        if let Err(err) = self.out.flush() {
            let err = sheetstream_core::Error::from(err);
            self.failure.record(&err);
            return Err(err);
        }
        Ok(())
    }
}

fn style_attr(slot: u32) -> String {
    if slot == 0 {
        String::new()
    } else {
        format!(" s=\"{}\"", slot)
    }
}

fn encode_cell(xml: &mut String, reference: &str, slot: u32, value: &CellValue, sst_id: Option<u32>) {
    let s = style_attr(slot);
    match value {
        CellValue::Empty => {
            xml.push_str(&format!("<c r=\"{}\"{}/>", reference, s));
        }
        CellValue::Boolean(b) => {
            xml.push_str(&format!(
                "<c r=\"{}\"{} t=\"b\"><v>{}</v></c>",
                reference,
                s,
                u8::from(*b)
            ));
        }
        CellValue::Number(n) if n.is_finite() => {
            xml.push_str(&format!("<c r=\"{}\"{}><v>{}</v></c>", reference, s, n));
        }
        CellValue::Number(_) => {
            xml.push_str(&format!("<c r=\"{}\"{} t=\"e\"><v>#NUM!</v></c>", reference, s));
        }
        CellValue::String(text) => match sst_id {
            Some(id) => {
                xml.push_str(&format!("<c r=\"{}\"{} t=\"s\"><v>{}</v></c>", reference, s, id));
            }
            None => {
                xml.push_str(&format!(
                    "<c r=\"{}\"{} t=\"inlineStr\"><is>{}</is></c>",
                    reference,
                    s,
                    text_element(text)
                ));
            }
        },
        CellValue::Error(e) => {
            xml.push_str(&format!(
                "<c r=\"{}\"{} t=\"e\"><v>{}</v></c>",
                reference,
                s,
                escape_text(e.as_str())
            ));
        }
        CellValue::Formula { text, cached_value } => {
            let f = escape_text(text);
            match cached_value.as_deref() {
                Some(CellValue::Number(n)) if n.is_finite() => xml.push_str(&format!(
                    "<c r=\"{}\"{}><f>{}</f><v>{}</v></c>",
                    reference, s, f, n
                )),
                Some(CellValue::Boolean(b)) => xml.push_str(&format!(
                    "<c r=\"{}\"{} t=\"b\"><f>{}</f><v>{}</v></c>",
                    reference,
                    s,
                    f,
                    u8::from(*b)
                )),
                Some(CellValue::String(v)) => xml.push_str(&format!(
                    "<c r=\"{}\"{} t=\"str\"><f>{}</f><v>{}</v></c>",
                    reference,
                    s,
                    f,
                    escape_text(v)
                )),
                Some(CellValue::Error(e)) => xml.push_str(&format!(
                    "<c r=\"{}\"{} t=\"e\"><f>{}</f><v>{}</v></c>",
                    reference,
                    s,
                    f,
                    escape_text(e.as_str())
                )),
                _ => xml.push_str(&format!("<c r=\"{}\"{}><f>{}</f></c>", reference, s, f)),
            }
        }
    }
}

/// `<t>` element for a shared or inline string
pub(crate) fn text_element(text: &str) -> String {
    if needs_space_preserve(text) {
        format!("<t xml:space=\"preserve\">{}</t>", escape_text(text))
    } else {
        format!("<t>{}</t>", escape_text(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetstream_core::{CellError, Style};

    fn encode(value: CellValue, slot: u32, sst_id: Option<u32>) -> String {
        let mut xml = String::new();
        encode_cell(&mut xml, "B3", slot, &value, sst_id);
        xml
    }

    #[test]
    fn test_cell_markup() {
        assert_eq!(encode(CellValue::Number(1.5), 0, None), "<c r=\"B3\"><v>1.5</v></c>");
        assert_eq!(
            encode(CellValue::Boolean(true), 2, None),
            "<c r=\"B3\" s=\"2\" t=\"b\"><v>1</v></c>"
        );
        assert_eq!(
            encode(CellValue::string("x"), 0, Some(7)),
            "<c r=\"B3\" t=\"s\"><v>7</v></c>"
        );
        assert_eq!(
            encode(CellValue::string(" a<b"), 0, None),
            "<c r=\"B3\" t=\"inlineStr\"><is><t xml:space=\"preserve\"> a&lt;b</t></is></c>"
        );
        assert_eq!(
            encode(CellValue::Error(CellError::Na), 0, None),
            "<c r=\"B3\" t=\"e\"><v>#N/A</v></c>"
        );
        assert_eq!(
            encode(CellValue::Number(f64::NAN), 0, None),
            "<c r=\"B3\" t=\"e\"><v>#NUM!</v></c>"
        );
        assert_eq!(encode(CellValue::Empty, 1, None), "<c r=\"B3\" s=\"1\"/>");
    }

    #[test]
    fn test_formula_markup() {
        assert_eq!(
            encode(CellValue::formula("=A1>0"), 0, None),
            "<c r=\"B3\"><f>A1&gt;0</f></c>"
        );
        assert_eq!(
            encode(
                CellValue::formula_with_value("SUM(A1:A2)", CellValue::Number(3.0)),
                0,
                None
            ),
            "<c r=\"B3\"><f>SUM(A1:A2)</f><v>3</v></c>"
        );
        assert_eq!(
            encode(
                CellValue::formula_with_value("A1&\"!\"", CellValue::string("hi!")),
                0,
                None
            ),
            "<c r=\"B3\" t=\"str\"><f>A1&amp;&quot;!&quot;</f><v>hi!</v></c>"
        );
    }

    #[test]
    fn test_block_encoding_uses_registry_slots() {
        use sheetstream_core::{SharedStringTable, SheetLimits, SheetStream, SstOptions};
        use std::io::Read;

        let styles = Arc::new(StyleRegistry::new());
        let bold = styles.register_style(&Style::new().bold(true)).unwrap();
        let sst = Arc::new(SharedStringTable::new(SstOptions::default()).unwrap());
        let sink = XlsxSheetSink::new(Arc::clone(&styles), None).unwrap();

        let mut stream = SheetStream::new("S", sink, sst, SheetLimits::default(), 2);
        for i in 0..3u32 {
            let mut row = stream.begin_row().unwrap();
            row.append_cell("name", bold).unwrap();
            row.append_cell(i, StyleCode::DEFAULT).unwrap();
            row.end_row().unwrap();
        }
        stream.finish().unwrap();

        let (mut file, len) = stream.into_sink().into_body().unwrap();
        let mut body = String::new();
        file.read_to_string(&mut body).unwrap();

        assert_eq!(body.len() as u64, len);
        assert_eq!(
            body,
            "<row r=\"1\"><c r=\"A1\" s=\"1\" t=\"s\"><v>0</v></c><c r=\"B1\"><v>0</v></c></row>\
             <row r=\"2\"><c r=\"A2\" s=\"1\" t=\"s\"><v>0</v></c><c r=\"B2\"><v>1</v></c></row>\
             <row r=\"3\"><c r=\"A3\" s=\"1\" t=\"s\"><v>0</v></c><c r=\"B3\"><v>2</v></c></row>"
        );
    }

    #[test]
    fn test_write_failure_is_recorded() {
        use sheetstream_core::{Error, SharedStringTable, SheetLimits, SheetStream, SstOptions};

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("body.xml");
        std::fs::write(&path, b"").unwrap();
        let read_only = File::open(&path).unwrap();

        let slot = FailureSlot::default();
        let sink = XlsxSheetSink::from_file(Arc::new(StyleRegistry::new()), read_only)
            .with_failure_slot(slot.clone());
        let sst = Arc::new(SharedStringTable::new(SstOptions::default()).unwrap());
        let mut stream = SheetStream::new("S", sink, sst, SheetLimits::default(), 2);
        for i in 0..3u32 {
            let mut row = stream.begin_row().unwrap();
            row.append_cell(i, StyleCode::DEFAULT).unwrap();
            row.end_row().unwrap();
        }
        assert_eq!(slot.get(), None);

        let err = stream.finish().unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert!(stream.is_failed());
        assert!(slot.get().is_some());
    }
}

//! OPC package parts
//!
//! Everything except the worksheet bodies is small and rendered in memory.
//! Worksheet bodies and the shared strings are streamed into the archive.

use std::fs::File;
use std::io::{self, Seek, Write};

use sheetstream_core::{Dimension, SharedStringTable, StyleSheet};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::XlsxResult;
use crate::sink::text_element;
use crate::styles::render_styles_xml;
use crate::xml::escape_text;

/// Strings fetched from the shared string table per batch
const SST_BATCH: usize = 1024;

/// A finished worksheet ready to be packaged
#[derive(Debug)]
pub(crate) struct SheetPart {
    pub name: String,
    pub body: File,
    pub body_len: u64,
    pub dimension: Dimension,
}

pub(crate) struct PackageWriter<W: Write + Seek> {
    zip: ZipWriter<W>,
    compression_level: Option<i64>,
}

impl<W: Write + Seek> PackageWriter<W> {
    pub(crate) fn new(writer: W, compression_level: Option<i64>) -> Self {
        Self {
            zip: ZipWriter::new(writer),
            compression_level,
        }
    }

    fn options(&self, large: bool) -> SimpleFileOptions {
        SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(self.compression_level)
            .large_file(large)
    }

    fn start(&mut self, name: &str, large: bool) -> XlsxResult<()> {
        let options = self.options(large);
        self.zip.start_file(name.to_string(), options)?;
        Ok(())
    }

    /// Write every part and finish the archive
    pub(crate) fn write_package(
        mut self,
        sheets: &mut [SheetPart],
        styles: &StyleSheet,
        sst: &SharedStringTable,
    ) -> XlsxResult<W> {
        self.write_content_types(sheets.len())?;
        self.write_root_rels()?;
        self.write_workbook_xml(sheets)?;
        self.write_workbook_rels(sheets.len())?;

        self.start("xl/styles.xml", false)?;
        self.zip.write_all(render_styles_xml(styles).as_bytes())?;

        self.write_shared_strings(sst)?;

        for (i, sheet) in sheets.iter_mut().enumerate() {
            self.write_worksheet(i, sheet)?;
        }

        Ok(self.zip.finish()?)
    }

    fn write_content_types(&mut self, sheet_count: usize) -> XlsxResult<()> {
        self.start("[Content_Types].xml", false)?;

        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
    <Default Extension="xml" ContentType="application/xml"/>
    <Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
    <Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>
    <Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>"#,
        );

        for i in 0..sheet_count {
            content.push_str(&format!(
                r#"
    <Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
                i + 1
            ));
        }

        content.push_str("\n</Types>");
        self.zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_root_rels(&mut self) -> XlsxResult<()> {
        self.start("_rels/.rels", false)?;

        let content = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#;

        self.zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_workbook_xml(&mut self, sheets: &[SheetPart]) -> XlsxResult<()> {
        self.start("xl/workbook.xml", false)?;

        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
    <sheets>"#,
        );

        for (i, sheet) in sheets.iter().enumerate() {
            content.push_str(&format!(
                r#"
        <sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
                escape_text(&sheet.name),
                i + 1,
                i + 1
            ));
        }

        content.push_str(
            r#"
    </sheets>
</workbook>"#,
        );

        self.zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_workbook_rels(&mut self, sheet_count: usize) -> XlsxResult<()> {
        self.start("xl/_rels/workbook.xml.rels", false)?;

        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );

        for i in 0..sheet_count {
            content.push_str(&format!(
                r#"
    <Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{}.xml"/>"#,
                i + 1,
                i + 1
            ));
        }

        content.push_str(&format!(
            r#"
    <Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
    <Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>
</Relationships>"#,
            sheet_count + 1,
            sheet_count + 2
        ));

        self.zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_shared_strings(&mut self, sst: &SharedStringTable) -> XlsxResult<()> {
        self.start("xl/sharedStrings.xml", false)?;

        let unique = sst.len();
        self.zip.write_all(
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" uniqueCount="{}">"#,
                unique
            )
            .as_bytes(),
        )?;

        let mut batch = Vec::with_capacity(SST_BATCH);
        let mut chunk = String::new();
        let mut next = 0u32;
        while next < unique {
            let n = sst.batch(next, &mut batch)?;
            if n == 0 {
                break;
            }
            chunk.clear();
            for s in &batch {
                chunk.push_str("<si>");
                chunk.push_str(&text_element(s));
                chunk.push_str("</si>");
            }
            self.zip.write_all(chunk.as_bytes())?;
            next += n as u32;
        }

        self.zip.write_all(b"</sst>")?;
        Ok(())
    }

    fn write_worksheet(&mut self, index: usize, sheet: &mut SheetPart) -> XlsxResult<()> {
        let large = sheet.body_len > u64::from(u32::MAX) / 2;
        self.start(&format!("xl/worksheets/sheet{}.xml", index + 1), large)?;

        let header = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><dimension ref="{}"/><sheetData>"#,
            sheet.dimension
        );
        self.zip.write_all(header.as_bytes())?;
        io::copy(&mut sheet.body, &mut self.zip)?;
        self.zip.write_all(b"</sheetData></worksheet>")?;

        log::trace!(
            "packaged sheet '{}' ({} bytes of cell data)",
            sheet.name,
            sheet.body_len
        );
        Ok(())
    }
}

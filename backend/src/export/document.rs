//! Minimal document model with Markdown and `.docx` renderers.
//!
//! Only the three primitives the dictionary needs exist: headings, tables
//! with a header row, and paragraph breaks.

use std::io::{Seek, Write};

use quick_xml::escape::escape;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::error::ExportResult;

/// One block of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: u8, text: String },
    Table { header: Vec<String>, rows: Vec<Vec<String>> },
    ParagraphBreak,
}

/// An ordered list of blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    blocks: Vec<Block>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn heading(&mut self, text: impl Into<String>, level: u8) -> &mut Self {
        self.blocks.push(Block::Heading { level: level.clamp(1, 6), text: text.into() });
        self
    }

    pub fn table(&mut self, header: Vec<String>, rows: Vec<Vec<String>>) -> &mut Self {
        self.blocks.push(Block::Table { header, rows });
        self
    }

    pub fn paragraph_break(&mut self) -> &mut Self {
        self.blocks.push(Block::ParagraphBreak);
        self
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Headings of the given level, in order.
    pub fn headings(&self, level: u8) -> Vec<&str> {
        self.blocks
            .iter()
            .filter_map(|b| match b {
                Block::Heading { level: l, text } if *l == level => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        for block in &self.blocks {
            match block {
                Block::Heading { level, text } => {
                    out.push_str(&"#".repeat(*level as usize));
                    out.push(' ');
                    out.push_str(text);
                    out.push_str("\n\n");
                }
                Block::Table { header, rows } => {
                    out.push_str(&markdown_row(header));
                    out.push_str(&markdown_row(&vec!["---".to_string(); header.len()]));
                    for row in rows {
                        out.push_str(&markdown_row(row));
                    }
                    out.push('\n');
                }
                Block::ParagraphBreak => out.push('\n'),
            }
        }
        out
    }

    /// Write a WordprocessingML package (`.docx`).
    pub fn write_docx<W: Write + Seek>(&self, writer: W) -> ExportResult<()> {
        let mut zip = ZipWriter::new(writer);
        let options = SimpleFileOptions::default();

        zip.start_file("[Content_Types].xml", options)?;
        zip.write_all(CONTENT_TYPES.as_bytes())?;
        zip.start_file("_rels/.rels", options)?;
        zip.write_all(PACKAGE_RELS.as_bytes())?;
        zip.start_file("word/document.xml", options)?;
        zip.write_all(self.document_xml().as_bytes())?;

        let mut writer = zip.finish()?;
        writer.flush()?;
        Ok(())
    }

    pub fn to_docx_bytes(&self) -> ExportResult<Vec<u8>> {
        let mut cursor = std::io::Cursor::new(Vec::new());
        self.write_docx(&mut cursor)?;
        Ok(cursor.into_inner())
    }

    fn document_xml(&self) -> String {
        let mut body = String::new();
        for block in &self.blocks {
            match block {
                Block::Heading { level, text } => {
                    let size = match level {
                        1 => 36,
                        2 => 28,
                        _ => 24,
                    };
                    body.push_str(&format!(
                        "<w:p><w:pPr><w:pStyle w:val=\"Heading{}\"/></w:pPr><w:r><w:rPr><w:b/><w:sz w:val=\"{}\"/></w:rPr>{}</w:r></w:p>",
                        level,
                        size,
                        text_run(text)
                    ));
                }
                Block::Table { header, rows } => {
                    body.push_str("<w:tbl><w:tblPr><w:tblStyle w:val=\"TableGrid\"/><w:tblW w:w=\"0\" w:type=\"auto\"/><w:tblBorders>");
                    for side in ["top", "left", "bottom", "right", "insideH", "insideV"] {
                        body.push_str(&format!("<w:{} w:val=\"single\" w:sz=\"4\" w:space=\"0\" w:color=\"auto\"/>", side));
                    }
                    body.push_str("</w:tblBorders></w:tblPr>");
                    body.push_str(&table_row(header, true));
                    for row in rows {
                        body.push_str(&table_row(row, false));
                    }
                    body.push_str("</w:tbl>");
                }
                Block::ParagraphBreak => body.push_str("<w:p/>"),
            }
        }
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
             <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
             <w:body>{}<w:sectPr/></w:body></w:document>",
            body
        )
    }
}

fn markdown_row(cells: &[String]) -> String {
    let escaped: Vec<String> = cells.iter().map(|c| c.replace('|', "\\|")).collect();
    format!("| {} |\n", escaped.join(" | "))
}

fn text_run(text: &str) -> String {
    format!("<w:t xml:space=\"preserve\">{}</w:t>", escape(text))
}

fn table_row(cells: &[String], bold: bool) -> String {
    let run_props = if bold { "<w:rPr><w:b/></w:rPr>" } else { "" };
    let cells: String = cells
        .iter()
        .map(|c| format!("<w:tc><w:p><w:r>{}{}</w:r></w:p></w:tc>", run_props, text_run(c)))
        .collect();
    format!("<w:tr>{}</w:tr>", cells)
}

const CONTENT_TYPES: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
<Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
<Default Extension=\"xml\" ContentType=\"application/xml\"/>\
<Override PartName=\"/word/document.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml\"/>\
</Types>";

const PACKAGE_RELS: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
<Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument\" Target=\"word/document.xml\"/>\
</Relationships>";

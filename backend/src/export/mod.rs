//! Output artifacts: spreadsheet workbook, SPSS CSV and dictionary documents.

pub mod document;
pub mod spss_csv;
pub mod xlsx;

use std::path::Path;

use crate::error::ExportResult;
pub use document::{Block, Document};

/// Save a document, choosing `.docx` or Markdown from the file extension.
pub fn save_document(doc: &Document, path: &Path) -> ExportResult<()> {
    let is_docx = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("docx"));

    if is_docx {
        let file = std::fs::File::create(path)?;
        doc.write_docx(std::io::BufWriter::new(file))
    } else {
        std::fs::write(path, doc.to_markdown())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_document_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = Document::new();
        doc.heading("Pre-Survey", 1);

        let md = dir.path().join("dict.md");
        save_document(&doc, &md).unwrap();
        assert_eq!(std::fs::read_to_string(&md).unwrap(), "# Pre-Survey\n\n");

        let docx = dir.path().join("dict.DOCX");
        save_document(&doc, &docx).unwrap();
        let bytes = std::fs::read(&docx).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }
}

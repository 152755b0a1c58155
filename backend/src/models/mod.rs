//! Domain models for the survey merge pipeline.
//!
//! - [`RawTable`] - Untyped grid read from a Qualtrics CSV export
//! - [`MergedTable`] - Paired Value/Label columns per question
//! - [`SpssTable`] - Flattened numeric table for statistical-package import
//! - [`Column`] / [`ColumnData`] / [`CellValue`] - Typed column storage

use serde::Serialize;

// =============================================================================
// Qualtrics Layout Constants
// =============================================================================

/// Number of leading survey-platform metadata columns (A..Q).
pub const METADATA_COLUMNS: usize = 17;

/// Absolute index of the first question column (column R).
pub const FIRST_QUESTION_COLUMN: usize = METADATA_COLUMNS;

/// Minimum width of a usable export: metadata plus one question.
pub const MIN_COLUMNS: usize = METADATA_COLUMNS + 1;

/// Rows 0..3 are question id, question text and an unused import-id row.
pub const HEADER_ROWS: usize = 3;

/// Row holding the question identifiers.
pub const QUESTION_ID_ROW: usize = 0;

/// Row holding the question text.
pub const QUESTION_TEXT_ROW: usize = 1;

/// Header forced onto the first question column.
pub const RECORD_ID: &str = "RecordID";

/// Suffix of coded-response columns.
pub const VALUE_SUFFIX: &str = " (Value)";

/// Suffix of human-readable response columns.
pub const LABEL_SUFFIX: &str = " (Label)";

/// Column name of a question's Value half.
pub fn value_column_name(header: &str) -> String {
    format!("{}{}", header, VALUE_SUFFIX)
}

/// Column name of a question's Label half.
pub fn label_column_name(header: &str) -> String {
    format!("{}{}", header, LABEL_SUFFIX)
}

// =============================================================================
// Raw Export Table
// =============================================================================

/// Untyped grid of text cells exactly as read from the CSV, metadata rows included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// Number of rows, metadata rows included.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Width of the widest row.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Cell text, or `""` for positions past the end of a ragged row.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }
}

impl From<Vec<Vec<&str>>> for RawTable {
    fn from(rows: Vec<Vec<&str>>) -> Self {
        Self::new(
            rows.into_iter()
                .map(|r| r.into_iter().map(String::from).collect())
                .collect(),
        )
    }
}

// =============================================================================
// Typed Columns
// =============================================================================

/// Storage of one output column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "cells", rename_all = "lowercase")]
pub enum ColumnData {
    /// Trimmed text (labels and the RecordID value).
    Text(Vec<String>),
    /// Nullable integers (coded responses).
    Integer(Vec<Option<i64>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Text(cells) => cells.len(),
            ColumnData::Integer(cells) => cells.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cell at `row`; out-of-range rows read as null.
    pub fn get(&self, row: usize) -> CellValue<'_> {
        match self {
            ColumnData::Text(cells) => cells
                .get(row)
                .map(|s| CellValue::Text(s))
                .unwrap_or(CellValue::Null),
            ColumnData::Integer(cells) => match cells.get(row) {
                Some(Some(n)) => CellValue::Integer(*n),
                _ => CellValue::Null,
            },
        }
    }
}

/// Borrowed view of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellValue<'a> {
    Text(&'a str),
    Integer(i64),
    Null,
}

impl CellValue<'_> {
    /// Null cells and empty text are both "missing".
    pub fn is_missing(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Text(s) => s.is_empty(),
            CellValue::Integer(_) => false,
        }
    }

    /// Text rendering used by CSV output, previews and dictionaries.
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Text(s) => (*s).to_string(),
            CellValue::Integer(n) => n.to_string(),
            CellValue::Null => String::new(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            CellValue::Text(s) => serde_json::Value::String((*s).to_string()),
            CellValue::Integer(n) => serde_json::Value::from(*n),
            CellValue::Null => serde_json::Value::Null,
        }
    }
}

/// A named output column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn text(name: impl Into<String>, cells: Vec<String>) -> Self {
        Self { name: name.into(), data: ColumnData::Text(cells) }
    }

    pub fn integer(name: impl Into<String>, cells: Vec<Option<i64>>) -> Self {
        Self { name: name.into(), data: ColumnData::Integer(cells) }
    }

    pub fn is_value(&self) -> bool {
        self.name.ends_with(VALUE_SUFFIX)
    }

    pub fn is_label(&self) -> bool {
        self.name.ends_with(LABEL_SUFFIX)
    }
}

// =============================================================================
// Merged Table
// =============================================================================

/// Output of the merge: adjacent `(Value)`/`(Label)` column pairs, RecordID first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergedTable {
    columns: Vec<Column>,
}

impl MergedTable {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Row count of the longest column.
    pub fn row_count(&self) -> usize {
        self.columns.iter().map(|c| c.data.len()).max().unwrap_or(0)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Row-major view, one `Vec<CellValue>` per respondent.
    pub fn rows(&self) -> impl Iterator<Item = Vec<CellValue<'_>>> + '_ {
        (0..self.row_count()).map(move |row| self.columns.iter().map(|c| c.data.get(row)).collect())
    }
}

// =============================================================================
// SPSS Table
// =============================================================================

/// Flattened table for SPSS import: `RecordID` plus one numeric column per question.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SpssTable {
    columns: Vec<Column>,
}

impl SpssTable {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn row_count(&self) -> usize {
        self.columns.iter().map(|c| c.data.len()).max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_table_ragged_rows() {
        let raw = RawTable::from(vec![vec!["a", "b", "c"], vec!["d"]]);
        assert_eq!(raw.width(), 3);
        assert_eq!(raw.row_count(), 2);
        assert_eq!(raw.cell(1, 0), "d");
        assert_eq!(raw.cell(1, 2), "");
        assert_eq!(raw.cell(5, 0), "");
    }

    #[test]
    fn test_column_data_access() {
        let col = Column::integer("Q1. Age (Value)", vec![Some(3), None]);
        assert!(col.is_value());
        assert!(!col.is_label());
        assert_eq!(col.data.get(0), CellValue::Integer(3));
        assert_eq!(col.data.get(1), CellValue::Null);
        assert_eq!(col.data.get(9), CellValue::Null);
    }

    #[test]
    fn test_merged_table_rows() {
        let table = MergedTable::new(vec![
            Column::text("RecordID (Value)", vec!["0042".into(), "7".into()]),
            Column::text("RecordID (Label)", vec!["0042".into(), "7".into()]),
        ]);
        let rows: Vec<_> = table.rows().collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0], CellValue::Text("0042"));
        assert_eq!(rows[1][1].to_text(), "7");
    }

    #[test]
    fn test_cell_missing() {
        assert!(CellValue::Null.is_missing());
        assert!(CellValue::Text("").is_missing());
        assert!(!CellValue::Integer(0).is_missing());
        assert_eq!(CellValue::Integer(5).to_json(), serde_json::json!(5));
    }
}

//! Value/label merge of a Qualtrics export pair.
//!
//! # Layout
//!
//! ```text
//!          col 0..17 (metadata)   col 17 (RecordID)   col 18..
//! row 0    StartDate ...          Q22                 Q1, Q2 ...     question id
//! row 1    Start Date ...         Record ID           How old ...    question text
//! row 2    {"ImportId": ...}                                         unused
//! row 3..  respondent data
//! ```
//!
//! Headers come from the labels file. The first question column is always
//! renamed `RecordID` and kept as text; every other Value column becomes a
//! nullable integer.

use serde::Serialize;

use crate::error::FormatError;
use crate::models::{
    label_column_name, value_column_name, Column, MergedTable, RawTable, FIRST_QUESTION_COLUMN,
    HEADER_ROWS, MIN_COLUMNS, QUESTION_ID_ROW, QUESTION_TEXT_ROW, RECORD_ID,
};

/// Label columns sampled by the misupload heuristic.
const MISUPLOAD_SAMPLE_COLUMNS: usize = 5;

/// Share of numeric-looking labels that triggers the misupload warning.
const MISUPLOAD_NUMERIC_SHARE: f64 = 0.8;

/// Maximum number of offending cells quoted in a coercion warning.
const COERCION_SAMPLE_SIZE: usize = 3;

/// Non-fatal findings of a merge.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MergeWarning {
    /// Cells of a Value column that did not parse as numbers and became null.
    #[serde(rename_all = "camelCase")]
    Coercion {
        column: String,
        count: usize,
        sample: Vec<String>,
    },
    /// A Label column that is mostly numbers: the labels file may be a values export.
    #[serde(rename_all = "camelCase")]
    LikelyMisupload { column: String, numeric_share: f64 },
}

impl std::fmt::Display for MergeWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MergeWarning::Coercion { column, count, sample } => write!(
                f,
                "{} non-numeric cell(s) in '{}' left empty (e.g. {})",
                count,
                column,
                sample.iter().map(|s| format!("'{}'", s)).collect::<Vec<_>>().join(", ")
            ),
            MergeWarning::LikelyMisupload { column, numeric_share } => write!(
                f,
                "'{}' is {:.0}% numeric; the labels file may actually be a values export",
                column,
                numeric_share * 100.0
            ),
        }
    }
}

/// Merged table plus the warnings raised while building it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeOutcome {
    pub table: MergedTable,
    pub warnings: Vec<MergeWarning>,
}

/// Merge a values export and a labels export into paired Value/Label columns.
///
/// `id_hint` names the dataset in diagnostics; it has no effect on the output.
///
/// # Errors
/// [`FormatError`] if either grid is narrower than [`MIN_COLUMNS`].
pub fn merge(
    values: &RawTable,
    labels: &RawTable,
    id_hint: Option<&str>,
) -> Result<MergeOutcome, FormatError> {
    check_width(values, "values")?;
    check_width(labels, "labels")?;

    let headers = question_headers(labels);
    let row_count = values.row_count().saturating_sub(HEADER_ROWS);

    let mut columns = Vec::with_capacity(headers.len() * 2);
    let mut warnings = Vec::new();

    for (i, header) in headers.iter().enumerate() {
        let col = FIRST_QUESTION_COLUMN + i;
        let raw_values = data_column(values, col, row_count);
        let raw_labels = data_column(labels, col, row_count);

        let value_name = value_column_name(header);
        if header == RECORD_ID {
            columns.push(Column::text(value_name, raw_values));
        } else {
            let (coerced, rejected) = coerce_integers(&raw_values);
            if !rejected.is_empty() {
                warnings.push(MergeWarning::Coercion {
                    column: value_name.clone(),
                    count: rejected.len(),
                    sample: rejected.into_iter().take(COERCION_SAMPLE_SIZE).collect(),
                });
            }
            columns.push(Column::integer(value_name, coerced));
        }
        columns.push(Column::text(label_column_name(header), raw_labels));
    }

    let table = MergedTable::new(columns);
    warnings.extend(detect_misupload(&table));

    if let Some(name) = id_hint {
        for warning in &warnings {
            crate::api::logs::log_dataset_warning(name, warning.to_string());
        }
    }

    Ok(MergeOutcome { table, warnings })
}

fn check_width(table: &RawTable, side: &'static str) -> Result<(), FormatError> {
    let found = table.width();
    if found < MIN_COLUMNS {
        return Err(FormatError { table: side, found });
    }
    Ok(())
}

/// One `"{id}. {text}"` header per question column, the first forced to `RecordID`.
pub fn question_headers(labels: &RawTable) -> Vec<String> {
    (FIRST_QUESTION_COLUMN..labels.width())
        .enumerate()
        .map(|(i, col)| {
            if i == 0 {
                return RECORD_ID.to_string();
            }
            let id = labels.cell(QUESTION_ID_ROW, col).trim();
            let text = labels.cell(QUESTION_TEXT_ROW, col).trim();
            format!("{}. {}", id, text).trim().to_string()
        })
        .collect()
}

/// Cells of one column below the header rows, trimmed, `"nan"` blanked.
fn data_column(table: &RawTable, col: usize, row_count: usize) -> Vec<String> {
    (0..row_count)
        .map(|r| clean_cell(table.cell(HEADER_ROWS + r, col)))
        .collect()
}

fn clean_cell(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == "nan" {
        String::new()
    } else {
        trimmed.to_string()
    }
}

/// Parse a cleaned cell as an integer code.
///
/// Accepts anything that reads as a finite integral number ("3", "3.0", "1e2").
pub fn parse_integer(cell: &str) -> Option<i64> {
    let n: f64 = cell.parse().ok()?;
    if n.is_finite() && n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Some(n as i64)
    } else {
        None
    }
}

fn looks_numeric(cell: &str) -> bool {
    cell.parse::<f64>().is_ok_and(|n| n.is_finite())
}

/// Coerce cells to nullable integers, returning the non-empty cells that failed.
fn coerce_integers(cells: &[String]) -> (Vec<Option<i64>>, Vec<String>) {
    let mut rejected = Vec::new();
    let coerced = cells
        .iter()
        .map(|cell| {
            if cell.is_empty() {
                return None;
            }
            let parsed = parse_integer(cell);
            if parsed.is_none() {
                rejected.push(cell.clone());
            }
            parsed
        })
        .collect();
    (coerced, rejected)
}

/// Flag question Label columns (among the first few) whose entries are mostly numbers.
///
/// The RecordID pair is skipped: its label holds identifiers, not choice text.
fn detect_misupload(table: &MergedTable) -> Vec<MergeWarning> {
    let record_label = label_column_name(RECORD_ID);
    table
        .columns()
        .iter()
        .filter(|c| c.is_label() && c.name != record_label)
        .take(MISUPLOAD_SAMPLE_COLUMNS)
        .filter_map(|column| {
            let cells: Vec<String> = (0..column.data.len())
                .map(|r| column.data.get(r).to_text())
                .filter(|s| !s.is_empty())
                .collect();
            if cells.is_empty() {
                return None;
            }
            let numeric = cells.iter().filter(|s| looks_numeric(s)).count();
            let share = numeric as f64 / cells.len() as f64;
            (share >= MISUPLOAD_NUMERIC_SHARE).then(|| MergeWarning::LikelyMisupload {
                column: column.name.clone(),
                numeric_share: share,
            })
        })
        .collect()
}

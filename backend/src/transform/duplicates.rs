//! Duplicate respondent detection and summary counts.
//!
//! Re-scans the `RecordID (Value)` column of a merged table. Comparison is
//! on the trimmed text, so `"0042"` and `"42"` are different respondents.

use serde::Serialize;
use std::collections::HashMap;

use crate::models::{value_column_name, MergedTable, RECORD_ID};

/// One identifier shared by several respondent rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateId {
    pub value: String,
    /// 0-based data rows (row 0 = first respondent)
    pub rows: Vec<usize>,
}

/// Human-readable counts reported after each merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeSummary {
    pub dataset: String,
    pub rows: usize,
    pub columns: usize,
    /// Value/Label pairs other than RecordID
    pub questions: usize,
    /// Rows whose RecordID appears more than once
    pub duplicate_rows: usize,
    pub duplicate_ids: Vec<DuplicateId>,
}

impl MergeSummary {
    pub fn from_table(dataset: impl Into<String>, table: &MergedTable) -> Self {
        let duplicate_ids = duplicate_record_ids(table);
        let pairs = table.column_count() / 2;
        let has_record_id = table.column(&value_column_name(RECORD_ID)).is_some();
        Self {
            dataset: dataset.into(),
            rows: table.row_count(),
            columns: table.column_count(),
            questions: if has_record_id { pairs.saturating_sub(1) } else { pairs },
            duplicate_rows: duplicate_ids.iter().map(|d| d.rows.len()).sum(),
            duplicate_ids,
        }
    }
}

/// Identifiers that occur on more than one row, in order of first appearance.
///
/// Empty identifiers are ignored. Returns nothing when the table has no
/// `RecordID (Value)` column.
pub fn duplicate_record_ids(table: &MergedTable) -> Vec<DuplicateId> {
    let Some(column) = table.column(&value_column_name(RECORD_ID)) else {
        return Vec::new();
    };

    let mut order: Vec<String> = Vec::new();
    let mut rows_by_id: HashMap<String, Vec<usize>> = HashMap::new();

    for row in 0..column.data.len() {
        let id = column.data.get(row).to_text().trim().to_string();
        if id.is_empty() {
            continue;
        }
        let rows = rows_by_id.entry(id.clone()).or_insert_with(|| {
            order.push(id);
            Vec::new()
        });
        rows.push(row);
    }

    order
        .into_iter()
        .filter_map(|value| {
            let rows = rows_by_id.remove(&value)?;
            (rows.len() > 1).then_some(DuplicateId { value, rows })
        })
        .collect()
}

/// Number of rows that share their RecordID with another row.
pub fn duplicate_count(table: &MergedTable) -> usize {
    duplicate_record_ids(table).iter().map(|d| d.rows.len()).sum()
}

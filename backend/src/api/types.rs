//! REST API types for the merge endpoints.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::transform::duplicates::DuplicateId;
use crate::transform::merge::MergeWarning;
use crate::transform::pipeline::{DatasetResult, SurveyResult};

/// Rows included in each dataset preview.
pub const PREVIEW_ROWS: usize = 5;

/// Response sent after both survey waves were merged.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeResponse {
    /// Unique job identifier
    pub job_id: String,

    /// Status: "ready" or "warning"
    pub status: String,

    pub datasets: Vec<DatasetReport>,
}

/// Summary counts and preview of one merged dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetReport {
    pub name: String,
    pub row_count: usize,
    pub column_count: usize,
    pub question_count: usize,
    pub duplicate_count: usize,
    pub duplicates: Vec<DuplicateReport>,
    pub warnings: Vec<String>,
    pub columns: Vec<String>,
    /// First rows, one JSON array per row
    pub preview: Vec<Vec<Value>>,
}

/// A RecordID present on several rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateReport {
    pub record_id: String,
    pub rows: Vec<usize>,
}

impl From<&DuplicateId> for DuplicateReport {
    fn from(d: &DuplicateId) -> Self {
        Self { record_id: d.value.clone(), rows: d.rows.clone() }
    }
}

impl From<&DatasetResult> for DatasetReport {
    fn from(result: &DatasetResult) -> Self {
        let table = result.table();
        DatasetReport {
            name: result.name.clone(),
            row_count: result.summary.rows,
            column_count: result.summary.columns,
            question_count: result.summary.questions,
            duplicate_count: result.summary.duplicate_rows,
            duplicates: result.summary.duplicate_ids.iter().map(DuplicateReport::from).collect(),
            warnings: result.outcome.warnings.iter().map(MergeWarning::to_string).collect(),
            columns: table.column_names().into_iter().map(String::from).collect(),
            preview: table
                .rows()
                .take(PREVIEW_ROWS)
                .map(|row| row.iter().map(|c| c.to_json()).collect())
                .collect(),
        }
    }
}

impl From<&SurveyResult> for MergeResponse {
    fn from(result: &SurveyResult) -> Self {
        let datasets: Vec<DatasetReport> = result.datasets().into_iter().map(DatasetReport::from).collect();
        let clean = datasets.iter().all(|d| d.warnings.is_empty() && d.duplicate_count == 0);

        MergeResponse {
            job_id: Uuid::new_v4().to_string(),
            status: if clean { "ready" } else { "warning" }.to_string(),
            datasets,
        }
    }
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
        "datasets": []
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Column, MergedTable};
    use crate::transform::duplicates::MergeSummary;
    use crate::transform::merge::MergeOutcome;

    fn dataset(name: &str, ids: &[&str]) -> DatasetResult {
        let cells: Vec<String> = ids.iter().map(|s| s.to_string()).collect();
        let table = MergedTable::new(vec![
            Column::text("RecordID (Value)", cells.clone()),
            Column::text("RecordID (Label)", cells),
            Column::integer("Q1. X (Value)", ids.iter().map(|_| Some(1)).collect()),
            Column::text("Q1. X (Label)", ids.iter().map(|_| "One".to_string()).collect()),
        ]);
        DatasetResult {
            name: name.to_string(),
            spss_prefix: "pre".to_string(),
            summary: MergeSummary::from_table(name, &table),
            outcome: MergeOutcome { table, warnings: Vec::new() },
        }
    }

    #[test]
    fn test_report_counts_and_preview() {
        let ids = ["1", "2", "3", "4", "5", "6", "6"];
        let report = DatasetReport::from(&dataset("Pre-Survey", &ids));

        assert_eq!(report.row_count, 7);
        assert_eq!(report.question_count, 1);
        assert_eq!(report.duplicate_count, 2);
        assert_eq!(report.duplicates[0].record_id, "6");
        assert_eq!(report.preview.len(), PREVIEW_ROWS);
        assert_eq!(report.preview[0], vec![json!("1"), json!("1"), json!(1), json!("One")]);
    }

    #[test]
    fn test_response_status() {
        let clean = SurveyResult { pre: dataset("Pre-Survey", &["1"]), post: dataset("Post-Survey", &["1"]) };
        assert_eq!(MergeResponse::from(&clean).status, "ready");

        let dupes = SurveyResult { pre: dataset("Pre-Survey", &["1", "1"]), post: dataset("Post-Survey", &["1"]) };
        let response = MergeResponse::from(&dupes);
        assert_eq!(response.status, "warning");

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["datasets"][0]["duplicateCount"], 2);
        assert_eq!(json["datasets"][1]["name"], "Post-Survey");
    }

    #[test]
    fn test_error_response_shape() {
        let body = error_response("labels file has 3 columns");
        assert_eq!(body["status"], "error");
        assert_eq!(body["error"], "labels file has 3 columns");
        assert!(body["datasets"].as_array().unwrap().is_empty());
    }
}

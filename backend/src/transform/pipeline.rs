//! High-level pipeline: raw CSV pairs in, merged tables and artifacts out.
//!
//! ```text
//! values.csv ─┐                        ┌─▶ workbook sheet
//!             ├─▶ read_grid ─▶ merge ──┼─▶ dictionary document
//! labels.csv ─┘                        └─▶ SPSS CSV
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use qualtrics_merge::{process_survey, Dataset, DatasetKind};
//!
//! let pre = Dataset::from_files(DatasetKind::Pre, "pre_values.csv", "pre_labels.csv")?;
//! let post = Dataset::from_files(DatasetKind::Post, "post_values.csv", "post_labels.csv")?;
//! let result = process_survey(&pre, &post)?;
//! std::fs::write("Qualtrics_Merged_Data.xlsx", result.workbook()?)?;
//! ```

use serde::Serialize;
use std::path::{Path, PathBuf};

use super::dictionary::build_dictionary_titled;
use super::duplicates::MergeSummary;
use super::merge::{merge, MergeOutcome};
use super::spss::reduce_for_spss;
use crate::api::logs::{log_info, log_success, log_warning};
use crate::error::{ExportResult, PipelineError, PipelineResult};
use crate::export::document::Document;
use crate::export::{save_document, spss_csv, xlsx};
use crate::models::{MergedTable, RawTable, SpssTable};
use crate::parser::{read_grid_bytes, read_grid_file};

/// File name of the combined workbook.
pub const WORKBOOK_FILE_NAME: &str = "Qualtrics_Merged_Data.xlsx";

/// The two survey waves handled together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetKind {
    Pre,
    Post,
}

impl DatasetKind {
    /// Worksheet name in the combined workbook.
    pub fn sheet_name(&self) -> &'static str {
        match self {
            DatasetKind::Pre => "Pre-Survey",
            DatasetKind::Post => "Post-Survey",
        }
    }

    /// Default SPSS column prefix.
    pub fn spss_prefix(&self) -> &'static str {
        match self {
            DatasetKind::Pre => "pre",
            DatasetKind::Post => "post",
        }
    }
}

/// One values/labels upload pair, fully read into memory.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub name: String,
    pub spss_prefix: String,
    pub values: Vec<u8>,
    pub labels: Vec<u8>,
}

impl Dataset {
    pub fn new(kind: DatasetKind, values: Vec<u8>, labels: Vec<u8>) -> Self {
        Self {
            name: kind.sheet_name().to_string(),
            spss_prefix: kind.spss_prefix().to_string(),
            values,
            labels,
        }
    }

    /// Read both files of a pair from disk.
    pub fn from_files(kind: DatasetKind, values: impl AsRef<Path>, labels: impl AsRef<Path>) -> PipelineResult<Self> {
        let name = kind.sheet_name();
        let read = |path: &Path| {
            std::fs::read(path).map_err(|e| PipelineError::Csv { dataset: name.to_string(), source: e.into() })
        };
        Ok(Self::new(kind, read(values.as_ref())?, read(labels.as_ref())?))
    }
}

/// Merge output of one dataset plus its summary counts.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetResult {
    pub name: String,
    pub spss_prefix: String,
    pub outcome: MergeOutcome,
    pub summary: MergeSummary,
}

impl DatasetResult {
    pub fn table(&self) -> &MergedTable {
        &self.outcome.table
    }

    pub fn dictionary(&self) -> Document {
        build_dictionary_titled(&self.outcome.table, &format!("{} Data Dictionary", self.name))
    }

    pub fn spss(&self) -> SpssTable {
        reduce_for_spss(&self.outcome.table, &self.spss_prefix)
    }

    /// Dictionary and SPSS CSV written next to each other in `dir`.
    pub fn write_artifacts(&self, dir: &Path, dictionary_ext: &str) -> ExportResult<Vec<PathBuf>> {
        let dictionary_path = dir.join(format!("{}_dictionary.{}", self.spss_prefix, dictionary_ext));
        save_document(&self.dictionary(), &dictionary_path)?;

        let spss_path = dir.join(format!("{}_spss.csv", self.spss_prefix));
        spss_csv::save_spss_csv(&self.spss(), &spss_path)?;

        Ok(vec![dictionary_path, spss_path])
    }
}

/// Both waves of a survey.
#[derive(Debug, Clone, Serialize)]
pub struct SurveyResult {
    pub pre: DatasetResult,
    pub post: DatasetResult,
}

impl SurveyResult {
    pub fn datasets(&self) -> [&DatasetResult; 2] {
        [&self.pre, &self.post]
    }

    /// Combined workbook with one sheet per wave.
    pub fn workbook(&self) -> ExportResult<Vec<u8>> {
        xlsx::write_workbook(&[
            (self.pre.name.as_str(), self.pre.table()),
            (self.post.name.as_str(), self.post.table()),
        ])
    }

    /// Workbook, dictionaries and SPSS files in `dir`.
    pub fn write_outputs(&self, dir: &Path, dictionary_ext: &str) -> PipelineResult<Vec<PathBuf>> {
        std::fs::create_dir_all(dir).map_err(crate::error::ExportError::from)?;

        let workbook_path = dir.join(WORKBOOK_FILE_NAME);
        xlsx::save_workbook(
            &[
                (self.pre.name.as_str(), self.pre.table()),
                (self.post.name.as_str(), self.post.table()),
            ],
            &workbook_path,
        )?;

        let mut written = vec![workbook_path];
        for dataset in self.datasets() {
            written.extend(dataset.write_artifacts(dir, dictionary_ext)?);
        }
        Ok(written)
    }
}

/// Read and merge one values/labels pair.
pub fn process_dataset(dataset: &Dataset) -> PipelineResult<DatasetResult> {
    let name = dataset.name.as_str();
    let csv_err = |source| PipelineError::Csv { dataset: name.to_string(), source };

    log_info(format!("📖 Reading {} exports...", name));
    let values = read_grid_bytes(&dataset.values).map_err(csv_err)?;
    let labels = read_grid_bytes(&dataset.labels).map_err(csv_err)?;
    merge_grids(name, &dataset.spss_prefix, &values, &labels)
}

/// Merge a pair straight from disk.
pub fn process_files(name: &str, spss_prefix: &str, values: &Path, labels: &Path) -> PipelineResult<DatasetResult> {
    let csv_err = |source| PipelineError::Csv { dataset: name.to_string(), source };

    log_info(format!("📖 Reading {} and {}...", values.display(), labels.display()));
    let values = read_grid_file(values).map_err(csv_err)?;
    let labels = read_grid_file(labels).map_err(csv_err)?;
    merge_grids(name, spss_prefix, &values, &labels)
}

fn merge_grids(name: &str, spss_prefix: &str, values: &RawTable, labels: &RawTable) -> PipelineResult<DatasetResult> {
    log_success(format!(
        "values: {} rows x {} cols, labels: {} rows x {} cols",
        values.row_count(),
        values.width(),
        labels.row_count(),
        labels.width()
    ));
    if values.width() != labels.width() {
        log_warning(format!(
            "{}: values and labels widths differ ({} vs {}); headers follow the labels file",
            name,
            values.width(),
            labels.width()
        ));
    }

    log_info(format!("⚙️  Merging {}...", name));
    let outcome = merge(values, labels, Some(name))
        .map_err(|source| PipelineError::Format { dataset: name.to_string(), source })?;

    let summary = MergeSummary::from_table(name, &outcome.table);
    log_success(format!(
        "{}: {} respondents, {} questions",
        name, summary.rows, summary.questions
    ));
    if summary.duplicate_rows > 0 {
        let ids: Vec<&str> = summary.duplicate_ids.iter().map(|d| d.value.as_str()).collect();
        log_warning(format!(
            "{}: {} rows share a RecordID ({})",
            name,
            summary.duplicate_rows,
            ids.join(", ")
        ));
    }

    Ok(DatasetResult {
        name: name.to_string(),
        spss_prefix: spss_prefix.to_string(),
        outcome,
        summary,
    })
}

/// Process pre then post; the first failure aborts.
pub fn process_survey(pre: &Dataset, post: &Dataset) -> PipelineResult<SurveyResult> {
    let pre = process_dataset(pre)?;
    let post = process_dataset(post)?;
    log_success("✅ Data processed successfully!");
    Ok(SurveyResult { pre, post })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CellValue;

    fn csv_export(questions: &[(&str, &str)], rows: &[&[&str]]) -> Vec<u8> {
        let meta: Vec<String> = (0..17).map(|i| format!("M{}", i)).collect();
        let mut lines = Vec::new();

        let mut ids = meta.clone();
        ids.extend(questions.iter().map(|q| q.0.to_string()));
        lines.push(ids.join(","));
        let mut texts = meta.clone();
        texts.extend(questions.iter().map(|q| format!("\"{}\"", q.1)));
        lines.push(texts.join(","));
        let mut import = meta.clone();
        import.extend(questions.iter().map(|_| "import".to_string()));
        lines.push(import.join(","));

        for row in rows {
            let mut cells = meta.clone();
            cells.extend(row.iter().map(|s| s.to_string()));
            lines.push(cells.join(","));
        }
        lines.join("\n").into_bytes()
    }

    fn questions() -> Vec<(&'static str, &'static str)> {
        vec![("Q22", "Record ID"), ("Q1", "Do you agree, overall?")]
    }

    fn pre_dataset() -> Dataset {
        Dataset::new(
            DatasetKind::Pre,
            csv_export(&questions(), &[&["0042", "1"], &["1046", "2"], &["1046", "1"]]),
            csv_export(&questions(), &[&["0042", "Agree"], &["1046", "Disagree"], &["1046", "Agree"]]),
        )
    }

    fn post_dataset() -> Dataset {
        Dataset::new(
            DatasetKind::Post,
            csv_export(&questions(), &[&["0042", "2"]]),
            csv_export(&questions(), &[&["0042", "Disagree"]]),
        )
    }

    #[test]
    fn test_process_dataset() {
        let result = process_dataset(&pre_dataset()).unwrap();

        assert_eq!(result.name, "Pre-Survey");
        assert_eq!(result.summary.rows, 3);
        assert_eq!(result.summary.duplicate_rows, 2);
        assert_eq!(
            result.table().column("RecordID (Value)").unwrap().data.get(0),
            CellValue::Text("0042")
        );
        assert!(result.table().column("Q1. Do you agree, overall? (Value)").is_some());
    }

    #[test]
    fn test_spss_from_result() {
        let result = process_dataset(&pre_dataset()).unwrap();
        assert_eq!(result.spss().column_names(), vec!["RecordID", "pre_Q1"]);
    }

    #[test]
    fn test_format_error_names_dataset() {
        let narrow = b"a,b,c\n1,2,3\n".to_vec();
        let bad = Dataset::new(DatasetKind::Post, narrow.clone(), narrow);

        let err = process_survey(&pre_dataset(), &bad).unwrap_err();
        assert!(err.is_format_error());
        assert!(err.to_string().starts_with("Post-Survey:"));
    }

    #[test]
    fn test_empty_upload_is_csv_error() {
        let bad = Dataset::new(DatasetKind::Pre, Vec::new(), Vec::new());
        let err = process_dataset(&bad).unwrap_err();
        assert!(matches!(err, PipelineError::Csv { .. }));
    }

    #[test]
    fn test_survey_outputs_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let result = process_survey(&pre_dataset(), &post_dataset()).unwrap();

        let written = result.write_outputs(dir.path(), "md").unwrap();
        let names: Vec<String> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                WORKBOOK_FILE_NAME,
                "pre_dictionary.md",
                "pre_spss.csv",
                "post_dictionary.md",
                "post_spss.csv"
            ]
        );

        let spss = std::fs::read_to_string(dir.path().join("post_spss.csv")).unwrap();
        assert_eq!(spss, "RecordID,post_Q1\n0042,2\n");

        let dictionary = std::fs::read_to_string(dir.path().join("pre_dictionary.md")).unwrap();
        assert!(dictionary.starts_with("# Pre-Survey Data Dictionary"));
        assert!(dictionary.contains("| 1 | Agree |\n| 2 | Disagree |"));
    }

    #[test]
    fn test_workbook_bytes() {
        let result = process_survey(&pre_dataset(), &post_dataset()).unwrap();
        let bytes = result.workbook().unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn test_process_files() {
        let dir = tempfile::tempdir().unwrap();
        let values = dir.path().join("values.csv");
        let labels = dir.path().join("labels.csv");
        let pre = pre_dataset();
        std::fs::write(&values, &pre.values).unwrap();
        std::fs::write(&labels, &pre.labels).unwrap();

        let result = process_files("Williams", "w", &values, &labels).unwrap();
        assert_eq!(result.name, "Williams");
        assert_eq!(result.spss().column_names(), vec!["RecordID", "w_Q1"]);
    }
}

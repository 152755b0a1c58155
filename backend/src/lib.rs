//! # Qualtrics Merge - values/labels export reshaping
//!
//! Qualtrics offers two parallel downloads of the same survey: a "values"
//! export with numeric response codes and a "labels" export with the choice
//! text. This crate merges them into one analysis table, derives a data
//! dictionary from it and reduces it to an SPSS-ready CSV.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌──────────────┐
//! │ values.csv  │────▶│   Parser    │────▶│    Merge    │────▶│ Workbook     │
//! │ labels.csv  │     │ (raw grid)  │     │ (Value/Label│──┬─▶│ Dictionary   │
//! └─────────────┘     └─────────────┘     │   pairs)    │  └─▶│ SPSS CSV     │
//!                                         └─────────────┘     └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use qualtrics_merge::{merge, read_grid_file, reduce_for_spss};
//!
//! let values = read_grid_file("pre_values.csv")?;
//! let labels = read_grid_file("pre_labels.csv")?;
//! let merged = merge(&values, &labels, Some("Pre-Survey"))?;
//! let spss = reduce_for_spss(&merged.table, "pre");
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Raw grids, merged and SPSS tables
//! - [`parser`] - CSV reading with encoding detection
//! - [`transform`] - Merge, duplicates, dictionary, SPSS reduction, pipeline
//! - [`export`] - Workbook, CSV and document writers
//! - [`api`] - HTTP API server and log streaming

// Core modules
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Transformation
pub mod transform;

// Output
pub mod export;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{CsvError, ExportError, FormatError, PipelineError, ServerError};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    CellValue, Column, ColumnData, MergedTable, RawTable, SpssTable, HEADER_ROWS, METADATA_COLUMNS,
    MIN_COLUMNS, RECORD_ID,
};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{decode_content, detect_encoding, read_grid, read_grid_bytes, read_grid_file};

// =============================================================================
// Re-exports - Transform
// =============================================================================

pub use transform::{
    build_dictionary, dictionary_entries, duplicate_count, duplicate_record_ids, merge,
    process_dataset, process_files, process_survey, reduce_for_spss, Dataset, DatasetKind,
    DatasetResult, DictionaryEntry, DuplicateId, MergeOutcome, MergeSummary, MergeWarning,
    SurveyResult, WORKBOOK_FILE_NAME,
};

// =============================================================================
// Re-exports - Export
// =============================================================================

pub use export::{save_document, Block, Document};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::types::{error_response, DatasetReport, DuplicateReport, MergeResponse};

// Server
pub mod server {
    pub use crate::api::server::{router, start_server};
}

//! Error types for the survey merge pipeline.
//!
//! - [`FormatError`] - Input is not a Qualtrics export of the expected shape
//! - [`CsvError`] - Reading/decoding a CSV export
//! - [`ExportError`] - Writing workbooks, CSV files and dictionary documents
//! - [`PipelineError`] - Top-level orchestration errors
//! - [`ServerError`] - HTTP boundary errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

use crate::models::MIN_COLUMNS;

// =============================================================================
// Structural Errors
// =============================================================================

/// The only hard failure of the merge: a grid narrower than the fixed
/// Qualtrics layout (17 metadata columns plus at least one question).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "{table} file has {found} columns; expected at least {} (Qualtrics question data starts at column R)",
    MIN_COLUMNS
)]
pub struct FormatError {
    /// Which side of the pair failed ("values" or "labels").
    pub table: &'static str,
    /// Width actually found.
    pub found: usize,
}

// =============================================================================
// CSV Input Errors
// =============================================================================

/// Errors while reading a CSV export into a grid.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Malformed CSV record.
    #[error("Invalid CSV format: {0}")]
    ParseError(#[from] csv::Error),

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,
}

// =============================================================================
// Export Errors
// =============================================================================

/// Errors while writing one of the output artifacts.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Spreadsheet writer failure.
    #[error("Workbook error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// CSV writer failure.
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    /// Table does not fit in a worksheet.
    #[error("Sheet '{sheet}' is too large: {rows} rows x {columns} columns")]
    SheetTooLarge { sheet: String, rows: usize, columns: usize },

    /// Document package failure.
    #[error("Document package error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// IO error.
    #[error("Export IO error: {0}")]
    IoError(#[from] std::io::Error),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the error type returned by [`crate::transform::pipeline::process_survey`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// CSV reading error, tagged with the dataset it came from.
    #[error("{dataset}: {source}")]
    Csv {
        dataset: String,
        #[source]
        source: CsvError,
    },

    /// Structural precondition failed for a dataset.
    #[error("{dataset}: {source}")]
    Format {
        dataset: String,
        #[source]
        source: FormatError,
    },

    /// Export error.
    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}

impl PipelineError {
    /// True when the failure means the upload was not a Qualtrics export.
    pub fn is_format_error(&self) -> bool {
        matches!(self, PipelineError::Format { .. })
    }
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

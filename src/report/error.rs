//! Error types for apt report files.

use thiserror::Error;

/// Errors that can occur while reading a report file
#[derive(Error, Debug)]
pub enum ReportError {
    /// I/O error reading or writing
    #[error("Failed to read report file: {0}")]
    IoError(#[from] std::io::Error),

    /// Tab-separated parsing error
    #[error("Report parsing error: {0}")]
    CsvError(#[from] csv::Error),

    /// Header or sample line with fewer than two columns
    #[error("Missing information in report file at line {0}")]
    MissingInformation(u64),

    /// Second header column is not `computed_gender`
    #[error("Second column not genders in report file: found {0:?}")]
    NotGenders(String),
}

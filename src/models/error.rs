//! Error types for cluster model tables.

use thiserror::Error;

/// Errors that can occur while loading a SNP posterior model table
#[derive(Error, Debug)]
pub enum ModelError {
    /// I/O error reading the table
    #[error("Failed to read SNP models file: {0}")]
    IoError(#[from] std::io::Error),

    /// Tab/semicolon separated parsing error
    #[error("SNP models parsing error: {0}")]
    CsvError(#[from] csv::Error),

    /// No model line found
    #[error("Missing information in SNP models file")]
    Empty,

    /// First line matches neither dialect
    #[error("Malformed SNP model file header: {0}")]
    MalformedHeader(String),

    /// Line has fewer cluster columns than its copy number requires
    #[error("Missing information for probeset {marker}: {found} fields, expected {expected}")]
    MissingFields {
        /// Marker id as written
        marker: String,
        /// Fields on the line
        found: usize,
        /// Fields required
        expected: usize,
    },

    /// Cluster column has too few statistics
    #[error(
        "Missing information for probeset {marker}: cluster column {column} has {found} values, expected {expected}"
    )]
    MissingStatistics {
        /// Marker id as written
        marker: String,
        /// Field index of the cluster column
        column: usize,
        /// Values found
        found: usize,
        /// Values required
        expected: usize,
    },

    /// Statistic does not parse as a number
    #[error("Invalid value {value:?} for probeset {marker}")]
    InvalidNumber {
        /// Marker id as written
        marker: String,
        /// Offending text
        value: String,
    },
}

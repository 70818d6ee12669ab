//! Error types for genotype record streams.

use thiserror::Error;

use crate::formats::FormatError;

/// Errors raised while setting up or advancing a genotype stream
#[derive(Error, Debug)]
pub enum GenotypeError {
    /// I/O error on a text table
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Container read failure
    #[error("Container error: {0}")]
    Format(#[from] FormatError),

    /// Text table parsing failure
    #[error("Table parsing error: {0}")]
    CsvError(#[from] csv::Error),

    /// Neither containers nor text tables were supplied
    #[error("No genotype input supplied")]
    NoInput,

    /// CHP container of another analysis type
    #[error("AGCC CHP file {file} does not contain multi data type analysis ({found})")]
    NotMultiDataAnalysis {
        /// Sample display name
        file: String,
        /// Data type identifier found
        found: String,
    },

    /// CHP container without the `MultiData` group or its `Genotype` set
    #[error("AGCC CHP file {file} does not contain {what}")]
    MissingGenotypeData {
        /// Sample display name
        file: String,
        /// Missing structure
        what: &'static str,
    },

    /// Genotype data set columns are not laid out as expected
    #[error("AGCC CHP file {file} does not contain genotype data in the expected format: {reason}")]
    UnexpectedColumns {
        /// Sample display name
        file: String,
        /// What did not match
        reason: String,
    },

    /// Sources ran out of markers at different positions
    #[error("Genotype inputs are out of sync after {markers} markers: {detail}")]
    Desync {
        /// Markers read before the mismatch
        markers: u64,
        /// Which inputs ended
        detail: String,
    },

    /// Marker ids disagree across samples or tables
    #[error("Probe Set Name mismatch: {expected} {found}")]
    MarkerMismatch {
        /// Id seen first in this pull
        expected: String,
        /// Disagreeing id
        found: String,
    },

    /// Genotype code outside the known set
    #[error("Genotype for Probe Set ID {marker} is malformed: {value}")]
    InvalidCall {
        /// Marker id
        marker: String,
        /// Raw value
        value: String,
    },

    /// Table cell that is not a number
    #[error("Invalid value {value:?} for Probe Set ID {marker} in the {table} file")]
    InvalidNumber {
        /// Table kind
        table: &'static str,
        /// Marker id
        marker: String,
        /// Raw value
        value: String,
    },

    /// Table without a header line
    #[error("Empty {0} file")]
    EmptyTable(&'static str),

    /// Header line not starting with `probeset_id`
    #[error("Malformed first line from {table} file: {line}")]
    MalformedHeader {
        /// Table kind
        table: &'static str,
        /// Header line
        line: String,
    },

    /// Tables declare different samples
    #[error("Samples in the {table} file do not match the {reference} file")]
    SampleMismatch {
        /// Table kind
        table: &'static str,
        /// Table the samples were first taken from
        reference: &'static str,
    },

    /// Data line with the wrong number of columns
    #[error("Expected {expected} columns but {found} columns found in the {table} file")]
    ColumnCount {
        /// Table kind
        table: &'static str,
        /// 1 + number of samples
        expected: usize,
        /// Columns on the line
        found: usize,
    },

    /// Summary lines not forming an `-A`/`-B` pair
    #[error("Found Probe Set ID {found} while {expected} was expected")]
    SummaryPair {
        /// Expected id
        expected: String,
        /// Id found
        found: String,
    },

    /// Summary table ending between the `-A` and `-B` lines
    #[error("Summary file ended prematurely after {0}")]
    SummaryTruncated(String),
}

//! Error types for binary container parsing.

use thiserror::Error;

/// Errors that can occur while reading Calvin (AGCC) or XDA CEL containers.
#[derive(Error, Debug)]
pub enum FormatError {
    /// I/O error, including short reads on truncated files
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Leading byte does not identify a supported container
    #[error("Expected magic numbers 59, 64 or 65 but found {0}")]
    UnknownMagic(u8),

    /// Container family that is recognized but not readable
    #[error("Unsupported container format: {0}")]
    Unsupported(String),

    /// Signature field holds an unexpected value
    #[error("{format} magic number is {found} while it should be {expected}")]
    BadSignature {
        /// Container family name
        format: &'static str,
        /// Required signature
        expected: i32,
        /// Signature found in the file
        found: i32,
    },

    /// Version field holds an unsupported value
    #[error("Unsupported {format} file format version: {found} (expected {expected})")]
    UnsupportedVersion {
        /// Container family name
        format: &'static str,
        /// Supported version
        expected: i32,
        /// Version found in the file
        found: i32,
    },

    /// Parameter carries a type descriptor outside the closed set
    #[error("MIME type {0} not allowed")]
    UnknownMimeType(String),

    /// A length prefix or count was negative
    #[error("Negative {what}: {value}")]
    NegativeLength {
        /// Field that carried the bad value
        what: &'static str,
        /// Raw value read from the file
        value: i64,
    },

    /// Recorded offset cannot be reached
    #[error("Fail to seek to position {offset} (stream length {length})")]
    BadOffset {
        /// Offset recorded in the container
        offset: u64,
        /// Total stream length
        length: u64,
    },

    /// Data remained after the last structure was parsed
    #[error("Reader did not reach the end of file at position {0}")]
    TrailingData(u64),

    /// Data set row region disagrees with the declared column layout
    #[error(
        "Data set {data_set}: {rows} rows of {row_width} bytes do not fill the {region} byte row region"
    )]
    RowWidthMismatch {
        /// Data set name
        data_set: String,
        /// Declared row count
        rows: u32,
        /// Sum of declared column widths
        row_width: usize,
        /// Bytes between the first row and the next data set
        region: u64,
    },

    /// Row requested beyond the declared row count
    #[error("Row {row} out of range for data set {data_set} with {rows} rows")]
    RowOutOfRange {
        /// Data set name
        data_set: String,
        /// Requested row
        row: u32,
        /// Declared row count
        rows: u32,
    },

    /// Group or data set index does not exist
    #[error("No data set at group {group}, set {set}")]
    MissingDataSet {
        /// Group index
        group: usize,
        /// Data set index within the group
        set: usize,
    },

    /// Malformed value inside a column or parameter
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// Header parameter required for a report is missing
    #[error("Missing parameter {name} in {file}")]
    MissingParameter {
        /// Parameter name
        name: String,
        /// File display name
        file: String,
    },

    /// CEL file without a usable DAT header
    #[error("CEL file {file} {reason}")]
    MissingDatHeader {
        /// File display name
        file: String,
        /// What is missing
        reason: &'static str,
    },

    /// DAT header not in the fixed scanner layout
    #[error("DAT header malformed: {0:?}")]
    MalformedDatHeader(String),
}

impl FormatError {
    pub(crate) fn negative(what: &'static str, value: i32) -> Self {
        FormatError::NegativeLength {
            what,
            value: value as i64,
        }
    }
}

//! Error types for the conversion loop.

use thiserror::Error;

use crate::genotypes::GenotypeError;

/// Errors that abort a conversion
#[derive(Error, Debug)]
pub enum ConvertError {
    /// Genotype stream failure
    #[error(transparent)]
    Genotype(#[from] GenotypeError),

    /// I/O error writing output
    #[error("Unable to write output: {0}")]
    IoError(#[from] std::io::Error),

    /// TSV writer failure
    #[error("Unable to write output: {0}")]
    CsvError(#[from] csv::Error),
}

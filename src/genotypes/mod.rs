//! Per-marker genotype record streams
//!
//! Genotypes reach the converter in one of two shapes:
//!
//! - one CHP container per sample ([`ChpGenotypes`]), read row by row in
//!   lockstep
//! - up to three apt text tables ([`TableGenotypes`]): calls, confidences and
//!   the allele summary, read line by line in lockstep
//!
//! Both implement [`GenotypeSource`] and fill the same
//! [`GenotypeRecordSet`]: one slot per sample for the call, the confidence,
//! and the intensities in both signal (X/Y) and contrast/size form.
//!
//! ## Example
//!
//! ```rust,no_run
//! use affyconv::genotypes::{GenotypeSource, TableGenotypes};
//!
//! let mut tables = TableGenotypes::open(
//!     Some("AxiomGT1.calls.txt".as_ref()),
//!     Some("AxiomGT1.confidences.txt".as_ref()),
//!     None,
//! )?;
//! while let Some(record) = tables.pull()? {
//!     println!("{} {:?}", record.marker_id, record.calls);
//! }
//! tables.finish()?;
//! # Ok::<(), affyconv::genotypes::GenotypeError>(())
//! ```

mod chp;
mod error;
mod tables;


pub use chp::{ChpGenotypes, MULTI_DATA_TYPE};
pub use error::GenotypeError;
pub use tables::{TableGenotypes, TableKind};

use std::fmt;
use std::fs::File;
use std::io::BufReader;

use serde::Serialize;

/// Genotype call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Call {
    /// Homozygous A
    AA,
    /// Heterozygous
    AB,
    /// Homozygous B
    BB,
    /// No call
    NoCall,
}

impl Call {
    /// Decode a CHP call byte; only the low nibble is significant
    pub fn from_chp_code(code: u8) -> Option<Self> {
        match code & 0x0F {
            6 => Some(Call::AA),
            7 => Some(Call::BB),
            8 => Some(Call::AB),
            11 => Some(Call::NoCall),
            _ => None,
        }
    }

    /// Decode an apt calls table value (-1, 0, 1, 2)
    pub fn from_table_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(Call::NoCall),
            0 => Some(Call::AA),
            1 => Some(Call::AB),
            2 => Some(Call::BB),
            _ => None,
        }
    }

    /// apt calls table value of this call
    pub fn table_code(&self) -> i32 {
        match self {
            Call::NoCall => -1,
            Call::AA => 0,
            Call::AB => 1,
            Call::BB => 2,
        }
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Call::AA => "AA",
            Call::AB => "AB",
            Call::BB => "BB",
            Call::NoCall => "NC",
        };
        f.write_str(s)
    }
}

/// How a CHP container stores intensities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Representation {
    /// `Log Ratio` / `Strength` columns (AxiomGT1, BRLMM-P)
    ContrastSize,
    /// `Signal A` / `Signal B` columns (Birdseed)
    SignalPair,
}

/// Which parts of a [`GenotypeRecordSet`] a source fills
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Fields {
    /// Calls are populated
    pub calls: bool,
    /// Confidences are populated
    pub confidences: bool,
    /// Intensities (X/Y and contrast/size) are populated
    pub intensities: bool,
}

impl Fields {
    /// Every field
    pub fn all() -> Self {
        Self {
            calls: true,
            confidences: true,
            intensities: true,
        }
    }
}

/// One marker across all samples, stored column-wise
///
/// The set is owned by its source and overwritten on every pull. Slots of
/// fields the source does not provide hold [`Call::NoCall`] or NaN.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenotypeRecordSet {
    /// Marker (probe set) id
    pub marker_id: String,
    /// Call per sample
    pub calls: Vec<Call>,
    /// Call confidence per sample
    pub confidences: Vec<f32>,
    /// Signal A per sample
    pub norm_x: Vec<f32>,
    /// Signal B per sample
    pub norm_y: Vec<f32>,
    /// log2(X) - log2(Y) per sample
    pub contrast: Vec<f32>,
    /// (log2(X) + log2(Y)) / 2 per sample
    pub size: Vec<f32>,
}

impl GenotypeRecordSet {
    /// Empty record set for `samples` samples
    pub fn new(samples: usize) -> Self {
        Self {
            marker_id: String::new(),
            calls: vec![Call::NoCall; samples],
            confidences: vec![f32::NAN; samples],
            norm_x: vec![f32::NAN; samples],
            norm_y: vec![f32::NAN; samples],
            contrast: vec![f32::NAN; samples],
            size: vec![f32::NAN; samples],
        }
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    /// True when there are no samples
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Store contrast/size for a sample and derive its signals
    pub fn set_contrast_size(&mut self, sample: usize, contrast: f32, size: f32) {
        let (x, y) = contrast_size_to_signals(contrast, size);
        self.contrast[sample] = contrast;
        self.size[sample] = size;
        self.norm_x[sample] = x;
        self.norm_y[sample] = y;
    }

    /// Store signals for a sample and derive its contrast/size
    pub fn set_signals(&mut self, sample: usize, x: f32, y: f32) {
        let (contrast, size) = signals_to_contrast_size(x, y);
        self.norm_x[sample] = x;
        self.norm_y[sample] = y;
        self.contrast[sample] = contrast;
        self.size[sample] = size;
    }
}

/// X = 2^(size + contrast/2), Y = 2^(size - contrast/2)
pub fn contrast_size_to_signals(contrast: f32, size: f32) -> (f32, f32) {
    let half = contrast * 0.5;
    ((size + half).exp2(), (size - half).exp2())
}

/// contrast = log2 X - log2 Y, size = (log2 X + log2 Y) / 2
pub fn signals_to_contrast_size(x: f32, y: f32) -> (f32, f32) {
    let (log_x, log_y) = (x.log2(), y.log2());
    (log_x - log_y, (log_x + log_y) * 0.5)
}

/// A lockstep, marker-by-marker genotype stream
pub trait GenotypeSource {
    /// Advance to the next marker
    ///
    /// Returns `None` once every input is exhausted. Inputs running out at
    /// different markers are an error.
    fn pull(&mut self) -> Result<Option<&GenotypeRecordSet>, GenotypeError>;

    /// True once `pull` has returned `None`
    fn at_end(&self) -> bool;

    /// Sample names, in slot order
    fn samples(&self) -> &[String];

    /// Fields populated on every pull
    fn fields(&self) -> Fields;

    /// Release the inputs, reporting any that still hold data
    fn finish(&mut self) -> Result<(), GenotypeError> {
        Ok(())
    }
}

/// Either genotype backing
pub enum GenotypeIterator<R = BufReader<File>> {
    /// One CHP container per sample
    Chp(ChpGenotypes<R>),
    /// apt text tables
    Tables(TableGenotypes),
}

impl<R: std::io::Read + std::io::Seek> GenotypeSource for GenotypeIterator<R> {
    fn pull(&mut self) -> Result<Option<&GenotypeRecordSet>, GenotypeError> {
        match self {
            GenotypeIterator::Chp(chp) => chp.pull(),
            GenotypeIterator::Tables(tables) => tables.pull(),
        }
    }

    fn at_end(&self) -> bool {
        match self {
            GenotypeIterator::Chp(chp) => chp.at_end(),
            GenotypeIterator::Tables(tables) => tables.at_end(),
        }
    }

    fn samples(&self) -> &[String] {
        match self {
            GenotypeIterator::Chp(chp) => chp.samples(),
            GenotypeIterator::Tables(tables) => tables.samples(),
        }
    }

    fn fields(&self) -> Fields {
        match self {
            GenotypeIterator::Chp(chp) => chp.fields(),
            GenotypeIterator::Tables(tables) => tables.fields(),
        }
    }

    fn finish(&mut self) -> Result<(), GenotypeError> {
        match self {
            GenotypeIterator::Chp(chp) => chp.finish(),
            GenotypeIterator::Tables(tables) => tables.finish(),
        }
    }
}

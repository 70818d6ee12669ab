//! # affyconv - Affymetrix genotype ingestion
//!
//! `affyconv` reads the files produced by Affymetrix genotyping pipelines and
//! turns them into one lockstep stream of per-marker genotype records, with
//! B-allele frequency (BAF) and log R ratio (LRR) derived from the cluster
//! models the caller was trained with.
//!
//! ## Inputs
//!
//! - **Calvin / AGCC containers** (CHP genotype results, AGCC CEL files)
//! - **XDA CEL files** (fixed-layout binary intensity files)
//! - **apt-probeset-genotype tables**: calls, confidences and summary
//!   intensities, plain or gzip-compressed
//! - **SNP posterior models** in BRLMM-P (AxiomGT1) or Birdseed layout
//! - **apt report files** with inferred sample sex
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use affyconv::prelude::*;
//! use std::fs::File;
//! use std::io::BufReader;
//!
//! let paths = ["s1.AxiomGT1.chp", "s2.AxiomGT1.chp"];
//! let files = paths
//!     .iter()
//!     .map(|p| CalvinFile::open(p, ParseOptions::default()))
//!     .collect::<Result<Vec<CalvinFile<BufReader<File>>>, _>>()?;
//! let mut source = ChpGenotypes::new(files)?;
//!
//! let models = ClusterModelStore::from_path("AxiomGT1.snp-posteriors.txt")?;
//! let mut sink = TsvSink::new(std::io::stdout());
//! let stats = Converter::new(Some(&models), ConversionOptions::default())
//!     .run(&mut source, &mut sink)?;
//! println!("{}", stats);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! The library is organized into the following modules:
//!
//! - [`formats`]: Calvin and XDA binary readers and their text summaries
//! - [`models`]: SNP posterior (cluster model) tables
//! - [`genotypes`]: per-marker iteration over CHP files or text tables
//! - [`normalize`]: cluster adjustment and BAF/LRR projection
//! - [`convert`]: the processing loop and record sinks
//! - [`report`]: apt report files and sex tables
//! - [`text`]: plain/gzip text input

// Documentation lints - enforce complete documentation for publication
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

pub mod convert;
pub mod formats;
pub mod genotypes;
pub mod models;
pub mod normalize;
pub mod report;
pub mod text;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::convert::{
        ConversionOptions, ConversionStats, ConvertError, Converter, Emit, MarkerOutput,
        RecordSink, TsvSink,
    };
    pub use crate::formats::calvin::ParseOptions;
    pub use crate::formats::xda::LoadMode;
    pub use crate::formats::{ArrayFile, CalvinFile, FileKind, FormatError, OpenOptions, XdaCelFile};
    pub use crate::genotypes::{
        Call, ChpGenotypes, Fields, GenotypeError, GenotypeIterator, GenotypeRecordSet,
        GenotypeSource, TableGenotypes,
    };
    pub use crate::models::{ClusterModelStore, ClusterSpace, ModelDialect, ModelError, SnpModel};
    pub use crate::normalize::{AlleleProjection, IntensityNormalizer, LinearProjection};
    pub use crate::report::{Report, ReportError, Sex};
}

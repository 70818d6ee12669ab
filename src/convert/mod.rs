//! Marker-by-marker conversion of genotype streams
//!
//! [`Converter`] pulls record sets from any [`GenotypeSource`], looks up the
//! cluster model of each marker, optionally re-centres it on the observed
//! calls and derives BAF/LRR before handing the marker to a [`RecordSink`].
//!
//! ```rust,no_run
//! use affyconv::convert::{ConversionOptions, Converter, TsvSink};
//! use affyconv::genotypes::TableGenotypes;
//! use affyconv::models::ClusterModelStore;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let models = ClusterModelStore::from_path("AxiomGT1.snp-posteriors.txt")?;
//! let mut source = TableGenotypes::open(
//!     Some(Path::new("AxiomGT1.calls.txt")),
//!     Some(Path::new("AxiomGT1.confidences.txt")),
//!     Some(Path::new("AxiomGT1.summary.txt")),
//! )?;
//! let mut sink = TsvSink::new(std::io::stdout());
//! let stats = Converter::new(Some(&models), ConversionOptions::default())
//!     .run(&mut source, &mut sink)?;
//! println!("{}", stats);
//! # Ok(())
//! # }
//! ```

mod error;
mod sink;

#[cfg(test)]
mod tests;

pub use error::ConvertError;
pub use sink::{Emit, RecordSink, TsvSink};

use std::borrow::Cow;
use std::fmt;

use log::{debug, info, warn};
use serde::Serialize;

use crate::genotypes::{Fields, GenotypeRecordSet, GenotypeSource};
use crate::models::{ClusterModelStore, ClusterSpace, SnpModel};
use crate::normalize::{
    adjust_clusters, AlleleProjection, IntensityNormalizer, LinearProjection, MIN_ADJUST_SAMPLES,
};

/// Conversion settings
#[derive(Debug, Clone)]
pub struct ConversionOptions {
    /// Re-centre cluster means on the cohort's calls before normalizing
    pub adjust_clusters: bool,
    /// Log progress every N markers (0 disables)
    pub progress_interval: u64,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            adjust_clusters: false,
            progress_interval: 100_000,
        }
    }
}

/// Counters from a conversion
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversionStats {
    /// Markers read from the source
    pub markers: u64,
    /// Markers with no cluster model
    pub missing_models: u64,
    /// Markers the sink dropped as unlocalized
    pub skipped: u64,
}

impl fmt::Display for ConversionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Lines total/missing-model/skipped:\t{}/{}/{}",
            self.markers, self.missing_models, self.skipped
        )
    }
}

/// One marker as handed to a sink
#[derive(Debug, Clone, Copy)]
pub struct MarkerOutput<'a> {
    /// Per-sample values
    pub record: &'a GenotypeRecordSet,
    /// Which parts of `record` were loaded
    pub fields: Fields,
    /// Cluster model used, after adjustment
    pub model: Option<&'a SnpModel>,
    /// B-allele frequency per sample
    pub baf: Option<&'a [f32]>,
    /// Log R ratio per sample
    pub lrr: Option<&'a [f32]>,
}

/// Drives a genotype source into a sink
pub struct Converter<'m, P = LinearProjection> {
    models: Option<&'m ClusterModelStore>,
    options: ConversionOptions,
    normalizer: IntensityNormalizer<P>,
}

impl<'m> Converter<'m, LinearProjection> {
    /// Converter using the piecewise-linear projection
    pub fn new(models: Option<&'m ClusterModelStore>, options: ConversionOptions) -> Self {
        Self {
            models,
            options,
            normalizer: IntensityNormalizer::new(),
        }
    }
}

impl<'m, P: AlleleProjection> Converter<'m, P> {
    /// Converter using a custom projection
    pub fn with_normalizer(
        models: Option<&'m ClusterModelStore>,
        options: ConversionOptions,
        normalizer: IntensityNormalizer<P>,
    ) -> Self {
        Self {
            models,
            options,
            normalizer,
        }
    }

    /// Convert every marker of `source` into `sink`
    ///
    /// The source's `finish` is called once it is exhausted, so leftover
    /// input is reported before the sink is closed.
    pub fn run<S, K>(&self, source: &mut S, sink: &mut K) -> Result<ConversionStats, ConvertError>
    where
        S: GenotypeSource + ?Sized,
        K: RecordSink + ?Sized,
    {
        let fields = source.fields();
        let n_samples = source.samples().len();
        let normalize = fields.intensities && self.models.is_some();
        let adjust = self.options.adjust_clusters && normalize && fields.calls;

        if self.options.adjust_clusters {
            if !adjust {
                warn!("Cluster adjustment needs calls, intensities and cluster models; skipping");
            } else if n_samples < MIN_ADJUST_SAMPLES {
                warn!(
                    "Adjusting clusters with only {} samples (at least {} recommended)",
                    n_samples, MIN_ADJUST_SAMPLES
                );
            }
        }

        info!("Converting {} samples", n_samples);
        sink.begin(source.samples())?;

        let mut stats = ConversionStats::default();
        let (mut baf, mut lrr) = (Vec::new(), Vec::new());

        while let Some(record) = source.pull()? {
            stats.markers += 1;
            if self.options.progress_interval > 0
                && stats.markers % self.options.progress_interval == 0
            {
                info!("Progress: {} markers", stats.markers);
            }

            let model = self.models.and_then(|store| {
                store
                    .lookup(&record.marker_id)
                    .map(|model| (model, store.space()))
            });
            let model = match model {
                Some((model, space)) if adjust => {
                    let (x, y) = coordinates(record, space);
                    Some((Cow::Owned(adjust_clusters(model, &record.calls, x, y)), space))
                }
                Some((model, space)) => Some((Cow::Borrowed(model), space)),
                None => {
                    if self.models.is_some() {
                        stats.missing_models += 1;
                        debug!("SNP model for probe set {} was not found", record.marker_id);
                    }
                    None
                }
            };

            let normalized = match &model {
                Some((model, space)) if normalize => {
                    self.normalizer.compute(
                        model,
                        *space,
                        &record.norm_x,
                        &record.norm_y,
                        &mut baf,
                        &mut lrr,
                    );
                    true
                }
                _ => false,
            };

            let output = MarkerOutput {
                record,
                fields,
                model: model.as_ref().map(|(m, _)| &**m),
                baf: normalized.then_some(baf.as_slice()),
                lrr: normalized.then_some(lrr.as_slice()),
            };
            if sink.emit(&output)? == Emit::Unlocalized {
                stats.skipped += 1;
                debug!("Skipping unlocalized marker {}", record.marker_id);
            }
        }

        source.finish()?;
        sink.finish()?;
        info!("{}", stats);
        Ok(stats)
    }
}

/// Per-sample coordinates in the space a model was trained in
fn coordinates(record: &GenotypeRecordSet, space: ClusterSpace) -> (&[f32], &[f32]) {
    match space {
        ClusterSpace::SignalPair => (&record.norm_x, &record.norm_y),
        ClusterSpace::ContrastSize => (&record.contrast, &record.size),
    }
}

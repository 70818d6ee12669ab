//! B-allele frequency and log R ratio from cluster models
//!
//! Every cluster mean is turned into a reference point in polar form:
//! an angle θ in \[0, 1\] (0 = all A signal, 1 = all B signal) and a total
//! intensity R. Samples are put in the same form and projected between the
//! reference points of their marker by an [`AlleleProjection`].
//!
//! | Model space   | θ                          | R                                   |
//! |---------------|----------------------------|-------------------------------------|
//! | signal pair   | atan(ȳ / x̄) · 2/π          | x̄ + ȳ                               |
//! | contrast/size | atan(2^(−contrast)) · 2/π  | 2^size · 2 · cosh(contrast · ln2/2) |
//!
//! Haploid markers have no AB cluster; the midpoint of AA and BB stands in.

mod adjust;
mod projection;


pub use adjust::{adjust_clusters, ADJUST_PRIOR_WEIGHT, MIN_ADJUST_SAMPLES};
pub use projection::{AlleleProjection, LinearProjection};

use std::f32::consts::{FRAC_2_PI, LN_2};

use crate::models::{ClusterSpace, ClusterStats, Ploidy, SnpModel};

/// A cluster centre in polar form
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferencePoint {
    /// Allelic angle in \[0, 1\]
    pub theta: f32,
    /// Total intensity
    pub r: f32,
}

impl ReferencePoint {
    /// Reference point of a cluster mean in the given space
    pub fn from_cluster(cluster: &ClusterStats, space: ClusterSpace) -> Self {
        match space {
            ClusterSpace::SignalPair => Self {
                theta: (cluster.mean_y / cluster.mean_x).atan() * FRAC_2_PI,
                r: cluster.mean_x + cluster.mean_y,
            },
            ClusterSpace::ContrastSize => Self {
                theta: (-cluster.mean_x).exp2().atan() * FRAC_2_PI,
                r: cluster.mean_y.exp2() * 2.0 * (cluster.mean_x * 0.5 * LN_2).cosh(),
            },
        }
    }

    /// Polar form of a sample's signals
    pub fn from_signals(x: f32, y: f32) -> Self {
        Self {
            theta: (y / x).atan() * FRAC_2_PI,
            r: x + y,
        }
    }

    fn midpoint(a: Self, b: Self) -> Self {
        Self {
            theta: (a.theta + b.theta) * 0.5,
            r: (a.r + b.r) * 0.5,
        }
    }
}

/// Reference points of the three clusters of one marker
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferencePoints {
    /// Homozygous A
    pub aa: ReferencePoint,
    /// Heterozygous
    pub ab: ReferencePoint,
    /// Homozygous B
    pub bb: ReferencePoint,
}

impl ReferencePoints {
    /// Reference points of a model in the given space
    pub fn from_model(model: &SnpModel, space: ClusterSpace) -> Self {
        let aa = ReferencePoint::from_cluster(&model.aa, space);
        let bb = ReferencePoint::from_cluster(&model.bb, space);
        let ab = match model.ploidy {
            Ploidy::Haploid => ReferencePoint::midpoint(aa, bb),
            Ploidy::Diploid => ReferencePoint::from_cluster(&model.ab, space),
        };
        Self { aa, ab, bb }
    }
}

/// Computes BAF and LRR for every sample of a marker
#[derive(Debug, Clone, Default)]
pub struct IntensityNormalizer<P = LinearProjection> {
    projection: P,
}

impl IntensityNormalizer<LinearProjection> {
    /// Normalizer with the piecewise-linear projection
    pub fn new() -> Self {
        Self::default()
    }
}

impl<P: AlleleProjection> IntensityNormalizer<P> {
    /// Normalizer with a custom projection
    pub fn with_projection(projection: P) -> Self {
        Self { projection }
    }

    /// Fill `baf` and `lrr` with one value per sample
    ///
    /// `x` and `y` are the samples' signals, whatever space the model uses.
    pub fn compute(
        &self,
        model: &SnpModel,
        space: ClusterSpace,
        x: &[f32],
        y: &[f32],
        baf: &mut Vec<f32>,
        lrr: &mut Vec<f32>,
    ) {
        let reference = ReferencePoints::from_model(model, space);
        baf.clear();
        lrr.clear();
        for (&xi, &yi) in x.iter().zip(y) {
            let sample = ReferencePoint::from_signals(xi, yi);
            let (b, l) = self.projection.project(sample.theta, sample.r, &reference);
            baf.push(b);
            lrr.push(l);
        }
    }
}

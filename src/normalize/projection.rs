//! Mapping of a sample's (θ, R) onto B-allele frequency and log R ratio

use super::ReferencePoints;

/// Maps a sample's polar intensity onto (BAF, LRR) given the cluster
/// reference points of its marker
pub trait AlleleProjection {
    /// Returns `(baf, lrr)`
    fn project(&self, theta: f32, r: f32, reference: &ReferencePoints) -> (f32, f32);
}

/// Piecewise-linear projection between the AA, AB and BB reference points
///
/// BAF moves linearly from 0 at the AA angle to 0.5 at the AB angle and 1 at
/// the BB angle, clamped outside that range. The expected R is read off the
/// line through the two reference points enclosing the sample's angle.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearProjection;

impl AlleleProjection for LinearProjection {
    fn project(&self, theta: f32, r: f32, reference: &ReferencePoints) -> (f32, f32) {
        let (aa, ab, bb) = (reference.aa, reference.ab, reference.bb);
        if theta == ab.theta {
            (0.5, (r / ab.r).log2())
        } else if theta < ab.theta {
            let slope = (aa.r - ab.r) / (aa.theta - ab.theta);
            let expected = aa.r + (theta - aa.theta) * slope;
            let baf = if theta < aa.theta {
                0.0
            } else {
                0.5 - (ab.theta - theta) * 0.5 / (ab.theta - aa.theta)
            };
            (baf, (r / expected).log2())
        } else if theta > ab.theta {
            let slope = (ab.r - bb.r) / (ab.theta - bb.theta);
            let expected = ab.r + (theta - ab.theta) * slope;
            let baf = if theta >= bb.theta {
                1.0
            } else {
                1.0 - (bb.theta - theta) * 0.5 / (bb.theta - ab.theta)
            };
            (baf, (r / expected).log2())
        } else {
            (f32::NAN, f32::NAN)
        }
    }
}

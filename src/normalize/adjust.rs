//! Re-centering of prior cluster means on the observed calls

use crate::genotypes::Call;
use crate::models::SnpModel;

/// Pseudo-count given to the prior mean of each cluster
pub const ADJUST_PRIOR_WEIGHT: f32 = 0.2;

/// Cohorts smaller than this give unstable adjusted clusters
pub const MIN_ADJUST_SAMPLES: usize = 100;

/// Shift each cluster mean towards the samples called in that cluster
///
/// Every cluster starts from its prior mean weighted by
/// [`ADJUST_PRIOR_WEIGHT`]; each sample called AA, AB or BB adds its
/// coordinates with weight 1. The resulting weight replaces the cluster's
/// mean weight. `x`/`y` must be in the model's space: signals for Birdseed,
/// contrast/size for BRLMM-P.
pub fn adjust_clusters(model: &SnpModel, calls: &[Call], x: &[f32], y: &[f32]) -> SnpModel {
    let mut adjusted = model.clone();
    for call in [Call::AA, Call::AB, Call::BB] {
        let Some(cluster) = adjusted.cluster_mut(call) else {
            continue;
        };
        let mut weight = ADJUST_PRIOR_WEIGHT;
        let mut sum_x = cluster.mean_x * ADJUST_PRIOR_WEIGHT;
        let mut sum_y = cluster.mean_y * ADJUST_PRIOR_WEIGHT;
        for ((&c, &xi), &yi) in calls.iter().zip(x).zip(y) {
            if c == call {
                weight += 1.0;
                sum_x += xi;
                sum_y += yi;
            }
        }
        cluster.mean_x = sum_x / weight;
        cluster.mean_y = sum_y / weight;
        cluster.mean_weight = weight;
    }
    adjusted
}

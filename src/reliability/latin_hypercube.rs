//! Latin hypercube sampling.
//!
//! Each dimension is cut into `minimum_samples` equiprobable strata; every
//! stratum is sampled once and the strata are paired across dimensions by
//! independent random permutations. Accounting as in crude Monte Carlo.

use limitstate_core::standard_normal::u_from_p_unchecked;

use super::design_point::DesignPoint;
use super::sampling::FailureEstimate;
use crate::error::ModelError;
use crate::model::ZModel;
use crate::settings::ReliabilitySettings;

pub const IDENTIFIER: &str = "Latin Hypercube";

pub fn run(model: &ZModel, settings: &ReliabilitySettings) -> Result<DesignPoint, ModelError> {
    let n = model.u_count();
    let samples = settings.minimum_samples.max(1);
    let mut rng = settings.random.generator();

    let strata: Vec<Vec<usize>> = (0..n).map(|_| rng.permutation(samples)).collect();
    let all: Vec<Vec<f64>> = (0..samples)
        .map(|i| {
            (0..n)
                .map(|d| {
                    let p = ((strata[d][i] as f64 + rng.uniform()) / samples as f64).max(f64::MIN_POSITIVE);
                    u_from_p_unchecked(p)
                })
                .collect()
        })
        .collect();

    let mut estimate = FailureEstimate::new(settings.design_point_method, n);
    for chunk in all.chunks(settings.batch_size.max(1)) {
        let z = model.z_batch(chunk)?;
        for (u, zi) in chunk.iter().zip(z) {
            estimate.add(if zi < 0.0 { 1.0 } else { 0.0 }, u);
        }
    }

    let mut point = estimate.design_point(
        model.transform(),
        IDENTIFIER,
        settings.minimum_samples,
        settings.variation_coefficient,
    );
    point.total_iterations = samples;
    Ok(point)
}

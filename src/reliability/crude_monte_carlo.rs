//! Crude Monte Carlo: i.i.d. standard normal samples, Pf = failures / samples.

use tracing::info;

use super::design_point::DesignPoint;
use super::sampling::FailureEstimate;
use crate::error::ModelError;
use crate::model::ZModel;
use crate::settings::ReliabilitySettings;

pub const IDENTIFIER: &str = "Crude Monte Carlo";

pub fn run(model: &ZModel, settings: &ReliabilitySettings) -> Result<DesignPoint, ModelError> {
    let n = model.u_count();
    let mut rng = settings.random.generator();
    let mut estimate = FailureEstimate::new(settings.design_point_method, n);

    while estimate.count() < settings.maximum_samples {
        let batch = settings
            .batch_size
            .min(settings.maximum_samples - estimate.count());
        let samples: Vec<Vec<f64>> = (0..batch).map(|_| rng.normal_vector(n)).collect();
        let z = model.z_batch(&samples)?;
        for (u, zi) in samples.iter().zip(z) {
            estimate.add(if zi < 0.0 { 1.0 } else { 0.0 }, u);
        }
        if estimate.is_converged(settings.minimum_samples, settings.variation_coefficient) {
            break;
        }
    }

    info!(
        samples = estimate.count(),
        failures = estimate.stats.positives(),
        "crude Monte Carlo finished"
    );
    let mut point = estimate.design_point(
        model.transform(),
        IDENTIFIER,
        settings.minimum_samples,
        settings.variation_coefficient,
    );
    point.total_iterations = estimate.count();
    Ok(point)
}

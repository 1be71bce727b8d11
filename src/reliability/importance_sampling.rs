//! Importance sampling.
//!
//! Samples are drawn from a mixture of normal densities with standard
//! deviation `variance_factor` centred on one or more points and weighted by
//! `φ(u) / h(u)`. Without an explicit centre the FORM design point is used.
//! While fewer than `fraction_failed` of the pilot samples fail, the centre
//! moves to the weighted centre of gravity of the failing samples, for at
//! most `maximum_loops` loops; the last loop produces the estimate.

use limitstate_core::constants::LOG_2PI;
use tracing::{debug, info};

use super::design_point::DesignPoint;
use super::form;
use super::sampling::FailureEstimate;
use super::start_point::u_settings;
use crate::error::ModelError;
use crate::model::ZModel;
use crate::settings::{DesignPointMethod, ReliabilitySettings};
use crate::vector::norm;

pub const IDENTIFIER: &str = "Importance Sampling";

/// Mixture of normal densities with a shared diagonal deviation.
#[derive(Debug, Clone)]
pub(crate) struct SamplingDensity {
    pub centres: Vec<Vec<f64>>,
    pub deviations: Vec<f64>,
}

impl SamplingDensity {
    pub(crate) fn sample(
        &self,
        rng: &mut limitstate_core::RandomGenerator,
        index: usize,
    ) -> Vec<f64> {
        let centre = &self.centres[index % self.centres.len()];
        centre
            .iter()
            .zip(&self.deviations)
            .map(|(c, s)| c + s * rng.standard_normal())
            .collect()
    }

    /// `φ(u) / h(u)`, evaluated in log space.
    pub(crate) fn weight(&self, u: &[f64]) -> f64 {
        let n = u.len() as f64;
        let log_phi = -0.5 * norm(u).powi(2) - 0.5 * n * LOG_2PI;
        let log_det: f64 = self.deviations.iter().map(|s| s.ln()).sum();
        let logs: Vec<f64> = self
            .centres
            .iter()
            .map(|c| {
                let q: f64 = u
                    .iter()
                    .zip(c)
                    .zip(&self.deviations)
                    .map(|((x, m), s)| ((x - m) / s).powi(2))
                    .sum();
                -0.5 * q - log_det - 0.5 * n * LOG_2PI
            })
            .collect();
        let max = logs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let log_h = max + logs.iter().map(|l| (l - max).exp()).sum::<f64>().ln()
            - (self.centres.len() as f64).ln();
        (log_phi - log_h).exp()
    }
}

fn loop_estimate(
    model: &ZModel,
    settings: &ReliabilitySettings,
    density: &SamplingDensity,
    rng: &mut limitstate_core::RandomGenerator,
    maximum: usize,
    method: DesignPointMethod,
) -> Result<(FailureEstimate, usize), ModelError> {
    let n = model.u_count();
    let mut estimate = FailureEstimate::new(method, n);
    let mut failures = 0;
    while estimate.count() < maximum {
        let batch = settings.batch_size.min(maximum - estimate.count());
        let first = estimate.count();
        let samples: Vec<Vec<f64>> = (0..batch).map(|i| density.sample(rng, first + i)).collect();
        let weights: Vec<f64> = samples.iter().map(|u| density.weight(u)).collect();
        let z = model.z_batch(&samples)?;
        model.set_last_weights(&weights);
        for ((u, zi), w) in samples.iter().zip(z).zip(&weights) {
            if zi < 0.0 {
                failures += 1;
                estimate.add(*w, u);
            } else {
                estimate.add(0.0, u);
            }
        }
        if estimate.is_converged(settings.minimum_samples, settings.variation_coefficient) {
            break;
        }
    }
    Ok((estimate, failures))
}

pub fn run(model: &ZModel, settings: &ReliabilitySettings) -> Result<DesignPoint, ModelError> {
    let per_variable = u_settings(model.transform(), settings);
    let starts: Vec<f64> = per_variable.iter().map(|s| s.start_value).collect();
    let centre = if starts.iter().any(|&s| s != 0.0) {
        starts
    } else {
        let search = form::search(model, settings, vec![0.0; model.u_count()])?;
        debug!(beta = search.beta, "importance sampling centred on FORM design point");
        if search.u.iter().all(|v| v.is_finite()) {
            search.u
        } else {
            vec![0.0; model.u_count()]
        }
    };
    run_with_centres(model, settings, vec![centre])
}

/// Importance sampling around fixed `centres` (equally weighted mixture).
pub fn run_with_centres(
    model: &ZModel,
    settings: &ReliabilitySettings,
    centres: Vec<Vec<f64>>,
) -> Result<DesignPoint, ModelError> {
    let per_variable = u_settings(model.transform(), settings);
    let deviations: Vec<f64> = per_variable
        .iter()
        .map(|s| if s.is_variance_allowed { s.variance_factor } else { 1.0 })
        .collect();
    let adaptable = per_variable.iter().all(|s| s.is_initialization_allowed);
    let mut density = SamplingDensity { centres, deviations };
    let mut rng = settings.random.generator();
    let loops = settings.maximum_loops.max(1);

    for iteration in 1..loops {
        let pilot = settings.minimum_samples.min(settings.maximum_samples).max(1);
        let (estimate, failures) = loop_estimate(
            model,
            settings,
            &density,
            &mut rng,
            pilot,
            DesignPointMethod::CenterOfGravity,
        )?;
        let fraction = failures as f64 / estimate.count().max(1) as f64;
        debug!(iteration, fraction, "importance sampling pilot loop");
        if fraction >= settings.fraction_failed || !adaptable {
            break;
        }
        match estimate.collector.centre_of_gravity() {
            Some(centre) => density.centres = vec![centre],
            None => {
                for c in density.centres.iter_mut() {
                    c.iter_mut().for_each(|v| *v *= 1.5);
                }
            }
        }
    }

    let (estimate, _) = loop_estimate(
        model,
        settings,
        &density,
        &mut rng,
        settings.maximum_samples,
        settings.design_point_method,
    )?;
    info!(
        samples = estimate.count(),
        pf = estimate.probability(),
        cov = estimate.variation_coefficient(),
        "importance sampling finished"
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_is_one_for_standard_density() {
        let density = SamplingDensity {
            centres: vec![vec![0.0, 0.0]],
            deviations: vec![1.0, 1.0],
        };
        assert!((density.weight(&[0.3, -1.2]) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_shifted_weight() {
        let density = SamplingDensity {
            centres: vec![vec![2.0]],
            deviations: vec![1.0],
        };
        // φ(u) / φ(u - 2) = exp(-2u + 2)
        let u = 1.5;
        assert!((density.weight(&[u]) - (-2.0 * u + 2.0f64).exp()).abs() < 1e-12);
    }
}

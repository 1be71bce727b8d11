//! Directional sampling.
//!
//! Directions are drawn uniformly on the unit sphere. Along each direction
//! the distance r to the limit state is found by a line search; since |u|²
//! is χ²-distributed with n degrees of freedom, the direction contributes
//! `P(χ²_n > r²)` to the failure probability (or `P(χ²_n < r²)` when the
//! origin itself fails). The estimate is the mean over directions.

use statrs::function::gamma::{checked_gamma_lr, checked_gamma_ur};
use tracing::info;

use super::design_point::DesignPoint;
use super::sampling::FailureEstimate;
use super::search::ray_roots;
use crate::error::ModelError;
use crate::model::ZModel;
use crate::settings::ReliabilitySettings;
use crate::vector::scale;

pub const IDENTIFIER: &str = "Directional Sampling";

/// Probability mass beyond radius `r` in `n` dimensions.
pub fn chi_exceedance(n: usize, r: f64) -> f64 {
    if r <= 0.0 {
        return 1.0;
    }
    checked_gamma_ur(0.5 * n as f64, 0.5 * r * r).unwrap_or(f64::NAN)
}

/// Probability mass within radius `r` in `n` dimensions.
pub fn chi_non_exceedance(n: usize, r: f64) -> f64 {
    if r <= 0.0 {
        return 0.0;
    }
    checked_gamma_lr(0.5 * n as f64, 0.5 * r * r).unwrap_or(f64::NAN)
}

pub fn run(model: &ZModel, settings: &ReliabilitySettings) -> Result<DesignPoint, ModelError> {
    let n = model.u_count();
    let z0 = model.z(&vec![0.0; n])?;
    let origin_fails = z0 <= 0.0;
    let mut rng = settings.random.generator();
    let mut estimate = FailureEstimate::new(settings.design_point_method, n);

    while estimate.count() < settings.maximum_directions {
        let batch = settings
            .batch_size
            .min(settings.maximum_directions - estimate.count());
        let directions: Vec<Vec<f64>> = (0..batch).map(|_| rng.unit_direction(n)).collect();
        let roots = ray_roots(
            model,
            &directions,
            z0,
            settings.du,
            settings.maximum_length,
            settings.epsilon_u,
        )?;
        for (direction, root) in directions.iter().zip(roots) {
            let (p, r) = match (root, origin_fails) {
                (Some(r), false) => (chi_exceedance(n, r), r),
                (None, false) => (0.0, settings.maximum_length),
                (Some(r), true) => (chi_non_exceedance(n, r), r),
                (None, true) => (1.0, 0.0),
            };
            estimate.add(p, &scale(direction, r));
        }
        if estimate.is_converged(settings.minimum_directions, settings.variation_coefficient) {
            break;
        }
    }

    info!(
        directions = estimate.count(),
        pf = estimate.probability(),
        cov = estimate.variation_coefficient(),
        "directional sampling finished"
    );
    let mut point = estimate.design_point(
        model.transform(),
        IDENTIFIER,
        settings.minimum_directions,
        settings.variation_coefficient,
    );
    point.total_directions = estimate.count();
    Ok(point)
}

#[cfg(test)]
mod tests {
    use super::*;
    use limitstate_core::standard_normal::q_from_u;

    #[test]
    fn test_chi_exceedance_in_one_dimension() {
        // one dimension: P(|u| > r) = 2 Q(r)
        let r = 1.7;
        assert!((chi_exceedance(1, r) - 2.0 * q_from_u(r)).abs() < 1e-9);
        assert!((chi_exceedance(3, r) + chi_non_exceedance(3, r) - 1.0).abs() < 1e-9);
        assert_eq!(chi_exceedance(2, 0.0), 1.0);
    }
}

//! Starting points of the FORM search.

use limitstate_core::SpaceTransform;
use tracing::debug;

use super::gradient::gradient;
use super::search::ray_roots;
use crate::error::ModelError;
use crate::model::ZModel;
use crate::settings::{ReliabilitySettings, StartMethod, StochastSettings};
use crate::vector::{norm, normalize, scale};

/// Sign patterns are enumerated up to this dimension; above it the sphere
/// search falls back to the axes and the main diagonals.
const MAX_QUADRANT_DIMENSION: usize = 10;

/// Per u-coordinate settings, looked up through the owning variable.
pub(crate) fn u_settings(
    transform: &SpaceTransform,
    settings: &ReliabilitySettings,
) -> Vec<StochastSettings> {
    transform
        .u_dimensions()
        .iter()
        .map(|&d| settings.stochast_settings_for(transform.variable(d).id()))
        .collect()
}

/// Starting points for `settings.start_method`.
///
/// Every method yields one point except the sphere search, which yields one
/// per direction found failing on the first failing sphere.
pub fn start_points(
    model: &ZModel,
    settings: &ReliabilitySettings,
) -> Result<Vec<Vec<f64>>, ModelError> {
    let n = model.u_count();
    let fixed: Vec<f64> = u_settings(model.transform(), settings)
        .iter()
        .map(|s| s.start_value)
        .collect();
    match settings.start_method {
        StartMethod::FixedValue => Ok(vec![fixed]),
        StartMethod::One => Ok(vec![vec![1.0; n]]),
        StartMethod::RaySearch => {
            let direction = normalize(&fixed).unwrap_or_else(|| vec![1.0 / (n as f64).sqrt(); n]);
            let z0 = model.z(&vec![0.0; n])?;
            let roots = ray_roots(
                model,
                std::slice::from_ref(&direction),
                z0,
                settings.du,
                settings.maximum_length,
                settings.epsilon_u,
            )?;
            let r = roots[0].unwrap_or(1.0);
            debug!(radius = r, "ray search start");
            Ok(vec![scale(&direction, r)])
        }
        StartMethod::SphereSearch => sphere_search(model, settings),
        StartMethod::SensitivitySearch => {
            let origin = vec![0.0; n];
            let g = gradient(model, &origin, settings.gradient_type, settings.gradient_step)?;
            let length = norm(&g.gradient);
            if length == 0.0 || !length.is_finite() {
                return Ok(vec![origin]);
            }
            // one linearized step from the origin
            let beta = g.z / length;
            Ok(vec![scale(&g.gradient, -beta / length)])
        }
    }
}

fn sphere_directions(n: usize, all_quadrants: bool) -> Vec<Vec<f64>> {
    let mut directions = Vec::new();
    for i in 0..n {
        for sign in [1.0, -1.0] {
            let mut d = vec![0.0; n];
            d[i] = sign;
            directions.push(d);
        }
    }
    if n < 2 {
        return directions;
    }
    let diagonal = 1.0 / (n as f64).sqrt();
    if all_quadrants && n <= MAX_QUADRANT_DIMENSION {
        for pattern in 0..(1u32 << n) {
            directions.push(
                (0..n)
                    .map(|i| if pattern & (1 << i) == 0 { diagonal } else { -diagonal })
                    .collect(),
            );
        }
    } else {
        directions.push(vec![diagonal; n]);
        directions.push(vec![-diagonal; n]);
    }
    directions
}

fn sphere_search(model: &ZModel, settings: &ReliabilitySettings) -> Result<Vec<Vec<f64>>, ModelError> {
    let n = model.u_count();
    let z0 = model.z(&vec![0.0; n])?;
    let directions = sphere_directions(n, settings.all_quadrants);
    let mut most_critical = (f64::INFINITY, vec![0.0; n]);
    for step in 1..=settings.max_steps_sphere_search.max(1) {
        let radius = step as f64;
        let probes: Vec<Vec<f64>> = directions.iter().map(|d| scale(d, radius)).collect();
        let z = model.z_batch(&probes)?;
        let failing: Vec<Vec<f64>> = probes
            .iter()
            .zip(&z)
            .filter(|(_, &zi)| (zi <= 0.0) != (z0 <= 0.0))
            .map(|(p, _)| p.clone())
            .collect();
        if !failing.is_empty() {
            debug!(radius, candidates = failing.len(), "sphere search found failing directions");
            return Ok(failing);
        }
        for (p, &zi) in probes.iter().zip(&z) {
            if zi.abs() < most_critical.0 {
                most_critical = (zi.abs(), p.clone());
            }
        }
    }
    Ok(vec![most_critical.1])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_directions() {
        assert_eq!(sphere_directions(1, true).len(), 2);
        assert_eq!(sphere_directions(3, false).len(), 8);
        assert_eq!(sphere_directions(3, true).len(), 14);
        for d in sphere_directions(4, true) {
            assert!((norm(&d) - 1.0).abs() < 1e-12);
        }
    }
}

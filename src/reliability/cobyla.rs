//! Derivative-free design point search.
//!
//! Minimizes |u| subject to z(u) = 0 in the manner of COBYLA: z is
//! modelled by the linear interpolant through a simplex of n + 1 evaluated
//! points, the next point is the point of the interpolated surface nearest
//! to the origin, limited to a trust radius around the best vertex, and
//! the radius halves whenever a step fails to improve the merit function
//! `|u| + μ·|z| / |∇z|` with `μ > 1`, so that moving toward the surface
//! along the gradient always pays. No finite-difference gradients are
//! taken. A search that stops short of the surface reports the root of z
//! along the ray through its best point.

use limitstate_core::constants::BETA_MAX;
use nalgebra::{DMatrix, DVector};
use tracing::{debug, info};

use super::design_point::DesignPoint;
use super::search::ray_roots;
use crate::error::ModelError;
use crate::model::ZModel;
use crate::settings::ReliabilitySettings;
use crate::vector::{distance, dot, norm, normalize, scale};

pub const IDENTIFIER: &str = "Cobyla";

const INITIAL_RADIUS: f64 = 1.0;

/// Penalty on the distance to the interpolated surface.
const PENALTY: f64 = 2.0;

/// Merit of a point given the current interpolant slope.
fn merit(u: &[f64], z: f64, g: &[f64]) -> f64 {
    let slope = norm(g).max(1e-12);
    norm(u) + PENALTY * z.abs() / slope
}

/// Linear interpolant `z ≈ c + g·u` through the simplex.
fn interpolate(points: &[Vec<f64>], values: &[f64]) -> Option<(f64, Vec<f64>)> {
    let n = points.len() - 1;
    let base = &points[0];
    let a = DMatrix::from_fn(n, n, |i, j| points[i + 1][j] - base[j]);
    let b = DVector::from_fn(n, |i, _| values[i + 1] - values[0]);
    let g = a.lu().solve(&b)?;
    let g: Vec<f64> = g.iter().copied().collect();
    Some((values[0] - dot(&g, base), g))
}

pub fn run(model: &ZModel, settings: &ReliabilitySettings) -> Result<DesignPoint, ModelError> {
    let n = model.u_count();
    let start = vec![0.0; n];
    let mut points = vec![start.clone()];
    for i in 0..n {
        let mut p = start.clone();
        p[i] += INITIAL_RADIUS;
        points.push(p);
    }
    let mut values = model.z_batch(&points)?;
    let z_origin = values[0];
    let origin_safe = z_origin > 0.0;

    let mut radius = INITIAL_RADIUS;
    let mut iterations = 0;
    let mut converged = false;
    let mut best = 0;
    let mut residual = f64::INFINITY;
    let max_iterations = settings.maximum_iterations.max(1) * (n + 1);

    while iterations < max_iterations {
        iterations += 1;
        let Some((c, g)) = interpolate(&points, &values) else {
            debug!(iterations, "degenerate simplex, restarting around best vertex");
            let centre = points[best].clone();
            points.truncate(1);
            points[0] = centre.clone();
            let z_centre = values[best];
            values = vec![z_centre];
            let mut probes = Vec::with_capacity(n);
            for i in 0..n {
                let mut p = centre.clone();
                p[i] += radius;
                probes.push(p);
            }
            values.extend(model.z_batch(&probes)?);
            points.extend(probes);
            best = 0;
            continue;
        };
        let slope = norm(&g);
        if slope == 0.0 || !slope.is_finite() {
            break;
        }

        let current = &points[best];
        // nearest point of the linear surface c + g·u = 0
        let target = scale(&g, -c / (slope * slope));
        let step = distance(&target, current);
        let candidate: Vec<f64> = if step > radius {
            current
                .iter()
                .zip(&target)
                .map(|(a, b)| a + (b - a) * radius / step)
                .collect()
        } else {
            target
        };

        let z = model.z(&candidate)?;
        residual = z.abs() / slope;
        let improved = merit(&candidate, z, &g) < merit(&points[best], values[best], &g);

        // replace the vertex farthest from the candidate, keeping the best
        let farthest = (0..points.len())
            .filter(|&a| a != best)
            .max_by(|&a, &b| {
                distance(&points[a], &candidate).total_cmp(&distance(&points[b], &candidate))
            })
            .unwrap_or(best);
        points[farthest] = candidate;
        values[farthest] = z;
        if improved {
            best = farthest;
        } else {
            radius *= 0.5;
        }
        best = (0..points.len())
            .min_by(|&a, &b| {
                merit(&points[a], values[a], &g).total_cmp(&merit(&points[b], values[b], &g))
            })
            .unwrap_or(best);

        if (step < settings.epsilon_beta || radius < settings.epsilon_u)
            && residual < settings.epsilon_beta
        {
            converged = true;
            break;
        }
        if radius < 1e-8 {
            break;
        }
    }

    let mut u = points[best].clone();
    if !converged {
        if let Some(surface) = surface_along_ray(model, &u, z_origin, settings)? {
            debug!(from = norm(&u), to = norm(&surface), "search stopped off the surface");
            residual = 0.0;
            u = surface;
        }
    }
    let sign = if origin_safe { 1.0 } else { -1.0 };
    let beta = (sign * norm(&u)).clamp(-BETA_MAX, BETA_MAX);
    info!(beta, iterations, converged, "cobyla search finished");
    let mut point = DesignPoint::at(model.transform(), IDENTIFIER, beta, &u)
        .with_convergence(residual, converged);
    point.total_iterations = iterations;
    Ok(point)
}

/// Point where z changes sign on the ray from the origin through `u`.
fn surface_along_ray(
    model: &ZModel,
    u: &[f64],
    z_origin: f64,
    settings: &ReliabilitySettings,
) -> Result<Option<Vec<f64>>, ModelError> {
    let Some(direction) = normalize(u) else {
        return Ok(None);
    };
    let roots = ray_roots(
        model,
        std::slice::from_ref(&direction),
        z_origin,
        settings.du,
        settings.maximum_length,
        settings.epsilon_u,
    )?;
    Ok(roots[0].map(|r| scale(&direction, r)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolate_plane() {
        let points = vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0]];
        let values: Vec<f64> = points.iter().map(|p| 3.0 - 2.0 * p[0] + p[1]).collect();
        let (c, g) = interpolate(&points, &values).unwrap();
        assert!((c - 3.0).abs() < 1e-12);
        assert!((g[0] + 2.0).abs() < 1e-12);
        assert!((g[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_step_toward_linear_surface_improves_merit() {
        // z = 3 - a - b, stepping from (1, 0) toward the nearest surface point
        let g = [-1.0, -1.0];
        let z = |u: &[f64]| 3.0 - u[0] - u[1];
        let from = [1.0, 0.0];
        let to = [1.316, 0.949];
        assert!(merit(&to, z(&to), &g) < merit(&from, z(&from), &g));
        let surface = [1.5, 1.5];
        assert!(merit(&surface, z(&surface), &g) < merit(&to, z(&to), &g));
    }
}

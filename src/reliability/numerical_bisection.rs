//! Numerical bisection: adaptive cell refinement of u-space.
//!
//! The box spanned by the `min_value`/`max_value` settings starts as one
//! cell. z is evaluated at the corners of every cell; a cell whose corners
//! all fail counts as failing, one whose corners are all safe as safe, and
//! a mixed cell is split in half along its widest dimension (in
//! probability). Failing cells give a lower bound on Pf, failing plus mixed
//! cells plus the mass outside the box an upper bound. Refinement stops when
//! both bounds give reliability indices closer than `epsilon_beta`.

use std::collections::HashMap;

use limitstate_core::constants::BETA_MAX;
use limitstate_core::standard_normal::{p_from_u, u_from_q_unchecked};
use tracing::debug;

use super::design_point::{DesignPoint, DirectionCollector};
use super::start_point::u_settings;
use crate::error::ModelError;
use crate::model::ZModel;
use crate::settings::ReliabilitySettings;

pub const IDENTIFIER: &str = "Numerical Bisection";

/// Stochastic dimensions supported (corners grow as 2ⁿ).
pub const MAX_DIMENSION: usize = 10;

/// Mixed cells beyond which refinement stops.
const MAX_CELLS: usize = 200_000;

/// Mixed cells lighter than this are not split further.
const NEGLIGIBLE_PROBABILITY: f64 = 1e-15;

#[derive(Debug, Clone)]
struct Cell {
    lo: Vec<f64>,
    hi: Vec<f64>,
}

impl Cell {
    fn probability(&self) -> f64 {
        self.lo
            .iter()
            .zip(&self.hi)
            .map(|(&a, &b)| p_from_u(b) - p_from_u(a))
            .product()
    }

    fn centre(&self) -> Vec<f64> {
        self.lo.iter().zip(&self.hi).map(|(a, b)| 0.5 * (a + b)).collect()
    }

    fn corners(&self) -> Vec<Vec<f64>> {
        let n = self.lo.len();
        (0..(1usize << n))
            .map(|pattern| {
                (0..n)
                    .map(|d| if pattern & (1 << d) == 0 { self.lo[d] } else { self.hi[d] })
                    .collect()
            })
            .collect()
    }

    fn split(&self) -> (Cell, Cell) {
        let widest = (0..self.lo.len())
            .max_by(|&a, &b| {
                let pa = p_from_u(self.hi[a]) - p_from_u(self.lo[a]);
                let pb = p_from_u(self.hi[b]) - p_from_u(self.lo[b]);
                pa.total_cmp(&pb)
            })
            .unwrap_or(0);
        let middle = 0.5 * (self.lo[widest] + self.hi[widest]);
        let mut left = self.clone();
        let mut right = self.clone();
        left.hi[widest] = middle;
        right.lo[widest] = middle;
        (left, right)
    }
}

fn key(u: &[f64]) -> Vec<u64> {
    u.iter().map(|v| v.to_bits()).collect()
}

fn beta_of(pf: f64) -> f64 {
    u_from_q_unchecked(pf.clamp(0.0, 1.0)).clamp(-BETA_MAX, BETA_MAX)
}

pub fn run(model: &ZModel, settings: &ReliabilitySettings) -> Result<DesignPoint, ModelError> {
    let n = model.u_count();
    let per_variable = u_settings(model.transform(), settings);
    let root = Cell {
        lo: per_variable.iter().map(|s| s.min_value).collect(),
        hi: per_variable.iter().map(|s| s.max_value).collect(),
    };
    let outside = 1.0 - root.probability();

    let mut z_cache: HashMap<Vec<u64>, f64> = HashMap::new();
    let mut failing = 0.0;
    let mut collector = DirectionCollector::new(settings.design_point_method, n);
    let mut mixed = vec![root];
    let mut iterations = 0;
    let mut converged = false;
    let mut bounds = (0.0, 1.0);

    while iterations < settings.maximum_iterations.max(1) && !mixed.is_empty() {
        iterations += 1;

        let mut pending: Vec<Vec<f64>> = Vec::new();
        for cell in &mixed {
            for corner in cell.corners() {
                let k = key(&corner);
                if !z_cache.contains_key(&k) {
                    z_cache.insert(k, f64::NAN);
                    pending.push(corner);
                }
            }
        }
        for chunk in pending.chunks(settings.batch_size.max(1)) {
            let z = model.z_batch(chunk)?;
            for (u, zi) in chunk.iter().zip(z) {
                z_cache.insert(key(u), zi);
            }
        }

        let mut next = Vec::new();
        let mut undecided = 0.0;
        for cell in mixed {
            let corners = cell.corners();
            let fails = corners
                .iter()
                .filter(|c| z_cache.get(&key(c)).is_some_and(|z| *z < 0.0))
                .count();
            let p = cell.probability();
            if fails == corners.len() {
                failing += p;
                collector.add(&cell.centre(), p);
            } else if fails == 0 {
                continue;
            } else if p < NEGLIGIBLE_PROBABILITY {
                // counted half failing, never split again
                failing += 0.5 * p;
            } else {
                undecided += p;
                let (left, right) = cell.split();
                next.push(left);
                next.push(right);
            }
        }
        mixed = next;
        bounds = (failing, failing + undecided + outside);
        let gap = (beta_of(bounds.0) - beta_of(bounds.1)).abs();
        debug!(iterations, lower = bounds.0, upper = bounds.1, cells = mixed.len(), "bisection step");

        if iterations >= settings.minimum_iterations && gap < settings.epsilon_beta {
            converged = true;
            break;
        }
        if mixed.len() > MAX_CELLS {
            break;
        }
    }
    if mixed.is_empty() {
        converged = true;
    }

    let pf = 0.5 * (bounds.0 + bounds.1);
    let beta = beta_of(pf);
    let direction = collector.direction().unwrap_or_else(|| vec![0.0; n]);
    let mut point = DesignPoint::from_direction(model.transform(), IDENTIFIER, beta, &direction)
        .with_convergence((beta_of(bounds.0) - beta_of(bounds.1)).abs(), converged);
    point.probability_failure = pf;
    point.total_iterations = iterations;
    Ok(point)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_split_and_probability() {
        let cell = Cell {
            lo: vec![-1.0, -8.0],
            hi: vec![1.0, 8.0],
        };
        assert_eq!(cell.corners().len(), 4);
        let (left, right) = cell.split();
        assert_eq!(left.hi[1], 0.0);
        assert_eq!(right.lo[1], 0.0);
        assert!((left.probability() + right.probability() - cell.probability()).abs() < 1e-15);
    }
}

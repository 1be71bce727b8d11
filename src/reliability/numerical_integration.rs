//! Numerical integration over a grid in u-space.
//!
//! Each stochastic dimension is cut into `intervals` cells between its
//! `min_value` and `max_value`; the outer cells extend to ±∞ so that the
//! cell probabilities sum to one. z is evaluated at every cell midpoint of
//! the Cartesian product (plus once at the origin) and Pf is the summed
//! probability of the failing cells.

use limitstate_core::constants::BETA_MAX;
use limitstate_core::standard_normal::{p_from_u, u_from_q_unchecked};

use super::design_point::{DesignPoint, DirectionCollector};
use super::start_point::u_settings;
use crate::error::ModelError;
use crate::model::ZModel;
use crate::settings::ReliabilitySettings;

pub const IDENTIFIER: &str = "Numerical Integration";

/// Midpoints and probabilities of the cells of one dimension.
pub(crate) fn axis_cells(min: f64, max: f64, intervals: usize) -> Vec<(f64, f64)> {
    let intervals = intervals.max(1);
    let width = (max - min) / intervals as f64;
    (0..intervals)
        .map(|i| {
            let lo = min + i as f64 * width;
            let hi = lo + width;
            let p_lo = if i == 0 { 0.0 } else { p_from_u(lo) };
            let p_hi = if i + 1 == intervals { 1.0 } else { p_from_u(hi) };
            (0.5 * (lo + hi), p_hi - p_lo)
        })
        .collect()
}

/// Number of grid points, `None` on overflow.
pub fn grid_size(intervals: &[usize]) -> Option<usize> {
    intervals
        .iter()
        .try_fold(1usize, |acc, &n| acc.checked_mul(n.max(1)))
}

pub fn run(model: &ZModel, settings: &ReliabilitySettings) -> Result<DesignPoint, ModelError> {
    let n = model.u_count();
    let axes: Vec<Vec<(f64, f64)>> = u_settings(model.transform(), settings)
        .iter()
        .map(|s| axis_cells(s.min_value, s.max_value, s.intervals))
        .collect();
    let sizes: Vec<usize> = axes.iter().map(Vec::len).collect();
    let total = grid_size(&sizes).unwrap_or(usize::MAX);

    model.z(&vec![0.0; n])?;

    let mut pf = 0.0;
    let mut collector = DirectionCollector::new(settings.design_point_method, n);
    let mut index = vec![0usize; n];
    let mut done = 0usize;
    while done < total {
        let batch = settings.batch_size.max(1).min(total - done);
        let mut points = Vec::with_capacity(batch);
        let mut probabilities = Vec::with_capacity(batch);
        for _ in 0..batch {
            points.push((0..n).map(|d| axes[d][index[d]].0).collect::<Vec<f64>>());
            probabilities.push((0..n).map(|d| axes[d][index[d]].1).product::<f64>());
            // odometer increment
            for d in (0..n).rev() {
                index[d] += 1;
                if index[d] < sizes[d] {
                    break;
                }
                index[d] = 0;
            }
        }
        let z = model.z_batch(&points)?;
        for ((u, p), zi) in points.iter().zip(&probabilities).zip(z) {
            if zi < 0.0 {
                pf += p;
                collector.add(u, *p);
            }
        }
        done += batch;
    }

    let pf = pf.clamp(0.0, 1.0);
    let beta = u_from_q_unchecked(pf).clamp(-BETA_MAX, BETA_MAX);
    let direction = collector.direction().unwrap_or_else(|| vec![0.0; n]);
    let mut point = DesignPoint::from_direction(model.transform(), IDENTIFIER, beta, &direction)
        .with_convergence(0.0, true);
    point.probability_failure = pf;
    point.total_iterations = total;
    Ok(point)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_cells_cover_all_probability() {
        let cells = axis_cells(-4.0, 4.0, 8);
        assert_eq!(cells.len(), 8);
        let total: f64 = cells.iter().map(|c| c.1).sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert!((cells[0].0 + 3.5).abs() < 1e-12);
    }

    #[test]
    fn test_grid_size() {
        assert_eq!(grid_size(&[10, 20, 3]), Some(600));
        assert_eq!(grid_size(&[usize::MAX, 2]), None);
    }
}

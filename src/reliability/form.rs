//! First-order reliability method.
//!
//! Hasofer-Lind-Rackwitz-Fiessler iteration in independent u-space: at the
//! current point the limit state is linearized, and the next point is the
//! point of the linearized surface nearest to the origin,
//!
//! ```text
//! β = (z - ∇z·u) / |∇z|,    u' = -β ∇z / |∇z|
//! ```
//!
//! The first `relaxation_loops` steps are damped by `relaxation_factor`.
//! The search converges when β changes less than `epsilon_beta` and the
//! current point lies within `epsilon_beta` of the surface. A search that
//! does not converge is restarted with the relaxation factor halved and
//! applied to every step.

use limitstate_core::constants::BETA_MAX;
use limitstate_core::ValidationMessage;
use tracing::{debug, info, warn};

use super::design_point::DesignPoint;
use super::gradient::gradient;
use super::start_point::start_points;
use crate::error::ModelError;
use crate::model::ZModel;
use crate::settings::{DesignPointMethod, ReliabilitySettings};
use crate::vector::{dot, norm, normalize, scale};

pub const IDENTIFIER: &str = "FORM";

/// Restarts with a halved relaxation factor after a failed search.
const RELAXATION_RETRIES: usize = 4;

/// Outcome of one HLRF search.
#[derive(Debug, Clone)]
pub(crate) struct Search {
    pub beta: f64,
    pub u: Vec<f64>,
    pub iterations: usize,
    pub convergence: f64,
    pub is_converged: bool,
}

pub(crate) fn search(
    model: &ZModel,
    settings: &ReliabilitySettings,
    start: Vec<f64>,
) -> Result<Search, ModelError> {
    let mut factor = settings.relaxation_factor;
    let mut result = relaxed_search(model, settings, start.clone(), factor, settings.relaxation_loops)?;
    for retry in 1..=RELAXATION_RETRIES {
        if result.is_converged || !result.beta.is_finite() {
            break;
        }
        factor *= 0.5;
        debug!(retry, factor, "FORM did not converge, restarting with stronger relaxation");
        let spent = result.iterations;
        result = relaxed_search(model, settings, start.clone(), factor, settings.maximum_iterations)?;
        result.iterations += spent;
    }
    Ok(result)
}

fn relaxed_search(
    model: &ZModel,
    settings: &ReliabilitySettings,
    start: Vec<f64>,
    relaxation_factor: f64,
    relaxation_loops: usize,
) -> Result<Search, ModelError> {
    let mut u = start;
    let mut beta_previous = f64::NAN;
    let mut result = Search {
        beta: f64::NAN,
        u: u.clone(),
        iterations: 0,
        convergence: f64::INFINITY,
        is_converged: false,
    };

    for iteration in 1..=settings.maximum_iterations.max(1) {
        let g = gradient(model, &u, settings.gradient_type, settings.gradient_step)?;
        let length = norm(&g.gradient);
        result.iterations = iteration;
        if length == 0.0 || !length.is_finite() || !g.z.is_finite() {
            warn!(iteration, "zero or invalid gradient, stopping FORM search");
            break;
        }

        let beta = ((g.z - dot(&g.gradient, &u)) / length).clamp(-BETA_MAX, BETA_MAX);
        let target = scale(&g.gradient, -beta / length);
        let residual = g.z.abs() / length;
        let step = (beta - beta_previous).abs();

        result.beta = beta;
        result.u = target.clone();
        result.convergence = if step.is_nan() { residual } else { step.max(residual) };
        debug!(iteration, beta, residual, "FORM iteration");

        if iteration >= settings.minimum_iterations.min(settings.maximum_iterations)
            && step < settings.epsilon_beta
            && residual < settings.epsilon_beta
        {
            result.is_converged = true;
            break;
        }

        u = if iteration <= relaxation_loops {
            u.iter()
                .zip(&target)
                .map(|(a, b)| a + relaxation_factor * (b - a))
                .collect()
        } else {
            target
        };
        beta_previous = beta;
    }
    Ok(result)
}

/// Run FORM from every start point and report one design point.
///
/// With several start points each converged search becomes a contributing
/// design point; `design_point_method` selects the reported one: the
/// smallest β for `nearest_to_mean`, or the probability-weighted mean
/// direction (of points or of unit directions) at the smallest β.
pub fn run(model: &ZModel, settings: &ReliabilitySettings) -> Result<DesignPoint, ModelError> {
    let starts = start_points(model, settings)?;
    run_from(model, settings, starts)
}

pub(crate) fn run_from(
    model: &ZModel,
    settings: &ReliabilitySettings,
    starts: Vec<Vec<f64>>,
) -> Result<DesignPoint, ModelError> {
    let transform = model.transform();
    let mut searches = Vec::with_capacity(starts.len());
    for start in starts {
        searches.push(search(model, settings, start)?);
    }

    let to_point = |s: &Search| {
        let mut point = DesignPoint::at(transform, IDENTIFIER, s.beta, &s.u)
            .with_convergence(s.convergence, s.is_converged);
        point.total_iterations = s.iterations;
        if !s.is_converged {
            point.messages.push(ValidationMessage::warning(
                IDENTIFIER,
                format!("no convergence after {} iterations", s.iterations),
            ));
        }
        point
    };

    let best = searches
        .iter()
        .filter(|s| s.beta.is_finite())
        .min_by(|a, b| a.beta.total_cmp(&b.beta))
        .or(searches.first())
        .cloned();
    let Some(best) = best else {
        return Ok(DesignPoint::at(transform, IDENTIFIER, f64::NAN, &vec![0.0; model.u_count()]));
    };

    let mut point = if searches.len() == 1 || settings.design_point_method == DesignPointMethod::NearestToMean {
        to_point(&best)
    } else {
        let mut sum = vec![0.0; model.u_count()];
        for s in searches.iter().filter(|s| s.beta.is_finite()) {
            let weight = limitstate_core::standard_normal::q_from_u(s.beta);
            let v = match settings.design_point_method {
                DesignPointMethod::CenterOfAngles => normalize(&s.u).unwrap_or_else(|| s.u.clone()),
                _ => s.u.clone(),
            };
            for (a, b) in sum.iter_mut().zip(&v) {
                *a += weight * b;
            }
        }
        let direction = normalize(&sum).unwrap_or_else(|| best.u.clone());
        let mut point = DesignPoint::from_direction(transform, IDENTIFIER, best.beta, &direction)
            .with_convergence(best.convergence, best.is_converged);
        point.total_iterations = searches.iter().map(|s| s.iterations).sum();
        point
    };

    if searches.len() > 1 {
        point.contributing_design_points = searches.iter().map(to_point).collect();
    }
    info!(beta = point.reliability_index, converged = point.is_converged, "FORM finished");
    Ok(point)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FnModel, ModelAdapter, Response};
    use limitstate_core::{SpaceTransform, Stochast};

    #[test]
    fn test_linear_normal_is_exact() {
        // z = 10 - a - b with a, b ~ N(0, 1): β = 10 / √2
        let transform = SpaceTransform::independent(vec![
            Stochast::normal("a", 0.0, 1.0),
            Stochast::normal("b", 0.0, 1.0),
        ])
        .unwrap();
        let adapter = ModelAdapter::new(FnModel::scalar(&["a", "b"], |x| 10.0 - x[0] - x[1]));
        let model = ZModel::new(&transform, &adapter, Response::Output(0), false);
        let point = run(&model, &ReliabilitySettings::default()).unwrap();
        assert!(point.is_converged);
        assert!((point.reliability_index - 10.0 / 2f64.sqrt()).abs() < 1e-6);
        assert!((point.alphas[0].alpha + 0.5f64.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn test_origin_in_failure_gives_negative_beta() {
        let transform = SpaceTransform::independent(vec![Stochast::normal("a", 0.0, 1.0)]).unwrap();
        let adapter = ModelAdapter::new(FnModel::scalar(&["a"], |x| x[0] - 1.0));
        let model = ZModel::new(&transform, &adapter, Response::Output(0), false);
        let point = run(&model, &ReliabilitySettings::default()).unwrap();
        assert!((point.reliability_index + 1.0).abs() < 1e-6);
        assert!((point.alphas[0].u - 1.0).abs() < 1e-6);
        assert!((point.alphas[0].alpha - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_oscillating_start_converges_after_relaxation() {
        // z = 1.8 - (a + b) with a, b ~ U(-1, 1), started off the diagonal
        let transform = SpaceTransform::independent(vec![
            Stochast::uniform("a", -1.0, 1.0),
            Stochast::uniform("b", -1.0, 1.0),
        ])
        .unwrap();
        let adapter = ModelAdapter::new(FnModel::scalar(&["a", "b"], |x| 1.8 - x[0] - x[1]));
        let model = ZModel::new(&transform, &adapter, Response::Output(0), false);
        let settings = ReliabilitySettings::default();
        let search = search(&model, &settings, vec![1.59, 0.41]).unwrap();
        assert!(search.is_converged, "{search:?}");
        assert!((search.beta - 2.33).abs() < 0.02, "beta {}", search.beta);
    }
}

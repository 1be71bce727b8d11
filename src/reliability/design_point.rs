//! Results of a reliability run.

use limitstate_core::standard_normal::{q_from_u, u_from_q_unchecked};
use limitstate_core::{DistributionType, SpaceTransform, Stochast, StochastId, ValidationMessage};
use serde::Serialize;

use crate::settings::DesignPointMethod;
use crate::vector::{norm, normalize, scale};

/// Sensitivity of the design point to one scalar input dimension.
#[derive(Debug, Clone, Serialize)]
pub struct Alpha {
    /// Owning variable (shares its identity with the project's variable).
    #[serde(skip)]
    pub variable: Stochast,
    pub name: String,
    /// Position within an array variable, 0 for scalars.
    pub index: usize,
    /// Direction cosine in independent u-space.
    pub alpha: f64,
    /// Direction cosine in correlated standard normal space.
    pub alpha_correlated: f64,
    /// Physical value at the design point.
    pub x: f64,
    /// Independent standard normal value at the design point.
    pub u: f64,
}

impl Alpha {
    /// Share of the failure probability explained by this dimension.
    pub fn influence_factor(&self) -> f64 {
        self.alpha * self.alpha
    }
}

/// One model evaluation recorded during a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Realization {
    pub iteration: usize,
    pub z: f64,
    /// Distance of the sample to the origin in u-space.
    pub beta: f64,
    pub weight: f64,
    pub input_values: Vec<f64>,
    pub output_values: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DesignPoint {
    /// Method that produced the point.
    pub identifier: String,
    pub reliability_index: f64,
    pub probability_failure: f64,
    /// Achieved precision: coefficient of variation of the Pf estimate for
    /// sampling methods, last β step or residual for searches.
    pub convergence: f64,
    pub is_converged: bool,
    pub total_directions: usize,
    pub total_iterations: usize,
    pub total_model_runs: usize,
    pub alphas: Vec<Alpha>,
    pub contributing_design_points: Vec<DesignPoint>,
    pub realizations: Vec<Realization>,
    pub messages: Vec<ValidationMessage>,
}

impl DesignPoint {
    /// Design point at `u_star` with reliability index `beta`.
    ///
    /// Alphas are the unit vector from `u_star` back to the origin, so that
    /// `u = -β·α` holds for a point at distance β on the failure side.
    pub fn at(
        transform: &SpaceTransform,
        identifier: impl Into<String>,
        beta: f64,
        u_star: &[f64],
    ) -> Self {
        let towards_origin = |v: &[f64]| {
            normalize(v).map_or_else(|| vec![0.0; v.len()], |d| scale(&d, -1.0))
        };
        let mut alpha_u = towards_origin(u_star);
        let mut alpha_z = towards_origin(&transform.correlate(u_star));
        if beta < 0.0 {
            alpha_u = scale(&alpha_u, -1.0);
            alpha_z = scale(&alpha_z, -1.0);
        }
        let x = transform.x_from_u(u_star);

        let alphas = transform
            .dimensions()
            .iter()
            .enumerate()
            .map(|(d, dimension)| {
                let variable = transform.variable(d);
                let (alpha, alpha_correlated, u) = match dimension.u_index {
                    Some(k) => (alpha_u[k], alpha_z[k], u_star[k]),
                    None => (0.0, 0.0, 0.0),
                };
                Alpha {
                    variable: variable.clone(),
                    name: variable.name().to_string(),
                    index: dimension.index,
                    alpha,
                    alpha_correlated,
                    x: x[d],
                    u,
                }
            })
            .collect();

        let mut point = Self::new(identifier, beta);
        point.alphas = alphas;
        point
    }

    /// Design point without alphas.
    pub fn new(identifier: impl Into<String>, beta: f64) -> Self {
        Self {
            identifier: identifier.into(),
            reliability_index: beta,
            probability_failure: q_from_u(beta),
            convergence: f64::NAN,
            is_converged: false,
            total_directions: 0,
            total_iterations: 0,
            total_model_runs: 0,
            alphas: Vec::new(),
            contributing_design_points: Vec::new(),
            realizations: Vec::new(),
            messages: Vec::new(),
        }
    }

    /// Design point at distance `beta` along the failure direction `direction`.
    pub fn from_direction(
        transform: &SpaceTransform,
        identifier: impl Into<String>,
        beta: f64,
        direction: &[f64],
    ) -> Self {
        let unit = normalize(direction).unwrap_or_else(|| vec![0.0; direction.len()]);
        Self::at(transform, identifier, beta, &scale(&unit, beta.abs()))
    }

    /// Design point with only a failure probability (no direction known).
    pub fn from_probability(
        transform: &SpaceTransform,
        identifier: impl Into<String>,
        probability_failure: f64,
        direction: &[f64],
    ) -> Self {
        let beta = u_from_q_unchecked(probability_failure);
        let mut point = Self::from_direction(transform, identifier, beta, direction);
        point.probability_failure = probability_failure;
        point
    }

    pub fn with_convergence(mut self, convergence: f64, is_converged: bool) -> Self {
        self.convergence = convergence;
        self.is_converged = is_converged;
        self
    }

    pub fn with_counters(mut self, iterations: usize, directions: usize, model_runs: usize) -> Self {
        self.total_iterations = iterations;
        self.total_directions = directions;
        self.total_model_runs = model_runs;
        self
    }

    /// The design point in u-space, one entry per stochastic dimension.
    pub fn u_vector(&self) -> Vec<f64> {
        self.alphas
            .iter()
            .filter(|a| a.variable.element(a.index).distribution() != DistributionType::Deterministic)
            .map(|a| a.u)
            .collect()
    }

    /// Alphas of one variable (several for arrays).
    pub fn alphas_of(&self, variable: impl Into<StochastId>) -> impl Iterator<Item = &Alpha> {
        let id = variable.into();
        self.alphas.iter().filter(move |a| a.variable.id() == id)
    }

    pub fn alpha(&self, variable: impl Into<StochastId>) -> Option<&Alpha> {
        self.alphas_of(variable).next()
    }

    /// Σα² over all dimensions, 1 for a proper design point.
    pub fn alpha_norm(&self) -> f64 {
        norm(&self.alphas.iter().map(|a| a.alpha).collect::<Vec<_>>())
    }
}

/// Accumulates failing samples and reduces them to one failure direction
/// according to a [`DesignPointMethod`].
#[derive(Debug, Clone)]
pub struct DirectionCollector {
    method: DesignPointMethod,
    sum: Vec<f64>,
    gravity: Vec<f64>,
    total_weight: f64,
    nearest: Option<(f64, Vec<f64>)>,
}

impl DirectionCollector {
    pub fn new(method: DesignPointMethod, dimension: usize) -> Self {
        Self {
            method,
            sum: vec![0.0; dimension],
            gravity: vec![0.0; dimension],
            total_weight: 0.0,
            nearest: None,
        }
    }

    /// Add a failing u-vector with its estimator weight.
    pub fn add(&mut self, u: &[f64], weight: f64) {
        if !(weight > 0.0) {
            return;
        }
        let r = norm(u);
        for (g, v) in self.gravity.iter_mut().zip(u) {
            *g += weight * v;
        }
        match self.method {
            DesignPointMethod::NearestToMean => {
                if self.nearest.as_ref().map_or(true, |(best, _)| r < *best) {
                    self.nearest = Some((r, u.to_vec()));
                }
            }
            DesignPointMethod::CenterOfGravity => {
                for (s, v) in self.sum.iter_mut().zip(u) {
                    *s += weight * v;
                }
            }
            DesignPointMethod::CenterOfAngles => {
                if r > 0.0 {
                    for (s, v) in self.sum.iter_mut().zip(u) {
                        *s += weight * v / r;
                    }
                }
            }
        }
        self.total_weight += weight;
    }

    pub fn is_empty(&self) -> bool {
        self.total_weight == 0.0
    }

    /// Weighted mean of the failing samples.
    pub fn centre_of_gravity(&self) -> Option<Vec<f64>> {
        (self.total_weight > 0.0).then(|| scale(&self.gravity, 1.0 / self.total_weight))
    }

    /// Unit failure direction, or `None` when nothing failed.
    pub fn direction(&self) -> Option<Vec<f64>> {
        match self.method {
            DesignPointMethod::NearestToMean => self.nearest.as_ref().and_then(|(_, u)| normalize(u)),
            _ => normalize(&self.sum),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alphas_point_back_to_origin() {
        let transform = SpaceTransform::independent(vec![
            Stochast::normal("a", 0.0, 1.0),
            Stochast::deterministic("c", 2.0),
            Stochast::normal("b", 0.0, 1.0),
        ])
        .unwrap();
        let point = DesignPoint::at(&transform, "test", 5.0, &[3.0, 4.0]);
        assert_eq!(point.alphas.len(), 3);
        assert!((point.alphas[0].alpha + 0.6).abs() < 1e-12);
        assert_eq!(point.alphas[1].alpha, 0.0);
        assert_eq!(point.alphas[1].x, 2.0);
        assert!((point.alphas[2].alpha + 0.8).abs() < 1e-12);
        assert!((point.alpha_norm() - 1.0).abs() < 1e-12);
        assert_eq!(point.u_vector(), vec![3.0, 4.0]);
        assert!((point.probability_failure - q_from_u(5.0)).abs() < 1e-20);
    }

    #[test]
    fn test_collector_methods() {
        let mut gravity = DirectionCollector::new(DesignPointMethod::CenterOfGravity, 2);
        let mut nearest = DirectionCollector::new(DesignPointMethod::NearestToMean, 2);
        for (u, w) in [(vec![3.0, 0.0], 1.0), (vec![0.0, 2.0], 1.0)] {
            gravity.add(&u, w);
            nearest.add(&u, w);
        }
        let g = gravity.direction().unwrap();
        assert!((g[0] - 0.8320502943378437).abs() < 1e-12);
        assert_eq!(nearest.direction().unwrap(), vec![0.0, 1.0]);
        assert!(DirectionCollector::new(DesignPointMethod::CenterOfAngles, 2)
            .direction()
            .is_none());
    }
}

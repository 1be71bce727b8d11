//! Combination of design points into one system design point.
//!
//! Each design point is linearised as `z_s = β_s + α_s · u`. Series systems
//! fail when any mode fails (`z = min z_s`), parallel systems when all do
//! (`z = max z_s`). A variable shared by several modes is correlated
//! across them: fully by default, partially when its self-correlation is
//! set. The correlation matrix of every variable is factored into
//! independent standard normal axes, the system limit state is solved on
//! those axes by directional or importance sampling, and the axis alphas
//! are folded back onto the original variables.

mod length_effect;

pub use length_effect::LengthEffectProject;

use std::sync::Arc;

use limitstate_core::{
    DistributionType, SelfCorrelationMatrix, SpaceTransform, Stochast, StochastId, ValidationMessage,
    ValidationReport,
};
use nalgebra::{DMatrix, SymmetricEigen};
use tracing::{debug, info, warn};

use crate::error::ModelError;
use crate::model::{FnModel, ModelAdapter, ModelParameter, Response, ZModel};
use crate::reliability::{self, directional_sampling, importance_sampling, Alpha, DesignPoint};
use crate::settings::{CombineSettings, CombineType, CombinerMethod};
use crate::vector::{dot, normalize, scale};

pub const IDENTIFIER: &str = "Combined";

/// Eigenvalues below this are treated as zero.
const EIGEN_TOLERANCE: f64 = 1e-10;

/// One scalar input dimension shared between modes.
#[derive(Debug, Clone)]
struct Key {
    variable: Stochast,
    index: usize,
}

impl Key {
    fn same(&self, id: StochastId, index: usize) -> bool {
        self.variable.id() == id && self.index == index
    }
}

/// Linearised failure modes over a common set of variable dimensions.
#[derive(Debug, Clone)]
pub(crate) struct LinearModes {
    keys: Vec<Key>,
    betas: Vec<f64>,
    /// Unit alpha vector of every mode over `keys`.
    alphas: Vec<Vec<f64>>,
}

impl LinearModes {
    /// Modes from design points, collecting their stochastic dimensions.
    pub(crate) fn from_design_points<'a>(
        points: impl IntoIterator<Item = &'a DesignPoint>,
    ) -> Self {
        let points: Vec<&DesignPoint> = points.into_iter().collect();
        let mut keys: Vec<Key> = Vec::new();
        for point in &points {
            for alpha in &point.alphas {
                let element = alpha.variable.element(alpha.index);
                if element.distribution() == DistributionType::Deterministic {
                    continue;
                }
                if !keys.iter().any(|k| k.same(alpha.variable.id(), alpha.index)) {
                    keys.push(Key {
                        variable: alpha.variable.clone(),
                        index: alpha.index,
                    });
                }
            }
        }
        let alphas = points
            .iter()
            .map(|point| {
                let raw: Vec<f64> = keys
                    .iter()
                    .map(|k| {
                        point
                            .alphas
                            .iter()
                            .find(|a| k.same(a.variable.id(), a.index))
                            .map_or(0.0, |a| a.alpha)
                    })
                    .collect();
                normalize(&raw).unwrap_or(raw)
            })
            .collect();
        Self {
            keys,
            betas: points.iter().map(|p| p.reliability_index).collect(),
            alphas,
        }
    }

    pub(crate) fn mode_count(&self) -> usize {
        self.betas.len()
    }

    pub(crate) fn key_count(&self) -> usize {
        self.keys.len()
    }

    pub(crate) fn key_variable(&self, key: usize) -> &Stochast {
        &self.keys[key].variable
    }

    /// Copies of every mode, `count` times in sequence.
    pub(crate) fn repeated(&self, count: usize) -> Self {
        Self {
            keys: self.keys.clone(),
            betas: (0..count).flat_map(|_| self.betas.iter().copied()).collect(),
            alphas: (0..count).flat_map(|_| self.alphas.iter().cloned()).collect(),
        }
    }
}

/// Loadings `L` with `L Lᵀ = C` for a positive semi-definite matrix,
/// keeping only the columns of non-zero eigenvalues.
pub(crate) fn factor(correlation: &DMatrix<f64>) -> Vec<Vec<f64>> {
    let n = correlation.nrows();
    let eigen = SymmetricEigen::new(correlation.clone());
    let columns: Vec<usize> = (0..n)
        .filter(|&j| eigen.eigenvalues[j] > EIGEN_TOLERANCE)
        .collect();
    (0..n)
        .map(|i| {
            columns
                .iter()
                .map(|&j| eigen.eigenvectors[(i, j)] * eigen.eigenvalues[j].sqrt())
                .collect()
        })
        .collect()
}

/// Solve a system of linearised modes.
///
/// `correlation(key, s, t)` gives the correlation of dimension `key`
/// between modes `s` and `t`.
pub(crate) fn solve(
    modes: &LinearModes,
    correlation: impl Fn(usize, usize, usize) -> f64,
    settings: &CombineSettings,
) -> Result<DesignPoint, ModelError> {
    let m = modes.mode_count();

    // axis layout: per key, the retained columns of its factor
    let mut loadings = Vec::with_capacity(modes.key_count());
    let mut axis_keys = Vec::new();
    for key in 0..modes.key_count() {
        let matrix = DMatrix::from_fn(m, m, |s, t| {
            if s == t {
                1.0
            } else {
                correlation(key, s, t)
            }
        });
        let l = factor(&matrix);
        let width = l.first().map_or(0, Vec::len);
        axis_keys.extend(std::iter::repeat(key).take(width));
        loadings.push(l);
    }
    let axes = axis_keys.len();
    let coefficients: Vec<Vec<f64>> = (0..m)
        .map(|s| {
            let mut row = Vec::with_capacity(axes);
            for (key, l) in loadings.iter().enumerate() {
                row.extend(l[s].iter().map(|v| modes.alphas[s][key] * v));
            }
            row
        })
        .collect();
    debug!(modes = m, axes, "combining linearised modes");

    let betas = Arc::new(modes.betas.clone());
    let rows = Arc::new(coefficients.clone());
    let series = settings.combine_type == CombineType::Series;
    let inputs: Vec<ModelParameter> = (0..axes)
        .map(|i| ModelParameter::scalar(format!("w{i}")))
        .collect();
    let system = FnModel::new(inputs, vec![ModelParameter::scalar("z")], move |w| {
        let zs = betas.iter().zip(rows.iter()).map(|(b, row)| b + dot(row, w));
        let z = if series {
            zs.fold(f64::INFINITY, f64::min)
        } else {
            zs.fold(f64::NEG_INFINITY, f64::max)
        };
        vec![z]
    });
    let adapter = ModelAdapter::new(system);
    let axis_variables: Vec<Stochast> = (0..axes)
        .map(|i| Stochast::normal(format!("w{i}"), 0.0, 1.0))
        .collect();
    let transform = match SpaceTransform::independent(axis_variables) {
        Ok(transform) => transform,
        Err(report) => return Ok(invalid(report)),
    };
    let model = ZModel::new(&transform, &adapter, Response::Output(0), false);

    let reliability = settings.reliability_settings();
    let axis_point = if axes == 0 {
        reliability::run(&model, &reliability)?
    } else {
        match settings.combiner_method {
            CombinerMethod::DirectionalSampling => directional_sampling::run(&model, &reliability)?,
            CombinerMethod::ImportanceSampling => {
                let centres = sampling_centres(&modes.betas, &coefficients, series);
                importance_sampling::run_with_centres(&model, &reliability, centres)?
            }
        }
    };

    let mut point = fold_alphas(modes, &loadings, &axis_keys, &axis_point);
    point.total_model_runs = model.runs();
    info!(
        beta = point.reliability_index,
        combine_type = settings.combine_type.name(),
        "design points combined"
    );
    Ok(point)
}

/// Importance sampling centres: the design point of every mode for a
/// series system, a single point on the intersection for a parallel one.
fn sampling_centres(betas: &[f64], coefficients: &[Vec<f64>], series: bool) -> Vec<Vec<f64>> {
    let points: Vec<Vec<f64>> = betas
        .iter()
        .zip(coefficients)
        .map(|(b, c)| {
            let length = dot(c, c);
            if length > 0.0 {
                scale(c, -b / length)
            } else {
                vec![0.0; c.len()]
            }
        })
        .collect();
    if series || points.len() < 2 {
        return points;
    }
    let axes = coefficients[0].len();
    let mean: Vec<f64> = (0..axes)
        .map(|i| points.iter().map(|p| p[i]).sum::<f64>() / points.len() as f64)
        .collect();
    // stretch the mean until every mode fails
    let stretch = betas
        .iter()
        .zip(coefficients)
        .filter_map(|(b, c)| {
            let along = -dot(c, &mean);
            (along > 0.0).then(|| b / along)
        })
        .fold(1.0, f64::max);
    vec![scale(&mean, stretch)]
}

/// Design point over the original variables from one over the axes.
fn fold_alphas(
    modes: &LinearModes,
    loadings: &[Vec<Vec<f64>>],
    axis_keys: &[usize],
    axis_point: &DesignPoint,
) -> DesignPoint {
    let beta = axis_point.reliability_index;
    let alphas = modes
        .keys
        .iter()
        .enumerate()
        .map(|(k, key)| {
            let mut squares = 0.0;
            let mut orientation = 0.0;
            let mut column = 0;
            for (axis, &owner) in axis_keys.iter().enumerate() {
                if owner != k {
                    continue;
                }
                let a = axis_point.alphas.get(axis).map_or(0.0, |a| a.alpha);
                // summed loading of this axis on the variable over all modes
                let loading: f64 = loadings[k].iter().map(|row| row[column]).sum();
                squares += a * a;
                orientation += a * loading;
                column += 1;
            }
            let alpha = if orientation < 0.0 { -squares.sqrt() } else { squares.sqrt() };
            let u = -beta * alpha;
            Alpha {
                variable: key.variable.clone(),
                name: key.variable.name().to_string(),
                index: key.index,
                alpha,
                alpha_correlated: alpha,
                x: key.variable.element(key.index).x_from_u(u),
                u,
            }
        })
        .collect();

    let mut point = DesignPoint::new(IDENTIFIER, beta)
        .with_convergence(axis_point.convergence, axis_point.is_converged)
        .with_counters(axis_point.total_iterations, axis_point.total_directions, 0);
    point.alphas = alphas;
    point.messages = axis_point.messages.clone();
    point
}

fn invalid(report: ValidationReport) -> DesignPoint {
    let mut point = DesignPoint::new(IDENTIFIER, f64::NAN);
    point.messages = report.into_messages();
    point
}

/// Combination of several design points.
#[derive(Debug, Default)]
pub struct CombineProject {
    design_points: Vec<DesignPoint>,
    self_correlation: SelfCorrelationMatrix,
    pub settings: CombineSettings,
    design_point: Option<DesignPoint>,
    messages: Vec<ValidationMessage>,
}

impl CombineProject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_design_point(&mut self, point: DesignPoint) {
        self.design_points.push(point);
    }

    pub fn design_points(&self) -> &[DesignPoint] {
        &self.design_points
    }

    pub fn clear_design_points(&mut self) {
        self.design_points.clear();
    }

    /// Correlation of a shared variable between modes (default 1).
    pub fn self_correlation_matrix_mut(&mut self) -> &mut SelfCorrelationMatrix {
        &mut self.self_correlation
    }

    pub fn self_correlation_matrix(&self) -> &SelfCorrelationMatrix {
        &self.self_correlation
    }

    pub fn design_point(&self) -> Option<&DesignPoint> {
        self.design_point.as_ref()
    }

    pub fn messages(&self) -> &[ValidationMessage] {
        &self.messages
    }

    pub fn validate(&self) -> ValidationReport {
        let mut report = self.settings.validate();
        if self.design_points.is_empty() {
            report.error("Combine", "no design points to combine");
        }
        for point in &self.design_points {
            if !point.reliability_index.is_finite() {
                report.error(
                    "Combine",
                    format!("design point '{}' has no finite reliability index", point.identifier),
                );
            }
        }
        self.self_correlation.validate_into(&mut report);
        report
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_valid()
    }

    pub fn run(&mut self) -> Result<(), ModelError> {
        self.design_point = None;
        self.messages.clear();
        let report = self.validate();
        if !report.is_valid() {
            for message in report.errors() {
                warn!(%message, "validation failed");
                eprintln!("{message}");
            }
            self.messages = report.into_messages();
            return Ok(());
        }
        let modes = LinearModes::from_design_points(&self.design_points);
        let shared: Vec<f64> = (0..modes.key_count())
            .map(|k| self.self_correlation.get_or(modes.key_variable(k), 1.0))
            .collect();
        let mut point = solve(&modes, |k, _, _| shared[k], &self.settings)?;
        point.contributing_design_points = self.design_points.clone();
        self.design_point = Some(point);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::norm;

    #[test]
    fn test_factor_reproduces_matrix() {
        let c = DMatrix::from_row_slice(3, 3, &[1.0, 0.5, 0.2, 0.5, 1.0, 0.3, 0.2, 0.3, 1.0]);
        let l = factor(&c);
        for i in 0..3 {
            for j in 0..3 {
                let v = dot(&l[i], &l[j]);
                assert!((v - c[(i, j)]).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn test_fully_correlated_keeps_one_axis() {
        let c = DMatrix::from_element(3, 3, 1.0);
        let l = factor(&c);
        assert_eq!(l[0].len(), 1);
        assert!((norm(&l[2]) - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_parallel_centre_fails_every_mode() {
        let betas = [2.0, 3.0];
        let coefficients = vec![vec![-1.0, 0.0], vec![0.0, -1.0]];
        let centres = sampling_centres(&betas, &coefficients, false);
        assert_eq!(centres.len(), 1);
        for (b, c) in betas.iter().zip(&coefficients) {
            assert!(b + dot(c, &centres[0]) <= 1e-12);
        }
    }
}

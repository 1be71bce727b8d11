//! Uncertainty propagation: the distribution of every model output.
//!
//! Sampling methods (crude Monte Carlo, importance sampling, numerical
//! integration) collect weighted output samples and summarize each output
//! as a histogram stochast with equal-width bins over the sampled range,
//! so bin edges follow from seed and sample count alone. FOSM gives normal
//! outputs. FORM and directional sampling trace `P(Y ≤ t)` at the
//! configured thresholds and give `cdf_curve` outputs.

mod fosm;
mod sampling;
mod threshold;

use std::ops::{Deref, DerefMut};

use limitstate_core::standard_normal::u_from_p_unchecked;
use limitstate_core::statistics::{weighted_pearson, WeightedSample};
use limitstate_core::{
    CorrelationMatrix, DistributionType, FragilityValue, HistogramValue, SpaceTransform, Stochast,
    ValidationMessage, ValidationReport,
};
use serde::Serialize;
use tracing::info;

use crate::error::ModelError;
use crate::model::{ModelParameter, Response, ZModel};
use crate::project::{check_grid, ModelProject, Prepared};
use crate::settings::{UncertaintyMethod, UncertaintySettings};

/// Distribution of the outputs of one uncertainty run.
#[derive(Debug, Clone, Serialize)]
pub struct UncertaintyResult {
    pub identifier: String,
    /// One stochast per flat output.
    #[serde(skip)]
    pub stochasts: Vec<Stochast>,
    /// Correlations between outputs, and between inputs and outputs when
    /// requested.
    #[serde(skip)]
    pub output_correlation_matrix: CorrelationMatrix,
    /// Requested quantiles per output, as (x, u) pairs with P(Y ≤ x) = Φ(u).
    pub quantile_values: Vec<Vec<FragilityValue>>,
    pub total_model_runs: usize,
    pub messages: Vec<ValidationMessage>,
}

impl UncertaintyResult {
    pub fn stochast(&self) -> Option<&Stochast> {
        self.stochasts.first()
    }

    pub fn stochast_named(&self, name: &str) -> Option<&Stochast> {
        self.stochasts.iter().find(|s| s.name() == name)
    }
}

/// Names of the flat outputs: `name` for scalars, `name[i]` for arrays.
pub(crate) fn output_names(outputs: &[ModelParameter]) -> Vec<String> {
    outputs
        .iter()
        .flat_map(|p| {
            (0..p.size()).map(move |i| {
                if p.is_array {
                    format!("{}[{}]", p.name, i)
                } else {
                    p.name.clone()
                }
            })
        })
        .collect()
}

/// Histogram stochast with `bins` equal-width cells over the sample range.
pub(crate) fn histogram_stochast(name: &str, sample: &WeightedSample, bins: usize) -> Stochast {
    let Some((lo, hi)) = sample.range() else {
        return Stochast::deterministic(name, f64::NAN);
    };
    if hi <= lo {
        return Stochast::deterministic(name, lo);
    }
    let bins = bins.max(1);
    let width = (hi - lo) / bins as f64;
    let mut amounts = vec![0.0; bins];
    for (v, w) in sample.values.iter().zip(&sample.weights) {
        if v.is_finite() {
            let i = (((v - lo) / width) as usize).min(bins - 1);
            amounts[i] += w;
        }
    }
    let values = amounts
        .iter()
        .enumerate()
        .filter(|(_, a)| **a > 0.0)
        .map(|(i, a)| HistogramValue::new(lo + i as f64 * width, lo + (i + 1) as f64 * width, *a))
        .collect();
    let mut stochast = Stochast::with_distribution(name, DistributionType::Histogram);
    stochast.set_histogram_values(values);
    stochast
}

/// Requested quantiles of an output stochast.
pub(crate) fn quantiles_of(stochast: &Stochast, quantiles: &[f64]) -> Vec<FragilityValue> {
    quantiles
        .iter()
        .map(|&q| {
            let u = u_from_p_unchecked(q);
            FragilityValue::new(stochast.x_from_u(u), u)
        })
        .collect()
}

/// Sampled inputs and outputs of a sampling method.
pub(crate) struct SampledOutputs {
    /// Physical inputs per sample (all dimensions).
    pub inputs: Vec<Vec<f64>>,
    /// Flat outputs per sample.
    pub outputs: Vec<Vec<f64>>,
    pub weights: Vec<f64>,
}

impl SampledOutputs {
    fn column(rows: &[Vec<f64>], k: usize) -> Vec<f64> {
        rows.iter().map(|r| r[k]).collect()
    }

    fn into_result(
        self,
        identifier: &str,
        names: &[String],
        transform: &SpaceTransform,
        settings: &UncertaintySettings,
    ) -> UncertaintyResult {
        let mut stochasts = Vec::with_capacity(names.len());
        let mut quantile_values = Vec::with_capacity(names.len());
        let columns: Vec<Vec<f64>> = (0..names.len()).map(|k| Self::column(&self.outputs, k)).collect();
        for (name, column) in names.iter().zip(&columns) {
            let sample = WeightedSample {
                values: column.clone(),
                weights: self.weights.clone(),
            };
            let stochast = histogram_stochast(name, &sample, settings.histogram_bins);
            quantile_values.push(quantiles_of(&stochast, &settings.quantiles));
            stochasts.push(stochast);
        }

        let mut correlation = CorrelationMatrix::new();
        if settings.calculate_correlations {
            for a in 0..stochasts.len() {
                for b in (a + 1)..stochasts.len() {
                    let rho = weighted_pearson(&columns[a], &columns[b], &self.weights);
                    correlation.set_correlation(&stochasts[a], &stochasts[b], rho);
                }
            }
        }
        if settings.calculate_input_correlations {
            for (d, dimension) in transform.dimensions().iter().enumerate() {
                if dimension.u_index.is_none() || transform.variable(d).is_array() {
                    continue;
                }
                let xs = Self::column(&self.inputs, d);
                for (k, stochast) in stochasts.iter().enumerate() {
                    let rho = weighted_pearson(&xs, &columns[k], &self.weights);
                    correlation.set_correlation(transform.variable(d), stochast, rho);
                }
            }
        }

        UncertaintyResult {
            identifier: identifier.to_string(),
            stochasts,
            output_correlation_matrix: correlation,
            quantile_values,
            total_model_runs: 0,
            messages: Vec::new(),
        }
    }
}

/// Propagation of input uncertainty to the model outputs.
#[derive(Debug, Default)]
pub struct UncertaintyProject {
    base: ModelProject,
    pub settings: UncertaintySettings,
    result: Option<UncertaintyResult>,
}

impl Deref for UncertaintyProject {
    type Target = ModelProject;

    fn deref(&self) -> &ModelProject {
        &self.base
    }
}

impl DerefMut for UncertaintyProject {
    fn deref_mut(&mut self) -> &mut ModelProject {
        &mut self.base
    }
}

impl UncertaintyProject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(evaluator: impl crate::model::Evaluator + 'static) -> Self {
        let mut project = Self::new();
        project.set_model(evaluator);
        project
    }

    pub fn result(&self) -> Option<&UncertaintyResult> {
        self.result.as_ref()
    }

    /// Output stochast of the first output.
    pub fn stochast(&self) -> Option<&Stochast> {
        self.result.as_ref().and_then(UncertaintyResult::stochast)
    }

    fn checked(&self) -> Result<Prepared, ValidationReport> {
        self.base
            .prepare_with(self.settings.validate(), |prepared, report| {
                if self.settings.uncertainty_method == UncertaintyMethod::NumericalIntegration {
                    check_grid(&prepared.transform, &self.settings.reliability, report);
                }
            })
    }

    pub fn validate(&self) -> ValidationReport {
        self.checked().err().unwrap_or_default()
    }

    pub fn is_valid(&self) -> bool {
        self.checked().is_ok()
    }

    /// Propagate the input distributions to every model output.
    pub fn run(&mut self) -> Result<(), ModelError> {
        self.result = None;
        self.base.clear_validate();
        let prepared = match self.checked() {
            Ok(prepared) => prepared,
            Err(report) => {
                self.base.report(report);
                return Ok(());
            }
        };
        self.base.apply_parallelism(self.settings.max_parallel_processes);
        let Some(adapter) = self.base.model() else {
            return Ok(());
        };
        let names = output_names(adapter.output_parameters());
        let model = ZModel::new(&prepared.transform, adapter, Response::Output(0), false);
        let runs = model.runs();
        let settings = &self.settings;

        let mut result = match settings.uncertainty_method {
            UncertaintyMethod::CrudeMonteCarlo => sampling::crude_monte_carlo(&model, settings)?
                .into_result("Crude Monte Carlo", &names, &prepared.transform, settings),
            UncertaintyMethod::ImportanceSampling => sampling::importance_sampling(&model, settings)?
                .into_result("Importance Sampling", &names, &prepared.transform, settings),
            UncertaintyMethod::NumericalIntegration => {
                sampling::numerical_integration(&model, settings)?.into_result(
                    "Numerical Integration",
                    &names,
                    &prepared.transform,
                    settings,
                )
            }
            UncertaintyMethod::Fosm => fosm::run(&model, &names, settings)?,
            UncertaintyMethod::Form | UncertaintyMethod::DirectionalSampling => {
                threshold::run(&model, &names, settings)?
            }
        };
        result.total_model_runs = model.runs() - runs;
        info!(
            method = settings.uncertainty_method.name(),
            outputs = result.stochasts.len(),
            runs = result.total_model_runs,
            "uncertainty run finished"
        );
        self.result = Some(result);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_histogram_bins_are_deterministic() {
        let sample = WeightedSample::unweighted(vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        let stochast = histogram_stochast("y", &sample, 4);
        let bins = stochast.histogram_values();
        assert_eq!(bins.len(), 4);
        assert_eq!(bins[0].lower_bound, 0.0);
        assert_eq!(bins[3].upper_bound, 4.0);
        assert_eq!(bins[3].amount, 2.0);
    }

    #[test]
    fn test_constant_output_is_deterministic() {
        let sample = WeightedSample::unweighted(vec![2.5; 10]);
        let stochast = histogram_stochast("y", &sample, 10);
        assert_eq!(stochast.distribution(), DistributionType::Deterministic);
        assert_eq!(stochast.mean(), 2.5);
    }

    #[test]
    fn test_output_names() {
        let names = output_names(&[ModelParameter::scalar("y"), ModelParameter::array("w", 2)]);
        assert_eq!(names, vec!["y", "w[0]", "w[1]"]);
    }
}

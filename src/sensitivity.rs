//! Sensitivity of the model outputs to each stochastic input.
//!
//! `single_variation` moves one u-coordinate at a time to the low and high
//! probability quantiles with all others at the median. `sobol` estimates
//! first-order (Saltelli) and total (Jansen) indices from two independent
//! sample matrices and their column swaps, `N (m + 2)` model runs for `m`
//! stochastic dimensions.

use std::ops::{Deref, DerefMut};

use limitstate_core::standard_normal::u_from_p_unchecked;
use limitstate_core::statistics::OnlineStats;
use limitstate_core::{SpaceTransform, ValidationReport};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::ModelError;
use crate::model::{Evaluator, Response, ZModel};
use crate::project::ModelProject;
use crate::settings::{SensitivityMethod, SensitivitySettings};
use crate::uncertainty::output_names;

/// Sensitivity of one output to one stochastic input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensitivityValue {
    /// Input name, `name[i]` for array elements.
    pub variable: String,
    /// Output with the input at its low quantile.
    pub low: f64,
    /// Output with all inputs at their median.
    pub medium: f64,
    /// Output with the input at its high quantile.
    pub high: f64,
    pub first_order_index: f64,
    pub total_index: f64,
}

/// Sensitivities of one output.
#[derive(Debug, Clone, Serialize)]
pub struct OutputSensitivity {
    pub output: String,
    pub values: Vec<SensitivityValue>,
}

impl OutputSensitivity {
    pub fn value(&self, variable: &str) -> Option<&SensitivityValue> {
        self.values.iter().find(|v| v.variable == variable)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SensitivityResult {
    pub identifier: String,
    pub outputs: Vec<OutputSensitivity>,
    pub total_model_runs: usize,
}

impl SensitivityResult {
    pub fn output(&self, name: &str) -> Option<&OutputSensitivity> {
        self.outputs.iter().find(|o| o.output == name)
    }
}

fn dimension_labels(transform: &SpaceTransform) -> Vec<String> {
    transform
        .u_dimensions()
        .iter()
        .map(|&d| {
            let variable = transform.variable(d);
            if variable.is_array() {
                format!("{}[{}]", variable.name(), transform.dimensions()[d].index)
            } else {
                variable.name().to_string()
            }
        })
        .collect()
}

fn empty_value(variable: String) -> SensitivityValue {
    SensitivityValue {
        variable,
        low: f64::NAN,
        medium: f64::NAN,
        high: f64::NAN,
        first_order_index: f64::NAN,
        total_index: f64::NAN,
    }
}

fn single_variation(
    model: &ZModel,
    labels: &[String],
    outputs: usize,
    settings: &SensitivitySettings,
) -> Result<Vec<Vec<SensitivityValue>>, ModelError> {
    let m = labels.len();
    let u_low = u_from_p_unchecked(settings.low_probability);
    let u_high = u_from_p_unchecked(settings.high_probability);
    let mut us = vec![vec![0.0; m]];
    for k in 0..m {
        let mut low = vec![0.0; m];
        low[k] = u_low;
        let mut high = vec![0.0; m];
        high[k] = u_high;
        us.push(low);
        us.push(high);
    }
    let ys = model.outputs_batch(&us)?;
    Ok((0..outputs)
        .map(|a| {
            labels
                .iter()
                .enumerate()
                .map(|(k, label)| SensitivityValue {
                    low: ys[1 + 2 * k][a],
                    medium: ys[0][a],
                    high: ys[2 + 2 * k][a],
                    ..empty_value(label.clone())
                })
                .collect()
        })
        .collect())
}

fn sobol(
    model: &ZModel,
    labels: &[String],
    outputs: usize,
    settings: &SensitivitySettings,
) -> Result<Vec<Vec<SensitivityValue>>, ModelError> {
    let m = labels.len();
    let n = settings.maximum_samples;
    let mut rng = settings.random.generator();
    let a: Vec<Vec<f64>> = (0..n).map(|_| rng.normal_vector(m)).collect();
    let b: Vec<Vec<f64>> = (0..n).map(|_| rng.normal_vector(m)).collect();
    let y_a = model.outputs_batch(&a)?;
    let y_b = model.outputs_batch(&b)?;

    let mut variances = vec![OnlineStats::new(); outputs];
    for y in y_a.iter().chain(&y_b) {
        for (stats, value) in variances.iter_mut().zip(y) {
            stats.update(*value);
        }
    }

    let mut values: Vec<Vec<SensitivityValue>> =
        (0..outputs).map(|_| Vec::with_capacity(m)).collect();
    for (k, label) in labels.iter().enumerate() {
        let swapped: Vec<Vec<f64>> = a
            .iter()
            .zip(&b)
            .map(|(row_a, row_b)| {
                let mut row = row_a.clone();
                row[k] = row_b[k];
                row
            })
            .collect();
        let y_ab = model.outputs_batch(&swapped)?;
        for (o, target) in values.iter_mut().enumerate() {
            let variance = variances[o].variance();
            let mut first = 0.0;
            let mut total = 0.0;
            for j in 0..n {
                first += y_b[j][o] * (y_ab[j][o] - y_a[j][o]);
                total += (y_a[j][o] - y_ab[j][o]).powi(2);
            }
            let (first, total) = if variance > 0.0 {
                (first / n as f64 / variance, 0.5 * total / n as f64 / variance)
            } else {
                (0.0, 0.0)
            };
            target.push(SensitivityValue {
                first_order_index: first,
                total_index: total,
                ..empty_value(label.clone())
            });
        }
        debug!(variable = %label, "sobol indices estimated");
    }
    Ok(values)
}

/// Sensitivity analysis of every model output.
#[derive(Debug, Default)]
pub struct SensitivityProject {
    base: ModelProject,
    pub settings: SensitivitySettings,
    result: Option<SensitivityResult>,
}

impl Deref for SensitivityProject {
    type Target = ModelProject;

    fn deref(&self) -> &ModelProject {
        &self.base
    }
}

impl DerefMut for SensitivityProject {
    fn deref_mut(&mut self) -> &mut ModelProject {
        &mut self.base
    }
}

impl SensitivityProject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(evaluator: impl Evaluator + 'static) -> Self {
        let mut project = Self::new();
        project.set_model(evaluator);
        project
    }

    pub fn result(&self) -> Option<&SensitivityResult> {
        self.result.as_ref()
    }

    pub fn validate(&self) -> ValidationReport {
        self.base
            .prepare_with(self.settings.validate(), |_, _| {})
            .err()
            .unwrap_or_default()
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_valid()
    }

    pub fn run(&mut self) -> Result<(), ModelError> {
        self.result = None;
        self.base.clear_validate();
        let prepared = match self.base.prepare_with(self.settings.validate(), |_, _| {}) {
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
        let labels = dimension_labels(&prepared.transform);
        let model = ZModel::new(&prepared.transform, adapter, Response::Output(0), false);
        let runs = model.runs();

        let values = match self.settings.sensitivity_method {
            SensitivityMethod::SingleVariation => {
                single_variation(&model, &labels, names.len(), &self.settings)?
            }
            SensitivityMethod::Sobol => sobol(&model, &labels, names.len(), &self.settings)?,
        };
        let result = SensitivityResult {
            identifier: self.settings.sensitivity_method.name().to_string(),
            outputs: names
                .into_iter()
                .zip(values)
                .map(|(output, values)| OutputSensitivity { output, values })
                .collect(),
            total_model_runs: model.runs() - runs,
        };
        info!(
            method = self.settings.sensitivity_method.name(),
            runs = result.total_model_runs,
            "sensitivity run finished"
        );
        self.result = Some(result);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use limitstate_core::Stochast;

    use super::*;
    use crate::model::FnModel;

    fn additive_project(method: SensitivityMethod) -> SensitivityProject {
        let mut project = SensitivityProject::with_model(FnModel::scalar(&["a", "b"], |x| {
            3.0 * x[0] + x[1]
        }));
        project.set_variable(Stochast::normal("a", 0.0, 1.0));
        project.set_variable(Stochast::normal("b", 0.0, 1.0));
        project.settings = SensitivitySettings::with_method(method);
        project
    }

    #[test]
    fn test_single_variation_sweeps_quantiles() {
        let mut project = additive_project(SensitivityMethod::SingleVariation);
        project.run().unwrap();
        let result = project.result().unwrap();
        let a = result.output("z").unwrap().value("a").unwrap();
        assert!((a.medium).abs() < 1e-12);
        assert!((a.high - 3.0 * 1.644_853_626_951_472).abs() < 1e-6);
        assert!((a.low + a.high).abs() < 1e-9);
        assert_eq!(result.total_model_runs, 5);
    }

    #[test]
    fn test_sobol_additive_model() {
        let mut project = additive_project(SensitivityMethod::Sobol);
        project.settings.maximum_samples = 20_000;
        project.run().unwrap();
        let output = &project.result().unwrap().outputs[0];
        let a = output.value("a").unwrap();
        let b = output.value("b").unwrap();
        // variance shares 9/10 and 1/10
        assert!((a.first_order_index - 0.9).abs() < 0.05, "{}", a.first_order_index);
        assert!((a.total_index - 0.9).abs() < 0.05, "{}", a.total_index);
        assert!((b.first_order_index - 0.1).abs() < 0.05, "{}", b.first_order_index);
    }

    #[test]
    fn test_invalid_settings_leave_no_result() {
        let mut project = additive_project(SensitivityMethod::SingleVariation);
        project.settings.low_probability = 0.99;
        project.run().unwrap();
        assert!(project.result().is_none());
        assert!(!project.messages().is_empty());
    }
}

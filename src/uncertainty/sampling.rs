//! Sampling-based propagation: every sample keeps its inputs, outputs and
//! weight.

use tracing::debug;

use super::SampledOutputs;
use crate::error::ModelError;
use crate::model::ZModel;
use crate::reliability::importance_sampling::SamplingDensity;
use crate::reliability::numerical_integration::{axis_cells, grid_size};
use crate::reliability::start_point::u_settings;
use crate::settings::UncertaintySettings;

fn evaluate(
    model: &ZModel,
    us: Vec<Vec<f64>>,
    weights: Vec<f64>,
    into: &mut SampledOutputs,
) -> Result<(), ModelError> {
    let outputs = model.outputs_batch(&us)?;
    let transform = model.transform();
    into.inputs.extend(us.iter().map(|u| transform.x_from_u(u)));
    into.outputs.extend(outputs);
    into.weights.extend(weights);
    Ok(())
}

fn empty() -> SampledOutputs {
    SampledOutputs {
        inputs: Vec::new(),
        outputs: Vec::new(),
        weights: Vec::new(),
    }
}

pub(super) fn crude_monte_carlo(
    model: &ZModel,
    settings: &UncertaintySettings,
) -> Result<SampledOutputs, ModelError> {
    let n = model.u_count();
    let total = settings.sample_count();
    let mut rng = settings.random.generator();
    let mut sampled = empty();
    let batch_size = settings.batch_size.max(1);
    while sampled.weights.len() < total {
        let batch = batch_size.min(total - sampled.weights.len());
        let us: Vec<Vec<f64>> = (0..batch).map(|_| rng.normal_vector(n)).collect();
        evaluate(model, us, vec![1.0; batch], &mut sampled)?;
    }
    debug!(samples = total, "crude monte carlo propagation done");
    Ok(sampled)
}

/// Samples drawn around the start values with `variance_factor` as
/// deviation, weighted back to the standard normal density.
pub(super) fn importance_sampling(
    model: &ZModel,
    settings: &UncertaintySettings,
) -> Result<SampledOutputs, ModelError> {
    let axes = u_settings(model.transform(), &settings.reliability);
    let density = SamplingDensity {
        centres: vec![axes.iter().map(|s| s.start_value).collect()],
        deviations: axes.iter().map(|s| s.variance_factor).collect(),
    };
    let total = settings.sample_count();
    let mut rng = settings.random.generator();
    let mut sampled = empty();
    let batch_size = settings.batch_size.max(1);
    while sampled.weights.len() < total {
        let first = sampled.weights.len();
        let batch = batch_size.min(total - first);
        let us: Vec<Vec<f64>> = (0..batch).map(|i| density.sample(&mut rng, first + i)).collect();
        let weights = us.iter().map(|u| density.weight(u)).collect();
        evaluate(model, us, weights, &mut sampled)?;
    }
    Ok(sampled)
}

/// Midpoint grid over the u-axes, each cell weighted by its probability.
pub(super) fn numerical_integration(
    model: &ZModel,
    settings: &UncertaintySettings,
) -> Result<SampledOutputs, ModelError> {
    let axes: Vec<Vec<(f64, f64)>> = u_settings(model.transform(), &settings.reliability)
        .iter()
        .map(|s| axis_cells(s.min_value, s.max_value, s.intervals))
        .collect();
    let sizes: Vec<usize> = axes.iter().map(Vec::len).collect();
    let total = grid_size(&sizes).unwrap_or(usize::MAX);
    let mut sampled = empty();
    let batch_size = settings.batch_size.max(1);
    let mut start = 0;
    while start < total {
        let end = (start + batch_size).min(total);
        let mut us = Vec::with_capacity(end - start);
        let mut weights = Vec::with_capacity(end - start);
        for flat in start..end {
            let mut rest = flat;
            let mut u = Vec::with_capacity(axes.len());
            let mut weight = 1.0;
            for axis in &axes {
                let (centre, p) = axis[rest % axis.len()];
                rest /= axis.len();
                u.push(centre);
                weight *= p;
            }
            us.push(u);
            weights.push(weight);
        }
        evaluate(model, us, weights, &mut sampled)?;
        start = end;
    }
    Ok(sampled)
}

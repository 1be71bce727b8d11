//! First-order second-moment propagation.
//!
//! Outputs are linearised at the input means with central differences of
//! `gradient_step` standard deviations. With `z = L u` the correlated
//! standard normals, output `a` has the u-space sensitivity vector
//! `g_a = Lᵀ (J_a ∘ σ)` and `Cov(Y_a, Y_b) = g_a · g_b`.

use limitstate_core::{CorrelationMatrix, Stochast};
use tracing::debug;

use super::{quantiles_of, UncertaintyResult};
use crate::error::ModelError;
use crate::model::ZModel;
use crate::settings::UncertaintySettings;
use crate::vector::dot;

pub const IDENTIFIER: &str = "FOSM";

pub(super) fn run(
    model: &ZModel,
    names: &[String],
    settings: &UncertaintySettings,
) -> Result<UncertaintyResult, ModelError> {
    let transform = model.transform();
    let dimensions = transform.dimension_count();
    let u_dims = transform.u_dimensions();
    let means: Vec<f64> = (0..dimensions).map(|d| transform.stochast(d).mean()).collect();
    let deviations: Vec<f64> = u_dims
        .iter()
        .map(|&d| transform.stochast(d).deviation())
        .collect();

    let mut xs = vec![means.clone()];
    for (k, &d) in u_dims.iter().enumerate() {
        let h = 0.5 * settings.gradient_step * deviations[k];
        let mut low = means.clone();
        let mut high = means.clone();
        low[d] -= h;
        high[d] += h;
        xs.push(low);
        xs.push(high);
    }
    let outputs = model.outputs_x_batch(&xs)?;
    let centre = &outputs[0];

    // rows of L: z_i = Σ_k L_ik u_k
    let columns: Vec<Vec<f64>> = (0..u_dims.len())
        .map(|k| {
            let mut e = vec![0.0; u_dims.len()];
            e[k] = 1.0;
            transform.correlate(&e)
        })
        .collect();
    let rows: Vec<Vec<f64>> = (0..u_dims.len())
        .map(|i| columns.iter().map(|c| c[i]).collect())
        .collect();

    let sensitivities: Vec<Vec<f64>> = (0..names.len())
        .map(|a| {
            let scaled: Vec<f64> = (0..u_dims.len())
                .map(|i| {
                    let step = settings.gradient_step * deviations[i];
                    if step > 0.0 {
                        let slope = (outputs[2 + 2 * i][a] - outputs[1 + 2 * i][a]) / step;
                        slope * deviations[i]
                    } else {
                        0.0
                    }
                })
                .collect();
            columns.iter().map(|c| dot(c, &scaled)).collect()
        })
        .collect();

    let sigmas: Vec<f64> = sensitivities.iter().map(|g| dot(g, g).sqrt()).collect();
    let stochasts: Vec<Stochast> = names
        .iter()
        .enumerate()
        .map(|(a, name)| {
            if sigmas[a] > 0.0 {
                Stochast::normal(name.clone(), centre[a], sigmas[a])
            } else {
                Stochast::deterministic(name.clone(), centre[a])
            }
        })
        .collect();

    let mut correlation = CorrelationMatrix::new();
    if settings.calculate_correlations {
        for a in 0..names.len() {
            for b in (a + 1)..names.len() {
                if sigmas[a] > 0.0 && sigmas[b] > 0.0 {
                    let rho = dot(&sensitivities[a], &sensitivities[b]) / (sigmas[a] * sigmas[b]);
                    correlation.set_correlation(&stochasts[a], &stochasts[b], rho);
                }
            }
        }
    }
    if settings.calculate_input_correlations {
        for (i, &d) in u_dims.iter().enumerate() {
            if transform.variable(d).is_array() {
                continue;
            }
            for (a, stochast) in stochasts.iter().enumerate() {
                if sigmas[a] > 0.0 {
                    let rho = dot(&rows[i], &sensitivities[a]) / sigmas[a];
                    correlation.set_correlation(transform.variable(d), stochast, rho);
                }
            }
        }
    }
    debug!(outputs = names.len(), runs = xs.len(), "fosm linearisation done");

    let quantile_values = stochasts
        .iter()
        .map(|s| quantiles_of(s, &settings.quantiles))
        .collect();
    Ok(UncertaintyResult {
        identifier: IDENTIFIER.to_string(),
        stochasts,
        output_correlation_matrix: correlation,
        quantile_values,
        total_model_runs: 0,
        messages: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use limitstate_core::{CorrelationMatrix, SpaceTransform};

    use super::*;
    use crate::model::{FnModel, ModelAdapter, Response};

    #[test]
    fn test_linear_sum_is_exact() {
        let a = Stochast::normal("a", 1.0, 2.0);
        let b = Stochast::normal("b", 3.0, 1.0);
        let mut correlation = CorrelationMatrix::new();
        correlation.set_correlation(&a, &b, 0.5);
        let transform = SpaceTransform::new(vec![a, b], &correlation, None).unwrap();
        let adapter = ModelAdapter::new(FnModel::scalar(&["a", "b"], |x| x[0] + x[1]));
        let model = ZModel::new(&transform, &adapter, Response::Output(0), false);
        let settings = UncertaintySettings::default();

        let result = run(&model, &["z".to_string()], &settings).unwrap();
        let y = &result.stochasts[0];
        // var = 4 + 1 + 2 * 0.5 * 2 * 1
        assert!((y.mean() - 4.0).abs() < 1e-9);
        assert!((y.deviation() - 7f64.sqrt()).abs() < 1e-9, "{}", y.deviation());
        assert_eq!(adapter.runs(), 5);
    }
}

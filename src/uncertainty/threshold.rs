//! Output distributions traced threshold by threshold.
//!
//! For every output and threshold `t` a reliability run with failure
//! `Y > t` gives `P(Y ≤ t) = Φ(β)`. The (t, β) pairs form a `cdf_curve`
//! output; β is made non-decreasing in `t` so the curve stays a CDF.

use limitstate_core::{CorrelationMatrix, DistributionType, FragilityValue, Stochast};
use tracing::debug;

use super::{quantiles_of, UncertaintyResult};
use crate::error::ModelError;
use crate::model::{CompareType, Response, ZModel};
use crate::reliability;
use crate::settings::{ReliabilityMethod, UncertaintyMethod, UncertaintySettings};

fn reliability_settings(settings: &UncertaintySettings) -> crate::settings::ReliabilitySettings {
    let mut reliability = settings.reliability.clone();
    match settings.uncertainty_method {
        UncertaintyMethod::DirectionalSampling => {
            reliability.reliability_method = ReliabilityMethod::DirectionalSampling;
            reliability.minimum_directions = settings.minimum_directions;
            reliability.maximum_directions = settings.maximum_directions;
            reliability.variation_coefficient = settings.variation_coefficient;
            reliability.random = settings.random;
        }
        _ => reliability.reliability_method = ReliabilityMethod::Form,
    }
    reliability.save_realizations = false;
    reliability
}

pub(super) fn run(
    model: &ZModel,
    names: &[String],
    settings: &UncertaintySettings,
) -> Result<UncertaintyResult, ModelError> {
    let reliability = reliability_settings(settings);
    let mut thresholds = settings.thresholds.clone();
    thresholds.sort_by(f64::total_cmp);
    thresholds.dedup();

    let mut stochasts = Vec::with_capacity(names.len());
    for (output, name) in names.iter().enumerate() {
        let mut curve = Vec::with_capacity(thresholds.len());
        let mut floor = f64::NEG_INFINITY;
        for &t in &thresholds {
            let response = Response::LimitState {
                value: output,
                compare_type: CompareType::GreaterThan,
                critical_value: t,
                critical_output: None,
            };
            let exceedance = ZModel::new(model.transform(), model.adapter(), response, false);
            let point = reliability::run(&exceedance, &reliability)?;
            floor = floor.max(point.reliability_index);
            curve.push(FragilityValue::new(t, floor));
        }
        debug!(output = %name, points = curve.len(), "cdf curve traced");
        let mut stochast = Stochast::with_distribution(name.clone(), DistributionType::CdfCurve);
        stochast.set_fragility_values(curve);
        stochasts.push(stochast);
    }

    let quantile_values = stochasts
        .iter()
        .map(|s| quantiles_of(s, &settings.quantiles))
        .collect();
    Ok(UncertaintyResult {
        identifier: reliability.reliability_method.name().to_string(),
        stochasts,
        output_correlation_matrix: CorrelationMatrix::new(),
        quantile_values,
        total_model_runs: 0,
        messages: Vec::new(),
    })
}

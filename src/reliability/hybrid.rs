//! Two-stage methods.

use tracing::{info, warn};

use super::design_point::DesignPoint;
use super::{directional_sampling, form};
use crate::error::ModelError;
use crate::model::ZModel;
use crate::settings::ReliabilitySettings;

/// Report `second` (or `first` when `report_first`) with both stages as
/// contributing design points.
fn combine(first: DesignPoint, second: DesignPoint, identifier: &str, report_first: bool) -> DesignPoint {
    let mut point = if report_first { first.clone() } else { second.clone() };
    point.identifier = identifier.to_string();
    point.total_iterations = first.total_iterations + second.total_iterations;
    point.total_directions = first.total_directions + second.total_directions;
    point.messages = first
        .messages
        .iter()
        .chain(&second.messages)
        .cloned()
        .collect();
    point.contributing_design_points = vec![first, second];
    point
}

/// FORM, then directional sampling with the line search step scaled to the
/// FORM reliability index.
pub fn form_then_directional_sampling(
    model: &ZModel,
    settings: &ReliabilitySettings,
) -> Result<DesignPoint, ModelError> {
    let runs = model.runs();
    let mut first = form::run(model, settings)?;
    first.total_model_runs = model.runs() - runs;

    let mut ds_settings = settings.clone();
    if first.reliability_index.is_finite() {
        ds_settings.du = (first.reliability_index.abs() / 3.0).clamp(0.1, settings.du);
    }
    let runs = model.runs();
    let mut second = directional_sampling::run(model, &ds_settings)?;
    second.total_model_runs = model.runs() - runs;

    info!(
        form = first.reliability_index,
        directional_sampling = second.reliability_index,
        "form then directional sampling finished"
    );
    Ok(combine(first, second, "FORM then Directional Sampling", false))
}

/// Directional sampling, then FORM started from the sampled design point.
///
/// When that search does not converge FORM is rerun from the configured
/// start method; when neither converges the sampled point is reported.
pub fn directional_sampling_then_form(
    model: &ZModel,
    settings: &ReliabilitySettings,
) -> Result<DesignPoint, ModelError> {
    let runs = model.runs();
    let mut first = directional_sampling::run(model, settings)?;
    first.total_model_runs = model.runs() - runs;

    let start = first.u_vector();
    let start = if start.iter().all(|v| v.is_finite()) {
        start
    } else {
        vec![0.0; model.u_count()]
    };
    let runs = model.runs();
    let mut second = form::run_from(model, settings, vec![start])?;
    if !second.is_converged {
        warn!(
            beta = second.reliability_index,
            "FORM from the sampled design point did not converge, restarting from the start method"
        );
        let fallback = form::run(model, settings)?;
        if fallback.is_converged || !second.reliability_index.is_finite() {
            second = fallback;
        }
    }
    second.total_model_runs = model.runs() - runs;

    let report_first = !second.is_converged && first.reliability_index.is_finite();
    info!(
        directional_sampling = first.reliability_index,
        form = second.reliability_index,
        form_converged = second.is_converged,
        "directional sampling then form finished"
    );
    Ok(combine(first, second, "Directional Sampling then FORM", report_first))
}

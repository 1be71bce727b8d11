//! Reliability analysis: from a limit state in u-space to a design point.
//!
//! Every method is a free function taking the [`ZModel`] and the
//! [`ReliabilitySettings`]; [`run`] dispatches on
//! `settings.reliability_method` and fills in the counters every method
//! shares.

pub mod cobyla;
pub mod crude_monte_carlo;
pub mod design_point;
pub mod directional_sampling;
pub mod form;
pub mod gradient;
pub mod hybrid;
pub mod importance_sampling;
pub mod latin_hypercube;
pub mod numerical_bisection;
pub mod numerical_integration;
mod sampling;
pub mod search;
pub mod start_point;

pub use design_point::{Alpha, DesignPoint, DirectionCollector, Realization};

use limitstate_core::constants::BETA_MAX;
use tracing::info;

use crate::error::ModelError;
use crate::model::ZModel;
use crate::settings::{ReliabilityMethod, ReliabilitySettings};

/// Result when no variable is stochastic: z at the fixed values decides.
fn deterministic(model: &ZModel, identifier: &str) -> Result<DesignPoint, ModelError> {
    let z = model.z(&[])?;
    let beta = if z >= 0.0 { BETA_MAX } else { -BETA_MAX };
    Ok(DesignPoint::at(model.transform(), identifier, beta, &[]).with_convergence(0.0, true))
}

/// Compute the design point with the configured method.
pub fn run(model: &ZModel, settings: &ReliabilitySettings) -> Result<DesignPoint, ModelError> {
    let runs = model.runs();
    let method = settings.reliability_method;
    info!(method = method.name(), dimensions = model.u_count(), "reliability run");

    let mut point = if model.u_count() == 0 {
        deterministic(model, method.name())?
    } else {
        match method {
            ReliabilityMethod::Form => form::run(model, settings)?,
            ReliabilityMethod::CrudeMonteCarlo => crude_monte_carlo::run(model, settings)?,
            ReliabilityMethod::ImportanceSampling => importance_sampling::run(model, settings)?,
            ReliabilityMethod::DirectionalSampling => directional_sampling::run(model, settings)?,
            ReliabilityMethod::NumericalIntegration => numerical_integration::run(model, settings)?,
            ReliabilityMethod::NumericalBisection => numerical_bisection::run(model, settings)?,
            ReliabilityMethod::LatinHypercube => latin_hypercube::run(model, settings)?,
            ReliabilityMethod::Cobyla => cobyla::run(model, settings)?,
            ReliabilityMethod::FormThenDirectionalSampling => {
                hybrid::form_then_directional_sampling(model, settings)?
            }
            ReliabilityMethod::DirectionalSamplingThenForm => {
                hybrid::directional_sampling_then_form(model, settings)?
            }
        }
    };

    point.total_model_runs = model.runs() - runs;
    if settings.save_realizations {
        point.realizations = model.take_realizations();
    }
    info!(
        beta = point.reliability_index,
        pf = point.probability_failure,
        converged = point.is_converged,
        runs = point.total_model_runs,
        "design point"
    );
    Ok(point)
}

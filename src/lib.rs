//! # limitstate
//!
//! Probabilistic reliability and uncertainty analysis of user models.
//!
//! A model maps uncertain inputs to outputs; a limit state reduces the
//! outputs to a scalar `z` that is negative on failure. This crate computes:
//! - The reliability index β and failure probability of the limit state,
//!   with the design point and influence factors (FORM, crude Monte Carlo,
//!   importance and directional sampling, numerical integration and
//!   bisection, Latin hypercube, COBYLA and the FORM/DS hybrids)
//! - The distribution of the outputs themselves (uncertainty)
//! - The influence of each input on the outputs (sensitivity)
//! - Combinations of failure modes in series or parallel, and the length
//!   effect of a cross-section upscaled to a longer section
//!
//! The numerics (distributions, the u ↔ x transform, correlations) live in
//! [`limitstate_core`], re-exported here as [`core`].
//!
//! ## Quick Start
//!
//! ```ignore
//! use limitstate::{FnModel, Project, Stochast};
//!
//! let mut project = Project::with_model(FnModel::scalar(&["a", "b"], |x| 1.8 - (x[0] + x[1])));
//! project.set_variable(Stochast::uniform("a", -1.0, 1.0));
//! project.set_variable(Stochast::uniform("b", -1.0, 1.0));
//! project.run()?;
//!
//! if let Some(point) = project.design_point() {
//!     println!("{point}");
//! }
//! ```
//!
//! ## Object-property protocol
//!
//! Bindings drive the same engine through [`protocol::Engine`]: numbered
//! objects, string keys and typed values, with `run` and `validate`
//! invoked by name.

#![warn(clippy::all)]

// Core modules
mod error;
mod project;
mod settings;
mod vector;

// Functional modules
pub mod combine;
pub mod model;
pub mod output;
pub mod protocol;
pub mod reliability;
pub mod sensitivity;
pub mod uncertainty;

pub use limitstate_core as core;

// Re-exports for public API
pub use combine::{CombineProject, LengthEffectProject};
pub use error::{BoxError, Error, ModelError, ProtocolError, Result};
pub use limitstate_core::{
    CorrelationMatrix, CorrelationType, CopulaType, DistributionType, SelfCorrelationMatrix,
    Stochast, StochastId, ValidationMessage, ValidationReport,
};
pub use model::{
    CompareType, EvaluationResult, Evaluator, FnModel, LimitStateFunction, ModelAdapter,
    ModelParameter,
};
pub use project::{ModelProject, Project};
pub use reliability::{Alpha, DesignPoint, Realization};
pub use sensitivity::{OutputSensitivity, SensitivityProject, SensitivityResult, SensitivityValue};
pub use settings::{
    CombineSettings, CombineType, CombinerMethod, DesignPointMethod, GradientType,
    LengthEffectSettings, ReliabilityMethod, ReliabilitySettings, SensitivityMethod,
    SensitivitySettings, StartMethod, StochastSettings, UncertaintyMethod, UncertaintySettings,
};
pub use uncertainty::{UncertaintyProject, UncertaintyResult};

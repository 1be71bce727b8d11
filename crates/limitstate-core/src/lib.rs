//! Numerical core of limitstate.
//!
//! This crate holds everything that maps between probability, standard
//! normal space and physical space:
//!
//! - [`standard_normal`]: probability / reliability index / return period
//! - [`Stochast`]: parametrized random variables (closed-form families,
//!   empirical tables, mixtures, conditional and array variables)
//! - [`CorrelationMatrix`] and copulas
//! - [`SpaceTransform`]: the u ↔ z ↔ x mapping used by every solver
//! - [`RandomGenerator`] and [`statistics`] helpers for sampling loops
//!
//! It is typically used through the `limitstate` crate, which adds models,
//! solvers and reporting.
//!
//! ```ignore
//! use limitstate_core::{standard_normal, Stochast};
//!
//! let a = Stochast::uniform("a", -1.0, 1.0);
//! let x = a.x_from_u(standard_normal::u_from_q(0.05)?);
//! ```

pub mod constants;
pub mod copula;
pub mod correlation;
pub mod distributions;
pub mod error;
pub mod random;
pub mod roots;
pub mod standard_normal;
pub mod statistics;
pub mod stochast;
pub mod transform;
pub mod validation;

// Re-export commonly used items at crate root
pub use copula::CopulaType;
pub use correlation::{CorrelationEntry, CorrelationMatrix, CorrelationType, SelfCorrelationMatrix};
pub use distributions::{
    ConditionalValue, DiscreteValue, DistributionType, FragilityValue, HistogramValue, Parameter,
    Parameters,
};
pub use error::DomainError;
pub use random::{RandomGenerator, RandomSettings, RandomType};
pub use stochast::{ConstantParameter, ContributingStochast, Stochast, StochastId};
pub use transform::{Dimension, SpaceTransform};
pub use validation::{MessageLevel, ValidationMessage, ValidationReport};

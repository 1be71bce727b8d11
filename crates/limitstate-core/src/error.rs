//! Error types for domain violations in the numerical core.

use thiserror::Error;

/// A numeric function was called outside its mathematical domain.
///
/// These indicate programmer error and are returned loudly rather than
/// clamped. Data problems (invalid distribution parameters, bad correlation
/// matrices) are reported through [`crate::ValidationReport`] instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    /// A probability argument was outside `[0, 1]` (or NaN).
    #[error("probability {value} is outside [0, 1]")]
    ProbabilityOutOfRange {
        /// The rejected value.
        value: f64,
    },

    /// A return period or time base was not strictly positive.
    #[error("{name} must be positive, got {value}")]
    NonPositive {
        /// Name of the argument.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// Any other invalid argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

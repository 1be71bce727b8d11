//! Error types for the engine.
//!
//! Invalid input data (bad distribution parameters, inconsistent
//! correlations, bad settings) is not an error: it is collected in a
//! [`ValidationReport`] and the run leaves its result unset. The types here
//! cover the failures that must abort a run or a protocol call.

use limitstate_core::{DomainError, ValidationReport};
use thiserror::Error;

/// Boxed error returned by a user-supplied model.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A model evaluation failed inside a batch.
#[derive(Debug, Error)]
#[error("model evaluation failed for sample {sample} at inputs {inputs:?}: {source}")]
pub struct ModelError {
    /// Position of the failing sample within the run.
    pub sample: usize,
    /// Flattened input vector handed to the model.
    pub inputs: Vec<f64>,
    #[source]
    pub source: BoxError,
}

impl ModelError {
    pub fn new(sample: usize, inputs: Vec<f64>, source: impl Into<BoxError>) -> Self {
        Self {
            sample,
            inputs,
            source: source.into(),
        }
    }
}

/// Misuse of the object-property protocol.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProtocolError {
    #[error("unknown object kind '{0}'")]
    UnknownKind(String),

    #[error("object {0} does not exist")]
    UnknownObject(i64),

    #[error("{kind} has no property '{property}'")]
    UnknownProperty { kind: String, property: String },

    #[error("{kind} has no method '{method}'")]
    UnknownMethod { kind: String, method: String },

    #[error("property '{property}' expects {expected}")]
    TypeMismatch {
        property: String,
        expected: &'static str,
    },

    #[error("index {index} out of range for '{property}' (count {count})")]
    IndexOutOfRange {
        property: String,
        index: usize,
        count: usize,
    },

    #[error("property '{property}' of {kind} is read-only")]
    ReadOnly { kind: String, property: String },

    #[error("object {id} is a {actual}, expected {expected}")]
    WrongKind {
        id: i64,
        actual: String,
        expected: &'static str,
    },
}

/// Top-level error of the engine.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Returned by APIs that have no result slot to leave unset.
    #[error("validation failed:\n{0}")]
    Validation(ValidationReport),
}

impl From<ValidationReport> for Error {
    fn from(report: ValidationReport) -> Self {
        Error::Validation(report)
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_error_message_names_sample() {
        let error = ModelError::new(7, vec![1.0, 2.5], "division by zero");
        let text = error.to_string();
        assert!(text.contains("sample 7"), "{text}");
        assert!(text.contains("[1.0, 2.5]"), "{text}");
        assert!(text.ends_with("division by zero"), "{text}");
    }

    #[test]
    fn test_protocol_error_converts() {
        let error: Error = ProtocolError::UnknownKind("widget".into()).into();
        assert_eq!(error.to_string(), "unknown object kind 'widget'");
    }
}

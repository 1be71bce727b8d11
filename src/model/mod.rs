//! User models and their evaluation.
//!
//! A model is anything implementing [`Evaluator`]: it declares its input and
//! output parameters as data and maps a flat input vector (array inputs
//! expanded in place) to a flat output vector. [`ModelAdapter`] adds the
//! worker pool, the memoization cache and the run counter; [`ZModel`] puts
//! the u ↔ x transform and the limit-state selection in front of it.

mod adapter;
mod limit_state;
mod zmodel;

pub use adapter::ModelAdapter;
pub use limit_state::{CompareType, CriticalValue, LimitStateFunction, Response};
pub use zmodel::ZModel;

use serde::{Deserialize, Serialize};

use crate::error::BoxError;

/// Result of one model call.
pub type EvaluationResult = Result<Vec<f64>, BoxError>;

/// Metadata of one model input or output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParameter {
    pub name: String,
    /// Value of the auto-created deterministic variable bound to this input.
    pub default_value: f64,
    pub is_array: bool,
    pub array_size: usize,
}

impl ModelParameter {
    pub fn scalar(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_value: 0.0,
            is_array: false,
            array_size: 1,
        }
    }

    pub fn array(name: impl Into<String>, size: usize) -> Self {
        Self {
            name: name.into(),
            default_value: 0.0,
            is_array: true,
            array_size: size,
        }
    }

    pub fn with_default(mut self, value: f64) -> Self {
        self.default_value = value;
        self
    }

    /// Number of flat slots this parameter occupies.
    pub fn size(&self) -> usize {
        if self.is_array {
            self.array_size
        } else {
            1
        }
    }
}

/// Total flat size of a parameter list.
pub fn flat_size(parameters: &[ModelParameter]) -> usize {
    parameters.iter().map(ModelParameter::size).sum()
}

/// Flat position of `name[index]` in a parameter list.
pub fn flat_index(parameters: &[ModelParameter], name: &str, index: usize) -> Option<usize> {
    let mut offset = 0;
    for p in parameters {
        if p.name == name {
            return (index < p.size()).then_some(offset + index);
        }
        offset += p.size();
    }
    None
}

/// A model of named inputs and outputs.
///
/// Implementations must be free of side effects visible to the solver:
/// batches may be evaluated concurrently from several worker threads.
pub trait Evaluator: Send + Sync {
    fn input_parameters(&self) -> &[ModelParameter];

    fn output_parameters(&self) -> &[ModelParameter];

    /// Evaluate one flat input vector.
    fn evaluate(&self, inputs: &[f64]) -> EvaluationResult;

    /// Evaluate several input vectors; results keep the input order.
    fn evaluate_batch(&self, inputs: &[Vec<f64>]) -> Vec<EvaluationResult> {
        inputs.iter().map(|x| self.evaluate(x)).collect()
    }
}

type ModelFn = Box<dyn Fn(&[f64]) -> EvaluationResult + Send + Sync>;

/// Closure-backed [`Evaluator`].
pub struct FnModel {
    inputs: Vec<ModelParameter>,
    outputs: Vec<ModelParameter>,
    function: ModelFn,
}

impl FnModel {
    /// A model that cannot fail.
    pub fn new<F>(inputs: Vec<ModelParameter>, outputs: Vec<ModelParameter>, function: F) -> Self
    where
        F: Fn(&[f64]) -> Vec<f64> + Send + Sync + 'static,
    {
        Self::try_new(inputs, outputs, move |x| Ok(function(x)))
    }

    /// A model whose evaluation may fail.
    pub fn try_new<F>(inputs: Vec<ModelParameter>, outputs: Vec<ModelParameter>, function: F) -> Self
    where
        F: Fn(&[f64]) -> EvaluationResult + Send + Sync + 'static,
    {
        Self {
            inputs,
            outputs,
            function: Box::new(function),
        }
    }

    /// Scalar inputs by name and one scalar output named `z`.
    pub fn scalar<F>(inputs: &[&str], function: F) -> Self
    where
        F: Fn(&[f64]) -> f64 + Send + Sync + 'static,
    {
        Self::new(
            inputs.iter().map(|n| ModelParameter::scalar(*n)).collect(),
            vec![ModelParameter::scalar("z")],
            move |x| vec![function(x)],
        )
    }
}

impl std::fmt::Debug for FnModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnModel")
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .finish_non_exhaustive()
    }
}

impl Evaluator for FnModel {
    fn input_parameters(&self) -> &[ModelParameter] {
        &self.inputs
    }

    fn output_parameters(&self) -> &[ModelParameter] {
        &self.outputs
    }

    fn evaluate(&self, inputs: &[f64]) -> EvaluationResult {
        let outputs = (self.function)(inputs)?;
        let expected = flat_size(&self.outputs);
        if outputs.len() != expected {
            return Err(format!("model returned {} outputs, expected {}", outputs.len(), expected).into());
        }
        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_layout() {
        let parameters = vec![
            ModelParameter::scalar("a"),
            ModelParameter::array("b", 3),
            ModelParameter::scalar("c"),
        ];
        assert_eq!(flat_size(&parameters), 5);
        assert_eq!(flat_index(&parameters, "b", 2), Some(3));
        assert_eq!(flat_index(&parameters, "c", 0), Some(4));
        assert_eq!(flat_index(&parameters, "b", 3), None);
        assert_eq!(flat_index(&parameters, "d", 0), None);
    }

    #[test]
    fn test_output_count_checked() {
        let model = FnModel::new(
            vec![ModelParameter::scalar("a")],
            vec![ModelParameter::scalar("y"), ModelParameter::scalar("w")],
            |x| vec![x[0]],
        );
        assert!(model.evaluate(&[1.0]).is_err());
    }

    #[test]
    fn test_scalar_model() {
        let model = FnModel::scalar(&["a", "b"], |x| 1.8 - x[0] - x[1]);
        assert_eq!(model.input_parameters().len(), 2);
        assert_eq!(model.output_parameters()[0].name, "z");
        assert_eq!(model.evaluate(&[0.8, 0.5]).unwrap(), vec![0.5]);
    }
}

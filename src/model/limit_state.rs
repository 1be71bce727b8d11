//! Reduction of a model's outputs to the scalar limit-state value z.
//!
//! By convention z < 0 is failure. Without a limit-state function the
//! selected output is z itself. With one, `less_than` fails when the output
//! drops below the critical value (z = output - critical) and
//! `greater_than` fails when it exceeds it (z = critical - output). The
//! critical value is a literal or another output of the same model.

use limitstate_core::ValidationReport;
use serde::{Deserialize, Serialize};

use super::{flat_index, ModelParameter};
use crate::settings::named_enum;

named_enum! {
    /// Side of the critical value that counts as failure.
    pub enum CompareType {
        LessThan => "less_than",
        GreaterThan => "greater_than",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriticalValue {
    Value(f64),
    /// Name of another output.
    Parameter(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitStateFunction {
    /// Output compared against the critical value.
    pub parameter: String,
    /// Element of an array output.
    pub index: usize,
    pub compare_type: CompareType,
    pub critical: CriticalValue,
}

impl LimitStateFunction {
    pub fn new(parameter: impl Into<String>, compare_type: CompareType, critical_value: f64) -> Self {
        Self {
            parameter: parameter.into(),
            index: 0,
            compare_type,
            critical: CriticalValue::Value(critical_value),
        }
    }

    /// Compare two outputs of the model.
    pub fn against_output(
        parameter: impl Into<String>,
        compare_type: CompareType,
        critical_parameter: impl Into<String>,
    ) -> Self {
        Self {
            parameter: parameter.into(),
            index: 0,
            compare_type,
            critical: CriticalValue::Parameter(critical_parameter.into()),
        }
    }
}

/// Resolved position of z in a flat output vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Response {
    Output(usize),
    LimitState {
        value: usize,
        compare_type: CompareType,
        critical_value: f64,
        critical_output: Option<usize>,
    },
}

impl Response {
    /// Resolve names against the model outputs.
    ///
    /// `output` selects the output used as z when no limit-state function is
    /// given; it defaults to the first output.
    pub fn resolve(
        outputs: &[ModelParameter],
        output: Option<(&str, usize)>,
        limit_state: Option<&LimitStateFunction>,
        report: &mut ValidationReport,
    ) -> Option<Self> {
        let subject = "Model";
        if outputs.is_empty() {
            report.error(subject, "model has no output parameters");
            return None;
        }
        let find = |name: &str, index: usize, report: &mut ValidationReport| {
            let position = flat_index(outputs, name, index);
            if position.is_none() {
                report.error(subject, format!("output parameter '{name}[{index}]' does not exist"));
            }
            position
        };
        match limit_state {
            None => match output {
                Some((name, index)) => find(name, index, report).map(Response::Output),
                None => Some(Response::Output(0)),
            },
            Some(lsf) => {
                let value = find(&lsf.parameter, lsf.index, report);
                let (critical_value, critical_output) = match &lsf.critical {
                    CriticalValue::Value(v) => (*v, None),
                    CriticalValue::Parameter(name) => (f64::NAN, find(name, 0, report)),
                };
                if matches!(lsf.critical, CriticalValue::Parameter(_)) && critical_output.is_none() {
                    return None;
                }
                Some(Response::LimitState {
                    value: value?,
                    compare_type: lsf.compare_type,
                    critical_value,
                    critical_output,
                })
            }
        }
    }

    /// The limit-state value of one flat output vector.
    pub fn z(&self, outputs: &[f64]) -> f64 {
        match *self {
            Response::Output(i) => outputs[i],
            Response::LimitState {
                value,
                compare_type,
                critical_value,
                critical_output,
            } => {
                let critical = critical_output.map_or(critical_value, |i| outputs[i]);
                match compare_type {
                    CompareType::LessThan => outputs[value] - critical,
                    CompareType::GreaterThan => critical - outputs[value],
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outputs() -> Vec<ModelParameter> {
        vec![
            ModelParameter::scalar("resistance"),
            ModelParameter::scalar("load"),
            ModelParameter::array("levels", 2),
        ]
    }

    #[test]
    fn test_default_is_first_output() {
        let mut report = ValidationReport::new();
        let response = Response::resolve(&outputs(), None, None, &mut report).unwrap();
        assert_eq!(response.z(&[3.0, 1.0, 0.0, 0.0]), 3.0);
    }

    #[test]
    fn test_compare_against_value() {
        let mut report = ValidationReport::new();
        let less = LimitStateFunction::new("load", CompareType::LessThan, 2.0);
        let response = Response::resolve(&outputs(), None, Some(&less), &mut report).unwrap();
        assert_eq!(response.z(&[0.0, 1.5, 0.0, 0.0]), -0.5);

        let greater = LimitStateFunction::new("load", CompareType::GreaterThan, 2.0);
        let response = Response::resolve(&outputs(), None, Some(&greater), &mut report).unwrap();
        assert_eq!(response.z(&[0.0, 1.5, 0.0, 0.0]), 0.5);
    }

    #[test]
    fn test_compare_outputs() {
        let mut report = ValidationReport::new();
        let lsf = LimitStateFunction::against_output("resistance", CompareType::LessThan, "load");
        let response = Response::resolve(&outputs(), None, Some(&lsf), &mut report).unwrap();
        assert_eq!(response.z(&[5.0, 3.0, 0.0, 0.0]), 2.0);
    }

    #[test]
    fn test_array_output_selection() {
        let mut report = ValidationReport::new();
        let response =
            Response::resolve(&outputs(), Some(("levels", 1)), None, &mut report).unwrap();
        assert_eq!(response.z(&[0.0, 0.0, 7.0, 8.0]), 8.0);
    }

    #[test]
    fn test_unknown_output() {
        let mut report = ValidationReport::new();
        let lsf = LimitStateFunction::new("missing", CompareType::LessThan, 0.0);
        assert!(Response::resolve(&outputs(), None, Some(&lsf), &mut report).is_none());
        assert_eq!(
            report.messages()[0].to_string(),
            "Error: Model => output parameter 'missing[0]' does not exist"
        );
    }
}

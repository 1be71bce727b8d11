//! Object-property protocol.
//!
//! A thin binding layer drives the engine through numbered objects: create
//! one by kind name, get and set typed properties by string key, read
//! collections through indexed get and count, bind a model and invoke named
//! methods. Keys are parsed once into per-kind enums ([`keys`]); behind
//! them every object is a typed Rust value.
//!
//! Objects refer to each other by id. A stochast's discrete values, array
//! elements or conditional source are stored as ids and resolved each time
//! the stochast is used, so later changes to the referenced objects are
//! seen by the next `run`. Results are registered as new objects.
//!
//! Validation failures are not protocol errors: `run` prints them as
//! `Error: <subject> => <message>` lines and leaves the result unset.

pub mod keys;
mod object;
mod properties;

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{Error, ProtocolError, Result};
use crate::model::Evaluator;

pub use keys::{Method, ObjectKind};
use object::Object;

/// Typed property value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Double(f64),
    Int(i64),
    Bool(bool),
    String(String),
    DoubleArray(Vec<f64>),
    IntArray(Vec<i64>),
}

fn mismatch(key: &str, expected: &'static str) -> ProtocolError {
    ProtocolError::TypeMismatch {
        property: key.to_string(),
        expected,
    }
}

impl Value {
    pub fn as_f64(&self, key: &str) -> Result<f64, ProtocolError> {
        match self {
            Value::Double(v) => Ok(*v),
            Value::Int(v) => Ok(*v as f64),
            _ => Err(mismatch(key, "a double")),
        }
    }

    pub fn as_i64(&self, key: &str) -> Result<i64, ProtocolError> {
        match self {
            Value::Int(v) => Ok(*v),
            _ => Err(mismatch(key, "an int")),
        }
    }

    pub fn as_usize(&self, key: &str) -> Result<usize, ProtocolError> {
        match self {
            Value::Int(v) if *v >= 0 => Ok(*v as usize),
            _ => Err(mismatch(key, "a non-negative int")),
        }
    }

    pub fn as_bool(&self, key: &str) -> Result<bool, ProtocolError> {
        match self {
            Value::Bool(v) => Ok(*v),
            _ => Err(mismatch(key, "a bool")),
        }
    }

    pub fn as_str(&self, key: &str) -> Result<&str, ProtocolError> {
        match self {
            Value::String(v) => Ok(v),
            _ => Err(mismatch(key, "a string")),
        }
    }

    pub fn as_f64s(&self, key: &str) -> Result<&[f64], ProtocolError> {
        match self {
            Value::DoubleArray(v) => Ok(v),
            _ => Err(mismatch(key, "an array of doubles")),
        }
    }

    pub fn as_i64s(&self, key: &str) -> Result<&[i64], ProtocolError> {
        match self {
            Value::IntArray(v) => Ok(v),
            _ => Err(mismatch(key, "an array of ints")),
        }
    }

    /// Parse a string value into a named enum.
    pub fn parse<T: std::str::FromStr>(&self, key: &str) -> Result<T, ProtocolError> {
        self.as_str(key)?
            .parse()
            .map_err(|_| mismatch(key, "a known name"))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Self {
        Value::DoubleArray(v)
    }
}

impl From<Vec<i64>> for Value {
    fn from(v: Vec<i64>) -> Self {
        Value::IntArray(v)
    }
}

/// Parse a property name for an object kind.
pub(crate) fn parse_key<K: std::str::FromStr>(kind: ObjectKind, key: &str) -> Result<K, ProtocolError> {
    key.parse().map_err(|_| ProtocolError::UnknownProperty {
        kind: kind.name().to_string(),
        property: key.to_string(),
    })
}

pub(crate) fn out_of_range(key: &str, index: usize, count: usize) -> ProtocolError {
    ProtocolError::IndexOutOfRange {
        property: key.to_string(),
        index,
        count,
    }
}

/// Registry of protocol objects.
#[derive(Debug, Default)]
pub struct Engine {
    objects: BTreeMap<i64, Object>,
    next_id: i64,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, object: Object) -> i64 {
        self.next_id += 1;
        let id = self.next_id;
        self.objects.insert(id, object);
        id
    }

    pub(crate) fn object(&self, id: i64) -> Result<&Object, ProtocolError> {
        self.objects.get(&id).ok_or(ProtocolError::UnknownObject(id))
    }

    pub(crate) fn object_mut(&mut self, id: i64) -> Result<&mut Object, ProtocolError> {
        self.objects.get_mut(&id).ok_or(ProtocolError::UnknownObject(id))
    }

    /// Check that `id` exists and is of kind `expected`.
    pub(crate) fn expect_kind(&self, id: i64, expected: ObjectKind) -> Result<(), ProtocolError> {
        let actual = self.object(id)?.kind();
        if actual == expected {
            Ok(())
        } else {
            Err(ProtocolError::WrongKind {
                id,
                actual: actual.name().to_string(),
                expected: expected.name(),
            })
        }
    }

    /// Create an object of the named kind and return its id.
    pub fn create(&mut self, kind: &str) -> Result<i64, ProtocolError> {
        let kind: ObjectKind = kind
            .parse()
            .map_err(|_| ProtocolError::UnknownKind(kind.to_string()))?;
        let object = Object::create(self, kind);
        let id = self.insert(object);
        debug!(id, kind = kind.name(), "object created");
        Ok(id)
    }

    pub fn kind(&self, id: i64) -> Result<ObjectKind, ProtocolError> {
        Ok(self.object(id)?.kind())
    }

    /// Remove an object; references to it resolve to nothing afterwards.
    pub fn destroy(&mut self, id: i64) -> Result<(), ProtocolError> {
        self.objects
            .remove(&id)
            .map(|_| ())
            .ok_or(ProtocolError::UnknownObject(id))
    }

    /// Value of a property. Reading `is_valid` validates the object with
    /// the current state of everything it refers to.
    pub fn get(&mut self, id: i64, key: &str) -> Result<Value, ProtocolError> {
        properties::get(self, id, key)
    }

    pub fn set(&mut self, id: i64, key: &str, value: impl Into<Value>) -> Result<()> {
        properties::set(self, id, key, value.into())
    }

    /// Element `index` of a collection property. Self-correlations and
    /// correlation lengths are indexed by stochast object id.
    pub fn get_indexed(&mut self, id: i64, key: &str, index: i64) -> Result<Value, ProtocolError> {
        properties::get_indexed(self, id, key, index)
    }

    pub fn set_indexed(&mut self, id: i64, key: &str, index: i64, value: impl Into<Value>) -> Result<()> {
        properties::set_indexed(self, id, key, index, value.into())
    }

    /// Property indexed by a pair, e.g. the correlation of two stochasts.
    pub fn get_indexed2(&self, id: i64, key: &str, first: i64, second: i64) -> Result<Value, ProtocolError> {
        properties::get_indexed2(self, id, key, first, second)
    }

    pub fn set_indexed2(
        &mut self,
        id: i64,
        key: &str,
        first: i64,
        second: i64,
        value: impl Into<Value>,
    ) -> Result<(), ProtocolError> {
        properties::set_indexed2(self, id, key, first, second, value.into())
    }

    /// Number of elements of a collection property.
    pub fn count(&mut self, id: i64, key: &str) -> Result<usize, ProtocolError> {
        properties::count(self, id, key)
    }

    /// A property evaluated at an argument, such as a stochast's `cdf`.
    pub fn get_at(&self, id: i64, key: &str, argument: f64) -> Result<f64> {
        properties::get_at(self, id, key, argument)
    }

    /// Bind a model to a project; one stochast object per model input is
    /// created and listed in the project's `variables`.
    pub fn set_model(&mut self, id: i64, evaluator: impl Evaluator + 'static) -> Result<(), ProtocolError> {
        object::set_model(self, id, Box::new(evaluator))
    }

    pub fn invoke(&mut self, id: i64, method: &str) -> Result<(), Error> {
        let kind = self.kind(id)?;
        let method: Method = method.parse().map_err(|_| ProtocolError::UnknownMethod {
            kind: kind.name().to_string(),
            method: method.to_string(),
        })?;
        object::invoke(self, id, method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FnModel;

    #[test]
    fn test_unknown_kind_and_property() {
        let mut engine = Engine::new();
        assert_eq!(
            engine.create("spaceship"),
            Err(ProtocolError::UnknownKind("spaceship".into()))
        );
        let id = engine.create("stochast").unwrap();
        assert!(matches!(
            engine.get(id, "colour"),
            Err(ProtocolError::UnknownProperty { .. })
        ));
        assert!(matches!(
            engine.set(id, "mean", "high"),
            Err(Error::Protocol(ProtocolError::TypeMismatch { .. }))
        ));
        let other = engine.create("discrete_value").unwrap();
        assert!(matches!(
            engine.set(id, "array_variables", vec![other]),
            Err(Error::Protocol(ProtocolError::WrongKind { .. }))
        ));
    }

    #[test]
    fn test_stochast_properties() {
        let mut engine = Engine::new();
        let id = engine.create("stochast").unwrap();
        engine.set(id, "distribution", "normal").unwrap();
        engine.set(id, "mean", 3.0).unwrap();
        engine.set(id, "deviation", 0.5).unwrap();
        assert_eq!(engine.get(id, "mean").unwrap(), Value::Double(3.0));
        let x = engine.get_at(id, "x_from_u", 2.0).unwrap();
        assert!((x - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_discrete_values_by_reference() {
        let mut engine = Engine::new();
        let id = engine.create("stochast").unwrap();
        engine.set(id, "distribution", "discrete").unwrap();
        let first = engine.create("discrete_value").unwrap();
        engine.set(first, "x", 2.0).unwrap();
        engine.set(first, "amount", 1.0).unwrap();
        let second = engine.create("discrete_value").unwrap();
        engine.set(second, "x", 3.0).unwrap();
        engine.set(second, "amount", 3.0).unwrap();
        engine.set(id, "discrete_values", vec![first, second]).unwrap();
        assert_eq!(engine.count(id, "discrete_values").unwrap(), 2);
        let mean = engine.get(id, "mean").unwrap().as_f64("mean").unwrap();
        assert!((mean - 2.75).abs() < 1e-9);

        engine.set(id, "discrete_values", vec![second]).unwrap();
        assert_eq!(engine.get(id, "mean").unwrap(), Value::Double(3.0));
    }

    #[test]
    fn test_run_project() {
        let mut engine = Engine::new();
        let project = engine.create("project").unwrap();
        engine
            .set_model(
                project,
                FnModel::scalar(&["a", "b"], |x| 1.8 - (x[0] + x[1])),
            )
            .unwrap();
        assert_eq!(engine.count(project, "variables").unwrap(), 2);
        for index in 0..2 {
            let variable = engine
                .get_indexed(project, "variables", index)
                .unwrap()
                .as_i64("variables")
                .unwrap();
            engine.set(variable, "distribution", "uniform").unwrap();
            engine.set(variable, "minimum", -1.0).unwrap();
            engine.set(variable, "maximum", 1.0).unwrap();
        }
        engine.invoke(project, "run").unwrap();
        let point = engine.get(project, "design_point").unwrap().as_i64("design_point").unwrap();
        let beta = engine.get(point, "reliability_index").unwrap().as_f64("beta").unwrap();
        assert!((beta - 2.33).abs() < 0.02, "beta {beta}");
        assert_eq!(engine.count(point, "alphas").unwrap(), 2);
    }

    #[test]
    fn test_invalid_run_leaves_no_design_point() {
        let mut engine = Engine::new();
        let project = engine.create("project").unwrap();
        engine
            .set_model(project, FnModel::scalar(&["a"], |x| 1.0 - x[0]))
            .unwrap();
        let variable = engine.get_indexed(project, "variables", 0).unwrap().as_i64("v").unwrap();
        engine.set(variable, "distribution", "gumbel").unwrap();
        engine.set(variable, "scale", -1.0).unwrap();
        engine.invoke(project, "run").unwrap();
        assert_eq!(engine.get(project, "design_point").unwrap(), Value::Int(0));
        assert_eq!(engine.count(project, "messages").unwrap(), 1);
        assert_eq!(engine.get(project, "is_valid").unwrap(), Value::Bool(false));
    }
}

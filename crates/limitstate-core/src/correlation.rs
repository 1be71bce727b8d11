//! Pairwise correlation between stochasts.
//!
//! Pairs are stored sparsely under `(min(id), max(id))`, so the matrix is
//! symmetric by construction. Unregistered pairs read 0, the diagonal 1.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::copula::CopulaType;
use crate::stochast::StochastId;
use crate::validation::ValidationReport;

/// How correlations are applied when mapping u-space to x-space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationType {
    /// Linear correlation of the standard normal images (Nataf).
    #[default]
    Gaussian,
    /// Pairwise copulas.
    Copulas,
}

/// Value stored for one pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrelationEntry {
    /// Correlation coefficient, or copula parameter when `copula` is set.
    pub value: f64,
    pub copula: Option<CopulaType>,
}

fn key(a: StochastId, b: StochastId) -> (StochastId, StochastId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    correlation_type: CorrelationType,
    entries: BTreeMap<(StochastId, StochastId), CorrelationEntry>,
}

impl CorrelationMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn correlation_type(&self) -> CorrelationType {
        self.correlation_type
    }

    pub fn set_correlation_type(&mut self, correlation_type: CorrelationType) {
        self.correlation_type = correlation_type;
    }

    /// Register a correlation coefficient for a pair.
    pub fn set_correlation(&mut self, a: impl Into<StochastId>, b: impl Into<StochastId>, value: f64) {
        let (a, b) = (a.into(), b.into());
        if a == b {
            tracing::debug!("ignoring correlation of a variable with itself");
            return;
        }
        self.entries
            .insert(key(a, b), CorrelationEntry { value, copula: None });
    }

    /// Couple a pair with a copula; `a` is the conditioning variable.
    pub fn set_copula(
        &mut self,
        a: impl Into<StochastId>,
        b: impl Into<StochastId>,
        copula: CopulaType,
        parameter: f64,
    ) {
        let (a, b) = (a.into(), b.into());
        if a == b {
            return;
        }
        self.entries.insert(
            key(a, b),
            CorrelationEntry {
                value: parameter,
                copula: Some(copula),
            },
        );
    }

    /// Correlation coefficient of a pair: 1 on the diagonal, 0 if unregistered.
    ///
    /// Copula pairs report 0 here; see [`CorrelationMatrix::copula`].
    pub fn get_correlation(&self, a: impl Into<StochastId>, b: impl Into<StochastId>) -> f64 {
        let (a, b) = (a.into(), b.into());
        if a == b {
            return 1.0;
        }
        match self.entries.get(&key(a, b)) {
            Some(CorrelationEntry { value, copula: None }) => *value,
            _ => 0.0,
        }
    }

    /// Copula type and parameter of a pair, if one was registered.
    pub fn copula(&self, a: impl Into<StochastId>, b: impl Into<StochastId>) -> Option<(CopulaType, f64)> {
        self.entries
            .get(&key(a.into(), b.into()))
            .and_then(|e| e.copula.map(|c| (c, e.value)))
    }

    pub fn remove(&mut self, a: impl Into<StochastId>, b: impl Into<StochastId>) {
        self.entries.remove(&key(a.into(), b.into()));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Registered pairs in deterministic order.
    pub fn pairs(&self) -> impl Iterator<Item = ((StochastId, StochastId), CorrelationEntry)> + '_ {
        self.entries.iter().map(|(k, v)| (*k, *v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when no pair carries a non-zero correlation or a copula.
    pub fn is_identity(&self) -> bool {
        self.entries
            .values()
            .all(|e| e.copula.is_none() && e.value == 0.0)
    }

    /// Check coefficient ranges and copula parameters.
    pub fn validate_into(&self, report: &mut ValidationReport) {
        for entry in self.entries.values() {
            match entry.copula {
                None => {
                    report.check_at_least("Correlation Matrix", "correlation", entry.value, -1.0);
                    report.check_at_most("Correlation Matrix", "correlation", entry.value, 1.0);
                }
                Some(copula) => {
                    if let Some(text) = copula.check_parameter(entry.value) {
                        report.error("Correlation Matrix", text);
                    }
                }
            }
        }
    }
}

/// Correlation of each variable with itself at another position (array
/// elements, sections of a length-effect analysis).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelfCorrelationMatrix {
    values: BTreeMap<StochastId, f64>,
}

impl SelfCorrelationMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_self_correlation(&mut self, stochast: impl Into<StochastId>, value: f64) {
        self.values.insert(stochast.into(), value);
    }

    /// Registered value, `None` when unset.
    pub fn get_self_correlation(&self, stochast: impl Into<StochastId>) -> Option<f64> {
        self.values.get(&stochast.into()).copied()
    }

    /// Registered value or `default`.
    pub fn get_or(&self, stochast: impl Into<StochastId>, default: f64) -> f64 {
        self.get_self_correlation(stochast).unwrap_or(default)
    }

    pub fn iter(&self) -> impl Iterator<Item = (StochastId, f64)> + '_ {
        self.values.iter().map(|(k, v)| (*k, *v))
    }

    pub fn validate_into(&self, report: &mut ValidationReport) {
        for value in self.values.values() {
            report.check_at_least("Self Correlation Matrix", "correlation", *value, -1.0);
            report.check_at_most("Self Correlation Matrix", "correlation", *value, 1.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Stochast;

    #[test]
    fn test_symmetric_lookup() {
        let a = Stochast::new("a");
        let b = Stochast::new("b");
        let c = Stochast::new("c");
        let mut matrix = CorrelationMatrix::new();
        matrix.set_correlation(&a, &b, 0.8);
        assert_eq!(matrix.get_correlation(&a, &b), 0.8);
        assert_eq!(matrix.get_correlation(&b, &a), 0.8);
        assert_eq!(matrix.get_correlation(&a, &c), 0.0);
        assert_eq!(matrix.get_correlation(&c, &c), 1.0);
    }

    #[test]
    fn test_copula_entries() {
        let a = Stochast::new("a");
        let b = Stochast::new("b");
        let mut matrix = CorrelationMatrix::new();
        matrix.set_copula(&a, &b, CopulaType::Clayton, 2.0);
        assert_eq!(matrix.copula(&b, &a), Some((CopulaType::Clayton, 2.0)));
        assert_eq!(matrix.get_correlation(&a, &b), 0.0);
        assert!(!matrix.is_identity());
    }

    #[test]
    fn test_out_of_range_reported() {
        let a = Stochast::new("a");
        let b = Stochast::new("b");
        let mut matrix = CorrelationMatrix::new();
        matrix.set_correlation(&a, &b, 1.5);
        let mut report = ValidationReport::new();
        matrix.validate_into(&mut report);
        assert!(!report.is_valid());
    }

    #[test]
    fn test_self_correlation_default() {
        let a = Stochast::new("a");
        let mut matrix = SelfCorrelationMatrix::new();
        assert_eq!(matrix.get_self_correlation(&a), None);
        matrix.set_self_correlation(&a, 0.4);
        assert_eq!(matrix.get_or(&a, 1.0), 0.4);
    }
}

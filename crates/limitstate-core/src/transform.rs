//! Mapping between independent standard normal space and physical space.
//!
//! Three coordinate systems are involved:
//!
//! * **u**: independent standard normal, one coordinate per stochastic
//!   scalar dimension. Solvers search and sample here.
//! * **z**: correlated standard normal, `z = L u` with `L` the Cholesky
//!   factor of the correlation matrix, optionally followed by pairwise
//!   copulas.
//! * **x**: physical values, `x_i = F_i^{-1}(Φ(z_i))`, with conditional
//!   variables evaluated after their source.
//!
//! Array variables expand into one dimension per element. Deterministic
//! dimensions take no u-coordinate and sit at their fixed value.

use nalgebra::{Cholesky, DMatrix};
use tracing::debug;

use crate::copula::CopulaType;
use crate::correlation::{CorrelationMatrix, CorrelationType, SelfCorrelationMatrix};
use crate::distributions::DistributionType;
use crate::stochast::{Stochast, StochastId};
use crate::validation::ValidationReport;

const PIVOT_TOLERANCE: f64 = 1e-10;

/// One scalar input dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct Dimension {
    /// Index of the owning variable.
    pub variable: usize,
    /// Position within an array variable, 0 for scalars.
    pub index: usize,
    /// Position in the u-vector, `None` for deterministic dimensions.
    pub u_index: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct CopulaPair {
    first: usize,
    second: usize,
    copula: CopulaType,
    parameter: f64,
}

#[derive(Debug, Clone)]
pub struct SpaceTransform {
    variables: Vec<Stochast>,
    dimensions: Vec<Dimension>,
    u_dimensions: Vec<usize>,
    /// Lower-triangular factor over the u-dimensions, `None` when uncorrelated.
    cholesky: Option<DMatrix<f64>>,
    copula_pairs: Vec<CopulaPair>,
    sources: Vec<Option<usize>>,
    order: Vec<usize>,
}

/// Cholesky factor of a positive semi-definite matrix.
///
/// Tries the regular decomposition first; on failure falls back to an
/// outer-product scheme that leaves zero columns at zero pivots (e.g. for
/// fully correlated pairs). Returns `None` when the matrix is indefinite.
pub fn semi_definite_cholesky(matrix: &DMatrix<f64>) -> Option<DMatrix<f64>> {
    if let Some(chol) = Cholesky::new(matrix.clone()) {
        return Some(chol.l());
    }
    debug!("correlation matrix is singular, using semi-definite factorization");
    let n = matrix.nrows();
    let mut l = DMatrix::<f64>::zeros(n, n);
    for j in 0..n {
        let mut diagonal = matrix[(j, j)];
        for k in 0..j {
            diagonal -= l[(j, k)] * l[(j, k)];
        }
        if diagonal < -PIVOT_TOLERANCE {
            return None;
        }
        if diagonal <= PIVOT_TOLERANCE {
            // zero pivot: the remaining column must vanish as well
            for i in (j + 1)..n {
                let mut s = matrix[(i, j)];
                for k in 0..j {
                    s -= l[(i, k)] * l[(j, k)];
                }
                if s.abs() > 1e-6 {
                    return None;
                }
            }
            continue;
        }
        let pivot = diagonal.sqrt();
        l[(j, j)] = pivot;
        for i in (j + 1)..n {
            let mut s = matrix[(i, j)];
            for k in 0..j {
                s -= l[(i, k)] * l[(j, k)];
            }
            l[(i, j)] = s / pivot;
        }
    }
    Some(l)
}

impl SpaceTransform {
    /// Build the transform, validating correlations and conditional sources.
    pub fn new(
        variables: Vec<Stochast>,
        correlation: &CorrelationMatrix,
        self_correlation: Option<&SelfCorrelationMatrix>,
    ) -> Result<Self, ValidationReport> {
        let mut report = ValidationReport::new();

        let mut dimensions = Vec::new();
        let mut u_dimensions = Vec::new();
        for (v, variable) in variables.iter().enumerate() {
            for index in 0..variable.size() {
                let element = variable.element(index);
                let stochastic = element.distribution() != DistributionType::Deterministic;
                let u_index = if stochastic {
                    u_dimensions.push(dimensions.len());
                    Some(u_dimensions.len() - 1)
                } else {
                    None
                };
                dimensions.push(Dimension {
                    variable: v,
                    index,
                    u_index,
                });
            }
        }

        let sources = Self::resolve_sources(&variables, &dimensions, &mut report);
        let order = Self::evaluation_order(&variables, &dimensions, &sources, &mut report);

        let n = u_dimensions.len();
        let mut matrix = DMatrix::<f64>::identity(n, n);
        let mut correlated = false;
        for a in 0..n {
            for b in (a + 1)..n {
                let da = &dimensions[u_dimensions[a]];
                let db = &dimensions[u_dimensions[b]];
                let va = &variables[da.variable];
                let vb = &variables[db.variable];
                let rho = if da.variable == db.variable {
                    self_correlation.map_or(0.0, |m| m.get_or(va.id(), 0.0))
                } else if va.is_array() && vb.is_array() && da.index != db.index {
                    0.0
                } else {
                    correlation.get_correlation(va.id(), vb.id())
                };
                if rho != 0.0 {
                    correlated = true;
                    matrix[(a, b)] = rho;
                    matrix[(b, a)] = rho;
                }
            }
        }

        let cholesky = if correlated {
            match semi_definite_cholesky(&matrix) {
                Some(l) => Some(l),
                None => {
                    report.error("Correlation Matrix", "Cholesky decomposition fails");
                    None
                }
            }
        } else {
            None
        };

        let copula_pairs = Self::copula_pairs(&variables, &dimensions, correlation, &mut report);

        if report.is_valid() {
            Ok(Self {
                variables,
                dimensions,
                u_dimensions,
                cholesky,
                copula_pairs,
                sources,
                order,
            })
        } else {
            Err(report)
        }
    }

    /// Uncorrelated transform over `variables`.
    pub fn independent(variables: Vec<Stochast>) -> Result<Self, ValidationReport> {
        Self::new(variables, &CorrelationMatrix::new(), None)
    }

    fn find_variable(variables: &[Stochast], id: StochastId) -> Option<usize> {
        variables.iter().position(|v| v.id() == id)
    }

    fn first_dimension(dimensions: &[Dimension], variable: usize) -> Option<usize> {
        dimensions.iter().position(|d| d.variable == variable)
    }

    fn resolve_sources(
        variables: &[Stochast],
        dimensions: &[Dimension],
        report: &mut ValidationReport,
    ) -> Vec<Option<usize>> {
        dimensions
            .iter()
            .map(|d| {
                let variable = &variables[d.variable];
                let element = variable.element(d.index);
                let conditional = if element.is_conditional() { element } else { variable };
                if !conditional.is_conditional() {
                    return None;
                }
                let source_id = conditional.conditional_source()?;
                let Some(source) = Self::find_variable(variables, source_id) else {
                    report.error(
                        variable.name(),
                        "conditional source is not one of the variables",
                    );
                    return None;
                };
                let first = Self::first_dimension(dimensions, source)?;
                let source_size = variables[source].size();
                if source_size == variable.size() {
                    Some(first + d.index)
                } else {
                    Some(first)
                }
            })
            .collect()
    }

    fn evaluation_order(
        variables: &[Stochast],
        dimensions: &[Dimension],
        sources: &[Option<usize>],
        report: &mut ValidationReport,
    ) -> Vec<usize> {
        let n = dimensions.len();
        let mut done = vec![false; n];
        let mut order = Vec::with_capacity(n);
        while order.len() < n {
            let mut progressed = false;
            for d in 0..n {
                if !done[d] && sources[d].map_or(true, |s| done[s]) {
                    done[d] = true;
                    order.push(d);
                    progressed = true;
                }
            }
            if !progressed {
                for d in (0..n).filter(|&d| !done[d]) {
                    report.error(
                        variables[dimensions[d].variable].name(),
                        "conditional sources form a cycle",
                    );
                    order.push(d);
                }
                break;
            }
        }
        order
    }

    fn copula_pairs(
        variables: &[Stochast],
        dimensions: &[Dimension],
        correlation: &CorrelationMatrix,
        report: &mut ValidationReport,
    ) -> Vec<CopulaPair> {
        let mut pairs: Vec<CopulaPair> = Vec::new();
        let has_copulas = correlation.pairs().any(|(_, e)| e.copula.is_some());
        if !has_copulas {
            return pairs;
        }
        if correlation.correlation_type() != CorrelationType::Copulas {
            report.warning(
                "Correlation Matrix",
                "copulas are ignored unless the correlation type is copulas",
            );
            return pairs;
        }
        for ((a, b), entry) in correlation.pairs() {
            let Some(copula) = entry.copula else {
                continue;
            };
            let (Some(ia), Some(ib)) = (
                Self::find_variable(variables, a),
                Self::find_variable(variables, b),
            ) else {
                continue;
            };
            // the variable bound first conditions the second
            let (ia, ib) = if ia <= ib { (ia, ib) } else { (ib, ia) };
            let ua = Self::first_dimension(dimensions, ia).and_then(|d| dimensions[d].u_index);
            let ub = Self::first_dimension(dimensions, ib).and_then(|d| dimensions[d].u_index);
            let (Some(first), Some(second)) = (ua, ub) else {
                continue;
            };
            if pairs.iter().any(|p| p.second == second) {
                report.error(
                    variables[ib].name(),
                    "variable is the dependent member of more than one copula",
                );
                continue;
            }
            pairs.push(CopulaPair {
                first,
                second,
                copula,
                parameter: entry.value,
            });
        }
        pairs.sort_by_key(|p| (p.second, p.first));
        pairs
    }

    pub fn variables(&self) -> &[Stochast] {
        &self.variables
    }

    /// All scalar dimensions in binding order.
    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    pub fn dimension_count(&self) -> usize {
        self.dimensions.len()
    }

    /// Number of u-coordinates (stochastic dimensions).
    pub fn u_count(&self) -> usize {
        self.u_dimensions.len()
    }

    /// Dimension index of each u-coordinate.
    pub fn u_dimensions(&self) -> &[usize] {
        &self.u_dimensions
    }

    /// Owning variable of a dimension.
    pub fn variable(&self, dimension: usize) -> &Stochast {
        &self.variables[self.dimensions[dimension].variable]
    }

    /// Distribution definition of a dimension (the array element if bound).
    pub fn stochast(&self, dimension: usize) -> &Stochast {
        let d = &self.dimensions[dimension];
        self.variables[d.variable].element(d.index)
    }

    pub fn is_correlated(&self) -> bool {
        self.cholesky.is_some() || !self.copula_pairs.is_empty()
    }

    /// Correlated standard normal values for independent `u`.
    pub fn correlate(&self, u: &[f64]) -> Vec<f64> {
        let mut z = match &self.cholesky {
            Some(l) => {
                let n = u.len();
                (0..n)
                    .map(|i| (0..=i).map(|k| l[(i, k)] * u[k]).sum())
                    .collect()
            }
            None => u.to_vec(),
        };
        for pair in &self.copula_pairs {
            z[pair.second] = pair.copula.correlate(pair.parameter, z[pair.first], z[pair.second]);
        }
        z
    }

    /// Independent `u` for correlated standard normal `z`.
    pub fn decorrelate(&self, z: &[f64]) -> Vec<f64> {
        let mut z = z.to_vec();
        for pair in self.copula_pairs.iter().rev() {
            z[pair.second] = pair
                .copula
                .decorrelate(pair.parameter, z[pair.first], z[pair.second]);
        }
        match &self.cholesky {
            Some(l) => {
                let n = z.len();
                let mut u = vec![0.0; n];
                for i in 0..n {
                    let pivot = l[(i, i)];
                    if pivot.abs() <= PIVOT_TOLERANCE {
                        continue;
                    }
                    let s: f64 = (0..i).map(|k| l[(i, k)] * u[k]).sum();
                    u[i] = (z[i] - s) / pivot;
                }
                u
            }
            None => z,
        }
    }

    /// Physical values of every dimension for correlated `z`.
    pub fn x_from_z(&self, z: &[f64]) -> Vec<f64> {
        let mut x = vec![f64::NAN; self.dimensions.len()];
        for &d in &self.order {
            let dimension = &self.dimensions[d];
            let zd = dimension.u_index.map_or(0.0, |k| z[k]);
            let stochast = self.stochast(d);
            x[d] = match self.sources[d] {
                Some(source) => {
                    let conditional = if stochast.is_conditional() {
                        stochast
                    } else {
                        self.variable(d)
                    };
                    conditional.x_from_u_and_source(zd, x[source])
                }
                None => stochast.x_from_u(zd),
            };
        }
        x
    }

    /// Physical values of every dimension for independent `u`.
    pub fn x_from_u(&self, u: &[f64]) -> Vec<f64> {
        self.x_from_z(&self.correlate(u))
    }

    /// Independent `u` for physical values of every dimension.
    pub fn u_from_x(&self, x: &[f64]) -> Vec<f64> {
        let z: Vec<f64> = self
            .u_dimensions
            .iter()
            .map(|&d| {
                let stochast = self.stochast(d);
                match self.sources[d] {
                    Some(source) => {
                        let conditional = if stochast.is_conditional() {
                            stochast
                        } else {
                            self.variable(d)
                        };
                        conditional.u_from_x_and_source(x[d], x[source])
                    }
                    None => stochast.u_from_x(x[d]),
                }
            })
            .collect();
        self.decorrelate(&z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distributions::{ConditionalValue, Parameter};

    #[test]
    fn test_deterministic_takes_no_u() {
        let t = SpaceTransform::independent(vec![
            Stochast::normal("a", 1.0, 2.0),
            Stochast::deterministic("b", 5.0),
        ])
        .unwrap();
        assert_eq!(t.dimension_count(), 2);
        assert_eq!(t.u_count(), 1);
        let x = t.x_from_u(&[1.0]);
        assert_eq!(x, vec![3.0, 5.0]);
    }

    #[test]
    fn test_fully_correlated_pair() {
        let a = Stochast::normal("a", 0.0, 1.0);
        let b = Stochast::normal("b", 0.0, 1.0);
        let mut matrix = CorrelationMatrix::new();
        matrix.set_correlation(&a, &b, 1.0);
        let t = SpaceTransform::new(vec![a, b], &matrix, None).unwrap();
        let z = t.correlate(&[0.7, 0.3]);
        assert!((z[0] - 0.7).abs() < 1e-12);
        assert!((z[1] - 0.7).abs() < 1e-12);
        let u = t.decorrelate(&z);
        assert!((u[0] - 0.7).abs() < 1e-12);
        assert_eq!(u[1], 0.0);
    }

    #[test]
    fn test_indefinite_matrix_fails() {
        let a = Stochast::normal("a", 0.0, 1.0);
        let b = Stochast::normal("b", 0.0, 1.0);
        let c = Stochast::normal("c", 0.0, 1.0);
        let mut matrix = CorrelationMatrix::new();
        matrix.set_correlation(&a, &b, 0.9);
        matrix.set_correlation(&b, &c, 0.9);
        matrix.set_correlation(&a, &c, -0.9);
        let report = SpaceTransform::new(vec![a, b, c], &matrix, None).unwrap_err();
        assert_eq!(
            report.messages()[0].to_string(),
            "Error: Correlation Matrix => Cholesky decomposition fails"
        );
    }

    #[test]
    fn test_partial_correlation_round_trip() {
        let a = Stochast::normal("a", 10.0, 2.0);
        let b = Stochast::uniform("b", 0.0, 1.0);
        let mut matrix = CorrelationMatrix::new();
        matrix.set_correlation(&a, &b, 0.5);
        let t = SpaceTransform::new(vec![a, b], &matrix, None).unwrap();
        let u = [0.4, -1.2];
        let x = t.x_from_u(&u);
        let back = t.u_from_x(&x);
        assert!((back[0] - u[0]).abs() < 1e-8);
        assert!((back[1] - u[1]).abs() < 1e-8);
    }

    #[test]
    fn test_array_self_correlation() {
        let mut a = Stochast::normal("a", 0.0, 1.0);
        a.set_is_array(true);
        a.set_array_size(3);
        let mut self_correlation = SelfCorrelationMatrix::new();
        self_correlation.set_self_correlation(&a, 1.0);
        let t = SpaceTransform::new(vec![a], &CorrelationMatrix::new(), Some(&self_correlation))
            .unwrap();
        assert_eq!(t.u_count(), 3);
        let x = t.x_from_u(&[1.5, -3.0, 2.0]);
        assert!(x.iter().all(|v| (v - 1.5).abs() < 1e-12));
    }

    #[test]
    fn test_conditional_source_evaluated_first() {
        let mut dependent = Stochast::normal("d", 0.0, 1.0);
        let source = Stochast::uniform("s", 0.0, 10.0);
        dependent.set_conditional(true);
        dependent.set_conditional_source(Some(source.id()));
        dependent.add_conditional_value(ConditionalValue::new(0.0).with(Parameter::Location, 0.0));
        dependent.add_conditional_value(ConditionalValue::new(10.0).with(Parameter::Location, 10.0));
        dependent.initialize_conditional_values();
        // dependent bound before its source
        let t = SpaceTransform::independent(vec![dependent, source]).unwrap();
        let x = t.x_from_u(&[0.0, 0.0]);
        assert!((x[1] - 5.0).abs() < 1e-9);
        assert!((x[0] - 5.0).abs() < 1e-9);
        let u = t.u_from_x(&x);
        assert!(u[0].abs() < 1e-8);
    }

    #[test]
    fn test_missing_conditional_source() {
        let mut dependent = Stochast::normal("d", 0.0, 1.0);
        dependent.set_conditional(true);
        dependent.set_conditional_source(Some(Stochast::new("elsewhere").id()));
        let report = SpaceTransform::independent(vec![dependent]).unwrap_err();
        assert!(report.messages()[0].to_string().starts_with("Error: d =>"));
    }

    #[test]
    fn test_copula_pair_round_trip() {
        let a = Stochast::normal("a", 0.0, 1.0);
        let b = Stochast::normal("b", 0.0, 1.0);
        let mut matrix = CorrelationMatrix::new();
        matrix.set_correlation_type(CorrelationType::Copulas);
        matrix.set_copula(&a, &b, CopulaType::Frank, 4.0);
        let t = SpaceTransform::new(vec![a, b], &matrix, None).unwrap();
        assert!(t.is_correlated());
        let u = [1.1, -0.3];
        let back = t.decorrelate(&t.correlate(&u));
        assert!((back[1] - u[1]).abs() < 1e-7);
    }
}

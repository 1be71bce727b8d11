//! Tabulated distributions: discrete points, histogram bins and cdf curves.
//!
//! Tables are built once from the user-supplied values (sorted by x,
//! amounts normalized) and cached on the owning stochast.

use super::{DiscreteValue, FragilityValue, HistogramValue};

const SEARCH_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum EmpiricalTable {
    /// Point masses; the CDF is a step function.
    Points { xs: Vec<f64>, probabilities: Vec<f64> },
    /// Uniform density within each bin; zero-width bins are point masses.
    Bins {
        lower: Vec<f64>,
        upper: Vec<f64>,
        probabilities: Vec<f64>,
    },
    /// Piecewise-linear CDF through `(x, p)`; mass below the first point is
    /// lumped at the first x and mass above the last point at the last x.
    Curve { xs: Vec<f64>, ps: Vec<f64> },
    Empty,
}

impl EmpiricalTable {
    pub(crate) fn points(values: &[DiscreteValue]) -> Self {
        let mut sorted: Vec<DiscreteValue> = values
            .iter()
            .copied()
            .filter(|v| v.amount > 0.0 && v.x.is_finite())
            .collect();
        sorted.sort_by(|a, b| a.x.total_cmp(&b.x));
        let total: f64 = sorted.iter().map(|v| v.amount).sum();
        if sorted.is_empty() || total <= 0.0 {
            return Self::Empty;
        }
        let mut xs: Vec<f64> = Vec::with_capacity(sorted.len());
        let mut probabilities: Vec<f64> = Vec::with_capacity(sorted.len());
        for v in sorted {
            match xs.last() {
                Some(&last) if last == v.x => {
                    if let Some(p) = probabilities.last_mut() {
                        *p += v.amount / total;
                    }
                }
                _ => {
                    xs.push(v.x);
                    probabilities.push(v.amount / total);
                }
            }
        }
        Self::Points { xs, probabilities }
    }

    pub(crate) fn bins(values: &[HistogramValue]) -> Self {
        let mut sorted: Vec<HistogramValue> = values
            .iter()
            .copied()
            .filter(|v| v.amount > 0.0 && v.upper_bound >= v.lower_bound)
            .collect();
        sorted.sort_by(|a, b| {
            a.lower_bound
                .total_cmp(&b.lower_bound)
                .then(a.upper_bound.total_cmp(&b.upper_bound))
        });
        let total: f64 = sorted.iter().map(|v| v.amount).sum();
        if sorted.is_empty() || total <= 0.0 {
            return Self::Empty;
        }
        Self::Bins {
            lower: sorted.iter().map(|v| v.lower_bound).collect(),
            upper: sorted.iter().map(|v| v.upper_bound).collect(),
            probabilities: sorted.iter().map(|v| v.amount / total).collect(),
        }
    }

    pub(crate) fn curve(values: &[FragilityValue]) -> Self {
        let mut sorted: Vec<FragilityValue> = values
            .iter()
            .copied()
            .filter(|v| v.x.is_finite() && !v.reliability_index.is_nan())
            .collect();
        if sorted.is_empty() {
            return Self::Empty;
        }
        sorted.sort_by(|a, b| a.x.total_cmp(&b.x));
        let xs = sorted.iter().map(|v| v.x).collect();
        // enforce a non-decreasing cdf
        let mut ps: Vec<f64> = Vec::with_capacity(sorted.len());
        for v in &sorted {
            let p = v.probability();
            let floor = ps.last().copied().unwrap_or(0.0);
            ps.push(p.max(floor));
        }
        Self::Curve { xs, ps }
    }

    /// `(P(X <= x), P(X > x))`.
    pub(crate) fn probabilities(&self, x: f64) -> (f64, f64) {
        match self {
            Self::Points { xs, probabilities } => {
                let mut p = 0.0;
                let mut q = 0.0;
                for (xi, pi) in xs.iter().zip(probabilities) {
                    if *xi <= x {
                        p += pi;
                    } else {
                        q += pi;
                    }
                }
                (p, q)
            }
            Self::Bins {
                lower,
                upper,
                probabilities,
            } => {
                let mut p = 0.0;
                let mut q = 0.0;
                for i in 0..lower.len() {
                    let fraction = if x >= upper[i] {
                        1.0
                    } else if x < lower[i] {
                        0.0
                    } else {
                        (x - lower[i]) / (upper[i] - lower[i])
                    };
                    p += probabilities[i] * fraction;
                    q += probabilities[i] * (1.0 - fraction);
                }
                (p, q)
            }
            Self::Curve { xs, ps } => {
                let n = xs.len();
                if x < xs[0] {
                    return (0.0, 1.0);
                }
                if x >= xs[n - 1] {
                    return (1.0, 0.0);
                }
                let i = xs.partition_point(|&xi| xi <= x).saturating_sub(1);
                let (x0, x1) = (xs[i], xs[i + 1]);
                let p = if x1 > x0 {
                    ps[i] + (ps[i + 1] - ps[i]) * (x - x0) / (x1 - x0)
                } else {
                    ps[i + 1]
                };
                (p, 1.0 - p)
            }
            Self::Empty => (f64::NAN, f64::NAN),
        }
    }

    /// Density (probability mass at the points of a discrete table).
    pub(crate) fn pdf(&self, x: f64) -> f64 {
        match self {
            Self::Points { xs, probabilities } => xs
                .iter()
                .zip(probabilities)
                .filter(|(xi, _)| **xi == x)
                .map(|(_, p)| *p)
                .sum(),
            Self::Bins {
                lower,
                upper,
                probabilities,
            } => (0..lower.len())
                .filter(|&i| x >= lower[i] && x <= upper[i] && upper[i] > lower[i])
                .map(|i| probabilities[i] / (upper[i] - lower[i]))
                .sum(),
            Self::Curve { xs, ps } => {
                let n = xs.len();
                if n < 2 || x < xs[0] || x > xs[n - 1] {
                    return 0.0;
                }
                let i = xs.partition_point(|&xi| xi <= x).saturating_sub(1).min(n - 2);
                if xs[i + 1] > xs[i] {
                    (ps[i + 1] - ps[i]) / (xs[i + 1] - xs[i])
                } else {
                    0.0
                }
            }
            Self::Empty => f64::NAN,
        }
    }

    /// Quantile for non-exceedance probability `p`.
    pub(crate) fn x_from_p(&self, p: f64) -> f64 {
        match self {
            Self::Points { xs, probabilities } => {
                let mut cumulative = 0.0;
                for (xi, pi) in xs.iter().zip(probabilities) {
                    cumulative += pi;
                    if cumulative >= p - SEARCH_EPSILON {
                        return *xi;
                    }
                }
                xs[xs.len() - 1]
            }
            Self::Bins {
                lower,
                upper,
                probabilities,
            } => {
                let mut cumulative = 0.0;
                for i in 0..lower.len() {
                    let next = cumulative + probabilities[i];
                    if next >= p - SEARCH_EPSILON {
                        if upper[i] <= lower[i] {
                            return lower[i];
                        }
                        let fraction = ((p - cumulative) / probabilities[i]).clamp(0.0, 1.0);
                        return lower[i] + fraction * (upper[i] - lower[i]);
                    }
                    cumulative = next;
                }
                upper[upper.len() - 1]
            }
            Self::Curve { xs, ps } => {
                let n = xs.len();
                if p <= ps[0] {
                    return xs[0];
                }
                if p >= ps[n - 1] {
                    return xs[n - 1];
                }
                let i = ps.partition_point(|&pi| pi < p).saturating_sub(1);
                let (p0, p1) = (ps[i], ps[i + 1]);
                if p1 > p0 {
                    xs[i] + (xs[i + 1] - xs[i]) * (p - p0) / (p1 - p0)
                } else {
                    xs[i + 1]
                }
            }
            Self::Empty => f64::NAN,
        }
    }

    /// `(mean, standard deviation)` of the table.
    pub(crate) fn moments(&self) -> (f64, f64) {
        // (probability, first moment, second moment) contributions
        let parts: Vec<(f64, f64, f64)> = match self {
            Self::Points { xs, probabilities } => xs
                .iter()
                .zip(probabilities)
                .map(|(x, p)| (*p, *x, x * x))
                .collect(),
            Self::Bins {
                lower,
                upper,
                probabilities,
            } => (0..lower.len())
                .map(|i| {
                    let (a, b) = (lower[i], upper[i]);
                    (probabilities[i], (a + b) / 2.0, (a * a + a * b + b * b) / 3.0)
                })
                .collect(),
            Self::Curve { xs, ps } => {
                let n = xs.len();
                let mut parts = vec![(ps[0], xs[0], xs[0] * xs[0])];
                for i in 0..n - 1 {
                    let (a, b) = (xs[i], xs[i + 1]);
                    parts.push((ps[i + 1] - ps[i], (a + b) / 2.0, (a * a + a * b + b * b) / 3.0));
                }
                parts.push((1.0 - ps[n - 1], xs[n - 1], xs[n - 1] * xs[n - 1]));
                parts
            }
            Self::Empty => return (f64::NAN, f64::NAN),
        };
        let mean: f64 = parts.iter().map(|(p, m1, _)| p * m1).sum();
        let second: f64 = parts.iter().map(|(p, _, m2)| p * m2).sum();
        (mean, (second - mean * mean).max(0.0).sqrt())
    }

    pub(crate) fn special_values(&self) -> Vec<f64> {
        match self {
            Self::Points { xs, .. } => xs.clone(),
            Self::Bins { lower, upper, .. } => {
                let mut v: Vec<f64> = lower.iter().chain(upper).copied().collect();
                v.sort_by(f64::total_cmp);
                v.dedup();
                v
            }
            Self::Curve { xs, .. } => xs.clone(),
            Self::Empty => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discrete_mean_is_amount_weighted() {
        let table = EmpiricalTable::points(&[DiscreteValue::new(2.0, 1.0), DiscreteValue::new(3.0, 3.0)]);
        let (mean, _) = table.moments();
        assert!((mean - 2.75).abs() < 1e-12);
        assert_eq!(table.x_from_p(0.2), 2.0);
        assert_eq!(table.x_from_p(0.25), 2.0);
        assert_eq!(table.x_from_p(0.3), 3.0);
        assert_eq!(table.probabilities(2.5), (0.25, 0.75));
    }

    #[test]
    fn test_duplicate_points_merge() {
        let table = EmpiricalTable::points(&[
            DiscreteValue::new(1.0, 1.0),
            DiscreteValue::new(1.0, 1.0),
            DiscreteValue::new(0.0, 2.0),
        ]);
        assert_eq!(table.special_values(), vec![0.0, 1.0]);
        assert!((table.pdf(1.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_histogram_linear_cdf() {
        let table = EmpiricalTable::bins(&[
            HistogramValue::new(0.0, 1.0, 1.0),
            HistogramValue::new(1.0, 3.0, 3.0),
        ]);
        let (p, q) = table.probabilities(2.0);
        assert!((p - 0.625).abs() < 1e-12);
        assert!((q - 0.375).abs() < 1e-12);
        assert!((table.x_from_p(0.625) - 2.0).abs() < 1e-12);
        // mass 1/4 spread over a width of 1
        assert!((table.pdf(0.5) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_curve_interpolates_in_probability() {
        let table = EmpiricalTable::curve(&[
            FragilityValue::new(1.0, -1.0),
            FragilityValue::new(3.0, 1.0),
        ]);
        let p0 = crate::standard_normal::p_from_u(-1.0);
        let p1 = crate::standard_normal::p_from_u(1.0);
        let mid = 0.5 * (p0 + p1);
        assert!((table.x_from_p(mid) - 2.0).abs() < 1e-9);
        // clamped outside the tabulated range
        assert_eq!(table.x_from_p(0.01), 1.0);
        assert_eq!(table.x_from_p(0.99), 3.0);
    }
}

//! Parameter estimation from samples.
//!
//! Maximum likelihood where it has a closed form or a one-dimensional
//! equation (uniform, exponential, log-normal, Weibull, Rayleigh, Pareto,
//! Poisson); method of moments otherwise. A pinned shift is kept fixed.

use super::closed_form::set_moments;
use super::{DiscreteValue, DistributionType, HistogramValue, Parameters};
use crate::roots::invert_monotone;
use crate::statistics::weighted_mean_deviation;
use DistributionType::*;

/// Outcome of a fit: new scalar parameters or a new table.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Fitted {
    Parameters(Parameters),
    Discrete(Vec<DiscreteValue>),
    Histogram(Vec<HistogramValue>),
}

fn mean_sd(values: &[f64]) -> (f64, f64) {
    weighted_mean_deviation(values, &vec![1.0; values.len()])
}

fn range(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}

/// Offset just below the sample minimum used when a shift must lie below the data.
fn below_minimum(values: &[f64]) -> f64 {
    let (lo, hi) = range(values);
    lo - 1e-3 * (hi - lo).max(lo.abs()).max(1e-9)
}

fn weibull_shape_mle(t: &[f64]) -> f64 {
    let logs: Vec<f64> = t.iter().map(|v| v.ln()).collect();
    let mean_log = logs.iter().sum::<f64>() / logs.len() as f64;
    let profile = |k: f64| {
        let mut num = 0.0;
        let mut den = 0.0;
        for (ti, li) in t.iter().zip(&logs) {
            let w = ti.powf(k);
            num += w * li;
            den += w;
        }
        num / den - 1.0 / k - mean_log
    };
    invert_monotone(|k| profile(k.clamp(0.02, 200.0)), 0.0, 0.1, 20.0, 1e-10).clamp(0.02, 200.0)
}

/// Estimate the distribution of `kind` from `values`.
///
/// Returns `None` when the sample is too small or the family cannot be fitted.
pub(crate) fn fit(
    kind: DistributionType,
    current: &Parameters,
    values: &[f64],
    shift: Option<f64>,
) -> Option<Fitted> {
    let values: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let (mean, sd) = mean_sd(&values);
    let (lo, hi) = range(&values);
    let mut p = *current;
    if let Some(s) = shift {
        p.shift = s;
    }

    match kind {
        Deterministic | Poisson => p.location = mean,
        Normal => {
            p.location = mean;
            p.scale = if values.len() > 1 { sd } else { 0.0 };
        }
        LogNormal => {
            p.shift = shift.unwrap_or(if lo > 0.0 { 0.0 } else { below_minimum(&values) });
            let logs: Vec<f64> = values
                .iter()
                .filter(|v| **v > p.shift)
                .map(|v| (v - p.shift).ln())
                .collect();
            if logs.is_empty() {
                return None;
            }
            let (m, s) = mean_sd(&logs);
            p.location = m;
            p.scale = if logs.len() > 1 { s } else { 0.0 };
        }
        Uniform => {
            p.minimum = lo;
            p.maximum = hi;
        }
        Triangular => {
            p.minimum = lo;
            p.maximum = hi;
            p.shift = (3.0 * mean - lo - hi).clamp(lo, hi);
        }
        Trapezoidal => {
            let mut sorted = values.clone();
            sorted.sort_by(f64::total_cmp);
            let at = |f: f64| sorted[((sorted.len() - 1) as f64 * f).round() as usize];
            p.minimum = lo;
            p.shift = at(0.25);
            p.shift_b = at(0.75);
            p.maximum = hi;
        }
        Exponential => {
            p.shift = shift.unwrap_or(lo);
            p.scale = (mean - p.shift).max(f64::MIN_POSITIVE);
        }
        Weibull => {
            if shift.is_none() && lo <= p.shift {
                p.shift = below_minimum(&values);
            }
            let t: Vec<f64> = values.iter().map(|v| v - p.shift).filter(|v| *v > 0.0).collect();
            if t.len() < 2 {
                return None;
            }
            let k = weibull_shape_mle(&t);
            p.shape = k;
            p.scale = (t.iter().map(|v| v.powf(k)).sum::<f64>() / t.len() as f64).powf(1.0 / k);
        }
        Rayleigh => {
            if shift.is_none() && lo < p.shift {
                p.shift = below_minimum(&values);
            }
            let sum_sq: f64 = values.iter().map(|v| (v - p.shift).powi(2)).sum();
            p.scale = (sum_sq / (2.0 * n)).sqrt();
        }
        Pareto => {
            if lo <= 0.0 {
                return None;
            }
            let sum_log: f64 = values.iter().map(|v| (v / lo).ln()).sum();
            if sum_log <= 0.0 {
                return None;
            }
            p.scale = lo;
            p.shape = n / sum_log;
        }
        GeneralizedPareto => {
            p.shift = shift.unwrap_or(lo);
            set_moments(kind, &mut p, mean, sd);
        }
        Gumbel | Frechet | Gev | Beta | Gamma => {
            if values.len() < 2 {
                return None;
            }
            if kind == Beta && shift.is_none() && (lo < p.minimum || hi > p.maximum) {
                p.minimum = lo;
                p.maximum = hi;
            }
            set_moments(kind, &mut p, mean, sd);
        }
        Bernoulli => p.location = values.iter().filter(|v| **v != 0.0).count() as f64 / n,
        Discrete | Qualitative => {
            let mut sorted = values.clone();
            sorted.sort_by(f64::total_cmp);
            let mut points: Vec<DiscreteValue> = Vec::new();
            for v in sorted {
                match points.last_mut() {
                    Some(last) if last.x == v => last.amount += 1.0,
                    _ => points.push(DiscreteValue::new(v, 1.0)),
                }
            }
            return Some(Fitted::Discrete(points));
        }
        Histogram => {
            if hi <= lo {
                return Some(Fitted::Histogram(vec![HistogramValue::new(lo, hi, n)]));
            }
            let bins = (n.sqrt().ceil() as usize).clamp(1, 50);
            let width = (hi - lo) / bins as f64;
            let mut counts = vec![0.0; bins];
            for v in &values {
                let index = (((v - lo) / width) as usize).min(bins - 1);
                counts[index] += 1.0;
            }
            let histogram = counts
                .into_iter()
                .enumerate()
                .map(|(i, c)| {
                    HistogramValue::new(lo + i as f64 * width, lo + (i + 1) as f64 * width, c)
                })
                .collect();
            return Some(Fitted::Histogram(histogram));
        }
        CdfCurve | Composite => return None,
    }
    Some(Fitted::Parameters(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_normal_sample_statistics() {
        let fitted = fit(Normal, &Parameters::default(), &[4.1, 4.2, 4.4, 4.5], None);
        let Some(Fitted::Parameters(p)) = fitted else {
            panic!("expected parameters");
        };
        assert!((p.location - 4.3).abs() < 1e-12);
        assert!((p.scale - 0.1826).abs() < 1e-3, "scale = {}", p.scale);
    }

    #[test]
    fn test_fit_exponential_with_pinned_shift() {
        let values = [1.5, 2.0, 3.5, 5.0];
        let Some(Fitted::Parameters(p)) = fit(Exponential, &Parameters::default(), &values, Some(1.0))
        else {
            panic!("expected parameters");
        };
        assert_eq!(p.shift, 1.0);
        assert!((p.scale - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_fit_weibull_recovers_shape() {
        // quantiles of a Weibull(scale 2, shape 3) sample
        let values: Vec<f64> = (1..200)
            .map(|i| {
                let p = i as f64 / 200.0;
                2.0 * (-(1.0 - p).ln()).powf(1.0 / 3.0)
            })
            .collect();
        let Some(Fitted::Parameters(p)) = fit(Weibull, &Parameters::default(), &values, Some(0.0))
        else {
            panic!("expected parameters");
        };
        assert!((p.shape - 3.0).abs() < 0.2, "shape = {}", p.shape);
        assert!((p.scale - 2.0).abs() < 0.1, "scale = {}", p.scale);
    }

    #[test]
    fn test_fit_discrete_counts() {
        let Some(Fitted::Discrete(points)) =
            fit(Discrete, &Parameters::default(), &[3.0, 2.0, 3.0, 3.0], None)
        else {
            panic!("expected points");
        };
        assert_eq!(points, vec![DiscreteValue::new(2.0, 1.0), DiscreteValue::new(3.0, 3.0)]);
    }

    #[test]
    fn test_fit_histogram_conserves_count() {
        let values: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let Some(Fitted::Histogram(bins)) = fit(Histogram, &Parameters::default(), &values, None)
        else {
            panic!("expected bins");
        };
        assert_eq!(bins.len(), 10);
        assert_eq!(bins.iter().map(|b| b.amount).sum::<f64>(), 100.0);
    }
}

//! Weighted sample summaries: moments, correlation and empirical quantiles.

/// A set of values with non-negative weights.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightedSample {
    pub values: Vec<f64>,
    pub weights: Vec<f64>,
}

impl WeightedSample {
    /// Unit-weighted sample.
    pub fn unweighted(values: Vec<f64>) -> Self {
        let weights = vec![1.0; values.len()];
        Self { values, weights }
    }

    pub fn push(&mut self, value: f64, weight: f64) {
        self.values.push(value);
        self.weights.push(weight);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn total_weight(&self) -> f64 {
        self.weights.iter().sum()
    }

    /// Weighted mean and standard deviation.
    pub fn mean_deviation(&self) -> (f64, f64) {
        weighted_mean_deviation(&self.values, &self.weights)
    }

    /// Smallest and largest value, `None` for an empty sample.
    pub fn range(&self) -> Option<(f64, f64)> {
        let mut iter = self.values.iter().copied().filter(|v| v.is_finite());
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }

    /// Inverse of the weighted empirical CDF.
    pub fn quantile(&self, p: f64) -> f64 {
        let mut pairs: Vec<(f64, f64)> = self
            .values
            .iter()
            .copied()
            .zip(self.weights.iter().copied())
            .filter(|(v, w)| v.is_finite() && *w > 0.0)
            .collect();
        if pairs.is_empty() {
            return f64::NAN;
        }
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
        let total: f64 = pairs.iter().map(|(_, w)| w).sum();
        let target = p.clamp(0.0, 1.0) * total;
        let mut cumulative = 0.0;
        for (value, weight) in &pairs {
            cumulative += weight;
            if cumulative >= target {
                return *value;
            }
        }
        pairs[pairs.len() - 1].0
    }
}

/// Weighted mean and (population-style, bias corrected for unit weights) deviation.
pub fn weighted_mean_deviation(values: &[f64], weights: &[f64]) -> (f64, f64) {
    let total: f64 = weights.iter().sum();
    if values.is_empty() || total <= 0.0 {
        return (f64::NAN, f64::NAN);
    }
    let mean = values.iter().zip(weights).map(|(v, w)| v * w).sum::<f64>() / total;
    let squares: f64 = values
        .iter()
        .zip(weights)
        .map(|(v, w)| w * (v - mean) * (v - mean))
        .sum();
    let sum_sq_weights: f64 = weights.iter().map(|w| w * w).sum();
    // reliability-weights correction, reduces to n-1 for unit weights
    let denominator = total - sum_sq_weights / total;
    let variance = if denominator > 0.0 {
        squares / denominator
    } else {
        0.0
    };
    (mean, variance.max(0.0).sqrt())
}

/// Pearson correlation of two equally long samples.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let weights = vec![1.0; x.len().min(y.len())];
    weighted_pearson(x, y, &weights)
}

/// Weighted Pearson correlation. Returns 0 when either sample is constant.
pub fn weighted_pearson(x: &[f64], y: &[f64], weights: &[f64]) -> f64 {
    let n = x.len().min(y.len()).min(weights.len());
    let total: f64 = weights[..n].iter().sum();
    if n < 2 || total <= 0.0 {
        return 0.0;
    }
    let mx = (0..n).map(|i| weights[i] * x[i]).sum::<f64>() / total;
    let my = (0..n).map(|i| weights[i] * y[i]).sum::<f64>() / total;
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for i in 0..n {
        let dx = x[i] - mx;
        let dy = y[i] - my;
        sxy += weights[i] * dx * dy;
        sxx += weights[i] * dx * dx;
        syy += weights[i] * dy * dy;
    }
    if sxx <= 0.0 || syy <= 0.0 {
        return 0.0;
    }
    (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_weights_match_sample_statistics() {
        let (mean, sd) = weighted_mean_deviation(&[4.1, 4.2, 4.4, 4.5], &[1.0; 4]);
        assert!((mean - 4.3).abs() < 1e-12);
        assert!((sd - 0.182_574_185_835_055_4).abs() < 1e-9, "sd = {}", sd);
    }

    #[test]
    fn test_pearson_perfect() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [2.0, 4.0, 6.0, 8.0];
        assert!((pearson(&x, &y) - 1.0).abs() < 1e-12);
        let z = [8.0, 6.0, 4.0, 2.0];
        assert!((pearson(&x, &z) + 1.0).abs() < 1e-12);
        assert_eq!(pearson(&x, &[1.0; 4]), 0.0);
    }

    #[test]
    fn test_weighted_quantile() {
        let sample = WeightedSample {
            values: vec![3.0, 1.0, 2.0],
            weights: vec![1.0, 1.0, 2.0],
        };
        assert_eq!(sample.quantile(0.2), 1.0);
        assert_eq!(sample.quantile(0.5), 2.0);
        assert_eq!(sample.quantile(0.9), 3.0);
        assert_eq!(sample.range(), Some((1.0, 3.0)));
    }
}

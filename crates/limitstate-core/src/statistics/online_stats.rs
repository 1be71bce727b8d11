//! Online (streaming) statistics computation using Welford's algorithm.
//!
//! Sampling solvers feed one value per sample (a failure indicator, an
//! importance-weighted indicator or a directional failure probability) and
//! read the estimate and its coefficient of variation after every batch.

/// Online mean/variance accumulator using Welford's algorithm.
///
/// # Example
///
/// ```
/// use limitstate_core::statistics::OnlineStats;
///
/// let mut stats = OnlineStats::new();
/// for x in [1.0, 2.0, 3.0, 4.0, 5.0] {
///     stats.update(x);
/// }
/// let snapshot = stats.finalize();
/// assert!((snapshot.mean - 3.0).abs() < 1e-10);
/// ```
#[derive(Debug, Clone, Default)]
pub struct OnlineStats {
    /// Number of samples seen.
    count: usize,
    /// Running mean.
    mean: f64,
    /// Welford's M2: sum of squared deviations from current mean.
    m2: f64,
    /// Number of strictly positive samples.
    positives: usize,
}

impl OnlineStats {
    /// Create a new empty statistics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Update statistics with a new sample.
    pub fn update(&mut self, x: f64) {
        self.count += 1;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        let delta2 = x - self.mean;
        self.m2 += delta * delta2;
        if x > 0.0 {
            self.positives += 1;
        }
    }

    /// Merge another accumulator (Chan et al. parallel update).
    pub fn merge(&mut self, other: &OnlineStats) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            *self = other.clone();
            return;
        }
        let n1 = self.count as f64;
        let n2 = other.count as f64;
        let n = n1 + n2;
        let delta = other.mean - self.mean;
        self.mean += delta * n2 / n;
        self.m2 += other.m2 + delta * delta * n1 * n2 / n;
        self.count += other.count;
        self.positives += other.positives;
    }

    /// Finalize and return the computed statistics.
    pub fn finalize(&self) -> StatsSnapshot {
        StatsSnapshot {
            mean: self.mean,
            variance: self.variance(),
            count: self.count,
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Number of samples with a value above zero (failures, hits).
    pub fn positives(&self) -> usize {
        self.positives
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Sample variance (0 if count < 2).
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// Coefficient of variation of the estimated mean, `sd / (sqrt(n) * mean)`.
    ///
    /// Infinite while the mean is zero.
    pub fn mean_variation_coefficient(&self) -> f64 {
        if self.count == 0 || self.mean <= 0.0 {
            return f64::INFINITY;
        }
        (self.variance() / self.count as f64).sqrt() / self.mean
    }
}

/// Snapshot of online statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatsSnapshot {
    pub mean: f64,
    pub variance: f64,
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_online_stats_basic() {
        let mut stats = OnlineStats::new();
        for x in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
            stats.update(x);
        }
        assert!((stats.mean() - 5.0).abs() < 1e-12);
        assert!((stats.variance() - 32.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_merge_matches_sequential() {
        let data: Vec<f64> = (0..100).map(|i| (i as f64 * 0.37).sin()).collect();
        let mut all = OnlineStats::new();
        data.iter().for_each(|&x| all.update(x));

        let mut left = OnlineStats::new();
        let mut right = OnlineStats::new();
        data[..40].iter().for_each(|&x| left.update(x));
        data[40..].iter().for_each(|&x| right.update(x));
        left.merge(&right);

        assert_eq!(left.count(), 100);
        assert!((left.mean() - all.mean()).abs() < 1e-12);
        assert!((left.variance() - all.variance()).abs() < 1e-12);
    }

    #[test]
    fn test_indicator_variation_coefficient() {
        // 10 failures in 1000 Bernoulli trials: cov ~ sqrt((1-p)/(n p))
        let mut stats = OnlineStats::new();
        for i in 0..1000 {
            stats.update(if i % 100 == 0 { 1.0 } else { 0.0 });
        }
        assert_eq!(stats.positives(), 10);
        let expected = ((1.0 - 0.01) / (1000.0 * 0.01) as f64).sqrt();
        assert!((stats.mean_variation_coefficient() - expected).abs() < 1e-3);
    }

    #[test]
    fn test_zero_mean_is_infinite() {
        let mut stats = OnlineStats::new();
        stats.update(0.0);
        assert!(stats.mean_variation_coefficient().is_infinite());
    }
}

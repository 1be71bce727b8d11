//! Shared accounting of the sampling methods.

use limitstate_core::constants::BETA_MAX;
use limitstate_core::standard_normal::u_from_q_unchecked;
use limitstate_core::statistics::OnlineStats;
use limitstate_core::SpaceTransform;

use super::design_point::{DesignPoint, DirectionCollector};
use crate::settings::DesignPointMethod;

/// Running failure probability estimate plus the failing directions.
#[derive(Debug, Clone)]
pub(crate) struct FailureEstimate {
    pub stats: OnlineStats,
    pub collector: DirectionCollector,
}

impl FailureEstimate {
    pub fn new(method: DesignPointMethod, dimension: usize) -> Self {
        Self {
            stats: OnlineStats::new(),
            collector: DirectionCollector::new(method, dimension),
        }
    }

    /// Add one sample contribution; `u` is only used when it contributes.
    pub fn add(&mut self, contribution: f64, u: &[f64]) {
        self.stats.update(contribution);
        if contribution > 0.0 {
            self.collector.add(u, contribution);
        }
    }

    pub fn probability(&self) -> f64 {
        self.stats.mean()
    }

    pub fn variation_coefficient(&self) -> f64 {
        self.stats.mean_variation_coefficient()
    }

    pub fn count(&self) -> usize {
        self.stats.count()
    }

    /// Stop once `minimum` samples are in and the target precision is met.
    pub fn is_converged(&self, minimum: usize, target: f64) -> bool {
        self.count() >= minimum && self.variation_coefficient() < target
    }

    pub fn design_point(
        &self,
        transform: &SpaceTransform,
        identifier: &str,
        minimum: usize,
        target: f64,
    ) -> DesignPoint {
        let pf = self.probability().clamp(0.0, 1.0);
        let beta = u_from_q_unchecked(pf).clamp(-BETA_MAX, BETA_MAX);
        let direction = self
            .collector
            .direction()
            .unwrap_or_else(|| vec![0.0; transform.u_count()]);
        let mut point = DesignPoint::from_direction(transform, identifier, beta, &direction)
            .with_convergence(self.variation_coefficient(), self.is_converged(minimum, target));
        point.probability_failure = pf;
        point
    }
}

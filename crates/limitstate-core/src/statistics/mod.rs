//! Sample statistics used by the solvers.

mod online_stats;
mod sample;

pub use online_stats::{OnlineStats, StatsSnapshot};
pub use sample::{pearson, weighted_mean_deviation, weighted_pearson, WeightedSample};

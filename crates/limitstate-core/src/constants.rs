//! Numerical constants used throughout the crate.

/// Default deterministic seed for random generators.
///
/// Same seed + same settings = same result. The value `0x6C696D6974` is
/// "limit" encoded in ASCII.
pub const DEFAULT_SEED: u64 = 0x6C696D6974;

/// Reliability index reported when the failure probability is exactly 0 or 1.
///
/// Beyond this distance the standard normal tail underflows `f64`.
pub const BETA_MAX: f64 = 40.0;

/// Lower and upper u-values used when scanning a distribution numerically.
pub const U_MIN: f64 = -8.0;
pub const U_MAX: f64 = 8.0;

/// Euler-Mascheroni constant, mean offset of the Gumbel distribution.
pub const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Natural log of 2*pi, used in normal log-densities.
pub const LOG_2PI: f64 = 1.837_877_066_409_345_3;

/// Tolerance below which a probability is treated as zero in sums.
pub const PROBABILITY_EPSILON: f64 = 1e-300;

//! Conversions between probabilities, reliability indices and return periods.
//!
//! `p` is the non-exceedance probability `P(U <= u)` and `q = 1 - p` the
//! exceedance probability. Both directions are evaluated through `erfc` and
//! its inverse so that tails beyond |u| = 6 keep full relative precision:
//! `q_from_u(8.0)` is about 6.2e-16 and would round to zero as `1 - p`.
//!
//! Return periods relate to the exceedance probability over a time base
//! (default 1) through a Poisson arrival assumption:
//! `q = 1 - exp(-base / t)`.

use std::f64::consts::{FRAC_1_SQRT_2, SQRT_2};

use statrs::function::erf::{erfc, erfc_inv};

use crate::constants::LOG_2PI;
use crate::error::DomainError;

fn check_probability(value: f64) -> Result<(), DomainError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(DomainError::ProbabilityOutOfRange { value })
    }
}

/// Standard normal density.
pub fn pdf(u: f64) -> f64 {
    (-0.5 * (u * u + LOG_2PI)).exp()
}

/// Non-exceedance probability `P(U <= u)`.
pub fn p_from_u(u: f64) -> f64 {
    0.5 * erfc(-u * FRAC_1_SQRT_2)
}

/// Exceedance probability `P(U > u)`.
pub fn q_from_u(u: f64) -> f64 {
    0.5 * erfc(u * FRAC_1_SQRT_2)
}

/// Reliability index for a non-exceedance probability.
///
/// `p = 0` maps to `-inf` and `p = 1` to `+inf`.
pub fn u_from_p(p: f64) -> Result<f64, DomainError> {
    check_probability(p)?;
    Ok(u_from_p_unchecked(p))
}

/// Reliability index for an exceedance probability.
pub fn u_from_q(q: f64) -> Result<f64, DomainError> {
    check_probability(q)?;
    Ok(-u_from_p_unchecked(q))
}

/// `u_from_p` for callers that already guarantee `p` in `[0, 1]`.
///
/// Values outside the interval are clamped, NaN stays NaN.
pub fn u_from_p_unchecked(p: f64) -> f64 {
    if p.is_nan() {
        return f64::NAN;
    }
    let p = p.clamp(0.0, 1.0);
    if p == 0.0 {
        f64::NEG_INFINITY
    } else if p == 1.0 {
        f64::INFINITY
    } else {
        -SQRT_2 * erfc_inv(2.0 * p)
    }
}

/// `u_from_q` for callers that already guarantee `q` in `[0, 1]`.
pub fn u_from_q_unchecked(q: f64) -> f64 {
    -u_from_p_unchecked(q)
}

/// Reliability index from whichever of `p` and `q = 1 - p` is smaller.
///
/// Used when both tails were computed separately and the larger one has
/// lost precision.
pub fn u_from_pq(p: f64, q: f64) -> f64 {
    if p < q {
        u_from_p_unchecked(p)
    } else {
        u_from_q_unchecked(q)
    }
}

/// Return period (in units of the time base, default 1) for index `u`.
pub fn t_from_u(u: f64) -> f64 {
    t_from_u_with_base(u, 1.0)
}

/// Return period for index `u` over a given time base.
///
/// `q = 0` yields an infinite return period.
pub fn t_from_u_with_base(u: f64, base: f64) -> f64 {
    let q = q_from_u(u);
    if q <= 0.0 {
        return f64::INFINITY;
    }
    // -ln(1 - q) without cancellation for small q
    let frequency = -(-q).ln_1p();
    base / frequency
}

/// Reliability index for a return period `t` (time base 1).
pub fn u_from_t(t: f64) -> Result<f64, DomainError> {
    u_from_t_with_base(t, 1.0)
}

/// Reliability index for a return period `t` over a given time base.
pub fn u_from_t_with_base(t: f64, base: f64) -> Result<f64, DomainError> {
    if t.is_nan() || t <= 0.0 {
        return Err(DomainError::NonPositive {
            name: "return period",
            value: t,
        });
    }
    if base.is_nan() || base <= 0.0 {
        return Err(DomainError::NonPositive {
            name: "time base",
            value: base,
        });
    }
    let q = -(-base / t).exp_m1();
    u_from_q(q)
}

/// Reliability index for an annual exceedance frequency.
pub fn beta_from_frequency(frequency: f64) -> Result<f64, DomainError> {
    if frequency.is_nan() || frequency < 0.0 {
        return Err(DomainError::InvalidArgument(format!(
            "frequency {frequency} must be non-negative"
        )));
    }
    u_from_q(-(-frequency).exp_m1())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_symmetry_at_zero() {
        assert!((p_from_u(0.0) - 0.5).abs() < 1e-15);
        assert!(u_from_p(0.5).unwrap().abs() < 1e-12);
    }

    #[test]
    fn test_known_values() {
        assert!((u_from_q(0.05).unwrap() - 1.644_853_626_951_472).abs() < 1e-9);
        let q = q_from_u(3.0);
        assert!((q - 1.349_898_031_630_094_6e-3).abs() / q < 1e-9);
        assert!((u_from_q(2e-2 - 1e-4).unwrap() - 2.054_548).abs() < 0.01);
    }

    #[test]
    fn test_tail_precision() {
        let q = q_from_u(8.0);
        assert!((q - 6.220_960_574_271_785e-16).abs() / q < 1e-8);
        assert!((u_from_q(q).unwrap() - 8.0).abs() < 1e-8);
        let p = p_from_u(-7.5);
        assert!((u_from_p(p).unwrap() + 7.5).abs() < 1e-8);
    }

    #[test]
    fn test_out_of_range_fails() {
        assert!(matches!(
            u_from_q(1.5),
            Err(DomainError::ProbabilityOutOfRange { .. })
        ));
        assert!(u_from_p(-0.1).is_err());
        assert!(u_from_p(f64::NAN).is_err());
    }

    #[test]
    fn test_extremes_are_infinite() {
        assert_eq!(u_from_q(0.0).unwrap(), f64::INFINITY);
        assert_eq!(u_from_q(1.0).unwrap(), f64::NEG_INFINITY);
    }

    #[test]
    fn test_return_period_round_trip() {
        let u = u_from_t(1000.0).unwrap();
        assert!((t_from_u(u) - 1000.0).abs() < 1e-6);
        assert!(u_from_t(0.0).is_err());
        // for long return periods q is close to 1/t
        assert!((q_from_u(u) - 1e-3).abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn prop_q_round_trip(q in 1e-12f64..0.999_999) {
            let u = u_from_q(q).unwrap();
            prop_assert!((p_from_u(u) - (1.0 - q)).abs() < 1e-6);
        }

        #[test]
        fn prop_u_round_trip_through_q(u in -6.0f64..7.5) {
            let q = q_from_u(u);
            prop_assert!((u_from_q(q).unwrap() - u).abs() < 1e-6);
        }

        // below -6, q rounds towards 1 and only p keeps the precision
        #[test]
        fn prop_u_round_trip_through_p(u in -7.5f64..7.5) {
            let p = p_from_u(u);
            prop_assert!((u_from_p(p).unwrap() - u).abs() < 1e-6);
        }

        #[test]
        fn prop_p_monotone(a in -6.0f64..6.0, d in 1e-3f64..1.0) {
            prop_assert!(p_from_u(a + d) > p_from_u(a));
        }
    }
}

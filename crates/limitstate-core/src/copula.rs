//! One-parameter Archimedean copulas for pairwise dependence.
//!
//! A pair `(first, second)` is coupled through the conditional distribution
//! `h(v2 | v1) = ∂C(v1, v2) / ∂v1`. The forward transform draws `v2` by
//! inverting `h` at an independent uniform; the inverse transform evaluates
//! `h`, giving back the independent uniform.

use serde::{Deserialize, Serialize};

use crate::roots::invert_monotone;
use crate::standard_normal::{p_from_u, q_from_u, u_from_p_unchecked};

/// Copula family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CopulaType {
    Clayton,
    Frank,
    Gumbel,
}

const TINY: f64 = 1e-300;

impl CopulaType {
    pub fn name(&self) -> &'static str {
        match self {
            CopulaType::Clayton => "clayton",
            CopulaType::Frank => "frank",
            CopulaType::Gumbel => "gumbel",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "clayton" => Some(CopulaType::Clayton),
            "frank" => Some(CopulaType::Frank),
            "gumbel" => Some(CopulaType::Gumbel),
            _ => None,
        }
    }

    /// Describe why `theta` is outside the family's parameter domain.
    pub fn check_parameter(&self, theta: f64) -> Option<String> {
        match self {
            CopulaType::Clayton if !(theta > 0.0) => {
                Some(format!("clayton parameter {theta} should be greater than 0"))
            }
            CopulaType::Frank if theta == 0.0 || theta.is_nan() => {
                Some(format!("frank parameter {theta} should not be 0"))
            }
            CopulaType::Gumbel if !(theta >= 1.0) => {
                Some(format!("gumbel parameter {theta} should be at least 1"))
            }
            _ => None,
        }
    }

    /// Conditional distribution `h(v2 | v1)`.
    pub fn conditional_cdf(&self, theta: f64, v1: f64, v2: f64) -> f64 {
        let v1 = v1.clamp(TINY, 1.0 - f64::EPSILON);
        let v2 = v2.clamp(TINY, 1.0 - f64::EPSILON);
        let h = match self {
            CopulaType::Clayton => {
                let s = v1.powf(-theta) + v2.powf(-theta) - 1.0;
                v1.powf(-theta - 1.0) * s.powf(-1.0 - 1.0 / theta)
            }
            CopulaType::Frank => {
                let a = (-theta * v1).exp_m1();
                let b = (-theta * v2).exp_m1();
                let c = (-theta).exp_m1();
                (-theta * v1).exp() * b / (c + a * b)
            }
            CopulaType::Gumbel => {
                let x = -v1.ln();
                let y = -v2.ln();
                let s = x.powf(theta) + y.powf(theta);
                let copula = (-s.powf(1.0 / theta)).exp();
                copula * x.powf(theta - 1.0) / v1 * s.powf(1.0 / theta - 1.0)
            }
        };
        h.clamp(0.0, 1.0)
    }

    /// Solve `h(v2 | v1) = w` for `v2`.
    pub fn conditional_inverse(&self, theta: f64, v1: f64, w: f64) -> f64 {
        let v1 = v1.clamp(TINY, 1.0 - f64::EPSILON);
        let w = w.clamp(TINY, 1.0 - f64::EPSILON);
        match self {
            CopulaType::Clayton => {
                let t = (w.powf(-theta / (1.0 + theta)) - 1.0) * v1.powf(-theta) + 1.0;
                t.powf(-1.0 / theta)
            }
            CopulaType::Frank => {
                let num = w * (-theta).exp_m1();
                let den = w + (1.0 - w) * (-theta * v1).exp();
                -(num / den).ln_1p() / theta
            }
            CopulaType::Gumbel => {
                invert_monotone(
                    |v2| self.conditional_cdf(theta, v1, v2.clamp(0.0, 1.0)),
                    w,
                    0.0,
                    1.0,
                    1e-14,
                )
                .clamp(TINY, 1.0)
            }
        }
    }

    /// Dependent standard normal value of the second variable from
    /// independent standard normal values `(u1, u2)`.
    pub fn correlate(&self, theta: f64, u1: f64, u2: f64) -> f64 {
        let v2 = self.conditional_inverse(theta, p_from_u(u1), p_from_u(u2));
        u_from_p_unchecked(v2)
    }

    /// Independent standard normal value of the second variable, the inverse
    /// of [`CopulaType::correlate`].
    pub fn decorrelate(&self, theta: f64, z1: f64, z2: f64) -> f64 {
        let v2 = p_from_u(z2);
        let w = if v2 < 1.0 {
            self.conditional_cdf(theta, p_from_u(z1), v2)
        } else {
            1.0 - q_from_u(z2)
        };
        u_from_p_unchecked(w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverse_round_trip() {
        for (copula, theta) in [
            (CopulaType::Clayton, 2.0),
            (CopulaType::Frank, 5.0),
            (CopulaType::Frank, -3.0),
            (CopulaType::Gumbel, 1.8),
        ] {
            for &v1 in &[0.1, 0.5, 0.9] {
                for &w in &[0.05, 0.5, 0.95] {
                    let v2 = copula.conditional_inverse(theta, v1, w);
                    let back = copula.conditional_cdf(theta, v1, v2);
                    assert!((back - w).abs() < 1e-8, "{copula:?} v1 {v1} w {w} back {back}");
                }
            }
        }
    }

    #[test]
    fn test_correlate_decorrelate() {
        let copula = CopulaType::Clayton;
        let z2 = copula.correlate(3.0, 0.7, -0.4);
        assert!((copula.decorrelate(3.0, 0.7, z2) + 0.4).abs() < 1e-7);
    }

    #[test]
    fn test_positive_dependence() {
        // with strong dependence a high first value drags the second up
        let low = CopulaType::Gumbel.correlate(5.0, -2.0, 0.0);
        let high = CopulaType::Gumbel.correlate(5.0, 2.0, 0.0);
        assert!(high > low + 2.0);
    }

    #[test]
    fn test_parameter_domain() {
        assert!(CopulaType::Clayton.check_parameter(0.0).is_some());
        assert!(CopulaType::Gumbel.check_parameter(0.5).is_some());
        assert!(CopulaType::Frank.check_parameter(-2.0).is_none());
    }
}

//! Density, distribution and quantile functions of the closed-form families.
//!
//! Upper-tail probabilities are computed directly (not as `1 - p`) so that
//! `x_from_u` stays accurate for reliability indices well beyond 6.

use std::f64::consts::PI;

use statrs::function::beta::{checked_beta_reg, ln_beta};
use statrs::function::gamma::{checked_gamma_lr, checked_gamma_ur, gamma, ln_gamma};

use super::{DistributionType, Parameters};
use crate::constants::EULER_GAMMA;
use crate::roots::{invert_monotone, simpson};
use crate::standard_normal::{p_from_u, pdf as normal_pdf, q_from_u};
use crate::validation::ValidationReport;
use DistributionType::*;

/// Regularized lower incomplete gamma; zero at and below the origin.
fn gamma_lr(a: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    checked_gamma_lr(a, x).unwrap_or(f64::NAN)
}

/// Regularized upper incomplete gamma; one at and below the origin.
fn gamma_ur(a: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 1.0;
    }
    checked_gamma_ur(a, x).unwrap_or(f64::NAN)
}

fn beta_reg(a: f64, b: f64, x: f64) -> f64 {
    checked_beta_reg(a, b, x).unwrap_or(f64::NAN)
}

/// `-ln(p)` evaluated from whichever of `p` and `q = 1 - p` is accurate.
fn neg_ln_p(p: f64, q: f64) -> f64 {
    if p > 0.5 {
        -(-q).ln_1p()
    } else {
        -p.ln()
    }
}

/// `-ln(q)` evaluated from whichever of `p` and `q` is accurate.
fn neg_ln_q(p: f64, q: f64) -> f64 {
    neg_ln_p(q, p)
}

fn step(x: f64, at: f64) -> (f64, f64) {
    if x < at {
        (0.0, 1.0)
    } else {
        (1.0, 0.0)
    }
}

/// Probability density (probability mass for the discrete families).
pub(crate) fn pdf(kind: DistributionType, p: &Parameters, x: f64) -> f64 {
    match kind {
        Deterministic => {
            if x == p.location {
                1.0
            } else {
                0.0
            }
        }
        Normal => {
            if p.scale <= 0.0 {
                return pdf(Deterministic, p, x);
            }
            normal_pdf((x - p.location) / p.scale) / p.scale
        }
        LogNormal => {
            if x <= p.shift || p.scale <= 0.0 {
                return 0.0;
            }
            let y = (x - p.shift).ln();
            normal_pdf((y - p.location) / p.scale) / (p.scale * (x - p.shift))
        }
        Uniform => {
            if x < p.minimum || x > p.maximum || p.maximum <= p.minimum {
                0.0
            } else {
                1.0 / (p.maximum - p.minimum)
            }
        }
        Triangular => {
            let (a, c, b) = (p.minimum, p.shift, p.maximum);
            if x < a || x > b || b <= a {
                0.0
            } else if x < c {
                2.0 * (x - a) / ((b - a) * (c - a))
            } else if x > c {
                2.0 * (b - x) / ((b - a) * (b - c))
            } else {
                2.0 / (b - a)
            }
        }
        Trapezoidal => {
            let (a, b, c, d) = (p.minimum, p.shift, p.shift_b, p.maximum);
            let width = d + c - a - b;
            if x < a || x > d || width <= 0.0 {
                return 0.0;
            }
            let h = 2.0 / width;
            if x < b {
                h * (x - a) / (b - a)
            } else if x <= c {
                h
            } else {
                h * (d - x) / (d - c)
            }
        }
        Exponential => {
            let t = (x - p.shift) / p.scale;
            if t < 0.0 || p.scale <= 0.0 {
                0.0
            } else {
                (-t).exp() / p.scale
            }
        }
        Gumbel => {
            let z = (x - p.shift) / p.scale;
            (-z - (-z).exp()).exp() / p.scale
        }
        Weibull => {
            let t = (x - p.shift) / p.scale;
            if t < 0.0 {
                return 0.0;
            }
            let k = p.shape;
            k / p.scale * t.powf(k - 1.0) * (-t.powf(k)).exp()
        }
        Frechet => {
            let t = (x - p.shift) / p.scale;
            if t <= 0.0 {
                return 0.0;
            }
            let a = p.shape;
            a / p.scale * t.powf(-1.0 - a) * (-t.powf(-a)).exp()
        }
        Gev => {
            let xi = p.shape;
            if xi == 0.0 {
                return pdf(Gumbel, p, x);
            }
            let t = 1.0 + xi * (x - p.shift) / p.scale;
            if t <= 0.0 {
                return 0.0;
            }
            let s = t.powf(-1.0 / xi);
            s.powf(xi + 1.0) * (-s).exp() / p.scale
        }
        Rayleigh => {
            let t = x - p.shift;
            if t < 0.0 {
                return 0.0;
            }
            let s2 = p.scale * p.scale;
            t / s2 * (-t * t / (2.0 * s2)).exp()
        }
        Pareto => {
            if x < p.scale {
                return 0.0;
            }
            p.shape * p.scale.powf(p.shape) / x.powf(p.shape + 1.0)
        }
        GeneralizedPareto => {
            let z = (x - p.shift) / p.scale;
            if z < 0.0 {
                return 0.0;
            }
            let xi = p.shape;
            if xi == 0.0 {
                return (-z).exp() / p.scale;
            }
            let t = 1.0 + xi * z;
            if t <= 0.0 {
                return 0.0;
            }
            t.powf(-1.0 / xi - 1.0) / p.scale
        }
        Beta => {
            let width = p.maximum - p.minimum;
            let y = (x - p.minimum) / width;
            if !(0.0..=1.0).contains(&y) || width <= 0.0 {
                return 0.0;
            }
            let (a, b) = (p.shape, p.shape_b);
            ((a - 1.0) * y.ln() + (b - 1.0) * (1.0 - y).ln() - ln_beta(a, b)).exp() / width
        }
        Gamma => {
            let t = x - p.shift;
            if t <= 0.0 {
                return 0.0;
            }
            let (k, theta) = (p.shape, p.scale);
            ((k - 1.0) * t.ln() - t / theta - ln_gamma(k) - k * theta.ln()).exp()
        }
        Bernoulli => {
            if x == 0.0 {
                1.0 - p.location
            } else if x == 1.0 {
                p.location
            } else {
                0.0
            }
        }
        Poisson => {
            if x < 0.0 || x.fract() != 0.0 {
                return 0.0;
            }
            let lambda = p.location;
            if lambda == 0.0 {
                return if x == 0.0 { 1.0 } else { 0.0 };
            }
            (x * lambda.ln() - lambda - ln_gamma(x + 1.0)).exp()
        }
        Histogram | CdfCurve | Discrete | Qualitative | Composite => f64::NAN,
    }
}

/// `(P(X <= x), P(X > x))`, each computed without cancellation.
pub(crate) fn probabilities(kind: DistributionType, p: &Parameters, x: f64) -> (f64, f64) {
    match kind {
        Deterministic => step(x, p.location),
        Normal => {
            if p.scale <= 0.0 {
                return step(x, p.location);
            }
            let z = (x - p.location) / p.scale;
            (p_from_u(z), q_from_u(z))
        }
        LogNormal => {
            if x <= p.shift {
                return (0.0, 1.0);
            }
            if p.scale <= 0.0 {
                return step(x, p.shift + p.location.exp());
            }
            let z = ((x - p.shift).ln() - p.location) / p.scale;
            (p_from_u(z), q_from_u(z))
        }
        Uniform => {
            if p.maximum <= p.minimum {
                return step(x, p.minimum);
            }
            let t = ((x - p.minimum) / (p.maximum - p.minimum)).clamp(0.0, 1.0);
            let q = ((p.maximum - x) / (p.maximum - p.minimum)).clamp(0.0, 1.0);
            (t, q)
        }
        Triangular => {
            let (a, c, b) = (p.minimum, p.shift, p.maximum);
            if x <= a {
                (0.0, 1.0)
            } else if x >= b {
                (1.0, 0.0)
            } else if x < c {
                let pr = (x - a) * (x - a) / ((b - a) * (c - a));
                (pr, 1.0 - pr)
            } else {
                let q = (b - x) * (b - x) / ((b - a) * (b - c));
                (1.0 - q, q)
            }
        }
        Trapezoidal => {
            let (a, b, c, d) = (p.minimum, p.shift, p.shift_b, p.maximum);
            let width = d + c - a - b;
            if width <= 0.0 {
                return step(x, a);
            }
            let h = 2.0 / width;
            if x <= a {
                (0.0, 1.0)
            } else if x >= d {
                (1.0, 0.0)
            } else if x < b {
                let pr = h * (x - a) * (x - a) / (2.0 * (b - a));
                (pr, 1.0 - pr)
            } else if x <= c {
                let pr = h * (b - a) / 2.0 + h * (x - b);
                (pr, 1.0 - pr)
            } else {
                let q = h * (d - x) * (d - x) / (2.0 * (d - c));
                (1.0 - q, q)
            }
        }
        Exponential => {
            let t = (x - p.shift) / p.scale;
            if t <= 0.0 {
                return (0.0, 1.0);
            }
            (-(-t).exp_m1(), (-t).exp())
        }
        Gumbel => {
            let e = (-(x - p.shift) / p.scale).exp();
            ((-e).exp(), -(-e).exp_m1())
        }
        Weibull => {
            let t = (x - p.shift) / p.scale;
            if t <= 0.0 {
                return (0.0, 1.0);
            }
            let s = t.powf(p.shape);
            (-(-s).exp_m1(), (-s).exp())
        }
        Frechet => {
            let t = (x - p.shift) / p.scale;
            if t <= 0.0 {
                return (0.0, 1.0);
            }
            let s = t.powf(-p.shape);
            ((-s).exp(), -(-s).exp_m1())
        }
        Gev => {
            let xi = p.shape;
            if xi == 0.0 {
                return probabilities(Gumbel, p, x);
            }
            let t = 1.0 + xi * (x - p.shift) / p.scale;
            if t <= 0.0 {
                return if xi > 0.0 { (0.0, 1.0) } else { (1.0, 0.0) };
            }
            let s = t.powf(-1.0 / xi);
            ((-s).exp(), -(-s).exp_m1())
        }
        Rayleigh => {
            let t = x - p.shift;
            if t <= 0.0 {
                return (0.0, 1.0);
            }
            let a = t * t / (2.0 * p.scale * p.scale);
            (-(-a).exp_m1(), (-a).exp())
        }
        Pareto => {
            if x <= p.scale {
                return (0.0, 1.0);
            }
            let l = p.shape * (p.scale / x).ln();
            (-l.exp_m1(), l.exp())
        }
        GeneralizedPareto => {
            let z = (x - p.shift) / p.scale;
            if z <= 0.0 {
                return (0.0, 1.0);
            }
            let xi = p.shape;
            let l = if xi == 0.0 {
                -z
            } else {
                let t = xi * z;
                if t <= -1.0 {
                    return (1.0, 0.0);
                }
                -t.ln_1p() / xi
            };
            (-l.exp_m1(), l.exp())
        }
        Beta => {
            let width = p.maximum - p.minimum;
            if width <= 0.0 {
                return step(x, p.minimum);
            }
            let y = (x - p.minimum) / width;
            if y <= 0.0 {
                (0.0, 1.0)
            } else if y >= 1.0 {
                (1.0, 0.0)
            } else {
                (
                    beta_reg(p.shape, p.shape_b, y),
                    beta_reg(p.shape_b, p.shape, 1.0 - y),
                )
            }
        }
        Gamma => {
            let t = (x - p.shift) / p.scale;
            if t <= 0.0 {
                return (0.0, 1.0);
            }
            (gamma_lr(p.shape, t), gamma_ur(p.shape, t))
        }
        Bernoulli => {
            if x < 0.0 {
                (0.0, 1.0)
            } else if x < 1.0 {
                (1.0 - p.location, p.location)
            } else {
                (1.0, 0.0)
            }
        }
        Poisson => {
            if x < 0.0 {
                return (0.0, 1.0);
            }
            let lambda = p.location;
            if lambda <= 0.0 {
                return (1.0, 0.0);
            }
            let n = x.floor() + 1.0;
            (gamma_ur(n, lambda), gamma_lr(n, lambda))
        }
        Histogram | CdfCurve | Discrete | Qualitative | Composite => (f64::NAN, f64::NAN),
    }
}

/// Quantile at standard normal value `u`.
pub(crate) fn x_from_u(kind: DistributionType, p: &Parameters, u: f64) -> f64 {
    let pr = p_from_u(u);
    let q = q_from_u(u);
    match kind {
        Deterministic => p.location,
        Normal => p.location + p.scale * u,
        LogNormal => p.shift + (p.location + p.scale * u).exp(),
        Uniform => {
            if pr <= 0.5 {
                p.minimum + (p.maximum - p.minimum) * pr
            } else {
                p.maximum - (p.maximum - p.minimum) * q
            }
        }
        Triangular => {
            let (a, c, b) = (p.minimum, p.shift, p.maximum);
            if b <= a {
                return a;
            }
            let fc = (c - a) / (b - a);
            if pr < fc {
                a + (pr * (b - a) * (c - a)).sqrt()
            } else {
                b - (q * (b - a) * (b - c)).sqrt()
            }
        }
        Trapezoidal => {
            let (a, b, c, d) = (p.minimum, p.shift, p.shift_b, p.maximum);
            let width = d + c - a - b;
            if width <= 0.0 {
                return a;
            }
            let h = 2.0 / width;
            let pb = h * (b - a) / 2.0;
            let pc = pb + h * (c - b);
            if pr < pb {
                a + (2.0 * pr * (b - a) / h).sqrt()
            } else if pr <= pc {
                b + (pr - pb) / h
            } else {
                d - (2.0 * q * (d - c) / h).sqrt()
            }
        }
        Exponential => p.shift + p.scale * neg_ln_q(pr, q),
        Gumbel => p.shift - p.scale * neg_ln_p(pr, q).ln(),
        Weibull => p.shift + p.scale * neg_ln_q(pr, q).powf(1.0 / p.shape),
        Frechet => p.shift + p.scale * neg_ln_p(pr, q).powf(-1.0 / p.shape),
        Gev => {
            let xi = p.shape;
            if xi == 0.0 {
                x_from_u(Gumbel, p, u)
            } else {
                p.shift + p.scale * (neg_ln_p(pr, q).powf(-xi) - 1.0) / xi
            }
        }
        Rayleigh => p.shift + p.scale * (2.0 * neg_ln_q(pr, q)).sqrt(),
        Pareto => p.scale * (neg_ln_q(pr, q) / p.shape).exp(),
        GeneralizedPareto => {
            let l = neg_ln_q(pr, q);
            let xi = p.shape;
            if xi == 0.0 {
                p.shift + p.scale * l
            } else {
                p.shift + p.scale * (xi * l).exp_m1() / xi
            }
        }
        Beta => {
            let y = if pr <= 0.5 {
                invert_monotone(|y| beta_reg(p.shape, p.shape_b, y.clamp(0.0, 1.0)), pr, 0.0, 1.0, 1e-13)
            } else {
                invert_monotone(
                    |y| -beta_reg(p.shape_b, p.shape, (1.0 - y).clamp(0.0, 1.0)),
                    -q,
                    0.0,
                    1.0,
                    1e-13,
                )
            };
            p.minimum + (p.maximum - p.minimum) * y.clamp(0.0, 1.0)
        }
        Gamma => {
            let k = p.shape;
            let hi = k + 10.0 * k.sqrt() + 10.0;
            let t = if pr <= 0.5 {
                invert_monotone(|t| gamma_lr(k, t), pr, 0.0, hi, 1e-13)
            } else {
                invert_monotone(|t| -gamma_ur(k, t), -q, 0.0, hi, 1e-13)
            };
            p.shift + p.scale * t.max(0.0)
        }
        Bernoulli => {
            if q < p.location {
                1.0
            } else {
                0.0
            }
        }
        Poisson => {
            let lambda = p.location;
            if lambda <= 0.0 {
                return 0.0;
            }
            // smallest n with P(X <= n) >= p
            let mut lo = 0.0f64;
            let mut hi = (lambda + 40.0 * lambda.sqrt() + 50.0).ceil();
            while lo < hi {
                let mid = ((lo + hi) / 2.0).floor();
                let (cdf, ccdf) = probabilities(Poisson, p, mid);
                let reached = if pr <= 0.5 { cdf >= pr } else { ccdf <= q };
                if reached {
                    hi = mid;
                } else {
                    lo = mid + 1.0;
                }
            }
            lo
        }
        Histogram | CdfCurve | Discrete | Qualitative | Composite => f64::NAN,
    }
}

fn numeric_moments(kind: DistributionType, p: &Parameters) -> (f64, f64) {
    let lo = x_from_u(kind, p, -8.0);
    let hi = x_from_u(kind, p, 8.0);
    if !(lo.is_finite() && hi.is_finite()) || hi <= lo {
        return (lo, 0.0);
    }
    let m0 = simpson(|x| pdf(kind, p, x), lo, hi, 2000);
    let m1 = simpson(|x| x * pdf(kind, p, x), lo, hi, 2000) / m0;
    let m2 = simpson(|x| (x - m1) * (x - m1) * pdf(kind, p, x), lo, hi, 2000) / m0;
    (m1, m2.max(0.0).sqrt())
}

/// `(mean, standard deviation)`; NaN or infinite when a moment does not exist.
pub(crate) fn moments(kind: DistributionType, p: &Parameters) -> (f64, f64) {
    match kind {
        Deterministic => (p.location, 0.0),
        Normal => (p.location, p.scale),
        LogNormal => {
            let s2 = p.scale * p.scale;
            let m = (p.location + s2 / 2.0).exp();
            (p.shift + m, m * s2.exp_m1().sqrt())
        }
        Uniform => (
            (p.minimum + p.maximum) / 2.0,
            (p.maximum - p.minimum) / 12f64.sqrt(),
        ),
        Triangular => {
            let (a, c, b) = (p.minimum, p.shift, p.maximum);
            let var = (a * a + b * b + c * c - a * b - a * c - b * c) / 18.0;
            ((a + b + c) / 3.0, var.max(0.0).sqrt())
        }
        Trapezoidal => numeric_moments(kind, p),
        Exponential => (p.shift + p.scale, p.scale),
        Gumbel => (p.shift + EULER_GAMMA * p.scale, PI * p.scale / 6f64.sqrt()),
        Weibull => {
            let g1 = gamma(1.0 + 1.0 / p.shape);
            let g2 = gamma(1.0 + 2.0 / p.shape);
            (
                p.shift + p.scale * g1,
                p.scale * (g2 - g1 * g1).max(0.0).sqrt(),
            )
        }
        Frechet => {
            let a = p.shape;
            let mean = if a > 1.0 {
                p.shift + p.scale * gamma(1.0 - 1.0 / a)
            } else {
                f64::INFINITY
            };
            let sd = if a > 2.0 {
                let g1 = gamma(1.0 - 1.0 / a);
                p.scale * (gamma(1.0 - 2.0 / a) - g1 * g1).max(0.0).sqrt()
            } else {
                f64::INFINITY
            };
            (mean, sd)
        }
        Gev => {
            let xi = p.shape;
            if xi == 0.0 {
                return moments(Gumbel, p);
            }
            let mean = if xi < 1.0 {
                p.shift + p.scale * (gamma(1.0 - xi) - 1.0) / xi
            } else {
                f64::INFINITY
            };
            let sd = if xi < 0.5 {
                let g1 = gamma(1.0 - xi);
                let g2 = gamma(1.0 - 2.0 * xi);
                p.scale * (g2 - g1 * g1).max(0.0).sqrt() / xi.abs()
            } else {
                f64::INFINITY
            };
            (mean, sd)
        }
        Rayleigh => (
            p.shift + p.scale * (PI / 2.0).sqrt(),
            p.scale * ((4.0 - PI) / 2.0).sqrt(),
        ),
        Pareto => {
            let a = p.shape;
            let mean = if a > 1.0 {
                a * p.scale / (a - 1.0)
            } else {
                f64::INFINITY
            };
            let sd = if a > 2.0 {
                p.scale / (a - 1.0) * (a / (a - 2.0)).sqrt()
            } else {
                f64::INFINITY
            };
            (mean, sd)
        }
        GeneralizedPareto => {
            let xi = p.shape;
            let mean = if xi < 1.0 {
                p.shift + p.scale / (1.0 - xi)
            } else {
                f64::INFINITY
            };
            let sd = if xi < 0.5 {
                p.scale / ((1.0 - xi) * (1.0 - 2.0 * xi).sqrt())
            } else {
                f64::INFINITY
            };
            (mean, sd)
        }
        Beta => {
            let (a, b) = (p.shape, p.shape_b);
            let width = p.maximum - p.minimum;
            (
                p.minimum + width * a / (a + b),
                width * (a * b / ((a + b) * (a + b) * (a + b + 1.0))).sqrt(),
            )
        }
        Gamma => (
            p.shift + p.shape * p.scale,
            p.shape.sqrt() * p.scale,
        ),
        Bernoulli => (
            p.location,
            (p.location * (1.0 - p.location)).max(0.0).sqrt(),
        ),
        Poisson => (p.location, p.location.max(0.0).sqrt()),
        Histogram | CdfCurve | Discrete | Qualitative | Composite => (f64::NAN, f64::NAN),
    }
}

/// Coefficient of variation of a Weibull (sign = +1) or Frechet (sign = -1)
/// variable with the given shape.
fn extreme_value_cov(shape: f64, sign: f64) -> f64 {
    let g1 = gamma(1.0 + sign / shape);
    let g2 = gamma(1.0 + 2.0 * sign / shape);
    (g2 / (g1 * g1) - 1.0).max(0.0).sqrt()
}

/// Solve the shape of a Weibull or Frechet variable from its coefficient of variation.
fn shape_from_cov(cov: f64, sign: f64) -> f64 {
    let (lo, hi) = if sign > 0.0 { (0.05, 200.0) } else { (2.0001, 200.0) };
    // cov decreases with shape, so invert the increasing map shape -> -cov
    invert_monotone(|k| -extreme_value_cov(k.clamp(lo, hi), sign), -cov, lo, hi, 1e-10)
        .clamp(lo, hi)
}

/// Rescale the current parameters so the distribution has the given moments.
///
/// Parameters that fix the family's shape (shift for the shifted families,
/// shape for GEV) are preserved where the moments leave freedom.
pub(crate) fn set_moments(kind: DistributionType, p: &mut Parameters, mean: f64, deviation: f64) {
    let sd = deviation.max(0.0);
    match kind {
        Deterministic | Bernoulli | Poisson => p.location = mean,
        Normal => {
            p.location = mean;
            p.scale = sd;
        }
        LogNormal => {
            let offset = mean - p.shift;
            if offset <= 0.0 {
                tracing::debug!("log-normal mean {} not above shift {}", mean, p.shift);
                return;
            }
            let s2 = (1.0 + (sd / offset).powi(2)).ln();
            p.scale = s2.sqrt();
            p.location = offset.ln() - s2 / 2.0;
        }
        Uniform => {
            let half = sd * 3f64.sqrt();
            p.minimum = mean - half;
            p.maximum = mean + half;
        }
        Triangular => {
            let half = sd * 6f64.sqrt();
            p.minimum = mean - half;
            p.shift = mean;
            p.maximum = mean + half;
        }
        Trapezoidal => {
            let (old_mean, old_sd) = moments(kind, p);
            let factor = if old_sd > 0.0 { sd / old_sd } else { 1.0 };
            let map = |v: f64| mean + (v - old_mean) * factor;
            p.minimum = map(p.minimum);
            p.shift = map(p.shift);
            p.shift_b = map(p.shift_b);
            p.maximum = map(p.maximum);
        }
        Exponential => {
            p.scale = sd;
            p.shift = mean - sd;
        }
        Gumbel => {
            p.scale = sd * 6f64.sqrt() / PI;
            p.shift = mean - EULER_GAMMA * p.scale;
        }
        Weibull | Frechet => {
            let sign = if kind == Weibull { 1.0 } else { -1.0 };
            let offset = mean - p.shift;
            if offset <= 0.0 {
                return;
            }
            p.shape = shape_from_cov(sd / offset, sign);
            p.scale = offset / gamma(1.0 + sign / p.shape);
        }
        Gev => {
            let xi = p.shape;
            if xi == 0.0 || xi >= 0.5 {
                p.scale = sd * 6f64.sqrt() / PI;
                p.shift = mean - EULER_GAMMA * p.scale;
                if xi != 0.0 {
                    p.shape = 0.0;
                }
                return;
            }
            let g1 = gamma(1.0 - xi);
            let g2 = gamma(1.0 - 2.0 * xi);
            p.scale = sd * xi.abs() / (g2 - g1 * g1).sqrt();
            p.shift = mean - p.scale * (g1 - 1.0) / xi;
        }
        Rayleigh => {
            p.scale = sd / ((4.0 - PI) / 2.0).sqrt();
            p.shift = mean - p.scale * (PI / 2.0).sqrt();
        }
        Pareto => {
            if mean <= 0.0 || sd <= 0.0 {
                return;
            }
            let alpha = 1.0 + (1.0 + (mean / sd).powi(2)).sqrt();
            p.shape = alpha;
            p.scale = mean * (alpha - 1.0) / alpha;
        }
        GeneralizedPareto => {
            let offset = mean - p.shift;
            if offset <= 0.0 || sd <= 0.0 {
                return;
            }
            let xi = 0.5 * (1.0 - (offset / sd).powi(2));
            p.shape = xi;
            p.scale = offset * (1.0 - xi);
        }
        Beta => {
            let width = p.maximum - p.minimum;
            if width <= 0.0 {
                return;
            }
            let m = (mean - p.minimum) / width;
            let v = (sd / width).powi(2);
            if m <= 0.0 || m >= 1.0 || v <= 0.0 {
                return;
            }
            let common = m * (1.0 - m) / v - 1.0;
            if common > 0.0 {
                p.shape = m * common;
                p.shape_b = (1.0 - m) * common;
            }
        }
        Gamma => {
            let offset = mean - p.shift;
            if offset <= 0.0 || sd <= 0.0 {
                return;
            }
            p.shape = (offset / sd).powi(2);
            p.scale = sd * sd / offset;
        }
        Histogram | CdfCurve | Discrete | Qualitative | Composite => {}
    }
}

/// Record every out-of-domain parameter of the family.
pub(crate) fn validate(kind: DistributionType, p: &Parameters, name: &str, report: &mut ValidationReport) {
    match kind {
        Deterministic => {}
        Normal | LogNormal | Gumbel | Rayleigh | Exponential | Gev | GeneralizedPareto => {
            report.check_at_least(name, "scale", p.scale, 0.0);
        }
        Uniform => report.check_at_least(name, "maximum", p.maximum, p.minimum),
        Triangular => {
            report.check_at_least(name, "shift", p.shift, p.minimum);
            report.check_at_least(name, "maximum", p.maximum, p.shift);
        }
        Trapezoidal => {
            report.check_at_least(name, "shift", p.shift, p.minimum);
            report.check_at_least(name, "shift_b", p.shift_b, p.shift);
            report.check_at_least(name, "maximum", p.maximum, p.shift_b);
            if p.maximum + p.shift_b - p.minimum - p.shift <= 0.0 {
                report.error(name, "trapezoid has zero width");
            }
        }
        Weibull | Frechet | Pareto | Gamma => {
            report.check_greater(name, "scale", p.scale, 0.0);
            report.check_greater(name, "shape", p.shape, 0.0);
        }
        Beta => {
            report.check_greater(name, "shape", p.shape, 0.0);
            report.check_greater(name, "shape_b", p.shape_b, 0.0);
            report.check_greater(name, "maximum", p.maximum, p.minimum);
        }
        Bernoulli => {
            report.check_at_least(name, "location", p.location, 0.0);
            report.check_at_most(name, "location", p.location, 1.0);
        }
        Poisson => report.check_at_least(name, "location", p.location, 0.0),
        Histogram | CdfCurve | Discrete | Qualitative | Composite => {}
    }
}

/// Breakpoints of the density (support bounds, modes, mass points).
pub(crate) fn special_values(kind: DistributionType, p: &Parameters) -> Vec<f64> {
    match kind {
        Deterministic => vec![p.location],
        Normal => vec![p.location],
        LogNormal | Exponential | Gumbel | Weibull | Frechet | Rayleigh | Gamma => vec![p.shift],
        Gev | GeneralizedPareto => {
            let mut v = vec![p.shift];
            if p.shape != 0.0 {
                v.push(p.shift - p.scale / p.shape);
            }
            v
        }
        Uniform => vec![p.minimum, p.maximum],
        Triangular => vec![p.minimum, p.shift, p.maximum],
        Trapezoidal => vec![p.minimum, p.shift, p.shift_b, p.maximum],
        Pareto => vec![p.scale],
        Beta => vec![p.minimum, p.maximum],
        Bernoulli => vec![0.0, 1.0],
        Poisson => {
            let hi = (p.location + 10.0 * p.location.sqrt() + 10.0).ceil() as usize;
            (0..=hi.min(10_000)).map(|n| n as f64).collect()
        }
        Histogram | CdfCurve | Discrete | Qualitative | Composite => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::standard_normal::u_from_p;

    fn params() -> Parameters {
        Parameters::default()
    }

    fn check_round_trip(kind: DistributionType, p: &Parameters) {
        for &u in &[-5.0, -2.0, -0.3, 0.0, 0.7, 2.5, 6.0] {
            let x = x_from_u(kind, p, u);
            let (pr, q) = probabilities(kind, p, x);
            let back = if pr < 0.5 {
                u_from_p(pr).unwrap()
            } else {
                -u_from_p(q).unwrap()
            };
            assert!(
                (back - u).abs() < 1e-5,
                "{kind}: u = {u}, x = {x}, back = {back}"
            );
        }
    }

    #[test]
    fn test_continuous_round_trips() {
        let mut p = params();
        p.location = 1.0;
        p.scale = 0.5;
        p.shift = 0.2;
        p.shape = 2.5;
        p.shape_b = 3.0;
        p.minimum = -1.0;
        p.maximum = 4.0;
        for kind in [
            Normal, LogNormal, Uniform, Exponential, Gumbel, Weibull, Frechet, Rayleigh, Pareto,
            Beta, Gamma,
        ] {
            check_round_trip(kind, &p);
        }
        p.shape = 0.2;
        check_round_trip(Gev, &p);
        check_round_trip(GeneralizedPareto, &p);
        p.shape = -0.2;
        check_round_trip(Gev, &p);
    }

    #[test]
    fn test_triangular_and_trapezoidal_round_trip() {
        let mut p = params();
        p.minimum = 0.0;
        p.shift = 1.0;
        p.shift_b = 2.0;
        p.maximum = 4.0;
        check_round_trip(Triangular, &p);
        check_round_trip(Trapezoidal, &p);
    }

    #[test]
    fn test_upper_tail_precision() {
        let mut p = params();
        p.scale = 2.0;
        // exponential: x = scale * u-tail, q must stay exact at u = 7
        let x = x_from_u(Exponential, &p, 7.0);
        let (_, q) = probabilities(Exponential, &p, x);
        assert!((q - q_from_u(7.0)).abs() / q_from_u(7.0) < 1e-9);
    }

    #[test]
    fn test_moments_match_numeric() {
        let mut p = params();
        p.scale = 1.5;
        p.shape = 2.0;
        p.shift = 0.5;
        for kind in [Weibull, Gumbel, Rayleigh, Gamma, LogNormal] {
            let (m, s) = moments(kind, &p);
            let (nm, ns) = numeric_moments(kind, &p);
            assert!((m - nm).abs() < 1e-3, "{kind} mean {m} vs {nm}");
            assert!((s - ns).abs() < 1e-3, "{kind} sd {s} vs {ns}");
        }
    }

    #[test]
    fn test_gamma_quantiles_increase_from_shift() {
        let mut p = params();
        p.shape = 2.5;
        p.scale = 0.5;
        p.shift = 0.0;
        let mut previous = 0.0;
        for u in [-3.0, -1.0, 0.0, 1.0, 3.0] {
            let x = x_from_u(Gamma, &p, u);
            assert!(x > previous, "u = {u}: x = {x} after {previous}");
            let (pr, _) = probabilities(Gamma, &p, x);
            assert!((pr - p_from_u(u)).abs() < 1e-9, "u = {u}: cdf {pr}");
            previous = x;
        }
        // median of Gamma(2.5) is about 2.1746 in units of scale
        assert!((x_from_u(Gamma, &p, 0.0) - 0.5 * 2.174_6).abs() < 1e-3);
    }

    #[test]
    fn test_set_moments_recovers_moments() {
        for kind in [
            Normal, LogNormal, Uniform, Triangular, Exponential, Gumbel, Weibull, Frechet,
            Rayleigh, Pareto, GeneralizedPareto, Gamma,
        ] {
            let mut p = params();
            set_moments(kind, &mut p, 10.0, 2.0);
            let (m, s) = moments(kind, &p);
            assert!((m - 10.0).abs() < 1e-4, "{kind} mean {m}");
            assert!((s - 2.0).abs() < 1e-4, "{kind} sd {s}");
        }
    }

    #[test]
    fn test_poisson_quantile_is_integer() {
        let mut p = params();
        p.location = 4.0;
        let x = x_from_u(Poisson, &p, 0.0);
        assert_eq!(x, 4.0);
        assert_eq!(x.fract(), 0.0);
    }

    #[test]
    fn test_validation_messages() {
        let mut p = params();
        p.scale = -1.0;
        let mut report = ValidationReport::new();
        validate(Normal, &p, "a", &mut report);
        assert_eq!(report.len(), 1);
        assert_eq!(
            report.messages()[0].to_string(),
            "Error: a => scale value -1 is less than 0"
        );
        let mut report = ValidationReport::new();
        validate(Uniform, &p, "a", &mut report);
        assert!(report.is_valid());
    }
}

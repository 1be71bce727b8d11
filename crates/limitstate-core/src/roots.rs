//! One-dimensional root finding and quadrature helpers.

/// Find `x` in `[lo, hi]` with `f(x) = target` for a non-decreasing `f`.
///
/// The bracket is widened geometrically (at most 60 times) when it does
/// not contain the target. Returns the best bracket midpoint after
/// `max_iterations` halvings or once the bracket is narrower than
/// `tolerance` (relative to its magnitude).
pub fn invert_monotone<F>(mut f: F, target: f64, lo: f64, hi: f64, tolerance: f64) -> f64
where
    F: FnMut(f64) -> f64,
{
    let (mut lo, mut hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    let mut width = (hi - lo).max(1.0);
    for _ in 0..60 {
        if f(lo) <= target {
            break;
        }
        lo -= width;
        width *= 2.0;
    }
    let mut width = (hi - lo).max(1.0);
    for _ in 0..60 {
        if f(hi) >= target {
            break;
        }
        hi += width;
        width *= 2.0;
    }

    for _ in 0..200 {
        let mid = 0.5 * (lo + hi);
        if hi - lo <= tolerance * (1.0 + mid.abs()) {
            return mid;
        }
        if f(mid) < target {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    0.5 * (lo + hi)
}

/// Root of `f` in a bracket with `f(lo)` and `f(hi)` of opposite sign,
/// using the Illinois variant of regula falsi.
///
/// Returns `None` when the bracket does not change sign.
pub fn illinois<F>(mut f: F, mut lo: f64, mut hi: f64, tolerance: f64, max_iterations: usize) -> Option<f64>
where
    F: FnMut(f64) -> f64,
{
    let mut f_lo = f(lo);
    let mut f_hi = f(hi);
    illinois_with_values(&mut f, &mut lo, &mut hi, &mut f_lo, &mut f_hi, tolerance, max_iterations)
}

/// [`illinois`] with the bracket values already known.
pub fn illinois_with_values<F>(
    f: &mut F,
    lo: &mut f64,
    hi: &mut f64,
    f_lo: &mut f64,
    f_hi: &mut f64,
    tolerance: f64,
    max_iterations: usize,
) -> Option<f64>
where
    F: FnMut(f64) -> f64,
{
    if *f_lo == 0.0 {
        return Some(*lo);
    }
    if *f_hi == 0.0 {
        return Some(*hi);
    }
    if f_lo.signum() == f_hi.signum() || f_lo.is_nan() || f_hi.is_nan() {
        return None;
    }
    let mut side = 0i8;
    for _ in 0..max_iterations {
        let mut x = (*lo * *f_hi - *hi * *f_lo) / (*f_hi - *f_lo);
        if !x.is_finite() || x <= lo.min(*hi) || x >= lo.max(*hi) {
            x = 0.5 * (*lo + *hi);
        }
        let fx = f(x);
        if fx == 0.0 || (*hi - *lo).abs() < tolerance {
            return Some(x);
        }
        if fx.signum() == f_hi.signum() {
            *hi = x;
            *f_hi = fx;
            if side == 1 {
                *f_lo *= 0.5;
            }
            side = 1;
        } else {
            *lo = x;
            *f_lo = fx;
            if side == -1 {
                *f_hi *= 0.5;
            }
            side = -1;
        }
        if (*hi - *lo).abs() < tolerance {
            return Some(0.5 * (*lo + *hi));
        }
    }
    Some(0.5 * (*lo + *hi))
}

/// Composite Simpson rule over `[a, b]` with `n` (made even) intervals.
pub fn simpson<F>(f: F, a: f64, b: f64, n: usize) -> f64
where
    F: Fn(f64) -> f64,
{
    let n = n.max(2) + n % 2;
    let h = (b - a) / n as f64;
    let mut sum = f(a) + f(b);
    for i in 1..n {
        let x = a + i as f64 * h;
        sum += if i % 2 == 1 { 4.0 } else { 2.0 } * f(x);
    }
    sum * h / 3.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invert_monotone_expands_bracket() {
        let x = invert_monotone(|x| x * x * x, 27.0, 0.0, 1.0, 1e-12);
        assert!((x - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_illinois_linear_exact() {
        let root = illinois(|x| 2.0 * x - 3.0, 0.0, 10.0, 1e-10, 50).unwrap();
        assert!((root - 1.5).abs() < 1e-9);
        assert!(illinois(|x| x + 10.0, 0.0, 1.0, 1e-10, 50).is_none());
    }

    #[test]
    fn test_illinois_nonlinear() {
        let root = illinois(|x: f64| x.exp() - 2.0, 0.0, 3.0, 1e-12, 100).unwrap();
        assert!((root - 2f64.ln()).abs() < 1e-9);
    }

    #[test]
    fn test_simpson_polynomial() {
        let integral = simpson(|x| x * x, 0.0, 3.0, 10);
        assert!((integral - 9.0).abs() < 1e-12);
    }
}

//! Small helpers on plain `f64` slices used as u-space vectors.

pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

pub fn norm(u: &[f64]) -> f64 {
    dot(u, u).sqrt()
}

pub fn scale(u: &[f64], factor: f64) -> Vec<f64> {
    u.iter().map(|v| v * factor).collect()
}

/// Unit vector along `u`, or `None` for the zero vector.
pub fn normalize(u: &[f64]) -> Option<Vec<f64>> {
    let n = norm(u);
    (n > 0.0 && n.is_finite()).then(|| scale(u, 1.0 / n))
}

pub fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum::<f64>().sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        let unit = normalize(&[3.0, 4.0]).unwrap();
        assert!((unit[0] - 0.6).abs() < 1e-12);
        assert!((unit[1] - 0.8).abs() < 1e-12);
        assert!(normalize(&[0.0, 0.0]).is_none());
    }
}

//! Finite-difference gradients of z in u-space.

use crate::error::ModelError;
use crate::model::ZModel;
use crate::settings::GradientType;

/// z and ∇z at one point.
#[derive(Debug, Clone, PartialEq)]
pub struct Gradient {
    pub z: f64,
    pub gradient: Vec<f64>,
}

/// Estimate z and its gradient at `u`.
///
/// All probes (and `u` itself) are evaluated as one batch. The single-sided
/// scheme steps forward by `step`; the double-sided scheme probes `u ± step/2`.
pub fn gradient(
    model: &ZModel,
    u: &[f64],
    gradient_type: GradientType,
    step: f64,
) -> Result<Gradient, ModelError> {
    let n = u.len();
    let mut probes = Vec::with_capacity(1 + 2 * n);
    probes.push(u.to_vec());
    for i in 0..n {
        match gradient_type {
            GradientType::Single => {
                let mut p = u.to_vec();
                p[i] += step;
                probes.push(p);
            }
            GradientType::Double => {
                let mut lo = u.to_vec();
                let mut hi = u.to_vec();
                lo[i] -= 0.5 * step;
                hi[i] += 0.5 * step;
                probes.push(lo);
                probes.push(hi);
            }
        }
    }
    let z = model.z_batch(&probes)?;
    let gradient = (0..n)
        .map(|i| match gradient_type {
            GradientType::Single => (z[1 + i] - z[0]) / step,
            GradientType::Double => (z[2 + 2 * i] - z[1 + 2 * i]) / step,
        })
        .collect();
    Ok(Gradient { z: z[0], gradient })
}

//! Root finding of z along rays from the origin of u-space.

use limitstate_core::roots::illinois_with_values;

use crate::error::ModelError;
use crate::model::ZModel;
use crate::vector::scale;

const MAX_ROOT_ITERATIONS: usize = 50;

/// Root of `r ↦ z(r·direction)` inside a bracket whose end values differ in sign.
pub fn bracketed_root(
    model: &ZModel,
    direction: &[f64],
    (mut lo, mut z_lo): (f64, f64),
    (mut hi, mut z_hi): (f64, f64),
    tolerance: f64,
) -> Result<f64, ModelError> {
    let mut failure = None;
    let mut f = |r: f64| match model.z(&scale(direction, r)) {
        Ok(z) => z,
        Err(e) => {
            failure.get_or_insert(e);
            f64::NAN
        }
    };
    let root = illinois_with_values(
        &mut f,
        &mut lo,
        &mut hi,
        &mut z_lo,
        &mut z_hi,
        tolerance,
        MAX_ROOT_ITERATIONS,
    );
    if let Some(e) = failure {
        return Err(e);
    }
    Ok(root.unwrap_or(0.5 * (lo + hi)))
}

/// First sign change of z along each direction, stepping outward by `du` up
/// to `maximum_length`.
///
/// `z0` is z at the origin. Every step is evaluated for all still-open
/// directions as one batch; brackets are then refined per direction.
/// `None` means z keeps the sign of `z0` up to `maximum_length`.
pub fn ray_roots(
    model: &ZModel,
    directions: &[Vec<f64>],
    z0: f64,
    du: f64,
    maximum_length: f64,
    tolerance: f64,
) -> Result<Vec<Option<f64>>, ModelError> {
    let mut roots = vec![None; directions.len()];
    let mut previous = vec![(0.0, z0); directions.len()];
    let mut open: Vec<usize> = (0..directions.len()).collect();
    let mut brackets = Vec::new();
    let mut r = 0.0;
    while !open.is_empty() && r < maximum_length {
        r = (r + du).min(maximum_length);
        let probes: Vec<Vec<f64>> = open.iter().map(|&i| scale(&directions[i], r)).collect();
        let z = model.z_batch(&probes)?;
        let mut still_open = Vec::with_capacity(open.len());
        for (&i, &zi) in open.iter().zip(&z) {
            let crossed = (z0 > 0.0 && zi <= 0.0) || (z0 <= 0.0 && zi > 0.0);
            if crossed {
                brackets.push((i, previous[i], (r, zi)));
            } else {
                previous[i] = (r, zi);
                still_open.push(i);
            }
        }
        open = still_open;
    }
    for (i, lo, hi) in brackets {
        roots[i] = Some(bracketed_root(model, &directions[i], lo, hi, tolerance)?);
    }
    Ok(roots)
}

use std::sync::Mutex;

use limitstate_core::SpaceTransform;

use super::{ModelAdapter, Response};
use crate::error::ModelError;
use crate::reliability::Realization;
use crate::vector::norm;

/// The limit-state function seen from u-space.
///
/// Maps u-vectors to physical inputs, evaluates them through the adapter in
/// one batch and reduces the outputs to z. Optionally records every
/// evaluation as a [`Realization`].
pub struct ZModel<'a> {
    transform: &'a SpaceTransform,
    adapter: &'a ModelAdapter,
    response: Response,
    record: bool,
    realizations: Mutex<Vec<Realization>>,
}

impl<'a> ZModel<'a> {
    pub fn new(
        transform: &'a SpaceTransform,
        adapter: &'a ModelAdapter,
        response: Response,
        record: bool,
    ) -> Self {
        Self {
            transform,
            adapter,
            response,
            record,
            realizations: Mutex::new(Vec::new()),
        }
    }

    pub fn transform(&self) -> &'a SpaceTransform {
        self.transform
    }

    pub fn adapter(&self) -> &'a ModelAdapter {
        self.adapter
    }

    pub fn response(&self) -> Response {
        self.response
    }

    /// Dimension of the search space.
    pub fn u_count(&self) -> usize {
        self.transform.u_count()
    }

    /// Model calls made through the adapter so far.
    pub fn runs(&self) -> usize {
        self.adapter.runs()
    }

    pub fn z(&self, u: &[f64]) -> Result<f64, ModelError> {
        let z = self.z_batch(std::slice::from_ref(&u.to_vec()))?;
        Ok(z[0])
    }

    /// Limit-state values of a batch of u-vectors, in input order.
    pub fn z_batch(&self, us: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        let xs: Vec<Vec<f64>> = us.iter().map(|u| self.transform.x_from_u(u)).collect();
        let outputs = self.adapter.evaluate_batch(&xs)?;
        let z: Vec<f64> = outputs.iter().map(|y| self.response.z(y)).collect();
        if self.record {
            if let Ok(mut realizations) = self.realizations.lock() {
                let first = realizations.len();
                for (i, ((u, x), y)) in us.iter().zip(xs).zip(outputs).enumerate() {
                    realizations.push(Realization {
                        iteration: first + i,
                        z: z[i],
                        beta: norm(u),
                        weight: 1.0,
                        input_values: x,
                        output_values: y,
                    });
                }
            }
        }
        Ok(z)
    }

    /// Flat outputs for physical input vectors, bypassing the transform.
    pub fn outputs_x_batch(&self, xs: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ModelError> {
        self.adapter.evaluate_batch(xs)
    }

    /// Flat outputs for u-vectors.
    pub fn outputs_batch(&self, us: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ModelError> {
        let xs: Vec<Vec<f64>> = us.iter().map(|u| self.transform.x_from_u(u)).collect();
        self.adapter.evaluate_batch(&xs)
    }

    /// Overwrite the weights of the most recent recorded realizations.
    pub fn set_last_weights(&self, weights: &[f64]) {
        if let Ok(mut realizations) = self.realizations.lock() {
            let n = realizations.len();
            let start = n.saturating_sub(weights.len());
            for (r, w) in realizations[start..].iter_mut().zip(weights) {
                r.weight = *w;
            }
        }
    }

    pub fn take_realizations(&self) -> Vec<Realization> {
        self.realizations
            .lock()
            .map(|mut r| std::mem::take(&mut *r))
            .unwrap_or_default()
    }
}

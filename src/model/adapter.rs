//! Batched, optionally parallel and memoized model evaluation.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use rayon::prelude::*;
use rayon::ThreadPool;
use tracing::{debug, warn};

use super::{flat_size, Evaluator, ModelParameter};
use crate::error::ModelError;

enum Parallelism {
    Sequential,
    /// Rayon's global pool, sized to the machine.
    Global,
    Pool(Arc<ThreadPool>),
}

/// Wraps an [`Evaluator`] with a worker pool, a run counter and an optional
/// cache keyed by the exact bits of the input vector.
///
/// Batches are evaluated in full before their results are returned, and the
/// results keep the order of the inputs whatever worker computed them.
pub struct ModelAdapter {
    evaluator: Arc<dyn Evaluator>,
    parallelism: Parallelism,
    max_parallel_processes: usize,
    reuse_calculations: bool,
    cache: Mutex<HashMap<Vec<u64>, Vec<f64>>>,
    runs: AtomicUsize,
}

impl fmt::Debug for ModelAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelAdapter")
            .field("inputs", &self.evaluator.input_parameters())
            .field("outputs", &self.evaluator.output_parameters())
            .field("max_parallel_processes", &self.max_parallel_processes)
            .field("reuse_calculations", &self.reuse_calculations)
            .field("runs", &self.runs())
            .finish()
    }
}

fn cache_key(inputs: &[f64]) -> Vec<u64> {
    inputs.iter().map(|v| v.to_bits()).collect()
}

impl ModelAdapter {
    pub fn new(evaluator: impl Evaluator + 'static) -> Self {
        Self::from_arc(Arc::new(evaluator))
    }

    pub fn from_arc(evaluator: Arc<dyn Evaluator>) -> Self {
        Self {
            evaluator,
            parallelism: Parallelism::Sequential,
            max_parallel_processes: 1,
            reuse_calculations: false,
            cache: Mutex::new(HashMap::new()),
            runs: AtomicUsize::new(0),
        }
    }

    pub fn evaluator(&self) -> &Arc<dyn Evaluator> {
        &self.evaluator
    }

    pub fn input_parameters(&self) -> &[ModelParameter] {
        self.evaluator.input_parameters()
    }

    pub fn output_parameters(&self) -> &[ModelParameter] {
        self.evaluator.output_parameters()
    }

    pub fn input_size(&self) -> usize {
        flat_size(self.input_parameters())
    }

    /// Number of flat outputs (`z_values_size`).
    pub fn output_size(&self) -> usize {
        flat_size(self.output_parameters())
    }

    pub fn max_parallel_processes(&self) -> usize {
        self.max_parallel_processes
    }

    /// Size the worker pool: 0 uses all cores, 1 evaluates sequentially.
    pub fn set_max_parallel_processes(&mut self, processes: usize) {
        if processes == self.max_parallel_processes {
            return;
        }
        self.max_parallel_processes = processes;
        self.parallelism = match processes {
            0 => Parallelism::Global,
            1 => Parallelism::Sequential,
            n => match rayon::ThreadPoolBuilder::new().num_threads(n).build() {
                Ok(pool) => Parallelism::Pool(Arc::new(pool)),
                Err(e) => {
                    warn!("could not build a pool of {n} workers ({e}), using the global pool");
                    Parallelism::Global
                }
            },
        };
    }

    pub fn reuse_calculations(&self) -> bool {
        self.reuse_calculations
    }

    /// Enable or disable memoization. Disabling drops all cached results.
    pub fn set_reuse_calculations(&mut self, reuse: bool) {
        self.reuse_calculations = reuse;
        if !reuse {
            self.clear_cache();
        }
    }

    pub fn clear_cache(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
    }

    /// Number of cached input vectors.
    pub fn cached(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// Total model calls so far (cache hits excluded).
    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::Relaxed)
    }

    pub fn reset_runs(&self) {
        self.runs.store(0, Ordering::Relaxed);
    }

    fn lookup(&self, inputs: &[f64]) -> Option<Vec<f64>> {
        if !self.reuse_calculations {
            return None;
        }
        self.cache.lock().ok()?.get(&cache_key(inputs)).cloned()
    }

    fn evaluate_one(&self, sample: usize, inputs: &[f64]) -> Result<Vec<f64>, ModelError> {
        if let Some(outputs) = self.lookup(inputs) {
            return Ok(outputs);
        }
        self.runs.fetch_add(1, Ordering::Relaxed);
        let outputs = self
            .evaluator
            .evaluate(inputs)
            .map_err(|e| ModelError::new(sample, inputs.to_vec(), e))?;
        if self.reuse_calculations {
            if let Ok(mut cache) = self.cache.lock() {
                cache.insert(cache_key(inputs), outputs.clone());
            }
        }
        Ok(outputs)
    }

    /// Evaluate one flat input vector.
    pub fn evaluate(&self, inputs: &[f64]) -> Result<Vec<f64>, ModelError> {
        self.evaluate_one(self.runs(), inputs)
    }

    /// Evaluate a batch; any failing sample aborts it with its index and inputs.
    pub fn evaluate_batch(&self, inputs: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ModelError> {
        let first = self.runs();
        debug!(samples = inputs.len(), first, "evaluating batch");
        let run = |(i, x): (usize, &Vec<f64>)| self.evaluate_one(first + i, x);
        match &self.parallelism {
            Parallelism::Sequential => inputs.iter().enumerate().map(run).collect(),
            Parallelism::Global => inputs.par_iter().enumerate().map(run).collect(),
            Parallelism::Pool(pool) => {
                pool.install(|| inputs.par_iter().enumerate().map(run).collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FnModel;
    use std::sync::atomic::AtomicU64;

    fn counting_model(state: Arc<AtomicU64>) -> FnModel {
        FnModel::scalar(&["a"], move |x| x[0] + state.load(Ordering::Relaxed) as f64)
    }

    #[test]
    fn test_cache_returns_stale_value_until_disabled() {
        let state = Arc::new(AtomicU64::new(0));
        let mut adapter = ModelAdapter::new(counting_model(state.clone()));
        adapter.set_reuse_calculations(true);

        assert_eq!(adapter.evaluate(&[1.0]).unwrap(), vec![1.0]);
        state.store(10, Ordering::Relaxed);
        assert_eq!(adapter.evaluate(&[1.0]).unwrap(), vec![1.0]);
        assert_eq!(adapter.runs(), 1);

        adapter.set_reuse_calculations(false);
        assert_eq!(adapter.evaluate(&[1.0]).unwrap(), vec![11.0]);
        assert_eq!(adapter.runs(), 2);
    }

    #[test]
    fn test_parallel_batch_keeps_order() {
        let mut adapter = ModelAdapter::new(FnModel::scalar(&["a"], |x| x[0] * 2.0));
        adapter.set_max_parallel_processes(4);
        let inputs: Vec<Vec<f64>> = (0..200).map(|i| vec![i as f64]).collect();
        let outputs = adapter.evaluate_batch(&inputs).unwrap();
        for (i, y) in outputs.iter().enumerate() {
            assert_eq!(y[0], 2.0 * i as f64);
        }
        assert_eq!(adapter.runs(), 200);
    }

    #[test]
    fn test_failure_reports_sample_and_inputs() {
        let model = FnModel::try_new(
            vec![ModelParameter::scalar("a")],
            vec![ModelParameter::scalar("z")],
            |x| {
                if x[0] > 2.5 {
                    Err("out of range".into())
                } else {
                    Ok(vec![x[0]])
                }
            },
        );
        let adapter = ModelAdapter::new(model);
        let inputs: Vec<Vec<f64>> = (0..5).map(|i| vec![i as f64]).collect();
        let error = adapter.evaluate_batch(&inputs).unwrap_err();
        assert_eq!(error.sample, 3);
        assert_eq!(error.inputs, vec![3.0]);
    }
}

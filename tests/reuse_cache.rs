//! Memoization of model evaluations.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use limitstate::{FnModel, ModelAdapter, Project, Stochast};

fn shifted_model(shift: Arc<AtomicU64>) -> FnModel {
    FnModel::scalar(&["a"], move |x| x[0] + shift.load(Ordering::Relaxed) as f64)
}

#[test]
fn cached_value_survives_model_state_change() {
    let shift = Arc::new(AtomicU64::new(0));
    let mut adapter = ModelAdapter::new(shifted_model(shift.clone()));
    adapter.set_reuse_calculations(true);

    assert_eq!(adapter.evaluate(&[1.0]).unwrap(), vec![1.0]);
    shift.store(10, Ordering::Relaxed);
    assert_eq!(adapter.evaluate(&[1.0]).unwrap(), vec![1.0]);
    assert_eq!(adapter.evaluate(&[2.0]).unwrap(), vec![12.0]);
    assert_eq!(adapter.runs(), 2);

    adapter.set_reuse_calculations(false);
    assert_eq!(adapter.evaluate(&[1.0]).unwrap(), vec![11.0]);
}

#[test]
fn repeated_run_hits_the_cache() {
    let mut project = Project::with_model(FnModel::scalar(&["a", "b"], |x| 3.0 - x[0] - x[1]));
    project.set_variable(Stochast::normal("a", 0.0, 1.0));
    project.set_variable(Stochast::normal("b", 0.0, 1.0));
    project.model_mut().unwrap().set_reuse_calculations(true);

    project.run().unwrap();
    let first = project.design_point().cloned().unwrap();
    assert!(first.total_model_runs > 0);

    project.run().unwrap();
    let second = project.design_point().unwrap();
    assert_eq!(second.total_model_runs, 0);
    assert_eq!(second.reliability_index, first.reliability_index);
}

#[test]
fn batch_results_keep_input_order_in_parallel() {
    let mut adapter = ModelAdapter::new(FnModel::scalar(&["a"], |x| 2.0 * x[0]));
    adapter.set_max_parallel_processes(4);
    let inputs: Vec<Vec<f64>> = (0..1_000).map(|i| vec![i as f64]).collect();
    let outputs = adapter.evaluate_batch(&inputs).unwrap();
    for (i, y) in outputs.iter().enumerate() {
        assert_eq!(y[0], 2.0 * i as f64);
    }
    assert_eq!(adapter.runs(), 1_000);
}

#[test]
fn failing_model_reports_sample() {
    let model = FnModel::try_new(
        vec![limitstate::ModelParameter::scalar("a")],
        vec![limitstate::ModelParameter::scalar("z")],
        |x| {
            if x[0] < 0.0 {
                Err("negative input".into())
            } else {
                Ok(vec![x[0].sqrt()])
            }
        },
    );
    let adapter = ModelAdapter::new(model);
    let error = adapter.evaluate_batch(&[vec![4.0], vec![-1.0]]).unwrap_err();
    assert!(error.to_string().contains("negative input"), "{error}");
}

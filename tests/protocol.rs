//! End-to-end runs through the object-property protocol.

use limitstate::protocol::{Engine, Value};
use limitstate::{FnModel, ModelParameter};

fn int(engine: &mut Engine, id: i64, key: &str) -> i64 {
    engine.get(id, key).unwrap().as_i64(key).unwrap()
}

fn double(engine: &mut Engine, id: i64, key: &str) -> f64 {
    engine.get(id, key).unwrap().as_f64(key).unwrap()
}

fn variables(engine: &mut Engine, project: i64) -> Vec<i64> {
    match engine.get(project, "variables").unwrap() {
        Value::IntArray(ids) => ids,
        other => panic!("variables should be ids, got {other:?}"),
    }
}

fn normal(engine: &mut Engine, variable: i64, mean: f64, deviation: f64) {
    engine.set(variable, "distribution", "normal").unwrap();
    engine.set(variable, "mean", mean).unwrap();
    engine.set(variable, "deviation", deviation).unwrap();
}

/// Reliability project of `z = β - x`, run with FORM.
fn mode(engine: &mut Engine, beta: f64) -> i64 {
    let project = engine.create("project").unwrap();
    engine
        .set_model(project, FnModel::scalar(&["x"], move |x| beta - x[0]))
        .unwrap();
    let variable = variables(engine, project)[0];
    normal(engine, variable, 0.0, 1.0);
    engine.invoke(project, "run").unwrap();
    int(engine, project, "design_point")
}

#[test]
fn correlation_matrix_by_stochast_ids() {
    let mut engine = Engine::new();
    let project = engine.create("project").unwrap();
    engine
        .set_model(project, FnModel::scalar(&["a", "b", "c"], |x| 3.0 - x[0] - x[1] - x[2]))
        .unwrap();
    let ids = variables(&mut engine, project);
    let matrix = int(&mut engine, project, "correlation_matrix");

    engine.set_indexed2(matrix, "correlation", ids[0], ids[1], 0.8).unwrap();
    let ab = engine.get_indexed2(matrix, "correlation", ids[0], ids[1]).unwrap();
    let ba = engine.get_indexed2(matrix, "correlation", ids[1], ids[0]).unwrap();
    assert_eq!(ab, Value::Double(0.8));
    assert_eq!(ba, Value::Double(0.8));
    assert_eq!(
        engine.get_indexed2(matrix, "correlation", ids[0], ids[2]).unwrap(),
        Value::Double(0.0)
    );
    assert_eq!(
        engine.get_indexed2(matrix, "correlation", ids[2], ids[2]).unwrap(),
        Value::Double(1.0)
    );
}

#[test]
fn settings_object_selects_method() {
    let mut engine = Engine::new();
    let project = engine.create("project").unwrap();
    engine
        .set_model(project, FnModel::scalar(&["a"], |x| 2.0 - x[0]))
        .unwrap();
    let variable = variables(&mut engine, project)[0];
    normal(&mut engine, variable, 0.0, 1.0);

    let settings = int(&mut engine, project, "settings");
    engine.set(settings, "reliability_method", "crude_monte_carlo").unwrap();
    engine.set(settings, "minimum_samples", 50_000usize).unwrap();
    engine.set(settings, "maximum_samples", 50_000usize).unwrap();
    engine.set(settings, "random_seed", 31i64).unwrap();
    assert_eq!(
        engine.get(settings, "reliability_method").unwrap(),
        Value::String("crude_monte_carlo".into())
    );
    assert!(engine.set(settings, "reliability_method", "guesswork").is_err());

    engine.invoke(project, "run").unwrap();
    let point = int(&mut engine, project, "design_point");
    assert_eq!(
        engine.get(point, "identifier").unwrap(),
        Value::String("Crude Monte Carlo".into())
    );
    let beta = double(&mut engine, point, "reliability_index");
    assert!((beta - 2.0).abs() < 0.05, "beta {beta}");
    assert_eq!(int(&mut engine, project, "total_model_runs"), 50_000);
}

#[test]
fn alphas_are_objects() {
    let mut engine = Engine::new();
    let point = mode(&mut engine, 2.5);
    assert_eq!(engine.count(point, "alphas").unwrap(), 1);
    let alpha = engine
        .get_indexed(point, "alphas", 0)
        .unwrap()
        .as_i64("alphas")
        .unwrap();
    assert!((double(&mut engine, alpha, "alpha") + 1.0).abs() < 1e-6);
    assert!((double(&mut engine, alpha, "x") - 2.5).abs() < 1e-6);
    assert_eq!(engine.get(alpha, "name").unwrap(), Value::String("x".into()));
}

#[test]
fn combine_design_points_in_series() {
    let mut engine = Engine::new();
    let q: f64 = 0.01;
    let beta = limitstate::core::standard_normal::u_from_q(q).unwrap();
    let first = mode(&mut engine, beta);
    let second = mode(&mut engine, beta);

    let combine = engine.create("combine_project").unwrap();
    engine.set(combine, "design_points", vec![first, second]).unwrap();
    engine.set(combine, "combine_type", "series").unwrap();
    engine.set(combine, "combiner_method", "directional_sampling").unwrap();
    engine.set(combine, "random_seed", 32i64).unwrap();
    assert_eq!(engine.get(combine, "is_valid").unwrap(), Value::Bool(true));
    engine.invoke(combine, "run").unwrap();

    let point = int(&mut engine, combine, "design_point");
    let combined = double(&mut engine, point, "reliability_index");
    let expected = limitstate::core::standard_normal::u_from_q(2.0 * q - q * q).unwrap();
    assert!((combined - expected).abs() < 0.02, "beta {combined} expected {expected}");
    assert_eq!(engine.count(point, "contributing_design_points").unwrap(), 2);
}

#[test]
fn uncertainty_project_registers_output_stochasts() {
    let mut engine = Engine::new();
    let project = engine.create("uncertainty_project").unwrap();
    let model = FnModel::new(
        vec![ModelParameter::scalar("a"), ModelParameter::scalar("b")],
        vec![ModelParameter::scalar("y"), ModelParameter::scalar("w")],
        |x| vec![x[0] + x[1], x[0] - x[1]],
    );
    engine.set_model(project, model).unwrap();
    for variable in variables(&mut engine, project) {
        normal(&mut engine, variable, 1.0, 2.0);
    }
    let settings = int(&mut engine, project, "settings");
    engine.set(settings, "uncertainty_method", "fosm").unwrap();
    engine.set(settings, "quantiles", vec![0.5]).unwrap();
    engine.invoke(project, "run").unwrap();

    assert_eq!(engine.count(project, "output_stochasts").unwrap(), 2);
    let y = int(&mut engine, project, "stochast");
    assert_eq!(engine.get(y, "name").unwrap(), Value::String("y".into()));
    assert_eq!(
        engine.get(y, "distribution").unwrap(),
        Value::String("normal".into())
    );
    assert!((double(&mut engine, y, "mean") - 2.0).abs() < 1e-9);
    assert!((double(&mut engine, y, "deviation") - 8f64.sqrt()).abs() < 1e-9);
    let cdf = engine.get_at(y, "cdf", 2.0).unwrap();
    assert!((cdf - 0.5).abs() < 1e-9);
}

#[test]
fn sensitivity_project_lists_outputs() {
    let mut engine = Engine::new();
    let project = engine.create("sensitivity_project").unwrap();
    engine
        .set_model(project, FnModel::scalar(&["a", "b"], |x| 3.0 * x[0] + x[1]))
        .unwrap();
    for variable in variables(&mut engine, project) {
        normal(&mut engine, variable, 0.0, 1.0);
    }
    engine.invoke(project, "run").unwrap();
    assert_eq!(int(&mut engine, project, "outputs"), 1);
    match engine.get(project, "high").unwrap() {
        Value::DoubleArray(high) => {
            assert_eq!(high.len(), 2);
            assert!(high[0] > high[1]);
        }
        other => panic!("expected one value per variable, got {other:?}"),
    }
}

#[test]
fn destroyed_objects_are_gone() {
    let mut engine = Engine::new();
    let id = engine.create("stochast").unwrap();
    engine.destroy(id).unwrap();
    assert!(engine.get(id, "mean").is_err());
}

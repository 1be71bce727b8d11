//! Output distributions of uncertainty projects.

use limitstate::core::DistributionType;
use limitstate::{
    FnModel, ModelParameter, Stochast, UncertaintyMethod, UncertaintyProject, UncertaintySettings,
};

/// `y = a + 2b`, `w = a - b`, `v = 2a + 4b` with independent standard normals.
fn linear_project(settings: UncertaintySettings) -> UncertaintyProject {
    let model = FnModel::new(
        vec![ModelParameter::scalar("a"), ModelParameter::scalar("b")],
        vec![
            ModelParameter::scalar("y"),
            ModelParameter::scalar("w"),
            ModelParameter::scalar("v"),
        ],
        |x| vec![x[0] + 2.0 * x[1], x[0] - x[1], 2.0 * x[0] + 4.0 * x[1]],
    );
    let mut project = UncertaintyProject::with_model(model);
    project.set_variable(Stochast::normal("a", 0.0, 1.0));
    project.set_variable(Stochast::normal("b", 0.0, 1.0));
    project.settings = settings;
    project
}

#[test]
fn crude_monte_carlo_recovers_moments() {
    let settings = UncertaintySettings::with_method(UncertaintyMethod::CrudeMonteCarlo)
        .samples(20_000, 20_000)
        .quantiles(vec![0.5])
        .seed(21);
    let mut project = linear_project(settings);
    project.run().unwrap();
    let result = project.result().unwrap();

    assert_eq!(result.stochasts.len(), 3);
    let y = result.stochast_named("y").unwrap();
    assert_eq!(y.distribution(), DistributionType::Histogram);
    assert!(y.mean().abs() < 0.1, "mean {}", y.mean());
    assert!((y.deviation() - 5f64.sqrt()).abs() < 0.1, "deviation {}", y.deviation());
    assert!(result.quantile_values[0][0].x.abs() < 0.1);
    assert_eq!(result.total_model_runs, 20_000);
}

#[test]
fn sampled_output_correlations() {
    let settings = UncertaintySettings::with_method(UncertaintyMethod::CrudeMonteCarlo)
        .samples(5_000, 5_000)
        .seed(22);
    let mut project = linear_project(settings);
    project.run().unwrap();
    let result = project.result().unwrap();
    let (y, w, v) = (&result.stochasts[0], &result.stochasts[1], &result.stochasts[2]);
    let matrix = &result.output_correlation_matrix;

    assert!((matrix.get_correlation(y, v) - 1.0).abs() < 1e-9);
    // Cov(y, w) = 1 - 2 = -1, σ_y σ_w = √5 √2
    let expected = -1.0 / (5f64.sqrt() * 2f64.sqrt());
    assert!((matrix.get_correlation(y, w) - expected).abs() < 0.05);
}

#[test]
fn fosm_is_exact_for_linear_models() {
    let settings =
        UncertaintySettings::with_method(UncertaintyMethod::Fosm).quantiles(vec![0.95]);
    let mut project = linear_project(settings);
    project.run().unwrap();
    let result = project.result().unwrap();

    let y = result.stochast().unwrap();
    assert_eq!(y.distribution(), DistributionType::Normal);
    assert!(y.mean().abs() < 1e-9);
    assert!((y.deviation() - 5f64.sqrt()).abs() < 1e-9);
    let q95 = result.quantile_values[0][0].x;
    assert!((q95 - 1.644_853_626_951_472 * 5f64.sqrt()).abs() < 1e-6);
    assert_eq!(result.total_model_runs, 5);

    let (y, v) = (&result.stochasts[0], &result.stochasts[2]);
    assert!((result.output_correlation_matrix.get_correlation(y, v) - 1.0).abs() < 1e-9);
}

#[test]
fn form_traces_cdf_curve() {
    let model = FnModel::scalar(&["a"], |x| x[0]);
    let mut project = UncertaintyProject::with_model(model);
    project.set_variable(Stochast::normal("a", 0.0, 1.0));
    project.settings = UncertaintySettings::with_method(UncertaintyMethod::Form)
        .thresholds(vec![1.0, -1.0, 0.0])
        .quantiles(vec![0.5]);
    project.run().unwrap();
    let result = project.result().unwrap();

    let z = result.stochast().unwrap();
    assert_eq!(z.distribution(), DistributionType::CdfCurve);
    let curve = z.fragility_values();
    assert_eq!(curve.len(), 3);
    for point in curve {
        // P(Y <= t) = Φ(t)
        assert!((point.reliability_index - point.x).abs() < 1e-3, "{point:?}");
    }
    assert!(result.quantile_values[0][0].x.abs() < 1e-3);
}

#[test]
fn input_correlations_on_request() {
    let mut settings = UncertaintySettings::with_method(UncertaintyMethod::Fosm);
    settings.calculate_input_correlations = true;
    let mut project = linear_project(settings);
    project.run().unwrap();
    let a = project.variable("a").unwrap().clone();
    let result = project.result().unwrap();
    let w = &result.stochasts[1];
    // Cov(a, w) = 1, σ_w = √2
    let rho = result.output_correlation_matrix.get_correlation(&a, w);
    assert!((rho - 0.5f64.sqrt()).abs() < 1e-6, "rho {rho}");
}

//! Reliability methods on models with known failure probabilities.
//!
//! The reference model is `z = 1.8 - (a + b)` with `a, b ~ U(-1, 1)`:
//! failure is `a + b > 1.8`, a corner triangle of area 0.02 out of 4, so
//! `Pf = 0.005` and `β = 2.576`. FORM linearizes in u-space at
//! `a = b = 0.9` and reports `β = √2 · 1.645 = 2.326`.

use limitstate::core::constants::BETA_MAX;
use limitstate::core::standard_normal::q_from_u;
use limitstate::{
    CompareType, FnModel, LimitStateFunction, Project, ReliabilityMethod, ReliabilitySettings,
    Stochast,
};

fn uniform_project(settings: ReliabilitySettings) -> Project {
    let mut project = Project::with_model(FnModel::scalar(&["a", "b"], |x| 1.8 - (x[0] + x[1])));
    project.set_variable(Stochast::uniform("a", -1.0, 1.0));
    project.set_variable(Stochast::uniform("b", -1.0, 1.0));
    project.settings = settings;
    project
}

fn normal_project(settings: ReliabilitySettings, function: fn(&[f64]) -> f64) -> Project {
    let mut project = Project::with_model(FnModel::scalar(&["a", "b"], function));
    project.set_variable(Stochast::normal("a", 0.0, 1.0));
    project.set_variable(Stochast::normal("b", 0.0, 1.0));
    project.settings = settings;
    project
}

fn beta_of(project: &mut Project) -> f64 {
    project.run().unwrap();
    let point = project.design_point().expect("project should produce a design point");
    point.reliability_index
}

// =============================================================================
// FORM
// =============================================================================

#[test]
fn form_linear_uniform_model() {
    let mut project = uniform_project(ReliabilitySettings::default());
    project.run().unwrap();
    let point = project.design_point().unwrap();

    assert!(point.is_converged);
    assert!((point.reliability_index - 2.33).abs() < 0.02, "beta {}", point.reliability_index);
    assert!((point.probability_failure - q_from_u(point.reliability_index)).abs() < 1e-12);
    assert_eq!(point.alphas.len(), 2);
    for alpha in &point.alphas {
        assert!((alpha.alpha + 0.71).abs() < 0.02, "{}: alpha {}", alpha.name, alpha.alpha);
        assert!((alpha.x - 0.90).abs() < 0.02, "{}: x {}", alpha.name, alpha.x);
    }
    let squares: f64 = point.alphas.iter().map(|a| a.influence_factor()).sum();
    assert!((squares - 1.0).abs() < 1e-6);
    assert!(point.total_model_runs > 0);
}

#[test]
fn form_alpha_names_follow_model_inputs() {
    let mut project = uniform_project(ReliabilitySettings::default());
    project.run().unwrap();
    let names: Vec<&str> = project
        .design_point()
        .unwrap()
        .alphas
        .iter()
        .map(|a| a.name.as_str())
        .collect();
    assert_eq!(names, vec!["a", "b"]);
}

// =============================================================================
// SAMPLING METHODS
// =============================================================================

#[test]
fn crude_monte_carlo_linear_uniform_model() {
    let settings = ReliabilitySettings::with_method(ReliabilityMethod::CrudeMonteCarlo)
        .samples(400_000, 400_000)
        .seed(1);
    let beta = beta_of(&mut uniform_project(settings));
    assert!((2.55..=2.65).contains(&beta), "beta {beta}");
}

#[test]
fn importance_sampling_linear_uniform_model() {
    let settings = ReliabilitySettings::with_method(ReliabilityMethod::ImportanceSampling)
        .samples(10_000, 50_000)
        .variation_coefficient(0.02)
        .seed(2);
    let beta = beta_of(&mut uniform_project(settings));
    assert!((2.55..=2.65).contains(&beta), "beta {beta}");
}

#[test]
fn directional_sampling_linear_uniform_model() {
    let settings = ReliabilitySettings::with_method(ReliabilityMethod::DirectionalSampling)
        .directions(2_000, 50_000)
        .variation_coefficient(0.02)
        .seed(3);
    let mut project = uniform_project(settings);
    project.run().unwrap();
    let point = project.design_point().unwrap();
    assert!((2.55..=2.65).contains(&point.reliability_index), "beta {}", point.reliability_index);
    assert!(point.total_directions >= 2_000);
}

#[test]
fn seeded_sampling_is_repeatable() {
    let settings = ReliabilitySettings::with_method(ReliabilityMethod::CrudeMonteCarlo)
        .samples(20_000, 20_000)
        .seed(99);
    let first = beta_of(&mut uniform_project(settings.clone()));
    let second = beta_of(&mut uniform_project(settings));
    assert_eq!(first, second);
}

#[test]
fn latin_hypercube_normal_model() {
    let settings = ReliabilitySettings::with_method(ReliabilityMethod::LatinHypercube)
        .samples(50_000, 50_000)
        .seed(4);
    let beta = beta_of(&mut normal_project(settings, |x| 2.0 - x[0]));
    assert!((beta - 2.0).abs() < 0.03, "beta {beta}");
}

// =============================================================================
// GRID AND SEARCH METHODS
// =============================================================================

#[test]
fn numerical_integration_matches_cell_boundary() {
    // the default grid has cell edges at -8 + 0.32 k, and 2.24 is one of them
    let settings = ReliabilitySettings::with_method(ReliabilityMethod::NumericalIntegration);
    let mut project = normal_project(settings, |x| 2.24 - x[0]);
    project.run().unwrap();
    let point = project.design_point().unwrap();
    assert!((point.reliability_index - 2.24).abs() < 0.01, "beta {}", point.reliability_index);
    assert!((point.probability_failure - q_from_u(2.24)).abs() < 1e-4);
}

#[test]
fn numerical_bisection_brackets_beta() {
    let settings = ReliabilitySettings::with_method(ReliabilityMethod::NumericalBisection);
    let beta = beta_of(&mut normal_project(settings, |x| 2.0 - x[0]));
    assert!((beta - 2.0).abs() < 0.02, "beta {beta}");
}

#[test]
fn cobyla_linear_normal_model() {
    let settings = ReliabilitySettings::with_method(ReliabilityMethod::Cobyla);
    let mut project = normal_project(settings, |x| 3.0 - x[0] - x[1]);
    project.run().unwrap();
    let point = project.design_point().unwrap();
    let expected = 3.0 / 2f64.sqrt();
    assert!((point.reliability_index - expected).abs() < 0.01, "beta {}", point.reliability_index);
    for alpha in &point.alphas {
        assert!((alpha.alpha + 0.5f64.sqrt()).abs() < 0.02);
    }
}

// =============================================================================
// HYBRIDS
// =============================================================================

#[test]
fn form_then_directional_sampling_reports_sampled_beta() {
    let settings =
        ReliabilitySettings::with_method(ReliabilityMethod::FormThenDirectionalSampling)
            .directions(2_000, 50_000)
            .variation_coefficient(0.02)
            .seed(5);
    let mut project = uniform_project(settings);
    project.run().unwrap();
    let point = project.design_point().unwrap();
    assert_eq!(point.contributing_design_points.len(), 2);
    assert!((point.contributing_design_points[0].reliability_index - 2.33).abs() < 0.02);
    assert!((2.55..=2.65).contains(&point.reliability_index), "beta {}", point.reliability_index);
}

#[test]
fn directional_sampling_then_form_reports_form_beta() {
    // the sampled centre of gravity differs per seed; FORM must converge from each
    for seed in [1, 2, 6] {
        let settings =
            ReliabilitySettings::with_method(ReliabilityMethod::DirectionalSamplingThenForm)
                .seed(seed);
        let mut project = uniform_project(settings);
        project.run().unwrap();
        let point = project.design_point().unwrap();
        assert_eq!(point.contributing_design_points.len(), 2);
        assert!(point.is_converged, "seed {seed}: not converged");
        assert!(
            (point.reliability_index - 2.33).abs() < 0.02,
            "seed {seed}: beta {}",
            point.reliability_index
        );
        let z: f64 = 1.8 - point.alphas.iter().map(|a| a.x).sum::<f64>();
        assert!(z.abs() < 0.02, "seed {seed}: z {z} off the limit state");
    }
}

// =============================================================================
// EDGE CASES
// =============================================================================

#[test]
fn deterministic_project_reports_extreme_beta() {
    let mut project = Project::with_model(FnModel::scalar(&["a"], |x| 1.0 - x[0]));
    project.set_variable(Stochast::deterministic("a", 0.5));
    assert_eq!(beta_of(&mut project), BETA_MAX);

    project.set_variable(Stochast::deterministic("a", 2.0));
    assert_eq!(beta_of(&mut project), -BETA_MAX);
}

#[test]
fn realizations_are_saved_on_request() {
    let settings = ReliabilitySettings::with_method(ReliabilityMethod::CrudeMonteCarlo)
        .samples(500, 500)
        .save_realizations(true)
        .seed(7);
    let mut project = uniform_project(settings);
    project.run().unwrap();
    let point = project.design_point().unwrap();
    assert_eq!(point.realizations.len(), 500);
    let realization = &point.realizations[0];
    assert_eq!(realization.input_values.len(), 2);
    let x = &realization.input_values;
    assert!((realization.z - (1.8 - x[0] - x[1])).abs() < 1e-12);
}

#[test]
fn limit_state_function_against_threshold() {
    // y = a with a ~ N(0, 1); failure when y > 2
    let mut project = Project::with_model(FnModel::scalar(&["a"], |x| x[0]));
    project.set_variable(Stochast::normal("a", 0.0, 1.0));
    project.set_limit_state_function(Some(LimitStateFunction::new(
        "z",
        CompareType::GreaterThan,
        2.0,
    )));
    let beta = beta_of(&mut project);
    assert!((beta - 2.0).abs() < 1e-3, "beta {beta}");
}

//! FORM on correlated inputs.
//!
//! Correlations are applied between the standard normal images of the
//! variables. For `z = 1.8 - (a + b)` with uniform marginals the symmetric
//! design point sits at `u_a = u_b = Φ⁻¹(0.95)` in correlated space, so
//! `β = 1.645 · √(2 / (1 + ρ))`.
//!
//! These tests therefore expect 1.645 at `ρ = 1` and 1.899 at `ρ = 0.5`, not
//! the often quoted 2.33 and 2.15. With `ρ = 1` the failure event reduces to
//! `a > 0.9`, whose probability 0.05 pins β at 1.645.

use limitstate::core::standard_normal::u_from_q;
use limitstate::core::CopulaType;
use limitstate::{CorrelationType, FnModel, Project, Stochast};

fn correlated_project(rho: f64) -> Project {
    let mut project = Project::with_model(FnModel::scalar(&["a", "b"], |x| 1.8 - (x[0] + x[1])));
    project.set_variable(Stochast::uniform("a", -1.0, 1.0));
    project.set_variable(Stochast::uniform("b", -1.0, 1.0));
    let a = project.variable_id("a").unwrap();
    let b = project.variable_id("b").unwrap();
    project.correlation_matrix_mut().set_correlation(a, b, rho);
    project
}

fn expected_beta(rho: f64) -> f64 {
    u_from_q(0.05).unwrap() * (2.0 / (1.0 + rho)).sqrt()
}

#[test]
fn fully_correlated_alphas_are_equal() {
    let mut project = correlated_project(1.0);
    project.run().unwrap();
    let point = project.design_point().unwrap();

    assert!((point.reliability_index - expected_beta(1.0)).abs() < 0.02, "beta {}", point.reliability_index);
    let a = &point.alphas[0];
    let b = &point.alphas[1];
    assert!((a.alpha_correlated - b.alpha_correlated).abs() < 1e-6);
    assert!((a.x - b.x).abs() < 1e-6);
}

#[test]
fn partially_correlated_beta() {
    let mut project = correlated_project(0.5);
    project.run().unwrap();
    let point = project.design_point().unwrap();
    assert!((point.reliability_index - expected_beta(0.5)).abs() < 0.03, "beta {}", point.reliability_index);
    for alpha in &point.alphas {
        assert!((alpha.x - 0.9).abs() < 0.02, "x {}", alpha.x);
    }
}

#[test]
fn uncorrelated_matches_independent_beta() {
    let mut project = correlated_project(0.0);
    project.run().unwrap();
    let beta = project.design_point().unwrap().reliability_index;
    assert!((beta - expected_beta(0.0)).abs() < 0.02, "beta {beta}");
}

#[test]
fn indefinite_matrix_is_a_validation_error() {
    let mut project = Project::with_model(FnModel::scalar(&["a", "b", "c"], |x| {
        3.0 - x[0] - x[1] - x[2]
    }));
    for name in ["a", "b", "c"] {
        project.set_variable(Stochast::normal(name, 0.0, 1.0));
    }
    let ids: Vec<_> = ["a", "b", "c"]
        .iter()
        .map(|n| project.variable_id(n).unwrap())
        .collect();
    let matrix = project.correlation_matrix_mut();
    matrix.set_correlation(ids[0], ids[1], 0.9);
    matrix.set_correlation(ids[1], ids[2], 0.9);
    matrix.set_correlation(ids[0], ids[2], -0.9);

    assert!(!project.is_valid());
    project.run().unwrap();
    assert!(project.design_point().is_none());
    assert!(project.messages().iter().any(|m| m.is_error()));
}

#[test]
fn copula_pair_runs_under_copula_correlation() {
    let mut project = Project::with_model(FnModel::scalar(&["a", "b"], |x| 4.0 - x[0] - x[1]));
    project.set_variable(Stochast::normal("a", 0.0, 1.0));
    project.set_variable(Stochast::normal("b", 0.0, 1.0));
    let a = project.variable_id("a").unwrap();
    let b = project.variable_id("b").unwrap();
    let matrix = project.correlation_matrix_mut();
    matrix.set_correlation_type(CorrelationType::Copulas);
    matrix.set_copula(a, b, CopulaType::Gumbel, 2.0);

    project.run().unwrap();
    let correlated = project.design_point().unwrap().reliability_index;

    let mut independent = Project::with_model(FnModel::scalar(&["a", "b"], |x| 4.0 - x[0] - x[1]));
    independent.set_variable(Stochast::normal("a", 0.0, 1.0));
    independent.set_variable(Stochast::normal("b", 0.0, 1.0));
    independent.run().unwrap();
    let reference = independent.design_point().unwrap().reliability_index;

    // upper tail dependence makes joint exceedance more likely
    assert!(correlated.is_finite());
    assert!(correlated < reference, "{correlated} vs {reference}");
}

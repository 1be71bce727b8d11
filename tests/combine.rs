//! Combination of failure modes and the length effect.
//!
//! Each mode is a FORM design point of `z = β - x` with `x ~ N(0, 1)`, so
//! its reliability index is exactly `β` and its only alpha is -1.

use limitstate::core::standard_normal::{q_from_u, u_from_q};
use limitstate::{
    CombineProject, CombineSettings, CombineType, CombinerMethod, DesignPoint, FnModel,
    LengthEffectProject, Project, Stochast,
};

fn mode(name: &'static str, beta: f64) -> DesignPoint {
    let mut project = Project::with_model(FnModel::scalar(&[name], move |x| beta - x[0]));
    project.set_variable(Stochast::normal(name, 0.0, 1.0));
    project.run().unwrap();
    project.design_point().cloned().unwrap()
}

fn combined(
    points: Vec<DesignPoint>,
    method: CombinerMethod,
    combine_type: CombineType,
) -> DesignPoint {
    let mut project = CombineProject::new();
    for point in points {
        project.add_design_point(point);
    }
    project.settings = CombineSettings::new(method, combine_type);
    project.settings.random.seed = 11;
    project.settings.random.is_repeatable = true;
    project.run().unwrap();
    project.design_point().cloned().unwrap()
}

fn one_percent() -> f64 {
    u_from_q(0.01).unwrap()
}

// =============================================================================
// COMBINE
// =============================================================================

#[test]
fn series_of_independent_modes() {
    let q = 0.01;
    let expected = u_from_q(2.0 * q - q * q).unwrap();
    for method in [CombinerMethod::DirectionalSampling, CombinerMethod::ImportanceSampling] {
        let point = combined(
            vec![mode("a", one_percent()), mode("b", one_percent())],
            method,
            CombineType::Series,
        );
        assert!(
            (point.reliability_index - expected).abs() < 0.02,
            "{method}: beta {} expected {expected}",
            point.reliability_index
        );
        assert_eq!(point.contributing_design_points.len(), 2);
    }
}

#[test]
fn parallel_of_independent_modes() {
    let q: f64 = 0.01;
    let expected = u_from_q(q * q).unwrap();
    for method in [CombinerMethod::DirectionalSampling, CombinerMethod::ImportanceSampling] {
        let point = combined(
            vec![mode("a", one_percent()), mode("b", one_percent())],
            method,
            CombineType::Parallel,
        );
        assert!(
            (point.reliability_index - expected).abs() < 0.02,
            "{method}: beta {} expected {expected}",
            point.reliability_index
        );
    }
}

#[test]
fn shared_variable_is_fully_correlated_by_default() {
    // the same design point twice fails in the same region
    let point = mode("a", 2.5);
    let result = combined(
        vec![point.clone(), point],
        CombinerMethod::DirectionalSampling,
        CombineType::Series,
    );
    assert!((result.reliability_index - 2.5).abs() < 0.02, "beta {}", result.reliability_index);
    assert_eq!(result.alphas.len(), 1);
    assert!((result.alphas[0].alpha + 1.0).abs() < 0.05, "alpha {}", result.alphas[0].alpha);
}

#[test]
fn self_correlation_decouples_shared_variable() {
    let point = mode("a", one_percent());
    let variable = point.alphas[0].variable.clone();
    let mut project = CombineProject::new();
    project.add_design_point(point.clone());
    project.add_design_point(point);
    project.self_correlation_matrix_mut().set_self_correlation(&variable, 0.0);
    project.settings.random.seed = 12;
    project.settings.random.is_repeatable = true;
    project.run().unwrap();

    let beta = project.design_point().unwrap().reliability_index;
    let expected = u_from_q(2.0 * 0.01 - 1e-4).unwrap();
    assert!((beta - expected).abs() < 0.02, "beta {beta} expected {expected}");
}

// =============================================================================
// LENGTH EFFECT
// =============================================================================

#[test]
fn length_without_correlation_length_keeps_cross_section() {
    let mut project = LengthEffectProject::new();
    project.set_cross_section(mode("a", 3.0));
    project.settings.length = 1000.0;
    project.settings.section_length = 100.0;
    project.run().unwrap();
    let beta = project.design_point().unwrap().reliability_index;
    assert!((beta - 3.0).abs() < 0.02, "beta {beta}");
}

#[test]
fn independent_sections_multiply_probability() {
    let cross_section = mode("a", 3.0);
    let variable = cross_section.alphas[0].variable.clone();
    let mut project = LengthEffectProject::new();
    project.set_cross_section(cross_section);
    project.set_correlation_length(&variable, 0.0);
    project.settings.length = 300.0;
    project.settings.section_length = 100.0;
    project.settings.combine.random.seed = 13;
    project.settings.combine.random.is_repeatable = true;
    assert_eq!(project.sections(), 3);

    project.run().unwrap();
    let beta = project.design_point().unwrap().reliability_index;
    let q = q_from_u(3.0);
    let expected = u_from_q(1.0 - (1.0 - q).powi(3)).unwrap();
    assert!((beta - expected).abs() < 0.03, "beta {beta} expected {expected}");
}

#[test]
fn partial_correlation_lies_between_bounds() {
    let cross_section = mode("a", 3.0);
    let variable = cross_section.alphas[0].variable.clone();
    let mut project = LengthEffectProject::new();
    project.set_cross_section(cross_section);
    project.set_correlation_length(&variable, 150.0);
    project.settings.length = 500.0;
    project.settings.section_length = 100.0;
    project.settings.combine.random.seed = 14;
    project.settings.combine.random.is_repeatable = true;
    project.run().unwrap();

    let beta = project.design_point().unwrap().reliability_index;
    let q = q_from_u(3.0);
    let independent = u_from_q(1.0 - (1.0 - q).powi(5)).unwrap();
    assert!(beta < 3.0 && beta > independent - 0.03, "beta {beta}");
}

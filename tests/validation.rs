//! Validation of projects before running.

use limitstate::core::{DistributionType, Parameter};
use limitstate::{
    CombineProject, FnModel, LengthEffectProject, Project, ReliabilityMethod, ReliabilitySettings,
    Stochast, UncertaintyProject,
};

fn single_variable_project() -> Project {
    Project::with_model(FnModel::scalar(&["a"], |x| 3.0 - x[0]))
}

#[test]
fn invalid_parameter_only_counts_when_used() {
    let mut project = single_variable_project();
    let mut variable = Stochast::uniform("a", 0.0, 1.0);
    variable.set_parameter(Parameter::Scale, -1.0);
    project.set_variable(variable);
    assert!(project.is_valid());

    project
        .variable_mut("a")
        .unwrap()
        .set_distribution(DistributionType::Gumbel);
    assert!(!project.is_valid());

    project.run().unwrap();
    assert!(project.design_point().is_none());
    let errors: Vec<String> = project
        .messages()
        .iter()
        .filter(|m| m.is_error())
        .map(|m| m.to_string())
        .collect();
    assert_eq!(errors, vec!["Error: a => scale value -1 is less than 0".to_string()]);
}

#[test]
fn valid_run_clears_previous_messages() {
    let mut project = single_variable_project();
    project.set_variable(Stochast::normal("a", 0.0, -1.0));
    project.run().unwrap();
    assert_eq!(project.messages().len(), 1);

    project.variable_mut("a").unwrap().set_scale(1.0);
    project.run().unwrap();
    assert!(project.design_point().is_some());
    assert!(project.messages().iter().all(|m| !m.is_error()));
}

#[test]
fn project_without_model_is_invalid() {
    let mut project = Project::new();
    assert!(!project.is_valid());
    project.run().unwrap();
    assert!(project.design_point().is_none());
    assert_eq!(project.messages().len(), 1);
}

#[test]
fn unknown_output_is_reported() {
    let mut project = single_variable_project();
    project.set_variable(Stochast::normal("a", 0.0, 1.0));
    project.set_output("y", 0);
    let report = project.validate();
    assert!(!report.is_valid());
    assert!(report.messages()[0].to_string().contains("'y[0]'"));
}

#[test]
fn settings_errors_are_merged() {
    let mut project = single_variable_project();
    project.set_variable(Stochast::normal("a", 0.0, -1.0));
    project.settings = ReliabilitySettings::with_method(ReliabilityMethod::CrudeMonteCarlo).samples(10, 5);
    let report = project.validate();
    let subjects: Vec<&str> = report.messages().iter().map(|m| m.subject.as_str()).collect();
    assert!(subjects.contains(&"Settings"), "{subjects:?}");
    assert!(subjects.contains(&"a"), "{subjects:?}");
}

#[test]
fn set_variable_requires_matching_input() {
    let mut project = single_variable_project();
    assert!(!project.set_variable(Stochast::normal("b", 0.0, 1.0)));
    assert_eq!(project.variables().len(), 1);
}

#[test]
fn uncertainty_project_validates_like_reliability() {
    let mut project = UncertaintyProject::with_model(FnModel::scalar(&["a"], |x| x[0]));
    project.set_variable(Stochast::normal("a", 0.0, -2.0));
    assert!(!project.is_valid());
    project.run().unwrap();
    assert!(project.result().is_none());
}

#[test]
fn empty_combine_and_length_effect_are_invalid() {
    let mut combine = CombineProject::new();
    combine.run().unwrap();
    assert!(combine.design_point().is_none());
    assert!(!combine.messages().is_empty());

    let mut length = LengthEffectProject::new();
    length.settings.section_length = 0.0;
    assert!(!length.is_valid());
}

//! Protocol objects, their references and the runs behind `invoke`.

use std::collections::{BTreeMap, HashMap};

use limitstate_core::{
    ContributingStochast, CorrelationMatrix, DiscreteValue, FragilityValue, HistogramValue,
    SelfCorrelationMatrix, Stochast, StochastId, ValidationMessage, ValidationReport,
};
use tracing::warn;

use super::keys::{Method, ObjectKind};
use super::Engine;
use crate::combine::{CombineProject, LengthEffectProject};
use crate::error::{Error, ProtocolError};
use crate::model::{CompareType, Evaluator, LimitStateFunction, ModelAdapter};
use crate::project::{ModelProject, Project};
use crate::reliability::{Alpha, DesignPoint, Realization};
use crate::sensitivity::SensitivityProject;
use crate::settings::{
    ReliabilitySettings, SensitivitySettings, StochastSettings,
    UncertaintySettings,
};
use crate::uncertainty::UncertaintyProject;

/// Deepest nesting of array elements and mixture members resolved.
const MAX_DEPTH: usize = 16;

/// A stochast whose collections refer to other objects.
#[derive(Debug, Default)]
pub(crate) struct StochastObject {
    pub stochast: Stochast,
    pub array_variables: Vec<i64>,
    pub conditional_source: Option<i64>,
    pub conditional_values: Vec<i64>,
    pub contributing_stochasts: Vec<i64>,
    pub discrete_values: Vec<i64>,
    pub histogram_values: Vec<i64>,
    pub fragility_values: Vec<i64>,
}

#[derive(Debug)]
pub(crate) struct ContributingObject {
    pub probability: f64,
    pub variable: Option<i64>,
}

#[derive(Debug, Default)]
pub(crate) struct SettingsObject {
    pub settings: ReliabilitySettings,
    pub stochast_settings: Vec<i64>,
}

#[derive(Debug, Default)]
pub(crate) struct StochastSettingsObject {
    pub settings: StochastSettings,
    pub variable: Option<i64>,
}

#[derive(Debug)]
pub(crate) enum Analysis {
    Reliability(Project),
    Uncertainty(UncertaintyProject),
    Sensitivity(SensitivityProject),
}

impl Analysis {
    pub fn base(&self) -> &ModelProject {
        match self {
            Analysis::Reliability(p) => p,
            Analysis::Uncertainty(p) => p,
            Analysis::Sensitivity(p) => p,
        }
    }

    pub fn base_mut(&mut self) -> &mut ModelProject {
        match self {
            Analysis::Reliability(p) => p,
            Analysis::Uncertainty(p) => p,
            Analysis::Sensitivity(p) => p,
        }
    }

    fn settings_kind(&self) -> ObjectKind {
        match self {
            Analysis::Reliability(_) => ObjectKind::Settings,
            Analysis::Uncertainty(_) => ObjectKind::UncertaintySettings,
            Analysis::Sensitivity(_) => ObjectKind::SensitivitySettings,
        }
    }

    fn validate(&self) -> ValidationReport {
        match self {
            Analysis::Reliability(p) => p.validate(),
            Analysis::Uncertainty(p) => p.validate(),
            Analysis::Sensitivity(p) => p.validate(),
        }
    }
}

#[derive(Debug)]
pub(crate) struct ProjectObject {
    pub analysis: Analysis,
    pub variables: Vec<i64>,
    pub correlation_matrix: i64,
    pub self_correlation_matrix: i64,
    pub settings: i64,
    pub limit_state_function: Option<i64>,
    pub output: Option<(String, usize)>,
    pub messages: Vec<ValidationMessage>,
    pub design_point: Option<i64>,
    pub output_stochasts: Vec<i64>,
    pub output_correlation_matrix: Option<i64>,
    pub quantile_values: Vec<i64>,
    pub total_model_runs: usize,
}

#[derive(Debug)]
pub(crate) struct CombineObject {
    pub project: CombineProject,
    pub design_points: Vec<i64>,
    pub self_correlation_matrix: i64,
    pub messages: Vec<ValidationMessage>,
    pub design_point: Option<i64>,
}

#[derive(Debug)]
pub(crate) struct LengthEffectObject {
    pub project: LengthEffectProject,
    pub cross_section: Option<i64>,
    pub self_correlation_matrix: i64,
    pub correlation_lengths: BTreeMap<i64, f64>,
    pub messages: Vec<ValidationMessage>,
    pub design_point: Option<i64>,
}

#[derive(Debug)]
pub(crate) struct DesignPointObject {
    pub point: DesignPoint,
    pub alphas: Vec<i64>,
    pub contributing: Vec<i64>,
    pub realizations: Vec<i64>,
}

#[derive(Debug)]
pub(crate) struct AlphaObject {
    pub alpha: Alpha,
    pub variable: Option<i64>,
}

#[derive(Debug)]
pub(crate) enum Object {
    Stochast(StochastObject),
    DiscreteValue(DiscreteValue),
    HistogramValue(HistogramValue),
    FragilityValue(FragilityValue),
    ConditionalValue(limitstate_core::ConditionalValue),
    ContributingStochast(ContributingObject),
    CorrelationMatrix(CorrelationMatrix),
    SelfCorrelationMatrix(SelfCorrelationMatrix),
    Settings(SettingsObject),
    StochastSettings(StochastSettingsObject),
    UncertaintySettings(UncertaintySettings),
    SensitivitySettings(SensitivitySettings),
    LimitStateFunction(LimitStateFunction),
    Project(Box<ProjectObject>),
    CombineProject(Box<CombineObject>),
    LengthEffectProject(Box<LengthEffectObject>),
    DesignPoint(DesignPointObject),
    Alpha(AlphaObject),
    Realization(Realization),
}

impl Object {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Object::Stochast(_) => ObjectKind::Stochast,
            Object::DiscreteValue(_) => ObjectKind::DiscreteValue,
            Object::HistogramValue(_) => ObjectKind::HistogramValue,
            Object::FragilityValue(_) => ObjectKind::FragilityValue,
            Object::ConditionalValue(_) => ObjectKind::ConditionalValue,
            Object::ContributingStochast(_) => ObjectKind::ContributingStochast,
            Object::CorrelationMatrix(_) => ObjectKind::CorrelationMatrix,
            Object::SelfCorrelationMatrix(_) => ObjectKind::SelfCorrelationMatrix,
            Object::Settings(_) => ObjectKind::Settings,
            Object::StochastSettings(_) => ObjectKind::StochastSettings,
            Object::UncertaintySettings(_) => ObjectKind::UncertaintySettings,
            Object::SensitivitySettings(_) => ObjectKind::SensitivitySettings,
            Object::LimitStateFunction(_) => ObjectKind::LimitStateFunction,
            Object::Project(p) => match p.analysis {
                Analysis::Reliability(_) => ObjectKind::Project,
                Analysis::Uncertainty(_) => ObjectKind::UncertaintyProject,
                Analysis::Sensitivity(_) => ObjectKind::SensitivityProject,
            },
            Object::CombineProject(_) => ObjectKind::CombineProject,
            Object::LengthEffectProject(_) => ObjectKind::LengthEffectProject,
            Object::DesignPoint(_) => ObjectKind::DesignPoint,
            Object::Alpha(_) => ObjectKind::Alpha,
            Object::Realization(_) => ObjectKind::Realization,
        }
    }

    /// New object of a kind; projects get their own correlation matrices
    /// and settings objects.
    pub fn create(engine: &mut Engine, kind: ObjectKind) -> Object {
        match kind {
            ObjectKind::Stochast => Object::Stochast(StochastObject::default()),
            ObjectKind::DiscreteValue => Object::DiscreteValue(DiscreteValue::new(0.0, 1.0)),
            ObjectKind::HistogramValue => Object::HistogramValue(HistogramValue::new(0.0, 1.0, 1.0)),
            ObjectKind::FragilityValue => Object::FragilityValue(FragilityValue::new(0.0, 0.0)),
            ObjectKind::ConditionalValue => {
                Object::ConditionalValue(limitstate_core::ConditionalValue::new(0.0))
            }
            ObjectKind::ContributingStochast => Object::ContributingStochast(ContributingObject {
                probability: 1.0,
                variable: None,
            }),
            ObjectKind::CorrelationMatrix => Object::CorrelationMatrix(CorrelationMatrix::new()),
            ObjectKind::SelfCorrelationMatrix => {
                Object::SelfCorrelationMatrix(SelfCorrelationMatrix::new())
            }
            ObjectKind::Settings => Object::Settings(SettingsObject::default()),
            ObjectKind::StochastSettings => Object::StochastSettings(StochastSettingsObject::default()),
            ObjectKind::UncertaintySettings => {
                Object::UncertaintySettings(UncertaintySettings::default())
            }
            ObjectKind::SensitivitySettings => {
                Object::SensitivitySettings(SensitivitySettings::default())
            }
            ObjectKind::LimitStateFunction => Object::LimitStateFunction(LimitStateFunction::new(
                "",
                CompareType::LessThan,
                0.0,
            )),
            ObjectKind::Project => project(engine, Analysis::Reliability(Project::new())),
            ObjectKind::UncertaintyProject => {
                project(engine, Analysis::Uncertainty(UncertaintyProject::new()))
            }
            ObjectKind::SensitivityProject => {
                project(engine, Analysis::Sensitivity(SensitivityProject::new()))
            }
            ObjectKind::CombineProject => {
                let self_correlation_matrix = engine.insert(Object::SelfCorrelationMatrix(
                    SelfCorrelationMatrix::new(),
                ));
                Object::CombineProject(Box::new(CombineObject {
                    project: CombineProject::new(),
                    design_points: Vec::new(),
                    self_correlation_matrix,
                    messages: Vec::new(),
                    design_point: None,
                }))
            }
            ObjectKind::LengthEffectProject => {
                let self_correlation_matrix = engine.insert(Object::SelfCorrelationMatrix(
                    SelfCorrelationMatrix::new(),
                ));
                Object::LengthEffectProject(Box::new(LengthEffectObject {
                    project: LengthEffectProject::new(),
                    cross_section: None,
                    self_correlation_matrix,
                    correlation_lengths: BTreeMap::new(),
                    messages: Vec::new(),
                    design_point: None,
                }))
            }
            ObjectKind::DesignPoint => Object::DesignPoint(DesignPointObject {
                point: DesignPoint::new("", f64::NAN),
                alphas: Vec::new(),
                contributing: Vec::new(),
                realizations: Vec::new(),
            }),
            ObjectKind::Alpha => Object::Alpha(AlphaObject {
                alpha: Alpha {
                    variable: Stochast::default(),
                    name: String::new(),
                    index: 0,
                    alpha: 0.0,
                    alpha_correlated: 0.0,
                    x: f64::NAN,
                    u: 0.0,
                },
                variable: None,
            }),
            ObjectKind::Realization => Object::Realization(Realization {
                iteration: 0,
                z: f64::NAN,
                beta: f64::NAN,
                weight: 1.0,
                input_values: Vec::new(),
                output_values: Vec::new(),
            }),
        }
    }
}

fn project(engine: &mut Engine, analysis: Analysis) -> Object {
    let correlation_matrix = engine.insert(Object::CorrelationMatrix(CorrelationMatrix::new()));
    let self_correlation_matrix =
        engine.insert(Object::SelfCorrelationMatrix(SelfCorrelationMatrix::new()));
    let settings = engine.insert(match analysis.settings_kind() {
        ObjectKind::UncertaintySettings => Object::UncertaintySettings(UncertaintySettings::default()),
        ObjectKind::SensitivitySettings => Object::SensitivitySettings(SensitivitySettings::default()),
        _ => Object::Settings(SettingsObject::default()),
    });
    Object::Project(Box::new(ProjectObject {
        analysis,
        variables: Vec::new(),
        correlation_matrix,
        self_correlation_matrix,
        settings,
        limit_state_function: None,
        output: None,
        messages: Vec::new(),
        design_point: None,
        output_stochasts: Vec::new(),
        output_correlation_matrix: None,
        quantile_values: Vec::new(),
        total_model_runs: 0,
    }))
}

pub(crate) fn wrong_kind(id: i64, actual: ObjectKind, expected: ObjectKind) -> ProtocolError {
    ProtocolError::WrongKind {
        id,
        actual: actual.name().to_string(),
        expected: expected.name(),
    }
}

/// Borrow the payload of an object of one kind.
macro_rules! payload {
    (mut $engine:expr, $id:expr, $variant:ident) => {
        match $engine.object_mut($id)? {
            crate::protocol::object::Object::$variant(inner) => Ok(inner),
            other => Err(crate::protocol::object::wrong_kind(
                $id,
                other.kind(),
                crate::protocol::keys::ObjectKind::$variant,
            )),
        }
    };
    ($engine:expr, $id:expr, $variant:ident) => {
        match $engine.object($id)? {
            crate::protocol::object::Object::$variant(inner) => Ok(inner),
            other => Err(crate::protocol::object::wrong_kind(
                $id,
                other.kind(),
                crate::protocol::keys::ObjectKind::$variant,
            )),
        }
    };
}

pub(crate) use payload;

/// Check that every id in a list refers to an object of `kind`.
pub(crate) fn check_ids(engine: &Engine, ids: &[i64], kind: ObjectKind) -> Result<(), ProtocolError> {
    ids.iter().try_for_each(|&id| engine.expect_kind(id, kind))
}

/// The stochast of an object with every reference resolved.
pub(crate) fn stochast(engine: &Engine, id: i64) -> Result<Stochast, ProtocolError> {
    resolve_stochast(engine, id, 0)
}

fn resolve_stochast(engine: &Engine, id: i64, depth: usize) -> Result<Stochast, ProtocolError> {
    let object: &StochastObject = payload!(engine, id, Stochast)?;
    let mut stochast = object.stochast.clone();
    if depth >= MAX_DEPTH {
        warn!(id, "stochast references nested too deeply, ignoring them");
        return Ok(stochast);
    }
    if !object.array_variables.is_empty() {
        let elements = object
            .array_variables
            .iter()
            .map(|&e| resolve_stochast(engine, e, depth + 1))
            .collect::<Result<Vec<_>, _>>()?;
        stochast.set_array_variables(elements);
    }
    if let Some(source) = object.conditional_source {
        let source: &StochastObject = payload!(engine, source, Stochast)?;
        stochast.set_conditional_source(Some(source.stochast.id()));
    }
    if !object.conditional_values.is_empty() {
        let values = object
            .conditional_values
            .iter()
            .map(|&v| payload!(engine, v, ConditionalValue).copied())
            .collect::<Result<Vec<_>, _>>()?;
        stochast.set_conditional_values(values);
    }
    if !object.contributing_stochasts.is_empty() {
        let mut members = Vec::with_capacity(object.contributing_stochasts.len());
        for &c in &object.contributing_stochasts {
            let member: &ContributingObject = payload!(engine, c, ContributingStochast)?;
            if let Some(variable) = member.variable {
                let variable = resolve_stochast(engine, variable, depth + 1)?;
                members.push(ContributingStochast::new(member.probability, variable));
            }
        }
        stochast.set_contributing_stochasts(members);
    }
    if !object.discrete_values.is_empty() {
        let values = object
            .discrete_values
            .iter()
            .map(|&v| payload!(engine, v, DiscreteValue).copied())
            .collect::<Result<Vec<_>, _>>()?;
        stochast.set_discrete_values(values);
    }
    if !object.histogram_values.is_empty() {
        let values = object
            .histogram_values
            .iter()
            .map(|&v| payload!(engine, v, HistogramValue).copied())
            .collect::<Result<Vec<_>, _>>()?;
        stochast.set_histogram_values(values);
    }
    if !object.fragility_values.is_empty() {
        let values = object
            .fragility_values
            .iter()
            .map(|&v| payload!(engine, v, FragilityValue).copied())
            .collect::<Result<Vec<_>, _>>()?;
        stochast.set_fragility_values(values);
    }
    Ok(stochast)
}

/// Register a computed stochast, its empirical values as objects.
pub(crate) fn register_stochast(engine: &mut Engine, stochast: Stochast) -> i64 {
    let discrete_values = stochast
        .discrete_values()
        .iter()
        .map(|v| engine.insert(Object::DiscreteValue(*v)))
        .collect();
    let histogram_values = stochast
        .histogram_values()
        .iter()
        .map(|v| engine.insert(Object::HistogramValue(*v)))
        .collect();
    let fragility_values = stochast
        .fragility_values()
        .iter()
        .map(|v| engine.insert(Object::FragilityValue(*v)))
        .collect();
    engine.insert(Object::Stochast(StochastObject {
        stochast,
        discrete_values,
        histogram_values,
        fragility_values,
        ..Default::default()
    }))
}

/// Object id of every registered stochast by identity.
fn stochast_ids(engine: &Engine) -> HashMap<StochastId, i64> {
    engine
        .objects
        .iter()
        .filter_map(|(&id, object)| match object {
            Object::Stochast(s) => Some((s.stochast.id(), id)),
            _ => None,
        })
        .collect()
}

pub(crate) fn register_design_point(engine: &mut Engine, point: DesignPoint) -> i64 {
    let lookup = stochast_ids(engine);
    register_point(engine, point, &lookup)
}

fn register_point(engine: &mut Engine, point: DesignPoint, lookup: &HashMap<StochastId, i64>) -> i64 {
    let alphas = point
        .alphas
        .iter()
        .map(|a| {
            engine.insert(Object::Alpha(AlphaObject {
                alpha: a.clone(),
                variable: lookup.get(&a.variable.id()).copied(),
            }))
        })
        .collect();
    let contributing = point
        .contributing_design_points
        .iter()
        .map(|c| register_point(engine, c.clone(), lookup))
        .collect();
    let realizations = point
        .realizations
        .iter()
        .map(|r| engine.insert(Object::Realization(r.clone())))
        .collect();
    engine.insert(Object::DesignPoint(DesignPointObject {
        point,
        alphas,
        contributing,
        realizations,
    }))
}

/// A design point with its alphas and contributing points re-read from
/// their objects.
pub(crate) fn design_point(engine: &Engine, id: i64) -> Result<DesignPoint, ProtocolError> {
    resolve_design_point(engine, id, 0)
}

fn resolve_design_point(engine: &Engine, id: i64, depth: usize) -> Result<DesignPoint, ProtocolError> {
    let object: &DesignPointObject = payload!(engine, id, DesignPoint)?;
    let mut point = object.point.clone();
    point.alphas = object
        .alphas
        .iter()
        .map(|&a| {
            let entry: &AlphaObject = payload!(engine, a, Alpha)?;
            let mut alpha = entry.alpha.clone();
            if let Some(variable) = entry.variable {
                alpha.variable = stochast(engine, variable)?;
            }
            Ok(alpha)
        })
        .collect::<Result<_, ProtocolError>>()?;
    if depth < MAX_DEPTH {
        point.contributing_design_points = object
            .contributing
            .iter()
            .map(|&c| resolve_design_point(engine, c, depth + 1))
            .collect::<Result<_, _>>()?;
    }
    Ok(point)
}

pub(crate) fn reliability_settings(engine: &Engine, id: i64) -> Result<ReliabilitySettings, ProtocolError> {
    let object: &SettingsObject = payload!(engine, id, Settings)?;
    let mut settings = object.settings.clone();
    for &s in &object.stochast_settings {
        let entry: &StochastSettingsObject = payload!(engine, s, StochastSettings)?;
        if let Some(variable) = entry.variable {
            let variable: &StochastObject = payload!(engine, variable, Stochast)?;
            settings
                .stochast_settings
                .insert(variable.stochast.id(), entry.settings);
        }
    }
    Ok(settings)
}

fn self_correlation(engine: &Engine, id: i64) -> Result<SelfCorrelationMatrix, ProtocolError> {
    payload!(engine, id, SelfCorrelationMatrix).cloned()
}

/// Copy the state of referenced objects into a project before it runs.
fn sync_project(engine: &mut Engine, id: i64) -> Result<(), ProtocolError> {
    let object = match engine.object(id)? {
        Object::Project(p) => p,
        other => return Err(wrong_kind(id, other.kind(), ObjectKind::Project)),
    };
    let variables = object
        .variables
        .iter()
        .map(|&v| stochast(engine, v))
        .collect::<Result<Vec<_>, _>>()?;
    let correlation = payload!(engine, object.correlation_matrix, CorrelationMatrix)?.clone();
    let self_correlation = self_correlation(engine, object.self_correlation_matrix)?;
    let limit_state = match object.limit_state_function {
        Some(l) => Some(payload!(engine, l, LimitStateFunction)?.clone()),
        None => None,
    };
    let settings_id = object.settings;
    let reliability = match object.analysis {
        Analysis::Reliability(_) => Some(reliability_settings(engine, settings_id)?),
        _ => None,
    };
    let uncertainty = match object.analysis {
        Analysis::Uncertainty(_) => Some(payload!(engine, settings_id, UncertaintySettings)?.clone()),
        _ => None,
    };
    let sensitivity = match object.analysis {
        Analysis::Sensitivity(_) => Some(payload!(engine, settings_id, SensitivitySettings)?.clone()),
        _ => None,
    };
    let output = object.output.clone();

    let Object::Project(object) = engine.object_mut(id)? else {
        return Ok(());
    };
    match &mut object.analysis {
        Analysis::Reliability(p) => p.settings = reliability.unwrap_or_default(),
        Analysis::Uncertainty(p) => p.settings = uncertainty.unwrap_or_default(),
        Analysis::Sensitivity(p) => p.settings = sensitivity.unwrap_or_default(),
    }
    let base = object.analysis.base_mut();
    for variable in variables {
        base.set_variable(variable);
    }
    *base.correlation_matrix_mut() = correlation;
    *base.self_correlation_matrix_mut() = self_correlation;
    base.set_limit_state_function(limit_state);
    if let Some((name, index)) = output.filter(|(name, _)| !name.is_empty()) {
        base.set_output(name, index);
    }
    Ok(())
}

fn sync_combine(engine: &mut Engine, id: i64) -> Result<(), ProtocolError> {
    let object: &CombineObject = payload!(engine, id, CombineProject)?;
    let points = object
        .design_points
        .iter()
        .map(|&p| design_point(engine, p))
        .collect::<Result<Vec<_>, _>>()?;
    let self_correlation = self_correlation(engine, object.self_correlation_matrix)?;
    let object = payload!(mut engine, id, CombineProject)?;
    object.project.clear_design_points();
    for point in points {
        object.project.add_design_point(point);
    }
    *object.project.self_correlation_matrix_mut() = self_correlation;
    Ok(())
}

fn sync_length_effect(engine: &mut Engine, id: i64) -> Result<(), ProtocolError> {
    let object: &LengthEffectObject = payload!(engine, id, LengthEffectProject)?;
    let cross_section = match object.cross_section {
        Some(p) => Some(design_point(engine, p)?),
        None => None,
    };
    let mut lengths = Vec::with_capacity(object.correlation_lengths.len());
    for (&variable, &length) in &object.correlation_lengths {
        let variable: &StochastObject = payload!(engine, variable, Stochast)?;
        lengths.push((variable.stochast.id(), length));
    }
    let self_correlation = self_correlation(engine, object.self_correlation_matrix)?;
    let object = payload!(mut engine, id, LengthEffectProject)?;
    if let Some(point) = cross_section {
        object.project.set_cross_section(point);
    }
    for (variable, length) in lengths {
        object.project.set_correlation_length(variable, length);
    }
    *object.project.self_correlation_matrix_mut() = self_correlation;
    Ok(())
}

fn print_errors(report: &ValidationReport) {
    for message in report.errors() {
        warn!(%message, "validation failed");
        eprintln!("{message}");
    }
}

/// Validation report of a project-like object after syncing it.
pub(crate) fn validation(engine: &mut Engine, id: i64) -> Result<ValidationReport, ProtocolError> {
    match engine.kind(id)? {
        ObjectKind::Project | ObjectKind::UncertaintyProject | ObjectKind::SensitivityProject => {
            sync_project(engine, id)?;
            match engine.object(id)? {
                Object::Project(p) => Ok(p.analysis.validate()),
                _ => Ok(ValidationReport::new()),
            }
        }
        ObjectKind::CombineProject => {
            sync_combine(engine, id)?;
            Ok(payload!(engine, id, CombineProject)?.project.validate())
        }
        ObjectKind::LengthEffectProject => {
            sync_length_effect(engine, id)?;
            Ok(payload!(engine, id, LengthEffectProject)?.project.validate())
        }
        ObjectKind::Stochast => Ok(stochast(engine, id)?.validate()),
        ObjectKind::Settings => Ok(reliability_settings(engine, id)?.validate()),
        ObjectKind::UncertaintySettings => Ok(payload!(engine, id, UncertaintySettings)?.validate()),
        ObjectKind::SensitivitySettings => Ok(payload!(engine, id, SensitivitySettings)?.validate()),
        ObjectKind::CorrelationMatrix => {
            let mut report = ValidationReport::new();
            payload!(engine, id, CorrelationMatrix)?.validate_into(&mut report);
            Ok(report)
        }
        ObjectKind::SelfCorrelationMatrix => {
            let mut report = ValidationReport::new();
            self_correlation(engine, id)?.validate_into(&mut report);
            Ok(report)
        }
        _ => Ok(ValidationReport::new()),
    }
}

fn set_messages(engine: &mut Engine, id: i64, messages: Vec<ValidationMessage>) -> Result<(), ProtocolError> {
    match engine.object_mut(id)? {
        Object::Project(p) => p.messages = messages,
        Object::CombineProject(p) => p.messages = messages,
        Object::LengthEffectProject(p) => p.messages = messages,
        _ => {}
    }
    Ok(())
}

fn run_project(engine: &mut Engine, id: i64) -> Result<(), Error> {
    sync_project(engine, id)?;
    let Object::Project(object) = engine.object_mut(id)? else {
        return Ok(());
    };
    let runs = object.analysis.base().model().map_or(0, ModelAdapter::runs);
    match &mut object.analysis {
        Analysis::Reliability(p) => p.run()?,
        Analysis::Uncertainty(p) => p.run()?,
        Analysis::Sensitivity(p) => p.run()?,
    }
    object.messages = object.analysis.base().messages().to_vec();
    object.total_model_runs = object
        .analysis
        .base()
        .model()
        .map_or(0, ModelAdapter::runs)
        .saturating_sub(runs);
    object.design_point = None;
    object.output_stochasts.clear();
    object.output_correlation_matrix = None;
    object.quantile_values.clear();

    let point = match &object.analysis {
        Analysis::Reliability(p) => p.design_point().cloned(),
        _ => None,
    };
    let uncertainty = match &object.analysis {
        Analysis::Uncertainty(p) => p.result().cloned(),
        _ => None,
    };

    let design_point = point.map(|p| register_design_point(engine, p));
    let (stochasts, correlation, quantiles) = match uncertainty {
        Some(result) => {
            let stochasts: Vec<i64> = result
                .stochasts
                .into_iter()
                .map(|s| register_stochast(engine, s))
                .collect();
            let correlation =
                engine.insert(Object::CorrelationMatrix(result.output_correlation_matrix));
            let quantiles = result
                .quantile_values
                .first()
                .map(|values| {
                    values
                        .iter()
                        .map(|v| engine.insert(Object::FragilityValue(*v)))
                        .collect()
                })
                .unwrap_or_default();
            (stochasts, Some(correlation), quantiles)
        }
        None => (Vec::new(), None, Vec::new()),
    };
    if let Object::Project(object) = engine.object_mut(id)? {
        object.design_point = design_point;
        object.output_stochasts = stochasts;
        object.output_correlation_matrix = correlation;
        object.quantile_values = quantiles;
    }
    Ok(())
}

fn run_combine(engine: &mut Engine, id: i64) -> Result<(), Error> {
    sync_combine(engine, id)?;
    let object = payload!(mut engine, id, CombineProject)?;
    object.project.run()?;
    object.messages = object.project.messages().to_vec();
    let point = object.project.design_point().cloned();
    let design_point = point.map(|p| register_design_point(engine, p));
    payload!(mut engine, id, CombineProject)?.design_point = design_point;
    Ok(())
}

fn run_length_effect(engine: &mut Engine, id: i64) -> Result<(), Error> {
    sync_length_effect(engine, id)?;
    let object = payload!(mut engine, id, LengthEffectProject)?;
    object.project.run()?;
    object.messages = object.project.messages().to_vec();
    let point = object.project.design_point().cloned();
    let design_point = point.map(|p| register_design_point(engine, p));
    payload!(mut engine, id, LengthEffectProject)?.design_point = design_point;
    Ok(())
}

/// Fill missing conditional breakpoint parameters and write them back to
/// the breakpoint objects.
fn initialize_conditional_values(engine: &mut Engine, id: i64) -> Result<(), ProtocolError> {
    let mut resolved = stochast(engine, id)?;
    if !resolved.is_conditional() {
        return Ok(());
    }
    resolved.initialize_conditional_values();
    let ids = payload!(engine, id, Stochast)?.conditional_values.clone();
    for (&value_id, value) in ids.iter().zip(resolved.conditional_values()) {
        *payload!(mut engine, value_id, ConditionalValue)? = *value;
    }
    if ids.is_empty() {
        payload!(mut engine, id, Stochast)?.stochast = resolved;
    }
    Ok(())
}

pub(crate) fn invoke(engine: &mut Engine, id: i64, method: Method) -> Result<(), Error> {
    let kind = engine.kind(id)?;
    match (method, kind) {
        (Method::Run, ObjectKind::Project | ObjectKind::UncertaintyProject | ObjectKind::SensitivityProject) => {
            run_project(engine, id)
        }
        (Method::Run, ObjectKind::CombineProject) => run_combine(engine, id),
        (Method::Run, ObjectKind::LengthEffectProject) => run_length_effect(engine, id),
        (Method::Validate, _) => {
            let report = validation(engine, id)?;
            print_errors(&report);
            set_messages(engine, id, report.into_messages())?;
            Ok(())
        }
        (Method::ClearValidate, _) => {
            if let Object::Project(p) = engine.object_mut(id)? {
                p.analysis.base_mut().clear_validate();
            }
            set_messages(engine, id, Vec::new())?;
            Ok(())
        }
        (Method::InitializeConditionalValues, ObjectKind::Stochast) => {
            Ok(initialize_conditional_values(engine, id)?)
        }
        (Method::InitializeConditionalValues, ObjectKind::Project) => {
            let variables = match engine.object(id)? {
                Object::Project(p) => p.variables.clone(),
                _ => Vec::new(),
            };
            for variable in variables {
                initialize_conditional_values(engine, variable)?;
            }
            Ok(())
        }
        _ => Err(ProtocolError::UnknownMethod {
            kind: kind.name().to_string(),
            method: method.name().to_string(),
        }
        .into()),
    }
}

pub(crate) fn set_model(engine: &mut Engine, id: i64, evaluator: Box<dyn Evaluator>) -> Result<(), ProtocolError> {
    let kind = engine.kind(id)?;
    let Object::Project(object) = engine.object_mut(id)? else {
        return Err(wrong_kind(id, kind, ObjectKind::Project));
    };
    let base = object.analysis.base_mut();
    base.set_model_adapter(ModelAdapter::from_arc(std::sync::Arc::from(evaluator)));
    let variables: Vec<Stochast> = base.variables().to_vec();
    let ids: Vec<i64> = variables
        .into_iter()
        .map(|stochast| {
            engine.insert(Object::Stochast(StochastObject {
                stochast,
                ..Default::default()
            }))
        })
        .collect();
    if let Object::Project(object) = engine.object_mut(id)? {
        object.variables = ids;
    }
    Ok(())
}

//! Typed get and set of every property key.

use limitstate_core::{
    ConstantParameter, CopulaType, CorrelationType, DistributionType, Parameter, RandomSettings,
    RandomType,
};

use super::keys::{
    AlphaKey, CombineKey, CorrelationKey, DesignPointKey, LimitStateKey, ObjectKind, ProjectKey,
    RealizationKey, SettingsKey, StochastKey, StochastSettingsKey, ValueKey,
};
use super::object::{
    self, check_ids, payload, stochast, Analysis, Object, ProjectObject, StochastObject,
};
use super::{out_of_range, parse_key, Engine, Value};
use crate::error::{Error, ProtocolError};
use crate::model::CriticalValue;
use crate::settings::{
    CombineSettings, ReliabilitySettings, SensitivitySettings, StochastSettings,
    UncertaintySettings,
};

fn read_only(kind: ObjectKind, key: &str) -> ProtocolError {
    ProtocolError::ReadOnly {
        kind: kind.name().to_string(),
        property: key.to_string(),
    }
}

fn unknown(kind: ObjectKind, key: &str) -> ProtocolError {
    ProtocolError::UnknownProperty {
        kind: kind.name().to_string(),
        property: key.to_string(),
    }
}

fn mismatch(key: &str, expected: &'static str) -> ProtocolError {
    ProtocolError::TypeMismatch {
        property: key.to_string(),
        expected,
    }
}

fn id_or_zero(id: Option<i64>) -> Value {
    Value::Int(id.unwrap_or(0))
}

/// An object reference where 0 means none.
fn optional_id(engine: &Engine, value: &Value, key: &str, kind: ObjectKind) -> Result<Option<i64>, ProtocolError> {
    match value.as_i64(key)? {
        0 => Ok(None),
        id => {
            engine.expect_kind(id, kind)?;
            Ok(Some(id))
        }
    }
}

fn required_id(engine: &Engine, value: &Value, key: &str, kind: ObjectKind) -> Result<i64, ProtocolError> {
    let id = value.as_i64(key)?;
    engine.expect_kind(id, kind)?;
    Ok(id)
}

fn ids(engine: &Engine, value: &Value, key: &str, kind: ObjectKind) -> Result<Vec<i64>, ProtocolError> {
    let ids = value.as_i64s(key)?.to_vec();
    check_ids(engine, &ids, kind)?;
    Ok(ids)
}

fn position(key: &str, index: i64, count: usize) -> Result<usize, ProtocolError> {
    usize::try_from(index)
        .ok()
        .filter(|&i| i < count)
        .ok_or_else(|| out_of_range(key, index.max(0) as usize, count))
}

fn element(value: Value, key: &str, index: i64) -> Result<Value, ProtocolError> {
    match value {
        Value::IntArray(values) => Ok(Value::Int(values[position(key, index, values.len())?])),
        Value::DoubleArray(values) => {
            Ok(Value::Double(values[position(key, index, values.len())?]))
        }
        _ => Err(mismatch(key, "an indexed property")),
    }
}

fn correlation_type_name(correlation_type: CorrelationType) -> &'static str {
    match correlation_type {
        CorrelationType::Gaussian => "gaussian",
        CorrelationType::Copulas => "copulas",
    }
}

fn constant_parameter_name(constant: ConstantParameter) -> &'static str {
    match constant {
        ConstantParameter::Deviation => "deviation",
        ConstantParameter::Variation => "variation",
    }
}

fn value_parameter(key: ValueKey) -> Option<Parameter> {
    match key {
        ValueKey::Location => Some(Parameter::Location),
        ValueKey::Scale => Some(Parameter::Scale),
        ValueKey::Shift => Some(Parameter::Shift),
        ValueKey::ShiftB => Some(Parameter::ShiftB),
        ValueKey::Minimum => Some(Parameter::Minimum),
        ValueKey::Maximum => Some(Parameter::Maximum),
        ValueKey::Shape => Some(Parameter::Shape),
        ValueKey::ShapeB => Some(Parameter::ShapeB),
        _ => None,
    }
}

fn stochast_id_of(engine: &Engine, id: i64) -> Result<limitstate_core::StochastId, ProtocolError> {
    let object: &StochastObject = payload!(engine, id, Stochast)?;
    Ok(object.stochast.id())
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

fn get_random(random: &RandomSettings, key: SettingsKey) -> Option<Value> {
    Some(match key {
        SettingsKey::RandomType => random.random_type.name().into(),
        SettingsKey::RandomSeed => Value::Int(random.seed as i64),
        SettingsKey::IsRepeatableRandom => random.is_repeatable.into(),
        _ => return None,
    })
}

fn set_random(random: &mut RandomSettings, key: SettingsKey, value: &Value, name: &str) -> Result<bool, ProtocolError> {
    match key {
        SettingsKey::RandomType => {
            random.random_type = RandomType::from_name(value.as_str(name)?)
                .ok_or_else(|| mismatch(name, "a known random generator"))?;
        }
        SettingsKey::RandomSeed => random.seed = value.as_i64(name)? as u64,
        SettingsKey::IsRepeatableRandom => random.is_repeatable = value.as_bool(name)?,
        _ => return Ok(false),
    }
    Ok(true)
}

fn get_reliability(settings: &ReliabilitySettings, key: SettingsKey) -> Option<Value> {
    Some(match key {
        SettingsKey::ReliabilityMethod => settings.reliability_method.name().into(),
        SettingsKey::StartMethod => settings.start_method.name().into(),
        SettingsKey::DesignPointMethod => settings.design_point_method.name().into(),
        SettingsKey::MinimumSamples => settings.minimum_samples.into(),
        SettingsKey::MaximumSamples => settings.maximum_samples.into(),
        SettingsKey::MinimumIterations => settings.minimum_iterations.into(),
        SettingsKey::MaximumIterations => settings.maximum_iterations.into(),
        SettingsKey::MinimumDirections => settings.minimum_directions.into(),
        SettingsKey::MaximumDirections => settings.maximum_directions.into(),
        SettingsKey::VariationCoefficient => settings.variation_coefficient.into(),
        SettingsKey::EpsilonBeta => settings.epsilon_beta.into(),
        SettingsKey::RelaxationFactor => settings.relaxation_factor.into(),
        SettingsKey::RelaxationLoops => settings.relaxation_loops.into(),
        SettingsKey::GradientType => settings.gradient_type.name().into(),
        SettingsKey::GradientStep => settings.gradient_step.into(),
        SettingsKey::AllQuadrants => settings.all_quadrants.into(),
        SettingsKey::MaxStepsSphereSearch => settings.max_steps_sphere_search.into(),
        SettingsKey::FractionFailed => settings.fraction_failed.into(),
        SettingsKey::MaximumLoops => settings.maximum_loops.into(),
        SettingsKey::Du => settings.du.into(),
        SettingsKey::MaximumLength => settings.maximum_length.into(),
        SettingsKey::EpsilonU => settings.epsilon_u.into(),
        SettingsKey::BatchSize => settings.batch_size.into(),
        SettingsKey::MaxParallelProcesses => settings.max_parallel_processes.into(),
        SettingsKey::SaveRealizations => settings.save_realizations.into(),
        _ => return get_random(&settings.random, key),
    })
}

fn set_reliability(
    settings: &mut ReliabilitySettings,
    key: SettingsKey,
    value: &Value,
    name: &str,
) -> Result<bool, ProtocolError> {
    match key {
        SettingsKey::ReliabilityMethod => settings.reliability_method = value.parse(name)?,
        SettingsKey::StartMethod => settings.start_method = value.parse(name)?,
        SettingsKey::DesignPointMethod => settings.design_point_method = value.parse(name)?,
        SettingsKey::MinimumSamples => settings.minimum_samples = value.as_usize(name)?,
        SettingsKey::MaximumSamples => settings.maximum_samples = value.as_usize(name)?,
        SettingsKey::MinimumIterations => settings.minimum_iterations = value.as_usize(name)?,
        SettingsKey::MaximumIterations => settings.maximum_iterations = value.as_usize(name)?,
        SettingsKey::MinimumDirections => settings.minimum_directions = value.as_usize(name)?,
        SettingsKey::MaximumDirections => settings.maximum_directions = value.as_usize(name)?,
        SettingsKey::VariationCoefficient => settings.variation_coefficient = value.as_f64(name)?,
        SettingsKey::EpsilonBeta => settings.epsilon_beta = value.as_f64(name)?,
        SettingsKey::RelaxationFactor => settings.relaxation_factor = value.as_f64(name)?,
        SettingsKey::RelaxationLoops => settings.relaxation_loops = value.as_usize(name)?,
        SettingsKey::GradientType => settings.gradient_type = value.parse(name)?,
        SettingsKey::GradientStep => settings.gradient_step = value.as_f64(name)?,
        SettingsKey::AllQuadrants => settings.all_quadrants = value.as_bool(name)?,
        SettingsKey::MaxStepsSphereSearch => {
            settings.max_steps_sphere_search = value.as_usize(name)?
        }
        SettingsKey::FractionFailed => settings.fraction_failed = value.as_f64(name)?,
        SettingsKey::MaximumLoops => settings.maximum_loops = value.as_usize(name)?,
        SettingsKey::Du => settings.du = value.as_f64(name)?,
        SettingsKey::MaximumLength => settings.maximum_length = value.as_f64(name)?,
        SettingsKey::EpsilonU => settings.epsilon_u = value.as_f64(name)?,
        SettingsKey::BatchSize => settings.batch_size = value.as_usize(name)?,
        SettingsKey::MaxParallelProcesses => {
            settings.max_parallel_processes = value.as_usize(name)?
        }
        SettingsKey::SaveRealizations => settings.save_realizations = value.as_bool(name)?,
        _ => return set_random(&mut settings.random, key, value, name),
    }
    Ok(true)
}

/// Uncertainty settings; keys they do not own reach the settings of the
/// inner reliability runs.
fn get_uncertainty(settings: &UncertaintySettings, key: SettingsKey) -> Option<Value> {
    Some(match key {
        SettingsKey::UncertaintyMethod => settings.uncertainty_method.name().into(),
        SettingsKey::MinimumSamples => settings.minimum_samples.into(),
        SettingsKey::MaximumSamples => settings.maximum_samples.into(),
        SettingsKey::MinimumDirections => settings.minimum_directions.into(),
        SettingsKey::MaximumDirections => settings.maximum_directions.into(),
        SettingsKey::VariationCoefficient => settings.variation_coefficient.into(),
        SettingsKey::Quantiles => settings.quantiles.clone().into(),
        SettingsKey::DeriveSamplesFromVariationCoefficient => {
            settings.derive_samples_from_variation_coefficient.into()
        }
        SettingsKey::CalculateCorrelations => settings.calculate_correlations.into(),
        SettingsKey::CalculateInputCorrelations => settings.calculate_input_correlations.into(),
        SettingsKey::Thresholds => settings.thresholds.clone().into(),
        SettingsKey::GradientStep => settings.gradient_step.into(),
        SettingsKey::HistogramBins => settings.histogram_bins.into(),
        SettingsKey::BatchSize => settings.batch_size.into(),
        SettingsKey::MaxParallelProcesses => settings.max_parallel_processes.into(),
        SettingsKey::RandomType | SettingsKey::RandomSeed | SettingsKey::IsRepeatableRandom => {
            return get_random(&settings.random, key)
        }
        _ => return get_reliability(&settings.reliability, key),
    })
}

fn set_uncertainty(
    settings: &mut UncertaintySettings,
    key: SettingsKey,
    value: &Value,
    name: &str,
) -> Result<bool, ProtocolError> {
    match key {
        SettingsKey::UncertaintyMethod => settings.uncertainty_method = value.parse(name)?,
        SettingsKey::MinimumSamples => settings.minimum_samples = value.as_usize(name)?,
        SettingsKey::MaximumSamples => settings.maximum_samples = value.as_usize(name)?,
        SettingsKey::MinimumDirections => settings.minimum_directions = value.as_usize(name)?,
        SettingsKey::MaximumDirections => settings.maximum_directions = value.as_usize(name)?,
        SettingsKey::VariationCoefficient => settings.variation_coefficient = value.as_f64(name)?,
        SettingsKey::Quantiles => settings.quantiles = value.as_f64s(name)?.to_vec(),
        SettingsKey::DeriveSamplesFromVariationCoefficient => {
            settings.derive_samples_from_variation_coefficient = value.as_bool(name)?
        }
        SettingsKey::CalculateCorrelations => settings.calculate_correlations = value.as_bool(name)?,
        SettingsKey::CalculateInputCorrelations => {
            settings.calculate_input_correlations = value.as_bool(name)?
        }
        SettingsKey::Thresholds => settings.thresholds = value.as_f64s(name)?.to_vec(),
        SettingsKey::GradientStep => settings.gradient_step = value.as_f64(name)?,
        SettingsKey::HistogramBins => settings.histogram_bins = value.as_usize(name)?,
        SettingsKey::BatchSize => settings.batch_size = value.as_usize(name)?,
        SettingsKey::MaxParallelProcesses => {
            settings.max_parallel_processes = value.as_usize(name)?
        }
        SettingsKey::RandomType | SettingsKey::RandomSeed | SettingsKey::IsRepeatableRandom => {
            return set_random(&mut settings.random, key, value, name)
        }
        _ => return set_reliability(&mut settings.reliability, key, value, name),
    }
    Ok(true)
}

fn get_sensitivity(settings: &SensitivitySettings, key: SettingsKey) -> Option<Value> {
    Some(match key {
        SettingsKey::SensitivityMethod => settings.sensitivity_method.name().into(),
        SettingsKey::LowProbability => settings.low_probability.into(),
        SettingsKey::HighProbability => settings.high_probability.into(),
        SettingsKey::MaximumSamples => settings.maximum_samples.into(),
        SettingsKey::MaxParallelProcesses => settings.max_parallel_processes.into(),
        _ => return get_random(&settings.random, key),
    })
}

fn set_sensitivity(
    settings: &mut SensitivitySettings,
    key: SettingsKey,
    value: &Value,
    name: &str,
) -> Result<bool, ProtocolError> {
    match key {
        SettingsKey::SensitivityMethod => settings.sensitivity_method = value.parse(name)?,
        SettingsKey::LowProbability => settings.low_probability = value.as_f64(name)?,
        SettingsKey::HighProbability => settings.high_probability = value.as_f64(name)?,
        SettingsKey::MaximumSamples => settings.maximum_samples = value.as_usize(name)?,
        SettingsKey::MaxParallelProcesses => {
            settings.max_parallel_processes = value.as_usize(name)?
        }
        _ => return set_random(&mut settings.random, key, value, name),
    }
    Ok(true)
}

fn get_stochast_settings(settings: &StochastSettings, key: StochastSettingsKey) -> Value {
    match key {
        StochastSettingsKey::MinValue => settings.min_value.into(),
        StochastSettingsKey::MaxValue => settings.max_value.into(),
        StochastSettingsKey::StartValue => settings.start_value.into(),
        StochastSettingsKey::VarianceFactor => settings.variance_factor.into(),
        StochastSettingsKey::Intervals => settings.intervals.into(),
        StochastSettingsKey::IsInitializationAllowed => settings.is_initialization_allowed.into(),
        StochastSettingsKey::IsVarianceAllowed => settings.is_variance_allowed.into(),
        StochastSettingsKey::Variable => Value::Int(0),
    }
}

fn set_stochast_settings(
    settings: &mut StochastSettings,
    key: StochastSettingsKey,
    value: &Value,
    name: &str,
) -> Result<(), ProtocolError> {
    match key {
        StochastSettingsKey::MinValue => settings.min_value = value.as_f64(name)?,
        StochastSettingsKey::MaxValue => settings.max_value = value.as_f64(name)?,
        StochastSettingsKey::StartValue => settings.start_value = value.as_f64(name)?,
        StochastSettingsKey::VarianceFactor => settings.variance_factor = value.as_f64(name)?,
        StochastSettingsKey::Intervals => settings.intervals = value.as_usize(name)?,
        StochastSettingsKey::IsInitializationAllowed => {
            settings.is_initialization_allowed = value.as_bool(name)?
        }
        StochastSettingsKey::IsVarianceAllowed => settings.is_variance_allowed = value.as_bool(name)?,
        StochastSettingsKey::Variable => {}
    }
    Ok(())
}

fn get_combine(settings: &CombineSettings, key: CombineKey) -> Option<Value> {
    Some(match key {
        CombineKey::CombinerMethod => settings.combiner_method.name().into(),
        CombineKey::CombineType => settings.combine_type.name().into(),
        CombineKey::MinimumSamples => settings.minimum_samples.into(),
        CombineKey::MaximumSamples => settings.maximum_samples.into(),
        CombineKey::MinimumDirections => settings.minimum_directions.into(),
        CombineKey::MaximumDirections => settings.maximum_directions.into(),
        CombineKey::VariationCoefficient => settings.variation_coefficient.into(),
        CombineKey::RandomSeed => Value::Int(settings.random.seed as i64),
        _ => return None,
    })
}

fn set_combine(settings: &mut CombineSettings, key: CombineKey, value: &Value, name: &str) -> Result<bool, ProtocolError> {
    match key {
        CombineKey::CombinerMethod => settings.combiner_method = value.parse(name)?,
        CombineKey::CombineType => settings.combine_type = value.parse(name)?,
        CombineKey::MinimumSamples => settings.minimum_samples = value.as_usize(name)?,
        CombineKey::MaximumSamples => settings.maximum_samples = value.as_usize(name)?,
        CombineKey::MinimumDirections => settings.minimum_directions = value.as_usize(name)?,
        CombineKey::MaximumDirections => settings.maximum_directions = value.as_usize(name)?,
        CombineKey::VariationCoefficient => settings.variation_coefficient = value.as_f64(name)?,
        CombineKey::RandomSeed => {
            settings.random.seed = value.as_i64(name)? as u64;
            settings.random.is_repeatable = true;
        }
        _ => return Ok(false),
    }
    Ok(true)
}

// ---------------------------------------------------------------------------
// get
// ---------------------------------------------------------------------------

fn get_stochast(engine: &Engine, id: i64, key: &str) -> Result<Value, ProtocolError> {
    let k: StochastKey = parse_key(ObjectKind::Stochast, key)?;
    let object: &StochastObject = payload!(engine, id, Stochast)?;
    let s = stochast(engine, id)?;
    Ok(match k {
        StochastKey::Name => s.name().into(),
        StochastKey::Distribution => s.distribution().name().into(),
        StochastKey::Mean => s.mean().into(),
        StochastKey::Deviation => s.deviation().into(),
        StochastKey::Variation => s.variation().into(),
        StochastKey::Location => s.location().into(),
        StochastKey::Scale => s.scale().into(),
        StochastKey::Shift => s.shift().into(),
        StochastKey::ShiftB => s.shift_b().into(),
        StochastKey::Minimum => s.minimum().into(),
        StochastKey::Maximum => s.maximum().into(),
        StochastKey::Shape => s.shape().into(),
        StochastKey::ShapeB => s.shape_b().into(),
        StochastKey::Rate => s.rate().into(),
        StochastKey::Observations => s.observations().into(),
        StochastKey::ConstantParameter => constant_parameter_name(s.constant_parameter()).into(),
        StochastKey::Inverted => s.is_inverted().into(),
        StochastKey::Truncated => s.is_truncated().into(),
        StochastKey::DesignFraction => s.design_fraction().into(),
        StochastKey::DesignFactor => s.design_factor().into(),
        StochastKey::DesignValue => s.design_value().into(),
        StochastKey::IsArray => s.is_array().into(),
        StochastKey::ArraySize => s.array_size().into(),
        StochastKey::ArrayVariables => object.array_variables.clone().into(),
        StochastKey::Conditional => s.is_conditional().into(),
        StochastKey::ConditionalSource => id_or_zero(object.conditional_source),
        StochastKey::ConditionalValues => object.conditional_values.clone().into(),
        StochastKey::ContributingStochasts => object.contributing_stochasts.clone().into(),
        StochastKey::DiscreteValues => object.discrete_values.clone().into(),
        StochastKey::HistogramValues => object.histogram_values.clone().into(),
        StochastKey::FragilityValues => object.fragility_values.clone().into(),
        StochastKey::IsValid => s.is_valid().into(),
        StochastKey::Fit => return Err(read_only(ObjectKind::Stochast, key)),
        StochastKey::Pdf
        | StochastKey::Cdf
        | StochastKey::XFromU
        | StochastKey::UFromX
        | StochastKey::Quantile => return Err(mismatch(key, "an argument")),
    })
}

fn get_value_object(object: &Object, key: &str) -> Result<Value, ProtocolError> {
    let kind = object.kind();
    let k: ValueKey = parse_key(kind, key)?;
    let value = match (object, k) {
        (Object::DiscreteValue(v), ValueKey::X) => v.x.into(),
        (Object::DiscreteValue(v), ValueKey::Amount) => v.amount.into(),
        (Object::HistogramValue(v), ValueKey::LowerBound) => v.lower_bound.into(),
        (Object::HistogramValue(v), ValueKey::UpperBound) => v.upper_bound.into(),
        (Object::HistogramValue(v), ValueKey::Amount) => v.amount.into(),
        (Object::FragilityValue(v), ValueKey::X) => v.x.into(),
        (Object::FragilityValue(v), ValueKey::ReliabilityIndex) => v.reliability_index.into(),
        (Object::FragilityValue(v), ValueKey::Probability) => v.probability().into(),
        (Object::ConditionalValue(v), ValueKey::X) => v.x.into(),
        (Object::ConditionalValue(v), k) => match value_parameter(k) {
            Some(parameter) => v.parameters.get(parameter).into(),
            None => return Err(unknown(kind, key)),
        },
        (Object::ContributingStochast(c), ValueKey::Probability) => c.probability.into(),
        (Object::ContributingStochast(c), ValueKey::Variable) => id_or_zero(c.variable),
        _ => return Err(unknown(kind, key)),
    };
    Ok(value)
}

fn get_project(object: &ProjectObject, k: ProjectKey) -> Result<Value, ProtocolError> {
    Ok(match k {
        ProjectKey::Variables => object.variables.clone().into(),
        ProjectKey::CorrelationMatrix => Value::Int(object.correlation_matrix),
        ProjectKey::SelfCorrelationMatrix => Value::Int(object.self_correlation_matrix),
        ProjectKey::Settings => Value::Int(object.settings),
        ProjectKey::LimitStateFunction => id_or_zero(object.limit_state_function),
        ProjectKey::Output => object
            .output
            .as_ref()
            .map(|(name, _)| name.clone())
            .unwrap_or_default()
            .into(),
        ProjectKey::OutputIndex => object.output.as_ref().map_or(0, |(_, i)| *i).into(),
        ProjectKey::ReuseCalculations => object
            .analysis
            .base()
            .model()
            .is_some_and(|m| m.reuse_calculations())
            .into(),
        ProjectKey::TotalModelRuns => object.total_model_runs.into(),
        ProjectKey::IsValid => object.messages.iter().all(|m| !m.is_error()).into(),
        ProjectKey::Messages => object.messages.len().into(),
        ProjectKey::DesignPoint => id_or_zero(object.design_point),
        ProjectKey::Stochast => id_or_zero(object.output_stochasts.first().copied()),
        ProjectKey::OutputStochasts => object.output_stochasts.clone().into(),
        ProjectKey::OutputCorrelationMatrix => id_or_zero(object.output_correlation_matrix),
        ProjectKey::QuantileValues => object.quantile_values.clone().into(),
        ProjectKey::Outputs => sensitivity_outputs(object).len().into(),
        ProjectKey::Low
        | ProjectKey::Medium
        | ProjectKey::High
        | ProjectKey::FirstOrderIndex
        | ProjectKey::TotalIndex => sensitivity_values(object, k, 0)?.into(),
    })
}

fn sensitivity_outputs(object: &ProjectObject) -> Vec<String> {
    match &object.analysis {
        Analysis::Sensitivity(p) => p
            .result()
            .map(|r| r.outputs.iter().map(|o| o.output.clone()).collect())
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// One sensitivity measure of every variable for an output.
fn sensitivity_values(object: &ProjectObject, key: ProjectKey, output: i64) -> Result<Vec<f64>, ProtocolError> {
    let Analysis::Sensitivity(project) = &object.analysis else {
        return Ok(Vec::new());
    };
    let Some(result) = project.result() else {
        return Ok(Vec::new());
    };
    let output = &result.outputs[position(key.name(), output, result.outputs.len())?];
    Ok(output
        .values
        .iter()
        .map(|v| match key {
            ProjectKey::Low => v.low,
            ProjectKey::Medium => v.medium,
            ProjectKey::High => v.high,
            ProjectKey::FirstOrderIndex => v.first_order_index,
            _ => v.total_index,
        })
        .collect())
}

fn get_design_point(object: &object::DesignPointObject, key: &str) -> Result<Value, ProtocolError> {
    let k: DesignPointKey = parse_key(ObjectKind::DesignPoint, key)?;
    let point = &object.point;
    Ok(match k {
        DesignPointKey::Identifier => point.identifier.clone().into(),
        DesignPointKey::ReliabilityIndex => point.reliability_index.into(),
        DesignPointKey::ProbabilityFailure => point.probability_failure.into(),
        DesignPointKey::Convergence => point.convergence.into(),
        DesignPointKey::IsConverged => point.is_converged.into(),
        DesignPointKey::TotalDirections => point.total_directions.into(),
        DesignPointKey::TotalIterations => point.total_iterations.into(),
        DesignPointKey::TotalModelRuns => point.total_model_runs.into(),
        DesignPointKey::Alphas => object.alphas.clone().into(),
        DesignPointKey::ContributingDesignPoints => object.contributing.clone().into(),
        DesignPointKey::Realizations => object.realizations.clone().into(),
        DesignPointKey::Messages => point.messages.len().into(),
    })
}

fn get_alpha(object: &object::AlphaObject, key: &str) -> Result<Value, ProtocolError> {
    let k: AlphaKey = parse_key(ObjectKind::Alpha, key)?;
    let alpha = &object.alpha;
    Ok(match k {
        AlphaKey::Variable => id_or_zero(object.variable),
        AlphaKey::Name => alpha.name.clone().into(),
        AlphaKey::Index => alpha.index.into(),
        AlphaKey::Alpha => alpha.alpha.into(),
        AlphaKey::AlphaCorrelated => alpha.alpha_correlated.into(),
        AlphaKey::InfluenceFactor => alpha.influence_factor().into(),
        AlphaKey::X => alpha.x.into(),
        AlphaKey::U => alpha.u.into(),
    })
}

fn get_realization(realization: &crate::reliability::Realization, key: &str) -> Result<Value, ProtocolError> {
    let k: RealizationKey = parse_key(ObjectKind::Realization, key)?;
    Ok(match k {
        RealizationKey::Iteration => realization.iteration.into(),
        RealizationKey::Z => realization.z.into(),
        RealizationKey::Beta => realization.beta.into(),
        RealizationKey::Weight => realization.weight.into(),
        RealizationKey::InputValues => realization.input_values.clone().into(),
        RealizationKey::OutputValues => realization.output_values.clone().into(),
    })
}

fn get_limit_state(function: &crate::model::LimitStateFunction, key: &str) -> Result<Value, ProtocolError> {
    let k: LimitStateKey = parse_key(ObjectKind::LimitStateFunction, key)?;
    Ok(match k {
        LimitStateKey::Parameter => function.parameter.clone().into(),
        LimitStateKey::Index => function.index.into(),
        LimitStateKey::CompareType => function.compare_type.name().into(),
        LimitStateKey::CriticalValue => match &function.critical {
            CriticalValue::Value(v) => (*v).into(),
            CriticalValue::Parameter(_) => f64::NAN.into(),
        },
        LimitStateKey::CriticalParameter => match &function.critical {
            CriticalValue::Parameter(name) => name.clone().into(),
            CriticalValue::Value(_) => "".into(),
        },
    })
}

fn get_length_effect(engine: &mut Engine, id: i64, key: &str) -> Result<Value, ProtocolError> {
    let k: CombineKey = parse_key(ObjectKind::LengthEffectProject, key)?;
    if k == CombineKey::IsValid {
        return Ok(object::validation(engine, id)?.is_valid().into());
    }
    let object: &object::LengthEffectObject = payload!(engine, id, LengthEffectProject)?;
    let settings = &object.project.settings;
    Ok(match k {
        CombineKey::CrossSection => id_or_zero(object.cross_section),
        CombineKey::SelfCorrelationMatrix => Value::Int(object.self_correlation_matrix),
        CombineKey::CorrelationLengths => object
            .correlation_lengths
            .keys()
            .copied()
            .collect::<Vec<_>>()
            .into(),
        CombineKey::Length => settings.length.into(),
        CombineKey::SectionLength => settings.section_length.into(),
        CombineKey::Messages => object.messages.len().into(),
        CombineKey::DesignPoint => id_or_zero(object.design_point),
        CombineKey::DesignPoints => return Err(unknown(ObjectKind::LengthEffectProject, key)),
        _ => get_combine(&settings.combine, k)
            .ok_or_else(|| unknown(ObjectKind::LengthEffectProject, key))?,
    })
}

fn get_combine_project(engine: &mut Engine, id: i64, key: &str) -> Result<Value, ProtocolError> {
    let k: CombineKey = parse_key(ObjectKind::CombineProject, key)?;
    if k == CombineKey::IsValid {
        return Ok(object::validation(engine, id)?.is_valid().into());
    }
    let object: &object::CombineObject = payload!(engine, id, CombineProject)?;
    Ok(match k {
        CombineKey::DesignPoints => object.design_points.clone().into(),
        CombineKey::SelfCorrelationMatrix => Value::Int(object.self_correlation_matrix),
        CombineKey::Messages => object.messages.len().into(),
        CombineKey::DesignPoint => id_or_zero(object.design_point),
        _ => get_combine(&object.project.settings, k)
            .ok_or_else(|| unknown(ObjectKind::CombineProject, key))?,
    })
}

pub(crate) fn get(engine: &mut Engine, id: i64, key: &str) -> Result<Value, ProtocolError> {
    let kind = engine.kind(id)?;
    match kind {
        ObjectKind::Stochast => get_stochast(engine, id, key),
        ObjectKind::DiscreteValue
        | ObjectKind::HistogramValue
        | ObjectKind::FragilityValue
        | ObjectKind::ConditionalValue
        | ObjectKind::ContributingStochast => get_value_object(engine.object(id)?, key),
        ObjectKind::CorrelationMatrix => {
            let k: CorrelationKey = parse_key(kind, key)?;
            let matrix = payload!(engine, id, CorrelationMatrix)?;
            match k {
                CorrelationKey::CorrelationType => {
                    Ok(correlation_type_name(matrix.correlation_type()).into())
                }
                _ => Err(mismatch(key, "two stochast ids")),
            }
        }
        ObjectKind::SelfCorrelationMatrix => {
            let _: CorrelationKey = parse_key(kind, key)?;
            Err(mismatch(key, "a stochast id"))
        }
        ObjectKind::Settings => {
            let k: SettingsKey = parse_key(kind, key)?;
            let object: &object::SettingsObject = payload!(engine, id, Settings)?;
            if k == SettingsKey::StochastSettings {
                return Ok(object.stochast_settings.clone().into());
            }
            get_reliability(&object.settings, k).ok_or_else(|| unknown(kind, key))
        }
        ObjectKind::UncertaintySettings => {
            let k: SettingsKey = parse_key(kind, key)?;
            get_uncertainty(payload!(engine, id, UncertaintySettings)?, k)
                .ok_or_else(|| unknown(kind, key))
        }
        ObjectKind::SensitivitySettings => {
            let k: SettingsKey = parse_key(kind, key)?;
            get_sensitivity(payload!(engine, id, SensitivitySettings)?, k)
                .ok_or_else(|| unknown(kind, key))
        }
        ObjectKind::StochastSettings => {
            let k: StochastSettingsKey = parse_key(kind, key)?;
            let object: &object::StochastSettingsObject = payload!(engine, id, StochastSettings)?;
            Ok(match k {
                StochastSettingsKey::Variable => id_or_zero(object.variable),
                _ => get_stochast_settings(&object.settings, k),
            })
        }
        ObjectKind::LimitStateFunction => get_limit_state(payload!(engine, id, LimitStateFunction)?, key),
        ObjectKind::Project | ObjectKind::UncertaintyProject | ObjectKind::SensitivityProject => {
            let k: ProjectKey = parse_key(kind, key)?;
            if k == ProjectKey::IsValid {
                return Ok(object::validation(engine, id)?.is_valid().into());
            }
            match engine.object(id)? {
                Object::Project(object) => get_project(object, k),
                _ => Err(unknown(kind, key)),
            }
        }
        ObjectKind::CombineProject => get_combine_project(engine, id, key),
        ObjectKind::LengthEffectProject => get_length_effect(engine, id, key),
        ObjectKind::DesignPoint => get_design_point(payload!(engine, id, DesignPoint)?, key),
        ObjectKind::Alpha => get_alpha(payload!(engine, id, Alpha)?, key),
        ObjectKind::Realization => get_realization(payload!(engine, id, Realization)?, key),
    }
}

// ---------------------------------------------------------------------------
// set
// ---------------------------------------------------------------------------

fn set_stochast(engine: &mut Engine, id: i64, key: &str, value: Value) -> Result<(), Error> {
    let k: StochastKey = parse_key(ObjectKind::Stochast, key)?;
    // References are checked before the stochast is borrowed mutably.
    let references = match k {
        StochastKey::ArrayVariables => Some(ids(engine, &value, key, ObjectKind::Stochast)?),
        StochastKey::ConditionalValues => Some(ids(engine, &value, key, ObjectKind::ConditionalValue)?),
        StochastKey::ContributingStochasts => {
            Some(ids(engine, &value, key, ObjectKind::ContributingStochast)?)
        }
        StochastKey::DiscreteValues => Some(ids(engine, &value, key, ObjectKind::DiscreteValue)?),
        StochastKey::HistogramValues => Some(ids(engine, &value, key, ObjectKind::HistogramValue)?),
        StochastKey::FragilityValues => Some(ids(engine, &value, key, ObjectKind::FragilityValue)?),
        _ => None,
    };
    let source = match k {
        StochastKey::ConditionalSource => optional_id(engine, &value, key, ObjectKind::Stochast)?,
        _ => None,
    };
    let object: &mut StochastObject = payload!(mut engine, id, Stochast)?;
    let s = &mut object.stochast;
    match k {
        StochastKey::Name => s.set_name(value.as_str(key)?),
        StochastKey::Distribution => s.set_distribution(
            DistributionType::from_name(value.as_str(key)?)
                .ok_or_else(|| mismatch(key, "a known distribution"))?,
        ),
        StochastKey::Mean => s.set_mean(value.as_f64(key)?),
        StochastKey::Deviation => s.set_deviation(value.as_f64(key)?),
        StochastKey::Variation => s.set_variation(value.as_f64(key)?),
        StochastKey::Location => s.set_location(value.as_f64(key)?),
        StochastKey::Scale => s.set_scale(value.as_f64(key)?),
        StochastKey::Shift => s.set_shift(value.as_f64(key)?),
        StochastKey::ShiftB => s.set_shift_b(value.as_f64(key)?),
        StochastKey::Minimum => s.set_minimum(value.as_f64(key)?),
        StochastKey::Maximum => s.set_maximum(value.as_f64(key)?),
        StochastKey::Shape => s.set_shape(value.as_f64(key)?),
        StochastKey::ShapeB => s.set_shape_b(value.as_f64(key)?),
        StochastKey::Rate => s.set_rate(value.as_f64(key)?),
        StochastKey::Observations => s.set_observations(value.as_usize(key)?),
        StochastKey::ConstantParameter => s.set_constant_parameter(match value.as_str(key)? {
            "deviation" => ConstantParameter::Deviation,
            "variation" => ConstantParameter::Variation,
            _ => return Err(mismatch(key, "deviation or variation").into()),
        }),
        StochastKey::Inverted => s.set_inverted(value.as_bool(key)?),
        StochastKey::Truncated => s.set_truncated(value.as_bool(key)?),
        StochastKey::DesignFraction => s.set_design_fraction(value.as_f64(key)?),
        StochastKey::DesignFactor => s.set_design_factor(value.as_f64(key)?),
        StochastKey::IsArray => s.set_is_array(value.as_bool(key)?),
        StochastKey::ArraySize => s.set_array_size(value.as_usize(key)?),
        StochastKey::Conditional => s.set_conditional(value.as_bool(key)?),
        StochastKey::ConditionalSource => object.conditional_source = source,
        StochastKey::ArrayVariables => object.array_variables = references.unwrap_or_default(),
        StochastKey::ConditionalValues => {
            object.conditional_values = references.unwrap_or_default()
        }
        StochastKey::ContributingStochasts => {
            object.contributing_stochasts = references.unwrap_or_default()
        }
        StochastKey::DiscreteValues => object.discrete_values = references.unwrap_or_default(),
        StochastKey::HistogramValues => object.histogram_values = references.unwrap_or_default(),
        StochastKey::FragilityValues => object.fragility_values = references.unwrap_or_default(),
        StochastKey::Fit => s.fit(value.as_f64s(key)?)?,
        StochastKey::DesignValue | StochastKey::IsValid => {
            return Err(read_only(ObjectKind::Stochast, key).into())
        }
        StochastKey::Pdf
        | StochastKey::Cdf
        | StochastKey::XFromU
        | StochastKey::UFromX
        | StochastKey::Quantile => return Err(read_only(ObjectKind::Stochast, key).into()),
    }
    Ok(())
}

fn set_value_object(engine: &mut Engine, id: i64, key: &str, value: Value) -> Result<(), ProtocolError> {
    let kind = engine.kind(id)?;
    let k: ValueKey = parse_key(kind, key)?;
    let variable = match (kind, k) {
        (ObjectKind::ContributingStochast, ValueKey::Variable) => {
            optional_id(engine, &value, key, ObjectKind::Stochast)?
        }
        _ => None,
    };
    match (engine.object_mut(id)?, k) {
        (Object::DiscreteValue(v), ValueKey::X) => v.x = value.as_f64(key)?,
        (Object::DiscreteValue(v), ValueKey::Amount) => v.amount = value.as_f64(key)?,
        (Object::HistogramValue(v), ValueKey::LowerBound) => v.lower_bound = value.as_f64(key)?,
        (Object::HistogramValue(v), ValueKey::UpperBound) => v.upper_bound = value.as_f64(key)?,
        (Object::HistogramValue(v), ValueKey::Amount) => v.amount = value.as_f64(key)?,
        (Object::FragilityValue(v), ValueKey::X) => v.x = value.as_f64(key)?,
        (Object::FragilityValue(v), ValueKey::ReliabilityIndex) => {
            v.reliability_index = value.as_f64(key)?
        }
        (Object::FragilityValue(_), ValueKey::Probability) => return Err(read_only(kind, key)),
        (Object::ConditionalValue(v), ValueKey::X) => v.x = value.as_f64(key)?,
        (Object::ConditionalValue(v), k) => match value_parameter(k) {
            Some(parameter) => v.parameters.set(parameter, value.as_f64(key)?),
            None => return Err(unknown(kind, key)),
        },
        (Object::ContributingStochast(c), ValueKey::Probability) => {
            c.probability = value.as_f64(key)?
        }
        (Object::ContributingStochast(c), ValueKey::Variable) => c.variable = variable,
        _ => return Err(unknown(kind, key)),
    }
    Ok(())
}

fn set_project(engine: &mut Engine, id: i64, key: &str, value: Value) -> Result<(), ProtocolError> {
    let kind = engine.kind(id)?;
    let k: ProjectKey = parse_key(kind, key)?;
    let settings_kind = match kind {
        ObjectKind::UncertaintyProject => ObjectKind::UncertaintySettings,
        ObjectKind::SensitivityProject => ObjectKind::SensitivitySettings,
        _ => ObjectKind::Settings,
    };
    let reference = match k {
        ProjectKey::CorrelationMatrix => Some(required_id(engine, &value, key, ObjectKind::CorrelationMatrix)?),
        ProjectKey::SelfCorrelationMatrix => {
            Some(required_id(engine, &value, key, ObjectKind::SelfCorrelationMatrix)?)
        }
        ProjectKey::Settings => Some(required_id(engine, &value, key, settings_kind)?),
        ProjectKey::LimitStateFunction => {
            optional_id(engine, &value, key, ObjectKind::LimitStateFunction)?
        }
        _ => None,
    };
    let variables = match k {
        ProjectKey::Variables => ids(engine, &value, key, ObjectKind::Stochast)?,
        _ => Vec::new(),
    };
    let Object::Project(object) = engine.object_mut(id)? else {
        return Err(unknown(kind, key));
    };
    match k {
        ProjectKey::Variables => object.variables = variables,
        ProjectKey::CorrelationMatrix => {
            object.correlation_matrix = reference.unwrap_or(object.correlation_matrix)
        }
        ProjectKey::SelfCorrelationMatrix => {
            object.self_correlation_matrix = reference.unwrap_or(object.self_correlation_matrix)
        }
        ProjectKey::Settings => object.settings = reference.unwrap_or(object.settings),
        ProjectKey::LimitStateFunction => object.limit_state_function = reference,
        ProjectKey::Output => {
            let index = object.output.as_ref().map_or(0, |(_, i)| *i);
            object.output = Some((value.as_str(key)?.to_string(), index));
        }
        ProjectKey::OutputIndex => {
            let name = object.output.take().map(|(n, _)| n).unwrap_or_default();
            object.output = Some((name, value.as_usize(key)?));
        }
        ProjectKey::ReuseCalculations => {
            let reuse = value.as_bool(key)?;
            if let Some(model) = object.analysis.base_mut().model_mut() {
                model.set_reuse_calculations(reuse);
            }
        }
        _ => return Err(read_only(kind, key)),
    }
    Ok(())
}

fn set_combine_project(engine: &mut Engine, id: i64, key: &str, value: Value) -> Result<(), ProtocolError> {
    let kind = ObjectKind::CombineProject;
    let k: CombineKey = parse_key(kind, key)?;
    let points = match k {
        CombineKey::DesignPoints => ids(engine, &value, key, ObjectKind::DesignPoint)?,
        _ => Vec::new(),
    };
    let matrix = match k {
        CombineKey::SelfCorrelationMatrix => {
            Some(required_id(engine, &value, key, ObjectKind::SelfCorrelationMatrix)?)
        }
        _ => None,
    };
    let object = payload!(mut engine, id, CombineProject)?;
    match k {
        CombineKey::DesignPoints => object.design_points = points,
        CombineKey::SelfCorrelationMatrix => {
            object.self_correlation_matrix = matrix.unwrap_or(object.self_correlation_matrix)
        }
        _ => {
            if !set_combine(&mut object.project.settings, k, &value, key)? {
                return Err(read_only(kind, key));
            }
        }
    }
    Ok(())
}

fn set_length_effect(engine: &mut Engine, id: i64, key: &str, value: Value) -> Result<(), ProtocolError> {
    let kind = ObjectKind::LengthEffectProject;
    let k: CombineKey = parse_key(kind, key)?;
    let reference = match k {
        CombineKey::CrossSection => optional_id(engine, &value, key, ObjectKind::DesignPoint)?,
        CombineKey::SelfCorrelationMatrix => {
            Some(required_id(engine, &value, key, ObjectKind::SelfCorrelationMatrix)?)
        }
        _ => None,
    };
    let object = payload!(mut engine, id, LengthEffectProject)?;
    let settings = &mut object.project.settings;
    match k {
        CombineKey::CrossSection => object.cross_section = reference,
        CombineKey::SelfCorrelationMatrix => {
            object.self_correlation_matrix = reference.unwrap_or(object.self_correlation_matrix)
        }
        CombineKey::Length => settings.length = value.as_f64(key)?,
        CombineKey::SectionLength => settings.section_length = value.as_f64(key)?,
        CombineKey::DesignPoints => return Err(unknown(kind, key)),
        _ => {
            if !set_combine(&mut settings.combine, k, &value, key)? {
                return Err(read_only(kind, key));
            }
        }
    }
    Ok(())
}

fn set_design_point(engine: &mut Engine, id: i64, key: &str, value: Value) -> Result<(), ProtocolError> {
    let kind = ObjectKind::DesignPoint;
    let k: DesignPointKey = parse_key(kind, key)?;
    let references = match k {
        DesignPointKey::Alphas => ids(engine, &value, key, ObjectKind::Alpha)?,
        DesignPointKey::ContributingDesignPoints => ids(engine, &value, key, ObjectKind::DesignPoint)?,
        _ => Vec::new(),
    };
    let object = payload!(mut engine, id, DesignPoint)?;
    let point = &mut object.point;
    match k {
        DesignPointKey::Identifier => point.identifier = value.as_str(key)?.to_string(),
        DesignPointKey::ReliabilityIndex => {
            point.reliability_index = value.as_f64(key)?;
            point.probability_failure =
                limitstate_core::standard_normal::q_from_u(point.reliability_index);
        }
        DesignPointKey::Alphas => object.alphas = references,
        DesignPointKey::ContributingDesignPoints => object.contributing = references,
        _ => return Err(read_only(kind, key)),
    }
    Ok(())
}

fn set_alpha(engine: &mut Engine, id: i64, key: &str, value: Value) -> Result<(), ProtocolError> {
    let kind = ObjectKind::Alpha;
    let k: AlphaKey = parse_key(kind, key)?;
    let variable = match k {
        AlphaKey::Variable => optional_id(engine, &value, key, ObjectKind::Stochast)?,
        _ => None,
    };
    let name = match variable {
        Some(v) => Some(payload!(engine, v, Stochast)?.stochast.name().to_string()),
        None => None,
    };
    let object = payload!(mut engine, id, Alpha)?;
    let alpha = &mut object.alpha;
    match k {
        AlphaKey::Variable => {
            object.variable = variable;
            if let Some(name) = name {
                alpha.name = name;
            }
        }
        AlphaKey::Index => alpha.index = value.as_usize(key)?,
        AlphaKey::Alpha => {
            alpha.alpha = value.as_f64(key)?;
            alpha.alpha_correlated = alpha.alpha;
        }
        AlphaKey::AlphaCorrelated => alpha.alpha_correlated = value.as_f64(key)?,
        AlphaKey::X => alpha.x = value.as_f64(key)?,
        AlphaKey::U => alpha.u = value.as_f64(key)?,
        AlphaKey::Name | AlphaKey::InfluenceFactor => return Err(read_only(kind, key)),
    }
    Ok(())
}

fn set_limit_state(engine: &mut Engine, id: i64, key: &str, value: Value) -> Result<(), ProtocolError> {
    let k: LimitStateKey = parse_key(ObjectKind::LimitStateFunction, key)?;
    let function = payload!(mut engine, id, LimitStateFunction)?;
    match k {
        LimitStateKey::Parameter => function.parameter = value.as_str(key)?.to_string(),
        LimitStateKey::Index => function.index = value.as_usize(key)?,
        LimitStateKey::CompareType => function.compare_type = value.parse(key)?,
        LimitStateKey::CriticalValue => function.critical = CriticalValue::Value(value.as_f64(key)?),
        LimitStateKey::CriticalParameter => {
            function.critical = CriticalValue::Parameter(value.as_str(key)?.to_string())
        }
    }
    Ok(())
}

pub(crate) fn set(engine: &mut Engine, id: i64, key: &str, value: Value) -> Result<(), Error> {
    let kind = engine.kind(id)?;
    match kind {
        ObjectKind::Stochast => return set_stochast(engine, id, key, value),
        ObjectKind::DiscreteValue
        | ObjectKind::HistogramValue
        | ObjectKind::FragilityValue
        | ObjectKind::ConditionalValue
        | ObjectKind::ContributingStochast => set_value_object(engine, id, key, value)?,
        ObjectKind::CorrelationMatrix => {
            let k: CorrelationKey = parse_key(kind, key)?;
            let matrix = payload!(mut engine, id, CorrelationMatrix)?;
            match k {
                CorrelationKey::CorrelationType => {
                    matrix.set_correlation_type(match value.as_str(key)? {
                        "gaussian" => CorrelationType::Gaussian,
                        "copulas" => CorrelationType::Copulas,
                        _ => return Err(mismatch(key, "gaussian or copulas").into()),
                    })
                }
                _ => return Err(mismatch(key, "two stochast ids").into()),
            }
        }
        ObjectKind::SelfCorrelationMatrix => {
            let _: CorrelationKey = parse_key(kind, key)?;
            return Err(mismatch(key, "a stochast id").into());
        }
        ObjectKind::Settings => {
            let k: SettingsKey = parse_key(kind, key)?;
            let entries = match k {
                SettingsKey::StochastSettings => ids(engine, &value, key, ObjectKind::StochastSettings)?,
                _ => Vec::new(),
            };
            let object = payload!(mut engine, id, Settings)?;
            if k == SettingsKey::StochastSettings {
                object.stochast_settings = entries;
            } else if !set_reliability(&mut object.settings, k, &value, key)? {
                return Err(unknown(kind, key).into());
            }
        }
        ObjectKind::UncertaintySettings => {
            let k: SettingsKey = parse_key(kind, key)?;
            if !set_uncertainty(payload!(mut engine, id, UncertaintySettings)?, k, &value, key)? {
                return Err(unknown(kind, key).into());
            }
        }
        ObjectKind::SensitivitySettings => {
            let k: SettingsKey = parse_key(kind, key)?;
            if !set_sensitivity(payload!(mut engine, id, SensitivitySettings)?, k, &value, key)? {
                return Err(unknown(kind, key).into());
            }
        }
        ObjectKind::StochastSettings => {
            let k: StochastSettingsKey = parse_key(kind, key)?;
            let variable = match k {
                StochastSettingsKey::Variable => optional_id(engine, &value, key, ObjectKind::Stochast)?,
                _ => None,
            };
            let object = payload!(mut engine, id, StochastSettings)?;
            match k {
                StochastSettingsKey::Variable => object.variable = variable,
                _ => set_stochast_settings(&mut object.settings, k, &value, key)?,
            }
        }
        ObjectKind::LimitStateFunction => set_limit_state(engine, id, key, value)?,
        ObjectKind::Project | ObjectKind::UncertaintyProject | ObjectKind::SensitivityProject => {
            set_project(engine, id, key, value)?
        }
        ObjectKind::CombineProject => set_combine_project(engine, id, key, value)?,
        ObjectKind::LengthEffectProject => set_length_effect(engine, id, key, value)?,
        ObjectKind::DesignPoint => set_design_point(engine, id, key, value)?,
        ObjectKind::Alpha => set_alpha(engine, id, key, value)?,
        ObjectKind::Realization => {
            let _: RealizationKey = parse_key(kind, key)?;
            return Err(read_only(kind, key).into());
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Collections, pairs and evaluations
// ---------------------------------------------------------------------------

/// Messages of a project-like object or design point.
fn messages(engine: &Engine, id: i64, key: &str) -> Result<Option<Vec<String>>, ProtocolError> {
    if key != "messages" {
        return Ok(None);
    }
    let messages = match engine.object(id)? {
        Object::Project(p) => &p.messages,
        Object::CombineProject(p) => &p.messages,
        Object::LengthEffectProject(p) => &p.messages,
        Object::DesignPoint(d) => &d.point.messages,
        _ => return Ok(None),
    };
    Ok(Some(messages.iter().map(ToString::to_string).collect()))
}

fn project_list(engine: &Engine, id: i64, key: &str) -> Result<Option<ProjectList>, ProtocolError> {
    let Object::Project(object) = engine.object(id)? else {
        return Ok(None);
    };
    let Ok(k) = key.parse::<ProjectKey>() else {
        return Ok(None);
    };
    Ok(match k {
        ProjectKey::Outputs => Some(ProjectList::Names(sensitivity_outputs(object))),
        ProjectKey::Low
        | ProjectKey::Medium
        | ProjectKey::High
        | ProjectKey::FirstOrderIndex
        | ProjectKey::TotalIndex => Some(ProjectList::Values(sensitivity_values(object, k, 0)?)),
        _ => None,
    })
}

enum ProjectList {
    Names(Vec<String>),
    Values(Vec<f64>),
}

pub(crate) fn count(engine: &mut Engine, id: i64, key: &str) -> Result<usize, ProtocolError> {
    if let Some(messages) = messages(engine, id, key)? {
        return Ok(messages.len());
    }
    match project_list(engine, id, key)? {
        Some(ProjectList::Names(names)) => return Ok(names.len()),
        Some(ProjectList::Values(values)) => return Ok(values.len()),
        None => {}
    }
    match get(engine, id, key)? {
        Value::IntArray(values) => Ok(values.len()),
        Value::DoubleArray(values) => Ok(values.len()),
        _ => Err(mismatch(key, "a collection")),
    }
}

pub(crate) fn get_indexed(engine: &mut Engine, id: i64, key: &str, index: i64) -> Result<Value, ProtocolError> {
    if let Some(messages) = messages(engine, id, key)? {
        let i = position(key, index, messages.len())?;
        return Ok(messages[i].clone().into());
    }
    match project_list(engine, id, key)? {
        Some(ProjectList::Names(names)) => {
            let i = position(key, index, names.len())?;
            return Ok(names[i].clone().into());
        }
        Some(ProjectList::Values(values)) => {
            let i = position(key, index, values.len())?;
            return Ok(values[i].into());
        }
        None => {}
    }
    match engine.kind(id)? {
        ObjectKind::SelfCorrelationMatrix => {
            let _: CorrelationKey = parse_key(ObjectKind::SelfCorrelationMatrix, key)?;
            let stochast = stochast_id_of(engine, index)?;
            let matrix = payload!(engine, id, SelfCorrelationMatrix)?;
            Ok(matrix.get_self_correlation(stochast).unwrap_or(f64::NAN).into())
        }
        ObjectKind::LengthEffectProject if key == CombineKey::CorrelationLengths.name() => {
            let object = payload!(engine, id, LengthEffectProject)?;
            Ok(object
                .correlation_lengths
                .get(&index)
                .copied()
                .unwrap_or(f64::NAN)
                .into())
        }
        _ => element(get(engine, id, key)?, key, index),
    }
}

pub(crate) fn set_indexed(engine: &mut Engine, id: i64, key: &str, index: i64, value: Value) -> Result<(), Error> {
    match engine.kind(id)? {
        ObjectKind::SelfCorrelationMatrix => {
            let _: CorrelationKey = parse_key(ObjectKind::SelfCorrelationMatrix, key)?;
            let stochast = stochast_id_of(engine, index)?;
            let correlation = value.as_f64(key)?;
            payload!(mut engine, id, SelfCorrelationMatrix)?.set_self_correlation(stochast, correlation);
            Ok(())
        }
        ObjectKind::LengthEffectProject if key == CombineKey::CorrelationLengths.name() => {
            engine.expect_kind(index, ObjectKind::Stochast)?;
            let length = value.as_f64(key)?;
            payload!(mut engine, id, LengthEffectProject)?
                .correlation_lengths
                .insert(index, length);
            Ok(())
        }
        _ => {
            let mut values = get(engine, id, key)?;
            match &mut values {
                Value::IntArray(list) => {
                    let i = position(key, index, list.len())?;
                    list[i] = value.as_i64(key)?;
                }
                Value::DoubleArray(list) => {
                    let i = position(key, index, list.len())?;
                    list[i] = value.as_f64(key)?;
                }
                _ => return Err(mismatch(key, "an indexed property").into()),
            }
            set(engine, id, key, values)
        }
    }
}

/// Correlation or copula of a pair of stochast objects.
pub(crate) fn get_indexed2(engine: &Engine, id: i64, key: &str, first: i64, second: i64) -> Result<Value, ProtocolError> {
    let k: CorrelationKey = parse_key(engine.kind(id)?, key)?;
    let (a, b) = (stochast_id_of(engine, first)?, stochast_id_of(engine, second)?);
    let matrix = payload!(engine, id, CorrelationMatrix)?;
    Ok(match k {
        CorrelationKey::Correlation => matrix.get_correlation(a, b).into(),
        CorrelationKey::CorrelationType => return Err(mismatch(key, "no indices")),
        CorrelationKey::Clayton | CorrelationKey::Frank | CorrelationKey::Gumbel => {
            match matrix.copula(a, b) {
                Some((copula, parameter)) if copula.name() == key => parameter.into(),
                _ => f64::NAN.into(),
            }
        }
    })
}

pub(crate) fn set_indexed2(
    engine: &mut Engine,
    id: i64,
    key: &str,
    first: i64,
    second: i64,
    value: Value,
) -> Result<(), ProtocolError> {
    let k: CorrelationKey = parse_key(engine.kind(id)?, key)?;
    let (a, b) = (stochast_id_of(engine, first)?, stochast_id_of(engine, second)?);
    let v = value.as_f64(key)?;
    let matrix = payload!(mut engine, id, CorrelationMatrix)?;
    match k {
        CorrelationKey::Correlation => matrix.set_correlation(a, b, v),
        CorrelationKey::CorrelationType => return Err(mismatch(key, "no indices")),
        CorrelationKey::Clayton | CorrelationKey::Frank | CorrelationKey::Gumbel => {
            let copula = CopulaType::from_name(key).ok_or_else(|| mismatch(key, "a copula"))?;
            matrix.set_copula(a, b, copula, v);
        }
    }
    Ok(())
}

pub(crate) fn get_at(engine: &Engine, id: i64, key: &str, argument: f64) -> Result<f64, Error> {
    let k: StochastKey = parse_key(engine.kind(id)?, key)?;
    let s = stochast(engine, id)?;
    Ok(match k {
        StochastKey::Pdf => s.pdf(argument),
        StochastKey::Cdf => s.cdf(argument),
        StochastKey::XFromU => s.x_from_u(argument),
        StochastKey::UFromX => s.u_from_x(argument),
        StochastKey::Quantile => s.quantile(argument)?,
        _ => return Err(mismatch(key, "no argument").into()),
    })
}

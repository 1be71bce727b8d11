//! Random variables ("stochasts").
//!
//! A [`Stochast`] couples a [`DistributionType`] with its defining data:
//! scalar [`Parameters`] for the closed-form families, a table for the
//! empirical families, or weighted children for a composite mixture. Every
//! setter bumps a generation counter and drops the cached derived values
//! (tables, mean, deviation), which are rebuilt lazily on the next read.
//!
//! # Modifiers
//!
//! * **Truncation** restricts a closed-form family to `[minimum, maximum]`
//!   by rescaling its CDF over that interval.
//! * **Inversion** reflects the variable: `x' = 2c - x` with `c` the
//!   location (normal, deterministic), the shift (shifted families) or 0.
//!   Truncation applies to the un-reflected variable.
//! * **Conditional** variables interpolate their parameters linearly
//!   between [`ConditionalValue`] breakpoints as a function of another
//!   variable's realization, clamping outside the breakpoint range.
//! * **Arrays** expand into `array_size` scalar dimensions that share this
//!   definition or bind to `array_variables[i]`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::constants::{U_MAX, U_MIN};
use crate::distributions::empirical::EmpiricalTable;
use crate::distributions::fit::{fit, Fitted};
use crate::distributions::{
    closed_form, ConditionalValue, DiscreteValue, DistributionType, FragilityValue,
    HistogramValue, Parameter, Parameters,
};
use crate::error::DomainError;
use crate::roots::{invert_monotone, simpson};
use crate::standard_normal::{self, p_from_u, q_from_u, u_from_pq};
use crate::validation::ValidationReport;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a stochast.
///
/// Clones share the identity of their original; use
/// [`Stochast::duplicate`] for an independent copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StochastId(u64);

impl StochastId {
    fn next() -> Self {
        StochastId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl From<&Stochast> for StochastId {
    fn from(stochast: &Stochast) -> Self {
        stochast.id()
    }
}

/// Which of deviation and variation is kept when the mean changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstantParameter {
    #[default]
    Deviation,
    Variation,
}

/// A weighted member of a composite mixture.
#[derive(Debug, Clone)]
pub struct ContributingStochast {
    pub probability: f64,
    pub stochast: Stochast,
}

impl ContributingStochast {
    pub fn new(probability: f64, stochast: Stochast) -> Self {
        Self {
            probability,
            stochast,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Stochast {
    id: StochastId,
    name: String,
    distribution: DistributionType,
    params: Parameters,
    observations: usize,
    constant_parameter: ConstantParameter,
    variation: f64,
    inverted: bool,
    truncated: bool,
    design_fraction: f64,
    design_factor: f64,
    is_array: bool,
    array_size: usize,
    array_variables: Vec<Stochast>,
    conditional: bool,
    conditional_source: Option<StochastId>,
    conditional_values: Vec<ConditionalValue>,
    contributing_stochasts: Vec<ContributingStochast>,
    discrete_values: Vec<DiscreteValue>,
    histogram_values: Vec<HistogramValue>,
    fragility_values: Vec<FragilityValue>,
    generation: u64,
    table: OnceLock<EmpiricalTable>,
    moments: OnceLock<(f64, f64)>,
}

impl Default for Stochast {
    fn default() -> Self {
        Self::new("")
    }
}

impl Stochast {
    /// A deterministic variable at 0.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: StochastId::next(),
            name: name.into(),
            distribution: DistributionType::Deterministic,
            params: Parameters::default(),
            observations: 0,
            constant_parameter: ConstantParameter::Deviation,
            variation: 0.0,
            inverted: false,
            truncated: false,
            design_fraction: 0.5,
            design_factor: 1.0,
            is_array: false,
            array_size: 1,
            array_variables: Vec::new(),
            conditional: false,
            conditional_source: None,
            conditional_values: Vec::new(),
            contributing_stochasts: Vec::new(),
            discrete_values: Vec::new(),
            histogram_values: Vec::new(),
            fragility_values: Vec::new(),
            generation: 0,
            table: OnceLock::new(),
            moments: OnceLock::new(),
        }
    }

    pub fn with_distribution(name: impl Into<String>, distribution: DistributionType) -> Self {
        let mut s = Self::new(name);
        s.distribution = distribution;
        s
    }

    pub fn deterministic(name: impl Into<String>, value: f64) -> Self {
        let mut s = Self::new(name);
        s.params.location = value;
        s
    }

    pub fn normal(name: impl Into<String>, mean: f64, deviation: f64) -> Self {
        let mut s = Self::with_distribution(name, DistributionType::Normal);
        s.params.location = mean;
        s.params.scale = deviation;
        s
    }

    pub fn uniform(name: impl Into<String>, minimum: f64, maximum: f64) -> Self {
        let mut s = Self::with_distribution(name, DistributionType::Uniform);
        s.params.minimum = minimum;
        s.params.maximum = maximum;
        s
    }

    pub fn discrete(name: impl Into<String>, values: Vec<DiscreteValue>) -> Self {
        let mut s = Self::with_distribution(name, DistributionType::Discrete);
        s.discrete_values = values;
        s
    }

    /// Copy with a fresh identity.
    pub fn duplicate(&self) -> Self {
        let mut copy = self.clone();
        copy.id = StochastId::next();
        copy
    }

    fn touch(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.table = OnceLock::new();
        self.moments = OnceLock::new();
    }

    pub fn id(&self) -> StochastId {
        self.id
    }

    /// Counter bumped by every mutation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn distribution(&self) -> DistributionType {
        self.distribution
    }

    pub fn set_distribution(&mut self, distribution: DistributionType) {
        self.distribution = distribution;
        self.touch();
    }

    // ----- scalar parameters -------------------------------------------------

    /// Parameters in use by the active family (including the truncation
    /// bounds when truncated).
    pub fn used_parameters(&self) -> Vec<Parameter> {
        let mut used = self.distribution.parameters().to_vec();
        if self.is_truncation_active() {
            for p in [Parameter::Minimum, Parameter::Maximum] {
                if !used.contains(&p) {
                    used.push(p);
                }
            }
        }
        used
    }

    /// Value of a parameter, NaN when the active family does not use it.
    pub fn parameter(&self, parameter: Parameter) -> f64 {
        if self.used_parameters().contains(&parameter) {
            self.params.get(parameter)
        } else {
            f64::NAN
        }
    }

    /// Store a parameter value; it takes effect once a family uses it.
    pub fn set_parameter(&mut self, parameter: Parameter, value: f64) {
        self.params.set(parameter, value);
        self.touch();
    }

    /// All stored parameter values, used or not.
    pub fn parameters(&self) -> &Parameters {
        &self.params
    }

    pub fn location(&self) -> f64 {
        self.parameter(Parameter::Location)
    }
    pub fn set_location(&mut self, value: f64) {
        self.set_parameter(Parameter::Location, value);
    }
    pub fn scale(&self) -> f64 {
        self.parameter(Parameter::Scale)
    }
    pub fn set_scale(&mut self, value: f64) {
        self.set_parameter(Parameter::Scale, value);
    }
    pub fn shift(&self) -> f64 {
        self.parameter(Parameter::Shift)
    }
    pub fn set_shift(&mut self, value: f64) {
        self.set_parameter(Parameter::Shift, value);
    }
    pub fn shift_b(&self) -> f64 {
        self.parameter(Parameter::ShiftB)
    }
    pub fn set_shift_b(&mut self, value: f64) {
        self.set_parameter(Parameter::ShiftB, value);
    }
    pub fn minimum(&self) -> f64 {
        self.parameter(Parameter::Minimum)
    }
    pub fn set_minimum(&mut self, value: f64) {
        self.set_parameter(Parameter::Minimum, value);
    }
    pub fn maximum(&self) -> f64 {
        self.parameter(Parameter::Maximum)
    }
    pub fn set_maximum(&mut self, value: f64) {
        self.set_parameter(Parameter::Maximum, value);
    }
    pub fn shape(&self) -> f64 {
        self.parameter(Parameter::Shape)
    }
    pub fn set_shape(&mut self, value: f64) {
        self.set_parameter(Parameter::Shape, value);
    }
    pub fn shape_b(&self) -> f64 {
        self.parameter(Parameter::ShapeB)
    }
    pub fn set_shape_b(&mut self, value: f64) {
        self.set_parameter(Parameter::ShapeB, value);
    }

    /// Rate of an exponential variable (`1 / scale`), NaN for other families.
    pub fn rate(&self) -> f64 {
        if self.distribution == DistributionType::Exponential {
            1.0 / self.params.scale
        } else {
            f64::NAN
        }
    }

    pub fn set_rate(&mut self, rate: f64) {
        self.set_parameter(Parameter::Scale, 1.0 / rate);
    }

    /// Number of values the last fit used.
    pub fn observations(&self) -> usize {
        self.observations
    }

    pub fn set_observations(&mut self, observations: usize) {
        self.observations = observations;
    }

    // ----- moments -----------------------------------------------------------

    pub fn mean(&self) -> f64 {
        self.moments().0
    }

    pub fn deviation(&self) -> f64 {
        self.moments().1
    }

    /// Coefficient of variation `deviation / |mean|`.
    pub fn variation(&self) -> f64 {
        let (mean, deviation) = self.moments();
        deviation / mean.abs()
    }

    pub fn constant_parameter(&self) -> ConstantParameter {
        self.constant_parameter
    }

    pub fn set_constant_parameter(&mut self, constant: ConstantParameter) {
        if constant == ConstantParameter::Variation {
            self.variation = self.variation();
        }
        self.constant_parameter = constant;
    }

    /// Set the mean of the untruncated, un-reflected family.
    ///
    /// The deviation is preserved, or the variation when
    /// [`ConstantParameter::Variation`] is active.
    pub fn set_mean(&mut self, mean: f64) {
        let deviation = match self.constant_parameter {
            ConstantParameter::Deviation => self.base_moments().1,
            ConstantParameter::Variation => self.variation * mean.abs(),
        };
        self.apply_moments(mean, deviation);
    }

    pub fn set_deviation(&mut self, deviation: f64) {
        self.constant_parameter = ConstantParameter::Deviation;
        let mean = self.base_moments().0;
        self.apply_moments(mean, deviation);
    }

    pub fn set_variation(&mut self, variation: f64) {
        self.constant_parameter = ConstantParameter::Variation;
        self.variation = variation;
        let mean = self.base_moments().0;
        self.apply_moments(mean, variation * mean.abs());
    }

    fn base_moments(&self) -> (f64, f64) {
        if self.distribution.is_closed_form() {
            closed_form::moments(self.distribution, &self.params)
        } else {
            self.moments()
        }
    }

    fn apply_moments(&mut self, mean: f64, deviation: f64) {
        if self.distribution.is_closed_form() {
            closed_form::set_moments(self.distribution, &mut self.params, mean, deviation);
        } else {
            tracing::debug!(
                "{}: moments of a {} distribution follow from its data",
                self.name,
                self.distribution
            );
        }
        self.touch();
    }

    fn moments(&self) -> (f64, f64) {
        *self.moments.get_or_init(|| self.compute_moments())
    }

    fn compute_moments(&self) -> (f64, f64) {
        use DistributionType::*;
        match self.distribution {
            Composite => {
                let total = self.contributing_total();
                if total <= 0.0 {
                    return (f64::NAN, f64::NAN);
                }
                let mut mean = 0.0;
                let mut second = 0.0;
                for c in &self.contributing_stochasts {
                    let w = c.probability / total;
                    let (m, s) = c.stochast.moments();
                    mean += w * m;
                    second += w * (s * s + m * m);
                }
                (mean, (second - mean * mean).max(0.0).sqrt())
            }
            _ if self.is_truncation_active() => self.numeric_moments(),
            _ => {
                let (mean, deviation) = if self.distribution.is_closed_form() {
                    closed_form::moments(self.distribution, &self.params)
                } else {
                    self.table().moments()
                };
                if self.is_inversion_active() {
                    (2.0 * self.reflection_center(&self.params) - mean, deviation)
                } else {
                    (mean, deviation)
                }
            }
        }
    }

    fn numeric_moments(&self) -> (f64, f64) {
        let n = 1600;
        let weight = simpson(standard_normal::pdf, U_MIN, U_MAX, n);
        let mean = simpson(|u| self.x_from_u(u) * standard_normal::pdf(u), U_MIN, U_MAX, n) / weight;
        let var = simpson(
            |u| (self.x_from_u(u) - mean).powi(2) * standard_normal::pdf(u),
            U_MIN,
            U_MAX,
            n,
        ) / weight;
        (mean, var.max(0.0).sqrt())
    }

    // ----- modifiers ---------------------------------------------------------

    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    pub fn set_inverted(&mut self, inverted: bool) {
        self.inverted = inverted;
        self.touch();
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn set_truncated(&mut self, truncated: bool) {
        self.truncated = truncated;
        self.touch();
    }

    fn is_truncation_active(&self) -> bool {
        self.truncated && self.distribution.can_truncate()
    }

    fn is_inversion_active(&self) -> bool {
        self.inverted && self.distribution.can_invert()
    }

    fn reflection_center(&self, params: &Parameters) -> f64 {
        use DistributionType::*;
        match self.distribution {
            Deterministic | Normal => params.location,
            LogNormal | Triangular | Trapezoidal | Exponential | Gumbel | Weibull | Frechet
            | Gev | Rayleigh | GeneralizedPareto | Gamma => params.shift,
            _ => 0.0,
        }
    }

    // ----- design value ------------------------------------------------------

    pub fn design_fraction(&self) -> f64 {
        self.design_fraction
    }

    pub fn set_design_fraction(&mut self, fraction: f64) {
        self.design_fraction = fraction;
    }

    pub fn design_factor(&self) -> f64 {
        self.design_factor
    }

    pub fn set_design_factor(&mut self, factor: f64) {
        self.design_factor = factor;
    }

    /// Quantile at `design_fraction` divided by `design_factor`.
    pub fn design_value(&self) -> f64 {
        let u = standard_normal::u_from_p_unchecked(self.design_fraction);
        self.x_from_u(u) / self.design_factor
    }

    // ----- arrays ------------------------------------------------------------

    pub fn is_array(&self) -> bool {
        self.is_array
    }

    pub fn set_is_array(&mut self, is_array: bool) {
        self.is_array = is_array;
        self.touch();
    }

    pub fn array_size(&self) -> usize {
        self.array_size
    }

    pub fn set_array_size(&mut self, size: usize) {
        self.array_size = size;
        self.touch();
    }

    pub fn array_variables(&self) -> &[Stochast] {
        &self.array_variables
    }

    pub fn set_array_variables(&mut self, variables: Vec<Stochast>) {
        self.array_variables = variables;
        self.touch();
    }

    /// Number of scalar dimensions this variable occupies.
    pub fn size(&self) -> usize {
        if self.is_array {
            self.array_size
        } else {
            1
        }
    }

    /// Definition used for array element `index`.
    pub fn element(&self, index: usize) -> &Stochast {
        if self.is_array && !self.array_variables.is_empty() {
            let i = index.min(self.array_variables.len() - 1);
            &self.array_variables[i]
        } else {
            self
        }
    }

    // ----- conditional -------------------------------------------------------

    pub fn is_conditional(&self) -> bool {
        self.conditional
    }

    pub fn set_conditional(&mut self, conditional: bool) {
        self.conditional = conditional;
        self.touch();
    }

    pub fn conditional_source(&self) -> Option<StochastId> {
        self.conditional_source
    }

    pub fn set_conditional_source(&mut self, source: Option<StochastId>) {
        self.conditional_source = source;
        self.touch();
    }

    pub fn conditional_values(&self) -> &[ConditionalValue] {
        &self.conditional_values
    }

    pub fn set_conditional_values(&mut self, values: Vec<ConditionalValue>) {
        self.conditional_values = values;
        self.touch();
    }

    pub fn add_conditional_value(&mut self, value: ConditionalValue) {
        self.conditional_values.push(value);
        self.touch();
    }

    /// Fill unset (NaN) breakpoint parameters with this variable's own values.
    pub fn initialize_conditional_values(&mut self) {
        let used = self.used_parameters();
        let own = self.params;
        for cv in &mut self.conditional_values {
            for &p in &used {
                if cv.parameters.get(p).is_nan() {
                    cv.parameters.set(p, own.get(p));
                }
            }
        }
        self.touch();
    }

    /// Parameters interpolated at a source realization.
    pub fn conditional_parameters(&self, source_x: f64) -> Parameters {
        let mut params = self.params;
        if !self.conditional || self.conditional_values.is_empty() {
            return params;
        }
        for p in self.used_parameters() {
            let mut points: Vec<(f64, f64)> = self
                .conditional_values
                .iter()
                .map(|cv| (cv.x, cv.parameters.get(p)))
                .filter(|(x, v)| !x.is_nan() && !v.is_nan())
                .collect();
            if points.is_empty() {
                continue;
            }
            points.sort_by(|a, b| a.0.total_cmp(&b.0));
            params.set(p, interpolate_clamped(&points, source_x));
        }
        params
    }

    // ----- tables and mixtures -----------------------------------------------

    pub fn discrete_values(&self) -> &[DiscreteValue] {
        &self.discrete_values
    }

    pub fn set_discrete_values(&mut self, values: Vec<DiscreteValue>) {
        self.discrete_values = values;
        self.touch();
    }

    pub fn add_discrete_value(&mut self, value: DiscreteValue) {
        self.discrete_values.push(value);
        self.touch();
    }

    pub fn remove_discrete_value(&mut self, index: usize) -> Option<DiscreteValue> {
        if index >= self.discrete_values.len() {
            return None;
        }
        let removed = self.discrete_values.remove(index);
        self.touch();
        Some(removed)
    }

    pub fn histogram_values(&self) -> &[HistogramValue] {
        &self.histogram_values
    }

    pub fn set_histogram_values(&mut self, values: Vec<HistogramValue>) {
        self.histogram_values = values;
        self.touch();
    }

    pub fn add_histogram_value(&mut self, value: HistogramValue) {
        self.histogram_values.push(value);
        self.touch();
    }

    pub fn fragility_values(&self) -> &[FragilityValue] {
        &self.fragility_values
    }

    pub fn set_fragility_values(&mut self, values: Vec<FragilityValue>) {
        self.fragility_values = values;
        self.touch();
    }

    pub fn add_fragility_value(&mut self, value: FragilityValue) {
        self.fragility_values.push(value);
        self.touch();
    }

    pub fn contributing_stochasts(&self) -> &[ContributingStochast] {
        &self.contributing_stochasts
    }

    pub fn set_contributing_stochasts(&mut self, values: Vec<ContributingStochast>) {
        self.contributing_stochasts = values;
        self.touch();
    }

    pub fn add_contributing_stochast(&mut self, value: ContributingStochast) {
        self.contributing_stochasts.push(value);
        self.touch();
    }

    fn contributing_total(&self) -> f64 {
        self.contributing_stochasts
            .iter()
            .map(|c| c.probability.max(0.0))
            .sum()
    }

    fn table(&self) -> &EmpiricalTable {
        self.table.get_or_init(|| match self.distribution {
            DistributionType::Discrete | DistributionType::Qualitative => {
                EmpiricalTable::points(&self.discrete_values)
            }
            DistributionType::Histogram => EmpiricalTable::bins(&self.histogram_values),
            DistributionType::CdfCurve => EmpiricalTable::curve(&self.fragility_values),
            _ => EmpiricalTable::Empty,
        })
    }

    // ----- evaluation --------------------------------------------------------

    fn raw_probabilities(&self, params: &Parameters, x: f64) -> (f64, f64) {
        if self.distribution.is_closed_form() {
            closed_form::probabilities(self.distribution, params, x)
        } else {
            self.table().probabilities(x)
        }
    }

    fn raw_x_from_u(&self, params: &Parameters, u: f64) -> f64 {
        if self.distribution.is_closed_form() {
            closed_form::x_from_u(self.distribution, params, u)
        } else {
            self.table().x_from_p(p_from_u(u))
        }
    }

    fn raw_pdf(&self, params: &Parameters, x: f64) -> f64 {
        if self.distribution.is_closed_form() {
            closed_form::pdf(self.distribution, params, x)
        } else {
            self.table().pdf(x)
        }
    }

    fn probabilities_with(&self, params: &Parameters, x: f64) -> (f64, f64) {
        if self.distribution == DistributionType::Composite {
            return self.mixture_probabilities(x);
        }
        let inverted = self.is_inversion_active();
        let xb = if inverted {
            2.0 * self.reflection_center(params) - x
        } else {
            x
        };
        let (p, q) = if self.is_truncation_active() {
            if xb <= params.minimum {
                (0.0, 1.0)
            } else if xb >= params.maximum {
                (1.0, 0.0)
            } else {
                let (p_min, q_min) = self.raw_probabilities(params, params.minimum);
                let (p_max, q_max) = self.raw_probabilities(params, params.maximum);
                let (p, q) = self.raw_probabilities(params, xb);
                let mass = (p_max - p_min).max(q_min - q_max);
                if mass <= 0.0 {
                    (0.5, 0.5)
                } else {
                    ((p - p_min) / mass, (q - q_max) / mass)
                }
            }
        } else {
            self.raw_probabilities(params, xb)
        };
        if inverted {
            (q, p)
        } else {
            (p, q)
        }
    }

    fn x_from_u_with(&self, params: &Parameters, u: f64) -> f64 {
        if self.distribution == DistributionType::Composite {
            return self.mixture_x_from_u(u);
        }
        let inverted = self.is_inversion_active();
        let ub = if inverted { -u } else { u };
        let x = if self.is_truncation_active() {
            let (p_min, q_min) = self.raw_probabilities(params, params.minimum);
            let (p_max, q_max) = self.raw_probabilities(params, params.maximum);
            let p = p_min + p_from_u(ub) * (p_max - p_min);
            let q = q_max + q_from_u(ub) * (q_min - q_max);
            self.raw_x_from_u(params, u_from_pq(p, q))
                .clamp(params.minimum, params.maximum)
        } else {
            self.raw_x_from_u(params, ub)
        };
        if inverted {
            2.0 * self.reflection_center(params) - x
        } else {
            x
        }
    }

    fn pdf_with(&self, params: &Parameters, x: f64) -> f64 {
        if self.distribution == DistributionType::Composite {
            let total = self.contributing_total();
            return self
                .contributing_stochasts
                .iter()
                .map(|c| c.probability.max(0.0) / total * c.stochast.pdf(x))
                .sum();
        }
        let xb = if self.is_inversion_active() {
            2.0 * self.reflection_center(params) - x
        } else {
            x
        };
        if self.is_truncation_active() {
            if xb < params.minimum || xb > params.maximum {
                return 0.0;
            }
            let (p_min, q_min) = self.raw_probabilities(params, params.minimum);
            let (p_max, q_max) = self.raw_probabilities(params, params.maximum);
            let mass = (p_max - p_min).max(q_min - q_max);
            if mass <= 0.0 {
                return 0.0;
            }
            self.raw_pdf(params, xb) / mass
        } else {
            self.raw_pdf(params, xb)
        }
    }

    fn mixture_probabilities(&self, x: f64) -> (f64, f64) {
        let total = self.contributing_total();
        if total <= 0.0 {
            return (f64::NAN, f64::NAN);
        }
        self.contributing_stochasts
            .iter()
            .fold((0.0, 0.0), |(p, q), c| {
                let w = c.probability.max(0.0) / total;
                let (pc, qc) = c.stochast.probabilities(x);
                (p + w * pc, q + w * qc)
            })
    }

    fn mixture_x_from_u(&self, u: f64) -> f64 {
        let children = &self.contributing_stochasts;
        if children.is_empty() {
            return f64::NAN;
        }
        if children.len() == 1 {
            return children[0].stochast.x_from_u(u);
        }
        let (lo, hi) = children
            .iter()
            .map(|c| c.stochast.x_from_u(u))
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| {
                (lo.min(x), hi.max(x))
            });
        if lo >= hi {
            return lo;
        }
        let p = p_from_u(u);
        if p <= 0.5 {
            invert_monotone(|x| self.mixture_probabilities(x).0, p, lo, hi, 1e-12)
        } else {
            invert_monotone(|x| -self.mixture_probabilities(x).1, -q_from_u(u), lo, hi, 1e-12)
        }
    }

    /// `(P(X <= x), P(X > x))`.
    pub fn probabilities(&self, x: f64) -> (f64, f64) {
        self.probabilities_with(&self.params, x)
    }

    /// Cumulative distribution `P(X <= x)`.
    pub fn cdf(&self, x: f64) -> f64 {
        self.probabilities(x).0
    }

    /// Density, or probability mass for discrete families.
    pub fn pdf(&self, x: f64) -> f64 {
        self.pdf_with(&self.params, x)
    }

    /// Physical value for a standard normal value.
    pub fn x_from_u(&self, u: f64) -> f64 {
        self.x_from_u_with(&self.params, u)
    }

    /// Standard normal value for a physical value.
    pub fn u_from_x(&self, x: f64) -> f64 {
        let (p, q) = self.probabilities(x);
        u_from_pq(p, q)
    }

    /// Inverse CDF.
    pub fn quantile(&self, p: f64) -> Result<f64, DomainError> {
        let u = standard_normal::u_from_p(p)?;
        Ok(self.x_from_u(u))
    }

    /// `x_from_u` with parameters interpolated at the source realization.
    pub fn x_from_u_and_source(&self, u: f64, source_x: f64) -> f64 {
        if !self.conditional || !self.distribution.is_closed_form() {
            return self.x_from_u(u);
        }
        let params = self.conditional_parameters(source_x);
        self.x_from_u_with(&params, u)
    }

    /// `u_from_x` with parameters interpolated at the source realization.
    pub fn u_from_x_and_source(&self, x: f64, source_x: f64) -> f64 {
        if !self.conditional || !self.distribution.is_closed_form() {
            return self.u_from_x(x);
        }
        let params = self.conditional_parameters(source_x);
        let (p, q) = self.probabilities_with(&params, x);
        u_from_pq(p, q)
    }

    /// Breakpoints where the density or CDF is not smooth, sorted ascending.
    pub fn special_values(&self) -> Vec<f64> {
        let mut values = match self.distribution {
            DistributionType::Composite => self
                .contributing_stochasts
                .iter()
                .flat_map(|c| c.stochast.special_values())
                .collect(),
            kind if kind.is_closed_form() => {
                let mut v = closed_form::special_values(kind, &self.params);
                if self.is_truncation_active() {
                    v.push(self.params.minimum);
                    v.push(self.params.maximum);
                }
                v
            }
            _ => self.table().special_values(),
        };
        if self.is_inversion_active() {
            let c = self.reflection_center(&self.params);
            values.iter_mut().for_each(|v| *v = 2.0 * c - *v);
        }
        values.retain(|v| v.is_finite());
        values.sort_by(f64::total_cmp);
        values.dedup();
        values
    }

    // ----- fitting -----------------------------------------------------------

    /// Estimate the active family's parameters from a sample.
    pub fn fit(&mut self, values: &[f64]) -> Result<(), DomainError> {
        self.fit_inner(values, None)
    }

    /// As [`Stochast::fit`] with the shift parameter pinned.
    pub fn fit_with_shift(&mut self, values: &[f64], shift: f64) -> Result<(), DomainError> {
        self.fit_inner(values, Some(shift))
    }

    fn fit_inner(&mut self, values: &[f64], shift: Option<f64>) -> Result<(), DomainError> {
        let fitted = fit(self.distribution, &self.params, values, shift).ok_or_else(|| {
            DomainError::InvalidArgument(format!(
                "cannot fit a {} distribution to {} values",
                self.distribution,
                values.len()
            ))
        })?;
        match fitted {
            Fitted::Parameters(params) => self.params = params,
            Fitted::Discrete(points) => self.discrete_values = points,
            Fitted::Histogram(bins) => self.histogram_values = bins,
        }
        self.observations = values.len();
        self.touch();
        tracing::debug!("fitted {} to {} values", self.name, values.len());
        Ok(())
    }

    /// Kolmogorov-Smirnov distance between the sample and this distribution.
    pub fn ks_statistic(&self, values: &[f64]) -> f64 {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if sorted.is_empty() {
            return f64::NAN;
        }
        sorted.sort_by(f64::total_cmp);
        let n = sorted.len() as f64;
        sorted
            .iter()
            .enumerate()
            .map(|(i, &x)| {
                let f = self.cdf(x);
                (f - i as f64 / n).abs().max(((i + 1) as f64 / n - f).abs())
            })
            .fold(0.0, f64::max)
    }

    // ----- validation --------------------------------------------------------

    pub fn is_valid(&self) -> bool {
        self.validate().is_valid()
    }

    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::new();
        self.validate_into(&mut report);
        report
    }

    /// Append this variable's findings to `report`.
    pub fn validate_into(&self, report: &mut ValidationReport) {
        use DistributionType::*;
        let name = self.name.as_str();
        match self.distribution {
            kind if kind.is_closed_form() => {
                closed_form::validate(kind, &self.params, name, report);
            }
            Discrete | Qualitative => {
                if self.discrete_values.is_empty() {
                    report.error(name, "no discrete values defined");
                }
                for v in &self.discrete_values {
                    report.check_at_least(name, "amount", v.amount, 0.0);
                }
                let total: f64 = self.discrete_values.iter().map(|v| v.amount).sum();
                if !self.discrete_values.is_empty() && total <= 0.0 {
                    report.error(name, "sum of amounts should be greater than 0");
                }
            }
            Histogram => {
                if self.histogram_values.is_empty() {
                    report.error(name, "no histogram values defined");
                }
                for v in &self.histogram_values {
                    report.check_at_least(name, "upper_bound", v.upper_bound, v.lower_bound);
                    report.check_at_least(name, "amount", v.amount, 0.0);
                }
                let total: f64 = self.histogram_values.iter().map(|v| v.amount).sum();
                if !self.histogram_values.is_empty() && total <= 0.0 {
                    report.error(name, "sum of amounts should be greater than 0");
                }
            }
            CdfCurve => {
                if self.fragility_values.is_empty() {
                    report.error(name, "no fragility values defined");
                }
                let mut sorted = self.fragility_values.clone();
                sorted.sort_by(|a, b| a.x.total_cmp(&b.x));
                if sorted
                    .windows(2)
                    .any(|w| w[1].reliability_index < w[0].reliability_index)
                {
                    report.error(name, "reliability indices should not decrease with x");
                }
            }
            Composite => {
                if self.contributing_stochasts.is_empty() {
                    report.error(name, "no contributing stochasts defined");
                }
                for c in &self.contributing_stochasts {
                    report.check_at_least(name, "probability", c.probability, 0.0);
                    c.stochast.validate_into(report);
                }
                let total = self.contributing_total();
                if !self.contributing_stochasts.is_empty() && (total - 1.0).abs() > 1e-6 {
                    report.warning(
                        name,
                        format!("probabilities sum to {total} and are normalized"),
                    );
                }
            }
            _ => {}
        }

        if self.is_truncation_active() {
            report.check_greater(name, "maximum", self.params.maximum, self.params.minimum);
        }
        if self.inverted && !self.distribution.can_invert() {
            report.warning(
                name,
                format!("a {} distribution cannot be inverted", self.distribution),
            );
        }
        if self.is_array {
            if self.array_size < 1 {
                report.error(name, "array size should be at least 1");
            }
            if !self.array_variables.is_empty() {
                if self.array_variables.len() != self.array_size {
                    report.error(
                        name,
                        format!(
                            "{} array variables defined for array size {}",
                            self.array_variables.len(),
                            self.array_size
                        ),
                    );
                }
                for v in &self.array_variables {
                    v.validate_into(report);
                }
            }
        }
        if self.conditional {
            if self.conditional_source.is_none() {
                report.error(name, "conditional source is not set");
            }
            if self.conditional_values.is_empty() {
                report.error(name, "no conditional values defined");
            }
            if self.distribution.is_closed_form() {
                for cv in &self.conditional_values {
                    let params = self.conditional_parameters(cv.x);
                    closed_form::validate(self.distribution, &params, name, report);
                }
            }
        }
    }
}

/// Linear interpolation through sorted points, clamped at both ends.
fn interpolate_clamped(points: &[(f64, f64)], x: f64) -> f64 {
    let n = points.len();
    if x <= points[0].0 {
        return points[0].1;
    }
    if x >= points[n - 1].0 {
        return points[n - 1].1;
    }
    let i = points.partition_point(|(px, _)| *px <= x).saturating_sub(1);
    let (x0, y0) = points[i];
    let (x1, y1) = points[i + 1];
    if x1 > x0 {
        y0 + (y1 - y0) * (x - x0) / (x1 - x0)
    } else {
        y1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discrete_mean_and_removal() {
        let mut s = Stochast::discrete(
            "d",
            vec![DiscreteValue::new(2.0, 1.0), DiscreteValue::new(3.0, 3.0)],
        );
        assert!((s.mean() - 2.75).abs() < 1e-12);
        s.remove_discrete_value(0);
        assert_eq!(s.mean(), 3.0);
    }

    #[test]
    fn test_setter_invalidates_cache() {
        let mut s = Stochast::normal("n", 1.0, 2.0);
        assert_eq!(s.mean(), 1.0);
        let generation = s.generation();
        s.set_location(5.0);
        assert!(s.generation() > generation);
        assert_eq!(s.mean(), 5.0);
    }

    #[test]
    fn test_unused_parameter_reads_nan() {
        let mut s = Stochast::new("a");
        s.set_scale(-1.0);
        assert!(s.scale().is_nan());
        assert!(s.is_valid());
        s.set_distribution(DistributionType::Normal);
        assert_eq!(s.scale(), -1.0);
        assert!(!s.is_valid());
        let report = s.validate();
        assert_eq!(report.len(), 1);
        assert!(report.messages()[0].to_string().contains("-1"));
    }

    #[test]
    fn test_set_mean_keeps_deviation_or_variation() {
        let mut s = Stochast::normal("n", 10.0, 2.0);
        s.set_mean(20.0);
        assert!((s.deviation() - 2.0).abs() < 1e-12);
        s.set_variation(0.1);
        assert!((s.deviation() - 2.0).abs() < 1e-12);
        s.set_mean(30.0);
        assert!((s.deviation() - 3.0).abs() < 1e-12);
        assert!((s.variation() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_truncated_normal_stays_in_bounds() {
        let mut s = Stochast::normal("t", 0.0, 1.0);
        s.set_minimum(-1.0);
        s.set_maximum(2.0);
        s.set_truncated(true);
        for u in [-8.0, -3.0, 0.0, 3.0, 8.0] {
            let x = s.x_from_u(u);
            assert!((-1.0..=2.0).contains(&x), "x = {x}");
        }
        assert!((s.cdf(-1.0)).abs() < 1e-12);
        assert!((s.cdf(2.0) - 1.0).abs() < 1e-12);
        let x = s.x_from_u(0.4);
        assert!((s.u_from_x(x) - 0.4).abs() < 1e-8);
    }

    #[test]
    fn test_inverted_reflects_about_location() {
        let mut s = Stochast::with_distribution("g", DistributionType::Gumbel);
        s.set_shift(10.0);
        s.set_scale(2.0);
        let plain = s.x_from_u(1.5);
        s.set_inverted(true);
        let reflected = s.x_from_u(-1.5);
        assert!((reflected - (20.0 - plain)).abs() < 1e-12);
        assert!((s.u_from_x(reflected) + 1.5).abs() < 1e-8);
        let mean_plain = 10.0 + crate::constants::EULER_GAMMA * 2.0;
        assert!((s.mean() - (20.0 - mean_plain)).abs() < 1e-9);
    }

    #[test]
    fn test_composite_mixture_inverse() {
        let mut s = Stochast::with_distribution("c", DistributionType::Composite);
        s.add_contributing_stochast(ContributingStochast::new(0.5, Stochast::normal("a", 0.0, 1.0)));
        s.add_contributing_stochast(ContributingStochast::new(0.5, Stochast::normal("b", 10.0, 1.0)));
        assert!((s.mean() - 5.0).abs() < 1e-12);
        for u in [-2.0, -0.5, 0.5, 2.0] {
            let x = s.x_from_u(u);
            assert!((s.u_from_x(x) - u).abs() < 1e-6, "u = {u}");
        }
    }

    #[test]
    fn test_conditional_interpolation_clamps() {
        let mut s = Stochast::normal("c", 0.0, 1.0);
        s.set_conditional(true);
        s.add_conditional_value(ConditionalValue::new(0.0).with(Parameter::Location, 0.0));
        s.add_conditional_value(ConditionalValue::new(10.0).with(Parameter::Location, 100.0));
        s.initialize_conditional_values();
        assert!((s.x_from_u_and_source(0.0, 5.0) - 50.0).abs() < 1e-12);
        assert!((s.x_from_u_and_source(0.0, 20.0) - 100.0).abs() < 1e-12);
        assert!((s.x_from_u_and_source(1.0, -5.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_array_elements() {
        let mut s = Stochast::normal("arr", 0.0, 1.0);
        s.set_is_array(true);
        s.set_array_size(3);
        assert_eq!(s.size(), 3);
        assert_eq!(s.element(2).id(), s.id());
        s.set_array_variables(vec![
            Stochast::deterministic("e0", 1.0),
            Stochast::deterministic("e1", 2.0),
        ]);
        assert!(!s.is_valid());
        assert_eq!(s.element(1).x_from_u(0.0), 2.0);
    }

    #[test]
    fn test_fit_normal() {
        let mut s = Stochast::with_distribution("f", DistributionType::Normal);
        s.fit(&[4.1, 4.2, 4.4, 4.5]).unwrap();
        assert!((s.mean() - 4.3).abs() < 1e-12);
        assert!((s.deviation() - 0.18).abs() < 0.01);
        assert_eq!(s.observations(), 4);
        assert!(s.ks_statistic(&[4.1, 4.2, 4.4, 4.5]) < 0.3);
    }

    #[test]
    fn test_design_value() {
        let mut s = Stochast::normal("r", 100.0, 10.0);
        s.set_design_fraction(0.05);
        s.set_design_factor(1.2);
        let expected = (100.0 - 16.448_536_269_514_72) / 1.2;
        assert!((s.design_value() - expected).abs() < 1e-6);
    }

    #[test]
    fn test_special_values_sorted() {
        let s = Stochast::uniform("u", 2.0, -1.0);
        assert_eq!(s.special_values(), vec![-1.0, 2.0]);
        assert!(!s.is_valid());
    }

    #[test]
    fn test_duplicate_has_new_identity() {
        let s = Stochast::normal("n", 0.0, 1.0);
        assert_eq!(s.clone().id(), s.id());
        assert_ne!(s.duplicate().id(), s.id());
    }
}

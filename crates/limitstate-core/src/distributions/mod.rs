//! Distribution kinds and their parameters.
//!
//! Closed-form families are evaluated by [`closed_form`] from a flat
//! [`Parameters`] record; tabulated families (histogram, cdf curve,
//! discrete, qualitative) by [`empirical`]. Mixtures are handled by the
//! owning [`crate::Stochast`].

pub(crate) mod closed_form;
pub(crate) mod empirical;
pub(crate) mod fit;

use serde::{Deserialize, Serialize};

/// Distribution family of a [`crate::Stochast`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionType {
    #[default]
    Deterministic,
    Normal,
    LogNormal,
    Uniform,
    Triangular,
    Trapezoidal,
    Exponential,
    Gumbel,
    Weibull,
    Frechet,
    Gev,
    Rayleigh,
    Pareto,
    GeneralizedPareto,
    Beta,
    Gamma,
    Bernoulli,
    Poisson,
    Histogram,
    CdfCurve,
    Discrete,
    Qualitative,
    Composite,
}

use DistributionType::*;

const ALL: [DistributionType; 23] = [
    Deterministic,
    Normal,
    LogNormal,
    Uniform,
    Triangular,
    Trapezoidal,
    Exponential,
    Gumbel,
    Weibull,
    Frechet,
    Gev,
    Rayleigh,
    Pareto,
    GeneralizedPareto,
    Beta,
    Gamma,
    Bernoulli,
    Poisson,
    Histogram,
    CdfCurve,
    Discrete,
    Qualitative,
    Composite,
];

impl DistributionType {
    pub fn all() -> &'static [DistributionType] {
        &ALL
    }

    pub fn name(&self) -> &'static str {
        match self {
            Deterministic => "deterministic",
            Normal => "normal",
            LogNormal => "log_normal",
            Uniform => "uniform",
            Triangular => "triangular",
            Trapezoidal => "trapezoidal",
            Exponential => "exponential",
            Gumbel => "gumbel",
            Weibull => "weibull",
            Frechet => "frechet",
            Gev => "gev",
            Rayleigh => "rayleigh",
            Pareto => "pareto",
            GeneralizedPareto => "generalized_pareto",
            Beta => "beta",
            Gamma => "gamma",
            Bernoulli => "bernoulli",
            Poisson => "poisson",
            Histogram => "histogram",
            CdfCurve => "cdf_curve",
            Discrete => "discrete",
            Qualitative => "qualitative",
            Composite => "composite",
        }
    }

    /// Parse a snake_case name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.to_ascii_lowercase();
        ALL.iter().copied().find(|d| d.name() == name)
    }

    /// Parameters that define this family.
    pub fn parameters(&self) -> &'static [Parameter] {
        use Parameter as P;
        match self {
            Deterministic | Bernoulli | Poisson => &[P::Location],
            Normal => &[P::Location, P::Scale],
            LogNormal => &[P::Location, P::Scale, P::Shift],
            Uniform => &[P::Minimum, P::Maximum],
            Triangular => &[P::Minimum, P::Shift, P::Maximum],
            Trapezoidal => &[P::Minimum, P::Shift, P::ShiftB, P::Maximum],
            Exponential | Rayleigh => &[P::Scale, P::Shift],
            Gumbel => &[P::Shift, P::Scale],
            Weibull | Frechet | Gamma => &[P::Scale, P::Shape, P::Shift],
            Gev | GeneralizedPareto => &[P::Shift, P::Scale, P::Shape],
            Pareto => &[P::Scale, P::Shape],
            Beta => &[P::Shape, P::ShapeB, P::Minimum, P::Maximum],
            Histogram | CdfCurve | Discrete | Qualitative | Composite => &[],
        }
    }

    pub fn uses(&self, parameter: Parameter) -> bool {
        self.parameters().contains(&parameter)
    }

    /// Defined by scalar parameters (not tables or mixtures).
    pub fn is_closed_form(&self) -> bool {
        !matches!(self, Histogram | CdfCurve | Discrete | Qualitative | Composite)
    }

    /// Support consists of isolated points.
    pub fn is_discrete(&self) -> bool {
        matches!(self, Deterministic | Bernoulli | Poisson | Discrete | Qualitative)
    }

    /// Families with an unbounded or one-sided support that can be cut to
    /// `[minimum, maximum]`.
    pub fn can_truncate(&self) -> bool {
        matches!(
            self,
            Normal
                | LogNormal
                | Exponential
                | Gumbel
                | Weibull
                | Frechet
                | Gev
                | Rayleigh
                | Pareto
                | GeneralizedPareto
                | Gamma
        )
    }

    pub fn can_invert(&self) -> bool {
        !matches!(self, Composite | Qualitative)
    }

    /// Families for which `fit` is supported.
    pub fn can_fit(&self) -> bool {
        !matches!(self, CdfCurve | Composite | Bernoulli)
    }
}

impl std::fmt::Display for DistributionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Name of a scalar distribution parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parameter {
    Location,
    Scale,
    Shift,
    ShiftB,
    Minimum,
    Maximum,
    Shape,
    ShapeB,
}

impl Parameter {
    pub const ALL: [Parameter; 8] = [
        Parameter::Location,
        Parameter::Scale,
        Parameter::Shift,
        Parameter::ShiftB,
        Parameter::Minimum,
        Parameter::Maximum,
        Parameter::Shape,
        Parameter::ShapeB,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Parameter::Location => "location",
            Parameter::Scale => "scale",
            Parameter::Shift => "shift",
            Parameter::ShiftB => "shift_b",
            Parameter::Minimum => "minimum",
            Parameter::Maximum => "maximum",
            Parameter::Shape => "shape",
            Parameter::ShapeB => "shape_b",
        }
    }
}

/// Flat record of every scalar parameter; each family reads its own subset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    pub location: f64,
    pub scale: f64,
    pub shift: f64,
    pub shift_b: f64,
    pub minimum: f64,
    pub maximum: f64,
    pub shape: f64,
    pub shape_b: f64,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            location: 0.0,
            scale: 1.0,
            shift: 0.0,
            shift_b: 0.0,
            minimum: 0.0,
            maximum: 1.0,
            shape: 1.0,
            shape_b: 1.0,
        }
    }
}

impl Parameters {
    pub fn get(&self, parameter: Parameter) -> f64 {
        match parameter {
            Parameter::Location => self.location,
            Parameter::Scale => self.scale,
            Parameter::Shift => self.shift,
            Parameter::ShiftB => self.shift_b,
            Parameter::Minimum => self.minimum,
            Parameter::Maximum => self.maximum,
            Parameter::Shape => self.shape,
            Parameter::ShapeB => self.shape_b,
        }
    }

    pub fn set(&mut self, parameter: Parameter, value: f64) {
        let slot = match parameter {
            Parameter::Location => &mut self.location,
            Parameter::Scale => &mut self.scale,
            Parameter::Shift => &mut self.shift,
            Parameter::ShiftB => &mut self.shift_b,
            Parameter::Minimum => &mut self.minimum,
            Parameter::Maximum => &mut self.maximum,
            Parameter::Shape => &mut self.shape,
            Parameter::ShapeB => &mut self.shape_b,
        };
        *slot = value;
    }
}

/// One point of a discrete or qualitative distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiscreteValue {
    pub x: f64,
    /// Relative weight; amounts are normalized by their sum.
    pub amount: f64,
}

impl DiscreteValue {
    pub fn new(x: f64, amount: f64) -> Self {
        Self { x, amount }
    }
}

/// One bin of a histogram distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramValue {
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub amount: f64,
}

impl HistogramValue {
    pub fn new(lower_bound: f64, upper_bound: f64, amount: f64) -> Self {
        Self {
            lower_bound,
            upper_bound,
            amount,
        }
    }
}

/// A point `(x, β)` of a cdf curve: `P(X <= x) = Φ(β)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FragilityValue {
    pub x: f64,
    pub reliability_index: f64,
}

impl FragilityValue {
    pub fn new(x: f64, reliability_index: f64) -> Self {
        Self {
            x,
            reliability_index,
        }
    }

    /// Non-exceedance probability `Φ(β)`.
    pub fn probability(&self) -> f64 {
        crate::standard_normal::p_from_u(self.reliability_index)
    }
}

/// Parameter values of a conditional stochast at one source value.
///
/// Parameters left as NaN fall back to the stochast's own value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConditionalValue {
    pub x: f64,
    pub parameters: Parameters,
}

impl ConditionalValue {
    /// Breakpoint at `x` with every parameter unset.
    pub fn new(x: f64) -> Self {
        Self {
            x,
            parameters: Parameters {
                location: f64::NAN,
                scale: f64::NAN,
                shift: f64::NAN,
                shift_b: f64::NAN,
                minimum: f64::NAN,
                maximum: f64::NAN,
                shape: f64::NAN,
                shape_b: f64::NAN,
            },
        }
    }

    pub fn with(mut self, parameter: Parameter, value: f64) -> Self {
        self.parameters.set(parameter, value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for kind in DistributionType::all() {
            assert_eq!(DistributionType::from_name(kind.name()), Some(*kind));
        }
        assert_eq!(DistributionType::from_name("LOG_NORMAL"), Some(LogNormal));
        assert_eq!(DistributionType::from_name("student_t"), None);
    }

    #[test]
    fn test_used_parameters() {
        assert!(Normal.uses(Parameter::Scale));
        assert!(!Uniform.uses(Parameter::Scale));
        assert!(Discrete.parameters().is_empty());
    }
}

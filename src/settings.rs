//! Solver settings.
//!
//! Each solver has one settings struct with sensible defaults, chained
//! builder methods and a `validate` pass that reports bad values the same
//! way variable validation does. All of them round-trip through JSON.

use std::collections::BTreeMap;

use limitstate_core::{RandomSettings, RandomType, StochastId, ValidationReport};
use serde::{Deserialize, Serialize};

/// Declares a unit enum with a stable snake_case name per variant.
macro_rules! named_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn name(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.name() == s)
                    .ok_or_else(|| format!("unknown {} '{}'", stringify!($name), s))
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

pub(crate) use named_enum;

named_enum! {
    /// Algorithm computing a design point.
    pub enum ReliabilityMethod {
        Form => "form",
        CrudeMonteCarlo => "crude_monte_carlo",
        ImportanceSampling => "importance_sampling",
        DirectionalSampling => "directional_sampling",
        NumericalIntegration => "numerical_integration",
        NumericalBisection => "numerical_bisection",
        LatinHypercube => "latin_hypercube",
        Cobyla => "cobyla_reliability",
        FormThenDirectionalSampling => "form_then_directional_sampling",
        DirectionalSamplingThenForm => "directional_sampling_then_form",
    }
}

named_enum! {
    /// Starting point of the FORM search.
    pub enum StartMethod {
        FixedValue => "fixed_value",
        One => "one",
        RaySearch => "ray_search",
        SphereSearch => "sphere_search",
        SensitivitySearch => "sensitivity_search",
    }
}

named_enum! {
    /// How several failing realizations or local design points are reduced
    /// to one reported point.
    pub enum DesignPointMethod {
        NearestToMean => "nearest_to_mean",
        CenterOfGravity => "center_of_gravity",
        CenterOfAngles => "center_of_angles",
    }
}

named_enum! {
    /// Finite-difference scheme.
    pub enum GradientType {
        Single => "single",
        Double => "double",
    }
}

named_enum! {
    /// Algorithm propagating input uncertainty to the outputs.
    pub enum UncertaintyMethod {
        CrudeMonteCarlo => "crude_monte_carlo",
        ImportanceSampling => "importance_sampling",
        NumericalIntegration => "numerical_integration",
        Fosm => "fosm",
        Form => "form",
        DirectionalSampling => "directional_sampling",
    }
}

named_enum! {
    /// Algorithm ranking input influence on an output.
    pub enum SensitivityMethod {
        SingleVariation => "single_variation",
        Sobol => "sobol",
    }
}

named_enum! {
    /// Algorithm combining linearized failure modes.
    pub enum CombinerMethod {
        DirectionalSampling => "directional_sampling",
        ImportanceSampling => "importance_sampling",
    }
}

named_enum! {
    /// Union or intersection of failure events.
    pub enum CombineType {
        Series => "series",
        Parallel => "parallel",
    }
}

impl Default for ReliabilityMethod {
    fn default() -> Self {
        ReliabilityMethod::Form
    }
}

impl Default for StartMethod {
    fn default() -> Self {
        StartMethod::FixedValue
    }
}

impl Default for DesignPointMethod {
    fn default() -> Self {
        DesignPointMethod::CenterOfGravity
    }
}

impl Default for GradientType {
    fn default() -> Self {
        GradientType::Single
    }
}

/// Per-variable search and integration settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StochastSettings {
    /// Lower bound in u-space for grids and bisection.
    pub min_value: f64,
    /// Upper bound in u-space for grids and bisection.
    pub max_value: f64,
    /// Start value in u-space (FORM fixed start, importance sampling centre).
    pub start_value: f64,
    /// Standard deviation of the importance sampling density in u-space.
    pub variance_factor: f64,
    /// Grid cells per dimension for numerical integration.
    pub intervals: usize,
    /// Whether the importance sampling centre may move away from `start_value`.
    pub is_initialization_allowed: bool,
    /// Whether `variance_factor` is applied.
    pub is_variance_allowed: bool,
}

impl Default for StochastSettings {
    fn default() -> Self {
        Self {
            min_value: -8.0,
            max_value: 8.0,
            start_value: 0.0,
            variance_factor: 1.5,
            intervals: 50,
            is_initialization_allowed: true,
            is_variance_allowed: true,
        }
    }
}

impl StochastSettings {
    fn validate_into(&self, subject: &str, report: &mut ValidationReport) {
        if self.min_value >= self.max_value {
            report.error(
                subject,
                format!(
                    "min value {} should be less than max value {}",
                    self.min_value, self.max_value
                ),
            );
        }
        report.check_greater(subject, "variance factor", self.variance_factor, 0.0);
        if self.intervals == 0 {
            report.error(subject, "intervals should be at least 1");
        }
    }
}

/// Settings of the reliability solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReliabilitySettings {
    pub reliability_method: ReliabilityMethod,
    pub start_method: StartMethod,
    pub design_point_method: DesignPointMethod,

    // Stopping criteria
    pub minimum_samples: usize,
    pub maximum_samples: usize,
    pub minimum_iterations: usize,
    pub maximum_iterations: usize,
    pub minimum_directions: usize,
    pub maximum_directions: usize,
    /// Target coefficient of variation of the failure probability estimate.
    pub variation_coefficient: f64,
    /// FORM convergence tolerance on β.
    pub epsilon_beta: f64,

    // FORM
    pub relaxation_factor: f64,
    pub relaxation_loops: usize,
    pub gradient_type: GradientType,
    pub gradient_step: f64,
    pub all_quadrants: bool,
    pub max_steps_sphere_search: usize,

    // Importance sampling
    /// Stop adapting the sampling centre once this fraction of samples fails.
    pub fraction_failed: f64,
    /// Number of adaptation loops.
    pub maximum_loops: usize,

    // Directional sampling
    /// Step length of the line search along a direction.
    pub du: f64,
    /// Largest radius searched along a direction.
    pub maximum_length: f64,
    /// Root tolerance along a direction.
    pub epsilon_u: f64,

    pub batch_size: usize,
    pub random: RandomSettings,
    pub max_parallel_processes: usize,
    pub save_realizations: bool,

    /// Settings applied to variables without an explicit entry.
    pub default_stochast_settings: StochastSettings,
    #[serde(skip)]
    pub stochast_settings: BTreeMap<StochastId, StochastSettings>,
}

impl Default for ReliabilitySettings {
    fn default() -> Self {
        Self {
            reliability_method: ReliabilityMethod::Form,
            start_method: StartMethod::FixedValue,
            design_point_method: DesignPointMethod::CenterOfGravity,

            minimum_samples: 1_000,
            maximum_samples: 10_000,
            minimum_iterations: 5,
            maximum_iterations: 50,
            minimum_directions: 1_000,
            maximum_directions: 10_000,
            variation_coefficient: 0.05,
            epsilon_beta: 0.01,

            relaxation_factor: 0.75,
            relaxation_loops: 3,
            gradient_type: GradientType::Single,
            gradient_step: 0.3,
            all_quadrants: false,
            max_steps_sphere_search: 5,

            fraction_failed: 0.1,
            maximum_loops: 5,

            du: 1.0,
            maximum_length: 20.0,
            epsilon_u: 0.01,

            batch_size: 1_000,
            random: RandomSettings::default(),
            max_parallel_processes: 1,
            save_realizations: false,

            default_stochast_settings: StochastSettings::default(),
            stochast_settings: BTreeMap::new(),
        }
    }
}

impl ReliabilitySettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create settings for one method with default values otherwise.
    pub fn with_method(method: ReliabilityMethod) -> Self {
        Self {
            reliability_method: method,
            ..Default::default()
        }
    }

    // =========================================================================
    // Builder methods
    // =========================================================================

    pub fn reliability_method(mut self, method: ReliabilityMethod) -> Self {
        self.reliability_method = method;
        self
    }

    pub fn start_method(mut self, method: StartMethod) -> Self {
        self.start_method = method;
        self
    }

    pub fn design_point_method(mut self, method: DesignPointMethod) -> Self {
        self.design_point_method = method;
        self
    }

    pub fn samples(mut self, minimum: usize, maximum: usize) -> Self {
        self.minimum_samples = minimum;
        self.maximum_samples = maximum;
        self
    }

    pub fn iterations(mut self, minimum: usize, maximum: usize) -> Self {
        self.minimum_iterations = minimum;
        self.maximum_iterations = maximum;
        self
    }

    pub fn directions(mut self, minimum: usize, maximum: usize) -> Self {
        self.minimum_directions = minimum;
        self.maximum_directions = maximum;
        self
    }

    pub fn variation_coefficient(mut self, value: f64) -> Self {
        self.variation_coefficient = value;
        self
    }

    pub fn epsilon_beta(mut self, value: f64) -> Self {
        self.epsilon_beta = value;
        self
    }

    pub fn relaxation(mut self, factor: f64, loops: usize) -> Self {
        self.relaxation_factor = factor;
        self.relaxation_loops = loops;
        self
    }

    pub fn gradient_type(mut self, gradient_type: GradientType) -> Self {
        self.gradient_type = gradient_type;
        self
    }

    pub fn random_type(mut self, random_type: RandomType) -> Self {
        self.random.random_type = random_type;
        self
    }

    /// Set a seed and make runs repeatable.
    pub fn seed(mut self, seed: u64) -> Self {
        self.random.seed = seed;
        self.random.is_repeatable = true;
        self
    }

    pub fn max_parallel_processes(mut self, processes: usize) -> Self {
        self.max_parallel_processes = processes;
        self
    }

    pub fn save_realizations(mut self, save: bool) -> Self {
        self.save_realizations = save;
        self
    }

    /// Settings for one variable.
    pub fn stochast_setting(mut self, variable: impl Into<StochastId>, settings: StochastSettings) -> Self {
        self.stochast_settings.insert(variable.into(), settings);
        self
    }

    /// Settings in effect for a variable.
    pub fn stochast_settings_for(&self, variable: StochastId) -> StochastSettings {
        self.stochast_settings
            .get(&variable)
            .copied()
            .unwrap_or(self.default_stochast_settings)
    }

    /// Check the settings, reporting every problem under the subject "Settings".
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::new();
        let subject = "Settings";
        if self.minimum_samples > self.maximum_samples {
            report.error(subject, "minimum samples is greater than maximum samples");
        }
        if self.maximum_samples == 0 {
            report.error(subject, "maximum samples should be at least 1");
        }
        if self.minimum_iterations > self.maximum_iterations {
            report.error(subject, "minimum iterations is greater than maximum iterations");
        }
        if self.minimum_directions > self.maximum_directions {
            report.error(subject, "minimum directions is greater than maximum directions");
        }
        report.check_greater(subject, "variation coefficient", self.variation_coefficient, 0.0);
        report.check_greater(subject, "epsilon beta", self.epsilon_beta, 0.0);
        report.check_greater(subject, "relaxation factor", self.relaxation_factor, 0.0);
        report.check_at_most(subject, "relaxation factor", self.relaxation_factor, 1.0);
        report.check_greater(subject, "gradient step", self.gradient_step, 0.0);
        report.check_greater(subject, "fraction failed", self.fraction_failed, 0.0);
        report.check_at_most(subject, "fraction failed", self.fraction_failed, 1.0);
        report.check_greater(subject, "du", self.du, 0.0);
        report.check_greater(subject, "maximum length", self.maximum_length, 0.0);
        report.check_greater(subject, "epsilon u", self.epsilon_u, 0.0);
        if self.batch_size == 0 {
            report.error(subject, "batch size should be at least 1");
        }
        self.default_stochast_settings.validate_into(subject, &mut report);
        for settings in self.stochast_settings.values() {
            settings.validate_into(subject, &mut report);
        }
        report
    }
}

/// Settings of the uncertainty solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UncertaintySettings {
    pub uncertainty_method: UncertaintyMethod,
    pub minimum_samples: usize,
    pub maximum_samples: usize,
    pub minimum_directions: usize,
    pub maximum_directions: usize,
    pub variation_coefficient: f64,
    /// Output probabilities to report as quantiles.
    pub quantiles: Vec<f64>,
    /// Derive the sample count from `variation_coefficient` and the most
    /// extreme requested quantile.
    pub derive_samples_from_variation_coefficient: bool,
    pub calculate_correlations: bool,
    pub calculate_input_correlations: bool,
    /// Output thresholds traced by the FORM and directional sampling methods.
    pub thresholds: Vec<f64>,
    pub gradient_step: f64,
    /// Cells of the output histogram.
    pub histogram_bins: usize,
    pub batch_size: usize,
    pub random: RandomSettings,
    pub max_parallel_processes: usize,
    /// Settings of the reliability runs behind the FORM method.
    pub reliability: ReliabilitySettings,
}

impl Default for UncertaintySettings {
    fn default() -> Self {
        Self {
            uncertainty_method: UncertaintyMethod::CrudeMonteCarlo,
            minimum_samples: 1_000,
            maximum_samples: 10_000,
            minimum_directions: 1_000,
            maximum_directions: 10_000,
            variation_coefficient: 0.05,
            quantiles: Vec::new(),
            derive_samples_from_variation_coefficient: false,
            calculate_correlations: true,
            calculate_input_correlations: false,
            thresholds: Vec::new(),
            gradient_step: 0.3,
            histogram_bins: 100,
            batch_size: 1_000,
            random: RandomSettings::default(),
            max_parallel_processes: 1,
            reliability: ReliabilitySettings::default(),
        }
    }
}

impl UncertaintySettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_method(method: UncertaintyMethod) -> Self {
        Self {
            uncertainty_method: method,
            ..Default::default()
        }
    }

    pub fn samples(mut self, minimum: usize, maximum: usize) -> Self {
        self.minimum_samples = minimum;
        self.maximum_samples = maximum;
        self
    }

    pub fn quantiles(mut self, quantiles: Vec<f64>) -> Self {
        self.quantiles = quantiles;
        self
    }

    pub fn thresholds(mut self, thresholds: Vec<f64>) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.random.seed = seed;
        self.random.is_repeatable = true;
        self
    }

    pub fn max_parallel_processes(mut self, processes: usize) -> Self {
        self.max_parallel_processes = processes;
        self
    }

    /// Number of samples to draw.
    ///
    /// With `derive_samples_from_variation_coefficient` the count follows
    /// from the most extreme requested quantile `q` as
    /// `(1 - q) / (q * vc²)`, clamped to the sample bounds; otherwise it is
    /// `maximum_samples`.
    pub fn sample_count(&self) -> usize {
        if !self.derive_samples_from_variation_coefficient {
            return self.maximum_samples;
        }
        let q = self
            .quantiles
            .iter()
            .map(|&q| q.min(1.0 - q))
            .filter(|q| *q > 0.0)
            .fold(0.5, f64::min);
        let n = (1.0 - q) / (q * self.variation_coefficient.powi(2));
        (n.ceil() as usize)
            .max(self.minimum_samples)
            .min(self.maximum_samples)
    }

    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::new();
        let subject = "Settings";
        if self.minimum_samples > self.maximum_samples {
            report.error(subject, "minimum samples is greater than maximum samples");
        }
        if self.maximum_samples == 0 {
            report.error(subject, "maximum samples should be at least 1");
        }
        report.check_greater(subject, "variation coefficient", self.variation_coefficient, 0.0);
        for &q in &self.quantiles {
            report.check_greater(subject, "quantile", q, 0.0);
            if q >= 1.0 {
                report.error(subject, format!("quantile value {q} should be less than 1"));
            }
        }
        if self.histogram_bins == 0 {
            report.error(subject, "histogram bins should be at least 1");
        }
        let traces_thresholds = matches!(
            self.uncertainty_method,
            UncertaintyMethod::Form | UncertaintyMethod::DirectionalSampling
        );
        if traces_thresholds && self.thresholds.len() < 2 {
            report.error(
                subject,
                format!("{} needs at least two thresholds", self.uncertainty_method),
            );
        }
        report.extend(self.reliability.validate());
        report
    }
}

/// Settings of the sensitivity solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensitivitySettings {
    pub sensitivity_method: SensitivityMethod,
    /// Probability of the low value in a single variation sweep.
    pub low_probability: f64,
    /// Probability of the high value in a single variation sweep.
    pub high_probability: f64,
    /// Base samples of the Sobol estimator.
    pub maximum_samples: usize,
    pub random: RandomSettings,
    pub max_parallel_processes: usize,
}

impl Default for SensitivitySettings {
    fn default() -> Self {
        Self {
            sensitivity_method: SensitivityMethod::SingleVariation,
            low_probability: 0.05,
            high_probability: 0.95,
            maximum_samples: 10_000,
            random: RandomSettings::default(),
            max_parallel_processes: 1,
        }
    }
}

impl SensitivitySettings {
    pub fn with_method(method: SensitivityMethod) -> Self {
        Self {
            sensitivity_method: method,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::new();
        let subject = "Settings";
        report.check_greater(subject, "low probability", self.low_probability, 0.0);
        report.check_at_most(subject, "high probability", self.high_probability, 1.0);
        if self.low_probability >= self.high_probability {
            report.error(subject, "low probability should be less than high probability");
        }
        if self.maximum_samples < 2 {
            report.error(subject, "maximum samples should be at least 2");
        }
        report
    }
}

/// Settings of the failure mode combiner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombineSettings {
    pub combiner_method: CombinerMethod,
    pub combine_type: CombineType,
    pub minimum_samples: usize,
    pub maximum_samples: usize,
    pub minimum_directions: usize,
    pub maximum_directions: usize,
    pub variation_coefficient: f64,
    pub random: RandomSettings,
}

impl Default for CombineSettings {
    fn default() -> Self {
        Self {
            combiner_method: CombinerMethod::DirectionalSampling,
            combine_type: CombineType::Series,
            minimum_samples: 10_000,
            maximum_samples: 100_000,
            minimum_directions: 2_000,
            maximum_directions: 20_000,
            variation_coefficient: 0.02,
            random: RandomSettings::default(),
        }
    }
}

impl CombineSettings {
    pub fn new(combiner_method: CombinerMethod, combine_type: CombineType) -> Self {
        Self {
            combiner_method,
            combine_type,
            ..Default::default()
        }
    }

    /// Reliability settings that drive the combiner's inner sampling run.
    pub(crate) fn reliability_settings(&self) -> ReliabilitySettings {
        let method = match self.combiner_method {
            CombinerMethod::DirectionalSampling => ReliabilityMethod::DirectionalSampling,
            CombinerMethod::ImportanceSampling => ReliabilityMethod::ImportanceSampling,
        };
        ReliabilitySettings {
            reliability_method: method,
            minimum_samples: self.minimum_samples,
            maximum_samples: self.maximum_samples,
            minimum_directions: self.minimum_directions,
            maximum_directions: self.maximum_directions,
            variation_coefficient: self.variation_coefficient,
            random: self.random,
            maximum_loops: 1,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> ValidationReport {
        let mut report = self.reliability_settings().validate();
        if self.maximum_samples == 0 || self.maximum_directions == 0 {
            report.error("Settings", "combiner needs at least one sample");
        }
        report
    }
}

/// Settings of the length effect upscaling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LengthEffectSettings {
    /// Total length of the section being upscaled.
    pub length: f64,
    /// Length of one cross-section.
    pub section_length: f64,
    pub combine: CombineSettings,
}

impl Default for LengthEffectSettings {
    fn default() -> Self {
        Self {
            length: 1.0,
            section_length: 1.0,
            combine: CombineSettings::default(),
        }
    }
}

impl LengthEffectSettings {
    pub fn validate(&self) -> ValidationReport {
        let mut report = self.combine.validate();
        report.check_greater("Settings", "length", self.length, 0.0);
        report.check_greater("Settings", "section length", self.section_length, 0.0);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = ReliabilitySettings::default();
        assert_eq!(settings.reliability_method, ReliabilityMethod::Form);
        assert_eq!(settings.maximum_iterations, 50);
        assert_eq!(settings.epsilon_beta, 0.01);
        assert_eq!(settings.gradient_step, 0.3);
        assert_eq!(settings.max_parallel_processes, 1);
        assert!(settings.validate().is_valid());
    }

    #[test]
    fn test_builder_methods() {
        let settings = ReliabilitySettings::new()
            .reliability_method(ReliabilityMethod::CrudeMonteCarlo)
            .samples(100, 5_000)
            .seed(42)
            .max_parallel_processes(4);
        assert_eq!(settings.reliability_method, ReliabilityMethod::CrudeMonteCarlo);
        assert_eq!(settings.minimum_samples, 100);
        assert_eq!(settings.maximum_samples, 5_000);
        assert_eq!(settings.random.seed, 42);
        assert_eq!(settings.max_parallel_processes, 4);
    }

    #[test]
    fn test_validation() {
        let settings = ReliabilitySettings::new().samples(10, 5);
        let report = settings.validate();
        assert!(!report.is_valid());
        assert_eq!(
            report.messages()[0].to_string(),
            "Error: Settings => minimum samples is greater than maximum samples"
        );

        let settings = ReliabilitySettings::new().relaxation(1.5, 3);
        assert!(!settings.validate().is_valid());
    }

    #[test]
    fn test_method_names() {
        for method in ReliabilityMethod::ALL {
            assert_eq!(method.name().parse::<ReliabilityMethod>().unwrap(), *method);
        }
        assert_eq!(
            "directional_sampling_then_form".parse::<ReliabilityMethod>().unwrap(),
            ReliabilityMethod::DirectionalSamplingThenForm
        );
        assert!("simulated_annealing".parse::<ReliabilityMethod>().is_err());
    }

    #[test]
    fn test_settings_json() {
        let settings = ReliabilitySettings::with_method(ReliabilityMethod::DirectionalSampling);
        let json = serde_json::to_string(&settings).unwrap();
        assert!(json.contains("\"directional_sampling\""));
        let back: ReliabilitySettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, settings);

        let partial: ReliabilitySettings =
            serde_json::from_str(r#"{"reliability_method": "latin_hypercube"}"#).unwrap();
        assert_eq!(partial.reliability_method, ReliabilityMethod::LatinHypercube);
        assert_eq!(partial.maximum_samples, 10_000);
    }

    #[test]
    fn test_stochast_settings_fallback() {
        let a = limitstate_core::Stochast::normal("a", 0.0, 1.0);
        let custom = StochastSettings {
            intervals: 10,
            ..Default::default()
        };
        let settings = ReliabilitySettings::new().stochast_setting(&a, custom);
        assert_eq!(settings.stochast_settings_for(a.id()).intervals, 10);
        let b = limitstate_core::Stochast::normal("b", 0.0, 1.0);
        assert_eq!(settings.stochast_settings_for(b.id()).intervals, 50);
    }
}

//! Projects: variables, correlations and a model bound together.
//!
//! [`ModelProject`] holds what every analysis needs. The model's declared
//! inputs determine the variables: setting a model creates one
//! deterministic variable per input (at the input's default value), which
//! the caller then turns into random variables. [`Project`] adds the
//! reliability settings and the resulting design point.
//!
//! Running an invalid project is not an error: every validation message is
//! kept in `messages()`, errors are printed to stderr one per line, and the
//! result stays `None`.

use std::ops::{Deref, DerefMut};

use limitstate_core::{
    CorrelationMatrix, SelfCorrelationMatrix, SpaceTransform, Stochast, StochastId,
    ValidationMessage, ValidationReport,
};
use tracing::warn;

use crate::error::ModelError;
use crate::model::{Evaluator, LimitStateFunction, ModelAdapter, Response, ZModel};
use crate::reliability::{self, numerical_bisection, numerical_integration, DesignPoint};
use crate::settings::{ReliabilityMethod, ReliabilitySettings};

/// Largest grid numerical integration accepts.
const MAX_GRID_POINTS: usize = 10_000_000;

/// Report an error when the numerical integration grid is too large.
pub(crate) fn check_grid(
    transform: &SpaceTransform,
    settings: &ReliabilitySettings,
    report: &mut ValidationReport,
) {
    let intervals: Vec<usize> = transform
        .u_dimensions()
        .iter()
        .map(|&d| settings.stochast_settings_for(transform.variable(d).id()).intervals)
        .collect();
    let points = numerical_integration::grid_size(&intervals);
    if points.map_or(true, |p| p > MAX_GRID_POINTS) {
        report.error(
            "Settings",
            format!("numerical integration grid exceeds {MAX_GRID_POINTS} points"),
        );
    }
}

/// Variables, correlations and model shared by all analyses.
#[derive(Debug, Default)]
pub struct ModelProject {
    variables: Vec<Stochast>,
    correlation: CorrelationMatrix,
    self_correlation: SelfCorrelationMatrix,
    model: Option<ModelAdapter>,
    limit_state_function: Option<LimitStateFunction>,
    output: Option<(String, usize)>,
    messages: Vec<ValidationMessage>,
}

/// Transform and response of a validated project.
pub(crate) struct Prepared {
    pub transform: SpaceTransform,
    pub response: Response,
}

impl ModelProject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a model, creating one variable per declared input.
    pub fn set_model(&mut self, evaluator: impl Evaluator + 'static) {
        self.set_model_adapter(ModelAdapter::new(evaluator));
    }

    pub fn set_model_adapter(&mut self, adapter: ModelAdapter) {
        self.variables = adapter
            .input_parameters()
            .iter()
            .map(|p| {
                let mut variable = Stochast::deterministic(p.name.clone(), p.default_value);
                if p.is_array {
                    variable.set_is_array(true);
                    variable.set_array_size(p.array_size);
                }
                variable
            })
            .collect();
        self.model = Some(adapter);
    }

    pub fn model(&self) -> Option<&ModelAdapter> {
        self.model.as_ref()
    }

    pub fn model_mut(&mut self) -> Option<&mut ModelAdapter> {
        self.model.as_mut()
    }

    /// Variables in model input order.
    pub fn variables(&self) -> &[Stochast] {
        &self.variables
    }

    pub fn variable(&self, name: &str) -> Option<&Stochast> {
        self.variables.iter().find(|v| v.name() == name)
    }

    pub fn variable_mut(&mut self, name: &str) -> Option<&mut Stochast> {
        self.variables.iter_mut().find(|v| v.name() == name)
    }

    pub fn variable_id(&self, name: &str) -> Option<StochastId> {
        self.variable(name).map(Stochast::id)
    }

    /// Replace the variable bound to the input of the same name.
    ///
    /// Returns false when the model has no such input.
    pub fn set_variable(&mut self, stochast: Stochast) -> bool {
        match self.variables.iter_mut().find(|v| v.name() == stochast.name()) {
            Some(slot) => {
                *slot = stochast;
                true
            }
            None => false,
        }
    }

    pub fn correlation_matrix(&self) -> &CorrelationMatrix {
        &self.correlation
    }

    pub fn correlation_matrix_mut(&mut self) -> &mut CorrelationMatrix {
        &mut self.correlation
    }

    pub fn self_correlation_matrix(&self) -> &SelfCorrelationMatrix {
        &self.self_correlation
    }

    pub fn self_correlation_matrix_mut(&mut self) -> &mut SelfCorrelationMatrix {
        &mut self.self_correlation
    }

    pub fn limit_state_function(&self) -> Option<&LimitStateFunction> {
        self.limit_state_function.as_ref()
    }

    pub fn set_limit_state_function(&mut self, limit_state: Option<LimitStateFunction>) {
        self.limit_state_function = limit_state;
    }

    /// Output used as z when no limit-state function is set.
    pub fn set_output(&mut self, name: impl Into<String>, index: usize) {
        self.output = Some((name.into(), index));
    }

    /// Messages of the last validation or run.
    pub fn messages(&self) -> &[ValidationMessage] {
        &self.messages
    }

    pub fn clear_validate(&mut self) {
        self.messages.clear();
    }

    /// Set every conditional variable's missing breakpoint parameters.
    pub fn initialize_conditional_values(&mut self) {
        for v in &mut self.variables {
            if v.is_conditional() {
                v.initialize_conditional_values();
            }
        }
    }

    pub(crate) fn prepare(&self) -> Result<Prepared, ValidationReport> {
        let mut report = ValidationReport::new();
        let Some(model) = &self.model else {
            report.error("Project", "model is not set");
            return Err(report);
        };
        if self.variables.is_empty() {
            report.error("Project", "no variables");
        }
        for (variable, parameter) in self.variables.iter().zip(model.input_parameters()) {
            variable.validate_into(&mut report);
            if variable.size() != parameter.size() {
                report.error(
                    variable.name(),
                    format!(
                        "array size {} does not match model input size {}",
                        variable.size(),
                        parameter.size()
                    ),
                );
            }
        }
        self.correlation.validate_into(&mut report);
        self.self_correlation.validate_into(&mut report);

        let response = Response::resolve(
            model.output_parameters(),
            self.output.as_ref().map(|(n, i)| (n.as_str(), *i)),
            self.limit_state_function.as_ref(),
            &mut report,
        );
        if !report.is_valid() {
            return Err(report);
        }
        let transform = match SpaceTransform::new(
            self.variables.clone(),
            &self.correlation,
            Some(&self.self_correlation),
        ) {
            Ok(t) => t,
            Err(errors) => {
                report.extend(errors);
                return Err(report);
            }
        };
        match response {
            Some(response) => Ok(Prepared {
                transform,
                response,
            }),
            None => Err(report),
        }
    }

    /// [`prepare`](Self::prepare) merged with settings messages and
    /// method-specific checks.
    pub(crate) fn prepare_with(
        &self,
        mut report: ValidationReport,
        check: impl FnOnce(&Prepared, &mut ValidationReport),
    ) -> Result<Prepared, ValidationReport> {
        match self.prepare() {
            Ok(prepared) => {
                check(&prepared, &mut report);
                if report.is_valid() {
                    Ok(prepared)
                } else {
                    Err(report)
                }
            }
            Err(errors) => {
                report.extend(errors);
                Err(report)
            }
        }
    }

    /// Record a failed validation: keep the messages, print the errors.
    pub(crate) fn report(&mut self, report: ValidationReport) {
        for message in report.errors() {
            warn!(%message, "validation failed");
            eprintln!("{message}");
        }
        self.messages = report.into_messages();
    }

    pub(crate) fn apply_parallelism(&mut self, processes: usize) {
        if let Some(model) = &mut self.model {
            model.set_max_parallel_processes(processes);
        }
    }
}

/// Reliability analysis of one limit state.
#[derive(Debug, Default)]
pub struct Project {
    base: ModelProject,
    pub settings: ReliabilitySettings,
    design_point: Option<DesignPoint>,
}

impl Deref for Project {
    type Target = ModelProject;

    fn deref(&self) -> &ModelProject {
        &self.base
    }
}

impl DerefMut for Project {
    fn deref_mut(&mut self) -> &mut ModelProject {
        &mut self.base
    }
}

impl Project {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(evaluator: impl Evaluator + 'static) -> Self {
        let mut project = Self::new();
        project.set_model(evaluator);
        project
    }

    /// Result of the last successful run.
    pub fn design_point(&self) -> Option<&DesignPoint> {
        self.design_point.as_ref()
    }

    fn checked(&self) -> Result<Prepared, ValidationReport> {
        self.base
            .prepare_with(self.settings.validate(), |prepared, report| {
                let dimensions = prepared.transform.u_count();
                match self.settings.reliability_method {
                    ReliabilityMethod::NumericalIntegration => {
                        check_grid(&prepared.transform, &self.settings, report)
                    }
                    ReliabilityMethod::NumericalBisection
                        if dimensions > numerical_bisection::MAX_DIMENSION =>
                    {
                        report.error(
                            "Settings",
                            format!(
                                "numerical bisection supports at most {} stochastic variables",
                                numerical_bisection::MAX_DIMENSION
                            ),
                        );
                    }
                    _ => {}
                }
            })
    }

    /// Validate without running.
    pub fn validate(&self) -> ValidationReport {
        self.checked().err().unwrap_or_default()
    }

    pub fn is_valid(&self) -> bool {
        self.checked().is_ok()
    }

    /// Compute the design point from the current configuration.
    ///
    /// Each call starts from scratch. On validation failure the design
    /// point is `None` and the messages are available from `messages()`.
    pub fn run(&mut self) -> Result<(), ModelError> {
        self.design_point = None;
        self.base.clear_validate();
        let prepared = match self.checked() {
            Ok(prepared) => prepared,
            Err(report) => {
                self.base.report(report);
                return Ok(());
            }
        };
        self.base.apply_parallelism(self.settings.max_parallel_processes);
        let Some(adapter) = self.base.model() else {
            return Ok(());
        };
        let model = ZModel::new(
            &prepared.transform,
            adapter,
            prepared.response,
            self.settings.save_realizations,
        );
        let point = reliability::run(&model, &self.settings)?;
        self.base.messages = point.messages.clone();
        self.design_point = Some(point);
        Ok(())
    }
}

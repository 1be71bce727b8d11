//! Upscaling of a cross-section design point to a length.
//!
//! The length is divided into sections of `section_length`, each failing
//! like the cross-section. A variable correlates between sections at
//! distance `Δx` as `ρ(Δx) = ρ₀ + (1 - ρ₀) exp(-Δx² / d²)` with `ρ₀` its
//! self-correlation and `d` its correlation length. Variables without a
//! correlation length are fully correlated along the length. The sections
//! are combined in series.

use std::collections::BTreeMap;

use limitstate_core::{SelfCorrelationMatrix, StochastId, ValidationMessage, ValidationReport};
use tracing::{info, warn};

use super::{solve, LinearModes};
use crate::error::ModelError;
use crate::reliability::DesignPoint;
use crate::settings::{CombineType, LengthEffectSettings};

/// Correlation of a variable between two points `distance` apart.
pub fn correlation_at(distance: f64, rho_zero: f64, correlation_length: f64) -> f64 {
    if correlation_length <= 0.0 {
        return if distance == 0.0 { 1.0 } else { rho_zero };
    }
    let ratio = distance / correlation_length;
    rho_zero + (1.0 - rho_zero) * (-ratio * ratio).exp()
}

#[derive(Debug, Default)]
pub struct LengthEffectProject {
    cross_section: Option<DesignPoint>,
    correlation_lengths: BTreeMap<StochastId, f64>,
    self_correlation: SelfCorrelationMatrix,
    pub settings: LengthEffectSettings,
    design_point: Option<DesignPoint>,
    messages: Vec<ValidationMessage>,
}

impl LengthEffectProject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_cross_section(&mut self, point: DesignPoint) {
        self.cross_section = Some(point);
    }

    pub fn cross_section(&self) -> Option<&DesignPoint> {
        self.cross_section.as_ref()
    }

    pub fn set_correlation_length(&mut self, variable: impl Into<StochastId>, length: f64) {
        self.correlation_lengths.insert(variable.into(), length);
    }

    pub fn correlation_length(&self, variable: impl Into<StochastId>) -> Option<f64> {
        self.correlation_lengths.get(&variable.into()).copied()
    }

    /// `ρ₀` per variable (default 0).
    pub fn self_correlation_matrix_mut(&mut self) -> &mut SelfCorrelationMatrix {
        &mut self.self_correlation
    }

    pub fn design_point(&self) -> Option<&DesignPoint> {
        self.design_point.as_ref()
    }

    pub fn messages(&self) -> &[ValidationMessage] {
        &self.messages
    }

    /// Number of sections along the length.
    pub fn sections(&self) -> usize {
        let sections = (self.settings.length / self.settings.section_length).ceil();
        if sections.is_finite() && sections >= 1.0 {
            sections as usize
        } else {
            1
        }
    }

    pub fn validate(&self) -> ValidationReport {
        let mut report = self.settings.validate();
        match &self.cross_section {
            None => report.error("Length Effect", "cross section design point is not set"),
            Some(point) if !point.reliability_index.is_finite() => report.error(
                "Length Effect",
                "cross section has no finite reliability index",
            ),
            Some(_) => {}
        }
        for length in self.correlation_lengths.values() {
            report.check_at_least("Length Effect", "correlation length", *length, 0.0);
        }
        self.self_correlation.validate_into(&mut report);
        report
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_valid()
    }

    pub fn run(&mut self) -> Result<(), ModelError> {
        self.design_point = None;
        self.messages.clear();
        let report = self.validate();
        let Some(cross_section) = self.cross_section.as_ref().filter(|_| report.is_valid()) else {
            for message in report.errors() {
                warn!(%message, "validation failed");
                eprintln!("{message}");
            }
            self.messages = report.into_messages();
            return Ok(());
        };

        let sections = self.sections();
        let modes = LinearModes::from_design_points([cross_section]).repeated(sections);
        let parameters: Vec<Option<(f64, f64)>> = (0..modes.key_count())
            .map(|k| {
                let variable = modes.key_variable(k);
                self.correlation_lengths
                    .get(&variable.id())
                    .map(|&d| (self.self_correlation.get_or(variable, 0.0), d))
            })
            .collect();
        let section_length = self.settings.section_length;
        let mut combine = self.settings.combine.clone();
        combine.combine_type = CombineType::Series;

        let mut point = solve(
            &modes,
            |k, s, t| match parameters[k] {
                Some((rho_zero, d)) => {
                    let distance = s.abs_diff(t) as f64 * section_length;
                    correlation_at(distance, rho_zero, d)
                }
                None => 1.0,
            },
            &combine,
        )?;
        info!(
            sections,
            cross_section = cross_section.reliability_index,
            beta = point.reliability_index,
            "length effect applied"
        );
        point.contributing_design_points = vec![cross_section.clone()];
        self.design_point = Some(point);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correlation_decays_to_rho_zero() {
        assert_eq!(correlation_at(0.0, 0.3, 10.0), 1.0);
        assert!((correlation_at(1e6, 0.3, 10.0) - 0.3).abs() < 1e-12);
        let at_d = correlation_at(10.0, 0.0, 10.0);
        assert!((at_d - (-1f64).exp()).abs() < 1e-12);
        assert_eq!(correlation_at(5.0, 0.2, 0.0), 0.2);
    }

    #[test]
    fn test_section_count() {
        let mut project = LengthEffectProject::new();
        project.settings.length = 1000.0;
        project.settings.section_length = 300.0;
        assert_eq!(project.sections(), 4);
    }

    #[test]
    fn test_missing_cross_section_is_invalid() {
        let mut project = LengthEffectProject::new();
        project.run().unwrap();
        assert!(project.design_point().is_none());
        assert_eq!(project.messages().len(), 1);
    }
}

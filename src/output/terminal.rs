//! Terminal output formatting with box drawing.

use std::fmt;

use crate::reliability::DesignPoint;
use crate::sensitivity::SensitivityResult;
use crate::uncertainty::UncertaintyResult;

/// Format a design point for human-readable terminal output.
///
/// Contributing design points of a combination are listed by identifier
/// and reliability index below the alphas.
pub fn format_design_point(point: &DesignPoint) -> String {
    let mut output = String::new();

    let header = if point.is_converged {
        format!("{} design point", point.identifier)
    } else {
        format!("{} design point (not converged)", point.identifier)
    };
    output.push_str(&format_box_top());
    output.push_str(&format_box_line(&header));
    output.push_str(&format_box_separator());

    output.push_str(&format_box_line(&format!(
        "Reliability index: {:.4}",
        point.reliability_index
    )));
    output.push_str(&format_box_line(&format!(
        "Probability of failure: {:.4e}",
        point.probability_failure
    )));
    if point.convergence.is_finite() {
        output.push_str(&format_box_line(&format!("Convergence: {:.4}", point.convergence)));
    }
    output.push_str(&format_box_line(&format!(
        "Model runs: {}  iterations: {}  directions: {}",
        point.total_model_runs, point.total_iterations, point.total_directions
    )));

    if !point.alphas.is_empty() {
        output.push_str(&format_box_separator());
        output.push_str(&format_box_line(&format!(
            "{:<16} {:>8} {:>8} {:>12}",
            "Variable", "alpha", "u", "x"
        )));
        for alpha in &point.alphas {
            let name = if alpha.variable.is_array() {
                format!("{}[{}]", alpha.name, alpha.index)
            } else {
                alpha.name.clone()
            };
            output.push_str(&format_box_line(&format!(
                "{:<16} {:>8.4} {:>8.4} {:>12.5}",
                truncate(&name, 16),
                alpha.alpha,
                alpha.u,
                alpha.x
            )));
        }
    }

    if !point.contributing_design_points.is_empty() {
        output.push_str(&format_box_separator());
        output.push_str(&format_box_line("Contributing:"));
        for contributing in &point.contributing_design_points {
            output.push_str(&format_box_line(&format!(
                "  {:<20} beta {:.4}",
                truncate(&contributing.identifier, 20),
                contributing.reliability_index
            )));
        }
    }

    output.push_str(&format_box_bottom());
    for message in &point.messages {
        output.push_str(&format!("{message}\n"));
    }
    output
}

/// Format the output distributions of an uncertainty run.
pub fn format_uncertainty(result: &UncertaintyResult) -> String {
    let mut output = String::new();
    output.push_str(&format_box_top());
    output.push_str(&format_box_line(&format!("{} uncertainty", result.identifier)));
    output.push_str(&format_box_separator());
    output.push_str(&format_box_line(&format!("Model runs: {}", result.total_model_runs)));

    for (i, stochast) in result.stochasts.iter().enumerate() {
        output.push_str(&format_box_separator());
        output.push_str(&format_box_line(&format!(
            "{} ({})",
            stochast.name(),
            stochast.distribution()
        )));
        output.push_str(&format_box_line(&format!(
            "  mean {:.5}  deviation {:.5}",
            stochast.mean(),
            stochast.deviation()
        )));
        for quantile in result.quantile_values.get(i).into_iter().flatten() {
            output.push_str(&format_box_line(&format!(
                "  p = {:.4}: {:.5}",
                quantile.probability(),
                quantile.x
            )));
        }
    }
    output.push_str(&format_box_bottom());
    output
}

/// Format a sensitivity table per output.
pub fn format_sensitivity(result: &SensitivityResult) -> String {
    let mut output = String::new();
    output.push_str(&format_box_top());
    output.push_str(&format_box_line(&format!("{} sensitivity", result.identifier)));
    output.push_str(&format_box_separator());
    output.push_str(&format_box_line(&format!("Model runs: {}", result.total_model_runs)));

    for sensitivity in &result.outputs {
        output.push_str(&format_box_separator());
        output.push_str(&format_box_line(&sensitivity.output));
        output.push_str(&format_box_line(&format!(
            "{:<12} {:>10} {:>10} {:>10} {:>6} {:>6}",
            "Variable", "low", "medium", "high", "S1", "ST"
        )));
        for value in &sensitivity.values {
            output.push_str(&format_box_line(&format!(
                "{:<12} {:>10.4} {:>10.4} {:>10.4} {:>6.3} {:>6.3}",
                truncate(&value.variable, 12),
                value.low,
                value.medium,
                value.high,
                value.first_order_index,
                value.total_index
            )));
        }
    }
    output.push_str(&format_box_bottom());
    output
}

impl fmt::Display for DesignPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_design_point(self))
    }
}

impl fmt::Display for UncertaintyResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_uncertainty(self))
    }
}

impl fmt::Display for SensitivityResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_sensitivity(self))
    }
}

fn truncate(text: &str, width: usize) -> String {
    text.chars().take(width).collect()
}

// Box drawing helpers

const BOX_WIDTH: usize = 64;

fn format_box_top() -> String {
    format!("\u{250C}{}\u{2510}\n", "\u{2500}".repeat(BOX_WIDTH))
}

fn format_box_bottom() -> String {
    format!("\u{2514}{}\u{2518}\n", "\u{2500}".repeat(BOX_WIDTH))
}

fn format_box_separator() -> String {
    format!("\u{251C}{}\u{2524}\n", "\u{2500}".repeat(BOX_WIDTH))
}

fn format_box_line(content: &str) -> String {
    let visible_len = content.chars().count();
    let padding = (BOX_WIDTH - 2).saturating_sub(visible_len);
    format!("\u{2502} {}{} \u{2502}\n", content, " ".repeat(padding))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensitivity::{OutputSensitivity, SensitivityValue};

    #[test]
    fn test_design_point_lists_beta_and_runs() {
        let mut point = DesignPoint::new("FORM", 2.3263);
        point.total_model_runs = 12;
        point.is_converged = true;
        let text = format_design_point(&point);
        assert!(text.contains("FORM design point"), "{text}");
        assert!(text.contains("Reliability index: 2.3263"), "{text}");
        assert!(text.contains("Model runs: 12"), "{text}");
        assert!(!text.contains("not converged"));
    }

    #[test]
    fn test_unconverged_header() {
        let point = DesignPoint::new("FORM", 1.0);
        assert!(point.to_string().contains("(not converged)"));
    }

    #[test]
    fn test_sensitivity_table() {
        let result = SensitivityResult {
            identifier: "Sobol".into(),
            outputs: vec![OutputSensitivity {
                output: "z".into(),
                values: vec![SensitivityValue {
                    variable: "a".into(),
                    low: -1.0,
                    medium: 0.0,
                    high: 1.0,
                    first_order_index: 0.9,
                    total_index: 0.91,
                }],
            }],
            total_model_runs: 40,
        };
        let text = format_sensitivity(&result);
        assert!(text.contains("Sobol sensitivity"));
        assert!(text.contains("0.900"), "{text}");
    }

    #[test]
    fn test_box_lines_have_equal_width() {
        let point = DesignPoint::new("Directional sampling", 3.1);
        let text = format_design_point(&point);
        let widths: Vec<usize> = text.lines().map(|l| l.chars().count()).collect();
        assert!(widths.iter().all(|&w| w == BOX_WIDTH + 2), "{widths:?}");
    }
}

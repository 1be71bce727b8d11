//! Output formatting for analysis results.
//!
//! This module provides formatters for displaying results in different formats:
//! - Terminal: human-readable text with box drawing (also behind `Display`)
//! - JSON: machine-readable serialization

mod json;
mod terminal;

pub use json::{to_json, to_json_pretty};
pub use terminal::{format_design_point, format_sensitivity, format_uncertainty};

//! Validation messages collected before a run.
//!
//! Invalid data (distribution parameters out of range, a correlation matrix
//! that is not positive semi-definite, inconsistent settings) is never an
//! error value: it is collected into a [`ValidationReport`] so a caller can
//! inspect every problem at once. Each message renders as
//! `"<Level>: <subject> => <text>"`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Severity of a [`ValidationMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageLevel {
    /// Blocks a run.
    Error,
    /// Reported, does not block a run.
    Warning,
    /// Informational.
    Info,
}

impl fmt::Display for MessageLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageLevel::Error => write!(f, "Error"),
            MessageLevel::Warning => write!(f, "Warning"),
            MessageLevel::Info => write!(f, "Info"),
        }
    }
}

/// One validation finding about a named subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationMessage {
    pub level: MessageLevel,
    /// Name of the offending object, e.g. a variable name.
    pub subject: String,
    pub text: String,
}

impl ValidationMessage {
    pub fn error(subject: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            subject: subject.into(),
            text: text.into(),
        }
    }

    pub fn warning(subject: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            subject: subject.into(),
            text: text.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == MessageLevel::Error
    }
}

impl fmt::Display for ValidationMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} => {}", self.level, self.subject, self.text)
    }
}

/// Ordered collection of validation messages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    messages: Vec<ValidationMessage>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: ValidationMessage) {
        self.messages.push(message);
    }

    /// Add an error message.
    pub fn error(&mut self, subject: impl Into<String>, text: impl Into<String>) {
        self.push(ValidationMessage::error(subject, text));
    }

    /// Add a warning message.
    pub fn warning(&mut self, subject: impl Into<String>, text: impl Into<String>) {
        self.push(ValidationMessage::warning(subject, text));
    }

    /// Append all messages of another report.
    pub fn extend(&mut self, other: ValidationReport) {
        self.messages.extend(other.messages);
    }

    /// True when no message has [`MessageLevel::Error`].
    pub fn is_valid(&self) -> bool {
        !self.messages.iter().any(ValidationMessage::is_error)
    }

    pub fn messages(&self) -> &[ValidationMessage] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<ValidationMessage> {
        self.messages
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationMessage> {
        self.messages.iter().filter(|m| m.is_error())
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check `value >= minimum` and record an error naming the property otherwise.
    pub fn check_at_least(&mut self, subject: &str, property: &str, value: f64, minimum: f64) {
        if value.is_nan() || value < minimum {
            self.error(
                subject,
                format!("{property} value {value} is less than {minimum}"),
            );
        }
    }

    /// Check `value > minimum` and record an error naming the property otherwise.
    pub fn check_greater(&mut self, subject: &str, property: &str, value: f64, minimum: f64) {
        if value.is_nan() || value <= minimum {
            self.error(
                subject,
                format!("{property} value {value} should be greater than {minimum}"),
            );
        }
    }

    /// Check `value <= maximum` and record an error naming the property otherwise.
    pub fn check_at_most(&mut self, subject: &str, property: &str, value: f64, maximum: f64) {
        if value.is_nan() || value > maximum {
            self.error(
                subject,
                format!("{property} value {value} is greater than {maximum}"),
            );
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, message) in self.messages.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{message}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_format() {
        let message = ValidationMessage::error("a", "scale value -1 is less than 0");
        assert_eq!(message.to_string(), "Error: a => scale value -1 is less than 0");
    }

    #[test]
    fn test_full_precision_in_text() {
        let mut report = ValidationReport::new();
        report.check_at_least("v", "scale", -0.123456789012345, 0.0);
        assert_eq!(
            report.messages()[0].text,
            "scale value -0.123456789012345 is less than 0"
        );
    }

    #[test]
    fn test_warnings_do_not_invalidate() {
        let mut report = ValidationReport::new();
        report.warning("x", "unused");
        assert!(report.is_valid());
        report.error("x", "broken");
        assert!(!report.is_valid());
        assert_eq!(report.errors().count(), 1);
    }
}

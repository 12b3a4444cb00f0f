//! Publish validation messages and status aggregation.

use serde::{Deserialize, Serialize};

/// Severity of a validation finding, ordered `Ok < Warning < Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Ok,
    Warning,
    Error,
}

/// Overall status of a publish attempt.
pub type ValidationStatus = Severity;

/// Area of the publish payload a finding refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationContext {
    Image,
    Localization,
    Metadata,
}

/// A single finding produced by one of the validators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationMessage {
    pub severity: Severity,
    pub context: ValidationContext,
    pub code: String,
    pub details: String,
}

impl ValidationMessage {
    pub fn new(
        severity: Severity,
        context: ValidationContext,
        code: &str,
        details: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            context,
            code: code.to_string(),
            details: details.into(),
        }
    }

    pub fn warning(context: ValidationContext, code: &str, details: impl Into<String>) -> Self {
        Self::new(Severity::Warning, context, code, details)
    }

    pub fn error(context: ValidationContext, code: &str, details: impl Into<String>) -> Self {
        Self::new(Severity::Error, context, code, details)
    }
}

/// Highest severity across all messages; an empty list is `Ok`.
pub fn calculate_validation_status(messages: &[ValidationMessage]) -> ValidationStatus {
    messages
        .iter()
        .map(|message| message.severity)
        .max()
        .unwrap_or(Severity::Ok)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(severity: Severity) -> ValidationMessage {
        ValidationMessage::new(severity, ValidationContext::Metadata, "TEST", "test")
    }

    #[test]
    fn test_empty_is_ok() {
        assert_eq!(calculate_validation_status(&[]), Severity::Ok);
    }

    #[test]
    fn test_only_ok_messages() {
        let messages = vec![message(Severity::Ok), message(Severity::Ok)];
        assert_eq!(calculate_validation_status(&messages), Severity::Ok);
    }

    #[test]
    fn test_warning_beats_ok() {
        let messages = vec![message(Severity::Ok), message(Severity::Warning)];
        assert_eq!(calculate_validation_status(&messages), Severity::Warning);
    }

    #[test]
    fn test_error_beats_everything_in_any_order() {
        let orders = vec![
            vec![Severity::Error, Severity::Warning, Severity::Ok],
            vec![Severity::Ok, Severity::Error, Severity::Warning],
            vec![Severity::Warning, Severity::Ok, Severity::Error],
        ];
        for order in orders {
            let messages: Vec<_> = order.into_iter().map(message).collect();
            assert_eq!(calculate_validation_status(&messages), Severity::Error);
        }
    }

    #[test]
    fn test_severity_wire_format() {
        let json = serde_json::to_string(&message(Severity::Warning)).unwrap();
        assert!(json.contains("\"severity\":\"WARNING\""));
        assert!(json.contains("\"context\":\"METADATA\""));
    }
}

//! # Validation Module
//!
//! Structured, client-safe error bodies for rejected requests.
//!
//! ## Design Principles (SOLID)
//!
//! - **S**: Only handles client-facing error representation
//! - **O**: Extensible error codes via enum
//! - **L**: All validation errors implement common traits
//!
//! Conversion causes are deliberately absent: a `FieldError` carries the
//! key, a message and a code, nothing from the server's internals.

use crate::error::{BindingError, BindingErrorKind};
use serde::Serialize;

/// Error code for categorizing validation failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationCode {
    /// Required query key is missing
    Required,
    /// Value is invalid type
    InvalidType,
    /// Posted document is not valid JSON
    InvalidDocument,
}

/// A single validation error for a specific field
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    /// Query key or `body`
    pub field: String,
    /// Human-readable error message
    pub message: String,
    /// Machine-readable error code
    pub code: ValidationCode,
}

impl FieldError {
    /// Create a new field error
    pub fn new(field: impl Into<String>, message: impl Into<String>, code: ValidationCode) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            code,
        }
    }

    /// Create a "required field" error
    pub fn required(field: impl Into<String>) -> Self {
        let field_str = field.into();
        Self {
            message: format!("{field_str} is required"),
            field: field_str,
            code: ValidationCode::Required,
        }
    }

    /// Create an "invalid type" error
    pub fn invalid_type(field: impl Into<String>, expected: &str) -> Self {
        let field_str = field.into();
        Self {
            message: format!("{field_str} must be {expected}"),
            field: field_str,
            code: ValidationCode::InvalidType,
        }
    }

    /// Create an "invalid document" error
    #[must_use]
    pub fn invalid_document() -> Self {
        Self::new(
            "body",
            "request body must be a JSON document",
            ValidationCode::InvalidDocument,
        )
    }
}

impl From<&BindingError> for FieldError {
    fn from(err: &BindingError) -> Self {
        match err.kind {
            BindingErrorKind::MissingRequiredParameter => Self::required(&err.parameter_name),
            BindingErrorKind::TypeConversionFailure => {
                Self::invalid_type(&err.parameter_name, err.expected_type.type_name())
            }
        }
    }
}

/// Body of a `400` response
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationErrors {
    /// List of field-level errors
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    /// Convert to JSON response body
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"errors":[]}"#.to_string())
    }
}

impl From<FieldError> for ValidationErrors {
    fn from(error: FieldError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

impl From<&BindingError> for ValidationErrors {
    fn from(err: &BindingError) -> Self {
        FieldError::from(err).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ParamType;

    #[test]
    fn test_field_error_required() {
        let error = FieldError::required("q");
        assert_eq!(error.field, "q");
        assert_eq!(error.code, ValidationCode::Required);
        assert!(error.message.contains("required"));
    }

    #[test]
    fn test_validation_errors_json() {
        let json = ValidationErrors::from(FieldError::required("q")).to_json();
        assert!(json.contains("\"q\""));
        assert!(json.contains("REQUIRED"));

        let json = ValidationErrors::from(FieldError::invalid_document()).to_json();
        assert!(json.contains("\"body\""));
        assert!(json.contains("INVALID_DOCUMENT"));
    }

    #[test]
    fn test_from_missing_binding_error() {
        let err = BindingError::missing("q", ParamType::String);
        let field = FieldError::from(&err);
        assert_eq!(field.field, "q");
        assert_eq!(field.code, ValidationCode::Required);
    }

    #[test]
    fn test_from_conversion_error_hides_cause() {
        let cause = "abc".parse::<i64>().unwrap_err();
        let err = BindingError::conversion("num", "abc", ParamType::Int, cause.into());
        let body = ValidationErrors::from(&err).to_json();
        assert!(body.contains("INVALID_TYPE"));
        assert!(body.contains("num must be int"));
        assert!(!body.contains("invalid digit"));
    }
}

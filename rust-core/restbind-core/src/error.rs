//! # Error Handling
//!
//! Centralized error types for restbind core.
//! Uses `thiserror` for ergonomic error definitions.
//!
//! Registration-time errors (`RouteCollision`, `AmbiguousPlaceholder`, ...)
//! are configuration faults and should stop the service from starting.
//! Request-time errors (`Binding`, `RouteNotFound`, ...) are client faults.

use crate::types::{ConversionError, ParamType};
use thiserror::Error;

/// Result type alias for restbind operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for restbind
#[derive(Error, Debug)]
pub enum Error {
    /// No registered binding serves the requested path
    #[error("No route found for {verb} {path}")]
    RouteNotFound {
        /// The path that wasn't matched
        path: String,
        /// The verb of the request
        verb: String,
    },

    /// The path is known but no binding accepts the verb
    #[error("Method {verb} not allowed for path: {path}")]
    MethodNotAllowed {
        /// The matched path
        path: String,
        /// The rejected verb
        verb: String,
    },

    /// Two handlers claim the same effective route
    #[error("Route collision: {handler} conflicts with {existing} on {verb} {path}")]
    RouteCollision {
        /// Handler being registered
        handler: String,
        /// Handler already holding the route
        existing: String,
        /// Route path
        path: String,
        /// Route verb
        verb: String,
    },

    /// Several placeholders map to the same query key
    #[error("Ambiguous template for {handler}: placeholders {placeholders:?} all map to '{key}'")]
    AmbiguousPlaceholder {
        /// Handler being registered
        handler: String,
        /// The shared query key
        key: String,
        /// The placeholders mapping to it
        placeholders: Vec<String>,
    },

    /// Template placeholders reference parameters the handler does not declare
    #[error("Invalid placeholders in template for {handler}: {placeholders:?}")]
    InvalidPlaceholder {
        /// Handler being registered
        handler: String,
        /// The unknown placeholders
        placeholders: Vec<String>,
    },

    /// Handler declaration is inconsistent
    #[error("Invalid handler {handler}: {reason}")]
    InvalidHandler {
        /// Handler being registered
        handler: String,
        /// Reason for invalidity
        reason: String,
    },

    /// Verb string is not a supported HTTP method
    #[error("Unsupported verb: {0}")]
    UnsupportedVerb(String),

    /// Request arguments could not be bound
    #[error(transparent)]
    Binding(#[from] BindingError),

    /// Handler invocation failed
    #[error(transparent)]
    Handler(#[from] HandlerError),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Posted document or configuration is not valid JSON
    #[error("Invalid JSON document: {reason}")]
    InvalidDocument {
        /// Parser message
        reason: String,
    },

    /// Request payload too large
    #[error("Payload too large: limit={limit} bytes, received={actual} bytes")]
    PayloadTooLarge {
        /// Max allowed size
        limit: usize,
        /// Actual size
        actual: usize,
    },
}

/// Category of a [`BindingError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingErrorKind {
    /// A required query key is absent and the parameter has no default
    MissingRequiredParameter,
    /// The raw query value does not convert to the declared type
    TypeConversionFailure,
}

/// Failure to bind one handler parameter from a request
///
/// `parameter_name` is the query-string key, not the handler's argument
/// name. The conversion cause is for diagnostics only and must not reach
/// untrusted clients.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct BindingError {
    /// What went wrong
    pub kind: BindingErrorKind,
    /// Human-readable description
    pub message: String,
    /// Query key the value was expected under
    pub parameter_name: String,
    /// Raw query value, if one was supplied
    pub raw_value: Option<String>,
    /// Declared type of the handler parameter
    pub expected_type: ParamType,
    /// Underlying conversion error
    #[source]
    pub cause: Option<ConversionError>,
}

impl BindingError {
    /// Create a "required key missing" error
    pub fn missing(key: impl Into<String>, expected_type: ParamType) -> Self {
        let key = key.into();
        Self {
            kind: BindingErrorKind::MissingRequiredParameter,
            message: format!("Query parameter '{key}' is required"),
            parameter_name: key,
            raw_value: None,
            expected_type,
            cause: None,
        }
    }

    /// Create a conversion failure error
    pub fn conversion(
        key: impl Into<String>,
        raw: impl Into<String>,
        expected_type: ParamType,
        cause: ConversionError,
    ) -> Self {
        let key = key.into();
        let raw = raw.into();
        Self {
            kind: BindingErrorKind::TypeConversionFailure,
            message: format!(
                "Value '{raw}' of query parameter '{key}' cannot be converted to {expected_type}"
            ),
            parameter_name: key,
            raw_value: Some(raw),
            expected_type,
            cause: Some(cause),
        }
    }
}

/// Failure raised while invoking a handler callable
#[derive(Error, Debug)]
pub enum HandlerError {
    /// A bound argument did not have the type the callable expects
    #[error("Argument {position} has type {actual}, expected {expected}")]
    ArgumentType {
        /// Parameter position
        position: usize,
        /// Type the callable expects
        expected: &'static str,
        /// Type that was bound
        actual: &'static str,
    },

    /// A bound argument is missing
    #[error("Argument {0} was not bound")]
    MissingArgument(usize),

    /// The handler itself reported failure
    #[error("Handler failed: {0}")]
    Failed(String),

    /// Handler output could not be serialized
    #[error("Handler output not serializable: {0}")]
    Output(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_not_found_error() {
        let err = Error::RouteNotFound {
            path: "/unknown".to_string(),
            verb: "GET".to_string(),
        };
        assert!(err.to_string().contains("/unknown"));
        assert!(err.to_string().contains("GET"));
    }

    #[test]
    fn test_missing_binding_error() {
        let err = BindingError::missing("q", ParamType::String);
        assert_eq!(err.kind, BindingErrorKind::MissingRequiredParameter);
        assert_eq!(err.parameter_name, "q");
        assert!(err.raw_value.is_none());
        assert!(err.to_string().contains("required"));
    }

    #[test]
    fn test_conversion_binding_error_keeps_cause() {
        let cause = "abc".parse::<i64>().unwrap_err();
        let err = BindingError::conversion("num", "abc", ParamType::Int, cause.into());
        assert_eq!(err.kind, BindingErrorKind::TypeConversionFailure);
        assert_eq!(err.raw_value.as_deref(), Some("abc"));
        assert!(err.to_string().contains("'abc'"));
        assert!(err.to_string().contains("int"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_binding_error_into_core_error() {
        let err: Error = BindingError::missing("q", ParamType::String).into();
        assert!(matches!(err, Error::Binding(_)));
    }
}

//! # Handler Metadata
//!
//! Declarative description of a handler: verb, URI template and the
//! ordered parameter schema, plus the callable that consumes
//! [`BoundArguments`].
//!
//! Handlers are registered explicitly at startup:
//!
//! ```ignore
//! let search = HandlerDescriptor::builder(Verb::Get, "search?q={query}&page={page}", "catalog::search")
//!     .param(ParamSpec::query("query", ParamType::String))
//!     .param(ParamSpec::query("page", ParamType::Int).with_default(1))
//!     .description("Full-text search")
//!     .example("search?q=rust")
//!     .build();
//! ```

use crate::binding::BoundArguments;
use crate::error::HandlerError;
use crate::types::{ParamType, ParamValue};
use crate::verb::Verb;
use serde::Serialize;
use std::fmt::Display;
use std::sync::Arc;

/// Where a parameter takes its value from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Converted from the query string
    Query,
    /// The posted document, passed through as-is
    Document,
}

/// One declared handler parameter
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    /// Parameter name, matched against template placeholders
    pub name: String,
    /// Declared type
    pub declared_type: ParamType,
    /// Value used when the query key is absent
    pub default_value: Option<ParamValue>,
    /// Position in the handler signature
    pub position: usize,
    /// Value source
    pub kind: ParamKind,
}

impl ParamSpec {
    /// Query-bound parameter without default
    pub fn query(name: impl Into<String>, declared_type: ParamType) -> Self {
        Self {
            name: name.into(),
            declared_type,
            default_value: None,
            position: 0,
            kind: ParamKind::Query,
        }
    }

    /// Document-bound parameter
    pub fn document(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: ParamType::Json,
            default_value: None,
            position: 0,
            kind: ParamKind::Document,
        }
    }

    /// Set the default value
    #[must_use]
    pub fn with_default(mut self, value: impl Into<ParamValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Whether a default value is declared
    #[must_use]
    pub const fn has_default(&self) -> bool {
        self.default_value.is_some()
    }

    /// Whether the value comes from the posted document
    #[must_use]
    pub fn is_document(&self) -> bool {
        self.kind == ParamKind::Document
    }
}

/// Immutable handler metadata
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerDescriptor {
    verb: Verb,
    template: String,
    qualified_name: String,
    params: Vec<ParamSpec>,
    description: Option<String>,
    describe: bool,
    example: Option<String>,
}

impl HandlerDescriptor {
    /// Start describing a handler
    pub fn builder(
        verb: Verb,
        template: impl Into<String>,
        qualified_name: impl Into<String>,
    ) -> HandlerBuilder {
        HandlerBuilder {
            descriptor: Self {
                verb,
                template: template.into(),
                qualified_name: qualified_name.into(),
                params: Vec::new(),
                description: None,
                describe: true,
                example: None,
            },
        }
    }

    /// Declared verb
    #[must_use]
    pub const fn verb(&self) -> Verb {
        self.verb
    }

    /// Raw URI template
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Name used in diagnostics
    #[must_use]
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    /// Parameters in position order
    #[must_use]
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Parameter by name (case-insensitive)
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Description text
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Whether the handler appears in the service description
    #[must_use]
    pub const fn describe(&self) -> bool {
        self.describe
    }

    /// Example URI, relative to the service base
    #[must_use]
    pub fn example(&self) -> Option<&str> {
        self.example.as_deref()
    }
}

/// Builder for [`HandlerDescriptor`]
#[derive(Debug, Clone)]
pub struct HandlerBuilder {
    descriptor: HandlerDescriptor,
}

impl HandlerBuilder {
    /// Append a parameter; its position is the number of parameters before it
    #[must_use]
    pub fn param(mut self, mut spec: ParamSpec) -> Self {
        spec.position = self.descriptor.params.len();
        self.descriptor.params.push(spec);
        self
    }

    /// Set the description text
    #[must_use]
    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.descriptor.description = Some(text.into());
        self
    }

    /// Include or hide the handler in the service description
    #[must_use]
    pub fn describe(mut self, describe: bool) -> Self {
        self.descriptor.describe = describe;
        self
    }

    /// Set the example URI
    #[must_use]
    pub fn example(mut self, example: impl Into<String>) -> Self {
        self.descriptor.example = Some(example.into());
        self
    }

    /// Finish the descriptor
    #[must_use]
    pub fn build(self) -> HandlerDescriptor {
        self.descriptor
    }
}

/// Handler callable
///
/// Receives arguments aligned with the descriptor's parameters and returns
/// the value to serialize as the response body.
pub type Handler =
    Arc<dyn Fn(&BoundArguments) -> Result<serde_json::Value, HandlerError> + Send + Sync>;

/// Wrap a closure as a [`Handler`]
pub fn handler<F>(f: F) -> Handler
where
    F: Fn(&BoundArguments) -> Result<serde_json::Value, HandlerError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Conversion of a typed handler's return value into the handler result
pub trait IntoHandlerResult {
    /// Serialize the success value or report the failure
    ///
    /// # Errors
    ///
    /// Returns `HandlerError::Failed` for handler errors and
    /// `HandlerError::Output` if the value cannot be serialized.
    fn into_handler_result(self) -> Result<serde_json::Value, HandlerError>;
}

impl<T: Serialize, E: Display> IntoHandlerResult for Result<T, E> {
    fn into_handler_result(self) -> Result<serde_json::Value, HandlerError> {
        let value = self.map_err(|e| HandlerError::Failed(e.to_string()))?;
        Ok(serde_json::to_value(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_assigns_positions() {
        let d = HandlerDescriptor::builder(Verb::Post, "items?id={id}", "items::update")
            .param(ParamSpec::query("id", ParamType::Int))
            .param(ParamSpec::document("body"))
            .param(ParamSpec::query("dry_run", ParamType::Bool).with_default(false))
            .build();

        let positions: Vec<usize> = d.params().iter().map(|p| p.position).collect();
        assert_eq!(positions, [0, 1, 2]);
        assert!(d.params()[1].is_document());
        assert_eq!(d.params()[2].default_value, Some(ParamValue::Bool(false)));
        assert_eq!(d.verb(), Verb::Post);
        assert_eq!(d.qualified_name(), "items::update");
    }

    #[test]
    fn test_metadata_defaults() {
        let d = HandlerDescriptor::builder(Verb::Get, "ping", "health::ping").build();
        assert!(d.describe());
        assert!(d.description().is_none());
        assert!(d.example().is_none());

        let d = HandlerDescriptor::builder(Verb::Get, "ping", "health::ping")
            .describe(false)
            .description("Liveness")
            .example("ping")
            .build();
        assert!(!d.describe());
        assert_eq!(d.description(), Some("Liveness"));
        assert_eq!(d.example(), Some("ping"));
    }

    #[test]
    fn test_param_lookup_case_insensitive() {
        let d = HandlerDescriptor::builder(Verb::Get, "s?q={Query}", "s")
            .param(ParamSpec::query("query", ParamType::String))
            .build();
        assert!(d.param("QUERY").is_some());
        assert!(d.param("other").is_none());
    }

    #[test]
    fn test_into_handler_result() {
        let ok: Result<Vec<i32>, String> = Ok(vec![1, 2]);
        assert_eq!(ok.into_handler_result().unwrap(), serde_json::json!([1, 2]));

        let err: Result<(), String> = Err("boom".to_string());
        assert!(matches!(
            err.into_handler_result(),
            Err(HandlerError::Failed(msg)) if msg == "boom"
        ));
    }
}

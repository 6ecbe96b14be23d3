//! # Service Description
//!
//! Self-describing metadata for documentation pages: one entry per handler
//! with its template, example URI and parameters.

use crate::binding::RouteBinding;
use crate::handler::ParamKind;
use crate::types::ParamValue;
use serde::Serialize;

/// Where a described parameter is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterSource {
    /// Query string
    Query,
    /// Posted document
    Document,
}

/// One handler parameter, as documented
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterDescription {
    /// Handler parameter name
    pub name: String,
    /// Query key the value is read from
    pub key: String,
    /// Declared type name
    #[serde(rename = "type")]
    pub type_name: String,
    /// Whether a request must supply it
    pub required: bool,
    /// Default value, if declared
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<ParamValue>,
    /// Value source
    pub source: ParameterSource,
}

/// One handler, as documented
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandlerDescription {
    /// Qualified handler name
    pub name: String,
    /// Description text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// HTTP verb
    pub verb: String,
    /// Raw template
    pub template: String,
    /// Example URI resolved against the service base
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example_uri: Option<String>,
    /// Query keys a request must carry
    pub required_parameters: Vec<String>,
    /// All parameters in position order
    pub parameters: Vec<ParameterDescription>,
    /// Placeholders naming no handler parameter
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub invalid_placeholders: Vec<String>,
}

impl HandlerDescription {
    /// Describe one binding
    #[must_use]
    pub fn from_binding(binding: &RouteBinding, base_uri: &str) -> Self {
        let handler = binding.handler();
        let template = binding.template();
        let required = binding.required_parameters();

        let parameters = handler
            .params()
            .iter()
            .map(|p| {
                let mapped = template.lookup(&p.name);
                let source = if mapped.is_none() && p.kind == ParamKind::Document {
                    ParameterSource::Document
                } else {
                    ParameterSource::Query
                };
                let key = mapped.unwrap_or(&p.name).to_string();
                ParameterDescription {
                    required: source == ParameterSource::Query && !p.has_default(),
                    name: p.name.clone(),
                    key,
                    type_name: p.declared_type.type_name().to_string(),
                    default: p.default_value.clone(),
                    source,
                }
            })
            .collect();

        Self {
            name: handler.qualified_name().to_string(),
            description: handler.description().map(str::to_string),
            verb: handler.verb().to_string(),
            template: handler.template().to_string(),
            example_uri: binding.example_uri(base_uri).map(String::from),
            required_parameters: required.into_iter().map(str::to_string).collect(),
            parameters,
            invalid_placeholders: binding.invalid_placeholders(),
        }
    }
}

/// Description of every documented handler of a service
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ServiceDescription {
    /// Handlers in registration order
    pub handlers: Vec<HandlerDescription>,
}

impl ServiceDescription {
    /// Describe the bindings whose handler opts into description
    pub fn from_bindings<'a, I>(bindings: I, base_uri: &str) -> Self
    where
        I: IntoIterator<Item = &'a RouteBinding>,
    {
        Self {
            handlers: bindings
                .into_iter()
                .filter(|b| b.handler().describe())
                .map(|b| HandlerDescription::from_binding(b, base_uri))
                .collect(),
        }
    }
}

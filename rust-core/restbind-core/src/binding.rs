//! # Route Binding
//!
//! Pairs one handler with its parsed template and implements the request
//! side of routing: matching, collision fingerprints and parameter binding.
//!
//! ## Design Principles
//!
//! - **S**: One binding per handler; no knowledge of other bindings
//! - **O**: New parameter types plug in through `ConverterRegistry`
//! - **D**: Conversion goes through the registry, never concrete parsers
//!
//! A binding holds no mutable state, so one instance serves any number of
//! concurrent requests.

use crate::error::{BindingError, HandlerError};
use crate::handler::{HandlerDescriptor, ParamKind};
use crate::query::QueryCollection;
use crate::template::TemplateDescriptor;
use crate::types::{ConverterRegistry, FromParamValue, ParamValue};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// Collision-detection hash of a binding
///
/// Combines the lower-cased path, the lower-cased verb and the XOR of the
/// parameter names' hashes, so parameter order does not matter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(u64);

impl Fingerprint {
    fn compute(template: &TemplateDescriptor, handler: &HandlerDescriptor) -> Self {
        let names = handler
            .params()
            .iter()
            .fold(0u64, |acc, p| acc ^ hash_of(p.name.as_str()));

        let mut hasher = DefaultHasher::new();
        template.path().to_lowercase().hash(&mut hasher);
        template.verb().as_str().to_lowercase().hash(&mut hasher);
        names.hash(&mut hasher);
        Self(hasher.finish())
    }

    /// Raw hash value
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

fn hash_of(value: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Arguments resolved for one call, aligned with the handler's parameters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundArguments {
    values: Vec<ParamValue>,
    names: Vec<String>,
    log: Vec<String>,
}

impl BoundArguments {
    /// Bound values in position order
    #[must_use]
    pub fn values(&self) -> &[ParamValue] {
        &self.values
    }

    /// Handler parameter names in position order
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// `name=value` strings for query-converted values
    ///
    /// Document-bound and defaulted parameters leave an empty entry, so the
    /// slice stays aligned with [`BoundArguments::values`].
    #[must_use]
    pub fn log_entries(&self) -> &[String] {
        &self.log
    }

    /// Value at `position`
    #[must_use]
    pub fn value(&self, position: usize) -> Option<&ParamValue> {
        self.values.get(position)
    }

    /// Value of the parameter called `name` (case-insensitive)
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.names
            .iter()
            .position(|n| n.eq_ignore_ascii_case(name))
            .and_then(|i| self.values.get(i))
    }

    /// Extract the value at `position` as a Rust type
    ///
    /// # Errors
    ///
    /// Returns `HandlerError::MissingArgument` if there is no such position
    /// and `HandlerError::ArgumentType` if the bound variant differs.
    pub fn extract<T: FromParamValue>(&self, position: usize) -> Result<T, HandlerError> {
        let value = self
            .value(position)
            .ok_or(HandlerError::MissingArgument(position))?;
        T::from_param(value, position)
    }

    /// Number of arguments
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the handler takes no arguments
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn push(&mut self, name: &str, value: ParamValue, log: String) {
        self.values.push(value);
        self.names.push(name.to_string());
        self.log.push(log);
    }
}

/// One registered handler with its parsed template
#[derive(Debug, Clone)]
pub struct RouteBinding {
    template: TemplateDescriptor,
    handler: HandlerDescriptor,
    converters: Arc<ConverterRegistry>,
    fingerprint: Fingerprint,
}

impl RouteBinding {
    /// Bind a handler using the built-in converters
    #[must_use]
    pub fn new(handler: HandlerDescriptor) -> Self {
        Self::with_converters(handler, Arc::new(ConverterRegistry::default()))
    }

    /// Bind a handler using a shared converter registry
    #[must_use]
    pub fn with_converters(handler: HandlerDescriptor, converters: Arc<ConverterRegistry>) -> Self {
        let template = TemplateDescriptor::new(handler.template(), handler.verb());
        let fingerprint = Fingerprint::compute(&template, &handler);
        Self {
            template,
            handler,
            converters,
            fingerprint,
        }
    }

    /// Parsed template
    #[must_use]
    pub const fn template(&self) -> &TemplateDescriptor {
        &self.template
    }

    /// Handler metadata
    #[must_use]
    pub const fn handler(&self) -> &HandlerDescriptor {
        &self.handler
    }

    /// Collision fingerprint
    #[must_use]
    pub const fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    /// Query keys a request must carry to match
    ///
    /// Parameters that a placeholder maps and that declare no default.
    /// A mapped parameter is read from the query even when declared as the
    /// document, so it counts here too.
    #[must_use]
    pub fn required_parameters(&self) -> Vec<&str> {
        self.handler
            .params()
            .iter()
            .filter(|p| !p.has_default())
            .filter_map(|p| self.template.lookup(&p.name))
            .collect()
    }

    /// Whether a request satisfies this binding
    ///
    /// Path and verb compare case-insensitively; every required query key
    /// must be present among `query_keys` (case-insensitive).
    pub fn is_match<S: AsRef<str>>(&self, path: &str, verb: &str, query_keys: &[S]) -> bool {
        self.template.path().eq_ignore_ascii_case(path)
            && self.template.verb().matches(verb)
            && self.required_parameters().iter().all(|required| {
                query_keys
                    .iter()
                    .any(|k| k.as_ref().eq_ignore_ascii_case(required))
            })
    }

    /// Resolve the handler's arguments from a request
    ///
    /// Parameters are resolved in position order. A document-bound
    /// parameter that no placeholder maps receives `document` unchanged
    /// (`Null` when absent). Every other parameter is read from `query`
    /// under its template key and converted to its declared type; an absent
    /// key binds the declared default.
    ///
    /// # Errors
    ///
    /// Returns `BindingError` with kind `MissingRequiredParameter` if a key
    /// is absent and no default is declared, or `TypeConversionFailure` if
    /// the raw value does not convert.
    pub fn map_parameters(
        &self,
        query: &QueryCollection,
        document: Option<&serde_json::Value>,
    ) -> Result<BoundArguments, BindingError> {
        let mut args = BoundArguments::default();

        for param in self.handler.params() {
            let mapped = self.template.lookup(&param.name);

            if mapped.is_none() && param.kind == ParamKind::Document {
                let value = document.cloned().map_or(ParamValue::Null, ParamValue::Json);
                args.push(&param.name, value, String::new());
                continue;
            }

            let key = mapped.unwrap_or(&param.name);
            match query.get(key) {
                None => {
                    let default = param
                        .default_value
                        .clone()
                        .ok_or_else(|| BindingError::missing(key, param.declared_type))?;
                    args.push(&param.name, default, String::new());
                }
                Some(raw) => {
                    let value = self
                        .converters
                        .convert(&raw, param.declared_type)
                        .map_err(|cause| {
                            BindingError::conversion(key, raw.as_str(), param.declared_type, cause)
                        })?;
                    let log = format!("{}={}", param.name, value);
                    args.push(&param.name, value, log);
                }
            }
        }

        debug!(
            handler = %self.handler.qualified_name(),
            args = ?args.log_entries(),
            "bound parameters"
        );
        Ok(args)
    }

    /// Example URI resolved against the service base URI
    ///
    /// Returns `None` when no example is configured or it does not combine
    /// with `base` into a valid absolute URI.
    #[must_use]
    pub fn example_uri(&self, base: &str) -> Option<Url> {
        let example = self.handler.example()?;
        let mut base = Url::parse(base).ok()?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join(example.trim_start_matches('/')).ok()
    }

    /// Template placeholders naming no handler parameter (case-insensitive)
    #[must_use]
    pub fn invalid_placeholders(&self) -> Vec<String> {
        self.template
            .placeholders()
            .filter(|p| self.handler.param(p).is_none())
            .map(str::to_string)
            .collect()
    }
}

//! # Handler Registry
//!
//! Holds one [`RouteBinding`] per registered handler, rejects
//! inconsistent registrations at startup and selects the binding that
//! serves a request.
//!
//! ## SOLID Principles
//!
//! - **S**: Registry only validates and selects, binding logic lives in
//!   `RouteBinding`
//! - **O**: New parameter types via `ConverterRegistry` without modifying
//!   the registry
//! - **D**: Depends on `RouteBinding::is_match`, not on template internals

use crate::binding::RouteBinding;
use crate::config::ServiceConfig;
use crate::describe::ServiceDescription;
use crate::error::{Error, Result};
use crate::handler::HandlerDescriptor;
use crate::types::ConverterRegistry;
use crate::verb::Verb;
use std::sync::Arc;
use tracing::{info, warn};

/// Handler identifier, the registration index
pub type HandlerId = usize;

/// Registered bindings, read-only once startup is over
#[derive(Debug, Clone)]
pub struct Registry {
    bindings: Vec<RouteBinding>,
    converters: Arc<ConverterRegistry>,
    strict_placeholders: bool,
    description_path: Option<String>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Create an empty registry with the built-in converters
    #[must_use]
    pub fn new() -> Self {
        Self::with_converters(ConverterRegistry::default())
    }

    /// Create an empty registry with application converters
    #[must_use]
    pub fn with_converters(converters: ConverterRegistry) -> Self {
        Self {
            bindings: Vec::new(),
            converters: Arc::new(converters),
            strict_placeholders: false,
            description_path: None,
        }
    }

    /// Apply the registration settings of `config`
    ///
    /// With `describe` on, `GET` on the description path is reserved.
    #[must_use]
    pub fn configured(mut self, config: &ServiceConfig) -> Self {
        self.strict_placeholders = config.strict_placeholders;
        self.description_path = config.describe.then(|| {
            let path = config.description_path.as_str();
            if path.starts_with('/') {
                path.to_string()
            } else {
                format!("/{path}")
            }
        });
        self
    }

    /// Reject templates with invalid placeholders instead of warning
    #[must_use]
    pub fn strict_placeholders(mut self, strict: bool) -> Self {
        self.strict_placeholders = strict;
        self
    }

    /// Register a handler
    ///
    /// # Returns
    ///
    /// The handler ID assigned to this binding
    ///
    /// # Errors
    ///
    /// - `Error::InvalidHandler` for a document parameter on a verb without
    ///   body, more than one document parameter, duplicate parameter names,
    ///   a type without converter, a placeholder mapping the document
    ///   parameter or a `GET` on the reserved description path
    /// - `Error::AmbiguousPlaceholder` if placeholders share a query key
    /// - `Error::InvalidPlaceholder` in strict mode if a placeholder names no
    ///   parameter
    /// - `Error::RouteCollision` if an existing binding has the same
    ///   fingerprint
    pub fn register(&mut self, handler: HandlerDescriptor) -> Result<HandlerId> {
        self.validate_params(&handler)?;

        let binding = RouteBinding::with_converters(handler, Arc::clone(&self.converters));
        let name = binding.handler().qualified_name();
        let template = binding.template();

        if let Some(document) = binding
            .handler()
            .params()
            .iter()
            .find(|p| p.is_document() && template.lookup(&p.name).is_some())
        {
            return Err(Error::InvalidHandler {
                handler: name.to_string(),
                reason: format!(
                    "document parameter '{}' is mapped by a query placeholder",
                    document.name
                ),
            });
        }

        if let Some(reserved) = &self.description_path {
            if template.verb() == Verb::Get && template.path().eq_ignore_ascii_case(reserved) {
                return Err(Error::InvalidHandler {
                    handler: name.to_string(),
                    reason: format!("GET {reserved} is reserved for the service description"),
                });
            }
        }

        if let Some((key, placeholders)) =
            binding.template().ambiguous_parameter_names().into_iter().next()
        {
            return Err(Error::AmbiguousPlaceholder {
                handler: name.to_string(),
                key,
                placeholders,
            });
        }

        let invalid = binding.invalid_placeholders();
        if !invalid.is_empty() {
            if self.strict_placeholders {
                return Err(Error::InvalidPlaceholder {
                    handler: name.to_string(),
                    placeholders: invalid,
                });
            }
            warn!(handler = %name, placeholders = ?invalid, "template placeholders name no parameter");
        }

        if let Some(existing) = self
            .bindings
            .iter()
            .find(|b| b.fingerprint() == binding.fingerprint())
        {
            return Err(Error::RouteCollision {
                handler: name.to_string(),
                existing: existing.handler().qualified_name().to_string(),
                path: binding.template().path().to_string(),
                verb: binding.template().verb().to_string(),
            });
        }

        let handler_id = self.bindings.len();
        info!(
            handler = %name,
            verb = %binding.template().verb(),
            path = %binding.template().path(),
            fingerprint = %binding.fingerprint(),
            "registered handler"
        );
        self.bindings.push(binding);
        Ok(handler_id)
    }

    fn validate_params(&self, handler: &HandlerDescriptor) -> Result<()> {
        let invalid = |reason: String| Error::InvalidHandler {
            handler: handler.qualified_name().to_string(),
            reason,
        };

        let documents: Vec<&str> = handler
            .params()
            .iter()
            .filter(|p| p.is_document())
            .map(|p| p.name.as_str())
            .collect();
        if !documents.is_empty() && !handler.verb().accepts_document() {
            return Err(invalid(format!(
                "{} requests carry no document for parameter '{}'",
                handler.verb(),
                documents[0]
            )));
        }
        if documents.len() > 1 {
            return Err(invalid(format!(
                "more than one document parameter: {documents:?}"
            )));
        }

        for (i, param) in handler.params().iter().enumerate() {
            if handler.params()[..i]
                .iter()
                .any(|p| p.name.eq_ignore_ascii_case(&param.name))
            {
                return Err(invalid(format!("duplicate parameter '{}'", param.name)));
            }
            if !self.converters.supports(param.declared_type) {
                return Err(invalid(format!(
                    "no converter for type {} of parameter '{}'",
                    param.declared_type, param.name
                )));
            }
        }
        Ok(())
    }

    /// Select the binding serving a request
    ///
    /// Among matching bindings the one requiring the most query keys wins;
    /// ties go to the earliest registration. When bindings exist for the
    /// path and verb but none has all its required keys, the one requiring
    /// the fewest is returned so that binding reports the missing key.
    ///
    /// # Errors
    ///
    /// - `Error::MethodNotAllowed` if the path is registered for other verbs only
    /// - `Error::RouteNotFound` if no binding has the path
    pub fn find<S: AsRef<str>>(
        &self,
        path: &str,
        verb: &str,
        query_keys: &[S],
    ) -> Result<(HandlerId, &RouteBinding)> {
        let mut best: Option<(HandlerId, &RouteBinding, usize)> = None;
        let mut fallback: Option<(HandlerId, &RouteBinding, usize)> = None;

        for (id, binding) in self.bindings.iter().enumerate() {
            let template = binding.template();
            if !template.path().eq_ignore_ascii_case(path) || !template.verb().matches(verb) {
                continue;
            }
            let required = binding.required_parameters().len();
            if binding.is_match(path, verb, query_keys) {
                if best.map_or(true, |(_, _, r)| required > r) {
                    best = Some((id, binding, required));
                }
            } else if fallback.map_or(true, |(_, _, r)| required < r) {
                fallback = Some((id, binding, required));
            }
        }

        if let Some((id, binding, _)) = best.or(fallback) {
            return Ok((id, binding));
        }

        let path_known = self
            .bindings
            .iter()
            .any(|b| b.template().path().eq_ignore_ascii_case(path));
        if path_known {
            Err(Error::MethodNotAllowed {
                path: path.to_string(),
                verb: verb.to_string(),
            })
        } else {
            Err(Error::RouteNotFound {
                path: path.to_string(),
                verb: verb.to_string(),
            })
        }
    }

    /// Binding by handler ID
    #[must_use]
    pub fn binding(&self, handler_id: HandlerId) -> Option<&RouteBinding> {
        self.bindings.get(handler_id)
    }

    /// All bindings in registration order
    #[must_use]
    pub fn bindings(&self) -> &[RouteBinding] {
        &self.bindings
    }

    /// Number of registered handlers
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Check if nothing is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Describe every handler that opts into description
    #[must_use]
    pub fn describe(&self, base_uri: &str) -> ServiceDescription {
        ServiceDescription::from_bindings(&self.bindings, base_uri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::ParamSpec;
    use crate::types::{ConversionError, ParamType, ParamValue};

    fn search(template: &str, name: &str) -> HandlerDescriptor {
        HandlerDescriptor::builder(Verb::Get, template, name)
            .param(ParamSpec::query("query", ParamType::String))
            .build()
    }

    #[test]
    fn test_basic_registration() {
        let mut registry = Registry::new();

        let id1 = registry.register(search("/search?q={query}", "a")).unwrap();
        let id2 = registry
            .register(HandlerDescriptor::builder(Verb::Get, "/users", "b").build())
            .unwrap();
        let id3 = registry
            .register(HandlerDescriptor::builder(Verb::Post, "/users", "c").build())
            .unwrap();

        assert_eq!((id1, id2, id3), (0, 1, 2));
        assert_eq!(registry.len(), 3);

        let (id, _) = registry.find("/USERS", "post", &[] as &[&str]).unwrap();
        assert_eq!(id, 2);
        let (id, binding) = registry.find("/search", "GET", &["q"]).unwrap();
        assert_eq!(id, 0);
        assert_eq!(binding.handler().qualified_name(), "a");
    }

    #[test]
    fn test_mapped_document_parameter_rejected() {
        let mut registry = Registry::new();
        let handler = HandlerDescriptor::builder(Verb::Post, "/items?d={body}", "items::post")
            .param(ParamSpec::document("body"))
            .build();
        let err = registry.register(handler).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidHandler { ref reason, .. } if reason.contains("'body'")
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_description_path_reserved_when_describing() {
        let config = ServiceConfig {
            description_path: "docs".to_string(),
            ..ServiceConfig::default()
        };
        let mut registry = Registry::new().configured(&config);
        let docs = || HandlerDescriptor::builder(Verb::Get, "/Docs", "docs").build();
        assert!(matches!(
            registry.register(docs()),
            Err(Error::InvalidHandler { .. })
        ));
        registry
            .register(HandlerDescriptor::builder(Verb::Post, "/docs", "docs::post").build())
            .unwrap();

        let mut plain = Registry::new();
        plain.register(docs()).unwrap();

        let hidden = ServiceConfig {
            describe: false,
            ..config
        };
        let mut registry = Registry::new().configured(&hidden);
        registry.register(docs()).unwrap();
    }

    #[test]
    fn test_route_collision() {
        let mut registry = Registry::new();
        registry.register(search("/search?q={query}", "first")).unwrap();

        let err = registry
            .register(search("/Search?term={query}", "second"))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::RouteCollision { ref handler, ref existing, .. }
                if handler == "second" && existing == "first"
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_ambiguous_placeholder_rejected() {
        let mut registry = Registry::new();
        let handler = HandlerDescriptor::builder(Verb::Get, "/x?k={a}&K={b}", "x")
            .param(ParamSpec::query("a", ParamType::String))
            .param(ParamSpec::query("b", ParamType::String))
            .build();
        let err = registry.register(handler).unwrap_err();
        assert!(matches!(
            err,
            Error::AmbiguousPlaceholder { ref key, ref placeholders, .. }
                if key == "k" && placeholders == &["a", "b"]
        ));
    }

    #[test]
    fn test_invalid_placeholder_strictness() {
        let handler = || {
            HandlerDescriptor::builder(Verb::Get, "/x?f={foo}", "x")
                .param(ParamSpec::query("bar", ParamType::String))
                .build()
        };

        assert!(Registry::new().register(handler()).is_ok());

        let err = Registry::new()
            .strict_placeholders(true)
            .register(handler())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidPlaceholder { ref placeholders, .. } if placeholders == &["foo"]
        ));

        let config = ServiceConfig {
            strict_placeholders: true,
            ..ServiceConfig::default()
        };
        assert!(Registry::new().configured(&config).register(handler()).is_err());
    }

    #[test]
    fn test_document_parameter_requires_body_verb() {
        let mut registry = Registry::new();
        let get = HandlerDescriptor::builder(Verb::Get, "/items", "items::get")
            .param(ParamSpec::document("body"))
            .build();
        assert!(matches!(
            registry.register(get),
            Err(Error::InvalidHandler { .. })
        ));

        let two = HandlerDescriptor::builder(Verb::Post, "/items", "items::post")
            .param(ParamSpec::document("a"))
            .param(ParamSpec::document("b"))
            .build();
        assert!(matches!(
            registry.register(two),
            Err(Error::InvalidHandler { .. })
        ));
    }

    #[test]
    fn test_duplicate_parameter_rejected() {
        let handler = HandlerDescriptor::builder(Verb::Get, "/x", "x")
            .param(ParamSpec::query("id", ParamType::Int))
            .param(ParamSpec::query("ID", ParamType::Int))
            .build();
        assert!(matches!(
            Registry::new().register(handler),
            Err(Error::InvalidHandler { ref reason, .. }) if reason.contains("duplicate")
        ));
    }

    #[test]
    fn test_custom_type_needs_converter() {
        let sku = ParamType::Custom("sku");
        let handler = || {
            HandlerDescriptor::builder(Verb::Get, "/stock?sku={sku}", "stock")
                .param(ParamSpec::query("sku", sku))
                .build()
        };
        assert!(Registry::new().register(handler()).is_err());

        let mut converters = ConverterRegistry::new();
        converters.register(sku, |raw: &str| -> std::result::Result<ParamValue, ConversionError> {
            Ok(ParamValue::String(raw.to_uppercase()))
        });
        let mut registry = Registry::with_converters(converters);
        let id = registry.register(handler()).unwrap();

        let query = crate::query::QueryCollection::parse("sku=ab-1");
        let args = registry
            .binding(id)
            .unwrap()
            .map_parameters(&query, None)
            .unwrap();
        assert_eq!(args.values(), [ParamValue::String("AB-1".to_string())]);
    }

    #[test]
    fn test_most_specific_match_wins() {
        let mut registry = Registry::new();
        registry
            .register(HandlerDescriptor::builder(Verb::Get, "/items", "items::list").build())
            .unwrap();
        registry
            .register(
                HandlerDescriptor::builder(Verb::Get, "/items?id={id}", "items::one")
                    .param(ParamSpec::query("id", ParamType::Int))
                    .build(),
            )
            .unwrap();

        let (_, binding) = registry.find("/items", "GET", &["id"]).unwrap();
        assert_eq!(binding.handler().qualified_name(), "items::one");

        let (_, binding) = registry.find("/items", "GET", &["other"]).unwrap();
        assert_eq!(binding.handler().qualified_name(), "items::list");
    }

    #[test]
    fn test_fallback_reports_missing_key() {
        let mut registry = Registry::new();
        registry.register(search("/search?q={query}", "a")).unwrap();

        let (_, binding) = registry.find("/search", "GET", &[] as &[&str]).unwrap();
        let err = binding
            .map_parameters(&crate::query::QueryCollection::new(), None)
            .unwrap_err();
        assert_eq!(err.parameter_name, "q");
    }

    #[test]
    fn test_not_found_and_method_not_allowed() {
        let mut registry = Registry::new();
        registry.register(search("/search?q={query}", "a")).unwrap();

        assert!(matches!(
            registry.find("/nothing", "GET", &["q"]),
            Err(Error::RouteNotFound { .. })
        ));
        assert!(matches!(
            registry.find("/search", "DELETE", &["q"]),
            Err(Error::MethodNotAllowed { .. })
        ));
    }

    #[test]
    fn test_describe() {
        let mut registry = Registry::new();
        registry.register(search("/search?q={query}", "a")).unwrap();
        let description = registry.describe("http://localhost/");
        assert_eq!(description.handlers.len(), 1);
        assert_eq!(description.handlers[0].required_parameters, ["q"]);
    }
}

//! # Service Dispatcher
//!
//! Network-agnostic request processing on top of the [`Registry`]: finds
//! the binding, binds arguments, invokes the handler and serializes the
//! outcome. Listening for connections is left to the embedding server,
//! which hands requests to [`Service::handle`].
//!
//! ## Status codes
//!
//! - `200` handler result as JSON
//! - `400` missing or unconvertible query value, malformed document
//! - `404` / `405` no route for the path / verb
//! - `413` body over `max_body_size`
//! - `500` handler failure (details are logged, never returned)

use crate::config::ServiceConfig;
use crate::describe::ServiceDescription;
use crate::error::{Error, Result};
use crate::handler::{Handler, HandlerDescriptor};
use crate::json::{parse_document, to_json, to_json_pretty};
use crate::query::QueryCollection;
use crate::registry::{HandlerId, Registry};
use crate::types::ConverterRegistry;
use crate::verb::Verb;
use crate::validation::{FieldError, ValidationErrors};
use http_body_util::Full;
use percent_encoding::percent_decode_str;
pub use hyper::body::Bytes;
use hyper::{Request, Response, StatusCode};
use tracing::{debug, error, warn};

/// Response produced by the dispatcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: String,
    /// Content type
    pub content_type: String,
}

impl Default for ServiceResponse {
    fn default() -> Self {
        Self {
            status: 200,
            body: String::new(),
            content_type: "application/json".to_string(),
        }
    }
}

impl ServiceResponse {
    /// Create a JSON response
    #[must_use]
    pub fn json(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            ..Self::default()
        }
    }

    /// Create a JSON `{"error": message}` response
    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(serde_json::json!({ "error": message }).to_string()).with_status(status)
    }

    /// Set status code
    #[must_use]
    pub const fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Convert to hyper Response
    #[must_use]
    pub fn into_hyper(self) -> Response<Full<Bytes>> {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Response::builder()
            .status(status)
            .header("Content-Type", &self.content_type)
            .body(Full::new(Bytes::from(self.body)))
            .unwrap_or_else(|_| {
                let mut response =
                    Response::new(Full::new(Bytes::from_static(b"Internal Server Error")));
                *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                response
            })
    }
}

/// Registry plus handler callables
///
/// Built at startup, then shared read-only (e.g. behind `Arc`) by every
/// request.
pub struct Service {
    config: ServiceConfig,
    registry: Registry,
    handlers: Vec<Handler>,
}

impl Default for Service {
    fn default() -> Self {
        Self::new(ServiceConfig::default())
    }
}

impl Service {
    /// Create a new Service with the built-in converters
    #[must_use]
    pub fn new(config: ServiceConfig) -> Self {
        Self::with_converters(config, ConverterRegistry::default())
    }

    /// Create a new Service with application converters
    #[must_use]
    pub fn with_converters(config: ServiceConfig, converters: ConverterRegistry) -> Self {
        let registry = Registry::with_converters(converters).configured(&config);
        Self {
            config,
            registry,
            handlers: Vec::new(),
        }
    }

    /// Register a handler and its callable
    ///
    /// # Errors
    ///
    /// Propagates registration errors from [`Registry::register`]
    pub fn route(&mut self, descriptor: HandlerDescriptor, handler: Handler) -> Result<HandlerId> {
        let handler_id = self.registry.register(descriptor)?;
        self.handlers.push(handler);
        Ok(handler_id)
    }

    /// The underlying registry
    #[must_use]
    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Description of the documented handlers
    #[must_use]
    pub fn description(&self) -> ServiceDescription {
        self.registry.describe(&self.config.base_uri)
    }

    /// Process a request given as verb, path with query and raw body
    pub fn call(&self, verb: &str, path_and_query: &str, body: Option<&[u8]>) -> ServiceResponse {
        if let Some(b) = body {
            if b.len() > self.config.max_body_size {
                return ServiceResponse::error(413, "Payload Too Large");
            }
        }

        let (raw_path, query_string) = path_and_query
            .split_once('?')
            .unwrap_or((path_and_query, ""));
        let Ok(path) = percent_decode_str(raw_path).decode_utf8() else {
            debug!(path = %raw_path, "path is not valid UTF-8 once decoded");
            return ServiceResponse::error(400, "Bad Request");
        };
        let path: &str = &path;

        if self.config.describe
            && verb.eq_ignore_ascii_case("GET")
            && path.eq_ignore_ascii_case(&self.config.description_path)
        {
            return match to_json_pretty(&self.description()) {
                Ok(json) => ServiceResponse::json(json),
                Err(e) => {
                    error!("Failed to serialize service description: {}", e);
                    ServiceResponse::error(500, "Internal Server Error")
                }
            };
        }

        let query = QueryCollection::parse(query_string);
        let keys = query.keys();

        let (handler_id, binding) = match self.registry.find(path, verb, &keys) {
            Ok(found) => found,
            Err(Error::MethodNotAllowed { .. }) => {
                return ServiceResponse::error(405, "Method Not Allowed");
            }
            Err(e) => {
                debug!(error = %e, "no route");
                return ServiceResponse::error(404, "Not Found");
            }
        };
        let name = binding.handler().qualified_name();

        let document = match body {
            Some(b) if binding.template().verb().accepts_document() => match parse_document(b) {
                Ok(doc) => doc,
                Err(e) => {
                    warn!(handler = %name, error = %e, "rejected posted document");
                    return ServiceResponse::json(
                        ValidationErrors::from(FieldError::invalid_document()).to_json(),
                    )
                    .with_status(400);
                }
            },
            _ => None,
        };

        let args = match binding.map_parameters(&query, document.as_ref()) {
            Ok(args) => args,
            Err(e) => {
                warn!(
                    handler = %name,
                    parameter = %e.parameter_name,
                    raw_value = ?e.raw_value,
                    cause = ?e.cause,
                    "{}", e
                );
                return ServiceResponse::json(ValidationErrors::from(&e).to_json()).with_status(400);
            }
        };

        let Some(handler) = self.handlers.get(handler_id) else {
            error!(handler = %name, "no callable registered for handler");
            return ServiceResponse::error(500, "Internal Server Error");
        };

        match handler(&args).map_err(Error::from).and_then(|value| to_json(&value)) {
            Ok(json) => ServiceResponse::json(json),
            Err(e) => {
                error!(handler = %name, args = ?args.log_entries(), error = %e, "handler failed");
                ServiceResponse::error(500, "Internal Server Error")
            }
        }
    }

    /// Process an already-received hyper request
    ///
    /// Methods no handler can be declared for (e.g. `TRACE`) get `405`.
    pub fn handle(&self, req: Request<Bytes>) -> Response<Full<Bytes>> {
        let verb = match Verb::try_from(req.method()) {
            Ok(verb) => verb,
            Err(e) => {
                debug!(error = %e, "rejected request method");
                return ServiceResponse::error(405, "Method Not Allowed").into_hyper();
            }
        };
        let path_and_query = req
            .uri()
            .path_and_query()
            .map_or_else(|| "/".to_string(), |pq| pq.as_str().to_string());
        let body = req.into_body();
        let body = if body.is_empty() { None } else { Some(body.as_ref()) };

        self.call(verb.as_str(), &path_and_query, body).into_hyper()
    }
}

impl std::fmt::Debug for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Service")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

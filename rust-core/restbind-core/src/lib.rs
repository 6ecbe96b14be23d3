//! # RestBind Core
//!
//! Declarative HTTP-verb/URI-template routing and parameter binding.
//! Handlers declare a verb and a template such as
//! `items?id={itemId}&name={n}`; incoming requests are matched by path,
//! verb and query keys, and query values are converted into the handler's
//! typed arguments.
//!
//! ## Architecture
//!
//! Registration happens once at startup and is validated eagerly
//! (collisions, ambiguous or invalid placeholders). Afterwards the
//! [`Service`] is read-only and can be shared across request threads.
//!
//! ## Modules
//!
//! - `template` - URI template parsing (placeholder to query key)
//! - `binding` - Route matching, fingerprints and argument binding
//! - `registry` - Handler registration and lookup
//! - `service` - Request dispatch and hyper response conversion
//! - `handler` - Handler metadata and callables
//! - `types` - Parameter types and the conversion registry
//! - `query` - Multi-valued, case-insensitive query collection
//! - `describe` - Self-describing service metadata
//! - `validation` - Client-facing error bodies
//! - `json` - JSON parsing with simd-json
//! - `config` - Service configuration
//! - `logging` - Tracing initialization
//! - `error` - Error types and handling

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod binding;
pub mod config;
pub mod describe;
pub mod error;
pub mod handler;
pub mod json;
pub mod logging;
pub mod query;
pub mod registry;
pub mod service;
pub mod template;
pub mod types;
pub mod validation;
pub mod verb;

pub use binding::{BoundArguments, Fingerprint, RouteBinding};
pub use config::ServiceConfig;
pub use describe::{HandlerDescription, ParameterDescription, ServiceDescription};
pub use error::{BindingError, BindingErrorKind, Error, HandlerError, Result};
pub use handler::{handler, Handler, HandlerDescriptor, IntoHandlerResult, ParamKind, ParamSpec};
pub use json::{parse_json, to_json};
pub use logging::init_tracing;
pub use query::QueryCollection;
pub use registry::{HandlerId, Registry};
pub use service::{Service, ServiceResponse};
pub use template::TemplateDescriptor;
pub use types::{ConversionError, ConverterRegistry, FromParamValue, ParamConverter, ParamType, ParamValue};
pub use validation::{FieldError, ValidationCode, ValidationErrors};
pub use verb::Verb;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

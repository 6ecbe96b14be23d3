//! # Logging
//!
//! Structured JSON logging via `tracing-subscriber`.

use tracing::Subscriber;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

/// Default filter directive when `RUST_LOG` adds nothing more specific
pub const DEFAULT_DIRECTIVE: &str = "restbind_core=info";

fn directive_or_default(directive: &str) -> Option<Directive> {
    directive
        .parse::<Directive>()
        .or_else(|_| DEFAULT_DIRECTIVE.parse::<Directive>())
        .ok()
}

/// Build the JSON subscriber without installing it
///
/// Reads `RUST_LOG` and adds `directive`; an unparsable directive falls
/// back to [`DEFAULT_DIRECTIVE`].
pub fn subscriber(directive: &str) -> impl Subscriber + Send + Sync + 'static {
    let mut filter = EnvFilter::from_default_env();
    if let Some(directive) = directive_or_default(directive) {
        filter = filter.add_directive(directive);
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .finish()
}

/// Initialize tracing for the library
///
/// Installs [`subscriber`] globally. Calling it again after a subscriber
/// is installed is a no-op.
pub fn init_tracing(directive: &str) {
    let _ = tracing::subscriber::set_global_default(subscriber(directive));
}

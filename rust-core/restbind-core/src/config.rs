//! # Service Configuration
//!
//! Startup settings for the registry and the in-process dispatcher.

use crate::error::Result;
use crate::json::parse_json;
use serde::Deserialize;

/// Service configuration
///
/// Every field has a default, so a partial JSON object is a valid
/// configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Absolute base URI example URIs are resolved against
    pub base_uri: String,
    /// Max request body size in bytes
    pub max_body_size: usize,
    /// Reject templates with placeholders naming no handler parameter
    pub strict_placeholders: bool,
    /// Serve the service description
    pub describe: bool,
    /// Path the service description is served under
    pub description_path: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_uri: "http://127.0.0.1:8000/".to_string(),
            max_body_size: 1024 * 1024,
            strict_placeholders: false,
            describe: true,
            description_path: "/help".to_string(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from a JSON document
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidDocument` if `json` is not a valid configuration
    pub fn from_json(json: &str) -> Result<Self> {
        parse_json(json)
    }
}

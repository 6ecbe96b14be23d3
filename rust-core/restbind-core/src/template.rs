//! # URI Template Descriptor
//!
//! Parses a handler's URI template once at registration time.
//!
//! A template is a path optionally followed by query bindings:
//!
//! ```text
//! items?id={itemId}&name={n}
//! ```
//!
//! yields path `/items` and the mapping `itemId -> id`, `n -> name`, i.e.
//! placeholder (the token between braces, naming a handler parameter) to
//! parameter name (the literal query-string key).
//!
//! ## Design Principles
//!
//! - **S**: Only parses templates and answers lookups
//! - **D**: Knows nothing about handlers; `RouteBinding` pairs the two

use crate::verb::Verb;
use once_cell::sync::Lazy;
use regex::Regex;

/// `key={placeholder}` preceded by `?` or `&`
static QUERY_BINDING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[?&]([^?&={}]+)=\{([^{}?&]+)\}").expect("query binding pattern is valid")
});

/// Parsed URI template
///
/// Immutable after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateDescriptor {
    /// Normalized path, always starting with `/`, query suffix stripped
    path: String,
    /// Placeholder -> query key, in template order
    bindings: Vec<(String, String)>,
    /// Verb the template is declared for
    verb: Verb,
}

impl TemplateDescriptor {
    /// Parse `template` for the given verb
    ///
    /// A placeholder appearing twice keeps the key of its last occurrence.
    #[must_use]
    pub fn new(template: &str, verb: Verb) -> Self {
        let normalized = if template.starts_with('/') {
            template.to_string()
        } else {
            format!("/{template}")
        };

        let path = normalized
            .split_once('?')
            .map_or(normalized.as_str(), |(path, _)| path)
            .to_string();

        let mut bindings: Vec<(String, String)> = Vec::new();
        for caps in QUERY_BINDING.captures_iter(&normalized) {
            let key = caps[1].to_string();
            let placeholder = caps[2].to_string();
            match bindings.iter_mut().find(|(p, _)| *p == placeholder) {
                Some(existing) => existing.1 = key,
                None => bindings.push((placeholder, key)),
            }
        }

        Self {
            path,
            bindings,
            verb,
        }
    }

    /// Normalized path
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Declared verb
    #[must_use]
    pub const fn verb(&self) -> Verb {
        self.verb
    }

    /// Number of placeholder bindings
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether the template declares no query bindings
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Query key a placeholder is bound to, if the template declares it
    ///
    /// Exact match first, then case-insensitive.
    #[must_use]
    pub fn lookup(&self, placeholder: &str) -> Option<&str> {
        self.bindings
            .iter()
            .find(|(p, _)| p == placeholder)
            .or_else(|| {
                self.bindings
                    .iter()
                    .find(|(p, _)| p.eq_ignore_ascii_case(placeholder))
            })
            .map(|(_, key)| key.as_str())
    }

    /// Query key for a placeholder
    ///
    /// Falls back to the placeholder itself when the template does not
    /// declare it.
    #[must_use]
    pub fn parameter_name<'a>(&'a self, placeholder: &'a str) -> &'a str {
        self.lookup(placeholder).unwrap_or(placeholder)
    }

    /// Placeholder bound to a query key (case-insensitive)
    ///
    /// The first placeholder in template order wins; see
    /// [`TemplateDescriptor::ambiguous_parameter_names`]. Falls back to the
    /// key itself.
    #[must_use]
    pub fn placeholder<'a>(&'a self, parameter_name: &'a str) -> &'a str {
        self.bindings
            .iter()
            .find(|(_, key)| key.eq_ignore_ascii_case(parameter_name))
            .map_or(parameter_name, |(p, _)| p.as_str())
    }

    /// Query keys, in template order
    pub fn parameter_names(&self) -> impl Iterator<Item = &str> {
        self.bindings.iter().map(|(_, key)| key.as_str())
    }

    /// Placeholders, in template order
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.bindings.iter().map(|(p, _)| p.as_str())
    }

    /// Query keys that more than one placeholder maps to
    ///
    /// Each entry is the key (as first written) and its placeholders.
    #[must_use]
    pub fn ambiguous_parameter_names(&self) -> Vec<(String, Vec<String>)> {
        let mut groups: Vec<(String, Vec<String>)> = Vec::new();
        for (placeholder, key) in &self.bindings {
            match groups.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(key)) {
                Some((_, placeholders)) => placeholders.push(placeholder.clone()),
                None => groups.push((key.clone(), vec![placeholder.clone()])),
            }
        }
        groups.retain(|(_, placeholders)| placeholders.len() > 1);
        groups
    }
}

//! # Type System for Handler Parameters
//!
//! SOLID-compliant type conversion system for query-string parameters.
//!
//! ## Design Principles
//!
//! - **S**: Single responsibility - each converter handles one type
//! - **O**: Open for extension via `ParamConverter` trait
//! - **L**: All converters are substitutable via trait
//! - **I**: Small, focused `ParamConverter` trait
//! - **D**: Bindings depend on `ConverterRegistry`, not concrete converters

use crate::error::HandlerError;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::num::{ParseFloatError, ParseIntError};
use std::sync::Arc;
use thiserror::Error;

/// Declared type of a handler parameter
///
/// Used during handler registration to select the converter for
/// query-string values. Default is `String`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParamType {
    /// String type (default) - no conversion
    #[default]
    String,
    /// Integer type - parses to i64
    Int,
    /// Unsigned integer type - parses to u64
    UInt,
    /// Float type - parses to f64
    Float,
    /// Boolean type - parses "true"/"false", "1"/"0" or "yes"/"no"
    Bool,
    /// JSON value embedded in the query string
    Json,
    /// Application-defined type resolved through a registered converter
    Custom(&'static str),
}

impl ParamType {
    /// Get the type name for error messages
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::UInt => "uint",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Json => "json",
            Self::Custom(name) => *name,
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// Bound parameter value
///
/// Holds the actual typed value after conversion, or the posted document
/// for document-bound parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// String value (no conversion performed)
    String(String),
    /// Integer value (i64)
    Int(i64),
    /// Unsigned integer value (u64)
    UInt(u64),
    /// Float value (f64)
    Float(f64),
    /// Boolean value
    Bool(bool),
    /// Structured value (JSON query values and posted documents)
    Json(serde_json::Value),
    /// No value (absent posted document, `None` defaults)
    Null,
}

impl ParamValue {
    /// Name of the variant, for diagnostics
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Int(_) => "int",
            Self::UInt(_) => "uint",
            Self::Float(_) => "float",
            Self::Bool(_) => "bool",
            Self::Json(_) => "json",
            Self::Null => "null",
        }
    }

    /// Check if value is a string
    #[must_use]
    pub const fn is_string(&self) -> bool {
        matches!(self, Self::String(_))
    }

    /// Check if value is null
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get as &str if String variant
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as i64 if Int variant
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as u64 if UInt variant
    #[must_use]
    pub const fn as_uint(&self) -> Option<u64> {
        match self {
            Self::UInt(u) => Some(*u),
            _ => None,
        }
    }

    /// Get as f64 if Float variant
    #[must_use]
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get as bool if Bool variant
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as JSON if Json variant
    #[must_use]
    pub const fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::UInt(u) => write!(f, "{u}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Json(v) => write!(f, "{v}"),
            Self::Null => write!(f, "null"),
        }
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u64> for ParamValue {
    fn from(value: u64) -> Self {
        Self::UInt(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        Self::UInt(u64::from(value))
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<serde_json::Value> for ParamValue {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for ParamValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Reason a raw query value could not be converted
#[derive(Error, Debug)]
pub enum ConversionError {
    /// Not a valid integer
    #[error("invalid integer: {0}")]
    Int(#[from] ParseIntError),

    /// Not a valid float
    #[error("invalid float: {0}")]
    Float(#[from] ParseFloatError),

    /// Not a recognised boolean literal
    #[error("'{0}' is not a boolean")]
    Bool(String),

    /// Not valid JSON
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// No converter registered for the target type
    #[error("no converter registered for type {0}")]
    Unsupported(ParamType),

    /// Rejected by an application-defined converter
    #[error("{0}")]
    Custom(String),
}

/// Converts a raw query-string value into a typed value
///
/// Converters never panic; failures are reported as `ConversionError`.
pub trait ParamConverter: Send + Sync {
    /// Convert `raw` to a typed value
    ///
    /// # Errors
    ///
    /// Returns a `ConversionError` if `raw` is not a valid value of the
    /// converter's type.
    fn convert(&self, raw: &str) -> Result<ParamValue, ConversionError>;
}

impl<F> ParamConverter for F
where
    F: Fn(&str) -> Result<ParamValue, ConversionError> + Send + Sync,
{
    fn convert(&self, raw: &str) -> Result<ParamValue, ConversionError> {
        self(raw)
    }
}

struct StringConverter;

impl ParamConverter for StringConverter {
    fn convert(&self, raw: &str) -> Result<ParamValue, ConversionError> {
        Ok(ParamValue::String(raw.to_string()))
    }
}

struct IntConverter;

impl ParamConverter for IntConverter {
    fn convert(&self, raw: &str) -> Result<ParamValue, ConversionError> {
        Ok(ParamValue::Int(raw.trim().parse::<i64>()?))
    }
}

struct UIntConverter;

impl ParamConverter for UIntConverter {
    fn convert(&self, raw: &str) -> Result<ParamValue, ConversionError> {
        Ok(ParamValue::UInt(raw.trim().parse::<u64>()?))
    }
}

struct FloatConverter;

impl ParamConverter for FloatConverter {
    fn convert(&self, raw: &str) -> Result<ParamValue, ConversionError> {
        Ok(ParamValue::Float(raw.trim().parse::<f64>()?))
    }
}

struct BoolConverter;

impl ParamConverter for BoolConverter {
    fn convert(&self, raw: &str) -> Result<ParamValue, ConversionError> {
        match raw.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(ParamValue::Bool(true)),
            "false" | "0" | "no" => Ok(ParamValue::Bool(false)),
            _ => Err(ConversionError::Bool(raw.to_string())),
        }
    }
}

struct JsonConverter;

impl ParamConverter for JsonConverter {
    fn convert(&self, raw: &str) -> Result<ParamValue, ConversionError> {
        Ok(ParamValue::Json(serde_json::from_str(raw)?))
    }
}

/// Converter lookup keyed by target type
///
/// Built once at startup with the built-in converters; applications add
/// converters for `ParamType::Custom` types with [`ConverterRegistry::register`].
#[derive(Clone)]
pub struct ConverterRegistry {
    converters: HashMap<ParamType, Arc<dyn ParamConverter>>,
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(ParamType::String, StringConverter);
        registry.register(ParamType::Int, IntConverter);
        registry.register(ParamType::UInt, UIntConverter);
        registry.register(ParamType::Float, FloatConverter);
        registry.register(ParamType::Bool, BoolConverter);
        registry.register(ParamType::Json, JsonConverter);
        registry
    }
}

impl ConverterRegistry {
    /// Registry with the built-in converters
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry without any converter
    #[must_use]
    pub fn empty() -> Self {
        Self {
            converters: HashMap::new(),
        }
    }

    /// Register or replace the converter for `param_type`
    pub fn register<C: ParamConverter + 'static>(&mut self, param_type: ParamType, converter: C) {
        self.converters.insert(param_type, Arc::new(converter));
    }

    /// Check whether a converter exists for `param_type`
    #[must_use]
    pub fn supports(&self, param_type: ParamType) -> bool {
        self.converters.contains_key(&param_type)
    }

    /// Convert raw string to typed value based on `ParamType`
    ///
    /// # Errors
    ///
    /// Returns `ConversionError::Unsupported` if no converter is registered
    /// for the type, or the converter's own error if `raw` is invalid.
    pub fn convert(&self, raw: &str, param_type: ParamType) -> Result<ParamValue, ConversionError> {
        self.converters
            .get(&param_type)
            .ok_or(ConversionError::Unsupported(param_type))?
            .convert(raw)
    }
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterRegistry")
            .field("types", &self.converters.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Rust types a bound argument can be extracted into
///
/// Implemented for the types the built-in converters produce; used by
/// handler callables (and the `#[route]` macro) to read `BoundArguments`.
pub trait FromParamValue: Sized {
    /// Parameter type to declare for this Rust type
    const PARAM_TYPE: ParamType;

    /// Whether an absent value binds to `ParamValue::Null`
    const OPTIONAL: bool = false;

    /// Extract the Rust value from a bound argument
    ///
    /// # Errors
    ///
    /// Returns `HandlerError::ArgumentType` if the bound variant differs.
    fn from_param(value: &ParamValue, position: usize) -> Result<Self, HandlerError>;
}

fn mismatch(position: usize, expected: &'static str, value: &ParamValue) -> HandlerError {
    HandlerError::ArgumentType {
        position,
        expected,
        actual: value.type_name(),
    }
}

impl FromParamValue for String {
    const PARAM_TYPE: ParamType = ParamType::String;

    fn from_param(value: &ParamValue, position: usize) -> Result<Self, HandlerError> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| mismatch(position, "string", value))
    }
}

impl FromParamValue for i64 {
    const PARAM_TYPE: ParamType = ParamType::Int;

    fn from_param(value: &ParamValue, position: usize) -> Result<Self, HandlerError> {
        value.as_int().ok_or_else(|| mismatch(position, "int", value))
    }
}

impl FromParamValue for u64 {
    const PARAM_TYPE: ParamType = ParamType::UInt;

    fn from_param(value: &ParamValue, position: usize) -> Result<Self, HandlerError> {
        value.as_uint().ok_or_else(|| mismatch(position, "uint", value))
    }
}

impl FromParamValue for f64 {
    const PARAM_TYPE: ParamType = ParamType::Float;

    fn from_param(value: &ParamValue, position: usize) -> Result<Self, HandlerError> {
        value.as_float().ok_or_else(|| mismatch(position, "float", value))
    }
}

impl FromParamValue for bool {
    const PARAM_TYPE: ParamType = ParamType::Bool;

    fn from_param(value: &ParamValue, position: usize) -> Result<Self, HandlerError> {
        value.as_bool().ok_or_else(|| mismatch(position, "bool", value))
    }
}

impl FromParamValue for serde_json::Value {
    const PARAM_TYPE: ParamType = ParamType::Json;

    fn from_param(value: &ParamValue, position: usize) -> Result<Self, HandlerError> {
        match value {
            ParamValue::Json(v) => Ok(v.clone()),
            ParamValue::Null => Ok(Self::Null),
            other => Err(mismatch(position, "json", other)),
        }
    }
}

impl<T: FromParamValue> FromParamValue for Option<T> {
    const PARAM_TYPE: ParamType = T::PARAM_TYPE;
    const OPTIONAL: bool = true;

    fn from_param(value: &ParamValue, position: usize) -> Result<Self, HandlerError> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_param(value, position).map(Some)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_string() {
        let registry = ConverterRegistry::new();
        let result = registry.convert("hello", ParamType::String).unwrap();
        assert_eq!(result, ParamValue::String("hello".to_string()));
    }

    #[test]
    fn test_convert_int() {
        let registry = ConverterRegistry::new();
        assert_eq!(registry.convert("123", ParamType::Int).unwrap(), ParamValue::Int(123));
        assert_eq!(registry.convert("-456", ParamType::Int).unwrap(), ParamValue::Int(-456));
    }

    #[test]
    fn test_convert_int_invalid() {
        let registry = ConverterRegistry::new();
        let err = registry.convert("abc", ParamType::Int).unwrap_err();
        assert!(matches!(err, ConversionError::Int(_)));
    }

    #[test]
    fn test_convert_uint_rejects_negative() {
        let registry = ConverterRegistry::new();
        assert_eq!(registry.convert("7", ParamType::UInt).unwrap(), ParamValue::UInt(7));
        assert!(registry.convert("-7", ParamType::UInt).is_err());
    }

    #[test]
    fn test_convert_float() {
        let registry = ConverterRegistry::new();
        let result = registry.convert("2.5", ParamType::Float).unwrap();
        assert_eq!(result, ParamValue::Float(2.5));
    }

    #[test]
    fn test_convert_bool() {
        let registry = ConverterRegistry::new();
        assert_eq!(registry.convert("true", ParamType::Bool).unwrap(), ParamValue::Bool(true));
        assert_eq!(registry.convert("False", ParamType::Bool).unwrap(), ParamValue::Bool(false));
        assert_eq!(registry.convert("1", ParamType::Bool).unwrap(), ParamValue::Bool(true));
        assert_eq!(registry.convert("no", ParamType::Bool).unwrap(), ParamValue::Bool(false));
        assert!(matches!(
            registry.convert("maybe", ParamType::Bool),
            Err(ConversionError::Bool(_))
        ));
    }

    #[test]
    fn test_convert_json() {
        let registry = ConverterRegistry::new();
        let result = registry.convert(r#"{"a":1}"#, ParamType::Json).unwrap();
        assert_eq!(result, ParamValue::Json(serde_json::json!({"a": 1})));
        assert!(registry.convert("{", ParamType::Json).is_err());
    }

    #[test]
    fn test_custom_converter() {
        let mut registry = ConverterRegistry::new();
        let sku = ParamType::Custom("sku");
        assert!(matches!(
            registry.convert("AB-1", sku),
            Err(ConversionError::Unsupported(_))
        ));

        registry.register(sku, |raw: &str| {
            if raw.starts_with("AB-") {
                Ok(ParamValue::String(raw.to_uppercase()))
            } else {
                Err(ConversionError::Custom(format!("'{raw}' is not a SKU")))
            }
        });

        assert!(registry.supports(sku));
        assert_eq!(
            registry.convert("AB-x1", sku).unwrap(),
            ParamValue::String("AB-X1".to_string())
        );
        assert!(registry.convert("zz", sku).is_err());
    }

    #[test]
    fn test_param_value_display() {
        assert_eq!(ParamValue::Int(42).to_string(), "42");
        assert_eq!(ParamValue::Float(2.5).to_string(), "2.5");
        assert_eq!(ParamValue::Bool(true).to_string(), "true");
        assert_eq!(ParamValue::Null.to_string(), "null");
    }

    #[test]
    fn test_from_param_value() {
        assert_eq!(i64::from_param(&ParamValue::Int(3), 0).unwrap(), 3);
        assert!(i64::from_param(&ParamValue::Bool(true), 0).is_err());
        assert_eq!(Option::<i64>::from_param(&ParamValue::Null, 0).unwrap(), None);
        assert_eq!(
            Option::<String>::from_param(&ParamValue::from("x"), 1).unwrap(),
            Some("x".to_string())
        );
        assert_eq!(ParamValue::from(None::<i64>), ParamValue::Null);
    }
}

//! Typed values stored in session and settings entries.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A single scalar value.
///
/// Serialized untagged, so JSON `true`, `42`, `21.5` and `"on"` map to the
/// matching variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl Value {
    /// Convert a decoded JSON value, rejecting anything that is not a scalar.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnsupportedValue`] for `null`, arrays and
    /// objects, or numbers that fit neither `i64` nor `f64`.
    pub fn from_json(key: &str, json: serde_json::Value) -> Result<Self, ValidationError> {
        let unsupported = || ValidationError::UnsupportedValue {
            key: key.to_string(),
        };
        match json {
            serde_json::Value::Bool(b) => Ok(Self::Bool(b)),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_f64().map(Self::Float))
                .ok_or_else(unsupported),
            serde_json::Value::String(s) => Ok(Self::String(s)),
            serde_json::Value::Null | serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
                Err(unsupported())
            }
        }
    }

    /// Trim string payloads; other variants are returned as-is.
    #[must_use]
    pub fn normalized(self) -> Self {
        match self {
            Self::String(s) => {
                let trimmed = s.trim();
                if trimmed.len() == s.len() {
                    Self::String(s)
                } else {
                    Self::String(trimmed.to_string())
                }
            }
            other => other,
        }
    }

    /// Interpret the value as a boolean.
    ///
    /// Strings accept `true/false`, `on/off`, `yes/no` and `1/0` in any case.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Int(0) => Some(false),
            Self::Int(1) => Some(true),
            Self::Int(_) | Self::Float(_) => None,
            Self::String(s) => match s.trim().to_ascii_uppercase().as_str() {
                "TRUE" | "ON" | "YES" | "1" => Some(true),
                "FALSE" | "OFF" | "NO" | "0" => Some(false),
                _ => None,
            },
        }
    }

    /// Interpret the value as a floating point number.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::String(s) => s.trim().parse().ok(),
            Self::Bool(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_serialize_string_variant_as_plain_string() {
        let json = serde_json::to_string(&Value::from("hello")).unwrap();
        assert_eq!(json, "\"hello\"");
    }

    #[test]
    fn should_deserialize_numbers_into_int_or_float() {
        let int: Value = serde_json::from_str("42").unwrap();
        let float: Value = serde_json::from_str("21.5").unwrap();
        assert_eq!(int, Value::Int(42));
        assert_eq!(float, Value::Float(21.5));
    }

    #[test]
    fn should_reject_objects_from_json() {
        let result = Value::from_json("k", serde_json::json!({"a": 1}));
        assert!(matches!(
            result,
            Err(ValidationError::UnsupportedValue { .. })
        ));
    }

    #[test]
    fn should_reject_null_from_json() {
        assert!(Value::from_json("k", serde_json::Value::Null).is_err());
    }

    #[test]
    fn should_trim_strings_when_normalized() {
        assert_eq!(Value::from("  on ").normalized(), Value::from("on"));
        assert_eq!(Value::Int(3).normalized(), Value::Int(3));
    }

    #[test]
    fn should_parse_boolean_spellings() {
        assert_eq!(Value::from("TRUE").as_bool(), Some(true));
        assert_eq!(Value::from("off").as_bool(), Some(false));
        assert_eq!(Value::from("Yes").as_bool(), Some(true));
        assert_eq!(Value::Int(0).as_bool(), Some(false));
        assert_eq!(Value::from("maybe").as_bool(), None);
    }

    #[test]
    fn should_parse_numbers_from_strings() {
        assert_eq!(Value::from(" 12.5 ").as_f64(), Some(12.5));
        assert_eq!(Value::Int(7).as_f64(), Some(7.0));
        assert_eq!(Value::Bool(true).as_f64(), None);
    }

    #[test]
    fn should_distinguish_int_and_float_of_same_magnitude() {
        assert_ne!(Value::Int(1), Value::Float(1.0));
    }
}

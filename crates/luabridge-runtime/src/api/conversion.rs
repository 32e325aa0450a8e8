//! Typed conversion between Rust values and host values
//!
//! Provides traits and implementations for bidirectional conversion:
//! - `ToHost` - Convert Rust types to [`HostValue`]
//! - `FromHost` - Convert [`HostValue`] to Rust types
//!
//! Lua has a single number type, so numbers may come back from a script as
//! either `Int` or `Float`. `FromHost for f64` accepts both; `FromHost for
//! i64` accepts a `Float` only when it has no fractional part.
//!
//! # Examples
//!
//! ```
//! use luabridge_runtime::api::{FromHost, ToHost};
//! use luabridge_runtime::HostValue;
//!
//! // Rust to host
//! let number: HostValue = 42.0.to_host();
//! let text: HostValue = "hello".to_string().to_host();
//!
//! // Host to Rust
//! let rust_number: f64 = FromHost::from_host(&number).unwrap();
//! let rust_string: String = FromHost::from_host(&text).unwrap();
//! assert_eq!(rust_number, 42.0);
//! assert_eq!(rust_string, "hello");
//! ```

use crate::value::HostValue;
use std::collections::HashMap;
use thiserror::Error;

/// Error type for value conversion failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    /// Type mismatch during conversion
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    /// Array element type mismatch
    #[error("Array element type mismatch at index {index}: expected {expected}, found {found}")]
    ArrayElementTypeMismatch {
        index: usize,
        expected: String,
        found: String,
    },

    /// Object value type mismatch
    #[error("Object value type mismatch for key '{key}': expected {expected}, found {found}")]
    ObjectValueTypeMismatch {
        key: String,
        expected: String,
        found: String,
    },
}

impl ConversionError {
    fn mismatch(expected: &str, found: &HostValue) -> Self {
        ConversionError::TypeMismatch {
            expected: expected.to_string(),
            found: found.type_name().to_string(),
        }
    }
}

/// Trait for converting a [`HostValue`] to Rust types
pub trait FromHost: Sized {
    /// Convert from a host value to the Rust type
    ///
    /// # Errors
    ///
    /// Returns `ConversionError` if the value cannot be converted to the target type.
    fn from_host(value: &HostValue) -> Result<Self, ConversionError>;
}

/// Trait for converting Rust types to a [`HostValue`]
pub trait ToHost {
    fn to_host(self) -> HostValue;
}

// Numbers

impl FromHost for f64 {
    fn from_host(value: &HostValue) -> Result<Self, ConversionError> {
        match value {
            HostValue::Float(f) => Ok(*f),
            HostValue::Int(i) => Ok(*i as f64),
            _ => Err(ConversionError::mismatch("number", value)),
        }
    }
}

impl ToHost for f64 {
    fn to_host(self) -> HostValue {
        HostValue::Float(self)
    }
}

impl FromHost for i64 {
    fn from_host(value: &HostValue) -> Result<Self, ConversionError> {
        match value {
            HostValue::Int(i) => Ok(*i),
            HostValue::Float(f)
                if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 =>
            {
                Ok(*f as i64)
            }
            _ => Err(ConversionError::mismatch("integer", value)),
        }
    }
}

impl ToHost for i64 {
    fn to_host(self) -> HostValue {
        HostValue::Int(self)
    }
}

// Strings

impl FromHost for String {
    fn from_host(value: &HostValue) -> Result<Self, ConversionError> {
        match value {
            HostValue::String(bytes) => Ok(String::from_utf8_lossy(bytes).into_owned()),
            _ => Err(ConversionError::mismatch("string", value)),
        }
    }
}

impl ToHost for String {
    fn to_host(self) -> HostValue {
        HostValue::String(self.into_bytes())
    }
}

impl ToHost for &str {
    fn to_host(self) -> HostValue {
        HostValue::String(self.as_bytes().to_vec())
    }
}

impl ToHost for &String {
    fn to_host(self) -> HostValue {
        HostValue::String(self.as_bytes().to_vec())
    }
}

// Booleans

impl FromHost for bool {
    fn from_host(value: &HostValue) -> Result<Self, ConversionError> {
        match value {
            HostValue::Bool(b) => Ok(*b),
            _ => Err(ConversionError::mismatch("bool", value)),
        }
    }
}

impl ToHost for bool {
    fn to_host(self) -> HostValue {
        HostValue::Bool(self)
    }
}

// Unit

impl FromHost for () {
    fn from_host(value: &HostValue) -> Result<Self, ConversionError> {
        match value {
            HostValue::Null => Ok(()),
            _ => Err(ConversionError::mismatch("null", value)),
        }
    }
}

impl ToHost for () {
    fn to_host(self) -> HostValue {
        HostValue::Null
    }
}

// Option: None <-> Null

impl<T: FromHost> FromHost for Option<T> {
    fn from_host(value: &HostValue) -> Result<Self, ConversionError> {
        match value {
            HostValue::Null => Ok(None),
            other => T::from_host(other).map(Some),
        }
    }
}

impl<T: ToHost> ToHost for Option<T> {
    fn to_host(self) -> HostValue {
        match self {
            Some(value) => value.to_host(),
            None => HostValue::Null,
        }
    }
}

// Arrays

impl<T: FromHost> FromHost for Vec<T> {
    fn from_host(value: &HostValue) -> Result<Self, ConversionError> {
        let items = match value {
            HostValue::Array(items) => items,
            _ => return Err(ConversionError::mismatch("array", value)),
        };

        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                T::from_host(item).map_err(|err| match err {
                    ConversionError::TypeMismatch { expected, found } => {
                        ConversionError::ArrayElementTypeMismatch {
                            index,
                            expected,
                            found,
                        }
                    }
                    nested => nested,
                })
            })
            .collect()
    }
}

impl<T: ToHost> ToHost for Vec<T> {
    fn to_host(self) -> HostValue {
        HostValue::Array(self.into_iter().map(ToHost::to_host).collect())
    }
}

// Objects

impl<T: FromHost> FromHost for HashMap<String, T> {
    fn from_host(value: &HostValue) -> Result<Self, ConversionError> {
        let fields = match value {
            HostValue::Object(fields) => fields,
            _ => return Err(ConversionError::mismatch("object", value)),
        };

        fields
            .iter()
            .map(|(key, field)| {
                T::from_host(field)
                    .map(|converted| (key.clone(), converted))
                    .map_err(|err| match err {
                        ConversionError::TypeMismatch { expected, found } => {
                            ConversionError::ObjectValueTypeMismatch {
                                key: key.clone(),
                                expected,
                                found,
                            }
                        }
                        nested => nested,
                    })
            })
            .collect()
    }
}

impl<T: ToHost> ToHost for HashMap<String, T> {
    fn to_host(self) -> HostValue {
        HostValue::Object(
            self.into_iter()
                .map(|(key, value)| (key, value.to_host()))
                .collect(),
        )
    }
}

impl FromHost for HostValue {
    fn from_host(value: &HostValue) -> Result<Self, ConversionError> {
        Ok(value.clone())
    }
}

impl ToHost for HostValue {
    fn to_host(self) -> HostValue {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_f64_accepts_int() {
        assert_eq!(f64::from_host(&HostValue::Int(2)).unwrap(), 2.0);
        assert_eq!(f64::from_host(&HostValue::Float(2.5)).unwrap(), 2.5);
    }

    #[test]
    fn test_f64_wrong_type() {
        let err = f64::from_host(&HostValue::Bool(true)).unwrap_err();
        assert_eq!(
            err,
            ConversionError::TypeMismatch {
                expected: "number".to_string(),
                found: "bool".to_string(),
            }
        );
    }

    #[test]
    fn test_i64_from_integral_float() {
        assert_eq!(i64::from_host(&HostValue::Float(7.0)).unwrap(), 7);
        assert!(i64::from_host(&HostValue::Float(7.5)).is_err());
    }

    #[test]
    fn test_string_round_trip() {
        let value = "hello".to_host();
        assert_eq!(String::from_host(&value).unwrap(), "hello");
        assert!(String::from_host(&HostValue::Int(1)).is_err());
    }

    #[test]
    fn test_unit() {
        assert_eq!(().to_host(), HostValue::Null);
        assert!(<()>::from_host(&HostValue::Null).is_ok());
        assert!(<()>::from_host(&HostValue::Bool(false)).is_err());
    }

    #[test]
    fn test_option() {
        assert_eq!(Some(1.5).to_host(), HostValue::Float(1.5));
        assert_eq!(None::<f64>.to_host(), HostValue::Null);
        assert_eq!(Option::<bool>::from_host(&HostValue::Null).unwrap(), None);
        assert_eq!(
            Option::<bool>::from_host(&HostValue::Bool(true)).unwrap(),
            Some(true)
        );
    }

    #[test]
    fn test_vec_element_mismatch() {
        let value = HostValue::Array(vec![HostValue::Int(1), HostValue::from("two")]);
        let err = Vec::<i64>::from_host(&value).unwrap_err();
        assert_eq!(
            err,
            ConversionError::ArrayElementTypeMismatch {
                index: 1,
                expected: "integer".to_string(),
                found: "string".to_string(),
            }
        );
    }

    #[test]
    fn test_nested_vec_option_string() {
        let value = vec![Some("a".to_string()), None].to_host();
        let back: Vec<Option<String>> = FromHost::from_host(&value).unwrap();
        assert_eq!(back, vec![Some("a".to_string()), None]);
    }

    #[test]
    fn test_hashmap_value_mismatch() {
        let value = HostValue::object([("port", HostValue::from("eighty"))]);
        let err = HashMap::<String, i64>::from_host(&value).unwrap_err();
        assert!(matches!(
            err,
            ConversionError::ObjectValueTypeMismatch { ref key, .. } if key == "port"
        ));
    }

    #[test]
    fn test_hashmap_to_host_creates_object() {
        let map = HashMap::from([("a".to_string(), 1i64), ("b".to_string(), 2i64)]);
        let value = map.to_host();
        assert_eq!(value.get("a"), Some(&HostValue::Int(1)));
        assert_eq!(value.get("b"), Some(&HostValue::Int(2)));
    }
}

//! Host value model
//!
//! `HostValue` is the closed set of dynamic values the embedding program
//! exchanges with the script runtime. Data variants are plain owned trees;
//! functions and opaque payloads are shared handles compared by identity.

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Host callable signature
pub type HostFn = dyn Fn(&[HostValue]) -> Result<HostValue, HostError> + Send + Sync;

/// Errors raised by host callables
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HostError {
    /// Argument had the wrong type
    #[error("Type error: {msg}")]
    TypeError { msg: String },
    /// Wrong number of arguments for a fixed-arity function
    #[error("Function '{name}' expects {expected} argument{}, got {got}", plural(.expected))]
    Arity {
        name: String,
        expected: usize,
        got: usize,
    },
    /// Free-form failure
    #[error("{0}")]
    Message(String),
}

fn plural(n: &usize) -> &'static str {
    if *n == 1 {
        ""
    } else {
        "s"
    }
}

impl HostError {
    /// Convenience constructor for [`HostError::Message`]
    pub fn msg(msg: impl Into<String>) -> Self {
        HostError::Message(msg.into())
    }
}

/// A host function that can be exposed to scripts.
///
/// Cloning shares the underlying closure; the registry uses that identity to
/// avoid bridging the same function twice.
#[derive(Clone)]
pub struct HostFunction {
    name: Arc<str>,
    arity: Option<usize>,
    func: Arc<HostFn>,
}

impl HostFunction {
    /// Wrap a closure. `arity` is a hint only and is not enforced here.
    pub fn new<F>(name: impl Into<Arc<str>>, arity: Option<usize>, func: F) -> Self
    where
        F: Fn(&[HostValue]) -> Result<HostValue, HostError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            arity,
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared argument count, if known
    pub fn arity(&self) -> Option<usize> {
        self.arity
    }

    /// Invoke the function
    pub fn call(&self, args: &[HostValue]) -> Result<HostValue, HostError> {
        (self.func)(args)
    }

    /// Stable identity of the shared closure
    pub(crate) fn identity(&self) -> usize {
        Arc::as_ptr(&self.func) as *const () as usize
    }

    pub fn ptr_eq(&self, other: &HostFunction) -> bool {
        self.identity() == other.identity()
    }
}

impl fmt::Debug for HostFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

/// Opaque host payload. Never convertible to a script value.
#[derive(Clone)]
pub struct Opaque {
    type_name: &'static str,
    inner: Arc<dyn Any + Send + Sync>,
}

impl Opaque {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            inner: Arc::new(value),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    pub fn ptr_eq(&self, other: &Opaque) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Opaque<{}>", self.type_name)
    }
}

/// Dynamic host value
#[derive(Debug, Clone, Default)]
pub enum HostValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Raw bytes; no encoding is enforced
    String(Vec<u8>),
    Array(Vec<HostValue>),
    Object(HashMap<String, HostValue>),
    Function(HostFunction),
    Abstract(Opaque),
}

impl HostValue {
    /// Build a string value
    pub fn string(s: impl Into<Vec<u8>>) -> Self {
        HostValue::String(s.into())
    }

    /// Build an object from `(name, value)` pairs
    pub fn object<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, HostValue)>,
        K: Into<String>,
    {
        HostValue::Object(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Build a function value
    pub fn function<F>(name: &str, arity: Option<usize>, func: F) -> Self
    where
        F: Fn(&[HostValue]) -> Result<HostValue, HostError> + Send + Sync + 'static,
    {
        HostValue::Function(HostFunction::new(name, arity, func))
    }

    /// Type name for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            HostValue::Null => "null",
            HostValue::Bool(_) => "bool",
            HostValue::Int(_) => "int",
            HostValue::Float(_) => "float",
            HostValue::String(_) => "string",
            HostValue::Array(_) => "array",
            HostValue::Object(_) => "object",
            HostValue::Function(_) => "function",
            HostValue::Abstract(_) => "abstract",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, HostValue::Null)
    }

    /// String contents, if this is a UTF-8 string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            HostValue::String(bytes) => std::str::from_utf8(bytes).ok(),
            _ => None,
        }
    }

    /// Numeric view of `Int` and `Float`
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            HostValue::Int(i) => Some(*i as f64),
            HostValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[HostValue]> {
        match self {
            HostValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&HashMap<String, HostValue>> {
        match self {
            HostValue::Object(fields) => Some(fields),
            _ => None,
        }
    }

    /// Field lookup on objects
    pub fn get(&self, field: &str) -> Option<&HostValue> {
        self.as_object().and_then(|fields| fields.get(field))
    }
}

impl PartialEq for HostValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (HostValue::Null, HostValue::Null) => true,
            (HostValue::Bool(a), HostValue::Bool(b)) => a == b,
            (HostValue::Int(a), HostValue::Int(b)) => a == b,
            (HostValue::Float(a), HostValue::Float(b)) => a == b,
            (HostValue::String(a), HostValue::String(b)) => a == b,
            (HostValue::Array(a), HostValue::Array(b)) => a == b,
            (HostValue::Object(a), HostValue::Object(b)) => a == b,
            (HostValue::Function(a), HostValue::Function(b)) => a.ptr_eq(b),
            (HostValue::Abstract(a), HostValue::Abstract(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl From<bool> for HostValue {
    fn from(b: bool) -> Self {
        HostValue::Bool(b)
    }
}

impl From<i64> for HostValue {
    fn from(i: i64) -> Self {
        HostValue::Int(i)
    }
}

impl From<i32> for HostValue {
    fn from(i: i32) -> Self {
        HostValue::Int(i64::from(i))
    }
}

impl From<f64> for HostValue {
    fn from(f: f64) -> Self {
        HostValue::Float(f)
    }
}

impl From<&str> for HostValue {
    fn from(s: &str) -> Self {
        HostValue::String(s.as_bytes().to_vec())
    }
}

impl From<String> for HostValue {
    fn from(s: String) -> Self {
        HostValue::String(s.into_bytes())
    }
}

impl From<Vec<HostValue>> for HostValue {
    fn from(items: Vec<HostValue>) -> Self {
        HostValue::Array(items)
    }
}

impl From<HashMap<String, HostValue>> for HostValue {
    fn from(fields: HashMap<String, HostValue>) -> Self {
        HostValue::Object(fields)
    }
}

impl From<HostFunction> for HostValue {
    fn from(f: HostFunction) -> Self {
        HostValue::Function(f)
    }
}

impl From<serde_json::Value> for HostValue {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as J;
        match json {
            J::Null => HostValue::Null,
            J::Bool(b) => HostValue::Bool(b),
            J::Number(n) => match n.as_i64() {
                Some(i) => HostValue::Int(i),
                None => HostValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            J::String(s) => HostValue::from(s),
            J::Array(items) => HostValue::Array(items.into_iter().map(HostValue::from).collect()),
            J::Object(fields) => HostValue::Object(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, HostValue::from(v)))
                    .collect(),
            ),
        }
    }
}

/// JSON view: functions and abstracts serialize as `null`, strings lossily
/// as UTF-8.
impl Serialize for HostValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            HostValue::Null | HostValue::Function(_) | HostValue::Abstract(_) => {
                serializer.serialize_unit()
            }
            HostValue::Bool(b) => serializer.serialize_bool(*b),
            HostValue::Int(i) => serializer.serialize_i64(*i),
            HostValue::Float(f) => serializer.serialize_f64(*f),
            HostValue::String(bytes) => serializer.serialize_str(&String::from_utf8_lossy(bytes)),
            HostValue::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            HostValue::Object(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (key, value) in fields {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

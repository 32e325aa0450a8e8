//! Value marshaling - host ↔ Lua conversions
//!
//! Provides bidirectional marshaling between [`HostValue`] and Lua values:
//! - `Marshaller::to_script()`: host value → one Lua value
//! - `Marshaller::to_host()`: Lua value → host value
//!
//! # Lossy spots
//!
//! - Lua has a single number type, so `Float(2.0)` comes back as `Int(2)`.
//! - Tables carry no type tag: objects and arrays are told apart by their
//!   keys (see [`composite`]).
//! - Values with no host counterpart (Lua functions, userdata, threads) and
//!   host values with no Lua counterpart (abstracts) become null, with a
//!   warning in the log.

pub mod composite;
pub(crate) mod primitive;

use crate::bridge::CallbackRegistry;
use crate::value::HostValue;
use luabridge_config::ArityCheck;
use mlua::{Lua, Value};
use std::rc::Rc;
use tracing::warn;

/// Conversion context shared by a runtime handle and every closure it
/// bridges into Lua.
///
/// Cheap to clone: the callback registry is shared.
#[derive(Debug, Clone)]
pub struct Marshaller {
    registry: Rc<CallbackRegistry>,
    arity_check: ArityCheck,
}

impl Marshaller {
    pub fn new(registry: Rc<CallbackRegistry>, arity_check: ArityCheck) -> Self {
        Self {
            registry,
            arity_check,
        }
    }

    pub fn registry(&self) -> &Rc<CallbackRegistry> {
        &self.registry
    }

    pub fn arity_check(&self) -> ArityCheck {
        self.arity_check
    }

    /// Convert a host value into exactly one Lua value
    pub fn to_script(&self, lua: &Lua, value: &HostValue) -> mlua::Result<Value> {
        match value {
            HostValue::Null => Ok(Value::Nil),
            HostValue::Bool(b) => Ok(Value::Boolean(*b)),
            HostValue::Int(i) => Ok(Value::Integer(*i)),
            HostValue::Float(f) => Ok(Value::Number(*f)),
            HostValue::String(bytes) => primitive::string_to_script(lua, bytes),
            HostValue::Array(items) => self.array_to_table(lua, items).map(Value::Table),
            HostValue::Object(fields) => self.object_to_table(lua, fields).map(Value::Table),
            HostValue::Function(function) => self
                .bridge_function(lua, function)
                .map(|(_, func)| Value::Function(func)),
            HostValue::Abstract(opaque) => {
                warn!(
                    type_name = opaque.type_name(),
                    "abstract host values cannot cross into Lua; passing nil"
                );
                Ok(Value::Nil)
            }
        }
    }

    /// Convert a Lua value into a host value
    pub fn to_host(&self, value: &Value) -> mlua::Result<HostValue> {
        match value {
            Value::Nil => Ok(HostValue::Null),
            Value::Boolean(b) => Ok(HostValue::Bool(*b)),
            Value::Integer(i) => Ok(HostValue::Int(*i)),
            Value::Number(n) => Ok(primitive::number_to_host(*n)),
            Value::String(s) => Ok(primitive::string_to_host(s)),
            Value::Table(table) => self.table_to_host(table),
            Value::Function(_)
            | Value::Thread(_)
            | Value::UserData(_)
            | Value::LightUserData(_) => Ok(unsupported(value)),
            other => Ok(unsupported(other)),
        }
    }
}

fn unsupported(value: &Value) -> HostValue {
    warn!(
        lua_type = value.type_name(),
        "Lua value has no host representation; returning null"
    );
    HostValue::Null
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marshaller() -> Marshaller {
        Marshaller::new(Rc::new(CallbackRegistry::new()), ArityCheck::Off)
    }

    fn round_trip(value: &HostValue) -> HostValue {
        let lua = Lua::new();
        let m = marshaller();
        let script = m.to_script(&lua, value).unwrap();
        m.to_host(&script).unwrap()
    }

    #[test]
    fn test_primitives_round_trip() {
        for value in [
            HostValue::Null,
            HostValue::Bool(true),
            HostValue::Bool(false),
            HostValue::Int(-42),
            HostValue::Int(i64::MAX),
            HostValue::Float(0.5),
            HostValue::from("hello"),
            HostValue::String(vec![0, 159, 146, 150]),
        ] {
            assert_eq!(round_trip(&value), value);
        }
    }

    #[test]
    fn test_integral_float_collapses_to_int() {
        assert_eq!(round_trip(&HostValue::Float(2.0)), HostValue::Int(2));
    }

    #[test]
    fn test_abstract_becomes_nil() {
        let lua = Lua::new();
        let value = HostValue::Abstract(crate::value::Opaque::new("socket"));
        assert!(matches!(marshaller().to_script(&lua, &value), Ok(Value::Nil)));
    }

    #[test]
    fn test_lua_function_becomes_null() {
        let lua = Lua::new();
        let func: Value = lua.load("return function() end").eval().unwrap();
        assert_eq!(marshaller().to_host(&func).unwrap(), HostValue::Null);
    }

    #[test]
    fn test_thread_becomes_null() {
        let lua = Lua::new();
        let thread: Value = lua
            .load("return coroutine.create(function() end)")
            .eval()
            .unwrap();
        assert_eq!(marshaller().to_host(&thread).unwrap(), HostValue::Null);
    }
}

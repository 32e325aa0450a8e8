//! Host callbacks - let Lua code call host functions
//!
//! Each bridged host function is exposed as a Lua closure (the trampoline)
//! that:
//! 1. Receives the Lua arguments
//! 2. Converts them to host values
//! 3. Calls the host function
//! 4. Converts the single result back to Lua
//! 5. Returns exactly one value to the caller
//!
//! A failing host function raises a Lua error; it is never swallowed.

use super::registry::{BridgedCallable, CallbackId};
use crate::marshal::Marshaller;
use crate::value::HostFunction;
use luabridge_config::ArityCheck;
use mlua::{Function, Lua, MultiValue, Value};
use std::rc::Weak;
use std::sync::Arc;
use tracing::{trace, warn};

impl Marshaller {
    /// Retain `function` in the registry and wrap it as a Lua closure
    pub fn bridge_function(
        &self,
        lua: &Lua,
        function: &HostFunction,
    ) -> mlua::Result<(CallbackId, Function)> {
        let (id, callable) = self.registry().retain(function);
        let trampoline = create_trampoline(lua, self.clone(), callable, function)?;
        Ok((id, trampoline))
    }
}

/// Build the Lua closure for one bridged callable.
///
/// The closure captures a weak reference to the callable and its arity hint.
fn create_trampoline(
    lua: &Lua,
    marshaller: Marshaller,
    callable: Weak<BridgedCallable>,
    function: &HostFunction,
) -> mlua::Result<Function> {
    let name: Arc<str> = Arc::from(function.name());
    let expected = function.arity();

    lua.create_function(move |lua, args: MultiValue| -> mlua::Result<Value> {
        let Some(callable) = callable.upgrade() else {
            return Err(mlua::Error::RuntimeError(format!(
                "host function '{}' has been unregistered",
                name
            )));
        };

        let args = args
            .iter()
            .map(|arg| marshaller.to_host(arg))
            .collect::<mlua::Result<Vec<_>>>()?;

        if marshaller.arity_check() == ArityCheck::Warn {
            if let Some(expected) = expected {
                if expected != args.len() {
                    warn!(
                        function = %name,
                        expected,
                        got = args.len(),
                        "host function called with unexpected argument count"
                    );
                }
            }
        }

        trace!(
            function = %name,
            id = %callable.id(),
            argc = args.len(),
            "calling host function"
        );
        let result = callable.function().call(&args).map_err(|err| {
            mlua::Error::RuntimeError(format!("host function '{}' failed: {}", name, err))
        })?;

        marshaller.to_script(lua, &result)
    })
}

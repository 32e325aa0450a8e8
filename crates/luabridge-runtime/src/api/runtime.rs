//! Script runtime handle
//!
//! [`ScriptRuntime`] owns one embedded Lua state together with the callback
//! registry for every host function bridged into it. Globals persist across
//! calls.
//!
//! # Examples
//!
//! ```
//! use luabridge_runtime::{HostValue, ScriptRuntime};
//!
//! let runtime = ScriptRuntime::new().unwrap();
//!
//! // Execute code
//! runtime.execute("function double(x) return x * 2 end").unwrap();
//!
//! // Call it from the host
//! let result = runtime.call_function("double", vec![HostValue::Int(21)]).unwrap();
//! assert_eq!(result, HostValue::Int(42));
//! ```
//!
//! The handle is neither `Send` nor `Sync`; it must stay on the thread that
//! created it.

use super::libraries;
use super::native::HostFunctionBuilder;
use crate::bridge::{CallbackId, CallbackRegistry};
use crate::error::ScriptError;
use crate::marshal::Marshaller;
use crate::value::{HostError, HostFunction, HostValue};
use luabridge_config::RuntimeConfig;
use mlua::{Function, Lua, LuaOptions, MultiValue, StdLib, Value};
use std::fmt;
use std::fs;
use std::path::Path;
use std::rc::Rc;
use tracing::{debug, trace};

/// Registry key of the function that calls an arbitrary value
const DISPATCH_KEY: &str = "luabridge.dispatch";

/// Calls its first argument with the rest. The callee lands in a temporary
/// register, so Lua's error for a non-callable value names only its type.
const DISPATCH_SOURCE: &str = "local select = select return function(...) return (...)(select(2, ...)) end";

/// UTF-8 byte order mark skipped at the start of script files
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Embedded Lua state plus the host functions bridged into it
///
/// # Examples
///
/// ```
/// use luabridge_runtime::{HostValue, ScriptRuntime};
///
/// let runtime = ScriptRuntime::new().unwrap();
/// runtime.set_global("greeting", &HostValue::from("hello")).unwrap();
///
/// let result = runtime.execute("return greeting .. ', world'").unwrap();
/// assert_eq!(result, HostValue::from("hello, world"));
/// ```
pub struct ScriptRuntime {
    /// `None` once released
    state: Option<Lua>,
    marshaller: Marshaller,
}

impl ScriptRuntime {
    /// Create a runtime with the default configuration
    pub fn new() -> Result<Self, ScriptError> {
        Self::with_config(RuntimeConfig::default())
    }

    /// Create a runtime from configuration
    ///
    /// Starts from a state with only the base library, then opens the
    /// configured libraries and applies the arity check mode.
    ///
    /// # Examples
    ///
    /// ```
    /// use luabridge_runtime::{HostValue, RuntimeConfig, ScriptRuntime};
    ///
    /// let config = RuntimeConfig::default().with_libraries(["base", "math"]);
    /// let runtime = ScriptRuntime::with_config(config).unwrap();
    ///
    /// assert_eq!(runtime.execute("return math.max(3, 7)").unwrap(), HostValue::Int(7));
    /// assert_eq!(runtime.execute("return string").unwrap(), HostValue::Null);
    /// ```
    pub fn with_config(config: RuntimeConfig) -> Result<Self, ScriptError> {
        // SAFETY: only the base library is opened here. The unsafe state lets
        // `debug` be loaded on request, which can reach the metatables and
        // upvalues of bridged functions. Bridged functions keep no Rust
        // references inside Lua values, so scripts are trusted the same way a
        // standalone interpreter trusts them.
        let lua = unsafe { Lua::unsafe_new_with(StdLib::NONE, LuaOptions::new()) };
        libraries::load(&lua, config.libraries())?;

        let registry = Rc::new(CallbackRegistry::new());
        debug!(
            arity_check = %config.arity_check(),
            "created script runtime"
        );

        Ok(Self {
            state: Some(lua),
            marshaller: Marshaller::new(registry, config.arity_check()),
        })
    }

    fn lua(&self) -> Result<&Lua, ScriptError> {
        self.state.as_ref().ok_or(ScriptError::Released)
    }

    /// Close the Lua state and drop every bridged host function.
    ///
    /// Returns `false` if the handle was already released. Any later
    /// operation fails with [`ScriptError::Released`].
    pub fn release(&mut self) -> bool {
        match self.state.take() {
            Some(lua) => {
                drop(lua);
                self.marshaller.registry().clear();
                debug!("released script runtime");
                true
            }
            None => false,
        }
    }

    /// Release and consume the handle
    pub fn close(mut self) {
        self.release();
    }

    pub fn is_released(&self) -> bool {
        self.state.is_none()
    }

    /// The live `_VERSION` global, e.g. `"Lua 5.4"`
    pub fn script_version(&self) -> Result<String, ScriptError> {
        let version: mlua::String = self.lua()?.globals().get("_VERSION")?;
        Ok(version.to_string_lossy().to_string())
    }

    /// Open additional standard libraries by name.
    ///
    /// Unknown names are ignored; `lfs` is skipped.
    pub fn load_libraries(&self, names: &[&str]) -> Result<(), ScriptError> {
        libraries::load(self.lua()?, names)?;
        Ok(())
    }

    /// Install one global per field of an object value.
    ///
    /// Anything other than an object is ignored.
    pub fn bind_globals(&self, globals: &HostValue) -> Result<(), ScriptError> {
        let lua = self.lua()?;
        let HostValue::Object(fields) = globals else {
            debug!(
                value_type = globals.type_name(),
                "bind_globals expects an object; nothing bound"
            );
            return Ok(());
        };

        let table = lua.globals();
        for (name, value) in fields {
            table.set(name.as_str(), self.marshaller.to_script(lua, value)?)?;
        }
        Ok(())
    }

    /// Set a global variable
    pub fn set_global(&self, name: &str, value: &HostValue) -> Result<(), ScriptError> {
        let lua = self.lua()?;
        let value = self.marshaller.to_script(lua, value)?;
        lua.globals().set(name, value)?;
        Ok(())
    }

    /// Read a global variable back through the codec.
    ///
    /// A missing global reads as `Null`.
    pub fn get_global(&self, name: &str) -> Result<HostValue, ScriptError> {
        let value: Value = self.lua()?.globals().get(name)?;
        Ok(self.marshaller.to_host(&value)?)
    }

    /// Bind a host function as a global.
    ///
    /// The returned id can be passed to [`unregister`](Self::unregister).
    /// Registering the same function again (or a clone of it) reuses its
    /// registry entry.
    pub fn register_function(
        &self,
        name: &str,
        function: HostFunction,
    ) -> Result<CallbackId, ScriptError> {
        let lua = self.lua()?;
        let (id, func) = self.marshaller.bridge_function(lua, &function)?;
        lua.globals().set(name, func)?;
        debug!(%id, global = name, "registered host function");
        Ok(id)
    }

    /// Register a closure that requires exactly `arity` arguments.
    ///
    /// Calls with a different argument count fail with an arity error
    /// raised inside the script.
    ///
    /// # Examples
    ///
    /// ```
    /// use luabridge_runtime::{HostValue, ScriptRuntime};
    ///
    /// let runtime = ScriptRuntime::new().unwrap();
    /// runtime
    ///     .register_native("add", 2, |args| {
    ///         let a = args[0].as_f64().unwrap_or(0.0);
    ///         let b = args[1].as_f64().unwrap_or(0.0);
    ///         Ok(HostValue::Float(a + b))
    ///     })
    ///     .unwrap();
    ///
    /// assert_eq!(runtime.execute("return add(10, 20)").unwrap(), HostValue::Int(30));
    /// assert!(runtime.execute("return add(10)").is_err());
    /// ```
    pub fn register_native<F>(
        &self,
        name: &str,
        arity: usize,
        implementation: F,
    ) -> Result<CallbackId, ScriptError>
    where
        F: Fn(&[HostValue]) -> Result<HostValue, HostError> + Send + Sync + 'static,
    {
        let function = HostFunctionBuilder::new(name)
            .with_arity(arity)
            .with_implementation(implementation)
            .build()
            .map_err(|err| ScriptError::Engine {
                message: err.to_string(),
            })?;
        self.register_function(name, function)
    }

    /// Register a closure that accepts any number of arguments
    pub fn register_variadic<F>(
        &self,
        name: &str,
        implementation: F,
    ) -> Result<CallbackId, ScriptError>
    where
        F: Fn(&[HostValue]) -> Result<HostValue, HostError> + Send + Sync + 'static,
    {
        let function = HostFunctionBuilder::new(name)
            .variadic()
            .with_implementation(implementation)
            .build()
            .map_err(|err| ScriptError::Engine {
                message: err.to_string(),
            })?;
        self.register_function(name, function)
    }

    /// Release a bridged host function.
    ///
    /// Lua closures that still reference it raise an error when called.
    /// Returns `Ok(false)` if the id is not live.
    pub fn unregister(&self, id: CallbackId) -> Result<bool, ScriptError> {
        self.lua()?;
        Ok(self.marshaller.registry().release(id))
    }

    /// Number of live bridged host functions
    pub fn callback_count(&self) -> usize {
        self.marshaller.registry().len()
    }

    /// Call a global Lua function.
    ///
    /// An `Array` argument is spread into positional arguments; any other
    /// value is passed as the only argument. The first return value is
    /// converted back (`Null` if there is none).
    ///
    /// The global is not checked up front. Anything Lua can call works,
    /// including tables and userdata with a `__call` metamethod.
    ///
    /// # Errors
    ///
    /// A missing or non-callable global fails inside Lua the same way any
    /// bad call does, with [`ScriptError::Runtime`] and a message such as
    /// `attempt to call a nil value`.
    pub fn call_function(
        &self,
        name: &str,
        args: impl Into<HostValue>,
    ) -> Result<HostValue, ScriptError> {
        let lua = self.lua()?;
        let args = args.into();

        let callee: Value = lua.globals().get(name)?;
        let mut argv = match &args {
            HostValue::Array(items) => items
                .iter()
                .map(|item| self.marshaller.to_script(lua, item))
                .collect::<mlua::Result<Vec<_>>>()?,
            single => vec![self.marshaller.to_script(lua, single)?],
        };

        trace!(function = name, argc = argv.len(), "calling Lua function");
        let result: Value = match callee {
            Value::Function(function) => function.call(MultiValue::from_vec(argv))?,
            other => {
                argv.insert(0, other);
                dispatcher(lua)?.call(MultiValue::from_vec(argv))?
            }
        };
        Ok(self.marshaller.to_host(&result)?)
    }

    /// Run a chunk of Lua source.
    ///
    /// Returns the chunk's first return value, or `Null` if it returns
    /// nothing.
    pub fn execute(&self, source: &str) -> Result<HostValue, ScriptError> {
        let lua = self.lua()?;
        let results: MultiValue = lua.load(source).set_name(source).call(())?;
        self.first_result(results)
    }

    /// Run a Lua file. A leading UTF-8 byte order mark and a leading `#`
    /// line are skipped.
    pub fn execute_file(&self, path: impl AsRef<Path>) -> Result<HostValue, ScriptError> {
        let lua = self.lua()?;
        let path = path.as_ref();
        let source = fs::read(path).map_err(|source| ScriptError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let results: MultiValue = lua
            .load(skip_file_header(source))
            .set_name(format!("@{}", path.display()))
            .call(())?;
        self.first_result(results)
    }

    /// Run `source_or_path` as a file when `is_file` is set, as source
    /// otherwise.
    pub fn execute_script(
        &self,
        source_or_path: &str,
        is_file: bool,
    ) -> Result<HostValue, ScriptError> {
        if is_file {
            self.execute_file(source_or_path)
        } else {
            self.execute(source_or_path)
        }
    }

    /// Convert every returned value from last to first; the value kept is
    /// the first one.
    fn first_result(&self, results: MultiValue) -> Result<HostValue, ScriptError> {
        let mut first = HostValue::Null;
        for value in results.iter().rev() {
            first = self.marshaller.to_host(value)?;
        }
        Ok(first)
    }
}

impl fmt::Debug for ScriptRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptRuntime")
            .field("released", &self.is_released())
            .field("arity_check", &self.marshaller.arity_check())
            .field("callbacks", &self.callback_count())
            .finish()
    }
}

impl Drop for ScriptRuntime {
    fn drop(&mut self) {
        self.release();
    }
}

/// Lua function that calls any value through Lua's own call path, so
/// `__call` metamethods apply. Compiled once per state.
fn dispatcher(lua: &Lua) -> mlua::Result<Function> {
    if let Value::Function(dispatch) = lua.named_registry_value::<Value>(DISPATCH_KEY)? {
        return Ok(dispatch);
    }

    let dispatch: Function = lua.load(DISPATCH_SOURCE).set_name("=call_function").eval()?;
    lua.set_named_registry_value(DISPATCH_KEY, dispatch.clone())?;
    Ok(dispatch)
}

/// Drop a UTF-8 byte order mark and blank out a `#` first line, keeping line
/// numbers intact
fn skip_file_header(mut source: Vec<u8>) -> Vec<u8> {
    if source.starts_with(UTF8_BOM) {
        source.drain(..UTF8_BOM.len());
    }
    if source.first() == Some(&b'#') {
        let end = source
            .iter()
            .position(|&b| b == b'\n')
            .unwrap_or(source.len());
        source.drain(..end);
    }
    source
}

#[cfg(test)]
mod tests {
    use super::*;
    use luabridge_config::ArityCheck;

    #[test]
    fn test_default_libraries_loaded() {
        let runtime = ScriptRuntime::new().unwrap();
        let loaded = runtime
            .execute("return type(string) .. type(table) .. type(math)")
            .unwrap();
        assert_eq!(loaded, HostValue::from("tabletabletable"));
        assert_eq!(runtime.execute("return io").unwrap(), HostValue::Null);
    }

    #[test]
    fn test_script_version() {
        let runtime = ScriptRuntime::new().unwrap();
        assert_eq!(runtime.script_version().unwrap(), crate::version());
    }

    #[test]
    fn test_load_libraries_later() {
        let runtime = ScriptRuntime::with_config(RuntimeConfig::default().with_libraries(["base"]))
            .unwrap();
        assert_eq!(runtime.execute("return os").unwrap(), HostValue::Null);

        runtime.load_libraries(&["os", "debug", "nonsense"]).unwrap();
        assert_eq!(
            runtime.execute("return type(os.time)").unwrap(),
            HostValue::from("function")
        );
        assert_eq!(
            runtime.execute("return type(debug.traceback)").unwrap(),
            HostValue::from("function")
        );
    }

    #[test]
    fn test_first_return_value_wins() {
        let runtime = ScriptRuntime::new().unwrap();
        assert_eq!(runtime.execute("return 1, 2, 3").unwrap(), HostValue::Int(1));
        assert_eq!(runtime.execute("local x = 1").unwrap(), HostValue::Null);
    }

    #[test]
    fn test_globals_persist() {
        let runtime = ScriptRuntime::new().unwrap();
        runtime.execute("counter = 41").unwrap();
        runtime.execute("counter = counter + 1").unwrap();
        assert_eq!(runtime.get_global("counter").unwrap(), HostValue::Int(42));
        assert_eq!(runtime.get_global("missing").unwrap(), HostValue::Null);
    }

    #[test]
    fn test_bind_globals_object() {
        let runtime = ScriptRuntime::new().unwrap();
        runtime
            .bind_globals(&HostValue::object([
                ("name", HostValue::from("lua")),
                ("answer", HostValue::Int(42)),
            ]))
            .unwrap();
        assert_eq!(
            runtime.execute("return name .. answer").unwrap(),
            HostValue::from("lua42")
        );
    }

    #[test]
    fn test_bind_globals_ignores_non_object() {
        let runtime = ScriptRuntime::new().unwrap();
        runtime.bind_globals(&HostValue::Null).unwrap();
        runtime
            .bind_globals(&HostValue::Array(vec![HostValue::Int(1)]))
            .unwrap();
        assert_eq!(runtime.get_global("1").unwrap(), HostValue::Null);
    }

    #[test]
    fn test_call_missing_function() {
        let runtime = ScriptRuntime::new().unwrap();
        let err = runtime.call_function("nope", HostValue::Null).unwrap_err();
        assert!(matches!(&err, ScriptError::Runtime { .. }));
        assert!(err.message().contains("attempt to call a nil value"), "{}", err);
    }

    #[test]
    fn test_call_non_function_global() {
        let runtime = ScriptRuntime::new().unwrap();
        runtime.execute("x = 5").unwrap();
        let err = runtime.call_function("x", HostValue::Null).unwrap_err();
        assert!(matches!(&err, ScriptError::Runtime { .. }));
        assert!(err.message().contains("attempt to call a number value"), "{}", err);
    }

    #[test]
    fn test_call_table_with_call_metamethod() {
        let runtime = ScriptRuntime::new().unwrap();
        runtime
            .execute("doubler = setmetatable({}, {__call = function(self, x) return x * 2 end})")
            .unwrap();
        assert_eq!(
            runtime.call_function("doubler", vec![HostValue::Int(21)]).unwrap(),
            HostValue::Int(42)
        );
        // the dispatcher is compiled once and reused
        assert_eq!(
            runtime.call_function("doubler", HostValue::Int(5)).unwrap(),
            HostValue::Int(10)
        );
    }

    #[test]
    fn test_call_table_without_call_metamethod() {
        let runtime = ScriptRuntime::new().unwrap();
        runtime.execute("plain = {}").unwrap();
        let err = runtime.call_function("plain", vec![]).unwrap_err();
        assert!(matches!(&err, ScriptError::Runtime { .. }));
        assert!(err.message().contains("attempt to call a table value"), "{}", err);
    }

    #[test]
    fn test_call_single_argument_not_spread() {
        let runtime = ScriptRuntime::new().unwrap();
        runtime
            .execute("function kind(...) return select('#', ...) .. type(...) end")
            .unwrap();
        assert_eq!(
            runtime
                .call_function("kind", HostValue::object([("a", HostValue::Int(1))]))
                .unwrap(),
            HostValue::from("1table")
        );
    }

    #[test]
    fn test_register_native_arity_enforced() {
        let runtime = ScriptRuntime::new().unwrap();
        runtime
            .register_native("one", 1, |args| Ok(args[0].clone()))
            .unwrap();
        let err = runtime.execute("return one()").unwrap_err();
        assert!(matches!(err, ScriptError::Callback { .. }));
        assert!(err.message().contains("expects 1 argument, got 0"), "{}", err);
    }

    #[test]
    fn test_release_is_idempotent() {
        let mut runtime = ScriptRuntime::new().unwrap();
        runtime
            .register_variadic("noop", |_| Ok(HostValue::Null))
            .unwrap();
        assert_eq!(runtime.callback_count(), 1);

        assert!(runtime.release());
        assert!(runtime.is_released());
        assert_eq!(runtime.callback_count(), 0);
        assert!(!runtime.release());
        assert!(matches!(runtime.execute("return 1"), Err(ScriptError::Released)));
    }

    #[test]
    fn test_arity_warn_mode_still_calls() {
        let config = RuntimeConfig::default().with_arity_check(ArityCheck::Warn);
        let runtime = ScriptRuntime::with_config(config).unwrap();
        runtime
            .register_function(
                "first",
                HostFunction::new("first", Some(2), |args| {
                    Ok(args.first().cloned().unwrap_or_default())
                }),
            )
            .unwrap();
        assert_eq!(runtime.execute("return first(7)").unwrap(), HostValue::Int(7));
    }

    #[test]
    fn test_skip_shebang() {
        assert_eq!(skip_file_header(b"#!/usr/bin/lua\nreturn 1".to_vec()), b"\nreturn 1");
        assert_eq!(skip_file_header(b"return 1".to_vec()), b"return 1");
    }

    #[test]
    fn test_skip_byte_order_mark() {
        assert_eq!(skip_file_header(b"\xEF\xBB\xBFreturn 7".to_vec()), b"return 7");
        assert_eq!(
            skip_file_header(b"\xEF\xBB\xBF#!/usr/bin/lua\nreturn 7".to_vec()),
            b"\nreturn 7"
        );
        // a lone partial mark is left for the parser to reject
        assert_eq!(skip_file_header(b"\xEFreturn".to_vec()), b"\xEFreturn");
    }

    #[test]
    fn test_chunk_errors_name_the_source() {
        let runtime = ScriptRuntime::new().unwrap();
        let err = runtime.execute("error('boom')").unwrap_err();
        assert!(matches!(err, ScriptError::Runtime { .. }));
        assert!(err.message().contains("boom"));
        assert!(err.message().contains("[string \"error('boom')\"]"), "{}", err);
    }
}

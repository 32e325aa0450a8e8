//! Shared test utilities for the runtime integration tests

#![allow(dead_code)]

use luabridge_runtime::{HostValue, ScriptError, ScriptRuntime};

// Re-export testing utilities
pub use pretty_assertions::{assert_eq, assert_ne};

/// Fresh runtime with the default configuration
pub fn runtime() -> ScriptRuntime {
    ScriptRuntime::new().expect("failed to create runtime")
}

/// Assert that a chunk evaluates to `expected`
///
/// # Example
/// ```
/// assert_execute("return 1 + 2", HostValue::Int(3));
/// ```
pub fn assert_execute(source: &str, expected: HostValue) {
    let runtime = runtime();
    match runtime.execute(source) {
        Ok(value) => assert_eq!(value, expected, "source: {}", source),
        Err(err) => panic!("Expected {:?}, got error: {}", expected, err),
    }
}

/// Assert that a chunk fails and return the error
pub fn assert_execute_error(source: &str) -> ScriptError {
    let runtime = runtime();
    match runtime.execute(source) {
        Ok(value) => panic!("Expected error for {:?}, got {:?}", source, value),
        Err(err) => {
            assert!(!err.message().is_empty(), "error message is empty");
            err
        }
    }
}

/// Send a value into Lua and read it back through a global
pub fn round_trip(value: &HostValue) -> HostValue {
    let runtime = runtime();
    runtime
        .set_global("__round_trip", value)
        .expect("failed to set global");
    runtime.get_global("__round_trip").expect("failed to read global")
}

//! LuaBridge Runtime - host ↔ Lua value marshalling and callback bridging
//!
//! This library embeds a Lua 5.4 state and provides:
//! - A dynamic host value model ([`HostValue`])
//! - Conversion of host values into Lua values and back, including
//!   array/object disambiguation for tables
//! - Host functions callable from Lua, tracked in an explicit registry
//! - Calling Lua functions and running Lua chunks from the host with
//!   tagged errors ([`ScriptError`])

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version of the embedded Lua runtime
pub const LUA_VERSION: &str = "Lua 5.4";

// Public API modules
pub mod api;
pub mod bridge;
pub mod error;
pub mod marshal;
pub mod value;

// Re-export commonly used types
pub use api::{ConversionError, FromHost, HostFunctionBuilder, ScriptRuntime, ToHost};
pub use bridge::CallbackId;
pub use error::ScriptError;
pub use luabridge_config::{ArityCheck, RuntimeConfig};
pub use value::{HostError, HostFunction, HostValue, Opaque};

/// Static version string of the embedded Lua runtime
pub fn version() -> &'static str {
    LUA_VERSION
}

//! Public embedding API
//!
//! This module provides the host-facing surface of the bridge:
//! - [`ScriptRuntime`]: one embedded Lua state, its globals and bridged
//!   host functions
//! - Typed conversion between Rust values and [`HostValue`](crate::HostValue)
//! - A builder for host functions with optional arity validation
//! - The standard library catalog
//!
//! # Examples
//!
//! ```
//! use luabridge_runtime::api::{FromHost, ScriptRuntime};
//! use luabridge_runtime::HostValue;
//!
//! let runtime = ScriptRuntime::new().unwrap();
//!
//! // Expose a host function to Lua
//! runtime
//!     .register_variadic("sum", |args| {
//!         Ok(HostValue::Float(args.iter().filter_map(HostValue::as_f64).sum()))
//!     })
//!     .unwrap();
//!
//! // Run Lua code that calls it
//! let result = runtime.execute("return sum(1, 2, 3.5)").unwrap();
//! assert_eq!(f64::from_host(&result).unwrap(), 6.5);
//! ```

pub mod conversion;
pub mod libraries;
pub mod native;
pub mod runtime;

// Re-export main types for convenience
pub use conversion::{ConversionError, FromHost, ToHost};
pub use libraries::Library;
pub use native::{BuildError, HostFunctionBuilder};
pub use runtime::ScriptRuntime;

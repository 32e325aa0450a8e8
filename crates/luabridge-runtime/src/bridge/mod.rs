//! Function bridge - host functions callable from Lua
//!
//! - `registry`: retains bridged host functions and hands out [`CallbackId`]s
//! - `callbacks`: the Lua-side trampoline that converts arguments, calls the
//!   host function and converts its result

pub mod callbacks;
pub mod registry;

pub use registry::{BridgedCallable, CallbackId, CallbackRegistry};

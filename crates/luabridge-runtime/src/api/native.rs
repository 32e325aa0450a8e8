//! Host function builder
//!
//! Builds [`HostFunction`]s from Rust closures. A builder can declare a fixed
//! arity (argument count checked inside the function, before the closure
//! runs) or mark the function variadic.
//!
//! # Examples
//!
//! ```rust
//! use luabridge_runtime::api::native::HostFunctionBuilder;
//! use luabridge_runtime::value::{HostError, HostValue};
//!
//! let negate = HostFunctionBuilder::new("negate")
//!     .with_arity(1)
//!     .with_implementation(|args| match &args[0] {
//!         HostValue::Int(i) => Ok(HostValue::Int(-i)),
//!         HostValue::Float(f) => Ok(HostValue::Float(-f)),
//!         other => Err(HostError::TypeError {
//!             msg: format!("expected number, got {}", other.type_name()),
//!         }),
//!     })
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(negate.call(&[HostValue::Int(3)]).unwrap(), HostValue::Int(-3));
//! assert!(negate.call(&[]).is_err());
//! ```

use crate::value::{HostError, HostFunction, HostValue};
use thiserror::Error;

/// Type alias for host function implementation
type HostFnImpl = Box<dyn Fn(&[HostValue]) -> Result<HostValue, HostError> + Send + Sync>;

/// Builder for host functions with optional arity validation
pub struct HostFunctionBuilder {
    name: String,
    arity: Option<usize>,
    implementation: Option<HostFnImpl>,
}

impl HostFunctionBuilder {
    /// Create a new builder; the name shows up in errors and logs
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arity: None,
            implementation: None,
        }
    }

    /// Require exactly `arity` arguments.
    ///
    /// Calls with a different count fail with [`HostError::Arity`] before the
    /// implementation runs.
    pub fn with_arity(mut self, arity: usize) -> Self {
        self.arity = Some(arity);
        self
    }

    /// Accept any number of arguments (the default)
    pub fn variadic(mut self) -> Self {
        self.arity = None;
        self
    }

    /// Set the function implementation
    pub fn with_implementation<F>(mut self, implementation: F) -> Self
    where
        F: Fn(&[HostValue]) -> Result<HostValue, HostError> + Send + Sync + 'static,
    {
        self.implementation = Some(Box::new(implementation));
        self
    }

    /// Build the host function
    ///
    /// # Errors
    ///
    /// [`BuildError::MissingImplementation`] if no implementation was set.
    pub fn build(self) -> Result<HostFunction, BuildError> {
        let implementation = self
            .implementation
            .ok_or_else(|| BuildError::MissingImplementation(self.name.clone()))?;

        let function = match self.arity {
            Some(expected) => {
                let name = self.name.clone();
                HostFunction::new(self.name, Some(expected), move |args: &[HostValue]| {
                    if args.len() != expected {
                        return Err(HostError::Arity {
                            name: name.clone(),
                            expected,
                            got: args.len(),
                        });
                    }
                    implementation(args)
                })
            }
            None => HostFunction::new(self.name, None, move |args: &[HostValue]| {
                implementation(args)
            }),
        };

        Ok(function)
    }
}

/// Errors that can occur when building a host function
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// No implementation was provided
    #[error("Host function '{0}' missing implementation")]
    MissingImplementation(String),
}

//! Errors surfaced by the script runtime handle

use crate::value::HostValue;
use std::path::PathBuf;
use thiserror::Error;

/// Failure of a call into the script runtime.
///
/// Returned by the call dispatcher and the execution driver in place of a
/// plain message string, so a script that legitimately returns a string is
/// never confused with a failure.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// Chunk failed to compile
    #[error("Syntax error: {message}")]
    Syntax { message: String },

    /// Error raised while the script was running
    #[error("Runtime error: {message}")]
    Runtime { message: String },

    /// A bridged host function failed while called from the script
    #[error("Host callback error: {message}")]
    Callback { message: String },

    /// Script file could not be read
    #[error("Cannot open script {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The handle was released; the script runtime no longer exists
    #[error("Script runtime handle has been released")]
    Released,

    /// Any other failure reported by the embedded engine (memory, etc.)
    #[error("Script engine error: {message}")]
    Engine { message: String },
}

impl ScriptError {
    /// Message without the category prefix
    pub fn message(&self) -> String {
        match self {
            ScriptError::Syntax { message }
            | ScriptError::Runtime { message }
            | ScriptError::Callback { message }
            | ScriptError::Engine { message } => message.clone(),
            ScriptError::Io { path, source } => {
                format!("cannot open {}: {}", path.display(), source)
            }
            ScriptError::Released => "script runtime handle has been released".to_string(),
        }
    }

    /// Collapse into a host string value, for callers that follow the
    /// "errors come back as strings" convention.
    pub fn into_host_value(self) -> HostValue {
        HostValue::from(self.message())
    }
}

impl From<mlua::Error> for ScriptError {
    fn from(err: mlua::Error) -> Self {
        match err {
            mlua::Error::SyntaxError { message, .. } => ScriptError::Syntax { message },
            mlua::Error::RuntimeError(message) => ScriptError::Runtime { message },
            mlua::Error::CallbackError { cause, .. } => ScriptError::Callback {
                message: root_cause(&cause).to_string(),
            },
            other => ScriptError::Engine {
                message: other.to_string(),
            },
        }
    }
}

/// Strip nested callback wrappers down to the error that started it
fn root_cause(err: &mlua::Error) -> &mlua::Error {
    match err {
        mlua::Error::CallbackError { cause, .. } => root_cause(cause),
        other => other,
    }
}

/// Message carried by an engine error, without mlua's own wrapping
#[cfg(test)]
pub(crate) fn lua_error_message(err: &mlua::Error) -> String {
    match root_cause(err) {
        mlua::Error::RuntimeError(message) => message.clone(),
        mlua::Error::SyntaxError { message, .. } => message.clone(),
        other => other.to_string(),
    }
}

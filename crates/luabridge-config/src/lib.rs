//! LuaBridge Configuration System
//!
//! Provides configuration management for embedded Lua runtimes:
//! - Runtime configuration (luabridge.toml)
//! - Library catalog validation
//! - Environment variable overrides (LUABRIDGE_*)
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded and merged in the following order (later overrides earlier):
//! 1. Built-in defaults
//! 2. Project config (./luabridge.toml, found by walking up from a directory)
//! 3. Environment variables (LUABRIDGE_*)
//!
//! # Example
//!
//! ```no_run
//! use luabridge_config::ConfigLoader;
//! use std::path::Path;
//!
//! let loader = ConfigLoader::new();
//! let config = loader.load_from_directory(Path::new(".")).unwrap();
//! ```

pub mod loader;
pub mod runtime;

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Names accepted by the library loader.
///
/// `lfs` is the LuaFileSystem extension module.
pub const KNOWN_LIBRARIES: &[&str] = &[
    "base",
    "debug",
    "io",
    "math",
    "os",
    "package",
    "string",
    "table",
    "coroutine",
    "utf8",
    "lfs",
];

/// Check whether `name` is part of the library catalog
pub fn is_known_library(name: &str) -> bool {
    KNOWN_LIBRARIES.contains(&name)
}

// Re-export main types
pub use loader::{ConfigLoader, CONFIG_FILE_NAME};
pub use runtime::{ArityCheck, BridgeSection, RuntimeConfig, RuntimeSection};

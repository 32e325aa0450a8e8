//! Configuration Loader
//!
//! Handles loading configuration from disk and applying environment overrides.

use crate::runtime::{ArityCheck, RuntimeConfig};
use crate::ConfigResult;
use std::env;
use std::path::{Path, PathBuf};

/// File name searched for by [`ConfigLoader::load_from_directory`]
pub const CONFIG_FILE_NAME: &str = "luabridge.toml";

/// Comma-separated library list override
pub const ENV_LIBRARIES: &str = "LUABRIDGE_LIBRARIES";

/// Arity check mode override ("off" or "warn")
pub const ENV_ARITY_CHECK: &str = "LUABRIDGE_ARITY_CHECK";

/// Configuration loader
///
/// Loads configuration with the following precedence:
/// 1. Built-in defaults - lowest priority
/// 2. luabridge.toml - overrides defaults
/// 3. Environment variables (LUABRIDGE_*) - overrides file
#[derive(Debug, Default)]
pub struct ConfigLoader {
    /// Skip environment overrides (useful for tests and sandboxed hosts)
    ignore_env: bool,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self { ignore_env: false }
    }

    /// Create a loader that never consults environment variables
    pub fn without_env() -> Self {
        Self { ignore_env: true }
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find luabridge.toml. When no file is
    /// found the defaults are used.
    pub fn load_from_directory(
        &self,
        start_dir: &Path,
    ) -> ConfigResult<(Option<PathBuf>, RuntimeConfig)> {
        let (config_path, config) = match find_config_file(start_dir) {
            Some(path) => {
                let config = RuntimeConfig::load_from_file(&path)?;
                (Some(path), config)
            }
            None => (None, RuntimeConfig::default()),
        };

        let config = self.apply_env_overrides(config)?;
        Ok((config_path, config))
    }

    /// Load configuration from a specific file
    pub fn load_from_file(&self, config_path: &Path) -> ConfigResult<RuntimeConfig> {
        let config = RuntimeConfig::load_from_file(config_path)?;
        self.apply_env_overrides(config)
    }

    /// Apply environment variable overrides
    ///
    /// Example: LUABRIDGE_LIBRARIES=base,string LUABRIDGE_ARITY_CHECK=warn
    fn apply_env_overrides(&self, mut config: RuntimeConfig) -> ConfigResult<RuntimeConfig> {
        if self.ignore_env {
            return Ok(config);
        }

        if let Ok(libraries) = env::var(ENV_LIBRARIES) {
            config.runtime.libraries = libraries
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Ok(mode) = env::var(ENV_ARITY_CHECK) {
            config.bridge.arity_check = mode.parse::<ArityCheck>()?;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Find luabridge.toml by walking up from `start_dir`
fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.is_file() {
            return Some(config_path);
        }

        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => return None,
        }
    }
}

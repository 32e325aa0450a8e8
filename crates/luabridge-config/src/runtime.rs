//! Runtime Configuration (luabridge.toml)
//!
//! Handles the settings applied when a script runtime is created: which
//! standard libraries to open and how bridged host functions treat their
//! declared arity.

use crate::{is_known_library, ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Runtime configuration from luabridge.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Script runtime settings
    #[serde(default)]
    pub runtime: RuntimeSection,

    /// Host function bridge settings
    #[serde(default)]
    pub bridge: BridgeSection,
}

/// `[runtime]` table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RuntimeSection {
    /// Libraries opened when the runtime is created
    #[serde(default = "default_libraries")]
    pub libraries: Vec<String>,
}

impl Default for RuntimeSection {
    fn default() -> Self {
        Self {
            libraries: default_libraries(),
        }
    }
}

fn default_libraries() -> Vec<String> {
    ["base", "coroutine", "math", "string", "table", "utf8"]
        .iter()
        .map(|name| name.to_string())
        .collect()
}

/// `[bridge]` table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct BridgeSection {
    /// What to do when a script calls a host function with an unexpected
    /// number of arguments
    #[serde(default)]
    pub arity_check: ArityCheck,
}

/// Arity validation mode for bridged host functions.
///
/// Declared arities are hints; a mismatch never fails the call.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ArityCheck {
    /// No check
    #[default]
    Off,
    /// Log a warning on mismatch and call anyway
    Warn,
}

impl FromStr for ArityCheck {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "off" | "0" | "false" | "no" => Ok(ArityCheck::Off),
            "warn" | "1" | "true" | "yes" => Ok(ArityCheck::Warn),
            other => Err(ConfigError::InvalidValue {
                field: "bridge.arity_check".to_string(),
                reason: format!("expected 'off' or 'warn', got '{}'", other),
            }),
        }
    }
}

impl fmt::Display for ArityCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArityCheck::Off => write!(f, "off"),
            ArityCheck::Warn => write!(f, "warn"),
        }
    }
}

impl RuntimeConfig {
    /// Load runtime configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the runtime configuration
    ///
    /// The runtime itself ignores unknown library names; a configuration
    /// file naming one is almost certainly a typo, so it is rejected here.
    pub fn validate(&self) -> ConfigResult<()> {
        for (index, name) in self.runtime.libraries.iter().enumerate() {
            if self.runtime.libraries[..index].contains(name) {
                return Err(ConfigError::ValidationError(format!(
                    "library '{}' is listed more than once",
                    name
                )));
            }
            if !is_known_library(name) {
                return Err(ConfigError::InvalidValue {
                    field: "runtime.libraries".to_string(),
                    reason: format!("unknown library '{}'", name),
                });
            }
        }
        Ok(())
    }

    /// Libraries opened at creation time
    pub fn libraries(&self) -> &[String] {
        &self.runtime.libraries
    }

    /// Arity validation mode for bridged host functions
    pub fn arity_check(&self) -> ArityCheck {
        self.bridge.arity_check
    }

    /// Replace the library list
    pub fn with_libraries<I, S>(mut self, libraries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.runtime.libraries = libraries.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the arity validation mode
    pub fn with_arity_check(mut self, mode: ArityCheck) -> Self {
        self.bridge.arity_check = mode;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_empty_config_uses_defaults() {
        let config: RuntimeConfig = toml::from_str("").unwrap();
        assert_eq!(config, RuntimeConfig::default());
        assert!(config.libraries().contains(&"string".to_string()));
        assert_eq!(config.arity_check(), ArityCheck::Off);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[runtime]
libraries = ["base", "math", "lfs"]

[bridge]
arity_check = "warn"
"#;
        let config: RuntimeConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.libraries(), &["base", "math", "lfs"]);
        assert_eq!(config.arity_check(), ArityCheck::Warn);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let toml = r#"
[runtime]
libs = ["base"]
"#;
        let result: Result<RuntimeConfig, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_unknown_library() {
        let config = RuntimeConfig::default().with_libraries(["base", "bit32"]);
        match config.validate() {
            Err(ConfigError::InvalidValue { field, reason }) => {
                assert_eq!(field, "runtime.libraries");
                assert!(reason.contains("bit32"));
            }
            other => panic!("Expected InvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_duplicate_library() {
        let config = RuntimeConfig::default().with_libraries(["math", "string", "math"]);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(message)) if message.contains("'math'")
        ));
    }

    #[test]
    fn test_arity_check_from_str() {
        assert_eq!("warn".parse::<ArityCheck>().unwrap(), ArityCheck::Warn);
        assert_eq!(" OFF ".parse::<ArityCheck>().unwrap(), ArityCheck::Off);
        assert_eq!("1".parse::<ArityCheck>().unwrap(), ArityCheck::Warn);
        assert!("strict".parse::<ArityCheck>().is_err());
    }

    #[test]
    fn test_arity_check_display_round_trips() {
        for mode in [ArityCheck::Off, ArityCheck::Warn] {
            assert_eq!(mode.to_string().parse::<ArityCheck>().unwrap(), mode);
        }
    }
}

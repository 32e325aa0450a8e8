//! CLI commands and the runtime setup they share

pub mod call;
pub mod run;

use anyhow::{Context, Result};
use luabridge_config::{ConfigLoader, RuntimeConfig};
use luabridge_runtime::{HostValue, ScriptRuntime};
use std::path::PathBuf;
use tracing::debug;

/// Options shared by every command that opens a runtime
#[derive(Debug, Clone, Default)]
pub struct RuntimeOptions {
    /// Explicit configuration file; otherwise `luabridge.toml` is searched
    /// for from the current directory upwards
    pub config: Option<PathBuf>,
    /// Libraries opened in addition to the configured ones
    pub libraries: Vec<String>,
    /// Print results as pretty JSON, including null
    pub json: bool,
}

impl RuntimeOptions {
    /// Configuration after file, environment and command-line overrides
    pub fn resolve_config(&self) -> Result<RuntimeConfig> {
        let loader = ConfigLoader::new();
        let config = match &self.config {
            Some(path) => loader
                .load_from_file(path)
                .with_context(|| format!("Failed to load configuration: {}", path.display()))?,
            None => {
                let cwd = std::env::current_dir().context("Failed to read current directory")?;
                let (found, config) = loader
                    .load_from_directory(&cwd)
                    .context("Failed to load luabridge.toml")?;
                if let Some(path) = found {
                    debug!(path = %path.display(), "using configuration file");
                }
                config
            }
        };

        if self.libraries.is_empty() {
            return Ok(config);
        }

        let mut libraries = config.libraries().to_vec();
        for name in &self.libraries {
            if !libraries.contains(name) {
                libraries.push(name.clone());
            }
        }
        let config = config.with_libraries(libraries);
        config.validate().context("Invalid --lib value")?;
        Ok(config)
    }

    pub fn open(&self) -> Result<ScriptRuntime> {
        let config = self.resolve_config()?;
        ScriptRuntime::with_config(config).context("Failed to create Lua runtime")
    }
}

/// Text printed for a result, or `None` when there is nothing to print.
///
/// Plain output prints strings raw and everything else as compact JSON;
/// null prints nothing.
pub fn render(value: &HostValue, json: bool) -> Result<Option<String>> {
    if json {
        let text = serde_json::to_string_pretty(value).context("Failed to serialize result")?;
        return Ok(Some(text));
    }

    match value {
        HostValue::Null => Ok(None),
        HostValue::String(bytes) => Ok(Some(String::from_utf8_lossy(bytes).into_owned())),
        other => {
            let text = serde_json::to_string(other).context("Failed to serialize result")?;
            Ok(Some(text))
        }
    }
}

pub fn print_value(value: &HostValue, json: bool) -> Result<()> {
    if let Some(text) = render(value, json)? {
        println!("{}", text);
    }
    Ok(())
}

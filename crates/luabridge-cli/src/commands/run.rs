//! Run and eval commands - execute Lua chunks

use super::{print_value, RuntimeOptions};
use anyhow::{Context, Result};
use std::path::Path;

/// Run a Lua file, printing its first return value
pub fn run(file: &Path, options: &RuntimeOptions) -> Result<()> {
    let runtime = options.open()?;
    let value = runtime
        .execute_file(file)
        .with_context(|| format!("Failed to run {}", file.display()))?;
    print_value(&value, options.json)
}

/// Run an inline chunk, printing its first return value
pub fn eval(source: &str, options: &RuntimeOptions) -> Result<()> {
    let runtime = options.open()?;
    let value = runtime
        .execute(source)
        .context("Failed to evaluate chunk")?;
    print_value(&value, options.json)
}

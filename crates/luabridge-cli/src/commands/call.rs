//! Call command - invoke a global Lua function with JSON arguments

use super::{print_value, RuntimeOptions};
use anyhow::{Context, Result};
use luabridge_runtime::HostValue;
use std::path::Path;

/// Load `script` (if any), then call `function` with `args`.
///
/// Each argument is parsed as JSON; anything that is not valid JSON is
/// passed as a plain string.
pub fn call(
    function: &str,
    args: &[String],
    script: Option<&Path>,
    options: &RuntimeOptions,
) -> Result<()> {
    let value = invoke(function, args, script, options)?;
    print_value(&value, options.json)
}

/// Result of the call, before printing
fn invoke(
    function: &str,
    args: &[String],
    script: Option<&Path>,
    options: &RuntimeOptions,
) -> Result<HostValue> {
    let runtime = options.open()?;

    if let Some(script) = script {
        runtime
            .execute_file(script)
            .with_context(|| format!("Failed to load {}", script.display()))?;
    }

    let args = HostValue::Array(args.iter().map(|raw| parse_argument(raw)).collect());
    runtime
        .call_function(function, args)
        .with_context(|| format!("Failed to call {}", function))
}

fn parse_argument(raw: &str) -> HostValue {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(json) => HostValue::from(json),
        Err(_) => HostValue::from(raw),
    }
}

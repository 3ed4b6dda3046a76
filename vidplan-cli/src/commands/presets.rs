//! Implementation of the 'presets' subcommand.

use crate::cli::PresetsArgs;
use crate::error::CliResult;

use log::info;
use serde_yaml::Value;

use vidplan_core::CoreError;
use vidplan_core::profile::{PRESET_NAMES, resolve_preset};
use vidplan_core::terminal;

use super::print_json;

/// The fields a preset sets, as `key: value` lines in field order.
pub fn preset_lines(name: &str) -> CliResult<Vec<String>> {
    let overrides = resolve_preset(name)?;
    let value = serde_yaml::to_value(&overrides)
        .map_err(|e| CoreError::OperationFailed(format!("cannot render preset {name}: {e}")))?;
    let Value::Mapping(fields) = value else {
        return Ok(Vec::new());
    };

    Ok(fields
        .iter()
        .filter(|(_, v)| !v.is_null())
        .filter_map(|(k, v)| {
            let key = k.as_str()?;
            let rendered = match v {
                Value::String(s) => s.clone(),
                Value::Bool(b) => b.to_string(),
                Value::Number(n) => n.to_string(),
                other => serde_yaml::to_string(other).ok()?.trim().to_string(),
            };
            Some(format!("{key}: {rendered}"))
        })
        .collect())
}

/// Runs the presets command.
pub fn run_presets(args: &PresetsArgs, json: bool) -> CliResult<()> {
    match &args.name {
        None if json => print_json(&PRESET_NAMES),
        None => {
            terminal::print_section("Presets");
            for name in PRESET_NAMES {
                info!("  {name}");
            }
            Ok(())
        }
        Some(name) if json => print_json(&resolve_preset(name)?),
        Some(name) => {
            let lines = preset_lines(name)?;
            terminal::print_section(name);
            for line in lines {
                info!("  {line}");
            }
            Ok(())
        }
    }
}

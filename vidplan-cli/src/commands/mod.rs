//! Command implementations for the CLI.
//!
//! Each submodule contains the implementation of a specific command.

/// Encodes a single file.
pub mod encode;

/// Encodes every video in a directory.
pub mod bulk;

/// Lists and shows presets.
pub mod presets;

use log::info;

use vidplan_core::TranscodeOutcome;
use vidplan_core::command::EncodeCommand;
use vidplan_core::terminal;

use crate::error::CliResult;

/// Prints one outcome the way the run was asked for.
///
/// Dry runs show the plan comparison; real runs only a success line, since
/// the plan was logged before encoding.
pub fn report_outcome(outcome: &TranscodeOutcome) {
    if outcome.encoded {
        terminal::print_success(&format!("Encoded {}", outcome.output_path.display()));
        return;
    }
    let command = EncodeCommand {
        passes: outcome.passes.clone(),
        output_path: outcome.output_path.clone(),
    };
    terminal::print_plan(&outcome.source, &outcome.plan, &command);
    info!("");
}

/// Prints `value` as pretty JSON on stdout.
pub fn print_json<T: serde::Serialize>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ============================================================================
// vidplan-cli/src/logging.rs
// ============================================================================
//
// LOGGING SETUP: Console and file logging for the CLI
//
// Console output goes through `fern`. Info lines are printed bare since they
// carry the formatted terminal output; other levels get a styled level tag.
// Verbose mode lowers the level to Debug and prefixes a timestamp. With
// --json, everything is sent to stderr so stdout holds only the JSON
// document. When a log file is requested, log4rs from vidplan-core takes
// over both destinations.
//
// KEY COMPONENTS:
// - init_logging: Installs the global logger
// - get_timestamp: Timestamps for verbose lines

use console::style;
use log::{Level, LevelFilter};
use std::path::Path;

use vidplan_core::CoreError;
use vidplan_core::file_logging::setup_file_logging;

use crate::error::CliResult;

/// Returns the current local time formatted as "YYYY-MM-DD HH:MM:SS".
pub fn get_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// The console level for the verbosity flag.
#[must_use]
pub fn level_for(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

fn level_tag(level: Level) -> String {
    let tag = format!("[{level}]");
    if std::env::var_os("NO_COLOR").is_some() {
        return tag;
    }
    match level {
        Level::Error => style(tag).red().bold().to_string(),
        Level::Warn => style(tag).yellow().to_string(),
        Level::Info => tag,
        Level::Debug | Level::Trace => style(tag).dim().to_string(),
    }
}

fn console_dispatch(verbose: bool) -> fern::Dispatch {
    fern::Dispatch::new()
        .format(move |out, message, record| {
            let tag = if record.level() == Level::Info {
                String::new()
            } else {
                format!("{} ", level_tag(record.level()))
            };
            if verbose {
                out.finish(format_args!("{} {tag}{message}", get_timestamp()));
            } else {
                out.finish(format_args!("{tag}{message}"));
            }
        })
        .level(level_for(verbose))
        // ffmpeg chatter only in verbose mode
        .level_for("ffmpeg_log", if verbose { LevelFilter::Debug } else { LevelFilter::Warn })
}

/// Installs the global logger.
pub fn init_logging(verbose: bool, json: bool, log_file: Option<&Path>) -> CliResult<()> {
    if let Some(path) = log_file {
        return setup_file_logging(path, level_for(verbose));
    }

    let dispatch = console_dispatch(verbose);
    let dispatch = if json {
        dispatch.chain(std::io::stderr())
    } else {
        dispatch
            .chain(
                fern::Dispatch::new()
                    .filter(|meta| meta.level() > Level::Warn)
                    .chain(std::io::stdout()),
            )
            .chain(
                fern::Dispatch::new()
                    .level(LevelFilter::Warn)
                    .chain(std::io::stderr()),
            )
    };
    dispatch
        .apply()
        .map_err(|e| CoreError::Config(format!("cannot install logger: {e}")))
}

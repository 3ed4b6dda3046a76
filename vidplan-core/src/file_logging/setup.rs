use log::LevelFilter;
use log4rs::{
    append::{
        console::{ConsoleAppender, Target},
        file::FileAppender,
    },
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
};
use std::path::Path;

use crate::error::{CoreError, CoreResult};

/// Line layout of the log file.
pub const FILE_LOG_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} [{l}] {m}{n}";

/// Line layout of the console copy.
pub const CONSOLE_LOG_PATTERN: &str = "{m}{n}";

/// Builds the log4rs configuration writing everything at `log_level` to
/// `log_file` and to stderr.
pub fn file_logging_config(log_file: &Path, log_level: LevelFilter) -> CoreResult<Config> {
    // Create log directory if it doesn't exist
    if let Some(parent) = log_file.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(FILE_LOG_PATTERN)))
        .build(log_file)?;

    let console_appender = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(CONSOLE_LOG_PATTERN)))
        .build();

    Config::builder()
        .appender(Appender::builder().build("console", Box::new(console_appender)))
        .appender(Appender::builder().build("file", Box::new(file_appender)))
        .build(
            Root::builder()
                .appender("console")
                .appender("file")
                .build(log_level),
        )
        .map_err(|e| CoreError::Config(format!("invalid logging configuration: {e}")))
}

/// Installs file logging as the global logger.
///
/// Fails if another logger is already installed.
pub fn setup_file_logging(log_file: &Path, log_level: LevelFilter) -> CoreResult<()> {
    let config = file_logging_config(log_file, log_level)?;
    log4rs::init_config(config)
        .map_err(|e| CoreError::Config(format!("cannot install file logger: {e}")))?;
    Ok(())
}

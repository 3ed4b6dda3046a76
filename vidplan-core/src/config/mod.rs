//! Run configuration for the vidplan-core library.
//!
//! `CoreConfig` carries the settings that are not part of a target profile:
//! where outputs go, where the ffmpeg tools live and whether to stop after
//! printing the plan. The profile itself lives in [`crate::profile`].

mod builder;

use std::path::PathBuf;

use crate::error::{CoreError, CoreResult};
use crate::external::ToolPaths;

pub use builder::CoreConfigBuilder;

// Default constants

/// Default output directory: the current working directory.
pub const DEFAULT_OUTPUT_DIR: &str = ".";

/// Environment variable overriding the ffmpeg/ffprobe directory.
pub const ENV_FFMPEG_PATH: &str = "VIDPLAN_FFMPEG_PATH";

/// Environment variable overriding the output directory.
pub const ENV_OUTPUT_PATH: &str = "VIDPLAN_OUTPUT_PATH";

/// Main configuration structure for the vidplan-core library.
///
/// Usually assembled by the CLI from the config file, the environment and
/// flags, then handed to [`crate::pipeline::run`].
///
/// # Examples
///
/// ```rust
/// use vidplan_core::config::CoreConfigBuilder;
/// use std::path::PathBuf;
///
/// let config = CoreConfigBuilder::new()
///     .output_dir(PathBuf::from("/srv/encoded"))
///     .ffmpeg_dir(PathBuf::from("/opt/ffmpeg/bin"))
///     .dry_run(true)
///     .build();
/// assert!(config.dry_run);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    /// Directory where encoded files are written
    pub output_dir: PathBuf,

    /// Directory holding the ffmpeg and ffprobe executables; `None` uses `PATH`
    pub ffmpeg_dir: Option<PathBuf>,

    /// Resolve and print the plan without running the encoder
    pub dry_run: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            ffmpeg_dir: None,
            dry_run: false,
        }
    }
}

impl CoreConfig {
    /// Locations of the ffmpeg and ffprobe executables.
    #[must_use]
    pub fn tools(&self) -> ToolPaths {
        ToolPaths::from_dir(self.ffmpeg_dir.as_deref())
    }

    /// Rejects directories that exist but are not directories.
    ///
    /// A missing output directory is fine; it is created before encoding.
    pub fn validate(&self) -> CoreResult<()> {
        if self.output_dir.as_os_str().is_empty() {
            return Err(CoreError::Config("output directory is empty".to_string()));
        }
        if self.output_dir.exists() && !self.output_dir.is_dir() {
            return Err(CoreError::Config(format!(
                "output path {} is not a directory",
                self.output_dir.display()
            )));
        }
        if let Some(dir) = &self.ffmpeg_dir {
            if !dir.is_dir() {
                return Err(CoreError::Config(format!(
                    "ffmpeg directory {} does not exist",
                    dir.display()
                )));
            }
        }
        Ok(())
    }
}

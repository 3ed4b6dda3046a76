// ============================================================================
// vidplan-core/src/config/builder.rs
// ============================================================================
//
// CONFIGURATION BUILDER: Builder Pattern for CoreConfig
//
// Fluent construction of CoreConfig. Every field has a default, so `build`
// cannot fail; `CoreConfig::validate` checks the result against the
// filesystem.

// ---- Standard library imports ----
use std::path::PathBuf;

// ---- Internal crate imports ----
use super::{CoreConfig, DEFAULT_OUTPUT_DIR};

/// Builder for creating CoreConfig instances.
///
/// # Examples
///
/// ```rust
/// use vidplan_core::config::CoreConfigBuilder;
/// use std::path::PathBuf;
///
/// let config = CoreConfigBuilder::new()
///     .output_dir(PathBuf::from("out"))
///     .build();
/// assert_eq!(config.output_dir, PathBuf::from("out"));
/// assert_eq!(config.ffmpeg_dir, None);
/// ```
#[derive(Debug, Clone)]
pub struct CoreConfigBuilder {
    output_dir: PathBuf,
    ffmpeg_dir: Option<PathBuf>,
    dry_run: bool,
}

impl Default for CoreConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CoreConfigBuilder {
    /// Creates a new CoreConfigBuilder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            ffmpeg_dir: None,
            dry_run: false,
        }
    }

    /// Sets the output directory.
    ///
    /// # Arguments
    ///
    /// * `output_dir` - The directory where encoded output files will be saved
    #[must_use]
    pub fn output_dir(mut self, output_dir: PathBuf) -> Self {
        self.output_dir = output_dir;
        self
    }

    /// Sets the directory holding the ffmpeg and ffprobe executables.
    #[must_use]
    pub fn ffmpeg_dir(mut self, ffmpeg_dir: PathBuf) -> Self {
        self.ffmpeg_dir = Some(ffmpeg_dir);
        self
    }

    /// Sets the ffmpeg directory only when one is given.
    #[must_use]
    pub fn maybe_ffmpeg_dir(mut self, ffmpeg_dir: Option<PathBuf>) -> Self {
        if ffmpeg_dir.is_some() {
            self.ffmpeg_dir = ffmpeg_dir;
        }
        self
    }

    /// Sets whether to stop after printing the plan.
    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Builds a CoreConfig instance from the builder.
    #[must_use]
    pub fn build(self) -> CoreConfig {
        CoreConfig {
            output_dir: self.output_dir,
            ffmpeg_dir: self.ffmpeg_dir,
            dry_run: self.dry_run,
        }
    }
}

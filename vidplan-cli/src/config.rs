// ============================================================================
// vidplan-cli/src/config.rs
// ============================================================================
//
// CONFIG FILE: YAML settings layered under the command-line flags
//
// The file is looked up at --config, then ./.vidplan.yaml, then
// ~/.vidplan.yaml. A missing default file is not an error; a missing file
// named with --config is.
//
// Layering, lowest to highest: built-in defaults, the `encode:` section of
// the file, the preset, then the individual flags.
//
// Example:
//
//   output_path: /srv/encoded
//   ffmpeg_path: /opt/ffmpeg/bin
//   preset: telegram
//   encode:
//     size: 720p
//     crop: true

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use vidplan_core::config::{CoreConfigBuilder, DEFAULT_OUTPUT_DIR};
use vidplan_core::profile::resolve_preset;
use vidplan_core::{CoreConfig, CoreError, Profile, ProfileOverrides};

use crate::cli::{ProfileArgs, RunArgs};
use crate::error::{CliErrorContext, CliResult};

/// File name searched in the working and home directories.
pub const CONFIG_FILE_NAME: &str = ".vidplan.yaml";

/// Contents of a config file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Default output directory
    pub output_path: Option<PathBuf>,
    /// Directory holding ffmpeg and ffprobe
    pub ffmpeg_path: Option<PathBuf>,
    /// Preset applied when no --preset flag is given
    pub preset: Option<String>,
    /// Profile fields applied under the preset
    pub encode: ProfileOverrides,
}

impl FileConfig {
    /// Parses a YAML document. An empty document is an empty config.
    pub fn parse(text: &str) -> CliResult<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
            .map_err(|e| CoreError::Config(format!("invalid config file: {e}")))
    }

    /// Reads and parses the file at `path`.
    pub fn from_file(path: &Path) -> CliResult<Self> {
        let text = fs::read_to_string(path)
            .cli_with_context(|| format!("Failed to read config file {}", path.display()))?;
        log::debug!("Loaded config from {}", path.display());
        Self::parse(&text)
    }

    /// Loads the explicit file, else the first default location that exists.
    pub fn load(explicit: Option<&Path>) -> CliResult<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match default_locations().into_iter().find(|p| p.is_file()) {
            Some(path) => Self::from_file(&path),
            None => Ok(Self::default()),
        }
    }
}

/// Default config locations in lookup order.
#[must_use]
pub fn default_locations() -> Vec<PathBuf> {
    let mut locations = vec![PathBuf::from(CONFIG_FILE_NAME)];
    if let Some(home) = dirs::home_dir() {
        locations.push(home.join(CONFIG_FILE_NAME));
    }
    locations
}

/// Merges the file, the preset and the flags into one immutable profile.
pub fn build_profile(file: &FileConfig, run: &RunArgs, flags: &ProfileArgs) -> CliResult<Profile> {
    let mut layers = file.encode.clone();
    if let Some(name) = run.preset.as_deref().or(file.preset.as_deref()) {
        log::debug!("Applying preset {name}");
        layers = layers.merge(resolve_preset(name)?);
    }
    layers.merge(flags.to_overrides()).build()
}

/// Run settings from the flags (or their environment variables), then the file.
#[must_use]
pub fn build_core_config(file: &FileConfig, run: &RunArgs) -> CoreConfig {
    let output_dir = run
        .output_path
        .clone()
        .or_else(|| file.output_path.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
    CoreConfigBuilder::new()
        .output_dir(output_dir)
        .maybe_ffmpeg_dir(file.ffmpeg_path.clone())
        .maybe_ffmpeg_dir(run.ffmpeg_path.clone())
        .dry_run(run.dry_run)
        .build()
}

// ============================================================================
// vidplan-core/src/external/mod.rs
// ============================================================================
//
// EXTERNAL TOOLS: Interactions with ffmpeg and ffprobe
//
// This module wraps the two external collaborators behind traits so the
// pipeline can be driven by mocks in tests. ffprobe is run directly through
// std::process and its key/value output parsed; ffmpeg runs through
// ffmpeg-sidecar, whose event stream carries both progress and the
// diagnostic lines scraped by crop and volume detection.
//
// KEY COMPONENTS:
// - ToolPaths: Locations of the ffmpeg and ffprobe binaries
// - Prober / FfprobeCli: Stream probing
// - FfmpegSpawner / SidecarSpawner: ffmpeg process execution
// - check_dependency: Availability check run before real encodes

// ---- Internal crate imports ----
use crate::error::{CoreError, CoreResult};

// ---- Standard library imports ----
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

// ============================================================================
// SUBMODULES
// ============================================================================

/// Traits and implementations for executing ffmpeg commands
pub mod ffmpeg_executor;

/// Traits and implementations for executing ffprobe
pub mod ffprobe_executor;

/// Mock collaborators for tests
#[cfg(any(test, feature = "test-mocks"))]
pub mod mocks;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use ffmpeg_executor::{
    FfmpegProcess, FfmpegSpawner, SidecarProcess, SidecarSpawner, ffmpeg_command, run_capture,
    run_encode_pass,
};
pub use ffprobe_executor::{FfprobeCli, Prober, probe_args};

// ============================================================================
// TOOL LOCATIONS
// ============================================================================

/// Paths of the ffmpeg and ffprobe executables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl ToolPaths {
    /// Resolves both tools inside `dir`, or from `PATH` when no directory is given.
    #[must_use]
    pub fn from_dir(dir: Option<&Path>) -> Self {
        let exe = |name: &str| {
            let file = format!("{name}{}", std::env::consts::EXE_SUFFIX);
            match dir {
                Some(dir) if !dir.as_os_str().is_empty() => dir.join(file),
                _ => PathBuf::from(file),
            }
        };
        Self {
            ffmpeg: exe("ffmpeg"),
            ffprobe: exe("ffprobe"),
        }
    }
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self::from_dir(None)
    }
}

/// The platform null sink used as output for analysis and first passes.
#[must_use]
pub fn null_device() -> &'static str {
    if cfg!(windows) { "NUL" } else { "/dev/null" }
}

// ============================================================================
// DEPENDENCY CHECKING
// ============================================================================

/// Checks that `program` starts when run with `-version`.
///
/// A missing executable is reported as `DependencyNotFound`; any other spawn
/// failure as `CommandStart`.
pub fn check_dependency(program: &Path) -> CoreResult<()> {
    let name = program.display().to_string();
    let result = Command::new(program)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match result {
        Ok(_) => {
            log::debug!("Found dependency: {name}");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::warn!("Dependency '{name}' not found.");
            Err(CoreError::DependencyNotFound(name))
        }
        Err(e) => {
            log::error!("Failed to start dependency check command '{name}': {e}");
            Err(CoreError::CommandStart(name, e))
        }
    }
}

// ============================================================================
// vidplan-cli/src/error.rs
// ============================================================================
//
// CLI ERROR HANDLING: Error types and utilities for the CLI
//
// The CLI reuses CoreError. Foreign errors get context text through
// CliErrorContext, and `suggestion` maps the failures a user can fix to a
// hint printed under the error.
//
// KEY COMPONENTS:
// - CliResult: Type alias for CLI operations
// - CliErrorContext: Context wrapping for Result and Option
// - suggestion: User-facing hints per error kind

// ---- Internal crate imports ----
use vidplan_core::{CoreError, CoreResult};

// ---- Standard library imports ----
use std::fmt;

// ============================================================================
// RESULT TYPE ALIAS
// ============================================================================

/// Result type of the CLI; failures are core errors.
pub type CliResult<T> = CoreResult<T>;

// ============================================================================
// ERROR CONVERSION UTILITIES
// ============================================================================

/// Extension trait for adding context to errors in the CLI.
///
/// Wraps any error convertible into `CoreError` as `OperationFailed` with
/// the context text in front of the original message.
pub trait CliErrorContext<T> {
    /// Prefixes the error with `context`.
    fn cli_context<C>(self, context: C) -> CliResult<T>
    where
        C: fmt::Display;

    /// Like `cli_context`, building the text only on failure.
    fn cli_with_context<C, F>(self, f: F) -> CliResult<T>
    where
        C: fmt::Display,
        F: FnOnce() -> C;
}

impl<T, E> CliErrorContext<T> for Result<T, E>
where
    E: Into<CoreError>,
{
    fn cli_context<C>(self, context: C) -> CliResult<T>
    where
        C: fmt::Display,
    {
        self.map_err(|e| {
            let core_error: CoreError = e.into();
            CoreError::OperationFailed(format!("{}: {}", context, core_error))
        })
    }

    fn cli_with_context<C, F>(self, f: F) -> CliResult<T>
    where
        C: fmt::Display,
        F: FnOnce() -> C,
    {
        self.map_err(|e| {
            let core_error: CoreError = e.into();
            CoreError::OperationFailed(format!("{}: {}", f(), core_error))
        })
    }
}

impl<T> CliErrorContext<T> for Option<T> {
    fn cli_context<C>(self, context: C) -> CliResult<T>
    where
        C: fmt::Display,
    {
        self.ok_or_else(|| CoreError::OperationFailed(context.to_string()))
    }

    fn cli_with_context<C, F>(self, f: F) -> CliResult<T>
    where
        C: fmt::Display,
        F: FnOnce() -> C,
    {
        self.ok_or_else(|| CoreError::OperationFailed(f().to_string()))
    }
}

// ============================================================================
// USER HINTS
// ============================================================================

/// A hint for errors the user can act on.
#[must_use]
pub fn suggestion(err: &CoreError) -> Option<&'static str> {
    match err {
        CoreError::DependencyNotFound(_) => Some(
            "Install ffmpeg, or point --ffmpeg-path (VIDPLAN_FFMPEG_PATH) at the directory holding ffmpeg and ffprobe",
        ),
        CoreError::UnknownPreset { .. } => Some("Run `vidplan presets` to list the available presets"),
        CoreError::InvalidTimecode(_) => Some("Use seconds (90), M:S (1:30) or H:M:S (0:01:30)"),
        CoreError::InputNotFound(_) | CoreError::NoFilesFound(_) => {
            Some("Check the input path; bulk mode picks up .mkv and .mp4 files")
        }
        CoreError::Config(_) => Some("Check the config file and the output path"),
        CoreError::CommandFailed(..) => Some("Re-run with --verbose to see the full ffmpeg output"),
        _ => None,
    }
}

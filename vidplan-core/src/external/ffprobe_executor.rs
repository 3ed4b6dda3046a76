//! ffprobe integration.
//!
//! Each probe selects a single stream and asks for the default
//! `key=value` output format. stdout and stderr are collected together
//! while waiting on the child. There is no timeout: a hung ffprobe blocks
//! the run.

use crate::error::{CoreError, CoreResult, command_start_error, command_wait_error};
use crate::media::{ProbeResult, StreamKind};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Something that can probe a single stream of a media file.
pub trait Prober {
    /// Returns the key/value metadata of stream `index` of the given kind.
    ///
    /// A missing stream yields an empty result, not an error.
    fn probe_stream(&self, file: &Path, kind: StreamKind, index: u32) -> CoreResult<ProbeResult>;
}

/// Builds the ffprobe arguments for one stream.
///
/// Video probes include the format section so containers that only report
/// duration and bitrate at the format level still provide them.
#[must_use]
pub fn probe_args(file: &Path, kind: StreamKind, index: u32) -> Vec<String> {
    let mut args = vec![
        "-v".to_string(),
        "error".to_string(),
        "-select_streams".to_string(),
        format!("{}:{}", kind.specifier(), index),
    ];
    if kind == StreamKind::Video {
        args.push("-show_format".to_string());
    }
    args.extend([
        "-show_streams".to_string(),
        "-of".to_string(),
        "default=noprint_wrappers=1".to_string(),
        "-i".to_string(),
        file.to_string_lossy().into_owned(),
    ]);
    args
}

/// `Prober` backed by the ffprobe executable.
#[derive(Debug, Clone)]
pub struct FfprobeCli {
    program: PathBuf,
}

impl FfprobeCli {
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for FfprobeCli {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

impl Prober for FfprobeCli {
    fn probe_stream(&self, file: &Path, kind: StreamKind, index: u32) -> CoreResult<ProbeResult> {
        let args = probe_args(file, kind, index);
        log::debug!("Running: {} {}", self.program.display(), args.join(" "));

        let child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| command_start_error("ffprobe", e))?;

        // drains stdout and stderr concurrently
        let captured = child
            .wait_with_output()
            .map_err(|e| command_wait_error("ffprobe", e))?;
        if !captured.status.success() {
            return Err(CoreError::ProbeFailed {
                path: file.to_path_buf(),
                message: format!(
                    "ffprobe exited with {}: {}",
                    captured.status,
                    String::from_utf8_lossy(&captured.stderr).trim()
                ),
            });
        }
        let output = String::from_utf8_lossy(&captured.stdout);

        let result = ProbeResult::parse(&output);
        log::trace!(
            "ffprobe {}:{} returned {} keys",
            kind.specifier(),
            index,
            result.len()
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_probe_args_include_format() {
        let args = probe_args(Path::new("/in/movie.mkv"), StreamKind::Video, 0);
        assert_eq!(
            args,
            [
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-show_format",
                "-show_streams",
                "-of",
                "default=noprint_wrappers=1",
                "-i",
                "/in/movie.mkv"
            ]
        );
    }

    #[test]
    fn audio_probe_args_select_stream() {
        let args = probe_args(Path::new("a.mp4"), StreamKind::Audio, 2);
        assert!(args.contains(&"a:2".to_string()));
        assert!(!args.contains(&"-show_format".to_string()));
    }

    #[cfg(unix)]
    fn fake_ffprobe(dir: &Path, script: &str) -> std::io::Result<PathBuf> {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join("ffprobe");
        std::fs::write(&path, format!("#!/bin/sh\n{script}"))?;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;
        Ok(path)
    }

    #[cfg(unix)]
    #[test]
    fn noisy_stderr_does_not_block_stdout() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        // well past a pipe buffer of stderr before any stdout
        let program = fake_ffprobe(
            dir.path(),
            "i=0\nwhile [ $i -lt 4000 ]; do\n  echo \"[warning] timestamp discontinuity in stream 0, frame $i\" >&2\n  i=$((i+1))\ndone\necho width=1920\necho height=1080\n",
        )?;
        let result = FfprobeCli::new(program).probe_stream(Path::new("a.mkv"), StreamKind::Video, 0)?;
        assert_eq!(result.u32("width"), 1920);
        assert_eq!(result.u32("height"), 1080);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn failed_ffprobe_reports_stderr() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let program = fake_ffprobe(dir.path(), "echo 'a.mkv: No such file or directory' >&2\nexit 1\n")?;
        let result = FfprobeCli::new(program).probe_stream(Path::new("a.mkv"), StreamKind::Video, 0);
        match result {
            Err(CoreError::ProbeFailed { message, .. }) => {
                assert!(message.contains("No such file or directory"));
            }
            other => panic!("expected ProbeFailed, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn missing_ffprobe_fails_to_start() {
        let prober = FfprobeCli::new("/definitely/not/here/ffprobe");
        let result = prober.probe_stream(Path::new("a.mkv"), StreamKind::Video, 0);
        assert!(matches!(result, Err(CoreError::CommandStart(..))));
    }
}

// ============================================================================
// vidplan-core/src/external/ffmpeg_executor.rs
// ============================================================================
//
// FFMPEG EXECUTOR: FFmpeg Process Management and Abstraction
//
// This module provides abstractions for spawning and interacting with FFmpeg
// processes, plus the two ways the pipeline runs ffmpeg: analysis passes
// whose diagnostic text is captured for scraping, and encode passes whose
// output is forwarded to the log and a progress bar.
//
// KEY COMPONENTS:
// - FfmpegProcess: Trait representing an active FFmpeg process
// - FfmpegSpawner: Trait for creating new FFmpeg processes
// - SidecarSpawner: Concrete implementation using ffmpeg-sidecar
// - run_capture / run_encode_pass: The two execution modes

use crate::error::{CoreResult, command_failed_error, command_start_error, command_wait_error};
use crate::progress::EncodeProgress;
use ffmpeg_sidecar::child::FfmpegChild as SidecarChild;
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::FfmpegEvent;
use std::path::Path;
use std::process::ExitStatus;

// --- FFmpeg Execution Abstraction ---

/// Trait representing an active ffmpeg process instance.
pub trait FfmpegProcess {
    /// Processes events from the running command using a provided handler closure.
    fn handle_events<F>(&mut self, handler: F) -> CoreResult<()>
    where
        F: FnMut(FfmpegEvent) -> CoreResult<()>;

    /// Waits for the command to complete and returns its exit status.
    fn wait(&mut self) -> CoreResult<ExitStatus>;
}

/// Trait representing something that can spawn an `FfmpegProcess`.
pub trait FfmpegSpawner {
    type Process: FfmpegProcess;
    /// Spawns the ffmpeg command, consuming the command object.
    fn spawn(&self, cmd: FfmpegCommand) -> CoreResult<Self::Process>;
}

// --- Concrete Implementation using ffmpeg-sidecar ---

/// Wrapper around `ffmpeg_sidecar::child::FfmpegChild` implementing `FfmpegProcess`.
pub struct SidecarProcess(SidecarChild);

impl FfmpegProcess for SidecarProcess {
    fn handle_events<F>(&mut self, mut handler: F) -> CoreResult<()>
    where
        F: FnMut(FfmpegEvent) -> CoreResult<()>,
    {
        let iterator = self.0.iter().map_err(|e| {
            log::error!("Failed to get ffmpeg event iterator: {e}");
            command_failed_error("ffmpeg (event iterator)", ExitStatus::default(), e.to_string())
        })?;
        for event in iterator {
            handler(event)?;
        }
        Ok(())
    }

    fn wait(&mut self) -> CoreResult<ExitStatus> {
        self.0.wait().map_err(|e| command_wait_error("ffmpeg", e))
    }
}

/// Concrete implementation of `FfmpegSpawner` using `ffmpeg-sidecar`.
#[derive(Debug, Clone, Default)]
pub struct SidecarSpawner;

impl FfmpegSpawner for SidecarSpawner {
    type Process = SidecarProcess;

    fn spawn(&self, mut cmd: FfmpegCommand) -> CoreResult<Self::Process> {
        cmd.spawn()
            .map(SidecarProcess)
            .map_err(|e| command_start_error("ffmpeg", e))
    }
}

/// Builds a sidecar command for `program` with a fully assembled argument list.
#[must_use]
pub fn ffmpeg_command(program: &Path, args: &[String]) -> FfmpegCommand {
    let mut cmd = FfmpegCommand::new_with_path(program);
    cmd.args(args);
    cmd
}

/// Runs an analysis pass and returns every diagnostic line it printed.
///
/// A non-zero exit is returned as an error; callers treating the analysis
/// as best effort decide what to do with it.
pub fn run_capture<S: FfmpegSpawner>(
    spawner: &S,
    program: &Path,
    args: &[String],
) -> CoreResult<String> {
    log::debug!("Running: {} {}", program.display(), args.join(" "));
    let mut process = spawner.spawn(ffmpeg_command(program, args))?;

    let mut output = String::new();
    process.handle_events(|event| {
        match event {
            FfmpegEvent::Log(_, line) | FfmpegEvent::Error(line) => {
                output.push_str(&line);
                output.push('\n');
            }
            _ => {}
        }
        Ok(())
    })?;

    let status = process.wait()?;
    if !status.success() {
        return Err(command_failed_error("ffmpeg", status, tail(&output, 20)));
    }
    Ok(output)
}

/// Runs one encode pass, forwarding diagnostics and reporting progress.
///
/// `duration` (seconds) scales the progress bar; 0 shows a spinner.
pub fn run_encode_pass<S: FfmpegSpawner>(
    spawner: &S,
    program: &Path,
    args: &[String],
    duration: f64,
    label: &str,
) -> CoreResult<()> {
    log::debug!("Running: {} {}", program.display(), args.join(" "));
    let mut process = spawner.spawn(ffmpeg_command(program, args))?;

    let mut progress = EncodeProgress::new(label, duration);
    process.handle_events(|event| progress.handle_event(event))?;
    progress.finish();

    let status = process.wait()?;
    if !status.success() {
        log::error!("ffmpeg {label} failed with {status}");
        return Err(command_failed_error(
            format!("ffmpeg ({label})"),
            status,
            tail(progress.stderr_buffer(), 20),
        ));
    }
    Ok(())
}

/// The last `lines` lines of `text`.
fn tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.lines().collect();
    all[all.len().saturating_sub(lines)..].join("\n")
}

//! Encode progress handling.
//!
//! Turns ffmpeg-sidecar events from an encode pass into an `indicatif`
//! progress bar, forwards ffmpeg's own log lines to the `log` facade, and
//! keeps error lines for the failure message.

use crate::error::CoreResult;
use crate::utils::{format_duration, parse_ffmpeg_time};
use ffmpeg_sidecar::event::{FfmpegEvent, FfmpegProgress, LogLevel as FfmpegLogLevel};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::IsTerminal;

const BAR_TEMPLATE: &str =
    "{msg:>12} [{bar:40.cyan/blue}] {percent:>3}% {elapsed_precise} eta {eta_precise}";

/// Handler for the events of one encode pass.
pub struct EncodeProgress {
    bar: ProgressBar,
    duration: f64,
    last_logged_decile: i32,
    interactive: bool,
    stderr_buffer: String,
}

impl EncodeProgress {
    /// Creates a bar for a pass of `duration` seconds (0 when unknown).
    #[must_use]
    pub fn new(label: &str, duration: f64) -> Self {
        let interactive = std::io::stderr().is_terminal();
        let bar = if duration > 0.0 {
            let bar = ProgressBar::new(duration.ceil() as u64);
            bar.set_style(
                ProgressStyle::with_template(BAR_TEMPLATE)
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("=> "),
            );
            bar
        } else {
            ProgressBar::new_spinner()
        };
        if !interactive {
            bar.set_draw_target(ProgressDrawTarget::hidden());
        }
        bar.set_message(label.to_string());

        Self {
            bar,
            duration,
            last_logged_decile: -1,
            interactive,
            stderr_buffer: String::new(),
        }
    }

    /// Handles an `FFmpeg` event.
    pub fn handle_event(&mut self, event: FfmpegEvent) -> CoreResult<()> {
        match event {
            FfmpegEvent::Progress(progress) => self.handle_progress(&progress),
            FfmpegEvent::Log(level, message) => handle_log(&level, &message),
            FfmpegEvent::Error(error) => self.handle_error(error),
            _ => {}
        }
        Ok(())
    }

    /// Error lines seen so far.
    #[must_use]
    pub fn stderr_buffer(&self) -> &str {
        &self.stderr_buffer
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    fn handle_progress(&mut self, progress: &FfmpegProgress) {
        let current = parse_ffmpeg_time(&progress.time).unwrap_or(0.0);
        self.bar.set_position(current as u64);

        // Non-interactive runs (log files, pipes) get a line every 10%.
        if !self.interactive && self.duration > 0.0 {
            let percent = (current / self.duration * 100.0).min(100.0);
            let decile = (percent / 10.0) as i32;
            if decile > self.last_logged_decile {
                self.last_logged_decile = decile;
                log::info!(
                    target: "vidplan::progress",
                    "Encoding progress: {:.0}% | {} / {} | speed {:.2}x",
                    percent,
                    format_duration(current),
                    format_duration(self.duration),
                    progress.speed
                );
            }
        } else if self.duration <= 0.0 {
            self.bar.tick();
        }
    }

    fn handle_error(&mut self, error: String) {
        if is_non_critical_ffmpeg_error(&error) {
            log::debug!(target: "ffmpeg_log", "{error}");
        } else {
            self.bar.suspend(|| log::warn!(target: "ffmpeg_log", "{error}"));
        }
        self.stderr_buffer.push_str(&error);
        self.stderr_buffer.push('\n');
    }
}

/// Forwards an ffmpeg log line; informational output goes to debug.
fn handle_log(level: &FfmpegLogLevel, message: &str) {
    match level {
        FfmpegLogLevel::Fatal | FfmpegLogLevel::Error => {
            log::error!(target: "ffmpeg_log", "{message}");
        }
        FfmpegLogLevel::Warning => log::warn!(target: "ffmpeg_log", "{message}"),
        _ => log::debug!(target: "ffmpeg_log", "{message}"),
    }
}

/// Messages ffmpeg prints to stderr that do not indicate a problem.
fn is_non_critical_ffmpeg_error(error: &str) -> bool {
    error.contains("deprecated pixel format")
        || error.contains("No accelerated colorspace conversion")
        || error.contains("Timestamps are unset")
        || error.contains("first frame is no keyframe")
}

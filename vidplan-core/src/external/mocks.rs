// vidplan-core/src/external/mocks.rs

// --- Mocking Infrastructure (for testing) ---

// Compiled for unit tests and when the "test-mocks" feature is enabled.

use super::{FfmpegProcess, FfmpegSpawner, Prober};
use crate::error::{CoreError, CoreResult};
use crate::media::{ProbeResult, StreamKind};
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::{FfmpegEvent, LogLevel};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::rc::Rc;

/// Builds an exit status carrying `code`.
#[cfg(unix)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    ExitStatus::from_raw(code << 8)
}

/// Builds an exit status carrying `code`.
#[cfg(windows)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;
    ExitStatus::from_raw(code as u32)
}

/// An info-level ffmpeg log line event.
#[must_use]
pub fn log_event(line: &str) -> FfmpegEvent {
    FfmpegEvent::Log(LogLevel::Info, line.to_string())
}

/// Mock implementation of `FfmpegProcess`.
#[derive(Clone)]
pub struct MockFfmpegProcess {
    /// Events to emit when `handle_events` is called.
    pub events_to_emit: Rc<RefCell<Vec<FfmpegEvent>>>,
    /// Exit status to return when `wait` is called.
    pub exit_status: ExitStatus,
}

impl FfmpegProcess for MockFfmpegProcess {
    fn handle_events<F>(&mut self, mut handler: F) -> CoreResult<()>
    where
        F: FnMut(FfmpegEvent) -> CoreResult<()>,
    {
        let events = self.events_to_emit.borrow().clone();
        for event in events {
            handler(event)?;
        }
        Ok(())
    }

    fn wait(&mut self) -> CoreResult<ExitStatus> {
        Ok(self.exit_status)
    }
}

/// Represents an expected ffmpeg command call and its mock result.
pub struct MockFfmpegExpectation {
    pub arg_pattern: String,
    pub result: CoreResult<MockFfmpegProcess>,
}

/// Mock implementation of `FfmpegSpawner` supporting multiple expectations.
///
/// Each spawn records its arguments and consumes the first expectation whose
/// pattern is a substring of any argument. Unmatched spawns fail.
#[derive(Clone, Default)]
pub struct MockFfmpegSpawner {
    expectations: Rc<RefCell<Vec<MockFfmpegExpectation>>>,
    received_calls: Rc<RefCell<Vec<Vec<String>>>>,
}

impl MockFfmpegSpawner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_expectation(&self, arg_pattern: &str, result: CoreResult<MockFfmpegProcess>) {
        self.expectations.borrow_mut().push(MockFfmpegExpectation {
            arg_pattern: arg_pattern.to_string(),
            result,
        });
    }

    pub fn add_success_expectation(&self, arg_pattern: &str, events: Vec<FfmpegEvent>) {
        self.add_exit_error_expectation(arg_pattern, events, 0);
    }

    pub fn add_spawn_error_expectation(&self, arg_pattern: &str, error: CoreError) {
        self.add_expectation(arg_pattern, Err(error));
    }

    pub fn add_exit_error_expectation(
        &self,
        arg_pattern: &str,
        events: Vec<FfmpegEvent>,
        exit_code: i32,
    ) {
        let process = MockFfmpegProcess {
            events_to_emit: Rc::new(RefCell::new(events)),
            exit_status: exit_status(exit_code),
        };
        self.add_expectation(arg_pattern, Ok(process));
    }

    #[must_use]
    pub fn get_received_calls(&self) -> Vec<Vec<String>> {
        self.received_calls.borrow().clone()
    }
}

impl FfmpegSpawner for MockFfmpegSpawner {
    type Process = MockFfmpegProcess;

    fn spawn(&self, cmd: FfmpegCommand) -> CoreResult<Self::Process> {
        let args: Vec<String> = cmd
            .get_args()
            .map(|s| s.to_string_lossy().into_owned())
            .collect();
        self.received_calls.borrow_mut().push(args.clone());

        let mut expectations = self.expectations.borrow_mut();
        let found_index = expectations
            .iter()
            .position(|exp| args.iter().any(|arg| arg.contains(&exp.arg_pattern)));

        match found_index {
            Some(index) => {
                let expectation = expectations.remove(index);
                log::debug!(
                    "MockFfmpegSpawner: matched expectation with pattern '{}'",
                    expectation.arg_pattern
                );
                expectation.result
            }
            None => Err(CoreError::OperationFailed(format!(
                "MockFfmpegSpawner: unexpected ffmpeg call {args:?}"
            ))),
        }
    }
}

/// Mock `Prober` answering from canned ffprobe text per stream kind.
#[derive(Clone, Default)]
pub struct MockProber {
    outputs: HashMap<StreamKind, String>,
    failure: Option<String>,
    received_calls: Rc<RefCell<Vec<(PathBuf, StreamKind, u32)>>>,
}

impl MockProber {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the `key=value` text returned for a stream kind.
    #[must_use]
    pub fn with_output(mut self, kind: StreamKind, output: &str) -> Self {
        self.outputs.insert(kind, output.to_string());
        self
    }

    /// Makes every probe fail.
    #[must_use]
    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    #[must_use]
    pub fn get_received_calls(&self) -> Vec<(PathBuf, StreamKind, u32)> {
        self.received_calls.borrow().clone()
    }
}

impl Prober for MockProber {
    fn probe_stream(&self, file: &Path, kind: StreamKind, index: u32) -> CoreResult<ProbeResult> {
        self.received_calls
            .borrow_mut()
            .push((file.to_path_buf(), kind, index));

        if let Some(message) = &self.failure {
            return Err(CoreError::ProbeFailed {
                path: file.to_path_buf(),
                message: message.clone(),
            });
        }
        Ok(self
            .outputs
            .get(&kind)
            .map(|text| ProbeResult::parse(text))
            .unwrap_or_default())
    }
}

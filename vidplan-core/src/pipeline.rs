// ============================================================================
// vidplan-core/src/pipeline.rs
// ============================================================================
//
// PIPELINE: One transcode run from input file to finished encode
//
// Runs the stages of a single invocation in order: probe the video stream,
// probe the audio stream, optional crop and volume detection, plan
// resolution, filter graph and command assembly, then the encoder passes.
// Only the probe and encode boundaries fail the run; detection problems are
// logged by the detectors and treated as "nothing detected".
//
// KEY COMPONENTS:
// - analyze_source: Probing and detection into a source descriptor
// - plan: Resolution and assembly into an EncodeCommand
// - run: The full sequence including encoder execution
// - TranscodeOutcome: Serializable record of what was planned and done

// ---- Internal crate imports ----
use crate::command::{EncodeCommand, assemble_command, locate_sidecar_subtitle};
use crate::config::CoreConfig;
use crate::detection::{detect_crop, detect_volume, detection_window};
use crate::error::{CoreError, CoreResult};
use crate::external::{FfmpegSpawner, Prober, ToolPaths, check_dependency, run_encode_pass};
use crate::filter_graph::build_filter_graph;
use crate::file_logging::log_plan;
use crate::media::{COPY, StreamKind, Video};
use crate::profile::Profile;
use crate::resolver::{ResolvedPlan, resolve};

// ---- External crate imports ----
use serde::Serialize;

// ---- Standard library imports ----
use std::path::{Path, PathBuf};

/// What a run planned and whether the encoder was executed.
#[derive(Debug, Clone, Serialize)]
pub struct TranscodeOutcome {
    pub source: Video,
    pub plan: ResolvedPlan,
    /// ffmpeg argument lists, one per pass.
    pub passes: Vec<Vec<String>>,
    pub output_path: PathBuf,
    /// False for dry runs.
    pub encoded: bool,
}

/// Probes `input` and runs the detection passes the profile asks for.
///
/// A video probe with no output is fatal. An empty audio probe means the
/// file has no audio track at the selected index.
pub fn analyze_source<P: Prober, S: FfmpegSpawner>(
    prober: &P,
    spawner: &S,
    tools: &ToolPaths,
    profile: &Profile,
    input: &Path,
) -> CoreResult<Video> {
    let mut source =
        Video::new(input).with_streams(profile.video_stream, profile.audio_stream);

    let video_probe = prober.probe_stream(input, StreamKind::Video, profile.video_stream)?;
    if video_probe.is_empty() {
        return Err(CoreError::ProbeFailed {
            path: input.to_path_buf(),
            message: format!("no data for video stream {}", profile.video_stream),
        });
    }
    source.apply_video_probe(&video_probe, profile.decoder.as_deref());

    let audio_probe = prober.probe_stream(input, StreamKind::Audio, profile.audio_stream)?;
    source.apply_audio_probe(&audio_probe);
    if !source.has_audio() {
        log::info!("No audio stream at index {}", profile.audio_stream);
    }

    let copy = profile.codec.as_deref() == Some(COPY);
    if profile.crop && !copy {
        let window = detection_window(
            profile.crop_detect_duration,
            profile.duration,
            profile.end,
            source.duration,
        );
        if let Some(detection) = detect_crop(spawner, &tools.ffmpeg, &source, window) {
            source.apply_crop(&detection);
        }
    }

    if profile.detect_volume {
        let volume = detect_volume(spawner, &tools.ffmpeg, &source);
        source.apply_volume(&volume);
    }

    Ok(source)
}

/// Resolves the plan for an analyzed source and assembles its command.
#[must_use]
pub fn plan(source: &Video, profile: &Profile, output_dir: &Path) -> (ResolvedPlan, EncodeCommand) {
    let mut resolved = resolve(source, profile);
    let sidecar = if profile.burn_subtitles {
        locate_sidecar_subtitle(source)
    } else {
        None
    };
    let graph = build_filter_graph(source, &resolved, profile, sidecar.as_deref());
    let command = assemble_command(source, &resolved, &graph, profile, output_dir);
    resolved.target.output_path = Some(command.output_path.clone());
    (resolved, command)
}

/// Runs the whole sequence for one input file.
///
/// In dry-run mode the plan is resolved and returned without checking for
/// or running the encoder.
pub fn run<P: Prober, S: FfmpegSpawner>(
    prober: &P,
    spawner: &S,
    config: &CoreConfig,
    profile: &Profile,
    input: &Path,
) -> CoreResult<TranscodeOutcome> {
    if !input.is_file() {
        return Err(CoreError::InputNotFound(input.to_path_buf()));
    }

    let tools = config.tools();
    if !config.dry_run {
        check_dependency(&tools.ffprobe)?;
        check_dependency(&tools.ffmpeg)?;
    }

    let source = analyze_source(prober, spawner, &tools, profile, input)?;
    let (resolved, command) = plan(&source, profile, &config.output_dir);
    log_plan(&source, &resolved, &command);

    let mut outcome = TranscodeOutcome {
        source,
        plan: resolved,
        passes: command.passes.clone(),
        output_path: command.output_path.clone(),
        encoded: false,
    };
    if config.dry_run {
        return Ok(outcome);
    }

    execute(spawner, &tools.ffmpeg, &command, outcome.plan.target.duration)?;
    outcome.encoded = true;
    Ok(outcome)
}

/// Runs the passes of `command` in order; a failed pass stops the run.
pub fn execute<S: FfmpegSpawner>(
    spawner: &S,
    ffmpeg: &Path,
    command: &EncodeCommand,
    duration: f64,
) -> CoreResult<()> {
    if let Some(parent) = command.output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let total = command.passes.len();
    for (index, args) in command.passes.iter().enumerate() {
        let label = if total > 1 {
            format!("pass {}/{total}", index + 1)
        } else {
            "encode".to_string()
        };
        log::info!("Starting {label}");
        run_encode_pass(spawner, ffmpeg, args, duration, &label)?;
    }
    log::info!("Wrote {}", command.output_path.display());
    Ok(())
}

// vidplan-cli/src/cli.rs
//
// Defines the command-line argument structures using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use vidplan_core::ProfileOverrides;
use vidplan_core::config::{ENV_FFMPEG_PATH, ENV_OUTPUT_PATH};

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "vidplan: ffmpeg transcode planner",
    long_about = "Probes a video, resolves an encode plan from a preset and flags, \
                  and runs ffmpeg with the assembled arguments."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// YAML config file (defaults to ./.vidplan.yaml, then ~/.vidplan.yaml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(long, global = true, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Print the resolved plan as JSON on stdout
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Encodes a single video file
    Encode(EncodeArgs),
    /// Encodes every .mkv and .mp4 file in a directory with the same settings
    Bulk(BulkArgs),
    /// Lists the presets, or shows the settings of one
    Presets(PresetsArgs),
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Input video file
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    #[command(flatten)]
    pub run: RunArgs,

    #[command(flatten)]
    pub profile: ProfileArgs,
}

#[derive(Args, Debug)]
pub struct BulkArgs {
    /// Directory containing the videos to encode
    #[arg(value_name = "DIR")]
    pub input_dir: PathBuf,

    #[command(flatten)]
    pub run: RunArgs,

    #[command(flatten)]
    pub profile: ProfileArgs,
}

#[derive(Args, Debug)]
pub struct PresetsArgs {
    /// Preset to show
    #[arg(value_name = "NAME")]
    pub name: Option<String>,
}

/// Settings that are not part of the target profile.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Directory where encoded files are written
    #[arg(short = 'o', long, value_name = "DIR", env = ENV_OUTPUT_PATH)]
    pub output_path: Option<PathBuf>,

    /// Directory containing the ffmpeg and ffprobe executables
    #[arg(long, value_name = "DIR", env = ENV_FFMPEG_PATH)]
    pub ffmpeg_path: Option<PathBuf>,

    /// Print the plan and commands without running ffmpeg
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Named preset applied before the individual flags
    #[arg(short, long, value_name = "NAME")]
    pub preset: Option<String>,
}

/// Flags mirroring every target profile field. Unset flags leave the value
/// to the preset, the config file or the built-in default.
#[derive(Args, Debug, Default)]
pub struct ProfileArgs {
    // --- Video ---
    /// Resolution tier (480p, 576p, 720p, 1080p, 1440p, 2160p)
    #[arg(short, long, value_name = "TIER")]
    pub size: Option<String>,

    /// Video encoder: libx264, libx265, h264/h264_nvenc, hevc/hevc_nvenc or copy
    #[arg(short, long, value_name = "CODEC")]
    pub codec: Option<String>,

    /// Input decoder, replacing the automatic choice
    #[arg(long, value_name = "DECODER")]
    pub decoder: Option<String>,

    /// Video bitrate in kbps
    #[arg(short, long, value_name = "KBPS")]
    pub rate: Option<u32>,

    /// Target file size in MB; derives the video bitrate
    #[arg(long, value_name = "MB")]
    pub file_size: Option<f64>,

    /// Constant rate factor (software encoders)
    #[arg(long, value_name = "CRF")]
    pub crf: Option<u32>,

    /// Constant quality (NVENC encoders)
    #[arg(long, value_name = "CQ")]
    pub cq: Option<u32>,

    /// Output pixel format
    #[arg(long, value_name = "PIX_FMT")]
    pub pixel_format: Option<String>,

    /// Output transfer characteristic (bt709 or smpte2084)
    #[arg(long, value_name = "TRANSFER")]
    pub color_transfer: Option<String>,

    /// Tonemap curve for HDR to SDR conversion
    #[arg(long, value_name = "CURVE")]
    pub tonemap: Option<String>,

    /// Encoder tune
    #[arg(long, value_name = "TUNE")]
    pub tune: Option<String>,

    /// Encoder level
    #[arg(long, value_name = "LEVEL")]
    pub level: Option<String>,

    /// Run a two-pass encode (libx265)
    #[arg(long)]
    pub two_pass: bool,

    // --- Timing ---
    /// Seek offset in seconds
    #[arg(long, value_name = "SECONDS")]
    pub seek: Option<f64>,

    /// Output duration in seconds
    #[arg(short, long, value_name = "SECONDS")]
    pub duration: Option<f64>,

    /// Start timecode (S, M:S or H:M:S)
    #[arg(long, value_name = "TIME")]
    pub start: Option<String>,

    /// End timecode (S, M:S or H:M:S)
    #[arg(long, value_name = "TIME")]
    pub end: Option<String>,

    // --- Audio ---
    /// Audio bitrate in kbps
    #[arg(long, value_name = "KBPS")]
    pub audio_rate: Option<u32>,

    /// Audio channel count
    #[arg(long, value_name = "N")]
    pub audio_channels: Option<u32>,

    /// Audio codec
    #[arg(long, value_name = "CODEC")]
    pub audio_codec: Option<String>,

    /// Audio delay in seconds
    #[arg(long, value_name = "SECONDS", allow_hyphen_values = true)]
    pub audio_delay: Option<f64>,

    /// Normalize the peak volume to 0 dB
    #[arg(long)]
    pub detect_volume: bool,

    // --- Streams ---
    /// Video stream index
    #[arg(long, value_name = "N")]
    pub video_stream: Option<u32>,

    /// Audio stream index
    #[arg(long, value_name = "N")]
    pub audio_stream: Option<u32>,

    /// Subtitle stream index used for burn-in
    #[arg(long, value_name = "N")]
    pub subtitle_stream: Option<u32>,

    // --- Picture ---
    /// Detect and remove black bars
    #[arg(long, conflicts_with = "no_crop")]
    pub crop: bool,

    /// Keep black bars even if the preset crops
    #[arg(long)]
    pub no_crop: bool,

    /// Seconds of video analysed for black bars
    #[arg(long, value_name = "SECONDS")]
    pub crop_detect_duration: Option<f64>,

    /// Apply a light denoise filter
    #[arg(long)]
    pub denoise: bool,

    /// Show a title card at the start
    #[arg(long, conflicts_with = "no_title")]
    pub draw_title: bool,

    /// Do not show a title card
    #[arg(long)]
    pub no_title: bool,

    /// Title card text (defaults to the title from the file name)
    #[arg(long, value_name = "TEXT")]
    pub title: Option<String>,

    /// Font used by the title card
    #[arg(long, value_name = "FILE")]
    pub font_file: Option<PathBuf>,

    /// Burn in text subtitles (a matching .srt next to the input wins)
    #[arg(long)]
    pub burn_subtitles: bool,

    /// Burn in image subtitles (PGS, VobSub)
    #[arg(long)]
    pub burn_image_subtitles: bool,

    /// Image overlaid on the video
    #[arg(long, value_name = "FILE")]
    pub watermark: Option<PathBuf>,

    /// Overlay position expression
    #[arg(long, value_name = "X:Y")]
    pub watermark_position: Option<String>,

    // --- Output ---
    /// Output container extension
    #[arg(short, long, value_name = "EXT")]
    pub extension: Option<String>,

    /// Drop global metadata from the output
    #[arg(long, conflicts_with = "keep_metadata")]
    pub strip_metadata: bool,

    /// Keep global metadata even if the preset strips it
    #[arg(long)]
    pub keep_metadata: bool,
}

/// `Some(true)` for the enabling flag, `Some(false)` for the disabling one.
fn toggle(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (false, true) => Some(false),
        (false, false) => None,
    }
}

impl ProfileArgs {
    /// The flags as a profile layer.
    #[must_use]
    pub fn to_overrides(&self) -> ProfileOverrides {
        ProfileOverrides {
            size: self.size.clone(),
            codec: self.codec.clone(),
            decoder: self.decoder.clone(),
            rate: self.rate,
            file_size: self.file_size,
            seek: self.seek,
            duration: self.duration,
            start: self.start.clone(),
            end: self.end.clone(),
            pixel_format: self.pixel_format.clone(),
            color_transfer: self.color_transfer.clone(),
            crf: self.crf,
            cq: self.cq,
            tonemap: self.tonemap.clone(),
            audio_rate: self.audio_rate,
            audio_channels: self.audio_channels,
            audio_codec: self.audio_codec.clone(),
            audio_delay: self.audio_delay,
            video_stream: self.video_stream,
            audio_stream: self.audio_stream,
            subtitle_stream: self.subtitle_stream,
            extension: self.extension.clone(),
            crop: toggle(self.crop, self.no_crop),
            crop_detect_duration: self.crop_detect_duration,
            detect_volume: toggle(self.detect_volume, false),
            draw_title: toggle(self.draw_title, self.no_title),
            title: self.title.clone(),
            font_file: self.font_file.clone(),
            burn_subtitles: toggle(self.burn_subtitles, false),
            burn_image_subtitles: toggle(self.burn_image_subtitles, false),
            watermark: self.watermark.clone(),
            watermark_position: self.watermark_position.clone(),
            denoise: toggle(self.denoise, false),
            two_pass: toggle(self.two_pass, false),
            strip_metadata: toggle(self.strip_metadata, self.keep_metadata),
            tune: self.tune.clone(),
            level: self.level.clone(),
        }
    }
}

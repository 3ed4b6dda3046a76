// ============================================================================
// vidplan-core/src/media/video.rs
// ============================================================================
//
// MEDIA DESCRIPTOR: The source or target of a transcode
//
// A `Video` describes one side of a run. The source is filled from two probe
// results and the optional crop and volume detections, then left untouched.
// The target starts from `Video::inherit_target`, which copies an explicit
// list of fields from the source, and is completed by the plan resolver.
//
// KEY COMPONENTS:
// - Video: The descriptor
// - Crop: Margins removed from the decoded frame
// - QualityControl: Constant rate factor or constant quality, never both

use serde::Serialize;
use std::path::{Path, PathBuf};

use super::naming::split_name;
use super::probe::ProbeResult;
use crate::detection::CropDetection;
use crate::policy::{SizeTier, resolve_decoder};

/// Audio codec value meaning "stream copy".
pub const COPY: &str = "copy";

/// Margins cropped from each edge of the decoded frame, in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Crop {
    pub top: u32,
    pub bottom: u32,
    pub left: u32,
    pub right: u32,
}

impl Crop {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.top == 0 && self.bottom == 0 && self.left == 0 && self.right == 0
    }
}

/// Encoder quality knob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QualityControl {
    ConstantRateFactor(u32),
    ConstantQuality(u32),
}

impl QualityControl {
    /// The ffmpeg option and its value.
    #[must_use]
    pub fn to_args(self) -> [String; 2] {
        match self {
            QualityControl::ConstantRateFactor(v) => ["-crf:v".to_string(), v.to_string()],
            QualityControl::ConstantQuality(v) => ["-cq:v".to_string(), v.to_string()],
        }
    }
}

/// Media descriptor for either side of a transcode.
///
/// String fields use the empty string for "unset / tool default".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Video {
    // identity
    pub file: PathBuf,
    pub base_name: String,
    pub extension: String,
    pub title: String,
    pub year: Option<u32>,
    pub extra_info: String,

    // geometry
    pub width: u32,
    pub height: u32,
    pub size: Option<SizeTier>,
    pub crop: Crop,

    // timing, seconds
    pub seek: f64,
    pub duration: f64,

    // video
    /// Decoder on the source, encoder on the target.
    pub codec: String,
    pub video_stream: u32,
    /// kbps, 0 when unknown or not requested.
    pub rate: u32,
    pub pixel_format: String,
    pub color_range: String,
    pub color_space: String,
    pub color_transfer: String,
    pub color_primaries: String,
    pub quality: Option<QualityControl>,
    pub tonemap: String,

    // audio
    /// `None` when the file has no audio track at the requested index.
    pub audio_stream: Option<u32>,
    pub audio_codec: String,
    pub audio_rate: u32,
    pub audio_channels: u32,
    pub channel_layout: String,
    pub audio_delay: f64,
    /// ffmpeg input index the audio is mapped from.
    pub audio_input: u32,

    // derived
    /// Peak volume on the source (`"-3.5 dB"`), gain to apply on the target.
    pub volume: String,
    pub output_path: Option<PathBuf>,
}

impl Video {
    /// Creates an unprobed descriptor for `file`.
    #[must_use]
    pub fn new(file: &Path) -> Self {
        let base_name = file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = file
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        let parts = split_name(&base_name);

        Self {
            file: file.to_path_buf(),
            base_name,
            extension,
            title: parts.title,
            year: parts.year,
            extra_info: parts.extra_info,
            width: 0,
            height: 0,
            size: None,
            crop: Crop::default(),
            seek: 0.0,
            duration: 0.0,
            codec: String::new(),
            video_stream: 0,
            rate: 0,
            pixel_format: String::new(),
            color_range: String::new(),
            color_space: String::new(),
            color_transfer: String::new(),
            color_primaries: String::new(),
            quality: None,
            tonemap: String::new(),
            audio_stream: Some(0),
            audio_codec: String::new(),
            audio_rate: 0,
            audio_channels: 0,
            channel_layout: String::new(),
            audio_delay: 0.0,
            audio_input: 0,
            volume: String::new(),
            output_path: None,
        }
    }

    /// Selects which streams the probes and the command refer to.
    #[must_use]
    pub fn with_streams(mut self, video_stream: u32, audio_stream: u32) -> Self {
        self.video_stream = video_stream;
        self.audio_stream = Some(audio_stream);
        self
    }

    /// Folds the video stream probe into the descriptor.
    ///
    /// The codec is mapped through the decoder table unless `decoder` overrides it.
    pub fn apply_video_probe(&mut self, probe: &ProbeResult, decoder: Option<&str>) {
        self.width = probe.u32("width");
        self.height = probe.u32("height");
        self.size = SizeTier::classify(self.width, self.height);
        self.duration = probe.f64("duration");
        self.rate = probe.kbps("bit_rate");
        self.codec = resolve_decoder(&probe.string("codec_name"), decoder);
        self.pixel_format = probe.string("pix_fmt");
        self.color_range = probe.string("color_range");
        self.color_space = probe.string("color_space");
        self.color_transfer = probe.string("color_transfer");
        self.color_primaries = probe.string("color_primaries");
    }

    /// Folds the audio stream probe into the descriptor.
    ///
    /// An empty probe means the stream does not exist.
    pub fn apply_audio_probe(&mut self, probe: &ProbeResult) {
        if probe.is_empty() {
            self.audio_stream = None;
            return;
        }
        self.audio_rate = probe.kbps("bit_rate");
        self.audio_channels = probe.u32("channels");
        self.audio_codec = probe.string("codec_name");
        self.channel_layout = probe.string("channel_layout");
    }

    /// Records detected crop margins and shrinks the working geometry.
    pub fn apply_crop(&mut self, detection: &CropDetection) {
        self.crop = detection.margins;
        self.width = detection.width;
        self.height = detection.height;
    }

    /// Records the detected peak volume.
    pub fn apply_volume(&mut self, max_volume: &str) {
        self.volume = max_volume.trim().to_string();
    }

    #[must_use]
    pub fn has_audio(&self) -> bool {
        self.audio_stream.is_some()
    }

    /// The `"1080p"` style tag, or `"<height>p"` for frames outside the tiers.
    #[must_use]
    pub fn size_tag(&self) -> String {
        match self.size {
            Some(tier) => tier.label(),
            None if self.height > 0 => format!("{}p", self.height),
            None => String::new(),
        }
    }

    /// Title for on-screen display: dots become spaces, upper-cased.
    #[must_use]
    pub fn display_title(&self) -> String {
        let title = if self.title.is_empty() {
            &self.base_name
        } else {
            &self.title
        };
        title.replace('.', " ").trim().to_uppercase()
    }

    /// Starts a target descriptor from this source.
    ///
    /// Inherited: identity, geometry, crop, duration, stream indexes, color
    /// tags and the audio track parameters. Everything the resolver decides
    /// (codec, rate, quality, seek, tonemap, audio delay, volume gain, output
    /// path) starts unset, and the audio codec starts as stream copy.
    #[must_use]
    pub fn inherit_target(&self) -> Video {
        Video {
            file: self.file.clone(),
            base_name: self.base_name.clone(),
            extension: self.extension.clone(),
            title: self.title.clone(),
            year: self.year,
            extra_info: self.extra_info.clone(),
            width: self.width,
            height: self.height,
            size: self.size,
            crop: self.crop,
            seek: 0.0,
            duration: self.duration,
            codec: String::new(),
            video_stream: self.video_stream,
            rate: 0,
            pixel_format: self.pixel_format.clone(),
            color_range: self.color_range.clone(),
            color_space: self.color_space.clone(),
            color_transfer: self.color_transfer.clone(),
            color_primaries: self.color_primaries.clone(),
            quality: None,
            tonemap: String::new(),
            audio_stream: self.audio_stream,
            audio_codec: COPY.to_string(),
            audio_rate: self.audio_rate,
            audio_channels: self.audio_channels,
            channel_layout: self.channel_layout.clone(),
            audio_delay: 0.0,
            audio_input: 0,
            volume: String::new(),
            output_path: None,
        }
    }
}

// ============================================================================
// vidplan-core/src/profile/mod.rs
// ============================================================================
//
// TARGET PROFILE: What the user asked the encode to look like
//
// Profile values arrive in layers: built-in defaults, the config file, a
// named preset and finally command-line flags. Each layer is a partial
// `ProfileOverrides` record; layers are merged "later wins" per field and
// the result is frozen once into a `Profile`, which the resolver reads but
// never changes.
//
// KEY COMPONENTS:
// - ProfileOverrides: Partial record, deserializable from the config file
// - Profile: Immutable, validated snapshot
// - presets: Named override records

mod presets;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::CoreResult;
use crate::media::QualityControl;
use crate::policy::SizeTier;
use crate::utils::parse_timecode;

pub use presets::{PRESET_NAMES, preset, resolve_preset};

/// Default overlay position for a watermark: top right, 48 px margin.
pub const DEFAULT_WATERMARK_POSITION: &str = "W-w-48:48";

/// A partial target profile. `None` leaves the field to lower layers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProfileOverrides {
    /// Resolution tier label, e.g. `"1080p"`.
    pub size: Option<String>,
    /// Requested codec family or concrete encoder name.
    pub codec: Option<String>,
    /// Input decoder replacing the decoder table lookup.
    pub decoder: Option<String>,
    /// Video bitrate in kbps.
    pub rate: Option<u32>,
    /// Target file size in MB.
    pub file_size: Option<f64>,
    /// Seek offset in seconds.
    pub seek: Option<f64>,
    /// Output duration in seconds.
    pub duration: Option<f64>,
    /// Start timecode (`S`, `M:S` or `H:M:S`).
    pub start: Option<String>,
    /// End timecode.
    pub end: Option<String>,
    pub pixel_format: Option<String>,
    pub color_transfer: Option<String>,
    /// Constant rate factor; wins over `cq`.
    pub crf: Option<u32>,
    /// Constant quality.
    pub cq: Option<u32>,
    pub tonemap: Option<String>,
    /// Audio bitrate in kbps.
    pub audio_rate: Option<u32>,
    pub audio_channels: Option<u32>,
    pub audio_codec: Option<String>,
    /// Audio delay in seconds.
    pub audio_delay: Option<f64>,
    pub video_stream: Option<u32>,
    pub audio_stream: Option<u32>,
    pub subtitle_stream: Option<u32>,
    pub extension: Option<String>,
    pub crop: Option<bool>,
    pub crop_detect_duration: Option<f64>,
    pub detect_volume: Option<bool>,
    pub draw_title: Option<bool>,
    pub title: Option<String>,
    pub font_file: Option<PathBuf>,
    pub burn_subtitles: Option<bool>,
    pub burn_image_subtitles: Option<bool>,
    pub watermark: Option<PathBuf>,
    pub watermark_position: Option<String>,
    pub denoise: Option<bool>,
    pub two_pass: Option<bool>,
    pub strip_metadata: Option<bool>,
    pub tune: Option<String>,
    pub level: Option<String>,
}

macro_rules! merge_fields {
    ($base:expr, $over:expr, $($field:ident),+ $(,)?) => {
        ProfileOverrides {
            $($field: $over.$field.or($base.$field),)+
        }
    };
}

impl ProfileOverrides {
    /// Layers `over` on top of `self`; fields set in `over` win.
    #[must_use]
    pub fn merge(self, over: ProfileOverrides) -> ProfileOverrides {
        merge_fields!(
            self,
            over,
            size,
            codec,
            decoder,
            rate,
            file_size,
            seek,
            duration,
            start,
            end,
            pixel_format,
            color_transfer,
            crf,
            cq,
            tonemap,
            audio_rate,
            audio_channels,
            audio_codec,
            audio_delay,
            video_stream,
            audio_stream,
            subtitle_stream,
            extension,
            crop,
            crop_detect_duration,
            detect_volume,
            draw_title,
            title,
            font_file,
            burn_subtitles,
            burn_image_subtitles,
            watermark,
            watermark_position,
            denoise,
            two_pass,
            strip_metadata,
            tune,
            level,
        )
    }

    /// Freezes the merged layers into a `Profile`.
    ///
    /// Fails only on malformed start/end timecodes. Zero numeric values and
    /// empty strings count as "not requested".
    pub fn build(mut self) -> CoreResult<Profile> {
        let start = non_empty(self.start.take())
            .map(|s| parse_timecode(&s))
            .transpose()?;
        let end = non_empty(self.end.take())
            .map(|s| parse_timecode(&s))
            .transpose()?;
        Ok(self.freeze(start, end))
    }

    fn freeze(self, start: Option<f64>, end: Option<f64>) -> Profile {
        let size = match non_empty(self.size) {
            Some(label) => {
                let tier = SizeTier::parse(&label);
                if tier.is_none() {
                    log::warn!("Ignoring unknown size tier '{label}'");
                }
                tier
            }
            None => None,
        };

        let quality = match (self.crf, self.cq) {
            (Some(crf), _) => Some(QualityControl::ConstantRateFactor(crf)),
            (None, Some(cq)) => Some(QualityControl::ConstantQuality(cq)),
            (None, None) => None,
        };

        Profile {
            size,
            codec: non_empty(self.codec),
            decoder: non_empty(self.decoder),
            rate: self.rate.unwrap_or(0),
            file_size: positive(self.file_size),
            seek: positive(self.seek),
            duration: positive(self.duration),
            start,
            end,
            pixel_format: non_empty(self.pixel_format),
            color_transfer: non_empty(self.color_transfer),
            quality,
            tonemap: non_empty(self.tonemap).unwrap_or_default(),
            audio_rate: self.audio_rate.unwrap_or(0),
            audio_channels: self.audio_channels.unwrap_or(0),
            audio_codec: non_empty(self.audio_codec),
            audio_delay: self.audio_delay.unwrap_or(0.0),
            video_stream: self.video_stream.unwrap_or(0),
            audio_stream: self.audio_stream.unwrap_or(0),
            subtitle_stream: self.subtitle_stream.unwrap_or(0),
            extension: non_empty(self.extension).map(|e| e.trim_start_matches('.').to_string()),
            crop: self.crop.unwrap_or(false),
            crop_detect_duration: positive(self.crop_detect_duration),
            detect_volume: self.detect_volume.unwrap_or(false),
            draw_title: self.draw_title.unwrap_or(false),
            title: non_empty(self.title),
            font_file: self.font_file.filter(|p| !p.as_os_str().is_empty()),
            burn_subtitles: self.burn_subtitles.unwrap_or(false),
            burn_image_subtitles: self.burn_image_subtitles.unwrap_or(false),
            watermark: self.watermark.filter(|p| !p.as_os_str().is_empty()),
            watermark_position: non_empty(self.watermark_position)
                .unwrap_or_else(|| DEFAULT_WATERMARK_POSITION.to_string()),
            denoise: self.denoise.unwrap_or(false),
            two_pass: self.two_pass.unwrap_or(false),
            strip_metadata: self.strip_metadata.unwrap_or(false),
            tune: non_empty(self.tune),
            level: non_empty(self.level),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn positive(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite() && *v > 0.0).unwrap_or(0.0)
}

/// Immutable target profile read by the plan resolver.
///
/// Numeric fields use 0 for "not requested".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    pub size: Option<SizeTier>,
    pub codec: Option<String>,
    pub decoder: Option<String>,
    /// Video bitrate, kbps.
    pub rate: u32,
    /// Target file size, MB.
    pub file_size: f64,
    /// Seconds.
    pub seek: f64,
    /// Seconds.
    pub duration: f64,
    /// Parsed start timecode, seconds.
    pub start: Option<f64>,
    /// Parsed end timecode, seconds.
    pub end: Option<f64>,
    pub pixel_format: Option<String>,
    pub color_transfer: Option<String>,
    pub quality: Option<QualityControl>,
    /// Empty selects the tonemap stage default.
    pub tonemap: String,
    pub audio_rate: u32,
    pub audio_channels: u32,
    pub audio_codec: Option<String>,
    pub audio_delay: f64,
    pub video_stream: u32,
    pub audio_stream: u32,
    pub subtitle_stream: u32,
    pub extension: Option<String>,
    pub crop: bool,
    pub crop_detect_duration: f64,
    pub detect_volume: bool,
    pub draw_title: bool,
    pub title: Option<String>,
    pub font_file: Option<PathBuf>,
    pub burn_subtitles: bool,
    pub burn_image_subtitles: bool,
    pub watermark: Option<PathBuf>,
    pub watermark_position: String,
    pub denoise: bool,
    pub two_pass: bool,
    pub strip_metadata: bool,
    pub tune: Option<String>,
    pub level: Option<String>,
}

impl Default for Profile {
    fn default() -> Self {
        ProfileOverrides::default().freeze(None, None)
    }
}

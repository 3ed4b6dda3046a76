// ============================================================================
// vidplan-core/src/policy.rs
// ============================================================================
//
// POLICY TABLES: Resolution tiers and codec mappings
//
// Pure lookup tables. Resolution tiers map a height class ("1080p") to its
// canonical frame size. Codec families map probed codec names to hardware
// decoders, and requested codec names to concrete encoders. Unmapped names
// are carried through an explicit pass-through variant.
//
// KEY COMPONENTS:
// - SizeTier: Named output resolution class
// - CodecFamily: Probed codec family with its hardware decoder
// - VideoEncoder: Concrete encoder selected from a requested codec name

use serde::{Deserialize, Serialize};
use std::fmt;

/// Encoder macroblock size; encoded dimensions should be multiples of it.
pub const MACROBLOCK_SIZE: u32 = 16;

/// A named output resolution class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SizeTier {
    P480,
    P576,
    P720,
    P1080,
    P1440,
    P2160,
}

impl SizeTier {
    /// All tiers, smallest first.
    pub const ALL: [SizeTier; 6] = [
        SizeTier::P480,
        SizeTier::P576,
        SizeTier::P720,
        SizeTier::P1080,
        SizeTier::P1440,
        SizeTier::P2160,
    ];

    /// Canonical frame height of the tier.
    #[must_use]
    pub const fn height(self) -> u32 {
        match self {
            SizeTier::P480 => 480,
            SizeTier::P576 => 576,
            SizeTier::P720 => 720,
            SizeTier::P1080 => 1080,
            SizeTier::P1440 => 1440,
            SizeTier::P2160 => 2160,
        }
    }

    /// Canonical frame width of the tier. SD tiers share the 720 px DVD width.
    #[must_use]
    pub const fn width(self) -> u32 {
        match self {
            SizeTier::P480 | SizeTier::P576 => 720,
            SizeTier::P720 => 1280,
            SizeTier::P1080 => 1920,
            SizeTier::P1440 => 2560,
            SizeTier::P2160 => 3840,
        }
    }

    /// Parses a label such as `"1080p"` (the trailing `p` is optional).
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        let digits = label.trim().trim_end_matches(['p', 'P']);
        let height: u32 = digits.parse().ok()?;
        Self::from_height(height)
    }

    /// Returns the tier whose canonical height is exactly `height`.
    #[must_use]
    pub fn from_height(height: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|tier| tier.height() == height)
    }

    /// Classifies a frame size into a tier.
    ///
    /// An exact canonical height wins; otherwise a frame whose width matches a
    /// tier's canonical width (letterboxed content) is classified by width.
    /// SD tiers share a width, so width matching prefers the larger tier.
    #[must_use]
    pub fn classify(width: u32, height: u32) -> Option<Self> {
        Self::from_height(height).or_else(|| {
            Self::ALL
                .into_iter()
                .rev()
                .find(|tier| tier.width() == width)
        })
    }

    /// Whether a height is one of the canonical tier heights.
    #[must_use]
    pub fn is_standard_height(height: u32) -> bool {
        Self::from_height(height).is_some()
    }

    /// The `"1080p"` style label.
    #[must_use]
    pub fn label(self) -> String {
        format!("{}p", self.height())
    }
}

impl fmt::Display for SizeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}p", self.height())
    }
}

/// A probed codec family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecFamily {
    Hevc,
    H264,
    H263,
    Mpeg4,
    Mpeg2,
    Mpeg1,
    Vc1,
    Vp9,
    /// Anything without a hardware decoder mapping, carried verbatim.
    Other(String),
}

impl CodecFamily {
    /// Maps a probed `codec_name` to its family.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "hevc" | "h265" => CodecFamily::Hevc,
            "h264" => CodecFamily::H264,
            "h263" => CodecFamily::H263,
            "mpeg4" => CodecFamily::Mpeg4,
            "mpeg2" | "mpeg2video" => CodecFamily::Mpeg2,
            "mpeg1" | "mpeg1video" => CodecFamily::Mpeg1,
            "vc1" => CodecFamily::Vc1,
            "vp9" => CodecFamily::Vp9,
            _ => CodecFamily::Other(name.trim().to_string()),
        }
    }

    /// The CUDA decoder for the family, if one exists.
    #[must_use]
    pub fn hardware_decoder(&self) -> Option<&'static str> {
        match self {
            CodecFamily::Hevc => Some("hevc_cuvid"),
            CodecFamily::H264 => Some("h264_cuvid"),
            CodecFamily::H263 => Some("h263_cuvid"),
            CodecFamily::Mpeg4 => Some("mpeg4_cuvid"),
            CodecFamily::Mpeg2 => Some("mpeg2_cuvid"),
            CodecFamily::Mpeg1 => Some("mpeg1_cuvid"),
            CodecFamily::Vc1 => Some("vc1_cuvid"),
            CodecFamily::Vp9 => Some("vp9_cuvid"),
            CodecFamily::Other(_) => None,
        }
    }
}

/// Resolves the decoder to use for a probed codec name.
///
/// An explicit override always wins. Otherwise the hardware decoder for the
/// family is used, and unmapped codecs keep their probed name.
#[must_use]
pub fn resolve_decoder(codec_name: &str, override_decoder: Option<&str>) -> String {
    if let Some(decoder) = override_decoder.map(str::trim).filter(|d| !d.is_empty()) {
        return decoder.to_string();
    }
    match CodecFamily::from_name(codec_name) {
        CodecFamily::Other(name) => name,
        family => family
            .hardware_decoder()
            .map(str::to_string)
            .unwrap_or_else(|| codec_name.to_string()),
    }
}

/// Whether a decoder/encoder name runs on the NVIDIA hardware path.
#[must_use]
pub fn is_hardware_codec(name: &str) -> bool {
    name.contains("cuvid") || name.contains("nvenc")
}

/// A concrete video encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoEncoder {
    H264Nvenc,
    HevcNvenc,
    Libx264,
    Libx265,
    /// Stream copy; disables the re-encode pipeline.
    Copy,
    /// An encoder name with no mapping, passed to ffmpeg as given.
    PassThrough(String),
}

impl VideoEncoder {
    /// Maps a requested codec name to a concrete encoder.
    #[must_use]
    pub fn resolve(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "hevc" | "h265" | "hevc_nvenc" => VideoEncoder::HevcNvenc,
            "h264" | "h264_nvenc" => VideoEncoder::H264Nvenc,
            "libx264" | "x264" => VideoEncoder::Libx264,
            "libx265" | "x265" => VideoEncoder::Libx265,
            "copy" => VideoEncoder::Copy,
            _ => VideoEncoder::PassThrough(name.trim().to_string()),
        }
    }

    /// The ffmpeg encoder name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            VideoEncoder::H264Nvenc => "h264_nvenc",
            VideoEncoder::HevcNvenc => "hevc_nvenc",
            VideoEncoder::Libx264 => "libx264",
            VideoEncoder::Libx265 => "libx265",
            VideoEncoder::Copy => "copy",
            VideoEncoder::PassThrough(name) => name,
        }
    }

    #[must_use]
    pub fn is_hardware(&self) -> bool {
        is_hardware_codec(self.name())
    }

    #[must_use]
    pub fn is_copy(&self) -> bool {
        matches!(self, VideoEncoder::Copy)
    }
}

impl fmt::Display for VideoEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether a pixel format carries 10-bit samples.
#[must_use]
pub fn is_ten_bit_pixel_format(pixel_format: &str) -> bool {
    matches!(
        pixel_format,
        "yuv420p10le" | "yuv422p10le" | "yuv444p10le" | "p010le"
    )
}

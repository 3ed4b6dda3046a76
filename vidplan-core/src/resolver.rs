// ============================================================================
// vidplan-core/src/resolver.rs
// ============================================================================
//
// PLAN RESOLVER: Derives the target descriptor from source + profile
//
// `resolve` is a pure function of its two inputs. The target starts from
// `Video::inherit_target` and is completed in a fixed order, each step
// reading what the previous steps decided:
//
//   size -> codec -> timing -> color -> quality -> audio -> file-size
//   bitrate -> extension -> tonemap -> audio delay -> macroblock padding
//
// KEY COMPONENTS:
// - resolve: The single entry point
// - ResolvedPlan: Target descriptor plus the decode-side decisions
// - ColorTransform: Which color stage the filter graph has to insert
// - Padding: Centered pad computed by macroblock alignment

use serde::Serialize;

use crate::detection::normalization_gain;
use crate::media::{COPY, Video};
use crate::policy::{MACROBLOCK_SIZE, SizeTier, VideoEncoder, is_hardware_codec};
use crate::profile::Profile;

/// Transfer characteristic tags as reported by ffprobe.
pub const TRANSFER_BT709: &str = "bt709";
pub const TRANSFER_PQ: &str = "smpte2084";
pub const TRANSFER_HLG: &str = "arib-std-b67";

/// kbit per MB, for turning a file-size budget into a bitrate.
const KBIT_PER_MB: f64 = 8192.0;

/// Re-encode codec used when an audio override does not name one.
const FALLBACK_AUDIO_CODEC: &str = "ac3";
/// Re-encode codec for stereo output.
const STEREO_AUDIO_CODEC: &str = "aac";

/// Color stage selected from the source and target transfer characteristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColorTransform {
    None,
    /// SDR source retagged to BT.709: pixel format fix only.
    FormatFix,
    /// PQ or HLG source tonemapped to SDR.
    Tonemap,
    /// BT.601 or untagged source converted with a color matrix.
    ColorMatrix,
    /// SDR source tagged as PQ for a 10-bit HEVC encode.
    PqUpconvert,
}

impl ColorTransform {
    /// Picks the color stage for an encode to `encoder`.
    #[must_use]
    pub fn select(source_transfer: &str, target_transfer: &str, encoder: &str) -> Self {
        if source_transfer != TRANSFER_BT709 && target_transfer == TRANSFER_BT709 {
            return match source_transfer {
                TRANSFER_PQ | TRANSFER_HLG => ColorTransform::Tonemap,
                "bt601" | "unknown" => ColorTransform::ColorMatrix,
                _ => ColorTransform::FormatFix,
            };
        }
        if source_transfer != TRANSFER_PQ
            && target_transfer == TRANSFER_PQ
            && matches!(encoder, "libx265" | "hevc_nvenc")
        {
            return ColorTransform::PqUpconvert;
        }
        ColorTransform::None
    }
}

/// Pad applied after scaling so both dimensions are macroblock multiples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Padding {
    pub content_width: u32,
    pub content_height: u32,
    pub padded_width: u32,
    pub padded_height: u32,
    pub x: u32,
    pub y: u32,
}

/// Output of `resolve`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedPlan {
    /// Decoder for the primary input; `"copy"` on the stream-copy path.
    pub decoder: String,
    /// Scaled geometry, before any macroblock padding.
    pub decoded_width: u32,
    pub decoded_height: u32,
    pub target: Video,
    pub color: ColorTransform,
    pub padding: Option<Padding>,
}

impl ResolvedPlan {
    #[must_use]
    pub fn is_copy(&self) -> bool {
        self.target.codec == COPY
    }

    #[must_use]
    pub fn hardware_decode(&self) -> bool {
        is_hardware_codec(&self.decoder)
    }

    #[must_use]
    pub fn encoder(&self) -> VideoEncoder {
        VideoEncoder::resolve(&self.target.codec)
    }
}

/// Rounds to the nearest even integer, ties to the even half.
fn even_round(value: f64) -> u32 {
    let half = (value / 2.0).round_ties_even();
    if half <= 0.0 { 0 } else { (half as u32) * 2 }
}

/// Derives the target descriptor for encoding `source` with `profile`.
#[must_use]
pub fn resolve(source: &Video, profile: &Profile) -> ResolvedPlan {
    let mut target = source.inherit_target();
    let mut decoder = source.codec.clone();

    let encoder = profile.codec.as_deref().map(VideoEncoder::resolve);
    let copy = encoder.as_ref().is_some_and(VideoEncoder::is_copy);
    target.codec = encoder
        .as_ref()
        .map(|e| e.name().to_string())
        .unwrap_or_default();
    if copy {
        log::debug!("Stream copy requested; geometry, quality, rate and size targets are ignored");
        decoder = COPY.to_string();
    } else if let Some(tier) = profile.size {
        resize_to_tier(&mut target, tier);
    }

    resolve_timing(&mut target, source, profile, copy);

    if let Some(pixel_format) = &profile.pixel_format {
        target.pixel_format = pixel_format.clone();
    }
    if let Some(transfer) = &profile.color_transfer {
        target.color_transfer = transfer.clone();
    }

    if !copy {
        target.quality = profile.quality;
        target.rate = profile.rate;
    }

    resolve_audio(&mut target, source, profile);

    if !copy && profile.file_size > 0.0 {
        apply_file_size(&mut target, source, profile.file_size);
    }

    if let Some(extension) = &profile.extension {
        target.extension = extension.clone();
    }

    target.tonemap = profile.tonemap.clone();
    let color = if copy {
        ColorTransform::None
    } else {
        ColorTransform::select(&source.color_transfer, &target.color_transfer, &target.codec)
    };
    if color == ColorTransform::Tonemap {
        target.color_primaries = TRANSFER_BT709.to_string();
        target.color_space = TRANSFER_BT709.to_string();
    }

    target.audio_delay = profile.audio_delay;
    if target.audio_delay != 0.0 && target.has_audio() {
        // primary input, then the watermark, then the shifted copy
        target.audio_input = 1 + u32::from(profile.watermark.is_some() && !copy);
    }

    let decoded_width = target.width;
    let decoded_height = target.height;
    let padding = if copy { None } else { macroblock_padding(&target) };
    if let Some(pad) = padding {
        log::debug!(
            "Padding {}x{} to {}x{}",
            pad.content_width,
            pad.content_height,
            pad.padded_width,
            pad.padded_height
        );
        target.width = pad.padded_width;
        target.height = pad.padded_height;
    }

    ResolvedPlan {
        decoder,
        decoded_width,
        decoded_height,
        target,
        color,
        padding,
    }
}

/// Fits the frame inside `tier`, preserving aspect. Never upscales.
fn resize_to_tier(target: &mut Video, tier: SizeTier) {
    if target.width == 0 || target.height == 0 {
        target.size = Some(tier);
        return;
    }
    if target.width <= tier.width() && target.height <= tier.height() {
        return;
    }

    let aspect = f64::from(target.width) / f64::from(target.height);
    let (mut width, mut height) = (target.width, target.height);
    if width > tier.width() {
        width = tier.width();
        height = even_round(f64::from(width) / aspect);
    }
    if height > tier.height() {
        height = tier.height();
        width = even_round(f64::from(height) * aspect);
    }

    log::debug!(
        "Resizing {}x{} to {}x{} for {tier}",
        target.width,
        target.height,
        width,
        height
    );
    target.width = width;
    target.height = height;
    target.size = Some(tier);
}

fn resolve_timing(target: &mut Video, source: &Video, profile: &Profile, copy: bool) {
    let seek = if profile.seek > 0.0 {
        profile.seek
    } else {
        profile.start.unwrap_or(0.0)
    };
    target.seek = seek.max(0.0);

    let requested = if profile.duration > 0.0 && !copy {
        Some(profile.duration)
    } else {
        profile.end.map(|end| end - target.seek)
    };
    if let Some(duration) = requested {
        target.duration = duration;
    }

    if source.duration > 0.0 {
        target.seek = target.seek.min(source.duration);
        if target.seek + target.duration > source.duration {
            target.duration = source.duration - target.seek;
        }
    }
    if target.duration < 0.0 {
        log::warn!("Requested window ends before it starts; clamping duration to 0");
        target.duration = 0.0;
    }
}

fn resolve_audio(target: &mut Video, source: &Video, profile: &Profile) {
    if !source.has_audio() {
        target.audio_codec = COPY.to_string();
        target.audio_rate = 0;
        target.audio_channels = 0;
        return;
    }

    let mut codec = COPY.to_string();
    if profile.audio_rate > 0 && (source.audio_rate == 0 || profile.audio_rate <= source.audio_rate)
    {
        target.audio_rate = profile.audio_rate;
        codec = FALLBACK_AUDIO_CODEC.to_string();
    }
    if profile.audio_channels > 0 && profile.audio_channels <= source.audio_channels {
        target.audio_channels = profile.audio_channels;
        codec = FALLBACK_AUDIO_CODEC.to_string();
    }
    if codec != COPY && target.audio_channels == 2 {
        codec = STEREO_AUDIO_CODEC.to_string();
    }
    if let Some(requested) = &profile.audio_codec {
        codec = requested.clone();
    }
    if target.audio_rate == source.audio_rate
        && target.audio_channels == source.audio_channels
        && codec == source.audio_codec
        && !profile.detect_volume
    {
        codec = COPY.to_string();
    }

    if profile.detect_volume && !source.volume.is_empty() {
        target.volume = normalization_gain(&source.volume);
        if codec == COPY {
            codec = if target.audio_channels == 2 {
                STEREO_AUDIO_CODEC
            } else {
                FALLBACK_AUDIO_CODEC
            }
            .to_string();
            log::debug!("Volume normalization forces an audio re-encode to {codec}");
        }
    }

    target.audio_codec = codec;
    if target.audio_codec == COPY {
        target.audio_rate = 0;
        target.audio_channels = 0;
    }
}

fn apply_file_size(target: &mut Video, source: &Video, file_size_mb: f64) {
    if target.duration <= 0.0 {
        log::warn!("Cannot derive a bitrate from a file size without a duration");
        return;
    }
    let audio_rate = if target.audio_codec == COPY {
        source.audio_rate
    } else {
        target.audio_rate
    };
    let rate = (file_size_mb * KBIT_PER_MB / target.duration - f64::from(audio_rate)).trunc();
    if rate < 1.0 {
        log::warn!("File size budget of {file_size_mb} MB leaves no room for video");
        return;
    }
    target.rate = rate as u32;
    log::debug!("File size {file_size_mb} MB over {:.1}s -> {}k video", target.duration, target.rate);
}

fn macroblock_padding(target: &Video) -> Option<Padding> {
    let (width, height) = (target.width, target.height);
    if width == 0 || height == 0 || SizeTier::is_standard_height(height) {
        return None;
    }
    if width % MACROBLOCK_SIZE == 0 && height % MACROBLOCK_SIZE == 0 {
        return None;
    }
    let padded_width = width.div_ceil(MACROBLOCK_SIZE) * MACROBLOCK_SIZE;
    let padded_height = height.div_ceil(MACROBLOCK_SIZE) * MACROBLOCK_SIZE;
    Some(Padding {
        content_width: width,
        content_height: height,
        padded_width,
        padded_height,
        x: (padded_width - width) / 2,
        y: (padded_height - height) / 2,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{Crop, QualityControl};
    use std::path::{Path, PathBuf};

    fn source(width: u32, height: u32) -> Video {
        let mut video = Video::new(Path::new("/media/Movie.2010.mkv"));
        video.width = width;
        video.height = height;
        video.size = SizeTier::classify(width, height);
        video.duration = 3600.0;
        video.codec = "h264_cuvid".into();
        video.pixel_format = "yuv420p".into();
        video.color_transfer = "bt709".into();
        video.audio_codec = "aac".into();
        video.audio_rate = 128;
        video.audio_channels = 2;
        video
    }

    fn profile() -> Profile {
        Profile::default()
    }

    #[test]
    fn hdr_4k_to_1080p_tonemaps() {
        let mut src = source(3840, 2160);
        src.codec = "hevc_cuvid".into();
        src.pixel_format = "yuv420p10le".into();
        src.color_transfer = TRANSFER_PQ.into();
        src.color_primaries = "bt2020".into();
        src.color_space = "bt2020nc".into();

        let plan = resolve(
            &src,
            &Profile {
                size: Some(SizeTier::P1080),
                color_transfer: Some("bt709".into()),
                ..profile()
            },
        );

        assert_eq!((plan.target.width, plan.target.height), (1920, 1080));
        assert_eq!(plan.color, ColorTransform::Tonemap);
        assert_eq!(plan.target.color_primaries, "bt709");
        assert_eq!(plan.target.color_space, "bt709");
        assert_eq!(plan.target.size, Some(SizeTier::P1080));
        assert_eq!(plan.padding, None);
    }

    #[test]
    fn size_is_idempotent_for_larger_tiers() {
        let src = source(1280, 720);
        for tier in [SizeTier::P720, SizeTier::P1080, SizeTier::P2160] {
            let plan = resolve(
                &src,
                &Profile {
                    size: Some(tier),
                    ..profile()
                },
            );
            assert_eq!((plan.target.width, plan.target.height), (1280, 720), "{tier}");
        }
    }

    #[test]
    fn resized_height_is_always_even() {
        let dims = [(1920, 800), (1918, 1036), (3840, 1604), (1440, 1080), (1000, 998), (722, 578)];
        for (w, h) in dims {
            for tier in SizeTier::ALL {
                let plan = resolve(
                    &source(w, h),
                    &Profile {
                        size: Some(tier),
                        ..profile()
                    },
                );
                let content_height = plan
                    .padding
                    .map(|p| p.content_height)
                    .unwrap_or(plan.target.height);
                assert_eq!(content_height % 2, 0, "{w}x{h} -> {tier}");
                assert!(plan.target.width <= w.max(tier.width()));
            }
        }
    }

    #[test]
    fn cropped_scope_is_padded_to_macroblocks() {
        let mut src = source(1920, 800);
        src.crop = Crop {
            top: 140,
            bottom: 140,
            left: 0,
            right: 0,
        };
        let plan = resolve(
            &src,
            &Profile {
                size: Some(SizeTier::P720),
                ..profile()
            },
        );
        assert_eq!(
            plan.padding,
            Some(Padding {
                content_width: 1280,
                content_height: 534,
                padded_width: 1280,
                padded_height: 544,
                x: 0,
                y: 5,
            })
        );
        assert_eq!((plan.target.width, plan.target.height), (1280, 544));
        assert_eq!((plan.decoded_width, plan.decoded_height), (1280, 534));
        assert_eq!(plan.target.crop, src.crop);
    }

    #[test]
    fn standard_heights_are_not_padded() {
        let plan = resolve(&source(1440, 1080), &profile());
        assert_eq!(plan.padding, None);
    }

    #[test]
    fn file_size_budget_truncates() {
        let plan = resolve(
            &source(1920, 1080),
            &Profile {
                file_size: 1450.0,
                ..profile()
            },
        );
        // 1450 * 8192 / 3600 - 128 = 3171.55
        assert_eq!(plan.target.rate, 3171);
    }

    #[test]
    fn file_size_uses_target_audio_rate_when_reencoding() {
        let mut src = source(1920, 1080);
        src.audio_codec = "ac3".into();
        src.audio_rate = 640;
        src.audio_channels = 6;
        let plan = resolve(
            &src,
            &Profile {
                file_size: 1450.0,
                audio_rate: 144,
                audio_channels: 2,
                ..profile()
            },
        );
        assert_eq!(plan.target.audio_codec, "aac");
        assert_eq!(plan.target.rate, 3155);
    }

    #[test]
    fn file_size_without_duration_is_skipped() {
        let mut src = source(1920, 1080);
        src.duration = 0.0;
        let plan = resolve(
            &src,
            &Profile {
                file_size: 1450.0,
                ..profile()
            },
        );
        assert_eq!(plan.target.rate, 0);
    }

    #[test]
    fn copy_suppresses_quality_pipeline() {
        let plan = resolve(
            &source(1920, 1080),
            &Profile {
                codec: Some("copy".into()),
                quality: Some(QualityControl::ConstantRateFactor(20)),
                rate: 4000,
                file_size: 700.0,
                duration: 60.0,
                ..profile()
            },
        );
        assert!(plan.is_copy());
        assert_eq!(plan.decoder, "copy");
        assert_eq!(plan.target.quality, None);
        assert_eq!(plan.target.rate, 0);
        assert_eq!(plan.target.duration, 3600.0);
        assert_eq!(plan.color, ColorTransform::None);
    }

    #[test]
    fn copy_keeps_source_geometry() {
        let plan = resolve(
            &source(1920, 1080),
            &Profile {
                codec: Some("copy".into()),
                size: Some(SizeTier::P720),
                ..profile()
            },
        );
        assert_eq!((plan.target.width, plan.target.height), (1920, 1080));
        assert_eq!((plan.decoded_width, plan.decoded_height), (1920, 1080));
        assert_eq!(plan.target.size, Some(SizeTier::P1080));
    }

    #[test]
    fn duration_never_runs_past_source() {
        let cases = [
            (0.0, 0.0),
            (10.0, 0.0),
            (0.0, 5000.0),
            (3590.0, 60.0),
            (4000.0, 60.0),
            (100.0, 100.0),
        ];
        for (seek, duration) in cases {
            let plan = resolve(
                &source(1920, 1080),
                &Profile {
                    seek,
                    duration,
                    ..profile()
                },
            );
            let t = &plan.target;
            assert!(t.duration >= 0.0, "seek {seek} dur {duration}");
            assert!(t.seek + t.duration <= 3600.0, "seek {seek} dur {duration}");
        }
    }

    #[test]
    fn start_and_end_define_the_window() {
        let plan = resolve(
            &source(1920, 1080),
            &Profile {
                start: Some(90.0),
                end: Some(600.0),
                ..profile()
            },
        );
        assert_eq!(plan.target.seek, 90.0);
        assert_eq!(plan.target.duration, 510.0);
    }

    #[test]
    fn explicit_seek_wins_over_start() {
        let plan = resolve(
            &source(1920, 1080),
            &Profile {
                seek: 5.0,
                start: Some(90.0),
                ..profile()
            },
        );
        assert_eq!(plan.target.seek, 5.0);
        assert_eq!(plan.target.duration, 3595.0);
    }

    #[test]
    fn audio_copies_when_nothing_requested() {
        let plan = resolve(&source(1920, 1080), &profile());
        assert_eq!(plan.target.audio_codec, COPY);
        assert_eq!(plan.target.audio_rate, 0);
        assert_eq!(plan.target.audio_channels, 0);
    }

    #[test]
    fn audio_never_asks_for_more_than_source() {
        let plan = resolve(
            &source(1920, 1080),
            &Profile {
                audio_rate: 320,
                audio_channels: 6,
                ..profile()
            },
        );
        assert_eq!(plan.target.audio_codec, COPY);
    }

    #[test]
    fn multichannel_downmix_defaults() {
        let mut src = source(1920, 1080);
        src.audio_codec = "dts".into();
        src.audio_rate = 1536;
        src.audio_channels = 8;

        let stereo = resolve(
            &src,
            &Profile {
                audio_channels: 2,
                ..profile()
            },
        );
        assert_eq!(stereo.target.audio_codec, "aac");
        assert_eq!(stereo.target.audio_channels, 2);

        let surround = resolve(
            &src,
            &Profile {
                audio_rate: 640,
                audio_channels: 6,
                ..profile()
            },
        );
        assert_eq!(surround.target.audio_codec, "ac3");
        assert_eq!(surround.target.audio_rate, 640);

        let explicit = resolve(
            &src,
            &Profile {
                audio_channels: 6,
                audio_codec: Some("eac3".into()),
                ..profile()
            },
        );
        assert_eq!(explicit.target.audio_codec, "eac3");
    }

    #[test]
    fn identical_audio_request_converges_to_copy() {
        let plan = resolve(
            &source(1920, 1080),
            &Profile {
                audio_rate: 128,
                audio_channels: 2,
                audio_codec: Some("aac".into()),
                ..profile()
            },
        );
        assert_eq!(plan.target.audio_codec, COPY);
    }

    #[test]
    fn volume_normalization_forces_reencode() {
        let mut src = source(1920, 1080);
        src.apply_volume("-3.5 dB");
        let plan = resolve(
            &src,
            &Profile {
                detect_volume: true,
                ..profile()
            },
        );
        assert_eq!(plan.target.volume, "3.5 dB");
        assert_eq!(plan.target.audio_codec, "aac");
        assert_eq!(plan.target.audio_channels, 2);
    }

    #[test]
    fn missing_audio_stays_unmapped() {
        let mut src = source(1920, 1080);
        src.audio_stream = None;
        let plan = resolve(
            &src,
            &Profile {
                audio_delay: 0.5,
                audio_channels: 2,
                ..profile()
            },
        );
        assert_eq!(plan.target.audio_codec, COPY);
        assert_eq!(plan.target.audio_input, 0);
    }

    #[test]
    fn audio_delay_selects_shifted_input() {
        let src = source(1920, 1080);
        let plan = resolve(
            &src,
            &Profile {
                audio_delay: -0.25,
                ..profile()
            },
        );
        assert_eq!(plan.target.audio_input, 1);

        let with_watermark = resolve(
            &src,
            &Profile {
                audio_delay: 0.25,
                watermark: Some(PathBuf::from("logo.png")),
                ..profile()
            },
        );
        assert_eq!(with_watermark.target.audio_input, 2);
    }

    #[test]
    fn codec_families_map_to_encoders() {
        let plan = resolve(
            &source(1920, 1080),
            &Profile {
                codec: Some("hevc".into()),
                ..profile()
            },
        );
        assert_eq!(plan.target.codec, "hevc_nvenc");
        assert_eq!(plan.encoder(), VideoEncoder::HevcNvenc);
        assert!(plan.hardware_decode());

        let passthrough = resolve(
            &source(1920, 1080),
            &Profile {
                codec: Some("libsvtav1".into()),
                ..profile()
            },
        );
        assert_eq!(passthrough.target.codec, "libsvtav1");
    }

    #[test]
    fn color_transform_selection() {
        use ColorTransform as C;
        assert_eq!(C::select("smpte2084", "bt709", "h264_nvenc"), C::Tonemap);
        assert_eq!(C::select("arib-std-b67", "bt709", ""), C::Tonemap);
        assert_eq!(C::select("unknown", "bt709", ""), C::ColorMatrix);
        assert_eq!(C::select("bt601", "bt709", ""), C::ColorMatrix);
        assert_eq!(C::select("smpte170m", "bt709", ""), C::FormatFix);
        assert_eq!(C::select("bt709", "bt709", ""), C::None);
        assert_eq!(C::select("bt709", "smpte2084", "libx265"), C::PqUpconvert);
        assert_eq!(C::select("bt709", "smpte2084", "libx264"), C::None);
        assert_eq!(C::select("smpte2084", "smpte2084", "libx265"), C::None);
    }

    #[test]
    fn resolution_is_deterministic() {
        let src = source(3840, 1600);
        let profile = Profile {
            size: Some(SizeTier::P1080),
            file_size: 2016.0,
            audio_channels: 2,
            ..profile()
        };
        assert_eq!(resolve(&src, &profile), resolve(&src, &profile));
    }

    #[test]
    fn even_round_ties() {
        assert_eq!(even_round(533.33), 534);
        assert_eq!(even_round(1080.0), 1080);
        assert_eq!(even_round(801.0), 800);
        assert_eq!(even_round(803.0), 804);
    }
}

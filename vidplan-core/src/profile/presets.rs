//! Named presets.
//!
//! A preset is a partial profile layered between the config file and the
//! command-line flags.

use super::ProfileOverrides;
use crate::error::{CoreError, CoreResult};

/// Every preset name, in display order.
pub const PRESET_NAMES: [&str; 9] = [
    "telegram-small",
    "telegram-fair",
    "telegram",
    "telegram-hevc",
    "telegram-x265",
    "phone",
    "homevideo",
    "homevideo2",
    "teams",
];

/// Messenger upload limit is 2048 MB; leave headroom for the container.
const TELEGRAM_FILE_SIZE_MB: f64 = 2016.0;

/// Returns the overrides for a preset name.
#[must_use]
pub fn preset(name: &str) -> Option<ProfileOverrides> {
    let overrides = match name {
        "telegram-small" => ProfileOverrides {
            crf: Some(26),
            ..telegram_libx264()
        },
        "telegram-fair" => ProfileOverrides {
            size: Some("1080p".into()),
            crf: Some(23),
            ..telegram_libx264()
        },
        "telegram" => ProfileOverrides {
            codec: Some("h264_nvenc".into()),
            cq: Some(19),
            ..telegram_upload()
        },
        "telegram-hevc" => ProfileOverrides {
            codec: Some("hevc_nvenc".into()),
            cq: Some(22),
            ..telegram_upload()
        },
        "telegram-x265" => ProfileOverrides {
            codec: Some("libx265".into()),
            ..telegram_upload()
        },
        "phone" => ProfileOverrides {
            audio_rate: Some(196),
            audio_channels: Some(2),
            audio_codec: Some("aac".into()),
            extension: Some("mp4".into()),
            ..Default::default()
        },
        "homevideo" => ProfileOverrides {
            codec: Some("libx265".into()),
            crf: Some(21),
            ..home_video()
        },
        "homevideo2" => ProfileOverrides {
            codec: Some("hevc_nvenc".into()),
            cq: Some(22),
            ..home_video()
        },
        "teams" => ProfileOverrides {
            codec: Some("h264_nvenc".into()),
            size: Some("1080p".into()),
            cq: Some(27),
            strip_metadata: Some(true),
            ..stereo_sdr_mp4()
        },
        _ => return None,
    };
    Some(overrides)
}

/// Like `preset`, but an unknown name is a configuration error.
pub fn resolve_preset(name: &str) -> CoreResult<ProfileOverrides> {
    preset(name).ok_or_else(|| CoreError::UnknownPreset {
        name: name.to_string(),
        known: PRESET_NAMES.join(", "),
    })
}

/// Stereo AAC at 144 kbps, 8-bit BT.709 in an mp4.
fn stereo_sdr_mp4() -> ProfileOverrides {
    ProfileOverrides {
        audio_rate: Some(144),
        audio_channels: Some(2),
        audio_codec: Some("aac".into()),
        audio_stream: Some(0),
        extension: Some("mp4".into()),
        pixel_format: Some("yuv420p".into()),
        color_transfer: Some("bt709".into()),
        ..Default::default()
    }
}

fn telegram_libx264() -> ProfileOverrides {
    ProfileOverrides {
        codec: Some("libx264".into()),
        draw_title: Some(false),
        strip_metadata: Some(false),
        ..stereo_sdr_mp4()
    }
}

/// 1080p, size capped for upload, title card, metadata stripped.
fn telegram_upload() -> ProfileOverrides {
    ProfileOverrides {
        size: Some("1080p".into()),
        file_size: Some(TELEGRAM_FILE_SIZE_MB),
        draw_title: Some(true),
        strip_metadata: Some(true),
        ..stereo_sdr_mp4()
    }
}

fn home_video() -> ProfileOverrides {
    ProfileOverrides {
        audio_channels: Some(2),
        audio_codec: Some("aac".into()),
        extension: Some("mp4".into()),
        ..Default::default()
    }
}

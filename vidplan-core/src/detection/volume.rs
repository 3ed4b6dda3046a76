//! Peak volume detection.
//!
//! `volumedetect` prints a `max_volume: -3.2 dB` summary line. The value is
//! kept verbatim on the source; the gain applied on the target is the same
//! magnitude with the sign dropped, bringing the peak up to 0 dB.

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

use crate::external::{FfmpegSpawner, null_device, run_capture};
use crate::media::Video;

static MAX_VOLUME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"max_volume:\s*([^\r\n]+)").expect("volume pattern is valid")
});

/// Extracts the `max_volume` value (e.g. `"-3.2 dB"`), or an empty string.
#[must_use]
pub fn parse_max_volume(text: &str) -> String {
    MAX_VOLUME_RE
        .captures(text)
        .map(|caps| caps[1].trim().to_string())
        .unwrap_or_default()
}

/// Gain for the `volume` audio filter, derived from a detected peak.
///
/// Returns an empty string when nothing was detected.
#[must_use]
pub fn normalization_gain(max_volume: &str) -> String {
    max_volume.trim().trim_start_matches('-').trim().to_string()
}

/// ffmpeg arguments for a volume analysis pass over the selected audio track.
#[must_use]
pub fn volumedetect_args(source: &Video, audio_stream: u32) -> Vec<String> {
    vec![
        "-hide_banner".into(),
        "-i".into(),
        source.file.to_string_lossy().into_owned(),
        "-map".into(),
        format!("0:a:{audio_stream}"),
        "-vn".into(),
        "-filter:a".into(),
        "volumedetect".into(),
        "-f".into(),
        "null".into(),
        null_device().into(),
    ]
}

/// Measures the peak volume of `source`.
///
/// Sources without audio and failed runs yield an empty string.
pub fn detect_volume<S: FfmpegSpawner>(spawner: &S, ffmpeg: &Path, source: &Video) -> String {
    let Some(audio_stream) = source.audio_stream else {
        log::debug!("No audio stream; skipping volume detection");
        return String::new();
    };

    log::info!("Detecting peak volume");
    match run_capture(spawner, ffmpeg, &volumedetect_args(source, audio_stream)) {
        Ok(output) => {
            let volume = parse_max_volume(&output);
            if volume.is_empty() {
                log::warn!("volumedetect reported no max_volume");
            } else {
                log::info!("Detected max volume {volume}");
            }
            volume
        }
        Err(e) => {
            log::warn!("Volume detection failed, continuing without normalization: {e}");
            String::new()
        }
    }
}

//! Black bar detection.
//!
//! ffmpeg's `cropdetect` filter reports one `crop=w:h:x:y` rectangle per
//! analysed frame. The rectangles are folded into the smallest crop that
//! keeps every sampled frame's picture, then expressed as margins on the
//! source frame. Detection is best effort: a failed run or an empty sample
//! set means "no crop".

use regex::Regex;
use serde::Serialize;
use std::path::Path;
use std::sync::LazyLock;

use crate::external::{FfmpegSpawner, null_device, run_capture};
use crate::media::{Crop, Video};
use crate::policy::is_hardware_codec;

/// Sampling window when nothing shorter is requested, in seconds.
pub const DEFAULT_DETECTION_WINDOW: f64 = 600.0;

/// Subtracted from a window bounded by an explicit end time, in seconds.
pub const END_TIME_MARGIN: f64 = 2.0;

/// Frames analysed per window, independent of the source frame rate.
pub const SAMPLES_PER_WINDOW: u32 = 10;

/// `cropdetect` limit, rounding and reset parameters.
const CROPDETECT_PARAMS: &str = "0.1:16:0";

static CROP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"crop=([0-9]+):([0-9]+):([0-9]+):([0-9]+)").expect("crop pattern is valid")
});

/// One rectangle reported by `cropdetect`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropSample {
    pub width: u32,
    pub height: u32,
    pub x: u32,
    pub y: u32,
}

/// The consolidated crop: picture size after cropping and the margins removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CropDetection {
    pub width: u32,
    pub height: u32,
    pub margins: Crop,
}

/// Extracts every `crop=w:h:x:y` rectangle from diagnostic text.
///
/// Lines without a match, and rectangles with negative values (reported for
/// fully black frames), are skipped.
#[must_use]
pub fn parse_crop_samples(text: &str) -> Vec<CropSample> {
    CROP_RE
        .captures_iter(text)
        .filter_map(|caps| {
            Some(CropSample {
                width: caps[1].parse().ok()?,
                height: caps[2].parse().ok()?,
                x: caps[3].parse().ok()?,
                y: caps[4].parse().ok()?,
            })
        })
        .collect()
}

/// Folds samples into one crop for a `source_width` x `source_height` frame.
///
/// Returns `None` for an empty sample set. Margins that would come out
/// negative are clamped to zero, and the cropped size is kept even.
#[must_use]
pub fn consolidate_crop(
    samples: &[CropSample],
    source_width: u32,
    source_height: u32,
) -> Option<CropDetection> {
    if samples.is_empty() {
        return None;
    }

    let (min_x, min_y, max_width, max_height) = samples.iter().fold(
        (source_width, source_height, 0u32, 0u32),
        |(min_x, min_y, max_w, max_h), s| {
            (min_x.min(s.x), min_y.min(s.y), max_w.max(s.width), max_h.max(s.height))
        },
    );

    let top = min_y.min(source_height);
    let left = min_x.min(source_width);
    let mut bottom = source_height.saturating_sub(min_y.saturating_add(max_height));
    let mut right = source_width.saturating_sub(min_x.saturating_add(max_width));

    let mut height = source_height.saturating_sub(top + bottom);
    let mut width = source_width.saturating_sub(left + right);
    if height % 2 == 1 {
        height -= 1;
        bottom += 1;
    }
    if width % 2 == 1 {
        width -= 1;
        right += 1;
    }

    Some(CropDetection {
        width,
        height,
        margins: Crop {
            top,
            bottom,
            left,
            right,
        },
    })
}

/// Decides how many seconds of the source to analyse.
///
/// Starts from the 600 s cap, replaced by an explicit override, or by a
/// shorter requested output duration. Without an override, an end time
/// bounds the window to `min(end, window)` minus a 2 s margin. A known
/// source duration caps the window so all samples land inside the file.
#[must_use]
pub fn detection_window(
    override_duration: f64,
    requested_duration: f64,
    end_time: Option<f64>,
    source_duration: f64,
) -> f64 {
    let mut window = DEFAULT_DETECTION_WINDOW;
    if override_duration > 0.0 {
        window = override_duration;
    } else {
        if requested_duration > 0.0 && requested_duration < window {
            window = requested_duration;
        }
        if let Some(end) = end_time.filter(|end| *end > 0.0) {
            window = end.min(window) - END_TIME_MARGIN;
        }
    }

    if source_duration > 0.0 && source_duration < window {
        window = source_duration;
    }
    window.max(1.0)
}

/// The `fps` + `cropdetect` filter spreading the samples over `window` seconds.
#[must_use]
pub fn cropdetect_filter(window: f64) -> String {
    format!("fps=fps={SAMPLES_PER_WINDOW}/{window:.6},cropdetect={CROPDETECT_PARAMS}")
}

/// ffmpeg arguments for a crop analysis pass over the first `window` seconds.
#[must_use]
pub fn cropdetect_args(source: &Video, window: f64) -> Vec<String> {
    let mut args: Vec<String> = vec!["-y".into(), "-hide_banner".into()];
    if is_hardware_codec(&source.codec) {
        args.extend(["-hwaccel".into(), "cuda".into()]);
    }
    if !source.codec.is_empty() {
        args.extend(["-c:v".into(), source.codec.clone()]);
    }
    args.extend([
        "-i".into(),
        source.file.to_string_lossy().into_owned(),
        "-map".into(),
        format!("0:v:{}", source.video_stream),
        "-vf".into(),
        cropdetect_filter(window),
        "-to".into(),
        (window as u64).to_string(),
        "-an".into(),
        "-f".into(),
        "null".into(),
        null_device().into(),
    ]);
    args
}

/// Runs crop analysis on `source`.
///
/// Failures are logged and reported as "no crop".
pub fn detect_crop<S: FfmpegSpawner>(
    spawner: &S,
    ffmpeg: &Path,
    source: &Video,
    window: f64,
) -> Option<CropDetection> {
    log::info!("Detecting black bars over the first {window:.0}s");
    let output = match run_capture(spawner, ffmpeg, &cropdetect_args(source, window)) {
        Ok(output) => output,
        Err(e) => {
            log::warn!("Crop detection failed, continuing without crop: {e}");
            return None;
        }
    };

    let samples = parse_crop_samples(&output);
    log::debug!("cropdetect reported {} rectangles", samples.len());
    let detection = consolidate_crop(&samples, source.width, source.height);
    match &detection {
        Some(d) if !d.margins.is_empty() => log::info!(
            "Detected crop {}x{} (top {}, bottom {}, left {}, right {})",
            d.width,
            d.height,
            d.margins.top,
            d.margins.bottom,
            d.margins.left,
            d.margins.right
        ),
        _ => log::info!("No cropping needed"),
    }
    detection
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::mocks::{MockFfmpegSpawner, log_event};

    const CROPDETECT_LOG: &str = "\
[Parsed_cropdetect_1 @ 0x7f8] x1:0 x2:1919 y1:0 y2:1079 w:-1904 h:-1072 x:1912 y:1080 pts:0 t:0.000000 crop=-1904:-1072:1912:1080
frame=    2 fps=0.0 q=-0.0 size=N/A time=00:00:59.96 bitrate=N/A speed= 119x
[Parsed_cropdetect_1 @ 0x7f8] x1:0 x2:1919 y1:140 y2:939 w:1920 h:800 x:0 y:140 pts:60 t:60.000000 crop=1920:800:0:140
[Parsed_cropdetect_1 @ 0x7f8] x1:0 x2:1919 y1:138 y2:941 w:1920 h:800 x:0 y:138 pts:120 t:120.000000 crop=1920:800:0:138
[Parsed_cropdetect_1 @ 0x7f8] x1:0 x2:1919 y1:132 y2:947 w:1920 h:816 x:0 y:132 pts:180 t:180.000000 crop=1920:816:0:132
";

    #[test]
    fn parses_rectangles_and_skips_noise() {
        let samples = parse_crop_samples(CROPDETECT_LOG);
        assert_eq!(samples.len(), 3);
        assert_eq!(
            samples[0],
            CropSample {
                width: 1920,
                height: 800,
                x: 0,
                y: 140
            }
        );
    }

    #[test]
    fn consolidates_to_widest_window() {
        let samples = parse_crop_samples(CROPDETECT_LOG);
        let detection = consolidate_crop(&samples, 1920, 1080).unwrap();
        assert_eq!(detection.width, 1920);
        assert_eq!(detection.height, 816);
        assert_eq!(
            detection.margins,
            Crop {
                top: 132,
                bottom: 132,
                left: 0,
                right: 0
            }
        );
    }

    #[test]
    fn empty_samples_mean_no_crop() {
        assert_eq!(consolidate_crop(&[], 1920, 1080), None);
        assert!(parse_crop_samples("no matches here\n").is_empty());
    }

    #[test]
    fn adversarial_samples_never_go_negative() {
        let samples = [
            CropSample {
                width: 4000,
                height: 3000,
                x: 10,
                y: 50,
            },
            CropSample {
                width: 100,
                height: 100,
                x: 3000,
                y: 3000,
            },
        ];
        let detection = consolidate_crop(&samples, 1920, 1080).unwrap();
        let m = detection.margins;
        assert_eq!((m.top, m.left, m.bottom, m.right), (50, 10, 0, 0));
        assert_eq!(detection.height, 1030);
        assert_eq!(detection.width, 1910);
        assert!(m.top + m.bottom + detection.height <= 1080);
    }

    #[test]
    fn odd_crops_are_evened() {
        let samples = [CropSample {
            width: 1919,
            height: 801,
            x: 0,
            y: 139,
        }];
        let detection = consolidate_crop(&samples, 1920, 1080).unwrap();
        assert_eq!(detection.height % 2, 0);
        assert_eq!(detection.width % 2, 0);
        let m = detection.margins;
        assert_eq!(m.top + detection.height + m.bottom, 1080);
        assert_eq!(m.left + detection.width + m.right, 1920);
    }

    #[test]
    fn window_policy() {
        assert_eq!(detection_window(0.0, 0.0, None, 0.0), 600.0);
        assert_eq!(detection_window(0.0, 0.0, None, 7200.0), 600.0);
        assert_eq!(detection_window(900.0, 0.0, None, 7200.0), 900.0);
        assert_eq!(detection_window(0.0, 120.0, None, 7200.0), 120.0);
        assert_eq!(detection_window(0.0, 0.0, Some(300.0), 7200.0), 298.0);
        // the margin applies even when the end time is past the window
        assert_eq!(detection_window(0.0, 0.0, Some(900.0), 7200.0), 598.0);
        assert_eq!(detection_window(0.0, 0.0, Some(5000.0), 7200.0), 598.0);
        assert_eq!(detection_window(0.0, 120.0, Some(900.0), 7200.0), 118.0);
        // an explicit override ignores the end time
        assert_eq!(detection_window(300.0, 0.0, Some(900.0), 7200.0), 300.0);
        assert_eq!(detection_window(0.0, 0.0, None, 45.0), 45.0);
        assert_eq!(detection_window(0.0, 0.0, Some(1.0), 0.0), 1.0);
    }

    #[test]
    fn filter_spreads_ten_samples() {
        assert_eq!(
            cropdetect_filter(600.0),
            "fps=fps=10/600.000000,cropdetect=0.1:16:0"
        );
    }

    #[test]
    fn hardware_sources_decode_on_gpu() {
        let mut source = Video::new(Path::new("/in/movie.mkv"));
        source.codec = "h264_cuvid".to_string();
        let args = cropdetect_args(&source, 298.0);
        assert_eq!(&args[..6], ["-y", "-hide_banner", "-hwaccel", "cuda", "-c:v", "h264_cuvid"]);
        assert!(args.contains(&"298".to_string()));
        assert_eq!(args.last().map(String::as_str), Some(null_device()));
    }

    #[test]
    fn detect_crop_runs_ffmpeg_and_folds() {
        let spawner = MockFfmpegSpawner::new();
        let events = CROPDETECT_LOG.lines().map(log_event).collect();
        spawner.add_success_expectation("cropdetect", events);

        let mut source = Video::new(Path::new("/in/movie.mkv"));
        source.width = 1920;
        source.height = 1080;
        let detection = detect_crop(&spawner, Path::new("ffmpeg"), &source, 600.0).unwrap();
        assert_eq!(detection.height, 816);
    }

    #[test]
    fn detect_crop_failure_is_not_fatal() {
        let spawner = MockFfmpegSpawner::new();
        spawner.add_exit_error_expectation("cropdetect", vec![], 1);

        let source = Video::new(Path::new("/in/movie.mkv"));
        assert_eq!(detect_crop(&spawner, Path::new("ffmpeg"), &source, 600.0), None);
    }
}

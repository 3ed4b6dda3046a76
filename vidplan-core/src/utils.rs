//! Utility functions for time strings, formatting and file checks.
//!
//! This module provides general-purpose helpers used throughout the
//! vidplan-core library.

use crate::error::{CoreError, CoreResult};
use std::path::Path;

/// Extensions picked up by directory discovery (case-insensitive).
pub const PROCESSABLE_EXTENSIONS: [&str; 2] = ["mp4", "mkv"];

/// Checks if the given path is an existing video file that bulk mode processes.
#[must_use]
pub fn is_processable_video(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                PROCESSABLE_EXTENSIONS
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known))
            })
}

/// Formats seconds as HH:MM:SS (e.g., 3725.0 -> "01:02:05"). Returns "??:??:??" for invalid inputs.
#[must_use]
pub fn format_duration(seconds: f64) -> String {
    if seconds < 0.0 || !seconds.is_finite() {
        return "??:??:??".to_string();
    }

    let total_seconds = seconds as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// Parses FFmpeg progress time (HH:MM:SS.MS) to seconds. Returns None if invalid.
#[must_use]
pub fn parse_ffmpeg_time(time: &str) -> Option<f64> {
    let parts: Vec<&str> = time.split(':').collect();
    if parts.len() == 3 {
        let hours = parts[0].parse::<f64>().ok()?;
        let minutes = parts[1].parse::<f64>().ok()?;
        let seconds = parts[2].parse::<f64>().ok()?;
        Some(hours * 3600.0 + minutes * 60.0 + seconds)
    } else {
        None
    }
}

/// Parses a user supplied timecode into seconds.
///
/// Missing higher units are left-padded: `"90"` is seconds, `"1:30"` is
/// minutes and seconds, `"1:02:03.5"` is hours, minutes and seconds. Every
/// component may carry a fraction. Negative components and more than two
/// colons are rejected.
pub fn parse_timecode(value: &str) -> CoreResult<f64> {
    let trimmed = value.trim();
    let invalid = || CoreError::InvalidTimecode(value.to_string());

    let parts: Vec<&str> = trimmed.split(':').collect();
    if trimmed.is_empty() || parts.len() > 3 {
        return Err(invalid());
    }

    let mut total = 0.0;
    for part in &parts {
        let component: f64 = part.trim().parse().map_err(|_| invalid())?;
        if component < 0.0 || !component.is_finite() {
            return Err(invalid());
        }
        total = total * 60.0 + component;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timecode_forms() {
        assert_eq!(parse_timecode("45").unwrap(), 45.0);
        assert_eq!(parse_timecode("1:30").unwrap(), 90.0);
        assert_eq!(parse_timecode("01:02:03").unwrap(), 3723.0);
        assert_eq!(parse_timecode("0:00:01.5").unwrap(), 1.5);
        assert_eq!(parse_timecode(" 2:00 ").unwrap(), 120.0);
    }

    #[test]
    fn test_parse_timecode_rejects_garbage() {
        assert!(parse_timecode("").is_err());
        assert!(parse_timecode("1:2:3:4").is_err());
        assert!(parse_timecode("ab:cd").is_err());
        assert!(parse_timecode("-5").is_err());
        assert!(matches!(
            parse_timecode("x"),
            Err(CoreError::InvalidTimecode(s)) if s == "x"
        ));
    }

    #[test]
    fn test_parse_ffmpeg_time() {
        assert_eq!(parse_ffmpeg_time("00:01:02.50"), Some(62.5));
        assert_eq!(parse_ffmpeg_time("N/A"), None);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(3725.0), "01:02:05");
        assert_eq!(format_duration(-1.0), "??:??:??");
    }

    #[test]
    fn test_is_processable_video() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let mkv = dir.path().join("a.MKV");
        let mp4 = dir.path().join("b.mp4");
        let avi = dir.path().join("c.avi");
        for path in [&mkv, &mp4, &avi] {
            std::fs::write(path, b"x")?;
        }

        assert!(is_processable_video(&mkv));
        assert!(is_processable_video(&mp4));
        assert!(!is_processable_video(&avi));
        assert!(!is_processable_video(&dir.path().join("missing.mkv")));
        Ok(())
    }
}

//! Crop and volume detection.
//!
//! Both detectors run ffmpeg in null-output analysis mode and scrape its
//! diagnostic text. Everything outside this module works with the parsed
//! results only.

pub mod crop;
pub mod volume;

pub use crop::{
    CropDetection, CropSample, consolidate_crop, cropdetect_filter, detect_crop,
    detection_window, parse_crop_samples,
};
pub use volume::{detect_volume, normalization_gain, parse_max_volume};

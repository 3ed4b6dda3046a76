//! Media descriptors and probe results.
//!
//! `probe` turns ffprobe's key/value text into a typed lookup, `video` holds
//! the descriptor built from it, and `naming` covers filename metadata and
//! output paths.

pub mod naming;
pub mod probe;
pub mod video;

pub use naming::{collision_free_path, output_file_path, split_name, NameParts};
pub use probe::{ProbeResult, StreamKind};
pub use video::{COPY, Crop, QualityControl, Video};

//! Filename metadata and output path naming.
//!
//! Release-style names such as `Some.Movie.1999.1080p.BluRay.mkv` carry a
//! title, a year and trailing release info. The split is best-effort
//! metadata for display; nothing in the encode plan depends on it.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static TITLE_YEAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*)[. ]([0-9]{4})[. ](.*)$").expect("title/year pattern is valid")
});

/// Title, year and trailing release info split out of a base name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameParts {
    pub title: String,
    pub year: Option<u32>,
    pub extra_info: String,
}

/// Splits `Title.Of.Movie.1999.extra` into its parts.
///
/// Names without a four digit year surrounded by separators keep the whole
/// base name as the title.
#[must_use]
pub fn split_name(base_name: &str) -> NameParts {
    match TITLE_YEAR_RE.captures(base_name) {
        Some(caps) => NameParts {
            title: caps[1].to_string(),
            year: caps[2].parse().ok(),
            extra_info: caps[3].to_string(),
        },
        None => NameParts {
            title: base_name.to_string(),
            year: None,
            extra_info: String::new(),
        },
    }
}

/// Builds `<dir>/<base>.<size>.<ext>`; the size segment is skipped when empty.
#[must_use]
pub fn output_file_path(dir: &Path, base_name: &str, size_tag: &str, extension: &str) -> PathBuf {
    let mut name = base_name.to_string();
    for segment in [size_tag, extension] {
        if !segment.is_empty() {
            name.push('.');
            name.push_str(segment.trim_start_matches('.'));
        }
    }
    dir.join(name)
}

/// Returns `path` if unused, else the first free `<stem>.<N>.<ext>` for N = 1, 2, ...
///
/// The existence check and the later write are not atomic; concurrent
/// writers targeting the same name can still collide.
#[must_use]
pub fn collision_free_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }

    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path.extension().map(|e| e.to_string_lossy().into_owned());

    (1u32..)
        .map(|n| {
            let name = match &extension {
                Some(ext) => format!("{stem}.{n}.{ext}"),
                None => format!("{stem}.{n}"),
            };
            parent.join(name)
        })
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| path.to_path_buf())
}

//! Probe result model.
//!
//! ffprobe is invoked with `-of default=noprint_wrappers=1`, which prints one
//! `key=value` pair per line. This module turns that text into a lookup with
//! lenient typed accessors: a field that is missing or fails to parse yields
//! the zero value, since many fields are legitimately absent for some codecs.

use std::collections::HashMap;

/// Stream kinds selectable with `-select_streams`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Video,
    Audio,
}

impl StreamKind {
    /// The ffprobe stream specifier letter.
    #[must_use]
    pub fn specifier(self) -> &'static str {
        match self {
            StreamKind::Video => "v",
            StreamKind::Audio => "a",
        }
    }
}

/// Key/value metadata returned for a single stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProbeResult {
    values: HashMap<String, String>,
}

impl ProbeResult {
    /// Parses `key=value` lines.
    ///
    /// Blank lines and lines without `=` are skipped; key and value are
    /// trimmed and only the first `=` splits. A repeated key keeps its first
    /// usable value, so stream fields win over the `[FORMAT]` section that
    /// follows, while a stream field reported as `N/A` falls back to it.
    #[must_use]
    pub fn parse(output: &str) -> Self {
        let mut values = HashMap::new();
        for line in output.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                let (key, value) = (key.trim(), value.trim());
                if key.is_empty() || value.is_empty() || value == "N/A" {
                    continue;
                }
                values
                    .entry(key.to_string())
                    .or_insert_with(|| value.to_string());
            }
        }
        Self { values }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Raw value. Empty and `N/A` values are never stored.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// String value or empty.
    #[must_use]
    pub fn string(&self, key: &str) -> String {
        self.get(key).unwrap_or_default().to_string()
    }

    /// Unsigned integer value or 0.
    #[must_use]
    pub fn u32(&self, key: &str) -> u32 {
        self.get(key).and_then(|v| v.parse().ok()).unwrap_or(0)
    }

    /// Floating point value or 0.0.
    #[must_use]
    pub fn f64(&self, key: &str) -> f64 {
        self.get(key)
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .unwrap_or(0.0)
    }

    /// A bits-per-second field converted to whole kbps, or 0.
    #[must_use]
    pub fn kbps(&self, key: &str) -> u32 {
        self.get(key)
            .and_then(|v| v.parse::<u64>().ok())
            .map_or(0, |bps| u32::try_from(bps / 1000).unwrap_or(u32::MAX))
    }
}

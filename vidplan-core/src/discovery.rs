//! File discovery module for finding video files to process.
//!
//! Bulk mode searches the top level of a directory for `.mkv` and `.mp4`
//! files (case-insensitive). Subdirectories are not searched.

use crate::error::{CoreError, CoreResult};
use crate::utils::is_processable_video;

use std::path::{Path, PathBuf};

/// Finds video files eligible for processing in the specified directory.
///
/// The result is sorted so bulk runs process files in a stable order.
///
/// # Returns
///
/// * `Ok(Vec<PathBuf>)` - Paths of the discovered files
/// * `Err(CoreError::Io)` - If the directory cannot be read
/// * `Err(CoreError::NoFilesFound)` - If no video files are found
///
/// # Examples
///
/// ```rust,no_run
/// use vidplan_core::find_processable_files;
/// use std::path::Path;
///
/// let files = find_processable_files(Path::new("/path/to/videos"))?;
/// for file in files {
///     println!("  {}", file.display());
/// }
/// # Ok::<(), vidplan_core::CoreError>(())
/// ```
pub fn find_processable_files(input_dir: &Path) -> CoreResult<Vec<PathBuf>> {
    let read_dir = std::fs::read_dir(input_dir)?;
    let mut files: Vec<PathBuf> = read_dir
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            is_processable_video(&path).then_some(path)
        })
        .collect();

    if files.is_empty() {
        return Err(CoreError::NoFilesFound(input_dir.to_path_buf()));
    }
    files.sort();
    Ok(files)
}

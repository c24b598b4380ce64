use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::Result;

/// Lists the files directly inside `dir`, optionally keeping one extension
///
/// Paths are sorted so directory-level drivers process files in a stable order.
pub fn list_dir<P: AsRef<Path>>(dir: P, ext: Option<&str>) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        if let Some(ext) = ext {
            if !path.extension().is_some_and(|e| e == ext) {
                continue;
            }
        }
        paths.push(path);
    }
    paths.sort();
    Ok(paths)
}

/// Returns `dir` followed by every directory below it
pub fn sub_directories<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_dir() {
            dirs.push(entry.into_path());
        }
    }
    Ok(dirs)
}

/// Returns the file name up to its first `.`
#[must_use]
pub fn file_stem_prefix(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_default()
        .split('.')
        .next()
        .unwrap_or_default()
        .to_string()
}

//! Data file discovery and partition key parsing.

use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use crate::error::{IngestError, Result};

/// Extensions recognized as Parquet data files.
pub const PARQUET_EXTENSIONS: &[&str] = &["parquet", "pq"];

/// Recursively lists files under `dir` whose extension is one of `extensions`.
///
/// Extension matching is case-insensitive. Entries whose name starts with
/// `.` or `_` (hidden files, `_SUCCESS` markers, `_temporary` folders) are
/// skipped. Symlinked directories are not followed. Returns paths sorted so
/// that the load order does not depend on the file system.
pub fn list_data_files(dir: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(IngestError::NotFound {
            path: dir.to_path_buf(),
        });
    }

    let mut files = Vec::new();
    collect_files(dir, extensions, &mut files)?;
    files.sort();
    Ok(files)
}

fn collect_files(dir: &Path, extensions: &[&str], files: &mut Vec<PathBuf>) -> Result<()> {
    let entries = std::fs::read_dir(dir).map_err(|e| IngestError::DirectoryRead {
        path: dir.to_path_buf(),
        source: e,
    })?;

    for entry_result in entries {
        let entry = entry_result.map_err(|e| IngestError::DirectoryRead {
            path: dir.to_path_buf(),
            source: e,
        })?;

        if is_hidden(&entry.file_name()) {
            continue;
        }

        let file_type = entry.file_type().map_err(|e| IngestError::DirectoryRead {
            path: entry.path(),
            source: e,
        })?;
        let path = entry.path();
        if file_type.is_dir() {
            collect_files(&path, extensions, files)?;
            continue;
        }
        if file_type.is_symlink() && !path.is_file() {
            continue;
        }

        if has_extension(&path, extensions) {
            files.push(path);
        }
    }

    Ok(())
}

fn is_hidden(name: &OsStr) -> bool {
    name.to_str()
        .is_some_and(|name| name.starts_with('.') || name.starts_with('_'))
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.iter().any(|e| ext.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

/// Parses `key=value` directory segments between `root` and `file`.
///
/// Only the directories are considered, never the file name. Segments
/// without `=` are skipped; the value keeps everything after the first `=`.
///
/// ```
/// use std::path::Path;
/// use dq_ingest::partition_values;
///
/// let parts = partition_values(
///     Path::new("/data"),
///     Path::new("/data/partition_date=2024-01/part-0.parquet"),
/// );
/// assert_eq!(parts, vec![("partition_date".to_string(), "2024-01".to_string())]);
/// ```
pub fn partition_values(root: &Path, file: &Path) -> Vec<(String, String)> {
    let Some(parent) = file.parent() else {
        return Vec::new();
    };
    let Ok(relative) = parent.strip_prefix(root) else {
        return Vec::new();
    };

    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(segment) => segment.to_str(),
            _ => None,
        })
        .filter_map(|segment| segment.split_once('='))
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

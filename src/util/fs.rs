//! Filesystem utilities.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use glob::glob;

/// Remove a directory tree. A missing directory is not an error.
pub fn remove_dir_all_if_exists(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
            Err(e).with_context(|| format!("failed to remove directory: {}", path.display()))
        }
        _ => Ok(()),
    }
}

/// Create a directory and its parents unless it already exists.
pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .with_context(|| format!("failed to create directory: {}", path.display()))
}

/// Write a string to a file, creating parent directories if needed.
pub fn write_string(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    fs::write(path, contents).with_context(|| format!("failed to write file: {}", path.display()))
}

/// Files directly matching any of `patterns` inside `base`, sorted.
///
/// Unreadable entries are skipped.
pub fn glob_files(base: &Path, patterns: &[&str]) -> Result<Vec<PathBuf>> {
    let mut files = BTreeSet::new();
    for pattern in patterns {
        let full = base.join(pattern);
        let matches = glob(&full.to_string_lossy())
            .with_context(|| format!("invalid glob pattern: {}", pattern))?;
        files.extend(matches.filter_map(|entry| match entry {
            Ok(path) => path.is_file().then_some(path),
            Err(e) => {
                tracing::warn!("skipping {}: {}", e.path().display(), e.error());
                None
            }
        }));
    }
    Ok(files.into_iter().collect())
}

/// Make `path` absolute against `base` and lexically resolve `.` and `..`.
///
/// The filesystem is not consulted, so the path need not exist.
pub fn expand_path(base: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Get the relative path from `base` to `path`.
pub fn relative_path(base: &Path, path: &Path) -> PathBuf {
    pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf())
}

//! Build workspace lifecycle: clearing directories and copying the source tree.

use crate::error::{BuildError, Result};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Directory names never copied out of the source tree.
const SKIP_DIRS: &[&str] = &["__pycache__", ".git"];

/// Delete each directory if present, then recreate it empty.
pub fn clear_dirs(dirs: &[&Path]) -> Result<()> {
    for dir in dirs {
        if dir.exists() {
            tracing::debug!(path = %dir.display(), "removing directory");
            fs::remove_dir_all(dir)?;
        }
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

/// Recursively copy `source` into `dest`, merging with existing contents.
pub fn copy_source_tree(source: &Path, dest: &Path) -> Result<usize> {
    if !source.is_dir() {
        return Err(BuildError::SourceNotFound(source.to_path_buf()));
    }

    fs::create_dir_all(dest)?;
    let mut copied = 0;

    let walker = WalkDir::new(source).min_depth(1).into_iter().filter_entry(|entry| {
        !(entry.file_type().is_dir()
            && SKIP_DIRS
                .iter()
                .any(|skip| entry.file_name() == *skip))
    });

    for entry in walker {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| BuildError::Io(std::io::Error::other(e)))?;
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }

    tracing::debug!(
        "copied {} file(s) from {} to {}",
        copied,
        source.display(),
        dest.display()
    );
    Ok(copied)
}

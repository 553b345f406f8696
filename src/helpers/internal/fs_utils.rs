//! Common filesystem utilities
//!
//! Provides shared filesystem operations used across multiple helpers.

use crate::error::{Error, Result};
use std::path::Path;
use tempfile::NamedTempFile;

/// Ensure a file's parent directory exists.
///
/// Creates the parent directory (and all ancestors) if it doesn't exist.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    Ok(())
}

/// Copy a file, creating parent directories as needed.
///
/// The copy goes through a temporary sibling that is renamed into place, so a
/// failed copy never leaves a truncated `dest` behind.
pub fn copy_file(src: &Path, dest: &Path) -> Result<u64> {
    let mut input = std::fs::File::open(src).map_err(|e| Error::io(src, e))?;
    write_atomically(dest, |out| std::io::copy(&mut input, out))
}

/// Write `dest` through a temporary file in the same directory.
///
/// The closure receives the temporary file; on success it is renamed over
/// `dest`, on failure it is removed.
pub fn write_atomically<T>(
    dest: &Path,
    write: impl FnOnce(&mut std::fs::File) -> std::io::Result<T>,
) -> Result<T> {
    ensure_parent_dir(dest)?;
    let dir = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| Error::io(dir, e))?;
    let value = write(tmp.as_file_mut()).map_err(|e| Error::io(dest, e))?;
    tmp.persist(dest).map_err(|e| Error::io(dest, e.error))?;
    Ok(value)
}

/// Check if path is safe (no path traversal).
///
/// Rejects absolute paths and paths containing "..".
pub fn is_safe_path(path: &Path) -> bool {
    !path.is_absolute()
        && !path
            .components()
            .any(|c| c == std::path::Component::ParentDir)
}

//! Filesystem helpers shared by the lock renderer and configuration code.
//!
//! The central piece is [`atomic_write`]: lock files must never be observed
//! half-written, so content is fully materialized in memory, written to a
//! temporary path next to the target, synced, and renamed into place.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Create a directory and all parent directories if they don't exist.
///
/// Unlike `std::fs::create_dir_all`, provides a contextual error message.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if path.exists() {
        if !path.is_dir() {
            anyhow::bail!("Path exists but is not a directory: {}", path.display());
        }
        return Ok(());
    }

    fs::create_dir_all(path)
        .with_context(|| format!("Failed to create directory: {}", path.display()))
}

/// Write a file atomically: temp file in the same directory, fsync, rename.
///
/// The rename is atomic on all supported platforms as long as the temporary
/// file lives on the same filesystem as the target, which is why the temp
/// path is derived from the target path rather than the system temp dir.
/// A crash mid-write leaves at most a stale `.tmp` file, never a truncated
/// target.
///
/// # Examples
///
/// ```rust,no_run
/// use std::path::Path;
/// use envlock::utils::fs::atomic_write;
///
/// # fn example() -> anyhow::Result<()> {
/// atomic_write(Path::new("envlock.yml"), b"version: 1\n")?;
/// # Ok(())
/// # }
/// ```
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    use std::io::Write;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_dir(parent)?;
        }
    }

    let temp_path = path.with_extension("tmp");

    {
        let mut file = fs::File::create(&temp_path)
            .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;

        file.write_all(content)
            .with_context(|| format!("Failed to write to temp file: {}", temp_path.display()))?;

        file.sync_all().context("Failed to sync file to disk")?;
    }

    fs::rename(&temp_path, path)
        .with_context(|| format!("Failed to rename temp file to: {}", path.display()))?;

    Ok(())
}

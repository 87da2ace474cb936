//! Writing rendered lock content to disk.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use crate::utils::fs::atomic_write;

/// Write rendered lock content to `path` atomically.
///
/// The content is already fully materialized by the renderer; this helper
/// only stages it through a temp file and renames it into place so readers
/// never observe a partially-written lock.
pub fn write_lock_file(path: &Path, content: &str) -> Result<()> {
    atomic_write(path, content.as_bytes()).with_context(|| {
        format!(
            "Cannot write lock file: {}\n\n\
             Possible causes:\n\
             - Permission denied (check directory ownership)\n\
             - Output directory doesn't exist\n\
             - Disk is full or read-only",
            path.display()
        )
    })?;

    info!(path = %path.display(), "wrote lock file");
    Ok(())
}

//! Atomic file writes: temp file in the target directory, fsync, rename.
//!
//! Snapshot persistence depends on this: a crashed run must leave either
//! the old snapshot or the new one, never a torn file.

use std::fs;
use std::io::Write;

use anyhow::{Context, Result};
use camino::Utf8Path;
use tempfile::NamedTempFile;

/// Atomically replace `path` with `content`.
///
/// The temporary file is created in the target's parent directory so the
/// final rename never crosses a filesystem boundary. The parent directory
/// is created if missing.
pub fn write_file_atomic(path: &Utf8Path, content: &str) -> Result<()> {
    let parent = path.parent().unwrap_or_else(|| Utf8Path::new("."));
    fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create parent directory: {parent}"))?;

    let mut temp = NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temporary file in: {parent}"))?;
    temp.write_all(content.as_bytes())
        .context("Failed to write content to temporary file")?;
    temp.as_file()
        .sync_all()
        .context("Failed to fsync temporary file")?;
    temp.persist(path.as_std_path())
        .map_err(|e| anyhow::anyhow!(e.error))
        .with_context(|| format!("Failed to atomically replace: {path}"))?;
    Ok(())
}

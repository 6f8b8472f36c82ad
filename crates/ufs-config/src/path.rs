//! Path resolution utilities for host-facing entry points.
//!
//! Image paths handed to the engine should be resolved through these so
//! that the CLI, the mount wrapper, and tests agree on the same file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Resolve an existing path to a canonical absolute form.
pub fn resolve_existing(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    path.canonicalize()
        .with_context(|| format!("Failed to resolve path: {}", path.display()))
}

/// Resolve a path whose final component may not exist yet.
///
/// Canonicalizes the parent directory and appends the filename. Useful for
/// image files that are about to be created.
pub fn resolve_creatable(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let filename = path.file_name().context("Path has no filename")?;

    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            let canonical_parent = parent.canonicalize().with_context(|| {
                format!("Failed to resolve parent directory: {}", parent.display())
            })?;
            Ok(canonical_parent.join(filename))
        }
        _ => {
            let cwd = std::env::current_dir().context("Failed to get current directory")?;
            Ok(cwd.join(filename))
        }
    }
}

/// Resolve a path, falling back to the original if canonicalization fails.
pub fn resolve_or_original(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

//! File operations module - handles output file system operations
//!
//! Includes:
//! - Resume check for already-written outputs
//! - Partial-file-then-rename writes
//! - Copy preserving access/modification times

use anyhow::{Context, Result};
use filetime::{FileTime, set_file_times};
use log::warn;
use std::{
    fs,
    path::{Path, PathBuf},
};

// ────────────────────────────────────────────────────────────────
// Resume Check
// ────────────────────────────────────────────────────────────────

/// Create the parent directories of `output` and report whether a finished
/// output already exists.
///
/// A zero-length file is left over from an interrupted run and is removed.
pub fn prepare_output(output: &Path) -> Result<bool> {
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory tree {:?}", parent))?;
    }

    match fs::metadata(output) {
        Ok(metadata) if metadata.len() > 0 => Ok(true),
        Ok(_) => {
            fs::remove_file(output)
                .with_context(|| format!("failed to remove empty output {:?}", output))?;
            Ok(false)
        }
        Err(_) => Ok(false),
    }
}

// ────────────────────────────────────────────────────────────────
// Atomic Writes
// ────────────────────────────────────────────────────────────────

/// Hidden sibling of `output` used while it is being written.
///
/// The extension is kept so tools that infer the format from the name still work.
pub fn partial_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match output.extension() {
        Some(ext) => format!(".{}.partial.{}", stem, ext.to_string_lossy()),
        None => format!(".{}.partial", stem),
    };
    output.with_file_name(name)
}

/// Run `write` against the partial path and move the result onto `output`.
///
/// The partial file is removed when `write` or the rename fails.
pub fn write_atomically<F>(output: &Path, write: F) -> Result<()>
where
    F: FnOnce(&Path) -> Result<()>,
{
    let partial = partial_path(output);

    let result = write(&partial).and_then(|()| {
        fs::rename(&partial, output)
            .with_context(|| format!("failed to move {:?} to {:?}", partial, output))
    });

    if result.is_err() && partial.exists() {
        if let Err(err) = fs::remove_file(&partial) {
            warn!("Failed to remove partial file {:?}: {}", partial, err);
        }
    }

    result
}

// ────────────────────────────────────────────────────────────────
// Copy
// ────────────────────────────────────────────────────────────────

/// Copy `source` to `dest` byte for byte, carrying over its timestamps.
pub fn copy_preserving_times(source: &Path, dest: &Path) -> Result<()> {
    fs::copy(source, dest)
        .with_context(|| format!("failed to copy file from {:?} to {:?}", source, dest))?;

    let metadata = fs::metadata(source)
        .with_context(|| format!("failed to read metadata of {:?}", source))?;
    set_file_times(
        dest,
        FileTime::from_last_access_time(&metadata),
        FileTime::from_last_modification_time(&metadata),
    )
    .with_context(|| format!("failed to set timestamps on {:?}", dest))?;

    Ok(())
}

/// Atomic variant of [`copy_preserving_times`].
pub fn copy_atomically(source: &Path, dest: &Path) -> Result<()> {
    write_atomically(dest, |partial| copy_preserving_times(source, partial))
}

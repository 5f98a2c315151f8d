//! Discovery - finds media files inside marker directories and pairs each one
//! with its JSON sidecar.

use anyhow::{Context, Result, bail};
use log::warn;
use std::{
    fs,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

use crate::{
    common::{MARKER_DIR_PREFIX, SIDECAR_EXTENSION},
    workflow::types::{MediaKind, MediaRecord},
};

// ────────────────────────────────────────────────────────────────
// Public API
// ────────────────────────────────────────────────────────────────

/// Walk `root` and return one record per media file found in a marker directory.
pub fn find_media_with_metadata(root: &Path) -> Result<Vec<MediaRecord>> {
    if !root.is_dir() {
        bail!("root {:?} does not exist or is not a directory", root);
    }

    let mut records = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("Skipping unreadable path under {:?}: {}", root, err);
                continue;
            }
        };

        if !entry.file_type().is_dir() || !is_marker_dir(entry.path()) {
            continue;
        }

        match scan_marker_dir(root, entry.path()) {
            Ok(found) => records.extend(found),
            Err(err) => warn!("Skipping directory {:?}: {:#}", entry.path(), err),
        }
    }

    Ok(records)
}

/// Pick the sidecar for `file_name` out of the `.json` names in its directory.
///
/// Names starting with the full file name win over names starting with the
/// stem. Ties go to the shortest name, then lexicographic order.
pub fn match_sidecar<'a>(file_name: &str, sidecars: &'a [String]) -> Option<&'a str> {
    best_prefix_match(file_name, sidecars).or_else(|| {
        let stem = Path::new(file_name).file_stem()?.to_str()?;
        best_prefix_match(stem, sidecars)
    })
}

// ────────────────────────────────────────────────────────────────
// Private Helpers
// ────────────────────────────────────────────────────────────────

fn is_marker_dir(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with(MARKER_DIR_PREFIX))
}

fn scan_marker_dir(root: &Path, dir: &Path) -> Result<Vec<MediaRecord>> {
    let mut file_names = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("failed to list {:?}", dir))? {
        let entry = entry.with_context(|| format!("failed to read entry in {:?}", dir))?;
        // fs::metadata follows symlinks, so linked media and sidecars count as files
        match fs::metadata(entry.path()) {
            Ok(metadata) if metadata.is_file() => {}
            Ok(_) => continue,
            Err(err) => {
                warn!("Skipping unreadable entry {:?}: {}", entry.path(), err);
                continue;
            }
        }
        match entry.file_name().into_string() {
            Ok(name) => file_names.push(name),
            Err(name) => warn!("Skipping non UTF-8 file name {:?} in {:?}", name, dir),
        }
    }
    file_names.sort();

    let sidecars: Vec<String> = file_names
        .iter()
        .filter(|name| name.to_lowercase().ends_with(SIDECAR_EXTENSION))
        .cloned()
        .collect();

    let local_dir = relative_dir(root, dir);

    let records = file_names
        .iter()
        .filter(|name| MediaKind::from_path(Path::new(name)).is_some())
        .map(|name| {
            let sidecar = match_sidecar(name, &sidecars).map(|json| dir.join(json));
            MediaRecord::new(local_dir.join(name), sidecar)
        })
        .collect();

    Ok(records)
}

fn best_prefix_match<'a>(prefix: &str, sidecars: &'a [String]) -> Option<&'a str> {
    sidecars
        .iter()
        .filter(|json| json.starts_with(prefix))
        .min_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)))
        .map(String::as_str)
}

/// `dir` relative to `root`; empty when `dir` is the root itself.
fn relative_dir(root: &Path, dir: &Path) -> PathBuf {
    dir.strip_prefix(root)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| dir.to_path_buf())
}

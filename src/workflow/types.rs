use std::{
    fmt,
    path::{Path, PathBuf},
};

use crate::{
    common::{VALID_IMAGE_EXTENSIONS, VALID_VIDEO_EXTENSIONS},
    utils::PathExt,
};

// ────────────────────────────────────────────────────────────────
// MediaRecord - One media file found inside a marker directory
// ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRecord {
    /// Path relative to the archive root, never starting with a separator.
    pub relative_path: PathBuf,
    /// Matching JSON sidecar inside the archive root, if one was found.
    pub sidecar_path: Option<PathBuf>,
}

impl MediaRecord {
    pub fn new(relative_path: impl Into<PathBuf>, sidecar_path: Option<PathBuf>) -> Self {
        Self {
            relative_path: relative_path.into(),
            sidecar_path,
        }
    }

    pub fn ext_lower(&self) -> String {
        self.relative_path.ext_lower()
    }
}

// ────────────────────────────────────────────────────────────────
// MediaKind - Routing decision for a record
// ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Photo,
    Video,
}

impl MediaKind {
    /// Classify a lowercase extension (without the dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        if VALID_IMAGE_EXTENSIONS.contains(&ext) {
            Some(MediaKind::Photo)
        } else if VALID_VIDEO_EXTENSIONS.contains(&ext) {
            Some(MediaKind::Video)
        } else {
            None
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        Self::from_extension(&path.ext_lower())
    }
}

// ────────────────────────────────────────────────────────────────
// Outcome / Summary - Per-item results and their aggregate
// ────────────────────────────────────────────────────────────────

/// What a transform did with one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Non-JPEG photo copied verbatim.
    Copied,
    /// JPEG resized and re-encoded.
    Compressed,
    /// JPEG re-encode came out larger, so the original was copied.
    KeptOriginal,
    /// Video transcoded by ffmpeg.
    Transcoded,
    /// A non-empty output already existed.
    SkippedExisting,
}

#[derive(Debug, Default)]
pub struct Summary {
    pub copied: usize,
    pub compressed: usize,
    pub kept_original: usize,
    pub transcoded: usize,
    pub skipped_existing: usize,
    pub unsupported: usize,
    pub failed: usize,
    pub failures: Vec<(PathBuf, String)>,
}

impl Summary {
    pub fn record(&mut self, path: &Path, result: &anyhow::Result<Outcome>) {
        match result {
            Ok(Outcome::Copied) => self.copied += 1,
            Ok(Outcome::Compressed) => self.compressed += 1,
            Ok(Outcome::KeptOriginal) => self.kept_original += 1,
            Ok(Outcome::Transcoded) => self.transcoded += 1,
            Ok(Outcome::SkippedExisting) => self.skipped_existing += 1,
            Err(err) => {
                self.failed += 1;
                self.failures.push((path.to_path_buf(), format!("{:#}", err)));
            }
        }
    }

    pub fn record_unsupported(&mut self) {
        self.unsupported += 1;
    }

    pub fn total(&self) -> usize {
        self.copied
            + self.compressed
            + self.kept_original
            + self.transcoded
            + self.skipped_existing
            + self.unsupported
            + self.failed
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} files: copied: {}, compressed: {}, kept original: {}, transcoded: {}, skipped existing: {}, unsupported: {}, failed: {}",
            self.total(),
            self.copied,
            self.compressed,
            self.kept_original,
            self.transcoded,
            self.skipped_existing,
            self.unsupported,
            self.failed
        )
    }
}

use anyhow::Result;
use log::{Level, debug, error, info, log, warn};
use std::{path::Path, time::Instant};

use crate::{
    utils::output_root,
    workflow::{
        discovery::find_media_with_metadata,
        processors::{
            image::process_photo, setup::initialize_output_folder, video::process_video,
        },
        types::{MediaKind, MediaRecord, Outcome, Summary},
    },
};

/// Shrink the archive at `root` into its `__out` sibling.
///
/// Only a missing root or an unusable output directory is an error; per-file
/// failures end up in the returned summary.
pub fn shrink_archive(root: &Path) -> Result<Summary> {
    let out_dir = output_root(root)?;

    let start_time = Instant::now();
    let records = find_media_with_metadata(root)?;
    info!(duration = &*format!("{:?}", start_time.elapsed()); "Found {} media files.", records.len());

    initialize_output_folder(&out_dir)?;
    info!("Writing to {}", out_dir.display());

    let summary = process_files(root, &out_dir, &records);
    log_summary(&summary, start_time);
    Ok(summary)
}

/// Route every record to its processor and collect the results.
pub fn process_files(root: &Path, out_dir: &Path, records: &[MediaRecord]) -> Summary {
    let mut summary = Summary::default();

    for record in records {
        let path = &record.relative_path;

        let Some(kind) = MediaKind::from_path(path) else {
            warn!("Unexpected extension {:?}, skipping {}", record.ext_lower(), path.display());
            summary.record_unsupported();
            continue;
        };

        if let Some(sidecar) = &record.sidecar_path {
            debug!("Sidecar for {}: {}", path.display(), sidecar.display());
        }

        let start_time = Instant::now();
        let result = match kind {
            MediaKind::Photo => process_photo(path, root, out_dir),
            MediaKind::Video => process_video(path, root, out_dir),
        };

        match &result {
            Ok(outcome) => {
                log!(outcome_log_level(*outcome), duration = &*format!("{:?}", start_time.elapsed()); "{} {}", outcome_label(*outcome), path.display())
            }
            Err(err) => {
                error!(duration = &*format!("{:?}", start_time.elapsed()); "Failed to process {}: {:#}", path.display(), err)
            }
        }

        summary.record(path, &result);
    }

    summary
}

/// Skips are visible at the default filter; finished work already logged its start.
fn outcome_log_level(outcome: Outcome) -> Level {
    match outcome {
        Outcome::SkippedExisting => Level::Info,
        _ => Level::Debug,
    }
}

fn outcome_label(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Copied => "Copied",
        Outcome::Compressed => "Compressed",
        Outcome::KeptOriginal => "Kept original",
        Outcome::Transcoded => "Transcoded",
        Outcome::SkippedExisting => "Skipping existing",
    }
}

fn log_summary(summary: &Summary, start_time: Instant) {
    info!(duration = &*format!("{:?}", start_time.elapsed()); "Done. {}", summary);
    for (path, reason) in &summary.failures {
        warn!("Failed: {}\n{}", path.display(), reason);
    }
}

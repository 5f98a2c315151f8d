//! Video processing module - handles all video related logic
//!
//! Includes:
//! - Flat output layout under `videos/`
//! - The fixed ffmpeg argument template
//! - Checked ffmpeg invocation with stderr surfaced on failure

use crate::{
    common::{
        AUDIO_BITRATE, AUDIO_CODEC, FFMPEG_PROGRAM, FFMPEG_STDERR_TAIL_LINES, VIDEO_BITRATE,
        VIDEO_CODEC, VIDEO_CRF, VIDEO_OUTPUT_DIR, VIDEO_PRESET, VIDEO_SCALE_FILTER,
    },
    workflow::{
        processors::file::{prepare_output, write_atomically},
        types::Outcome,
    },
};
use anyhow::{Context, Result, anyhow};
use log::info;
use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

// ────────────────────────────────────────────────────────────────
// Public API
// ────────────────────────────────────────────────────────────────

/// Transcode one video into the flat `videos/` directory of `out_dir`.
pub fn process_video(relative_path: &Path, root: &Path, out_dir: &Path) -> Result<Outcome> {
    let input = root.join(relative_path);
    let output = video_output_path(relative_path, out_dir)?;

    if prepare_output(&output)? {
        return Ok(Outcome::SkippedExisting);
    }

    info!("Compressing {}", input.display());
    write_atomically(&output, |partial| compress_with_ffmpeg(&input, partial))?;
    Ok(Outcome::Transcoded)
}

/// `out_dir/videos/<file name>`; the source directory layout is dropped.
pub fn video_output_path(relative_path: &Path, out_dir: &Path) -> Result<PathBuf> {
    let file_name = relative_path
        .file_name()
        .ok_or_else(|| anyhow!("video path {:?} has no file name", relative_path))?;
    Ok(out_dir.join(VIDEO_OUTPUT_DIR).join(file_name))
}

/// Full ffmpeg argument list for one transcode.
pub fn ffmpeg_args(input: &Path, output: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-nostdin", "-y", "-i"].into_iter().map(OsString::from).collect();
    args.push(input.as_os_str().to_owned());
    args.extend(
        [
            "-vf",
            VIDEO_SCALE_FILTER,
            "-c:v",
            VIDEO_CODEC,
            "-preset",
            VIDEO_PRESET,
            "-crf",
            VIDEO_CRF,
            "-b:v",
            VIDEO_BITRATE,
            "-c:a",
            AUDIO_CODEC,
            "-b:a",
            AUDIO_BITRATE,
            // Moves the moov atom to the front for progressive playback
            "-movflags",
            "+faststart",
            "-map_metadata",
            "0",
        ]
        .into_iter()
        .map(OsString::from),
    );
    args.push(output.as_os_str().to_owned());
    args
}

// ────────────────────────────────────────────────────────────────
// Low-level FFmpeg Tools
// ────────────────────────────────────────────────────────────────

fn compress_with_ffmpeg(input: &Path, output: &Path) -> Result<()> {
    let result = Command::new(FFMPEG_PROGRAM)
        .args(ffmpeg_args(input, output))
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .with_context(|| format!("failed to spawn {} for {:?}", FFMPEG_PROGRAM, input))?;

    if !result.status.success() {
        let code = result
            .status
            .code()
            .map_or_else(|| "none".to_string(), |code| code.to_string());
        return Err(anyhow!(
            "failed to transcode {:?}: {} exited with code {}: {}",
            input,
            FFMPEG_PROGRAM,
            code,
            stderr_tail(&String::from_utf8_lossy(&result.stderr))
        ));
    }

    Ok(())
}

/// Last few non-empty stderr lines joined on one line.
fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    let start = lines.len().saturating_sub(FFMPEG_STDERR_TAIL_LINES);
    lines[start..].join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::processors::file::partial_path;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn videos_are_flattened() {
        let out = Path::new("/archive__out");
        assert_eq!(
            video_output_path(Path::new("Photos from 2021/a.mp4"), out).unwrap(),
            PathBuf::from("/archive__out/videos/a.mp4")
        );
        assert_eq!(
            video_output_path(Path::new("Photos from 2022/b.mp4"), out).unwrap(),
            PathBuf::from("/archive__out/videos/b.mp4")
        );
    }

    #[test]
    fn argument_template_is_fixed() {
        let args = ffmpeg_args(Path::new("in dir/a.mov"), Path::new("out/.a.partial.mov"));
        let args: Vec<String> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();

        assert_eq!(
            args,
            [
                "-nostdin", "-y", "-i", "in dir/a.mov", "-vf", "scale=-2:720", "-c:v", "libx264",
                "-preset", "slow", "-crf", "28", "-b:v", "1M", "-c:a", "aac", "-b:a", "128k",
                "-movflags", "+faststart", "-map_metadata", "0", "out/.a.partial.mov",
            ]
        );
    }

    #[test]
    fn stderr_tail_keeps_last_lines() {
        let stderr = "a\n\nb\nc\nd\ne\nf\n  g  \n";
        assert_eq!(stderr_tail(stderr), "c | d | e | f | g");
    }

    #[test]
    fn existing_output_skips_transcoder() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out");
        fs::create_dir_all(out.join("videos")).unwrap();
        fs::write(out.join("videos/a.mp4"), b"done").unwrap();

        let outcome = process_video(Path::new("Photos from 2021/a.mp4"), dir.path(), &out).unwrap();

        assert_eq!(outcome, Outcome::SkippedExisting);
    }

    #[test]
    fn failed_transcode_is_reported() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out");
        let rel = Path::new("Photos from 2021/missing.mp4");

        // Fails whether ffmpeg is absent (spawn error) or present (bad input).
        let err = process_video(rel, dir.path(), &out).unwrap_err();

        assert!(format!("{:#}", err).contains("missing.mp4"));
        let output = out.join("videos/missing.mp4");
        assert!(!output.exists());
        assert!(!partial_path(&output).exists());
    }
}

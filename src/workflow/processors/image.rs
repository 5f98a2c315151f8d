//! Image processing module - handles all photo related logic
//!
//! Includes:
//! - Copy-through for non-JPEG formats
//! - JPEG decoding, Lanczos resize and re-encoding
//! - EXIF block extraction and re-attachment
//! - Size guard falling back to the original file

use crate::{
    common::{JPEG_EXTENSIONS, JPEG_MIN_SIDE, JPEG_QUALITY},
    utils::PathExt,
    workflow::{
        processors::file::{copy_atomically, prepare_output, write_atomically},
        types::Outcome,
    },
};
use anyhow::{Context, Result, bail};
use image::{
    DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat, codecs::jpeg::JpegEncoder,
    imageops::FilterType,
};
use log::{debug, info, warn};
use std::{fs, io::Cursor, path::Path};

const EXIF_HEADER: &[u8] = b"Exif\0\0";
const MARKER_APP0: u8 = 0xE0;
const MARKER_APP1: u8 = 0xE1;

// ────────────────────────────────────────────────────────────────
// Public API
// ────────────────────────────────────────────────────────────────

/// Write the reduced copy of one photo to `out_dir/relative_path`.
pub fn process_photo(relative_path: &Path, root: &Path, out_dir: &Path) -> Result<Outcome> {
    let input = root.join(relative_path);
    let output = out_dir.join(relative_path);

    if prepare_output(&output)? {
        return Ok(Outcome::SkippedExisting);
    }

    let ext = relative_path.ext_lower();
    if !JPEG_EXTENSIONS.contains(&ext.as_str()) {
        info!("Copying {}", input.display());
        copy_atomically(&input, &output)?;
        return Ok(Outcome::Copied);
    }

    info!("Compressing {}", input.display());
    let original =
        fs::read(&input).with_context(|| format!("failed to read file into memory: {:?}", input))?;
    let shrunk = shrink_jpeg(&original, JPEG_QUALITY, JPEG_MIN_SIDE)
        .with_context(|| format!("failed to shrink JPEG {:?}", input))?;

    if shrunk.len() > original.len() {
        info!("New file larger! Keeping original {}", input.display());
        copy_atomically(&input, &output)?;
        return Ok(Outcome::KeptOriginal);
    }

    write_atomically(&output, |partial| {
        fs::write(partial, &shrunk).with_context(|| format!("failed to write JPEG to {:?}", partial))
    })?;
    Ok(Outcome::Compressed)
}

/// Decode a JPEG, resize it so its shorter side is `min_side` and re-encode it
/// with the original EXIF block attached.
pub fn shrink_jpeg(bytes: &[u8], quality: u8, min_side: u32) -> Result<Vec<u8>> {
    let exif = read_exif_block(bytes);

    let dynamic_image = image::load_from_memory_with_format(bytes, ImageFormat::Jpeg)
        .context("image crate failed to decode JPEG from memory")?;

    let (width, height) =
        resized_width_height(dynamic_image.width(), dynamic_image.height(), min_side)?;
    debug!(
        "Resizing {}x{} to {}x{}",
        dynamic_image.width(),
        dynamic_image.height(),
        width,
        height
    );
    let resized = dynamic_image.resize_exact(width, height, FilterType::Lanczos3);

    let encoded = encode_jpeg(&resized, quality)?;
    Ok(attach_exif(encoded, &exif))
}

/// Scale `(width, height)` so the shorter side equals `min_side`.
///
/// The longer side is truncated, never rounded up.
pub fn resized_width_height(width: u32, height: u32, min_side: u32) -> Result<(u32, u32)> {
    if width == 0 || height == 0 {
        bail!("image has a zero dimension: {}x{}", width, height);
    }

    let scale = |longer: u32, shorter: u32| -> Result<u32> {
        let scaled = u64::from(min_side) * u64::from(longer) / u64::from(shorter);
        u32::try_from(scaled).context("resized dimension does not fit in u32")
    };

    if width < height {
        Ok((min_side, scale(height, width)?))
    } else {
        Ok((scale(width, height)?, min_side))
    }
}

// ────────────────────────────────────────────────────────────────
// EXIF Handling
// ────────────────────────────────────────────────────────────────

/// Raw TIFF payload of the EXIF APP1 segment, or empty when there is none.
fn read_exif_block(bytes: &[u8]) -> Vec<u8> {
    match exif::get_exif_attr_from_jpeg(&mut Cursor::new(bytes)) {
        Ok(block) => block,
        Err(exif::Error::NotFound(_)) => Vec::new(),
        Err(err) => {
            debug!("Ignoring unreadable EXIF block: {}", err);
            Vec::new()
        }
    }
}

/// Insert `exif` as an APP1 segment after SOI and any JFIF APP0 segment.
fn attach_exif(jpeg: Vec<u8>, exif: &[u8]) -> Vec<u8> {
    if exif.is_empty() {
        return jpeg;
    }

    let Ok(segment_len) = u16::try_from(2 + EXIF_HEADER.len() + exif.len()) else {
        warn!(
            "EXIF block of {} bytes does not fit in one JPEG segment, dropping it",
            exif.len()
        );
        return jpeg;
    };

    let insert_at = app1_insert_offset(&jpeg);
    let mut out = Vec::with_capacity(jpeg.len() + usize::from(segment_len) + 2);
    out.extend_from_slice(&jpeg[..insert_at]);
    out.extend_from_slice(&[0xFF, MARKER_APP1]);
    out.extend_from_slice(&segment_len.to_be_bytes());
    out.extend_from_slice(EXIF_HEADER);
    out.extend_from_slice(exif);
    out.extend_from_slice(&jpeg[insert_at..]);
    out
}

fn app1_insert_offset(jpeg: &[u8]) -> usize {
    if jpeg.len() >= 6 && jpeg[2] == 0xFF && jpeg[3] == MARKER_APP0 {
        let app0_len = usize::from(u16::from_be_bytes([jpeg[4], jpeg[5]]));
        (4 + app0_len).min(jpeg.len())
    } else {
        2.min(jpeg.len())
    }
}

// ────────────────────────────────────────────────────────────────
// Encoding
// ────────────────────────────────────────────────────────────────

fn encode_jpeg(dynamic_image: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);

    match dynamic_image {
        DynamicImage::ImageLuma8(gray) => encoder.write_image(
            gray.as_raw(),
            gray.width(),
            gray.height(),
            ExtendedColorType::L8,
        ),
        _ => {
            let rgb = dynamic_image.to_rgb8();
            encoder.write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
        }
    }
    .context("failed to encode JPEG")?;

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::processors::file::partial_path;
    use image::{Rgb, RgbImage};
    use tempfile::tempdir;

    /// Minimal little-endian TIFF header with an empty IFD.
    const TIFF: &[u8] = &[
        0x49, 0x49, 0x2A, 0x00, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    ];

    fn noisy_jpeg(width: u32, height: u32, quality: u8) -> Vec<u8> {
        let mut state: u32 = 0x1234_5678;
        let img = RgbImage::from_fn(width, height, |_, _| {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            let [r, g, b, _] = state.to_le_bytes();
            Rgb([r, g, b])
        });
        encode_jpeg(&DynamicImage::ImageRgb8(img), quality).unwrap()
    }

    fn gradient_jpeg(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x * 20) as u8, (y * 20) as u8, 128]));
        encode_jpeg(&DynamicImage::ImageRgb8(img), 50).unwrap()
    }

    #[test]
    fn shorter_side_becomes_min_side() {
        assert_eq!(resized_width_height(2000, 1000, 1000).unwrap(), (2000, 1000));
        assert_eq!(resized_width_height(1000, 2000, 1000).unwrap(), (1000, 2000));
        assert_eq!(resized_width_height(4032, 3024, 1000).unwrap(), (1333, 1000));
        assert_eq!(resized_width_height(3000, 4000, 1000).unwrap(), (1000, 1333));
        assert_eq!(resized_width_height(500, 500, 1000).unwrap(), (1000, 1000));
        assert_eq!(resized_width_height(300, 200, 1000).unwrap(), (1500, 1000));
        assert!(resized_width_height(0, 10, 1000).is_err());
    }

    #[test]
    fn exif_block_survives_reencoding() {
        let with_exif = attach_exif(gradient_jpeg(40, 30), TIFF);
        assert_eq!(read_exif_block(&with_exif), TIFF);

        let shrunk = shrink_jpeg(&with_exif, JPEG_QUALITY, JPEG_MIN_SIDE).unwrap();

        assert_eq!(read_exif_block(&shrunk), TIFF);
        let decoded = image::load_from_memory_with_format(&shrunk, ImageFormat::Jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (1333, 1000));
    }

    #[test]
    fn missing_exif_stays_missing() {
        let shrunk = shrink_jpeg(&gradient_jpeg(20, 20), JPEG_QUALITY, 100).unwrap();
        assert!(read_exif_block(&shrunk).is_empty());
    }

    #[test]
    fn large_jpeg_is_compressed() {
        let dir = tempdir().unwrap();
        let (root, out) = (dir.path().join("root"), dir.path().join("out"));
        let rel = Path::new("Photos from 2021/IMG_1.jpg");
        let original = noisy_jpeg(1600, 1200, 100);
        fs::create_dir_all(root.join("Photos from 2021")).unwrap();
        fs::write(root.join(rel), &original).unwrap();

        let outcome = process_photo(rel, &root, &out).unwrap();

        assert_eq!(outcome, Outcome::Compressed);
        let written = out.join(rel);
        assert!(fs::metadata(&written).unwrap().len() < original.len() as u64);
        assert_eq!(image::image_dimensions(&written).unwrap(), (1333, 1000));
        assert!(!partial_path(&written).exists());
    }

    #[test]
    fn larger_reencode_falls_back_to_original() {
        let dir = tempdir().unwrap();
        let (root, out) = (dir.path().join("root"), dir.path().join("out"));
        let rel = Path::new("tiny.JPEG");
        let original = gradient_jpeg(8, 8);
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join(rel), &original).unwrap();

        let outcome = process_photo(rel, &root, &out).unwrap();

        assert_eq!(outcome, Outcome::KeptOriginal);
        assert_eq!(fs::read(out.join(rel)).unwrap(), original);
    }

    #[test]
    fn second_run_skips_existing_output() {
        let dir = tempdir().unwrap();
        let (root, out) = (dir.path().join("root"), dir.path().join("out"));
        let rel = Path::new("a.jpg");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join(rel), gradient_jpeg(8, 8)).unwrap();

        process_photo(rel, &root, &out).unwrap();
        let first = fs::read(out.join(rel)).unwrap();
        // Corrupting the source proves the codec is not run again.
        fs::write(root.join(rel), b"not a jpeg").unwrap();

        assert_eq!(process_photo(rel, &root, &out).unwrap(), Outcome::SkippedExisting);
        assert_eq!(fs::read(out.join(rel)).unwrap(), first);
    }

    #[test]
    fn empty_output_is_reprocessed() {
        let dir = tempdir().unwrap();
        let (root, out) = (dir.path().join("root"), dir.path().join("out"));
        let rel = Path::new("a.png");
        fs::create_dir_all(&root).unwrap();
        fs::create_dir_all(&out).unwrap();
        fs::write(root.join(rel), b"png-bytes").unwrap();
        fs::write(out.join(rel), b"").unwrap();

        assert_eq!(process_photo(rel, &root, &out).unwrap(), Outcome::Copied);
        assert_eq!(fs::read(out.join(rel)).unwrap(), b"png-bytes");
    }

    #[test]
    fn corrupt_jpeg_is_an_error_without_output() {
        let dir = tempdir().unwrap();
        let (root, out) = (dir.path().join("root"), dir.path().join("out"));
        let rel = Path::new("broken.jpg");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join(rel), b"\xFF\xD8 definitely not a jpeg").unwrap();

        let err = process_photo(rel, &root, &out).unwrap_err();

        assert!(format!("{:#}", err).contains("broken.jpg"));
        assert!(!out.join(rel).exists());
        assert!(!partial_path(&out.join(rel)).exists());
    }
}

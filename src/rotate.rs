//! Rotation operator.
//!
//! Rotates a source image in place by a quarter-turn, then regenerates its
//! cached thumbnail so the next read can never pick up a stale rendition.
//!
//! In-place mutation makes the source a single-writer-at-a-time resource: a
//! process-wide mutex keyed by the source's cache digest serializes
//! concurrent rotations of the same file, while rotations of different
//! sources proceed in parallel. The lock covers the whole
//! decode-rotate-encode-write-regenerate sequence.
//!
//! The source file is only ever replaced wholesale after a successful
//! encode, via a temp-file-then-rename write — a failure at any earlier
//! step leaves the original bytes untouched.

use crate::cache_key::{normalize_rel_path, source_digest};
use crate::config::ThumbOptions;
use crate::error::PipelineError;
use crate::imaging::{PixelBackend, Quality, Rotation, SourceFormat};
use crate::thumbs;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, LazyLock, Mutex};

/// JPEG quality for re-encoded rotated sources. Other formats use their
/// lossless/default encoders and ignore this.
const ROTATE_JPEG_QUALITY: u32 = 92;

static ROTATE_LOCKS: LazyLock<Mutex<HashMap<String, Arc<Mutex<()>>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

fn lock_for(key: &str) -> Arc<Mutex<()>> {
    let mut map = ROTATE_LOCKS.lock().unwrap();
    map.entry(key.to_string())
        .or_insert_with(|| Arc::new(Mutex::new(())))
        .clone()
}

/// Rotate a source image in place by ±90° and regenerate its thumbnail.
///
/// The source must exist and sniff as one of the supported raster formats;
/// it is re-encoded in that same format. On any failure the file is left
/// byte-for-byte as it was.
pub fn rotate_in_place(
    backend: &impl PixelBackend,
    root: &Path,
    source_rel: &str,
    rotation: Rotation,
) -> Result<(), PipelineError> {
    let normalized = normalize_rel_path(source_rel);
    let source_abs = root.join(&normalized);
    if normalized.is_empty() || !source_abs.is_file() {
        return Err(PipelineError::SourceNotFound(source_abs));
    }

    let lock = lock_for(&source_digest(&normalized));
    let _guard = lock.lock().unwrap();

    let bytes = std::fs::read(&source_abs)?;
    let format = image::guess_format(&bytes)
        .ok()
        .and_then(SourceFormat::from_image_format)
        .ok_or_else(|| PipelineError::UnsupportedFormat(normalized.clone()))?;

    let img = backend.decode(&source_abs)?;
    let rotated = backend.rotate(img, rotation);
    let encoded = backend.encode(&rotated, format, Quality::new(ROTATE_JPEG_QUALITY))?;

    thumbs::write_atomic(&source_abs, &encoded)?;
    tracing::info!(
        source = %normalized,
        degrees = rotation.degrees(),
        format = format.mime(),
        "source rotated in place"
    );

    // Regenerate rather than merely invalidate: a concurrent read-through
    // request could otherwise re-cache the pre-rotation pixels.
    thumbs::regenerate_thumbnail(backend, root, &normalized, &ThumbOptions::default());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache_key::artifact_rel_path;
    use crate::imaging::MinimalBackend;
    use crate::imaging::backend::tests::MockBackend;
    use image::ImageEncoder;
    use tempfile::TempDir;

    fn create_test_jpeg(path: &Path, width: u32, height: u32) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let img = image::RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let file = std::fs::File::create(path).unwrap();
        let writer = std::io::BufWriter::new(file);
        image::codecs::jpeg::JpegEncoder::new(writer)
            .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
            .unwrap();
    }

    fn create_test_png(path: &Path, width: u32, height: u32) -> image::RgbImage {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let img = image::RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x * 17 % 256) as u8, (y * 23 % 256) as u8, 77])
        });
        img.save(path).unwrap();
        img
    }

    #[test]
    fn missing_source_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::new();
        let result = rotate_in_place(&backend, tmp.path(), "photos/gone.jpg", Rotation::Right90);
        assert!(matches!(result, Err(PipelineError::SourceNotFound(_))));
    }

    #[test]
    fn unsupported_format_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let rel = "photos/readme.jpg";
        let abs = tmp.path().join(rel);
        std::fs::create_dir_all(abs.parent().unwrap()).unwrap();
        std::fs::write(&abs, b"plain text masquerading as an image").unwrap();

        let backend = MockBackend::new();
        let result = rotate_in_place(&backend, tmp.path(), rel, Rotation::Right90);
        assert!(matches!(result, Err(PipelineError::UnsupportedFormat(_))));
        // Untouched
        assert_eq!(
            std::fs::read(&abs).unwrap(),
            b"plain text masquerading as an image"
        );
    }

    #[test]
    fn encode_failure_leaves_source_untouched() {
        let tmp = TempDir::new().unwrap();
        let rel = "photos/a.jpg";
        let abs = tmp.path().join(rel);
        create_test_jpeg(&abs, 40, 30);
        let before = std::fs::read(&abs).unwrap();

        let backend = MockBackend::failing_encode();
        let result = rotate_in_place(&backend, tmp.path(), rel, Rotation::Right90);
        assert!(matches!(result, Err(PipelineError::Encode(_))));
        assert_eq!(std::fs::read(&abs).unwrap(), before, "byte-for-byte identical");
    }

    #[test]
    fn decode_failure_leaves_source_untouched() {
        let tmp = TempDir::new().unwrap();
        let rel = "photos/a.jpg";
        let abs = tmp.path().join(rel);
        create_test_jpeg(&abs, 40, 30);
        let before = std::fs::read(&abs).unwrap();

        let backend = MockBackend::failing_decode();
        let result = rotate_in_place(&backend, tmp.path(), rel, Rotation::Right90);
        assert!(matches!(result, Err(PipelineError::Decode(_))));
        assert_eq!(std::fs::read(&abs).unwrap(), before);
    }

    #[test]
    fn rotation_swaps_dimensions_and_preserves_format() {
        let tmp = TempDir::new().unwrap();
        let rel = "photos/a.png";
        let abs = tmp.path().join(rel);
        create_test_png(&abs, 40, 30);

        let backend = MinimalBackend::new();
        rotate_in_place(&backend, tmp.path(), rel, Rotation::Right90).unwrap();

        let bytes = std::fs::read(&abs).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), image::ImageFormat::Png);
        let img = image::load_from_memory(&bytes).unwrap();
        assert_eq!((img.width(), img.height()), (30, 40));
    }

    #[test]
    fn four_right_rotations_restore_png_pixels_exactly() {
        let tmp = TempDir::new().unwrap();
        let rel = "photos/a.png";
        let abs = tmp.path().join(rel);
        let original = create_test_png(&abs, 20, 14);

        let backend = MinimalBackend::new();
        for _ in 0..4 {
            rotate_in_place(&backend, tmp.path(), rel, Rotation::Right90).unwrap();
        }

        let img = image::open(&abs).unwrap().to_rgb8();
        assert_eq!(img, original, "lossless format round-trips exactly");
    }

    #[test]
    fn left_rotation_is_counter_clockwise() {
        let tmp = TempDir::new().unwrap();
        let rel = "photos/a.png";
        let abs = tmp.path().join(rel);

        // 2x1: red then green
        let mut src = image::RgbImage::new(2, 1);
        src.put_pixel(0, 0, image::Rgb([255, 0, 0]));
        src.put_pixel(1, 0, image::Rgb([0, 255, 0]));
        std::fs::create_dir_all(abs.parent().unwrap()).unwrap();
        src.save(&abs).unwrap();

        let backend = MinimalBackend::new();
        rotate_in_place(&backend, tmp.path(), rel, Rotation::Left90).unwrap();

        // Counter-clockwise puts the rightmost pixel on top
        let img = image::open(&abs).unwrap().to_rgb8();
        assert_eq!(img.get_pixel(0, 0).0, [0, 255, 0]);
        assert_eq!(img.get_pixel(0, 1).0, [255, 0, 0]);
    }

    #[test]
    fn successful_rotation_regenerates_thumbnail() {
        let tmp = TempDir::new().unwrap();
        let rel = "photos/a.jpg";
        create_test_jpeg(&tmp.path().join(rel), 64, 48);

        let backend = MinimalBackend::new();
        let artifact_abs = tmp.path().join(artifact_rel_path(rel));
        assert!(!artifact_abs.exists());

        rotate_in_place(&backend, tmp.path(), rel, Rotation::Right90).unwrap();

        assert!(artifact_abs.exists(), "thumbnail regenerated eagerly");
        let thumb = image::open(&artifact_abs).unwrap();
        // Rotated source is 48x64 portrait; thumbnail follows suit
        assert!(thumb.height() > thumb.width());
    }

    #[test]
    fn concurrent_rotations_of_one_source_serialize() {
        let tmp = TempDir::new().unwrap();
        let rel = "photos/contended.png";
        create_test_png(&tmp.path().join(rel), 12, 8);

        let backend = MinimalBackend::new();
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    rotate_in_place(&backend, tmp.path(), rel, Rotation::Right90).unwrap();
                });
            }
        });

        // Four quarter-turns in some serialized order: dimensions restored
        let img = image::open(tmp.path().join(rel)).unwrap();
        assert_eq!((img.width(), img.height()), (12, 8));
    }
}

//! End-to-end pipeline scenario through the public API.
//!
//! Exercises the full thumbnail lifecycle — cold generation, cache hit,
//! touch-and-regenerate — plus rotation and watermarking against the real
//! minimal backend, which is always available.

use gallery_media::cache_key::artifact_rel_path;
use gallery_media::config::{ThumbOptions, WatermarkSettings};
use gallery_media::imaging::{MinimalBackend, Rotation};
use gallery_media::{rotate, thumbs, watermark};
use std::path::Path;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

fn create_jpeg(path: &Path, width: u32, height: u32) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    img.save(path).unwrap();
}

fn mtime(path: &Path) -> SystemTime {
    std::fs::metadata(path).unwrap().modified().unwrap()
}

fn set_mtime(path: &Path, time: SystemTime) {
    let file = std::fs::OpenOptions::new().write(true).open(path).unwrap();
    file.set_modified(time).unwrap();
}

#[test]
fn thumbnail_lifecycle_end_to_end() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    let rel = "photos/section_3/sunset.jpg";
    let source_abs = root.join(rel);
    create_jpeg(&source_abs, 800, 600);

    let backend = MinimalBackend::new();
    let opts = ThumbOptions::default();

    // Cold request: artifact generated at the digest path
    let artifact = thumbs::ensure_thumbnail(&backend, root, rel, &opts).expect("artifact");
    assert_eq!(artifact, artifact_rel_path(rel));
    let artifact_abs = root.join(&artifact);
    assert!(artifact_abs.exists());
    assert!(mtime(&artifact_abs) >= mtime(&source_abs));

    // Bounded dimensions, proportional sides
    let thumb = image::open(&artifact_abs).unwrap();
    assert_eq!((thumb.width(), thumb.height()), (480, 360));

    // Unchanged source: same path back, artifact untouched
    let first_mtime = mtime(&artifact_abs);
    let again = thumbs::ensure_thumbnail(&backend, root, rel, &opts).unwrap();
    assert_eq!(again, artifact);
    assert_eq!(mtime(&artifact_abs), first_mtime);

    // Touched source: regenerated at the same path with a newer mtime
    let bumped = SystemTime::now() + Duration::from_secs(60);
    set_mtime(&source_abs, bumped);
    let regenerated = thumbs::ensure_thumbnail(&backend, root, rel, &opts).unwrap();
    assert_eq!(regenerated, artifact, "path is stable across regeneration");
    assert!(mtime(&artifact_abs) > first_mtime, "artifact was re-encoded");

    // Deleting the source makes the thumbnail unavailable, not an error
    std::fs::remove_file(&source_abs).unwrap();
    assert_eq!(thumbs::ensure_thumbnail(&backend, root, rel, &opts), None);

    // And the orphaned artifact can be cleaned up explicitly
    thumbs::delete_artifact(root, rel);
    assert!(!artifact_abs.exists());
}

#[test]
fn rotation_feeds_the_thumbnail_cache() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    let rel = "photos/section_1/pier.jpg";
    create_jpeg(&root.join(rel), 640, 480);

    let backend = MinimalBackend::new();
    let opts = ThumbOptions::default();

    let artifact = thumbs::ensure_thumbnail(&backend, root, rel, &opts).unwrap();
    let landscape = image::open(root.join(&artifact)).unwrap();
    assert!(landscape.width() > landscape.height());

    rotate::rotate_in_place(&backend, root, rel, Rotation::Right90).unwrap();

    // The rotated source swapped dimensions...
    let source = image::open(root.join(rel)).unwrap();
    assert_eq!((source.width(), source.height()), (480, 640));

    // ...and the cached thumbnail was refreshed without another ensure call
    let portrait = image::open(root.join(&artifact)).unwrap();
    assert!(portrait.height() > portrait.width());
}

#[test]
fn watermark_round_trip_with_settings_file() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    let rel = "photos/section_2/harbor.jpg";
    create_jpeg(&root.join(rel), 300, 200);

    std::fs::write(
        root.join("settings.toml"),
        "watermark_text = \"harbor.example\"\nwatermark_brightness = 60\nwatermark_angle = -15\n",
    )
    .unwrap();
    let settings = WatermarkSettings::load(root);
    assert_eq!(settings.text, "harbor.example");

    let backend = MinimalBackend::new();
    let bytes = watermark::render_watermarked(&backend, root, rel, &settings).unwrap();

    // Always a decodable JPEG at source dimensions, visibly stamped
    assert_eq!(
        image::guess_format(&bytes).unwrap(),
        image::ImageFormat::Jpeg
    );
    let stamped = image::load_from_memory(&bytes).unwrap();
    assert_eq!((stamped.width(), stamped.height()), (300, 200));

    let plain = image::open(root.join(rel)).unwrap().to_rgb8();
    assert_ne!(stamped.to_rgb8(), plain);
}

#[test]
fn watermark_never_blocks_delivery() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    let rel = "photos/section_2/broken.jpg";
    let abs = root.join(rel);
    std::fs::create_dir_all(abs.parent().unwrap()).unwrap();
    std::fs::write(&abs, b"\xff\xd8\xff\xe0 truncated jpeg").unwrap();

    let backend = MinimalBackend::new();
    let bytes =
        watermark::render_watermarked(&backend, root, rel, &WatermarkSettings::default()).unwrap();
    assert_eq!(bytes, b"\xff\xd8\xff\xe0 truncated jpeg");
}

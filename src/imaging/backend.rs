//! Pixel-operation backend trait, runtime capability selection, and shared
//! encoding helpers.
//!
//! The [`PixelBackend`] trait defines the five operations every backend must
//! support: decode, resize_to_fit, rotate, draw_tiled_text, and encode.
//!
//! Two implementations exist:
//! [`FullBackend`](super::full_backend::FullBackend) — orientation-metadata
//! normalization and anti-aliased scalable-font text — and
//! [`MinimalBackend`](super::minimal_backend::MinimalBackend) — plain raster
//! operations with a bitmap font. [`selected_backend`] probes once per
//! process and every caller goes through the same selected variant, so a
//! given operation never mixes capability assumptions between calls.

use super::full_backend::FullBackend;
use super::minimal_backend::MinimalBackend;
use super::params::{Quality, Rotation, SourceFormat, TextOverlay};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType};
use std::io::Cursor;
use std::path::Path;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("encode failed: {0}")]
    Encode(String),
}

/// Which feature set the selected backend provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Orientation normalization, anti-aliased text, layer compositing.
    FullFeatured,
    /// Plain raster operations; no metadata handling, bitmap-font text.
    MinimalFallback,
}

/// Trait for pixel-operation backends.
///
/// Every backend must implement all five operations so the pipeline modules
/// are backend-agnostic. The backends must approximate the same visual
/// intent for each operation but are permitted to differ in anti-aliasing
/// quality and glyph metrics — a documented discrepancy, not a bug.
pub trait PixelBackend: Sync {
    fn capability(&self) -> Capability;

    /// Decode a source file into pixels. The full-featured backend applies
    /// any embedded orientation metadata during decode, so downstream
    /// operations always see upright pixels; the minimal backend decodes
    /// pixels as stored.
    fn decode(&self, path: &Path) -> Result<DynamicImage, BackendError>;

    /// Scale to fit within `max_w` × `max_h`, preserving aspect ratio and
    /// never upscaling.
    fn resize_to_fit(&self, img: &DynamicImage, max_w: u32, max_h: u32) -> DynamicImage;

    /// Rotate by exactly the requested quarter-turn. Orientation metadata
    /// was already normalized at decode time where supported; re-encoding
    /// writes no metadata, so repeated rotations cannot compound a stale
    /// orientation tag.
    fn rotate(&self, img: DynamicImage, rotation: Rotation) -> DynamicImage;

    /// Overlay the given text repeated in a grid across the full canvas, at
    /// the overlay's opacity and tilt, sized proportionally to image width.
    fn draw_tiled_text(&self, img: DynamicImage, overlay: &TextOverlay) -> DynamicImage;

    /// Encode to the given container. JPEG honors `quality`; PNG, GIF and
    /// WEBP use their lossless/default encoders.
    fn encode(
        &self,
        img: &DynamicImage,
        format: SourceFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, BackendError>;
}

/// The backend chosen at process start, dispatching to one of the two
/// concrete implementations.
pub enum SelectedBackend {
    Full(FullBackend),
    Minimal(MinimalBackend),
}

impl PixelBackend for SelectedBackend {
    fn capability(&self) -> Capability {
        match self {
            Self::Full(b) => b.capability(),
            Self::Minimal(b) => b.capability(),
        }
    }

    fn decode(&self, path: &Path) -> Result<DynamicImage, BackendError> {
        match self {
            Self::Full(b) => b.decode(path),
            Self::Minimal(b) => b.decode(path),
        }
    }

    fn resize_to_fit(&self, img: &DynamicImage, max_w: u32, max_h: u32) -> DynamicImage {
        match self {
            Self::Full(b) => b.resize_to_fit(img, max_w, max_h),
            Self::Minimal(b) => b.resize_to_fit(img, max_w, max_h),
        }
    }

    fn rotate(&self, img: DynamicImage, rotation: Rotation) -> DynamicImage {
        match self {
            Self::Full(b) => b.rotate(img, rotation),
            Self::Minimal(b) => b.rotate(img, rotation),
        }
    }

    fn draw_tiled_text(&self, img: DynamicImage, overlay: &TextOverlay) -> DynamicImage {
        match self {
            Self::Full(b) => b.draw_tiled_text(img, overlay),
            Self::Minimal(b) => b.draw_tiled_text(img, overlay),
        }
    }

    fn encode(
        &self,
        img: &DynamicImage,
        format: SourceFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, BackendError> {
        match self {
            Self::Full(b) => b.encode(img, format, quality),
            Self::Minimal(b) => b.encode(img, format, quality),
        }
    }
}

/// Probe once and return the process-wide backend.
///
/// The full-featured backend needs a scalable font for its text rendering;
/// if none can be found the minimal backend serves for the remainder of the
/// process. There is no per-call re-probing.
pub fn selected_backend() -> &'static SelectedBackend {
    static BACKEND: OnceLock<SelectedBackend> = OnceLock::new();
    BACKEND.get_or_init(|| match FullBackend::probe() {
        Some(backend) => {
            tracing::info!("full-featured image backend selected");
            SelectedBackend::Full(backend)
        }
        None => {
            tracing::warn!("no scalable font found, falling back to minimal image backend");
            SelectedBackend::Minimal(MinimalBackend::new())
        }
    })
}

/// Encode a raster into the given container. Shared by both backends — the
/// capability difference is in pixel production, not in container writing.
pub(crate) fn encode_raster(
    img: &DynamicImage,
    format: SourceFormat,
    quality: Quality,
) -> Result<Vec<u8>, BackendError> {
    let mut buffer = Vec::new();
    match format {
        SourceFormat::Jpeg => {
            let rgb = img.to_rgb8();
            let (width, height) = rgb.dimensions();
            let mut encoder =
                JpegEncoder::new_with_quality(Cursor::new(&mut buffer), quality.value() as u8);
            encoder
                .encode(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
                .map_err(|e| BackendError::Encode(format!("JPEG encode failed: {e}")))?;
        }
        SourceFormat::Png => {
            img.write_to(&mut Cursor::new(&mut buffer), format.image_format())
                .map_err(|e| BackendError::Encode(format!("PNG encode failed: {e}")))?;
        }
        SourceFormat::Gif | SourceFormat::Webp => {
            // These encoders accept RGB8/RGBA8 only; normalize first.
            let rgba = DynamicImage::ImageRgba8(img.to_rgba8());
            rgba.write_to(&mut Cursor::new(&mut buffer), format.image_format())
                .map_err(|e| BackendError::Encode(format!("{format:?} encode failed: {e}")))?;
        }
    }
    Ok(buffer)
}

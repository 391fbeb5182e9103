//! Full-featured pixel backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, GIF, WebP) | `image` crate (pure Rust decoders) |
//! | Orientation normalization | `kamadak-exif` tag read + `image` flips/rotations |
//! | Resize | Lanczos3 filter |
//! | Tiled text | `ab_glyph` rasterization via `imageproc::drawing`, tile tilted with `rotate_about_center`, alpha-composited with `imageops::overlay` |
//!
//! The distinguishing requirement is a scalable font: [`FullBackend::probe`]
//! looks for one at process start, and when none is found the
//! [minimal backend](super::minimal_backend) serves instead.

use super::backend::{BackendError, Capability, PixelBackend, encode_raster};
use super::calculations::{tile_steps, watermark_glyph_px};
use super::params::{Quality, Rotation, SourceFormat, TextOverlay};
use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader, Rgba, RgbaImage, imageops};
use imageproc::drawing::draw_text_mut;
use imageproc::geometric_transformations::{Interpolation, rotate_about_center};
use std::path::{Path, PathBuf};

/// Well-known scalable font locations, tried in order after the
/// `GALLERY_MEDIA_FONT` override.
const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Backend with orientation normalization and anti-aliased text.
pub struct FullBackend {
    font: FontVec,
}

impl FullBackend {
    /// Look for a usable scalable font. `None` means this backend is
    /// unavailable and the caller should fall back to the minimal one.
    pub fn probe() -> Option<Self> {
        let mut candidates: Vec<PathBuf> = Vec::new();
        if let Ok(path) = std::env::var("GALLERY_MEDIA_FONT") {
            candidates.push(PathBuf::from(path));
        }
        candidates.extend(FONT_CANDIDATES.iter().copied().map(PathBuf::from));

        for path in candidates {
            if let Ok(bytes) = std::fs::read(&path)
                && let Ok(font) = FontVec::try_from_vec(bytes)
            {
                tracing::debug!(font = %path.display(), "scalable font found");
                return Some(Self { font });
            }
        }
        None
    }
}

/// Read the EXIF orientation tag, defaulting to 1 (normal) when the file has
/// no metadata or the container cannot carry any.
fn read_orientation(path: &Path) -> u32 {
    let Ok(file) = std::fs::File::open(path) else {
        return 1;
    };
    let mut reader = std::io::BufReader::new(file);
    match exif::Reader::new().read_from_container(&mut reader) {
        Ok(meta) => meta
            .get_field(exif::Tag::Orientation, exif::In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .unwrap_or(1),
        Err(_) => 1,
    }
}

/// Apply an EXIF orientation value (1-8) so pixels end up upright.
/// Unknown values are left untouched.
pub(crate) fn apply_orientation(img: DynamicImage, orientation: u32) -> DynamicImage {
    match orientation {
        2 => img.fliph(),
        3 => img.rotate180(),
        4 => img.flipv(),
        5 => img.rotate90().fliph(),
        6 => img.rotate90(),
        7 => img.rotate270().fliph(),
        8 => img.rotate270(),
        _ => img,
    }
}

impl PixelBackend for FullBackend {
    fn capability(&self) -> Capability {
        Capability::FullFeatured
    }

    fn decode(&self, path: &Path) -> Result<DynamicImage, BackendError> {
        let img = ImageReader::open(path)
            .map_err(BackendError::Io)?
            .with_guessed_format()
            .map_err(BackendError::Io)?
            .decode()
            .map_err(|e| {
                BackendError::Decode(format!("failed to decode {}: {e}", path.display()))
            })?;
        Ok(apply_orientation(img, read_orientation(path)))
    }

    fn resize_to_fit(&self, img: &DynamicImage, max_w: u32, max_h: u32) -> DynamicImage {
        let (w, h) = super::fit_within((img.width(), img.height()), (max_w, max_h));
        if (w, h) == (img.width(), img.height()) {
            return img.clone();
        }
        img.resize_exact(w, h, FilterType::Lanczos3)
    }

    fn rotate(&self, img: DynamicImage, rotation: Rotation) -> DynamicImage {
        match rotation {
            Rotation::Left90 => img.rotate270(),
            Rotation::Right90 => img.rotate90(),
        }
    }

    fn draw_tiled_text(&self, img: DynamicImage, overlay: &TextOverlay) -> DynamicImage {
        let text = overlay.text.trim();
        if text.is_empty() || overlay.opacity <= f32::EPSILON {
            return img;
        }

        let (img_w, img_h) = (img.width(), img.height());
        let glyph_px = watermark_glyph_px(img_w) as f32;
        let scale = PxScale::from(glyph_px);
        let scaled = self.font.as_scaled(scale);

        let text_w = text
            .chars()
            .map(|c| scaled.h_advance(scaled.glyph_id(c)))
            .sum::<f32>()
            .ceil()
            .max(1.0) as u32;
        let text_h = scaled.height().ceil().max(1.0) as u32;

        // Rasterize one tilted tile, then stamp it across the canvas. The
        // tile is padded to the text box diagonal so rotation never clips.
        let diag = ((text_w as f64).hypot(text_h as f64).ceil()) as u32 + 2;
        let alpha = (overlay.opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
        let mut tile = RgbaImage::new(diag, diag);
        draw_text_mut(
            &mut tile,
            Rgba([255, 255, 255, alpha]),
            ((diag - text_w) / 2) as i32,
            ((diag - text_h) / 2) as i32,
            scale,
            &self.font,
            text,
        );
        let tile = rotate_about_center(
            &tile,
            overlay.angle_degrees.to_radians(),
            Interpolation::Bilinear,
            Rgba([0, 0, 0, 0]),
        );

        let (step_x, step_y) = tile_steps(text_w, text_h);
        let mut canvas = img.to_rgba8();
        let mut y = -(diag as i64);
        while y < img_h as i64 {
            let mut x = -(diag as i64);
            while x < img_w as i64 {
                imageops::overlay(&mut canvas, &tile, x, y);
                x += step_x as i64;
            }
            y += step_y as i64;
        }
        DynamicImage::ImageRgba8(canvas)
    }

    fn encode(
        &self,
        img: &DynamicImage,
        format: SourceFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, BackendError> {
        encode_raster(img, format, quality)
    }
}

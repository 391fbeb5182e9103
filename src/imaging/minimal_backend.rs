//! Minimal raster fallback backend.
//!
//! Covers the same operations as the [full backend](super::full_backend)
//! with a reduced feature set: no orientation metadata handling, and
//! watermark text rendered from 8×8 bitmap glyphs scaled nearest-neighbor
//! instead of anti-aliased outlines. Always available — it needs nothing
//! beyond the decoders compiled into the binary.

use super::backend::{BackendError, Capability, PixelBackend, encode_raster};
use super::calculations::{tile_steps, watermark_glyph_px};
use super::params::{Quality, Rotation, SourceFormat, TextOverlay};
use font8x8::{BASIC_FONTS, UnicodeFonts};
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader, Rgba};
use std::path::Path;

/// Backend using plain `image` crate operations and a bitmap font.
#[derive(Default)]
pub struct MinimalBackend;

impl MinimalBackend {
    pub fn new() -> Self {
        Self
    }
}

/// Scaled-up bitmap glyph pixels for a text run.
///
/// Returns the lit pixel positions relative to the text box origin plus the
/// box dimensions. Glyphs outside the basic set render as `?`.
fn build_text_bitmap(text: &str, scale: u32) -> (Vec<(i32, i32)>, u32, u32) {
    let scale = scale.max(1);
    let glyph_gap = scale;
    let mut cursor_x: u32 = 0;
    let mut pixels: Vec<(i32, i32)> = Vec::new();

    let total = text.chars().count();
    for (idx, ch) in text.chars().enumerate() {
        let glyph = BASIC_FONTS
            .get(ch)
            .unwrap_or_else(|| BASIC_FONTS.get('?').unwrap());
        for (row, bits) in glyph.iter().enumerate() {
            for col in 0..8u32 {
                if (bits >> col) & 1 == 0 {
                    continue;
                }
                let base_x = (cursor_x + col * scale) as i32;
                let base_y = (row as u32 * scale) as i32;
                for dx in 0..scale {
                    for dy in 0..scale {
                        pixels.push((base_x + dx as i32, base_y + dy as i32));
                    }
                }
            }
        }
        cursor_x += 8 * scale + glyph_gap;
        if idx + 1 == total {
            cursor_x -= glyph_gap;
        }
    }

    (pixels, cursor_x.max(1), 8 * scale)
}

impl PixelBackend for MinimalBackend {
    fn capability(&self) -> Capability {
        Capability::MinimalFallback
    }

    fn decode(&self, path: &Path) -> Result<DynamicImage, BackendError> {
        ImageReader::open(path)
            .map_err(BackendError::Io)?
            .with_guessed_format()
            .map_err(BackendError::Io)?
            .decode()
            .map_err(|e| BackendError::Decode(format!("failed to decode {}: {e}", path.display())))
    }

    fn resize_to_fit(&self, img: &DynamicImage, max_w: u32, max_h: u32) -> DynamicImage {
        let (w, h) = super::fit_within((img.width(), img.height()), (max_w, max_h));
        if (w, h) == (img.width(), img.height()) {
            return img.clone();
        }
        img.resize_exact(w, h, FilterType::Triangle)
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
        let glyph_px = watermark_glyph_px(img_w);
        let (bitmap, text_w, text_h) = build_text_bitmap(text, glyph_px / 8);

        let alpha = (overlay.opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
        let (step_x, step_y) = tile_steps(text_w, text_h);

        // Each tile is tilted around its own center; nearest-neighbor pixel
        // mapping, no anti-aliasing.
        let theta = overlay.angle_degrees.to_radians();
        let (sin_t, cos_t) = theta.sin_cos();
        let center_x = text_w as f32 / 2.0;
        let center_y = text_h as f32 / 2.0;
        let pad = (text_w + text_h) as i32;

        let mut canvas = img.to_rgba8();
        let inv = 255u16 - alpha as u16;
        let blend = |dst_c: u8| -> u8 {
            ((dst_c as u16 * inv + 255u16 * alpha as u16) / 255) as u8
        };

        for base_y in (-pad..img_h as i32 + pad).step_by(step_y as usize) {
            for base_x in (-pad..img_w as i32 + pad).step_by(step_x as usize) {
                for (px, py) in bitmap.iter().copied() {
                    let dx = px as f32 - center_x;
                    let dy = py as f32 - center_y;
                    let rx = dx * cos_t - dy * sin_t + center_x;
                    let ry = dx * sin_t + dy * cos_t + center_y;
                    let tx = base_x + rx.round() as i32;
                    let ty = base_y + ry.round() as i32;
                    if tx < 0 || ty < 0 || tx >= img_w as i32 || ty >= img_h as i32 {
                        continue;
                    }
                    let dst = canvas.get_pixel_mut(tx as u32, ty as u32);
                    let out_alpha = alpha as u16 + (dst[3] as u16 * inv + 127) / 255;
                    *dst = Rgba([
                        blend(dst[0]),
                        blend(dst[1]),
                        blend(dst[2]),
                        out_alpha.min(255) as u8,
                    ]);
                }
            }
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

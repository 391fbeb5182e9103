//! Watermark renderer.
//!
//! Produces a tiled, semi-transparent text overlay over a source image on
//! the fly — never cached on disk, so the current settings always apply and
//! no invalidation is needed when they change. The repeated CPU cost per
//! request is the accepted price for that simplicity.
//!
//! Watermarking is a cosmetic protection, not an access-control mechanism:
//! when the effect cannot be applied (undecodable source, encoder failure)
//! the original bytes are returned verbatim. Image delivery is never blocked
//! because the overlay failed.

use crate::cache_key::normalize_rel_path;
use crate::config::WatermarkSettings;
use crate::error::PipelineError;
use crate::imaging::{PixelBackend, Quality, SourceFormat, TextOverlay};
use std::path::Path;

/// JPEG quality for watermarked renditions.
const WATERMARK_JPEG_QUALITY: u32 = 88;

/// Render a watermarked JPEG for the given source.
///
/// Fails open: any decode or encode problem returns the unmodified source
/// bytes. The only error case is a source that cannot be read at all —
/// there is nothing to fall back to then.
pub fn render_watermarked(
    backend: &impl PixelBackend,
    root: &Path,
    source_rel: &str,
    settings: &WatermarkSettings,
) -> Result<Vec<u8>, PipelineError> {
    let normalized = normalize_rel_path(source_rel);
    let source_abs = root.join(&normalized);
    if normalized.is_empty() || !source_abs.is_file() {
        return Err(PipelineError::SourceNotFound(source_abs));
    }

    let original = std::fs::read(&source_abs)?;

    let img = match backend.decode(&source_abs) {
        Ok(img) => img,
        Err(err) => {
            tracing::warn!(source = %normalized, error = %err, "watermark decode failed, serving original");
            return Ok(original);
        }
    };

    let overlay = TextOverlay {
        text: settings.text.clone(),
        opacity: settings.opacity(),
        angle_degrees: settings.angle_degrees as f32,
    };
    let stamped = backend.draw_tiled_text(img, &overlay);

    match backend.encode(&stamped, SourceFormat::Jpeg, Quality::new(WATERMARK_JPEG_QUALITY)) {
        Ok(bytes) => Ok(bytes),
        Err(err) => {
            tracing::warn!(source = %normalized, error = %err, "watermark encode failed, serving original");
            Ok(original)
        }
    }
}

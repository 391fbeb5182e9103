//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Calculate the dimensions of an image scaled to fit within a bounding box.
///
/// Preserves aspect ratio and never upscales: if the source already fits, its
/// dimensions come back unchanged. Both output dimensions are at least 1.
///
/// # Examples
/// ```
/// # use gallery_media::imaging::fit_within;
/// // 800x600 into a 520x360 box → height is the limiting side
/// assert_eq!(fit_within((800, 600), (520, 360)), (480, 360));
///
/// // Already smaller than the box → unchanged
/// assert_eq!(fit_within((300, 200), (520, 360)), (300, 200));
/// ```
pub fn fit_within(source: (u32, u32), max: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (max_w, max_h) = max;

    let scale_w = max_w as f64 / src_w as f64;
    let scale_h = max_h as f64 / src_h as f64;
    let scale = scale_w.min(scale_h).min(1.0);

    let w = ((src_w as f64 * scale).round() as u32).max(1);
    let h = ((src_h as f64 * scale).round() as u32).max(1);
    (w, h)
}

/// Glyph height for watermark text, proportional to image width.
///
/// `width / 24` with an 18px floor, so text stays legible on small images
/// without dominating large ones.
pub fn watermark_glyph_px(image_width: u32) -> u32 {
    (image_width / 24).max(18)
}

/// Horizontal and vertical distance between tile origins in the watermark
/// grid, derived from the rendered text's bounding box.
///
/// Gaps scale with the text height so the grid density looks the same at any
/// image size. Both steps are at least 1.
pub fn tile_steps(text_w: u32, text_h: u32) -> (u32, u32) {
    let step_x = (text_w + text_h * 2).max(1);
    let step_y = (text_h * 3).max(1);
    (step_x, step_y)
}

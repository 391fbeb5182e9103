//! Pixel operations behind a runtime-selected backend.
//!
//! | Operation | Full backend | Minimal backend |
//! |---|---|---|
//! | **Decode** | `image` + EXIF orientation normalization | `image`, pixels as stored |
//! | **Resize** | Lanczos3 | Triangle |
//! | **Rotate** | lossless quarter-turns | lossless quarter-turns |
//! | **Tiled text** | anti-aliased `ab_glyph` outlines | 8×8 bitmap glyphs |
//!
//! The module is split into:
//! - **Calculations**: pure functions for dimension math (unit testable)
//! - **Parameters**: data structures describing pixel operations
//! - **Backend**: [`PixelBackend`] trait, [`SelectedBackend`] dispatch,
//!   once-per-process [`selected_backend`] probe
//! - **Backends**: [`FullBackend`] and [`MinimalBackend`]

pub mod backend;
mod calculations;
pub mod full_backend;
pub mod minimal_backend;
mod params;

pub use backend::{BackendError, Capability, PixelBackend, SelectedBackend, selected_backend};
pub use calculations::{fit_within, tile_steps, watermark_glyph_px};
pub use full_backend::FullBackend;
pub use minimal_backend::MinimalBackend;
pub use params::{Quality, Rotation, SourceFormat, TextOverlay};

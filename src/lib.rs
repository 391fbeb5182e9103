//! # Gallery Media
//!
//! The derived-media pipeline of a photo-gallery web application. The
//! surrounding CRUD/HTTP layer stores validated source images under a
//! storage root; this crate turns them into everything actually served:
//! resized thumbnails for grid views, rotated originals, and
//! watermark-stamped renditions.
//!
//! # Architecture
//!
//! Three operations over one backend abstraction:
//!
//! ```text
//! ensure_thumbnail   source → cached small JPEG     (disk cache, mtime staleness)
//! render_watermarked source → tiled-text JPEG bytes (per request, never cached)
//! rotate_in_place    source → source, ±90°          (in place, thumbnail regenerated)
//! ```
//!
//! All pixel work goes through [`imaging::PixelBackend`], selected once per
//! process: the full-featured backend (orientation metadata normalization,
//! anti-aliased text) when a scalable font is available, the minimal raster
//! fallback otherwise. Callers never see which one ran.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Backend trait, the two backends, runtime selection, dimension math |
//! | [`cache_key`] | Pure source-path → artifact-path mapping (digest + fan-out dirs) |
//! | [`thumbs`] | Thumbnail cache manager: ensure / regenerate / delete |
//! | [`watermark`] | Per-request tiled text overlay, fail-open |
//! | [`rotate`] | In-place quarter-turn rotation with per-source locking |
//! | [`config`] | Watermark settings (tolerant TOML loading) and thumbnail options |
//! | [`error`] | [`PipelineError`](error::PipelineError) taxonomy |
//!
//! # Design Decisions
//!
//! ## Failure Posture Per Operation
//!
//! Thumbnails are an optimization: every failure collapses to `None` and
//! the caller serves the full-size original. Watermarking is cosmetic: it
//! fails open to the unmodified source bytes rather than ever blocking
//! image delivery. Rotation mutates the authoritative source, so it is the
//! one operation with typed errors — and it never leaves a partial write
//! behind.
//!
//! ## mtime Staleness, Not Content Hashing
//!
//! An artifact is stale iff its modification time precedes its source's.
//! Hashing source bytes would catch clock skew and backup restores but
//! costs a full read of every source on every request; the cheap rule is
//! kept deliberately.
//!
//! ## Probe Once, Dispatch Forever
//!
//! Backend capability is decided a single time at process start instead of
//! being re-checked inside each operation. A capability difference (does
//! rotation normalize orientation metadata?) is then a stable property of
//! the process, not an accident of which branch ran on a given call.

pub mod cache_key;
pub mod config;
pub mod error;
pub mod imaging;
pub mod rotate;
pub mod thumbs;
pub mod watermark;

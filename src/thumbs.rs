//! Thumbnail cache manager.
//!
//! Given a source path, returns a path to an up-to-date small JPEG
//! rendition, generating or regenerating it as needed.
//!
//! # Design
//!
//! The cache is addressed by source path through the pure mapping in
//! [`cache_key`](crate::cache_key). Staleness is mtime-only: an artifact is
//! fresh iff its modification time is at least the source's. No content
//! hashing — that would read every source on every request, and timestamp
//! granularity is sufficient for admin-driven uploads.
//!
//! Thumbnails are a performance optimization, never a correctness
//! requirement: every failure mode here — missing source, undecodable
//! pixels, full disk — collapses to `None`, and the caller serves the
//! full-size original instead.
//!
//! Artifacts are written to a temp file in the artifact's directory and
//! renamed into place, so a concurrent reader sees either the old rendition
//! or the new one, never a torn file. Two concurrent requests for the same
//! cold key may both generate; the second rename overwrites the first with
//! equivalent bytes, so no locking is needed at the cost of occasional
//! duplicate work under a cache stampede.

use crate::cache_key::{artifact_rel_path, normalize_rel_path};
use crate::config::ThumbOptions;
use crate::imaging::{PixelBackend, Quality, SourceFormat};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

/// JPEG quality bounds for artifacts; requests outside are pulled in.
const QUALITY_FLOOR: u32 = 30;
const QUALITY_CEIL: u32 = 95;

/// Ensure an up-to-date thumbnail exists for the given source.
///
/// Returns the artifact path relative to `root`, or `None` when the source
/// is missing or the thumbnail cannot be produced. A fresh artifact is
/// returned as-is with no pixel work — just two stat calls.
pub fn ensure_thumbnail(
    backend: &impl PixelBackend,
    root: &Path,
    source_rel: &str,
    opts: &ThumbOptions,
) -> Option<String> {
    generate(backend, root, source_rel, opts, false)
}

/// Like [`ensure_thumbnail`] but skips the freshness check and always
/// re-encodes. Used after a rotation so the next read can never pick up a
/// stale rendition regenerated by a concurrent read-through request.
pub fn regenerate_thumbnail(
    backend: &impl PixelBackend,
    root: &Path,
    source_rel: &str,
    opts: &ThumbOptions,
) -> Option<String> {
    generate(backend, root, source_rel, opts, true)
}

fn generate(
    backend: &impl PixelBackend,
    root: &Path,
    source_rel: &str,
    opts: &ThumbOptions,
    force: bool,
) -> Option<String> {
    let normalized = normalize_rel_path(source_rel);
    if normalized.is_empty() {
        return None;
    }

    let source_abs = root.join(&normalized);
    if !source_abs.is_file() {
        return None;
    }

    let artifact_rel = artifact_rel_path(&normalized);
    let artifact_abs = root.join(&artifact_rel);

    if !force && is_fresh(&artifact_abs, &source_abs) {
        return Some(artifact_rel);
    }

    match encode_thumbnail(backend, &source_abs, opts)
        .and_then(|bytes| write_atomic(&artifact_abs, &bytes))
    {
        Ok(()) => {
            tracing::debug!(source = %normalized, artifact = %artifact_rel, "thumbnail generated");
            Some(artifact_rel)
        }
        Err(err) => {
            tracing::warn!(source = %normalized, error = %err, "thumbnail generation failed");
            None
        }
    }
}

/// Remove the cache artifact for a source, if present.
///
/// Called by the surrounding CRUD code whenever a source is deleted or
/// replaced, so stale artifacts never accumulate under changed filenames.
/// A no-op when no artifact exists.
pub fn delete_artifact(root: &Path, source_rel: &str) {
    let normalized = normalize_rel_path(source_rel);
    if normalized.is_empty() {
        return;
    }

    let artifact_abs = root.join(artifact_rel_path(&normalized));
    match std::fs::remove_file(&artifact_abs) {
        Ok(()) => tracing::debug!(artifact = %artifact_abs.display(), "artifact deleted"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(artifact = %artifact_abs.display(), error = %e, "artifact delete failed");
        }
    }
}

/// An artifact is fresh iff its mtime is at least the source's. Unreadable
/// metadata counts as stale.
fn is_fresh(artifact_abs: &Path, source_abs: &Path) -> bool {
    let Some(artifact_mtime) = mtime(artifact_abs) else {
        return false;
    };
    let Some(source_mtime) = mtime(source_abs) else {
        return false;
    };
    artifact_mtime >= source_mtime
}

fn mtime(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn encode_thumbnail(
    backend: &impl PixelBackend,
    source_abs: &Path,
    opts: &ThumbOptions,
) -> Result<Vec<u8>, crate::imaging::BackendError> {
    let img = backend.decode(source_abs)?;
    let resized = backend.resize_to_fit(&img, opts.max_width.max(1), opts.max_height.max(1));
    let quality = Quality::new(opts.quality.value().clamp(QUALITY_FLOOR, QUALITY_CEIL));
    backend.encode(&resized, SourceFormat::Jpeg, quality)
}

/// Whole-file write via a unique temp file in the destination directory,
/// renamed into place. Creates parent directories as needed.
pub(crate) fn write_atomic(dest: &Path, bytes: &[u8]) -> Result<(), crate::imaging::BackendError> {
    static SEQ: AtomicU64 = AtomicU64::new(0);

    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let tmp = temp_sibling(dest, SEQ.fetch_add(1, Ordering::Relaxed));
    std::fs::write(&tmp, bytes)?;
    if let Err(e) = std::fs::rename(&tmp, dest) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

fn temp_sibling(dest: &Path, seq: u64) -> PathBuf {
    let name = dest
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("artifact");
    dest.with_file_name(format!(".{name}.tmp-{}-{seq}", std::process::id()))
}

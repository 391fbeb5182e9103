//! Deterministic mapping from source paths to cache artifact paths.
//!
//! The thumbnail cache is addressed by source path: the artifact path is a
//! pure function of the normalized source relative path, so the same
//! function serves both to find an existing artifact and to compute the
//! write target for a new one. No lookups, no state.
//!
//! ## Scheme
//!
//! ```text
//! photos/section_3/sunset.jpg
//!   → thumbs/<d0d1>/<d2d3>/sunset_<digest>.jpg
//! ```
//!
//! where `<digest>` is the SHA-256 of the normalized path in lowercase hex.
//! The digest guarantees two distinct source paths never collide on one
//! artifact path even when their sanitized basenames coincide; the two-level
//! split on the first four hex characters bounds any single directory's
//! fan-out to 256×256 as the gallery grows.
//!
//! Renaming a source changes its digest, so the old artifact becomes
//! orphaned under the old key and is never reclaimed automatically. Known
//! limitation; callers that delete or replace a source are expected to call
//! [`delete_artifact`](crate::thumbs::delete_artifact) first.

use sha2::{Digest, Sha256};
use std::path::Path;

/// Directory under the storage root that holds all cache artifacts.
pub const ARTIFACT_DIR: &str = "thumbs";

/// Normalize a source relative path: forward slashes, no leading slash.
///
/// The normalized form is the caching identity — callers on any platform
/// resolve to the same artifact.
pub fn normalize_rel_path(raw: &str) -> String {
    raw.replace('\\', "/").trim_start_matches('/').to_string()
}

/// SHA-256 of a normalized source path, in lowercase hex.
pub fn source_digest(normalized: &str) -> String {
    let digest = Sha256::digest(normalized.as_bytes());
    format!("{digest:x}")
}

/// Replace every character outside `[A-Za-z0-9._-]` with `_`, trim leading
/// and trailing `._-`, and fall back to `photo` when nothing survives.
fn sanitize_basename(stem: &str) -> String {
    let replaced: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = replaced.trim_matches(['.', '_', '-']);
    if trimmed.is_empty() {
        "photo".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Artifact relative path for a source relative path.
///
/// Pure and deterministic; accepts raw (un-normalized) input.
pub fn artifact_rel_path(source_rel: &str) -> String {
    let normalized = normalize_rel_path(source_rel);
    let digest = source_digest(&normalized);
    let stem = Path::new(&normalized)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("");
    let base = sanitize_basename(stem);

    format!(
        "{ARTIFACT_DIR}/{}/{}/{base}_{digest}.jpg",
        &digest[0..2],
        &digest[2..4],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_for_equal_paths() {
        let a = artifact_rel_path("photos/section_3/sunset.jpg");
        let b = artifact_rel_path("photos/section_3/sunset.jpg");
        assert_eq!(a, b);
    }

    #[test]
    fn normalization_unifies_separators_and_leading_slash() {
        let canonical = artifact_rel_path("photos/section_3/sunset.jpg");
        assert_eq!(artifact_rel_path("/photos/section_3/sunset.jpg"), canonical);
        assert_eq!(
            artifact_rel_path("photos\\section_3\\sunset.jpg"),
            canonical
        );
    }

    #[test]
    fn distinct_paths_get_distinct_artifacts() {
        // Same basename in different sections must not collide
        let a = artifact_rel_path("photos/section_1/sunset.jpg");
        let b = artifact_rel_path("photos/section_2/sunset.jpg");
        assert_ne!(a, b);
    }

    #[test]
    fn path_shape_and_fanout_segments() {
        let rel = "photos/section_3/sunset.jpg";
        let digest = source_digest(&normalize_rel_path(rel));
        let artifact = artifact_rel_path(rel);
        assert_eq!(
            artifact,
            format!(
                "thumbs/{}/{}/sunset_{digest}.jpg",
                &digest[0..2],
                &digest[2..4]
            )
        );
        assert_eq!(digest.len(), 64);
    }

    #[test]
    fn basename_drops_only_the_last_extension() {
        let artifact = artifact_rel_path("photos/archive.tar.jpg");
        assert!(artifact.contains("/archive.tar_"));
    }

    #[test]
    fn unsafe_characters_become_underscores() {
        let artifact = artifact_rel_path("photos/летний вечер.jpg");
        let name = artifact.rsplit('/').next().unwrap();
        assert!(
            name.chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        );
    }

    #[test]
    fn fully_unsafe_basename_falls_back_to_photo() {
        let artifact = artifact_rel_path("photos/фото.jpg");
        let name = artifact.rsplit('/').next().unwrap();
        assert!(name.starts_with("photo_"), "got {name}");
    }

    #[test]
    fn surrounding_punctuation_is_trimmed() {
        let artifact = artifact_rel_path("photos/._sunset-.jpg");
        let name = artifact.rsplit('/').next().unwrap();
        assert!(name.starts_with("sunset_"), "got {name}");
    }

    #[test]
    fn digest_is_of_the_path_not_the_bytes() {
        // Pure function of the path string: no filesystem involved
        let a = artifact_rel_path("does/not/exist.png");
        let b = artifact_rel_path("does/not/exist.png");
        assert_eq!(a, b);
    }
}

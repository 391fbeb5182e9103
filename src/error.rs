//! The pipeline's typed error surface.
//!
//! Only rotation propagates these to callers; thumbnail failures are
//! swallowed into "no thumbnail" and watermark failures fail open to the
//! original bytes. No operation retries — everything here is triggered by an
//! explicit user action that can be retried at the UI layer.

use crate::imaging::BackendError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("source not found: {0}")]
    SourceNotFound(PathBuf),
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("encode failed: {0}")]
    Encode(String),
    #[error("write failed: {0}")]
    Write(#[from] std::io::Error),
}

impl From<BackendError> for PipelineError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Io(e) => Self::Write(e),
            BackendError::Decode(msg) => Self::Decode(msg),
            BackendError::Encode(msg) => Self::Encode(msg),
        }
    }
}

//! Rendering error types.

use std::path::PathBuf;

use thiserror::Error;

pub type VideoResult<T> = Result<T, VideoError>;

#[derive(Debug, Error)]
pub enum VideoError {
    #[error("failed to load image '{path}': {reason}")]
    ImageLoad { path: PathBuf, reason: String },

    #[error("image '{path}' has an unsupported bit depth of {depth}")]
    UnsupportedDepth { path: PathBuf, depth: u16 },

    #[error("texture dimensions {width}x{height} are not powers of two")]
    NotPowerOfTwo { width: u32, height: u32 },

    #[error("unknown texture handle {0}")]
    UnknownTexture(u32),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("mode change failed: {0}")]
    ModeChange(String),

    #[error("invalid video options: {0}")]
    InvalidOptions(String),
}

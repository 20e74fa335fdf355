use std::path::PathBuf;

use crate::store::AssetId;

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("IO error: {0}")]
    Manifest(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("image decode error: {0}")]
    Image(#[from] image::ImageError),
    #[error("malformed glyph outline near token {index}: {message}")]
    Outline { index: usize, message: String },
    #[error("invalid typeface: {0}")]
    Typeface(String),
    #[error("asset not found: {0:?}")]
    NotFound(AssetId),
    #[error("asset load was abandoned before completing")]
    Cancelled,
}

use std::path::PathBuf;

use tableau_assets::AssetError;
use tableau_render::RenderError;

/// Errors from controller startup, frame submission and configuration.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    /// The display surface reported no size, or a zero width or height.
    #[error("display surface unavailable")]
    SurfaceUnavailable,
    #[error("renderer error: {0}")]
    Render(#[from] RenderError),
    #[error("asset error: {0}")]
    Asset(#[from] AssetError),
    #[error("failed to read config {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("unknown demo {0:?} (expected camera-controls or typography)")]
    UnknownDemo(String),
}

/// Errors from renderer construction and frame submission.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The display surface has no usable size.
    #[error("display surface unavailable")]
    SurfaceUnavailable,
    #[error("no compatible graphics adapter found")]
    NoAdapter,
    #[error("renderer initialization failed: {0}")]
    Init(String),
    /// The surface was lost or outdated and has been reconfigured; the
    /// frame was skipped.
    #[error("surface lost; reconfigured and skipped frame")]
    SurfaceLost,
    #[error("out of GPU memory")]
    OutOfMemory,
    #[error("frame failed: {0}")]
    Frame(String),
}

impl RenderError {
    /// Transient errors skip a frame; the next frame may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, RenderError::SurfaceLost)
    }
}

//! Rendering adapter: the renderer-agnostic interface a scene controller
//! draws through.
//!
//! # Invariants
//! - A renderer never mutates the scene it draws.
//! - The drawing buffer is the logical size scaled by the pixel ratio.
//! - A zero-sized output is an error, not a silent no-op.

mod error;
mod renderer;
mod surface;

pub use error::RenderError;
pub use renderer::{DebugTextRenderer, RenderSettings, Renderer};
pub use surface::{DisplaySurface, FixedSurface};

pub fn crate_info() -> &'static str {
    "tableau-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}

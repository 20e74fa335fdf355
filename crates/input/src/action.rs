use serde::{Deserialize, Serialize};
use tableau_common::Viewport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Host-independent input event.
///
/// Window hosts translate their native events into actions; the scene
/// controller consumes actions, never raw window events. Pointer positions
/// are logical pixels from the top-left corner of the surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Action {
    /// The surface now has this logical size.
    Resize(Viewport),
    PointerMove { x: f32, y: f32 },
    PointerDown(PointerButton),
    PointerUp(PointerButton),
    /// Scroll amount in lines; positive scrolls toward the user (zoom out).
    Wheel(f32),
    /// Device pixel ratio changed.
    ScaleFactor(f64),
    /// No-op (input that isn't bound to anything).
    Noop,
}

impl Action {
    pub fn is_pointer(&self) -> bool {
        matches!(
            self,
            Action::PointerMove { .. } | Action::PointerDown(_) | Action::PointerUp(_) | Action::Wheel(_)
        )
    }
}

//! Host-agnostic input: window hosts map native events to [`Action`]s, the
//! scene controller consumes actions.
//!
//! # Invariants
//! - Nothing in this crate depends on a windowing library.
//! - Pointer coordinates are logical pixels, origin top-left, y down; NDC is
//!   origin center, y up.

pub mod action;
pub mod orbit;
pub mod pointer;

pub use action::{Action, PointerButton};
pub use orbit::{OrbitBounds, OrbitControls};
pub use pointer::pointer_to_ndc;

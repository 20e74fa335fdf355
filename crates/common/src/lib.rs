//! Shared types for the tableau workspace: ids, transforms, colors, viewports.

mod color;
mod rng;
mod types;

pub use color::{Color, ColorParseError};
pub use rng::SplitMix64;
pub use types::{NodeId, Transform, Viewport};

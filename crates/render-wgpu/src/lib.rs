//! wgpu render backend for tableau scenes.
//!
//! Draws meshes with basic, standard, physical or toon shading, optional
//! sRGB color maps, and point clouds, lit by up to eight scene lights.
//!
//! # Invariants
//! - The renderer never mutates the scene.
//! - GPU buffers for a node are rebuilt only when its geometry changes;
//!   transforms and colors are re-uploaded every frame.
//! - The surface is always configured at the drawing-buffer size.

mod gpu;
mod shaders;

pub use gpu::{GpuContext, WgpuRenderer};

//! Scene controller and the demos it drives.
//!
//! A [`SceneController`] owns one demo's scene graph, camera, optional orbit
//! controls and renderer. Hosts create it once, call
//! [`SceneController::frame`] on every display refresh and forward input
//! through [`SceneController::handle`].
//!
//! # Invariants
//! - Initialization runs in a fixed order: surface, scene, camera, controls,
//!   lights, meshes, renderer. No frame renders before all seven steps ran.
//! - Camera aspect equals the viewport aspect at every render.
//! - Asset completions and timers are applied on the render thread before
//!   the frame renders. Timers started by a completion first advance on the
//!   following frame.
//! - The scene's change log is drained once per frame, so it holds at most
//!   the changes since the last render.
//! - Resize is idempotent and never traverses the scene.

mod config;
mod controller;
mod demo;
pub mod demos;
mod error;

pub use config::{DemoKind, StageConfig, WindowConfig};
pub use controller::SceneController;
pub use demo::{AssetRequests, CameraSetup, Demo, StageContext, TextureParams, TextureRequest};
pub use error::StageError;

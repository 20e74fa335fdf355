//! Scene graph: the node hierarchy a controller owns and a renderer reads.
//!
//! # Invariants
//! - Nodes keep their insertion order; traversal is depth-first in that order.
//! - Geometry is immutable once built. Only transforms and material colors
//!   change after a node is added, and every such change is logged.
//! - The camera's cached projection is refreshed explicitly, never implicitly.

mod camera;
mod geometry;
mod graph;
mod material;
mod node;
mod raycast;
mod texture;

pub use camera::PerspectiveCamera;
pub use geometry::{Geometry, GeometryKind};
pub use graph::{SceneEvent, SceneGraph};
pub use material::{Material, Shading, Side};
pub use node::{Light, Node, NodeKind};
pub use raycast::{Aabb, Intersection, Ray, Raycaster};
pub use texture::{TextureId, TextureImage, TextureStore};

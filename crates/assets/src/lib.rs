//! Asset loading: typeface fonts, extruded text geometry, PNG textures.
//!
//! Assets are identified by content-addressed hashes. Loads run off the
//! render thread and hand their result back through a [`Pending`] value,
//! which the owner polls without blocking.
//!
//! # Invariants
//! - A [`Pending`] yields its result at most once.
//! - Registering identical bytes twice in an [`AssetStore`] returns the
//!   same shared value.
//! - Text geometry front faces wind counter-clockwise seen from +Z.

mod error;
mod loader;
mod outline;
mod store;
mod text;
mod texture;
mod triangulate;
mod typeface;

pub use error::AssetError;
pub use loader::{AssetLoader, FsLoader, LoadResult, Loaded, Pending, Resolver};
pub use outline::{PathCommand, flatten, parse_outline, signed_area};
pub use store::{AssetId, AssetKind, AssetRecord, AssetStore};
pub use text::{Shape, TextOptions, text_geometry, text_shapes};
pub use texture::decode_png;
pub use triangulate::{Triangulation, triangulate};
pub use typeface::{BoundingBox, FALLBACK_GLYPH, Glyph, Typeface};

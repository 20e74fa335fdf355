use serde::{Deserialize, Serialize};
use tableau_common::Color;

use crate::texture::TextureId;

/// Shading model a renderer applies to a material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Shading {
    /// Unlit flat color.
    Basic,
    /// Diffuse-lit, optionally textured.
    Standard,
    /// Diffuse-lit with a specular term.
    Physical,
    /// Diffuse lighting quantized into bands.
    Toon,
    /// Point sprites for point clouds.
    Points,
}

/// Which triangle faces are visible (and hit by rays).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Side {
    #[default]
    Front,
    Double,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub shading: Shading,
    pub color: Color,
    pub map: Option<TextureId>,
    pub side: Side,
}

impl Material {
    pub fn new(shading: Shading, color: Color) -> Self {
        Self {
            shading,
            color,
            map: None,
            side: Side::Front,
        }
    }

    pub fn basic(color: Color) -> Self {
        Self::new(Shading::Basic, color)
    }

    pub fn standard(color: Color) -> Self {
        Self::new(Shading::Standard, color)
    }

    pub fn physical(color: Color) -> Self {
        Self::new(Shading::Physical, color)
    }

    pub fn toon(color: Color) -> Self {
        Self::new(Shading::Toon, color)
    }

    pub fn points(color: Color) -> Self {
        Self::new(Shading::Points, color)
    }

    pub fn with_map(mut self, map: TextureId) -> Self {
        self.map = Some(map);
        self
    }

    pub fn with_side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }

    pub fn is_lit(&self) -> bool {
        matches!(
            self.shading,
            Shading::Standard | Shading::Physical | Shading::Toon
        )
    }
}

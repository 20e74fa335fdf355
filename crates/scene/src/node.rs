use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tableau_common::{Color, NodeId, Transform};

use crate::geometry::Geometry;
use crate::material::Material;

/// Light sources. Positions come from the owning node's transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Light {
    /// Sky color from above, ground color from below.
    Hemisphere {
        sky: Color,
        ground: Color,
        intensity: f32,
    },
    /// Parallel rays shining from the node position toward the origin.
    Directional { color: Color, intensity: f32 },
    /// Omni light. `distance == 0` means no falloff cutoff.
    Point {
        color: Color,
        intensity: f32,
        distance: f32,
    },
}

impl Light {
    pub fn intensity(&self) -> f32 {
        match self {
            Light::Hemisphere { intensity, .. }
            | Light::Directional { intensity, .. }
            | Light::Point { intensity, .. } => *intensity,
        }
    }
}

/// Payload of a node.
#[derive(Debug, Clone)]
pub enum NodeKind {
    Mesh {
        geometry: Arc<Geometry>,
        material: Material,
    },
    Points {
        geometry: Arc<Geometry>,
        material: Material,
    },
    Light(Light),
    /// Transform-only container.
    Group,
}

impl NodeKind {
    pub fn mesh(geometry: Geometry, material: Material) -> Self {
        NodeKind::Mesh {
            geometry: Arc::new(geometry),
            material,
        }
    }

    pub fn points(geometry: Geometry, material: Material) -> Self {
        NodeKind::Points {
            geometry: Arc::new(geometry),
            material,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Mesh { .. } => "mesh",
            NodeKind::Points { .. } => "points",
            NodeKind::Light(_) => "light",
            NodeKind::Group => "group",
        }
    }

    pub fn material(&self) -> Option<&Material> {
        match self {
            NodeKind::Mesh { material, .. } | NodeKind::Points { material, .. } => Some(material),
            _ => None,
        }
    }

    pub fn material_mut(&mut self) -> Option<&mut Material> {
        match self {
            NodeKind::Mesh { material, .. } | NodeKind::Points { material, .. } => Some(material),
            _ => None,
        }
    }

    pub fn geometry(&self) -> Option<&Arc<Geometry>> {
        match self {
            NodeKind::Mesh { geometry, .. } | NodeKind::Points { geometry, .. } => Some(geometry),
            _ => None,
        }
    }
}

/// One entry in the scene graph.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub transform: Transform,
    pub kind: NodeKind,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl Node {
    pub fn new(name: impl Into<String>, transform: Transform, kind: NodeKind) -> Self {
        Self {
            id: NodeId::new(),
            name: name.into(),
            transform,
            kind,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

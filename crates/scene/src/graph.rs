use std::collections::BTreeMap;

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};
use tableau_common::{Color, NodeId, Transform};
use tracing::trace;

use crate::node::{Node, NodeKind};
use crate::texture::TextureStore;

/// Record of a mutation applied to the scene graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SceneEvent {
    Added {
        id: NodeId,
        parent: Option<NodeId>,
        name: String,
    },
    Removed {
        id: NodeId,
    },
    TransformUpdated {
        id: NodeId,
        old: Transform,
        new: Transform,
    },
    MaterialRecolored {
        id: NodeId,
        old: Color,
        new: Color,
    },
}

/// Ordered node hierarchy plus the scene-wide background and textures.
///
/// Nodes are stored in a BTreeMap keyed by id; ordering for traversal comes
/// from the root list and each node's child list, both in insertion order.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    background: Color,
    nodes: BTreeMap<NodeId, Node>,
    roots: Vec<NodeId>,
    event_log: Vec<SceneEvent>,
    pub textures: TextureStore,
}

impl SceneGraph {
    pub fn new(background: Color) -> Self {
        Self {
            background,
            ..Default::default()
        }
    }

    pub fn background(&self) -> Color {
        self.background
    }

    pub fn set_background(&mut self, color: Color) {
        self.background = color;
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Drain and return the mutation log.
    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.event_log)
    }

    pub fn events(&self) -> &[SceneEvent] {
        &self.event_log
    }

    /// Add a node at the top level. Returns its id.
    pub fn add(&mut self, node: Node) -> NodeId {
        let id = node.id;
        self.roots.push(id);
        self.insert(node, None);
        id
    }

    /// Add a node under `parent`. Returns `None` if the parent is unknown.
    pub fn add_child(&mut self, parent: NodeId, node: Node) -> Option<NodeId> {
        let id = node.id;
        self.nodes.get_mut(&parent)?.children.push(id);
        self.insert(node, Some(parent));
        Some(id)
    }

    fn insert(&mut self, mut node: Node, parent: Option<NodeId>) {
        node.parent = parent;
        trace!(id = %node.id.short(), name = %node.name, kind = node.kind.label(), "node added");
        self.event_log.push(SceneEvent::Added {
            id: node.id,
            parent,
            name: node.name.clone(),
        });
        self.nodes.insert(node.id, node);
    }

    /// Remove a node and its whole subtree. Returns the removed node.
    pub fn remove(&mut self, id: NodeId) -> Option<Node> {
        let node = self.nodes.remove(&id)?;
        match node.parent {
            Some(parent) => {
                if let Some(p) = self.nodes.get_mut(&parent) {
                    p.children.retain(|c| *c != id);
                }
            }
            None => self.roots.retain(|r| *r != id),
        }
        for child in node.children.clone() {
            self.remove(child);
        }
        self.event_log.push(SceneEvent::Removed { id });
        Some(node)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Direct mutable access. Changes made through this are not logged;
    /// prefer the `set_*` operations for transform and color changes.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// First node with the given name, in traversal order.
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.traverse().into_iter().find(|id| {
            self.nodes
                .get(id)
                .is_some_and(|n| n.name == name)
        })
    }

    /// Replace a node's transform and log the change.
    pub fn set_transform(&mut self, id: NodeId, new: Transform) -> bool {
        let Some(node) = self.nodes.get_mut(&id) else {
            return false;
        };
        let old = node.transform;
        node.transform = new;
        self.event_log
            .push(SceneEvent::TransformUpdated { id, old, new });
        true
    }

    /// Replace only the Euler rotation of a node.
    pub fn set_rotation(&mut self, id: NodeId, rotation: Vec3) -> bool {
        let Some(node) = self.nodes.get(&id) else {
            return false;
        };
        let mut transform = node.transform;
        transform.rotation = rotation;
        self.set_transform(id, transform)
    }

    /// Recolor a mesh or point cloud material. Lights and groups are
    /// ignored and return `false`.
    pub fn set_material_color(&mut self, id: NodeId, color: Color) -> bool {
        let Some(material) = self
            .nodes
            .get_mut(&id)
            .and_then(|n| n.kind.material_mut())
        else {
            return false;
        };
        let old = material.color;
        material.color = color;
        self.event_log.push(SceneEvent::MaterialRecolored {
            id,
            old,
            new: color,
        });
        true
    }

    /// Depth-first traversal in insertion order.
    pub fn traverse(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            out.push(id);
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    /// Local-to-world matrix, composing every ancestor transform.
    pub fn world_matrix(&self, id: NodeId) -> Option<Mat4> {
        let mut node = self.nodes.get(&id)?;
        let mut matrix = node.transform.matrix();
        while let Some(parent) = node.parent.and_then(|p| self.nodes.get(&p)) {
            matrix = parent.transform.matrix() * matrix;
            node = parent;
        }
        Some(matrix)
    }

    /// Ids of every mesh node, in traversal order.
    pub fn meshes(&self) -> Vec<NodeId> {
        self.filter(|k| matches!(k, NodeKind::Mesh { .. }))
    }

    pub fn lights(&self) -> Vec<NodeId> {
        self.filter(|k| matches!(k, NodeKind::Light(_)))
    }

    fn filter(&self, pred: impl Fn(&NodeKind) -> bool) -> Vec<NodeId> {
        self.traverse()
            .into_iter()
            .filter(|id| self.nodes.get(id).is_some_and(|n| pred(&n.kind)))
            .collect()
    }
}

use glam::Vec3;
use tableau_common::{Color, NodeId};
use tableau_scene::{NodeKind, SceneGraph};

/// Scene inspector for developer tooling.
///
/// Read-only queries against a scene graph for debug output and host
/// overlays.
pub struct SceneInspector;

impl SceneInspector {
    pub fn summary(scene: &SceneGraph) -> SceneSummary {
        let mut summary = SceneSummary {
            background: scene.background(),
            nodes: 0,
            meshes: 0,
            point_clouds: 0,
            lights: 0,
            triangles: 0,
            points: 0,
            textures: scene.textures.len(),
            pending_events: scene.events().len(),
        };
        for id in scene.traverse() {
            let Some(node) = scene.get(id) else { continue };
            summary.nodes += 1;
            match &node.kind {
                NodeKind::Mesh { geometry, .. } => {
                    summary.meshes += 1;
                    summary.triangles += geometry.triangle_count();
                }
                NodeKind::Points { geometry, .. } => {
                    summary.point_clouds += 1;
                    summary.points += geometry.vertex_count();
                }
                NodeKind::Light(_) => summary.lights += 1,
                NodeKind::Group => {}
            }
        }
        summary
    }

    pub fn inspect_node(scene: &SceneGraph, id: NodeId) -> Option<NodeInfo> {
        let node = scene.get(id)?;
        let world_position = scene
            .world_matrix(id)
            .map_or(node.transform.position, |m| m.transform_point3(Vec3::ZERO));
        Some(NodeInfo {
            id,
            name: node.name.clone(),
            kind: node.kind.label(),
            position: node.transform.position.to_array(),
            rotation: node.transform.rotation.to_array(),
            scale: node.transform.scale.to_array(),
            world_position: world_position.to_array(),
            color: node.kind.material().map(|m| m.color),
        })
    }

    /// Node ids in traversal order.
    pub fn list_nodes(scene: &SceneGraph) -> Vec<NodeId> {
        scene.traverse()
    }

    /// One line per node, in traversal order.
    pub fn report(scene: &SceneGraph) -> String {
        let mut out = format!("{}\n", Self::summary(scene));
        for id in scene.traverse() {
            if let Some(info) = Self::inspect_node(scene, id) {
                out.push_str(&format!("  {info}\n"));
            }
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneSummary {
    pub background: Color,
    pub nodes: usize,
    pub meshes: usize,
    pub point_clouds: usize,
    pub lights: usize,
    pub triangles: usize,
    pub points: usize,
    pub textures: usize,
    pub pending_events: usize,
}

impl std::fmt::Display for SceneSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Scene: background={} nodes={} meshes={} point_clouds={} lights={} triangles={} points={} textures={} pending_events={}",
            self.background,
            self.nodes,
            self.meshes,
            self.point_clouds,
            self.lights,
            self.triangles,
            self.points,
            self.textures,
            self.pending_events
        )
    }
}

/// Detailed info about a single node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeInfo {
    pub id: NodeId,
    pub name: String,
    pub kind: &'static str,
    pub position: [f32; 3],
    /// Euler XYZ, radians.
    pub rotation: [f32; 3],
    pub scale: [f32; 3],
    pub world_position: [f32; 3],
    pub color: Option<Color>,
}

impl std::fmt::Display for NodeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {:?} pos=({:.2}, {:.2}, {:.2}) rot=({:.3}, {:.3}, {:.3})",
            self.kind,
            self.id.short(),
            self.name,
            self.position[0],
            self.position[1],
            self.position[2],
            self.rotation[0],
            self.rotation[1],
            self.rotation[2],
        )?;
        if let Some(color) = self.color {
            write!(f, " color={color}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tableau_common::Transform;
    use tableau_scene::{Geometry, Light, Material, Node};

    fn scene() -> (SceneGraph, NodeId) {
        let mut scene = SceneGraph::new(Color::from_hex(0x020024));
        let cube = scene.add(Node::new(
            "cube",
            Transform::from_position(Vec3::new(1.0, 2.0, 3.0)),
            NodeKind::mesh(Geometry::boxed(2.0, 2.0, 2.0), Material::standard(Color::WHITE)),
        ));
        scene.add(Node::new(
            "stars",
            Transform::default(),
            NodeKind::points(
                Geometry::point_cloud(vec![Vec3::ZERO, Vec3::ONE, Vec3::X]),
                Material::points(Color::from_hex(0x00d4ff)),
            ),
        ));
        scene.add(Node::new(
            "sun",
            Transform::default(),
            NodeKind::Light(Light::Directional {
                color: Color::WHITE,
                intensity: 5.0,
            }),
        ));
        (scene, cube)
    }

    #[test]
    fn summary_empty_scene() {
        let summary = SceneInspector::summary(&SceneGraph::default());
        assert_eq!(summary.nodes, 0);
        assert_eq!(summary.textures, 0);
    }

    #[test]
    fn summary_counts_node_kinds() {
        let (scene, _) = scene();
        let summary = SceneInspector::summary(&scene);
        assert_eq!(summary.nodes, 3);
        assert_eq!(summary.meshes, 1);
        assert_eq!(summary.point_clouds, 1);
        assert_eq!(summary.lights, 1);
        assert_eq!(summary.triangles, 12);
        assert_eq!(summary.points, 3);
        assert_eq!(summary.pending_events, 3);
        assert!(summary.to_string().contains("background=#020024"));
    }

    #[test]
    fn inspect_node_found() {
        let (scene, cube) = scene();
        let info = SceneInspector::inspect_node(&scene, cube).unwrap();
        assert_eq!(info.name, "cube");
        assert_eq!(info.kind, "mesh");
        assert_eq!(info.position, [1.0, 2.0, 3.0]);
        assert_eq!(info.world_position, [1.0, 2.0, 3.0]);
        assert_eq!(info.color, Some(Color::WHITE));
        assert!(info.to_string().contains("color=#ffffff"));
    }

    #[test]
    fn inspect_node_not_found() {
        let (scene, _) = scene();
        assert!(SceneInspector::inspect_node(&scene, NodeId::new()).is_none());
    }

    #[test]
    fn report_lists_every_node_in_order() {
        let (scene, cube) = scene();
        let ids = SceneInspector::list_nodes(&scene);
        assert_eq!(ids.len(), 3);
        assert_eq!(ids[0], cube);
        let report = SceneInspector::report(&scene);
        assert_eq!(report.lines().count(), 4);
        assert!(report.lines().nth(3).unwrap().contains("\"sun\""));
    }
}

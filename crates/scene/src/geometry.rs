use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::raycast::Aabb;

/// What a geometry was generated from. Kept alongside the vertex data so
/// inspectors and tests can read back the literal parameters (e.g. the text
/// string of a text mesh).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GeometryKind {
    Box { width: f32, height: f32, depth: f32 },
    Text { text: String, size: f32, depth: f32 },
    PointCloud,
}

/// Vertex data for one mesh or point cloud.
///
/// Triangle meshes carry positions, normals, uvs and a triangle-list index
/// buffer (counter-clockwise front faces). Point clouds carry positions only.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub kind: GeometryKind,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub indices: Vec<u32>,
}

impl Geometry {
    /// Axis-aligned box centered on the origin: 24 vertices (4 per face so
    /// every face gets its own normal and uvs) and 36 indices.
    pub fn boxed(width: f32, height: f32, depth: f32) -> Self {
        let half = Vec3::new(width, height, depth) * 0.5;
        // (normal, u axis, v axis) with u x v == normal so faces wind outward.
        let faces = [
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        ];

        let mut positions = Vec::with_capacity(24);
        let mut normals = Vec::with_capacity(24);
        let mut uvs = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);

        for (normal, u, v) in faces {
            let center = normal * normal.abs().dot(half);
            let hu = u * u.abs().dot(half);
            let hv = v * v.abs().dot(half);
            let base = positions.len() as u32;

            // Texture rows start at the top of the image, so +v maps to uv.y = 0.
            for (su, sv, uv) in [
                (-1.0, -1.0, Vec2::new(0.0, 1.0)),
                (1.0, -1.0, Vec2::new(1.0, 1.0)),
                (1.0, 1.0, Vec2::new(1.0, 0.0)),
                (-1.0, 1.0, Vec2::new(0.0, 0.0)),
            ] {
                positions.push(center + hu * su + hv * sv);
                normals.push(normal);
                uvs.push(uv);
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
        }

        Self {
            kind: GeometryKind::Box {
                width,
                height,
                depth,
            },
            positions,
            normals,
            uvs,
            indices,
        }
    }

    pub fn point_cloud(positions: Vec<Vec3>) -> Self {
        Self {
            kind: GeometryKind::PointCloud,
            positions,
            normals: Vec::new(),
            uvs: Vec::new(),
            indices: Vec::new(),
        }
    }

    /// Wrap externally generated triangle data (text outlines, imports).
    pub fn from_triangles(
        kind: GeometryKind,
        positions: Vec<Vec3>,
        normals: Vec<Vec3>,
        uvs: Vec<Vec2>,
        indices: Vec<u32>,
    ) -> Self {
        Self {
            kind,
            positions,
            normals,
            uvs,
            indices,
        }
    }

    pub fn is_points(&self) -> bool {
        matches!(self.kind, GeometryKind::PointCloud)
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Literal text of a text geometry.
    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            GeometryKind::Text { text, .. } => Some(text),
            _ => None,
        }
    }

    /// Local-space bounds, `None` for empty geometry.
    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(&self.positions)
    }

    /// Triangles as vertex triples in local space.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).map(|tri| {
            [
                self.positions[tri[0] as usize],
                self.positions[tri[1] as usize],
                self.positions[tri[2] as usize],
            ]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_has_24_vertices_and_12_triangles() {
        let g = Geometry::boxed(2.0, 2.0, 2.0);
        assert_eq!(g.vertex_count(), 24);
        assert_eq!(g.triangle_count(), 12);
        assert_eq!(g.normals.len(), 24);
        assert_eq!(g.uvs.len(), 24);
    }

    #[test]
    fn box_bounds_match_dimensions() {
        let g = Geometry::boxed(4.0, 1.4, 1.0);
        let b = g.bounds().unwrap();
        assert!((b.min - Vec3::new(-2.0, -0.7, -0.5)).length() < 1e-6);
        assert!((b.max - Vec3::new(2.0, 0.7, 0.5)).length() < 1e-6);
    }

    #[test]
    fn box_faces_wind_outward() {
        let g = Geometry::boxed(1.0, 2.0, 3.0);
        for (i, [a, b, c]) in g.triangles().enumerate() {
            let face_normal = (b - a).cross(c - a).normalize();
            let vertex_normal = g.normals[g.indices[i * 3] as usize];
            assert!(face_normal.dot(vertex_normal) > 0.99, "triangle {i}");
        }
    }

    #[test]
    fn point_cloud_has_no_triangles() {
        let g = Geometry::point_cloud(vec![Vec3::ZERO, Vec3::ONE]);
        assert!(g.is_points());
        assert_eq!(g.triangle_count(), 0);
        assert_eq!(g.vertex_count(), 2);
        assert!(g.text().is_none());
    }

    #[test]
    fn empty_geometry_has_no_bounds() {
        assert!(Geometry::point_cloud(Vec::new()).bounds().is_none());
    }
}

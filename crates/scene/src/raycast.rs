use glam::{Mat4, Vec2, Vec3};
use tableau_common::NodeId;

use crate::camera::PerspectiveCamera;
use crate::graph::SceneGraph;
use crate::material::Side;
use crate::node::NodeKind;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Ray expressed in another space. The direction is not renormalized, so
    /// `t` values stay comparable between spaces for affine transforms.
    pub fn transformed(&self, m: &Mat4) -> Ray {
        Ray {
            origin: m.transform_point3(self.origin),
            direction: m.transform_vector3(self.direction),
        }
    }

    /// Closest point on the ray (t >= 0) to `p`, with its parameter.
    pub fn closest_point(&self, p: Vec3) -> (f32, Vec3) {
        let t = (p - self.origin).dot(self.direction).max(0.0);
        (t, self.at(t))
    }

    /// Möller–Trumbore. Returns `t` of the hit. With `cull_back` set,
    /// triangles wound clockwise as seen from the ray origin are skipped.
    pub fn intersect_triangle(&self, [a, b, c]: [Vec3; 3], cull_back: bool) -> Option<f32> {
        const EPS: f32 = 1e-7;
        let edge1 = b - a;
        let edge2 = c - a;
        let pvec = self.direction.cross(edge2);
        let det = edge1.dot(pvec);
        if cull_back {
            if det < EPS {
                return None;
            }
        } else if det.abs() < EPS {
            return None;
        }
        let inv_det = 1.0 / det;
        let tvec = self.origin - a;
        let u = tvec.dot(pvec) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }
        let qvec = tvec.cross(edge1);
        let v = self.direction.dot(qvec) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }
        let t = edge2.dot(qvec) * inv_det;
        (t >= 0.0).then_some(t)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        let first = *points.first()?;
        Some(points.iter().fold(Aabb::new(first, first), |acc, p| Aabb {
            min: acc.min.min(*p),
            max: acc.max.max(*p),
        }))
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Slab test. Returns the entry distance (0 when the origin is inside).
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let inv = ray.direction.recip();
        let t1 = (self.min - ray.origin) * inv;
        let t2 = (self.max - ray.origin) * inv;
        let t_near = t1.min(t2).max_element();
        let t_far = t1.max(t2).min_element();
        if t_near.is_nan() || t_far.is_nan() || t_far < t_near.max(0.0) {
            return None;
        }
        Some(t_near.max(0.0))
    }
}

/// One ray hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    pub node: NodeId,
    /// World-space distance from the ray origin.
    pub distance: f32,
    pub point: Vec3,
    /// Point index for point-cloud hits.
    pub index: Option<usize>,
}

/// Casts rays from a camera into a scene graph.
#[derive(Debug, Clone)]
pub struct Raycaster {
    pub ray: Ray,
    pub near: f32,
    pub far: f32,
    /// World-space radius within which a point-cloud point counts as hit.
    pub points_threshold: f32,
}

impl Default for Raycaster {
    fn default() -> Self {
        Self {
            ray: Ray::new(Vec3::ZERO, Vec3::NEG_Z),
            near: 0.0,
            far: f32::INFINITY,
            points_threshold: 1.0,
        }
    }
}

impl Raycaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Aim the ray from the camera through `ndc` (x right, y up, -1..1).
    pub fn set_from_camera(&mut self, ndc: Vec2, camera: &PerspectiveCamera) {
        let through = camera.unproject(ndc.extend(0.5));
        self.ray = Ray::new(camera.position, through - camera.position);
    }

    /// Intersect every root node (and, when `recursive`, their descendants).
    /// Hits come back sorted by distance, nearest first. Meshes report their
    /// nearest hit; point clouds report one hit per point inside the
    /// threshold.
    pub fn intersect_scene(&self, scene: &SceneGraph, recursive: bool) -> Vec<Intersection> {
        let ids = if recursive {
            scene.traverse()
        } else {
            scene.roots().to_vec()
        };
        let mut hits: Vec<Intersection> = ids
            .into_iter()
            .flat_map(|id| self.intersect_node(scene, id))
            .filter(|hit| hit.distance >= self.near && hit.distance <= self.far)
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }

    fn intersect_node(&self, scene: &SceneGraph, id: NodeId) -> Vec<Intersection> {
        let (Some(node), Some(world)) = (scene.get(id), scene.world_matrix(id)) else {
            return Vec::new();
        };
        match &node.kind {
            NodeKind::Mesh { geometry, material } => {
                let local = self.ray.transformed(&world.inverse());
                let Some(bounds) = geometry.bounds() else {
                    return Vec::new();
                };
                if bounds.intersect_ray(&local).is_none() {
                    return Vec::new();
                }
                let cull_back = material.side == Side::Front;
                geometry
                    .triangles()
                    .filter_map(|tri| local.intersect_triangle(tri, cull_back))
                    .map(|t| {
                        let point = world.transform_point3(local.at(t));
                        Intersection {
                            node: id,
                            distance: self.ray.origin.distance(point),
                            point,
                            index: None,
                        }
                    })
                    .min_by(|a, b| a.distance.total_cmp(&b.distance))
                    .into_iter()
                    .collect()
            }
            NodeKind::Points { geometry, .. } => {
                let threshold_sq = self.points_threshold * self.points_threshold;
                geometry
                    .positions
                    .iter()
                    .enumerate()
                    .filter_map(|(index, p)| {
                        let world_p = world.transform_point3(*p);
                        let (t, closest) = self.ray.closest_point(world_p);
                        (closest.distance_squared(world_p) < threshold_sq).then_some(
                            Intersection {
                                node: id,
                                distance: t,
                                point: closest,
                                index: Some(index),
                            },
                        )
                    })
                    .collect()
            }
            NodeKind::Light(_) | NodeKind::Group => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Geometry;
    use crate::material::Material;
    use crate::node::{Light, Node};
    use tableau_common::{Color, Transform};

    fn camera_at_z5() -> PerspectiveCamera {
        let mut cam = PerspectiveCamera::new(75.0, 1.0, 0.1, 1000.0);
        cam.position = Vec3::new(0.0, 0.0, 5.0);
        cam
    }

    fn cube(scene: &mut SceneGraph, position: Vec3) -> NodeId {
        scene.add(Node::new(
            "cube",
            Transform::from_position(position),
            NodeKind::mesh(Geometry::boxed(1.0, 1.0, 1.0), Material::basic(Color::WHITE)),
        ))
    }

    #[test]
    fn aabb_slab_test() {
        let b = Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        let hit = b.intersect_ray(&Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z));
        assert!((hit.unwrap() - 4.0).abs() < 1e-5);
        assert!(b
            .intersect_ray(&Ray::new(Vec3::new(5.0, 0.0, 5.0), Vec3::NEG_Z))
            .is_none());
        assert!(b.intersect_ray(&Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::Z)).is_none());
    }

    #[test]
    fn triangle_culling() {
        let tri = [Vec3::new(-1.0, -1.0, 0.0), Vec3::new(1.0, -1.0, 0.0), Vec3::new(0.0, 1.0, 0.0)];
        let front = Ray::new(Vec3::new(0.0, 0.0, 1.0), Vec3::NEG_Z);
        let back = Ray::new(Vec3::new(0.0, 0.0, -1.0), Vec3::Z);
        assert!(front.intersect_triangle(tri, true).is_some());
        assert!(back.intersect_triangle(tri, true).is_none());
        assert!(back.intersect_triangle(tri, false).is_some());
    }

    #[test]
    fn center_ray_hits_cube_on_axis() {
        let mut scene = SceneGraph::default();
        let id = cube(&mut scene, Vec3::ZERO);
        let mut rc = Raycaster::new();
        rc.set_from_camera(Vec2::ZERO, &camera_at_z5());
        let hits = rc.intersect_scene(&scene, true);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].node, id);
        assert!((hits[0].distance - 4.5).abs() < 1e-4);
    }

    #[test]
    fn ray_far_off_axis_hits_nothing() {
        let mut scene = SceneGraph::default();
        cube(&mut scene, Vec3::ZERO);
        let mut rc = Raycaster::new();
        rc.set_from_camera(Vec2::new(0.95, 0.95), &camera_at_z5());
        assert!(rc.intersect_scene(&scene, true).is_empty());
    }

    #[test]
    fn hits_sorted_nearest_first() {
        let mut scene = SceneGraph::default();
        let far = cube(&mut scene, Vec3::new(0.0, 0.0, -3.0));
        let near = cube(&mut scene, Vec3::ZERO);
        let mut rc = Raycaster::new();
        rc.set_from_camera(Vec2::ZERO, &camera_at_z5());
        let hits = rc.intersect_scene(&scene, true);
        assert_eq!(hits.iter().map(|h| h.node).collect::<Vec<_>>(), vec![near, far]);
    }

    #[test]
    fn recursive_flag_controls_children() {
        let mut scene = SceneGraph::default();
        let group = scene.add(Node::new("group", Transform::default(), NodeKind::Group));
        let child = scene
            .add_child(
                group,
                Node::new(
                    "child",
                    Transform::default(),
                    NodeKind::mesh(Geometry::boxed(1.0, 1.0, 1.0), Material::basic(Color::WHITE)),
                ),
            )
            .unwrap();
        let mut rc = Raycaster::new();
        rc.set_from_camera(Vec2::ZERO, &camera_at_z5());
        assert!(rc.intersect_scene(&scene, false).is_empty());
        assert_eq!(rc.intersect_scene(&scene, true)[0].node, child);
    }

    #[test]
    fn points_within_threshold_are_hit_with_index() {
        let mut scene = SceneGraph::default();
        let id = scene.add(Node::new(
            "stars",
            Transform::default(),
            NodeKind::points(
                Geometry::point_cloud(vec![
                    Vec3::new(0.5, 0.0, 0.0),
                    Vec3::new(10.0, 0.0, 0.0),
                    Vec3::new(0.0, 0.0, -20.0),
                ]),
                Material::points(Color::from_hex(0x00d4ff)),
            ),
        ));
        let mut rc = Raycaster::new();
        rc.set_from_camera(Vec2::ZERO, &camera_at_z5());
        let hits = rc.intersect_scene(&scene, true);
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|h| h.node == id));
        assert_eq!(hits[0].index, Some(0));
        assert_eq!(hits[1].index, Some(2));
    }

    #[test]
    fn lights_are_never_hit() {
        let mut scene = SceneGraph::default();
        scene.add(Node::new(
            "light",
            Transform::default(),
            NodeKind::Light(Light::Point {
                color: Color::WHITE,
                intensity: 1.5,
                distance: 0.0,
            }),
        ));
        let mut rc = Raycaster::new();
        rc.set_from_camera(Vec2::ZERO, &camera_at_z5());
        assert!(rc.intersect_scene(&scene, true).is_empty());
    }
}

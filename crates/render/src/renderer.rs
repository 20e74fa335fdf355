use std::fmt::Write as _;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tableau_common::Viewport;
use tableau_scene::{GeometryKind, Light, NodeKind, PerspectiveCamera, SceneGraph, Shading};
use tracing::trace;

use crate::error::RenderError;

/// Output options chosen when a renderer is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderSettings {
    /// Multisample the color target.
    pub antialias: bool,
    /// Fixed pixel ratio; `None` follows the display surface.
    pub pixel_ratio: Option<f64>,
    /// Encode output colors with the display gamma.
    pub gamma_output: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            antialias: true,
            pixel_ratio: None,
            gamma_output: false,
        }
    }
}

impl RenderSettings {
    /// Effective pixel ratio on a surface with `device_ratio`.
    pub fn resolve_pixel_ratio(&self, device_ratio: f64) -> f64 {
        let ratio = self.pixel_ratio.unwrap_or(device_ratio);
        if ratio.is_finite() && ratio > 0.0 { ratio } else { 1.0 }
    }
}

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// The renderer reads the scene and camera and produces output. It never
/// mutates the scene.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    fn set_pixel_ratio(&mut self, ratio: f64);

    fn pixel_ratio(&self) -> f64;

    /// Resize the output to a logical size. The drawing buffer becomes
    /// `size * pixel_ratio`.
    fn set_size(&mut self, viewport: Viewport);

    /// Logical output size.
    fn size(&self) -> Viewport;

    /// Physical size of the buffer actually drawn into.
    fn drawing_buffer_size(&self) -> Viewport {
        self.size().scaled(self.pixel_ratio())
    }

    /// Draw one frame of `scene` as seen through `camera`.
    fn render(&mut self, scene: &SceneGraph, camera: &PerspectiveCamera) -> Result<Self::Output, RenderError>;
}

/// Headless renderer producing a human-readable frame description.
///
/// Useful for CLI output, logging, and testing the render interface.
#[derive(Debug, Clone)]
pub struct DebugTextRenderer {
    settings: RenderSettings,
    size: Viewport,
    pixel_ratio: f64,
    frames: u64,
}

impl DebugTextRenderer {
    pub fn new(settings: RenderSettings, size: Viewport) -> Self {
        Self {
            settings,
            size,
            pixel_ratio: settings.resolve_pixel_ratio(1.0),
            frames: 0,
        }
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// Frames rendered so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

fn fmt_vec(v: Vec3) -> String {
    format!("({:.2}, {:.2}, {:.2})", v.x, v.y, v.z)
}

fn describe(kind: &NodeKind) -> String {
    match kind {
        NodeKind::Mesh { geometry, material } | NodeKind::Points { geometry, material } => {
            let shape = match &geometry.kind {
                GeometryKind::Box {
                    width,
                    height,
                    depth,
                } => format!("box {width}x{height}x{depth}"),
                GeometryKind::Text { text, size, depth } => {
                    format!("text {text:?} size={size} depth={depth}")
                }
                GeometryKind::PointCloud => format!("points n={}", geometry.vertex_count()),
            };
            let shading = match material.shading {
                Shading::Basic => "basic",
                Shading::Standard => "standard",
                Shading::Physical => "physical",
                Shading::Toon => "toon",
                Shading::Points => "points",
            };
            let map = if material.map.is_some() { " mapped" } else { "" };
            format!("{} {shape} {shading} {}{map}", kind.label(), material.color)
        }
        NodeKind::Light(light) => match light {
            Light::Hemisphere {
                sky,
                ground,
                intensity,
            } => format!("light hemisphere sky={sky} ground={ground} intensity={intensity}"),
            Light::Directional { color, intensity } => {
                format!("light directional {color} intensity={intensity}")
            }
            Light::Point {
                color,
                intensity,
                distance,
            } => format!("light point {color} intensity={intensity} distance={distance}"),
        },
        NodeKind::Group => "group".to_string(),
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn set_pixel_ratio(&mut self, ratio: f64) {
        self.pixel_ratio = RenderSettings {
            pixel_ratio: Some(ratio),
            ..self.settings
        }
        .resolve_pixel_ratio(1.0);
    }

    fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    fn set_size(&mut self, viewport: Viewport) {
        self.size = viewport;
    }

    fn size(&self) -> Viewport {
        self.size
    }

    fn render(&mut self, scene: &SceneGraph, camera: &PerspectiveCamera) -> Result<String, RenderError> {
        if !self.size.is_valid() {
            return Err(RenderError::SurfaceUnavailable);
        }
        self.frames += 1;
        let buffer = self.drawing_buffer_size();
        let order = scene.traverse();

        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = writeln!(
            out,
            "=== Frame {} ({}x{} @{:.2}x, buffer {}x{}, antialias={}) ===",
            self.frames,
            self.size.width,
            self.size.height,
            self.pixel_ratio,
            buffer.width,
            buffer.height,
            self.settings.antialias
        );
        let _ = writeln!(out, "Background: {}", scene.background());
        let _ = writeln!(
            out,
            "Camera: pos={} fov={:.0} aspect={:.3} near={} far={}",
            fmt_vec(camera.position),
            camera.fov,
            camera.aspect,
            camera.near,
            camera.far
        );
        let _ = writeln!(out, "Nodes: {}", order.len());
        for id in order {
            let Some(node) = scene.get(id) else {
                continue;
            };
            let t = node.transform;
            let _ = writeln!(
                out,
                "  [{}] {:?} {} pos={} rot={}",
                id.short(),
                node.name,
                describe(&node.kind),
                fmt_vec(t.position),
                fmt_vec(t.rotation)
            );
        }
        trace!(frame = self.frames, bytes = out.len(), "debug frame rendered");
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tableau_common::{Color, Transform};
    use tableau_scene::{Geometry, Material, Node};

    fn scene() -> SceneGraph {
        let mut scene = SceneGraph::new(Color::from_hex(0x8fbcd4));
        scene.add(Node::new(
            "cube",
            Transform::default(),
            NodeKind::mesh(Geometry::boxed(2.0, 2.0, 2.0), Material::standard(Color::WHITE)),
        ));
        scene.add(Node::new(
            "sun",
            Transform::from_position(Vec3::splat(10.0)),
            NodeKind::Light(Light::Directional {
                color: Color::WHITE,
                intensity: 5.0,
            }),
        ));
        scene
    }

    #[test]
    fn renders_frame_summary() {
        let mut r = DebugTextRenderer::new(RenderSettings::default(), Viewport::new(800, 600));
        let out = r.render(&scene(), &PerspectiveCamera::default()).unwrap();
        assert!(out.contains("Frame 1"));
        assert!(out.contains("Background: #8fbcd4"));
        assert!(out.contains("Nodes: 2"));
        assert!(out.contains("box 2x2x2 standard #ffffff"));
        assert!(out.contains("light directional"));
        assert_eq!(r.frames(), 1);
    }

    #[test]
    fn drawing_buffer_follows_pixel_ratio() {
        let mut r = DebugTextRenderer::new(RenderSettings::default(), Viewport::new(800, 600));
        r.set_pixel_ratio(2.0);
        assert_eq!(r.drawing_buffer_size(), Viewport::new(1600, 1200));
        r.set_size(Viewport::new(100, 50));
        assert_eq!(r.size(), Viewport::new(100, 50));
        assert_eq!(r.drawing_buffer_size(), Viewport::new(200, 100));
    }

    #[test]
    fn invalid_pixel_ratio_falls_back_to_one() {
        let mut r = DebugTextRenderer::new(RenderSettings::default(), Viewport::new(8, 8));
        r.set_pixel_ratio(0.0);
        assert_eq!(r.pixel_ratio(), 1.0);
        r.set_pixel_ratio(f64::NAN);
        assert_eq!(r.pixel_ratio(), 1.0);
    }

    #[test]
    fn zero_size_is_an_error() {
        let mut r = DebugTextRenderer::new(RenderSettings::default(), Viewport::new(0, 0));
        assert!(matches!(
            r.render(&scene(), &PerspectiveCamera::default()),
            Err(RenderError::SurfaceUnavailable)
        ));
        assert_eq!(r.frames(), 0);
    }

    #[test]
    fn settings_resolve_pixel_ratio() {
        let follow = RenderSettings::default();
        assert_eq!(follow.resolve_pixel_ratio(2.0), 2.0);
        let fixed = RenderSettings {
            pixel_ratio: Some(1.0),
            ..RenderSettings::default()
        };
        assert_eq!(fixed.resolve_pixel_ratio(2.0), 1.0);
    }
}

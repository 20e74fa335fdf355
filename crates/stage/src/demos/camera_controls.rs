use glam::Vec3;
use tableau_common::{Color, Transform};
use tableau_render::RenderSettings;
use tableau_scene::{Geometry, Light, Material, Node, NodeKind, SceneGraph};

use crate::demo::{AssetRequests, CameraSetup, Demo, TextureParams};

pub const TEXTURE_PATH: &str = "textures/1-camera-controls/uv_test_bw.png";

/// A textured cube under a hemisphere and a directional light, viewed
/// through orbit controls.
#[derive(Debug, Clone, Default)]
pub struct CameraControlsDemo {
    pixel_ratio: Option<f64>,
}

impl CameraControlsDemo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix the pixel ratio instead of following the display.
    pub fn with_pixel_ratio(mut self, ratio: Option<f64>) -> Self {
        self.pixel_ratio = ratio;
        self
    }
}

impl Demo for CameraControlsDemo {
    fn name(&self) -> &'static str {
        "camera-controls"
    }

    fn background(&self) -> Color {
        Color::from_hex(0x8fbcd4)
    }

    fn camera(&self) -> CameraSetup {
        CameraSetup {
            fov: 35.0,
            near: 0.1,
            far: 100.0,
            position: Vec3::new(-4.0, 4.0, 10.0),
            target: Some(Vec3::ZERO),
        }
    }

    fn orbit_controls(&self) -> bool {
        true
    }

    fn render_settings(&self) -> RenderSettings {
        RenderSettings {
            antialias: true,
            pixel_ratio: self.pixel_ratio,
            gamma_output: true,
        }
    }

    fn lights(&mut self, scene: &mut SceneGraph) {
        scene.add(Node::new(
            "ambient",
            Transform::default(),
            NodeKind::Light(Light::Hemisphere {
                sky: Color::from_hex(0xddeeff),
                ground: Color::from_hex(0x202020),
                intensity: 5.0,
            }),
        ));
        scene.add(Node::new(
            "main-light",
            Transform::from_position(Vec3::new(10.0, 10.0, 10.0)),
            NodeKind::Light(Light::Directional {
                color: Color::WHITE,
                intensity: 5.0,
            }),
        ));
    }

    fn meshes(&mut self, scene: &mut SceneGraph, assets: &mut AssetRequests) {
        let map = assets.texture(
            TEXTURE_PATH,
            TextureParams {
                srgb: true,
                anisotropy: 16,
            },
        );
        scene.add(Node::new(
            "cube",
            Transform::default(),
            NodeKind::mesh(
                Geometry::boxed(2.0, 2.0, 2.0),
                Material::standard(Color::WHITE).with_map(map),
            ),
        ));
    }
}

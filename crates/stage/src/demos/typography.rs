use std::time::Duration;

use glam::Vec3;
use tableau_anim::{Ease, Property, TimerHandle};
use tableau_assets::{TextOptions, Typeface, text_geometry};
use tableau_common::{Color, NodeId, SplitMix64, Transform};
use tableau_render::RenderSettings;
use tableau_scene::{Geometry, Light, Material, Node, NodeKind, SceneGraph};
use tracing::{debug, info, warn};

use crate::demo::{AssetRequests, CameraSetup, Demo, StageContext};

pub const FONT_PATH: &str = "fonts/ABeeZee_Regular.json";
pub const NAME_TEXT: &str = "YobertyAlej";
pub const SIGNS_TEXT: &str = "?!";
pub const STAR_COUNT: usize = 10_000;
pub const STAR_SPREAD: f32 = 2000.0;
pub const WOBBLE_PERIOD: Duration = Duration::from_millis(2500);
pub const WOBBLE_DELAY: f32 = 0.3;
pub const WOBBLE_STEP: f32 = 0.3;
/// Radians added to the square's x rotation every frame.
pub const SQUARE_SPIN: f32 = 0.005;

/// Extruded text over a starfield, a spinning square, pointer highlight
/// and a repeating wobble on the `?!` glyphs.
#[derive(Debug, Clone)]
pub struct TypographyDemo {
    star_seed: u64,
    star_count: usize,
    pixel_ratio: Option<f64>,
    square: Option<NodeId>,
    signs: Option<NodeId>,
    timer: Option<TimerHandle>,
}

impl TypographyDemo {
    pub fn new(star_seed: u64) -> Self {
        Self {
            star_seed,
            star_count: STAR_COUNT,
            pixel_ratio: None,
            square: None,
            signs: None,
            timer: None,
        }
    }

    /// Override the starfield size. Tests use small counts.
    pub fn with_star_count(mut self, count: usize) -> Self {
        self.star_count = count;
        self
    }

    pub fn with_pixel_ratio(mut self, ratio: Option<f64>) -> Self {
        self.pixel_ratio = ratio;
        self
    }

    pub fn square(&self) -> Option<NodeId> {
        self.square
    }

    pub fn signs(&self) -> Option<NodeId> {
        self.signs
    }

    fn stars(&self) -> Geometry {
        let mut rng = SplitMix64::new(self.star_seed);
        let positions = (0..self.star_count)
            .map(|_| {
                Vec3::new(
                    rng.spread(STAR_SPREAD),
                    rng.spread(STAR_SPREAD),
                    rng.spread(STAR_SPREAD),
                )
            })
            .collect();
        Geometry::point_cloud(positions)
    }

    fn add_text(
        scene: &mut SceneGraph,
        font: &Typeface,
        text: &str,
        options: TextOptions,
        material: Material,
        position: Vec3,
    ) -> Option<NodeId> {
        match text_geometry(font, text, &options) {
            Ok(geometry) => Some(scene.add(Node::new(
                text,
                Transform::from_position(position),
                NodeKind::mesh(geometry, material),
            ))),
            Err(e) => {
                warn!(text = %text, error = %e, "text geometry failed");
                None
            }
        }
    }
}

impl Demo for TypographyDemo {
    fn name(&self) -> &'static str {
        "typography"
    }

    fn background(&self) -> Color {
        Color::from_hex(0x020024)
    }

    fn camera(&self) -> CameraSetup {
        CameraSetup {
            fov: 75.0,
            near: 0.1,
            far: 1000.0,
            position: Vec3::new(0.0, 0.0, 5.0),
            target: None,
        }
    }

    fn render_settings(&self) -> RenderSettings {
        RenderSettings {
            antialias: true,
            pixel_ratio: Some(self.pixel_ratio.unwrap_or(1.0)),
            gamma_output: false,
        }
    }

    fn lights(&mut self, scene: &mut SceneGraph) {
        scene.add(Node::new(
            "light",
            Transform::from_position(Vec3::new(-1.0, 0.0, 25.0)),
            NodeKind::Light(Light::Point {
                color: Color::WHITE,
                intensity: 1.5,
                distance: 0.0,
            }),
        ));
    }

    fn meshes(&mut self, scene: &mut SceneGraph, assets: &mut AssetRequests) {
        assets.font(FONT_PATH);

        self.square = Some(scene.add(Node::new(
            "square",
            Transform::from_position(Vec3::new(-6.0, 0.4, -1.0)),
            NodeKind::mesh(
                Geometry::boxed(4.0, 1.4, 1.0),
                Material::basic(Color::from_hex(0xf61067)),
            ),
        )));
        scene.add(Node::new(
            "stars",
            Transform::default(),
            NodeKind::points(self.stars(), Material::points(Color::from_hex(0x00d4ff))),
        ));
        debug!(stars = self.star_count, seed = self.star_seed, "starfield built");
    }

    fn update(&mut self, scene: &mut SceneGraph) {
        let Some(square) = self.square else {
            return;
        };
        if let Some(node) = scene.get(square) {
            let mut rotation = node.transform.rotation;
            rotation.x += SQUARE_SPIN;
            scene.set_rotation(square, rotation);
        }
    }

    fn font_loaded(&mut self, ctx: &mut StageContext<'_>, path: &str, font: &Typeface) {
        if path != FONT_PATH || self.signs.is_some() {
            return;
        }
        Self::add_text(
            ctx.scene,
            font,
            NAME_TEXT,
            TextOptions::new(0.7, 0.02),
            Material::physical(Color::WHITE),
            Vec3::new(-7.0, 0.05, 0.0),
        );
        self.signs = Self::add_text(
            ctx.scene,
            font,
            SIGNS_TEXT,
            TextOptions::new(0.7, 0.0),
            Material::toon(Color::from_hex(0xf8b500)),
            Vec3::new(-1.5, 0.2, 0.0),
        );
        if self.signs.is_none() {
            return;
        }

        ctx.start_timeline(WOBBLE_DELAY);
        self.timer = Some(ctx.start_timer(WOBBLE_PERIOD));
        info!("text figure loaded; wobble animation scheduled");
    }

    fn timer_fired(&mut self, ctx: &mut StageContext<'_>, handle: TimerHandle) {
        if self.timer != Some(handle) {
            return;
        }
        let (Some(signs), Some(timeline)) = (self.signs, ctx.timeline()) else {
            return;
        };
        timeline
            .to(signs, Property::RotationZ, -0.5, WOBBLE_STEP, Ease::ExpoOut)
            .to(signs, Property::RotationZ, 0.0, WOBBLE_STEP, Ease::ExpoIn)
            .to(signs, Property::RotationZ, -0.5, WOBBLE_STEP, Ease::ExpoOut)
            .to(signs, Property::RotationZ, 0.0, WOBBLE_STEP, Ease::ExpoIn);
        debug!(queued = timeline.len(), "wobble enqueued");
    }

    fn animation_timer(&self) -> Option<TimerHandle> {
        self.timer
    }

    fn highlight_color(&self) -> Option<Color> {
        Some(Color::from_hex(0xff0000))
    }
}

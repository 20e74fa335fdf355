use std::time::Duration;

use glam::Vec3;
use tableau_anim::{Timeline, TimerHandle, TimerSet};
use tableau_assets::Typeface;
use tableau_common::Color;
use tableau_render::RenderSettings;
use tableau_scene::{SceneGraph, TextureId};

/// Camera intrinsics and initial placement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSetup {
    /// Vertical field of view, degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    /// Point to aim at on startup. `None` keeps the default -Z view.
    pub target: Option<Vec3>,
}

/// How a requested texture is sampled once decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureParams {
    pub srgb: bool,
    pub anisotropy: u16,
}

impl Default for TextureParams {
    fn default() -> Self {
        Self {
            srgb: false,
            anisotropy: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextureRequest {
    pub id: TextureId,
    pub path: String,
    pub params: TextureParams,
}

/// Assets a demo asks for while populating its scene. The controller
/// dispatches them to the loader once population is done.
#[derive(Debug, Clone, Default)]
pub struct AssetRequests {
    fonts: Vec<String>,
    textures: Vec<TextureRequest>,
}

impl AssetRequests {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn font(&mut self, path: impl Into<String>) {
        self.fonts.push(path.into());
    }

    /// Reserve a texture handle for `path`. Materials may reference the
    /// handle immediately; the image appears in the scene's texture store
    /// when the load completes.
    pub fn texture(&mut self, path: impl Into<String>, params: TextureParams) -> TextureId {
        let id = TextureId(self.textures.len() as u64 + 1);
        self.textures.push(TextureRequest {
            id,
            path: path.into(),
            params,
        });
        id
    }

    pub fn fonts(&self) -> &[String] {
        &self.fonts
    }

    pub fn textures(&self) -> &[TextureRequest] {
        &self.textures
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty() && self.textures.is_empty()
    }

    pub(crate) fn into_parts(self) -> (Vec<String>, Vec<TextureRequest>) {
        (self.fonts, self.textures)
    }
}

/// Mutable view of controller state handed to demo hooks.
pub struct StageContext<'a> {
    pub scene: &'a mut SceneGraph,
    pub(crate) timers: &'a mut TimerSet,
    pub(crate) timeline: &'a mut Option<Timeline>,
}

impl StageContext<'_> {
    /// Start a repeating timer; the demo's `timer_fired` hook receives its
    /// handle on every tick.
    pub fn start_timer(&mut self, period: Duration) -> TimerHandle {
        self.timers.start(period)
    }

    pub fn cancel_timer(&mut self, handle: TimerHandle) -> bool {
        self.timers.cancel(handle)
    }

    /// Replace the controller's timeline with an empty one whose first step
    /// waits `delay` seconds.
    pub fn start_timeline(&mut self, delay: f32) -> &mut Timeline {
        self.timeline.insert(Timeline::new(delay))
    }

    pub fn timeline(&mut self) -> Option<&mut Timeline> {
        self.timeline.as_mut()
    }
}

/// A scene plugged into the controller: constants plus lifecycle hooks.
///
/// Hooks run on the render thread in the controller's init order: camera,
/// controls, lights, meshes, renderer. Asset and timer hooks run at the
/// start of the frame in which the event is observed.
pub trait Demo {
    fn name(&self) -> &'static str;

    fn background(&self) -> Color;

    fn camera(&self) -> CameraSetup;

    /// Attach orbit controls to the camera.
    fn orbit_controls(&self) -> bool {
        false
    }

    fn render_settings(&self) -> RenderSettings {
        RenderSettings::default()
    }

    /// Add light nodes.
    fn lights(&mut self, scene: &mut SceneGraph);

    /// Add procedural nodes and request the assets later nodes depend on.
    fn meshes(&mut self, scene: &mut SceneGraph, assets: &mut AssetRequests);

    /// Per-frame scene update, called once per frame before rendering.
    fn update(&mut self, _scene: &mut SceneGraph) {}

    /// A requested font finished loading. Called once per font request.
    fn font_loaded(&mut self, _ctx: &mut StageContext<'_>, _path: &str, _font: &Typeface) {}

    /// A requested texture is now in the scene's texture store.
    fn texture_loaded(&mut self, _ctx: &mut StageContext<'_>, _request: &TextureRequest) {}

    /// A timer started through [`StageContext::start_timer`] fired.
    fn timer_fired(&mut self, _ctx: &mut StageContext<'_>, _handle: TimerHandle) {}

    /// The timer driving the demo's animation, if one is running.
    fn animation_timer(&self) -> Option<TimerHandle> {
        None
    }

    /// Color applied to nodes under the pointer. `None` disables picking.
    fn highlight_color(&self) -> Option<Color> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texture_requests_get_distinct_handles() {
        let mut requests = AssetRequests::new();
        assert!(requests.is_empty());
        let a = requests.texture("a.png", TextureParams::default());
        let b = requests.texture(
            "b.png",
            TextureParams {
                srgb: true,
                anisotropy: 16,
            },
        );
        requests.font("fonts/f.json");
        assert_ne!(a, b);
        assert_eq!(requests.textures()[1].params.anisotropy, 16);
        assert_eq!(requests.fonts(), ["fonts/f.json".to_string()]);
    }

    #[test]
    fn context_replaces_timeline() {
        let mut scene = SceneGraph::default();
        let mut timers = TimerSet::new();
        let mut timeline = None;
        let mut ctx = StageContext {
            scene: &mut scene,
            timers: &mut timers,
            timeline: &mut timeline,
        };
        assert!(ctx.timeline().is_none());
        ctx.start_timeline(0.3);
        assert!((ctx.timeline().unwrap().end() - 0.3).abs() < 1e-6);
        let handle = ctx.start_timer(Duration::from_millis(2500));
        assert!(ctx.cancel_timer(handle));
    }
}

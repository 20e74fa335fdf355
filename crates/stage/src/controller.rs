use std::path::PathBuf;
use std::time::Duration;

use glam::Vec3;
use tableau_anim::{FrameTimer, Timeline, TimerSet};
use tableau_assets::{AssetLoader, AssetStore, Pending, Typeface};
use tableau_common::{Color, NodeId, Viewport};
use tableau_input::{Action, OrbitControls, pointer_to_ndc};
use tableau_render::{DisplaySurface, RenderError, RenderSettings, Renderer};
use tableau_scene::{PerspectiveCamera, Raycaster, SceneEvent, SceneGraph, TextureImage};
use tracing::{debug, info, info_span, trace, warn};

use crate::demo::{AssetRequests, Demo, StageContext, TextureRequest};
use crate::error::StageError;

struct FontLoad {
    path: String,
    pending: Pending<Typeface>,
}

struct TextureLoad {
    request: TextureRequest,
    pending: Pending<TextureImage>,
}

/// Owns one demo's scene, camera, controls and renderer, and drives them:
/// a fixed initialization order, then one `frame` call per display refresh,
/// plus resize and pointer handlers.
pub struct SceneController<R: Renderer> {
    demo: Box<dyn Demo>,
    scene: SceneGraph,
    camera: PerspectiveCamera,
    controls: Option<OrbitControls>,
    renderer: R,
    settings: RenderSettings,
    viewport: Viewport,
    raycaster: Raycaster,
    timers: TimerSet,
    timeline: Option<Timeline>,
    assets: AssetStore,
    font_loads: Vec<FontLoad>,
    texture_loads: Vec<TextureLoad>,
    frame_timer: FrameTimer,
    frames: u64,
    frame_events: Vec<SceneEvent>,
}

impl<R: Renderer> SceneController<R> {
    /// Run the initialization sequence:
    ///
    /// 1. read the surface size, failing if there is none;
    /// 2. create the scene with the demo's background;
    /// 3. create the camera with an aspect matching the surface;
    /// 4. attach orbit controls if the demo wants them;
    /// 5. add lights;
    /// 6. add meshes and dispatch asset loads;
    /// 7. create the renderer through `make_renderer` and size it.
    pub fn new<F>(
        mut demo: Box<dyn Demo>,
        surface: &dyn DisplaySurface,
        loader: &dyn AssetLoader,
        make_renderer: F,
    ) -> Result<Self, StageError>
    where
        F: FnOnce(Viewport, RenderSettings) -> Result<R, RenderError>,
    {
        let span = info_span!("init", demo = demo.name());
        let _enter = span.enter();

        let viewport = surface.usable_size().ok_or(StageError::SurfaceUnavailable)?;
        debug!(width = viewport.width, height = viewport.height, "surface acquired");

        let mut scene = SceneGraph::new(demo.background());

        let setup = demo.camera();
        let mut camera = PerspectiveCamera::new(setup.fov, viewport.aspect(), setup.near, setup.far);
        camera.position = setup.position;
        if let Some(target) = setup.target {
            camera.look_at(target);
        }

        let controls = demo.orbit_controls().then(|| {
            let mut controls = OrbitControls::new(setup.target.unwrap_or(Vec3::ZERO), viewport);
            controls.update(&mut camera);
            controls
        });

        demo.lights(&mut scene);

        let mut requests = AssetRequests::new();
        demo.meshes(&mut scene, &mut requests);
        let (fonts, textures) = requests.into_parts();
        let font_loads = fonts
            .into_iter()
            .map(|path| FontLoad {
                pending: loader.load_font(&path),
                path,
            })
            .collect::<Vec<_>>();
        let texture_loads = textures
            .into_iter()
            .map(|request| TextureLoad {
                pending: loader.load_texture(&request.path),
                request,
            })
            .collect::<Vec<_>>();

        let settings = demo.render_settings();
        let mut renderer = make_renderer(viewport, settings)?;
        renderer.set_pixel_ratio(settings.resolve_pixel_ratio(surface.pixel_ratio()));
        renderer.set_size(viewport);

        info!(
            nodes = scene.node_count(),
            fonts = font_loads.len(),
            textures = texture_loads.len(),
            pixel_ratio = renderer.pixel_ratio(),
            "scene initialized"
        );

        Ok(Self {
            demo,
            scene,
            camera,
            controls,
            renderer,
            settings,
            viewport,
            raycaster: Raycaster::new(),
            timers: TimerSet::new(),
            timeline: None,
            assets: AssetStore::new(),
            font_loads,
            texture_loads,
            frame_timer: FrameTimer::default(),
            frames: 0,
            frame_events: Vec::new(),
        })
    }

    /// Advance and draw one frame.
    ///
    /// Timers and the timeline advance by `dt` first, then completed asset
    /// loads are applied, then the demo's update hook and the orbit controls
    /// run. A timer or timeline started by a load sees its first `dt` on the
    /// next frame. Scene changes logged up to the render are moved into
    /// [`Self::frame_events`]. Returns `Ok(None)` when the renderer skipped
    /// the frame because its surface was lost.
    pub fn frame(&mut self, dt: Duration) -> Result<Option<R::Output>, StageError> {
        let span = tracing::trace_span!("frame", n = self.frames);
        let _enter = span.enter();
        self.frames += 1;
        self.frame_timer.record(dt);

        for handle in self.timers.advance(dt) {
            trace!(handle = handle.0, "timer fired");
            let mut ctx = StageContext {
                scene: &mut self.scene,
                timers: &mut self.timers,
                timeline: &mut self.timeline,
            };
            self.demo.timer_fired(&mut ctx, handle);
        }
        if let Some(timeline) = &mut self.timeline {
            timeline.advance(dt.as_secs_f32(), &mut self.scene);
        }

        self.poll_assets();

        self.demo.update(&mut self.scene);
        if let Some(controls) = &mut self.controls {
            controls.update(&mut self.camera);
        }

        let rendered = self.renderer.render(&self.scene, &self.camera);
        self.frame_events = self.scene.drain_events();
        match rendered {
            Ok(output) => Ok(Some(output)),
            Err(e) if e.is_transient() => {
                debug!(error = %e, "frame skipped");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Apply every asset load that finished since the last frame.
    fn poll_assets(&mut self) {
        let mut fonts = Vec::new();
        self.font_loads.retain_mut(|load| match load.pending.poll_ready() {
            None => true,
            Some(result) => {
                fonts.push((std::mem::take(&mut load.path), result));
                false
            }
        });
        for (path, result) in fonts {
            match result {
                Ok(loaded) => {
                    debug!(path = %path, id = ?loaded.id, bytes = loaded.bytes, "font ready");
                    let font = self.assets.register_font(loaded);
                    let mut ctx = StageContext {
                        scene: &mut self.scene,
                        timers: &mut self.timers,
                        timeline: &mut self.timeline,
                    };
                    self.demo.font_loaded(&mut ctx, &path, &font);
                }
                Err(e) => warn!(path = %path, error = %e, "font load failed"),
            }
        }

        let mut textures = Vec::new();
        self.texture_loads.retain_mut(|load| match load.pending.poll_ready() {
            None => true,
            Some(result) => {
                textures.push((load.request.clone(), result));
                false
            }
        });
        for (request, result) in textures {
            match result {
                Ok(mut loaded) => {
                    loaded.value.srgb = request.params.srgb;
                    loaded.value.anisotropy = request.params.anisotropy;
                    debug!(
                        path = %request.path,
                        width = loaded.value.width,
                        height = loaded.value.height,
                        "texture ready"
                    );
                    let image = self.assets.register_texture(loaded);
                    self.scene.textures.insert_shared(request.id, image);
                    let mut ctx = StageContext {
                        scene: &mut self.scene,
                        timers: &mut self.timers,
                        timeline: &mut self.timeline,
                    };
                    self.demo.texture_loaded(&mut ctx, &request);
                }
                Err(e) => warn!(path = %request.path, error = %e, "texture load failed"),
            }
        }
    }

    /// Match the camera and renderer to a new surface size. Zero-sized
    /// viewports (minimized windows) are ignored.
    pub fn resize(&mut self, viewport: Viewport) {
        if !viewport.is_valid() {
            debug!(width = viewport.width, height = viewport.height, "ignoring empty resize");
            return;
        }
        self.viewport = viewport;
        self.camera.set_aspect(viewport.aspect());
        self.renderer.set_size(viewport);
        if let Some(controls) = &mut self.controls {
            controls.set_viewport(viewport);
        }
        debug!(width = viewport.width, height = viewport.height, aspect = self.camera.aspect, "resized");
    }

    /// Highlight every node under the pointer, nearest first. Returns the
    /// recolored nodes. Does nothing for demos without a highlight color.
    pub fn pointer_move(&mut self, x: f32, y: f32) -> Vec<NodeId> {
        if let Some(controls) = &mut self.controls {
            controls.pointer_move(x, y);
        }
        let Some(color) = self.demo.highlight_color() else {
            return Vec::new();
        };
        let ndc = pointer_to_ndc(x, y, self.viewport);
        self.raycaster.set_from_camera(ndc, &self.camera);
        let hits = self.raycaster.intersect_scene(&self.scene, true);

        let mut recolored = Vec::with_capacity(hits.len());
        for hit in hits {
            // Point clouds report one hit per point; recolor each node once.
            if recolored.contains(&hit.node) {
                continue;
            }
            if self.scene.set_material_color(hit.node, color) {
                recolored.push(hit.node);
            }
        }
        if !recolored.is_empty() {
            trace!(x, y, hits = recolored.len(), "pointer highlight");
        }
        recolored
    }

    /// Route a host input action to the matching handler.
    pub fn handle(&mut self, action: &Action) {
        match *action {
            Action::Resize(viewport) => self.resize(viewport),
            Action::PointerMove { x, y } => {
                self.pointer_move(x, y);
            }
            Action::ScaleFactor(ratio) => {
                let ratio = self.settings.resolve_pixel_ratio(ratio);
                self.renderer.set_pixel_ratio(ratio);
                debug!(pixel_ratio = ratio, "pixel ratio changed");
            }
            Action::PointerDown(_) | Action::PointerUp(_) | Action::Wheel(_) => {
                if let Some(controls) = &mut self.controls {
                    controls.handle(action);
                }
            }
            Action::Noop => {}
        }
    }

    /// Stop the demo's repeating animation timer. Steps already queued on
    /// the timeline still play out.
    pub fn cancel_animation(&mut self) -> bool {
        self.demo
            .animation_timer()
            .is_some_and(|handle| self.timers.cancel(handle))
    }

    pub fn demo_name(&self) -> &'static str {
        self.demo.name()
    }

    pub fn demo(&self) -> &dyn Demo {
        self.demo.as_ref()
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut SceneGraph {
        &mut self.scene
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn controls(&self) -> Option<&OrbitControls> {
        self.controls.as_ref()
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn background(&self) -> Color {
        self.scene.background()
    }

    pub fn timers(&self) -> &TimerSet {
        &self.timers
    }

    pub fn timeline(&self) -> Option<&Timeline> {
        self.timeline.as_ref()
    }

    pub fn assets(&self) -> &AssetStore {
        &self.assets
    }

    /// Asset loads still in flight.
    pub fn pending_loads(&self) -> usize {
        self.font_loads.len() + self.texture_loads.len()
    }

    /// Paths of asset loads still in flight.
    pub fn pending_paths(&self) -> Vec<PathBuf> {
        self.font_loads
            .iter()
            .map(|l| PathBuf::from(&l.path))
            .chain(self.texture_loads.iter().map(|l| PathBuf::from(&l.request.path)))
            .collect()
    }

    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    pub fn frame_timer(&self) -> &FrameTimer {
        &self.frame_timer
    }

    /// Scene changes made between the previous frame's render and the most
    /// recent one. Changes made since, such as pointer highlights, are
    /// pending on [`SceneGraph::events`] until the next frame.
    pub fn frame_events(&self) -> &[SceneEvent] {
        &self.frame_events
    }
}

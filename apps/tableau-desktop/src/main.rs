use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use tableau_assets::FsLoader;
use tableau_common::Viewport;
use tableau_input::{Action, PointerButton};
use tableau_render::DisplaySurface;
use tableau_render_wgpu::{GpuContext, WgpuRenderer};
use tableau_stage::{DemoKind, SceneController, StageConfig};
use tableau_tools::SceneInspector;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

/// Pixels of trackpad scroll per wheel line.
const PIXELS_PER_LINE: f64 = 50.0;
/// Longest frame delta fed to the controller, so a stalled window doesn't
/// fire a burst of timer ticks on resume.
const MAX_FRAME: Duration = Duration::from_millis(100);

#[derive(Parser)]
#[command(name = "tableau-desktop", about = "Tableau demo scenes in a window")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Demo to run: camera-controls (1) or typography (2)
    #[arg(short, long)]
    demo: Option<DemoKind>,

    /// Asset root directory
    #[arg(long)]
    assets: Option<PathBuf>,
}

/// Logical size and scale factor of a winit window.
struct WindowSurface<'a>(&'a Window);

impl DisplaySurface for WindowSurface<'_> {
    fn size(&self) -> Option<Viewport> {
        Some(logical_viewport(self.0.inner_size(), self.0.scale_factor()))
    }

    fn pixel_ratio(&self) -> f64 {
        self.0.scale_factor()
    }
}

fn logical_viewport(size: PhysicalSize<u32>, scale_factor: f64) -> Viewport {
    let logical: LogicalSize<u32> = size.to_logical(scale_factor);
    Viewport::new(logical.width, logical.height)
}

fn pointer_button(button: MouseButton) -> Option<PointerButton> {
    match button {
        MouseButton::Left => Some(PointerButton::Primary),
        MouseButton::Right => Some(PointerButton::Secondary),
        MouseButton::Middle => Some(PointerButton::Middle),
        _ => None,
    }
}

struct App {
    config: StageConfig,
    loader: FsLoader,
    window: Option<Arc<Window>>,
    controller: Option<SceneController<WgpuRenderer>>,
    last_frame: Instant,
    failure: Option<anyhow::Error>,
}

impl App {
    fn new(config: StageConfig) -> Self {
        Self {
            loader: FsLoader::new(&config.asset_root),
            config,
            window: None,
            controller: None,
            last_frame: Instant::now(),
            failure: None,
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(format!("tableau: {}", self.config.demo))
            .with_inner_size(LogicalSize::new(self.config.window.width, self.config.window.height));
        let window = Arc::new(event_loop.create_window(attrs).context("create window")?);

        let demo = self.config.demo.build(&self.config);
        let scale_factor = window.scale_factor();
        let target = Arc::clone(&window);
        let controller = SceneController::new(demo, &WindowSurface(&window), &self.loader, |size, settings| {
            let ratio = settings.resolve_pixel_ratio(scale_factor);
            let gpu = GpuContext::new(target, size.scaled(ratio))?;
            tracing::info!(backend = gpu.backend().to_str(), "renderer ready");
            Ok(WgpuRenderer::new(gpu, settings, size, scale_factor))
        })
        .context("start scene")?;

        window.request_redraw();
        self.window = Some(window);
        self.controller = Some(controller);
        self.last_frame = Instant::now();
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        tracing::error!("{error:#}");
        self.failure = Some(error);
        event_loop.exit();
    }
}

fn handle_key(controller: &mut SceneController<WgpuRenderer>, event_loop: &ActiveEventLoop, key: KeyCode) {
    match key {
        KeyCode::F1 => {
            tracing::info!(
                fps = controller.frame_timer().fps(),
                frames = controller.frame_count(),
                "\n{}",
                SceneInspector::report(controller.scene())
            );
        }
        KeyCode::KeyP => {
            if controller.cancel_animation() {
                tracing::info!("animation timer stopped");
            }
        }
        KeyCode::Escape => event_loop.exit(),
        _ => {}
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.start(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let (Some(window), Some(controller)) = (&self.window, &mut self.controller) else {
            return;
        };
        let scale_factor = window.scale_factor();

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                controller.handle(&Action::Resize(logical_viewport(size, scale_factor)));
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                controller.handle(&Action::ScaleFactor(scale_factor));
            }
            WindowEvent::CursorMoved { position, .. } => {
                let logical = position.to_logical::<f32>(scale_factor);
                controller.handle(&Action::PointerMove {
                    x: logical.x,
                    y: logical.y,
                });
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if let Some(button) = pointer_button(button) {
                    controller.handle(&match state {
                        ElementState::Pressed => Action::PointerDown(button),
                        ElementState::Released => Action::PointerUp(button),
                    });
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => (p.y / PIXELS_PER_LINE) as f32,
                };
                // winit reports scrolling away from the user as positive.
                controller.handle(&Action::Wheel(-lines));
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => handle_key(controller, event_loop, key),
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let dt = (now - self.last_frame).min(MAX_FRAME);
                self.last_frame = now;
                match controller.frame(dt) {
                    Ok(_) => window.request_redraw(),
                    Err(e) => {
                        let error = anyhow::Error::new(e).context("render frame");
                        tracing::error!("{error:#}");
                        self.failure = Some(error);
                        event_loop.exit();
                    }
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = StageConfig::load_or_default(cli.config.as_deref())?;
    if let Some(demo) = cli.demo {
        config.demo = demo;
    }
    if let Some(assets) = cli.assets {
        config.asset_root = assets;
    }

    let filter = match (&config.log_filter, cli.verbose) {
        (_, true) => "debug".to_string(),
        (Some(filter), false) => filter.clone(),
        (None, false) => "info".to_string(),
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    tracing::info!(demo = %config.demo, assets = %config.asset_root.display(), "tableau-desktop starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    match app.failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

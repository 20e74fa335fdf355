use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tableau_assets::FsLoader;
use tableau_common::Viewport;
use tableau_input::Action;
use tableau_render::{DebugTextRenderer, FixedSurface, RenderError, RenderSettings};
use tableau_stage::{DemoKind, SceneController, StageConfig};
use tableau_tools::SceneInspector;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tableau-cli", about = "Headless tableau runner")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Asset root directory
    #[arg(long, global = true)]
    assets: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version, crate info and available demos
    Info,
    /// Print the effective configuration as YAML
    Config,
    /// Build a demo scene, wait for its assets and print the scene report
    Inspect {
        /// camera-controls (1) or typography (2)
        #[arg(short, long)]
        demo: Option<DemoKind>,
        /// Seconds to wait for asset loads
        #[arg(long, default_value = "5")]
        timeout: u64,
    },
    /// Run a demo headless and print rendered frames
    Run {
        /// camera-controls (1) or typography (2)
        #[arg(short, long)]
        demo: Option<DemoKind>,
        /// Number of frames to run
        #[arg(short, long, default_value = "3")]
        frames: u64,
        /// Simulated frame interval in milliseconds
        #[arg(long, default_value = "16")]
        frame_ms: u64,
        #[arg(long, default_value = "800")]
        width: u32,
        #[arg(long, default_value = "600")]
        height: u32,
        /// Pointer position "x,y" in pixels, applied before the first frame
        #[arg(long, value_parser = parse_point)]
        pointer: Option<(f32, f32)>,
        /// Print every frame instead of only the last
        #[arg(long)]
        all: bool,
    },
}

fn parse_point(s: &str) -> Result<(f32, f32), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected \"x,y\", got {s:?}"))?;
    let parse = |v: &str| v.trim().parse::<f32>().map_err(|e| format!("{v:?}: {e}"));
    Ok((parse(x)?, parse(y)?))
}

fn debug_renderer(size: Viewport, settings: RenderSettings) -> Result<DebugTextRenderer, RenderError> {
    Ok(DebugTextRenderer::new(settings, size))
}

/// Run frames until every asset load settles or `timeout` passes.
fn settle(controller: &mut SceneController<DebugTextRenderer>, timeout: Duration) -> Result<()> {
    let deadline = Instant::now() + timeout;
    while controller.pending_loads() > 0 {
        if Instant::now() >= deadline {
            bail!("asset loads still pending after {timeout:?}: {:?}", controller.pending_paths());
        }
        controller.frame(Duration::ZERO)?;
        std::thread::sleep(Duration::from_millis(5));
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = StageConfig::load_or_default(cli.config.as_deref())?;
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
        .with_writer(std::io::stderr)
        .init();

    let loader = FsLoader::new(&config.asset_root);

    match cli.command {
        Commands::Info => {
            println!("tableau-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("render: {}", tableau_render::crate_info());
            println!("tools: {}", tableau_tools::crate_info());
            println!("asset root: {}", config.asset_root.display());
            println!("demos:");
            for kind in DemoKind::ALL {
                println!("  {kind}");
            }
        }
        Commands::Config => {
            print!("{}", config.to_yaml()?);
        }
        Commands::Inspect { demo, timeout } => {
            let kind = demo.unwrap_or(config.demo);
            let surface = FixedSurface::new(config.window.width, config.window.height);
            let mut controller = SceneController::new(kind.build(&config), &surface, &loader, debug_renderer)?;
            settle(&mut controller, Duration::from_secs(timeout))?;
            println!("Demo: {kind}");
            print!("{}", SceneInspector::report(controller.scene()));
            for record in controller.assets().records() {
                println!("Asset: {:?} {} ({} bytes)", record.kind, record.path, record.bytes);
            }
        }
        Commands::Run {
            demo,
            frames,
            frame_ms,
            width,
            height,
            pointer,
            all,
        } => {
            let kind = demo.unwrap_or(config.demo);
            let surface = FixedSurface::new(width, height);
            let mut controller = SceneController::new(kind.build(&config), &surface, &loader, debug_renderer)
                .with_context(|| format!("start {kind}"))?;
            if let Some((x, y)) = pointer {
                controller.handle(&Action::PointerMove { x, y });
            }

            let dt = Duration::from_millis(frame_ms);
            let mut last = None;
            for _ in 0..frames {
                // Loader threads need wall time to finish.
                std::thread::sleep(dt);
                let output = controller.frame(dt)?;
                if all {
                    if let Some(text) = &output {
                        print!("{text}");
                    }
                }
                last = output.or(last);
            }
            if !all {
                if let Some(text) = last {
                    print!("{text}");
                }
            }
            if controller.pending_loads() > 0 {
                tracing::warn!(pending = ?controller.pending_paths(), "asset loads unfinished");
            }
            println!("Frames: {} avg={:?}", controller.frame_count(), controller.frame_timer().average());
        }
    }

    Ok(())
}

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::demo::Demo;
use crate::demos::{CameraControlsDemo, TypographyDemo};
use crate::error::StageError;

/// Which demo scene to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DemoKind {
    #[default]
    CameraControls,
    Typography,
}

impl DemoKind {
    pub const ALL: [DemoKind; 2] = [DemoKind::CameraControls, DemoKind::Typography];

    pub fn as_str(self) -> &'static str {
        match self {
            DemoKind::CameraControls => "camera-controls",
            DemoKind::Typography => "typography",
        }
    }

    /// Instantiate the demo with settings from `config`.
    pub fn build(self, config: &StageConfig) -> Box<dyn Demo> {
        match self {
            DemoKind::CameraControls => {
                Box::new(CameraControlsDemo::new().with_pixel_ratio(config.pixel_ratio))
            }
            DemoKind::Typography => Box::new(
                TypographyDemo::new(config.star_seed).with_pixel_ratio(config.pixel_ratio),
            ),
        }
    }
}

impl fmt::Display for DemoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DemoKind {
    type Err = StageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "camera-controls" | "1" => Ok(DemoKind::CameraControls),
            "typography" | "2" => Ok(DemoKind::Typography),
            other => Err(StageError::UnknownDemo(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// Host configuration, usually read from a YAML file. Missing keys take
/// their defaults; command-line flags override file values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    pub demo: DemoKind,
    /// Directory font and texture paths are resolved against.
    pub asset_root: PathBuf,
    pub window: WindowConfig,
    /// Overrides the demo's pixel ratio policy.
    pub pixel_ratio: Option<f64>,
    /// Seed for the starfield positions.
    pub star_seed: u64,
    /// `tracing` filter directive, e.g. `tableau_stage=debug`.
    pub log_filter: Option<String>,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            demo: DemoKind::default(),
            asset_root: PathBuf::from("assets"),
            window: WindowConfig::default(),
            pixel_ratio: None,
            star_seed: 0x5eed,
            log_filter: None,
        }
    }
}

impl StageConfig {
    pub fn from_yaml(text: &str) -> Result<Self, StageError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn to_yaml(&self) -> Result<String, StageError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, StageError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| StageError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&text)?;
        debug!(path = %path.display(), demo = %config.demo, "config loaded");
        Ok(config)
    }

    /// Load `path` if given, otherwise use defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, StageError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

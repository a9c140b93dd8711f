use std::path::Path;

use anyhow::{Context, Result};
use canvas_core::Config;
use canvas_redraw::RedrawConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Simulation settings: canvas size plus scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    #[serde(default)]
    pub canvas: CanvasSection,
    #[serde(default)]
    pub redraw: RedrawConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanvasSection {
    #[serde(default = "default_width")]
    pub width: f64,
    #[serde(default = "default_height")]
    pub height: f64,
}

fn default_width() -> f64 {
    800.0
}

fn default_height() -> f64 {
    600.0
}

impl Default for CanvasSection {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
        }
    }
}

impl SimConfig {
    /// Settings resolved from profiled environment variables.
    pub fn from_env(env: &Config) -> Self {
        Self {
            canvas: CanvasSection {
                width: env.canvas.width,
                height: env.canvas.height,
            },
            redraw: RedrawConfig::from(&env.redraw),
        }
    }

    /// Load settings from a TOML file. Missing sections and keys take their
    /// defaults.
    pub fn load(path: &Path) -> Result<Self> {
        debug!(config_path = %path.display(), "Loading simulation config");
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse config: {}", path.display()))
    }

    /// A config file, when given, replaces the environment settings.
    pub fn resolve(path: Option<&Path>, env: &Config) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::from_env(env)),
        }
    }
}

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::LevelFilter;
use serde::Deserialize;
use tracing::{debug, info, warn};

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Settings read from `config.toml`. Every field has a default, so a missing
/// file or a partial one is fine.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub window: WindowConfig,
    pub renderer: RendererConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Vulkan App".to_owned(),
            width: 800,
            height: 600,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Pre-compiled SPIR-V for the vertex stage
    pub vertex_shader: PathBuf,
    /// Pre-compiled SPIR-V for the fragment stage
    pub fragment_shader: PathBuf,
    /// Color every framebuffer is cleared to before the triangle is drawn
    pub clear_color: [f32; 4],
    /// Enables VK_LAYER_KHRONOS_validation, failing init if it isn't installed.
    /// Defaults to on when built with the `enable_validations` feature.
    pub enable_validation_layers: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            vertex_shader: PathBuf::from("shaders/vert.spv"),
            fragment_shader: PathBuf::from("shaders/frag.spv"),
            clear_color: [0.6, 0.65, 0.4, 1.0],
            enable_validation_layers: cfg!(feature = "enable_validations"),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
        }
    }
}

impl LoggingConfig {
    pub fn level_filter(&self) -> LevelFilter {
        self.level.parse().unwrap_or(LevelFilter::Info)
    }
}

impl Config {
    /// Loads the config at `path`, falling back to defaults when it is
    /// missing or can't be parsed.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        Self::load_from_path(path).unwrap_or_else(|err| {
            warn!("Failed to load {}: {:#}. Using defaults.", path.display(), err);
            Config::default()
        })
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("Config file not found at {}, using defaults", path.display());
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::parse(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        info!("Loaded configuration from {}", path.display());
        debug!("Config: {:?}", config);
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

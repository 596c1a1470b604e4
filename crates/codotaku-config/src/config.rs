//! Configuration structs with defaults and RON persistence.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// File name of the persisted configuration inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.ron";

/// Top-level shell configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Application metadata.
    pub app: AppConfig,
    /// Window settings.
    pub window: WindowConfig,
    /// GPU device and swapchain settings.
    pub gpu: GpuConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Application metadata reported at startup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Human-readable application name.
    pub name: String,
    /// Application version string.
    pub version: String,
    /// Reverse-DNS application identifier.
    pub identifier: String,
}

/// Window configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    /// Window title.
    pub title: String,
    /// Window width in logical pixels.
    pub width: u32,
    /// Window height in logical pixels.
    pub height: u32,
    /// Whether the user may resize the window.
    pub resizable: bool,
}

/// GPU device configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GpuConfig {
    /// Backend drivers to try, in order (e.g. `"vulkan"`, `"metal"`, `"dx12"`).
    /// Empty lets the platform pick.
    pub preferred_drivers: Vec<String>,
    /// Enable backend debug layers and validation.
    pub debug_mode: bool,
    /// Use the mailbox present mode when the window supports it.
    pub prefer_low_latency: bool,
    /// Color the swapchain is cleared to every frame, as linear RGBA.
    pub clear_color: [f64; 4],
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log filter (e.g., "debug", "info", "warn,codotaku_gpu=debug").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "Codotaku".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            identifier: "com.codotaku.shell".to_string(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Codotaku".to_string(),
            width: 800,
            height: 600,
            resizable: true,
        }
    }
}

impl Default for GpuConfig {
    fn default() -> Self {
        Self {
            preferred_drivers: Vec::new(),
            debug_mode: true,
            prefer_low_latency: true,
            clear_color: [1.0, 0.0, 0.0, 1.0],
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

// --- Load / Save / Validate ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            let contents =
                std::fs::read_to_string(&config_path).map_err(|source| ConfigError::Read {
                    path: config_path.clone(),
                    source,
                })?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::Parse)?;
            config.validate()?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(|source| ConfigError::Write {
            path: config_dir.to_path_buf(),
            source,
        })?;

        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized = ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::Serialize)?;

        std::fs::write(&config_path, serialized).map_err(|source| ConfigError::Write {
            path: config_path,
            source,
        })
    }

    /// Reject values that deserialize but cannot be used.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid {
                field: "window",
                reason: format!(
                    "size must be non-zero, got {}x{}",
                    self.window.width, self.window.height
                ),
            });
        }

        if let Some(channel) = self
            .gpu
            .clear_color
            .iter()
            .find(|c| !(0.0..=1.0).contains(*c))
        {
            return Err(ConfigError::Invalid {
                field: "gpu.clear_color",
                reason: format!("channel {channel} is outside 0.0..=1.0"),
            });
        }

        if let Some(empty) = self.gpu.preferred_drivers.iter().position(|d| d.trim().is_empty()) {
            return Err(ConfigError::Invalid {
                field: "gpu.preferred_drivers",
                reason: format!("entry {empty} is empty"),
            });
        }

        Ok(())
    }
}

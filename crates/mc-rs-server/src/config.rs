use serde::Deserialize;
use std::ops::Range;
use std::path::{Path, PathBuf};
use thiserror::Error;

use mc_rs_inventory::window::{FIRST_DYNAMIC_ID, LAST_DYNAMIC_ID, OFFHAND_WINDOW_ID};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub server: ServerSection,
    pub logging: LoggingSection,
    #[serde(default)]
    pub windows: WindowsSection,
    #[serde(default)]
    pub inventory: InventorySection,
    #[serde(default)]
    pub crash_report: CrashReportSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    pub level: String,
}

/// Range of dynamically allocated window ids.
#[derive(Debug, Clone, Deserialize)]
pub struct WindowsSection {
    #[serde(default = "default_first_id")]
    pub first_id: u8,
    /// Exclusive.
    #[serde(default = "default_last_id")]
    pub last_id: u8,
}

fn default_first_id() -> u8 {
    FIRST_DYNAMIC_ID
}

fn default_last_id() -> u8 {
    LAST_DYNAMIC_ID
}

impl Default for WindowsSection {
    fn default() -> Self {
        Self {
            first_id: default_first_id(),
            last_id: default_last_id(),
        }
    }
}

impl WindowsSection {
    pub fn range(&self) -> Range<u8> {
        self.first_id..self.last_id
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct InventorySection {
    #[serde(default = "default_max_stack_size")]
    pub max_stack_size: u16,
}

fn default_max_stack_size() -> u16 {
    64
}

impl Default for InventorySection {
    fn default() -> Self {
        Self {
            max_stack_size: default_max_stack_size(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CrashReportSection {
    #[serde(default = "default_crash_directory")]
    pub directory: PathBuf,
    /// Include the source lines around the crash location.
    #[serde(default = "default_true")]
    pub send_code: bool,
    /// Include the (redacted) server configuration.
    #[serde(default = "default_true")]
    pub send_settings: bool,
    /// Include open windows and inventory snapshots.
    #[serde(default = "default_true")]
    pub include_windows: bool,
}

fn default_crash_directory() -> PathBuf {
    PathBuf::from("crashdumps")
}

fn default_true() -> bool {
    true
}

impl Default for CrashReportSection {
    fn default() -> Self {
        Self {
            directory: default_crash_directory(),
            send_code: true,
            send_settings: true,
            include_windows: true,
        }
    }
}

impl ServerConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let windows = &self.windows;
        if windows.first_id == 0 || windows.first_id >= windows.last_id {
            return Err(ConfigError::Invalid(format!(
                "windows: first_id ({}) must be positive and below last_id ({})",
                windows.first_id, windows.last_id
            )));
        }
        if windows.last_id > OFFHAND_WINDOW_ID {
            return Err(ConfigError::Invalid(format!(
                "windows: last_id ({}) overlaps the fixed window ids starting at {}",
                windows.last_id, OFFHAND_WINDOW_ID
            )));
        }
        if self.inventory.max_stack_size == 0 {
            return Err(ConfigError::Invalid(
                "inventory: max_stack_size must be positive".into(),
            ));
        }
        Ok(())
    }
}

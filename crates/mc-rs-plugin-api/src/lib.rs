//! Plugin metadata as seen by the rest of the server.
//!
//! Plugins describe themselves in a `plugin.toml`. Diagnostic code reads the
//! parsed [`PluginDescriptor`] and the plugin's source location through the
//! [`LoadedPlugin`] trait; it never inspects a loader's internals.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while reading a plugin descriptor.
#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("invalid plugin.toml: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("plugin descriptor field `{field}` must not be empty")]
    EmptyField { field: &'static str },
}

/// When a plugin is enabled during startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginLoadOrder {
    /// Before the worlds are loaded.
    Startup,
    #[default]
    PostWorld,
}

impl fmt::Display for PluginLoadOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PluginLoadOrder::Startup => f.write_str("STARTUP"),
            PluginLoadOrder::PostWorld => f.write_str("POSTWORLD"),
        }
    }
}

/// Parsed `[plugin]` section of a `plugin.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginDescriptor {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub authors: Vec<String>,
    /// Server API versions the plugin was written against.
    #[serde(default)]
    pub api: Vec<String>,
    /// Entry point (script or module) inside the plugin directory.
    #[serde(default)]
    pub main: String,
    #[serde(default)]
    pub depend: Vec<String>,
    #[serde(default)]
    pub soft_depend: Vec<String>,
    #[serde(default)]
    pub load: PluginLoadOrder,
    #[serde(default)]
    pub website: Option<String>,
}

#[derive(Deserialize)]
struct PluginToml {
    plugin: PluginDescriptor,
}

impl PluginDescriptor {
    /// Parse the content of a `plugin.toml` file.
    pub fn from_toml_str(content: &str) -> Result<Self, DescriptorError> {
        let parsed: PluginToml = toml::from_str(content)?;
        let descriptor = parsed.plugin;
        if descriptor.name.trim().is_empty() {
            return Err(DescriptorError::EmptyField { field: "name" });
        }
        if descriptor.version.trim().is_empty() {
            return Err(DescriptorError::EmptyField { field: "version" });
        }
        Ok(descriptor)
    }

    /// `name vversion`, as shown in logs and reports.
    pub fn full_name(&self) -> String {
        format!("{} v{}", self.name, self.version)
    }
}

/// A plugin the server has loaded.
pub trait LoadedPlugin: Send + Sync {
    fn descriptor(&self) -> &PluginDescriptor;

    fn is_enabled(&self) -> bool;

    /// Directory or archive the plugin was loaded from.
    fn source_path(&self) -> &Path;
}

/// A plugin loaded from a directory on disk.
#[derive(Debug, Clone)]
pub struct PluginEntry {
    descriptor: PluginDescriptor,
    source: PathBuf,
    enabled: bool,
}

impl PluginEntry {
    pub fn new(descriptor: PluginDescriptor, source: impl Into<PathBuf>) -> Self {
        Self {
            descriptor,
            source: source.into(),
            enabled: false,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

impl LoadedPlugin for PluginEntry {
    fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn source_path(&self) -> &Path {
        &self.source
    }
}

//! # Ordo Core Configuration
//!
//! File formats shared by loader configuration, plugin manifests and
//! descriptor documents, plus [`LoaderConfig`], the settings that drive a
//! load (environment, discovery directories, include/exclude filters).
use std::fmt;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::kernel::constants::DEFAULT_PLUGINS_DIR;
use crate::kernel::error::{Error, Result};
use crate::plugin_system::traits::Environment;

/// Supported configuration formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// JSON format (.json)
    Json,
    /// YAML format (.yaml, .yml) - requires "yaml-config" feature
    #[cfg(feature = "yaml-config")]
    Yaml,
    /// TOML format (.toml) - requires "toml-config" feature
    #[cfg(feature = "toml-config")]
    Toml,
}

impl ConfigFormat {
    /// Get the file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ConfigFormat::Json => "json",
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => "yaml",
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => "toml",
        }
    }

    /// Determine format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "json" => Some(ConfigFormat::Json),
            #[cfg(feature = "yaml-config")]
            "yaml" | "yml" => Some(ConfigFormat::Yaml),
            #[cfg(feature = "toml-config")]
            "toml" => Some(ConfigFormat::Toml),
            _ => None,
        }
    }

    /// Every extension recognised with the enabled features, in lookup order
    pub fn known_extensions() -> &'static [&'static str] {
        &[
            #[cfg(feature = "toml-config")]
            "toml",
            "json",
            #[cfg(feature = "yaml-config")]
            "yaml",
            #[cfg(feature = "yaml-config")]
            "yml",
        ]
    }

    /// Deserialize from string based on format
    pub fn deserialize<T: DeserializeOwned>(&self, data: &str) -> std::result::Result<T, FormatError> {
        let parsed = match self {
            ConfigFormat::Json => serde_json::from_str(data).map_err(FormatError::boxed),
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => serde_yaml::from_str(data).map_err(FormatError::boxed),
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => toml::from_str(data).map_err(FormatError::boxed),
        };
        parsed.map_err(|source| FormatError::Deserialize { format: *self, source })
    }

    /// Serialize to string based on format
    pub fn serialize<T: Serialize>(&self, value: &T) -> std::result::Result<String, FormatError> {
        let written = match self {
            ConfigFormat::Json => serde_json::to_string_pretty(value).map_err(FormatError::boxed),
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => serde_yaml::to_string(value).map_err(FormatError::boxed),
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => toml::to_string_pretty(value).map_err(FormatError::boxed),
        };
        written.map_err(|source| FormatError::Serialize { format: *self, source })
    }
}

impl fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigFormat::Json => write!(f, "JSON"),
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => write!(f, "YAML"),
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => write!(f, "TOML"),
        }
    }
}

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure converting between text and values in a [`ConfigFormat`]
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("Failed to deserialize from {format}: {source}")]
    Deserialize {
        format: ConfigFormat,
        #[source]
        source: BoxError,
    },
    #[error("Failed to serialize to {format}: {source}")]
    Serialize {
        format: ConfigFormat,
        #[source]
        source: BoxError,
    },
}

impl FormatError {
    fn boxed<E: std::error::Error + Send + Sync + 'static>(e: E) -> BoxError {
        Box::new(e)
    }
}

/// Settings for a single plugin load
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Environment plugins are checked against
    pub environment: Environment,
    /// Whether built-in core plugins take part in the load
    pub load_core_plugins: bool,
    /// Directories scanned for plugin manifests
    pub plugin_dirs: Vec<PathBuf>,
    /// When non-empty only these plugins (and their dependencies) load
    pub includes: Vec<String>,
    /// Plugins (and their dependents) kept out of the load
    pub excludes: Vec<String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            load_core_plugins: true,
            plugin_dirs: vec![PathBuf::from(DEFAULT_PLUGINS_DIR)],
            includes: Vec::new(),
            excludes: Vec::new(),
        }
    }
}

impl LoaderConfig {
    /// Parse configuration text in the given format
    pub fn parse(data: &str, format: ConfigFormat) -> std::result::Result<Self, FormatError> {
        format.deserialize(data)
    }

    /// Read configuration from a file, choosing the format by extension
    pub async fn load(path: &Path) -> Result<Self> {
        let format = ConfigFormat::from_path(path)
            .ok_or_else(|| Error::config(path, "unsupported configuration file extension"))?;
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| Error::io(e, "read_config", path.to_path_buf()))?;
        let config = Self::parse(&content, format).map_err(|e| Error::config(path, e.to_string()))?;
        log::debug!("Loaded loader configuration from {}", path.display());
        Ok(config)
    }

    /// Like [`load`](Self::load) but falls back to the defaults when the
    /// file does not exist
    pub async fn load_or_default(path: &Path) -> Result<Self> {
        let exists = fs::try_exists(path)
            .await
            .map_err(|e| Error::io(e, "check_config", path.to_path_buf()))?;
        if exists {
            Self::load(path).await
        } else {
            log::debug!("No configuration at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }
}

//! # Ordo Plugin System Errors
//!
//! [`PluginSystemError`] covers what can go wrong while reading manifests,
//! resolving versions and dependencies, transforming the descriptor and
//! running plugin hooks.
use std::path::PathBuf;

use crate::plugin_system::dependency::DependencyError;
use crate::plugin_system::version::VersionError;

#[derive(Debug, thiserror::Error)]
pub enum PluginSystemError {
    #[error("Plugin manifest error for '{path}': {message}")]
    ManifestError {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Dependency resolution failed: {0}")]
    DependencyResolution(#[from] DependencyError),

    #[error("Version parsing error: {0}")]
    VersionParsing(#[from] VersionError),

    #[error("Descriptor error: {message}")]
    DescriptorError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Plugin '{plugin_id}' failed in '{hook}': {message}")]
    HookError {
        plugin_id: String,
        hook: String,
        message: String,
    },

    #[error("Plugin manager is not initialised, '{operation}' requires a completed load")]
    NotInitialised { operation: String },

    #[error("Plugin '{0}' not found")]
    PluginNotFound(String),
}

impl PluginSystemError {
    pub fn descriptor<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        PluginSystemError::DescriptorError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn hook(plugin_id: &str, hook: &str, message: impl Into<String>) -> Self {
        PluginSystemError::HookError {
            plugin_id: plugin_id.to_string(),
            hook: hook.to_string(),
            message: message.into(),
        }
    }

    pub fn not_initialised(operation: &str) -> Self {
        PluginSystemError::NotInitialised {
            operation: operation.to_string(),
        }
    }
}

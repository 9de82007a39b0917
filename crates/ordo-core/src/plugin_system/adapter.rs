//! [`ManifestPlugin`], the [`Plugin`] implementation backed by a
//! [`PluginManifest`].
use std::path::Path;
use std::sync::{Mutex, PoisonError, RwLock};

use crate::config::ConfigFormat;
use crate::event::PluginEvent;
use crate::plugin_system::dependency::PluginDependency;
use crate::plugin_system::descriptor::Descriptor;
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::manifest::PluginManifest;
use crate::plugin_system::traits::{DescriptorContributor, Environment, Plugin};

/// A plugin described entirely by its manifest.
///
/// Every notification it receives is kept so hosts and tests can inspect
/// what was delivered. When the manifest carries a descriptor fragment the
/// plugin contributes it to the descriptor document.
#[derive(Debug)]
pub struct ManifestPlugin {
    manifest: PluginManifest,
    descriptor: RwLock<Option<serde_json::Value>>,
    received: Mutex<Vec<PluginEvent>>,
    refreshes: Mutex<usize>,
}

impl ManifestPlugin {
    pub fn new(manifest: PluginManifest) -> Self {
        let descriptor = RwLock::new(manifest.descriptor.clone());
        Self {
            manifest,
            descriptor,
            received: Mutex::new(Vec::new()),
            refreshes: Mutex::new(0),
        }
    }

    pub fn manifest(&self) -> &PluginManifest {
        &self.manifest
    }

    /// Events delivered to this plugin so far, oldest first
    pub fn received_events(&self) -> Vec<PluginEvent> {
        self.received.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// How many times [`Plugin::refresh`] succeeded
    pub fn refresh_count(&self) -> usize {
        *self.refreshes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn current_descriptor(&self) -> Option<serde_json::Value> {
        self.descriptor.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn reload_descriptor(&self, path: &Path) -> Result<(), PluginSystemError> {
        let format = ConfigFormat::from_path(path).ok_or_else(|| PluginSystemError::ManifestError {
            path: path.to_path_buf(),
            message: "unsupported manifest extension".to_string(),
            source: None,
        })?;
        let text = std::fs::read_to_string(path).map_err(|e| PluginSystemError::ManifestError {
            path: path.to_path_buf(),
            message: "could not re-read manifest".to_string(),
            source: Some(Box::new(e)),
        })?;
        let reread = PluginManifest::parse(&text, format, path)?;
        if reread.name != self.manifest.name {
            return Err(PluginSystemError::ManifestError {
                path: path.to_path_buf(),
                message: format!(
                    "manifest now names '{}' instead of '{}'",
                    reread.name, self.manifest.name
                ),
                source: None,
            });
        }
        *self.descriptor.write().unwrap_or_else(PoisonError::into_inner) = reread.descriptor;
        Ok(())
    }
}

impl Plugin for ManifestPlugin {
    fn name(&self) -> &str {
        &self.manifest.name
    }

    fn version(&self) -> &str {
        &self.manifest.version
    }

    fn source(&self) -> &str {
        &self.manifest.source
    }

    fn dependencies(&self) -> Vec<PluginDependency> {
        self.manifest.dependencies.clone()
    }

    fn load_before(&self) -> Vec<String> {
        self.manifest.load_before.clone()
    }

    fn load_after(&self) -> Vec<String> {
        self.manifest.load_after.clone()
    }

    fn evicts(&self) -> Vec<String> {
        self.manifest.evicts.clone()
    }

    fn observes(&self) -> Vec<String> {
        self.manifest.observes.clone()
    }

    fn is_enabled(&self) -> bool {
        self.manifest.enabled
    }

    fn supports_environment(&self, environment: &Environment) -> bool {
        self.manifest.supports_environment(environment)
    }

    fn notify(&self, event: &PluginEvent) -> Result<(), PluginSystemError> {
        log::debug!("Plugin '{}' notified of {}", self.manifest.name, event);
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
        Ok(())
    }

    /// Re-reads the descriptor fragment from the manifest file, if the
    /// plugin was read from one. Ordering metadata is not reloaded.
    fn refresh(&self) -> Result<(), PluginSystemError> {
        if let Some(path) = &self.manifest.path {
            self.reload_descriptor(path)?;
        }
        *self.refreshes.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        Ok(())
    }

    fn as_descriptor_contributor(&self) -> Option<&dyn DescriptorContributor> {
        if self.current_descriptor().is_some() {
            Some(self)
        } else {
            None
        }
    }
}

impl DescriptorContributor for ManifestPlugin {
    fn contribute(&self, descriptor: &mut Descriptor) -> Result<(), PluginSystemError> {
        if let Some(fragment) = self.current_descriptor() {
            descriptor.merge(&fragment);
        }
        Ok(())
    }
}

impl From<PluginManifest> for ManifestPlugin {
    fn from(manifest: PluginManifest) -> Self {
        Self::new(manifest)
    }
}

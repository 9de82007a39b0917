use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::plugin_system::registry::{PluginRegistry, VersionLookup};
use crate::plugin_system::traits::Plugin;
use crate::plugin_system::version::{VersionError, VersionRange};

/// Represents a hard dependency on another plugin
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PluginDependency {
    /// The name of the required plugin
    pub plugin_name: String,

    /// The version range that is acceptable (`None` accepts any version)
    #[serde(serialize_with = "serialize_range")]
    pub version_range: Option<VersionRange>,
}

fn serialize_range<S: serde::Serializer>(range: &Option<VersionRange>, s: S) -> Result<S::Ok, S::Error> {
    match range {
        Some(r) => s.serialize_some(r.constraint_string()),
        None => s.serialize_none(),
    }
}

/// Error that can occur when resolving dependencies
#[derive(Debug, Error)]
pub enum DependencyError {
    /// The required plugin was not found
    #[error("Required plugin not found: {0}")]
    MissingPlugin(String),

    /// The plugin was found, but the version is incompatible
    #[error("Plugin version mismatch: '{plugin_name}' requires version '{required_range}' but found '{actual_version}'")]
    IncompatibleVersion {
        plugin_name: String,
        required_range: VersionRange,
        actual_version: String,
    },

    /// The plugin never had its dependencies satisfied
    #[error("Plugin '{plugin_name}' cannot be loaded because its dependencies [{}] cannot be resolved", .unresolved.join(", "))]
    Unresolved {
        plugin_name: String,
        unresolved: Vec<String>,
    },
}

impl PluginDependency {
    /// Create a dependency with a specific version range
    pub fn new(plugin_name: &str, version_range: VersionRange) -> Self {
        Self {
            plugin_name: plugin_name.to_string(),
            version_range: Some(version_range),
        }
    }

    /// Create a dependency accepting any version
    pub fn any(plugin_name: &str) -> Self {
        Self {
            plugin_name: plugin_name.to_string(),
            version_range: None,
        }
    }

    /// Create a dependency from a raw constraint expression
    pub fn with_constraint(plugin_name: &str, constraint: &str) -> Result<Self, VersionError> {
        Ok(Self::new(plugin_name, VersionRange::from_constraint(constraint)?))
    }

    /// Check if this dependency is compatible with the given plugin version string
    pub fn is_compatible_with(&self, version_str: &str) -> bool {
        match self.version_range {
            Some(ref range) => range.matches_str(version_str),
            None => true,
        }
    }

    /// Verifies this dependency against the registry, telling a missing
    /// plugin apart from a version mismatch.
    pub fn check(&self, registry: &PluginRegistry) -> Result<(), DependencyError> {
        match registry.lookup_versioned(&self.plugin_name, self.version_range.as_ref()) {
            VersionLookup::Found(_) => Ok(()),
            VersionLookup::NotFound => Err(DependencyError::MissingPlugin(self.plugin_name.clone())),
            VersionLookup::VersionMismatch { found } => Err(DependencyError::IncompatibleVersion {
                plugin_name: self.plugin_name.clone(),
                required_range: self.version_range.clone().unwrap_or_default(),
                actual_version: found,
            }),
        }
    }
}

impl fmt::Display for PluginDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version_range {
            Some(range) => write!(f, "{} (version: {})", self.plugin_name, range.constraint_string()),
            None => write!(f, "{} (any version)", self.plugin_name),
        }
    }
}

/// True iff every declared dependency is registered with a version inside
/// its declared range. Pure function of the registry state.
pub fn dependencies_satisfied(plugin: &dyn Plugin, registry: &PluginRegistry) -> bool {
    plugin
        .dependencies()
        .iter()
        .all(|dep| registry.has_plugin_with_version(&dep.plugin_name, dep.version_range.as_ref()))
}

/// Names of the dependencies that are currently missing or out of range,
/// in declaration order.
pub fn unresolved_dependencies(plugin: &dyn Plugin, registry: &PluginRegistry) -> Vec<String> {
    plugin
        .dependencies()
        .into_iter()
        .filter(|dep| !registry.has_plugin_with_version(&dep.plugin_name, dep.version_range.as_ref()))
        .map(|dep| dep.plugin_name)
        .collect()
}

/// Checks whether `plugin` declares a dependency on `dependency` whose
/// version falls inside the declared range.
pub fn is_dependent_on(plugin: &dyn Plugin, dependency: &dyn Plugin) -> bool {
    plugin
        .dependencies()
        .iter()
        .any(|dep| dep.plugin_name == dependency.name() && dep.is_compatible_with(dependency.version()))
}

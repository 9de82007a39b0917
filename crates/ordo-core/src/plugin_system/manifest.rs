use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::config::ConfigFormat;
use crate::plugin_system::dependency::PluginDependency;
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::traits::Environment;

/// Declarative description of a plugin
#[derive(Debug, Clone, PartialEq)]
pub struct PluginManifest {
    /// Unique plugin name
    pub name: String,

    /// Plugin version
    pub version: String,

    /// Plugin description
    pub description: String,

    /// Plugin author
    pub author: String,

    /// Identifier of where the manifest came from
    pub source: String,

    /// Manifest file, when read from disk
    pub path: Option<PathBuf>,

    /// Hard dependencies, in declaration order
    pub dependencies: Vec<PluginDependency>,

    pub load_before: Vec<String>,
    pub load_after: Vec<String>,
    pub evicts: Vec<String>,
    pub observes: Vec<String>,

    pub enabled: bool,

    /// Environments the plugin supports; empty means all of them
    pub environments: Vec<Environment>,

    /// Fragment merged into the descriptor document
    pub descriptor: Option<serde_json::Value>,
}

impl PluginManifest {
    /// Create a new plugin manifest
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            description: String::new(),
            author: "Unknown".to_string(),
            source: name.to_string(),
            path: None,
            dependencies: Vec::new(),
            load_before: Vec::new(),
            load_after: Vec::new(),
            evicts: Vec::new(),
            observes: Vec::new(),
            enabled: true,
            environments: Vec::new(),
            descriptor: None,
        }
    }

    pub fn supports_environment(&self, environment: &Environment) -> bool {
        self.environments.is_empty() || self.environments.contains(environment)
    }

    /// Parse manifest text. `path` is used as the source identifier and in
    /// error messages. Unparsable dependency constraints are rejected.
    pub fn parse(text: &str, format: ConfigFormat, path: &Path) -> Result<Self, PluginSystemError> {
        let raw: RawPluginManifest = format.deserialize(text).map_err(|e| PluginSystemError::ManifestError {
            path: path.to_path_buf(),
            message: format!("Failed to parse manifest {}", format),
            source: Some(Box::new(e)),
        })?;
        raw.into_manifest(path)
    }
}

// --- Intermediate structs for deserialization ---

#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum RawDependency {
    Name(String),
    Detailed {
        name: String,
        #[serde(default)]
        version: Option<String>,
    },
}

#[derive(Deserialize, Debug)]
struct RawPluginManifest {
    name: String,
    version: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    dependencies: Vec<RawDependency>,
    #[serde(default)]
    load_before: Vec<String>,
    #[serde(default)]
    load_after: Vec<String>,
    #[serde(default)]
    evicts: Vec<String>,
    #[serde(default)]
    observes: Vec<String>,
    #[serde(default = "enabled_by_default")]
    enabled: bool,
    #[serde(default)]
    environments: Vec<Environment>,
    #[serde(default)]
    descriptor: Option<serde_json::Value>,
}

fn enabled_by_default() -> bool {
    true
}

impl RawPluginManifest {
    fn into_manifest(self, path: &Path) -> Result<PluginManifest, PluginSystemError> {
        let mut dependencies = Vec::with_capacity(self.dependencies.len());
        for raw_dep in self.dependencies {
            let dependency = match raw_dep {
                RawDependency::Name(name) | RawDependency::Detailed { name, version: None } => {
                    PluginDependency::any(&name)
                }
                RawDependency::Detailed {
                    name,
                    version: Some(constraint),
                } => PluginDependency::with_constraint(&name, &constraint).map_err(|e| {
                    PluginSystemError::ManifestError {
                        path: path.to_path_buf(),
                        message: format!(
                            "Failed to parse version constraint '{}' for dependency '{}'",
                            constraint, name
                        ),
                        source: Some(Box::new(e)),
                    }
                })?,
            };
            dependencies.push(dependency);
        }

        Ok(PluginManifest {
            name: self.name,
            version: self.version,
            description: self.description,
            author: self.author.unwrap_or_else(|| "Unknown".to_string()),
            source: path.display().to_string(),
            path: Some(path.to_path_buf()),
            dependencies,
            load_before: self.load_before,
            load_after: self.load_after,
            evicts: self.evicts,
            observes: self.observes,
            enabled: self.enabled,
            environments: self.environments,
            descriptor: self.descriptor,
        })
    }
}

/// Builder for creating a plugin manifest
pub struct ManifestBuilder {
    manifest: PluginManifest,
}

impl ManifestBuilder {
    /// Create a new manifest builder
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            manifest: PluginManifest::new(name, version),
        }
    }

    pub fn description(mut self, description: &str) -> Self {
        self.manifest.description = description.to_string();
        self
    }

    pub fn author(mut self, author: &str) -> Self {
        self.manifest.author = author.to_string();
        self
    }

    /// Set the source identifier (defaults to the plugin name)
    pub fn source(mut self, source: &str) -> Self {
        self.manifest.source = source.to_string();
        self
    }

    /// Add a dependency accepting any version
    pub fn depends_on(mut self, name: &str) -> Self {
        self.manifest.dependencies.push(PluginDependency::any(name));
        self
    }

    /// Add a dependency with a version constraint
    pub fn depends_on_version(mut self, name: &str, constraint: &str) -> Result<Self, PluginSystemError> {
        self.manifest
            .dependencies
            .push(PluginDependency::with_constraint(name, constraint)?);
        Ok(self)
    }

    pub fn load_before(mut self, name: &str) -> Self {
        self.manifest.load_before.push(name.to_string());
        self
    }

    pub fn load_after(mut self, name: &str) -> Self {
        self.manifest.load_after.push(name.to_string());
        self
    }

    pub fn evicts(mut self, name: &str) -> Self {
        self.manifest.evicts.push(name.to_string());
        self
    }

    /// Observe a plugin by name, or every plugin with `"*"`
    pub fn observes(mut self, name: &str) -> Self {
        self.manifest.observes.push(name.to_string());
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.manifest.enabled = enabled;
        self
    }

    /// Restrict the plugin to an environment; may be repeated
    pub fn environment(mut self, environment: Environment) -> Self {
        self.manifest.environments.push(environment);
        self
    }

    pub fn descriptor(mut self, fragment: serde_json::Value) -> Self {
        self.manifest.descriptor = Some(fragment);
        self
    }

    /// Build the manifest
    pub fn build(self) -> PluginManifest {
        self.manifest
    }
}

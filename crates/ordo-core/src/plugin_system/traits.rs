use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::event::PluginEvent;
use crate::plugin_system::dependency::PluginDependency;
use crate::plugin_system::descriptor::Descriptor;
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::version::VersionRange;

/// Runtime environment a load runs in
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Environment {
    Development,
    Test,
    Production,
    Custom(String),
}

impl Default for Environment {
    fn default() -> Self {
        Environment::Development
    }
}

impl FromStr for Environment {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "dev" | "development" => Environment::Development,
            "test" => Environment::Test,
            "prod" | "production" => Environment::Production,
            _ => Environment::Custom(s.trim().to_string()),
        })
    }
}

impl From<String> for Environment {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(env) => env,
            Err(never) => match never {},
        }
    }
}

impl From<Environment> for String {
    fn from(value: Environment) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
            Environment::Custom(name) => write!(f, "{}", name),
        }
    }
}

/// Context handed to plugins after a load completes
#[derive(Debug, Clone, Default)]
pub struct PluginContext {
    /// Environment the load ran in
    pub environment: Environment,
    /// Free-form settings made available to plugins
    pub settings: HashMap<String, serde_json::Value>,
}

impl PluginContext {
    pub fn new(environment: Environment) -> Self {
        Self {
            environment,
            settings: HashMap::new(),
        }
    }

    /// Add a setting, builder style
    pub fn with_setting(mut self, key: &str, value: serde_json::Value) -> Self {
        self.settings.insert(key.to_string(), value);
        self
    }
}

/// Capability: receives the [`PluginContext`] once loading completes and
/// whenever the manager's context changes.
pub trait ContextAware: Send + Sync {
    fn set_context(&self, context: &PluginContext);
}

/// Capability: contributes to the descriptor document.
pub trait DescriptorContributor: Send + Sync {
    fn contribute(&self, descriptor: &mut Descriptor) -> Result<(), PluginSystemError>;
}

/// Capability: post-load runtime configuration hook. Failures are isolated
/// per plugin.
pub trait RuntimeConfigurer: Send + Sync {
    fn configure_runtime(&self, context: &PluginContext) -> Result<(), PluginSystemError>;
}

/// Core trait that all plugins must implement
pub trait Plugin: Send + Sync {
    /// The unique name of the plugin
    fn name(&self) -> &str;

    /// The version of the plugin
    fn version(&self) -> &str;

    /// Identifier of the source the plugin was constructed from
    /// (manifest path, type name, ...)
    fn source(&self) -> &str;

    /// Hard dependencies, in declaration order
    fn dependencies(&self) -> Vec<PluginDependency>;

    /// The constraint declared for one dependency, if any
    fn dependency_version(&self, name: &str) -> Option<VersionRange> {
        self.dependencies()
            .into_iter()
            .find(|dep| dep.plugin_name == name)
            .and_then(|dep| dep.version_range)
    }

    /// Plugins this one should be ordered before, if present
    fn load_before(&self) -> Vec<String> {
        Vec::new()
    }

    /// Plugins this one should be ordered after, if present
    fn load_after(&self) -> Vec<String> {
        Vec::new()
    }

    /// Plugins removed once loading settles
    fn evicts(&self) -> Vec<String> {
        Vec::new()
    }

    /// Plugin names this plugin wants to be notified about (`"*"` for all)
    fn observes(&self) -> Vec<String> {
        Vec::new()
    }

    fn is_enabled(&self) -> bool {
        true
    }

    fn supports_environment(&self, _environment: &Environment) -> bool {
        true
    }

    /// Called for every event raised by a plugin this one observes
    fn notify(&self, _event: &PluginEvent) -> Result<(), PluginSystemError> {
        Ok(())
    }

    /// Re-read whatever the plugin was built from
    fn refresh(&self) -> Result<(), PluginSystemError> {
        Ok(())
    }

    fn as_context_aware(&self) -> Option<&dyn ContextAware> {
        None
    }

    fn as_descriptor_contributor(&self) -> Option<&dyn DescriptorContributor> {
        None
    }

    fn as_runtime_configurer(&self) -> Option<&dyn RuntimeConfigurer> {
        None
    }
}

impl fmt::Debug for dyn Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin")
            .field("name", &self.name())
            .field("version", &self.version())
            .field("source", &self.source())
            .finish_non_exhaustive()
    }
}

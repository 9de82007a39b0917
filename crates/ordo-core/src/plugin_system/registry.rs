use std::collections::HashMap;
use std::sync::Arc;

use crate::plugin_system::dependency::DependencyError;
use crate::plugin_system::observer::ObserverIndex;
use crate::plugin_system::traits::{Environment, Plugin};
use crate::plugin_system::version::VersionRange;

/// Outcome of a registration attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// Added to the registry and the load order
    Registered,
    /// Disabled, or not supported in the current environment
    Disabled,
    /// A plugin with the same name is already registered
    Duplicate,
    /// The name was evicted earlier in this run
    PreviouslyEvicted,
}

/// Result of a version-aware lookup that keeps "missing" and "wrong
/// version" apart.
#[derive(Debug, Clone)]
pub enum VersionLookup {
    Found(Arc<dyn Plugin>),
    NotFound,
    VersionMismatch { found: String },
}

/// A plugin whose dependencies never resolved
#[derive(Debug, Clone)]
pub struct FailedPlugin {
    pub plugin: Arc<dyn Plugin>,
    /// Dependency names that were missing or out of range
    pub unresolved: Vec<String>,
}

impl FailedPlugin {
    /// The resolution error this failure stands for
    pub fn error(&self) -> DependencyError {
        DependencyError::Unresolved {
            plugin_name: self.plugin.name().to_string(),
            unresolved: self.unresolved.clone(),
        }
    }
}

/// Registry for managing plugins
///
/// Owns every registered plugin by name, the registration order that the
/// final load order is built from, the failed set, pending evictions and
/// the observer index.
#[derive(Debug)]
pub struct PluginRegistry {
    /// Registered plugins by name
    plugins: HashMap<String, Arc<dyn Plugin>>,
    /// Registration order, later rearranged by soft hints
    order: Vec<String>,
    /// Originating source -> plugin name
    by_source: HashMap<String, String>,
    failed: HashMap<String, FailedPlugin>,
    /// Evicted name -> evictor name
    evicted: HashMap<String, String>,
    /// Evictor -> victims, in registration order
    deferred_evictions: Vec<(String, Vec<String>)>,
    observers: ObserverIndex,
    environment: Environment,
}

impl PluginRegistry {
    /// Create a new plugin registry for the given runtime environment
    pub fn new(environment: Environment) -> Self {
        Self {
            plugins: HashMap::new(),
            order: Vec::new(),
            by_source: HashMap::new(),
            failed: HashMap::new(),
            evicted: HashMap::new(),
            deferred_evictions: Vec::new(),
            observers: ObserverIndex::new(),
            environment,
        }
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Whether the plugin is enabled and supports the current environment
    pub fn can_register(&self, plugin: &dyn Plugin) -> bool {
        plugin.is_enabled() && plugin.supports_environment(&self.environment)
    }

    /// Register a plugin.
    ///
    /// Disabled or unsupported plugins are skipped, not treated as errors.
    /// On success the plugin's evictions are deferred and its observed names
    /// are added to the observer index.
    pub fn register(&mut self, plugin: Arc<dyn Plugin>) -> Registration {
        let name = plugin.name().to_string();

        if !self.can_register(plugin.as_ref()) {
            log::info!("Plugin '{}' is disabled and was not loaded", name);
            return Registration::Disabled;
        }
        if self.plugins.contains_key(&name) || self.failed.contains_key(&name) {
            log::warn!(
                "Plugin '{}' from '{}' ignored: a plugin with that name was already loaded or failed",
                name,
                plugin.source()
            );
            return Registration::Duplicate;
        }
        if let Some(evictor) = self.evicted.get(&name) {
            log::warn!("Plugin '{}' was evicted by '{}' and cannot be registered again", name, evictor);
            return Registration::PreviouslyEvicted;
        }

        log::info!("Plugin '{}' with version '{}' loaded successfully", name, plugin.version());

        let evictions = plugin.evicts();
        if !evictions.is_empty() {
            self.deferred_evictions.push((name.clone(), evictions));
        }
        self.observers.add(&name, plugin.observes());

        self.by_source.insert(plugin.source().to_string(), name.clone());
        self.order.push(name.clone());
        self.plugins.insert(name, plugin);
        Registration::Registered
    }

    /// Remove a plugin by name without recording an eviction
    pub fn unregister(&mut self, name: &str) -> Option<Arc<dyn Plugin>> {
        let plugin = self.plugins.remove(name)?;
        self.order.retain(|n| n != name);
        self.by_source.retain(|_, n| n != name);
        self.observers.remove_observer(name);
        Some(plugin)
    }

    /// Check if a plugin is registered by name
    pub fn has_plugin(&self, name: &str) -> bool {
        self.plugins.contains_key(name)
    }

    /// Get a plugin by name
    pub fn get_plugin(&self, name: &str) -> Option<Arc<dyn Plugin>> {
        self.plugins.get(name).cloned()
    }

    /// Get a plugin by the source it was constructed from
    pub fn get_by_source(&self, source: &str) -> Option<Arc<dyn Plugin>> {
        self.by_source.get(source).and_then(|name| self.get_plugin(name))
    }

    /// The plugin, if registered with a version inside `constraint`.
    /// `None` covers both a missing plugin and a version mismatch; use
    /// [`lookup_versioned`](Self::lookup_versioned) to tell them apart.
    pub fn lookup_with_version(&self, name: &str, constraint: Option<&VersionRange>) -> Option<Arc<dyn Plugin>> {
        match self.lookup_versioned(name, constraint) {
            VersionLookup::Found(plugin) => Some(plugin),
            VersionLookup::NotFound | VersionLookup::VersionMismatch { .. } => None,
        }
    }

    pub fn has_plugin_with_version(&self, name: &str, constraint: Option<&VersionRange>) -> bool {
        self.lookup_with_version(name, constraint).is_some()
    }

    pub fn lookup_versioned(&self, name: &str, constraint: Option<&VersionRange>) -> VersionLookup {
        let Some(plugin) = self.plugins.get(name) else {
            return VersionLookup::NotFound;
        };
        match constraint {
            Some(range) if !range.matches_str(plugin.version()) => VersionLookup::VersionMismatch {
                found: plugin.version().to_string(),
            },
            _ => VersionLookup::Found(plugin.clone()),
        }
    }

    /// Registered plugins in load order
    pub fn plugin_list(&self) -> Vec<Arc<dyn Plugin>> {
        self.order.iter().filter_map(|name| self.get_plugin(name)).collect()
    }

    /// Registered plugin names in load order
    pub fn plugin_names(&self) -> &[String] {
        &self.order
    }

    pub(crate) fn replace_order(&mut self, order: Vec<String>) {
        debug_assert_eq!(order.len(), self.order.len());
        self.order = order;
    }

    /// Get the number of registered plugins
    pub fn plugin_count(&self) -> usize {
        self.plugins.len()
    }

    /// Record a plugin whose dependencies could never be resolved.
    ///
    /// The first candidate to claim a name wins, whether it registered or
    /// failed: later failures under a taken name are ignored and return
    /// `false`.
    pub fn record_failure(&mut self, plugin: Arc<dyn Plugin>, unresolved: Vec<String>) -> bool {
        let name = plugin.name().to_string();
        if self.plugins.contains_key(&name) || self.failed.contains_key(&name) {
            log::warn!(
                "Plugin '{}' from '{}' ignored: a plugin with that name was already loaded or failed",
                name,
                plugin.source()
            );
            return false;
        }
        let failed = FailedPlugin { plugin, unresolved };
        log::warn!("{}", failed.error());
        self.failed.insert(name, failed);
        true
    }

    pub fn failed_plugins(&self) -> &HashMap<String, FailedPlugin> {
        &self.failed
    }

    pub fn is_failed(&self, name: &str) -> bool {
        self.failed.contains_key(name)
    }

    /// Evict `victim` on behalf of `evictor`, removing it from the name map,
    /// the load order and the observer index. No dependency re-check is made
    /// for plugins that depended on it.
    pub fn evict(&mut self, evictor: &str, victim: &str) -> Option<Arc<dyn Plugin>> {
        let removed = self.unregister(victim)?;
        log::info!("Plugin '{}' was evicted by '{}'", victim, evictor);
        self.evicted.insert(victim.to_string(), evictor.to_string());
        Some(removed)
    }

    /// Apply every eviction collected during registration. Returns the
    /// `(evictor, victim)` pairs that actually removed something.
    pub fn process_deferred_evictions(&mut self) -> Vec<(String, String)> {
        let deferred = std::mem::take(&mut self.deferred_evictions);
        let mut applied = Vec::new();
        for (evictor, victims) in deferred {
            for victim in victims {
                if self.evict(&evictor, &victim).is_some() {
                    applied.push((evictor.clone(), victim));
                }
            }
        }
        applied
    }

    /// Evictions still waiting to be applied
    pub fn deferred_evictions(&self) -> &[(String, Vec<String>)] {
        &self.deferred_evictions
    }

    /// The evictor of `name`, if it was evicted in this run
    pub fn evicted_by(&self, name: &str) -> Option<&str> {
        self.evicted.get(name).map(String::as_str)
    }

    pub fn observer_index(&self) -> &ObserverIndex {
        &self.observers
    }

    /// Registered plugins observing `name` in load order, never `name` itself
    pub fn observers_of(&self, name: &str) -> Vec<Arc<dyn Plugin>> {
        let observers = self.observers.observers_of(name);
        if observers.is_empty() {
            return Vec::new();
        }
        self.order
            .iter()
            .filter(|registered| observers.contains(registered.as_str()))
            .filter_map(|registered| self.get_plugin(registered))
            .collect()
    }
}

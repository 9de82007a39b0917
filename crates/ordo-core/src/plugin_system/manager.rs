use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::config::{ConfigFormat, LoaderConfig};
use crate::event::{DispatchReport, EventKind, PluginEvent, dispatch_to_observers};
use crate::plugin_system::descriptor::Descriptor;
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::filter::{IdentityFilter, PluginFilter, filter_from_config};
use crate::plugin_system::registry::{FailedPlugin, PluginRegistry};
use crate::plugin_system::scheduler::{LoadReport, LoadScheduler};
use crate::plugin_system::traits::{Environment, Plugin, PluginContext};
use crate::plugin_system::version::VersionRange;

/// Owns the registry for one application and drives its plugins.
///
/// A manager loads exactly once; everything that needs the final load order
/// fails with [`PluginSystemError::NotInitialised`] until
/// [`load_plugins`](Self::load_plugins) has run.
pub struct PluginManager {
    registry: PluginRegistry,
    filter: Box<dyn PluginFilter>,
    /// Sources of the user candidates handed to `load_plugins`
    user_sources: HashSet<String>,
    report: Option<LoadReport>,
    context: Option<PluginContext>,
}

impl PluginManager {
    pub fn new(environment: Environment) -> Self {
        Self {
            registry: PluginRegistry::new(environment),
            filter: Box::new(IdentityFilter),
            user_sources: HashSet::new(),
            report: None,
            context: None,
        }
    }

    /// Manager for the configured environment using the configured
    /// include/exclude filter
    pub fn from_config(config: &LoaderConfig) -> Self {
        Self::new(config.environment.clone())
            .with_filter(filter_from_config(&config.includes, &config.excludes))
    }

    pub fn with_filter(mut self, filter: Box<dyn PluginFilter>) -> Self {
        self.filter = filter;
        self
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    pub fn is_initialised(&self) -> bool {
        self.report.is_some()
    }

    /// Report of the completed load, if any
    pub fn load_report(&self) -> Option<&LoadReport> {
        self.report.as_ref()
    }

    /// Load core candidates followed by user candidates.
    ///
    /// The combined list is filtered once, then scheduled with every core
    /// candidate ahead of every user candidate, each group in the order the
    /// filter returned it. Calling this again after a completed load changes
    /// nothing and returns the first report.
    pub fn load_plugins(&mut self, core: Vec<Arc<dyn Plugin>>, user: Vec<Arc<dyn Plugin>>) -> LoadReport {
        if let Some(report) = &self.report {
            log::debug!("Plugins already loaded, ignoring repeated load request");
            return report.clone();
        }

        self.user_sources = user.iter().map(|p| p.source().to_string()).collect();

        let core_candidates = core.clone();
        let mut candidates = core;
        candidates.extend(user);
        let (mut candidates, user): (Vec<_>, Vec<_>) = self
            .filter
            .filter(candidates)
            .into_iter()
            .partition(|p| core_candidates.iter().any(|c| Arc::ptr_eq(c, p)));
        candidates.extend(user);

        let report = LoadScheduler::new(&mut self.registry).run(candidates);
        log::info!(
            "Loaded {} plugins ({} failed, {} evicted)",
            report.registered.len(),
            report.failed.len(),
            report.evicted.len()
        );
        self.report = Some(report.clone());

        if let Some(context) = self.context.clone() {
            self.push_context(&context);
        }
        report
    }

    /// Registered plugins in final load order
    pub fn plugin_list(&self) -> Vec<Arc<dyn Plugin>> {
        self.registry.plugin_list()
    }

    /// Registered plugins that came from the user candidates, in load order
    pub fn user_plugins(&self) -> Vec<Arc<dyn Plugin>> {
        self.registry
            .plugin_list()
            .into_iter()
            .filter(|p| self.user_sources.contains(p.source()))
            .collect()
    }

    pub fn get_plugin(&self, name: &str) -> Option<Arc<dyn Plugin>> {
        self.registry.get_plugin(name)
    }

    /// The plugin when registered with a version inside `constraint`
    pub fn get_plugin_with_version(
        &self,
        name: &str,
        constraint: &str,
    ) -> Result<Option<Arc<dyn Plugin>>, PluginSystemError> {
        let range = VersionRange::from_constraint(constraint)?;
        Ok(self.registry.lookup_with_version(name, Some(&range)))
    }

    pub fn get_by_source(&self, source: &str) -> Option<Arc<dyn Plugin>> {
        self.registry.get_by_source(source)
    }

    pub fn has_plugin(&self, name: &str) -> bool {
        self.registry.has_plugin(name)
    }

    pub fn failed_plugins(&self) -> &HashMap<String, FailedPlugin> {
        self.registry.failed_plugins()
    }

    /// Observers of `name`, never `name` itself. The result is ordered by
    /// load order, so repeated calls return the same sequence.
    pub fn observers_of(&self, name: &str) -> Vec<Arc<dyn Plugin>> {
        self.registry.observers_of(name)
    }

    /// Deliver `event` to the observers of `name`. Unknown names are ignored.
    pub fn inform_observers(&self, name: &str, event: &PluginEvent) -> DispatchReport {
        if !self.registry.has_plugin(name) {
            log::debug!("Ignoring event {} for unknown plugin '{}'", event, name);
            return DispatchReport::default();
        }
        dispatch_to_observers(&self.registry, name, event)
    }

    /// Send a `Loaded` event for every registered plugin, in load order, to
    /// that plugin's observers. Returns `(observer, error)` for every failed
    /// delivery.
    pub fn announce_loaded(&self) -> Result<Vec<(String, PluginSystemError)>, PluginSystemError> {
        self.require_initialised("announce_loaded")?;
        let mut failures = Vec::new();
        for plugin in self.registry.plugin_list() {
            let report = dispatch_to_observers(&self.registry, plugin.name(), &PluginEvent::loaded(plugin.name()));
            failures.extend(report.failures);
        }
        Ok(failures)
    }

    /// Ask a plugin to re-read its source, then tell its observers
    pub fn refresh_plugin(&self, name: &str) -> Result<DispatchReport, PluginSystemError> {
        let plugin = self
            .registry
            .get_plugin(name)
            .ok_or_else(|| PluginSystemError::PluginNotFound(name.to_string()))?;
        plugin.refresh()?;
        log::info!("Plugin '{}' refreshed", name);
        Ok(dispatch_to_observers(
            &self.registry,
            name,
            &PluginEvent::new(name, EventKind::Refreshed),
        ))
    }

    /// Evict `victim` on behalf of `evictor` and tell the victim's observers.
    /// Returns `None` when `victim` is not registered.
    pub fn evict_plugin(&mut self, evictor: &str, victim: &str) -> Option<Arc<dyn Plugin>> {
        // Eviction drops the victim's own subscriptions, not the ones to it,
        // so its observers are still reachable afterwards.
        let event = PluginEvent::new(victim, EventKind::Evicted)
            .with_data(serde_json::json!({ "evictor": evictor }));
        let removed = self.registry.evict(evictor, victim)?;
        dispatch_to_observers(&self.registry, victim, &event);
        Some(removed)
    }

    pub fn context(&self) -> Option<&PluginContext> {
        self.context.as_ref()
    }

    /// Store the context and hand it to every context-aware plugin
    pub fn set_context(&mut self, context: PluginContext) {
        self.push_context(&context);
        self.context = Some(context);
    }

    fn push_context(&self, context: &PluginContext) {
        for plugin in self.registry.plugin_list() {
            if let Some(aware) = plugin.as_context_aware() {
                aware.set_context(context);
            }
        }
    }

    /// Run every plugin's runtime configuration hook in load order. A failing
    /// hook does not stop the others; failures are returned.
    pub fn configure_runtime(&self) -> Result<Vec<(String, PluginSystemError)>, PluginSystemError> {
        self.require_initialised("configure_runtime")?;
        let context = self
            .context
            .clone()
            .unwrap_or_else(|| PluginContext::new(self.registry.environment().clone()));

        let mut failures = Vec::new();
        for plugin in self.registry.plugin_list() {
            let Some(configurer) = plugin.as_runtime_configurer() else {
                continue;
            };
            if let Err(e) = configurer.configure_runtime(&context) {
                log::error!("Error configuring runtime for plugin '{}': {}", plugin.name(), e);
                failures.push((plugin.name().to_string(), e));
            }
        }
        Ok(failures)
    }

    /// Let every descriptor contributor modify `descriptor`, in load order.
    /// The first failing contribution aborts.
    pub fn apply_descriptor(&self, descriptor: &mut Descriptor) -> Result<(), PluginSystemError> {
        self.require_initialised("apply_descriptor")?;
        for plugin in self.registry.plugin_list() {
            let Some(contributor) = plugin.as_descriptor_contributor() else {
                continue;
            };
            log::debug!("Plugin '{}' contributing to descriptor", plugin.name());
            contributor
                .contribute(descriptor)
                .map_err(|e| PluginSystemError::hook(plugin.name(), "contribute", e.to_string()))?;
        }
        Ok(())
    }

    /// Parse a descriptor document, apply every contribution and render it
    /// back in the same format
    pub fn transform_descriptor(&self, text: &str, format: ConfigFormat) -> Result<String, PluginSystemError> {
        self.require_initialised("transform_descriptor")?;
        let mut descriptor = Descriptor::parse(text, format)?;
        self.apply_descriptor(&mut descriptor)?;
        descriptor.render()
    }

    fn require_initialised(&self, operation: &str) -> Result<(), PluginSystemError> {
        if self.is_initialised() {
            Ok(())
        } else {
            Err(PluginSystemError::not_initialised(operation))
        }
    }
}

impl std::fmt::Debug for PluginManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginManager")
            .field("registry", &self.registry)
            .field("initialised", &self.is_initialised())
            .finish_non_exhaustive()
    }
}

//! Two-phase load scheduling.
//!
//! Every candidate is tried once in discovery order. Candidates whose
//! dependencies are not registered yet, or whose `load_after` targets are not
//! registered yet, are queued and retried until the queue drains. Evictions
//! are applied afterwards, then soft ordering hints rearrange the result.
use std::collections::VecDeque;
use std::sync::Arc;

use serde::Serialize;

use crate::plugin_system::dependency::{dependencies_satisfied, is_dependent_on, unresolved_dependencies};
use crate::plugin_system::ordering::apply_soft_order;
use crate::plugin_system::registry::{PluginRegistry, Registration};
use crate::plugin_system::traits::Plugin;

/// Summary of one scheduling run
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadReport {
    /// Final load order
    pub registered: Vec<String>,
    /// Plugins whose dependencies never resolved, in the order they failed
    pub failed: Vec<String>,
    /// `(evictor, victim)` pairs that removed a registered plugin
    pub evicted: Vec<(String, String)>,
    /// Plugins that were never registered: disabled, unsupported, or duplicate names
    pub skipped: Vec<String>,
}

/// Drives a single load over a registry it borrows exclusively.
pub struct LoadScheduler<'a> {
    registry: &'a mut PluginRegistry,
    pending: VecDeque<Arc<dyn Plugin>>,
    report: LoadReport,
}

impl<'a> LoadScheduler<'a> {
    pub fn new(registry: &'a mut PluginRegistry) -> Self {
        Self {
            registry,
            pending: VecDeque::new(),
            report: LoadReport::default(),
        }
    }

    /// Runs the whole load: initial pass, delayed retries, evictions and the
    /// soft ordering pass.
    pub fn run(mut self, candidates: Vec<Arc<dyn Plugin>>) -> LoadReport {
        log::debug!("Scheduling {} candidate plugins", candidates.len());
        for plugin in candidates {
            self.attempt_load(plugin);
        }

        if !self.pending.is_empty() {
            self.load_delayed();
        }

        self.report.evicted = self.registry.process_deferred_evictions();
        apply_soft_order(self.registry);
        self.report.registered = self.registry.plugin_names().to_vec();
        self.report
    }

    /// Registers the plugin right away when its dependencies are satisfied
    /// and every `load_after` target is already registered, otherwise queues
    /// it for the delayed pass.
    fn attempt_load(&mut self, plugin: Arc<dyn Plugin>) {
        if dependencies_satisfied(plugin.as_ref(), self.registry) && self.none_to_load_before(plugin.as_ref()) {
            self.register(plugin);
        } else {
            log::debug!("Delaying load of plugin '{}'", plugin.name());
            self.pending.push_back(plugin);
        }
    }

    fn none_to_load_before(&self, plugin: &dyn Plugin) -> bool {
        plugin.load_after().iter().all(|name| self.registry.has_plugin(name))
    }

    fn load_delayed(&mut self) {
        // Consecutive re-queues since the last registration or failure. Once
        // it reaches the queue length every pending plugin has been looked at
        // without anything changing.
        let mut requeued_without_progress = 0usize;

        while let Some(plugin) = self.pending.pop_front() {
            let satisfied = dependencies_satisfied(plugin.as_ref(), self.registry);
            let stalled = requeued_without_progress > self.pending.len();

            if stalled {
                if satisfied {
                    log::debug!(
                        "Load ordering hints for plugin '{}' cannot be honoured, registering it anyway",
                        plugin.name()
                    );
                    self.register(plugin);
                    requeued_without_progress = 0;
                } else if self
                    .pending
                    .iter()
                    .any(|other| dependencies_satisfied(other.as_ref(), self.registry))
                {
                    self.pending.push_back(plugin);
                    requeued_without_progress += 1;
                } else {
                    self.fail(plugin);
                    while let Some(rest) = self.pending.pop_front() {
                        self.fail(rest);
                    }
                }
                continue;
            }

            if satisfied {
                if self.has_valid_plugins_to_load_before(plugin.as_ref()) {
                    self.pending.push_back(plugin);
                    requeued_without_progress += 1;
                } else {
                    self.register(plugin);
                    requeued_without_progress = 0;
                }
            } else if self
                .pending
                .iter()
                .any(|other| is_dependent_on(plugin.as_ref(), other.as_ref()))
            {
                // Something it needs is still queued, give it another round
                self.pending.push_back(plugin);
                requeued_without_progress += 1;
            } else {
                self.fail(plugin);
                requeued_without_progress = 0;
            }
        }
    }

    /// True when a queued `load_after` target of `plugin` may still
    /// register: its own dependencies are satisfied, or some of them are
    /// queued as well. Only the first queued target found is considered.
    fn has_valid_plugins_to_load_before(&self, plugin: &dyn Plugin) -> bool {
        let load_after = plugin.load_after();
        self.pending
            .iter()
            .find(|other| load_after.iter().any(|name| name == other.name()))
            .is_some_and(|other| {
                self.has_delayed_dependencies(other.as_ref())
                    || dependencies_satisfied(other.as_ref(), self.registry)
            })
    }

    fn has_delayed_dependencies(&self, plugin: &dyn Plugin) -> bool {
        plugin
            .dependencies()
            .iter()
            .any(|dep| self.pending.iter().any(|queued| queued.name() == dep.plugin_name))
    }

    fn register(&mut self, plugin: Arc<dyn Plugin>) {
        let name = plugin.name().to_string();
        match self.registry.register(plugin) {
            Registration::Registered => {}
            Registration::Disabled | Registration::Duplicate | Registration::PreviouslyEvicted => {
                self.report.skipped.push(name);
            }
        }
    }

    fn fail(&mut self, plugin: Arc<dyn Plugin>) {
        let name = plugin.name().to_string();
        let unresolved = unresolved_dependencies(plugin.as_ref(), self.registry);
        if self.registry.record_failure(plugin, unresolved) {
            self.report.failed.push(name);
        } else {
            self.report.skipped.push(name);
        }
    }
}

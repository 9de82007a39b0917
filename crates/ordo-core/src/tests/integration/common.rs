#![cfg(test)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::event::PluginEvent;
use crate::plugin_system::adapter::ManifestPlugin;
use crate::plugin_system::dependency::PluginDependency;
use crate::plugin_system::descriptor::Descriptor;
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::manifest::ManifestBuilder;
use crate::plugin_system::registry::PluginRegistry;
use crate::plugin_system::scheduler::{LoadReport, LoadScheduler};
use crate::plugin_system::traits::{
    ContextAware, DescriptorContributor, Environment, Plugin, PluginContext, RuntimeConfigurer,
};

// ===== CANDIDATE HELPERS =====

/// Turn a manifest builder into a load candidate
pub fn candidate(builder: ManifestBuilder) -> Arc<dyn Plugin> {
    Arc::new(ManifestPlugin::new(builder.build()))
}

/// Plugin with no dependencies or hints, version 1.0.0
pub fn simple(name: &str) -> Arc<dyn Plugin> {
    candidate(ManifestBuilder::new(name, "1.0.0"))
}

pub fn names(plugins: &[Arc<dyn Plugin>]) -> Vec<String> {
    plugins.iter().map(|p| p.name().to_string()).collect()
}

/// Run a full schedule in the development environment
pub fn schedule(candidates: Vec<Arc<dyn Plugin>>) -> (PluginRegistry, LoadReport) {
    let mut registry = PluginRegistry::new(Environment::Development);
    let report = LoadScheduler::new(&mut registry).run(candidates);
    (registry, report)
}

// ===== MOCK PLUGINS =====

/// Plugin exposing every capability, with switchable failures
#[derive(Default)]
pub struct HookPlugin {
    name: String,
    observes: Vec<String>,
    dependencies: Vec<PluginDependency>,
    fail_notify: bool,
    fail_configure: bool,
    /// `None` means the plugin does not contribute to descriptors
    contribution: Option<Result<(String, serde_json::Value), String>>,
    pub context_seen: Mutex<Option<PluginContext>>,
    pub configure_calls: AtomicUsize,
    pub notified: Mutex<Vec<PluginEvent>>,
}

impl HookPlugin {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn observing(mut self, name: &str) -> Self {
        self.observes.push(name.to_string());
        self
    }

    pub fn depending_on(mut self, name: &str) -> Self {
        self.dependencies.push(PluginDependency::any(name));
        self
    }

    pub fn failing_notify(mut self) -> Self {
        self.fail_notify = true;
        self
    }

    pub fn failing_configure(mut self) -> Self {
        self.fail_configure = true;
        self
    }

    /// Contribute `value` under the top-level `key`
    pub fn contributing(mut self, key: &str, value: serde_json::Value) -> Self {
        self.contribution = Some(Ok((key.to_string(), value)));
        self
    }

    pub fn failing_contribution(mut self, message: &str) -> Self {
        self.contribution = Some(Err(message.to_string()));
        self
    }

    pub fn configure_count(&self) -> usize {
        self.configure_calls.load(Ordering::SeqCst)
    }

    pub fn seen_context(&self) -> Option<PluginContext> {
        self.context_seen.lock().unwrap().clone()
    }

    pub fn notifications(&self) -> Vec<PluginEvent> {
        self.notified.lock().unwrap().clone()
    }
}

impl Plugin for HookPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn source(&self) -> &str {
        &self.name
    }

    fn dependencies(&self) -> Vec<PluginDependency> {
        self.dependencies.clone()
    }

    fn observes(&self) -> Vec<String> {
        self.observes.clone()
    }

    fn notify(&self, event: &PluginEvent) -> Result<(), PluginSystemError> {
        if self.fail_notify {
            return Err(PluginSystemError::hook(&self.name, "notify", "observer refused event"));
        }
        self.notified.lock().unwrap().push(event.clone());
        Ok(())
    }

    fn as_context_aware(&self) -> Option<&dyn ContextAware> {
        Some(self)
    }

    fn as_runtime_configurer(&self) -> Option<&dyn RuntimeConfigurer> {
        Some(self)
    }

    fn as_descriptor_contributor(&self) -> Option<&dyn DescriptorContributor> {
        self.contribution.as_ref().map(|_| self as &dyn DescriptorContributor)
    }
}

impl ContextAware for HookPlugin {
    fn set_context(&self, context: &PluginContext) {
        *self.context_seen.lock().unwrap() = Some(context.clone());
    }
}

impl RuntimeConfigurer for HookPlugin {
    fn configure_runtime(&self, _context: &PluginContext) -> Result<(), PluginSystemError> {
        self.configure_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_configure {
            return Err(PluginSystemError::hook(&self.name, "configure_runtime", "runtime setup failed"));
        }
        Ok(())
    }
}

impl DescriptorContributor for HookPlugin {
    fn contribute(&self, descriptor: &mut Descriptor) -> Result<(), PluginSystemError> {
        match &self.contribution {
            Some(Ok((key, value))) => {
                let mut fragment = serde_json::Map::new();
                fragment.insert(key.clone(), value.clone());
                descriptor.merge(&serde_json::Value::Object(fragment));
                Ok(())
            }
            Some(Err(message)) => Err(PluginSystemError::hook(&self.name, "contribute", message.clone())),
            None => Ok(()),
        }
    }
}

use std::sync::{Mutex, PoisonError};

use ordo_core::event::PluginEvent;
use ordo_core::kernel::constants::WILDCARD;
use ordo_core::plugin_system::dependency::PluginDependency;
use ordo_core::plugin_system::descriptor::Descriptor;
use ordo_core::plugin_system::error::PluginSystemError;
use ordo_core::plugin_system::traits::{ContextAware, DescriptorContributor, Environment, Plugin, PluginContext};

use log::info;

/// Built-in plugin that observes every other plugin and keeps an audit
/// trail of the events it is told about.
#[derive(Default)]
pub struct AuditPlugin {
    trail: Mutex<Vec<String>>,
    environment: Mutex<Option<Environment>>,
}

impl AuditPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded events, oldest first, formatted as `source (kind)`
    pub fn trail(&self) -> Vec<String> {
        self.trail.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Environment received from the last context push
    pub fn environment(&self) -> Option<Environment> {
        self.environment.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Plugin for AuditPlugin {
    fn name(&self) -> &str {
        "core-audit"
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn source(&self) -> &str {
        "builtin:core-audit"
    }

    fn dependencies(&self) -> Vec<PluginDependency> {
        vec![]
    }

    fn observes(&self) -> Vec<String> {
        vec![WILDCARD.to_string()]
    }

    fn notify(&self, event: &PluginEvent) -> Result<(), PluginSystemError> {
        info!("audit: {}", event);
        self.trail
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.to_string());
        Ok(())
    }

    fn as_context_aware(&self) -> Option<&dyn ContextAware> {
        Some(self)
    }

    fn as_descriptor_contributor(&self) -> Option<&dyn DescriptorContributor> {
        Some(self)
    }
}

impl ContextAware for AuditPlugin {
    fn set_context(&self, context: &PluginContext) {
        *self.environment.lock().unwrap_or_else(PoisonError::into_inner) = Some(context.environment.clone());
    }
}

impl DescriptorContributor for AuditPlugin {
    fn contribute(&self, descriptor: &mut Descriptor) -> Result<(), PluginSystemError> {
        let environment = self
            .environment()
            .map(|env| env.to_string())
            .unwrap_or_else(|| Environment::default().to_string());
        descriptor.merge(&serde_json::json!({
            "audit": { "enabled": true, "environment": environment }
        }));
        Ok(())
    }
}

use crate::event::PluginEvent;
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::registry::PluginRegistry;

/// Outcome of delivering one event to the observers of a plugin
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// Observers that accepted the event
    pub delivered: Vec<String>,
    /// Observers whose `notify` failed, with the error they returned
    pub failures: Vec<(String, PluginSystemError)>,
}

impl DispatchReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Deliver `event` to every registered observer of `observed`.
///
/// Observers are visited in load order. A failing observer is logged and
/// recorded without stopping delivery to the rest. An unobserved name
/// delivers nothing.
pub fn dispatch_to_observers(registry: &PluginRegistry, observed: &str, event: &PluginEvent) -> DispatchReport {
    let mut report = DispatchReport::default();

    for observer in registry.observers_of(observed) {
        let name = observer.name().to_string();
        match observer.notify(event) {
            Ok(()) => report.delivered.push(name),
            Err(e) => {
                log::error!("Observer '{}' failed to handle event {}: {}", name, event, e);
                report.failures.push((name, e));
            }
        }
    }

    report
}

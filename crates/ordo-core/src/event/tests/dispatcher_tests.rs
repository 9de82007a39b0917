#![cfg(test)]

use std::sync::Arc;

use crate::event::{PluginEvent, dispatch_to_observers};
use crate::plugin_system::registry::PluginRegistry;
use crate::plugin_system::traits::{Environment, Plugin};
use crate::tests::integration::common::{HookPlugin, simple};

#[test]
fn test_dispatch_in_load_order_with_isolated_failures() {
    let first = Arc::new(HookPlugin::new("first").observing("*"));
    let broken = Arc::new(HookPlugin::new("broken").observing("source").failing_notify());
    let last = Arc::new(HookPlugin::new("last").observing("source"));

    let mut registry = PluginRegistry::new(Environment::Development);
    registry.register(first.clone() as Arc<dyn Plugin>);
    registry.register(broken.clone() as Arc<dyn Plugin>);
    registry.register(simple("source"));
    registry.register(last.clone() as Arc<dyn Plugin>);

    let report = dispatch_to_observers(&registry, "source", &PluginEvent::loaded("source"));

    assert_eq!(report.delivered, vec!["first", "last"]);
    assert_eq!(report.failures.len(), 1);
    assert!(!report.is_clean());
    assert_eq!(first.notifications().len(), 1);
    assert_eq!(last.notifications()[0].source, "source");
}

#[test]
fn test_observer_is_never_notified_about_itself() {
    let watcher = Arc::new(HookPlugin::new("watcher").observing("*"));
    let mut registry = PluginRegistry::new(Environment::Development);
    registry.register(watcher.clone() as Arc<dyn Plugin>);

    let report = dispatch_to_observers(&registry, "watcher", &PluginEvent::loaded("watcher"));
    assert!(report.delivered.is_empty());
    assert!(report.is_clean());
    assert!(watcher.notifications().is_empty());
}

#![cfg(test)]

use std::sync::Arc;

use crate::plugin_system::manager::PluginManager;
use crate::plugin_system::manifest::ManifestBuilder;
use crate::plugin_system::traits::{Environment, Plugin};
use crate::tests::integration::common::{candidate, names, schedule, simple};

#[test]
fn test_independent_plugins_keep_discovery_order_core_first() {
    let mut manager = PluginManager::new(Environment::Development);
    let report = manager.load_plugins(
        vec![simple("core-a"), simple("core-b")],
        vec![simple("user-a"), simple("user-b"), simple("user-c")],
    );

    assert_eq!(report.registered, vec!["core-a", "core-b", "user-a", "user-b", "user-c"]);
    assert_eq!(names(&manager.plugin_list()), report.registered);
    assert_eq!(names(&manager.user_plugins()), vec!["user-a", "user-b", "user-c"]);
}

#[test]
fn test_core_then_dependent_user_plugin() {
    let core1 = candidate(ManifestBuilder::new("core1", "1.2"));
    let app = candidate(ManifestBuilder::new("app", "1.0").depends_on_version("core1", ">=1.0").unwrap());

    let mut manager = PluginManager::new(Environment::Development);
    let report = manager.load_plugins(vec![core1], vec![app]);

    assert_eq!(report.registered, vec!["core1", "app"]);
    assert!(report.failed.is_empty());
}

#[test]
fn test_dependency_discovered_later_registers_first() {
    let app = candidate(ManifestBuilder::new("app", "1.0").depends_on("lib"));
    let (registry, report) = schedule(vec![app, simple("lib")]);

    assert_eq!(report.registered, vec!["lib", "app"]);
    assert!(registry.has_plugin("lib"));
}

#[test]
fn test_dependency_chain_in_reverse_discovery_order() {
    let c = candidate(ManifestBuilder::new("c", "1.0").depends_on("b"));
    let b = candidate(ManifestBuilder::new("b", "1.0").depends_on("a"));
    let (_, report) = schedule(vec![c, b, simple("a")]);

    assert_eq!(report.registered, vec!["a", "b", "c"]);
    assert!(report.failed.is_empty());
}

#[test]
fn test_missing_dependency_ends_in_failed_map() {
    let x = candidate(ManifestBuilder::new("x", "1.0").depends_on_version("y", "1.0").unwrap());
    let (registry, report) = schedule(vec![x]);

    assert!(report.registered.is_empty());
    assert_eq!(report.failed, vec!["x"]);
    let failed = &registry.failed_plugins()["x"];
    assert_eq!(failed.unresolved, vec!["y"]);
    assert!(!registry.has_plugin("x"));
}

#[test]
fn test_unsatisfiable_version_fails_but_others_load() {
    let base = candidate(ManifestBuilder::new("base", "1.0"));
    let needs_new = candidate(ManifestBuilder::new("needs-new", "1.0").depends_on_version("base", ">=2.0").unwrap());
    let (registry, report) = schedule(vec![base, needs_new, simple("other")]);

    assert_eq!(report.registered, vec!["base", "other"]);
    assert_eq!(report.failed, vec!["needs-new"]);
    assert!(!registry.plugin_names().contains(&"needs-new".to_string()));
}

#[test]
fn test_dependents_of_failed_plugin_also_fail() {
    let top = candidate(ManifestBuilder::new("top", "1.0").depends_on("middle"));
    let middle = candidate(ManifestBuilder::new("middle", "1.0").depends_on("missing"));
    let (registry, report) = schedule(vec![top, middle]);

    assert!(report.registered.is_empty());
    assert_eq!(report.failed.len(), 2);
    assert_eq!(registry.failed_plugins()["top"].unresolved, vec!["middle"]);
    assert_eq!(registry.failed_plugins()["middle"].unresolved, vec!["missing"]);
}

#[test]
fn test_load_after_defers_until_target_registered() {
    let a = candidate(ManifestBuilder::new("A", "1.0").load_after("B"));
    let (_, report) = schedule(vec![a, simple("B")]);

    assert_eq!(report.registered, vec!["B", "A"]);
}

#[test]
fn test_load_after_waits_for_pending_target_with_dependencies() {
    // A must come after B; B itself waits on C, discovered last.
    let a = candidate(ManifestBuilder::new("A", "1.0").load_after("B"));
    let b = candidate(ManifestBuilder::new("B", "1.0").depends_on("C"));
    let (_, report) = schedule(vec![a, b, simple("C")]);

    assert_eq!(report.registered, vec!["C", "B", "A"]);
}

#[test]
fn test_load_after_unknown_name_still_registers() {
    let a = candidate(ManifestBuilder::new("A", "1.0").load_after("ghost"));
    let (_, report) = schedule(vec![a, simple("B")]);

    assert_eq!(report.registered, vec!["B", "A"]);
}

#[test]
fn test_eviction_removes_victim_after_load() {
    let a = candidate(ManifestBuilder::new("A", "1.0").evicts("B"));
    let (registry, report) = schedule(vec![a, simple("B")]);

    assert_eq!(report.registered, vec!["A"]);
    assert_eq!(report.evicted, vec![("A".to_string(), "B".to_string())]);
    assert!(registry.get_plugin("B").is_none());
    assert_eq!(registry.evicted_by("B"), Some("A"));
}

#[test]
fn test_eviction_does_not_revalidate_dependents() {
    let a = candidate(ManifestBuilder::new("A", "1.0").evicts("V"));
    let w = candidate(ManifestBuilder::new("W", "1.0").depends_on("V"));
    let (registry, report) = schedule(vec![a, simple("V"), w]);

    assert_eq!(report.registered, vec!["A", "W"]);
    assert!(!registry.has_plugin("V"));
    assert!(registry.has_plugin("W"));
    assert!(registry.failed_plugins().is_empty());
}

#[test]
fn test_evicting_unknown_plugin_is_ignored() {
    let a = candidate(ManifestBuilder::new("A", "1.0").evicts("nobody"));
    let (_, report) = schedule(vec![a]);

    assert_eq!(report.registered, vec!["A"]);
    assert!(report.evicted.is_empty());
}

#[test]
fn test_load_before_hint_reorders() {
    let b = simple("B");
    let a = candidate(ManifestBuilder::new("A", "1.0").load_before("B"));
    let (_, report) = schedule(vec![b, simple("X"), a]);

    let pos = |n: &str| report.registered.iter().position(|r| r == n).unwrap();
    assert!(pos("A") < pos("B"));
    assert_eq!(report.registered, vec!["A", "B", "X"]);
}

#[test]
fn test_wildcard_observer_sees_everyone_but_itself() {
    let observer = candidate(ManifestBuilder::new("O", "1.0").observes("*"));
    let (registry, _) = schedule(vec![simple("M1"), observer, simple("M2")]);

    for name in ["M1", "M2"] {
        assert_eq!(names(&registry.observers_of(name)), vec!["O"]);
    }
    assert!(registry.observers_of("O").is_empty());
}

#[test]
fn test_hard_dependency_cycle_terminates_with_failures() {
    let a = candidate(ManifestBuilder::new("A", "1.0").depends_on("B"));
    let b = candidate(ManifestBuilder::new("B", "1.0").depends_on("A"));
    let (registry, report) = schedule(vec![a, b, simple("C")]);

    assert_eq!(report.registered, vec!["C"]);
    assert_eq!(report.failed.len(), 2);
    assert_eq!(registry.failed_plugins()["A"].unresolved, vec!["B"]);
    assert_eq!(registry.failed_plugins()["B"].unresolved, vec!["A"]);
}

#[test]
fn test_soft_hint_cycle_terminates_with_both_registered() {
    let a = candidate(ManifestBuilder::new("A", "1.0").load_after("B"));
    let b = candidate(ManifestBuilder::new("B", "1.0").load_after("A"));
    let (_, report) = schedule(vec![a, b]);

    let mut registered = report.registered.clone();
    registered.sort();
    assert_eq!(registered, vec!["A", "B"]);
    assert!(report.failed.is_empty());
}

#[test]
fn test_never_registered_and_failed_at_once() {
    let candidates: Vec<Arc<dyn Plugin>> = vec![
        candidate(ManifestBuilder::new("a", "1.0").depends_on("b")),
        candidate(ManifestBuilder::new("b", "1.0").depends_on("missing")),
        candidate(ManifestBuilder::new("c", "1.0").load_after("a")),
        simple("d"),
    ];
    let (registry, report) = schedule(candidates);

    for name in registry.plugin_names() {
        assert!(!registry.is_failed(name), "{} is both registered and failed", name);
    }
    assert_eq!(report.registered, vec!["d", "c"]);
}

#[test]
fn test_name_that_failed_is_not_registered_by_a_later_duplicate() {
    let broken = candidate(ManifestBuilder::new("x", "1.0").source("s1").depends_on("missing"));
    let deferred = candidate(ManifestBuilder::new("x", "1.0").source("s2").load_after("ghost"));
    let (registry, report) = schedule(vec![broken, deferred]);

    assert!(registry.is_failed("x"));
    assert!(!registry.has_plugin("x"));
    assert!(report.registered.is_empty());
    assert_eq!(report.failed, vec!["x"]);
    assert_eq!(report.skipped, vec!["x"]);
}

#[test]
fn test_disabled_and_environment_restricted_plugins_are_skipped() {
    let disabled = candidate(ManifestBuilder::new("off", "1.0").enabled(false));
    let prod_only = candidate(ManifestBuilder::new("prod-only", "1.0").environment(Environment::Production));
    let (registry, report) = schedule(vec![disabled, prod_only, simple("on")]);

    assert_eq!(report.registered, vec!["on"]);
    assert_eq!(report.skipped, vec!["off", "prod-only"]);
    assert!(registry.failed_plugins().is_empty());
}

#[test]
fn test_dependency_on_disabled_plugin_fails() {
    let disabled = candidate(ManifestBuilder::new("off", "1.0").enabled(false));
    let user = candidate(ManifestBuilder::new("user", "1.0").depends_on("off"));
    let (registry, report) = schedule(vec![disabled, user]);

    assert_eq!(report.failed, vec!["user"]);
    assert_eq!(registry.failed_plugins()["user"].unresolved, vec!["off"]);
}

#[test]
fn test_duplicate_name_keeps_first_registration() {
    let first = candidate(ManifestBuilder::new("dup", "1.0").source("first"));
    let second = candidate(ManifestBuilder::new("dup", "2.0").source("second"));
    let (registry, report) = schedule(vec![first, second]);

    assert_eq!(report.registered, vec!["dup"]);
    assert_eq!(report.skipped, vec!["dup"]);
    assert_eq!(registry.get_plugin("dup").unwrap().version(), "1.0");
    assert!(registry.get_by_source("second").is_none());
}

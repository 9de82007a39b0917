//! Soft ordering pass run once registration and eviction have settled.
//!
//! Each registered plugin, taken in registration order, is moved directly in
//! front of any `load_before` target currently placed ahead of it, then
//! directly behind any `load_after` target currently placed behind it. This
//! is a single pass: conflicting hints are settled by whichever adjustment
//! runs last and hint cycles are not detected. Hints naming plugins that are
//! not registered are ignored.
use crate::plugin_system::registry::PluginRegistry;

fn position(order: &[String], name: &str) -> Option<usize> {
    order.iter().position(|n| n == name)
}

/// Computes the soft-hint adjusted order without touching the registry.
pub fn sort_by_soft_hints(registry: &PluginRegistry) -> Vec<String> {
    let original = registry.plugin_names().to_vec();
    let mut sorted = original.clone();

    for name in &original {
        let Some(plugin) = registry.get_plugin(name) else {
            continue;
        };

        for before in plugin.load_before() {
            let (Some(i), Some(j)) = (position(&sorted, name), position(&sorted, &before)) else {
                continue;
            };
            if i > j {
                let moved = sorted.remove(i);
                sorted.insert(j, moved);
            }
        }

        for after in plugin.load_after() {
            let (Some(i), Some(j)) = (position(&sorted, name), position(&sorted, &after)) else {
                continue;
            };
            if i < j {
                // Removing at i shifts the target to j - 1, so inserting at j
                // lands right behind it.
                let moved = sorted.remove(i);
                sorted.insert(j, moved);
            }
        }
    }

    sorted
}

/// Rewrites the registry's load order using [`sort_by_soft_hints`].
pub fn apply_soft_order(registry: &mut PluginRegistry) {
    let sorted = sort_by_soft_hints(registry);
    if sorted.as_slice() != registry.plugin_names() {
        log::debug!("Soft ordering hints rearranged load order to [{}]", sorted.join(", "));
    }
    registry.replace_order(sorted);
}

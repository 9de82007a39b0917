//! Candidate filters applied once to the combined core and user candidates
//! before scheduling. Filters never reorder what they keep.
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::plugin_system::traits::Plugin;

pub trait PluginFilter: Send + Sync {
    fn filter(&self, candidates: Vec<Arc<dyn Plugin>>) -> Vec<Arc<dyn Plugin>>;
}

/// Keeps every candidate
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityFilter;

impl PluginFilter for IdentityFilter {
    fn filter(&self, candidates: Vec<Arc<dyn Plugin>>) -> Vec<Arc<dyn Plugin>> {
        candidates
    }
}

/// Keeps the named plugins and, transitively, the candidates they depend on
#[derive(Debug, Clone)]
pub struct IncludeFilter {
    names: HashSet<String>,
}

impl IncludeFilter {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl PluginFilter for IncludeFilter {
    fn filter(&self, candidates: Vec<Arc<dyn Plugin>>) -> Vec<Arc<dyn Plugin>> {
        let mut by_name: HashMap<&str, &Arc<dyn Plugin>> = HashMap::new();
        for candidate in &candidates {
            by_name.entry(candidate.name()).or_insert(candidate);
        }

        let mut keep: HashSet<String> = HashSet::new();
        let mut stack: Vec<String> = self.names.iter().cloned().collect();
        while let Some(name) = stack.pop() {
            let Some(plugin) = by_name.get(name.as_str()) else {
                continue;
            };
            if !keep.insert(name) {
                continue;
            }
            for dep in plugin.dependencies() {
                if !keep.contains(&dep.plugin_name) {
                    stack.push(dep.plugin_name);
                }
            }
        }

        let kept: Vec<_> = candidates.into_iter().filter(|p| keep.contains(p.name())).collect();
        log::debug!("Include filter kept {} candidates", kept.len());
        kept
    }
}

/// Drops the named plugins and every candidate that transitively depends on one
#[derive(Debug, Clone)]
pub struct ExcludeFilter {
    names: HashSet<String>,
}

impl ExcludeFilter {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl PluginFilter for ExcludeFilter {
    fn filter(&self, candidates: Vec<Arc<dyn Plugin>>) -> Vec<Arc<dyn Plugin>> {
        let mut excluded = self.names.clone();
        loop {
            let newly: Vec<String> = candidates
                .iter()
                .filter(|p| !excluded.contains(p.name()))
                .filter(|p| p.dependencies().iter().any(|d| excluded.contains(&d.plugin_name)))
                .map(|p| p.name().to_string())
                .collect();
            if newly.is_empty() {
                break;
            }
            excluded.extend(newly);
        }

        candidates
            .into_iter()
            .filter(|p| {
                let drop = excluded.contains(p.name());
                if drop {
                    log::info!("Plugin '{}' excluded from loading", p.name());
                }
                !drop
            })
            .collect()
    }
}

/// Filter for the configured include/exclude lists. Includes win when both
/// are given.
pub fn filter_from_config(includes: &[String], excludes: &[String]) -> Box<dyn PluginFilter> {
    if !includes.is_empty() {
        if !excludes.is_empty() {
            log::warn!("Both includes and excludes are configured, excludes are ignored");
        }
        Box::new(IncludeFilter::new(includes.iter().cloned()))
    } else if !excludes.is_empty() {
        Box::new(ExcludeFilter::new(excludes.iter().cloned()))
    } else {
        Box::new(IdentityFilter)
    }
}

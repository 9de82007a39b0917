use std::collections::{HashMap, HashSet};

use crate::kernel::constants::WILDCARD;

/// Observed name -> names of the plugins observing it.
///
/// Entries are added when a plugin registers. Self-observation is only
/// filtered out when querying.
#[derive(Debug, Default, Clone)]
pub struct ObserverIndex {
    index: HashMap<String, HashSet<String>>,
}

impl ObserverIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `observer` as interested in each of `observed`
    pub fn add<I, S>(&mut self, observer: &str, observed: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in observed {
            self.index
                .entry(name.into())
                .or_default()
                .insert(observer.to_string());
        }
    }

    /// Drop every subscription held by `observer`
    pub fn remove_observer(&mut self, observer: &str) {
        for observers in self.index.values_mut() {
            observers.remove(observer);
        }
        self.index.retain(|_, observers| !observers.is_empty());
    }

    /// Observers of `name`, wildcard subscribers included, never `name` itself.
    pub fn observers_of(&self, name: &str) -> HashSet<String> {
        let mut result: HashSet<String> = self.index.get(name).cloned().unwrap_or_default();
        if let Some(wildcard) = self.index.get(WILDCARD) {
            result.extend(wildcard.iter().cloned());
        }
        result.remove(name);
        result
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

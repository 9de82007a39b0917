//! # Ordo Core Event System
//!
//! Events raised on behalf of a plugin and delivered to the plugins that
//! observe it. Delivery is synchronous and happens in the caller's thread;
//! see [`dispatcher`] for the delivery loop.
pub mod dispatcher;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use dispatcher::{DispatchReport, dispatch_to_observers};

/// What happened to the plugin raising the event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// The plugin finished loading
    Loaded,
    /// The plugin re-read its source
    Refreshed,
    /// The plugin was evicted by another plugin
    Evicted,
    /// Something the plugin manages changed
    Changed,
    /// Application specific event
    Custom(String),
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Loaded => write!(f, "loaded"),
            EventKind::Refreshed => write!(f, "refreshed"),
            EventKind::Evicted => write!(f, "evicted"),
            EventKind::Changed => write!(f, "changed"),
            EventKind::Custom(name) => write!(f, "custom:{}", name),
        }
    }
}

/// Event raised by (or on behalf of) a plugin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginEvent {
    /// Name of the plugin the event is about
    pub source: String,
    pub kind: EventKind,
    /// Arbitrary payload
    #[serde(default)]
    pub data: serde_json::Value,
}

impl PluginEvent {
    pub fn new(source: &str, kind: EventKind) -> Self {
        Self {
            source: source.to_string(),
            kind,
            data: serde_json::Value::Null,
        }
    }

    /// Attach a payload, builder style
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }

    pub fn loaded(source: &str) -> Self {
        Self::new(source, EventKind::Loaded)
    }

    pub fn changed(source: &str, data: serde_json::Value) -> Self {
        Self::new(source, EventKind::Changed).with_data(data)
    }
}

impl fmt::Display for PluginEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.source, self.kind)
    }
}

#[cfg(test)]
mod tests;

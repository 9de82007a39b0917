pub mod config;
pub mod event;
pub mod kernel;
pub mod plugin_system;

// Re-export key public types/traits for easier use by the binary and plugins
pub use config::{ConfigFormat, LoaderConfig};
pub use event::{EventKind, PluginEvent};
pub use kernel::error::Error as KernelError;
pub use plugin_system::{Plugin, PluginManager, PluginManifest, PluginRegistry, PluginSystemError};

#[cfg(test)]
mod tests;

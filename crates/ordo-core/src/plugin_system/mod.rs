//! # Ordo Core Plugin System
//!
//! Decides which plugins load, in what order, and who hears about what.
//! Candidates come from built-in core plugins and from manifests discovered
//! on disk; the scheduler registers each one once its hard dependencies are
//! present, retries the rest until nothing more can change, applies
//! evictions and finally rearranges the order by soft hints.
//!
//! ## Key Submodules and Responsibilities:
//!
//! - **[`traits`]**: The [`Plugin`] trait and the optional capabilities a
//!   plugin can expose (context, descriptor contributions, runtime hooks).
//! - **[`version`]** and **[`dependency`]**: Version constraint parsing and
//!   the dependency checks the scheduler relies on.
//! - **[`registry`]**: The [`PluginRegistry`] owning registered, failed and
//!   evicted plugins plus the observer index.
//! - **[`scheduler`]**: Initial pass and delayed retry loop
//!   ([`LoadScheduler`]).
//! - **[`ordering`]**: The soft-hint ordering pass.
//! - **[`filter`]**: Include/exclude filters applied to candidates.
//! - **[`manifest`]**, **[`adapter`]** and **[`loader`]**: Declarative
//!   plugins and their discovery on disk.
//! - **[`descriptor`]**: The document plugins contribute to.
//! - **[`manager`]**: The [`PluginManager`] façade tying it all together.
pub mod adapter;
pub mod dependency;
pub mod descriptor;
pub mod error;
pub mod filter;
pub mod loader;
pub mod manager;
pub mod manifest;
pub mod observer;
pub mod ordering;
pub mod registry;
pub mod scheduler;
pub mod traits;
pub mod version;

pub use adapter::ManifestPlugin;
pub use dependency::PluginDependency;
pub use descriptor::Descriptor;
pub use error::PluginSystemError;
pub use loader::{CandidateSource, PluginLoader};
pub use manager::PluginManager;
pub use manifest::{ManifestBuilder, PluginManifest};
pub use registry::PluginRegistry;
pub use scheduler::{LoadReport, LoadScheduler};
pub use traits::{Environment, Plugin, PluginContext};
pub use version::VersionRange;

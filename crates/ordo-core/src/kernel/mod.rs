//! # Ordo Core Kernel
//!
//! Crate-wide error type and constants shared by every subsystem.
pub mod constants;
pub mod error;

pub use error::{Error, Result};

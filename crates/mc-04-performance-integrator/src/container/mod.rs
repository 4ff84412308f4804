//! # Module Core Container
//!
//! Explicitly constructed owner of all four components, handed to host
//! modules instead of process-wide instances.

pub mod config;
pub mod module_core;

pub use self::config::CoreConfig;
pub use self::module_core::ModuleCore;

//! Planning algorithms for the Startup Optimizer
//!
//! Contains:
//! - Priority load ordering
//! - Dependency-layered batching
//! - Dependency validation and resolution

pub mod batching;

pub use batching::{
    create_load_batches, optimize_load_order, resolve_dependencies, validate_dependencies,
    CycleHandling, ModuleRegistry,
};

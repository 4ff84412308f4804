//! Domain layer for the Startup Optimizer

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::{ModuleLoadError, OptimizerError};

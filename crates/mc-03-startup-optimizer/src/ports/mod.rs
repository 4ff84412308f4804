//! Ports layer for the Startup Optimizer

pub mod outbound;

pub use outbound::ModuleLoader;

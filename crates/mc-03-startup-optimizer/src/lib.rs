//! # mc-03-startup-optimizer
//!
//! Dependency-aware module loading for the orchestration core.
//!
//! ## Architecture
//!
//! - **Domain**: load metadata, sessions, startup metrics
//! - **Algorithms**: priority ordering, dependency-layered batching,
//!   dependency validation and resolution
//! - **Ports**: outbound [`ModuleLoader`] that actually brings modules up
//! - **Optimizer**: sessions, preload/lazy queues, adaptive tuning
//!
//! Batches run one after another with a full barrier; the modules of one
//! batch load concurrently on the shared worker pool, each bounded by the
//! configured load timeout.

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod algorithms;
pub mod config;
pub mod domain;
pub mod events;
pub mod optimizer;
pub mod ports;
pub mod queues;

pub use config::OptimizerConfig;
pub use domain::entities::*;
pub use domain::errors::{ModuleLoadError, OptimizerError};
pub use events::{OptimizerEvent, LAZY_SESSION, PRELOAD_SESSION};
pub use optimizer::StartupOptimizer;
pub use ports::outbound::ModuleLoader;

//! # Performance Integrator
//!
//! Composes the communication bus, resource manager and startup optimizer,
//! scores their combined health and tunes them at runtime.
//!
//! ## Health Score
//!
//! `100 - Σ penalties` over memory pressure, bus latency, cache hit ratio,
//! module load time and message drop rate. See [`score`].
//!
//! | Score | Level |
//! |-------|-------|
//! | ≥ 90 | Excellent |
//! | ≥ 75 | Good |
//! | ≥ 60 | Fair |
//! | < 60 | Poor |
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mc_04_performance_integrator::{CoreConfig, ModuleCore};
//!
//! let core = ModuleCore::new(CoreConfig::default(), Arc::new(MyLoader));
//! core.initialize();
//! let session = core.load_modules(vec!["settings".into(), "ui".into()]).await;
//! let health = core.performance_integrator().update_performance_metrics();
//! core.shutdown();
//! ```

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod container;
pub mod events;
pub mod integrator;
pub mod metrics;
pub mod recommendations;
pub mod score;

pub use config::IntegratorConfig;
pub use container::{CoreConfig, ModuleCore};
pub use events::{severity, IntegratorEvent, OptimizationScope};
pub use integrator::PerformanceIntegrator;
pub use metrics::SystemPerformanceMetrics;
pub use recommendations::{
    generate_recommendations, OptimizationAction, OptimizationCategory,
    OptimizationRecommendation, AUTO_APPLY_MIN_PRIORITY,
};
pub use score::{performance_score, PerformanceLevel, ScoreInputs};

//! # Shared Types Crate
//!
//! Primitives used by every orchestration component.
//!
//! ## Contents
//!
//! - [`Payload`]: opaque value carried by bus messages and stored resources.
//! - [`Clock`]: millisecond wall clock, swappable for [`ManualClock`] in tests.
//! - [`SizeEstimator`]: pluggable byte-size estimate used for payload caps and
//!   cache accounting.
//! - [`WorkerPool`]: semaphore-bounded spawner shared by async sends and
//!   module loads.
//! - [`spawn_periodic`]: interval loop behind every component timer.

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod clock;
pub mod services;
pub mod size;
pub mod timer;
pub mod worker_pool;

pub use clock::{Clock, ManualClock, SharedClock, SystemClock, Timestamp};
pub use services::CoreServices;
pub use size::{JsonSizeEstimator, SharedSizeEstimator, SizeEstimator};
pub use timer::{abort_all, spawn_periodic};
pub use worker_pool::WorkerPool;

/// Opaque value exchanged between modules.
pub type Payload = serde_json::Value;

/// Metadata attached to messages and resources.
pub type Metadata = std::collections::BTreeMap<String, serde_json::Value>;

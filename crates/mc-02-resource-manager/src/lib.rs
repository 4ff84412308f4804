//! # mc-02-resource-manager
//!
//! Resource Manager of the module orchestration core.
//!
//! ## Role in System
//!
//! - **Resource store**: module-scoped keyed values with memory accounting
//! - **Cache tier**: LRU bounded by bytes and items, with TTL, LFU and
//!   Adaptive sweeps run by [`ResourceManager::optimize_cache`]
//! - **Object pools**: recycle expensive objects by type
//! - **Shared objects**: weak registry, so an object lives only while some
//!   module holds it
//!
//! ## Storage Model
//!
//! ```text
//!   store(id, module) ──→ [entries] ──admit──→ [cache tier (LRU)]
//!                             │                       │
//!                     TTL / free_unused        LRU / LFU / Adaptive
//!                       removes entry          leave entry stored
//! ```

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod domain;
pub mod events;
pub mod manager;

pub use config::ResourceConfig;
pub use domain::*;
pub use events::ResourceEvent;
pub use manager::ResourceManager;

//! # Module Core Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── benchmarks/       # Criterion workloads per component
//! │   ├── mc_01_bus.rs
//! │   ├── mc_02_resources.rs
//! │   └── mc_03_batching.rs
//! │
//! └── integration/      # Cross-component flows through ModuleCore
//!     ├── fixtures.rs
//!     ├── flows.rs
//!     └── scenarios.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p mc-tests
//!
//! # By category
//! cargo test -p mc-tests integration::flows
//! cargo test -p mc-tests integration::scenarios
//!
//! # Benchmarks
//! cargo bench -p mc-tests
//! ```

#![allow(dead_code)]

pub mod benchmarks;
pub mod integration;

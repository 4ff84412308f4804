//! # Module Core Benchmarks
//!
//! Criterion workloads per component, registered from
//! `benches/core_benchmarks.rs`.

pub mod mc_01_bus;
pub mod mc_02_resources;
pub mod mc_03_batching;

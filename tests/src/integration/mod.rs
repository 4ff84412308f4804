//! # Cross-Component Integration
//!
//! Flows that span more than one component, driven through `ModuleCore`.

pub mod fixtures;
pub mod flows;
pub mod scenarios;

//! Configuration for the Performance Integrator

use serde::{Deserialize, Serialize};

const MIB: u64 = 1024 * 1024;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IntegratorConfig {
    /// Apply high-priority recommendations on the optimization timer
    pub auto_optimization: bool,
    /// Snapshot refresh period
    pub metrics_interval_ms: u64,
    /// Periodic optimization period
    pub optimization_interval_ms: u64,
    /// Memory budget the score and recommendations are measured against
    pub memory_threshold_bytes: u64,
    /// Buffered outbound events per listener
    pub event_channel_capacity: usize,
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        Self {
            auto_optimization: true,
            metrics_interval_ms: 30_000,
            optimization_interval_ms: 5 * 60 * 1000,
            memory_threshold_bytes: 512 * MIB,
            event_channel_capacity: 1024,
        }
    }
}

//! Configuration for the Startup Optimizer

use crate::domain::entities::OptimizationLevel;
use serde::{Deserialize, Serialize};

/// Upper bound reached by adaptive parallelism tuning
pub const MAX_ADAPTIVE_PARALLEL_LOADS: usize = 8;
/// Lower bound reached by adaptive parallelism tuning
pub const MIN_ADAPTIVE_PARALLEL_LOADS: usize = 2;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OptimizerConfig {
    pub profile_name: String,
    pub optimization_level: OptimizationLevel,
    pub parallel_loading: bool,
    /// Batch width when parallel loading is on
    pub max_parallel_loads: usize,
    pub lazy_loading: bool,
    /// Default delay before a scheduled lazy load fires
    pub lazy_load_timeout_ms: u64,
    pub preloading: bool,
    /// Default delay before a scheduled preload fires
    pub preload_delay_ms: u64,
    pub preload_interval_ms: u64,
    pub lazy_load_interval_ms: u64,
    /// Per-module load bound
    pub module_load_timeout_ms: u64,
    /// Fail sessions on dependency cycles instead of forcing a module
    pub strict_dependencies: bool,
    /// Load times kept per module for estimates
    pub load_history_len: usize,
    /// Buffered outbound events per listener
    pub event_channel_capacity: usize,
}

impl OptimizerConfig {
    /// Width of one load batch.
    #[must_use]
    pub fn batch_width(&self) -> usize {
        if self.parallel_loading {
            self.max_parallel_loads.max(1)
        } else {
            1
        }
    }
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            profile_name: "default".to_string(),
            optimization_level: OptimizationLevel::Basic,
            parallel_loading: true,
            max_parallel_loads: 4,
            lazy_loading: true,
            lazy_load_timeout_ms: 30_000,
            preloading: true,
            preload_delay_ms: 1000,
            preload_interval_ms: 1000,
            lazy_load_interval_ms: 5000,
            module_load_timeout_ms: 30_000,
            strict_dependencies: false,
            load_history_len: 10,
            event_channel_capacity: 1024,
        }
    }
}

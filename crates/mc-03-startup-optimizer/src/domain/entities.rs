//! Core entities for the Startup Optimizer

use serde::{Deserialize, Serialize};
use shared_types::{Metadata, Timestamp};
use std::collections::HashMap;

/// How a module is meant to be brought up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoadStrategy {
    #[default]
    Immediate,
    Lazy,
    Preload,
    OnDemand,
    Background,
    Parallel,
}

/// Preset bundles of loading switches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptimizationLevel {
    /// Sequential, no preloading, no lazy loading
    None,
    #[default]
    Basic,
    Aggressive,
    /// Parallelism follows measured load times
    Adaptive,
}

/// Loading metadata registered for one module.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleLoadInfo {
    pub module_name: String,
    pub strategy: LoadStrategy,
    /// Higher loads first
    pub priority: i32,
    pub dependencies: Vec<String>,
    pub optional_dependencies: Vec<String>,
    pub estimated_load_time_ms: u64,
    pub estimated_memory_bytes: u64,
    pub critical_module: bool,
    pub preload_enabled: bool,
    pub metadata: Metadata,
}

impl ModuleLoadInfo {
    pub fn new(module_name: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
            ..Self::default()
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_strategy(mut self, strategy: LoadStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn critical(mut self) -> Self {
        self.critical_module = true;
        self
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    #[default]
    Running,
    Paused,
    Stopped,
    Completed,
    Failed,
}

impl SessionState {
    /// No further batches will run.
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Stopped | Self::Completed | Self::Failed)
    }
}

/// One run of the batch loader over a set of modules.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadSession {
    pub session_id: String,
    pub modules_to_load: Vec<String>,
    pub state: SessionState,
    pub start_time_ms: Timestamp,
    pub end_time_ms: Timestamp,
    pub total_load_time_ms: u64,
    /// Planned batches, in execution order
    pub batches: Vec<Vec<String>>,
    pub module_load_times: HashMap<String, u64>,
    pub module_memory_usage: HashMap<String, u64>,
    pub success_count: usize,
    pub failure_count: usize,
    pub error_message: Option<String>,
}

/// What a loader reports after bringing a module up.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleLoadReport {
    pub memory_usage_bytes: u64,
}

/// Aggregate startup figures over every load since the last reset.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StartupMetrics {
    /// Wall time of the most recent finished session
    pub total_startup_time_ms: u64,
    /// Sum of the latest load time of every module
    pub module_load_time_ms: u64,
    pub peak_memory_usage: u64,
    pub final_memory_usage: u64,
    /// Registered modules
    pub total_modules: usize,
    pub loaded_modules: usize,
    pub failed_modules: usize,
    /// Modules loaded alongside at least one other module
    pub parallel_load_count: usize,
    pub average_load_time_ms: f64,
    pub load_time_variance: f64,
}

/// Named bundle of loader settings and per-module configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PerformanceProfile {
    pub profile_name: String,
    pub optimization_level: OptimizationLevel,
    pub max_parallel_loads: usize,
    pub preload_delay_ms: u64,
    pub lazy_load_timeout_ms: u64,
    pub module_configs: HashMap<String, ModuleLoadInfo>,
}

impl Default for PerformanceProfile {
    fn default() -> Self {
        Self {
            profile_name: "default".to_string(),
            optimization_level: OptimizationLevel::Basic,
            max_parallel_loads: 4,
            preload_delay_ms: 1000,
            lazy_load_timeout_ms: 30_000,
            module_configs: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_info_builder() {
        let info = ModuleLoadInfo::new("audio")
            .with_priority(5)
            .with_dependencies(["core", "devices"])
            .critical();

        assert_eq!(info.module_name, "audio");
        assert_eq!(info.priority, 5);
        assert_eq!(info.dependencies, vec!["core", "devices"]);
        assert!(info.critical_module);
        assert_eq!(info.strategy, LoadStrategy::Immediate);
    }

    #[test]
    fn test_finished_states() {
        assert!(!SessionState::Running.is_finished());
        assert!(!SessionState::Paused.is_finished());
        assert!(SessionState::Stopped.is_finished());
        assert!(SessionState::Completed.is_finished());
        assert!(SessionState::Failed.is_finished());
    }
}

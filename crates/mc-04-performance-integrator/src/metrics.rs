//! # System Performance Snapshot
//!
//! One combined reading of the bus, resource manager and startup optimizer.
//! Only the latest snapshot is kept by the integrator.

use crate::score::{performance_score, PerformanceLevel, ScoreInputs};
use mc_01_communication_bus::BusMetrics;
use mc_02_resource_manager::CacheStatistics;
use mc_03_startup_optimizer::StartupMetrics;
use serde::{Deserialize, Serialize};
use shared_types::Timestamp;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemPerformanceMetrics {
    pub communication: BusMetrics,
    pub cache: CacheStatistics,
    pub startup: StartupMetrics,

    pub total_messages: u64,
    pub total_memory_usage: u64,
    /// Highest memory usage seen across snapshots
    pub peak_memory_usage: u64,
    pub total_resources: usize,
    pub active_modules: usize,
    /// Budget the memory ratio is computed against
    pub memory_threshold: u64,

    pub performance_score: u32,
    pub performance_level: PerformanceLevel,
    pub updated_at_ms: Timestamp,
}

impl Default for SystemPerformanceMetrics {
    fn default() -> Self {
        Self {
            communication: BusMetrics::default(),
            cache: CacheStatistics::default(),
            startup: StartupMetrics::default(),
            total_messages: 0,
            total_memory_usage: 0,
            peak_memory_usage: 0,
            total_resources: 0,
            active_modules: 0,
            memory_threshold: 0,
            performance_score: 100,
            performance_level: PerformanceLevel::Excellent,
            updated_at_ms: 0,
        }
    }
}

impl SystemPerformanceMetrics {
    /// Assemble a snapshot and score it. `previous_peak` carries the peak
    /// memory reading forward from the last snapshot.
    #[must_use]
    pub fn collect(
        communication: BusMetrics,
        cache: CacheStatistics,
        startup: StartupMetrics,
        memory_threshold: u64,
        previous_peak: u64,
        now: Timestamp,
    ) -> Self {
        let mut metrics = Self {
            total_messages: communication.total_messages,
            total_memory_usage: cache.memory_usage,
            peak_memory_usage: cache.memory_usage.max(previous_peak),
            total_resources: cache.resource_count,
            active_modules: startup.loaded_modules,
            memory_threshold,
            communication,
            cache,
            startup,
            performance_score: 100,
            performance_level: PerformanceLevel::Excellent,
            updated_at_ms: now,
        };
        metrics.performance_score = performance_score(&metrics.score_inputs());
        metrics.performance_level = PerformanceLevel::from_score(metrics.performance_score);
        metrics
    }

    /// Memory usage over the threshold. Zero when no threshold is set.
    #[must_use]
    pub fn memory_ratio(&self) -> f64 {
        if self.memory_threshold == 0 {
            0.0
        } else {
            self.total_memory_usage as f64 / self.memory_threshold as f64
        }
    }

    /// Cache hit ratio, treating an unread cache as perfect.
    #[must_use]
    pub fn effective_hit_ratio(&self) -> f64 {
        if self.cache.accesses() == 0 {
            1.0
        } else {
            self.cache.hit_ratio
        }
    }

    #[must_use]
    pub fn score_inputs(&self) -> ScoreInputs {
        ScoreInputs {
            memory_ratio: self.memory_ratio(),
            average_latency_ms: self.communication.average_latency_ms,
            hit_ratio: self.effective_hit_ratio(),
            average_load_time_ms: self.startup.average_load_time_ms,
            drop_rate: self.communication.drop_rate(),
        }
    }
}

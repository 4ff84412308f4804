//! # Optimization Recommendations
//!
//! Derived from a snapshot whenever a component threshold is breached.

use crate::metrics::SystemPerformanceMetrics;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest priority the periodic optimization applies automatically.
pub const AUTO_APPLY_MIN_PRIORITY: u8 = 3;

const MEMORY_RECOMMEND_RATIO: f64 = 0.8;
const LATENCY_RECOMMEND_MS: f64 = 500.0;
const HIT_RATIO_RECOMMEND: f64 = 0.7;
const LOAD_TIME_RECOMMEND_MS: f64 = 3_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptimizationCategory {
    Memory,
    Communication,
    Cache,
    Startup,
}

impl OptimizationCategory {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Memory => "Memory",
            Self::Communication => "Communication",
            Self::Cache => "Cache",
            Self::Startup => "Startup",
        }
    }
}

impl fmt::Display for OptimizationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The fixed set of tuning actions the integrator can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptimizationAction {
    /// Compact resource memory and free unused temporaries
    OptimizeMemory,
    /// Retune bus batch size and processing interval
    OptimizeCommunication,
    /// Sweep the cache and grow it when the hit ratio is low
    OptimizeResources,
    /// Widen parallel loading, enable preloading, refresh load estimates
    OptimizeStartup,
}

impl OptimizationAction {
    /// Label used for the optimizations-applied counter.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::OptimizeMemory => "memory",
            Self::OptimizeCommunication => "communication",
            Self::OptimizeResources => "cache",
            Self::OptimizeStartup => "startup",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationRecommendation {
    pub category: OptimizationCategory,
    pub issue: String,
    pub recommendation: String,
    pub action: OptimizationAction,
    /// 1 (low) to 5 (urgent)
    pub priority: u8,
    pub auto_applicable: bool,
}

impl OptimizationRecommendation {
    #[must_use]
    pub fn should_auto_apply(&self) -> bool {
        self.auto_applicable && self.priority >= AUTO_APPLY_MIN_PRIORITY
    }
}

/// Recommendations for every breached threshold, highest priority first.
#[must_use]
pub fn generate_recommendations(
    metrics: &SystemPerformanceMetrics,
) -> Vec<OptimizationRecommendation> {
    let mut recommendations = Vec::new();

    if metrics.memory_ratio() > MEMORY_RECOMMEND_RATIO {
        recommendations.push(OptimizationRecommendation {
            category: OptimizationCategory::Memory,
            issue: "High memory usage detected".into(),
            recommendation: "Clear unused resources and optimize the cache".into(),
            action: OptimizationAction::OptimizeMemory,
            priority: 4,
            auto_applicable: true,
        });
    }

    if metrics.communication.average_latency_ms > LATENCY_RECOMMEND_MS {
        recommendations.push(OptimizationRecommendation {
            category: OptimizationCategory::Communication,
            issue: "High message latency detected".into(),
            recommendation: "Process messages more often in smaller batches".into(),
            action: OptimizationAction::OptimizeCommunication,
            priority: 3,
            auto_applicable: true,
        });
    }

    if metrics.effective_hit_ratio() < HIT_RATIO_RECOMMEND {
        recommendations.push(OptimizationRecommendation {
            category: OptimizationCategory::Cache,
            issue: "Low cache hit ratio".into(),
            recommendation: "Adjust cache policies and increase the cache size".into(),
            action: OptimizationAction::OptimizeResources,
            priority: 2,
            auto_applicable: true,
        });
    }

    if metrics.startup.average_load_time_ms > LOAD_TIME_RECOMMEND_MS {
        recommendations.push(OptimizationRecommendation {
            category: OptimizationCategory::Startup,
            issue: "Slow module loading detected".into(),
            recommendation: "Enable parallel loading and preload critical modules".into(),
            action: OptimizationAction::OptimizeStartup,
            priority: 3,
            auto_applicable: true,
        });
    }

    // Stable, so equal priorities keep the order above.
    recommendations.sort_by(|a, b| b.priority.cmp(&a.priority));
    recommendations
}

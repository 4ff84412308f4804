//! Outbound notifications of the Performance Integrator.

use crate::metrics::SystemPerformanceMetrics;
use crate::recommendations::{OptimizationCategory, OptimizationRecommendation};
use serde::{Deserialize, Serialize};

/// How urgent an alert is, on the 1 to 5 recommendation scale.
pub mod severity {
    pub const NOTICE: u8 = 2;
    pub const WARNING: u8 = 3;
    pub const CRITICAL: u8 = 4;
}

/// Scope of a completed optimization pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptimizationScope {
    Category(OptimizationCategory),
    Full,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IntegratorEvent {
    PerformanceMetricsUpdated(Box<SystemPerformanceMetrics>),
    OptimizationRecommendationAvailable(OptimizationRecommendation),
    OptimizationCompleted {
        scope: OptimizationScope,
        summary: String,
    },
    /// A recommendation was applied by the periodic optimization. Carries the
    /// recommendation's issue.
    AutoOptimizationTriggered(String),
    PerformanceAlert {
        message: String,
        severity: u8,
    },
}

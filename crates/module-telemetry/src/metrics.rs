//! Prometheus metrics for the orchestration core.
//!
//! All metrics follow the naming convention: `mc_<component>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., optimizations applied)
//! - **Gauge**: Value that can go up or down (e.g., bus queue depth)

use lazy_static::lazy_static;
use prometheus::{CounterVec, Encoder, Gauge, Opts, Registry, TextEncoder};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // COMMUNICATION BUS
    // =========================================================================

    /// Messages waiting in the bus priority queues
    pub static ref BUS_QUEUE_DEPTH: Gauge = Gauge::new(
        "mc_bus_queue_depth",
        "Number of messages waiting in the bus priority queues"
    ).expect("metric creation failed");

    /// Rolling average delivery latency
    pub static ref BUS_LATENCY_MS: Gauge = Gauge::new(
        "mc_bus_average_latency_milliseconds",
        "Rolling average time from send to delivery"
    ).expect("metric creation failed");

    /// Messages processed since startup
    pub static ref BUS_MESSAGES_PROCESSED: Gauge = Gauge::new(
        "mc_bus_messages_processed",
        "Messages delivered by the bus since startup"
    ).expect("metric creation failed");

    /// Messages dropped (overflow or expiry) since startup
    pub static ref BUS_MESSAGES_DROPPED: Gauge = Gauge::new(
        "mc_bus_messages_dropped",
        "Messages dropped by overflow or expiry since startup"
    ).expect("metric creation failed");

    // =========================================================================
    // RESOURCES
    // =========================================================================

    /// Cache hit ratio (0.0 to 1.0)
    pub static ref CACHE_HIT_RATIO: Gauge = Gauge::new(
        "mc_resources_cache_hit_ratio",
        "Resource cache hit ratio"
    ).expect("metric creation failed");

    /// Estimated memory held by stored resources
    pub static ref MEMORY_USAGE_BYTES: Gauge = Gauge::new(
        "mc_resources_memory_usage_bytes",
        "Estimated bytes held by stored resources"
    ).expect("metric creation failed");

    // =========================================================================
    // STARTUP
    // =========================================================================

    /// Modules loaded successfully
    pub static ref MODULES_LOADED: Gauge = Gauge::new(
        "mc_startup_modules_loaded",
        "Modules loaded successfully since the last metrics reset"
    ).expect("metric creation failed");

    // =========================================================================
    // HEALTH
    // =========================================================================

    /// Overall health score (0 to 100)
    pub static ref PERFORMANCE_SCORE: Gauge = Gauge::new(
        "mc_performance_score",
        "Overall system health score"
    ).expect("metric creation failed");

    /// Optimization actions applied, by category
    pub static ref OPTIMIZATIONS_APPLIED: CounterVec = CounterVec::new(
        Opts::new("mc_optimizations_applied_total", "Optimization actions applied"),
        &["category"]  // category: memory/communication/cache/startup
    ).expect("metric creation failed");
}

/// Handle to the registry the metrics were registered with.
pub struct MetricsHandle {
    registry: Arc<Registry>,
}

impl MetricsHandle {
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

/// Register all metrics with the global registry.
///
/// Safe to call more than once; already registered collectors are skipped.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Bus
        Box::new(BUS_QUEUE_DEPTH.clone()),
        Box::new(BUS_LATENCY_MS.clone()),
        Box::new(BUS_MESSAGES_PROCESSED.clone()),
        Box::new(BUS_MESSAGES_DROPPED.clone()),
        // Resources
        Box::new(CACHE_HIT_RATIO.clone()),
        Box::new(MEMORY_USAGE_BYTES.clone()),
        // Startup
        Box::new(MODULES_LOADED.clone()),
        // Health
        Box::new(PERFORMANCE_SCORE.clone()),
        Box::new(OPTIMIZATIONS_APPLIED.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle {
        registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

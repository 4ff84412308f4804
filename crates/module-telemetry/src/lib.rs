//! # Module Telemetry
//!
//! Observability for the orchestration core.
//!
//! ## Components
//!
//! - **Logging**: `tracing-subscriber` registry with an env filter and a
//!   pretty or JSON formatter.
//! - **Metrics**: Prometheus gauges and counters describing bus, cache,
//!   startup and overall health.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use module_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(TelemetryConfig::from_env())?;
//! println!("{}", module_telemetry::encode_metrics()?);
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `MC_SERVICE_NAME` | `module-core` | Service name attached to logs |
//! | `MC_LOG_LEVEL` | `info` | Log level filter (falls back to `RUST_LOG`) |
//! | `MC_JSON_LOGS` | `false` | Emit JSON log lines |
//! | `MC_CONSOLE_OUTPUT` | `true` | Write logs to stdout |

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    encode_metrics, register_metrics, MetricsHandle, BUS_LATENCY_MS, BUS_MESSAGES_DROPPED,
    BUS_MESSAGES_PROCESSED, BUS_QUEUE_DEPTH, CACHE_HIT_RATIO, MEMORY_USAGE_BYTES,
    MODULES_LOADED, OPTIMIZATIONS_APPLIED, PERFORMANCE_SCORE,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and register metrics.
///
/// Returns a guard that should be held for the lifetime of the host.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics = register_metrics()?;
    init_logging(&config)?;

    tracing::info!(
        service = %config.service_name,
        json_logs = config.json_logs,
        "Telemetry initialized"
    );

    Ok(TelemetryGuard {
        service_name: config.service_name,
        _metrics: metrics,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    service_name: String,
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry");
    }
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}

/// Convenience macro for setting a gauge.
#[macro_export]
macro_rules! metric_set {
    ($metric:expr, $value:expr) => {
        $metric.set($value)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_service_name() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "module-core");
    }

    #[test]
    fn test_metric_macros() {
        metric_set!(PERFORMANCE_SCORE, 88.0);
        assert_eq!(PERFORMANCE_SCORE.get(), 88.0);

        let before = OPTIMIZATIONS_APPLIED.with_label_values(&["memory"]).get();
        metric_inc!(OPTIMIZATIONS_APPLIED, &["memory"]);
        assert!(OPTIMIZATIONS_APPLIED.with_label_values(&["memory"]).get() >= before + 1.0);
    }
}

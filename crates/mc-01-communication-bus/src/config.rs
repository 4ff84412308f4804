//! Configuration for the Communication Bus

use serde::{Deserialize, Serialize};

/// Largest accepted batch size.
pub const MAX_BATCH_SIZE: usize = 1000;

/// Bus configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BusConfig {
    /// Messages held across all priority levels before overflow eviction
    pub max_queue_size: usize,
    /// Messages delivered per processing tick (1..=1000)
    pub batch_size: usize,
    /// Processing tick period
    pub processing_interval_ms: u64,
    /// Expired-message sweep period
    pub cleanup_interval_ms: u64,
    /// Throughput and alert evaluation period
    pub metrics_interval_ms: u64,
    /// Default lifetime applied to messages without an expiry (0 disables)
    pub message_ttl_ms: u64,
    /// Largest accepted estimated payload size
    pub max_payload_bytes: u64,
    /// Processed messages kept for the rolling latency average
    pub latency_window: usize,
    /// Buffered outbound events per listener
    pub event_channel_capacity: usize,
    /// Queue fill ratio that raises an alert
    pub queue_alert_ratio: f64,
    /// Average latency that raises an alert
    pub latency_alert_ms: f64,
    /// Drop rate that raises an alert
    pub drop_rate_alert: f64,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            max_queue_size: 10_000,
            batch_size: 100,
            processing_interval_ms: 10,
            cleanup_interval_ms: 60_000,
            metrics_interval_ms: 5_000,
            message_ttl_ms: 300_000,
            max_payload_bytes: 1024 * 1024,
            latency_window: 1000,
            event_channel_capacity: 4096,
            queue_alert_ratio: 0.8,
            latency_alert_ms: 1000.0,
            drop_rate_alert: 0.05,
        }
    }
}

impl BusConfig {
    /// Clamp every field into its accepted range.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.max_queue_size = self.max_queue_size.max(1);
        self.batch_size = self.batch_size.clamp(1, MAX_BATCH_SIZE);
        self.processing_interval_ms = self.processing_interval_ms.max(1);
        self.cleanup_interval_ms = self.cleanup_interval_ms.max(1);
        self.metrics_interval_ms = self.metrics_interval_ms.max(1);
        self.latency_window = self.latency_window.max(1);
        self.event_channel_capacity = self.event_channel_capacity.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BusConfig::default();
        assert_eq!(config.max_queue_size, 10_000);
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.processing_interval_ms, 10);
        assert_eq!(config.message_ttl_ms, 300_000);
        assert_eq!(config.max_payload_bytes, 1_048_576);
    }

    #[test]
    fn test_normalized_clamps() {
        let config = BusConfig {
            max_queue_size: 0,
            batch_size: 5000,
            processing_interval_ms: 0,
            ..BusConfig::default()
        }
        .normalized();

        assert_eq!(config.max_queue_size, 1);
        assert_eq!(config.batch_size, MAX_BATCH_SIZE);
        assert_eq!(config.processing_interval_ms, 1);
    }
}

//! # Bus Metrics
//!
//! Counters are atomics; the latency window and throughput live behind a
//! mutex because they are updated together.

use serde::{Deserialize, Serialize};
use shared_types::Timestamp;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of bus performance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BusMetrics {
    pub total_messages: u64,
    pub processed_messages: u64,
    pub dropped_messages: u64,
    /// Rolling average over the latency window
    pub average_latency_ms: f64,
    pub peak_latency_ms: u64,
    /// Messages delivered per second over the last metrics interval
    pub throughput: f64,
    pub queue_size: usize,
    pub last_update_ms: Timestamp,
}

impl BusMetrics {
    /// Dropped messages as a fraction of accepted messages.
    #[must_use]
    pub fn drop_rate(&self) -> f64 {
        if self.total_messages == 0 {
            0.0
        } else {
            self.dropped_messages as f64 / self.total_messages as f64
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct BusCounters {
    pub total: AtomicU64,
    pub processed: AtomicU64,
    pub dropped: AtomicU64,
}

impl BusCounters {
    pub fn add_dropped(&self, n: u64) {
        if n > 0 {
            self.dropped.fetch_add(n, Ordering::Relaxed);
        }
    }

    pub fn reset(&self) {
        self.total.store(0, Ordering::Relaxed);
        self.processed.store(0, Ordering::Relaxed);
        self.dropped.store(0, Ordering::Relaxed);
    }
}

/// Fixed-size window of recent delivery latencies.
#[derive(Debug)]
pub(crate) struct LatencyWindow {
    samples: VecDeque<u64>,
    capacity: usize,
    sum: u64,
    peak: u64,
}

impl LatencyWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity.min(4096)),
            capacity: capacity.max(1),
            sum: 0,
            peak: 0,
        }
    }

    pub fn record(&mut self, latency_ms: u64) {
        if self.samples.len() == self.capacity {
            if let Some(old) = self.samples.pop_front() {
                self.sum -= old;
            }
        }
        self.samples.push_back(latency_ms);
        self.sum += latency_ms;
        self.peak = self.peak.max(latency_ms);
    }

    pub fn average(&self) -> f64 {
        if self.samples.is_empty() {
            0.0
        } else {
            self.sum as f64 / self.samples.len() as f64
        }
    }

    pub fn peak(&self) -> u64 {
        self.peak
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.sum = 0;
        self.peak = 0;
    }
}

/// Latency window plus throughput bookkeeping.
#[derive(Debug)]
pub(crate) struct ThroughputState {
    pub latency: LatencyWindow,
    pub throughput: f64,
    pub last_update_ms: Timestamp,
    pub processed_at_last_update: u64,
}

impl ThroughputState {
    pub fn new(window: usize, now: Timestamp) -> Self {
        Self {
            latency: LatencyWindow::new(window),
            throughput: 0.0,
            last_update_ms: now,
            processed_at_last_update: 0,
        }
    }

    /// Recompute throughput from the processed counter.
    pub fn refresh(&mut self, processed: u64, now: Timestamp) {
        let elapsed = now.saturating_sub(self.last_update_ms);
        if elapsed == 0 {
            return;
        }
        let delta = processed.saturating_sub(self.processed_at_last_update);
        self.throughput = delta as f64 * 1000.0 / elapsed as f64;
        self.last_update_ms = now;
        self.processed_at_last_update = processed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_window_rolls() {
        let mut window = LatencyWindow::new(3);
        for sample in [10, 20, 30, 40] {
            window.record(sample);
        }
        assert_eq!(window.average(), 30.0);
        assert_eq!(window.peak(), 40);
    }

    #[test]
    fn test_empty_window_average() {
        assert_eq!(LatencyWindow::new(10).average(), 0.0);
    }

    #[test]
    fn test_throughput_uses_delta() {
        let mut state = ThroughputState::new(10, 0);
        state.refresh(100, 1000);
        assert_eq!(state.throughput, 100.0);

        state.refresh(150, 3000);
        assert_eq!(state.throughput, 25.0);
    }

    #[test]
    fn test_drop_rate() {
        let metrics = BusMetrics {
            total_messages: 200,
            dropped_messages: 10,
            ..BusMetrics::default()
        };
        assert_eq!(metrics.drop_rate(), 0.05);
        assert_eq!(BusMetrics::default().drop_rate(), 0.0);
    }
}

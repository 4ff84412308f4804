//! Cache statistics snapshot.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStatistics {
    pub hit_count: u64,
    pub miss_count: u64,
    /// 0.0 when nothing has been read yet
    pub hit_ratio: f64,
    /// Bytes held by the cache tier
    pub total_size: u64,
    pub max_size: u64,
    pub item_count: usize,
    pub max_items: usize,
    pub eviction_count: u64,
    /// Bytes held by every stored resource
    pub memory_usage: u64,
    pub max_memory_usage: u64,
    pub peak_memory_usage: u64,
    pub resource_count: usize,
}

impl CacheStatistics {
    #[must_use]
    pub fn accesses(&self) -> u64 {
        self.hit_count + self.miss_count
    }

    #[must_use]
    pub fn compute_hit_ratio(hits: u64, misses: u64) -> f64 {
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }
}

//! Configuration for the Resource Manager

use serde::{Deserialize, Serialize};

const MIB: u64 = 1024 * 1024;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Memory budget for all stored resources
    pub max_memory_bytes: u64,
    /// Byte budget of the cache tier
    pub cache_max_bytes: u64,
    /// Item budget of the cache tier
    pub cache_max_items: usize,
    /// TTL sweep and unused temporary resource sweep
    pub cleanup_interval_ms: u64,
    /// Memory limit check
    pub memory_check_interval_ms: u64,
    /// Lifetime given to temporary resources
    pub temp_resource_ttl_ms: u64,
    /// Idle time after which a temporary resource counts as unused
    pub unused_threshold_ms: u64,
    /// Buffered outbound events per listener
    pub event_channel_capacity: usize,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            max_memory_bytes: 512 * MIB,
            cache_max_bytes: 100 * MIB,
            cache_max_items: 10_000,
            cleanup_interval_ms: 5 * 60 * 1000,
            memory_check_interval_ms: 30_000,
            temp_resource_ttl_ms: 5 * 60 * 1000,
            unused_threshold_ms: 5 * 60 * 1000,
            event_channel_capacity: 1024,
        }
    }
}

//! Outbound notifications of the Resource Manager.

use crate::domain::{EvictionReason, ResourceKey};

#[derive(Debug, Clone, PartialEq)]
pub enum ResourceEvent {
    ResourceAdded(ResourceKey),
    ResourceRemoved(ResourceKey),
    ResourceAccessed(ResourceKey),
    CacheEviction {
        key: ResourceKey,
        reason: EvictionReason,
    },
    MemoryWarning {
        current: u64,
        max: u64,
    },
    PoolCreated(String),
    PoolDestroyed(String),
}

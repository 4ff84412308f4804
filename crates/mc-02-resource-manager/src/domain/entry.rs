//! # Resource Entries
//!
//! Stored values plus the bookkeeping the eviction policies read.

use serde::{Deserialize, Serialize};
use shared_types::{Metadata, Payload, Timestamp};
use std::fmt;

/// Owner segment used in keys of resources without a module.
pub const GLOBAL_OWNER: &str = "global";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    Configuration,
    Data,
    Cache,
    SharedObject,
    TempResource,
    StaticResource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CachePolicy {
    NoCache,
    Lru,
    Lfu,
    Ttl,
    Adaptive,
}

/// Identity of a resource: its id scoped by the owning module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceKey {
    pub module: Option<String>,
    pub id: String,
}

impl ResourceKey {
    #[must_use]
    pub fn new(id: &str, module: Option<&str>) -> Self {
        Self {
            module: module.filter(|m| !m.is_empty()).map(str::to_string),
            id: id.to_string(),
        }
    }

    #[must_use]
    pub fn global(id: &str) -> Self {
        Self::new(id, None)
    }

    #[must_use]
    pub fn owned_by(&self, module: &str) -> bool {
        self.module.as_deref() == Some(module)
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}::{}",
            self.module.as_deref().unwrap_or(GLOBAL_OWNER),
            self.id
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceEntry {
    pub key: ResourceKey,
    pub resource_type: ResourceType,
    pub cache_policy: CachePolicy,
    pub value: Payload,
    /// Estimated once when stored
    pub size_bytes: u64,
    pub created_at_ms: Timestamp,
    pub last_access_ms: Timestamp,
    pub access_count: u64,
    /// 0 means no expiry
    pub ttl_ms: u64,
    pub metadata: Metadata,
}

impl ResourceEntry {
    /// New entry with the default policy for its type.
    ///
    /// Temporary resources get a TTL policy with `temp_ttl_ms`, everything
    /// else is LRU without expiry.
    #[must_use]
    pub fn new(
        key: ResourceKey,
        value: Payload,
        resource_type: ResourceType,
        size_bytes: u64,
        now: Timestamp,
        temp_ttl_ms: u64,
    ) -> Self {
        let (cache_policy, ttl_ms) = match resource_type {
            ResourceType::TempResource => (CachePolicy::Ttl, temp_ttl_ms),
            _ => (CachePolicy::Lru, 0),
        };

        Self {
            key,
            resource_type,
            cache_policy,
            value,
            size_bytes,
            created_at_ms: now,
            last_access_ms: now,
            access_count: 1,
            ttl_ms,
            metadata: Metadata::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.key.id
    }

    #[must_use]
    pub fn owner_module(&self) -> Option<&str> {
        self.key.module.as_deref()
    }

    #[must_use]
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.ttl_ms > 0 && now.saturating_sub(self.created_at_ms) > self.ttl_ms
    }

    #[must_use]
    pub fn is_cacheable(&self) -> bool {
        self.cache_policy != CachePolicy::NoCache
    }

    pub fn record_access(&mut self, now: Timestamp) {
        self.last_access_ms = now;
        self.access_count = self.access_count.saturating_add(1);
    }

    /// Milliseconds since the last access.
    #[must_use]
    pub fn idle_ms(&self, now: Timestamp) -> u64 {
        now.saturating_sub(self.last_access_ms)
    }
}

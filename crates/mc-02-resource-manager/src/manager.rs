//! # Resource Manager
//!
//! Keyed store of module resources backed by a cost-bounded LRU cache tier,
//! plus object pools and a registry of weakly held shared objects.
//!
//! ## Locking
//!
//! The store and cache tier share one mutex since every read updates access
//! bookkeeping. Pools and shared objects each have their own lock. No two of
//! these are held at once, and events are sent after the lock is released.

use crate::config::ResourceConfig;
use crate::domain::{
    eviction, CacheStatistics, CacheTier, CachePolicy, EvictionReason, PoolInfo, Resolved,
    ResourceEntry, ResourceError, ResourceKey, ResourcePool, ResourceType, SharedObjectRegistry,
};
use crate::events::ResourceEvent;
use parking_lot::{Mutex, RwLock};
use shared_types::{abort_all, spawn_periodic, CoreServices, Payload, Timestamp};
use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

struct ResourceStore {
    entries: HashMap<ResourceKey, ResourceEntry>,
    cache: CacheTier,
    memory_usage: u64,
    peak_memory_usage: u64,
    /// Cache generation seen by the last LFU/Adaptive pass
    optimized_generation: Option<u64>,
}

impl ResourceStore {
    fn remove_entry(&mut self, key: &ResourceKey) -> Option<ResourceEntry> {
        let entry = self.entries.remove(key)?;
        self.cache.remove(key);
        self.memory_usage = self.memory_usage.saturating_sub(entry.size_bytes);
        Some(entry)
    }

    fn sweep_expired(&mut self, now: Timestamp) -> Vec<ResourceKey> {
        let expired = eviction::ttl_expired(self.entries.values(), now);
        for key in &expired {
            self.remove_entry(key);
        }
        expired
    }
}

#[derive(Default)]
struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

enum Lookup {
    Found {
        value: Payload,
        hit: bool,
        evicted: Vec<ResourceKey>,
    },
    Expired,
    Absent,
}

struct ResourceInner {
    config: RwLock<ResourceConfig>,
    store: Mutex<ResourceStore>,
    counters: CacheCounters,
    pools: RwLock<HashMap<String, ResourcePool>>,
    shared: RwLock<SharedObjectRegistry>,
    max_memory: AtomicU64,
    events: broadcast::Sender<ResourceEvent>,
    running: AtomicBool,
    timers: Mutex<Vec<JoinHandle<()>>>,
    services: CoreServices,
}

#[derive(Clone)]
pub struct ResourceManager {
    inner: Arc<ResourceInner>,
}

impl ResourceManager {
    #[must_use]
    pub fn new(config: ResourceConfig) -> Self {
        Self::with_services(config, CoreServices::default())
    }

    #[must_use]
    pub fn with_services(config: ResourceConfig, services: CoreServices) -> Self {
        let (events, _) = broadcast::channel(config.event_channel_capacity.max(1));
        let store = ResourceStore {
            entries: HashMap::new(),
            cache: CacheTier::new(config.cache_max_bytes, config.cache_max_items),
            memory_usage: 0,
            peak_memory_usage: 0,
            optimized_generation: None,
        };

        Self {
            inner: Arc::new(ResourceInner {
                max_memory: AtomicU64::new(config.max_memory_bytes),
                config: RwLock::new(config),
                store: Mutex::new(store),
                counters: CacheCounters::default(),
                pools: RwLock::new(HashMap::new()),
                shared: RwLock::new(SharedObjectRegistry::new()),
                events,
                running: AtomicBool::new(false),
                timers: Mutex::new(Vec::new()),
                services,
            }),
        }
    }

    fn now(&self) -> Timestamp {
        self.inner.services.clock.now_ms()
    }

    fn emit(&self, event: ResourceEvent) {
        let _ = self.inner.events.send(event);
    }

    /// Listen to resource events.
    #[must_use]
    pub fn events(&self) -> broadcast::Receiver<ResourceEvent> {
        self.inner.events.subscribe()
    }

    // =========================================================================
    // RESOURCES
    // =========================================================================

    /// Store or replace a resource. Returns false if `id` is empty.
    pub fn store(
        &self,
        id: &str,
        value: Payload,
        resource_type: ResourceType,
        module: Option<&str>,
    ) -> bool {
        self.try_store(id, value, resource_type, module).is_ok()
    }

    /// Store or replace a resource.
    ///
    /// Replacing a resource of the same type keeps its policy, TTL and
    /// metadata; access statistics start over.
    pub fn try_store(
        &self,
        id: &str,
        value: Payload,
        resource_type: ResourceType,
        module: Option<&str>,
    ) -> Result<(), ResourceError> {
        if id.is_empty() {
            return Err(ResourceError::EmptyId);
        }

        let key = ResourceKey::new(id, module);
        let size = self.inner.services.size_estimator.estimate(&value);
        let now = self.now();
        let temp_ttl = self.inner.config.read().temp_resource_ttl_ms;
        let mut entry = ResourceEntry::new(key.clone(), value, resource_type, size, now, temp_ttl);

        let evicted = {
            let mut store = self.inner.store.lock();
            if let Some(previous) = store.remove_entry(&key) {
                if previous.resource_type == resource_type {
                    entry.cache_policy = previous.cache_policy;
                    entry.ttl_ms = previous.ttl_ms;
                    entry.metadata = previous.metadata;
                }
            }

            store.memory_usage += size;
            store.peak_memory_usage = store.peak_memory_usage.max(store.memory_usage);
            let evicted = if entry.is_cacheable() {
                store.cache.insert(key.clone(), size).evicted
            } else {
                Vec::new()
            };
            store.entries.insert(key.clone(), entry);
            evicted
        };

        self.record_evictions(evicted, EvictionReason::LeastRecentlyUsed);
        debug!(key = %key, size, resource_type = ?resource_type, "Resource stored");
        self.emit(ResourceEvent::ResourceAdded(key));
        self.check_memory_limits();
        Ok(())
    }

    /// Read a resource, updating its access statistics.
    ///
    /// Expired resources are removed and read as `None`.
    pub fn get(&self, id: &str, module: Option<&str>) -> Option<Payload> {
        let key = ResourceKey::new(id, module);
        let now = self.now();

        let lookup = {
            let mut guard = self.inner.store.lock();
            let store = &mut *guard;
            let expired = store.entries.get(&key).map(|e| e.is_expired(now));
            match expired {
                None => Lookup::Absent,
                Some(true) => {
                    store.remove_entry(&key);
                    Lookup::Expired
                }
                Some(false) => match store.entries.get_mut(&key) {
                    Some(entry) => {
                        entry.record_access(now);
                        let hit = store.cache.touch(&key);
                        let evicted = if !hit && entry.is_cacheable() {
                            store.cache.insert(key.clone(), entry.size_bytes).evicted
                        } else {
                            Vec::new()
                        };
                        Lookup::Found {
                            value: entry.value.clone(),
                            hit,
                            evicted,
                        }
                    }
                    None => Lookup::Absent,
                },
            }
        };

        match lookup {
            Lookup::Absent => {
                self.inner.counters.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            Lookup::Expired => {
                self.inner.counters.misses.fetch_add(1, Ordering::Relaxed);
                self.record_evictions(vec![key.clone()], EvictionReason::TtlExpired);
                self.emit(ResourceEvent::ResourceRemoved(key));
                None
            }
            Lookup::Found {
                value,
                hit,
                evicted,
            } => {
                let counter = if hit {
                    &self.inner.counters.hits
                } else {
                    &self.inner.counters.misses
                };
                counter.fetch_add(1, Ordering::Relaxed);
                self.record_evictions(evicted, EvictionReason::LeastRecentlyUsed);
                self.emit(ResourceEvent::ResourceAccessed(key));
                Some(value)
            }
        }
    }

    /// Whether a live resource exists. Does not count as an access.
    #[must_use]
    pub fn has(&self, id: &str, module: Option<&str>) -> bool {
        let key = ResourceKey::new(id, module);
        let now = self.now();
        self.inner
            .store
            .lock()
            .entries
            .get(&key)
            .is_some_and(|e| !e.is_expired(now))
    }

    pub fn remove(&self, id: &str, module: Option<&str>) -> bool {
        let key = ResourceKey::new(id, module);
        let removed = self.inner.store.lock().remove_entry(&key).is_some();
        if removed {
            debug!(key = %key, "Resource removed");
            self.emit(ResourceEvent::ResourceRemoved(key));
        }
        removed
    }

    /// Snapshot of stored resources, optionally limited to one module.
    #[must_use]
    pub fn resource_list(&self, module: Option<&str>) -> Vec<ResourceEntry> {
        let mut list: Vec<ResourceEntry> = self
            .inner
            .store
            .lock()
            .entries
            .values()
            .filter(|e| module.map_or(true, |m| e.key.owned_by(m)))
            .cloned()
            .collect();
        list.sort_by(|a, b| a.key.cmp(&b.key));
        list
    }

    #[must_use]
    pub fn resource_count(&self) -> usize {
        self.inner.store.lock().entries.len()
    }

    // =========================================================================
    // CACHE
    // =========================================================================

    /// Set the policy of every resource with this id. Returns how many changed.
    pub fn set_cache_policy(&self, id: &str, policy: CachePolicy) -> usize {
        let mut guard = self.inner.store.lock();
        let store = &mut *guard;
        let keys: Vec<ResourceKey> = store
            .entries
            .values_mut()
            .filter(|e| e.key.id == id)
            .map(|e| {
                e.cache_policy = policy;
                e.key.clone()
            })
            .collect();

        if policy == CachePolicy::NoCache {
            for key in &keys {
                store.cache.remove(key);
            }
        }
        keys.len()
    }

    /// Set the TTL of every resource with this id. 0 disables expiry.
    pub fn set_cache_ttl(&self, id: &str, ttl_ms: u64) -> usize {
        let mut store = self.inner.store.lock();
        let mut changed = 0;
        for entry in store.entries.values_mut().filter(|e| e.key.id == id) {
            entry.ttl_ms = ttl_ms;
            changed += 1;
        }
        changed
    }

    pub fn set_cache_max_size(&self, bytes: u64) {
        self.inner.config.write().cache_max_bytes = bytes;
        let evicted = self.inner.store.lock().cache.set_max_cost(bytes);
        self.record_evictions(evicted, EvictionReason::LeastRecentlyUsed);
    }

    pub fn set_cache_max_items(&self, items: usize) {
        self.inner.config.write().cache_max_items = items;
        let evicted = self.inner.store.lock().cache.set_max_items(items);
        self.record_evictions(evicted, EvictionReason::LeastRecentlyUsed);
    }

    /// Drop cache-tier entries (all, or one module's). Stored values stay.
    pub fn clear_cache(&self, module: Option<&str>) -> usize {
        let cleared = {
            let mut store = self.inner.store.lock();
            match module {
                Some(m) => store.cache.remove_where(|k| k.owned_by(m)),
                None => {
                    let len = store.cache.len();
                    store.cache.clear();
                    len
                }
            }
        };
        info!(module = ?module, cleared, "Cache cleared");
        cleared
    }

    /// Run the TTL, LFU and Adaptive policies. Returns how many resources
    /// left the cache.
    ///
    /// LFU and Adaptive only run when the cache was written or read since
    /// the previous call.
    pub fn optimize_cache(&self) -> usize {
        let now = self.now();
        let (expired, evicted) = {
            let mut guard = self.inner.store.lock();
            let store = &mut *guard;
            let expired = store.sweep_expired(now);

            let mut evicted = Vec::new();
            let generation = store.cache.generation();
            if store.optimized_generation != Some(generation) {
                let cached: Vec<&ResourceEntry> = store
                    .entries
                    .values()
                    .filter(|e| store.cache.contains(&e.key))
                    .collect();
                let lfu = eviction::lfu_victims(&cached);
                let adaptive = eviction::adaptive_victims(&cached, now);

                for key in lfu {
                    store.cache.remove(&key);
                    evicted.push((key, EvictionReason::LeastFrequentlyUsed));
                }
                for key in adaptive {
                    store.cache.remove(&key);
                    evicted.push((key, EvictionReason::Adaptive));
                }
                store.optimized_generation = Some(generation);
            }
            (expired, evicted)
        };

        let total = expired.len() + evicted.len();
        self.record_removed_expired(expired);
        for (key, reason) in evicted {
            self.record_evictions(vec![key], reason);
        }
        if total > 0 {
            info!(evicted = total, "Cache optimized");
        }
        total
    }

    /// Remove every expired resource.
    pub fn cleanup_expired_resources(&self) -> usize {
        let now = self.now();
        let expired = self.inner.store.lock().sweep_expired(now);
        let count = expired.len();
        self.record_removed_expired(expired);
        count
    }

    fn record_removed_expired(&self, keys: Vec<ResourceKey>) {
        for key in keys {
            self.record_evictions(vec![key.clone()], EvictionReason::TtlExpired);
            self.emit(ResourceEvent::ResourceRemoved(key));
        }
    }

    fn record_evictions(&self, keys: Vec<ResourceKey>, reason: EvictionReason) {
        if keys.is_empty() {
            return;
        }
        self.inner
            .counters
            .evictions
            .fetch_add(keys.len() as u64, Ordering::Relaxed);
        for key in keys {
            debug!(key = %key, reason = %reason, "Cache eviction");
            self.emit(ResourceEvent::CacheEviction { key, reason });
        }
    }

    #[must_use]
    pub fn cache_statistics(&self) -> CacheStatistics {
        let hits = self.inner.counters.hits.load(Ordering::Relaxed);
        let misses = self.inner.counters.misses.load(Ordering::Relaxed);
        let store = self.inner.store.lock();

        CacheStatistics {
            hit_count: hits,
            miss_count: misses,
            hit_ratio: CacheStatistics::compute_hit_ratio(hits, misses),
            total_size: store.cache.total_cost(),
            max_size: store.cache.max_cost(),
            item_count: store.cache.len(),
            max_items: store.cache.max_items(),
            eviction_count: self.inner.counters.evictions.load(Ordering::Relaxed),
            memory_usage: store.memory_usage,
            max_memory_usage: self.inner.max_memory.load(Ordering::Relaxed),
            peak_memory_usage: store.peak_memory_usage,
            resource_count: store.entries.len(),
        }
    }

    // =========================================================================
    // MEMORY
    // =========================================================================

    #[must_use]
    pub fn memory_usage(&self) -> u64 {
        self.inner.store.lock().memory_usage
    }

    #[must_use]
    pub fn peak_memory_usage(&self) -> u64 {
        self.inner.store.lock().peak_memory_usage
    }

    #[must_use]
    pub fn max_memory_usage(&self) -> u64 {
        self.inner.max_memory.load(Ordering::Relaxed)
    }

    pub fn set_max_memory_usage(&self, bytes: u64) {
        self.inner.max_memory.store(bytes, Ordering::Relaxed);
        self.inner.config.write().max_memory_bytes = bytes;
        self.check_memory_limits();
    }

    /// Remove temporary resources idle for at least the unused threshold.
    pub fn free_unused_resources(&self) -> usize {
        let now = self.now();
        let threshold = self.inner.config.read().unused_threshold_ms;
        let freed: Vec<ResourceKey> = {
            let mut store = self.inner.store.lock();
            let keys: Vec<ResourceKey> = store
                .entries
                .values()
                .filter(|e| {
                    e.resource_type == ResourceType::TempResource && e.idle_ms(now) >= threshold
                })
                .map(|e| e.key.clone())
                .collect();
            for key in &keys {
                store.remove_entry(key);
            }
            keys
        };

        let count = freed.len();
        for key in freed {
            self.emit(ResourceEvent::ResourceRemoved(key));
        }
        if count > 0 {
            info!(freed = count, "Freed unused temporary resources");
        }
        count
    }

    /// Expire, optimize the cache and forget dead shared objects.
    pub fn compact_memory(&self) -> usize {
        let optimized = self.optimize_cache();
        let purged = self.inner.shared.write().purge_dead();
        debug!(optimized, purged, "Memory compacted");
        optimized + purged
    }

    /// On breach: warn, free unused resources and compact. Returns whether the
    /// limit was exceeded.
    pub fn check_memory_limits(&self) -> bool {
        let current = self.memory_usage();
        let max = self.max_memory_usage();
        if current <= max {
            return false;
        }

        warn!(current, max, "Resource memory over limit");
        self.emit(ResourceEvent::MemoryWarning { current, max });
        self.free_unused_resources();
        self.compact_memory();
        true
    }

    // =========================================================================
    // POOLS
    // =========================================================================

    pub fn create_resource_pool(
        &self,
        pool_id: &str,
        description: &str,
        max_size: usize,
    ) -> Result<String, ResourceError> {
        if pool_id.is_empty() {
            return Err(ResourceError::EmptyId);
        }
        {
            let mut pools = self.inner.pools.write();
            if pools.contains_key(pool_id) {
                return Err(ResourceError::PoolExists(pool_id.to_string()));
            }
            pools.insert(
                pool_id.to_string(),
                ResourcePool::new(pool_id, description, max_size),
            );
        }
        info!(pool = pool_id, max_size, "Resource pool created");
        self.emit(ResourceEvent::PoolCreated(pool_id.to_string()));
        Ok(pool_id.to_string())
    }

    pub fn destroy_resource_pool(&self, pool_id: &str) -> bool {
        let removed = self.inner.pools.write().remove(pool_id).is_some();
        if removed {
            info!(pool = pool_id, "Resource pool destroyed");
            self.emit(ResourceEvent::PoolDestroyed(pool_id.to_string()));
        }
        removed
    }

    /// Take an idle `T` from the pool. `None` means create a fresh one.
    pub fn acquire_from_pool<T: Any + Send + Sync>(&self, pool_id: &str) -> Option<T> {
        self.inner.pools.write().get_mut(pool_id)?.acquire::<T>()
    }

    /// Hand `object` back. Returns false, dropping it, if the pool is full or
    /// unknown.
    pub fn release_to_pool<T: Any + Send + Sync>(&self, pool_id: &str, object: T) -> bool {
        match self.inner.pools.write().get_mut(pool_id) {
            Some(pool) => pool.release(object),
            None => false,
        }
    }

    pub fn clear_resource_pool(&self, pool_id: &str) -> Result<usize, ResourceError> {
        self.inner
            .pools
            .write()
            .get_mut(pool_id)
            .map(ResourcePool::clear)
            .ok_or_else(|| ResourceError::PoolNotFound(pool_id.to_string()))
    }

    /// Pool ids, sorted.
    #[must_use]
    pub fn resource_pools(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.inner.pools.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    #[must_use]
    pub fn resource_pool_info(&self, pool_id: &str) -> Option<PoolInfo> {
        self.inner.pools.read().get(pool_id).map(ResourcePool::info)
    }

    // =========================================================================
    // SHARED OBJECTS
    // =========================================================================

    /// Register `object` under `id` without taking ownership.
    pub fn set_shared_object<T: Any + Send + Sync>(&self, id: &str, object: &Arc<T>) -> bool {
        if id.is_empty() {
            return false;
        }
        self.inner.shared.write().insert(id, object);
        debug!(id = id, "Shared object registered");
        true
    }

    /// Resolve `id` if its owner still holds it.
    #[must_use]
    pub fn get_shared_object<T: Any + Send + Sync>(&self, id: &str) -> Option<Arc<T>> {
        match self.inner.shared.write().resolve::<T>(id) {
            Resolved::Alive(object) => Some(object),
            Resolved::WrongType | Resolved::Missing => None,
        }
    }

    /// Resolve `id`, re-creating it through `factory` if it is gone.
    ///
    /// The registry keeps only a weak reference to the created object, so the
    /// caller must hold on to the returned `Arc`.
    pub fn get_or_create_shared_object<T, F>(&self, id: &str, factory: F) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> Option<T>,
    {
        match self.inner.shared.write().resolve::<T>(id) {
            Resolved::Alive(object) => return Some(object),
            Resolved::WrongType => return None,
            Resolved::Missing => {}
        }

        let object = Arc::new(factory()?);
        self.set_shared_object(id, &object);
        Some(object)
    }

    pub fn remove_shared_object(&self, id: &str) -> bool {
        self.inner.shared.write().remove(id)
    }

    #[must_use]
    pub fn is_shared_object_alive(&self, id: &str) -> bool {
        self.inner.shared.read().is_alive(id)
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Start the cleanup and memory check timers.
    pub fn start(&self) {
        let Ok(runtime) = Handle::try_current() else {
            warn!("No tokio runtime, resource manager not started");
            return;
        };
        if self.inner.running.swap(true, Ordering::SeqCst) {
            return;
        }

        let (cleanup, memory_check) = {
            let config = self.inner.config.read();
            (config.cleanup_interval_ms, config.memory_check_interval_ms)
        };
        let weak = Arc::downgrade(&self.inner);

        let mut timers = self.inner.timers.lock();
        timers.push(spawn_periodic(&runtime, weak.clone(), cleanup, |inner| {
            let manager = ResourceManager { inner };
            manager.cleanup_expired_resources();
            manager.free_unused_resources();
        }));
        timers.push(spawn_periodic(&runtime, weak, memory_check, |inner| {
            ResourceManager { inner }.check_memory_limits();
        }));
        info!("Resource manager started");
    }

    pub fn stop(&self) {
        if !self.inner.running.swap(false, Ordering::SeqCst) {
            return;
        }
        let handles: Vec<JoinHandle<()>> = self.inner.timers.lock().drain(..).collect();
        abort_all(handles);
        info!("Resource manager stopped");
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn config(&self) -> ResourceConfig {
        self.inner.config.read().clone()
    }
}

impl Default for ResourceManager {
    fn default() -> Self {
        Self::new(ResourceConfig::default())
    }
}

impl std::fmt::Debug for ResourceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceManager")
            .field("resources", &self.resource_count())
            .field("memory_usage", &self.memory_usage())
            .finish()
    }
}

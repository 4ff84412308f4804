//! # Cache Tier (Cost-Bounded LRU)
//!
//! Tracks which stored resources are hot. Bounded both by total cost in bytes
//! and by item count; exceeding either bound evicts least recently used keys.
//!
//! Evicting a key here does not delete the stored resource, it only turns the
//! next read into a miss.

use super::entry::ResourceKey;
use lru::LruCache;

/// Result of admitting a key.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Admission {
    pub admitted: bool,
    pub evicted: Vec<ResourceKey>,
}

pub struct CacheTier {
    /// Key to cost, most recently used first
    cache: LruCache<ResourceKey, u64>,
    total_cost: u64,
    max_cost: u64,
    max_items: usize,
    /// Bumped on every admission and every hit
    generation: u64,
}

impl CacheTier {
    #[must_use]
    pub fn new(max_cost: u64, max_items: usize) -> Self {
        Self {
            cache: LruCache::unbounded(),
            total_cost: 0,
            max_cost,
            max_items: max_items.max(1),
            generation: 0,
        }
    }

    /// Admit or refresh `key`, then evict LRU keys until within bounds.
    ///
    /// A key costing more than the whole budget is not admitted.
    pub fn insert(&mut self, key: ResourceKey, cost: u64) -> Admission {
        if cost > self.max_cost {
            self.remove(&key);
            return Admission::default();
        }

        if let Some(old) = self.cache.put(key.clone(), cost) {
            self.total_cost -= old;
        }
        self.total_cost += cost;
        self.generation += 1;

        Admission {
            admitted: true,
            evicted: self.trim(),
        }
    }

    /// Mark `key` as used. Returns whether it is cached.
    pub fn touch(&mut self, key: &ResourceKey) -> bool {
        let hit = self.cache.get(key).is_some();
        if hit {
            self.generation += 1;
        }
        hit
    }

    #[must_use]
    pub fn contains(&self, key: &ResourceKey) -> bool {
        self.cache.contains(key)
    }

    pub fn remove(&mut self, key: &ResourceKey) -> bool {
        match self.cache.pop(key) {
            Some(cost) => {
                self.total_cost -= cost;
                true
            }
            None => false,
        }
    }

    /// Remove every key matching `predicate`. Returns how many were removed.
    pub fn remove_where(&mut self, predicate: impl Fn(&ResourceKey) -> bool) -> usize {
        let keys: Vec<ResourceKey> = self
            .cache
            .iter()
            .filter(|(k, _)| predicate(k))
            .map(|(k, _)| k.clone())
            .collect();

        for key in &keys {
            self.remove(key);
        }
        keys.len()
    }

    pub fn set_max_cost(&mut self, max_cost: u64) -> Vec<ResourceKey> {
        self.max_cost = max_cost;
        self.trim()
    }

    pub fn set_max_items(&mut self, max_items: usize) -> Vec<ResourceKey> {
        self.max_items = max_items.max(1);
        self.trim()
    }

    fn trim(&mut self) -> Vec<ResourceKey> {
        let mut evicted = Vec::new();
        while self.cache.len() > self.max_items || self.total_cost > self.max_cost {
            let Some((key, cost)) = self.cache.pop_lru() else {
                break;
            };
            self.total_cost -= cost;
            evicted.push(key);
        }
        evicted
    }

    pub fn clear(&mut self) {
        self.cache.clear();
        self.total_cost = 0;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    #[must_use]
    pub fn total_cost(&self) -> u64 {
        self.total_cost
    }

    #[must_use]
    pub fn max_cost(&self) -> u64 {
        self.max_cost
    }

    #[must_use]
    pub fn max_items(&self) -> usize {
        self.max_items
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

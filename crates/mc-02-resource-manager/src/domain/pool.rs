//! # Object Pools
//!
//! Bounded free lists of reusable objects. Objects are owned by the pool while
//! idle and by the caller while acquired.

use serde::{Deserialize, Serialize};
use std::any::Any;

/// Snapshot of a pool for monitoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolInfo {
    pub pool_id: String,
    pub description: String,
    pub max_size: usize,
    pub current_size: usize,
    pub total_allocations: u64,
    pub total_deallocations: u64,
}

pub struct ResourcePool {
    pool_id: String,
    description: String,
    max_size: usize,
    objects: Vec<Box<dyn Any + Send + Sync>>,
    total_allocations: u64,
    total_deallocations: u64,
}

impl ResourcePool {
    #[must_use]
    pub fn new(pool_id: &str, description: &str, max_size: usize) -> Self {
        Self {
            pool_id: pool_id.to_string(),
            description: description.to_string(),
            max_size,
            objects: Vec::new(),
            total_allocations: 0,
            total_deallocations: 0,
        }
    }

    /// Take the oldest idle object of type `T`, if any.
    pub fn acquire<T: Any + Send + Sync>(&mut self) -> Option<T> {
        let index = self.objects.iter().position(|o| o.is::<T>())?;
        let object = self.objects.remove(index).downcast::<T>().ok()?;
        self.total_allocations += 1;
        Some(*object)
    }

    /// Return an object. Returns false and drops it when the pool is full.
    pub fn release<T: Any + Send + Sync>(&mut self, object: T) -> bool {
        if self.objects.len() >= self.max_size {
            return false;
        }
        self.objects.push(Box::new(object));
        self.total_deallocations += 1;
        true
    }

    /// Drop every idle object. Returns how many were dropped.
    pub fn clear(&mut self) -> usize {
        let cleared = self.objects.len();
        self.objects.clear();
        cleared
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    #[must_use]
    pub fn info(&self) -> PoolInfo {
        PoolInfo {
            pool_id: self.pool_id.clone(),
            description: self.description.clone(),
            max_size: self.max_size,
            current_size: self.objects.len(),
            total_allocations: self.total_allocations,
            total_deallocations: self.total_deallocations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Buffer(Vec<u8>);

    #[test]
    fn test_release_then_acquire() {
        let mut pool = ResourcePool::new("buffers", "frame buffers", 2);
        assert!(pool.release(Buffer(vec![1])));
        assert_eq!(pool.acquire::<Buffer>(), Some(Buffer(vec![1])));
        assert_eq!(pool.acquire::<Buffer>(), None);

        let info = pool.info();
        assert_eq!(info.total_allocations, 1);
        assert_eq!(info.total_deallocations, 1);
    }

    #[test]
    fn test_full_pool_refuses() {
        let mut pool = ResourcePool::new("p", "", 1);
        assert!(pool.release(Buffer(vec![])));
        assert!(!pool.release(Buffer(vec![])));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_acquire_matches_type() {
        let mut pool = ResourcePool::new("mixed", "", 4);
        pool.release(String::from("text"));
        pool.release(Buffer(vec![9]));

        assert_eq!(pool.acquire::<Buffer>(), Some(Buffer(vec![9])));
        assert_eq!(pool.acquire::<u32>(), None);
        assert_eq!(pool.acquire::<String>().as_deref(), Some("text"));
        assert!(pool.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut pool = ResourcePool::new("p", "", 4);
        pool.release(1u8);
        pool.release(2u8);
        assert_eq!(pool.clear(), 2);
        assert!(pool.is_empty());
    }
}

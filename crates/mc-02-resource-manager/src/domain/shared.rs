//! # Shared Object Registry
//!
//! Named weak references to objects owned elsewhere. The registry never keeps
//! an object alive; a dead reference is dropped on lookup.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Weak};

/// Outcome of resolving a name.
#[derive(Debug)]
pub enum Resolved<T> {
    Alive(Arc<T>),
    /// The object is alive but has a different type.
    WrongType,
    /// Unknown name, or the object was dropped.
    Missing,
}

#[derive(Default)]
pub struct SharedObjectRegistry {
    objects: HashMap<String, Weak<dyn Any + Send + Sync>>,
}

impl SharedObjectRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<T: Any + Send + Sync>(&mut self, id: &str, object: &Arc<T>) {
        let erased: Arc<dyn Any + Send + Sync> = object.clone();
        self.objects.insert(id.to_string(), Arc::downgrade(&erased));
    }

    /// Upgrade the reference for `id`, forgetting it if it died.
    pub fn resolve<T: Any + Send + Sync>(&mut self, id: &str) -> Resolved<T> {
        let Some(weak) = self.objects.get(id) else {
            return Resolved::Missing;
        };
        match weak.upgrade() {
            Some(object) => match object.downcast::<T>() {
                Ok(typed) => Resolved::Alive(typed),
                Err(_) => Resolved::WrongType,
            },
            None => {
                self.objects.remove(id);
                Resolved::Missing
            }
        }
    }

    #[must_use]
    pub fn is_alive(&self, id: &str) -> bool {
        self.objects
            .get(id)
            .is_some_and(|weak| weak.strong_count() > 0)
    }

    pub fn remove(&mut self, id: &str) -> bool {
        self.objects.remove(id).is_some()
    }

    /// Forget every dead reference. Returns how many were removed.
    pub fn purge_dead(&mut self) -> usize {
        let before = self.objects.len();
        self.objects.retain(|_, weak| weak.strong_count() > 0);
        before - self.objects.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

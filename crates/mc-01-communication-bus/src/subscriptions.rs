//! # Subscription Table
//!
//! Per-module ordered sets of event patterns.

use crate::pattern::EventPattern;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct SubscriptionTable {
    by_module: HashMap<String, Vec<EventPattern>>,
}

impl SubscriptionTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `pattern` for `module`. Returns false if it was already present.
    pub fn subscribe(&mut self, module: &str, pattern: &str) -> bool {
        let patterns = self.by_module.entry(module.to_string()).or_default();
        if patterns.iter().any(|p| p.as_str() == pattern) {
            return false;
        }
        patterns.push(EventPattern::new(pattern));
        true
    }

    /// Remove `pattern` for `module`. Returns false if it was not present.
    pub fn unsubscribe(&mut self, module: &str, pattern: &str) -> bool {
        let Some(patterns) = self.by_module.get_mut(module) else {
            return false;
        };
        let before = patterns.len();
        patterns.retain(|p| p.as_str() != pattern);
        let removed = patterns.len() != before;
        if patterns.is_empty() {
            self.by_module.remove(module);
        }
        removed
    }

    /// Drop every pattern of `module`. Returns false if it had none.
    pub fn unsubscribe_all(&mut self, module: &str) -> bool {
        self.by_module.remove(module).is_some()
    }

    /// Modules with at least one pattern matching `event`, sorted by name.
    #[must_use]
    pub fn subscribers_for(&self, event: &str) -> Vec<String> {
        let mut modules: Vec<String> = self
            .by_module
            .iter()
            .filter(|(_, patterns)| patterns.iter().any(|p| p.matches(event)))
            .map(|(module, _)| module.clone())
            .collect();
        modules.sort();
        modules
    }

    /// Patterns registered for `module`, in subscription order.
    #[must_use]
    pub fn patterns(&self, module: &str) -> Vec<String> {
        self.by_module
            .get(module)
            .map(|ps| ps.iter().map(|p| p.as_str().to_string()).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn module_count(&self) -> usize {
        self.by_module.len()
    }

    #[must_use]
    pub fn modules(&self) -> Vec<String> {
        let mut modules: Vec<String> = self.by_module.keys().cloned().collect();
        modules.sort();
        modules
    }
}

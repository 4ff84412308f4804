//! Time-scheduled module queues for preloads and lazy loads.

use shared_types::Timestamp;
use std::collections::VecDeque;

/// FIFO of modules, each due at a timestamp. A module appears at most once;
/// rescheduling moves its due time but keeps its position.
#[derive(Debug, Default)]
pub struct ScheduleQueue {
    entries: VecDeque<(String, Timestamp)>,
}

impl ScheduleQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the module was not queued before.
    pub fn schedule(&mut self, module: &str, due_ms: Timestamp) -> bool {
        match self.entries.iter_mut().find(|(m, _)| m == module) {
            Some(entry) => {
                entry.1 = due_ms;
                false
            }
            None => {
                self.entries.push_back((module.to_string(), due_ms));
                true
            }
        }
    }

    pub fn cancel(&mut self, module: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(m, _)| m != module);
        self.entries.len() != before
    }

    /// Remove and return every module due at `now`, in queue order.
    pub fn take_due(&mut self, now: Timestamp) -> Vec<String> {
        let mut due = Vec::new();
        self.entries.retain(|(module, at)| {
            if *at <= now {
                due.push(module.clone());
                false
            } else {
                true
            }
        });
        due
    }

    pub fn modules(&self) -> Vec<String> {
        self.entries.iter().map(|(m, _)| m.clone()).collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

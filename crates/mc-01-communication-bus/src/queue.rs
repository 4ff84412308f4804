//! # Priority Queues
//!
//! Five FIFO queues, one per priority level. Dequeue order is strictly by
//! level, FIFO within a level.

use crate::message::{Message, MessagePriority};
use shared_types::Timestamp;
use std::collections::VecDeque;

#[derive(Debug, Default)]
pub struct PriorityQueues {
    levels: [VecDeque<Message>; 5],
}

/// Messages removed by a dequeue pass.
#[derive(Debug, Default)]
pub struct DequeuedBatch {
    pub messages: Vec<Message>,
    pub expired: u64,
}

impl PriorityQueues {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.iter().map(VecDeque::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.iter().all(VecDeque::is_empty)
    }

    /// Queue length per level, highest priority first.
    #[must_use]
    pub fn len_by_priority(&self) -> [usize; 5] {
        let mut out = [0; 5];
        for (slot, level) in out.iter_mut().zip(&self.levels) {
            *slot = level.len();
        }
        out
    }

    /// Enqueue `message`, first evicting from the lowest non-empty level
    /// until there is room under `max_len`.
    ///
    /// Returns the evicted messages.
    pub fn push(&mut self, message: Message, max_len: usize) -> Vec<Message> {
        let mut evicted = Vec::new();
        while self.len() >= max_len.max(1) {
            match self.pop_lowest() {
                Some(old) => evicted.push(old),
                None => break,
            }
        }
        self.levels[message.priority.index()].push_back(message);
        evicted
    }

    fn pop_lowest(&mut self) -> Option<Message> {
        self.levels
            .iter_mut()
            .rev()
            .find(|level| !level.is_empty())
            .and_then(VecDeque::pop_front)
    }

    /// Dequeue up to `limit` live messages. Expired messages met on the way
    /// are discarded and counted without using the quota.
    pub fn pop_batch(&mut self, limit: usize, now: Timestamp) -> DequeuedBatch {
        let mut batch = DequeuedBatch::default();
        for level in &mut self.levels {
            while batch.messages.len() < limit {
                let Some(message) = level.pop_front() else {
                    break;
                };
                if message.is_expired(now) {
                    batch.expired += 1;
                } else {
                    batch.messages.push(message);
                }
            }
            if batch.messages.len() >= limit {
                break;
            }
        }
        batch
    }

    /// Remove every expired message. Returns how many were removed.
    pub fn remove_expired(&mut self, now: Timestamp) -> u64 {
        let mut removed = 0;
        for level in &mut self.levels {
            let before = level.len();
            level.retain(|m| !m.is_expired(now));
            removed += (before - level.len()) as u64;
        }
        removed
    }

    /// Drop everything. Returns how many messages were discarded.
    pub fn clear(&mut self) -> usize {
        let len = self.len();
        for level in &mut self.levels {
            level.clear();
        }
        len
    }

    #[must_use]
    pub fn peek_priority(&self) -> Option<MessagePriority> {
        MessagePriority::ALL
            .into_iter()
            .find(|p| !self.levels[p.index()].is_empty())
    }
}

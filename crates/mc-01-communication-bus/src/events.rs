//! # Bus Events
//!
//! Outbound notifications. Delivered over a `tokio::sync::broadcast` channel
//! from the processing task, never from inside `send`.

use crate::message::Message;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::debug;

#[derive(Debug, Clone)]
pub enum BusEvent {
    /// A message was delivered to `module`.
    MessageReceived {
        module: String,
        message: Arc<Message>,
    },
    /// A dequeued message finished routing.
    MessageProcessed { message_id: String, success: bool },
    /// Queue length after an enqueue or processing pass.
    QueueSizeChanged(usize),
    /// A threshold was crossed.
    PerformanceAlert(String),
}

/// Errors from inbox operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InboxError {
    /// The bus was dropped.
    #[error("Communication bus closed")]
    Closed,
}

/// Receives the messages delivered to one module.
///
/// Lagging inboxes skip the messages they missed.
pub struct ModuleInbox {
    receiver: broadcast::Receiver<BusEvent>,
    module: String,
}

impl ModuleInbox {
    pub(crate) fn new(receiver: broadcast::Receiver<BusEvent>, module: String) -> Self {
        Self { receiver, module }
    }

    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Wait for the next message addressed to this module.
    ///
    /// Returns `None` once the bus is dropped.
    pub async fn recv(&mut self) -> Option<Arc<Message>> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    if let Some(message) = self.accept(event) {
                        return Some(message);
                    }
                }
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    debug!(module = %self.module, lagged = count, "Inbox lagged, messages skipped");
                }
            }
        }
    }

    /// Take the next already-delivered message, if any.
    pub fn try_recv(&mut self) -> Result<Option<Arc<Message>>, InboxError> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if let Some(message) = self.accept(event) {
                        return Ok(Some(message));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Closed) => return Err(InboxError::Closed),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            }
        }
    }

    fn accept(&self, event: BusEvent) -> Option<Arc<Message>> {
        match event {
            BusEvent::MessageReceived { module, message } if module == self.module => {
                Some(message)
            }
            _ => None,
        }
    }
}

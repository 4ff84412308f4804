//! Error types for the Communication Bus

use crate::message::MessageType;
use thiserror::Error;

/// Reasons a message is rejected by `send`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SendError {
    /// Commands and requests must name a receiver
    #[error("{message_type:?} message has no receiver")]
    MissingReceiver { message_type: MessageType },

    /// Estimated payload size above the configured cap
    #[error("Payload too large: {size} > {max} bytes")]
    PayloadTooLarge { size: u64, max: u64 },

    /// A registered filter refused the message
    #[error("Rejected by filter '{filter_id}'")]
    RejectedByFilter { filter_id: String },
}

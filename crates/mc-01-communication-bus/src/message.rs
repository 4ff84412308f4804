//! # Messages
//!
//! The unit of communication between modules.

use serde::{Deserialize, Serialize};
use shared_types::{Metadata, Payload, Timestamp};

/// Metadata key carrying the event name used for fan-out routing.
pub const EVENT_KEY: &str = "event";

/// Metadata key carrying the command name of a `Command` message.
pub const COMMAND_KEY: &str = "command";

/// Metadata key carrying the request name of a `Request` message.
pub const REQUEST_KEY: &str = "request";

/// Kind of message, which decides how it is routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    Command,
    Event,
    Data,
    Request,
    Response,
    Broadcast,
}

impl MessageType {
    /// Whether this type must name a receiver.
    #[must_use]
    pub fn requires_receiver(self) -> bool {
        matches!(self, Self::Command | Self::Request)
    }
}

/// Delivery priority. Lower discriminant is delivered first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum MessagePriority {
    Critical = 0,
    High = 1,
    #[default]
    Normal = 2,
    Low = 3,
    Background = 4,
}

impl MessagePriority {
    /// All levels, highest priority first.
    pub const ALL: [Self; 5] = [
        Self::Critical,
        Self::High,
        Self::Normal,
        Self::Low,
        Self::Background,
    ];

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Where a message goes once dequeued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route<'a> {
    /// Deliver to one named module.
    Direct(&'a str),
    /// Deliver to every module subscribed to the event name.
    FanOut(Option<&'a str>),
    /// Nothing to deliver to.
    Unroutable,
}

/// A message travelling through the bus.
///
/// `id`, `timestamp_ms` and `expire_time_ms` are filled in by the bus when
/// left empty or zero. An `expire_time_ms` of 0 means the message never
/// expires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub sender: String,
    /// Empty for broadcast-style messages.
    pub receiver: String,
    pub message_type: MessageType,
    pub priority: MessagePriority,
    pub payload: Payload,
    pub metadata: Metadata,
    pub timestamp_ms: Timestamp,
    pub expire_time_ms: Timestamp,
    pub correlation_id: String,
}

impl Message {
    #[must_use]
    pub fn new(
        message_type: MessageType,
        sender: impl Into<String>,
        receiver: impl Into<String>,
        payload: Payload,
    ) -> Self {
        Self {
            id: String::new(),
            sender: sender.into(),
            receiver: receiver.into(),
            message_type,
            priority: MessagePriority::Normal,
            payload,
            metadata: Metadata::new(),
            timestamp_ms: 0,
            expire_time_ms: 0,
            correlation_id: String::new(),
        }
    }

    /// High priority command addressed to `receiver`.
    #[must_use]
    pub fn command(
        sender: impl Into<String>,
        receiver: impl Into<String>,
        command: &str,
        data: Payload,
    ) -> Self {
        Self::new(MessageType::Command, sender, receiver, data)
            .with_priority(MessagePriority::High)
            .with_metadata(COMMAND_KEY, command)
    }

    /// Event fanned out to subscribers of `event`.
    #[must_use]
    pub fn event(sender: impl Into<String>, event: &str, data: Payload) -> Self {
        Self::new(MessageType::Event, sender, "", data).with_metadata(EVENT_KEY, event)
    }

    /// High priority request with a fresh correlation id.
    #[must_use]
    pub fn request(
        sender: impl Into<String>,
        receiver: impl Into<String>,
        request: &str,
        data: Payload,
    ) -> Self {
        Self::new(MessageType::Request, sender, receiver, data)
            .with_priority(MessagePriority::High)
            .with_metadata(REQUEST_KEY, request)
            .with_correlation_id(uuid::Uuid::new_v4().to_string())
    }

    /// Response routed back to the sender of `request`.
    #[must_use]
    pub fn response_to(request: &Message, sender: impl Into<String>, data: Payload) -> Self {
        Self::new(MessageType::Response, sender, request.sender.clone(), data)
            .with_priority(MessagePriority::High)
            .with_correlation_id(request.correlation_id.clone())
    }

    /// Broadcast fanned out to subscribers of `event`.
    #[must_use]
    pub fn broadcast(sender: impl Into<String>, event: &str, data: Payload) -> Self {
        Self::new(MessageType::Broadcast, sender, "", data).with_metadata(EVENT_KEY, event)
    }

    /// Plain data message. An empty receiver makes it fan out by event name.
    #[must_use]
    pub fn data(sender: impl Into<String>, receiver: impl Into<String>, data: Payload) -> Self {
        Self::new(MessageType::Data, sender, receiver, data)
    }

    #[must_use]
    pub fn with_priority(mut self, priority: MessagePriority) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, key: &str, value: impl Into<Payload>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    #[must_use]
    pub fn with_event_name(self, event: &str) -> Self {
        self.with_metadata(EVENT_KEY, event)
    }

    #[must_use]
    pub fn with_expire_time(mut self, expire_time_ms: Timestamp) -> Self {
        self.expire_time_ms = expire_time_ms;
        self
    }

    #[must_use]
    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = correlation_id.into();
        self
    }

    /// Event name used for fan-out, if any.
    #[must_use]
    pub fn event_name(&self) -> Option<&str> {
        self.metadata.get(EVENT_KEY).and_then(Payload::as_str)
    }

    #[must_use]
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expire_time_ms != 0 && now > self.expire_time_ms
    }

    /// Routing decision for this message.
    #[must_use]
    pub fn route(&self) -> Route<'_> {
        match self.message_type {
            MessageType::Command | MessageType::Request | MessageType::Response => {
                if self.receiver.is_empty() {
                    Route::Unroutable
                } else {
                    Route::Direct(&self.receiver)
                }
            }
            MessageType::Data if !self.receiver.is_empty() => Route::Direct(&self.receiver),
            MessageType::Data | MessageType::Event | MessageType::Broadcast => {
                Route::FanOut(self.event_name())
            }
        }
    }
}

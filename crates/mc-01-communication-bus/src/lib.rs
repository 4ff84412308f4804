//! # MC-01: Communication Bus
//!
//! In-process message router between the modules of a host application.
//!
//! ## Routing
//!
//! ```text
//! ┌──────────────┐   send()    ┌──────────────────────┐   tick    ┌──────────────┐
//! │   Module A   │ ──────────▶ │ Critical … Background │ ───────▶ │   Module B   │
//! └──────────────┘             │  five FIFO queues     │  inbox() └──────────────┘
//!                              └──────────────────────┘
//! ```
//!
//! - `Command`, `Request`, `Response` and addressed `Data` go to the receiver.
//! - `Event`, `Broadcast` and unaddressed `Data` fan out to every module whose
//!   subscription pattern matches the message's event name.
//!
//! ## Guarantees
//!
//! - Delivery order is strictly by priority, FIFO within a level.
//! - Overflow evicts the oldest message of the lowest non-empty level.
//! - Expired messages are counted as dropped and never delivered.
//! - Delivery happens on the processing task, never inside `send`.

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod bus;
pub mod config;
pub mod error;
pub mod events;
pub mod message;
pub mod metrics;
pub mod pattern;
pub mod queue;
pub mod subscriptions;

pub use bus::{CommunicationBus, MessageFilter, SUBSCRIBE_ALL};
pub use config::BusConfig;
pub use error::SendError;
pub use events::{BusEvent, InboxError, ModuleInbox};
pub use message::{Message, MessagePriority, MessageType, Route};
pub use metrics::BusMetrics;

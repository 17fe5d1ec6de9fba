//! # Prometheus Handoff Queue
//!
//! An async, in-process priority message queue that hands typed messages from
//! any number of independently timed producers to a single consumer.
//!
//! ## Key Features
//!
//! - **Zero-latency handoff**: a message enqueued while the consumer is waiting
//!   is delivered straight to it, bypassing the buffer and its capacity bound
//! - **Strict priority ordering**: buffered messages drain most urgent first,
//!   FIFO within a priority class
//! - **Single consumer**: a second consumer fails fast with `AlreadyConsuming`
//! - **Clean termination**: `done` drains what is buffered, `fail` stops at once
//!   and reports the error to every later operation
//! - **Pause/resume, cancellation and TTL expiry** without polling
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use prometheus_handoff_queue::config::QueueConfig;
//! use prometheus_handoff_queue::core::{Message, MessageQueue};
//! use prometheus_handoff_queue::util::Priority;
//!
//! let queue = MessageQueue::new(QueueConfig::new().with_max_size(1024))?;
//!
//! queue.enqueue(Message::user_input("summarize this"))?;
//! queue.enqueue(Message::user_input("stop").with_priority(Priority::Critical))?;
//! queue.done()?;
//!
//! // "stop" comes out first.
//! while let Some(message) = queue.pull().await? {
//!     handle(message);
//! }
//! queue.destroy().await?;
//! ```
//!
//! Long-lived consumers attach once with [`MessageQueue::consumer`] or
//! [`MessageQueue::stream`] and keep pulling; dropping the handle lets a new
//! consumer take over.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core queue abstractions: messages, lifecycle, handoff and consumption.
pub mod core;
/// Configuration models for queues and their background tasks.
pub mod config;
/// Builders to construct queues from configuration.
pub mod builders;
/// Infrastructure backing the queue (priority buffer).
pub mod infra;
/// Shared utilities.
pub mod util;

pub use crate::builders::MessageQueueBuilder;
pub use crate::config::QueueConfig;
pub use crate::core::{
    Consumer, Message, MessageKind, MessageQueue, MessageStream, QueueError, QueueResult,
    QueueState, QueueStats,
};
pub use crate::util::{MessageId, Priority};

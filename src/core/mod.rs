//! Core queue abstractions: messages, lifecycle, handoff and consumption.

pub mod cleanup;
pub mod consumer;
pub mod error;
pub mod handoff;
pub mod lifecycle;
pub mod message;
pub(crate) mod reaper;
pub mod stats;

pub use cleanup::{CleanupHook, FnCleanup};
pub use consumer::{Consumer, MessageStream};
pub use error::{AppResult, QueueError, QueueResult};
pub use handoff::{MessageQueue, QueueState};
pub use lifecycle::{Lifecycle, LifecycleState};
pub use message::{ControlAction, Message, MessageKind, StreamEvent};
pub use stats::{QueueStats, StatsCollector};

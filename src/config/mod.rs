//! Configuration models for queues and their background tasks.

pub mod queue;

pub use queue::{QueueConfig, DEFAULT_MESSAGE_TTL_MS, DEFAULT_REAPER_INTERVAL_MS, ENV_PREFIX};

//! Error types for queue operations.

use std::sync::Arc;

use thiserror::Error;

/// Errors produced by queue operations. Every variant is recoverable by the caller.
#[derive(Debug, Clone, Error)]
pub enum QueueError {
    /// A second consumer tried to pull while one is already attached.
    #[error("already consuming: another consumer is attached")]
    AlreadyConsuming,
    /// Enqueue attempted after the producer signalled completion.
    #[error("queue done: no further messages are accepted")]
    QueueDone,
    /// The producer signalled failure; carries the stored error.
    #[error("queue errored: {0}")]
    QueueErrored(Arc<anyhow::Error>),
    /// The bounded buffer is saturated.
    #[error("queue full: {size}/{max_size} messages buffered")]
    QueueFull {
        /// Buffered messages at rejection time.
        size: usize,
        /// Configured bound.
        max_size: usize,
    },
    /// The external cleanup callback failed during destroy.
    #[error("cleanup failed: {0}")]
    CleanupFailed(String),
    /// The queue has been destroyed.
    #[error("queue destroyed")]
    QueueDestroyed,
    /// A pull was cancelled before a message arrived.
    #[error("pull cancelled")]
    Cancelled,
    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl QueueError {
    /// Wrap a producer failure.
    pub fn errored(error: impl Into<anyhow::Error>) -> Self {
        Self::QueueErrored(Arc::new(error.into()))
    }

    /// True for the variants that mean the sequence can never yield again.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::QueueErrored(_) | Self::QueueDestroyed)
    }
}

/// Result alias for queue operations.
pub type QueueResult<T> = Result<T, QueueError>;

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;

//! Builder assembling a [`MessageQueue`] from configuration.

use std::time::Duration;

use tracing::debug;

use crate::config::QueueConfig;
use crate::core::reaper::TtlReaper;
use crate::core::{AppResult, CleanupHook, FnCleanup, MessageQueue, QueueError, QueueResult};

/// Builds a [`MessageQueue`], optionally with a cleanup hook.
///
/// ```rust,ignore
/// use prometheus_handoff_queue::builders::MessageQueueBuilder;
/// use prometheus_handoff_queue::config::QueueConfig;
///
/// let queue = MessageQueueBuilder::new(QueueConfig::new().with_max_size(256))
///     .with_cleanup_fn(|| Ok(()))
///     .build()?;
/// ```
pub struct MessageQueueBuilder {
    config: QueueConfig,
    cleanup: Option<Box<dyn CleanupHook>>,
}

impl MessageQueueBuilder {
    /// Start from `config`.
    pub fn new(config: QueueConfig) -> Self {
        Self {
            config,
            cleanup: None,
        }
    }

    /// Run `hook` during destroy.
    #[must_use]
    pub fn with_cleanup(mut self, hook: impl CleanupHook) -> Self {
        self.cleanup = Some(Box::new(hook));
        self
    }

    /// Run a synchronous closure during destroy.
    #[must_use]
    pub fn with_cleanup_fn<F>(self, f: F) -> Self
    where
        F: Fn() -> AppResult<()> + Send + Sync + 'static,
    {
        self.with_cleanup(FnCleanup(f))
    }

    /// Validate the configuration, create the queue and start the TTL reaper
    /// when `auto_cleanup` is on and a tokio runtime is available.
    pub fn build(self) -> QueueResult<MessageQueue> {
        self.config.validate().map_err(QueueError::InvalidConfig)?;

        let wants_reaper = self.config.wants_reaper();
        let interval = Duration::from_millis(self.config.reaper_interval_ms);
        let queue = MessageQueue::from_parts(self.config, self.cleanup);

        if wants_reaper {
            let started = TtlReaper::new(&queue.shared, interval).spawn().is_some();
            debug!(started, ?interval, "TTL reaper configured");
        }
        Ok(queue)
    }
}

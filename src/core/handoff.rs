//! Handoff coordinator: the queue's producer surface and shared state.
//!
//! Buffer, waiter slot, lifecycle and counters live in one [`Core`] behind a
//! single `parking_lot::Mutex`, so "hand off to the waiter, else buffer" and
//! "pop, else register as waiter" are each one critical section. The waiter is
//! a `oneshot::Sender<Message>`; signals other than a message (done, fail,
//! resume, destroy) wake it by dropping the sender, and the woken pull
//! re-reads state under the lock.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::QueueConfig;
use crate::core::consumer::{Consumer, MessageStream};
use crate::core::lifecycle::{Lifecycle, LifecycleState};
use crate::core::stats::{QueueStats, StatsCollector};
use crate::core::{CleanupHook, Message, QueueError, QueueResult};
use crate::infra::buffer::PriorityBuffer;
use crate::util::clock::now_ms;

/// Snapshot of the lifecycle and counters. Always available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueState {
    /// A consumer has attached at least once.
    pub started: bool,
    /// Producer signalled completion.
    pub is_done: bool,
    /// Producer signalled failure.
    pub has_error: bool,
    /// Delivery is paused.
    pub is_paused: bool,
    /// Messages currently buffered, after discarding expired entries at the front.
    pub message_count: usize,
    /// Messages delivered to the consumer so far.
    pub processing_count: u64,
    /// Rejected enqueues plus failure signals.
    pub error_count: u64,
    /// Current lifecycle state.
    pub lifecycle: LifecycleState,
}

/// Outcome of one locked step of a pull.
pub(crate) enum PullStep {
    /// Resolved without suspending; `None` is the clean end of sequence.
    Ready(Option<Message>),
    /// Registered as the waiter; await the receiver.
    Wait(oneshot::Receiver<Message>),
}

/// State guarded by the queue mutex.
pub(crate) struct Core {
    pub(crate) buffer: PriorityBuffer,
    pub(crate) waiter: Option<oneshot::Sender<Message>>,
    pub(crate) lifecycle: Lifecycle,
    pub(crate) consumer_attached: bool,
    delivered: u64,
    errors: u64,
    stats: Option<StatsCollector>,
    cleanup: Option<Box<dyn CleanupHook>>,
}

impl Core {
    fn record_error(&mut self) {
        self.errors += 1;
        if let Some(stats) = self.stats.as_mut() {
            stats.record_error();
        }
    }

    fn record_cleared(&mut self, count: usize) {
        if let Some(stats) = self.stats.as_mut() {
            stats.record_cleared(count);
        }
    }

    pub(crate) fn record_delivered(&mut self, waited_ms: Option<u128>) {
        self.delivered += 1;
        if let Some(stats) = self.stats.as_mut() {
            stats.record_delivered(waited_ms);
        }
    }

    /// Wake a registered waiter so it re-reads state.
    fn wake_waiter(&mut self) {
        self.waiter.take();
    }

    /// Deliver to the registered waiter, giving the message back if there is
    /// none or its receiver is gone.
    fn try_handoff(&mut self, message: Message) -> Result<(), Message> {
        match self.waiter.take() {
            Some(tx) => tx.send(message),
            None => Err(message),
        }
    }
}

/// State shared by every handle onto one queue.
pub(crate) struct Shared {
    pub(crate) core: Mutex<Core>,
    pub(crate) config: QueueConfig,
    pub(crate) reaper: CancellationToken,
}

impl Shared {
    /// Attach the single consumer. Fails fast when one is already attached.
    pub(crate) fn attach(&self) -> QueueResult<()> {
        let mut core = self.core.lock();
        if core.lifecycle.is_destroyed() {
            return Err(QueueError::QueueDestroyed);
        }
        if core.consumer_attached {
            debug!("consumer attach rejected: already consuming");
            return Err(QueueError::AlreadyConsuming);
        }
        core.consumer_attached = true;
        if core.lifecycle.start() {
            info!("queue consumption started");
        }
        Ok(())
    }

    /// Release the consumer slot and any waiter it left behind.
    pub(crate) fn detach(&self) {
        let mut core = self.core.lock();
        core.consumer_attached = false;
        core.waiter = None;
    }

    /// One locked step of the pull algorithm: pop, end, fail, or register.
    pub(crate) fn next_step(&self) -> QueueResult<PullStep> {
        let mut core = self.core.lock();
        core.lifecycle.ensure_usable()?;

        if !core.lifecycle.is_paused() {
            let now = now_ms();
            if let Some(entry) = core.buffer.pop_front(now) {
                core.record_delivered(Some(now.saturating_sub(entry.buffered_at_ms)));
                return Ok(PullStep::Ready(Some(entry.message)));
            }
            if core.lifecycle.is_done() {
                return Ok(PullStep::Ready(None));
            }
        }

        let (tx, rx) = oneshot::channel();
        core.waiter = Some(tx);
        Ok(PullStep::Wait(rx))
    }

    /// Clear the waiter slot after a pull stops waiting. A message that was
    /// handed off in the meantime goes back to the head of its class.
    pub(crate) fn abandon_wait(&self, rx: &mut oneshot::Receiver<Message>) {
        let mut core = self.core.lock();
        core.waiter = None;
        if let Ok(message) = rx.try_recv() {
            if core.lifecycle.ensure_usable().is_ok() {
                debug!(id = %message.id(), "requeueing handoff raced by cancellation");
                core.buffer.requeue(message, now_ms());
            }
        }
    }

    pub(crate) fn is_destroyed(&self) -> bool {
        self.core.lock().lifecycle.is_destroyed()
    }

    pub(crate) fn reap_expired(&self) -> usize {
        let mut core = self.core.lock();
        if core.lifecycle.is_destroyed() {
            return 0;
        }
        core.buffer.prune_expired(now_ms())
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        self.reaper.cancel();
    }
}

/// Async priority message queue with zero-latency handoff to a single consumer.
///
/// Cloning yields another handle onto the same queue, so producers and the
/// consumer can live on different tasks.
///
/// ```rust,ignore
/// use prometheus_handoff_queue::core::{Message, MessageQueue};
///
/// let queue = MessageQueue::with_defaults()?;
/// let producer = queue.clone();
/// tokio::spawn(async move {
///     producer.enqueue(Message::user_input("hello"))?;
///     producer.done()
/// });
/// while let Some(msg) = queue.pull().await? {
///     println!("{:?}", msg.kind());
/// }
/// ```
#[derive(Clone)]
pub struct MessageQueue {
    pub(crate) shared: Arc<Shared>,
}

impl std::fmt::Debug for MessageQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageQueue")
            .field("config", &self.shared.config)
            .field("state", &self.state())
            .finish()
    }
}

impl MessageQueue {
    /// Build a queue from a validated configuration. Use
    /// [`MessageQueueBuilder`](crate::builders::MessageQueueBuilder) to attach a
    /// cleanup hook or start the background reaper.
    pub(crate) fn from_parts(config: QueueConfig, cleanup: Option<Box<dyn CleanupHook>>) -> Self {
        let buffer = PriorityBuffer::new(config.priority_queuing, Some(config.message_ttl_ms));
        let stats = config.enable_stats.then(StatsCollector::new);
        let core = Core {
            buffer,
            waiter: None,
            lifecycle: Lifecycle::new(),
            consumer_attached: false,
            delivered: 0,
            errors: 0,
            stats,
            cleanup,
        };
        Self {
            shared: Arc::new(Shared {
                core: Mutex::new(core),
                config,
                reaper: CancellationToken::new(),
            }),
        }
    }

    /// Build a queue from `config`, starting the reaper when configured.
    pub fn new(config: QueueConfig) -> QueueResult<Self> {
        crate::builders::MessageQueueBuilder::new(config).build()
    }

    /// Build a queue with the default configuration.
    pub fn with_defaults() -> QueueResult<Self> {
        Self::new(QueueConfig::default())
    }

    /// Configuration the queue was built with.
    pub fn config(&self) -> &QueueConfig {
        &self.shared.config
    }

    /// Hand `message` to the waiting consumer, or buffer it.
    ///
    /// A waiting consumer receives the message directly, bypassing the buffer
    /// and its capacity bound. While paused, messages are always buffered.
    pub fn enqueue(&self, message: Message) -> QueueResult<()> {
        let mut core = self.shared.core.lock();
        if let Err(err) = core.lifecycle.ensure_accepting() {
            core.record_error();
            warn!(id = %message.id(), error = %err, "enqueue rejected");
            return Err(err);
        }

        let (id, kind, priority) = (message.id(), message.kind().name(), message.priority());
        let message = if core.lifecycle.is_paused() {
            message
        } else {
            match core.try_handoff(message) {
                Ok(()) => {
                    if let Some(stats) = core.stats.as_mut() {
                        stats.record_accepted(kind, priority, true);
                    }
                    debug!(%id, "handed off to waiting consumer");
                    return Ok(());
                }
                Err(returned) => returned,
            }
        };

        let now = now_ms();
        if let Some(max_size) = self.shared.config.capacity() {
            if core.buffer.len() >= max_size {
                core.buffer.prune_expired(now);
            }
            if core.buffer.len() >= max_size {
                let size = core.buffer.len();
                core.record_error();
                if let Some(stats) = core.stats.as_mut() {
                    stats.record_rejected();
                }
                warn!(%id, size, max_size, "enqueue rejected: queue full");
                return Err(QueueError::QueueFull { size, max_size });
            }
        }

        if let Some(stats) = core.stats.as_mut() {
            stats.record_accepted(kind, priority, false);
        }
        core.buffer.insert(message, now);
        debug!(%id, buffered = core.buffer.len(), "message buffered");
        Ok(())
    }

    /// Signal completion. Buffered messages still drain; repeated calls are no-ops.
    pub fn done(&self) -> QueueResult<()> {
        let mut core = self.shared.core.lock();
        if core.lifecycle.finish()? {
            info!(remaining = core.buffer.len(), "queue marked done");
            core.wake_waiter();
        }
        Ok(())
    }

    /// Signal failure. Buffered messages are discarded and every later
    /// operation reports `error`.
    pub fn fail(&self, error: impl Into<anyhow::Error>) -> QueueResult<()> {
        let error = Arc::new(error.into());
        let mut core = self.shared.core.lock();
        core.lifecycle.fail(Arc::clone(&error))?;
        let discarded = core.buffer.clear();
        core.record_cleared(discarded);
        core.record_error();
        core.wake_waiter();
        warn!(error = %error, discarded, "queue failed");
        Ok(())
    }

    /// Pull the next message, suspending until one arrives.
    ///
    /// `Ok(None)` is the clean end of sequence after [`done`](Self::done).
    /// Fails with `AlreadyConsuming` while a [`Consumer`] is attached.
    pub async fn pull(&self) -> QueueResult<Option<Message>> {
        let mut consumer = self.consumer()?;
        consumer.next().await
    }

    /// Like [`pull`](Self::pull), returning `Cancelled` if `token` fires while waiting.
    pub async fn pull_with_cancel(
        &self,
        token: &CancellationToken,
    ) -> QueueResult<Option<Message>> {
        let mut consumer = self.consumer_with_cancel(token.clone())?;
        consumer.next().await
    }

    /// Attach the single consumer for a sequence of pulls.
    pub fn consumer(&self) -> QueueResult<Consumer> {
        Consumer::attach(Arc::clone(&self.shared), None)
    }

    /// Attach the single consumer, cancellable through `token`.
    pub fn consumer_with_cancel(&self, token: CancellationToken) -> QueueResult<Consumer> {
        Consumer::attach(Arc::clone(&self.shared), Some(token))
    }

    /// Attach the single consumer and expose it as a `Stream`.
    pub fn stream(&self) -> QueueResult<MessageStream> {
        Ok(self.consumer()?.into_stream())
    }

    /// Front message without removing it.
    pub fn peek(&self) -> QueueResult<Option<Message>> {
        let mut core = self.shared.core.lock();
        core.lifecycle.ensure_usable()?;
        Ok(core.buffer.peek_front(now_ms()).map(|entry| entry.message.clone()))
    }

    /// Buffered message count.
    ///
    /// Expired entries at the front are discarded first, so an empty result
    /// agrees with [`peek`](Self::peek). Expired entries queued behind a live
    /// one are still counted until they reach the front or are swept.
    pub fn size(&self) -> QueueResult<usize> {
        let mut core = self.shared.core.lock();
        core.lifecycle.ensure_usable()?;
        core.buffer.discard_expired_front(now_ms());
        Ok(core.buffer.len())
    }

    /// True when no live message is buffered.
    pub fn is_empty(&self) -> QueueResult<bool> {
        Ok(self.size()? == 0)
    }

    /// True when the buffer is bounded and at capacity. Expired entries are
    /// swept before deciding, matching what enqueue would do.
    pub fn is_full(&self) -> QueueResult<bool> {
        let mut core = self.shared.core.lock();
        core.lifecycle.ensure_usable()?;
        let Some(max_size) = self.shared.config.capacity() else {
            return Ok(false);
        };
        if core.buffer.len() >= max_size {
            core.buffer.prune_expired(now_ms());
        }
        Ok(core.buffer.len() >= max_size)
    }

    /// Drop every buffered message and return how many were removed.
    pub fn clear(&self) -> QueueResult<usize> {
        let mut core = self.shared.core.lock();
        core.lifecycle.ensure_usable()?;
        let removed = core.buffer.clear();
        core.record_cleared(removed);
        debug!(removed, "buffer cleared");
        Ok(removed)
    }

    /// Remove expired buffered messages now, without waiting for the reaper.
    pub fn reap_expired(&self) -> QueueResult<usize> {
        let mut core = self.shared.core.lock();
        core.lifecycle.ensure_usable()?;
        Ok(core.buffer.prune_expired(now_ms()))
    }

    /// Stop delivering. Enqueue keeps buffering.
    pub fn pause(&self) -> QueueResult<()> {
        let mut core = self.shared.core.lock();
        if core.lifecycle.pause()? {
            info!("queue paused");
        }
        Ok(())
    }

    /// Resume delivery and wake a waiting consumer so it re-checks the buffer.
    pub fn resume(&self) -> QueueResult<()> {
        let mut core = self.shared.core.lock();
        if core.lifecycle.resume()? {
            info!(buffered = core.buffer.len(), "queue resumed");
            core.wake_waiter();
        }
        Ok(())
    }

    /// Whether delivery is paused.
    pub fn is_paused(&self) -> bool {
        self.shared.core.lock().lifecycle.is_paused()
    }

    /// Lifecycle and counter snapshot.
    pub fn state(&self) -> QueueState {
        let mut core = self.shared.core.lock();
        core.buffer.discard_expired_front(now_ms());
        QueueState {
            started: core.lifecycle.started(),
            is_done: core.lifecycle.is_done(),
            has_error: core.lifecycle.is_errored(),
            is_paused: core.lifecycle.is_paused(),
            message_count: core.buffer.len(),
            processing_count: core.delivered,
            error_count: core.errors,
            lifecycle: core.lifecycle.state(),
        }
    }

    /// Statistics snapshot, `None` when stats are disabled.
    pub fn stats(&self) -> Option<QueueStats> {
        let core = self.shared.core.lock();
        core.stats
            .as_ref()
            .map(|stats| stats.snapshot(core.buffer.len(), core.buffer.expired_total()))
    }

    /// Tear the queue down.
    ///
    /// Cancels a waiting pull, clears the buffer, stops the reaper and runs the
    /// cleanup hook. Resources are released even when the hook fails, in which
    /// case `CleanupFailed` is returned. Calling it again is a no-op.
    pub async fn destroy(&self) -> QueueResult<()> {
        let cleanup = {
            let mut core = self.shared.core.lock();
            if !core.lifecycle.destroy() {
                return Ok(());
            }
            core.wake_waiter();
            let cleared = core.buffer.clear();
            core.record_cleared(cleared);
            info!(cleared, "queue destroyed");
            core.cleanup.take()
        };
        self.shared.reaper.cancel();

        if let Some(hook) = cleanup {
            if let Err(err) = hook.cleanup().await {
                warn!(error = %err, "queue cleanup hook failed");
                return Err(QueueError::CleanupFailed(format!("{err:#}")));
            }
        }
        Ok(())
    }
}

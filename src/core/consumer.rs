//! The single consumer: pull loop, cancellation and `Stream` adapter.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::stream::{self, BoxStream, Stream, StreamExt};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::core::handoff::{PullStep, Shared};
use crate::core::{Message, QueueError, QueueResult};

/// Exclusive handle onto a queue's consumption side.
///
/// At most one exists per queue; attaching a second fails with
/// `AlreadyConsuming`. Dropping the handle releases the slot, so consumption
/// can be restarted later by attaching again.
pub struct Consumer {
    shared: Arc<Shared>,
    cancel: Option<CancellationToken>,
}

impl std::fmt::Debug for Consumer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Consumer")
            .field("cancellable", &self.cancel.is_some())
            .finish_non_exhaustive()
    }
}

/// Clears the waiter slot if a pull stops waiting for any reason, including
/// the pull future being dropped.
struct PendingPull<'a> {
    shared: &'a Shared,
    rx: oneshot::Receiver<Message>,
}

impl Drop for PendingPull<'_> {
    fn drop(&mut self) {
        self.shared.abandon_wait(&mut self.rx);
    }
}

impl Consumer {
    pub(crate) fn attach(
        shared: Arc<Shared>,
        cancel: Option<CancellationToken>,
    ) -> QueueResult<Self> {
        shared.attach()?;
        Ok(Self { shared, cancel })
    }

    /// Next message, suspending while the buffer is empty or delivery is paused.
    ///
    /// Returns `Ok(None)` once the queue is done and drained, the stored error
    /// after a failure, and `Cancelled` when the cancellation token fires or
    /// the queue is destroyed while waiting.
    pub async fn next(&mut self) -> QueueResult<Option<Message>> {
        loop {
            let rx = match self.shared.next_step()? {
                PullStep::Ready(message) => return Ok(message),
                PullStep::Wait(rx) => rx,
            };
            let mut pending = PendingPull {
                shared: &self.shared,
                rx,
            };

            let delivered = match &self.cancel {
                Some(token) => {
                    tokio::select! {
                        biased;
                        result = &mut pending.rx => result,
                        () = token.cancelled() => {
                            debug!("pull cancelled while waiting");
                            return Err(QueueError::Cancelled);
                        }
                    }
                }
                None => (&mut pending.rx).await,
            };

            if let Ok(message) = delivered {
                drop(pending);
                self.shared.core.lock().record_delivered(None);
                return Ok(Some(message));
            }
            // Sender dropped: something changed state. Re-check under the lock.
            drop(pending);
            if self.shared.is_destroyed() {
                return Err(QueueError::Cancelled);
            }
        }
    }

    /// Convert into a `Stream` that ends after the clean end of sequence or
    /// after yielding its first error.
    pub fn into_stream(self) -> MessageStream {
        let inner = stream::unfold(Some(self), |slot| async move {
            let mut consumer = slot?;
            match consumer.next().await {
                Ok(Some(message)) => Some((Ok(message), Some(consumer))),
                Ok(None) => None,
                Err(err) => Some((Err(err), None)),
            }
        });
        MessageStream {
            inner: inner.boxed(),
        }
    }
}

impl Drop for Consumer {
    fn drop(&mut self) {
        self.shared.detach();
    }
}

/// `Stream` view of a [`Consumer`].
pub struct MessageStream {
    inner: BoxStream<'static, QueueResult<Message>>,
}

impl Stream for MessageStream {
    type Item = QueueResult<Message>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

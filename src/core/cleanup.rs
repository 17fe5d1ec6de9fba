//! External cleanup run once during destroy.

use async_trait::async_trait;

use crate::core::AppResult;

/// Cleanup callback invoked by [`MessageQueue::destroy`](crate::core::MessageQueue::destroy).
///
/// A failure is reported as `CleanupFailed`, but the queue's own resources are
/// released regardless.
///
/// # Example
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use prometheus_handoff_queue::core::{AppResult, CleanupHook};
///
/// struct FlushTranscript;
///
/// #[async_trait]
/// impl CleanupHook for FlushTranscript {
///     async fn cleanup(&self) -> AppResult<()> {
///         // write pending output somewhere durable
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait CleanupHook: Send + Sync + 'static {
    /// Release external resources tied to the queue.
    async fn cleanup(&self) -> AppResult<()>;
}

/// Adapter turning a synchronous closure into a [`CleanupHook`].
pub struct FnCleanup<F>(pub F);

#[async_trait]
impl<F> CleanupHook for FnCleanup<F>
where
    F: Fn() -> AppResult<()> + Send + Sync + 'static,
{
    async fn cleanup(&self) -> AppResult<()> {
        (self.0)()
    }
}

//! Lifecycle state machine governing which operations are legal.
//!
//! ```text
//! Created --first pull--> Active
//! Created|Active --done--> Done      (buffer still drains)
//! Created|Active --fail--> Errored   (buffer discarded)
//! any --destroy--> Destroyed         (unusable)
//! ```
//!
//! The pause flag is orthogonal to the state and only gates delivery.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::{QueueError, QueueResult};

/// Main lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// No consumption started yet.
    Created,
    /// Consumption in progress.
    Active,
    /// Producer signalled completion.
    Done,
    /// Producer signalled failure.
    Errored,
    /// Destroyed; every further operation is rejected.
    Destroyed,
}

/// Lifecycle controller: state, pause overlay and the stored failure.
#[derive(Debug)]
pub struct Lifecycle {
    state: LifecycleState,
    started: bool,
    paused: bool,
    error: Option<Arc<anyhow::Error>>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    /// A fresh controller in [`LifecycleState::Created`].
    pub const fn new() -> Self {
        Self {
            state: LifecycleState::Created,
            started: false,
            paused: false,
            error: None,
        }
    }

    /// Current state.
    pub const fn state(&self) -> LifecycleState {
        self.state
    }

    /// Whether consumption was ever started.
    pub const fn started(&self) -> bool {
        self.started
    }

    /// Delivery gate.
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Producer signalled completion.
    pub fn is_done(&self) -> bool {
        self.state == LifecycleState::Done
    }

    /// Producer signalled failure.
    pub fn is_errored(&self) -> bool {
        self.state == LifecycleState::Errored
    }

    /// Destroy has run.
    pub fn is_destroyed(&self) -> bool {
        self.state == LifecycleState::Destroyed
    }

    fn errored(&self) -> QueueError {
        self.error.clone().map_or_else(
            || QueueError::errored(anyhow::anyhow!("queue failed")),
            QueueError::QueueErrored,
        )
    }

    /// Reject when destroyed or errored. Gate for reads and pulls.
    pub fn ensure_usable(&self) -> QueueResult<()> {
        match self.state {
            LifecycleState::Destroyed => Err(QueueError::QueueDestroyed),
            LifecycleState::Errored => Err(self.errored()),
            _ => Ok(()),
        }
    }

    /// Reject when the queue no longer takes new messages. Gate for enqueue.
    pub fn ensure_accepting(&self) -> QueueResult<()> {
        self.ensure_usable()?;
        if self.is_done() {
            return Err(QueueError::QueueDone);
        }
        Ok(())
    }

    /// Mark consumption started; `Created` moves to `Active`. Returns true on the
    /// first call.
    pub fn start(&mut self) -> bool {
        if self.state == LifecycleState::Created {
            self.state = LifecycleState::Active;
        }
        !std::mem::replace(&mut self.started, true)
    }

    /// Transition to `Done`. Returns false when already done.
    pub fn finish(&mut self) -> QueueResult<bool> {
        self.ensure_usable()?;
        if self.is_done() {
            return Ok(false);
        }
        self.state = LifecycleState::Done;
        Ok(true)
    }

    /// Transition to `Errored`, storing `error` for every later operation.
    pub fn fail(&mut self, error: Arc<anyhow::Error>) -> QueueResult<()> {
        self.ensure_accepting()?;
        self.state = LifecycleState::Errored;
        self.error = Some(error);
        Ok(())
    }

    /// Transition to `Destroyed`. Returns false when already destroyed.
    pub fn destroy(&mut self) -> bool {
        if self.is_destroyed() {
            return false;
        }
        self.state = LifecycleState::Destroyed;
        self.paused = false;
        true
    }

    /// Set the pause flag. Returns true if it changed.
    pub fn pause(&mut self) -> QueueResult<bool> {
        if self.is_destroyed() {
            return Err(QueueError::QueueDestroyed);
        }
        Ok(!std::mem::replace(&mut self.paused, true))
    }

    /// Clear the pause flag. Returns true if it changed.
    pub fn resume(&mut self) -> QueueResult<bool> {
        if self.is_destroyed() {
            return Err(QueueError::QueueDestroyed);
        }
        Ok(std::mem::replace(&mut self.paused, false))
    }
}

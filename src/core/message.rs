//! Immutable typed messages carried by the queue.
//!
//! The queue only looks at [`Message::id`], [`Message::priority`] and
//! [`Message::created_at_ms`]; the [`MessageKind`] payload is opaque to it and
//! exists so producers and consumers can dispatch with a `match`.

use serde::{Deserialize, Serialize};

use crate::util::clock::now_ms;
use crate::util::serde::{MessageId, Priority};

/// Control signals routed through the queue alongside regular traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlAction {
    /// Ask the consumer to pause its own processing.
    Pause,
    /// Ask the consumer to resume processing.
    Resume,
    /// Cancel the in-flight operation.
    Cancel,
    /// Shut the consumer down.
    Shutdown,
}

/// Lifecycle marker for streamed output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamEvent {
    /// A stream opened.
    Start,
    /// A chunk of streamed content.
    Chunk(String),
    /// The stream closed.
    End,
}

/// Closed set of message categories with their payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageKind {
    /// A command invocation such as `/help`.
    Command {
        /// Command name without the leading slash.
        name: String,
        /// Positional arguments.
        args: Vec<String>,
    },
    /// Free-form user input.
    UserInput {
        /// Raw text as typed.
        text: String,
    },
    /// Output produced by an agent.
    AgentOutput {
        /// Rendered content.
        content: String,
        /// Whether this is the last output for the current turn.
        is_final: bool,
    },
    /// Out-of-band control signal.
    Control {
        /// Requested action.
        action: ControlAction,
    },
    /// Error report from a producer.
    Error {
        /// Human readable description.
        message: String,
        /// Whether the producer expects to continue.
        recoverable: bool,
    },
    /// Streaming lifecycle event.
    Stream {
        /// Stream event.
        event: StreamEvent,
    },
}

impl MessageKind {
    /// Stable lowercase tag, used for stats bucketing.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Command { .. } => "command",
            Self::UserInput { .. } => "user_input",
            Self::AgentOutput { .. } => "agent_output",
            Self::Control { .. } => "control",
            Self::Error { .. } => "error",
            Self::Stream { .. } => "stream",
        }
    }

    /// Priority assigned by [`Message::new`] unless overridden.
    pub const fn default_priority(&self) -> Priority {
        match self {
            Self::Control { .. } => Priority::Critical,
            Self::Error { .. } | Self::Command { .. } => Priority::High,
            Self::UserInput { .. } | Self::AgentOutput { .. } | Self::Stream { .. } => {
                Priority::Normal
            }
        }
    }
}

/// A queued unit of work.
///
/// Fields are private: a message is configured with the consuming `with_*`
/// methods before it is enqueued and is read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    id: MessageId,
    kind: MessageKind,
    priority: Priority,
    created_at_ms: u128,
    correlation_id: Option<MessageId>,
    parent_id: Option<MessageId>,
}

impl Message {
    /// Create a message stamped with a fresh id, the current time and the
    /// kind's default priority.
    pub fn new(kind: MessageKind) -> Self {
        Self {
            id: MessageId::new(),
            priority: kind.default_priority(),
            kind,
            created_at_ms: now_ms(),
            correlation_id: None,
            parent_id: None,
        }
    }

    /// Shorthand for a [`MessageKind::UserInput`] message.
    pub fn user_input(text: impl Into<String>) -> Self {
        Self::new(MessageKind::UserInput { text: text.into() })
    }

    /// Shorthand for a [`MessageKind::Command`] message.
    pub fn command(name: impl Into<String>, args: Vec<String>) -> Self {
        Self::new(MessageKind::Command {
            name: name.into(),
            args,
        })
    }

    /// Shorthand for a [`MessageKind::Control`] message.
    pub fn control(action: ControlAction) -> Self {
        Self::new(MessageKind::Control { action })
    }

    /// Build a response threaded to `request`.
    ///
    /// The correlation id is inherited from the request, or is the request id
    /// when the request starts a new thread.
    pub fn reply_to(request: &Self, kind: MessageKind) -> Self {
        Self::new(kind)
            .with_correlation_id(request.correlation_id.unwrap_or(request.id))
            .with_parent_id(request.id)
    }

    /// Override the priority.
    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Set the correlation id.
    #[must_use]
    pub fn with_correlation_id(mut self, id: MessageId) -> Self {
        self.correlation_id = Some(id);
        self
    }

    /// Set the parent id.
    #[must_use]
    pub fn with_parent_id(mut self, id: MessageId) -> Self {
        self.parent_id = Some(id);
        self
    }

    /// Override the creation timestamp (ms since epoch).
    #[must_use]
    pub fn with_created_at_ms(mut self, created_at_ms: u128) -> Self {
        self.created_at_ms = created_at_ms;
        self
    }

    /// Unique id.
    pub const fn id(&self) -> MessageId {
        self.id
    }

    /// Payload.
    pub const fn kind(&self) -> &MessageKind {
        &self.kind
    }

    /// Priority fixed at creation.
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    /// Creation timestamp in ms since epoch.
    pub const fn created_at_ms(&self) -> u128 {
        self.created_at_ms
    }

    /// Request/response thread id.
    pub const fn correlation_id(&self) -> Option<MessageId> {
        self.correlation_id
    }

    /// Id of the message this one responds to.
    pub const fn parent_id(&self) -> Option<MessageId> {
        self.parent_id
    }
}

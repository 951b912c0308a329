//! Domain event envelope produced by aggregate operations.

use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a recorded domain event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    /// Creates a new random event identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the inner UUID value.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The aggregate type that produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateType {
    /// A protocol session.
    Session,
    /// A conversation owned by a session.
    Conversation,
}

impl AggregateType {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Session => "session",
            Self::Conversation => "conversation",
        }
    }
}

/// What happened, with the minimal payload needed by subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// The session accepted an `initialize` handshake.
    SessionInitialized {
        /// Name reported by the client.
        client_name: String,
        /// Negotiated protocol version.
        protocol_version: String,
    },
    /// The session finished initialization.
    SessionReady,
    /// The session was closed.
    SessionClosed,
    /// A tool was added to (or replaced in) the session registry.
    ToolRegistered {
        /// Tool name.
        name: String,
    },
    /// A tool was removed from the session registry.
    ToolUnregistered {
        /// Tool name.
        name: String,
    },
    /// A resource was added to (or replaced in) the session registry.
    ResourceRegistered {
        /// Resource URI.
        uri: String,
    },
    /// A resource was removed from the session registry.
    ResourceUnregistered {
        /// Resource URI.
        uri: String,
    },
    /// A prompt was added to (or replaced in) the session registry.
    PromptRegistered {
        /// Prompt name.
        name: String,
    },
    /// A prompt was removed from the session registry.
    PromptUnregistered {
        /// Prompt name.
        name: String,
    },
    /// The client subscribed to resource updates.
    ResourceSubscribed {
        /// Resource URI.
        uri: String,
    },
    /// The client cancelled a resource subscription.
    ResourceUnsubscribed {
        /// Resource URI.
        uri: String,
    },
    /// The session created a conversation.
    ConversationCreated {
        /// Identifier of the new conversation.
        conversation_id: Uuid,
        /// Model requested for the conversation.
        model: String,
    },
    /// The client changed the session log level.
    LogLevelChanged {
        /// New level.
        level: String,
    },
    /// A message was appended to a conversation.
    MessageAdded {
        /// Message identifier.
        message_id: Uuid,
        /// Message role.
        role: String,
    },
    /// A conversation moved between lifecycle statuses.
    ConversationStatusChanged {
        /// Previous status.
        from: String,
        /// New status.
        to: String,
    },
    /// The conversation model was changed.
    ModelChanged {
        /// New model identifier.
        model: String,
    },
    /// The conversation system prompt was replaced.
    SystemPromptSet,
    /// A tool was attached to a conversation.
    ConversationToolAdded {
        /// Tool name.
        name: String,
    },
    /// A tool was detached from a conversation.
    ConversationToolRemoved {
        /// Tool name.
        name: String,
    },
}

impl EventKind {
    /// Returns the event type tag as used on the wire.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SessionInitialized { .. } => "session_initialized",
            Self::SessionReady => "session_ready",
            Self::SessionClosed => "session_closed",
            Self::ToolRegistered { .. } => "tool_registered",
            Self::ToolUnregistered { .. } => "tool_unregistered",
            Self::ResourceRegistered { .. } => "resource_registered",
            Self::ResourceUnregistered { .. } => "resource_unregistered",
            Self::PromptRegistered { .. } => "prompt_registered",
            Self::PromptUnregistered { .. } => "prompt_unregistered",
            Self::ResourceSubscribed { .. } => "resource_subscribed",
            Self::ResourceUnsubscribed { .. } => "resource_unsubscribed",
            Self::ConversationCreated { .. } => "conversation_created",
            Self::LogLevelChanged { .. } => "log_level_changed",
            Self::MessageAdded { .. } => "message_added",
            Self::ConversationStatusChanged { .. } => "conversation_status_changed",
            Self::ModelChanged { .. } => "model_changed",
            Self::SystemPromptSet => "system_prompt_set",
            Self::ConversationToolAdded { .. } => "conversation_tool_added",
            Self::ConversationToolRemoved { .. } => "conversation_tool_removed",
        }
    }
}

/// A domain event buffered on an aggregate until the caller drains it.
///
/// # Examples
///
/// ```
/// use parley::event::{AggregateType, DomainEvent, EventKind};
/// use mockable::DefaultClock;
/// use uuid::Uuid;
///
/// let event = DomainEvent::record(
///     AggregateType::Session,
///     Uuid::new_v4(),
///     EventKind::SessionReady,
///     &DefaultClock,
/// );
/// assert_eq!(event.kind().as_str(), "session_ready");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainEvent {
    id: EventId,
    aggregate_type: AggregateType,
    aggregate_id: Uuid,
    kind: EventKind,
    occurred_at: DateTime<Utc>,
}

impl DomainEvent {
    /// Records an event stamped with the clock's current time.
    #[must_use]
    pub fn record(
        aggregate_type: AggregateType,
        aggregate_id: Uuid,
        kind: EventKind,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id: EventId::new(),
            aggregate_type,
            aggregate_id,
            kind,
            occurred_at: clock.utc(),
        }
    }

    /// Returns the event identifier.
    #[must_use]
    pub const fn id(&self) -> EventId {
        self.id
    }

    /// Returns the producing aggregate type.
    #[must_use]
    pub const fn aggregate_type(&self) -> AggregateType {
        self.aggregate_type
    }

    /// Returns the producing aggregate identifier.
    #[must_use]
    pub const fn aggregate_id(&self) -> Uuid {
        self.aggregate_id
    }

    /// Returns what happened.
    #[must_use]
    pub const fn kind(&self) -> &EventKind {
        &self.kind
    }

    /// Returns when the event was recorded.
    #[must_use]
    pub const fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}

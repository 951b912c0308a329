//! Errors raised by session operations.

use super::SessionState;
use crate::conversation::domain::{ConversationError, ConversationId};
use crate::error::ErrorKind;
use thiserror::Error;

/// Errors returned by the session aggregate.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    /// An identifier is empty or not a UUID.
    #[error("invalid session identifier: '{0}'")]
    InvalidIdentifier(String),

    /// `initialize` was called on a session that is past `created`.
    #[error("session is already initialized (state: {state})")]
    AlreadyInitialized {
        /// Current state.
        state: SessionState,
    },

    /// The session is closed.
    #[error("session is closed")]
    SessionClosed,

    /// The operation needs a capability that was not negotiated.
    #[error("capability not supported: {capability}")]
    CapabilityNotSupported {
        /// Capability path, for example `resources.subscribe`.
        capability: &'static str,
    },

    /// The requested log level is unknown.
    #[error("invalid log level: '{0}'")]
    InvalidLogLevel(String),

    /// No tool with this name is registered.
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    /// No resource with this URI is registered.
    #[error("resource not found: {0}")]
    ResourceNotFound(String),

    /// No prompt with this name is registered.
    #[error("prompt not found: {0}")]
    PromptNotFound(String),

    /// No conversation with this identifier is owned by the session.
    #[error("conversation not found: {0}")]
    ConversationNotFound(ConversationId),

    /// A conversation operation failed.
    #[error(transparent)]
    Conversation(#[from] ConversationError),
}

impl SessionError {
    /// Returns the coarse error category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidIdentifier(_) | Self::InvalidLogLevel(_) => ErrorKind::Validation,
            Self::AlreadyInitialized { .. } | Self::SessionClosed => ErrorKind::Conflict,
            Self::CapabilityNotSupported { .. } => ErrorKind::Capability,
            Self::ToolNotFound(_)
            | Self::ResourceNotFound(_)
            | Self::PromptNotFound(_)
            | Self::ConversationNotFound(_) => ErrorKind::NotFound,
            Self::Conversation(inner) => inner.kind(),
        }
    }
}

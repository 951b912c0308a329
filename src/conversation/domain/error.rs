//! Errors raised by conversation operations.

use super::{ConversationStatus, Role};
use crate::error::ErrorKind;
use thiserror::Error;

/// Errors returned by the conversation aggregate and its value objects.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConversationError {
    /// An identifier is empty or not a UUID.
    #[error("invalid identifier: '{0}'")]
    InvalidIdentifier(String),

    /// A message was created without content blocks.
    #[error("message content must not be empty")]
    EmptyContent,

    /// The model identifier is empty after trimming.
    #[error("model must not be empty")]
    EmptyModel,

    /// The conversation no longer accepts changes.
    #[error("conversation is {status}")]
    ConversationClosed {
        /// Current status.
        status: ConversationStatus,
    },

    /// A user message exists, so the system prompt is frozen.
    #[error("system prompt cannot change after a user message was added")]
    SystemPromptImmutable,

    /// The message history is full.
    #[error("conversation reached the limit of {limit} messages")]
    MessageLimitReached {
        /// Maximum number of messages.
        limit: usize,
    },

    /// Two consecutive messages would share a role other than assistant.
    #[error("consecutive {role} messages are not allowed")]
    ConsecutiveRole {
        /// Repeated role.
        role: Role,
    },

    /// The requested status transition is not allowed.
    #[error("cannot move conversation from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: ConversationStatus,
        /// Requested status.
        to: ConversationStatus,
    },
}

impl ConversationError {
    /// Returns the coarse error category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidIdentifier(_) | Self::EmptyContent | Self::EmptyModel => {
                ErrorKind::Validation
            }
            Self::ConversationClosed { .. }
            | Self::SystemPromptImmutable
            | Self::MessageLimitReached { .. }
            | Self::ConsecutiveRole { .. }
            | Self::InvalidTransition { .. } => ErrorKind::Conflict,
        }
    }
}

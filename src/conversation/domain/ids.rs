//! Identifier newtypes for conversations and their messages.

use super::ConversationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a conversation.
///
/// # Examples
///
/// ```
/// use parley::conversation::domain::ConversationId;
///
/// let id = ConversationId::new();
/// assert_eq!(ConversationId::parse(&id.to_string()).ok(), Some(id));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(Uuid);

impl ConversationId {
    /// Creates a new random conversation identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a conversation identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parses a textual UUID.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationError::InvalidIdentifier`] for empty or
    /// malformed input.
    pub fn parse(value: &str) -> Result<Self, ConversationError> {
        parse_uuid(value).map(Self)
    }

    /// Returns the inner UUID value.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl AsRef<Uuid> for ConversationId {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a message within a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(Uuid);

impl MessageId {
    /// Creates a new random message identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a message identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parses a textual UUID.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationError::InvalidIdentifier`] for empty or
    /// malformed input.
    pub fn parse(value: &str) -> Result<Self, ConversationError> {
        parse_uuid(value).map(Self)
    }

    /// Returns the inner UUID value.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl AsRef<Uuid> for MessageId {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn parse_uuid(value: &str) -> Result<Uuid, ConversationError> {
    Uuid::parse_str(value.trim())
        .map_err(|_| ConversationError::InvalidIdentifier(value.to_owned()))
}

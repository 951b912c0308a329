//! Conversation lifecycle status.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a conversation.
///
/// Transitions: `active ⇄ paused`, `active | paused → closed`,
/// `closed → archived`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStatus {
    /// Accepting messages and parameter changes.
    Active,
    /// Temporarily suspended; messages may still be appended.
    Paused,
    /// Terminal for new content.
    Closed,
    /// Closed and retired.
    Archived,
}

impl ConversationStatus {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Closed => "closed",
            Self::Archived => "archived",
        }
    }

    /// Returns `true` for `closed` and `archived`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Archived)
    }
}

impl fmt::Display for ConversationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//! Session identifier.

use super::SessionError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a protocol session.
///
/// # Examples
///
/// ```
/// use parley::session::domain::SessionId;
///
/// let id = SessionId::new();
/// assert!(!id.as_ref().is_nil());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Creates a new random session identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a session identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parses a textual UUID.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidIdentifier`] for empty or malformed
    /// input.
    pub fn parse(value: &str) -> Result<Self, SessionError> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|_| SessionError::InvalidIdentifier(value.to_owned()))
    }

    /// Returns the inner UUID value.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl AsRef<Uuid> for SessionId {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

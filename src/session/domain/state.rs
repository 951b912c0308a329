//! Session lifecycle state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a session.
///
/// Transitions are strictly forward:
/// `created → initializing → ready → closed`; `closed` is reachable from any
/// state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Awaiting the `initialize` handshake.
    Created,
    /// Handshake accepted; waiting for the client's `initialized`.
    Initializing,
    /// Serving requests.
    Ready,
    /// Terminal.
    Closed,
}

impl SessionState {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Initializing => "initializing",
            Self::Ready => "ready",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

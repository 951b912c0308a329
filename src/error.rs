//! Cross-cutting error classification shared by every bounded context.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse category of a domain failure.
///
/// Aggregates return their own typed errors; this classification lets
/// callers decide between "not found" and "conflict" style responses without
/// matching on every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Input failed value-object validation; nothing was mutated.
    Validation,
    /// The operation is not allowed in the aggregate's current state.
    Conflict,
    /// The addressed entity does not exist.
    NotFound,
    /// The operation requires a capability that was not negotiated.
    Capability,
}

impl ErrorKind {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Conflict => "conflict",
            Self::NotFound => "not_found",
            Self::Capability => "capability",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

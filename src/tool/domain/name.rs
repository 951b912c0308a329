//! Validated tool name.

use super::ToolDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length for tool and prompt names.
pub(crate) const MAX_NAME_LENGTH: usize = 64;

/// Returns `true` when `value` matches `[A-Za-z][A-Za-z0-9_-]{0,63}`.
pub(crate) fn matches_name_pattern(value: &str) -> bool {
    let mut characters = value.chars();
    let Some(first) = characters.next() else {
        return false;
    };

    value.len() <= MAX_NAME_LENGTH
        && first.is_ascii_alphabetic()
        && characters.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Validated tool name.
///
/// Names are case-sensitive and must match `[A-Za-z][A-Za-z0-9_-]{0,63}`.
///
/// # Examples
///
/// ```
/// use parley::tool::domain::ToolName;
///
/// let name = ToolName::new("read_file").expect("valid name");
/// assert_eq!(name.as_str(), "read_file");
/// assert!(ToolName::new("1st").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ToolName(String);

impl ToolName {
    /// Creates a validated tool name.
    ///
    /// Surrounding whitespace is trimmed before validation.
    ///
    /// # Errors
    ///
    /// Returns [`ToolDomainError::EmptyToolName`] when the value is empty
    /// after trimming or [`ToolDomainError::InvalidToolName`] when it does
    /// not match the name pattern.
    pub fn new(value: impl Into<String>) -> Result<Self, ToolDomainError> {
        let raw = value.into();
        let normalized = raw.trim();

        if normalized.is_empty() {
            return Err(ToolDomainError::EmptyToolName);
        }

        if !matches_name_pattern(normalized) {
            return Err(ToolDomainError::InvalidToolName(raw));
        }

        Ok(Self(normalized.to_owned()))
    }

    /// Returns the tool name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ToolName {
    type Error = ToolDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ToolName> for String {
    fn from(value: ToolName) -> Self {
        value.0
    }
}

impl AsRef<str> for ToolName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

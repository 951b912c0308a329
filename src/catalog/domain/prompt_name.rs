//! Validated prompt name.

use super::CatalogError;
use crate::tool::domain::matches_name_pattern;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Validated prompt name sharing the tool name pattern
/// `[A-Za-z][A-Za-z0-9_-]{0,63}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PromptName(String);

impl PromptName {
    /// Creates a validated prompt name, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::EmptyPromptName`] or
    /// [`CatalogError::InvalidPromptName`].
    pub fn new(value: impl Into<String>) -> Result<Self, CatalogError> {
        let raw = value.into();
        let normalized = raw.trim();

        if normalized.is_empty() {
            return Err(CatalogError::EmptyPromptName);
        }

        if !matches_name_pattern(normalized) {
            return Err(CatalogError::InvalidPromptName(raw));
        }

        Ok(Self(normalized.to_owned()))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PromptName {
    type Error = CatalogError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PromptName> for String {
    fn from(value: PromptName) -> Self {
        value.0
    }
}

impl fmt::Display for PromptName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("code_review", true)]
    #[case("summarise-2", true)]
    #[case("2fast", false)]
    #[case("with space", false)]
    fn validates_pattern(#[case] input: &str, #[case] valid: bool) {
        assert_eq!(PromptName::new(input).is_ok(), valid);
    }

    #[test]
    fn blank_name_is_empty_error() {
        assert_eq!(PromptName::new(""), Err(CatalogError::EmptyPromptName));
    }
}

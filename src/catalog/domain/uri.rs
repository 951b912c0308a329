//! URI-shaped resource identifier.

use super::CatalogError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Resource identifier of the form `<scheme>:<rest>`.
///
/// The scheme must match `[A-Za-z][A-Za-z0-9+.-]*`; the remainder must be
/// non-empty and free of whitespace. No further normalization is applied, so
/// equality is byte-wise.
///
/// # Examples
///
/// ```
/// use parley::catalog::domain::ResourceUri;
///
/// let uri = ResourceUri::new("file:///etc/hosts").expect("valid URI");
/// assert_eq!(uri.scheme(), "file");
/// assert!(ResourceUri::new("no-scheme").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceUri(String);

impl ResourceUri {
    /// Creates a validated resource URI.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidResourceUri`] for malformed input.
    pub fn new(value: impl Into<String>) -> Result<Self, CatalogError> {
        let raw = value.into();
        let normalized = raw.trim();

        let Some((scheme, rest)) = normalized.split_once(':') else {
            return Err(CatalogError::InvalidResourceUri(raw));
        };

        if !is_valid_scheme(scheme) || rest.is_empty() || rest.chars().any(char::is_whitespace) {
            return Err(CatalogError::InvalidResourceUri(raw));
        }

        Ok(Self(normalized.to_owned()))
    }

    /// Returns the URI as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the scheme without the trailing colon.
    #[must_use]
    pub fn scheme(&self) -> &str {
        self.0.split_once(':').map_or("", |(scheme, _)| scheme)
    }
}

fn is_valid_scheme(scheme: &str) -> bool {
    let mut characters = scheme.chars();
    characters
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic())
        && characters.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-'))
}

impl TryFrom<String> for ResourceUri {
    type Error = CatalogError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ResourceUri> for String {
    fn from(value: ResourceUri) -> Self {
        value.0
    }
}

impl AsRef<str> for ResourceUri {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ResourceUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

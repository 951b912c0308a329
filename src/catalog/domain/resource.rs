//! Resource entity and its read capability.

use super::{CatalogError, ProviderError, ResourceReadError, ResourceUri};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Produces the contents of a resource on demand.
#[async_trait]
pub trait ResourceReader: Send + Sync {
    /// Reads the resource identified by `uri`.
    ///
    /// # Errors
    ///
    /// Returns a [`ProviderError`] when the contents cannot be produced.
    async fn read(&self, uri: &ResourceUri) -> Result<Vec<ResourceContents>, ProviderError>;
}

/// One content entry returned by `resources/read`.
///
/// Exactly one of `text` or `blob` (base64) is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceContents {
    /// URI the contents belong to.
    pub uri: String,
    /// MIME type of the contents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Textual contents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Base64-encoded binary contents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob: Option<String>,
}

impl ResourceContents {
    /// Creates textual contents.
    #[must_use]
    pub fn text(uri: &ResourceUri, mime_type: Option<String>, text: impl Into<String>) -> Self {
        Self {
            uri: uri.as_str().to_owned(),
            mime_type,
            text: Some(text.into()),
            blob: None,
        }
    }

    /// Creates base64 blob contents.
    #[must_use]
    pub fn blob(uri: &ResourceUri, mime_type: Option<String>, blob: impl Into<String>) -> Self {
        Self {
            uri: uri.as_str().to_owned(),
            mime_type,
            text: None,
            blob: Some(blob.into()),
        }
    }
}

#[derive(Debug, Clone)]
enum StaticBody {
    Text(String),
    Blob(String),
}

/// Reader returning fixed contents.
#[derive(Debug, Clone)]
pub struct StaticResource {
    body: StaticBody,
    mime_type: Option<String>,
}

impl StaticResource {
    /// Serves `text` as `text/plain` unless overridden.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            body: StaticBody::Text(text.into()),
            mime_type: Some("text/plain".to_owned()),
        }
    }

    /// Serves base64 `blob` with the given MIME type.
    #[must_use]
    pub fn blob(blob: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            body: StaticBody::Blob(blob.into()),
            mime_type: Some(mime_type.into()),
        }
    }

    /// Overrides the MIME type.
    #[must_use]
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}

#[async_trait]
impl ResourceReader for StaticResource {
    async fn read(&self, uri: &ResourceUri) -> Result<Vec<ResourceContents>, ProviderError> {
        let contents = match &self.body {
            StaticBody::Text(text) => ResourceContents::text(uri, self.mime_type.clone(), text),
            StaticBody::Blob(blob) => ResourceContents::blob(uri, self.mime_type.clone(), blob),
        };
        Ok(vec![contents])
    }
}

/// Wire shape of a resource as listed to protocol clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDescriptor {
    /// Resource URI.
    pub uri: String,
    /// Display name.
    pub name: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Optional MIME type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// A URI-addressed document.
#[derive(Clone)]
pub struct Resource {
    uri: ResourceUri,
    name: String,
    description: Option<String>,
    mime_type: Option<String>,
    reader: Option<Arc<dyn ResourceReader>>,
}

impl Resource {
    /// Creates a resource without a reader.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::EmptyResourceName`] for a blank name.
    pub fn new(uri: ResourceUri, name: impl Into<String>) -> Result<Self, CatalogError> {
        let normalized_name = name.into().trim().to_owned();
        if normalized_name.is_empty() {
            return Err(CatalogError::EmptyResourceName);
        }

        Ok(Self {
            uri,
            name: normalized_name,
            description: None,
            mime_type: None,
            reader: None,
        })
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the advertised MIME type.
    #[must_use]
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Attaches the reader used by [`Resource::read`].
    #[must_use]
    pub fn with_reader(mut self, reader: Arc<dyn ResourceReader>) -> Self {
        self.reader = Some(reader);
        self
    }

    /// Returns the URI.
    #[must_use]
    pub const fn uri(&self) -> &ResourceUri {
        &self.uri
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the MIME type.
    #[must_use]
    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    /// Returns the wire descriptor used by `resources/list`.
    #[must_use]
    pub fn descriptor(&self) -> ResourceDescriptor {
        ResourceDescriptor {
            uri: self.uri.as_str().to_owned(),
            name: self.name.clone(),
            description: self.description.clone(),
            mime_type: self.mime_type.clone(),
        }
    }

    /// Reads the resource contents.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceReadError::NoReader`] when no reader is attached or
    /// [`ResourceReadError::Failed`] when the reader fails.
    pub async fn read(&self) -> Result<Vec<ResourceContents>, ResourceReadError> {
        let Some(reader) = &self.reader else {
            return Err(ResourceReadError::NoReader {
                uri: self.uri.as_str().to_owned(),
            });
        };

        reader
            .read(&self.uri)
            .await
            .map_err(|cause| ResourceReadError::Failed {
                uri: self.uri.as_str().to_owned(),
                cause: Arc::from(cause),
            })
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("uri", &self.uri)
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("has_reader", &self.reader.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn uri() -> ResourceUri {
        ResourceUri::new("config://app/settings").expect("valid URI")
    }

    #[tokio::test]
    async fn static_text_resource_reads_contents() {
        let resource = Resource::new(uri(), "Settings")
            .expect("valid resource")
            .with_reader(Arc::new(
                StaticResource::text("{}").with_mime_type("application/json"),
            ));

        let contents = resource.read().await.expect("readable");

        assert_eq!(
            serde_json::to_value(&contents).expect("serialisable"),
            json!([{"uri": "config://app/settings", "mimeType": "application/json", "text": "{}"}])
        );
    }

    #[tokio::test]
    async fn missing_reader_is_a_read_error() {
        let resource = Resource::new(uri(), "Settings").expect("valid resource");
        assert!(matches!(
            resource.read().await,
            Err(ResourceReadError::NoReader { .. })
        ));
    }

    #[test]
    fn blank_name_is_rejected() {
        assert_eq!(
            Resource::new(uri(), "  ").map(|r| r.name().to_owned()),
            Err(CatalogError::EmptyResourceName)
        );
    }

    #[test]
    fn descriptor_omits_absent_fields() {
        let resource = Resource::new(uri(), "Settings").expect("valid resource");
        assert_eq!(
            serde_json::to_value(resource.descriptor()).expect("serialisable"),
            json!({"uri": "config://app/settings", "name": "Settings"})
        );
    }
}

//! Tool invocation results as returned to protocol clients.

use serde::{Deserialize, Serialize};

/// Text returned when a tool has no executor attached.
pub const HANDLER_NOT_CONFIGURED: &str = "Tool handler not configured";

/// A single content item in a tool result.
///
/// Serialised with a `type` tag:
///
/// ```json
/// { "type": "text", "text": "hi" }
/// { "type": "image", "data": "iVBORw0...", "mimeType": "image/png" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolContent {
    /// Plain text output.
    Text {
        /// The text.
        text: String,
    },
    /// Base64-encoded image output.
    Image {
        /// Base64 image data.
        data: String,
        /// Image MIME type.
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
}

impl ToolContent {
    /// Creates a text content item.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Returns the text when this is a text item.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            Self::Image { .. } => None,
        }
    }
}

/// Outcome of a tool invocation.
///
/// # Examples
///
/// ```
/// use parley::tool::domain::ToolResult;
///
/// let result = ToolResult::text("done");
/// assert!(!result.is_error());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    content: Vec<ToolContent>,
    #[serde(default)]
    is_error: bool,
}

impl ToolResult {
    /// Creates a successful result from content items.
    #[must_use]
    pub const fn success(content: Vec<ToolContent>) -> Self {
        Self {
            content,
            is_error: false,
        }
    }

    /// Creates a successful single-text result.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::success(vec![ToolContent::text(text)])
    }

    /// Creates an error-flagged single-text result.
    #[must_use]
    pub fn error_text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::text(text)],
            is_error: true,
        }
    }

    /// Returns the result content.
    #[must_use]
    pub fn content(&self) -> &[ToolContent] {
        &self.content
    }

    /// Returns `true` when the result reports a failure.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.is_error
    }

    /// Concatenates every text item, separated by newlines.
    #[must_use]
    pub fn joined_text(&self) -> String {
        self.content
            .iter()
            .filter_map(ToolContent::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

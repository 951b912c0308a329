//! Content blocks carried by conversation messages.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A typed unit of message content.
///
/// Serialised with a `type` tag in the shape the model API expects:
///
/// ```json
/// { "type": "text", "text": "Hello" }
/// { "type": "tool_use", "id": "toolu_1", "name": "echo", "input": {"message": "hi"} }
/// { "type": "tool_result", "tool_use_id": "toolu_1", "content": "hi" }
/// { "type": "image", "source": { "type": "base64", "media_type": "image/png", "data": "..." } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain text.
    Text {
        /// The text.
        text: String,
    },
    /// A tool invocation requested by the assistant.
    ToolUse {
        /// Correlation identifier echoed by the matching result.
        id: String,
        /// Requested tool name.
        name: String,
        /// Tool arguments.
        input: Value,
    },
    /// The outcome of a tool invocation.
    ToolResult {
        /// Identifier of the `tool_use` block being answered.
        tool_use_id: String,
        /// Result payload.
        content: Value,
        /// Whether the tool reported a failure.
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        is_error: bool,
    },
    /// An image.
    Image {
        /// Image source.
        source: ImageSource,
    },
}

impl ContentBlock {
    /// Creates a text block.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Creates a tool-result block.
    #[must_use]
    pub fn tool_result(tool_use_id: impl Into<String>, content: Value, is_error: bool) -> Self {
        Self::ToolResult {
            tool_use_id: tool_use_id.into(),
            content,
            is_error,
        }
    }

    /// Returns the text of a text block.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            Self::ToolUse { .. } | Self::ToolResult { .. } | Self::Image { .. } => None,
        }
    }
}

/// Source of an image block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSource {
    /// Encoding of `data`, typically `base64`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Image MIME type.
    pub media_type: String,
    /// Encoded image data.
    pub data: String,
}

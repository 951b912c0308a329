//! Model request and response shapes derived from a conversation.

use super::{ContentBlock, Role};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A message projected into the shape a model request expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiMessage {
    /// Author role.
    pub role: Role,
    /// Content blocks.
    pub content: Vec<ContentBlock>,
}

/// Tool definition offered to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelTool {
    /// Tool name.
    pub name: String,
    /// Tool description.
    pub description: String,
    /// JSON schema of accepted arguments.
    pub input_schema: Value,
}

/// A complete model request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRequest {
    /// Model identifier.
    pub model: String,
    /// System prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// Conversation history.
    pub messages: Vec<ApiMessage>,
    /// Upper bound on generated tokens.
    pub max_tokens: i64,
    /// Sampling temperature.
    pub temperature: f64,
    /// Nucleus sampling threshold.
    pub top_p: f64,
    /// Top-k sampling; omitted when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<i64>,
    /// Stop sequences.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop_sequences: Vec<String>,
    /// Tools offered to the model.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ModelTool>,
}

/// Why the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The model finished its turn.
    EndTurn,
    /// `max_tokens` was reached.
    MaxTokens,
    /// A stop sequence was generated.
    StopSequence,
    /// The model is waiting for tool results.
    ToolUse,
}

/// Token accounting for one model call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens consumed by the request.
    pub input_tokens: u64,
    /// Tokens generated in the response.
    pub output_tokens: u64,
}

/// A complete model response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResponse {
    /// Response identifier assigned by the backend.
    pub id: String,
    /// Model that produced the response.
    pub model: String,
    /// Generated content.
    pub content: Vec<ContentBlock>,
    /// Stop reason, when reported.
    #[serde(default)]
    pub stop_reason: Option<StopReason>,
    /// Token usage.
    #[serde(default)]
    pub usage: Usage,
}

/// Incremental event of a streamed model response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// The response started.
    MessageStart {
        /// Response identifier.
        id: String,
        /// Model producing the response.
        model: String,
    },
    /// A chunk of text for the content block at `index`.
    ContentDelta {
        /// Content block index.
        index: usize,
        /// Text fragment.
        text: String,
    },
    /// The response finished.
    MessageStop {
        /// Stop reason, when reported.
        stop_reason: Option<StopReason>,
        /// Final token usage.
        usage: Usage,
    },
}

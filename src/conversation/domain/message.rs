//! Immutable conversation message.

use super::{ContentBlock, ConversationError, MessageId, Role};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// A unit of conversation content authored by one role.
///
/// Messages cannot be modified once created; a conversation only ever
/// appends them.
///
/// # Examples
///
/// ```
/// use parley::conversation::domain::{ContentBlock, Message, Role};
/// use mockable::DefaultClock;
///
/// let message = Message::new(Role::User, vec![ContentBlock::text("Hi")], &DefaultClock)
///     .expect("non-empty content");
/// assert_eq!(message.role(), Role::User);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    id: MessageId,
    role: Role,
    content: Vec<ContentBlock>,
    created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    metadata: HashMap<String, Value>,
}

impl Message {
    /// Creates a message stamped with the clock's current time.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationError::EmptyContent`] when `content` is empty.
    pub fn new(
        role: Role,
        content: Vec<ContentBlock>,
        clock: &impl Clock,
    ) -> Result<Self, ConversationError> {
        if content.is_empty() {
            return Err(ConversationError::EmptyContent);
        }

        Ok(Self {
            id: MessageId::new(),
            role,
            content,
            created_at: clock.utc(),
            metadata: HashMap::new(),
        })
    }

    /// Creates a single-text message.
    #[must_use]
    pub fn text(role: Role, text: impl Into<String>, clock: &impl Clock) -> Self {
        Self {
            id: MessageId::new(),
            role,
            content: vec![ContentBlock::text(text)],
            created_at: clock.utc(),
            metadata: HashMap::new(),
        }
    }

    /// Adds a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Returns the identifier.
    #[must_use]
    pub const fn id(&self) -> MessageId {
        self.id
    }

    /// Returns the author role.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Returns the content blocks.
    #[must_use]
    pub fn content(&self) -> &[ContentBlock] {
        &self.content
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the metadata map.
    #[must_use]
    pub const fn metadata(&self) -> &HashMap<String, Value> {
        &self.metadata
    }

    /// Returns the `tool_use` blocks as `(id, name, input)` triples.
    pub fn tool_uses(&self) -> impl Iterator<Item = (&str, &str, &Value)> {
        self.content.iter().filter_map(|block| match block {
            ContentBlock::ToolUse { id, name, input } => Some((id.as_str(), name.as_str(), input)),
            ContentBlock::Text { .. }
            | ContentBlock::ToolResult { .. }
            | ContentBlock::Image { .. } => None,
        })
    }

    /// Concatenates every text block, separated by newlines.
    #[must_use]
    pub fn joined_text(&self) -> String {
        self.content
            .iter()
            .filter_map(ContentBlock::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockable::DefaultClock;
    use serde_json::json;

    #[test]
    fn empty_content_is_rejected() {
        assert_eq!(
            Message::new(Role::User, Vec::new(), &DefaultClock),
            Err(ConversationError::EmptyContent)
        );
    }

    #[test]
    fn tool_uses_extracts_requests() {
        let message = Message::new(
            Role::Assistant,
            vec![
                ContentBlock::text("Let me check."),
                ContentBlock::ToolUse {
                    id: "toolu_1".to_owned(),
                    name: "echo".to_owned(),
                    input: json!({"message": "hi"}),
                },
            ],
            &DefaultClock,
        )
        .expect("non-empty content");

        let uses: Vec<_> = message.tool_uses().collect();
        assert_eq!(uses, vec![("toolu_1", "echo", &json!({"message": "hi"}))]);
        assert_eq!(message.joined_text(), "Let me check.");
    }
}

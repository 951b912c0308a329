//! Domain model for conversations.
//!
//! A [`Conversation`] is an aggregate owned by a session. It keeps an
//! append-only message history, sampling parameters that are clamped on
//! mutation, attached tools, and a small status state machine. Operations
//! buffer [`crate::event::DomainEvent`]s for the caller to drain.

mod content;
mod conversation;
mod error;
mod ids;
mod message;
mod parameters;
mod request;
mod role;
mod status;

pub use content::{ContentBlock, ImageSource};
pub use conversation::{Conversation, MAX_MESSAGES};
pub use error::ConversationError;
pub use ids::{ConversationId, MessageId};
pub use message::Message;
pub use parameters::{
    DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, DEFAULT_TOP_K, DEFAULT_TOP_P, GenerationParameters,
    clamp_temperature, clamp_top_k, clamp_top_p,
};
pub use request::{
    ApiMessage, ModelRequest, ModelResponse, ModelTool, StopReason, StreamEvent, Usage,
};
pub use role::{ParseRoleError, Role};
pub use status::ConversationStatus;

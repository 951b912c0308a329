//! Conversation aggregate.

use super::{
    ApiMessage, ContentBlock, ConversationError, ConversationId, ConversationStatus,
    GenerationParameters, Message, MessageId, ModelRequest, ModelTool, Role, clamp_temperature,
    clamp_top_k, clamp_top_p,
};
use crate::event::{AggregateType, DomainEvent, EventKind};
use crate::lock::{read, write};
use crate::session::domain::SessionId;
use crate::tool::domain::{Tool, ToolName};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;

/// Maximum number of messages a conversation may hold.
pub const MAX_MESSAGES: usize = 10_000;

#[derive(Debug)]
struct ConversationState {
    model: String,
    system_prompt: Option<String>,
    messages: Vec<Message>,
    status: ConversationStatus,
    parameters: GenerationParameters,
    tools: Vec<Tool>,
    metadata: HashMap<String, Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    closed_at: Option<DateTime<Utc>>,
    events: Vec<DomainEvent>,
}

/// A multi-turn exchange with a language model.
///
/// The conversation owns its ordered message history, generation
/// parameters, attached tools, and status. All state sits behind one
/// reader/writer lock; every operation holds it only for the duration of
/// the field update and event append.
///
/// Message appends enforce, in order: the conversation is not closed, the
/// history is below [`MAX_MESSAGES`], and the new message does not repeat
/// the previous role unless both are `assistant`.
///
/// # Examples
///
/// ```
/// use parley::conversation::domain::{ContentBlock, Conversation};
/// use parley::session::domain::SessionId;
/// use mockable::DefaultClock;
///
/// let clock = DefaultClock;
/// let conversation =
///     Conversation::new(SessionId::new(), "claude-sonnet", &clock).expect("valid model");
/// conversation
///     .add_user_message(vec![ContentBlock::text("Hello")], &clock)
///     .expect("first message");
/// assert_eq!(conversation.message_count(), 1);
/// ```
#[derive(Debug)]
pub struct Conversation {
    id: ConversationId,
    session_id: SessionId,
    state: RwLock<ConversationState>,
}

impl Conversation {
    /// Creates an active conversation with default parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationError::EmptyModel`] for a blank model.
    pub fn new(
        session_id: SessionId,
        model: impl Into<String>,
        clock: &impl Clock,
    ) -> Result<Self, ConversationError> {
        let normalized_model = normalize_model(&model.into())?;
        let timestamp = clock.utc();
        Ok(Self {
            id: ConversationId::new(),
            session_id,
            state: RwLock::new(ConversationState {
                model: normalized_model,
                system_prompt: None,
                messages: Vec::new(),
                status: ConversationStatus::Active,
                parameters: GenerationParameters::default(),
                tools: Vec::new(),
                metadata: HashMap::new(),
                created_at: timestamp,
                updated_at: timestamp,
                closed_at: None,
                events: Vec::new(),
            }),
        })
    }

    /// Returns the conversation identifier.
    #[must_use]
    pub const fn id(&self) -> ConversationId {
        self.id
    }

    /// Returns the owning session's identifier.
    #[must_use]
    pub const fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Returns the model identifier.
    #[must_use]
    pub fn model(&self) -> String {
        read(&self.state).model.clone()
    }

    /// Returns the system prompt.
    #[must_use]
    pub fn system_prompt(&self) -> Option<String> {
        read(&self.state).system_prompt.clone()
    }

    /// Returns a snapshot of the message history.
    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        read(&self.state).messages.clone()
    }

    /// Returns the most recent message.
    #[must_use]
    pub fn last_message(&self) -> Option<Message> {
        read(&self.state).messages.last().cloned()
    }

    /// Returns the number of messages.
    #[must_use]
    pub fn message_count(&self) -> usize {
        read(&self.state).messages.len()
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub fn status(&self) -> ConversationStatus {
        read(&self.state).status
    }

    /// Returns the generation parameters.
    #[must_use]
    pub fn parameters(&self) -> GenerationParameters {
        read(&self.state).parameters.clone()
    }

    /// Returns the attached tools.
    #[must_use]
    pub fn tools(&self) -> Vec<Tool> {
        read(&self.state).tools.clone()
    }

    /// Returns the attached tool named `name`.
    #[must_use]
    pub fn get_tool(&self, name: &str) -> Option<Tool> {
        read(&self.state)
            .tools
            .iter()
            .find(|tool| tool.name().as_str() == name)
            .cloned()
    }

    /// Returns a metadata value.
    #[must_use]
    pub fn metadata(&self, key: &str) -> Option<Value> {
        read(&self.state).metadata.get(key).cloned()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        read(&self.state).created_at
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        read(&self.state).updated_at
    }

    /// Returns when the conversation was closed.
    #[must_use]
    pub fn closed_at(&self) -> Option<DateTime<Utc>> {
        read(&self.state).closed_at
    }

    /// Changes the model.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationError::EmptyModel`] for a blank model or
    /// [`ConversationError::ConversationClosed`] once closed.
    pub fn set_model(
        &self,
        model: impl Into<String>,
        clock: &impl Clock,
    ) -> Result<(), ConversationError> {
        let normalized_model = normalize_model(&model.into())?;
        let mut state = write(&self.state);
        ensure_open(&state)?;
        state.model.clone_from(&normalized_model);
        self.record(
            &mut state,
            EventKind::ModelChanged {
                model: normalized_model,
            },
            clock,
        );
        Ok(())
    }

    /// Sets the system prompt.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationError::SystemPromptImmutable`] once any user
    /// message exists or [`ConversationError::ConversationClosed`] once
    /// closed.
    pub fn set_system_prompt(
        &self,
        prompt: impl Into<String>,
        clock: &impl Clock,
    ) -> Result<(), ConversationError> {
        let mut state = write(&self.state);
        ensure_open(&state)?;
        if state.messages.iter().any(|message| message.role() == Role::User) {
            return Err(ConversationError::SystemPromptImmutable);
        }
        state.system_prompt = Some(prompt.into());
        self.record(&mut state, EventKind::SystemPromptSet, clock);
        Ok(())
    }

    /// Appends a message.
    ///
    /// A failed append leaves the history unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationError::ConversationClosed`],
    /// [`ConversationError::MessageLimitReached`], or
    /// [`ConversationError::ConsecutiveRole`], checked in that order.
    pub fn add_message(
        &self,
        message: Message,
        clock: &impl Clock,
    ) -> Result<MessageId, ConversationError> {
        let mut state = write(&self.state);
        ensure_open(&state)?;

        if state.messages.len() >= MAX_MESSAGES {
            return Err(ConversationError::MessageLimitReached {
                limit: MAX_MESSAGES,
            });
        }

        if let Some(previous) = state.messages.last()
            && previous.role() == message.role()
            && message.role() != Role::Assistant
        {
            return Err(ConversationError::ConsecutiveRole {
                role: message.role(),
            });
        }

        let message_id = message.id();
        let role = message.role();
        state.messages.push(message);
        self.record(
            &mut state,
            EventKind::MessageAdded {
                message_id: message_id.into_inner(),
                role: role.as_str().to_owned(),
            },
            clock,
        );
        Ok(message_id)
    }

    /// Appends a user message built from `content`.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationError::EmptyContent`] or any error from
    /// [`Conversation::add_message`].
    pub fn add_user_message(
        &self,
        content: Vec<ContentBlock>,
        clock: &impl Clock,
    ) -> Result<MessageId, ConversationError> {
        self.add_message(Message::new(Role::User, content, clock)?, clock)
    }

    /// Appends an assistant message built from `content`.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationError::EmptyContent`] or any error from
    /// [`Conversation::add_message`].
    pub fn add_assistant_message(
        &self,
        content: Vec<ContentBlock>,
        clock: &impl Clock,
    ) -> Result<MessageId, ConversationError> {
        self.add_message(Message::new(Role::Assistant, content, clock)?, clock)
    }

    /// Suspends an active conversation.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationError::InvalidTransition`] unless active.
    pub fn pause(&self, clock: &impl Clock) -> Result<(), ConversationError> {
        self.transition(ConversationStatus::Active, ConversationStatus::Paused, clock)
    }

    /// Reactivates a paused conversation.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationError::InvalidTransition`] unless paused.
    pub fn resume(&self, clock: &impl Clock) -> Result<(), ConversationError> {
        self.transition(ConversationStatus::Paused, ConversationStatus::Active, clock)
    }

    /// Closes the conversation and returns the closing timestamp.
    ///
    /// Closing is idempotent: a closed or archived conversation keeps its
    /// original `closed_at`, which is returned again.
    pub fn close(&self, clock: &impl Clock) -> DateTime<Utc> {
        let mut state = write(&self.state);
        if let Some(closed_at) = state.closed_at {
            return closed_at;
        }

        let timestamp = clock.utc();
        let from = state.status;
        state.status = ConversationStatus::Closed;
        state.closed_at = Some(timestamp);
        self.record(&mut state, status_changed(from, ConversationStatus::Closed), clock);
        timestamp
    }

    /// Archives a closed conversation.
    ///
    /// Returns `false`, without changing anything, unless the conversation
    /// is closed.
    pub fn archive(&self, clock: &impl Clock) -> bool {
        let mut state = write(&self.state);
        if state.status != ConversationStatus::Closed {
            return false;
        }
        state.status = ConversationStatus::Archived;
        self.record(
            &mut state,
            status_changed(ConversationStatus::Closed, ConversationStatus::Archived),
            clock,
        );
        true
    }

    /// Stores `max_tokens` verbatim, without clamping.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationError::ConversationClosed`] once closed.
    pub fn set_max_tokens(
        &self,
        max_tokens: i64,
        clock: &impl Clock,
    ) -> Result<(), ConversationError> {
        self.update_parameters(clock, |parameters| parameters.max_tokens = max_tokens)
    }

    /// Stores the temperature clamped into `[0, 2]`.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationError::ConversationClosed`] once closed.
    pub fn set_temperature(
        &self,
        temperature: f64,
        clock: &impl Clock,
    ) -> Result<(), ConversationError> {
        self.update_parameters(clock, |parameters| {
            parameters.temperature = clamp_temperature(temperature);
        })
    }

    /// Stores top-p clamped into `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationError::ConversationClosed`] once closed.
    pub fn set_top_p(&self, top_p: f64, clock: &impl Clock) -> Result<(), ConversationError> {
        self.update_parameters(clock, |parameters| parameters.top_p = clamp_top_p(top_p))
    }

    /// Stores top-k clamped to be non-negative.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationError::ConversationClosed`] once closed.
    pub fn set_top_k(&self, top_k: i64, clock: &impl Clock) -> Result<(), ConversationError> {
        self.update_parameters(clock, |parameters| parameters.top_k = clamp_top_k(top_k))
    }

    /// Replaces the stop sequences.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationError::ConversationClosed`] once closed.
    pub fn set_stop_sequences(
        &self,
        stop_sequences: Vec<String>,
        clock: &impl Clock,
    ) -> Result<(), ConversationError> {
        self.update_parameters(clock, move |parameters| {
            parameters.stop_sequences = stop_sequences;
        })
    }

    /// Sets a metadata entry.
    pub fn set_metadata(&self, key: impl Into<String>, value: Value, clock: &impl Clock) {
        let mut state = write(&self.state);
        state.metadata.insert(key.into(), value);
        state.updated_at = clock.utc();
    }

    /// Attaches a tool, replacing any attached tool with the same name.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationError::ConversationClosed`] once closed.
    pub fn add_tool(&self, tool: Tool, clock: &impl Clock) -> Result<(), ConversationError> {
        let mut state = write(&self.state);
        ensure_open(&state)?;
        let name = tool.name().as_str().to_owned();
        state.tools.retain(|existing| existing.name() != tool.name());
        state.tools.push(tool);
        self.record(&mut state, EventKind::ConversationToolAdded { name }, clock);
        Ok(())
    }

    /// Detaches a tool, returning whether it was attached.
    pub fn remove_tool(&self, name: &ToolName, clock: &impl Clock) -> bool {
        let mut state = write(&self.state);
        let before = state.tools.len();
        state.tools.retain(|existing| existing.name() != name);
        if state.tools.len() == before {
            return false;
        }
        self.record(
            &mut state,
            EventKind::ConversationToolRemoved {
                name: name.as_str().to_owned(),
            },
            clock,
        );
        true
    }

    /// Projects the history into model-request messages.
    ///
    /// The projection is pure: calling it repeatedly yields equal output and
    /// never mutates the conversation.
    #[must_use]
    pub fn messages_for_api(&self) -> Vec<ApiMessage> {
        read(&self.state)
            .messages
            .iter()
            .map(|message| ApiMessage {
                role: message.role(),
                content: message.content().to_vec(),
            })
            .collect()
    }

    /// Builds the model request for the current state.
    #[must_use]
    pub fn to_model_request(&self) -> ModelRequest {
        let state = read(&self.state);
        ModelRequest {
            model: state.model.clone(),
            system: state.system_prompt.clone(),
            messages: state
                .messages
                .iter()
                .map(|message| ApiMessage {
                    role: message.role(),
                    content: message.content().to_vec(),
                })
                .collect(),
            max_tokens: state.parameters.max_tokens,
            temperature: state.parameters.temperature,
            top_p: state.parameters.top_p,
            top_k: (state.parameters.top_k > 0).then_some(state.parameters.top_k),
            stop_sequences: state.parameters.stop_sequences.clone(),
            tools: state
                .tools
                .iter()
                .filter(|tool| tool.is_enabled())
                .map(|tool| ModelTool {
                    name: tool.name().as_str().to_owned(),
                    description: tool.description().to_owned(),
                    input_schema: tool.input_schema().clone(),
                })
                .collect(),
        }
    }

    /// Returns a copy of the buffered events.
    #[must_use]
    pub fn events(&self) -> Vec<DomainEvent> {
        read(&self.state).events.clone()
    }

    /// Discards the buffered events.
    pub fn clear_events(&self) {
        write(&self.state).events.clear();
    }

    /// Returns and clears the buffered events.
    #[must_use]
    pub fn drain_events(&self) -> Vec<DomainEvent> {
        std::mem::take(&mut write(&self.state).events)
    }

    fn transition(
        &self,
        from: ConversationStatus,
        to: ConversationStatus,
        clock: &impl Clock,
    ) -> Result<(), ConversationError> {
        let mut state = write(&self.state);
        if state.status != from {
            return Err(ConversationError::InvalidTransition {
                from: state.status,
                to,
            });
        }
        state.status = to;
        self.record(&mut state, status_changed(from, to), clock);
        Ok(())
    }

    fn update_parameters(
        &self,
        clock: &impl Clock,
        update: impl FnOnce(&mut GenerationParameters),
    ) -> Result<(), ConversationError> {
        let mut state = write(&self.state);
        ensure_open(&state)?;
        update(&mut state.parameters);
        state.updated_at = clock.utc();
        Ok(())
    }

    fn record(&self, state: &mut ConversationState, kind: EventKind, clock: &impl Clock) {
        let event = DomainEvent::record(
            AggregateType::Conversation,
            self.id.into_inner(),
            kind,
            clock,
        );
        state.updated_at = event.occurred_at();
        state.events.push(event);
    }
}

fn normalize_model(model: &str) -> Result<String, ConversationError> {
    let trimmed = model.trim();
    if trimmed.is_empty() {
        return Err(ConversationError::EmptyModel);
    }
    Ok(trimmed.to_owned())
}

const fn ensure_open(state: &ConversationState) -> Result<(), ConversationError> {
    if state.status.is_terminal() {
        return Err(ConversationError::ConversationClosed {
            status: state.status,
        });
    }
    Ok(())
}

fn status_changed(from: ConversationStatus, to: ConversationStatus) -> EventKind {
    EventKind::ConversationStatusChanged {
        from: from.as_str().to_owned(),
        to: to.as_str().to_owned(),
    }
}

#[cfg(test)]
#[path = "conversation_tests.rs"]
mod tests;

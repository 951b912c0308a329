//! Drives one user turn through the model, executing requested tools.

use crate::conversation::{
    domain::{
        ContentBlock, Conversation, ConversationError, ConversationId, Message, ModelResponse,
        Role, StopReason,
    },
    ports::{ModelService, ModelServiceError},
};
use crate::event::{EventPublisher, publish_best_effort};
use mockable::Clock;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Maximum number of model calls made for a single user turn.
pub const MAX_MODEL_ROUND_TRIPS: usize = 10;

/// Service-level errors for conversation turns.
#[derive(Debug, Error)]
pub enum ConversationTurnError {
    /// The conversation rejected a message.
    #[error(transparent)]
    Conversation(#[from] ConversationError),
    /// The model backend failed.
    #[error(transparent)]
    Model(#[from] ModelServiceError),
    /// The conversation ends with an unanswered user message and the new
    /// content is not a retry of it.
    #[error("conversation {conversation_id} has an unanswered user message")]
    TurnPending {
        /// Conversation awaiting a model reply.
        conversation_id: ConversationId,
    },
    /// There is no unanswered user message to resume from.
    #[error("conversation {conversation_id} has no unanswered user message")]
    NothingToResume {
        /// Conversation that was asked to resume.
        conversation_id: ConversationId,
    },
    /// The model kept requesting tools past the round-trip budget.
    #[error("model requested tools for more than {limit} round trips")]
    RoundTripLimit {
        /// Maximum number of round trips.
        limit: usize,
    },
}

/// Result type for conversation turn operations.
pub type ConversationTurnResult<T> = Result<T, ConversationTurnError>;

/// Outcome of a completed turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    /// Final model response.
    pub response: ModelResponse,
    /// Number of model calls made.
    pub round_trips: usize,
}

/// Orchestrates the user → model → tools loop for a conversation.
#[derive(Clone)]
pub struct ConversationTurnService<M, P, C>
where
    M: ModelService,
    P: EventPublisher,
    C: Clock + Send + Sync,
{
    model: Arc<M>,
    publisher: Arc<P>,
    clock: Arc<C>,
}

impl<M, P, C> ConversationTurnService<M, P, C>
where
    M: ModelService,
    P: EventPublisher,
    C: Clock + Send + Sync,
{
    /// Creates a new turn service.
    #[must_use]
    pub const fn new(model: Arc<M>, publisher: Arc<P>, clock: Arc<C>) -> Self {
        Self {
            model,
            publisher,
            clock,
        }
    }

    /// Appends a user message and runs the model until it ends its turn.
    ///
    /// While the model stops with `tool_use`, every requested tool is looked
    /// up in the conversation's own tool list, executed under its timeout,
    /// and answered with a user message of `tool_result` blocks. Tool
    /// failures are reported to the model as error-flagged results rather
    /// than aborting the turn. Conversation events are published
    /// best-effort whether or not the turn succeeds.
    ///
    /// A failed turn leaves its user message unanswered. Sending the same
    /// content again retries that message without appending a duplicate.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationTurnError::Conversation`] when a message is
    /// rejected, [`ConversationTurnError::TurnPending`] when a different
    /// user message is still unanswered (see
    /// [`ConversationTurnService::resume_turn`]),
    /// [`ConversationTurnError::Model`] when the backend fails, or
    /// [`ConversationTurnError::RoundTripLimit`] after
    /// [`MAX_MODEL_ROUND_TRIPS`] tool-use responses.
    pub async fn send_user_message(
        &self,
        conversation: &Conversation,
        content: Vec<ContentBlock>,
    ) -> ConversationTurnResult<TurnOutcome> {
        let outcome = match unanswered(conversation) {
            Some(pending) if pending.content() == content.as_slice() => {
                debug!(conversation_id = %conversation.id(), "retrying unanswered user message");
                self.drive(conversation).await
            }
            Some(_) => Err(ConversationTurnError::TurnPending {
                conversation_id: conversation.id(),
            }),
            None => match conversation.add_user_message(content, &*self.clock) {
                Ok(_) => self.drive(conversation).await,
                Err(err) => Err(err.into()),
            },
        };

        self.publish(conversation).await;
        outcome
    }

    /// Runs the model for a conversation whose last message is an
    /// unanswered user message, such as one left by a failed turn.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationTurnError::NothingToResume`] when the last
    /// message is not from the user, otherwise the errors of
    /// [`ConversationTurnService::send_user_message`].
    pub async fn resume_turn(
        &self,
        conversation: &Conversation,
    ) -> ConversationTurnResult<TurnOutcome> {
        let outcome = if unanswered(conversation).is_some() {
            self.drive(conversation).await
        } else {
            Err(ConversationTurnError::NothingToResume {
                conversation_id: conversation.id(),
            })
        };

        self.publish(conversation).await;
        outcome
    }

    async fn publish(&self, conversation: &Conversation) {
        let events = conversation.drain_events();
        publish_best_effort(self.publisher.as_ref(), &events).await;
    }

    async fn drive(&self, conversation: &Conversation) -> ConversationTurnResult<TurnOutcome> {
        for round_trip in 1..=MAX_MODEL_ROUND_TRIPS {
            let request = conversation.to_model_request();
            let response = self.model.create_message(&request).await?;
            debug!(
                conversation_id = %conversation.id(),
                round_trip,
                stop_reason = ?response.stop_reason,
                "model responded"
            );

            if !response.content.is_empty() {
                conversation.add_assistant_message(response.content.clone(), &*self.clock)?;
            }

            if response.stop_reason != Some(StopReason::ToolUse) {
                return Ok(TurnOutcome {
                    response,
                    round_trips: round_trip,
                });
            }

            let results = run_requested_tools(conversation, &response).await;
            if results.is_empty() {
                return Ok(TurnOutcome {
                    response,
                    round_trips: round_trip,
                });
            }
            conversation.add_user_message(results, &*self.clock)?;
        }

        info!(
            conversation_id = %conversation.id(),
            limit = MAX_MODEL_ROUND_TRIPS,
            "abandoning turn after round-trip limit"
        );
        Err(ConversationTurnError::RoundTripLimit {
            limit: MAX_MODEL_ROUND_TRIPS,
        })
    }
}

fn unanswered(conversation: &Conversation) -> Option<Message> {
    conversation
        .last_message()
        .filter(|message| message.role() == Role::User)
}

async fn run_requested_tools(
    conversation: &Conversation,
    response: &ModelResponse,
) -> Vec<ContentBlock> {
    let mut results = Vec::new();
    for block in &response.content {
        let ContentBlock::ToolUse { id, name, input } = block else {
            continue;
        };

        let Some(tool) = conversation.get_tool(name).filter(|tool| tool.is_enabled()) else {
            results.push(ContentBlock::tool_result(
                id.clone(),
                Value::String(format!("tool '{name}' is not available")),
                true,
            ));
            continue;
        };

        let arguments = input.as_object().cloned().unwrap_or_default();
        let answer = match tool.execute(arguments).await {
            Ok(result) => ContentBlock::tool_result(
                id.clone(),
                Value::String(result.joined_text()),
                result.is_error(),
            ),
            Err(err) => ContentBlock::tool_result(id.clone(), Value::String(err.to_string()), true),
        };
        results.push(answer);
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::domain::{ModelRequest, Usage};
    use crate::conversation::ports::MockModelService;
    use crate::event::{EventKind, InMemoryEventPublisher};
    use crate::session::domain::SessionId;
    use crate::tool::adapters::echo_tool;
    use mockable::DefaultClock;
    use mockall::Sequence;
    use rstest::{fixture, rstest};
    use serde_json::json;

    fn response(content: Vec<ContentBlock>, stop_reason: StopReason) -> ModelResponse {
        ModelResponse {
            id: "msg_1".to_owned(),
            model: "claude-sonnet".to_owned(),
            content,
            stop_reason: Some(stop_reason),
            usage: Usage::default(),
        }
    }

    fn tool_use(id: &str) -> ContentBlock {
        ContentBlock::ToolUse {
            id: id.to_owned(),
            name: "echo".to_owned(),
            input: json!({"message": "hi"}),
        }
    }

    #[fixture]
    fn conversation() -> Conversation {
        let conversation = Conversation::new(SessionId::new(), "claude-sonnet", &DefaultClock)
            .expect("valid model");
        conversation
            .add_tool(echo_tool(&DefaultClock).expect("valid tool"), &DefaultClock)
            .expect("open conversation");
        conversation.clear_events();
        conversation
    }

    fn service(
        model: MockModelService,
        publisher: &Arc<InMemoryEventPublisher>,
    ) -> ConversationTurnService<MockModelService, InMemoryEventPublisher, DefaultClock> {
        ConversationTurnService::new(Arc::new(model), Arc::clone(publisher), Arc::new(DefaultClock))
    }

    #[rstest]
    #[tokio::test]
    async fn plain_reply_completes_in_one_round_trip(conversation: Conversation) {
        let mut model = MockModelService::new();
        model
            .expect_create_message()
            .times(1)
            .returning(|_| Ok(response(vec![ContentBlock::text("Hello!")], StopReason::EndTurn)));
        let publisher = Arc::new(InMemoryEventPublisher::new());

        let outcome = service(model, &publisher)
            .send_user_message(&conversation, vec![ContentBlock::text("Hi")])
            .await
            .expect("turn succeeds");

        assert_eq!(outcome.round_trips, 1);
        assert_eq!(conversation.message_count(), 2);
        let published = publisher.published();
        assert!(published
            .iter()
            .all(|event| matches!(event.kind(), EventKind::MessageAdded { .. })));
        assert_eq!(published.len(), 2);
    }

    #[rstest]
    #[tokio::test]
    async fn tool_use_is_answered_with_tool_results(conversation: Conversation) {
        let mut model = MockModelService::new();
        let mut sequence = Sequence::new();
        model
            .expect_create_message()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(response(vec![tool_use("toolu_1")], StopReason::ToolUse)));
        model
            .expect_create_message()
            .times(1)
            .in_sequence(&mut sequence)
            .withf(|request: &ModelRequest| {
                request.messages.last().and_then(|message| message.content.first())
                    == Some(&ContentBlock::tool_result("toolu_1", json!("hi"), false))
            })
            .returning(|_| {
                Ok(response(
                    vec![ContentBlock::text("It said hi.")],
                    StopReason::EndTurn,
                ))
            });
        let publisher = Arc::new(InMemoryEventPublisher::new());

        let outcome = service(model, &publisher)
            .send_user_message(&conversation, vec![ContentBlock::text("Echo hi")])
            .await
            .expect("turn succeeds");

        assert_eq!(outcome.round_trips, 2);
        assert_eq!(conversation.message_count(), 4);
    }

    #[rstest]
    #[tokio::test]
    async fn unknown_tool_is_reported_to_model(conversation: Conversation) {
        let mut model = MockModelService::new();
        let mut sequence = Sequence::new();
        model
            .expect_create_message()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| {
                Ok(response(
                    vec![ContentBlock::ToolUse {
                        id: "toolu_9".to_owned(),
                        name: "missing".to_owned(),
                        input: json!({}),
                    }],
                    StopReason::ToolUse,
                ))
            });
        model
            .expect_create_message()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(response(vec![ContentBlock::text("ok")], StopReason::EndTurn)));
        let publisher = Arc::new(InMemoryEventPublisher::new());

        service(model, &publisher)
            .send_user_message(&conversation, vec![ContentBlock::text("go")])
            .await
            .expect("turn succeeds");

        let tool_message = conversation
            .messages()
            .into_iter()
            .nth(2)
            .expect("tool result message");
        assert!(matches!(
            tool_message.content().first(),
            Some(ContentBlock::ToolResult { is_error: true, .. })
        ));
    }

    #[rstest]
    #[tokio::test]
    async fn endless_tool_use_hits_round_trip_limit(conversation: Conversation) {
        let mut model = MockModelService::new();
        model
            .expect_create_message()
            .times(MAX_MODEL_ROUND_TRIPS)
            .returning(|_| Ok(response(vec![tool_use("toolu_loop")], StopReason::ToolUse)));
        let publisher = Arc::new(InMemoryEventPublisher::new());

        let result = service(model, &publisher)
            .send_user_message(&conversation, vec![ContentBlock::text("loop")])
            .await;

        assert!(matches!(
            result,
            Err(ConversationTurnError::RoundTripLimit { limit }) if limit == MAX_MODEL_ROUND_TRIPS
        ));
    }

    #[rstest]
    #[tokio::test]
    async fn model_failure_still_publishes_user_message(conversation: Conversation) {
        let mut model = MockModelService::new();
        model
            .expect_create_message()
            .times(1)
            .returning(|_| Err(ModelServiceError::InvalidRequest("too long".to_owned())));
        let publisher = Arc::new(InMemoryEventPublisher::new());

        let result = service(model, &publisher)
            .send_user_message(&conversation, vec![ContentBlock::text("Hi")])
            .await;

        assert!(matches!(result, Err(ConversationTurnError::Model(_))));
        assert_eq!(publisher.published().len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn retrying_after_model_failure_reuses_the_unanswered_message(
        conversation: Conversation,
    ) {
        let mut model = MockModelService::new();
        let mut sequence = Sequence::new();
        model
            .expect_create_message()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Err(ModelServiceError::InvalidRequest("transient".to_owned())));
        model
            .expect_create_message()
            .times(1)
            .in_sequence(&mut sequence)
            .withf(|request: &ModelRequest| request.messages.len() == 1)
            .returning(|_| Ok(response(vec![ContentBlock::text("Hello!")], StopReason::EndTurn)));
        let publisher = Arc::new(InMemoryEventPublisher::new());
        let turns = service(model, &publisher);

        let first = turns
            .send_user_message(&conversation, vec![ContentBlock::text("Hi")])
            .await;
        assert!(matches!(first, Err(ConversationTurnError::Model(_))));

        let outcome = turns
            .send_user_message(&conversation, vec![ContentBlock::text("Hi")])
            .await
            .expect("retry succeeds");

        assert_eq!(outcome.round_trips, 1);
        let roles: Vec<Role> = conversation.messages().iter().map(Message::role).collect();
        assert_eq!(roles, [Role::User, Role::Assistant]);
    }

    #[rstest]
    #[tokio::test]
    async fn pending_turn_is_resumed_before_new_content(conversation: Conversation) {
        let mut model = MockModelService::new();
        let mut sequence = Sequence::new();
        model
            .expect_create_message()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(response(Vec::new(), StopReason::EndTurn)));
        model
            .expect_create_message()
            .times(2)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(response(vec![ContentBlock::text("ok")], StopReason::EndTurn)));
        let publisher = Arc::new(InMemoryEventPublisher::new());
        let turns = service(model, &publisher);

        turns
            .send_user_message(&conversation, vec![ContentBlock::text("first")])
            .await
            .expect("empty reply still ends the turn");
        let blocked = turns
            .send_user_message(&conversation, vec![ContentBlock::text("second")])
            .await;
        assert!(matches!(
            blocked,
            Err(ConversationTurnError::TurnPending { conversation_id })
                if conversation_id == conversation.id()
        ));
        assert_eq!(conversation.message_count(), 1);

        turns.resume_turn(&conversation).await.expect("resume succeeds");
        turns
            .send_user_message(&conversation, vec![ContentBlock::text("second")])
            .await
            .expect("next message is accepted");

        assert_eq!(conversation.message_count(), 4);
    }

    #[rstest]
    #[tokio::test]
    async fn resume_without_pending_message_is_rejected(conversation: Conversation) {
        let mut model = MockModelService::new();
        model.expect_create_message().never();
        let publisher = Arc::new(InMemoryEventPublisher::new());

        let result = service(model, &publisher).resume_turn(&conversation).await;

        assert!(matches!(result, Err(ConversationTurnError::NothingToResume { .. })));
    }
}

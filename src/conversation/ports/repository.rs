//! Repository port for conversations.

use crate::conversation::domain::{Conversation, ConversationId};
use crate::session::domain::SessionId;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for conversation repository operations.
pub type ConversationRepositoryResult<T> = Result<T, ConversationRepositoryError>;

/// Storage contract for conversations.
///
/// Conversations are live aggregates shared behind [`Arc`]; repositories
/// store handles rather than snapshots.
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Stores a conversation, replacing any entry with the same identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationRepositoryError::Persistence`] when storage
    /// fails.
    async fn save(&self, conversation: &Arc<Conversation>) -> ConversationRepositoryResult<()>;

    /// Finds a conversation by identifier.
    async fn find_by_id(
        &self,
        id: ConversationId,
    ) -> ConversationRepositoryResult<Option<Arc<Conversation>>>;

    /// Returns the conversations belonging to `session_id`.
    async fn find_by_session(
        &self,
        session_id: SessionId,
    ) -> ConversationRepositoryResult<Vec<Arc<Conversation>>>;

    /// Returns every stored conversation.
    async fn find_all(&self) -> ConversationRepositoryResult<Vec<Arc<Conversation>>>;

    /// Returns whether a conversation with `id` is stored.
    async fn exists(&self, id: ConversationId) -> ConversationRepositoryResult<bool>;

    /// Returns the number of stored conversations.
    async fn count(&self) -> ConversationRepositoryResult<usize>;

    /// Removes a conversation, returning whether it was present.
    async fn delete(&self, id: ConversationId) -> ConversationRepositoryResult<bool>;
}

/// Errors returned by conversation repository implementations.
#[derive(Debug, Clone, Error)]
pub enum ConversationRepositoryError {
    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl ConversationRepositoryError {
    /// Wraps a persistence-layer failure.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}

//! Repository port for sessions.

use crate::session::domain::{Session, SessionId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for session repository operations.
pub type SessionRepositoryResult<T> = Result<T, SessionRepositoryError>;

/// Storage contract for live session aggregates.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Stores a session, replacing any entry with the same identifier.
    ///
    /// # Errors
    ///
    /// Returns [`SessionRepositoryError::Persistence`] when storage fails.
    async fn save(&self, session: &Arc<Session>) -> SessionRepositoryResult<()>;

    /// Finds a session by identifier.
    async fn find_by_id(&self, id: SessionId) -> SessionRepositoryResult<Option<Arc<Session>>>;

    /// Returns every stored session.
    async fn find_all(&self) -> SessionRepositoryResult<Vec<Arc<Session>>>;

    /// Returns whether a session with `id` is stored.
    async fn exists(&self, id: SessionId) -> SessionRepositoryResult<bool>;

    /// Returns the number of stored sessions.
    async fn count(&self) -> SessionRepositoryResult<usize>;

    /// Removes a session, returning whether it was present.
    async fn delete(&self, id: SessionId) -> SessionRepositoryResult<bool>;
}

/// Errors returned by session repository implementations.
#[derive(Debug, Clone, Error)]
pub enum SessionRepositoryError {
    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl SessionRepositoryError {
    /// Wraps a persistence-layer failure.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}

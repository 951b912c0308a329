//! In-memory session repository.

use crate::session::{
    domain::{Session, SessionId},
    ports::{SessionRepository, SessionRepositoryError, SessionRepositoryResult},
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

type SessionMap = BTreeMap<SessionId, Arc<Session>>;

/// Thread-safe in-memory session repository.
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionRepository {
    sessions: Arc<RwLock<SessionMap>>,
}

fn poisoned<T>(err: &PoisonError<T>) -> SessionRepositoryError {
    SessionRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

impl InMemorySessionRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn save(&self, session: &Arc<Session>) -> SessionRepositoryResult<()> {
        let mut sessions = self.sessions.write().map_err(|err| poisoned(&err))?;
        sessions.insert(session.id(), Arc::clone(session));
        Ok(())
    }

    async fn find_by_id(&self, id: SessionId) -> SessionRepositoryResult<Option<Arc<Session>>> {
        let sessions = self.sessions.read().map_err(|err| poisoned(&err))?;
        Ok(sessions.get(&id).cloned())
    }

    async fn find_all(&self) -> SessionRepositoryResult<Vec<Arc<Session>>> {
        let sessions = self.sessions.read().map_err(|err| poisoned(&err))?;
        Ok(sessions.values().cloned().collect())
    }

    async fn exists(&self, id: SessionId) -> SessionRepositoryResult<bool> {
        let sessions = self.sessions.read().map_err(|err| poisoned(&err))?;
        Ok(sessions.contains_key(&id))
    }

    async fn count(&self) -> SessionRepositoryResult<usize> {
        let sessions = self.sessions.read().map_err(|err| poisoned(&err))?;
        Ok(sessions.len())
    }

    async fn delete(&self, id: SessionId) -> SessionRepositoryResult<bool> {
        let mut sessions = self.sessions.write().map_err(|err| poisoned(&err))?;
        Ok(sessions.remove(&id).is_some())
    }
}

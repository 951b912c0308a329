//! In-memory conversation repository.

use crate::conversation::{
    domain::{Conversation, ConversationId},
    ports::{ConversationRepository, ConversationRepositoryError, ConversationRepositoryResult},
};
use crate::session::domain::SessionId;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

type ConversationMap = BTreeMap<ConversationId, Arc<Conversation>>;

/// Thread-safe in-memory conversation repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryConversationRepository {
    conversations: Arc<RwLock<ConversationMap>>,
}

impl InMemoryConversationRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_read<T>(
        &self,
        f: impl FnOnce(&ConversationMap) -> T,
    ) -> ConversationRepositoryResult<T> {
        let guard = self.conversations.read().map_err(|err| {
            ConversationRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(f(&guard))
    }

    fn with_write<T>(
        &self,
        f: impl FnOnce(&mut ConversationMap) -> T,
    ) -> ConversationRepositoryResult<T> {
        let mut guard = self.conversations.write().map_err(|err| {
            ConversationRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(f(&mut guard))
    }
}

#[async_trait]
impl ConversationRepository for InMemoryConversationRepository {
    async fn save(&self, conversation: &Arc<Conversation>) -> ConversationRepositoryResult<()> {
        self.with_write(|map| {
            map.insert(conversation.id(), Arc::clone(conversation));
        })
    }

    async fn find_by_id(
        &self,
        id: ConversationId,
    ) -> ConversationRepositoryResult<Option<Arc<Conversation>>> {
        self.with_read(|map| map.get(&id).cloned())
    }

    async fn find_by_session(
        &self,
        session_id: SessionId,
    ) -> ConversationRepositoryResult<Vec<Arc<Conversation>>> {
        self.with_read(|map| {
            map.values()
                .filter(|conversation| conversation.session_id() == session_id)
                .cloned()
                .collect()
        })
    }

    async fn find_all(&self) -> ConversationRepositoryResult<Vec<Arc<Conversation>>> {
        self.with_read(|map| map.values().cloned().collect())
    }

    async fn exists(&self, id: ConversationId) -> ConversationRepositoryResult<bool> {
        self.with_read(|map| map.contains_key(&id))
    }

    async fn count(&self) -> ConversationRepositoryResult<usize> {
        self.with_read(BTreeMap::len)
    }

    async fn delete(&self, id: ConversationId) -> ConversationRepositoryResult<bool> {
        self.with_write(|map| map.remove(&id).is_some())
    }
}

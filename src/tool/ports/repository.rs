//! Repository port for tool storage and filtered lookup.

use crate::tool::domain::{Tool, ToolName};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for tool repository operations.
pub type ToolRepositoryResult<T> = Result<T, ToolRepositoryError>;

/// Storage contract for tools, keyed by name.
#[async_trait]
pub trait ToolRepository: Send + Sync {
    /// Stores a tool, replacing any tool with the same name.
    ///
    /// # Errors
    ///
    /// Returns [`ToolRepositoryError::Persistence`] when storage fails.
    async fn save(&self, tool: &Tool) -> ToolRepositoryResult<()>;

    /// Finds a tool by name.
    async fn find_by_name(&self, name: &ToolName) -> ToolRepositoryResult<Option<Tool>>;

    /// Returns every stored tool ordered by name.
    async fn find_all(&self) -> ToolRepositoryResult<Vec<Tool>>;

    /// Returns tools in `category`.
    async fn find_by_category(&self, category: &str) -> ToolRepositoryResult<Vec<Tool>>;

    /// Returns tools carrying `tag`.
    async fn find_by_tag(&self, tag: &str) -> ToolRepositoryResult<Vec<Tool>>;

    /// Returns enabled tools only.
    async fn find_enabled(&self) -> ToolRepositoryResult<Vec<Tool>>;

    /// Returns whether a tool named `name` is stored.
    async fn exists(&self, name: &ToolName) -> ToolRepositoryResult<bool>;

    /// Returns the number of stored tools.
    async fn count(&self) -> ToolRepositoryResult<usize>;

    /// Removes a tool, returning whether it was present.
    async fn delete(&self, name: &ToolName) -> ToolRepositoryResult<bool>;
}

/// Errors returned by tool repository implementations.
#[derive(Debug, Clone, Error)]
pub enum ToolRepositoryError {
    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl ToolRepositoryError {
    /// Wraps a persistence-layer failure.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}

//! Repository ports for resources and prompts.

use crate::catalog::domain::{Prompt, PromptName, Resource, ResourceUri};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for catalog repository operations.
pub type CatalogRepositoryResult<T> = Result<T, CatalogRepositoryError>;

/// Storage contract for resources, keyed by URI.
#[async_trait]
pub trait ResourceRepository: Send + Sync {
    /// Stores a resource, replacing any resource with the same URI.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogRepositoryError::Persistence`] when storage fails.
    async fn save(&self, resource: &Resource) -> CatalogRepositoryResult<()>;

    /// Finds a resource by URI.
    async fn find_by_uri(&self, uri: &ResourceUri) -> CatalogRepositoryResult<Option<Resource>>;

    /// Returns every stored resource ordered by URI.
    async fn find_all(&self) -> CatalogRepositoryResult<Vec<Resource>>;

    /// Returns whether a resource with `uri` is stored.
    async fn exists(&self, uri: &ResourceUri) -> CatalogRepositoryResult<bool>;

    /// Returns the number of stored resources.
    async fn count(&self) -> CatalogRepositoryResult<usize>;

    /// Removes a resource, returning whether it was present.
    async fn delete(&self, uri: &ResourceUri) -> CatalogRepositoryResult<bool>;
}

/// Storage contract for prompts, keyed by name.
#[async_trait]
pub trait PromptRepository: Send + Sync {
    /// Stores a prompt, replacing any prompt with the same name.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogRepositoryError::Persistence`] when storage fails.
    async fn save(&self, prompt: &Prompt) -> CatalogRepositoryResult<()>;

    /// Finds a prompt by name.
    async fn find_by_name(&self, name: &PromptName) -> CatalogRepositoryResult<Option<Prompt>>;

    /// Returns every stored prompt ordered by name.
    async fn find_all(&self) -> CatalogRepositoryResult<Vec<Prompt>>;

    /// Returns whether a prompt named `name` is stored.
    async fn exists(&self, name: &PromptName) -> CatalogRepositoryResult<bool>;

    /// Returns the number of stored prompts.
    async fn count(&self) -> CatalogRepositoryResult<usize>;

    /// Removes a prompt, returning whether it was present.
    async fn delete(&self, name: &PromptName) -> CatalogRepositoryResult<bool>;
}

/// Errors returned by catalog repository implementations.
#[derive(Debug, Clone, Error)]
pub enum CatalogRepositoryError {
    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl CatalogRepositoryError {
    /// Wraps a persistence-layer failure.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}

//! Port for the remote language-model backend.

use crate::conversation::domain::{ModelRequest, ModelResponse, StreamEvent};
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::sync::Arc;
use thiserror::Error;

/// Result type for model service operations.
pub type ModelServiceResult<T> = Result<T, ModelServiceError>;

/// Stream of incremental model events.
pub type ModelEventStream = BoxStream<'static, ModelServiceResult<StreamEvent>>;

/// Client contract for a remote language model.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ModelService: Send + Sync {
    /// Sends a request and waits for the complete response.
    ///
    /// # Errors
    ///
    /// Returns [`ModelServiceError`] when the backend rejects or fails the
    /// request.
    async fn create_message(&self, request: &ModelRequest) -> ModelServiceResult<ModelResponse>;

    /// Sends a request and streams the response incrementally.
    ///
    /// # Errors
    ///
    /// Returns [`ModelServiceError`] when the stream cannot be opened.
    async fn create_message_stream(
        &self,
        request: &ModelRequest,
    ) -> ModelServiceResult<ModelEventStream>;

    /// Counts the input tokens `request` would consume.
    ///
    /// # Errors
    ///
    /// Returns [`ModelServiceError`] when counting fails.
    async fn count_tokens(&self, request: &ModelRequest) -> ModelServiceResult<u64>;

    /// Checks `request` against backend constraints without sending it.
    ///
    /// # Errors
    ///
    /// Returns [`ModelServiceError::InvalidRequest`] describing the first
    /// violated constraint.
    async fn validate_request(&self, request: &ModelRequest) -> ModelServiceResult<()>;
}

/// Errors returned by model service implementations.
#[derive(Debug, Clone, Error)]
pub enum ModelServiceError {
    /// The request violates a backend constraint.
    #[error("invalid model request: {0}")]
    InvalidRequest(String),

    /// The backend failed or could not be reached.
    #[error("model backend error: {0}")]
    Backend(Arc<dyn std::error::Error + Send + Sync>),
}

impl ModelServiceError {
    /// Wraps a backend failure.
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Arc::new(err))
    }
}

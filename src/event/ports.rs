//! Publication port for drained domain events.

use super::DomainEvent;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for event publication.
pub type EventPublishResult<T> = Result<T, EventPublishError>;

/// Outbound contract for delivering domain events to subscribers.
///
/// Publication is best-effort: callers log failures and carry on, so an
/// implementation must never be relied upon to roll back domain state.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publishes a single event.
    ///
    /// # Errors
    ///
    /// Returns [`EventPublishError`] when the event could not be delivered.
    async fn publish(&self, event: &DomainEvent) -> EventPublishResult<()>;
}

/// Errors returned by event publisher implementations.
#[derive(Debug, Clone, Error)]
pub enum EventPublishError {
    /// The downstream channel rejected the event.
    #[error("event delivery failed: {0}")]
    Delivery(Arc<dyn std::error::Error + Send + Sync>),
}

impl EventPublishError {
    /// Wraps a delivery failure.
    pub fn delivery(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Delivery(Arc::new(err))
    }
}

//! Event publisher adapters.

use super::{DomainEvent, EventPublishError, EventPublishResult, EventPublisher};
use async_trait::async_trait;
use std::sync::{Arc, RwLock};

/// Publisher that records events in memory.
///
/// Intended for tests and for embedding applications that poll for events.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventPublisher {
    published: Arc<RwLock<Vec<DomainEvent>>>,
}

impl InMemoryEventPublisher {
    /// Creates an empty publisher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every event published so far, in publication order.
    #[must_use]
    pub fn published(&self) -> Vec<DomainEvent> {
        self.published
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventPublisher {
    async fn publish(&self, event: &DomainEvent) -> EventPublishResult<()> {
        let mut guard = self
            .published
            .write()
            .map_err(|err| EventPublishError::delivery(std::io::Error::other(err.to_string())))?;
        guard.push(event.clone());
        Ok(())
    }
}

/// Publisher that emits each event as a structured `tracing` record.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventPublisher;

#[async_trait]
impl EventPublisher for TracingEventPublisher {
    async fn publish(&self, event: &DomainEvent) -> EventPublishResult<()> {
        tracing::debug!(
            event_id = %event.id(),
            aggregate_type = event.aggregate_type().as_str(),
            aggregate_id = %event.aggregate_id(),
            event_type = event.kind().as_str(),
            "domain event"
        );
        Ok(())
    }
}

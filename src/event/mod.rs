//! Domain events and the pull-based outbox they travel through.
//!
//! Aggregates append [`DomainEvent`]s to their own outbox while mutating.
//! Callers drain the outbox after the operation and hand the events to an
//! [`EventPublisher`]. Delivery is at-most-once and best-effort: a failed
//! publish is logged and dropped, never surfaced to the domain caller.

mod adapters;
mod domain;
mod ports;

pub use adapters::{InMemoryEventPublisher, TracingEventPublisher};
pub use domain::{AggregateType, DomainEvent, EventId, EventKind};
pub use ports::{EventPublishError, EventPublishResult, EventPublisher};

/// Publishes drained events in order, logging and swallowing failures.
///
/// Returns the number of events that were delivered.
pub async fn publish_best_effort<P>(publisher: &P, events: &[DomainEvent]) -> usize
where
    P: EventPublisher + ?Sized,
{
    let mut delivered = 0;
    for event in events {
        match publisher.publish(event).await {
            Ok(()) => delivered += 1,
            Err(err) => tracing::warn!(
                event_id = %event.id(),
                event_type = event.kind().as_str(),
                error = %err,
                "dropping undeliverable domain event"
            ),
        }
    }
    delivered
}

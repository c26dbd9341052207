use lotkeeper_shared::LotEvent;

/// Outbound sink for lifecycle events. Publishing never fails the transition
/// that produced the event.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: LotEvent);
}

/// Drops every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPublisher;

impl EventPublisher for NoopPublisher {
    fn publish(&self, _event: LotEvent) {}
}

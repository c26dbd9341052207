use lotkeeper_core::EventPublisher;
use lotkeeper_shared::LotEvent;
use tokio::sync::broadcast;
use tracing::debug;

/// Fan-out of lifecycle events to live subscribers (the SSE stream).
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<LotEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LotEvent> {
        self.tx.subscribe()
    }
}

impl EventPublisher for EventBus {
    fn publish(&self, event: LotEvent) {
        let name = event.name();
        // No subscribers is not an error
        match self.tx.send(event) {
            Ok(receivers) => debug!("Published {} to {} subscribers", name, receivers),
            Err(_) => debug!("Dropped {}: no subscribers", name),
        }
    }
}

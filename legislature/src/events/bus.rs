//! Event bus for lifecycle notifications
//!
//! Pub/sub over a Tokio broadcast channel. Events are not persisted; the
//! proposal store remains the record of what happened.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::debug;

use super::types::LifecycleEvent;

/// Channel capacity for broadcast
const CHANNEL_CAPACITY: usize = 256;

/// Shared reference to EventBus
pub type SharedEventBus = Arc<EventBus>;

/// Broadcast bus for lifecycle events
pub struct EventBus {
    sender: broadcast::Sender<LifecycleEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Create a shared reference to this event bus
    pub fn shared(self) -> SharedEventBus {
        Arc::new(self)
    }

    /// Publish an event to all subscribers
    pub fn publish(&self, event: LifecycleEvent) {
        let event_type = event.event_type();
        let bill_id = event.bill_id();

        // No receivers is fine
        match self.sender.send(event) {
            Ok(count) => debug!(event_type, bill_id, receivers = count, "Event published"),
            Err(_) => debug!(event_type, bill_id, "Event published (no receivers)"),
        }
    }

    /// Subscribe to receive events
    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.sender.subscribe()
    }

    /// Get the number of current subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proposal::ProposalId;
    use chrono::Utc;

    fn removed(bill_id: ProposalId) -> LifecycleEvent {
        LifecycleEvent::Removed {
            bill_id,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_publish_subscribe() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        bus.publish(removed(5));

        let received = rx.recv().await.unwrap();
        assert_eq!(received.bill_id(), 5);
        assert_eq!(received.event_type(), "removed");
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::new();
        assert_eq!(bus.subscriber_count(), 0);
        bus.publish(removed(1));
    }
}

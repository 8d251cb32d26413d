use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::debug;

/// Fire-and-forget delivery of domain events to the downstream stream.
/// Failures are logged and never surfaced to the caller.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, topic: &str, body: Value);
}

#[derive(Debug, Clone)]
pub struct DomainEvent {
    pub topic: String,
    pub body: Value,
}

/// In-process event bus over a broadcast channel, standing in for the
/// external stream producer.
pub struct BroadcastPublisher {
    tx: broadcast::Sender<DomainEvent>,
}

impl BroadcastPublisher {
    pub fn new(buffer: usize) -> Self {
        let (tx, _unused_rx) = broadcast::channel(buffer);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.tx.subscribe()
    }
}

#[async_trait]
impl EventPublisher for BroadcastPublisher {
    async fn publish(&self, topic: &str, body: Value) {
        let event = DomainEvent {
            topic: topic.to_string(),
            body,
        };
        if let Err(err) = self.tx.send(event) {
            debug!(topic, error = %err, "event dropped: no subscribers");
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{BroadcastPublisher, EventPublisher};

    #[tokio::test]
    async fn subscribers_see_published_events() {
        let publisher = BroadcastPublisher::new(8);
        let mut rx = publisher.subscribe();

        publisher
            .publish("driver-available", json!({"driverId": "d-1"}))
            .await;

        let event = rx.recv().await.unwrap();
        assert_eq!(event.topic, "driver-available");
        assert_eq!(event.body["driverId"], "d-1");
    }

    #[tokio::test]
    async fn publish_without_subscribers_does_not_panic() {
        let publisher = BroadcastPublisher::new(8);
        publisher.publish("driver-available", json!({})).await;
    }
}

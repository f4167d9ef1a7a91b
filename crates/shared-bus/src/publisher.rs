//! # Event Publisher
//!
//! Defines the publishing side of the event bus.

use crate::events::{CeremonyEvent, EventFilter};
use crate::subscriber::Subscription;
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Trait for publishing events to the bus.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish an event; returns the number of active subscribers reached.
    async fn publish(&self, event: CeremonyEvent) -> usize;

    fn events_published(&self) -> u64;
}

/// In-memory implementation of the event bus.
///
/// Uses `tokio::sync::broadcast` for multi-producer, multi-consumer
/// semantics. Suitable for a single coordinator process; the document-store
/// change-trigger equivalent in a distributed deployment is out of scope.
pub struct InMemoryEventBus {
    sender: broadcast::Sender<CeremonyEvent>,
    subscriptions: Arc<RwLock<HashMap<String, usize>>>,
    events_published: AtomicU64,
    capacity: usize,
}

impl InMemoryEventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            subscriptions: Arc::new(RwLock::new(HashMap::new())),
            events_published: AtomicU64::new(0),
            capacity,
        }
    }

    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        let receiver = self.sender.subscribe();
        let topic_key = format!("{:?}", filter.topics);

        if let Ok(mut subs) = self.subscriptions.write() {
            *subs.entry(topic_key.clone()).or_insert(0) += 1;
        }

        debug!(topics = ?filter.topics, "new subscription");
        Subscription::new(receiver, filter, self.subscriptions.clone(), topic_key)
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: CeremonyEvent) -> usize {
        let topic = event.topic();
        self.events_published.fetch_add(1, Ordering::Relaxed);

        match self.sender.send(event) {
            Ok(receiver_count) => {
                debug!(?topic, receivers = receiver_count, "event published");
                receiver_count
            }
            Err(_) => {
                warn!(?topic, "event dropped, no receivers");
                0
            }
        }
    }

    fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{CeremonyId, CircuitId};

    fn sample_event() -> CeremonyEvent {
        CeremonyEvent::CeremonyFinalized {
            ceremony_id: CeremonyId::from("c1"),
        }
    }

    #[tokio::test]
    async fn publish_with_no_subscribers_reaches_nobody() {
        let bus = InMemoryEventBus::new();
        let receivers = bus.publish(sample_event()).await;
        assert_eq!(receivers, 0);
        assert_eq!(bus.events_published(), 1);
    }

    #[tokio::test]
    async fn publish_reaches_every_subscriber() {
        let bus = InMemoryEventBus::new();
        let _s1 = bus.subscribe(EventFilter::all());
        let _s2 = bus.subscribe(EventFilter::all());

        let receivers = bus.publish(sample_event()).await;
        assert_eq!(receivers, 2);
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[tokio::test]
    async fn filter_excludes_other_topics() {
        let bus = InMemoryEventBus::new();
        let mut sub = bus.subscribe(EventFilter::topics(vec![crate::events::EventTopic::Circuit]));

        bus.publish(CeremonyEvent::ParticipantTimedOut {
            ceremony_id: CeremonyId::from("c1"),
            circuit_id: CircuitId::from("x"),
            participant_id: shared_types::ParticipantId::from("p1"),
        })
        .await;
        bus.publish(sample_event()).await;

        let received = sub.recv().await.expect("one event");
        assert!(matches!(received, CeremonyEvent::CeremonyFinalized { .. }));
    }
}

//! # Shared Bus — In-Process Event Bus
//!
//! The coordinator reacts to document-store change events (onCreate /
//! onUpdate on Participant, Contribution, Circuit). Here that becomes
//! in-process publish/subscribe: components publish `CeremonyEvent`s and
//! the dispatcher wiring in `coordinator-runtime` subscribes and invokes the
//! pure component functions.

pub mod events;
pub mod publisher;
pub mod subscriber;

pub use events::{CeremonyEvent, EventFilter, EventTopic};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before backpressure.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_capacity_is_reasonable() {
        assert_eq!(DEFAULT_CHANNEL_CAPACITY, 1000);
    }
}

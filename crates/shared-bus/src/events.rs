//! # Ceremony Events
//!
//! A Firestore-backed coordinator would react to `onCreate`/`onUpdate`
//! triggers on the Participant, Contribution, and Circuit documents. Here
//! those triggers become `CeremonyEvent` variants published to the
//! in-process bus; each component subscribes to the subset it cares about
//! instead of being called directly.

use shared_types::{CeremonyId, CircuitId, ParticipantId};

/// Coarse topic used for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTopic {
    Participant,
    Contribution,
    Circuit,
}

#[derive(Debug, Clone)]
pub enum CeremonyEvent {
    /// A participant's `contribution_step` advanced (including the
    /// `Uploading -> Verifying` transition that triggers the Verifier).
    ParticipantStepAdvanced {
        ceremony_id: CeremonyId,
        circuit_id: CircuitId,
        participant_id: ParticipantId,
        step: shared_types::ContributionStep,
    },
    /// A participant was admitted to a circuit's queue as its new head.
    ParticipantPromotedToContributor {
        ceremony_id: CeremonyId,
        circuit_id: CircuitId,
        participant_id: ParticipantId,
    },
    /// A participant's contribution was classified (valid or invalid).
    ContributionClassified {
        ceremony_id: CeremonyId,
        circuit_id: CircuitId,
        participant_id: ParticipantId,
        valid: bool,
    },
    /// A participant was timed out by the Scheduler.
    ParticipantTimedOut {
        ceremony_id: CeremonyId,
        circuit_id: CircuitId,
        participant_id: ParticipantId,
    },
    /// A circuit finished its final verification during finalization.
    CircuitFinalized {
        ceremony_id: CeremonyId,
        circuit_id: CircuitId,
        valid: bool,
    },
    /// Every circuit in the ceremony has a valid final contribution.
    CeremonyFinalized { ceremony_id: CeremonyId },
}

impl CeremonyEvent {
    pub fn topic(&self) -> EventTopic {
        match self {
            CeremonyEvent::ParticipantStepAdvanced { .. }
            | CeremonyEvent::ParticipantPromotedToContributor { .. }
            | CeremonyEvent::ParticipantTimedOut { .. } => EventTopic::Participant,
            CeremonyEvent::ContributionClassified { .. } => EventTopic::Contribution,
            CeremonyEvent::CircuitFinalized { .. } | CeremonyEvent::CeremonyFinalized { .. } => {
                EventTopic::Circuit
            }
        }
    }
}

/// Subscription filter: `None` matches every topic.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub topics: Option<Vec<EventTopic>>,
}

impl EventFilter {
    pub fn all() -> Self {
        Self { topics: None }
    }

    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics: Some(topics),
        }
    }

    pub fn matches(&self, event: &CeremonyEvent) -> bool {
        match &self.topics {
            None => true,
            Some(topics) => topics.contains(&event.topic()),
        }
    }
}

//! `MetaStore`: the transactional document store interface.
//!
//! A production backend realizes this with Firestore transactions; the
//! contract any adapter must honor is optimistic-transaction semantics on a
//! per-document basis, expressed as mutation closures applied inside a
//! compare-and-set retry loop. The queue mutation in particular realizes a
//! single-writer model, a compare-and-set on the `waitingQueue` field.

use crate::error::CoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared_types::{
    Ceremony, CeremonyId, Circuit, CircuitId, Contribution, ContributionId, Participant,
    ParticipantId, Timeout,
};

/// A mutation applied to a `Circuit` inside an optimistic transaction.
/// Boxed so callers can close over whatever locals they need without the
/// trait itself becoming generic over a closure type.
pub type CircuitMutation =
    Box<dyn FnOnce(&mut Circuit) -> Result<(), CoreError> + Send + 'static>;

/// A mutation applied to a `Participant` inside an optimistic transaction.
pub type ParticipantMutation =
    Box<dyn FnOnce(&mut Participant) -> Result<(), CoreError> + Send + 'static>;

/// A mutation applied to a `Ceremony` inside an optimistic transaction.
pub type CeremonyMutation =
    Box<dyn FnOnce(&mut Ceremony) -> Result<(), CoreError> + Send + 'static>;

/// The atomic write batch the Verifier commits: one new
/// Contribution plus the circuit counter/avg_timings update plus the
/// participant step/progress/status update, all-or-nothing. This is the
/// concrete mechanism that guarantees a reader observing the updated
/// counter also observes the Contribution that produced it.
pub struct VerificationBatch {
    pub ceremony_id: CeremonyId,
    pub circuit_id: CircuitId,
    pub participant_id: ParticipantId,
    pub contribution: Contribution,
    pub circuit_mutation: CircuitMutation,
    pub participant_mutation: ParticipantMutation,
}

/// The atomic write batch the Finalizer commits once per circuit: one new
/// `zkeyIndex == "final"` Contribution plus the
/// circuit's storage-path/hash update, all-or-nothing. No participant
/// document is touched here — the coordinator's own status only changes
/// once, in `finalize_ceremony`, after every circuit's batch has landed.
pub struct FinalizationBatch {
    pub ceremony_id: CeremonyId,
    pub circuit_id: CircuitId,
    pub contribution: Contribution,
    pub circuit_mutation: CircuitMutation,
}

#[async_trait]
pub trait MetaStore: Send + Sync {
    async fn create_ceremony(&self, ceremony: Ceremony) -> Result<(), CoreError>;
    async fn get_ceremony(&self, id: &CeremonyId) -> Result<Ceremony, CoreError>;
    async fn list_ceremonies(&self) -> Result<Vec<Ceremony>, CoreError>;
    async fn mutate_ceremony(
        &self,
        id: &CeremonyId,
        mutation: CeremonyMutation,
    ) -> Result<Ceremony, CoreError>;

    async fn create_circuit(&self, circuit: Circuit) -> Result<(), CoreError>;
    async fn get_circuit(
        &self,
        ceremony_id: &CeremonyId,
        circuit_id: &CircuitId,
    ) -> Result<Circuit, CoreError>;
    async fn list_circuits(&self, ceremony_id: &CeremonyId) -> Result<Vec<Circuit>, CoreError>;

    /// Applies `mutation` to the circuit identified by `(ceremony_id,
    /// circuit_id)` inside a compare-and-set retry loop. Implementations
    /// must serialize concurrent mutations of the same circuit.
    async fn mutate_circuit(
        &self,
        ceremony_id: &CeremonyId,
        circuit_id: &CircuitId,
        mutation: CircuitMutation,
    ) -> Result<Circuit, CoreError>;

    async fn create_participant(&self, participant: Participant) -> Result<(), CoreError>;
    async fn get_participant(
        &self,
        ceremony_id: &CeremonyId,
        participant_id: &ParticipantId,
    ) -> Result<Participant, CoreError>;
    async fn list_participants(
        &self,
        ceremony_id: &CeremonyId,
    ) -> Result<Vec<Participant>, CoreError>;

    async fn mutate_participant(
        &self,
        ceremony_id: &CeremonyId,
        participant_id: &ParticipantId,
        mutation: ParticipantMutation,
    ) -> Result<Participant, CoreError>;

    async fn get_contribution(&self, id: &ContributionId) -> Result<Contribution, CoreError>;
    async fn list_contributions_for_circuit(
        &self,
        circuit_id: &CircuitId,
    ) -> Result<Vec<Contribution>, CoreError>;

    async fn create_timeout(&self, timeout: Timeout) -> Result<(), CoreError>;

    /// The currently active timeout for a participant, if any, evaluated
    /// against `now`.
    async fn active_timeout(
        &self,
        participant_id: &ParticipantId,
        now: DateTime<Utc>,
    ) -> Result<Option<Timeout>, CoreError>;

    /// Commits the Verifier's atomic write batch.
    async fn commit_verification_batch(
        &self,
        batch: VerificationBatch,
    ) -> Result<Contribution, CoreError>;

    /// Commits the Finalizer's atomic write batch.
    async fn commit_finalization_batch(
        &self,
        batch: FinalizationBatch,
    ) -> Result<Contribution, CoreError>;
}

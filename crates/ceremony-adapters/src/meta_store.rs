//! In-memory `MetaStore`, the test double and local-dev
//! adapter for a document store a production deployment backs with Firestore.
//!
//! Each document type lives in its own `DashMap` keyed by its natural
//! lookup identifier. A "mutation" clones the current document,
//! applies the caller's closure to the clone, and only writes the clone
//! back if the closure succeeds — this realizes an "optimistic
//! transaction, retried from the top on conflict" contract without
//! needing a real CAS loop, since each `DashMap` shard already serializes
//! concurrent access to one key for the duration of the closure.

use async_trait::async_trait;
use ceremony_ports::meta_store::{
    CeremonyMutation, CircuitMutation, FinalizationBatch, ParticipantMutation, VerificationBatch,
};
use ceremony_ports::{CoreError, MetaStore};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use shared_types::{
    Ceremony, CeremonyId, Circuit, CircuitId, Contribution, ContributionId, Participant,
    ParticipantId, Timeout,
};

type CircuitKey = (String, String);
type ParticipantKey = (String, String);

/// In-memory document store. Cheap to construct; one instance is shared
/// (via `Arc`) across every component in a single coordinator process.
#[derive(Default)]
pub struct InMemoryMetaStore {
    ceremonies: DashMap<String, Ceremony>,
    circuits: DashMap<CircuitKey, Circuit>,
    participants: DashMap<ParticipantKey, Participant>,
    contributions: DashMap<String, Contribution>,
    timeouts: DashMap<String, Vec<Timeout>>,
}

impl InMemoryMetaStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn circuit_key(ceremony_id: &CeremonyId, circuit_id: &CircuitId) -> CircuitKey {
        (ceremony_id.as_str().to_string(), circuit_id.as_str().to_string())
    }

    fn participant_key(ceremony_id: &CeremonyId, participant_id: &ParticipantId) -> ParticipantKey {
        (ceremony_id.as_str().to_string(), participant_id.as_str().to_string())
    }
}

#[async_trait]
impl MetaStore for InMemoryMetaStore {
    async fn create_ceremony(&self, ceremony: Ceremony) -> Result<(), CoreError> {
        let key = ceremony.id.as_str().to_string();
        if self.ceremonies.contains_key(&key) {
            return Err(CoreError::Conflict(format!("ceremony {key} already exists")));
        }
        self.ceremonies.insert(key, ceremony);
        Ok(())
    }

    async fn get_ceremony(&self, id: &CeremonyId) -> Result<Ceremony, CoreError> {
        self.ceremonies
            .get(id.as_str())
            .map(|r| r.clone())
            .ok_or_else(|| CoreError::NotFound(format!("ceremony {id}")))
    }

    async fn list_ceremonies(&self) -> Result<Vec<Ceremony>, CoreError> {
        Ok(self.ceremonies.iter().map(|r| r.clone()).collect())
    }

    async fn mutate_ceremony(
        &self,
        id: &CeremonyId,
        mutation: CeremonyMutation,
    ) -> Result<Ceremony, CoreError> {
        let mut entry = self
            .ceremonies
            .get_mut(id.as_str())
            .ok_or_else(|| CoreError::NotFound(format!("ceremony {id}")))?;
        let mut draft = entry.clone();
        mutation(&mut draft)?;
        *entry = draft.clone();
        Ok(draft)
    }

    async fn create_circuit(&self, circuit: Circuit) -> Result<(), CoreError> {
        let key = Self::circuit_key(&circuit.ceremony_id, &circuit.id);
        if self.circuits.contains_key(&key) {
            return Err(CoreError::Conflict(format!("circuit {} already exists", circuit.id)));
        }
        self.circuits.insert(key, circuit);
        Ok(())
    }

    async fn get_circuit(
        &self,
        ceremony_id: &CeremonyId,
        circuit_id: &CircuitId,
    ) -> Result<Circuit, CoreError> {
        self.circuits
            .get(&Self::circuit_key(ceremony_id, circuit_id))
            .map(|r| r.clone())
            .ok_or_else(|| CoreError::NotFound(format!("circuit {circuit_id}")))
    }

    async fn list_circuits(&self, ceremony_id: &CeremonyId) -> Result<Vec<Circuit>, CoreError> {
        let mut circuits: Vec<Circuit> = self
            .circuits
            .iter()
            .filter(|r| r.ceremony_id == *ceremony_id)
            .map(|r| r.clone())
            .collect();
        circuits.sort_by_key(|c| c.sequence_position);
        Ok(circuits)
    }

    async fn mutate_circuit(
        &self,
        ceremony_id: &CeremonyId,
        circuit_id: &CircuitId,
        mutation: CircuitMutation,
    ) -> Result<Circuit, CoreError> {
        let key = Self::circuit_key(ceremony_id, circuit_id);
        let mut entry = self
            .circuits
            .get_mut(&key)
            .ok_or_else(|| CoreError::NotFound(format!("circuit {circuit_id}")))?;
        let mut draft = entry.clone();
        mutation(&mut draft)?;
        *entry = draft.clone();
        Ok(draft)
    }

    async fn create_participant(&self, participant: Participant) -> Result<(), CoreError> {
        let key = Self::participant_key(&participant.ceremony_id, &participant.id);
        if self.participants.contains_key(&key) {
            return Err(CoreError::Conflict(format!(
                "participant {} already exists",
                participant.id
            )));
        }
        self.participants.insert(key, participant);
        Ok(())
    }

    async fn get_participant(
        &self,
        ceremony_id: &CeremonyId,
        participant_id: &ParticipantId,
    ) -> Result<Participant, CoreError> {
        self.participants
            .get(&Self::participant_key(ceremony_id, participant_id))
            .map(|r| r.clone())
            .ok_or_else(|| CoreError::NotFound(format!("participant {participant_id}")))
    }

    async fn list_participants(
        &self,
        ceremony_id: &CeremonyId,
    ) -> Result<Vec<Participant>, CoreError> {
        Ok(self
            .participants
            .iter()
            .filter(|r| r.ceremony_id == *ceremony_id)
            .map(|r| r.clone())
            .collect())
    }

    async fn mutate_participant(
        &self,
        ceremony_id: &CeremonyId,
        participant_id: &ParticipantId,
        mutation: ParticipantMutation,
    ) -> Result<Participant, CoreError> {
        let key = Self::participant_key(ceremony_id, participant_id);
        let mut entry = self
            .participants
            .get_mut(&key)
            .ok_or_else(|| CoreError::NotFound(format!("participant {participant_id}")))?;
        let mut draft = entry.clone();
        mutation(&mut draft)?;
        *entry = draft.clone();
        Ok(draft)
    }

    async fn get_contribution(&self, id: &ContributionId) -> Result<Contribution, CoreError> {
        self.contributions
            .get(id.as_str())
            .map(|r| r.clone())
            .ok_or_else(|| CoreError::NotFound(format!("contribution {id}")))
    }

    async fn list_contributions_for_circuit(
        &self,
        circuit_id: &CircuitId,
    ) -> Result<Vec<Contribution>, CoreError> {
        let mut contributions: Vec<Contribution> = self
            .contributions
            .iter()
            .filter(|r| r.circuit_id == *circuit_id)
            .map(|r| r.clone())
            .collect();
        contributions.sort_by_key(|c| c.created_at);
        Ok(contributions)
    }

    async fn create_timeout(&self, timeout: Timeout) -> Result<(), CoreError> {
        self.timeouts
            .entry(timeout.participant_id.as_str().to_string())
            .or_default()
            .push(timeout);
        Ok(())
    }

    async fn active_timeout(
        &self,
        participant_id: &ParticipantId,
        now: DateTime<Utc>,
    ) -> Result<Option<Timeout>, CoreError> {
        Ok(self
            .timeouts
            .get(participant_id.as_str())
            .and_then(|list| list.iter().filter(|t| t.is_active(now)).max_by_key(|t| t.end_date).cloned()))
    }

    async fn commit_verification_batch(
        &self,
        batch: VerificationBatch,
    ) -> Result<Contribution, CoreError> {
        let circuit_key = Self::circuit_key(&batch.ceremony_id, &batch.circuit_id);
        let participant_key = Self::participant_key(&batch.ceremony_id, &batch.participant_id);

        let mut circuit_entry = self
            .circuits
            .get_mut(&circuit_key)
            .ok_or_else(|| CoreError::NotFound(format!("circuit {}", batch.circuit_id)))?;
        let mut participant_entry = self
            .participants
            .get_mut(&participant_key)
            .ok_or_else(|| CoreError::NotFound(format!("participant {}", batch.participant_id)))?;

        let mut circuit_draft = circuit_entry.clone();
        (batch.circuit_mutation)(&mut circuit_draft)?;
        let mut participant_draft = participant_entry.clone();
        (batch.participant_mutation)(&mut participant_draft)?;

        // Both mutation closures succeeded: commit all three writes together
        // so a reader of the counter also observes the Contribution that
        // produced it.
        *circuit_entry = circuit_draft;
        *participant_entry = participant_draft;
        self.contributions
            .insert(batch.contribution.id.as_str().to_string(), batch.contribution.clone());

        Ok(batch.contribution)
    }

    async fn commit_finalization_batch(
        &self,
        batch: FinalizationBatch,
    ) -> Result<Contribution, CoreError> {
        let circuit_key = Self::circuit_key(&batch.ceremony_id, &batch.circuit_id);

        let mut circuit_entry = self
            .circuits
            .get_mut(&circuit_key)
            .ok_or_else(|| CoreError::NotFound(format!("circuit {}", batch.circuit_id)))?;

        let mut circuit_draft = circuit_entry.clone();
        (batch.circuit_mutation)(&mut circuit_draft)?;

        *circuit_entry = circuit_draft;
        self.contributions
            .insert(batch.contribution.id.as_str().to_string(), batch.contribution.clone());

        Ok(batch.contribution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{CeremonyState, TimeoutMechanism};

    fn sample_ceremony() -> Ceremony {
        let now = Utc::now();
        Ceremony {
            id: CeremonyId::from("c1"),
            prefix: "small".into(),
            title: "t".into(),
            description: "d".into(),
            start_date: now,
            end_date: now + chrono::Duration::hours(1),
            state: CeremonyState::Opened,
            coordinator_id: "coord".into(),
            timeout_mechanism: TimeoutMechanism::Fixed,
            penalty_secs: 30,
            penalty_multiplier: 2.0,
            bucket_name: "small-ceremony".into(),
        }
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let store = InMemoryMetaStore::new();
        store.create_ceremony(sample_ceremony()).await.unwrap();
        let fetched = store.get_ceremony(&CeremonyId::from("c1")).await.unwrap();
        assert_eq!(fetched.prefix, "small");
    }

    #[tokio::test]
    async fn duplicate_create_conflicts() {
        let store = InMemoryMetaStore::new();
        store.create_ceremony(sample_ceremony()).await.unwrap();
        assert!(store.create_ceremony(sample_ceremony()).await.is_err());
    }

    #[tokio::test]
    async fn mutation_failure_leaves_document_untouched() {
        let store = InMemoryMetaStore::new();
        store.create_ceremony(sample_ceremony()).await.unwrap();
        let result = store
            .mutate_ceremony(
                &CeremonyId::from("c1"),
                Box::new(|c| {
                    c.title = "mutated".to_string();
                    Err(CoreError::Internal("boom".to_string()))
                }),
            )
            .await;
        assert!(result.is_err());
        let fetched = store.get_ceremony(&CeremonyId::from("c1")).await.unwrap();
        assert_eq!(fetched.title, "t");
    }

    #[tokio::test]
    async fn active_timeout_respects_inclusive_boundary() {
        let store = InMemoryMetaStore::new();
        let now = Utc::now();
        store
            .create_timeout(Timeout {
                participant_id: ParticipantId::from("alice"),
                kind: shared_types::TimeoutType::BlockingContribution,
                start_date: now,
                end_date: now,
            })
            .await
            .unwrap();
        let active = store.active_timeout(&ParticipantId::from("alice"), now).await.unwrap();
        assert!(active.is_some());
    }
}

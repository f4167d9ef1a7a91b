//! The async `Scheduler` service: wires the pure queue and
//! timeout logic in this crate to `MetaStore`/`BlobStore`/`shared-bus`.
//!
//! Every public method here is one "head-of-queue operation":
//! admission, hand-off, and timeout enforcement are each expressed
//! as a `MetaStore::mutate_circuit` call so a conforming `MetaStore`
//! serializes them per circuit. Promoting the new head's participant state
//! is a second, sequential store call — not bundled into the same
//! optimistic transaction as the queue mutation, a deliberate
//! simplification recorded in DESIGN.md.

use crate::errors::SchedulerError;
use crate::{queue, timeout};
use ceremony_ports::{CoreError, MetaStore};
use chrono::Utc;
use shared_bus::{CeremonyEvent, EventPublisher};
use shared_types::{CeremonyId, Circuit, CircuitId, ParticipantId, Timeout, TimeoutType};
use std::sync::Arc;
use tracing::{info, warn};

pub struct Scheduler {
    meta_store: Arc<dyn MetaStore>,
    blob_store: Arc<dyn ceremony_ports::BlobStore>,
    event_bus: Arc<dyn EventPublisher>,
}

impl Scheduler {
    pub fn new(
        meta_store: Arc<dyn MetaStore>,
        blob_store: Arc<dyn ceremony_ports::BlobStore>,
        event_bus: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            meta_store,
            blob_store,
            event_bus,
        }
    }

    /// Admits a participant whose `status` just became `READY` for circuit
    /// `circuit_id`. If the queue was empty, promotes the
    /// participant to `CONTRIBUTING, step=DOWNLOADING` in a follow-up call.
    pub async fn admit(
        &self,
        ceremony_id: &CeremonyId,
        circuit_id: &CircuitId,
        participant_id: &ParticipantId,
    ) -> Result<(), SchedulerError> {
        let pid = participant_id.clone();
        let circuit = self
            .meta_store
            .mutate_circuit(
                ceremony_id,
                circuit_id,
                Box::new(move |circuit: &mut Circuit| {
                    queue::admit(&mut circuit.waiting_queue, pid);
                    Ok(())
                }),
            )
            .await
            .map_err(SchedulerError::Store)?;

        if circuit.waiting_queue.current_contributor.as_ref() == Some(participant_id) {
            self.promote(ceremony_id, circuit_id, participant_id).await?;
        }

        info!(
            ceremony_id = %ceremony_id,
            circuit_id = %circuit_id,
            participant_id = %participant_id,
            "admitted participant to waiting queue"
        );
        ceremony_telemetry::QUEUE_ADMISSIONS.inc();
        Ok(())
    }

    async fn promote(
        &self,
        ceremony_id: &CeremonyId,
        circuit_id: &CircuitId,
        participant_id: &ParticipantId,
    ) -> Result<(), SchedulerError> {
        let now = Utc::now();
        self.meta_store
            .mutate_participant(
                ceremony_id,
                participant_id,
                Box::new(move |participant| {
                    ceremony_statemachine::promote_to_contributing(participant, now)
                        .map_err(CoreError::from)
                }),
            )
            .await
            .map_err(SchedulerError::Store)?;

        self.event_bus
            .publish(CeremonyEvent::ParticipantPromotedToContributor {
                ceremony_id: ceremony_id.clone(),
                circuit_id: circuit_id.clone(),
                participant_id: participant_id.clone(),
            })
            .await;
        Ok(())
    }

    /// Hands the baton off from `leaving` to the next queued participant,
    /// if any.
    pub async fn hand_off(
        &self,
        ceremony_id: &CeremonyId,
        circuit_id: &CircuitId,
        leaving: &ParticipantId,
        valid: bool,
    ) -> Result<Option<ParticipantId>, SchedulerError> {
        let leaving_clone = leaving.clone();
        let circuit = self
            .meta_store
            .mutate_circuit(
                ceremony_id,
                circuit_id,
                Box::new(move |circuit: &mut Circuit| {
                    queue::hand_off(&mut circuit.waiting_queue, &leaving_clone, valid)
                        .map(|_| ())
                        .map_err(|e| CoreError::PreconditionFailed(e.to_string()))
                }),
            )
            .await
            .map_err(SchedulerError::Store)?;

        ceremony_telemetry::BATON_HANDOFFS
            .with_label_values(&[if valid { "valid" } else { "invalid" }])
            .inc();

        match circuit.waiting_queue.current_contributor.clone() {
            Some(new_head) => {
                self.promote(ceremony_id, circuit_id, &new_head).await?;
                Ok(Some(new_head))
            }
            None => Ok(None),
        }
    }

    /// Scans every circuit with a non-empty `currentContributor` and times
    /// out any whose deadline has passed. Intended to be driven by a
    /// `coordinator-runtime` tick every `scan_interval`, `>= 60s`.
    pub async fn enforce_timeouts(
        &self,
        ceremony_id: &CeremonyId,
    ) -> Result<Vec<ParticipantId>, SchedulerError> {
        let ceremony = self
            .meta_store
            .get_ceremony(ceremony_id)
            .await
            .map_err(SchedulerError::Store)?;
        let circuits = self
            .meta_store
            .list_circuits(ceremony_id)
            .await
            .map_err(SchedulerError::Store)?;

        let mut timed_out = Vec::new();
        for circuit in circuits {
            let Some(current) = circuit.waiting_queue.current_contributor.clone() else {
                continue;
            };
            let participant = self
                .meta_store
                .get_participant(ceremony_id, &current)
                .await
                .map_err(SchedulerError::Store)?;
            let Some(started_at) = participant.contribution_started_at else {
                continue;
            };
            let deadline = timeout::deadline_for(&ceremony, &circuit, started_at);
            if !timeout::is_overdue(deadline, Utc::now()) {
                continue;
            }

            self.fire_timeout(&ceremony_id.clone(), &circuit.id, &current, deadline)
                .await?;
            timed_out.push(current);
        }
        Ok(timed_out)
    }

    async fn fire_timeout(
        &self,
        ceremony_id: &CeremonyId,
        circuit_id: &CircuitId,
        participant_id: &ParticipantId,
        deadline: chrono::DateTime<Utc>,
    ) -> Result<(), SchedulerError> {
        let ceremony = self
            .meta_store
            .get_ceremony(ceremony_id)
            .await
            .map_err(SchedulerError::Store)?;
        let now = Utc::now();
        let endurance = chrono::Duration::seconds(ceremony.penalty_secs as i64);

        self.meta_store
            .create_timeout(Timeout {
                participant_id: participant_id.clone(),
                kind: TimeoutType::BlockingContribution,
                start_date: deadline,
                end_date: now + endurance,
            })
            .await
            .map_err(SchedulerError::Store)?;

        self.meta_store
            .mutate_participant(
                ceremony_id,
                participant_id,
                Box::new(|participant| ceremony_statemachine::timeout_participant(participant)),
            )
            .await
            .map_err(SchedulerError::Store)?;

        // Clean up any partial upload before handing off.
        let participant = self
            .meta_store
            .get_participant(ceremony_id, participant_id)
            .await
            .map_err(SchedulerError::Store)?;
        if let Some(upload_id) = &participant.temp_contribution_data.upload_id {
            let circuit = self
                .meta_store
                .get_circuit(ceremony_id, circuit_id)
                .await
                .map_err(SchedulerError::Store)?;
            let object_key = format!(
                "circuits/{}/contributions/{}_{}.zkey",
                circuit.prefix,
                circuit.prefix,
                queue::next_zkey_index(&circuit.waiting_queue)
            );
            if let Err(e) = self
                .blob_store
                .abort_multipart_upload(&ceremony.bucket_name, &object_key, upload_id)
                .await
            {
                warn!(error = %e, "failed to abort partial upload during timeout cleanup");
            }
        }

        self.hand_off(ceremony_id, circuit_id, participant_id, false)
            .await?;

        self.event_bus
            .publish(CeremonyEvent::ParticipantTimedOut {
                ceremony_id: ceremony_id.clone(),
                circuit_id: circuit_id.clone(),
                participant_id: participant_id.clone(),
            })
            .await;
        ceremony_telemetry::TIMEOUTS_FIRED
            .with_label_values(&[match ceremony.timeout_mechanism {
                shared_types::TimeoutMechanism::Fixed => "fixed",
                shared_types::TimeoutMechanism::Dynamic => "dynamic",
            }])
            .inc();
        Ok(())
    }

    /// Re-admits a `TIMEDOUT` participant once their active Timeout has
    /// expired, preserving `contribution_progress`. Re-entry
    /// is always at the tail, never the head (tie-break rule).
    pub async fn resume_after_timeout(
        &self,
        ceremony_id: &CeremonyId,
        participant_id: &ParticipantId,
    ) -> Result<(), SchedulerError> {
        let has_active = self
            .meta_store
            .active_timeout(participant_id, Utc::now())
            .await
            .map_err(SchedulerError::Store)?
            .is_some();

        let participant = self
            .meta_store
            .mutate_participant(
                ceremony_id,
                participant_id,
                Box::new(move |participant| {
                    ceremony_statemachine::resume_after_timeout(participant, has_active)
                }),
            )
            .await
            .map_err(SchedulerError::Store)?;

        let circuits = self
            .meta_store
            .list_circuits(ceremony_id)
            .await
            .map_err(SchedulerError::Store)?;
        let Some(circuit) = circuits
            .into_iter()
            .find(|c| c.sequence_position == participant.contribution_progress + 1)
        else {
            return Err(SchedulerError::Store(CoreError::NotFound(
                "no circuit at participant's next sequence position".to_string(),
            )));
        };

        self.admit(ceremony_id, &circuit.id, participant_id).await
    }
}

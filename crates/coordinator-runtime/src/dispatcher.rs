//! `Dispatcher`: the in-process façade over a `CoordinatorContainer`.
//!
//! `ceremony-api-gateway`'s `routes.rs` handlers are the HTTP-shaped
//! version of this same call sequence (auth extraction, path/body
//! decoding, then exactly these calls). `Dispatcher` exists so
//! `integration-tests` can drive a ceremony end to end without standing up
//! an HTTP server, by calling straight through to the wired services —
//! the same event-dispatch wiring the gateway sits on
//! top of.

use ceremony_ports::{BlobStore, CoreError, MetaStore};
use ceremony_setup::CeremonySetupInput;
use chrono::Utc;
use shared_types::{Ceremony, CeremonyId, Circuit, CircuitId, Contribution, Participant, ParticipantId, ParticipantStatus};
use std::sync::Arc;

use crate::container::CoordinatorContainer;

pub struct Dispatcher {
    meta_store: Arc<dyn MetaStore>,
    blob_store: Arc<dyn BlobStore>,
    setup: Arc<ceremony_setup::Setup>,
    finalizer: Arc<ceremony_finalizer::Finalizer>,
    upload: Arc<ceremony_upload::UploadCoordinator>,
    verifier: Arc<ceremony_verifier::Verifier>,
    scheduler: Arc<ceremony_scheduler::Scheduler>,
}

impl Dispatcher {
    pub fn new(container: &CoordinatorContainer) -> Self {
        Self {
            meta_store: Arc::clone(&container.meta_store),
            blob_store: Arc::clone(&container.blob_store),
            setup: Arc::clone(&container.setup),
            finalizer: Arc::clone(&container.finalizer),
            upload: Arc::clone(&container.upload),
            verifier: Arc::clone(&container.verifier),
            scheduler: Arc::clone(&container.scheduler),
        }
    }

    async fn circuit_at_progress(&self, ceremony_id: &CeremonyId, progress: u32) -> Result<Circuit, CoreError> {
        let circuits = self.meta_store.list_circuits(ceremony_id).await?;
        circuits
            .into_iter()
            .find(|c| c.sequence_position == progress)
            .ok_or_else(|| CoreError::NotFound(format!("no circuit at sequence position {progress}")))
    }

    pub async fn setup_ceremony(&self, input: CeremonySetupInput) -> Result<Ceremony, CoreError> {
        self.setup.setup_ceremony(input).await.map_err(Into::into)
    }

    pub async fn create_bucket(&self, bucket: &str) -> Result<(), CoreError> {
        self.blob_store.create_bucket(bucket, ceremony_ports::CorsConfig::default()).await
    }

    /// RPC `checkParticipantForCeremony`: creates the participant on first
    /// contact, marks it ready, and admits it onto its first circuit's
    /// queue once ready.
    pub async fn check_participant_for_ceremony(
        &self,
        ceremony_id: &CeremonyId,
        participant_id: &ParticipantId,
    ) -> Result<Participant, CoreError> {
        let ceremony = self.meta_store.get_ceremony(ceremony_id).await?;

        match self.meta_store.get_participant(ceremony_id, participant_id).await {
            Ok(_) => {}
            Err(CoreError::NotFound(_)) => {
                self.meta_store
                    .create_participant(Participant::new(ceremony_id.clone(), participant_id.clone(), Utc::now()))
                    .await?;
            }
            Err(other) => return Err(other),
        }

        let has_active_timeout = self.meta_store.active_timeout(participant_id, Utc::now()).await?.is_some();

        let participant = self
            .meta_store
            .mutate_participant(
                ceremony_id,
                participant_id,
                Box::new(move |p| {
                    match p.status {
                        ParticipantStatus::Created => ceremony_statemachine::join_ceremony(p, &ceremony)?,
                        ParticipantStatus::Waiting => ceremony_statemachine::mark_ready(p, &ceremony, has_active_timeout)?,
                        _ => {}
                    }
                    Ok(())
                }),
            )
            .await?;

        if participant.status == ParticipantStatus::Ready {
            if let Ok(circuit) = self.circuit_at_progress(ceremony_id, participant.contribution_progress + 1).await {
                self.scheduler.admit(ceremony_id, &circuit.id, participant_id).await?;
            }
        }

        Ok(participant)
    }

    /// RPC `progressToNextCircuitForContribution`.
    pub async fn progress_to_next_circuit_for_contribution(
        &self,
        ceremony_id: &CeremonyId,
        participant_id: &ParticipantId,
    ) -> Result<Participant, CoreError> {
        let total_circuits = self.meta_store.list_circuits(ceremony_id).await?.len() as u32;

        let participant = self
            .meta_store
            .mutate_participant(
                ceremony_id,
                participant_id,
                Box::new(move |p| {
                    ceremony_statemachine::complete_circuit(p, total_circuits, Utc::now())?;
                    Ok(())
                }),
            )
            .await?;

        if participant.status == ParticipantStatus::Waiting {
            if let Ok(circuit) = self.circuit_at_progress(ceremony_id, participant.contribution_progress + 1).await {
                self.scheduler.admit(ceremony_id, &circuit.id, participant_id).await?;
            }
        }

        Ok(participant)
    }

    /// RPC `progressToNextContributionStep`.
    pub async fn progress_to_next_contribution_step(
        &self,
        ceremony_id: &CeremonyId,
        participant_id: &ParticipantId,
        target: shared_types::ContributionStep,
    ) -> Result<Participant, CoreError> {
        self.meta_store
            .mutate_participant(
                ceremony_id,
                participant_id,
                Box::new(move |p| {
                    ceremony_statemachine::advance_contribution_step(p, target)?;
                    Ok(())
                }),
            )
            .await
    }

    /// RPC `permanentlyStoreCurrentContributionTimeAndHash`.
    pub async fn permanently_store_contribution_time_and_hash(
        &self,
        ceremony_id: &CeremonyId,
        participant_id: &ParticipantId,
        contribution_computation_time_secs: u64,
        last_zkey_hash: String,
    ) -> Result<Participant, CoreError> {
        self.meta_store
            .mutate_participant(
                ceremony_id,
                participant_id,
                Box::new(move |p| {
                    p.temp_contribution_data.contribution_computation_time_secs = Some(contribution_computation_time_secs);
                    p.temp_contribution_data.last_zkey_hash = Some(last_zkey_hash.clone());
                    Ok(())
                }),
            )
            .await
    }

    /// RPC `resumeContributionAfterTimeoutExpiration`.
    pub async fn resume_contribution_after_timeout_expiration(
        &self,
        ceremony_id: &CeremonyId,
        participant_id: &ParticipantId,
    ) -> Result<(), CoreError> {
        self.scheduler.resume_after_timeout(ceremony_id, participant_id).await.map_err(Into::into)
    }

    pub async fn open_multi_part_upload(
        &self,
        ceremony_id: &CeremonyId,
        participant_id: &ParticipantId,
        bucket: &str,
        object_key: &str,
    ) -> Result<String, CoreError> {
        self.upload.open_upload(ceremony_id, participant_id, bucket, object_key).await.map_err(Into::into)
    }

    pub async fn generate_pre_signed_urls_parts(
        &self,
        ceremony_id: &CeremonyId,
        participant_id: &ParticipantId,
        bucket: &str,
        object_key: &str,
        upload_id: &str,
        number_of_parts: u32,
    ) -> Result<Vec<String>, CoreError> {
        self.upload
            .sign_parts(ceremony_id, participant_id, bucket, object_key, upload_id, number_of_parts)
            .await
            .map_err(Into::into)
    }

    pub async fn temporary_store_uploaded_chunk_data(
        &self,
        ceremony_id: &CeremonyId,
        participant_id: &ParticipantId,
        bucket: &str,
        object_key: &str,
        chunk: shared_types::UploadedChunk,
    ) -> Result<(), CoreError> {
        self.upload.store_chunk(ceremony_id, participant_id, bucket, object_key, chunk).await.map_err(Into::into)
    }

    pub async fn complete_multi_part_upload(
        &self,
        ceremony_id: &CeremonyId,
        participant_id: &ParticipantId,
        bucket: &str,
        object_key: &str,
        upload_id: &str,
        parts: Vec<shared_types::UploadedChunk>,
    ) -> Result<String, CoreError> {
        self.upload
            .complete_upload(ceremony_id, participant_id, bucket, object_key, upload_id, parts)
            .await
            .map_err(Into::into)
    }

    /// RPC `verifyContribution`.
    pub async fn verify_contribution(
        &self,
        ceremony_id: &CeremonyId,
        circuit_id: &CircuitId,
        participant_id: &ParticipantId,
    ) -> Result<Contribution, CoreError> {
        self.verifier.verify_current_contribution(ceremony_id, circuit_id, participant_id).await.map_err(Into::into)
    }

    pub async fn finalize_circuit(&self, ceremony_id: &CeremonyId, circuit_id: &CircuitId) -> Result<Contribution, CoreError> {
        self.finalizer.finalize_circuit(ceremony_id, circuit_id).await.map_err(Into::into)
    }

    pub async fn finalize_ceremony(&self, ceremony_id: &CeremonyId) -> Result<Ceremony, CoreError> {
        self.finalizer.finalize_ceremony(ceremony_id).await.map_err(Into::into)
    }

    /// RPC `checkAndPrepareCoordinatorForFinalization`.
    pub async fn check_and_prepare_coordinator_for_finalization(&self, ceremony_id: &CeremonyId) -> Result<Ceremony, CoreError> {
        let now = Utc::now();
        self.meta_store
            .mutate_ceremony(
                ceremony_id,
                Box::new(move |ceremony| {
                    ceremony_statemachine::close_if_due(ceremony, now)?;
                    Ok(())
                }),
            )
            .await
    }
}

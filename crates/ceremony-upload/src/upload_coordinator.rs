//! The async `UploadCoordinator` service: the resumable
//! multi-part upload protocol a current contributor uses to deliver its
//! new zkey, gated by the precondition checks in `preconditions.rs`.

use crate::errors::UploadError;
use crate::preconditions;
use ceremony_ports::{retry_upstream, BlobStore, CoreError, MetaStore, RetryPolicy};
use shared_bus::{CeremonyEvent, EventPublisher};
use shared_types::{CeremonyId, Circuit, ContributionStep, ParticipantId, UploadedChunk};
use std::sync::Arc;
use tracing::info;

/// Process-wide upload configuration.
#[derive(Debug, Clone, Copy)]
pub struct UploadConfig {
    /// Part size a client should chunk its upload into. Informational for
    /// the coordinator; the number of parts is whatever the client signs.
    pub stream_chunk_size_mb: u32,
    /// TTL in seconds for each signed part URL.
    pub presigned_url_ttl_secs: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            stream_chunk_size_mb: 128,
            presigned_url_ttl_secs: 900,
        }
    }
}

pub struct UploadCoordinator {
    meta_store: Arc<dyn MetaStore>,
    blob_store: Arc<dyn BlobStore>,
    event_bus: Arc<dyn EventPublisher>,
    config: UploadConfig,
    retry_policy: RetryPolicy,
}

impl UploadCoordinator {
    pub fn new(
        meta_store: Arc<dyn MetaStore>,
        blob_store: Arc<dyn BlobStore>,
        event_bus: Arc<dyn EventPublisher>,
        config: UploadConfig,
    ) -> Self {
        Self {
            meta_store,
            blob_store,
            event_bus,
            config,
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Retries a `BlobStore` call with this coordinator's bounded
    /// exponential-backoff policy, folding each retry into
    /// `UPLOAD_RETRIES`.
    async fn blob_call<T, F, Fut>(&self, operation: &'static str, op: F) -> Result<T, CoreError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        retry_upstream(self.retry_policy, "upload", operation, || ceremony_telemetry::UPLOAD_RETRIES.inc(), op).await
    }

    /// Loads the ceremony, the participant, and the circuit currently
    /// being contributed to (`sequence_position == contribution_progress`)
    /// and runs the shared precondition check against `(bucket,
    /// object_key)`.
    async fn validate(
        &self,
        ceremony_id: &CeremonyId,
        participant_id: &ParticipantId,
        bucket: &str,
        object_key: &str,
    ) -> Result<Circuit, UploadError> {
        let ceremony = self.meta_store.get_ceremony(ceremony_id).await.map_err(UploadError::Store)?;
        let participant = self
            .meta_store
            .get_participant(ceremony_id, participant_id)
            .await
            .map_err(UploadError::Store)?;
        let circuits = self.meta_store.list_circuits(ceremony_id).await.map_err(UploadError::Store)?;
        let circuit = circuits
            .into_iter()
            .find(|c| c.sequence_position == participant.contribution_progress)
            .ok_or_else(|| {
                UploadError::PreconditionFailed("no circuit at participant's current progress".to_string())
            })?;

        preconditions::check(&participant, &circuit, &ceremony.bucket_name, bucket, object_key)?;
        Ok(circuit)
    }

    /// Opens (or resumes) a multi-part upload session and
    /// persists its `uploadId` into `tempContributionData.uploadId`.
    pub async fn open_upload(
        &self,
        ceremony_id: &CeremonyId,
        participant_id: &ParticipantId,
        bucket: &str,
        object_key: &str,
    ) -> Result<String, UploadError> {
        self.validate(ceremony_id, participant_id, bucket, object_key).await?;

        let upload_id = self
            .blob_call("open_multipart_upload", || self.blob_store.open_multipart_upload(bucket, object_key))
            .await
            .map_err(UploadError::Store)?;

        self.store_upload_id(ceremony_id, participant_id, bucket, object_key, &upload_id)
            .await?;

        ceremony_telemetry::UPLOADS_OPENED.inc();
        info!(ceremony_id = %ceremony_id, participant_id = %participant_id, %upload_id, "opened multi-part upload");
        Ok(upload_id)
    }

    /// Explicit RPC `temporaryStoreCurrentContributionMultiPartUploadId`:
    /// persists `upload_id` on the participant, idempotently.
    pub async fn store_upload_id(
        &self,
        ceremony_id: &CeremonyId,
        participant_id: &ParticipantId,
        bucket: &str,
        object_key: &str,
        upload_id: &str,
    ) -> Result<(), UploadError> {
        self.validate(ceremony_id, participant_id, bucket, object_key).await?;

        let upload_id = upload_id.to_string();
        self.meta_store
            .mutate_participant(
                ceremony_id,
                participant_id,
                Box::new(move |participant| {
                    participant.temp_contribution_data.upload_id = Some(upload_id);
                    Ok(())
                }),
            )
            .await
            .map_err(UploadError::Store)?;
        Ok(())
    }

    /// Signs `number_of_parts` PUT URLs for the session.
    pub async fn sign_parts(
        &self,
        ceremony_id: &CeremonyId,
        participant_id: &ParticipantId,
        bucket: &str,
        object_key: &str,
        upload_id: &str,
        number_of_parts: u32,
    ) -> Result<Vec<String>, UploadError> {
        self.validate(ceremony_id, participant_id, bucket, object_key).await?;

        self.blob_call("sign_upload_parts", || {
            self.blob_store.sign_upload_parts(bucket, object_key, upload_id, number_of_parts, self.config.presigned_url_ttl_secs)
        })
        .await
        .map_err(UploadError::Store)
    }

    /// RPC `temporaryStoreCurrentContributionUploadedChunkData`:
    /// records a reported `(partNumber, eTag)`. Re-submitting the same
    /// pair is a no-op.
    pub async fn store_chunk(
        &self,
        ceremony_id: &CeremonyId,
        participant_id: &ParticipantId,
        bucket: &str,
        object_key: &str,
        chunk: UploadedChunk,
    ) -> Result<(), UploadError> {
        self.validate(ceremony_id, participant_id, bucket, object_key).await?;

        self.meta_store
            .mutate_participant(
                ceremony_id,
                participant_id,
                Box::new(move |participant| {
                    let already_stored = participant
                        .temp_contribution_data
                        .chunks
                        .iter()
                        .any(|c| c.part_number == chunk.part_number && c.e_tag == chunk.e_tag);
                    if !already_stored {
                        participant.temp_contribution_data.chunks.push(chunk);
                    }
                    Ok(())
                }),
            )
            .await
            .map_err(UploadError::Store)?;

        ceremony_telemetry::CHUNKS_STORED.inc();
        Ok(())
    }

    /// Completes the upload, clears the scratch data, and
    /// advances the participant's step `UPLOADING -> VERIFYING`.
    pub async fn complete_upload(
        &self,
        ceremony_id: &CeremonyId,
        participant_id: &ParticipantId,
        bucket: &str,
        object_key: &str,
        upload_id: &str,
        parts: Vec<UploadedChunk>,
    ) -> Result<String, UploadError> {
        self.validate(ceremony_id, participant_id, bucket, object_key).await?;

        let location = self
            .blob_call("complete_multipart_upload", || {
                self.blob_store.complete_multipart_upload(bucket, object_key, upload_id, parts.clone())
            })
            .await
            .map_err(UploadError::Store)?;

        self.meta_store
            .mutate_participant(
                ceremony_id,
                participant_id,
                Box::new(|participant| {
                    ceremony_statemachine::advance_contribution_step(
                        participant,
                        ContributionStep::Verifying,
                    )
                    .map_err(CoreError::from)?;
                    participant.temp_contribution_data.clear();
                    Ok(())
                }),
            )
            .await
            .map_err(UploadError::Store)?;

        let circuit_id = self.current_circuit_id(ceremony_id, participant_id).await?;
        self.event_bus
            .publish(CeremonyEvent::ParticipantStepAdvanced {
                ceremony_id: ceremony_id.clone(),
                circuit_id,
                participant_id: participant_id.clone(),
                step: ContributionStep::Verifying,
            })
            .await;

        ceremony_telemetry::UPLOADS_COMPLETED.inc();
        info!(ceremony_id = %ceremony_id, participant_id = %participant_id, %location, "completed multi-part upload");
        Ok(location)
    }

    async fn current_circuit_id(
        &self,
        ceremony_id: &CeremonyId,
        participant_id: &ParticipantId,
    ) -> Result<shared_types::CircuitId, UploadError> {
        let participant = self
            .meta_store
            .get_participant(ceremony_id, participant_id)
            .await
            .map_err(UploadError::Store)?;
        let circuits = self.meta_store.list_circuits(ceremony_id).await.map_err(UploadError::Store)?;
        circuits
            .into_iter()
            .find(|c| c.sequence_position == participant.contribution_progress)
            .map(|c| c.id)
            .ok_or_else(|| UploadError::PreconditionFailed("no circuit at participant's current progress".to_string()))
    }

    /// The already-uploaded `(partNumber, eTag)` set for a resuming client
    /// to diff against.
    pub async fn resumable_state(
        &self,
        ceremony_id: &CeremonyId,
        participant_id: &ParticipantId,
    ) -> Result<(Option<String>, Vec<UploadedChunk>), UploadError> {
        let participant = self
            .meta_store
            .get_participant(ceremony_id, participant_id)
            .await
            .map_err(UploadError::Store)?;
        Ok((
            participant.temp_contribution_data.upload_id,
            participant.temp_contribution_data.chunks,
        ))
    }

    pub fn config(&self) -> UploadConfig {
        self.config
    }
}

//! The async `Verifier` service: dispatches a contribution
//! to the configured backend, hashes and stores the transcript, commits the
//! atomic write batch, and triggers the Scheduler's baton hand-off.
//!
//! The hand-off's `completedContributions`/`failedContributions` counters
//! belong to `ceremony_scheduler::queue::hand_off` alone (see
//! `ceremony-scheduler/src/queue.rs`); this service's own `circuit_mutation`
//! only folds `avg_timings`, and step 7 calls `Scheduler::hand_off`
//! explicitly rather than incrementing the counters itself, avoiding a
//! double count of the same contribution.

use crate::dispatch::{VerificationBackend, VerifyRequest};
use crate::errors::VerifierError;
use crate::paths;
use ceremony_ports::{retry_upstream, BlobStore, CoreError, MetaStore, RetryPolicy, VerificationBatch};
use ceremony_scheduler::Scheduler;
use chrono::Utc;
use shared_bus::{CeremonyEvent, EventPublisher};
use shared_types::{
    CeremonyId, CircuitId, Contribution, ContributionFiles, ContributionId, ContributionStep,
    ParticipantId, ParticipantStatus, VerificationMechanism, ZkeyIndex,
};
use std::sync::Arc;
use tracing::info;

pub struct Verifier {
    meta_store: Arc<dyn MetaStore>,
    blob_store: Arc<dyn BlobStore>,
    scheduler: Arc<Scheduler>,
    event_bus: Arc<dyn EventPublisher>,
    cf_backend: Arc<dyn VerificationBackend>,
    vm_backend: Arc<dyn VerificationBackend>,
    retry_policy: RetryPolicy,
}

impl Verifier {
    pub fn new(
        meta_store: Arc<dyn MetaStore>,
        blob_store: Arc<dyn BlobStore>,
        scheduler: Arc<Scheduler>,
        event_bus: Arc<dyn EventPublisher>,
        cf_backend: Arc<dyn VerificationBackend>,
        vm_backend: Arc<dyn VerificationBackend>,
    ) -> Self {
        Self {
            meta_store,
            blob_store,
            scheduler,
            event_bus,
            cf_backend,
            vm_backend,
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Retries a `BlobStore` call with this verifier's bounded
    /// exponential-backoff policy, folding each retry into
    /// `VERIFICATION_RETRIES`.
    async fn blob_call<T, F, Fut>(&self, operation: &'static str, op: F) -> Result<T, CoreError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        retry_upstream(
            self.retry_policy,
            "verifier",
            operation,
            || ceremony_telemetry::VERIFICATION_RETRIES.inc(),
            op,
        )
        .await
    }

    /// Runs the full verification pipeline for the current contributor of
    /// `circuit_id`, triggered once the upload protocol advances the
    /// participant's step to `VERIFYING`.
    pub async fn verify_current_contribution(
        &self,
        ceremony_id: &CeremonyId,
        circuit_id: &CircuitId,
        participant_id: &ParticipantId,
    ) -> Result<Contribution, VerifierError> {
        let ceremony = self.meta_store.get_ceremony(ceremony_id).await.map_err(VerifierError::Store)?;
        let circuit = self.meta_store.get_circuit(ceremony_id, circuit_id).await.map_err(VerifierError::Store)?;
        let participant = self
            .meta_store
            .get_participant(ceremony_id, participant_id)
            .await
            .map_err(VerifierError::Store)?;
        let total_circuits = self.meta_store.list_circuits(ceremony_id).await.map_err(VerifierError::Store)?.len() as u32;

        if participant.status != ParticipantStatus::Contributing
            || participant.contribution_step != ContributionStep::Verifying
        {
            return Err(VerifierError::Store(CoreError::PreconditionFailed(format!(
                "participant {participant_id} is not CONTRIBUTING/VERIFYING (status={:?}, step={:?})",
                participant.status, participant.contribution_step
            ))));
        }

        let last_zkey_index = ZkeyIndex::format(circuit.waiting_queue.completed_contributions + 1);
        let last_zkey_key = paths::last_zkey_key(&circuit);
        let genesis_key = paths::genesis_zkey_key(&circuit);
        let pot_key = paths::pot_key(&circuit);
        let transcript_key = paths::transcript_key(&circuit, participant_id);

        let genesis_zkey = self
            .blob_call("get_genesis_zkey", || self.blob_store.get_object(&ceremony.bucket_name, &genesis_key))
            .await
            .map_err(VerifierError::Store)?;
        let pot = self
            .blob_call("get_pot", || self.blob_store.get_object(&ceremony.bucket_name, &pot_key))
            .await
            .map_err(VerifierError::Store)?;
        let last_zkey = self
            .blob_call("get_last_zkey", || self.blob_store.get_object(&ceremony.bucket_name, &last_zkey_key))
            .await
            .map_err(VerifierError::Store)?;

        let mechanism = circuit.verification.mechanism.unwrap_or(VerificationMechanism::Cf);
        let backend = match mechanism {
            VerificationMechanism::Cf => &self.cf_backend,
            VerificationMechanism::Vm => &self.vm_backend,
        };

        let dispatch_started = std::time::Instant::now();
        let result = backend
            .verify(VerifyRequest {
                genesis_zkey,
                pot,
                last_zkey: last_zkey.clone(),
                vm_instance_id: circuit.verification.vm_instance_id.clone(),
                vm_verify_command: format!(
                    "verify --circuit {} --zkey-index {}",
                    circuit.prefix, last_zkey_index
                ),
            })
            .await?;
        let verification_computation_time_secs = dispatch_started.elapsed().as_secs_f64();

        ceremony_telemetry::VERIFICATION_DURATION
            .with_label_values(&[if mechanism == VerificationMechanism::Cf { "cf" } else { "vm" }])
            .observe(verification_computation_time_secs);

        let last_zkey_hash = ceremony_crypto::blake2b512_hex(&last_zkey);
        let transcript_hash = ceremony_crypto::blake2b512_hex(&result.transcript);

        self.blob_call("put_transcript", || {
            self.blob_store
                .put_object(&ceremony.bucket_name, &transcript_key, result.transcript.clone())
        })
        .await
        .map_err(VerifierError::Store)?;

        let contribution_computation_time_secs = participant
            .contribution_started_at
            .map(|started| (Utc::now() - started).num_milliseconds() as f64 / 1000.0)
            .unwrap_or(0.0);

        let now = Utc::now();
        let contribution_id = ContributionId::from(shared_types::new_id());
        let contribution = Contribution {
            id: contribution_id.clone(),
            circuit_id: circuit_id.clone(),
            participant_id: participant_id.clone(),
            zkey_index: last_zkey_index,
            valid: result.valid,
            contribution_computation_time_secs,
            verification_computation_time_secs,
            files: ContributionFiles {
                last_zkey_storage_path: last_zkey_key,
                transcript_storage_path: transcript_key,
                last_zkey_blake2b_hash: last_zkey_hash,
                transcript_blake2b_hash: transcript_hash,
                verification_key_storage_path: None,
                verifier_contract_storage_path: None,
            },
            beacon: None,
            created_at: now,
            last_updated: now,
        };

        let valid = result.valid;
        let circuit_mutation = Box::new(move |circuit: &mut shared_types::Circuit| {
            if valid {
                circuit.avg_timings.fold_full_contribution(contribution_computation_time_secs);
                if mechanism == VerificationMechanism::Cf {
                    circuit.avg_timings.fold_verify(verification_computation_time_secs);
                }
            }
            Ok(())
        });

        let participant_mutation = Box::new(move |participant: &mut shared_types::Participant| {
            ceremony_statemachine::advance_contribution_step(participant, ContributionStep::Completed)
                .map_err(CoreError::from)?;
            ceremony_statemachine::complete_circuit(participant, total_circuits, now).map_err(CoreError::from)?;
            participant.contributions.push(contribution_id);
            Ok(())
        });

        let committed = self
            .meta_store
            .commit_verification_batch(VerificationBatch {
                ceremony_id: ceremony_id.clone(),
                circuit_id: circuit_id.clone(),
                participant_id: participant_id.clone(),
                contribution,
                circuit_mutation,
                participant_mutation,
            })
            .await
            .map_err(VerifierError::Store)?;

        // Counter increment and next-head promotion live in the Scheduler
        //; this call is the verification pipeline's trigger for it,
        // not a second writer of the same counters.
        self.scheduler
            .hand_off(ceremony_id, circuit_id, participant_id, committed.valid)
            .await?;

        self.event_bus
            .publish(CeremonyEvent::ContributionClassified {
                ceremony_id: ceremony_id.clone(),
                circuit_id: circuit_id.clone(),
                participant_id: participant_id.clone(),
                valid: committed.valid,
            })
            .await;

        ceremony_telemetry::CONTRIBUTIONS_VERIFIED
            .with_label_values(&[if committed.valid { "true" } else { "false" }])
            .inc();
        info!(
            ceremony_id = %ceremony_id,
            circuit_id = %circuit_id,
            participant_id = %participant_id,
            valid = committed.valid,
            "classified contribution"
        );

        Ok(committed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{InProcessBackend, VmBackend};
    use ceremony_adapters::{
        CannedZKeyEngine, InMemoryBlobStore, InMemoryComputeProvider, InMemoryMetaStore,
    };
    use ceremony_ports::CorsConfig;
    use shared_types::{
        AvgTimings, CeremonyState, Circuit, CircuitMetadata, Participant, TimeoutMechanism,
        VerificationConfig, WaitingQueue,
    };

    async fn setup() -> (Verifier, Arc<InMemoryMetaStore>, Arc<InMemoryBlobStore>, Arc<CannedZKeyEngine>, CeremonyId, CircuitId, ParticipantId) {
        let meta = Arc::new(InMemoryMetaStore::new());
        let blob = Arc::new(InMemoryBlobStore::new());
        let engine = Arc::new(CannedZKeyEngine::default());
        let compute = Arc::new(InMemoryComputeProvider::default());
        let event_bus = Arc::new(shared_bus::InMemoryEventBus::new());

        let ceremony_id = CeremonyId::from("c1");
        let circuit_id = CircuitId::from("circuit-1");
        let participant_id = ParticipantId::from("alice");

        let now = chrono::Utc::now();
        meta.create_ceremony(shared_types::Ceremony {
            id: ceremony_id.clone(),
            prefix: "small".into(),
            title: "t".into(),
            description: "d".into(),
            start_date: now - chrono::Duration::hours(1),
            end_date: now + chrono::Duration::hours(1),
            state: CeremonyState::Opened,
            coordinator_id: "coord".into(),
            timeout_mechanism: TimeoutMechanism::Fixed,
            penalty_secs: 60,
            penalty_multiplier: 2.0,
            bucket_name: "small-ceremony".into(),
        })
        .await
        .unwrap();
        blob.create_bucket("small-ceremony", CorsConfig::default()).await.unwrap();
        blob.put_object("small-ceremony", "circuits/small/contributions/small_00000.zkey", b"genesis".to_vec())
            .await
            .unwrap();
        blob.put_object("small-ceremony", "pot/pot_0.ptau", b"pot".to_vec()).await.unwrap();
        blob.put_object("small-ceremony", "circuits/small/contributions/small_00001.zkey", b"last".to_vec())
            .await
            .unwrap();

        let mut waiting_queue = WaitingQueue::default();
        waiting_queue.contributors.push(participant_id.clone());
        waiting_queue.current_contributor = Some(participant_id.clone());

        meta.create_circuit(Circuit {
            ceremony_id: ceremony_id.clone(),
            id: circuit_id.clone(),
            sequence_position: 1,
            prefix: "small".into(),
            metadata: CircuitMetadata::default(),
            zkey_size_bytes: 1024,
            fixed_time_window_secs: Some(60),
            waiting_queue,
            avg_timings: AvgTimings::default(),
            verification: VerificationConfig::default(),
        })
        .await
        .unwrap();

        let mut participant = Participant::new(ceremony_id.clone(), participant_id.clone(), now);
        participant.status = ParticipantStatus::Contributing;
        participant.contribution_step = ContributionStep::Verifying;
        participant.contribution_progress = 1;
        participant.contribution_started_at = Some(now);
        meta.create_participant(participant).await.unwrap();

        let scheduler = Arc::new(Scheduler::new(meta.clone(), blob.clone(), event_bus.clone()));
        let cf_backend = Arc::new(InProcessBackend::new(engine.clone()));
        let vm_backend = Arc::new(VmBackend::new(compute.clone()));

        let verifier = Verifier::new(meta.clone(), blob.clone(), scheduler, event_bus, cf_backend, vm_backend);
        (verifier, meta, blob, engine, ceremony_id, circuit_id, participant_id)
    }

    #[tokio::test]
    async fn valid_contribution_advances_progress_and_counters() {
        let (verifier, meta, _blob, _engine, ceremony_id, circuit_id, participant_id) = setup().await;

        let contribution = verifier
            .verify_current_contribution(&ceremony_id, &circuit_id, &participant_id)
            .await
            .unwrap();
        assert!(contribution.valid);
        assert_eq!(contribution.zkey_index.as_str(), "00001");

        let participant = meta.get_participant(&ceremony_id, &participant_id).await.unwrap();
        assert_eq!(participant.status, ParticipantStatus::Done);
        assert_eq!(participant.contribution_progress, 1);
        assert_eq!(participant.contributions.len(), 1);

        let circuit = meta.get_circuit(&ceremony_id, &circuit_id).await.unwrap();
        assert_eq!(circuit.waiting_queue.completed_contributions, 1);
        assert_eq!(circuit.waiting_queue.failed_contributions, 0);
        assert!(circuit.waiting_queue.current_contributor.is_none());
    }

    #[tokio::test]
    async fn invalid_contribution_still_advances_progress_but_fails_counter() {
        let (verifier, meta, _blob, engine, ceremony_id, circuit_id, participant_id) = setup().await;
        engine.set_next_verdict(false);

        let contribution = verifier
            .verify_current_contribution(&ceremony_id, &circuit_id, &participant_id)
            .await
            .unwrap();
        assert!(!contribution.valid);

        let participant = meta.get_participant(&ceremony_id, &participant_id).await.unwrap();
        assert_eq!(participant.contribution_progress, 1);

        let circuit = meta.get_circuit(&ceremony_id, &circuit_id).await.unwrap();
        assert_eq!(circuit.waiting_queue.completed_contributions, 0);
        assert_eq!(circuit.waiting_queue.failed_contributions, 1);
    }

    #[tokio::test]
    async fn wrong_step_is_rejected_without_mutation() {
        let (verifier, meta, _blob, _engine, ceremony_id, circuit_id, participant_id) = setup().await;
        meta.mutate_participant(
            &ceremony_id,
            &participant_id,
            Box::new(|p| {
                p.contribution_step = ContributionStep::Uploading;
                Ok(())
            }),
        )
        .await
        .unwrap();

        let result = verifier.verify_current_contribution(&ceremony_id, &circuit_id, &participant_id).await;
        assert!(result.is_err());
    }
}

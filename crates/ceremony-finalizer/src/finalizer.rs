//! The async `Finalizer` service: applies the public beacon
//! to each circuit's last valid zkey, exports the verifier contract and
//! vkey, verifies the result with the same dispatch backends the Verifier
//! uses, and once every circuit has landed moves the ceremony itself to
//! `FINALIZED`.

use crate::errors::FinalizerError;
use crate::paths;
use ceremony_ports::{
    retry_upstream, BlobStore, ComputeProvider, CoreError, FinalizationBatch, MetaStore,
    RetryPolicy, ZKeyEngine,
};
use ceremony_verifier::dispatch::{VerificationBackend, VerifyRequest};
use chrono::Utc;
use shared_bus::{CeremonyEvent, EventPublisher};
use shared_types::{
    Beacon, CeremonyId, CeremonyState, Circuit, CircuitId, Contribution, ContributionFiles,
    ContributionId, ParticipantId, VerificationMechanism, ZkeyIndex,
};
use std::sync::Arc;
use tracing::info;

/// The number of exponentiation iterations the beacon transform runs, and
/// the Solidity version the verifier contract targets.
pub const NUM_EXP_ITERATIONS: u32 = 10;
pub const SOLIDITY_VERSION: &str = "0.8.0";

pub struct Finalizer {
    meta_store: Arc<dyn MetaStore>,
    blob_store: Arc<dyn BlobStore>,
    zkey_engine: Arc<dyn ZKeyEngine>,
    compute: Arc<dyn ComputeProvider>,
    event_bus: Arc<dyn EventPublisher>,
    cf_backend: Arc<dyn VerificationBackend>,
    vm_backend: Arc<dyn VerificationBackend>,
    retry_policy: RetryPolicy,
}

impl Finalizer {
    pub fn new(
        meta_store: Arc<dyn MetaStore>,
        blob_store: Arc<dyn BlobStore>,
        zkey_engine: Arc<dyn ZKeyEngine>,
        compute: Arc<dyn ComputeProvider>,
        event_bus: Arc<dyn EventPublisher>,
        cf_backend: Arc<dyn VerificationBackend>,
        vm_backend: Arc<dyn VerificationBackend>,
    ) -> Self {
        Self {
            meta_store,
            blob_store,
            zkey_engine,
            compute,
            event_bus,
            cf_backend,
            vm_backend,
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Retries a `BlobStore`/`ComputeProvider`/`ZKeyEngine` call with this
    /// finalizer's bounded exponential-backoff policy.
    async fn upstream_call<T, F, Fut>(&self, operation: &'static str, op: F) -> Result<T, CoreError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        retry_upstream(self.retry_policy, "finalizer", operation, || ceremony_telemetry::FINALIZATION_RETRIES.inc(), op).await
    }

    /// Runs the full finalization sequence for one circuit: beacon, export,
    /// re-verify, commit. The ceremony must already be `CLOSED`.
    pub async fn finalize_circuit(
        &self,
        ceremony_id: &CeremonyId,
        circuit_id: &CircuitId,
    ) -> Result<Contribution, FinalizerError> {
        let ceremony = self.meta_store.get_ceremony(ceremony_id).await.map_err(FinalizerError::Store)?;
        if ceremony.state != CeremonyState::Closed {
            return Err(FinalizerError::Store(CoreError::PreconditionFailed(format!(
                "ceremony {ceremony_id} is not CLOSED (state={:?})",
                ceremony.state
            ))));
        }
        let circuit = self.meta_store.get_circuit(ceremony_id, circuit_id).await.map_err(FinalizerError::Store)?;

        let genesis_key = paths::genesis_zkey_key(&circuit);
        let pot_key = paths::pot_key(&circuit);
        let last_zkey_key = paths::last_valid_zkey_key(&circuit);

        let genesis_zkey = self
            .upstream_call("get_genesis_zkey", || self.blob_store.get_object(&ceremony.bucket_name, &genesis_key))
            .await
            .map_err(FinalizerError::Store)?;
        let pot = self
            .upstream_call("get_pot", || self.blob_store.get_object(&ceremony.bucket_name, &pot_key))
            .await
            .map_err(FinalizerError::Store)?;
        let last_valid_zkey = self
            .upstream_call("get_last_valid_zkey", || self.blob_store.get_object(&ceremony.bucket_name, &last_zkey_key))
            .await
            .map_err(FinalizerError::Store)?;

        let entropy_hex = ceremony_crypto::generate_beacon_hex();
        let entropy_bytes = hex::decode(&entropy_hex)
            .map_err(|e| FinalizerError::Store(CoreError::Internal(format!("beacon hex decode: {e}"))))?;

        let final_zkey = self
            .upstream_call("beacon", || {
                self.zkey_engine.beacon(&last_valid_zkey, &pot, &entropy_bytes, NUM_EXP_ITERATIONS)
            })
            .await
            .map_err(FinalizerError::Store)?;

        let exported = self
            .upstream_call("export_verifier_and_vkey", || {
                self.zkey_engine.export_verifier_and_vkey(&final_zkey, SOLIDITY_VERSION)
            })
            .await
            .map_err(FinalizerError::Store)?;

        let final_zkey_key = paths::final_zkey_key(&circuit);
        let vkey_key = paths::vkey_key(&circuit);
        let verifier_key = paths::verifier_contract_key(&circuit);
        let transcript_key = paths::final_transcript_key(&circuit, &ceremony.coordinator_id);

        self.upstream_call("put_final_zkey", || {
            self.blob_store.put_object(&ceremony.bucket_name, &final_zkey_key, final_zkey.clone())
        })
        .await
        .map_err(FinalizerError::Store)?;
        self.upstream_call("put_vkey", || {
            self.blob_store.put_object(&ceremony.bucket_name, &vkey_key, exported.vkey_json.clone())
        })
        .await
        .map_err(FinalizerError::Store)?;
        self.upstream_call("put_verifier_contract", || {
            self.blob_store.put_object(&ceremony.bucket_name, &verifier_key, exported.verifier_contract.clone())
        })
        .await
        .map_err(FinalizerError::Store)?;

        // The final zkey is re-verified with the same
        // dispatch algorithm the Verifier uses, against the now-public genesis
        // zkey it was beaconed from.
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
                last_zkey: final_zkey.clone(),
                vm_instance_id: circuit.verification.vm_instance_id.clone(),
                vm_verify_command: format!("verify --circuit {} --zkey-index final", circuit.prefix),
            })
            .await
            .map_err(FinalizerError::Verifier)?;
        let verification_computation_time_secs = dispatch_started.elapsed().as_secs_f64();

        let final_zkey_hash = ceremony_crypto::blake2b512_hex(&final_zkey);
        let transcript_hash = ceremony_crypto::blake2b512_hex(&result.transcript);
        self.upstream_call("put_transcript", || {
            self.blob_store.put_object(&ceremony.bucket_name, &transcript_key, result.transcript.clone())
        })
        .await
        .map_err(FinalizerError::Store)?;

        let now = Utc::now();
        let contribution = Contribution {
            id: ContributionId::from(shared_types::new_id()),
            circuit_id: circuit_id.clone(),
            participant_id: ParticipantId::from(ceremony.coordinator_id.clone()),
            zkey_index: ZkeyIndex::final_index(),
            valid: result.valid,
            contribution_computation_time_secs: 0.0,
            verification_computation_time_secs,
            files: ContributionFiles {
                last_zkey_storage_path: final_zkey_key,
                transcript_storage_path: transcript_key,
                last_zkey_blake2b_hash: final_zkey_hash,
                transcript_blake2b_hash: transcript_hash,
                verification_key_storage_path: Some(vkey_key),
                verifier_contract_storage_path: Some(verifier_key),
            },
            beacon: Some(Beacon {
                value_hex: entropy_hex,
                num_exp_iterations: NUM_EXP_ITERATIONS,
            }),
            created_at: now,
            last_updated: now,
        };

        let valid = result.valid;
        let circuit_mutation: ceremony_ports::CircuitMutation = Box::new(move |circuit: &mut Circuit| {
            if valid {
                circuit.avg_timings.fold_verify(verification_computation_time_secs);
            }
            Ok(())
        });

        let committed = self
            .meta_store
            .commit_finalization_batch(FinalizationBatch {
                ceremony_id: ceremony_id.clone(),
                circuit_id: circuit_id.clone(),
                contribution,
                circuit_mutation,
            })
            .await
            .map_err(FinalizerError::Store)?;

        self.event_bus
            .publish(CeremonyEvent::CircuitFinalized {
                ceremony_id: ceremony_id.clone(),
                circuit_id: circuit_id.clone(),
                valid: committed.valid,
            })
            .await;

        ceremony_telemetry::CIRCUITS_FINALIZED.inc();
        info!(ceremony_id = %ceremony_id, circuit_id = %circuit_id, valid = committed.valid, "finalized circuit");

        Ok(committed)
    }

    /// Once every circuit has a valid `zkeyIndex == "final"`
    /// contribution, moves the ceremony to `FINALIZED`, retires the
    /// coordinator's own participant record and any still-running VMs.
    pub async fn finalize_ceremony(&self, ceremony_id: &CeremonyId) -> Result<shared_types::Ceremony, FinalizerError> {
        let circuits = self.meta_store.list_circuits(ceremony_id).await.map_err(FinalizerError::Store)?;

        for circuit in &circuits {
            let contributions = self
                .meta_store
                .list_contributions_for_circuit(&circuit.id)
                .await
                .map_err(FinalizerError::Store)?;
            let has_valid_final = contributions.iter().any(|c| c.zkey_index.is_final() && c.valid);
            if !has_valid_final {
                return Err(FinalizerError::CircuitsNotAllFinalized);
            }
        }

        let ceremony = self
            .meta_store
            .mutate_ceremony(
                ceremony_id,
                Box::new(|ceremony| ceremony_statemachine::finalize(ceremony).map_err(CoreError::from)),
            )
            .await
            .map_err(FinalizerError::Store)?;

        let coordinator_id = ParticipantId::from(ceremony.coordinator_id.clone());
        match self
            .meta_store
            .mutate_participant(
                ceremony_id,
                &coordinator_id,
                Box::new(|p| ceremony_statemachine::finalize_coordinator(p).map_err(CoreError::from)),
            )
            .await
        {
            Ok(_) => {}
            Err(CoreError::NotFound(_)) => {
                // The coordinator never joined as a contributor; nothing to retire.
            }
            Err(other) => return Err(FinalizerError::Store(other)),
        }

        for circuit in &circuits {
            if let Some(instance_id) = &circuit.verification.vm_instance_id {
                self.upstream_call("terminate", || self.compute.terminate(instance_id))
                    .await
                    .map_err(FinalizerError::Store)?;
            }
        }

        self.event_bus
            .publish(CeremonyEvent::CeremonyFinalized {
                ceremony_id: ceremony_id.clone(),
            })
            .await;

        ceremony_telemetry::CEREMONIES_FINALIZED.inc();
        info!(ceremony_id = %ceremony_id, "finalized ceremony");

        Ok(ceremony)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ceremony_adapters::{CannedZKeyEngine, InMemoryBlobStore, InMemoryComputeProvider, InMemoryMetaStore};
    use ceremony_ports::CorsConfig;
    use ceremony_verifier::dispatch::{InProcessBackend, VmBackend};
    use shared_types::{
        AvgTimings, CircuitMetadata, TimeoutMechanism, VerificationConfig, WaitingQueue,
    };

    async fn setup() -> (Finalizer, Arc<InMemoryMetaStore>, Arc<InMemoryBlobStore>, Arc<CannedZKeyEngine>, CeremonyId, CircuitId) {
        let meta = Arc::new(InMemoryMetaStore::new());
        let blob = Arc::new(InMemoryBlobStore::new());
        let engine = Arc::new(CannedZKeyEngine::default());
        let compute = Arc::new(InMemoryComputeProvider::default());
        let event_bus = Arc::new(shared_bus::InMemoryEventBus::new());

        let ceremony_id = CeremonyId::from("c1");
        let circuit_id = CircuitId::from("circuit-1");

        let now = chrono::Utc::now();
        meta.create_ceremony(shared_types::Ceremony {
            id: ceremony_id.clone(),
            prefix: "small".into(),
            title: "t".into(),
            description: "d".into(),
            start_date: now - chrono::Duration::hours(2),
            end_date: now - chrono::Duration::hours(1),
            state: CeremonyState::Closed,
            coordinator_id: "coord".into(),
            timeout_mechanism: TimeoutMechanism::Fixed,
            penalty_secs: 60,
            penalty_multiplier: 2.0,
            bucket_name: "small-ceremony".into(),
        })
        .await
        .unwrap();
        blob.create_bucket("small-ceremony", CorsConfig::default()).await.unwrap();
        blob.put_object("small-ceremony", "circuits/small/contributions/small_00000.zkey", b"genesis".to_vec()).await.unwrap();
        blob.put_object("small-ceremony", "pot/pot_0.ptau", b"pot".to_vec()).await.unwrap();
        blob.put_object("small-ceremony", "circuits/small/contributions/small_00003.zkey", b"last".to_vec()).await.unwrap();

        let mut waiting_queue = WaitingQueue::default();
        waiting_queue.completed_contributions = 3;
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

        let cf_backend = Arc::new(InProcessBackend::new(engine.clone()));
        let vm_backend = Arc::new(VmBackend::new(compute.clone()));
        let finalizer = Finalizer::new(meta.clone(), blob.clone(), engine.clone(), compute, event_bus, cf_backend, vm_backend);
        (finalizer, meta, blob, engine, ceremony_id, circuit_id)
    }

    #[tokio::test]
    async fn finalize_circuit_commits_a_valid_final_contribution() {
        let (finalizer, _meta, blob, _engine, ceremony_id, circuit_id) = setup().await;
        let contribution = finalizer.finalize_circuit(&ceremony_id, &circuit_id).await.unwrap();
        assert!(contribution.valid);
        assert!(contribution.zkey_index.is_final());
        assert!(contribution.beacon.is_some());
        assert!(blob.object_exists("small-ceremony", "circuits/small/small_vkey.json").await.unwrap());
        assert!(blob.object_exists("small-ceremony", "circuits/small/small_verifier.sol").await.unwrap());
    }

    #[tokio::test]
    async fn finalize_ceremony_fails_until_every_circuit_is_final() {
        let (finalizer, _meta, _blob, _engine, ceremony_id, _circuit_id) = setup().await;
        let result = finalizer.finalize_ceremony(&ceremony_id).await;
        assert!(matches!(result, Err(FinalizerError::CircuitsNotAllFinalized)));
    }

    #[tokio::test]
    async fn finalize_ceremony_succeeds_once_every_circuit_landed() {
        let (finalizer, meta, _blob, _engine, ceremony_id, circuit_id) = setup().await;
        finalizer.finalize_circuit(&ceremony_id, &circuit_id).await.unwrap();

        let ceremony = finalizer.finalize_ceremony(&ceremony_id).await.unwrap();
        assert_eq!(ceremony.state, CeremonyState::Finalized);

        let stored = meta.get_ceremony(&ceremony_id).await.unwrap();
        assert_eq!(stored.state, CeremonyState::Finalized);
    }
}

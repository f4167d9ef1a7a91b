//! Shared scenario-test fixtures: a `CoordinatorContainer` wired with
//! concrete in-memory adapters (so tests can assert on stored documents and
//! drive `InMemoryBlobStore::simulate_part_upload`), plus helpers for the
//! call sequences a real client makes that span more than one RPC.

use ceremony_adapters::{CannedZKeyEngine, InMemoryBlobStore, InMemoryMetaStore};
use ceremony_ports::MetaStore;
use ceremony_setup::{CeremonySetupInput, CircuitSetupInput};
use coordinator_runtime::container::build::CoordinatorContainer;
use coordinator_runtime::container::config::RuntimeConfig;
use coordinator_runtime::Dispatcher;
use shared_types::{
    CeremonyId, CircuitMetadata, ParticipantId, ParticipantStatus, TimeoutMechanism,
    VerificationMechanism,
};
use std::sync::Arc;

pub struct Harness {
    pub container: CoordinatorContainer,
    pub dispatcher: Dispatcher,
    pub meta_store: Arc<InMemoryMetaStore>,
    pub blob_store: Arc<InMemoryBlobStore>,
    pub engine: Arc<CannedZKeyEngine>,
}

impl Harness {
    pub fn new() -> Self {
        let meta_store = Arc::new(InMemoryMetaStore::new());
        let blob_store = Arc::new(InMemoryBlobStore::new());
        let engine = Arc::new(CannedZKeyEngine::new());

        let container = CoordinatorContainer::build_with_collaborators(
            RuntimeConfig::default(),
            meta_store.clone(),
            blob_store.clone(),
            engine.clone(),
        );
        let dispatcher = Dispatcher::new(&container);

        Self {
            container,
            dispatcher,
            meta_store,
            blob_store,
            engine,
        }
    }

    /// Forces a `SCHEDULED` ceremony straight to `OPENED`, without waiting
    /// on `start_date` to actually arrive. Every scenario needs this since
    /// `Setup::setup_ceremony` rejects a non-future `start_date`.
    pub async fn force_open(&self, ceremony_id: &CeremonyId) {
        let ceremony = self.meta_store.get_ceremony(ceremony_id).await.unwrap();
        let now = ceremony.start_date;
        self.meta_store
            .mutate_ceremony(
                ceremony_id,
                Box::new(move |c| ceremony_statemachine::open_if_due(c, now).map_err(Into::into)),
            )
            .await
            .unwrap();
    }

    /// Forces an `OPENED` ceremony straight to `CLOSED`, without waiting on
    /// `end_date`.
    pub async fn force_close(&self, ceremony_id: &CeremonyId) {
        let ceremony = self.meta_store.get_ceremony(ceremony_id).await.unwrap();
        let now = ceremony.end_date;
        self.meta_store
            .mutate_ceremony(
                ceremony_id,
                Box::new(move |c| ceremony_statemachine::close_if_due(c, now).map_err(Into::into)),
            )
            .await
            .unwrap();
    }

    /// `checkParticipantForCeremony` only executes one state-machine arm
    /// per call (it matches on the pre-mutation status), so a brand-new
    /// participant needs it called twice to reach `READY`:
    /// `CREATED -> WAITING` then `WAITING -> READY`.
    pub async fn join_and_ready(&self, ceremony_id: &CeremonyId, participant_id: &ParticipantId) {
        let first = self
            .dispatcher
            .check_participant_for_ceremony(ceremony_id, participant_id)
            .await
            .unwrap();
        assert_eq!(first.status, ParticipantStatus::Waiting);
        let second = self
            .dispatcher
            .check_participant_for_ceremony(ceremony_id, participant_id)
            .await
            .unwrap();
        assert_eq!(second.status, ParticipantStatus::Ready);
    }
}

/// A single `Cf`-verified circuit with the given 1-based `sequence_position`
/// and a short, deterministic `fixed_time_window_secs`, plus genesis
/// artifacts small enough the canned engine doesn't care about their
/// contents.
pub fn circuit_input(sequence_position: u32, prefix: &str, fixed_time_window_secs: Option<u64>) -> CircuitSetupInput {
    CircuitSetupInput {
        sequence_position,
        prefix: prefix.to_string(),
        metadata: CircuitMetadata {
            pot: 8,
            ..CircuitMetadata::default()
        },
        zkey_size_bytes: 1024,
        fixed_time_window_secs,
        mechanism: VerificationMechanism::Cf,
        genesis_zkey: b"genesis".to_vec(),
        pot: vec![0u8; 64],
        wasm: b"wasm".to_vec(),
        r1cs: b"r1cs".to_vec(),
    }
}

/// A ceremony scheduled to start one second from now (so `setup_ceremony`
/// accepts it) and run for an hour, with `circuits` as its circuit list.
pub fn ceremony_input(prefix: &str, circuits: Vec<CircuitSetupInput>) -> CeremonySetupInput {
    let now = chrono::Utc::now();
    CeremonySetupInput {
        prefix: prefix.to_string(),
        title: format!("{prefix} ceremony"),
        description: "scenario test ceremony".to_string(),
        start_date: now + chrono::Duration::seconds(1),
        end_date: now + chrono::Duration::hours(1),
        coordinator_id: "coord".to_string(),
        timeout_mechanism: TimeoutMechanism::Fixed,
        penalty_secs: 0,
        penalty_multiplier: 2.0,
        circuits,
    }
}

//! The async `Setup` service: `setupCeremony`, the single
//! coordinator-only entry point that provisions a ceremony's bucket,
//! circuits, VMs, and genesis artifacts before any participant can join.

use crate::errors::SetupError;
use crate::input::{CeremonySetupInput, CircuitSetupInput};
use crate::paths;
use ceremony_ports::{BlobStore, ComputeProvider, CorsConfig, MetaStore, VmSpec};
use shared_types::{Ceremony, CeremonyId, CeremonyState, Circuit, CircuitId, VerificationConfig, VerificationMechanism};
use std::sync::Arc;
use tracing::info;

/// Appended to a ceremony's `prefix` to form its bucket name
/// (`ceremonyBucketPostfix` configuration).
#[derive(Debug, Clone)]
pub struct SetupConfig {
    pub ceremony_bucket_postfix: String,
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            ceremony_bucket_postfix: "-ceremony".to_string(),
        }
    }
}

pub struct Setup {
    meta_store: Arc<dyn MetaStore>,
    blob_store: Arc<dyn BlobStore>,
    compute: Arc<dyn ComputeProvider>,
    config: SetupConfig,
}

impl Setup {
    pub fn new(
        meta_store: Arc<dyn MetaStore>,
        blob_store: Arc<dyn BlobStore>,
        compute: Arc<dyn ComputeProvider>,
        config: SetupConfig,
    ) -> Self {
        Self {
            meta_store,
            blob_store,
            compute,
            config,
        }
    }

    /// Runs the full ceremony provisioning sequence and returns the created `Ceremony`.
    pub async fn setup_ceremony(&self, input: CeremonySetupInput) -> Result<Ceremony, SetupError> {
        if input.circuits.is_empty() {
            return Err(SetupError::NoCircuits);
        }
        if input.start_date >= input.end_date {
            return Err(SetupError::StartDateNotBeforeEndDate);
        }
        if input.start_date <= chrono::Utc::now() {
            return Err(SetupError::StartDateNotInFuture);
        }
        self.assert_prefix_available(&input.prefix).await?;
        assert_contiguous_sequence(&input.circuits)?;

        let ceremony_id = CeremonyId::from(shared_types::new_id());
        let bucket_name = format!("{}{}", input.prefix, self.config.ceremony_bucket_postfix);

        self.blob_store
            .create_bucket(&bucket_name, CorsConfig::default())
            .await
            .map_err(SetupError::Store)?;

        let ceremony = Ceremony {
            id: ceremony_id.clone(),
            prefix: input.prefix.clone(),
            title: input.title,
            description: input.description,
            start_date: input.start_date,
            end_date: input.end_date,
            state: CeremonyState::Scheduled,
            coordinator_id: input.coordinator_id,
            timeout_mechanism: input.timeout_mechanism,
            penalty_secs: input.penalty_secs,
            penalty_multiplier: input.penalty_multiplier,
            bucket_name: bucket_name.clone(),
        };
        self.meta_store.create_ceremony(ceremony.clone()).await.map_err(SetupError::Store)?;

        let mut circuits = input.circuits;
        circuits.sort_by_key(|c| c.sequence_position);
        for circuit_input in circuits {
            self.setup_circuit(&ceremony_id, &bucket_name, circuit_input).await?;
        }

        info!(ceremony_id = %ceremony_id, prefix = %ceremony.prefix, "ceremony scheduled");
        Ok(ceremony)
    }

    async fn assert_prefix_available(&self, prefix: &str) -> Result<(), SetupError> {
        let existing = self.meta_store.list_ceremonies().await.map_err(SetupError::Store)?;
        if existing.iter().any(|c| c.prefix == prefix) {
            return Err(SetupError::PrefixTaken(prefix.to_string()));
        }
        Ok(())
    }

    async fn setup_circuit(
        &self,
        ceremony_id: &CeremonyId,
        bucket_name: &str,
        input: CircuitSetupInput,
    ) -> Result<(), SetupError> {
        let circuit_id = CircuitId::from(shared_types::new_id());
        let pot_exponent = input.metadata.pot;

        let vm_instance_id = if input.mechanism == VerificationMechanism::Vm {
            let disk_gb = vm_disk_size_gb(input.zkey_size_bytes, input.pot.len() as u64);
            Some(self.compute.provision(VmSpec { disk_gb }).await.map_err(SetupError::Store)?)
        } else {
            None
        };

        let circuit_prefix = input.prefix.clone();
        let circuit = Circuit::new(
            ceremony_id.clone(),
            circuit_id,
            input.sequence_position,
            circuit_prefix.clone(),
            input.metadata,
            input.zkey_size_bytes,
            input.fixed_time_window_secs,
            VerificationConfig {
                mechanism: Some(input.mechanism),
                vm_instance_id,
            },
        );
        self.meta_store.create_circuit(circuit).await.map_err(SetupError::Store)?;

        self.blob_store
            .put_object(bucket_name, &paths::genesis_zkey_key(&circuit_prefix), input.genesis_zkey)
            .await
            .map_err(SetupError::Store)?;
        self.blob_store
            .put_object(bucket_name, &paths::pot_key(pot_exponent), input.pot)
            .await
            .map_err(SetupError::Store)?;
        self.blob_store
            .put_object(bucket_name, &paths::wasm_key(&circuit_prefix), input.wasm)
            .await
            .map_err(SetupError::Store)?;
        self.blob_store
            .put_object(bucket_name, &paths::r1cs_key(&circuit_prefix), input.r1cs)
            .await
            .map_err(SetupError::Store)?;

        Ok(())
    }
}

/// VM disk sizing: `ceil(2 * zkeySizeGB + potFileSizeGB) + 8` GB.
fn vm_disk_size_gb(zkey_size_bytes: u64, pot_size_bytes: u64) -> u64 {
    const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;
    let zkey_gb = zkey_size_bytes as f64 / BYTES_PER_GB;
    let pot_gb = pot_size_bytes as f64 / BYTES_PER_GB;
    (2.0 * zkey_gb + pot_gb).ceil() as u64 + 8
}

fn assert_contiguous_sequence(circuits: &[CircuitSetupInput]) -> Result<(), SetupError> {
    let mut positions: Vec<u32> = circuits.iter().map(|c| c.sequence_position).collect();
    positions.sort_unstable();
    let expected: Vec<u32> = (1..=positions.len() as u32).collect();
    if positions != expected {
        return Err(SetupError::NonContiguousSequence);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ceremony_adapters::{InMemoryBlobStore, InMemoryComputeProvider, InMemoryMetaStore};
    use shared_types::{CircuitMetadata, TimeoutMechanism};

    fn circuit_input(sequence_position: u32, mechanism: VerificationMechanism) -> CircuitSetupInput {
        CircuitSetupInput {
            sequence_position,
            prefix: format!("circuit{sequence_position}"),
            metadata: CircuitMetadata {
                pot: 10,
                ..CircuitMetadata::default()
            },
            zkey_size_bytes: 1024 * 1024 * 1024,
            fixed_time_window_secs: Some(3600),
            mechanism,
            genesis_zkey: b"genesis".to_vec(),
            pot: vec![0u8; 1024],
            wasm: b"wasm".to_vec(),
            r1cs: b"r1cs".to_vec(),
        }
    }

    fn ceremony_input(circuits: Vec<CircuitSetupInput>) -> CeremonySetupInput {
        let now = chrono::Utc::now();
        CeremonySetupInput {
            prefix: "small".into(),
            title: "Small Ceremony".into(),
            description: "d".into(),
            start_date: now + chrono::Duration::hours(1),
            end_date: now + chrono::Duration::hours(2),
            coordinator_id: "coord".into(),
            timeout_mechanism: TimeoutMechanism::Fixed,
            penalty_secs: 60,
            penalty_multiplier: 2.0,
            circuits,
        }
    }

    fn setup_service() -> (Setup, Arc<InMemoryMetaStore>, Arc<InMemoryBlobStore>) {
        let meta = Arc::new(InMemoryMetaStore::new());
        let blob = Arc::new(InMemoryBlobStore::new());
        let compute = Arc::new(InMemoryComputeProvider::default());
        let setup = Setup::new(meta.clone(), blob.clone(), compute, SetupConfig::default());
        (setup, meta, blob)
    }

    #[tokio::test]
    async fn creates_ceremony_bucket_and_circuits() {
        let (setup, meta, blob) = setup_service();
        let input = ceremony_input(vec![
            circuit_input(1, VerificationMechanism::Cf),
            circuit_input(2, VerificationMechanism::Cf),
        ]);

        let ceremony = setup.setup_ceremony(input).await.unwrap();
        assert_eq!(ceremony.state, CeremonyState::Scheduled);
        assert_eq!(ceremony.bucket_name, "small-ceremony");

        let circuits = meta.list_circuits(&ceremony.id).await.unwrap();
        assert_eq!(circuits.len(), 2);
        assert_eq!(circuits[0].sequence_position, 1);
        assert_eq!(circuits[1].sequence_position, 2);

        assert!(blob
            .object_exists("small-ceremony", "circuits/circuit1/contributions/circuit1_00000.zkey")
            .await
            .unwrap());
        assert!(blob.object_exists("small-ceremony", "pot/pot_10.ptau").await.unwrap());
    }

    #[tokio::test]
    async fn vm_mechanism_provisions_sized_instance() {
        let (setup, meta, _blob) = setup_service();
        let input = ceremony_input(vec![circuit_input(1, VerificationMechanism::Vm)]);

        let ceremony = setup.setup_ceremony(input).await.unwrap();
        let circuits = meta.list_circuits(&ceremony.id).await.unwrap();
        assert!(circuits[0].verification.vm_instance_id.is_some());
    }

    #[tokio::test]
    async fn rejects_non_contiguous_sequence_positions() {
        let (setup, _meta, _blob) = setup_service();
        let input = ceremony_input(vec![
            circuit_input(1, VerificationMechanism::Cf),
            circuit_input(3, VerificationMechanism::Cf),
        ]);
        assert!(matches!(
            setup.setup_ceremony(input).await,
            Err(SetupError::NonContiguousSequence)
        ));
    }

    #[tokio::test]
    async fn rejects_duplicate_prefix() {
        let (setup, _meta, _blob) = setup_service();
        setup
            .setup_ceremony(ceremony_input(vec![circuit_input(1, VerificationMechanism::Cf)]))
            .await
            .unwrap();

        let second = ceremony_input(vec![circuit_input(1, VerificationMechanism::Cf)]);
        assert!(matches!(setup.setup_ceremony(second).await, Err(SetupError::PrefixTaken(_))));
    }

    #[tokio::test]
    async fn rejects_start_date_not_in_future() {
        let (setup, _meta, _blob) = setup_service();
        let mut input = ceremony_input(vec![circuit_input(1, VerificationMechanism::Cf)]);
        input.start_date = chrono::Utc::now() - chrono::Duration::hours(1);
        assert!(matches!(
            setup.setup_ceremony(input).await,
            Err(SetupError::StartDateNotInFuture)
        ));
    }
}

//! Builds the full dependency graph of a coordinator process from a
//! `RuntimeConfig`: in-memory stores, the ceremony-* services, and the
//! `AppState` the gateway serves.
//!
//! The only extension seam is here. Swapping `InMemoryMetaStore` for a
//! real Firestore-backed `MetaStore` (or `InMemoryBlobStore` for a real
//! GCS-backed `BlobStore`) means changing the four `Arc::new` calls below;
//! every service above them is constructed against the `ceremony-ports`
//! traits, not a concrete adapter.

use crate::container::config::RuntimeConfig;
use ceremony_adapters::{CannedZKeyEngine, InMemoryBlobStore, InMemoryComputeProvider, InMemoryMetaStore};
use ceremony_api_gateway::AppState;
use ceremony_ports::{BlobStore, ComputeProvider, MetaStore, ZKeyEngine};
use ceremony_verifier::dispatch::{InProcessBackend, VerificationBackend, VmBackend};
use shared_bus::{EventPublisher, InMemoryEventBus};
use std::sync::Arc;

/// Owns every wired collaborator for the lifetime of the process.
pub struct CoordinatorContainer {
    pub meta_store: Arc<dyn MetaStore>,
    pub blob_store: Arc<dyn BlobStore>,
    pub event_bus: Arc<dyn EventPublisher>,
    pub scheduler: Arc<ceremony_scheduler::Scheduler>,
    pub setup: Arc<ceremony_setup::Setup>,
    pub upload: Arc<ceremony_upload::UploadCoordinator>,
    pub verifier: Arc<ceremony_verifier::Verifier>,
    pub finalizer: Arc<ceremony_finalizer::Finalizer>,
    pub config: RuntimeConfig,
}

impl CoordinatorContainer {
    pub fn build(config: RuntimeConfig) -> Self {
        Self::build_with_engine(config, Arc::new(CannedZKeyEngine::new()))
    }

    /// Same wiring as `build`, but with a caller-supplied `ZKeyEngine`.
    /// `integration-tests` uses this to hold on to the concrete
    /// `CannedZKeyEngine` so a scenario can flip `set_next_verdict` between
    /// RPC calls (S4) without the container otherwise differing from a
    /// real process's wiring.
    pub fn build_with_engine(config: RuntimeConfig, engine: Arc<dyn ZKeyEngine>) -> Self {
        Self::build_with_collaborators(
            config,
            Arc::new(InMemoryMetaStore::new()),
            Arc::new(InMemoryBlobStore::new()),
            engine,
        )
    }

    /// Same wiring as `build`, but with caller-supplied `MetaStore`,
    /// `BlobStore`, and `ZKeyEngine`. `integration-tests` uses this to keep
    /// concrete handles to the in-memory adapters (to assert on stored
    /// documents and to drive `InMemoryBlobStore::simulate_part_upload`)
    /// alongside the exact wiring a real process gets from `build`.
    pub fn build_with_collaborators(
        config: RuntimeConfig,
        meta_store: Arc<dyn MetaStore>,
        blob_store: Arc<dyn BlobStore>,
        engine: Arc<dyn ZKeyEngine>,
    ) -> Self {
        let compute: Arc<dyn ComputeProvider> = Arc::new(InMemoryComputeProvider::new());
        let event_bus: Arc<dyn EventPublisher> = Arc::new(InMemoryEventBus::new());

        let scheduler = Arc::new(ceremony_scheduler::Scheduler::new(
            Arc::clone(&meta_store),
            Arc::clone(&blob_store),
            Arc::clone(&event_bus),
        ));

        let cf_backend: Arc<dyn VerificationBackend> = Arc::new(InProcessBackend::new(Arc::clone(&engine)));
        let vm_backend: Arc<dyn VerificationBackend> = Arc::new(VmBackend::new(Arc::clone(&compute)));

        let setup = Arc::new(ceremony_setup::Setup::new(
            Arc::clone(&meta_store),
            Arc::clone(&blob_store),
            Arc::clone(&compute),
            config.setup.clone(),
        ));
        let upload = Arc::new(ceremony_upload::UploadCoordinator::new(
            Arc::clone(&meta_store),
            Arc::clone(&blob_store),
            Arc::clone(&event_bus),
            config.upload.clone(),
        ));
        let verifier = Arc::new(ceremony_verifier::Verifier::new(
            Arc::clone(&meta_store),
            Arc::clone(&blob_store),
            Arc::clone(&scheduler),
            Arc::clone(&event_bus),
            Arc::clone(&cf_backend),
            Arc::clone(&vm_backend),
        ));
        let finalizer = Arc::new(ceremony_finalizer::Finalizer::new(
            Arc::clone(&meta_store),
            Arc::clone(&blob_store),
            Arc::clone(&engine),
            Arc::clone(&compute),
            Arc::clone(&event_bus),
            cf_backend,
            vm_backend,
        ));

        Self {
            meta_store,
            blob_store,
            event_bus,
            scheduler,
            setup,
            upload,
            verifier,
            finalizer,
            config,
        }
    }

    /// Assembles the `AppState` the gateway's router closes over.
    pub fn app_state(&self) -> AppState {
        AppState {
            meta_store: Arc::clone(&self.meta_store),
            blob_store: Arc::clone(&self.blob_store),
            setup: Arc::clone(&self.setup),
            finalizer: Arc::clone(&self.finalizer),
            upload: Arc::clone(&self.upload),
            verifier: Arc::clone(&self.verifier),
            scheduler: Arc::clone(&self.scheduler),
            config: self.config.gateway.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_every_collaborator() {
        let container = CoordinatorContainer::build(RuntimeConfig::default());
        let _state = container.app_state();
    }
}

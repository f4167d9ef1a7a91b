//! The ceremony coordinator's external interface: one HTTP
//! operation per RPC, gated by a three-tier auth model and a handful of
//! `tower_http` layers, wired to the service crates that hold the actual
//! ceremony logic.
//!
//! # RPC surface
//!
//! Coordinator-only: `setupCeremony`, `createBucket`, `finalizeCircuit`,
//! `finalizeCeremony`, `checkAndPrepareCoordinatorForFinalization`.
//!
//! Authenticated contributor or coordinator: `checkParticipantForCeremony`,
//! `progressToNextCircuitForContribution`, `progressToNextContributionStep`,
//! `permanentlyStoreCurrentContributionTimeAndHash`,
//! `resumeContributionAfterTimeoutExpiration`, `openMultiPartUpload`,
//! `generatePreSignedUrlsParts`, `completeMultiPartUpload`,
//! `temporaryStoreCurrentContributionMultiPartUploadId`,
//! `temporaryStoreCurrentContributionUploadedChunkData`,
//! `verifyContribution`, `generateGetObjectPreSignedUrl`,
//! `checkIfObjectExist`.

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod domain;
pub mod dto;
pub mod middleware;
pub mod routes;
pub mod service;

pub use domain::config::CoordinatorConfig;
pub use domain::error::ResponseError;
pub use routes::AppState;
pub use service::CoordinatorService;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}

//! # Ceremony Ports
//!
//! Trait boundaries for the four external collaborators the core treats as
//! opaque: `MetaStore`, `BlobStore`, `ZKeyEngine`, `ComputeProvider`. Also
//! home to `CoreError`, the centralized error taxonomy that every
//! component error converts into at its boundary.
//!
//! Concrete implementations (in-memory for tests, real adapters for
//! production) live in `ceremony-adapters`; this crate only defines the
//! contracts.

pub mod auth;
pub mod blob_store;
pub mod compute_provider;
pub mod error;
pub mod meta_store;
pub mod retry;
pub mod zkey_engine;

pub use auth::{Authenticator, Principal};
pub use blob_store::{BlobStore, CorsConfig};
pub use compute_provider::{CommandStatus, ComputeProvider, VmSpec};
pub use error::CoreError;
pub use meta_store::{
    CeremonyMutation, CircuitMutation, FinalizationBatch, MetaStore, ParticipantMutation,
    VerificationBatch,
};
pub use retry::{retry_upstream, RetryPolicy};
pub use zkey_engine::{ExportedVerifier, VerificationOutcome, ZKeyEngine};

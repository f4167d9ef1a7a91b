//! # Ceremony Adapters
//!
//! In-memory implementations of the four opaque ports `ceremony-ports`
//! defines (`MetaStore`, `BlobStore`, `ZKeyEngine`, `ComputeProvider`).
//! These back the `integration-tests` scenarios and local development; a
//! real deployment swaps each one out for a Firestore/GCS/snarkjs/GCE (or
//! equivalent) binding behind the same trait.

pub mod blob_store;
pub mod compute_provider;
pub mod meta_store;
pub mod zkey_engine;

pub use blob_store::InMemoryBlobStore;
pub use compute_provider::InMemoryComputeProvider;
pub use meta_store::InMemoryMetaStore;
pub use zkey_engine::CannedZKeyEngine;

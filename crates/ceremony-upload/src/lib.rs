//! # Ceremony Upload
//!
//! The resumable large-artifact upload protocol: a current contributor
//! delivers its new zkey via multi-part, chunked,
//! pre-signed-URL uploads. Every call is gated by the preconditions in
//! `preconditions.rs` against the participant's `(ceremony, circuit,
//! zkeyIndex, participant)` tuple before it touches `BlobStore` or
//! `MetaStore`.

pub mod errors;
pub mod preconditions;
pub mod upload_coordinator;

pub use errors::UploadError;
pub use upload_coordinator::{UploadConfig, UploadCoordinator};

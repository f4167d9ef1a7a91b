//! # Ceremony Verifier
//!
//! Contribution verification pipeline: fetches the genesis
//! zkey, pot file, and the uploaded last zkey, dispatches verification to
//! the circuit's configured backend (`dispatch::VerificationBackend`),
//! hashes and stores the transcript, commits the atomic write batch, and
//! triggers the Scheduler's baton hand-off.

pub mod dispatch;
pub mod errors;
pub mod paths;
pub mod verifier;

pub use errors::VerifierError;
pub use verifier::Verifier;

//! # Ceremony Finalizer
//!
//! Ceremony finalization: applies the public beacon to each
//! circuit's last valid zkey, exports the verifier contract and vkey,
//! re-verifies the final zkey with `ceremony-verifier`'s dispatch backends,
//! and retires the ceremony (and the coordinator's own participant record
//! and any running VMs) once every circuit has landed.

pub mod errors;
pub mod finalizer;
pub mod paths;

pub use errors::FinalizerError;
pub use finalizer::{Finalizer, NUM_EXP_ITERATIONS, SOLIDITY_VERSION};

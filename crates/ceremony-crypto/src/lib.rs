//! # Ceremony Crypto
//!
//! Content hashing and entropy generation for the Phase 2 trusted setup
//! coordinator. The actual MPC cryptography (`verifyFromInit`, `contribute`,
//! `beacon`, `exportVerifierAndVKey`) is out of scope for this workspace and
//! lives behind the opaque `ZKeyEngine` port in `ceremony-ports`; this crate
//! supplies the two concrete cryptographic primitives the core itself needs:
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `hashing` | blake2b-512 digests of zkeys and transcripts |
//! | `beacon` | CSPRNG entropy for the finalization beacon |

#![warn(missing_docs)]

pub mod beacon;
pub mod errors;
pub mod hashing;

pub use beacon::{generate_beacon_hex, generate_entropy_hex, BEACON_LENGTH_BYTES};
pub use errors::CryptoError;
pub use hashing::{blake2b512_hex, StreamingHasher};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Crypto error types.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// A hash digest's hex encoding did not decode to the expected length.
    #[error("invalid digest: expected {expected} bytes, got {actual}")]
    InvalidDigestLength {
        /// Expected digest length in bytes.
        expected: usize,
        /// Actual digest length in bytes.
        actual: usize,
    },

    /// The requested entropy length was invalid (e.g. zero).
    #[error("invalid entropy request: {0}")]
    InvalidEntropyRequest(String),
}

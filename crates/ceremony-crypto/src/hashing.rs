//! blake2b-512 content hashing for zkeys and verification transcripts.
//!
//! Verification requires a blake2b-512 digest of the last zkey and the
//! transcript; both are stored as lowercase hex strings
//! alongside the Contribution's storage paths.

use blake2::digest::consts::U64;
use blake2::{Blake2b, Digest};

type Blake2b512 = Blake2b<U64>;

/// Hashes a byte slice with blake2b-512, returning lowercase hex.
pub fn blake2b512_hex(data: &[u8]) -> String {
    let mut hasher = Blake2b512::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Incremental blake2b-512 hasher for streamed content (the last zkey and
/// transcript are read from local disk in chunks during verification rather
/// than held fully in memory).
#[derive(Default)]
pub struct StreamingHasher {
    inner: Blake2b512,
}

impl StreamingHasher {
    /// Starts a new incremental digest.
    pub fn new() -> Self {
        Self {
            inner: Blake2b512::new(),
        }
    }

    /// Feeds the next chunk of content into the digest.
    pub fn update(&mut self, chunk: &[u8]) {
        self.inner.update(chunk);
    }

    /// Consumes the hasher, returning the lowercase hex digest.
    pub fn finalize_hex(self) -> String {
        hex::encode(self.inner.finalize())
    }
}

//! Beacon entropy generation for ceremony finalization.
//!
//! A naive entropy source is not acceptable for a public beacon, so this
//! crate sources beacon randomness from `rand::rngs::OsRng`, a CSPRNG,
//! the same way any security-sensitive entropy need in this workspace is
//! handled.

use crate::errors::CryptoError;
use rand::rngs::OsRng;
use rand::RngCore;

/// Number of bytes in a beacon value. 32 bytes matches the entropy width the
/// `ZKeyEngine.beacon` operation consumes (see DESIGN.md for the resolution
/// of this open question).
pub const BEACON_LENGTH_BYTES: usize = 32;

/// Draws a fresh beacon value from a CSPRNG, hex-encoded for storage in the
/// final Contribution record.
pub fn generate_beacon_hex() -> String {
    let mut bytes = [0u8; BEACON_LENGTH_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Draws `len` bytes of CSPRNG entropy, hex-encoded. Used by tests that want
/// a beacon of non-default length; production finalization always calls
/// [`generate_beacon_hex`].
pub fn generate_entropy_hex(len: usize) -> Result<String, CryptoError> {
    if len == 0 {
        return Err(CryptoError::InvalidEntropyRequest(
            "entropy length must be non-zero".to_string(),
        ));
    }
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    Ok(hex::encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn beacon_has_expected_hex_length() {
        let beacon = generate_beacon_hex();
        assert_eq!(beacon.len(), BEACON_LENGTH_BYTES * 2);
    }

    #[test]
    fn successive_beacons_differ() {
        // Not a cryptographic proof, just a sanity check that we aren't
        // returning a constant.
        assert_ne!(generate_beacon_hex(), generate_beacon_hex());
    }

    #[test]
    fn rejects_zero_length_request() {
        assert!(generate_entropy_hex(0).is_err());
    }
}

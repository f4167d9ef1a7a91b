//! `ZKeyEngine`: the opaque cryptographic MPC operations.
//!
//! The MPC algorithms themselves are explicitly out of scope for this
//! workspace; this trait is the seam a real implementation (snarkjs-equivalent
//! bindings, a subprocess, an FFI call) would fill in. Tests use a canned
//! deterministic double (`ceremony-adapters::zkey_engine`).

use crate::error::CoreError;
use async_trait::async_trait;

/// Output of `verifyFromInit`: validity plus the transcript bytes the
/// caller writes to its own transcript log file before hashing.
pub struct VerificationOutcome {
    pub valid: bool,
    pub transcript: Vec<u8>,
}

/// Output of `exportVerifierAndVKey`: the Solidity verifier source and the
/// JSON verification key.
pub struct ExportedVerifier {
    pub verifier_contract: Vec<u8>,
    pub vkey_json: Vec<u8>,
}

#[async_trait]
pub trait ZKeyEngine: Send + Sync {
    /// Verifies `last_zkey` as a valid transform of `genesis_zkey` under
    /// `pot`, producing a transcript.
    async fn verify_from_init(
        &self,
        genesis_zkey: &[u8],
        pot: &[u8],
        last_zkey: &[u8],
    ) -> Result<VerificationOutcome, CoreError>;

    /// Applies one participant's contribution to `prev_zkey`, consuming
    /// `entropy` supplied by the caller's randomness source (contributor
    /// side; invoked by whatever client produces the uploaded zkey — the
    /// core itself never calls this, it only verifies the result, but the
    /// port is declared here as part of this trait's contract).
    async fn contribute(&self, prev_zkey: &[u8], entropy: &[u8]) -> Result<Vec<u8>, CoreError>;

    /// Applies the final public-randomness beacon to the last valid zkey.
    /// `num_exp_iterations` is fixed at 10.
    async fn beacon(
        &self,
        last_zkey: &[u8],
        pot: &[u8],
        entropy_beacon: &[u8],
        num_exp_iterations: u32,
    ) -> Result<Vec<u8>, CoreError>;

    /// Exports the Solidity verifier contract and `vkey.json` for the
    /// finalized zkey. `solidity_version` is fixed at `"0.8.0"`.
    async fn export_verifier_and_vkey(
        &self,
        final_zkey: &[u8],
        solidity_version: &str,
    ) -> Result<ExportedVerifier, CoreError>;
}

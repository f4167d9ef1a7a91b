//! Canned `ZKeyEngine`: a deterministic test double for the
//! opaque MPC cryptography this workspace treats as out of scope. Never invoked in
//! production — a real deployment binds this port to snarkjs-equivalent
//! bindings or a subprocess.

use async_trait::async_trait;
use ceremony_ports::{CoreError, ExportedVerifier, VerificationOutcome, ZKeyEngine};
use std::sync::atomic::{AtomicBool, Ordering};

/// Returns a fixed validity verdict (configurable per test), and produces a
/// transcript and "zkey" that are simply derived from the inputs so
/// different scenarios hash differently.
pub struct CannedZKeyEngine {
    next_verdict: AtomicBool,
}

impl CannedZKeyEngine {
    pub fn new() -> Self {
        Self {
            next_verdict: AtomicBool::new(true),
        }
    }

    /// Configures the verdict the next `verify_from_init` call returns.
    /// Scenario tests use this to simulate a tampered contribution (S4).
    pub fn set_next_verdict(&self, valid: bool) {
        self.next_verdict.store(valid, Ordering::SeqCst);
    }
}

impl Default for CannedZKeyEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ZKeyEngine for CannedZKeyEngine {
    async fn verify_from_init(
        &self,
        genesis_zkey: &[u8],
        pot: &[u8],
        last_zkey: &[u8],
    ) -> Result<VerificationOutcome, CoreError> {
        let valid = self.next_verdict.load(Ordering::SeqCst);
        let mut transcript = Vec::new();
        transcript.extend_from_slice(b"verify-from-init\n");
        transcript.extend_from_slice(format!("genesis_len={}\n", genesis_zkey.len()).as_bytes());
        transcript.extend_from_slice(format!("pot_len={}\n", pot.len()).as_bytes());
        transcript.extend_from_slice(format!("last_len={}\n", last_zkey.len()).as_bytes());
        transcript.extend_from_slice(format!("valid={valid}\n").as_bytes());
        Ok(VerificationOutcome { valid, transcript })
    }

    async fn contribute(&self, prev_zkey: &[u8], entropy: &[u8]) -> Result<Vec<u8>, CoreError> {
        let mut next = prev_zkey.to_vec();
        next.extend_from_slice(entropy);
        Ok(next)
    }

    async fn beacon(
        &self,
        last_zkey: &[u8],
        pot: &[u8],
        entropy_beacon: &[u8],
        num_exp_iterations: u32,
    ) -> Result<Vec<u8>, CoreError> {
        let mut next = last_zkey.to_vec();
        next.extend_from_slice(pot);
        next.extend_from_slice(entropy_beacon);
        next.extend_from_slice(&num_exp_iterations.to_be_bytes());
        Ok(next)
    }

    async fn export_verifier_and_vkey(
        &self,
        final_zkey: &[u8],
        solidity_version: &str,
    ) -> Result<ExportedVerifier, CoreError> {
        let vkey_json = format!(
            "{{\"protocol\":\"groth16\",\"zkeyLen\":{}}}",
            final_zkey.len()
        )
        .into_bytes();
        let verifier_contract = format!(
            "// SPDX-License-Identifier: Unlicense\npragma solidity ^{solidity_version};\n\ncontract Verifier {{}}\n"
        )
        .into_bytes();
        Ok(ExportedVerifier {
            verifier_contract,
            vkey_json,
        })
    }
}

//! The `VerificationBackend` seam: a tagged
//! variant `{CF | VM}` becomes a trait plus two implementations here.
//! Adding a third mechanism later is one more impl of this trait, nothing
//! else in the Verifier needs to change.

use crate::errors::VerifierError;
use async_trait::async_trait;

/// Everything a backend needs to produce a verdict. `vm_instance_id` and
/// `command` are only consumed by [`crate::dispatch::VmBackend`]; the
/// in-process backend ignores them and works directly off the byte slices.
pub struct VerifyRequest {
    pub genesis_zkey: Vec<u8>,
    pub pot: Vec<u8>,
    pub last_zkey: Vec<u8>,
    pub vm_instance_id: Option<String>,
    pub vm_verify_command: String,
}

pub struct VerifyResult {
    pub valid: bool,
    pub transcript: Vec<u8>,
}

#[async_trait]
pub trait VerificationBackend: Send + Sync {
    async fn verify(&self, request: VerifyRequest) -> Result<VerifyResult, VerifierError>;
}

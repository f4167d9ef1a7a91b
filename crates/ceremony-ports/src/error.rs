//! The centralized error taxonomy shared across every component.
//!
//! Every component error enum (`StateMachineError`, `SchedulerError`,
//! `UploadError`, `VerifierError`, `FinalizerError`, `SetupError`) converts
//! into `CoreError` via `From` at the component boundary, so the gateway has
//! exactly one error type to map to an HTTP status and JSON body.

use thiserror::Error;

/// Stable, caller-visible error identifiers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// No identity on the call.
    #[error("unauthenticated")]
    Unauthenticated,

    /// Authenticated but lacks the coordinator capability where required.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Referenced ceremony/circuit/participant/object does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A state machine guard was violated.
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    /// Duplicate prefix/sequence position, or a CAS write lost the race
    /// after all retries.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Malformed parameters.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// BlobStore/ComputeProvider/ZKeyEngine transient failure, surfaced
    /// after retries were exhausted inside the owning component.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Wall clock exceeded for a bounded operation.
    #[error("deadline exceeded: {0}")]
    DeadlineExceeded(String),

    /// Invariant violation; a bug.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// The stable identifier string used in the gateway's JSON error body.
    pub fn identifier(&self) -> &'static str {
        match self {
            CoreError::Unauthenticated => "UNAUTHENTICATED",
            CoreError::Forbidden(_) => "FORBIDDEN",
            CoreError::NotFound(_) => "NOT_FOUND",
            CoreError::PreconditionFailed(_) => "PRECONDITION_FAILED",
            CoreError::Conflict(_) => "CONFLICT",
            CoreError::InvalidInput(_) => "INVALID_INPUT",
            CoreError::UpstreamUnavailable(_) => "UPSTREAM_UNAVAILABLE",
            CoreError::DeadlineExceeded(_) => "DEADLINE_EXCEEDED",
            CoreError::Internal(_) => "INTERNAL",
        }
    }

    /// Whether the owning component's `retry::retry_upstream` wrapper
    /// should retry this error. State-machine guard failures are never
    /// retried; only `UpstreamUnavailable` (a transient BlobStore /
    /// ComputeProvider / ZKeyEngine failure) is.
    pub fn is_retryable_by_caller(&self) -> bool {
        matches!(self, CoreError::UpstreamUnavailable(_))
    }
}

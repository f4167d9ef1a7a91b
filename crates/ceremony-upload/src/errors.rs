use ceremony_ports::CoreError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UploadError {
    /// The participant is not `CONTRIBUTING, step=UPLOADING`, or the
    /// requested `(bucket, objectKey)` does not match the expected tuple
    /// for its `(ceremony, circuit, zkeyIndex, participant)`.
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("{0}")]
    StateMachine(#[from] ceremony_statemachine::StateMachineError),

    #[error("store error: {0}")]
    Store(CoreError),
}

impl From<UploadError> for CoreError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Store(inner) => inner,
            other => CoreError::PreconditionFailed(other.to_string()),
        }
    }
}

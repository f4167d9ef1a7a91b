use ceremony_ports::CoreError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerifierError {
    #[error("{0}")]
    StateMachine(#[from] ceremony_statemachine::StateMachineError),

    #[error("{0}")]
    Scheduler(#[from] ceremony_scheduler::SchedulerError),

    /// Wall-clock for the verification dispatch was exceeded (the CF
    /// mechanism's in-process bound; every RPC carries a server-side timeout).
    #[error("verification deadline exceeded after {elapsed_secs}s")]
    DeadlineExceeded { elapsed_secs: u64 },

    #[error("store error: {0}")]
    Store(CoreError),
}

impl From<VerifierError> for CoreError {
    fn from(err: VerifierError) -> Self {
        match err {
            VerifierError::Store(inner) => inner,
            VerifierError::DeadlineExceeded { elapsed_secs } => {
                CoreError::DeadlineExceeded(format!("verification exceeded {elapsed_secs}s"))
            }
            other => CoreError::Internal(other.to_string()),
        }
    }
}

use ceremony_ports::CoreError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FinalizerError {
    #[error("{0}")]
    StateMachine(#[from] ceremony_statemachine::StateMachineError),

    #[error("{0}")]
    Verifier(#[from] ceremony_verifier::VerifierError),

    #[error("not every circuit has a valid final contribution yet")]
    CircuitsNotAllFinalized,

    #[error("store error: {0}")]
    Store(CoreError),
}

impl From<FinalizerError> for CoreError {
    fn from(err: FinalizerError) -> Self {
        match err {
            FinalizerError::Store(inner) => inner,
            FinalizerError::Verifier(inner) => inner.into(),
            other => CoreError::PreconditionFailed(other.to_string()),
        }
    }
}

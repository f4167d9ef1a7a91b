use ceremony_ports::CoreError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("queue is empty, nothing to hand off")]
    QueueEmpty,

    #[error("leaving participant {expected} is not the current head {actual}")]
    NotCurrentHead { expected: String, actual: String },

    #[error("{0}")]
    StateMachine(#[from] ceremony_statemachine::StateMachineError),

    #[error("store error: {0}")]
    Store(CoreError),
}

impl From<SchedulerError> for CoreError {
    fn from(err: SchedulerError) -> Self {
        match err {
            SchedulerError::Store(inner) => inner,
            other => CoreError::PreconditionFailed(other.to_string()),
        }
    }
}

use ceremony_ports::CoreError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SetupError {
    #[error("prefix {0} is already in use by another ceremony")]
    PrefixTaken(String),

    #[error("startDate must be before endDate")]
    StartDateNotBeforeEndDate,

    #[error("startDate must be in the future")]
    StartDateNotInFuture,

    #[error("circuit sequence positions must form 1..N without gaps or repeats")]
    NonContiguousSequence,

    #[error("at least one circuit is required")]
    NoCircuits,

    #[error("store error: {0}")]
    Store(CoreError),
}

impl From<SetupError> for CoreError {
    fn from(err: SetupError) -> Self {
        match err {
            SetupError::Store(inner) => inner,
            conflict @ SetupError::PrefixTaken(_) => CoreError::Conflict(conflict.to_string()),
            other => CoreError::InvalidInput(other.to_string()),
        }
    }
}

//! State machine guard failures, convertible into `ceremony_ports::CoreError`.

use ceremony_ports::CoreError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateMachineError {
    #[error("illegal transition from {from:?} to {to:?}")]
    IllegalTransition { from: String, to: String },

    #[error("guard failed: {0}")]
    GuardFailed(String),

    #[error("ceremony is not open")]
    CeremonyNotOpen,

    #[error("participant has an active timeout")]
    ActiveTimeout,

    #[error("transition would regress contribution_progress or contribution_step")]
    Regression,
}

impl From<StateMachineError> for CoreError {
    fn from(err: StateMachineError) -> Self {
        CoreError::PreconditionFailed(err.to_string())
    }
}

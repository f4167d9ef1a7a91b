//! Ceremony-level transitions:
//! `SCHEDULED -> OPENED -> CLOSED -> FINALIZED`, with `PAUSED` reachable
//! from `OPENED` by coordinator action.

use crate::errors::StateMachineError;
use chrono::{DateTime, Utc};
use shared_types::{Ceremony, CeremonyState};

/// `SCHEDULED -> OPENED` once `now >= start_date`.
pub fn open_if_due(ceremony: &mut Ceremony, now: DateTime<Utc>) -> Result<(), StateMachineError> {
    if ceremony.state != CeremonyState::Scheduled {
        return Err(StateMachineError::IllegalTransition {
            from: format!("{:?}", ceremony.state),
            to: "Opened".to_string(),
        });
    }
    if now < ceremony.start_date {
        return Err(StateMachineError::GuardFailed(
            "start_date has not yet arrived".to_string(),
        ));
    }
    ceremony.state = CeremonyState::Opened;
    Ok(())
}

/// `OPENED -> CLOSED` once `now >= end_date`.
pub fn close_if_due(ceremony: &mut Ceremony, now: DateTime<Utc>) -> Result<(), StateMachineError> {
    if ceremony.state != CeremonyState::Opened {
        return Err(StateMachineError::IllegalTransition {
            from: format!("{:?}", ceremony.state),
            to: "Closed".to_string(),
        });
    }
    if now < ceremony.end_date {
        return Err(StateMachineError::GuardFailed(
            "end_date has not yet arrived".to_string(),
        ));
    }
    ceremony.state = CeremonyState::Closed;
    Ok(())
}

/// `OPENED -> PAUSED`, a coordinator-triggered action rather than a timed
/// one.
pub fn pause(ceremony: &mut Ceremony) -> Result<(), StateMachineError> {
    if ceremony.state != CeremonyState::Opened {
        return Err(StateMachineError::IllegalTransition {
            from: format!("{:?}", ceremony.state),
            to: "Paused".to_string(),
        });
    }
    ceremony.state = CeremonyState::Paused;
    Ok(())
}

/// `PAUSED -> OPENED`, resuming a paused ceremony.
pub fn resume(ceremony: &mut Ceremony) -> Result<(), StateMachineError> {
    if ceremony.state != CeremonyState::Paused {
        return Err(StateMachineError::IllegalTransition {
            from: format!("{:?}", ceremony.state),
            to: "Opened".to_string(),
        });
    }
    ceremony.state = CeremonyState::Opened;
    Ok(())
}

/// `CLOSED -> FINALIZED`, fired by the Finalizer only after every circuit
/// has a valid final contribution.
pub fn finalize(ceremony: &mut Ceremony) -> Result<(), StateMachineError> {
    if ceremony.state != CeremonyState::Closed {
        return Err(StateMachineError::IllegalTransition {
            from: format!("{:?}", ceremony.state),
            to: "Finalized".to_string(),
        });
    }
    ceremony.state = CeremonyState::Finalized;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{CeremonyId, TimeoutMechanism};

    fn scheduled(start: DateTime<Utc>, end: DateTime<Utc>) -> Ceremony {
        Ceremony {
            id: CeremonyId::from("c1"),
            prefix: "small".into(),
            title: "t".into(),
            description: "d".into(),
            start_date: start,
            end_date: end,
            state: CeremonyState::Scheduled,
            coordinator_id: "coord".into(),
            timeout_mechanism: TimeoutMechanism::Fixed,
            penalty_secs: 60,
            penalty_multiplier: 2.0,
            bucket_name: "small-ceremony".into(),
        }
    }

    #[test]
    fn does_not_open_before_start_date() {
        let now = Utc::now();
        let mut c = scheduled(now + chrono::Duration::hours(1), now + chrono::Duration::hours(2));
        assert!(open_if_due(&mut c, now).is_err());
    }

    #[test]
    fn opens_exactly_at_start_date() {
        let now = Utc::now();
        let mut c = scheduled(now, now + chrono::Duration::hours(1));
        open_if_due(&mut c, now).unwrap();
        assert_eq!(c.state, CeremonyState::Opened);
    }

    #[test]
    fn full_lifecycle() {
        let now = Utc::now();
        let mut c = scheduled(now, now);
        open_if_due(&mut c, now).unwrap();
        close_if_due(&mut c, now).unwrap();
        finalize(&mut c).unwrap();
        assert_eq!(c.state, CeremonyState::Finalized);
    }

    #[test]
    fn pause_and_resume() {
        let now = Utc::now();
        let mut c = scheduled(now, now + chrono::Duration::hours(1));
        open_if_due(&mut c, now).unwrap();
        pause(&mut c).unwrap();
        assert_eq!(c.state, CeremonyState::Paused);
        resume(&mut c).unwrap();
        assert_eq!(c.state, CeremonyState::Opened);
    }
}

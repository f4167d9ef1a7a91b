//! Participant status and contribution-step transitions.
//!
//! Every function here is a pure guard+mutation pair: it either mutates
//! `participant` in place and returns `Ok(())`, or returns an error and
//! leaves `participant` untouched. Callers (Scheduler, UploadCoordinator,
//! Verifier) apply these inside a `ceremony_ports::MetaStore` mutation
//! closure so the guard check and the write commit atomically.

use crate::errors::StateMachineError;
use shared_types::{Ceremony, ContributionStep, Participant, ParticipantStatus};

/// `CREATED -> WAITING`: first `joinCeremony` call. Fails if the ceremony
/// is not `OPENED`.
pub fn join_ceremony(participant: &mut Participant, ceremony: &Ceremony) -> Result<(), StateMachineError> {
    if participant.status != ParticipantStatus::Created {
        return Err(StateMachineError::IllegalTransition {
            from: format!("{:?}", participant.status),
            to: "Waiting".to_string(),
        });
    }
    if !ceremony.is_open() {
        return Err(StateMachineError::CeremonyNotOpen);
    }
    participant.status = ParticipantStatus::Waiting;
    Ok(())
}

/// `WAITING -> READY`: prerequisites to contribute to the next circuit are
/// satisfied (no active timeout, ceremony still open).
pub fn mark_ready(
    participant: &mut Participant,
    ceremony: &Ceremony,
    has_active_timeout: bool,
) -> Result<(), StateMachineError> {
    if participant.status != ParticipantStatus::Waiting {
        return Err(StateMachineError::IllegalTransition {
            from: format!("{:?}", participant.status),
            to: "Ready".to_string(),
        });
    }
    if !ceremony.is_open() {
        return Err(StateMachineError::CeremonyNotOpen);
    }
    if has_active_timeout {
        return Err(StateMachineError::ActiveTimeout);
    }
    participant.status = ParticipantStatus::Ready;
    Ok(())
}

/// `READY -> CONTRIBUTING`: the Scheduler selected this participant as
/// `currentContributor`. Resets per-contribution scratch state.
pub fn promote_to_contributing(
    participant: &mut Participant,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<(), StateMachineError> {
    if participant.status != ParticipantStatus::Ready {
        return Err(StateMachineError::IllegalTransition {
            from: format!("{:?}", participant.status),
            to: "Contributing".to_string(),
        });
    }
    participant.status = ParticipantStatus::Contributing;
    participant.contribution_step = ContributionStep::Downloading;
    participant.temp_contribution_data.clear();
    participant.contribution_started_at = Some(now);
    Ok(())
}

/// Advances `contribution_step` by exactly one legal step. Monotone: a call
/// that names any step other than the immediate successor of the current
/// one fails with a guard error (covers both "skip ahead" and "already past
/// the target step").
pub fn advance_contribution_step(
    participant: &mut Participant,
    target: ContributionStep,
) -> Result<(), StateMachineError> {
    if participant.status != ParticipantStatus::Contributing {
        return Err(StateMachineError::GuardFailed(
            "participant is not contributing".to_string(),
        ));
    }
    match participant.contribution_step.next() {
        Some(next) if next == target => {
            participant.contribution_step = target;
            Ok(())
        }
        _ => Err(StateMachineError::Regression),
    }
}

/// `CONTRIBUTING -> WAITING | DONE` once the Verifier has classified this
/// circuit's contribution (valid or invalid both transition the same way).
/// `contribution_progress` always advances, win or lose.
pub fn complete_circuit(
    participant: &mut Participant,
    total_circuits: u32,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<(), StateMachineError> {
    if participant.status != ParticipantStatus::Contributing
        || participant.contribution_step != ContributionStep::Completed
    {
        return Err(StateMachineError::GuardFailed(
            "contribution step must be Completed before advancing circuits".to_string(),
        ));
    }
    let next_progress = participant.contribution_progress + 1;
    if next_progress < participant.contribution_progress {
        return Err(StateMachineError::Regression);
    }
    participant.contribution_progress = next_progress;
    participant.status = if next_progress > total_circuits {
        ParticipantStatus::Done
    } else {
        ParticipantStatus::Waiting
    };
    participant.last_updated = now;
    Ok(())
}

/// Any `CONTRIBUTING/READY -> TIMEDOUT` transition fired by the Scheduler's
/// timeout enforcement.
pub fn timeout_participant(participant: &mut Participant) -> Result<(), StateMachineError> {
    if !matches!(
        participant.status,
        ParticipantStatus::Contributing | ParticipantStatus::Ready
    ) {
        return Err(StateMachineError::IllegalTransition {
            from: format!("{:?}", participant.status),
            to: "TimedOut".to_string(),
        });
    }
    participant.status = ParticipantStatus::TimedOut;
    Ok(())
}

/// `TIMEDOUT -> EXHUMED -> READY` once the active Timeout has expired.
/// `contribution_progress` is preserved. Fails if a Timeout is still
/// active.
pub fn resume_after_timeout(
    participant: &mut Participant,
    has_active_timeout: bool,
) -> Result<(), StateMachineError> {
    if participant.status != ParticipantStatus::TimedOut {
        return Err(StateMachineError::IllegalTransition {
            from: format!("{:?}", participant.status),
            to: "Exhumed".to_string(),
        });
    }
    if has_active_timeout {
        return Err(StateMachineError::ActiveTimeout);
    }
    participant.status = ParticipantStatus::Exhumed;
    participant.status = ParticipantStatus::Ready;
    Ok(())
}

/// `DONE -> FINALIZING -> FINALIZED`: the coordinator's own participant
/// record follows the ceremony into finalization once every circuit has a
/// valid final contribution. Skipped entirely if the
/// coordinator never registered a `Participant` document.
pub fn finalize_coordinator(participant: &mut Participant) -> Result<(), StateMachineError> {
    if participant.status != ParticipantStatus::Done {
        return Err(StateMachineError::IllegalTransition {
            from: format!("{:?}", participant.status),
            to: "Finalized".to_string(),
        });
    }
    participant.status = ParticipantStatus::Finalizing;
    participant.status = ParticipantStatus::Finalized;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{CeremonyId, CeremonyState, ParticipantId, TimeoutMechanism};

    fn open_ceremony() -> Ceremony {
        let now = chrono::Utc::now();
        Ceremony {
            id: CeremonyId::from("c1"),
            prefix: "small".into(),
            title: "t".into(),
            description: "d".into(),
            start_date: now - chrono::Duration::hours(1),
            end_date: now + chrono::Duration::hours(1),
            state: CeremonyState::Opened,
            coordinator_id: "coord".into(),
            timeout_mechanism: TimeoutMechanism::Fixed,
            penalty_secs: 60,
            penalty_multiplier: 2.0,
            bucket_name: "small-ceremony".into(),
        }
    }

    fn new_participant() -> Participant {
        Participant::new(CeremonyId::from("c1"), ParticipantId::from("alice"), chrono::Utc::now())
    }

    #[test]
    fn join_requires_open_ceremony() {
        let mut ceremony = open_ceremony();
        ceremony.state = CeremonyState::Scheduled;
        let mut p = new_participant();
        assert!(join_ceremony(&mut p, &ceremony).is_err());
    }

    #[test]
    fn happy_path_through_one_circuit() {
        let ceremony = open_ceremony();
        let mut p = new_participant();
        join_ceremony(&mut p, &ceremony).unwrap();
        mark_ready(&mut p, &ceremony, false).unwrap();
        promote_to_contributing(&mut p, chrono::Utc::now()).unwrap();
        advance_contribution_step(&mut p, ContributionStep::Computing).unwrap();
        advance_contribution_step(&mut p, ContributionStep::Uploading).unwrap();
        advance_contribution_step(&mut p, ContributionStep::Verifying).unwrap();
        advance_contribution_step(&mut p, ContributionStep::Completed).unwrap();
        complete_circuit(&mut p, 1, chrono::Utc::now()).unwrap();
        assert_eq!(p.status, ParticipantStatus::Done);
        assert_eq!(p.contribution_progress, 1);
    }

    #[test]
    fn step_cannot_skip_ahead() {
        let ceremony = open_ceremony();
        let mut p = new_participant();
        join_ceremony(&mut p, &ceremony).unwrap();
        mark_ready(&mut p, &ceremony, false).unwrap();
        promote_to_contributing(&mut p, chrono::Utc::now()).unwrap();
        assert!(advance_contribution_step(&mut p, ContributionStep::Uploading).is_err());
    }

    #[test]
    fn step_rejects_already_past_target() {
        let ceremony = open_ceremony();
        let mut p = new_participant();
        join_ceremony(&mut p, &ceremony).unwrap();
        mark_ready(&mut p, &ceremony, false).unwrap();
        promote_to_contributing(&mut p, chrono::Utc::now()).unwrap();
        advance_contribution_step(&mut p, ContributionStep::Computing).unwrap();
        // Re-requesting the step we already passed fails, it is not idempotent.
        assert!(advance_contribution_step(&mut p, ContributionStep::Computing).is_err());
    }

    #[test]
    fn resume_blocked_while_timeout_active() {
        let mut p = new_participant();
        p.status = ParticipantStatus::TimedOut;
        assert!(resume_after_timeout(&mut p, true).is_err());
        resume_after_timeout(&mut p, false).unwrap();
        assert_eq!(p.status, ParticipantStatus::Ready);
    }

    #[test]
    fn invalid_contribution_still_advances_progress() {
        let ceremony = open_ceremony();
        let mut p = new_participant();
        join_ceremony(&mut p, &ceremony).unwrap();
        mark_ready(&mut p, &ceremony, false).unwrap();
        promote_to_contributing(&mut p, chrono::Utc::now()).unwrap();
        for step in [
            ContributionStep::Computing,
            ContributionStep::Uploading,
            ContributionStep::Verifying,
            ContributionStep::Completed,
        ] {
            advance_contribution_step(&mut p, step).unwrap();
        }
        // complete_circuit doesn't take a `valid` flag: the Verifier classifies
        // before calling it, but progress always advances either way.
        complete_circuit(&mut p, 3, chrono::Utc::now()).unwrap();
        assert_eq!(p.contribution_progress, 1);
        assert_eq!(p.status, ParticipantStatus::Waiting);
    }
}

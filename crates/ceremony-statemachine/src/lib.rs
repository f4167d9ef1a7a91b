//! # Ceremony State Machine
//!
//! Pure guard+mutation functions enforcing legal Participant and Ceremony
//! transitions. Every function here takes `&mut` and either
//! mutates in place or leaves its argument untouched, returning
//! `Result<(), StateMachineError>` — never panics on a caller-reachable
//! path. Callers apply these inside a `ceremony_ports::MetaStore` mutation
//! closure so the guard and the write commit together.

pub mod ceremony;
pub mod errors;
pub mod participant;

pub use ceremony::{close_if_due, finalize, open_if_due, pause, resume};
pub use errors::StateMachineError;
pub use participant::{
    advance_contribution_step, complete_circuit, finalize_coordinator, join_ceremony, mark_ready,
    promote_to_contributing, resume_after_timeout, timeout_participant,
};

#[cfg(test)]
mod invariants {
    use super::*;
    use proptest::prelude::*;
    use shared_types::{CeremonyId, CeremonyState, ContributionStep, Participant, ParticipantId, TimeoutMechanism};

    fn open_ceremony() -> shared_types::Ceremony {
        let now = chrono::Utc::now();
        shared_types::Ceremony {
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

    /// `contribution_progress` is non-decreasing across any
    /// sequence of legal transitions, for any number of circuits traversed.
    proptest! {
        #[test]
        fn contribution_progress_never_decreases(num_circuits in 1u32..6, circuits_to_complete in 0u32..6) {
            let ceremony = open_ceremony();
            let mut p = Participant::new(CeremonyId::from("c1"), ParticipantId::from("alice"), chrono::Utc::now());
            let mut last_progress = 0;

            join_ceremony(&mut p, &ceremony).unwrap();
            for _ in 0..circuits_to_complete.min(num_circuits) {
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
                complete_circuit(&mut p, num_circuits, chrono::Utc::now()).unwrap();
                prop_assert!(p.contribution_progress >= last_progress);
                last_progress = p.contribution_progress;

                if p.status == shared_types::ParticipantStatus::Done {
                    break;
                }
            }
        }
    }
}

//! Timeout deadline computation.

use chrono::{DateTime, Duration, Utc};
use shared_types::{Ceremony, Circuit, TimeoutMechanism};

/// The deadline by which the current contributor must reach
/// `step == Completed`, measured from `contribution_started_at`.
///
/// - `FIXED`: `contribution_started_at + circuit.fixed_time_window_secs`.
/// - `DYNAMIC`: `contribution_started_at + ceremony.penalty_multiplier *
///   circuit.avg_timings.full_contribution_secs`. The multiplier `k` is
///   modeled as a per-ceremony field, `Ceremony.penalty_multiplier` (see
///   DESIGN.md), rather than a single process-wide constant.
pub fn deadline_for(
    ceremony: &Ceremony,
    circuit: &Circuit,
    contribution_started_at: DateTime<Utc>,
) -> DateTime<Utc> {
    let window_secs = match ceremony.timeout_mechanism {
        TimeoutMechanism::Fixed => circuit.fixed_time_window_secs.unwrap_or(u64::MAX / 2) as f64,
        TimeoutMechanism::Dynamic => {
            ceremony.penalty_multiplier * circuit.avg_timings.full_contribution_secs
        }
    };
    contribution_started_at + Duration::milliseconds((window_secs * 1000.0) as i64)
}

/// Timeouts firing exactly at the deadline are expired (`>=`, not `>`).
pub fn is_overdue(deadline: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now >= deadline
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{
        AvgTimings, CeremonyId, CeremonyState, CircuitId, CircuitMetadata, VerificationConfig,
        WaitingQueue,
    };

    fn ceremony_with(mechanism: TimeoutMechanism, multiplier: f64) -> Ceremony {
        let now = Utc::now();
        Ceremony {
            id: CeremonyId::from("c1"),
            prefix: "small".into(),
            title: "t".into(),
            description: "d".into(),
            start_date: now,
            end_date: now + Duration::hours(1),
            state: CeremonyState::Opened,
            coordinator_id: "coord".into(),
            timeout_mechanism: mechanism,
            penalty_secs: 30,
            penalty_multiplier: multiplier,
            bucket_name: "small-ceremony".into(),
        }
    }

    fn circuit_with(fixed_window: Option<u64>, avg_full: f64) -> Circuit {
        Circuit {
            ceremony_id: CeremonyId::from("c1"),
            id: CircuitId::from("circuit-1"),
            sequence_position: 1,
            prefix: "small".into(),
            metadata: CircuitMetadata::default(),
            zkey_size_bytes: 1024,
            fixed_time_window_secs: fixed_window,
            waiting_queue: WaitingQueue::default(),
            avg_timings: AvgTimings {
                full_contribution_secs: avg_full,
                ..Default::default()
            },
            verification: VerificationConfig::default(),
        }
    }

    #[test]
    fn fixed_deadline_uses_circuit_window() {
        let ceremony = ceremony_with(TimeoutMechanism::Fixed, 2.0);
        let circuit = circuit_with(Some(10), 0.0);
        let started = Utc::now();
        let deadline = deadline_for(&ceremony, &circuit, started);
        assert_eq!(deadline, started + Duration::seconds(10));
    }

    #[test]
    fn dynamic_deadline_uses_multiplier_times_avg() {
        let ceremony = ceremony_with(TimeoutMechanism::Dynamic, 3.0);
        let circuit = circuit_with(None, 20.0);
        let started = Utc::now();
        let deadline = deadline_for(&ceremony, &circuit, started);
        assert_eq!(deadline, started + Duration::seconds(60));
    }

    #[test]
    fn overdue_is_inclusive_of_exact_deadline() {
        let now = Utc::now();
        assert!(is_overdue(now, now));
        assert!(is_overdue(now - Duration::seconds(1), now));
        assert!(!is_overdue(now + Duration::seconds(1), now));
    }
}

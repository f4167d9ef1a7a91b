//! Precondition checks shared by every `UploadCoordinator` call. Pure
//! functions so they can be unit tested without a store.

use crate::errors::UploadError;
use shared_types::{Circuit, ContributionStep, Participant, ParticipantStatus};

/// The object key the current contributor's upload must target:
/// `circuits/{prefix}/contributions/{prefix}_{nextZkeyIndex}.zkey`, where
/// `nextZkeyIndex` is derived from the circuit's `completedContributions`
/// counter.
pub fn expected_object_key(circuit: &Circuit) -> String {
    let next_index = shared_types::ZkeyIndex::format(circuit.waiting_queue.completed_contributions + 1);
    format!(
        "circuits/{}/contributions/{}_{}.zkey",
        circuit.prefix, circuit.prefix, next_index
    )
}

/// Validates that `participant` is the legitimate uploader of
/// `(bucket, object_key)` right now: `CONTRIBUTING, step=UPLOADING`, the
/// object key matches the expected next zkey, and the bucket matches the
/// one Setup assigned to the ceremony. Violations never mutate state.
pub fn check(
    participant: &Participant,
    circuit: &Circuit,
    ceremony_bucket: &str,
    bucket: &str,
    object_key: &str,
) -> Result<(), UploadError> {
    if participant.status != ParticipantStatus::Contributing
        || participant.contribution_step != ContributionStep::Uploading
    {
        return Err(UploadError::PreconditionFailed(format!(
            "participant {} is not CONTRIBUTING/UPLOADING (status={:?}, step={:?})",
            participant.id, participant.status, participant.contribution_step
        )));
    }

    if bucket != ceremony_bucket {
        return Err(UploadError::PreconditionFailed(format!(
            "bucket {bucket} does not match ceremony bucket {ceremony_bucket}"
        )));
    }

    let expected = expected_object_key(circuit);
    if object_key != expected {
        return Err(UploadError::PreconditionFailed(format!(
            "object key {object_key} does not match expected {expected}"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{
        AvgTimings, CeremonyId, CircuitId, CircuitMetadata, ParticipantId, VerificationConfig,
        WaitingQueue,
    };

    fn circuit() -> Circuit {
        Circuit {
            ceremony_id: CeremonyId::from("c1"),
            id: CircuitId::from("circuit-1"),
            sequence_position: 1,
            prefix: "small".into(),
            metadata: CircuitMetadata::default(),
            zkey_size_bytes: 1024,
            fixed_time_window_secs: Some(60),
            waiting_queue: WaitingQueue::default(),
            avg_timings: AvgTimings::default(),
            verification: VerificationConfig::default(),
        }
    }

    fn uploading_participant() -> Participant {
        let mut p = Participant::new(CeremonyId::from("c1"), ParticipantId::from("alice"), chrono::Utc::now());
        p.status = ParticipantStatus::Contributing;
        p.contribution_step = ContributionStep::Uploading;
        p
    }

    #[test]
    fn expected_key_uses_next_zkey_index() {
        let c = circuit();
        assert_eq!(expected_object_key(&c), "circuits/small/contributions/small_00001.zkey");
    }

    #[test]
    fn rejects_participant_not_uploading_step() {
        let mut p = uploading_participant();
        p.contribution_step = ContributionStep::Computing;
        let c = circuit();
        assert!(check(&p, &c, "bucket", "bucket", &expected_object_key(&c)).is_err());
    }

    #[test]
    fn rejects_wrong_bucket() {
        let p = uploading_participant();
        let c = circuit();
        assert!(check(&p, &c, "bucket", "other-bucket", &expected_object_key(&c)).is_err());
    }

    #[test]
    fn rejects_wrong_object_key() {
        let p = uploading_participant();
        let c = circuit();
        assert!(check(&p, &c, "bucket", "bucket", "circuits/small/contributions/small_99999.zkey").is_err());
    }

    #[test]
    fn accepts_correct_tuple() {
        let p = uploading_participant();
        let c = circuit();
        assert!(check(&p, &c, "bucket", "bucket", &expected_object_key(&c)).is_ok());
    }
}

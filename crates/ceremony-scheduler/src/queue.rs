//! Pure waiting-queue mechanics, operating directly on the
//! `WaitingQueue` embedded in a `Circuit`. No I/O; the async `Scheduler` in
//! `scheduler.rs` applies these inside a `MetaStore::mutate_circuit`
//! closure so the CAS write and the queue logic commit together.

use crate::errors::SchedulerError;
use shared_types::{ParticipantId, WaitingQueue, ZkeyIndex};

/// Admits `participant_id` to the tail of the queue. If the queue was
/// empty, it also becomes `current_contributor` — the caller is
/// responsible for promoting that participant's state in the same
/// transaction. Returns `true` iff the participant became the new head.
pub fn admit(queue: &mut WaitingQueue, participant_id: ParticipantId) -> bool {
    let becomes_head = queue.contributors.is_empty();
    queue.contributors.push(participant_id.clone());
    if becomes_head {
        queue.current_contributor = Some(participant_id);
    }
    becomes_head
}

/// Removes the head of the queue (must equal `leaving`), updates the
/// completed/failed counters, and promotes the new head if one exists.
/// Returns the new head, if any (the caller promotes its participant
/// state).
pub fn hand_off(
    queue: &mut WaitingQueue,
    leaving: &ParticipantId,
    valid: bool,
) -> Result<Option<ParticipantId>, SchedulerError> {
    if queue.contributors.is_empty() {
        return Err(SchedulerError::QueueEmpty);
    }
    let head = &queue.contributors[0];
    if head != leaving {
        return Err(SchedulerError::NotCurrentHead {
            expected: leaving.to_string(),
            actual: head.to_string(),
        });
    }

    queue.contributors.remove(0);
    if valid {
        queue.completed_contributions += 1;
    } else {
        queue.failed_contributions += 1;
    }

    queue.current_contributor = queue.contributors.first().cloned();
    Ok(queue.current_contributor.clone())
}

/// The `zkeyIndex` the *next* valid contribution to this circuit will be
/// assigned.
pub fn next_zkey_index(queue: &WaitingQueue) -> ZkeyIndex {
    ZkeyIndex::format(queue.completed_contributions + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(s: &str) -> ParticipantId {
        ParticipantId::from(s)
    }

    #[test]
    fn admitting_to_empty_queue_becomes_head() {
        let mut q = WaitingQueue::default();
        assert!(admit(&mut q, pid("alice")));
        assert_eq!(q.current_contributor, Some(pid("alice")));
        assert!(q.is_consistent());
    }

    #[test]
    fn admitting_to_nonempty_queue_stays_queued() {
        let mut q = WaitingQueue::default();
        admit(&mut q, pid("alice"));
        assert!(!admit(&mut q, pid("bob")));
        assert_eq!(q.contributors, vec![pid("alice"), pid("bob")]);
        assert_eq!(q.current_contributor, Some(pid("alice")));
    }

    #[test]
    fn hand_off_promotes_fifo() {
        let mut q = WaitingQueue::default();
        admit(&mut q, pid("alice"));
        admit(&mut q, pid("bob"));

        let new_head = hand_off(&mut q, &pid("alice"), true).unwrap();
        assert_eq!(new_head, Some(pid("bob")));
        assert_eq!(q.completed_contributions, 1);
        assert!(q.is_consistent());
    }

    #[test]
    fn hand_off_on_last_contributor_empties_queue() {
        let mut q = WaitingQueue::default();
        admit(&mut q, pid("alice"));

        let new_head = hand_off(&mut q, &pid("alice"), false).unwrap();
        assert_eq!(new_head, None);
        assert_eq!(q.failed_contributions, 1);
        assert!(q.is_consistent());
    }

    #[test]
    fn hand_off_rejects_non_head_leaver() {
        let mut q = WaitingQueue::default();
        admit(&mut q, pid("alice"));
        admit(&mut q, pid("bob"));
        assert!(hand_off(&mut q, &pid("bob"), true).is_err());
    }

    #[test]
    fn genesis_then_first_contributor_index() {
        let q = WaitingQueue::default();
        assert_eq!(next_zkey_index(&q).as_str(), "00001");
    }
}

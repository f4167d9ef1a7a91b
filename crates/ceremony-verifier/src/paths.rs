//! Object key conventions the Verifier reads/writes. Shares
//! the `circuits/{prefix}/contributions/{prefix}_{index}.zkey` convention
//! `ceremony-upload::preconditions` uses for the zkey itself; the
//! transcript and pot conventions are local to this crate.

use shared_types::{Circuit, ParticipantId, ZkeyIndex};

pub fn genesis_zkey_key(circuit: &Circuit) -> String {
    format!(
        "circuits/{}/contributions/{}_{}.zkey",
        circuit.prefix,
        circuit.prefix,
        ZkeyIndex::genesis()
    )
}

/// The zkey the current head of the queue is expected to have uploaded,
/// derived from the same `completedContributions + 1` counter the
/// Scheduler and UploadCoordinator use.
pub fn last_zkey_key(circuit: &Circuit) -> String {
    let index = ZkeyIndex::format(circuit.waiting_queue.completed_contributions + 1);
    format!("circuits/{}/contributions/{}_{}.zkey", circuit.prefix, circuit.prefix, index)
}

/// Powers-of-tau file for this circuit, named by its `pot` exponent.
pub fn pot_key(circuit: &Circuit) -> String {
    format!("pot/pot_{}.ptau", circuit.metadata.pot)
}

pub fn transcript_key(circuit: &Circuit, participant_id: &ParticipantId) -> String {
    let index = ZkeyIndex::format(circuit.waiting_queue.completed_contributions + 1);
    format!(
        "circuits/{}/transcripts/{}_{}_{}_verification_transcript.log",
        circuit.prefix, circuit.prefix, index, participant_id
    )
}

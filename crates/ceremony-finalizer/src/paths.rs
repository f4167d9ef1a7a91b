//! Object key conventions used by finalization.

use shared_types::{Circuit, ZkeyIndex};

/// The last *valid* zkey already on disk for this circuit, i.e. the zkey at
/// `completedContributions` (not `+1`, since no pending contribution exists
/// once the ceremony is `CLOSED`).
pub fn last_valid_zkey_key(circuit: &Circuit) -> String {
    let index = ZkeyIndex::format(circuit.waiting_queue.completed_contributions);
    format!("circuits/{}/contributions/{}_{}.zkey", circuit.prefix, circuit.prefix, index)
}

pub fn genesis_zkey_key(circuit: &Circuit) -> String {
    format!(
        "circuits/{}/contributions/{}_{}.zkey",
        circuit.prefix,
        circuit.prefix,
        ZkeyIndex::genesis()
    )
}

pub fn pot_key(circuit: &Circuit) -> String {
    format!("pot/pot_{}.ptau", circuit.metadata.pot)
}

pub fn final_zkey_key(circuit: &Circuit) -> String {
    format!(
        "circuits/{}/contributions/{}_{}.zkey",
        circuit.prefix,
        circuit.prefix,
        ZkeyIndex::final_index()
    )
}

pub fn final_transcript_key(circuit: &Circuit, coordinator_id: &str) -> String {
    format!(
        "circuits/{}/transcripts/{}_{}_{}_verification_transcript.log",
        circuit.prefix,
        circuit.prefix,
        ZkeyIndex::final_index(),
        coordinator_id
    )
}

pub fn vkey_key(circuit: &Circuit) -> String {
    format!("circuits/{}/{}_vkey.json", circuit.prefix, circuit.prefix)
}

pub fn verifier_contract_key(circuit: &Circuit) -> String {
    format!("circuits/{}/{}_verifier.sol", circuit.prefix, circuit.prefix)
}

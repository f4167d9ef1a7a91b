//! Contribution entity (owned by a Circuit).

use crate::ids::{CircuitId, ContributionId, ParticipantId};
use crate::zkey_index::ZkeyIndex;
use serde::{Deserialize, Serialize};

/// Storage paths and content hashes produced by verifying one contribution.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ContributionFiles {
    pub last_zkey_storage_path: String,
    pub transcript_storage_path: String,
    pub last_zkey_blake2b_hash: String,
    pub transcript_blake2b_hash: String,
    pub verification_key_storage_path: Option<String>,
    pub verifier_contract_storage_path: Option<String>,
}

/// Public randomness applied to the final contribution during finalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Beacon {
    pub value_hex: String,
    pub num_exp_iterations: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contribution {
    pub id: ContributionId,
    pub circuit_id: CircuitId,
    pub participant_id: ParticipantId,
    pub zkey_index: ZkeyIndex,
    pub valid: bool,
    pub contribution_computation_time_secs: f64,
    pub verification_computation_time_secs: f64,
    pub files: ContributionFiles,
    pub beacon: Option<Beacon>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub last_updated: chrono::DateTime<chrono::Utc>,
}

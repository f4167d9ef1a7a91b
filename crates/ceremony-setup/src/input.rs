//! Inputs to `setupCeremony`. The caller supplies the
//! circuit artifacts up front since step 5 uploads them and step 4 needs
//! the pot file's size to provision VM disk.

use chrono::{DateTime, Utc};
use shared_types::{CircuitMetadata, TimeoutMechanism, VerificationMechanism};

pub struct CircuitSetupInput {
    /// 1-based position among this ceremony's circuits; every position in
    /// `1..=circuits.len()` must appear exactly once.
    pub sequence_position: u32,
    pub prefix: String,
    pub metadata: CircuitMetadata,
    pub zkey_size_bytes: u64,
    pub fixed_time_window_secs: Option<u64>,
    pub mechanism: VerificationMechanism,
    pub genesis_zkey: Vec<u8>,
    pub pot: Vec<u8>,
    pub wasm: Vec<u8>,
    pub r1cs: Vec<u8>,
}

pub struct CeremonySetupInput {
    pub prefix: String,
    pub title: String,
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub coordinator_id: String,
    pub timeout_mechanism: TimeoutMechanism,
    pub penalty_secs: u64,
    pub penalty_multiplier: f64,
    pub circuits: Vec<CircuitSetupInput>,
}

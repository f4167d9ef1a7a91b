//! Circuit entity (owned by a Ceremony) and its embedded waiting queue.

use crate::ids::{CeremonyId, CircuitId, ParticipantId};
use serde::{Deserialize, Serialize};

/// Which mechanism verifies contributions to this circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationMechanism {
    /// In-process, bounded-wall-clock verification.
    Cf,
    /// Dispatched to a dedicated compute VM.
    Vm,
}

/// Circuit metadata carried from the R1CS/circuit compiler, opaque to the
/// core beyond record-keeping.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CircuitMetadata {
    pub constraints: u64,
    pub wires: u64,
    pub labels: u64,
    pub public_inputs: u64,
    pub private_inputs: u64,
    pub outputs: u64,
    pub pot: u32,
    pub curve: String,
}

/// Running average timings for a circuit, used by the dynamic timeout
/// mechanism and for VM sizing estimates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct AvgTimings {
    pub contribution_computation_secs: f64,
    pub full_contribution_secs: f64,
    pub verify_cloud_function_secs: f64,
}

impl AvgTimings {
    /// Running mean update: `avg' = (avg + t) / 2` once an average exists,
    /// otherwise the first sample seeds it. Only valid contributions are
    /// folded in.
    pub fn fold_full_contribution(&mut self, sample_secs: f64) {
        self.full_contribution_secs = if self.full_contribution_secs > 0.0 {
            (self.full_contribution_secs + sample_secs) / 2.0
        } else {
            sample_secs
        };
    }

    pub fn fold_verify(&mut self, sample_secs: f64) {
        self.verify_cloud_function_secs = if self.verify_cloud_function_secs > 0.0 {
            (self.verify_cloud_function_secs + sample_secs) / 2.0
        } else {
            sample_secs
        };
    }
}

/// Verification dispatch configuration for a circuit.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VerificationConfig {
    pub mechanism: Option<VerificationMechanism>,
    pub vm_instance_id: Option<String>,
}

impl Default for VerificationMechanism {
    fn default() -> Self {
        VerificationMechanism::Cf
    }
}

/// Per-circuit waiting queue: an ordered sequence of contributors plus the
/// counters that drive `zkeyIndex` assignment.
///
/// Invariant: `current_contributor` is `None` iff `contributors` is empty;
/// if `Some`, `contributors[0]` equals it.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WaitingQueue {
    pub contributors: Vec<ParticipantId>,
    pub current_contributor: Option<ParticipantId>,
    pub completed_contributions: u64,
    pub failed_contributions: u64,
}

impl WaitingQueue {
    pub fn is_empty(&self) -> bool {
        self.contributors.is_empty()
    }

    /// `true` exactly when the invariant above holds; used by property tests
    /// and assertions at call boundaries rather than being enforced by the
    /// type itself (the queue is mutated by several components).
    pub fn is_consistent(&self) -> bool {
        match &self.current_contributor {
            None => self.contributors.is_empty(),
            Some(head) => self.contributors.first() == Some(head),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Circuit {
    pub ceremony_id: CeremonyId,
    pub id: CircuitId,
    /// 1-based position in the ceremony's circuit ordering.
    pub sequence_position: u32,
    pub prefix: String,
    pub metadata: CircuitMetadata,
    pub zkey_size_bytes: u64,
    pub fixed_time_window_secs: Option<u64>,
    pub waiting_queue: WaitingQueue,
    pub avg_timings: AvgTimings,
    pub verification: VerificationConfig,
}

impl Circuit {
    pub fn new(
        ceremony_id: CeremonyId,
        id: CircuitId,
        sequence_position: u32,
        prefix: String,
        metadata: CircuitMetadata,
        zkey_size_bytes: u64,
        fixed_time_window_secs: Option<u64>,
        verification: VerificationConfig,
    ) -> Self {
        Self {
            ceremony_id,
            id,
            sequence_position,
            prefix,
            metadata,
            zkey_size_bytes,
            fixed_time_window_secs,
            waiting_queue: WaitingQueue::default(),
            avg_timings: AvgTimings::default(),
            verification,
        }
    }
}

//! Ceremony entity: the top-level aggregate owning circuits and participants.

use crate::ids::CeremonyId;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a ceremony.
///
/// `SCHEDULED -> OPENED -> CLOSED -> FINALIZED`, with `PAUSED` reachable from
/// `OPENED` by coordinator action (not a timed transition).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CeremonyState {
    Scheduled,
    Opened,
    Paused,
    Closed,
    Finalized,
}

/// How a circuit's per-contributor deadline is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeoutMechanism {
    /// Deadline is `circuit.fixed_time_window_secs` after the contribution started.
    Fixed,
    /// Deadline is `penalty_multiplier * circuit.avg_timings.full_contribution_secs`.
    Dynamic,
}

/// A single Phase 2 trusted setup ceremony: an ordered list of circuits that
/// every contributor advances through in sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ceremony {
    pub id: CeremonyId,
    /// Filesystem/bucket-safe slug, unique across all ceremonies.
    pub prefix: String,
    pub title: String,
    pub description: String,
    pub start_date: chrono::DateTime<chrono::Utc>,
    pub end_date: chrono::DateTime<chrono::Utc>,
    pub state: CeremonyState,
    pub coordinator_id: String,
    pub timeout_mechanism: TimeoutMechanism,
    /// Seconds a timed-out participant must wait before it may resume.
    pub penalty_secs: u64,
    /// Multiplier `k` applied to `avg_timings.full_contribution` under the
    /// `Dynamic` timeout mechanism. Modeled as a per-ceremony field rather
    /// than a single process-wide constant (see DESIGN.md).
    pub penalty_multiplier: f64,
    /// Name of the bucket created for this ceremony's artifacts.
    pub bucket_name: String,
}

impl Ceremony {
    pub fn is_open(&self) -> bool {
        matches!(self.state, CeremonyState::Opened)
    }
}

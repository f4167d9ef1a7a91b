//! Participant entity (owned by a Ceremony, keyed by user identity).

use crate::ids::{CeremonyId, ContributionId, ParticipantId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticipantStatus {
    Created,
    Waiting,
    Ready,
    Contributing,
    TimedOut,
    Done,
    Finalizing,
    Finalized,
    Exhumed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ContributionStep {
    Downloading,
    Computing,
    Uploading,
    Verifying,
    Completed,
}

impl ContributionStep {
    /// The step that legally follows this one, or `None` if already terminal.
    pub fn next(self) -> Option<Self> {
        match self {
            ContributionStep::Downloading => Some(ContributionStep::Computing),
            ContributionStep::Computing => Some(ContributionStep::Uploading),
            ContributionStep::Uploading => Some(ContributionStep::Verifying),
            ContributionStep::Verifying => Some(ContributionStep::Completed),
            ContributionStep::Completed => None,
        }
    }
}

/// A single uploaded part reported by a client during a multi-part upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedChunk {
    pub part_number: u32,
    pub e_tag: String,
}

/// Single-writer scratch space for the current contributor's in-flight
/// upload. Only the owning participant and the Scheduler (on timeout) may
/// mutate this.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TempContributionData {
    pub upload_id: Option<String>,
    pub chunks: Vec<UploadedChunk>,
    /// Client-reported elapsed time, set by `permanentlyStoreCurrentContributionTimeAndHash`.
    /// Informational only: the Verifier derives its own
    /// `contribution_computation_time_secs` from `contribution_started_at`
    /// rather than trusting this value (see DESIGN.md).
    pub contribution_computation_time_secs: Option<f64>,
    /// Client-reported blake2b-512 hex hash of its locally computed zkey,
    /// set by the same RPC. Checked against the server-side hash the
    /// Verifier computes after upload, not trusted on its own.
    pub last_zkey_hash: Option<String>,
}

impl TempContributionData {
    pub fn clear(&mut self) {
        self.upload_id = None;
        self.chunks.clear();
        self.contribution_computation_time_secs = None;
        self.last_zkey_hash = None;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub ceremony_id: CeremonyId,
    pub id: ParticipantId,
    pub status: ParticipantStatus,
    pub contribution_step: ContributionStep,
    /// 0 = just created; k in [1, N] = working on circuit k; N+1 = all done.
    pub contribution_progress: u32,
    pub contributions: Vec<ContributionId>,
    pub temp_contribution_data: TempContributionData,
    pub contribution_started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub verification_started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub last_updated: chrono::DateTime<chrono::Utc>,
}

impl Participant {
    pub fn new(ceremony_id: CeremonyId, id: ParticipantId, now: chrono::DateTime<chrono::Utc>) -> Self {
        Self {
            ceremony_id,
            id,
            status: ParticipantStatus::Created,
            contribution_step: ContributionStep::Downloading,
            contribution_progress: 0,
            contributions: Vec::new(),
            temp_contribution_data: TempContributionData::default(),
            contribution_started_at: None,
            verification_started_at: None,
            last_updated: now,
        }
    }

    pub fn is_current_contributor_for(&self, sequence_position: u32) -> bool {
        self.status == ParticipantStatus::Contributing
            && self.contribution_progress == sequence_position
    }
}

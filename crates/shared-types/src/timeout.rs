//! Timeout entity (owned by a Participant).

use crate::ids::ParticipantId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeoutType {
    BlockingContribution,
    BlockingCloudFunction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timeout {
    pub participant_id: ParticipantId,
    pub kind: TimeoutType,
    pub start_date: chrono::DateTime<chrono::Utc>,
    pub end_date: chrono::DateTime<chrono::Utc>,
}

impl Timeout {
    /// Active iff `end_date >= now`.
    pub fn is_active(&self, now: chrono::DateTime<chrono::Utc>) -> bool {
        self.end_date >= now
    }
}

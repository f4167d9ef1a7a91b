//! `Authenticator`: identity verification is deliberately out of scope —
//! the core consumes an authenticated identity and a coordinator
//! capability flag, it does not verify credentials itself. This trait
//! is the interface the gateway consumes; no implementation lives in this
//! workspace.

use async_trait::async_trait;
use shared_types::ParticipantId;

/// The identity and capability an inbound HTTP request carries, as
/// resolved by whatever external auth system is wired in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    /// No identity presented, or the presented credential didn't resolve.
    Anonymous,
    /// An authenticated contributor, not holding the coordinator capability.
    Contributor(ParticipantId),
    /// An authenticated coordinator. `ParticipantId` is `None` when the
    /// coordinator never joined its own ceremony as a participant.
    Coordinator(Option<ParticipantId>),
}

impl Principal {
    pub fn participant_id(&self) -> Option<&ParticipantId> {
        match self {
            Principal::Anonymous => None,
            Principal::Contributor(id) => Some(id),
            Principal::Coordinator(id) => id.as_ref(),
        }
    }

    pub fn is_coordinator(&self) -> bool {
        matches!(self, Principal::Coordinator(_))
    }
}

/// Resolves a bearer credential (an `Authorization` header value, already
/// stripped of the `Bearer ` prefix) into a `Principal`. Left as an
/// interface — checked via an injected `Authenticator` port, out of scope
/// to implement here, consumed only as an interface.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, bearer_token: Option<&str>) -> Principal;
}

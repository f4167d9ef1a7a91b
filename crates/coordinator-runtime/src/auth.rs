//! `DevAuthenticator`: a placeholder `Authenticator` implementation so the
//! binary is runnable standalone. `ceremony-ports::Authenticator` is
//! deliberately left uninhabited in the workspace; this is
//! process wiring, not a claim that it belongs in `ceremony-ports` or
//! `ceremony-api-gateway` (see DESIGN.md).

use async_trait::async_trait;
use ceremony_ports::{Authenticator, Principal};

/// Resolves a single configured bearer token to the coordinator capability
/// and treats every other credential (including none) as anonymous. No
/// notion of per-participant identity: callers needing `Principal::Contributor`
/// must supply their own `Authenticator` in front of a production deployment.
pub struct DevAuthenticator {
    coordinator_token: String,
}

impl DevAuthenticator {
    pub fn new(coordinator_token: String) -> Self {
        Self { coordinator_token }
    }
}

#[async_trait]
impl Authenticator for DevAuthenticator {
    async fn authenticate(&self, bearer_token: Option<&str>) -> Principal {
        match bearer_token {
            Some(token) if token == self.coordinator_token => Principal::Coordinator(None),
            _ => Principal::Anonymous,
        }
    }
}

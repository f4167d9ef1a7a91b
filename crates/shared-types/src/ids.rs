//! Opaque identifiers for ceremony entities.
//!
//! All are newtypes over `String` so call sites can't accidentally swap a
//! `CircuitId` for a `ParticipantId` at a function boundary.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! opaque_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

opaque_id!(CeremonyId);
opaque_id!(CircuitId);
opaque_id!(ParticipantId);
opaque_id!(ContributionId);

/// Generates a new random opaque id (v4 UUID, hyphenated).
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

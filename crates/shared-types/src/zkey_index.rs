//! 5-digit zero-padded zkey sequence numbers, plus the reserved `"final"`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Either a zero-padded 5-digit decimal (`"00001"`) or the literal `"final"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ZkeyIndex(String);

impl ZkeyIndex {
    pub const GENESIS: &'static str = "00000";
    pub const FINAL: &'static str = "final";

    /// Formats a contribution count as a 5-digit zero-padded index.
    ///
    /// `format(1) == "00001"`, matching the genesis zkey's `"00000"`.
    pub fn format(count: u64) -> Self {
        Self(format!("{count:05}"))
    }

    pub fn genesis() -> Self {
        Self(Self::GENESIS.to_string())
    }

    pub fn final_index() -> Self {
        Self(Self::FINAL.to_string())
    }

    pub fn is_final(&self) -> bool {
        self.0 == Self::FINAL
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ZkeyIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genesis_is_zero() {
        assert_eq!(ZkeyIndex::genesis().as_str(), "00000");
    }

    #[test]
    fn first_contributor_is_one() {
        assert_eq!(ZkeyIndex::format(1).as_str(), "00001");
    }

    #[test]
    fn pads_to_five_digits() {
        assert_eq!(ZkeyIndex::format(42).as_str(), "00042");
    }

    #[test]
    fn final_is_reserved_literal() {
        assert!(ZkeyIndex::final_index().is_final());
        assert!(!ZkeyIndex::format(1).is_final());
    }
}

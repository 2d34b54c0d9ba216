//! Vote encodings.
//!
//! Governance votes use the Governor convention the DAO contract
//! exposes: 0 = Against, 1 = For, 2 = Abstain. Reputation votes are the
//! lightweight per-project up/down kind and never touch the chain.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

// ════════════════════════════════════════════════════════════════════════════
// GOVERNANCE SUPPORT
// ════════════════════════════════════════════════════════════════════════════

/// Governance vote choice, wire-encoded as the Governor support integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoteSupport {
    Against,
    For,
    Abstain,
}

impl VoteSupport {
    /// Decode the Governor support value (0/1/2).
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(VoteSupport::Against),
            1 => Some(VoteSupport::For),
            2 => Some(VoteSupport::Abstain),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_u8(&self) -> u8 {
        match self {
            VoteSupport::Against => 0,
            VoteSupport::For => 1,
            VoteSupport::Abstain => 2,
        }
    }
}

impl Serialize for VoteSupport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_u8())
    }
}

impl<'de> Deserialize<'de> for VoteSupport {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let v = u8::deserialize(deserializer)?;
        VoteSupport::from_u8(v)
            .ok_or_else(|| de::Error::custom(format!("invalid vote support {}", v)))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// REPUTATION VOTE
// ════════════════════════════════════════════════════════════════════════════

/// Per-project reputation vote, wire-encoded as a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReputationVote {
    Upvote,
    Downvote,
}

// ════════════════════════════════════════════════════════════════════════════
// TESTS
// ════════════════════════════════════════════════════════════════════════════

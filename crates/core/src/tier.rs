//! Loyalty tiers and the fixed priority table used for every tier comparison.
//!
//! Ranking, highest privilege first:
//! Platinum → Gold → Silver → Blue → Warning → Rejected

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use utoipa::ToSchema;

/// A named loyalty level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
pub enum Tier {
    Platinum,
    Gold,
    Silver,
    /// Entry level for every ticket buyer.
    Blue,
    /// A Blue customer who stayed Blue for another period.
    Warning,
    /// A Warning customer who stayed Blue again.
    Rejected,
}

/// Tier priority table. Lower index = higher privilege.
pub const TIER_PRIORITY: [Tier; 6] = [
    Tier::Platinum,
    Tier::Gold,
    Tier::Silver,
    Tier::Blue,
    Tier::Warning,
    Tier::Rejected,
];

impl Tier {
    /// Position in [`TIER_PRIORITY`] (Platinum = 0 … Rejected = 5).
    pub fn rank(&self) -> usize {
        match self {
            Tier::Platinum => 0,
            Tier::Gold => 1,
            Tier::Silver => 2,
            Tier::Blue => 3,
            Tier::Warning => 4,
            Tier::Rejected => 5,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Tier::Platinum => "Platinum",
            Tier::Gold => "Gold",
            Tier::Silver => "Silver",
            Tier::Blue => "Blue",
            Tier::Warning => "Warning",
            Tier::Rejected => "Rejected",
        }
    }

    /// Parse a tier name. Surrounding whitespace and letter case are ignored.
    pub fn parse(raw: &str) -> Option<Tier> {
        let raw = raw.trim();
        TIER_PRIORITY
            .iter()
            .copied()
            .find(|tier| tier.name().eq_ignore_ascii_case(raw))
    }

    /// The next tier a customer can earn through ticket purchases.
    /// Warning and Rejected customers climb back through Silver.
    pub fn next_up(&self) -> Option<Tier> {
        match self {
            Tier::Platinum => None,
            Tier::Gold => Some(Tier::Platinum),
            Tier::Silver => Some(Tier::Gold),
            Tier::Blue | Tier::Warning | Tier::Rejected => Some(Tier::Silver),
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A tier value as it arrives from storage or a request body.
///
/// Unrecognized names are kept verbatim so they survive a round trip to the
/// store, but they have no rank and never take part in upgrade/downgrade
/// inference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TierLabel {
    Known(Tier),
    Unknown(String),
}

impl TierLabel {
    pub fn parse(raw: &str) -> Self {
        match Tier::parse(raw) {
            Some(tier) => TierLabel::Known(tier),
            None => TierLabel::Unknown(raw.to_string()),
        }
    }

    pub fn rank(&self) -> Option<usize> {
        self.tier().map(|t| t.rank())
    }

    pub fn tier(&self) -> Option<Tier> {
        match self {
            TierLabel::Known(tier) => Some(*tier),
            TierLabel::Unknown(_) => None,
        }
    }

    pub fn is(&self, tier: Tier) -> bool {
        self.tier() == Some(tier)
    }

    pub fn as_str(&self) -> &str {
        match self {
            TierLabel::Known(tier) => tier.name(),
            TierLabel::Unknown(raw) => raw,
        }
    }
}

impl From<Tier> for TierLabel {
    fn from(tier: Tier) -> Self {
        TierLabel::Known(tier)
    }
}

impl fmt::Display for TierLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TierLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TierLabel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(TierLabel::parse(&raw))
    }
}

//! Ticket-count thresholds that map a period's purchases to a proposed tier.

use lottery_core::config::LoyaltyConfig;
use lottery_core::settings::{self, Setting};
use lottery_core::{LoyaltyError, Tier};
use serde::Serialize;
use utoipa::ToSchema;

/// Setting keys for the monthly thresholds, highest tier first.
pub const MONTHLY_KEYS: [&str; 3] = [
    settings::MONTHLY_PLATINUM_TICKETS,
    settings::MONTHLY_GOLD_TICKETS,
    settings::MONTHLY_SILVER_TICKETS,
];

/// Setting keys for the entry thresholds, highest tier first.
pub const ENTRY_KEYS: [&str; 3] = [
    settings::ENTRY_PLATINUM_TICKETS,
    settings::ENTRY_GOLD_TICKETS,
    settings::ENTRY_SILVER_TICKETS,
];

/// Minimum tickets for each earnable tier. Anything below `silver` is Blue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct TierThresholds {
    pub platinum: u64,
    pub gold: u64,
    pub silver: u64,
}

impl TierThresholds {
    pub fn new(platinum: u64, gold: u64, silver: u64) -> Result<Self, LoyaltyError> {
        if !(platinum >= gold && gold >= silver) {
            return Err(LoyaltyError::Config(format!(
                "tier thresholds must not decrease with rank (platinum={platinum}, gold={gold}, silver={silver})"
            )));
        }
        Ok(Self {
            platinum,
            gold,
            silver,
        })
    }

    pub fn monthly(config: &LoyaltyConfig) -> Self {
        Self {
            platinum: config.monthly_platinum_tickets,
            gold: config.monthly_gold_tickets,
            silver: config.monthly_silver_tickets,
        }
    }

    pub fn entry(config: &LoyaltyConfig) -> Self {
        Self {
            platinum: config.entry_platinum_tickets,
            gold: config.entry_gold_tickets,
            silver: config.entry_silver_tickets,
        }
    }

    /// Monthly thresholds from stored settings, falling back per key.
    pub fn monthly_from_settings(rows: &[Setting], fallback: Self) -> Self {
        Self {
            platinum: lookup(rows, settings::MONTHLY_PLATINUM_TICKETS).unwrap_or(fallback.platinum),
            gold: lookup(rows, settings::MONTHLY_GOLD_TICKETS).unwrap_or(fallback.gold),
            silver: lookup(rows, settings::MONTHLY_SILVER_TICKETS).unwrap_or(fallback.silver),
        }
    }

    /// Entry thresholds from stored settings, falling back per key.
    pub fn entry_from_settings(rows: &[Setting], fallback: Self) -> Self {
        Self {
            platinum: lookup(rows, settings::ENTRY_PLATINUM_TICKETS).unwrap_or(fallback.platinum),
            gold: lookup(rows, settings::ENTRY_GOLD_TICKETS).unwrap_or(fallback.gold),
            silver: lookup(rows, settings::ENTRY_SILVER_TICKETS).unwrap_or(fallback.silver),
        }
    }

    /// These thresholds with the one stored under `key` replaced, checked for
    /// order. `None` when `keys` does not name `key`.
    pub fn with_value(
        self,
        keys: &[&str; 3],
        key: &str,
        value: u64,
    ) -> Option<Result<Self, LoyaltyError>> {
        let index = keys.iter().position(|k| *k == key)?;
        let mut slots = [self.platinum, self.gold, self.silver];
        slots[index] = value;
        Some(Self::new(slots[0], slots[1], slots[2]))
    }

    /// Tier a ticket count qualifies for.
    pub fn propose(&self, tickets: u64) -> Tier {
        if tickets >= self.platinum {
            Tier::Platinum
        } else if tickets >= self.gold {
            Tier::Gold
        } else if tickets >= self.silver {
            Tier::Silver
        } else {
            Tier::Blue
        }
    }

    /// Ticket target for an earnable tier. Blue needs nothing; Warning and
    /// Rejected are never targets.
    pub fn target(&self, tier: Tier) -> Option<u64> {
        match tier {
            Tier::Platinum => Some(self.platinum),
            Tier::Gold => Some(self.gold),
            Tier::Silver => Some(self.silver),
            Tier::Blue => Some(0),
            Tier::Warning | Tier::Rejected => None,
        }
    }
}

fn lookup(rows: &[Setting], key: &str) -> Option<u64> {
    rows.iter().find(|s| s.key == key).and_then(Setting::as_u64)
}

/// Reject settings updates that would break threshold evaluation.
pub fn validate_setting(setting: &Setting) -> Result<(), LoyaltyError> {
    if setting.key.trim().is_empty() {
        return Err(LoyaltyError::InvalidSetting {
            key: setting.key.clone(),
            reason: "key is required".to_string(),
        });
    }

    if settings::THRESHOLD_KEYS.contains(&setting.key.as_str()) && setting.as_u64().is_none() {
        return Err(LoyaltyError::InvalidSetting {
            key: setting.key.clone(),
            reason: format!("'{}' is not a non-negative integer", setting.value),
        });
    }
    Ok(())
}

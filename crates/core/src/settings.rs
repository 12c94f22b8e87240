//! Runtime-tunable loyalty settings, stored as key/value rows.

use crate::config::LoyaltyConfig;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const ENTRY_PLATINUM_TICKETS: &str = "LOYALTY_ENTRY_PLATINUM_TICKETS";
pub const ENTRY_GOLD_TICKETS: &str = "LOYALTY_ENTRY_GOLD_TICKETS";
pub const ENTRY_SILVER_TICKETS: &str = "LOYALTY_ENTRY_SILVER_TICKETS";
pub const MONTHLY_PLATINUM_TICKETS: &str = "LOYALTY_MONTHLY_PLATINUM_TICKETS";
pub const MONTHLY_GOLD_TICKETS: &str = "LOYALTY_MONTHLY_GOLD_TICKETS";
pub const MONTHLY_SILVER_TICKETS: &str = "LOYALTY_MONTHLY_SILVER_TICKETS";

/// Every key the loyalty engine reads. All must be present once seeded.
pub const THRESHOLD_KEYS: [&str; 6] = [
    ENTRY_PLATINUM_TICKETS,
    ENTRY_GOLD_TICKETS,
    ENTRY_SILVER_TICKETS,
    MONTHLY_PLATINUM_TICKETS,
    MONTHLY_GOLD_TICKETS,
    MONTHLY_SILVER_TICKETS,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SettingKind {
    Number,
    Text,
}

impl Default for SettingKind {
    fn default() -> Self {
        SettingKind::Number
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Setting {
    pub key: String,
    pub value: String,
    #[serde(default)]
    pub kind: SettingKind,
}

impl Setting {
    pub fn number(key: &str, value: u64) -> Self {
        Self {
            key: key.to_string(),
            value: value.to_string(),
            kind: SettingKind::Number,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        self.value.trim().parse().ok()
    }
}

/// Seed rows for a fresh store, taken from the loaded configuration.
pub fn default_settings(config: &LoyaltyConfig) -> Vec<Setting> {
    vec![
        Setting::number(ENTRY_PLATINUM_TICKETS, config.entry_platinum_tickets),
        Setting::number(ENTRY_GOLD_TICKETS, config.entry_gold_tickets),
        Setting::number(ENTRY_SILVER_TICKETS, config.entry_silver_tickets),
        Setting::number(MONTHLY_PLATINUM_TICKETS, config.monthly_platinum_tickets),
        Setting::number(MONTHLY_GOLD_TICKETS, config.monthly_gold_tickets),
        Setting::number(MONTHLY_SILVER_TICKETS, config.monthly_silver_tickets),
    ]
}

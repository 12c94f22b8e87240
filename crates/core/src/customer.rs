//! Persisted customer records and the monthly/daily history rows kept per
//! customer.

use crate::loyalty::EvaluationStatus;
use crate::tier::TierLabel;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A loyalty program member, keyed by mobile number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Customer {
    pub mobile_number: String,
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub registered_date: Option<NaiveDate>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub last_purchase_time: Option<NaiveDateTime>,
    #[serde(default)]
    pub wallet_balance: f64,
    /// Printed card number, e.g. `0884  2025  0000  0042`.
    #[serde(default)]
    pub loyalty_number: Option<String>,
    /// Label of the evaluation that last touched this record.
    #[serde(default)]
    pub last_update: Option<String>,
    #[schema(value_type = Option<String>)]
    pub current_tier: Option<TierLabel>,
    pub current_ticket_count: u64,
    #[schema(value_type = Option<String>)]
    pub last_month_tier: Option<TierLabel>,
    pub last_month_ticket_count: u64,
    pub evaluation_status: Option<EvaluationStatus>,
}

impl Customer {
    pub fn full_name(&self) -> String {
        if self.last_name.is_empty() {
            self.first_name.clone()
        } else {
            format!("{} {}", self.first_name, self.last_name)
        }
    }

    pub fn has_email(&self) -> bool {
        self.email.as_deref().map(|e| !e.trim().is_empty()).unwrap_or(false)
    }
}

/// One row of a customer's tier history; appended on every evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MonthlyUpgradeRecord {
    pub mobile_number: String,
    /// Evaluation label (`"Entry"` for the initial load, `YYYY-MM` otherwise).
    pub last_update: String,
    #[schema(value_type = String)]
    pub month_tier: TierLabel,
    pub monthly_ticket_count: u64,
    /// Per-draw counts. Only months closed by the daily roll-up carry them.
    #[serde(default)]
    pub breakdown: LotteryBreakdown,
}

/// Persisted classification counts for one evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MonthlySummaryRecord {
    pub evaluation: String,
    pub upgrades: u64,
    pub downgrades: u64,
    pub same: u64,
    pub new_customers: u64,
}

// ─── Lottery Breakdown ──────────────────────────────────────────────────────

/// Tickets bought per lottery draw over a period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LotteryBreakdown {
    #[serde(default, rename = "Ada Sampatha", alias = "ada_sampatha")]
    pub ada_sampatha: u64,
    #[serde(default, rename = "Dhana Nidhanaya", alias = "dhana_nidhanaya")]
    pub dhana_nidhanaya: u64,
    #[serde(default, rename = "Govisetha", alias = "govisetha")]
    pub govisetha: u64,
    #[serde(default, rename = "Handahana", alias = "handahana")]
    pub handahana: u64,
    #[serde(default, rename = "Jaya", alias = "jaya")]
    pub jaya: u64,
    #[serde(default, rename = "Mahajana Sampatha", alias = "mahajana_sampatha")]
    pub mahajana_sampatha: u64,
    #[serde(default, rename = "Mega Power", alias = "mega_power")]
    pub mega_power: u64,
    #[serde(default, rename = "Suba Dawasak", alias = "suba_dawasak")]
    pub suba_dawasak: u64,
}

impl LotteryBreakdown {
    /// Counts in draw order.
    pub fn counts(&self) -> [u64; 8] {
        [
            self.ada_sampatha,
            self.dhana_nidhanaya,
            self.govisetha,
            self.handahana,
            self.jaya,
            self.mahajana_sampatha,
            self.mega_power,
            self.suba_dawasak,
        ]
    }

    fn from_counts(c: [u64; 8]) -> Self {
        Self {
            ada_sampatha: c[0],
            dhana_nidhanaya: c[1],
            govisetha: c[2],
            handahana: c[3],
            jaya: c[4],
            mahajana_sampatha: c[5],
            mega_power: c[6],
            suba_dawasak: c[7],
        }
    }

    /// Tickets across all draws, or `None` on overflow.
    pub fn checked_total(&self) -> Option<u64> {
        self.counts().iter().try_fold(0u64, |acc, n| acc.checked_add(*n))
    }

    /// Per-draw sum of two breakdowns, or `None` if any draw overflows.
    pub fn checked_merge(&self, other: &LotteryBreakdown) -> Option<LotteryBreakdown> {
        let mut sum = self.counts();
        for (slot, n) in sum.iter_mut().zip(other.counts()) {
            *slot = slot.checked_add(n)?;
        }
        Some(Self::from_counts(sum))
    }
}

/// Rolling purchase record covering `[from_date, to_date]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DailyUpgradeRecord {
    pub mobile_number: String,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    #[schema(value_type = Option<String>)]
    pub month_tier: Option<TierLabel>,
    pub breakdown: LotteryBreakdown,
    pub ticket_count: u64,
}

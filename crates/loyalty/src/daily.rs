//! Daily purchase roll-up.
//!
//! Each customer has one rolling record covering `[from_date, to_date]`.
//! A new range must start the day after the record ends; its counts are
//! merged in. When a range ends on the last day of a month the month is
//! closed with a monthly history row, and the next range starts a fresh
//! record.

use crate::thresholds::TierThresholds;
use chrono::{Datelike, Duration, NaiveDate};
use lottery_core::customer::{DailyUpgradeRecord, LotteryBreakdown, MonthlyUpgradeRecord};
use lottery_core::{LoyaltyError, TierLabel};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, LoyaltyError> {
        if to < from {
            return Err(LoyaltyError::Validation(format!(
                "date range ends ({to}) before it starts ({from})"
            )));
        }
        Ok(Self { from, to })
    }
}

/// One customer's purchases for a daily batch range.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DailyEntry {
    pub mobile_number: String,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub loyalty_tier: Option<TierLabel>,
    #[serde(default)]
    pub breakdown: LotteryBreakdown,
    #[serde(default)]
    pub ticket_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DailyOutcome {
    /// First record for the customer, or first range after a closed month.
    Inserted,
    Merged,
    /// Merged, and the range closed the month `YYYY-MM`.
    MonthClosed { month: String },
    /// Nothing written for this customer.
    Rejected { reason: String },
}

/// Writes required for one customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyPlan {
    pub record: Option<DailyUpgradeRecord>,
    pub monthly: Option<MonthlyUpgradeRecord>,
    pub outcome: DailyOutcome,
}

impl DailyPlan {
    fn rejected(reason: String) -> Self {
        Self {
            record: None,
            monthly: None,
            outcome: DailyOutcome::Rejected { reason },
        }
    }
}

/// Last calendar day of the month containing `date`.
pub fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|first_of_next| first_of_next - Duration::days(1))
        .unwrap_or(date)
}

fn is_month_end(date: NaiveDate) -> bool {
    last_day_of_month(date) == date
}

/// Work out what to persist for `entry` given the customer's current record.
pub fn plan(
    prior: Option<&DailyUpgradeRecord>,
    range: DateRange,
    entry: &DailyEntry,
    thresholds: &TierThresholds,
) -> DailyPlan {
    let fresh = DailyUpgradeRecord {
        mobile_number: entry.mobile_number.clone(),
        from_date: range.from,
        to_date: range.to,
        month_tier: entry.loyalty_tier.clone(),
        breakdown: entry.breakdown,
        ticket_count: entry.ticket_count,
    };

    let (record, outcome) = match prior {
        None => (fresh, DailyOutcome::Inserted),
        Some(last) => {
            let expected = last.to_date + Duration::days(1);
            if range.from != expected {
                return DailyPlan::rejected(format!(
                    "invalid date range: {} must be the day after {}",
                    range.from, last.to_date
                ));
            }

            if is_month_end(last.to_date) {
                (fresh, DailyOutcome::Inserted)
            } else {
                let totals = last
                    .breakdown
                    .checked_merge(&entry.breakdown)
                    .zip(last.ticket_count.checked_add(entry.ticket_count));
                let Some((breakdown, ticket_count)) = totals else {
                    return DailyPlan::rejected(format!(
                        "ticket count overflow merging into record from {}",
                        last.from_date
                    ));
                };
                let merged = DailyUpgradeRecord {
                    mobile_number: entry.mobile_number.clone(),
                    from_date: last.from_date,
                    to_date: range.to,
                    month_tier: entry.loyalty_tier.clone().or_else(|| last.month_tier.clone()),
                    breakdown,
                    ticket_count,
                };
                (merged, DailyOutcome::Merged)
            }
        }
    };

    let monthly = is_month_end(record.to_date).then(|| {
        let month = record.to_date.format("%Y-%m").to_string();
        MonthlyUpgradeRecord {
            mobile_number: record.mobile_number.clone(),
            last_update: month,
            month_tier: record
                .month_tier
                .clone()
                .unwrap_or_else(|| thresholds.propose(record.ticket_count).into()),
            monthly_ticket_count: record.ticket_count,
            breakdown: record.breakdown,
        }
    });

    let outcome = match (&monthly, outcome) {
        (Some(row), DailyOutcome::Merged) => DailyOutcome::MonthClosed {
            month: row.last_update.clone(),
        },
        (_, outcome) => outcome,
    };

    DailyPlan {
        record: Some(record),
        monthly,
        outcome,
    }
}

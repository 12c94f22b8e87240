//! Customer dashboard aggregation over the current customer list.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use lottery_core::config::DashboardConfig;
use lottery_core::customer::Customer;
use lottery_core::TIER_PRIORITY;
use serde::Serialize;
use std::collections::BTreeMap;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DashboardSummary {
    pub total_customers: u64,
    /// Customers whose last purchase was today.
    pub active_today: u64,
    pub total_tickets: u64,
    pub total_wallet_balance: f64,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct TierCount {
    pub tier: String,
    pub customers: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct RegistrationPoint {
    /// `YYYY-MM`
    pub month: String,
    pub registrations: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PurchasePoint {
    pub day: NaiveDate,
    /// Customers whose last purchase fell on `day`.
    pub customers: u64,
}

/// Compact customer row for dashboard lists.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CustomerRow {
    pub mobile_number: String,
    pub name: String,
    pub current_tier: Option<String>,
    pub ticket_count: u64,
    pub last_purchase_time: Option<NaiveDateTime>,
}

impl From<&Customer> for CustomerRow {
    fn from(c: &Customer) -> Self {
        Self {
            mobile_number: c.mobile_number.clone(),
            name: c.full_name(),
            current_tier: c.current_tier.as_ref().map(|t| t.to_string()),
            ticket_count: c.current_ticket_count,
            last_purchase_time: c.last_purchase_time,
        }
    }
}

const UNASSIGNED: &str = "Unassigned";

pub struct LoyaltyDashboard {
    config: DashboardConfig,
}

impl LoyaltyDashboard {
    pub fn new(config: DashboardConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn summary(&self, customers: &[Customer], today: NaiveDate) -> DashboardSummary {
        DashboardSummary {
            total_customers: customers.len() as u64,
            active_today: customers
                .iter()
                .filter(|c| c.last_purchase_time.map(|t| t.date()) == Some(today))
                .count() as u64,
            total_tickets: customers.iter().map(|c| c.current_ticket_count).sum(),
            total_wallet_balance: customers.iter().map(|c| c.wallet_balance).sum(),
            generated_at: Utc::now(),
        }
    }

    /// Customer count per tier in rank order. Unrecognised labels follow
    /// alphabetically, customers without a tier come last.
    pub fn tier_distribution(&self, customers: &[Customer]) -> Vec<TierCount> {
        let mut counts: BTreeMap<String, u64> = BTreeMap::new();
        for customer in customers {
            let label = customer
                .current_tier
                .as_ref()
                .map(|t| t.to_string())
                .unwrap_or_else(|| UNASSIGNED.to_string());
            *counts.entry(label).or_default() += 1;
        }

        let mut rows: Vec<TierCount> = TIER_PRIORITY
            .iter()
            .map(|tier| TierCount {
                tier: tier.name().to_string(),
                customers: counts.remove(tier.name()).unwrap_or(0),
            })
            .collect();
        let unassigned = counts.remove(UNASSIGNED);
        rows.extend(counts.into_iter().map(|(tier, customers)| TierCount { tier, customers }));
        if let Some(customers) = unassigned {
            rows.push(TierCount {
                tier: UNASSIGNED.to_string(),
                customers,
            });
        }
        rows
    }

    /// Highest ticket counts first, at most `limit` (config default when
    /// `None`).
    pub fn top_customers(&self, customers: &[Customer], limit: Option<usize>) -> Vec<CustomerRow> {
        let mut rows: Vec<CustomerRow> = customers.iter().map(CustomerRow::from).collect();
        rows.sort_by(|a, b| b.ticket_count.cmp(&a.ticket_count));
        rows.truncate(limit.unwrap_or(self.config.top_customers_limit));
        rows
    }

    /// Customers within reach of the next tier, most tickets first.
    pub fn upgrade_candidates(&self, customers: &[Customer]) -> Vec<CustomerRow> {
        let range =
            self.config.upgrade_candidate_min_tickets..=self.config.upgrade_candidate_max_tickets;
        let mut rows: Vec<CustomerRow> = customers
            .iter()
            .filter(|c| range.contains(&c.current_ticket_count))
            .map(CustomerRow::from)
            .collect();
        rows.sort_by(|a, b| b.ticket_count.cmp(&a.ticket_count));
        rows
    }

    pub fn missing_email(&self, customers: &[Customer]) -> Vec<CustomerRow> {
        customers
            .iter()
            .filter(|c| !c.has_email())
            .map(CustomerRow::from)
            .collect()
    }

    /// Customers whose last purchase is older than the inactivity window.
    /// Customers who never purchased are not listed.
    pub fn inactive(&self, customers: &[Customer], today: NaiveDate) -> Vec<CustomerRow> {
        let cutoff = today - Duration::days(self.config.inactive_days);
        customers
            .iter()
            .filter(|c| c.last_purchase_time.map(|t| t.date() < cutoff).unwrap_or(false))
            .map(CustomerRow::from)
            .collect()
    }

    /// Registrations per month, oldest first.
    pub fn monthly_registrations(&self, customers: &[Customer]) -> Vec<RegistrationPoint> {
        let mut months: BTreeMap<String, u64> = BTreeMap::new();
        for date in customers.iter().filter_map(|c| c.registered_date) {
            *months.entry(date.format("%Y-%m").to_string()).or_default() += 1;
        }
        tracing::debug!(months = months.len(), "Registration series computed");
        months
            .into_iter()
            .map(|(month, registrations)| RegistrationPoint { month, registrations })
            .collect()
    }

    /// Customers grouped by the date of their last purchase, oldest first.
    pub fn daily_purchases(&self, customers: &[Customer]) -> Vec<PurchasePoint> {
        let mut days: BTreeMap<NaiveDate, u64> = BTreeMap::new();
        for time in customers.iter().filter_map(|c| c.last_purchase_time) {
            *days.entry(time.date()).or_default() += 1;
        }
        days.into_iter()
            .map(|(day, customers)| PurchasePoint { day, customers })
            .collect()
    }
}

impl Default for LoyaltyDashboard {
    fn default() -> Self {
        Self::new(DashboardConfig::default())
    }
}

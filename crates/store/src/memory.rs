//! In-memory loyalty store.
//!
//! Commits stage every operation on a copy of the state under the write
//! lock and swap it in only when all operations succeed.

use crate::unit_of_work::{CommitReceipt, UnitOfWork, WriteOp};
use crate::{LoyaltyStore, StoreError};
use lottery_core::customer::{
    Customer, DailyUpgradeRecord, MonthlySummaryRecord, MonthlyUpgradeRecord,
};
use lottery_core::settings::Setting;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

#[derive(Debug, Default, Clone)]
struct StoreState {
    customers: BTreeMap<String, Customer>,
    monthly: Vec<MonthlyUpgradeRecord>,
    summaries: Vec<MonthlySummaryRecord>,
    /// Per customer, oldest range first. The last entry is the open record.
    daily: BTreeMap<String, Vec<DailyUpgradeRecord>>,
    settings: BTreeMap<String, Setting>,
}

impl StoreState {
    fn apply(&mut self, op: WriteOp) -> Result<(), StoreError> {
        match op {
            WriteOp::UpsertCustomer(customer) => {
                self.customers
                    .insert(customer.mobile_number.clone(), customer);
            }
            WriteOp::ApplyEvaluation {
                mobile_number,
                last_update,
                expected_tier,
                resolved_tier,
                status,
                period_tickets,
            } => {
                let customer = self
                    .customers
                    .get_mut(&mobile_number)
                    .ok_or_else(|| StoreError::CustomerNotFound(mobile_number.clone()))?;

                if customer.current_tier != expected_tier {
                    return Err(StoreError::Conflict {
                        mobile: mobile_number,
                        expected: label_or_none(expected_tier.as_ref()),
                        found: label_or_none(customer.current_tier.as_ref()),
                    });
                }

                let total = customer
                    .current_ticket_count
                    .checked_add(period_tickets)
                    .ok_or_else(|| StoreError::TicketOverflow(mobile_number.clone()))?;

                customer.last_month_ticket_count = customer.current_ticket_count;
                customer.last_month_tier = customer.current_tier.take();
                customer.current_ticket_count = total;
                customer.current_tier = Some(resolved_tier);
                customer.evaluation_status = Some(status);
                customer.last_update = Some(last_update);
            }
            WriteOp::AppendMonthly(record) => {
                self.monthly.push(record);
            }
            WriteOp::PutSummary(summary) => {
                match self
                    .summaries
                    .iter_mut()
                    .find(|s| s.evaluation == summary.evaluation)
                {
                    Some(existing) => *existing = summary,
                    None => self.summaries.push(summary),
                }
            }
            WriteOp::SetNewCustomers {
                evaluation,
                new_customers,
            } => {
                let summary = self
                    .summaries
                    .iter_mut()
                    .find(|s| s.evaluation == evaluation)
                    .ok_or(StoreError::SummaryNotFound(evaluation))?;
                summary.new_customers = new_customers;
            }
            WriteOp::PutDaily(record) => {
                let history = self.daily.entry(record.mobile_number.clone()).or_default();
                match history.last_mut() {
                    // A merge extends the open record rather than adding a row
                    Some(open) if open.from_date == record.from_date => *open = record,
                    _ => history.push(record),
                }
            }
            WriteOp::PutSetting(setting) => {
                self.settings.insert(setting.key.clone(), setting);
            }
            WriteOp::ClearAll => {
                self.customers.clear();
                self.monthly.clear();
                self.summaries.clear();
                self.daily.clear();
            }
        }
        Ok(())
    }
}

fn label_or_none(label: Option<&lottery_core::TierLabel>) -> String {
    label
        .map(|l| l.to_string())
        .unwrap_or_else(|| "none".to_string())
}

/// Thread-safe in-memory store. Production deployments swap in a SQL-backed
/// implementation of [`LoyaltyStore`].
pub struct InMemoryStore {
    state: RwLock<StoreState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        info!("Loyalty store initialized (in-memory)");
        Self {
            state: RwLock::new(StoreState::default()),
        }
    }

    /// Create a store pre-populated with settings rows.
    pub fn with_settings(settings: Vec<Setting>) -> Self {
        let store = Self::new();
        {
            let mut state = store.state.write();
            for setting in settings {
                state.settings.insert(setting.key.clone(), setting);
            }
        }
        store
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LoyaltyStore for InMemoryStore {
    fn customer(&self, mobile_number: &str) -> Option<Customer> {
        self.state.read().customers.get(mobile_number).cloned()
    }

    fn customers(&self) -> Vec<Customer> {
        self.state.read().customers.values().cloned().collect()
    }

    fn customer_count(&self) -> usize {
        self.state.read().customers.len()
    }

    fn monthly_records(&self, mobile_number: Option<&str>) -> Vec<MonthlyUpgradeRecord> {
        let state = self.state.read();
        state
            .monthly
            .iter()
            .filter(|r| mobile_number.map_or(true, |m| r.mobile_number == m))
            .cloned()
            .collect()
    }

    fn summaries(&self) -> Vec<MonthlySummaryRecord> {
        self.state.read().summaries.clone()
    }

    fn summary(&self, evaluation: &str) -> Option<MonthlySummaryRecord> {
        self.state
            .read()
            .summaries
            .iter()
            .find(|s| s.evaluation == evaluation)
            .cloned()
    }

    fn daily_record(&self, mobile_number: &str) -> Option<DailyUpgradeRecord> {
        self.state
            .read()
            .daily
            .get(mobile_number)
            .and_then(|history| history.last().cloned())
    }

    fn daily_records(&self, mobile_number: Option<&str>) -> Vec<DailyUpgradeRecord> {
        let state = self.state.read();
        match mobile_number {
            Some(mobile) => state.daily.get(mobile).cloned().unwrap_or_default(),
            None => state.daily.values().flatten().cloned().collect(),
        }
    }

    fn settings(&self) -> Vec<Setting> {
        self.state.read().settings.values().cloned().collect()
    }

    fn setting(&self, key: &str) -> Option<Setting> {
        self.state.read().settings.get(key).cloned()
    }

    fn commit(&self, work: UnitOfWork) -> Result<CommitReceipt, StoreError> {
        let count = work.len();
        let mut state = self.state.write();
        let mut staged = state.clone();

        for op in work.into_ops() {
            if let Err(e) = staged.apply(op) {
                warn!(error = %e, operations = count, "Commit rolled back");
                metrics::counter!("store.rollbacks").increment(1);
                return Err(e);
            }
        }

        *state = staged;
        metrics::counter!("store.commits").increment(1);
        debug!(operations = count, "Commit applied");
        Ok(CommitReceipt { applied: count })
    }
}

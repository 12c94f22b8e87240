//! Loyalty engine: customer onboarding, monthly tier evaluation, daily
//! purchase roll-up and the read side used by the portal and dashboard.
//!
//! Every operation that writes stages its changes in one [`UnitOfWork`], so
//! a batch is persisted completely or not at all.

use crate::batch::{self, EvaluatedCustomer, PriorState};
use crate::daily::{self, DailyEntry, DailyOutcome, DateRange};
use crate::thresholds::{self, TierThresholds};
use chrono::{NaiveDate, NaiveDateTime};
use lottery_core::config::LoyaltyConfig;
use lottery_core::customer::{
    Customer, DailyUpgradeRecord, LotteryBreakdown, MonthlySummaryRecord, MonthlyUpgradeRecord,
};
use lottery_core::loyalty::{
    BatchSummary, Classification, EvaluationStatus, LoyaltyStatus, MonthlyUpdateEntry,
};
use lottery_core::settings::{self, Setting};
use lottery_core::{LoyaltyError, LoyaltyResult, Tier, TierLabel};
use lottery_store::{LoyaltyStore, UnitOfWork, WriteOp};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

/// Label of the monthly history row written by the initial load.
pub const ENTRY_LABEL: &str = "Entry";

/// Summary created when the initial load does not name an evaluation.
pub const FIRST_EVALUATION: &str = "First Evaluation";

// ─── Requests & Reports ─────────────────────────────────────────────────────

/// Customer row of an initial load.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InitialCustomer {
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
    #[serde(default)]
    pub ticket_count: u64,
    /// Starting tier. Derived from the entry thresholds when absent.
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub loyalty_tier: Option<TierLabel>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InitialLoadRequest {
    pub last_update: String,
    pub customers: Vec<InitialCustomer>,
    /// First sequence number for generated loyalty numbers. Defaults to the
    /// number of customers already stored.
    #[serde(default)]
    pub current_count: Option<u64>,
    /// Existing evaluation whose new-customer count is incremented.
    #[serde(default)]
    pub evaluation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct InitialLoadReport {
    pub inserted: usize,
    pub evaluation: String,
    pub new_customers: u64,
    pub loyalty_numbers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct MonthlyUpdateReport {
    pub last_update: String,
    pub summary: BatchSummary,
    pub customers: Vec<EvaluatedCustomer>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DailyCustomerOutcome {
    pub mobile_number: String,
    pub outcome: DailyOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct DailyUpgradeReport {
    pub inserted: usize,
    pub merged: usize,
    pub months_closed: usize,
    pub rejected: usize,
    pub customers: Vec<DailyCustomerOutcome>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct WalletBalance {
    pub mobile_number: String,
    pub wallet_balance: f64,
}

/// Printed card number for the `sequence`-th customer.
pub fn loyalty_number(prefix: &str, sequence: u64) -> String {
    format!("{prefix}  {sequence:04}")
}

// ─── Engine ─────────────────────────────────────────────────────────────────

pub struct LoyaltyEngine {
    config: LoyaltyConfig,
    store: Arc<dyn LoyaltyStore>,
}

impl LoyaltyEngine {
    pub fn new(config: &LoyaltyConfig, store: Arc<dyn LoyaltyStore>) -> Self {
        info!(
            monthly_platinum = config.monthly_platinum_tickets,
            monthly_gold = config.monthly_gold_tickets,
            monthly_silver = config.monthly_silver_tickets,
            customers = store.customer_count(),
            "Loyalty engine initialized"
        );
        Self {
            config: config.clone(),
            store,
        }
    }

    pub fn config(&self) -> &LoyaltyConfig {
        &self.config
    }

    /// Monthly thresholds, with stored settings taking precedence.
    pub fn monthly_thresholds(&self) -> TierThresholds {
        TierThresholds::monthly_from_settings(
            &self.store.settings(),
            TierThresholds::monthly(&self.config),
        )
    }

    pub fn entry_thresholds(&self) -> TierThresholds {
        TierThresholds::entry_from_settings(
            &self.store.settings(),
            TierThresholds::entry(&self.config),
        )
    }

    /// Insert a first batch of customers with generated loyalty numbers.
    pub fn initial_load(&self, request: InitialLoadRequest) -> LoyaltyResult<InitialLoadReport> {
        if request.customers.is_empty() {
            return Err(LoyaltyError::Validation(
                "no customer data provided".to_string(),
            ));
        }
        if let Some(blank) = request
            .customers
            .iter()
            .position(|c| c.mobile_number.trim().is_empty())
        {
            return Err(LoyaltyError::Validation(format!(
                "customer at index {blank} has no mobile number"
            )));
        }

        let start = request
            .current_count
            .unwrap_or(self.store.customer_count() as u64);
        if start.checked_add(request.customers.len() as u64).is_none() {
            return Err(LoyaltyError::Validation(format!(
                "current_count {start} leaves no room for {} loyalty numbers",
                request.customers.len()
            )));
        }
        let entry = self.entry_thresholds();
        let mut work = UnitOfWork::new();
        let mut loyalty_numbers = Vec::with_capacity(request.customers.len());

        for (i, row) in request.customers.into_iter().enumerate() {
            let number = loyalty_number(&self.config.loyalty_number_prefix, start + i as u64);
            let tier = row
                .loyalty_tier
                .unwrap_or_else(|| entry.propose(row.ticket_count).into());

            work.push(WriteOp::AppendMonthly(MonthlyUpgradeRecord {
                mobile_number: row.mobile_number.clone(),
                last_update: ENTRY_LABEL.to_string(),
                month_tier: tier.clone(),
                monthly_ticket_count: row.ticket_count,
                breakdown: LotteryBreakdown::default(),
            }));
            work.push(WriteOp::UpsertCustomer(Customer {
                mobile_number: row.mobile_number,
                first_name: row.first_name,
                last_name: row.last_name,
                email: row.email,
                gender: row.gender,
                country: row.country,
                status: row.status,
                registered_date: row.registered_date,
                date_of_birth: row.date_of_birth,
                last_purchase_time: row.last_purchase_time,
                wallet_balance: row.wallet_balance,
                loyalty_number: Some(number.clone()),
                last_update: Some(request.last_update.clone()),
                current_tier: Some(tier.clone()),
                current_ticket_count: row.ticket_count,
                last_month_tier: Some(tier),
                last_month_ticket_count: row.ticket_count,
                evaluation_status: Some(EvaluationStatus::InitialLoad),
            }));
            loyalty_numbers.push(number);
        }

        let inserted = loyalty_numbers.len();
        let (evaluation, new_customers) = match request
            .evaluation
            .as_deref()
            .and_then(|label| self.store.summary(label))
        {
            Some(existing) => {
                let total = existing.new_customers + inserted as u64;
                work.push(WriteOp::SetNewCustomers {
                    evaluation: existing.evaluation.clone(),
                    new_customers: total,
                });
                (existing.evaluation, total)
            }
            None => {
                let label = request
                    .evaluation
                    .unwrap_or_else(|| FIRST_EVALUATION.to_string());
                work.push(WriteOp::PutSummary(MonthlySummaryRecord {
                    evaluation: label.clone(),
                    upgrades: 0,
                    downgrades: 0,
                    same: 0,
                    new_customers: inserted as u64,
                }));
                (label, inserted as u64)
            }
        };

        self.store.commit(work)?;

        metrics::counter!("loyalty.customers_loaded").increment(inserted as u64);
        info!(
            inserted = inserted,
            evaluation = %evaluation,
            first_sequence = start,
            "Initial customer load committed"
        );

        Ok(InitialLoadReport {
            inserted,
            evaluation,
            new_customers,
            loyalty_numbers,
        })
    }

    /// Evaluate one monthly batch and persist it atomically.
    pub fn monthly_update(
        &self,
        last_update: &str,
        entries: &[MonthlyUpdateEntry],
    ) -> LoyaltyResult<MonthlyUpdateReport> {
        if last_update.trim().is_empty() {
            return Err(LoyaltyError::Validation(
                "last_update label is required".to_string(),
            ));
        }
        if entries.is_empty() {
            return Err(LoyaltyError::Validation("no customers in batch".to_string()));
        }
        let duplicates = batch::duplicate_ids(entries);
        if !duplicates.is_empty() {
            return Err(LoyaltyError::Validation(format!(
                "duplicate mobile numbers in batch: {}",
                duplicates.join(", ")
            )));
        }

        let mut missing = Vec::new();
        let outcome = batch::aggregate(entries, &self.monthly_thresholds(), |mobile| {
            match self.store.customer(mobile) {
                Some(customer) => Some(PriorState {
                    tier: customer.current_tier,
                    ticket_count: customer.current_ticket_count,
                }),
                None => {
                    missing.push(mobile.to_string());
                    None
                }
            }
        });
        if let Some(first) = missing.into_iter().next() {
            warn!(mobile = %first, "Monthly update references unknown customer");
            return Err(LoyaltyError::CustomerNotFound(first));
        }
        if let Some(customer) = outcome
            .customers
            .iter()
            .find(|c| c.previous_ticket_count.checked_add(c.ticket_count).is_none())
        {
            return Err(LoyaltyError::Validation(format!(
                "ticket count for {} would overflow the running total",
                customer.mobile_number
            )));
        }

        let mut work = UnitOfWork::new();
        for customer in &outcome.customers {
            work.push(WriteOp::ApplyEvaluation {
                mobile_number: customer.mobile_number.clone(),
                last_update: last_update.to_string(),
                expected_tier: customer.previous_tier.clone(),
                resolved_tier: customer.resolved_tier.clone(),
                status: customer.classification.into(),
                period_tickets: customer.ticket_count,
            });
            work.push(WriteOp::AppendMonthly(MonthlyUpgradeRecord {
                mobile_number: customer.mobile_number.clone(),
                last_update: last_update.to_string(),
                month_tier: customer.resolved_tier.clone(),
                monthly_ticket_count: customer.ticket_count,
                breakdown: LotteryBreakdown::default(),
            }));
        }
        let summary = outcome.summary;
        work.push(WriteOp::PutSummary(MonthlySummaryRecord {
            evaluation: last_update.to_string(),
            upgrades: summary.upgraded_count,
            downgrades: summary.downgraded_count,
            same: summary.same_count,
            new_customers: summary.new_count,
        }));

        let receipt = self.store.commit(work)?;

        metrics::counter!("loyalty.monthly_batches").increment(1);
        metrics::counter!("loyalty.tier_upgrades").increment(summary.upgraded_count);
        metrics::counter!("loyalty.tier_downgrades").increment(summary.downgraded_count);
        for customer in outcome
            .customers
            .iter()
            .filter(|c| c.classification == Classification::Downgraded)
        {
            debug!(
                mobile = %customer.mobile_number,
                from = ?customer.previous_tier,
                to = %customer.resolved_tier,
                "Tier downgraded"
            );
        }
        info!(
            evaluation = %last_update,
            upgraded = summary.upgraded_count,
            downgraded = summary.downgraded_count,
            same = summary.same_count,
            new = summary.new_count,
            writes = receipt.applied,
            "Monthly update committed"
        );

        Ok(MonthlyUpdateReport {
            last_update: last_update.to_string(),
            summary,
            customers: outcome.customers,
        })
    }

    /// Roll a daily purchase batch into each customer's running record.
    /// Rows breaking date continuity are reported and skipped; the rest are
    /// committed together.
    pub fn daily_upgrade(
        &self,
        range: DateRange,
        entries: &[DailyEntry],
    ) -> LoyaltyResult<DailyUpgradeReport> {
        if entries.is_empty() {
            return Err(LoyaltyError::Validation("no customers in batch".to_string()));
        }

        let thresholds = self.monthly_thresholds();
        let mut staged: HashMap<String, DailyUpgradeRecord> = HashMap::new();
        let mut work = UnitOfWork::new();
        let mut report = DailyUpgradeReport::default();

        for entry in entries {
            let prior = staged
                .get(&entry.mobile_number)
                .cloned()
                .or_else(|| self.store.daily_record(&entry.mobile_number));
            let plan = daily::plan(prior.as_ref(), range, entry, &thresholds);

            match &plan.outcome {
                DailyOutcome::Inserted => report.inserted += 1,
                DailyOutcome::Merged => report.merged += 1,
                DailyOutcome::MonthClosed { .. } => {
                    report.merged += 1;
                    report.months_closed += 1;
                }
                DailyOutcome::Rejected { reason } => {
                    report.rejected += 1;
                    warn!(mobile = %entry.mobile_number, reason = %reason, "Daily row rejected");
                }
            }

            if let Some(record) = plan.record {
                staged.insert(record.mobile_number.clone(), record.clone());
                work.push(WriteOp::PutDaily(record));
            }
            if let Some(monthly) = plan.monthly {
                work.push(WriteOp::AppendMonthly(monthly));
            }
            report.customers.push(DailyCustomerOutcome {
                mobile_number: entry.mobile_number.clone(),
                outcome: plan.outcome,
            });
        }

        if !work.is_empty() {
            self.store.commit(work)?;
        }

        metrics::counter!("loyalty.daily_rows").increment(entries.len() as u64);
        metrics::counter!("loyalty.daily_rejections").increment(report.rejected as u64);
        info!(
            from = %range.from,
            to = %range.to,
            inserted = report.inserted,
            merged = report.merged,
            months_closed = report.months_closed,
            rejected = report.rejected,
            "Daily upgrade processed"
        );
        Ok(report)
    }

    // ─── Queries ────────────────────────────────────────────────────────────

    pub fn customer(&self, mobile_number: &str) -> LoyaltyResult<Customer> {
        self.store
            .customer(mobile_number)
            .ok_or_else(|| LoyaltyError::CustomerNotFound(mobile_number.to_string()))
    }

    pub fn customers(&self) -> Vec<Customer> {
        self.store.customers()
    }

    /// Current tier and the distance to the next one.
    pub fn loyalty_status(&self, mobile_number: &str) -> LoyaltyResult<LoyaltyStatus> {
        let customer = self.customer(mobile_number)?;
        let next_tier = customer
            .current_tier
            .as_ref()
            .and_then(TierLabel::tier)
            .and_then(|tier| tier.next_up());
        let tickets_needed = next_tier
            .and_then(|tier| self.entry_thresholds().target(tier))
            .map(|target| target.saturating_sub(customer.current_ticket_count))
            .unwrap_or(0);

        Ok(LoyaltyStatus {
            mobile_number: customer.mobile_number,
            current_tier: customer.current_tier,
            ticket_count: customer.current_ticket_count,
            next_tier,
            tickets_needed,
        })
    }

    /// Monthly history for a customer, oldest first.
    pub fn tier_history(&self, mobile_number: &str) -> LoyaltyResult<Vec<MonthlyUpgradeRecord>> {
        let history = self.store.monthly_records(Some(mobile_number));
        if history.is_empty() && self.store.customer(mobile_number).is_none() {
            return Err(LoyaltyError::CustomerNotFound(mobile_number.to_string()));
        }
        Ok(history)
    }

    pub fn latest_monthly(&self, mobile_number: &str) -> LoyaltyResult<MonthlyUpgradeRecord> {
        self.store
            .monthly_records(Some(mobile_number))
            .pop()
            .ok_or_else(|| LoyaltyError::CustomerNotFound(mobile_number.to_string()))
    }

    pub fn monthly_records(&self) -> Vec<MonthlyUpgradeRecord> {
        self.store.monthly_records(None)
    }

    pub fn summaries(&self) -> Vec<MonthlySummaryRecord> {
        self.store.summaries()
    }

    pub fn daily_record(&self, mobile_number: &str) -> Option<DailyUpgradeRecord> {
        self.store.daily_record(mobile_number)
    }

    pub fn all_daily_records(&self) -> Vec<DailyUpgradeRecord> {
        self.store.daily_records(None)
    }

    /// Daily purchase records for a customer, oldest first.
    pub fn daily_history(&self, mobile_number: &str) -> LoyaltyResult<Vec<DailyUpgradeRecord>> {
        let history = self.store.daily_records(Some(mobile_number));
        if history.is_empty() && self.store.customer(mobile_number).is_none() {
            return Err(LoyaltyError::CustomerNotFound(mobile_number.to_string()));
        }
        Ok(history)
    }

    /// Daily record with the latest end date.
    pub fn latest_daily(&self, mobile_number: &str) -> LoyaltyResult<DailyUpgradeRecord> {
        self.store
            .daily_records(Some(mobile_number))
            .into_iter()
            .max_by_key(|r| r.to_date)
            .ok_or_else(|| {
                LoyaltyError::RecordNotFound(format!("no daily records for {mobile_number}"))
            })
    }

    /// Daily records lying wholly inside `[from, to]`, newest first.
    pub fn ticket_history(
        &self,
        mobile_number: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> LoyaltyResult<Vec<DailyUpgradeRecord>> {
        let mut rows: Vec<_> = self
            .daily_history(mobile_number)?
            .into_iter()
            .filter(|r| from.is_none_or(|from| r.from_date >= from))
            .filter(|r| to.is_none_or(|to| r.to_date <= to))
            .collect();
        rows.reverse();
        Ok(rows)
    }

    /// The customer's history row for one evaluation label.
    pub fn monthly_tickets(
        &self,
        mobile_number: &str,
        month: &str,
    ) -> LoyaltyResult<MonthlyUpgradeRecord> {
        self.tier_history(mobile_number)?
            .into_iter()
            .rev()
            .find(|r| r.last_update == month)
            .ok_or_else(|| {
                LoyaltyError::RecordNotFound(format!("no {month} record for {mobile_number}"))
            })
    }

    pub fn wallet(&self, mobile_number: &str) -> LoyaltyResult<WalletBalance> {
        let customer = self.customer(mobile_number)?;
        Ok(WalletBalance {
            mobile_number: customer.mobile_number,
            wallet_balance: customer.wallet_balance,
        })
    }

    /// Each customer's running daily record, ordered by mobile number.
    pub fn current_breakdowns(&self) -> Vec<DailyUpgradeRecord> {
        let mut latest: BTreeMap<String, DailyUpgradeRecord> = BTreeMap::new();
        for record in self.store.daily_records(None) {
            match latest.get(&record.mobile_number) {
                Some(held) if held.to_date >= record.to_date => {}
                _ => {
                    latest.insert(record.mobile_number.clone(), record);
                }
            }
        }
        latest.into_values().collect()
    }

    /// History rows for one evaluation label across all customers.
    pub fn monthly_breakdowns(&self, month: &str) -> Vec<MonthlyUpgradeRecord> {
        self.store
            .monthly_records(None)
            .into_iter()
            .filter(|r| r.last_update == month)
            .collect()
    }

    // ─── Settings & Maintenance ─────────────────────────────────────────────

    pub fn settings(&self) -> Vec<Setting> {
        self.store.settings()
    }

    /// True once every threshold key has a stored value.
    pub fn settings_seeded(&self) -> bool {
        settings::THRESHOLD_KEYS
            .iter()
            .all(|key| self.store.setting(key).is_some())
    }

    pub fn update_setting(&self, setting: Setting) -> LoyaltyResult<Setting> {
        thresholds::validate_setting(&setting)?;
        if let Some(value) = setting.as_u64() {
            let reordered = self
                .monthly_thresholds()
                .with_value(&thresholds::MONTHLY_KEYS, &setting.key, value)
                .or_else(|| {
                    self.entry_thresholds()
                        .with_value(&thresholds::ENTRY_KEYS, &setting.key, value)
                });
            if let Some(Err(err)) = reordered {
                return Err(LoyaltyError::InvalidSetting {
                    key: setting.key,
                    reason: err.to_string(),
                });
            }
        }

        let mut work = UnitOfWork::new();
        work.push(WriteOp::PutSetting(setting.clone()));
        self.store.commit(work)?;

        metrics::counter!("loyalty.settings_updated").increment(1);
        info!(key = %setting.key, value = %setting.value, "Setting updated");
        Ok(setting)
    }

    /// Remove all customers and history. Settings survive.
    pub fn reset(&self) -> LoyaltyResult<()> {
        let removed = self.store.customer_count();
        let mut work = UnitOfWork::new();
        work.push(WriteOp::ClearAll);
        self.store.commit(work)?;

        warn!(customers = removed, "Loyalty data cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lottery_core::settings::default_settings;
    use lottery_store::InMemoryStore;

    fn test_engine() -> LoyaltyEngine {
        let config = LoyaltyConfig::default();
        let store = Arc::new(InMemoryStore::with_settings(default_settings(&config)));
        LoyaltyEngine::new(&config, store)
    }

    fn customer(mobile: &str, tickets: u64, tier: Option<Tier>) -> InitialCustomer {
        InitialCustomer {
            mobile_number: mobile.to_string(),
            first_name: "Test".to_string(),
            last_name: String::new(),
            email: None,
            gender: None,
            country: None,
            status: None,
            registered_date: None,
            date_of_birth: None,
            last_purchase_time: None,
            wallet_balance: 0.0,
            ticket_count: tickets,
            loyalty_tier: tier.map(TierLabel::from),
        }
    }

    fn load(engine: &LoyaltyEngine, customers: Vec<InitialCustomer>) -> InitialLoadReport {
        engine
            .initial_load(InitialLoadRequest {
                last_update: "2025-01".to_string(),
                customers,
                current_count: Some(1),
                evaluation: None,
            })
            .unwrap()
    }

    fn entry(mobile: &str, tickets: u64) -> MonthlyUpdateEntry {
        MonthlyUpdateEntry {
            mobile_number: mobile.to_string(),
            proposed_tier: None,
            ticket_count: tickets,
        }
    }

    #[test]
    fn test_loyalty_number_format() {
        assert_eq!(loyalty_number("0884  2025  0000", 7), "0884  2025  0000  0007");
        assert_eq!(loyalty_number("0884  2025  0000", 12345), "0884  2025  0000  12345");
    }

    #[test]
    fn test_initial_load_creates_customers_and_summary() {
        let engine = test_engine();
        let report = load(
            &engine,
            vec![customer("94770000001", 3500, None), customer("94770000002", 10, None)],
        );
        assert_eq!(report.inserted, 2);
        assert_eq!(report.evaluation, FIRST_EVALUATION);
        assert_eq!(report.loyalty_numbers[1], "0884  2025  0000  0002");

        let first = engine.customer("94770000001").unwrap();
        assert_eq!(first.current_tier, Some(TierLabel::Known(Tier::Gold)));
        assert_eq!(first.evaluation_status, Some(EvaluationStatus::InitialLoad));
        assert_eq!(engine.customer("94770000002").unwrap().current_tier, Some(Tier::Blue.into()));

        let history = engine.tier_history("94770000001").unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].last_update, ENTRY_LABEL);
        assert_eq!(engine.summaries()[0].new_customers, 2);
    }

    #[test]
    fn test_initial_load_increments_named_evaluation() {
        let engine = test_engine();
        load(&engine, vec![customer("94770000001", 0, Some(Tier::Silver))]);
        let report = engine
            .initial_load(InitialLoadRequest {
                last_update: "2025-02".to_string(),
                customers: vec![customer("94770000002", 0, Some(Tier::Blue))],
                current_count: None,
                evaluation: Some(FIRST_EVALUATION.to_string()),
            })
            .unwrap();
        assert_eq!(report.new_customers, 2);
        assert_eq!(report.loyalty_numbers[0], "0884  2025  0000  0001");
        assert_eq!(engine.summaries().len(), 1);
    }

    #[test]
    fn test_initial_load_rejects_empty() {
        let engine = test_engine();
        let err = engine
            .initial_load(InitialLoadRequest {
                last_update: "2025-01".to_string(),
                customers: vec![],
                current_count: None,
                evaluation: None,
            })
            .unwrap_err();
        assert!(matches!(err, LoyaltyError::Validation(_)));
    }

    #[test]
    fn test_monthly_update_applies_and_summarizes() {
        let engine = test_engine();
        load(
            &engine,
            vec![
                customer("94770000001", 0, Some(Tier::Silver)),
                customer("94770000002", 0, Some(Tier::Blue)),
                customer("94770000003", 0, Some(Tier::Gold)),
            ],
        );

        let report = engine
            .monthly_update(
                "2025-02",
                &[
                    entry("94770000001", 600),
                    entry("94770000002", 50),
                    entry("94770000003", 550),
                ],
            )
            .unwrap();
        assert_eq!(report.summary.upgraded_count, 1);
        assert_eq!(report.summary.downgraded_count, 1);
        assert_eq!(report.summary.same_count, 1);

        let warned = engine.customer("94770000002").unwrap();
        assert_eq!(warned.current_tier, Some(Tier::Warning.into()));
        assert_eq!(warned.last_month_tier, Some(Tier::Blue.into()));
        assert_eq!(warned.evaluation_status, Some(EvaluationStatus::Downgraded));

        let upgraded = engine.customer("94770000001").unwrap();
        assert_eq!(upgraded.current_ticket_count, 600);
        assert_eq!(upgraded.last_month_ticket_count, 0);

        let summary = engine
            .summaries()
            .into_iter()
            .find(|s| s.evaluation == "2025-02")
            .unwrap();
        assert_eq!((summary.upgrades, summary.downgrades, summary.same), (1, 1, 1));
        assert_eq!(engine.tier_history("94770000002").unwrap().len(), 2);
    }

    #[test]
    fn test_warning_then_rejected_over_two_months() {
        let engine = test_engine();
        load(&engine, vec![customer("94770000001", 0, Some(Tier::Blue))]);
        engine.monthly_update("2025-02", &[entry("94770000001", 10)]).unwrap();
        engine.monthly_update("2025-03", &[entry("94770000001", 10)]).unwrap();
        let status = engine.loyalty_status("94770000001").unwrap();
        assert_eq!(status.current_tier, Some(Tier::Rejected.into()));
    }

    #[test]
    fn test_monthly_update_unknown_customer_writes_nothing() {
        let engine = test_engine();
        load(&engine, vec![customer("94770000001", 0, Some(Tier::Silver))]);

        let err = engine
            .monthly_update("2025-02", &[entry("94770000001", 900), entry("94779999999", 5)])
            .unwrap_err();
        assert!(matches!(err, LoyaltyError::CustomerNotFound(m) if m == "94779999999"));

        let untouched = engine.customer("94770000001").unwrap();
        assert_eq!(untouched.current_tier, Some(Tier::Silver.into()));
        assert_eq!(engine.monthly_records().len(), 1);
        assert!(engine.summaries().iter().all(|s| s.evaluation != "2025-02"));
    }

    #[test]
    fn test_monthly_update_rejects_duplicates() {
        let engine = test_engine();
        load(&engine, vec![customer("94770000001", 0, None)]);
        let err = engine
            .monthly_update("2025-02", &[entry("94770000001", 1), entry("94770000001", 2)])
            .unwrap_err();
        assert!(matches!(err, LoyaltyError::Validation(_)));
    }

    #[test]
    fn test_settings_override_thresholds() {
        let engine = test_engine();
        engine
            .update_setting(Setting::number(settings::MONTHLY_SILVER_TICKETS, 50))
            .unwrap();
        assert_eq!(engine.monthly_thresholds().silver, 50);

        let bad = Setting {
            key: settings::MONTHLY_GOLD_TICKETS.to_string(),
            value: "lots".to_string(),
            kind: Default::default(),
        };
        assert!(engine.update_setting(bad).is_err());
    }

    #[test]
    fn test_setting_cannot_invert_thresholds() {
        let engine = test_engine();
        let err = engine
            .update_setting(Setting::number(settings::MONTHLY_SILVER_TICKETS, 5000))
            .unwrap_err();
        assert!(matches!(err, LoyaltyError::InvalidSetting { ref key, .. }
            if key == settings::MONTHLY_SILVER_TICKETS));
        assert_eq!(engine.monthly_thresholds().silver, 300);

        let err = engine
            .update_setting(Setting::number(settings::ENTRY_PLATINUM_TICKETS, 10))
            .unwrap_err();
        assert!(matches!(err, LoyaltyError::InvalidSetting { .. }));
        assert_eq!(engine.entry_thresholds().platinum, 5000);

        engine
            .update_setting(Setting::number(settings::MONTHLY_PLATINUM_TICKETS, 500))
            .unwrap();
        assert_eq!(engine.monthly_thresholds().platinum, 500);
    }

    #[test]
    fn test_loyalty_status_next_tier() {
        let engine = test_engine();
        load(&engine, vec![customer("94770000001", 1200, None)]);
        let status = engine.loyalty_status("94770000001").unwrap();
        assert_eq!(status.current_tier, Some(Tier::Silver.into()));
        assert_eq!(status.next_tier, Some(Tier::Gold));
        assert_eq!(status.tickets_needed, 1800);

        assert!(matches!(
            engine.loyalty_status("94770000404"),
            Err(LoyaltyError::CustomerNotFound(_))
        ));
    }

    #[test]
    fn test_daily_upgrade_merges_and_rejects_gaps() {
        let engine = test_engine();
        let d = |day| NaiveDate::from_ymd_opt(2025, 5, day).unwrap();
        let row = |mobile: &str, tickets| DailyEntry {
            mobile_number: mobile.to_string(),
            loyalty_tier: None,
            breakdown: Default::default(),
            ticket_count: tickets,
        };

        engine
            .daily_upgrade(DateRange::new(d(1), d(10)).unwrap(), &[row("a", 10), row("b", 5)])
            .unwrap();
        let report = engine
            .daily_upgrade(DateRange::new(d(11), d(31)).unwrap(), &[row("a", 400)])
            .unwrap();
        assert_eq!(report.months_closed, 1);
        assert_eq!(engine.daily_record("a").unwrap().ticket_count, 410);

        let month = engine.latest_monthly("a").unwrap();
        assert_eq!(month.last_update, "2025-05");
        assert_eq!(month.month_tier, TierLabel::Known(Tier::Silver));

        let gap = engine
            .daily_upgrade(DateRange::new(d(20), d(25)).unwrap(), &[row("b", 1)])
            .unwrap();
        assert_eq!(gap.rejected, 1);
        assert_eq!(engine.daily_record("b").unwrap().ticket_count, 5);
    }

    #[test]
    fn test_daily_reads() {
        let engine = test_engine();
        load(&engine, vec![customer("94770000001", 0, None), customer("94770000002", 0, None)]);
        let d = |month, day| NaiveDate::from_ymd_opt(2025, month, day).unwrap();
        let row = |tickets| DailyEntry {
            mobile_number: "94770000001".to_string(),
            loyalty_tier: None,
            breakdown: LotteryBreakdown { jaya: tickets, ..Default::default() },
            ticket_count: tickets,
        };
        engine.daily_upgrade(DateRange::new(d(5, 1), d(5, 31)).unwrap(), &[row(400)]).unwrap();
        engine.daily_upgrade(DateRange::new(d(6, 1), d(6, 10)).unwrap(), &[row(20)]).unwrap();

        let history = engine.daily_history("94770000001").unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].from_date, d(5, 1));
        assert_eq!(engine.latest_daily("94770000001").unwrap().to_date, d(6, 10));
        assert!(engine.daily_history("94770000002").unwrap().is_empty());
        assert!(matches!(
            engine.latest_daily("94770000002"),
            Err(LoyaltyError::RecordNotFound(_))
        ));
        assert!(matches!(
            engine.daily_history("94779999999"),
            Err(LoyaltyError::CustomerNotFound(_))
        ));

        let june = engine
            .ticket_history("94770000001", Some(d(6, 1)), None)
            .unwrap();
        assert_eq!(june.len(), 1);
        let all = engine.ticket_history("94770000001", None, Some(d(6, 30))).unwrap();
        assert_eq!(all[0].from_date, d(6, 1));

        let may = engine.monthly_tickets("94770000001", "2025-05").unwrap();
        assert_eq!(may.breakdown.jaya, 400);
        assert!(matches!(
            engine.monthly_tickets("94770000001", "2025-04"),
            Err(LoyaltyError::RecordNotFound(_))
        ));
        assert_eq!(engine.monthly_breakdowns("2025-05").len(), 1);

        let current = engine.current_breakdowns();
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].ticket_count, 20);
    }

    #[test]
    fn test_wallet_and_seeded_settings() {
        let engine = test_engine();
        let mut row = customer("94770000001", 0, None);
        row.wallet_balance = 250.5;
        load(&engine, vec![row]);
        let wallet = engine.wallet("94770000001").unwrap();
        assert!((wallet.wallet_balance - 250.5).abs() < f64::EPSILON);
        assert!(engine.settings_seeded());

        let config = LoyaltyConfig::default();
        let bare = LoyaltyEngine::new(&config, Arc::new(InMemoryStore::new()));
        assert!(!bare.settings_seeded());
        assert_eq!(bare.monthly_thresholds().platinum, 1000);
    }

    #[test]
    fn test_reset_keeps_settings() {
        let engine = test_engine();
        load(&engine, vec![customer("94770000001", 0, None)]);
        engine.reset().unwrap();
        assert!(engine.customers().is_empty());
        assert!(engine.summaries().is_empty());
        assert!(!engine.settings().is_empty());
    }
}

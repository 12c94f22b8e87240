//! Staged write operations committed as one atomic batch.

use lottery_core::customer::{
    Customer, DailyUpgradeRecord, MonthlySummaryRecord, MonthlyUpgradeRecord,
};
use lottery_core::loyalty::EvaluationStatus;
use lottery_core::settings::Setting;
use lottery_core::TierLabel;

#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Insert a customer or replace the existing record.
    UpsertCustomer(Customer),
    /// Roll a customer into the next evaluation period. The current tier and
    /// ticket count become the last-month values, the resolved tier becomes
    /// current and the period's tickets are added to the running total.
    ApplyEvaluation {
        mobile_number: String,
        last_update: String,
        /// Tier the evaluation was computed against. Commit fails if the
        /// stored tier differs.
        expected_tier: Option<TierLabel>,
        resolved_tier: TierLabel,
        status: EvaluationStatus,
        period_tickets: u64,
    },
    AppendMonthly(MonthlyUpgradeRecord),
    /// Insert or replace the summary with the same evaluation label.
    PutSummary(MonthlySummaryRecord),
    /// Overwrite the new-customer count of an existing summary.
    SetNewCustomers { evaluation: String, new_customers: u64 },
    PutDaily(DailyUpgradeRecord),
    PutSetting(Setting),
    /// Remove customers, monthly history, summaries and daily records.
    /// Settings are kept.
    ClearAll,
}

/// Ordered list of writes applied together by [`crate::LoyaltyStore::commit`].
#[derive(Debug, Default, Clone)]
pub struct UnitOfWork {
    ops: Vec<WriteOp>,
}

impl UnitOfWork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: WriteOp) -> &mut Self {
        self.ops.push(op);
        self
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitReceipt {
    pub applied: usize,
}

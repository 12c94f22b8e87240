//! Loyalty evaluation domain types: per-customer tier state, evaluation
//! results, and batch summaries produced by the monthly tier evaluation.

use crate::tier::{Tier, TierLabel};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ─── Classification ─────────────────────────────────────────────────────────

/// Labeled transition between a customer's previous and resolved tier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
pub enum Classification {
    /// No previous tier on record.
    New,
    Upgraded,
    Downgraded,
    /// Equal rank, or either tier unranked.
    Same,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::New => "New",
            Classification::Upgraded => "Upgraded",
            Classification::Downgraded => "Downgraded",
            Classification::Same => "Same",
        }
    }
}

/// Status stored on a customer record after the latest evaluation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub enum EvaluationStatus {
    /// Written by the initial customer load, before any monthly evaluation.
    #[serde(rename = "Initial Load")]
    InitialLoad,
    New,
    Upgraded,
    Downgraded,
    Same,
}

impl From<Classification> for EvaluationStatus {
    fn from(value: Classification) -> Self {
        match value {
            Classification::New => EvaluationStatus::New,
            Classification::Upgraded => EvaluationStatus::Upgraded,
            Classification::Downgraded => EvaluationStatus::Downgraded,
            Classification::Same => EvaluationStatus::Same,
        }
    }
}

// ─── Evaluation ─────────────────────────────────────────────────────────────

/// Per-customer input to one evaluation period. Built fresh for every batch
/// from the prior period's persisted values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerTierState {
    /// `None` on a customer's first-ever evaluation.
    pub previous_tier: Option<TierLabel>,
    pub previous_ticket_count: u64,
    /// Tickets bought during the evaluation period.
    pub current_ticket_count: u64,
    /// Tier nominally assigned by the ticket-count thresholds.
    pub proposed_tier: TierLabel,
}

/// Output of the tier evaluator for one customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EvaluationResult {
    /// Tier after the special-case demotion rules.
    #[schema(value_type = String)]
    pub resolved_tier: TierLabel,
    pub classification: Classification,
}

/// Aggregate classification counts across one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BatchSummary {
    pub new_count: u64,
    pub upgraded_count: u64,
    pub downgraded_count: u64,
    pub same_count: u64,
}

impl BatchSummary {
    pub fn record(&mut self, classification: Classification) {
        match classification {
            Classification::New => self.new_count += 1,
            Classification::Upgraded => self.upgraded_count += 1,
            Classification::Downgraded => self.downgraded_count += 1,
            Classification::Same => self.same_count += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.new_count + self.upgraded_count + self.downgraded_count + self.same_count
    }
}

// ─── Batch Input ────────────────────────────────────────────────────────────

/// One customer line of a monthly update batch.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MonthlyUpdateEntry {
    pub mobile_number: String,
    /// Threshold-assigned tier. Resolved from `ticket_count` when omitted.
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub proposed_tier: Option<TierLabel>,
    #[serde(default)]
    pub ticket_count: u64,
}

/// A customer's standing against the next tier target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LoyaltyStatus {
    pub mobile_number: String,
    #[schema(value_type = Option<String>)]
    pub current_tier: Option<TierLabel>,
    pub ticket_count: u64,
    pub next_tier: Option<Tier>,
    /// Zero when there is no next tier or the target is already met.
    pub tickets_needed: u64,
}

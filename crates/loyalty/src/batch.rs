//! Batch aggregation: evaluate every customer of a monthly batch and fold
//! the results into a [`BatchSummary`].

use crate::evaluator;
use crate::thresholds::TierThresholds;
use lottery_core::loyalty::{
    BatchSummary, Classification, CustomerTierState, MonthlyUpdateEntry,
};
use lottery_core::TierLabel;
use serde::Serialize;
use std::collections::HashSet;
use utoipa::ToSchema;

/// Persisted values from the previous period.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PriorState {
    pub tier: Option<TierLabel>,
    pub ticket_count: u64,
}

/// One customer's evaluation, ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct EvaluatedCustomer {
    pub mobile_number: String,
    #[schema(value_type = Option<String>)]
    pub previous_tier: Option<TierLabel>,
    pub previous_ticket_count: u64,
    #[schema(value_type = String)]
    pub proposed_tier: TierLabel,
    #[schema(value_type = String)]
    pub resolved_tier: TierLabel,
    pub classification: Classification,
    pub ticket_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct BatchOutcome {
    pub summary: BatchSummary,
    /// Same order as the input entries.
    pub customers: Vec<EvaluatedCustomer>,
}

/// Build the evaluator input for one entry. The proposed tier comes from the
/// entry when present, otherwise from the thresholds.
pub fn tier_state(
    entry: &MonthlyUpdateEntry,
    prior: PriorState,
    thresholds: &TierThresholds,
) -> CustomerTierState {
    let proposed_tier = entry
        .proposed_tier
        .clone()
        .unwrap_or_else(|| thresholds.propose(entry.ticket_count).into());

    CustomerTierState {
        previous_tier: prior.tier,
        previous_ticket_count: prior.ticket_count,
        current_ticket_count: entry.ticket_count,
        proposed_tier,
    }
}

/// Evaluate each entry independently and count classifications.
///
/// `prior` looks up the previous period's values for a mobile number;
/// `None` treats the customer as having no history.
pub fn aggregate<F>(
    entries: &[MonthlyUpdateEntry],
    thresholds: &TierThresholds,
    mut prior: F,
) -> BatchOutcome
where
    F: FnMut(&str) -> Option<PriorState>,
{
    let mut outcome = BatchOutcome::default();

    for entry in entries {
        let state = tier_state(
            entry,
            prior(&entry.mobile_number).unwrap_or_default(),
            thresholds,
        );
        let result = evaluator::evaluate(state.previous_tier.as_ref(), &state.proposed_tier);
        outcome.summary.record(result.classification);

        outcome.customers.push(EvaluatedCustomer {
            mobile_number: entry.mobile_number.clone(),
            previous_tier: state.previous_tier,
            previous_ticket_count: state.previous_ticket_count,
            proposed_tier: state.proposed_tier,
            resolved_tier: result.resolved_tier,
            classification: result.classification,
            ticket_count: state.current_ticket_count,
        });
    }

    outcome
}

/// Mobile numbers appearing more than once, in first-repeat order.
pub fn duplicate_ids(entries: &[MonthlyUpdateEntry]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for entry in entries {
        if !seen.insert(entry.mobile_number.as_str())
            && !duplicates.contains(&entry.mobile_number)
        {
            duplicates.push(entry.mobile_number.clone());
        }
    }
    duplicates
}

#[cfg(test)]
mod tests {
    use super::*;
    use lottery_core::config::LoyaltyConfig;
    use lottery_core::Tier;
    use std::collections::HashMap;

    fn entry(mobile: &str, proposed: Option<Tier>, tickets: u64) -> MonthlyUpdateEntry {
        MonthlyUpdateEntry {
            mobile_number: mobile.to_string(),
            proposed_tier: proposed.map(TierLabel::from),
            ticket_count: tickets,
        }
    }

    fn history() -> HashMap<&'static str, PriorState> {
        let mut map = HashMap::new();
        map.insert(
            "a",
            PriorState { tier: Some(Tier::Silver.into()), ticket_count: 320 },
        );
        map.insert(
            "b",
            PriorState { tier: Some(Tier::Blue.into()), ticket_count: 12 },
        );
        map.insert(
            "c",
            PriorState { tier: Some(Tier::Platinum.into()), ticket_count: 1200 },
        );
        map.insert(
            "d",
            PriorState { tier: Some(Tier::Gold.into()), ticket_count: 600 },
        );
        map
    }

    #[test]
    fn test_aggregate_counts_every_customer_once() {
        let prior = history();
        let thresholds = TierThresholds::monthly(&LoyaltyConfig::default());
        let entries = vec![
            entry("a", Some(Tier::Gold), 510),
            entry("b", Some(Tier::Blue), 3),
            entry("c", None, 350),
            entry("d", Some(Tier::Gold), 500),
            entry("e", Some(Tier::Silver), 301),
        ];

        let outcome = aggregate(&entries, &thresholds, |m| prior.get(m).cloned());

        assert_eq!(outcome.summary.upgraded_count, 1);
        assert_eq!(outcome.summary.downgraded_count, 2);
        assert_eq!(outcome.summary.same_count, 1);
        assert_eq!(outcome.summary.new_count, 1);
        assert_eq!(outcome.summary.total(), entries.len() as u64);

        assert_eq!(outcome.customers[1].resolved_tier, TierLabel::Known(Tier::Warning));
        // Proposed tier derived from the 350-ticket count.
        assert_eq!(outcome.customers[2].proposed_tier, TierLabel::Known(Tier::Silver));
        assert_eq!(outcome.customers[2].classification, Classification::Downgraded);
        assert_eq!(outcome.customers[4].classification, Classification::New);
    }

    #[test]
    fn test_order_does_not_change_summary() {
        let prior = history();
        let thresholds = TierThresholds::monthly(&LoyaltyConfig::default());
        let mut entries = vec![
            entry("a", Some(Tier::Gold), 510),
            entry("b", Some(Tier::Blue), 3),
            entry("d", Some(Tier::Silver), 310),
        ];
        let forward = aggregate(&entries, &thresholds, |m| prior.get(m).cloned());
        entries.reverse();
        let backward = aggregate(&entries, &thresholds, |m| prior.get(m).cloned());

        assert_eq!(forward.summary, backward.summary);
        assert_eq!(forward.customers[0], backward.customers[2]);
    }

    #[test]
    fn test_duplicate_ids() {
        let entries = vec![
            entry("a", None, 1),
            entry("b", None, 1),
            entry("a", None, 2),
            entry("a", None, 3),
        ];
        assert_eq!(duplicate_ids(&entries), vec!["a".to_string()]);
        assert!(duplicate_ids(&entries[..2]).is_empty());
    }
}

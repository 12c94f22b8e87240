//! Tier evaluator: resolves a customer's tier for the new period and labels
//! the transition.
//!
//! Pure and stateless. Safe to call concurrently for any number of customers.

use lottery_core::loyalty::{Classification, EvaluationResult};
use lottery_core::{Tier, TierLabel};

/// Apply the demotion rules to the threshold-assigned tier.
///
/// 1. Blue → Blue becomes Warning.
/// 2. Warning → Blue becomes Rejected.
/// 3. Otherwise the proposed tier stands.
pub fn resolve_tier(previous: Option<&TierLabel>, proposed: &TierLabel) -> TierLabel {
    match previous.and_then(TierLabel::tier) {
        Some(Tier::Blue) if proposed.is(Tier::Blue) => TierLabel::Known(Tier::Warning),
        Some(Tier::Warning) if proposed.is(Tier::Blue) => TierLabel::Known(Tier::Rejected),
        _ => proposed.clone(),
    }
}

/// Classify the move from `previous` to `resolved` by priority rank.
pub fn classify(previous: Option<&TierLabel>, resolved: &TierLabel) -> Classification {
    let Some(previous) = previous else {
        return Classification::New;
    };

    match (previous.rank(), resolved.rank()) {
        (Some(prev), Some(new)) if new < prev => Classification::Upgraded,
        (Some(prev), Some(new)) if new > prev => Classification::Downgraded,
        // Equal rank, or an unranked tier on either side.
        _ => Classification::Same,
    }
}

/// Resolve and classify in one step.
pub fn evaluate(previous: Option<&TierLabel>, proposed: &TierLabel) -> EvaluationResult {
    let resolved_tier = resolve_tier(previous, proposed);
    let classification = classify(previous, &resolved_tier);
    EvaluationResult {
        resolved_tier,
        classification,
    }
}

//! Lottery loyalty program: tier evaluation, monthly batches and the daily
//! purchase roll-up.

#![warn(clippy::unwrap_used)]

pub mod batch;
pub mod daily;
pub mod engine;
pub mod evaluator;
pub mod thresholds;

pub use batch::{BatchOutcome, EvaluatedCustomer};
pub use daily::{DailyEntry, DailyOutcome, DateRange};
pub use engine::{
    DailyUpgradeReport, InitialCustomer, InitialLoadReport, InitialLoadRequest, LoyaltyEngine,
    MonthlyUpdateReport, WalletBalance,
};
pub use evaluator::{classify, evaluate, resolve_tier};
pub use thresholds::TierThresholds;

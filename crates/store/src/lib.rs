//! Persistence collaborator for the loyalty engine.
//!
//! Reads go straight to the store; every write is staged in a
//! [`UnitOfWork`] and committed all-or-nothing.

#![warn(clippy::unwrap_used)]

pub mod memory;
pub mod unit_of_work;

pub use memory::InMemoryStore;
pub use unit_of_work::{CommitReceipt, UnitOfWork, WriteOp};

use lottery_core::customer::{
    Customer, DailyUpgradeRecord, MonthlySummaryRecord, MonthlyUpgradeRecord,
};
use lottery_core::settings::Setting;
use lottery_core::LoyaltyError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("customer {0} does not exist")]
    CustomerNotFound(String),

    #[error("summary for evaluation '{0}' does not exist")]
    SummaryNotFound(String),

    #[error("ticket count for customer {0} would overflow")]
    TicketOverflow(String),

    #[error("customer {mobile} changed since it was read (expected tier {expected}, found {found})")]
    Conflict {
        mobile: String,
        expected: String,
        found: String,
    },
}

impl From<StoreError> for LoyaltyError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::CustomerNotFound(mobile) => LoyaltyError::CustomerNotFound(mobile),
            StoreError::TicketOverflow(_) => LoyaltyError::Validation(value.to_string()),
            other => LoyaltyError::Storage(other.to_string()),
        }
    }
}

/// Storage contract consumed by the loyalty engine.
pub trait LoyaltyStore: Send + Sync {
    fn customer(&self, mobile_number: &str) -> Option<Customer>;

    /// All customers ordered by mobile number.
    fn customers(&self) -> Vec<Customer>;

    fn customer_count(&self) -> usize;

    /// Monthly history rows in insertion order, optionally for one customer.
    fn monthly_records(&self, mobile_number: Option<&str>) -> Vec<MonthlyUpgradeRecord>;

    fn summaries(&self) -> Vec<MonthlySummaryRecord>;

    fn summary(&self, evaluation: &str) -> Option<MonthlySummaryRecord>;

    /// The customer's open daily record, if any.
    fn daily_record(&self, mobile_number: &str) -> Option<DailyUpgradeRecord>;

    /// Daily records oldest range first, optionally for one customer.
    fn daily_records(&self, mobile_number: Option<&str>) -> Vec<DailyUpgradeRecord>;

    /// Settings ordered by key.
    fn settings(&self) -> Vec<Setting>;

    fn setting(&self, key: &str) -> Option<Setting>;

    /// Apply every staged write, or none of them.
    fn commit(&self, work: UnitOfWork) -> Result<CommitReceipt, StoreError>;
}

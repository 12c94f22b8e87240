pub mod config;
pub mod customer;
pub mod error;
pub mod loyalty;
pub mod settings;
pub mod tier;

pub use config::AppConfig;
pub use error::{LoyaltyError, LoyaltyResult};
pub use tier::{Tier, TierLabel, TIER_PRIORITY};

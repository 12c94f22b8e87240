//! Customer dashboard: headline figures, tier distribution and the
//! follow-up lists used by the loyalty team.

pub mod dashboard;

pub use dashboard::LoyaltyDashboard;

//! Dashboard endpoints over the current customer list.

use crate::rest::AppState;
use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use lottery_reporting::dashboard::{
    CustomerRow, DashboardSummary, PurchasePoint, RegistrationPoint, TierCount,
};
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
pub struct TopQuery {
    /// Maximum rows; defaults to the configured limit.
    pub limit: Option<usize>,
}

/// GET /dashboard/summary — Headline figures.
#[utoipa::path(
    get,
    path = "/dashboard/summary",
    tag = "Dashboard",
    responses((status = 200, description = "Dashboard summary", body = DashboardSummary))
)]
pub async fn handle_summary(State(state): State<AppState>) -> Json<DashboardSummary> {
    let customers = state.engine.customers();
    Json(state.dashboard.summary(&customers, Utc::now().date_naive()))
}

/// GET /dashboard/tiers — Customers per tier.
#[utoipa::path(
    get,
    path = "/dashboard/tiers",
    tag = "Dashboard",
    responses((status = 200, description = "Tier distribution", body = Vec<TierCount>))
)]
pub async fn handle_tiers(State(state): State<AppState>) -> Json<Vec<TierCount>> {
    Json(state.dashboard.tier_distribution(&state.engine.customers()))
}

/// GET /dashboard/registrations/monthly — Registrations per month.
#[utoipa::path(
    get,
    path = "/dashboard/registrations/monthly",
    tag = "Dashboard",
    responses((status = 200, description = "Registrations per month", body = Vec<RegistrationPoint>))
)]
pub async fn handle_registrations(State(state): State<AppState>) -> Json<Vec<RegistrationPoint>> {
    Json(state.dashboard.monthly_registrations(&state.engine.customers()))
}

/// GET /dashboard/purchases/daily — Customers by date of last purchase.
#[utoipa::path(
    get,
    path = "/dashboard/purchases/daily",
    tag = "Dashboard",
    responses((status = 200, description = "Customers per purchase day", body = Vec<PurchasePoint>))
)]
pub async fn handle_daily_purchases(State(state): State<AppState>) -> Json<Vec<PurchasePoint>> {
    Json(state.dashboard.daily_purchases(&state.engine.customers()))
}

/// GET /dashboard/customers/top — Highest ticket counts.
#[utoipa::path(
    get,
    path = "/dashboard/customers/top",
    tag = "Dashboard",
    params(TopQuery),
    responses((status = 200, description = "Top customers", body = Vec<CustomerRow>))
)]
pub async fn handle_top_customers(
    State(state): State<AppState>,
    Query(query): Query<TopQuery>,
) -> Json<Vec<CustomerRow>> {
    Json(
        state
            .dashboard
            .top_customers(&state.engine.customers(), query.limit),
    )
}

/// GET /dashboard/customers/upgrade-candidates — Customers close to a tier up.
#[utoipa::path(
    get,
    path = "/dashboard/customers/upgrade-candidates",
    tag = "Dashboard",
    responses((status = 200, description = "Upgrade candidates", body = Vec<CustomerRow>))
)]
pub async fn handle_upgrade_candidates(State(state): State<AppState>) -> Json<Vec<CustomerRow>> {
    Json(state.dashboard.upgrade_candidates(&state.engine.customers()))
}

/// GET /dashboard/customers/missing-email — Customers without an email address.
#[utoipa::path(
    get,
    path = "/dashboard/customers/missing-email",
    tag = "Dashboard",
    responses((status = 200, description = "Customers missing email", body = Vec<CustomerRow>))
)]
pub async fn handle_missing_email(State(state): State<AppState>) -> Json<Vec<CustomerRow>> {
    Json(state.dashboard.missing_email(&state.engine.customers()))
}

/// GET /dashboard/customers/inactive — Customers with no recent purchase.
#[utoipa::path(
    get,
    path = "/dashboard/customers/inactive",
    tag = "Dashboard",
    responses((status = 200, description = "Inactive customers", body = Vec<CustomerRow>))
)]
pub async fn handle_inactive(State(state): State<AppState>) -> Json<Vec<CustomerRow>> {
    let customers = state.engine.customers();
    Json(state.dashboard.inactive(&customers, Utc::now().date_naive()))
}

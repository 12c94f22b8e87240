//! Loyalty program REST API endpoints: batch loads, monthly evaluation,
//! daily roll-up, customer lookup and the customer portal.

use crate::rest::{
    loyalty_error, validate_batch_len, validate_label, validate_mobile, validation_error,
    ApiResult, AppState, ErrorResponse,
};
use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::NaiveDate;
use lottery_core::customer::{
    Customer, DailyUpgradeRecord, MonthlySummaryRecord, MonthlyUpgradeRecord,
};
use lottery_core::loyalty::{LoyaltyStatus, MonthlyUpdateEntry};
use lottery_loyalty::batch::duplicate_ids;
use lottery_loyalty::{
    DailyEntry, DailyUpgradeReport, DateRange, InitialLoadReport, InitialLoadRequest,
    MonthlyUpdateReport, WalletBalance,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, ToSchema)]
pub struct MonthlyUpdateRequest {
    /// Evaluation label, e.g. `2025-03`.
    pub last_update: String,
    pub customers: Vec<MonthlyUpdateEntry>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DailyUpgradeRequest {
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub customers: Vec<DailyEntry>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct MonthQuery {
    /// Evaluation label, e.g. `2025-03`.
    pub month: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct TicketRangeQuery {
    /// Earliest record start date.
    pub from: Option<NaiveDate>,
    /// Latest record end date.
    pub to: Option<NaiveDate>,
}

#[derive(Serialize, ToSchema)]
pub struct DeleteAllResponse {
    pub success: bool,
    pub message: String,
}

/// POST /api/loyalty/initial-load — Insert the first batch of customers.
#[utoipa::path(
    post,
    path = "/api/loyalty/initial-load",
    tag = "Loyalty",
    request_body = InitialLoadRequest,
    responses(
        (status = 200, description = "Customers inserted", body = InitialLoadReport),
        (status = 400, description = "Invalid batch", body = ErrorResponse),
        (status = 500, description = "Store failure", body = ErrorResponse),
    )
)]
pub async fn handle_initial_load(
    State(state): State<AppState>,
    Json(request): Json<InitialLoadRequest>,
) -> ApiResult<InitialLoadReport> {
    validate_batch_len(request.customers.len()).map_err(validation_error)?;
    validate_label(&request.last_update).map_err(validation_error)?;
    for customer in &request.customers {
        validate_mobile(&customer.mobile_number).map_err(validation_error)?;
    }

    let report = state.engine.initial_load(request).map_err(loyalty_error)?;
    metrics::counter!("api.loyalty.initial_loads").increment(1);
    Ok(Json(report))
}

/// POST /api/loyalty/monthly-update — Evaluate and persist one monthly batch.
#[utoipa::path(
    post,
    path = "/api/loyalty/monthly-update",
    tag = "Loyalty",
    request_body = MonthlyUpdateRequest,
    responses(
        (status = 200, description = "Batch evaluated and committed", body = MonthlyUpdateReport),
        (status = 400, description = "Invalid batch", body = ErrorResponse),
        (status = 404, description = "Batch references an unknown customer", body = ErrorResponse),
        (status = 500, description = "Store failure, nothing persisted", body = ErrorResponse),
    )
)]
pub async fn handle_monthly_update(
    State(state): State<AppState>,
    Json(request): Json<MonthlyUpdateRequest>,
) -> ApiResult<MonthlyUpdateReport> {
    validate_label(&request.last_update).map_err(validation_error)?;
    validate_batch_len(request.customers.len()).map_err(validation_error)?;
    for entry in &request.customers {
        validate_mobile(&entry.mobile_number).map_err(validation_error)?;
    }
    if !duplicate_ids(&request.customers).is_empty() {
        return Err(validation_error("batch contains duplicate mobile numbers"));
    }

    let report = state
        .engine
        .monthly_update(&request.last_update, &request.customers)
        .map_err(loyalty_error)?;
    metrics::counter!("api.loyalty.monthly_updates").increment(1);
    Ok(Json(report))
}

/// GET /api/loyalty/monthly-upgrades — All monthly history rows.
#[utoipa::path(
    get,
    path = "/api/loyalty/monthly-upgrades",
    tag = "Loyalty",
    responses((status = 200, description = "Monthly history", body = Vec<MonthlyUpgradeRecord>))
)]
pub async fn handle_monthly_upgrades(
    State(state): State<AppState>,
) -> Json<Vec<MonthlyUpgradeRecord>> {
    Json(state.engine.monthly_records())
}

/// GET /api/loyalty/monthly-upgrade-summary — Per-evaluation counts.
#[utoipa::path(
    get,
    path = "/api/loyalty/monthly-upgrade-summary",
    tag = "Loyalty",
    responses((status = 200, description = "Evaluation summaries", body = Vec<MonthlySummaryRecord>))
)]
pub async fn handle_monthly_summary(
    State(state): State<AppState>,
) -> Json<Vec<MonthlySummaryRecord>> {
    Json(state.engine.summaries())
}

/// GET /api/loyalty/monthly-upgrade/{mobile} — One customer's history.
#[utoipa::path(
    get,
    path = "/api/loyalty/monthly-upgrade/{mobile}",
    tag = "Loyalty",
    params(("mobile" = String, Path, description = "Customer mobile number")),
    responses(
        (status = 200, description = "Customer history, oldest first", body = Vec<MonthlyUpgradeRecord>),
        (status = 404, description = "Customer not found", body = ErrorResponse),
    )
)]
pub async fn handle_customer_monthly(
    State(state): State<AppState>,
    Path(mobile): Path<String>,
) -> ApiResult<Vec<MonthlyUpgradeRecord>> {
    validate_mobile(&mobile).map_err(validation_error)?;
    state.engine.tier_history(&mobile).map(Json).map_err(loyalty_error)
}

/// GET /api/loyalty/monthly-upgrade/{mobile}/latest — Most recent history row.
#[utoipa::path(
    get,
    path = "/api/loyalty/monthly-upgrade/{mobile}/latest",
    tag = "Loyalty",
    params(("mobile" = String, Path, description = "Customer mobile number")),
    responses(
        (status = 200, description = "Latest history row", body = MonthlyUpgradeRecord),
        (status = 404, description = "No history for customer", body = ErrorResponse),
    )
)]
pub async fn handle_customer_monthly_latest(
    State(state): State<AppState>,
    Path(mobile): Path<String>,
) -> ApiResult<MonthlyUpgradeRecord> {
    validate_mobile(&mobile).map_err(validation_error)?;
    state.engine.latest_monthly(&mobile).map(Json).map_err(loyalty_error)
}

/// POST /api/loyalty/daily-upgrade — Roll a daily purchase batch forward.
#[utoipa::path(
    post,
    path = "/api/loyalty/daily-upgrade",
    tag = "Loyalty",
    request_body = DailyUpgradeRequest,
    responses(
        (status = 200, description = "Per-customer outcomes", body = DailyUpgradeReport),
        (status = 400, description = "Invalid batch", body = ErrorResponse),
    )
)]
pub async fn handle_daily_upgrade(
    State(state): State<AppState>,
    Json(request): Json<DailyUpgradeRequest>,
) -> ApiResult<DailyUpgradeReport> {
    validate_batch_len(request.customers.len()).map_err(validation_error)?;
    for entry in &request.customers {
        validate_mobile(&entry.mobile_number).map_err(validation_error)?;
    }
    let range = DateRange::new(request.from_date, request.to_date).map_err(loyalty_error)?;

    let report = state
        .engine
        .daily_upgrade(range, &request.customers)
        .map_err(loyalty_error)?;
    metrics::counter!("api.loyalty.daily_upgrades").increment(1);
    Ok(Json(report))
}

/// GET /api/daily-upgrade — All daily purchase records.
#[utoipa::path(
    get,
    path = "/api/daily-upgrade",
    tag = "Loyalty",
    responses((status = 200, description = "Daily records", body = Vec<DailyUpgradeRecord>))
)]
pub async fn handle_daily_records(State(state): State<AppState>) -> Json<Vec<DailyUpgradeRecord>> {
    Json(state.engine.all_daily_records())
}

/// GET /api/daily-upgrade/{mobile} — One customer's daily records.
#[utoipa::path(
    get,
    path = "/api/daily-upgrade/{mobile}",
    tag = "Loyalty",
    params(("mobile" = String, Path, description = "Customer mobile number")),
    responses(
        (status = 200, description = "Daily records, oldest first", body = Vec<DailyUpgradeRecord>),
        (status = 404, description = "Customer not found", body = ErrorResponse),
    )
)]
pub async fn handle_customer_daily(
    State(state): State<AppState>,
    Path(mobile): Path<String>,
) -> ApiResult<Vec<DailyUpgradeRecord>> {
    validate_mobile(&mobile).map_err(validation_error)?;
    state.engine.daily_history(&mobile).map(Json).map_err(loyalty_error)
}

/// GET /api/daily-upgrade/{mobile}/latest — Daily record with the latest end date.
#[utoipa::path(
    get,
    path = "/api/daily-upgrade/{mobile}/latest",
    tag = "Loyalty",
    params(("mobile" = String, Path, description = "Customer mobile number")),
    responses(
        (status = 200, description = "Latest daily record", body = DailyUpgradeRecord),
        (status = 404, description = "No daily records", body = ErrorResponse),
    )
)]
pub async fn handle_customer_daily_latest(
    State(state): State<AppState>,
    Path(mobile): Path<String>,
) -> ApiResult<DailyUpgradeRecord> {
    validate_mobile(&mobile).map_err(validation_error)?;
    state.engine.latest_daily(&mobile).map(Json).map_err(loyalty_error)
}

/// GET /api/lottery/breakdowns/current — Each customer's running per-draw counts.
#[utoipa::path(
    get,
    path = "/api/lottery/breakdowns/current",
    tag = "Loyalty",
    responses((status = 200, description = "Open daily records", body = Vec<DailyUpgradeRecord>))
)]
pub async fn handle_current_breakdowns(
    State(state): State<AppState>,
) -> Json<Vec<DailyUpgradeRecord>> {
    Json(state.engine.current_breakdowns())
}

/// GET /api/lottery/breakdowns/monthly/{month} — Per-draw counts of a closed month.
#[utoipa::path(
    get,
    path = "/api/lottery/breakdowns/monthly/{month}",
    tag = "Loyalty",
    params(("month" = String, Path, description = "Month label, e.g. 2025-05")),
    responses(
        (status = 200, description = "History rows for the month", body = Vec<MonthlyUpgradeRecord>),
        (status = 400, description = "Invalid month label", body = ErrorResponse),
    )
)]
pub async fn handle_monthly_breakdowns(
    State(state): State<AppState>,
    Path(month): Path<String>,
) -> ApiResult<Vec<MonthlyUpgradeRecord>> {
    validate_label(&month).map_err(validation_error)?;
    Ok(Json(state.engine.monthly_breakdowns(&month)))
}

/// DELETE /api/loyalty/delete-all — Clear customers and history.
#[utoipa::path(
    delete,
    path = "/api/loyalty/delete-all",
    tag = "Loyalty",
    responses(
        (status = 200, description = "All loyalty data removed", body = DeleteAllResponse),
        (status = 500, description = "Store failure", body = ErrorResponse),
    )
)]
pub async fn handle_delete_all(State(state): State<AppState>) -> ApiResult<DeleteAllResponse> {
    state.engine.reset().map_err(loyalty_error)?;
    Ok(Json(DeleteAllResponse {
        success: true,
        message: "All customers, monthly records and summaries deleted".to_string(),
    }))
}

// ─── Customers & Portal ─────────────────────────────────────────────────────

/// GET /api/customers — All customers ordered by mobile number.
#[utoipa::path(
    get,
    path = "/api/customers",
    tag = "Customers",
    responses((status = 200, description = "Customer list", body = Vec<Customer>))
)]
pub async fn handle_list_customers(State(state): State<AppState>) -> Json<Vec<Customer>> {
    Json(state.engine.customers())
}

/// GET /api/customers/{mobile} — One customer record.
#[utoipa::path(
    get,
    path = "/api/customers/{mobile}",
    tag = "Customers",
    params(("mobile" = String, Path, description = "Customer mobile number")),
    responses(
        (status = 200, description = "Customer record", body = Customer),
        (status = 404, description = "Customer not found", body = ErrorResponse),
    )
)]
pub async fn handle_get_customer(
    State(state): State<AppState>,
    Path(mobile): Path<String>,
) -> ApiResult<Customer> {
    validate_mobile(&mobile).map_err(validation_error)?;
    state.engine.customer(&mobile).map(Json).map_err(loyalty_error)
}

/// GET /api/portal/loyalty/{mobile} — Tier status and progress to the next tier.
#[utoipa::path(
    get,
    path = "/api/portal/loyalty/{mobile}",
    tag = "Customers",
    params(("mobile" = String, Path, description = "Customer mobile number")),
    responses(
        (status = 200, description = "Loyalty status", body = LoyaltyStatus),
        (status = 404, description = "Customer not found", body = ErrorResponse),
    )
)]
pub async fn handle_portal_status(
    State(state): State<AppState>,
    Path(mobile): Path<String>,
) -> ApiResult<LoyaltyStatus> {
    validate_mobile(&mobile).map_err(validation_error)?;
    metrics::counter!("api.portal.status_lookups").increment(1);
    state.engine.loyalty_status(&mobile).map(Json).map_err(loyalty_error)
}

/// GET /api/portal/loyalty/history/{mobile} — Tier history for the portal.
#[utoipa::path(
    get,
    path = "/api/portal/loyalty/history/{mobile}",
    tag = "Customers",
    params(("mobile" = String, Path, description = "Customer mobile number")),
    responses(
        (status = 200, description = "Tier history, oldest first", body = Vec<MonthlyUpgradeRecord>),
        (status = 404, description = "Customer not found", body = ErrorResponse),
    )
)]
pub async fn handle_portal_history(
    State(state): State<AppState>,
    Path(mobile): Path<String>,
) -> ApiResult<Vec<MonthlyUpgradeRecord>> {
    validate_mobile(&mobile).map_err(validation_error)?;
    state.engine.tier_history(&mobile).map(Json).map_err(loyalty_error)
}

/// GET /api/portal/wallet/{mobile} — Wallet balance.
#[utoipa::path(
    get,
    path = "/api/portal/wallet/{mobile}",
    tag = "Customers",
    params(("mobile" = String, Path, description = "Customer mobile number")),
    responses(
        (status = 200, description = "Wallet balance", body = WalletBalance),
        (status = 404, description = "Customer not found", body = ErrorResponse),
    )
)]
pub async fn handle_portal_wallet(
    State(state): State<AppState>,
    Path(mobile): Path<String>,
) -> ApiResult<WalletBalance> {
    validate_mobile(&mobile).map_err(validation_error)?;
    state.engine.wallet(&mobile).map(Json).map_err(loyalty_error)
}

/// GET /api/portal/tickets/monthly/{mobile} — Tickets and breakdown for one month.
#[utoipa::path(
    get,
    path = "/api/portal/tickets/monthly/{mobile}",
    tag = "Customers",
    params(("mobile" = String, Path, description = "Customer mobile number"), MonthQuery),
    responses(
        (status = 200, description = "Monthly history row", body = MonthlyUpgradeRecord),
        (status = 400, description = "Missing month", body = ErrorResponse),
        (status = 404, description = "No record for the month", body = ErrorResponse),
    )
)]
pub async fn handle_portal_monthly_tickets(
    State(state): State<AppState>,
    Path(mobile): Path<String>,
    Query(query): Query<MonthQuery>,
) -> ApiResult<MonthlyUpgradeRecord> {
    validate_mobile(&mobile).map_err(validation_error)?;
    let month = query
        .month
        .ok_or_else(|| validation_error("month query parameter is required"))?;
    validate_label(&month).map_err(validation_error)?;
    state
        .engine
        .monthly_tickets(&mobile, &month)
        .map(Json)
        .map_err(loyalty_error)
}

/// GET /api/portal/tickets/daily/{mobile} — Daily records, newest first.
#[utoipa::path(
    get,
    path = "/api/portal/tickets/daily/{mobile}",
    tag = "Customers",
    params(("mobile" = String, Path, description = "Customer mobile number")),
    responses(
        (status = 200, description = "Daily records, newest first", body = Vec<DailyUpgradeRecord>),
        (status = 404, description = "Customer not found", body = ErrorResponse),
    )
)]
pub async fn handle_portal_daily_tickets(
    State(state): State<AppState>,
    Path(mobile): Path<String>,
) -> ApiResult<Vec<DailyUpgradeRecord>> {
    validate_mobile(&mobile).map_err(validation_error)?;
    state
        .engine
        .ticket_history(&mobile, None, None)
        .map(Json)
        .map_err(loyalty_error)
}

/// GET /api/portal/tickets/history/{mobile} — Daily records inside a date window.
#[utoipa::path(
    get,
    path = "/api/portal/tickets/history/{mobile}",
    tag = "Customers",
    params(("mobile" = String, Path, description = "Customer mobile number"), TicketRangeQuery),
    responses(
        (status = 200, description = "Daily records, newest first", body = Vec<DailyUpgradeRecord>),
        (status = 400, description = "Window ends before it starts", body = ErrorResponse),
        (status = 404, description = "Customer not found", body = ErrorResponse),
    )
)]
pub async fn handle_portal_ticket_history(
    State(state): State<AppState>,
    Path(mobile): Path<String>,
    Query(query): Query<TicketRangeQuery>,
) -> ApiResult<Vec<DailyUpgradeRecord>> {
    validate_mobile(&mobile).map_err(validation_error)?;
    if let (Some(from), Some(to)) = (query.from, query.to) {
        DateRange::new(from, to).map_err(loyalty_error)?;
    }
    state
        .engine
        .ticket_history(&mobile, query.from, query.to)
        .map(Json)
        .map_err(loyalty_error)
}

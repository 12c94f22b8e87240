//! Runtime loyalty settings (tier thresholds and downgrade rules).

use crate::rest::{loyalty_error, ApiResult, AppState, ErrorResponse};
use axum::extract::State;
use axum::Json;
use lottery_core::settings::Setting;

/// GET /api/settings — All settings ordered by key.
#[utoipa::path(
    get,
    path = "/api/settings",
    tag = "Settings",
    responses((status = 200, description = "Current settings", body = Vec<Setting>))
)]
pub async fn handle_list_settings(State(state): State<AppState>) -> Json<Vec<Setting>> {
    Json(state.engine.settings())
}

/// POST /api/settings — Insert or replace one setting.
#[utoipa::path(
    post,
    path = "/api/settings",
    tag = "Settings",
    request_body = Setting,
    responses(
        (status = 200, description = "Setting stored", body = Setting),
        (status = 400, description = "Invalid setting value", body = ErrorResponse),
    )
)]
pub async fn handle_update_setting(
    State(state): State<AppState>,
    Json(setting): Json<Setting>,
) -> ApiResult<Setting> {
    state
        .engine
        .update_setting(setting)
        .map(Json)
        .map_err(loyalty_error)
}

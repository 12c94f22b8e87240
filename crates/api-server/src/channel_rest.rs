//! SMS gateway and tier notification email endpoints.

use crate::rest::{
    email_error, error_response, loyalty_error, sms_error, validate_mobile, validation_error,
    ApiResult, AppState, ErrorResponse,
};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use lottery_channels::email::EmailMessage;
use lottery_channels::sms::{GatewayTokens, SmsDispatch};
use lottery_channels::{NoticeKind, TierNotice};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Dispatches returned when no limit is given.
const DEFAULT_DISPATCH_LIMIT: usize = 50;

#[derive(Debug, Deserialize, ToSchema)]
pub struct SmsLoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SmsSendRequest {
    #[serde(default)]
    pub campaign_name: String,
    #[serde(default)]
    pub mask: String,
    /// Comma-separated recipient numbers.
    #[serde(default)]
    pub numbers: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Serialize, ToSchema)]
pub struct SmsAuthResponse {
    pub success: bool,
    pub message: String,
    pub tokens: GatewayTokens,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct DispatchQuery {
    /// Maximum rows, newest first.
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoyaltyEmailRequest {
    pub mobile_number: String,
    /// Notice to send; defaults to the customer's last evaluation outcome.
    #[serde(default)]
    pub kind: Option<NoticeKind>,
    /// Overrides the customer's stored address.
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub cc: Option<String>,
}

/// POST /sms/login — Authenticate with the SMS gateway.
#[utoipa::path(
    post,
    path = "/sms/login",
    tag = "Channels",
    request_body = SmsLoginRequest,
    responses(
        (status = 200, description = "Login successful", body = SmsAuthResponse),
        (status = 400, description = "Missing username or password", body = ErrorResponse),
        (status = 500, description = "Gateway rejected the login", body = ErrorResponse),
    )
)]
pub async fn handle_sms_login(
    State(state): State<AppState>,
    Json(request): Json<SmsLoginRequest>,
) -> ApiResult<SmsAuthResponse> {
    let tokens = state
        .sms
        .login(&request.username, &request.password)
        .map_err(sms_error)?;
    Ok(Json(SmsAuthResponse {
        success: true,
        message: "Login successful".to_string(),
        tokens,
    }))
}

/// POST /sms/send — Send an SMS campaign message.
#[utoipa::path(
    post,
    path = "/sms/send",
    tag = "Channels",
    request_body = SmsSendRequest,
    responses(
        (status = 200, description = "SMS sent", body = SmsDispatch),
        (status = 400, description = "Missing fields or invalid numbers", body = ErrorResponse),
        (status = 401, description = "Not logged in to the gateway", body = ErrorResponse),
    )
)]
pub async fn handle_sms_send(
    State(state): State<AppState>,
    Json(request): Json<SmsSendRequest>,
) -> ApiResult<SmsDispatch> {
    state
        .sms
        .send(
            &request.campaign_name,
            &request.mask,
            &request.numbers,
            &request.content,
        )
        .map(Json)
        .map_err(sms_error)
}

/// GET /sms/dispatches — Recently sent messages.
#[utoipa::path(
    get,
    path = "/sms/dispatches",
    tag = "Channels",
    params(DispatchQuery),
    responses((status = 200, description = "Dispatches, newest first", body = Vec<SmsDispatch>))
)]
pub async fn handle_list_dispatches(
    State(state): State<AppState>,
    Query(query): Query<DispatchQuery>,
) -> Json<Vec<SmsDispatch>> {
    Json(state.sms.list_dispatches(query.limit.unwrap_or(DEFAULT_DISPATCH_LIMIT)))
}

/// GET /sms/dispatches/{id} — One sent message.
#[utoipa::path(
    get,
    path = "/sms/dispatches/{id}",
    tag = "Channels",
    params(("id" = Uuid, Path, description = "Dispatch id")),
    responses(
        (status = 200, description = "Dispatch record", body = SmsDispatch),
        (status = 404, description = "Unknown or expired dispatch", body = ErrorResponse),
    )
)]
pub async fn handle_get_dispatch(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<SmsDispatch> {
    state.sms.get_dispatch(id).map(Json).ok_or_else(|| {
        error_response(
            StatusCode::NOT_FOUND,
            "dispatch_not_found",
            format!("dispatch {id} not found"),
        )
    })
}

/// POST /sms/refresh — Exchange the cached refresh token.
#[utoipa::path(
    post,
    path = "/sms/refresh",
    tag = "Channels",
    responses(
        (status = 200, description = "Token refreshed", body = SmsAuthResponse),
        (status = 400, description = "No refresh token available", body = ErrorResponse),
    )
)]
pub async fn handle_sms_refresh(State(state): State<AppState>) -> ApiResult<SmsAuthResponse> {
    let tokens = state.sms.refresh().map_err(sms_error)?;
    Ok(Json(SmsAuthResponse {
        success: true,
        message: "Token refreshed".to_string(),
        tokens,
    }))
}

/// POST /email/loyalty — Send a customer's tier notice.
#[utoipa::path(
    post,
    path = "/email/loyalty",
    tag = "Channels",
    request_body = LoyaltyEmailRequest,
    responses(
        (status = 200, description = "Email queued", body = EmailMessage),
        (status = 400, description = "No usable recipient", body = ErrorResponse),
        (status = 404, description = "Customer not found", body = ErrorResponse),
    )
)]
pub async fn handle_loyalty_email(
    State(state): State<AppState>,
    Json(request): Json<LoyaltyEmailRequest>,
) -> ApiResult<EmailMessage> {
    validate_mobile(&request.mobile_number).map_err(validation_error)?;
    let customer = state
        .engine
        .customer(&request.mobile_number)
        .map_err(loyalty_error)?;

    let message = match request.to.as_deref() {
        Some(to) => {
            let notice = TierNotice::for_customer(&customer, request.kind);
            state
                .email
                .send(to, request.cc.as_deref(), &notice.subject, &notice.body)
        }
        None => state
            .email
            .send_notice(&customer, request.kind, request.cc.as_deref()),
    }
    .map_err(email_error)?;

    info!(mobile = %customer.mobile_number, to = %message.to, "Loyalty email sent");
    Ok(Json(message))
}

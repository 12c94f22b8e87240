//! Shared API state, error mapping and operational endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use lottery_channels::{EmailError, EmailProvider, SmsError, SmsGateway};
use lottery_core::LoyaltyError;
use lottery_loyalty::LoyaltyEngine;
use lottery_reporting::LoyaltyDashboard;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, warn};
use utoipa::ToSchema;

/// Maximum customers accepted in one batch request.
pub const MAX_BATCH_SIZE: usize = 50_000;

/// Maximum length of labels and identifiers.
pub const MAX_FIELD_LEN: usize = 64;

/// Shared application state for REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<LoyaltyEngine>,
    pub sms: Arc<SmsGateway>,
    pub email: Arc<EmailProvider>,
    pub dashboard: Arc<LoyaltyDashboard>,
    pub node_id: String,
    pub start_time: Instant,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub node_id: String,
    pub uptime_secs: u64,
    pub customers: usize,
}

/// Error half of every handler result.
pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub type ApiResult<T> = Result<Json<T>, ApiError>;

pub fn error_response(status: StatusCode, error: &str, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            message: message.into(),
        }),
    )
}

/// Reject a request that failed boundary validation.
pub fn validation_error(message: &str) -> ApiError {
    warn!(error = message, "Request validation failed");
    metrics::counter!("api.validation_errors").increment(1);
    error_response(StatusCode::BAD_REQUEST, "invalid_request", message)
}

pub fn loyalty_error(err: LoyaltyError) -> ApiError {
    match err {
        LoyaltyError::Validation(msg) => {
            metrics::counter!("api.validation_errors").increment(1);
            error_response(StatusCode::BAD_REQUEST, "invalid_request", msg)
        }
        LoyaltyError::InvalidSetting { .. } => {
            metrics::counter!("api.validation_errors").increment(1);
            error_response(StatusCode::BAD_REQUEST, "invalid_setting", err.to_string())
        }
        LoyaltyError::CustomerNotFound(mobile) => error_response(
            StatusCode::NOT_FOUND,
            "customer_not_found",
            format!("customer {mobile} not found"),
        ),
        LoyaltyError::RecordNotFound(what) => {
            error_response(StatusCode::NOT_FOUND, "record_not_found", what)
        }
        other => {
            error!(error = %other, "Loyalty operation failed");
            metrics::counter!("api.errors").increment(1);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "storage_failure",
                "Internal processing error",
            )
        }
    }
}

pub fn sms_error(err: SmsError) -> ApiError {
    let (status, code) = match &err {
        SmsError::NotAuthenticated => (StatusCode::UNAUTHORIZED, "not_authenticated"),
        SmsError::Gateway(_) => (StatusCode::INTERNAL_SERVER_ERROR, "gateway_failure"),
        SmsError::MissingCredentials
        | SmsError::NoRefreshToken
        | SmsError::MissingField(_)
        | SmsError::InvalidNumbers(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
    };
    if status.is_server_error() {
        error!(error = %err, "SMS gateway call failed");
        metrics::counter!("api.errors").increment(1);
    }
    error_response(status, code, err.to_string())
}

pub fn email_error(err: EmailError) -> ApiError {
    let code = match err {
        EmailError::NoRecipient(_) => "no_recipient",
        EmailError::InvalidAddress(_) | EmailError::EmptyMessage => "invalid_request",
    };
    error_response(StatusCode::BAD_REQUEST, code, err.to_string())
}

/// Mobile numbers in paths must be non-empty digits, optionally with a
/// leading `+`.
pub fn validate_mobile(mobile: &str) -> Result<(), &'static str> {
    let digits = mobile.strip_prefix('+').unwrap_or(mobile);
    if digits.is_empty() {
        return Err("mobile number must not be empty");
    }
    if digits.len() > MAX_FIELD_LEN {
        return Err("mobile number exceeds maximum length");
    }
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err("mobile number must contain digits only");
    }
    Ok(())
}

pub fn validate_label(label: &str) -> Result<(), &'static str> {
    if label.trim().is_empty() {
        return Err("evaluation label must not be empty");
    }
    if label.len() > MAX_FIELD_LEN {
        return Err("evaluation label exceeds maximum length");
    }
    Ok(())
}

pub fn validate_batch_len(len: usize) -> Result<(), &'static str> {
    if len == 0 {
        return Err("batch must contain at least one customer");
    }
    if len > MAX_BATCH_SIZE {
        return Err("batch exceeds maximum number of customers");
    }
    Ok(())
}

/// GET /health — Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Operations",
    responses((status = 200, description = "Service is healthy", body = HealthResponse))
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        node_id: state.node_id.clone(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        customers: state.engine.customers().len(),
    })
}

/// GET /ready — Readiness probe.
#[utoipa::path(
    get,
    path = "/ready",
    tag = "Operations",
    responses(
        (status = 200, description = "Ready to accept traffic"),
        (status = 503, description = "Threshold settings not seeded"),
    )
)]
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.engine.settings_seeded() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /live — Liveness probe.
#[utoipa::path(
    get,
    path = "/live",
    tag = "Operations",
    responses((status = 200, description = "Process is alive"))
)]
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

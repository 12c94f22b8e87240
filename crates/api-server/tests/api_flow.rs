use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use lottery_api::{router, AppState};
use lottery_cache::SessionCache;
use lottery_channels::{EmailProvider, SimulatedTransport, SmsGateway};
use lottery_core::config::AppConfig;
use lottery_core::settings::default_settings;
use lottery_loyalty::LoyaltyEngine;
use lottery_reporting::LoyaltyDashboard;
use lottery_store::InMemoryStore;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower::ServiceExt;

fn app() -> Router {
    let config = AppConfig::default();
    app_with(InMemoryStore::with_settings(default_settings(&config.loyalty)))
}

fn app_with(store: InMemoryStore) -> Router {
    let config = AppConfig::default();
    let store = Arc::new(store);
    let tokens = Arc::new(SessionCache::new("sms_tokens", Duration::from_secs(3600)));
    let state = AppState {
        engine: Arc::new(LoyaltyEngine::new(&config.loyalty, store)),
        sms: Arc::new(SmsGateway::new(
            config.sms.clone(),
            tokens,
            Arc::new(SimulatedTransport::new()),
        )),
        email: Arc::new(EmailProvider::new(config.email.clone())),
        dashboard: Arc::new(LoyaltyDashboard::new(config.dashboard.clone())),
        node_id: "test-node".to_string(),
        start_time: Instant::now(),
    };
    router(state)
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(match body {
            Some(v) => Body::from(v.to_string()),
            None => Body::empty(),
        })
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn seed(app: &Router) {
    let (status, body) = call(
        app,
        Method::POST,
        "/api/loyalty/initial-load",
        Some(json!({
            "last_update": "2025-01",
            "current_count": 1,
            "customers": [
                { "mobile_number": "94770000001", "first_name": "Kamal", "email": "kamal@example.com",
                  "ticket_count": 0, "loyalty_tier": "Silver",
                  "wallet_balance": 1250.5, "last_purchase_time": "2025-01-15T09:30:00" },
                { "mobile_number": "94770000002", "first_name": "Nimali",
                  "ticket_count": 40, "loyalty_tier": "Blue" }
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["inserted"], 2);
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = app();
    let (status, body) = call(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(call(&app, Method::GET, "/live", None).await.0, StatusCode::OK);
    assert_eq!(call(&app, Method::GET, "/ready", None).await.0, StatusCode::OK);
}

#[tokio::test]
async fn test_not_ready_without_settings() {
    let app = app_with(InMemoryStore::new());
    assert_eq!(
        call(&app, Method::GET, "/ready", None).await.0,
        StatusCode::SERVICE_UNAVAILABLE
    );
    assert_eq!(call(&app, Method::GET, "/live", None).await.0, StatusCode::OK);
}

#[tokio::test]
async fn test_monthly_update_flow() {
    let app = app();
    seed(&app).await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/loyalty/monthly-update",
        Some(json!({
            "last_update": "2025-02",
            "customers": [
                { "mobile_number": "94770000001", "ticket_count": 650 },
                { "mobile_number": "94770000002", "ticket_count": 10 }
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["summary"]["upgraded_count"], 1);
    assert_eq!(body["summary"]["downgraded_count"], 1);

    let (_, customer) = call(&app, Method::GET, "/api/customers/94770000002", None).await;
    assert_eq!(customer["current_tier"], "Warning");
    assert_eq!(customer["last_month_tier"], "Blue");

    let (_, latest) =
        call(&app, Method::GET, "/api/loyalty/monthly-upgrade/94770000001/latest", None).await;
    assert_eq!(latest["last_update"], "2025-02");
    assert_eq!(latest["month_tier"], "Gold");

    let (_, summaries) = call(&app, Method::GET, "/api/loyalty/monthly-upgrade-summary", None).await;
    assert_eq!(summaries.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_monthly_update_rejections() {
    let app = app();
    seed(&app).await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/loyalty/monthly-update",
        Some(json!({
            "last_update": "2025-02",
            "customers": [
                { "mobile_number": "94770000001", "ticket_count": 1 },
                { "mobile_number": "94770000001", "ticket_count": 2 }
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_request");

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/loyalty/monthly-update",
        Some(json!({
            "last_update": "2025-02",
            "customers": [
                { "mobile_number": "94770000001", "ticket_count": 900 },
                { "mobile_number": "94779999999", "ticket_count": 2 }
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "customer_not_found");

    let (_, customer) = call(&app, Method::GET, "/api/customers/94770000001", None).await;
    assert_eq!(customer["current_tier"], "Silver");
}

#[tokio::test]
async fn test_monthly_update_overflow_is_rejected() {
    let app = app();
    seed(&app).await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/loyalty/monthly-update",
        Some(json!({
            "last_update": "2025-02",
            "customers": [
                { "mobile_number": "94770000001", "ticket_count": 10 },
                { "mobile_number": "94770000002", "ticket_count": u64::MAX }
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(body["error"], "invalid_request");

    let (_, customer) = call(&app, Method::GET, "/api/customers/94770000002", None).await;
    assert_eq!(customer["current_ticket_count"], 40);
    assert_eq!(customer["current_tier"], "Blue");
}

#[tokio::test]
async fn test_portal_status_and_missing_customer() {
    let app = app();
    seed(&app).await;

    let (status, body) = call(&app, Method::GET, "/api/portal/loyalty/94770000001", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["next_tier"], "Gold");

    let (_, history) =
        call(&app, Method::GET, "/api/portal/loyalty/history/94770000001", None).await;
    assert_eq!(history[0]["last_update"], "Entry");

    let (status, _) = call(&app, Method::GET, "/api/portal/loyalty/94770000404", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_settings_roundtrip() {
    let app = app();
    let (status, _) = call(
        &app,
        Method::POST,
        "/api/settings",
        Some(json!({ "key": "LOYALTY_MONTHLY_GOLD_TICKETS", "value": "abc" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/settings",
        Some(json!({ "key": "LOYALTY_MONTHLY_GOLD_TICKETS", "value": "450" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, settings) = call(&app, Method::GET, "/api/settings", None).await;
    let gold = settings
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["key"] == "LOYALTY_MONTHLY_GOLD_TICKETS")
        .unwrap();
    assert_eq!(gold["value"], "450");
}

#[tokio::test]
async fn test_setting_cannot_invert_thresholds() {
    let app = app();
    let (status, body) = call(
        &app,
        Method::POST,
        "/api/settings",
        Some(json!({ "key": "LOYALTY_MONTHLY_SILVER_TICKETS", "value": "5000" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_setting");

    let (_, settings) = call(&app, Method::GET, "/api/settings", None).await;
    let silver = settings
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["key"] == "LOYALTY_MONTHLY_SILVER_TICKETS")
        .unwrap();
    assert_eq!(silver["value"], "300");
}

#[tokio::test]
async fn test_sms_requires_login() {
    let app = app();
    let send = json!({
        "campaignName": "promo",
        "mask": "WINWAY",
        "numbers": "0771234567",
        "content": "Hello"
    });

    let (status, body) = call(&app, Method::POST, "/sms/send", Some(send.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "not_authenticated");

    let (status, _) = call(&app, Method::POST, "/sms/refresh", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        &app,
        Method::POST,
        "/sms/login",
        Some(json!({ "username": "user", "password": "pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(&app, Method::POST, "/sms/send", Some(send)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["numbers"][0], "94771234567");

    let (status, _) = call(
        &app,
        Method::POST,
        "/sms/send",
        Some(json!({ "campaignName": "p", "mask": "m", "numbers": "12345", "content": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_sms_dispatch_lookup() {
    let app = app();
    call(
        &app,
        Method::POST,
        "/sms/login",
        Some(json!({ "username": "user", "password": "pw" })),
    )
    .await;
    let mut ids = Vec::new();
    for content in ["first", "second"] {
        let (_, body) = call(
            &app,
            Method::POST,
            "/sms/send",
            Some(json!({ "campaignName": "promo", "mask": "WINWAY",
                         "numbers": "0771234567", "content": content })),
        )
        .await;
        ids.push(body["id"].as_str().unwrap().to_string());
    }

    let (status, recent) = call(&app, Method::GET, "/sms/dispatches?limit=1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(recent.as_array().unwrap().len(), 1);
    assert_eq!(recent[0]["content"], "second");

    let (status, one) = call(&app, Method::GET, &format!("/sms/dispatches/{}", ids[0]), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(one["content"], "first");

    let (status, body) = call(
        &app,
        Method::GET,
        "/sms/dispatches/00000000-0000-0000-0000-000000000000",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "dispatch_not_found");
}

#[tokio::test]
async fn test_loyalty_email() {
    let app = app();
    seed(&app).await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/email/loyalty",
        Some(json!({ "mobile_number": "94770000001" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["to"], "kamal@example.com");

    let (status, body) = call(
        &app,
        Method::POST,
        "/email/loyalty",
        Some(json!({ "mobile_number": "94770000002" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "no_recipient");
}

#[tokio::test]
async fn test_dashboard_and_delete_all() {
    let app = app();
    seed(&app).await;

    let (_, summary) = call(&app, Method::GET, "/dashboard/summary", None).await;
    assert_eq!(summary["total_customers"], 2);
    assert_eq!(summary["total_tickets"], 40);

    let (_, candidates) =
        call(&app, Method::GET, "/dashboard/customers/upgrade-candidates", None).await;
    assert_eq!(candidates[0]["mobile_number"], "94770000002");

    let (_, missing) = call(&app, Method::GET, "/dashboard/customers/missing-email", None).await;
    assert_eq!(missing.as_array().unwrap().len(), 1);

    let (_, purchases) = call(&app, Method::GET, "/dashboard/purchases/daily", None).await;
    assert_eq!(purchases[0]["day"], "2025-01-15");
    assert_eq!(purchases[0]["customers"], 1);

    let (_, top) = call(&app, Method::GET, "/dashboard/customers/top?limit=1", None).await;
    assert_eq!(top.as_array().unwrap().len(), 1);

    let (status, _) = call(&app, Method::DELETE, "/api/loyalty/delete-all", None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, customers) = call(&app, Method::GET, "/api/customers", None).await;
    assert!(customers.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_daily_upgrade_endpoint() {
    let app = app();
    let (status, body) = call(
        &app,
        Method::POST,
        "/api/loyalty/daily-upgrade",
        Some(json!({
            "from_date": "2025-05-01",
            "to_date": "2025-05-31",
            "customers": [
                { "mobile_number": "94770000001", "ticket_count": 320,
                  "breakdown": { "Govisetha": 300, "Mega Power": 20 } }
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["inserted"], 1);

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/loyalty/daily-upgrade",
        Some(json!({ "from_date": "2025-05-10", "to_date": "2025-05-01", "customers": [
            { "mobile_number": "94770000001" } ] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_daily_and_ticket_reads() {
    let app = app();
    seed(&app).await;
    for (from, to, tickets) in [("2025-05-01", "2025-05-31", 320), ("2025-06-01", "2025-06-10", 15)] {
        let (status, body) = call(
            &app,
            Method::POST,
            "/api/loyalty/daily-upgrade",
            Some(json!({
                "from_date": from,
                "to_date": to,
                "customers": [
                    { "mobile_number": "94770000001", "ticket_count": tickets,
                      "breakdown": { "Govisetha": tickets } }
                ]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
    }

    let (status, history) = call(&app, Method::GET, "/api/daily-upgrade/94770000001", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history.as_array().unwrap().len(), 2);
    assert_eq!(history[0]["from_date"], "2025-05-01");

    let (_, latest) = call(&app, Method::GET, "/api/daily-upgrade/94770000001/latest", None).await;
    assert_eq!(latest["to_date"], "2025-06-10");
    let (status, body) =
        call(&app, Method::GET, "/api/daily-upgrade/94770000002/latest", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "record_not_found");

    let (_, all) = call(&app, Method::GET, "/api/daily-upgrade", None).await;
    assert_eq!(all.as_array().unwrap().len(), 2);

    let (_, wallet) = call(&app, Method::GET, "/api/portal/wallet/94770000001", None).await;
    assert_eq!(wallet["wallet_balance"], 1250.5);
    let (status, _) = call(&app, Method::GET, "/api/portal/wallet/94770000404", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, may) = call(
        &app,
        Method::GET,
        "/api/portal/tickets/monthly/94770000001?month=2025-05",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(may["monthly_ticket_count"], 320);
    assert_eq!(may["breakdown"]["Govisetha"], 320);
    let (status, _) =
        call(&app, Method::GET, "/api/portal/tickets/monthly/94770000001", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, daily) = call(&app, Method::GET, "/api/portal/tickets/daily/94770000001", None).await;
    assert_eq!(daily[0]["from_date"], "2025-06-01");

    let (_, window) = call(
        &app,
        Method::GET,
        "/api/portal/tickets/history/94770000001?from=2025-05-01&to=2025-05-31",
        None,
    )
    .await;
    assert_eq!(window.as_array().unwrap().len(), 1);
    assert_eq!(window[0]["ticket_count"], 320);
    let (status, _) = call(
        &app,
        Method::GET,
        "/api/portal/tickets/history/94770000001?from=2025-06-01&to=2025-05-01",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, current) = call(&app, Method::GET, "/api/lottery/breakdowns/current", None).await;
    assert_eq!(current.as_array().unwrap().len(), 1);
    assert_eq!(current[0]["breakdown"]["Govisetha"], 15);

    let (_, closed) =
        call(&app, Method::GET, "/api/lottery/breakdowns/monthly/2025-05", None).await;
    assert_eq!(closed.as_array().unwrap().len(), 1);
    assert_eq!(closed[0]["mobile_number"], "94770000001");
}

//! API server: HTTP routes plus the Prometheus metrics listener.

use crate::rest::{self, AppState};
use crate::swagger::ApiDoc;
use crate::{channel_rest, dashboard_rest, loyalty_rest, settings_rest};
use axum::routing::{delete, get, post};
use axum::Router;
use lottery_core::config::AppConfig;
use std::net::SocketAddr;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Build the application router with all routes and middleware.
pub fn router(state: AppState) -> Router {
    Router::new()
        // Loyalty batches and history
        .route("/api/loyalty/initial-load", post(loyalty_rest::handle_initial_load))
        .route("/api/loyalty/monthly-update", post(loyalty_rest::handle_monthly_update))
        .route("/api/loyalty/monthly-upgrades", get(loyalty_rest::handle_monthly_upgrades))
        .route(
            "/api/loyalty/monthly-upgrade-summary",
            get(loyalty_rest::handle_monthly_summary),
        )
        .route(
            "/api/loyalty/monthly-upgrade/:mobile",
            get(loyalty_rest::handle_customer_monthly),
        )
        .route(
            "/api/loyalty/monthly-upgrade/:mobile/latest",
            get(loyalty_rest::handle_customer_monthly_latest),
        )
        .route("/api/loyalty/daily-upgrade", post(loyalty_rest::handle_daily_upgrade))
        .route("/api/loyalty/delete-all", delete(loyalty_rest::handle_delete_all))
        .route("/api/daily-upgrade", get(loyalty_rest::handle_daily_records))
        .route("/api/daily-upgrade/:mobile", get(loyalty_rest::handle_customer_daily))
        .route(
            "/api/daily-upgrade/:mobile/latest",
            get(loyalty_rest::handle_customer_daily_latest),
        )
        .route(
            "/api/lottery/breakdowns/current",
            get(loyalty_rest::handle_current_breakdowns),
        )
        .route(
            "/api/lottery/breakdowns/monthly/:month",
            get(loyalty_rest::handle_monthly_breakdowns),
        )
        // Customers and portal
        .route("/api/customers", get(loyalty_rest::handle_list_customers))
        .route("/api/customers/:mobile", get(loyalty_rest::handle_get_customer))
        .route("/api/portal/loyalty/:mobile", get(loyalty_rest::handle_portal_status))
        .route(
            "/api/portal/loyalty/history/:mobile",
            get(loyalty_rest::handle_portal_history),
        )
        .route("/api/portal/wallet/:mobile", get(loyalty_rest::handle_portal_wallet))
        .route(
            "/api/portal/tickets/monthly/:mobile",
            get(loyalty_rest::handle_portal_monthly_tickets),
        )
        .route(
            "/api/portal/tickets/daily/:mobile",
            get(loyalty_rest::handle_portal_daily_tickets),
        )
        .route(
            "/api/portal/tickets/history/:mobile",
            get(loyalty_rest::handle_portal_ticket_history),
        )
        // Settings
        .route(
            "/api/settings",
            get(settings_rest::handle_list_settings).post(settings_rest::handle_update_setting),
        )
        // Channels
        .route("/sms/login", post(channel_rest::handle_sms_login))
        .route("/sms/send", post(channel_rest::handle_sms_send))
        .route("/sms/refresh", post(channel_rest::handle_sms_refresh))
        .route("/sms/dispatches", get(channel_rest::handle_list_dispatches))
        .route("/sms/dispatches/:id", get(channel_rest::handle_get_dispatch))
        .route("/email/loyalty", post(channel_rest::handle_loyalty_email))
        // Dashboard
        .route("/dashboard/summary", get(dashboard_rest::handle_summary))
        .route("/dashboard/tiers", get(dashboard_rest::handle_tiers))
        .route(
            "/dashboard/registrations/monthly",
            get(dashboard_rest::handle_registrations),
        )
        .route("/dashboard/purchases/daily", get(dashboard_rest::handle_daily_purchases))
        .route("/dashboard/customers/top", get(dashboard_rest::handle_top_customers))
        .route(
            "/dashboard/customers/upgrade-candidates",
            get(dashboard_rest::handle_upgrade_candidates),
        )
        .route(
            "/dashboard/customers/missing-email",
            get(dashboard_rest::handle_missing_email),
        )
        .route("/dashboard/customers/inactive", get(dashboard_rest::handle_inactive))
        // Operational endpoints
        .route("/health", get(rest::health_check))
        .route("/ready", get(rest::readiness))
        .route("/live", get(rest::liveness))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Middleware
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub struct ApiServer {
    config: AppConfig,
    state: AppState,
}

impl ApiServer {
    pub fn new(config: AppConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Start the HTTP REST server.
    pub async fn start_http(&self) -> anyhow::Result<()> {
        let app = router(self.state.clone());

        let addr = SocketAddr::new(self.config.api.host.parse()?, self.config.api.http_port);

        info!(addr = %addr, node_id = %self.config.node_id, "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }

    /// Start the metrics server on a separate port.
    pub fn start_metrics(&self) -> anyhow::Result<()> {
        if !self.config.metrics.enabled {
            info!("Metrics exporter disabled");
            return Ok(());
        }

        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(SocketAddr::new(
                self.config.api.host.parse()?,
                self.config.metrics.port,
            ))
            .install()?;

        info!(port = self.config.metrics.port, "Metrics exporter started");
        Ok(())
    }
}

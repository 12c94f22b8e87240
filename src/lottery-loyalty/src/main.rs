//! WIN WAY lottery loyalty service.
//!
//! Main entry point that wires the store, loyalty engine, channels and
//! dashboard together and starts the server.

use clap::Parser;
use lottery_api::{ApiServer, AppState};
use lottery_cache::SessionCache;
use lottery_channels::{EmailProvider, SimulatedTransport, SmsGateway};
use lottery_core::config::AppConfig;
use lottery_core::settings::default_settings;
use lottery_loyalty::LoyaltyEngine;
use lottery_reporting::LoyaltyDashboard;
use lottery_store::InMemoryStore;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

#[derive(Parser, Debug)]
#[command(name = "lottery-loyalty")]
#[command(about = "Lottery loyalty tier evaluation and customer notification service")]
#[command(version)]
struct Cli {
    /// Node identifier (overrides config)
    #[arg(long, env = "LOTTERY_LOYALTY__NODE_ID")]
    node_id: Option<String>,

    /// Bind address (overrides config)
    #[arg(long, env = "LOTTERY_LOYALTY__API__HOST")]
    host: Option<String>,

    /// HTTP port (overrides config)
    #[arg(long, env = "LOTTERY_LOYALTY__API__HTTP_PORT")]
    http_port: Option<u16>,

    /// Prometheus exporter port (overrides config)
    #[arg(long, env = "LOTTERY_LOYALTY__METRICS__PORT")]
    metrics_port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lottery_loyalty=info,lottery_api=info,tower_http=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("Lottery loyalty service starting up");

    let mut config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    if let Some(node_id) = cli.node_id {
        config.node_id = node_id;
    }
    if let Some(host) = cli.host {
        config.api.host = host;
    }
    if let Some(port) = cli.http_port {
        config.api.http_port = port;
    }
    if let Some(port) = cli.metrics_port {
        config.metrics.port = port;
    }

    info!(
        node_id = %config.node_id,
        http_port = config.api.http_port,
        metrics_port = config.metrics.port,
        "Configuration loaded"
    );

    // Threshold settings are seeded from config and editable at runtime.
    let store = Arc::new(InMemoryStore::with_settings(default_settings(&config.loyalty)));
    let engine = Arc::new(LoyaltyEngine::new(&config.loyalty, store));

    let tokens = Arc::new(SessionCache::new(
        "sms_tokens",
        Duration::from_secs(config.sms.refresh_token_ttl_secs),
    ));
    let sms = Arc::new(SmsGateway::new(
        config.sms.clone(),
        tokens.clone(),
        Arc::new(SimulatedTransport::new()),
    ));

    let state = AppState {
        engine,
        sms,
        email: Arc::new(EmailProvider::new(config.email.clone())),
        dashboard: Arc::new(LoyaltyDashboard::new(config.dashboard.clone())),
        node_id: config.node_id.clone(),
        start_time: Instant::now(),
    };

    let api_server = ApiServer::new(config.clone(), state);

    if let Err(e) = api_server.start_metrics() {
        error!(error = %e, "Failed to start metrics exporter");
    }

    // Drop expired gateway tokens
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            let evicted = tokens.evict_expired();
            if evicted > 0 {
                debug!(evicted, "Evicted expired SMS tokens");
            }
        }
    });

    info!("Lottery loyalty service is ready to serve traffic");

    api_server.start_http().await?;

    Ok(())
}

use serde::Deserialize;

/// Root application configuration. Loaded from environment variables
/// with the prefix `LOTTERY_LOYALTY__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_node_id")]
    pub node_id: String,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub loyalty: LoyaltyConfig,
    #[serde(default)]
    pub sms: SmsGatewayConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

// Default functions
fn default_node_id() -> String {
    "loyalty-01".to_string()
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_http_port() -> u16 {
    8001
}
fn default_metrics_enabled() -> bool {
    true
}
fn default_metrics_port() -> u16 {
    9091
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
            port: default_metrics_port(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            node_id: default_node_id(),
            api: ApiConfig::default(),
            metrics: MetricsConfig::default(),
            loyalty: LoyaltyConfig::default(),
            sms: SmsGatewayConfig::default(),
            email: EmailConfig::default(),
            dashboard: DashboardConfig::default(),
        }
    }
}

// ─── Loyalty Config ─────────────────────────────────────────────────────────

/// Ticket-count thresholds. `entry_*` apply to the initial load, `monthly_*`
/// to every monthly evaluation.
#[derive(Debug, Clone, Deserialize)]
pub struct LoyaltyConfig {
    #[serde(default = "default_entry_platinum")]
    pub entry_platinum_tickets: u64,
    #[serde(default = "default_entry_gold")]
    pub entry_gold_tickets: u64,
    #[serde(default = "default_entry_silver")]
    pub entry_silver_tickets: u64,
    #[serde(default = "default_monthly_platinum")]
    pub monthly_platinum_tickets: u64,
    #[serde(default = "default_monthly_gold")]
    pub monthly_gold_tickets: u64,
    #[serde(default = "default_monthly_silver")]
    pub monthly_silver_tickets: u64,
    /// Leading blocks of the printed loyalty number.
    #[serde(default = "default_loyalty_number_prefix")]
    pub loyalty_number_prefix: String,
}

fn default_entry_platinum() -> u64 { 5000 }
fn default_entry_gold() -> u64 { 3000 }
fn default_entry_silver() -> u64 { 1000 }
fn default_monthly_platinum() -> u64 { 1000 }
fn default_monthly_gold() -> u64 { 500 }
fn default_monthly_silver() -> u64 { 300 }
fn default_loyalty_number_prefix() -> String { "0884  2025  0000".to_string() }

impl Default for LoyaltyConfig {
    fn default() -> Self {
        Self {
            entry_platinum_tickets: default_entry_platinum(),
            entry_gold_tickets: default_entry_gold(),
            entry_silver_tickets: default_entry_silver(),
            monthly_platinum_tickets: default_monthly_platinum(),
            monthly_gold_tickets: default_monthly_gold(),
            monthly_silver_tickets: default_monthly_silver(),
            loyalty_number_prefix: default_loyalty_number_prefix(),
        }
    }
}

// ─── SMS Gateway Config ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct SmsGatewayConfig {
    #[serde(default = "default_sms_base_url")]
    pub base_url: String,
    #[serde(default = "default_sms_api_version")]
    pub api_version: String,
    #[serde(default = "default_access_token_ttl_secs")]
    pub access_token_ttl_secs: u64,
    #[serde(default = "default_refresh_token_ttl_secs")]
    pub refresh_token_ttl_secs: u64,
    /// Sent dispatches kept for lookup; the oldest are dropped first.
    #[serde(default = "default_retained_messages")]
    pub max_dispatches: usize,
}

fn default_sms_base_url() -> String { "https://bsms.hutch.lk/api".to_string() }
fn default_sms_api_version() -> String { "v1".to_string() }
fn default_access_token_ttl_secs() -> u64 { 3600 }
fn default_refresh_token_ttl_secs() -> u64 { 86_400 }
fn default_retained_messages() -> usize { 10_000 }

impl Default for SmsGatewayConfig {
    fn default() -> Self {
        Self {
            base_url: default_sms_base_url(),
            api_version: default_sms_api_version(),
            access_token_ttl_secs: default_access_token_ttl_secs(),
            refresh_token_ttl_secs: default_refresh_token_ttl_secs(),
            max_dispatches: default_retained_messages(),
        }
    }
}

// ─── Email Config ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    #[serde(default = "default_from_email")]
    pub from_email: String,
    #[serde(default = "default_from_name")]
    pub from_name: String,
    #[serde(default = "default_subject")]
    pub default_subject: String,
    /// Queued messages kept in the outbox; the oldest are dropped first.
    #[serde(default = "default_retained_messages")]
    pub max_outbox: usize,
}

fn default_from_email() -> String { "loyalty@winway.lk".to_string() }
fn default_from_name() -> String { "WIN WAY".to_string() }
fn default_subject() -> String { "WIN WAY Notification".to_string() }

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            from_email: default_from_email(),
            from_name: default_from_name(),
            default_subject: default_subject(),
            max_outbox: default_retained_messages(),
        }
    }
}

// ─── Dashboard Config ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_inactive_days")]
    pub inactive_days: i64,
    #[serde(default = "default_candidate_min")]
    pub upgrade_candidate_min_tickets: u64,
    #[serde(default = "default_candidate_max")]
    pub upgrade_candidate_max_tickets: u64,
    #[serde(default = "default_top_limit")]
    pub top_customers_limit: usize,
}

fn default_inactive_days() -> i64 { 30 }
fn default_candidate_min() -> u64 { 15 }
fn default_candidate_max() -> u64 { 99 }
fn default_top_limit() -> usize { 10 }

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            inactive_days: default_inactive_days(),
            upgrade_candidate_min_tickets: default_candidate_min(),
            upgrade_candidate_max_tickets: default_candidate_max(),
            top_customers_limit: default_top_limit(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("LOTTERY_LOYALTY")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_seeded_settings() {
        let config = AppConfig::default();
        assert_eq!(config.api.http_port, 8001);
        assert_eq!(config.loyalty.monthly_platinum_tickets, 1000);
        assert_eq!(config.loyalty.monthly_gold_tickets, 500);
        assert_eq!(config.loyalty.monthly_silver_tickets, 300);
        assert_eq!(config.loyalty.entry_platinum_tickets, 5000);
        assert_eq!(config.sms.max_dispatches, 10_000);
        assert_eq!(config.email.max_outbox, 10_000);
    }

    #[test]
    fn test_partial_section_uses_field_defaults() {
        let loyalty: LoyaltyConfig =
            serde_json::from_str(r#"{"monthly_gold_tickets": 650}"#).unwrap();
        assert_eq!(loyalty.monthly_gold_tickets, 650);
        assert_eq!(loyalty.monthly_silver_tickets, 300);
        assert_eq!(loyalty.loyalty_number_prefix, "0884  2025  0000");
    }
}

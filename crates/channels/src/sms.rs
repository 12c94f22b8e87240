//! Bulk SMS gateway client: token login/refresh, Sri Lankan number
//! normalization, segment calculation and dispatch tracking.
//!
//! Tokens live in an injected [`SessionCache`]; the wire call goes through a
//! [`GatewayTransport`] so the HTTP client can be swapped out.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use crate::retention::SentLog;
use lottery_cache::SessionCache;
use lottery_core::config::SmsGatewayConfig;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SmsError {
    #[error("missing username or password")]
    MissingCredentials,

    #[error("not authenticated, login first")]
    NotAuthenticated,

    #[error("no refresh token available")]
    NoRefreshToken,

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("one or more phone numbers are invalid, use format 947XXXXXXXX: {0}")]
    InvalidNumbers(String),

    #[error("gateway error: {0}")]
    Gateway(String),
}

/// Token pair issued by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct GatewayTokens {
    pub access_token: String,
    pub refresh_token: String,
}

/// Validated payload handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendSmsRequest {
    pub campaign_name: String,
    pub mask: String,
    /// Comma-joined normalized numbers.
    pub numbers: String,
    pub content: String,
}

/// Record of one accepted send.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SmsDispatch {
    pub id: Uuid,
    pub provider_id: String,
    pub campaign_name: String,
    pub mask: String,
    pub numbers: Vec<String>,
    pub content: String,
    pub segments: u32,
    pub sent_at: DateTime<Utc>,
}

// ─── Transport ──────────────────────────────────────────────────────────────

/// Wire calls to the gateway.
pub trait GatewayTransport: Send + Sync {
    fn login(&self, username: &str, password: &str) -> Result<GatewayTokens, SmsError>;

    fn refresh(&self, refresh_token: &str) -> Result<GatewayTokens, SmsError>;

    /// Returns the gateway's message id.
    fn send(&self, access_token: &str, request: &SendSmsRequest) -> Result<String, SmsError>;
}

/// Accepts every call and records sends in memory. Optionally checks a
/// single set of credentials.
#[derive(Default)]
pub struct SimulatedTransport {
    credentials: Option<(String, String)>,
    sent: DashMap<String, SendSmsRequest>,
}

impl SimulatedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials(username: &str, password: &str) -> Self {
        Self {
            credentials: Some((username.to_string(), password.to_string())),
            sent: DashMap::new(),
        }
    }

    pub fn sent_count(&self) -> usize {
        self.sent.len()
    }

    fn issue_tokens() -> GatewayTokens {
        GatewayTokens {
            access_token: format!("at-{}", Uuid::new_v4().simple()),
            refresh_token: format!("rt-{}", Uuid::new_v4().simple()),
        }
    }
}

impl GatewayTransport for SimulatedTransport {
    fn login(&self, username: &str, password: &str) -> Result<GatewayTokens, SmsError> {
        match &self.credentials {
            Some((user, pass)) if user != username || pass != password => {
                Err(SmsError::Gateway("login rejected".to_string()))
            }
            _ => Ok(Self::issue_tokens()),
        }
    }

    fn refresh(&self, _refresh_token: &str) -> Result<GatewayTokens, SmsError> {
        Ok(Self::issue_tokens())
    }

    fn send(&self, _access_token: &str, request: &SendSmsRequest) -> Result<String, SmsError> {
        let provider_id = format!("HS{}", Uuid::new_v4().simple());
        self.sent.insert(provider_id.clone(), request.clone());
        Ok(provider_id)
    }
}

// ─── Gateway ────────────────────────────────────────────────────────────────

pub struct SmsGateway {
    config: SmsGatewayConfig,
    tokens: Arc<SessionCache<String>>,
    transport: Arc<dyn GatewayTransport>,
    dispatches: SentLog<SmsDispatch>,
}

impl SmsGateway {
    pub fn new(
        config: SmsGatewayConfig,
        tokens: Arc<SessionCache<String>>,
        transport: Arc<dyn GatewayTransport>,
    ) -> Self {
        tracing::info!(
            base_url = %config.base_url,
            api_version = %config.api_version,
            "SMS gateway initialized"
        );
        let dispatches = SentLog::new("sms_dispatches", config.max_dispatches);
        Self {
            config,
            tokens,
            transport,
            dispatches,
        }
    }

    /// Log in and cache the issued token pair.
    pub fn login(&self, username: &str, password: &str) -> Result<GatewayTokens, SmsError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(SmsError::MissingCredentials);
        }

        let tokens = self.transport.login(username, password).map_err(|e| {
            tracing::warn!(username = %username, error = %e, "SMS gateway login failed");
            metrics::counter!("sms.login_failures").increment(1);
            e
        })?;
        self.store_tokens(&tokens);

        tracing::info!(username = %username, "SMS gateway login succeeded");
        metrics::counter!("sms.logins").increment(1);
        Ok(tokens)
    }

    /// Exchange the cached refresh token for a new pair.
    pub fn refresh(&self) -> Result<GatewayTokens, SmsError> {
        let refresh_token = self
            .tokens
            .get(REFRESH_TOKEN_KEY)
            .ok_or(SmsError::NoRefreshToken)?;

        let tokens = self.transport.refresh(&refresh_token)?;
        self.store_tokens(&tokens);

        tracing::debug!("SMS gateway token refreshed");
        metrics::counter!("sms.token_refreshes").increment(1);
        Ok(tokens)
    }

    pub fn is_authenticated(&self) -> bool {
        self.tokens.get(ACCESS_TOKEN_KEY).is_some()
    }

    /// Send `content` to a comma-separated list of numbers.
    pub fn send(
        &self,
        campaign_name: &str,
        mask: &str,
        numbers: &str,
        content: &str,
    ) -> Result<SmsDispatch, SmsError> {
        let access_token = self
            .tokens
            .get(ACCESS_TOKEN_KEY)
            .ok_or(SmsError::NotAuthenticated)?;

        for (field, value) in [
            ("campaignName", campaign_name),
            ("mask", mask),
            ("numbers", numbers),
            ("content", content),
        ] {
            if value.trim().is_empty() {
                return Err(SmsError::MissingField(field));
            }
        }

        let normalized = normalize_numbers(numbers)?;
        let request = SendSmsRequest {
            campaign_name: campaign_name.to_string(),
            mask: mask.to_string(),
            numbers: normalized.join(","),
            content: content.to_string(),
        };

        let provider_id = self.transport.send(&access_token, &request).map_err(|e| {
            tracing::warn!(campaign = %campaign_name, error = %e, "SMS send failed");
            metrics::counter!("sms.send_failures").increment(1);
            e
        })?;

        let dispatch = SmsDispatch {
            id: Uuid::new_v4(),
            provider_id,
            campaign_name: request.campaign_name,
            mask: request.mask,
            numbers: normalized,
            segments: calculate_segments(content),
            content: request.content,
            sent_at: Utc::now(),
        };

        tracing::info!(
            id = %dispatch.id,
            provider_id = %dispatch.provider_id,
            campaign = %dispatch.campaign_name,
            recipients = dispatch.numbers.len(),
            segments = dispatch.segments,
            "SMS dispatched"
        );
        metrics::counter!("sms.messages_sent").increment(dispatch.numbers.len() as u64);

        self.dispatches.push(dispatch.id, dispatch.clone());
        Ok(dispatch)
    }

    pub fn get_dispatch(&self, id: Uuid) -> Option<SmsDispatch> {
        self.dispatches.get(id)
    }

    /// Most recent dispatches first.
    pub fn list_dispatches(&self, limit: usize) -> Vec<SmsDispatch> {
        self.dispatches.recent(limit)
    }

    pub fn config(&self) -> &SmsGatewayConfig {
        &self.config
    }

    fn store_tokens(&self, tokens: &GatewayTokens) {
        self.tokens.put_with_ttl(
            ACCESS_TOKEN_KEY,
            tokens.access_token.clone(),
            Duration::from_secs(self.config.access_token_ttl_secs),
        );
        self.tokens.put_with_ttl(
            REFRESH_TOKEN_KEY,
            tokens.refresh_token.clone(),
            Duration::from_secs(self.config.refresh_token_ttl_secs),
        );
    }
}

// ─── Numbers & Segments ─────────────────────────────────────────────────────

/// Rewrite a local number into `94XXXXXXXXX` form. The result is not
/// validated.
pub fn normalize_number(raw: &str) -> String {
    let mut num = raw.trim().trim_start_matches('+').to_string();
    if let Some(rest) = num.strip_prefix('0') {
        num = format!("94{rest}");
    }
    if num.len() == 9 && num.starts_with('7') && num.chars().all(|c| c.is_ascii_digit()) {
        num = format!("94{num}");
    }
    num
}

fn is_valid_number(num: &str) -> bool {
    num.len() == 11 && num.starts_with("94") && num.chars().all(|c| c.is_ascii_digit())
}

/// Split a comma-separated list, normalize every entry and require each to
/// be a valid `94XXXXXXXXX` number.
pub fn normalize_numbers(csv: &str) -> Result<Vec<String>, SmsError> {
    let numbers: Vec<String> = csv.split(',').map(normalize_number).collect();
    if numbers.iter().any(|n| !is_valid_number(n)) {
        return Err(SmsError::InvalidNumbers(numbers.join(",")));
    }
    Ok(numbers)
}

/// Calculate the number of SMS segments for a message body.
/// GSM 7-bit encoding: 160 chars per segment.
/// Unicode (UCS-2): 70 chars per segment.
pub fn calculate_segments(body: &str) -> u32 {
    if body.is_empty() {
        return 1;
    }

    let is_gsm = body.chars().all(is_gsm_7bit);
    let char_count = body.chars().count() as u32;

    if is_gsm {
        // 153 per part once the UDH header is needed
        if char_count <= 160 {
            1
        } else {
            char_count.div_ceil(153)
        }
    } else if char_count <= 70 {
        1
    } else {
        char_count.div_ceil(67)
    }
}

/// Check whether a character is in the GSM 7-bit default alphabet or its
/// extension table.
fn is_gsm_7bit(c: char) -> bool {
    matches!(c,
        'A'..='Z' | 'a'..='z' | '0'..='9'
        | ' ' | '!' | '"' | '#' | '$' | '%' | '&' | '\'' | '(' | ')'
        | '*' | '+' | ',' | '-' | '.' | '/' | ':' | ';' | '<' | '='
        | '>' | '?' | '@' | '_' | '\n' | '\r'
        | '\u{00A3}' | '\u{00A5}' | '\u{00E8}' | '\u{00E9}' | '\u{00F9}'
        | '\u{00EC}' | '\u{00F2}' | '\u{00C7}' | '\u{00D8}' | '\u{00F8}'
        | '\u{00C5}' | '\u{00E5}' | '\u{0394}' | '\u{03A6}' | '\u{0393}'
        | '\u{039B}' | '\u{03A9}' | '\u{03A0}' | '\u{03A8}' | '\u{03A3}'
        | '\u{0398}' | '\u{039E}' | '\u{00C6}' | '\u{00E6}' | '\u{00DF}'
        | '\u{00C9}' | '\u{00A4}' | '\u{00A1}' | '\u{00BF}' | '\u{00C4}'
        | '\u{00D6}' | '\u{00D1}' | '\u{00DC}' | '\u{00A7}' | '\u{00E4}'
        | '\u{00F6}' | '\u{00F1}' | '\u{00FC}' | '\u{00E0}'
        | '{' | '}' | '[' | ']' | '~' | '\\' | '^' | '|' | '\u{20AC}'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway_with(transport: Arc<dyn GatewayTransport>) -> SmsGateway {
        let tokens = Arc::new(SessionCache::new("sms_tokens", Duration::from_secs(3600)));
        SmsGateway::new(SmsGatewayConfig::default(), tokens, transport)
    }

    fn gateway() -> SmsGateway {
        gateway_with(Arc::new(SimulatedTransport::new()))
    }

    #[test]
    fn test_normalize_number_variants() {
        assert_eq!(normalize_number("+94771234567"), "94771234567");
        assert_eq!(normalize_number("0771234567"), "94771234567");
        assert_eq!(normalize_number("771234567"), "94771234567");
        assert_eq!(normalize_number(" 94771234567 "), "94771234567");
        assert_eq!(normalize_number("12345"), "12345");
    }

    #[test]
    fn test_normalize_numbers_rejects_any_invalid() {
        let ok = normalize_numbers("0771234567, +94711111111,772222222").unwrap();
        assert_eq!(ok, vec!["94771234567", "94711111111", "94772222222"]);

        let err = normalize_numbers("0771234567,12345").unwrap_err();
        assert_eq!(err, SmsError::InvalidNumbers("94771234567,12345".to_string()));
    }

    #[test]
    fn test_send_requires_login() {
        let gw = gateway();
        let err = gw.send("promo", "WINWAY", "0771234567", "Hello").unwrap_err();
        assert_eq!(err, SmsError::NotAuthenticated);
        assert!(!gw.is_authenticated());
    }

    #[test]
    fn test_login_requires_credentials() {
        let gw = gateway();
        assert_eq!(gw.login("", "secret").unwrap_err(), SmsError::MissingCredentials);
        assert_eq!(gw.login("user", "").unwrap_err(), SmsError::MissingCredentials);
    }

    #[test]
    fn test_login_rejected_by_gateway() {
        let gw = gateway_with(Arc::new(SimulatedTransport::with_credentials("user", "pw")));
        assert!(matches!(gw.login("user", "wrong"), Err(SmsError::Gateway(_))));
        assert!(!gw.is_authenticated());
        assert!(gw.login("user", "pw").is_ok());
    }

    #[test]
    fn test_login_then_send() {
        let transport = Arc::new(SimulatedTransport::new());
        let gw = gateway_with(transport.clone());
        gw.login("user", "pw").unwrap();

        let dispatch = gw
            .send("promo", "WINWAY", "0771234567,0719876543", "Your tier is Gold")
            .unwrap();
        assert_eq!(dispatch.numbers, vec!["94771234567", "94719876543"]);
        assert_eq!(dispatch.segments, 1);
        assert_eq!(transport.sent_count(), 1);
        assert!(gw.get_dispatch(dispatch.id).is_some());
    }

    #[test]
    fn test_send_missing_field() {
        let gw = gateway();
        gw.login("user", "pw").unwrap();
        let err = gw.send("promo", "", "0771234567", "Hello").unwrap_err();
        assert_eq!(err, SmsError::MissingField("mask"));
    }

    #[test]
    fn test_refresh_requires_token() {
        let gw = gateway();
        assert_eq!(gw.refresh().unwrap_err(), SmsError::NoRefreshToken);

        let first = gw.login("user", "pw").unwrap();
        let second = gw.refresh().unwrap();
        assert_ne!(first.access_token, second.access_token);
        assert!(gw.is_authenticated());
    }

    #[test]
    fn test_list_dispatches_limit() {
        let gw = gateway();
        gw.login("user", "pw").unwrap();
        for i in 0..3 {
            gw.send("promo", "WINWAY", "0771234567", &format!("Message {i}"))
                .unwrap();
        }
        let recent = gw.list_dispatches(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].content, "Message 2");
    }

    #[test]
    fn test_dispatch_log_is_bounded() {
        let tokens = Arc::new(SessionCache::new("sms_tokens", Duration::from_secs(3600)));
        let config = SmsGatewayConfig {
            max_dispatches: 2,
            ..SmsGatewayConfig::default()
        };
        let gw = SmsGateway::new(config, tokens, Arc::new(SimulatedTransport::new()));
        gw.login("user", "pw").unwrap();
        let first = gw.send("promo", "WINWAY", "0771234567", "first").unwrap();
        for body in ["second", "third"] {
            gw.send("promo", "WINWAY", "0771234567", body).unwrap();
        }
        assert!(gw.get_dispatch(first.id).is_none());
        assert_eq!(gw.list_dispatches(10).len(), 2);
    }

    #[test]
    fn test_calculate_segments_gsm() {
        assert_eq!(calculate_segments(""), 1);
        assert_eq!(calculate_segments(&"A".repeat(160)), 1);
        assert_eq!(calculate_segments(&"A".repeat(161)), 2);
        assert_eq!(calculate_segments(&"B".repeat(306)), 2);
        assert_eq!(calculate_segments(&"C".repeat(307)), 3);
    }

    #[test]
    fn test_calculate_segments_unicode() {
        // Sinhala text forces UCS-2
        assert_eq!(calculate_segments(&"\u{0DC3}".repeat(70)), 1);
        assert_eq!(calculate_segments(&"\u{0DC3}".repeat(71)), 2);
    }
}

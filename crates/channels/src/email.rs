//! Tier notification emails.
//!
//! Picks the notice matching a customer's evaluation, fills it from the
//! customer record and queues it with the outbound provider.

use crate::retention::SentLog;
use crate::templates::{customer_fields, map_template};
use chrono::{DateTime, Utc};
use lottery_core::config::EmailConfig;
use lottery_core::customer::Customer;
use lottery_core::loyalty::EvaluationStatus;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    #[error("customer {0} has no email address")]
    NoRecipient(String),

    #[error("invalid email address: {0}")]
    InvalidAddress(String),

    #[error("subject and body are required")]
    EmptyMessage,
}

/// Which notice a customer receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Welcome,
    Upgraded,
    Downgraded,
    Same,
}

impl NoticeKind {
    /// New and freshly loaded customers get the welcome notice.
    pub fn from_status(status: Option<EvaluationStatus>) -> Self {
        match status {
            Some(EvaluationStatus::Upgraded) => NoticeKind::Upgraded,
            Some(EvaluationStatus::Downgraded) => NoticeKind::Downgraded,
            Some(EvaluationStatus::Same) => NoticeKind::Same,
            Some(EvaluationStatus::New) | Some(EvaluationStatus::InitialLoad) | None => {
                NoticeKind::Welcome
            }
        }
    }

    pub fn subject(&self) -> &'static str {
        match self {
            NoticeKind::Welcome => "Welcome to WIN WAY Loyalty Rewards Program",
            NoticeKind::Upgraded => "Congratulations! Your WIN WAY Loyalty Tier Has Been Upgraded",
            NoticeKind::Downgraded => "Update on Your WIN WAY Loyalty Tier",
            NoticeKind::Same => "Your WIN WAY Current Tier Benefits Continue This Month",
        }
    }

    pub fn body_template(&self) -> &'static str {
        match self {
            NoticeKind::Welcome => {
                "Dear {{Salutation}} {{Name}},\n\n\
                 Welcome to the WIN WAY Loyalty Rewards Program. Your loyalty number is \
                 {{Loyalty_Number}} and your starting tier is {{Current_Loyalty_Tier}}.\n"
            }
            NoticeKind::Upgraded => {
                "Dear {{Salutation}} {{Name}},\n\n\
                 Congratulations! Based on your ticket purchases last month your loyalty \
                 tier has been upgraded from {{Last_Month_Loyalty_Tier}} to \
                 {{Current_Loyalty_Tier}}.\n"
            }
            NoticeKind::Downgraded => {
                "Dear {{Salutation}} {{Name}},\n\n\
                 Following our monthly review your loyalty tier has changed from \
                 {{Last_Month_Loyalty_Tier}} to {{Current_Loyalty_Tier}}. Keep playing to \
                 climb back up.\n"
            }
            NoticeKind::Same => {
                "Dear {{Salutation}} {{Name}},\n\n\
                 Your {{Current_Loyalty_Tier}} tier benefits continue this month. Loyalty \
                 number: {{Loyalty_Number}}.\n"
            }
        }
    }
}

/// A rendered notice ready to send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct TierNotice {
    pub kind: NoticeKind,
    pub subject: String,
    pub body: String,
}

impl TierNotice {
    /// Render for `customer`; the kind defaults to the customer's last
    /// evaluation status.
    pub fn for_customer(customer: &Customer, kind: Option<NoticeKind>) -> Self {
        let kind = kind.unwrap_or_else(|| NoticeKind::from_status(customer.evaluation_status));
        let fields = customer_fields(customer);
        Self {
            kind,
            subject: kind.subject().to_string(),
            body: map_template(kind.body_template(), &fields),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EmailMessage {
    pub id: Uuid,
    pub from: String,
    pub to: String,
    pub cc: Option<String>,
    pub subject: String,
    pub body: String,
    pub queued_at: DateTime<Utc>,
}

/// Outbound email provider with a bounded in-memory outbox.
/// In production: hand the message to the SMTP relay.
pub struct EmailProvider {
    config: EmailConfig,
    outbox: SentLog<EmailMessage>,
}

impl EmailProvider {
    pub fn new(config: EmailConfig) -> Self {
        info!(from = %config.from_email, "Email provider initialized");
        let outbox = SentLog::new("email_outbox", config.max_outbox);
        Self { config, outbox }
    }

    pub fn send(
        &self,
        to: &str,
        cc: Option<&str>,
        subject: &str,
        body: &str,
    ) -> Result<EmailMessage, EmailError> {
        let to = to.trim();
        if !is_valid_address(to) {
            warn!(to = %to, "Rejected email recipient");
            return Err(EmailError::InvalidAddress(to.to_string()));
        }
        let cc = cc.map(str::trim).filter(|c| !c.is_empty());
        if let Some(cc) = cc {
            if !is_valid_address(cc) {
                return Err(EmailError::InvalidAddress(cc.to_string()));
            }
        }
        if body.trim().is_empty() {
            return Err(EmailError::EmptyMessage);
        }
        let subject = if subject.trim().is_empty() {
            self.config.default_subject.as_str()
        } else {
            subject
        };

        let message = EmailMessage {
            id: Uuid::new_v4(),
            from: format!("\"{}\" <{}>", self.config.from_name, self.config.from_email),
            to: to.to_string(),
            cc: cc.map(str::to_string),
            subject: subject.to_string(),
            body: body.to_string(),
            queued_at: Utc::now(),
        };

        debug!(id = %message.id, to = %message.to, subject = %message.subject, "Email queued");
        metrics::counter!("email.messages_sent").increment(1);

        self.outbox.push(message.id, message.clone());
        Ok(message)
    }

    /// Send the tier notice for `customer` to their stored address.
    pub fn send_notice(
        &self,
        customer: &Customer,
        kind: Option<NoticeKind>,
        cc: Option<&str>,
    ) -> Result<EmailMessage, EmailError> {
        let to = customer
            .email
            .as_deref()
            .filter(|_| customer.has_email())
            .ok_or_else(|| EmailError::NoRecipient(customer.mobile_number.clone()))?;

        let notice = TierNotice::for_customer(customer, kind);
        let message = self.send(to, cc, &notice.subject, &notice.body)?;

        metrics::counter!("email.tier_notices", "kind" => format!("{:?}", notice.kind))
            .increment(1);
        info!(
            mobile = %customer.mobile_number,
            kind = ?notice.kind,
            "Tier notice sent"
        );
        Ok(message)
    }

    pub fn get_message(&self, id: Uuid) -> Option<EmailMessage> {
        self.outbox.get(id)
    }

    pub fn outbox_len(&self) -> usize {
        self.outbox.len()
    }
}

fn is_valid_address(address: &str) -> bool {
    match address.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !address.contains(char::is_whitespace)
        }
        None => false,
    }
}

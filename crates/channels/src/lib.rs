//! Outbound customer channels: SMS gateway and tier notification email.

pub mod email;
pub mod retention;
pub mod sms;
pub mod templates;

pub use email::{EmailError, EmailProvider, NoticeKind, TierNotice};
pub use retention::SentLog;
pub use sms::{GatewayTransport, SimulatedTransport, SmsError, SmsGateway};

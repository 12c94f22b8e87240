//! OpenAPI specification and Swagger UI configuration.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Lottery Loyalty API",
        version = "0.1.0",
        description = "Monthly tier evaluation, daily purchase roll-up, customer portal and notification channels for the lottery loyalty program.",
        license(name = "MIT"),
    ),
    tags(
        (name = "Loyalty", description = "Customer loads, monthly evaluation and daily roll-up"),
        (name = "Customers", description = "Customer records and the loyalty portal"),
        (name = "Settings", description = "Tier thresholds"),
        (name = "Channels", description = "SMS gateway and tier notification email"),
        (name = "Dashboard", description = "Customer dashboard figures and follow-up lists"),
        (name = "Operations", description = "Health, readiness, and liveness probes"),
    ),
    paths(
        // Loyalty
        crate::loyalty_rest::handle_initial_load,
        crate::loyalty_rest::handle_monthly_update,
        crate::loyalty_rest::handle_monthly_upgrades,
        crate::loyalty_rest::handle_monthly_summary,
        crate::loyalty_rest::handle_customer_monthly,
        crate::loyalty_rest::handle_customer_monthly_latest,
        crate::loyalty_rest::handle_daily_upgrade,
        crate::loyalty_rest::handle_delete_all,
        crate::loyalty_rest::handle_daily_records,
        crate::loyalty_rest::handle_customer_daily,
        crate::loyalty_rest::handle_customer_daily_latest,
        crate::loyalty_rest::handle_current_breakdowns,
        crate::loyalty_rest::handle_monthly_breakdowns,
        // Customers
        crate::loyalty_rest::handle_list_customers,
        crate::loyalty_rest::handle_get_customer,
        crate::loyalty_rest::handle_portal_status,
        crate::loyalty_rest::handle_portal_history,
        crate::loyalty_rest::handle_portal_wallet,
        crate::loyalty_rest::handle_portal_monthly_tickets,
        crate::loyalty_rest::handle_portal_daily_tickets,
        crate::loyalty_rest::handle_portal_ticket_history,
        // Settings
        crate::settings_rest::handle_list_settings,
        crate::settings_rest::handle_update_setting,
        // Channels
        crate::channel_rest::handle_sms_login,
        crate::channel_rest::handle_sms_send,
        crate::channel_rest::handle_sms_refresh,
        crate::channel_rest::handle_list_dispatches,
        crate::channel_rest::handle_get_dispatch,
        crate::channel_rest::handle_loyalty_email,
        // Dashboard
        crate::dashboard_rest::handle_summary,
        crate::dashboard_rest::handle_tiers,
        crate::dashboard_rest::handle_registrations,
        crate::dashboard_rest::handle_daily_purchases,
        crate::dashboard_rest::handle_top_customers,
        crate::dashboard_rest::handle_upgrade_candidates,
        crate::dashboard_rest::handle_missing_email,
        crate::dashboard_rest::handle_inactive,
        // Operations
        crate::rest::health_check,
        crate::rest::readiness,
        crate::rest::liveness,
    ),
    components(schemas(
        // Core records
        lottery_core::Tier,
        lottery_core::loyalty::Classification,
        lottery_core::loyalty::EvaluationStatus,
        lottery_core::loyalty::BatchSummary,
        lottery_core::loyalty::MonthlyUpdateEntry,
        lottery_core::loyalty::LoyaltyStatus,
        lottery_core::customer::Customer,
        lottery_core::customer::MonthlyUpgradeRecord,
        lottery_core::customer::MonthlySummaryRecord,
        lottery_core::customer::LotteryBreakdown,
        lottery_core::customer::DailyUpgradeRecord,
        lottery_core::settings::Setting,
        lottery_core::settings::SettingKind,
        // Loyalty engine types
        lottery_loyalty::InitialCustomer,
        lottery_loyalty::InitialLoadRequest,
        lottery_loyalty::InitialLoadReport,
        lottery_loyalty::MonthlyUpdateReport,
        lottery_loyalty::EvaluatedCustomer,
        lottery_loyalty::DailyEntry,
        lottery_loyalty::DailyOutcome,
        lottery_loyalty::DailyUpgradeReport,
        lottery_loyalty::engine::DailyCustomerOutcome,
        lottery_loyalty::WalletBalance,
        crate::loyalty_rest::MonthlyUpdateRequest,
        crate::loyalty_rest::DailyUpgradeRequest,
        crate::loyalty_rest::DeleteAllResponse,
        // Channel types
        lottery_channels::sms::GatewayTokens,
        lottery_channels::sms::SmsDispatch,
        lottery_channels::email::EmailMessage,
        lottery_channels::NoticeKind,
        crate::channel_rest::SmsLoginRequest,
        crate::channel_rest::SmsSendRequest,
        crate::channel_rest::SmsAuthResponse,
        crate::channel_rest::LoyaltyEmailRequest,
        // Dashboard types
        lottery_reporting::dashboard::DashboardSummary,
        lottery_reporting::dashboard::TierCount,
        lottery_reporting::dashboard::RegistrationPoint,
        lottery_reporting::dashboard::PurchasePoint,
        lottery_reporting::dashboard::CustomerRow,
        // REST error/health types
        crate::rest::ErrorResponse,
        crate::rest::HealthResponse,
    ))
)]
pub struct ApiDoc;

//! SubTracker Core Library
//!
//! Analytics engine for the SubTracker subscription tracker:
//! - Billing cycle normalization to monthly/yearly equivalents
//! - Recurring charge detection over raw transactions
//! - Spend aggregation (summary, categories, monthly trend, top, upcoming)
//! - CSV/JSON record import
//! - Layered configuration with embedded defaults
//!
//! Every operation is pure over its inputs; "today" is always passed in.

pub mod aggregate;
pub mod billing;
pub mod config;
pub mod error;
pub mod import;
pub mod models;
pub mod recurrence;

pub use aggregate::{trailing_months, SpendAggregator};
pub use billing::{
    add_periods, days_until, days_until_instant, monthly_equivalent, next_occurrence,
    round_money, yearly_equivalent, BillingConfig, BillingNormalizer,
};
pub use config::{load_config, AnalyticsConfig, LoadedConfig};
pub use error::{Error, Result};
pub use import::{
    load_subscriptions, load_transactions, read_subscriptions, read_transactions, Imported,
    RecordFormat,
};
pub use models::{
    BillingCycle, CategoryBreakdown, CategoryBreakdownRow, DueStatus, Frequency, ImportSummary,
    MonthlyTrend, MonthlyTrendPoint, RankedSubscription, RecurrenceCandidate, Reminder,
    ReminderKind, SkippedRecord, SpendSummary, StatusFilter, SubscriptionRecord,
    SubscriptionStatus, TopSubscriptions, Transaction, UpcomingPayments,
};
pub use recurrence::{detect_recurring, IntervalBand, RecurrenceDetector, RecurrencePolicy};

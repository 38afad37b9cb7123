//! Domain models for SubTracker
//!
//! Records arrive from the app's stores as plain values; reports are built
//! fresh on every call and never cached.

use chrono::NaiveDate;
use serde::{de, Deserialize, Deserializer, Serialize};

use crate::billing::BillingNormalizer;
use crate::error::Error;
use crate::import::parse_date_text;

/// Billing recurrence period of a subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingCycle {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
    /// Usage-based cost that varies per period
    Variable,
}

impl BillingCycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Yearly => "yearly",
            Self::Variable => "variable",
        }
    }

    pub fn all() -> &'static [BillingCycle] {
        &[
            Self::Daily,
            Self::Weekly,
            Self::Monthly,
            Self::Quarterly,
            Self::Yearly,
            Self::Variable,
        ]
    }
}

impl std::str::FromStr for BillingCycle {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "quarterly" => Ok(Self::Quarterly),
            "yearly" => Ok(Self::Yearly),
            "variable" => Ok(Self::Variable),
            _ => Err(Error::InvalidBillingCycle(s.to_string())),
        }
    }
}

impl std::fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Subscription status
///
/// Deserializes through `FromStr`, so JSON and CSV accept the same spellings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    #[default]
    Active,
    Cancelled,
    /// Considered but not subscribed
    Watchlist,
    Trial,
}

impl<'de> Deserialize<'de> for SubscriptionStatus {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Cancelled => "cancelled",
            Self::Watchlist => "watchlist",
            Self::Trial => "trial",
        }
    }
}

impl std::str::FromStr for SubscriptionStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            "watchlist" => Ok(Self::Watchlist),
            "trial" => Ok(Self::Trial),
            _ => Err(format!(
                "Unknown status: {} (valid: active, cancelled, watchlist, trial)",
                s
            )),
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A tracked subscription as stored by the app
///
/// `cost` and `billing_cycle` are kept as received so a bad value can be
/// reported per record instead of failing the whole document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRecord {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub cost: Option<f64>,
    #[serde(default, alias = "billing_cycle")]
    pub billing_cycle: Option<String>,
    /// Advisory, may be stale
    #[serde(default, alias = "next_payment_date", deserialize_with = "optional_date")]
    pub next_payment_date: Option<NaiveDate>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub status: SubscriptionStatus,
    #[serde(default, alias = "trial_end_date", deserialize_with = "optional_date")]
    pub trial_end_date: Option<NaiveDate>,
    #[serde(default, alias = "date_added", deserialize_with = "optional_date")]
    pub date_added: Option<NaiveDate>,
}

impl SubscriptionRecord {
    /// Build an active monthly-style record; mostly for callers assembling
    /// records by hand
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        cost: f64,
        cycle: BillingCycle,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            cost: Some(cost),
            billing_cycle: Some(cycle.as_str().to_string()),
            ..Default::default()
        }
    }

    pub fn with_category(self, category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            ..self
        }
    }

    pub fn with_status(self, status: SubscriptionStatus) -> Self {
        Self { status, ..self }
    }

    pub fn with_next_payment(self, date: NaiveDate) -> Self {
        Self {
            next_payment_date: Some(date),
            ..self
        }
    }

    pub fn with_trial_end(self, date: NaiveDate) -> Self {
        Self {
            trial_end_date: Some(date),
            ..self
        }
    }

    /// Validated billing cycle
    pub fn cycle(&self) -> crate::Result<BillingCycle> {
        match self.billing_cycle.as_deref().map(str::trim) {
            None | Some("") => Err(Error::malformed(&self.id, "missing billing cycle")),
            Some(raw) => raw.parse(),
        }
    }

    /// Validated, non-negative cost
    pub fn validated_cost(&self) -> crate::Result<f64> {
        match self.cost {
            None => Err(Error::malformed(&self.id, "missing cost")),
            Some(c) if !c.is_finite() => Err(Error::malformed(&self.id, "cost is not a number")),
            Some(c) if c < 0.0 => Err(Error::malformed(
                &self.id,
                format!("negative cost {}", c),
            )),
            Some(c) => Ok(c),
        }
    }

    /// Category with empty/missing values folded into "Uncategorized"
    pub fn category_label(&self) -> &str {
        match self.category.as_deref().map(str::trim) {
            Some(c) if !c.is_empty() => c,
            _ => UNCATEGORIZED,
        }
    }
}

/// Dates as the web app stores them: plain dates or ISO timestamps
fn required_date<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<NaiveDate, D::Error> {
    let s = String::deserialize(deserializer)?;
    parse_date_text(&s).ok_or_else(|| de::Error::custom(format!("unable to parse date: {}", s)))
}

fn optional_date<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<NaiveDate>, D::Error> {
    match Option::<String>::deserialize(deserializer)? {
        Some(s) if !s.trim().is_empty() => parse_date_text(&s)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("unable to parse date: {}", s))),
        _ => Ok(None),
    }
}

/// Label used for subscriptions without a category
pub const UNCATEGORIZED: &str = "Uncategorized";

/// A raw observed charge (bank feed, statement import)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(default)]
    pub id: String,
    pub description: String,
    pub amount: f64,
    #[serde(deserialize_with = "required_date")]
    pub date: NaiveDate,
    #[serde(default, alias = "account_id")]
    pub account_id: Option<String>,
    #[serde(default)]
    pub merchant: Option<String>,
}

impl Transaction {
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        amount: f64,
        date: NaiveDate,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            amount,
            date,
            account_id: None,
            merchant: None,
        }
    }

    /// Merchant when present, description otherwise
    pub fn payee(&self) -> &str {
        match self.merchant.as_deref().map(str::trim) {
            Some(m) if !m.is_empty() => m,
            _ => self.description.trim(),
        }
    }
}

// ========== Detection Models ==========

/// Detected charge frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }

    pub fn billing_cycle(&self) -> BillingCycle {
        match self {
            Self::Weekly => BillingCycle::Weekly,
            Self::Monthly => BillingCycle::Monthly,
            Self::Yearly => BillingCycle::Yearly,
        }
    }
}

/// A heuristically detected recurring charge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurrenceCandidate {
    pub name: String,
    pub amount: f64,
    pub frequency: Frequency,
    pub last_charge: NaiveDate,
    pub next_charge: NaiveDate,
    /// 0..1, rounded to 2 decimals
    pub confidence: f64,
    /// Number of transactions backing this candidate
    pub occurrences: usize,
}

impl RecurrenceCandidate {
    pub fn billing_cycle(&self) -> BillingCycle {
        self.frequency.billing_cycle()
    }

    /// Charge amount normalized to a month
    pub fn monthly_equivalent(&self, normalizer: &BillingNormalizer) -> f64 {
        normalizer.monthly_equivalent(self.amount, self.billing_cycle())
    }

    /// Turn the candidate into a trackable record (active, next payment set)
    pub fn to_subscription(&self, category: Option<&str>) -> SubscriptionRecord {
        SubscriptionRecord {
            id: String::new(),
            name: self.name.clone(),
            cost: Some(self.amount),
            billing_cycle: Some(self.billing_cycle().as_str().to_string()),
            next_payment_date: Some(self.next_charge),
            category: category.map(str::to_string),
            status: SubscriptionStatus::Active,
            trial_end_date: None,
            date_added: None,
        }
    }
}

/// Detection results for one imported batch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub total_transactions: usize,
    pub candidates: Vec<RecurrenceCandidate>,
    /// Overall confidence for the batch, capped below certainty
    pub confidence: f64,
}

// ========== Report Models ==========

/// A record excluded from a report, with the reason
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedRecord {
    pub id: String,
    pub name: String,
    /// Error kind, e.g. `InvalidBillingCycle`
    pub reason: String,
    pub message: String,
}

impl SkippedRecord {
    pub fn new(id: &str, name: &str, error: &Error) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            reason: error.kind().to_string(),
            message: error.to_string(),
        }
    }
}

/// Totals over the selected subscriptions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendSummary {
    /// Monthly-equivalent total
    pub total_spent: f64,
    pub count: usize,
    pub average_spend: f64,
    pub projected_yearly: f64,
    pub skipped: Vec<SkippedRecord>,
}

/// Spend for a single category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBreakdownRow {
    pub category: String,
    pub total: f64,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    pub rows: Vec<CategoryBreakdownRow>,
    pub skipped: Vec<SkippedRecord>,
}

/// A single month in a trend series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTrendPoint {
    /// `YYYY-MM`
    pub month: String,
    pub total: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTrend {
    pub points: Vec<MonthlyTrendPoint>,
    pub skipped: Vec<SkippedRecord>,
}

/// A subscription paired with its monthly-equivalent cost
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedSubscription<'a> {
    pub subscription: &'a SubscriptionRecord,
    pub monthly_cost: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopSubscriptions<'a> {
    pub ranked: Vec<RankedSubscription<'a>>,
    pub skipped: Vec<SkippedRecord>,
}

/// What a reminder is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    Payment,
    TrialEnding,
}

/// Display label for a days-until value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DueStatus {
    Overdue,
    DueToday,
    Upcoming,
}

impl DueStatus {
    pub fn from_days(days: i64) -> Self {
        match days {
            d if d < 0 => Self::Overdue,
            0 => Self::DueToday,
            _ => Self::Upcoming,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Overdue => "overdue",
            Self::DueToday => "due today",
            Self::Upcoming => "upcoming",
        }
    }
}

/// An upcoming payment or trial end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: String,
    pub name: String,
    pub kind: ReminderKind,
    pub date: NaiveDate,
    pub days_until: i64,
    pub status: DueStatus,
    /// Charge amount for the period (not monthly-normalized)
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpcomingPayments {
    pub reminders: Vec<Reminder>,
    pub skipped: Vec<SkippedRecord>,
}

/// Which subscription statuses a report includes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusFilter {
    statuses: Vec<SubscriptionStatus>,
}

impl StatusFilter {
    pub fn new(statuses: impl IntoIterator<Item = SubscriptionStatus>) -> Self {
        let mut list: Vec<SubscriptionStatus> = Vec::new();
        for s in statuses {
            if !list.contains(&s) {
                list.push(s);
            }
        }
        Self { statuses: list }
    }

    pub fn active_only() -> Self {
        Self::new([SubscriptionStatus::Active])
    }

    pub fn all() -> Self {
        Self::new([
            SubscriptionStatus::Active,
            SubscriptionStatus::Cancelled,
            SubscriptionStatus::Watchlist,
            SubscriptionStatus::Trial,
        ])
    }

    pub fn includes(&self, status: SubscriptionStatus) -> bool {
        self.statuses.contains(&status)
    }

    pub fn statuses(&self) -> &[SubscriptionStatus] {
        &self.statuses
    }
}

impl Default for StatusFilter {
    fn default() -> Self {
        Self::active_only()
    }
}

impl std::str::FromStr for StatusFilter {
    type Err = String;

    /// Comma-separated statuses, or `all`
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::all());
        }
        let statuses = s
            .split(',')
            .filter(|p| !p.trim().is_empty())
            .map(str::parse)
            .collect::<std::result::Result<Vec<SubscriptionStatus>, _>>()?;
        if statuses.is_empty() {
            return Err("No statuses given".to_string());
        }
        Ok(Self::new(statuses))
    }
}

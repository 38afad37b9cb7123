//! Billing cycle normalization and date helpers
//!
//! Converts `(cost, cycle)` pairs into comparable monthly and yearly figures
//! and answers "how many days until" questions against an explicit
//! reference date. Nothing here reads the clock.

use chrono::{DateTime, Days, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{BillingCycle, SubscriptionRecord};

/// Weeks counted per month when normalizing weekly charges
pub const WEEKS_PER_MONTH: f64 = 4.33;
/// Days counted per month when normalizing daily charges
pub const DAYS_PER_MONTH: f64 = 30.0;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Normalization settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingConfig {
    pub weeks_per_month: f64,
    pub days_per_month: f64,
    /// Cycle whose rule applies to `variable` subscriptions (None = monthly)
    pub variable_as: Option<BillingCycle>,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            weeks_per_month: WEEKS_PER_MONTH,
            days_per_month: DAYS_PER_MONTH,
            variable_as: None,
        }
    }
}

/// Converts subscription costs to monthly/yearly equivalents
#[derive(Debug, Clone, Default)]
pub struct BillingNormalizer {
    config: BillingConfig,
}

impl BillingNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: BillingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BillingConfig {
        &self.config
    }

    /// Monthly equivalent of `cost` billed every `cycle` (unrounded)
    pub fn monthly_equivalent(&self, cost: f64, cycle: BillingCycle) -> f64 {
        match cycle {
            BillingCycle::Monthly => cost,
            BillingCycle::Yearly => cost / 12.0,
            BillingCycle::Quarterly => cost / 3.0,
            BillingCycle::Weekly => cost * self.config.weeks_per_month,
            BillingCycle::Daily => cost * self.config.days_per_month,
            BillingCycle::Variable => match self.config.variable_as {
                Some(cycle) if cycle != BillingCycle::Variable => {
                    self.monthly_equivalent(cost, cycle)
                }
                _ => cost,
            },
        }
    }

    /// Always `monthly_equivalent * 12`
    pub fn yearly_equivalent(&self, cost: f64, cycle: BillingCycle) -> f64 {
        self.monthly_equivalent(cost, cycle) * 12.0
    }

    /// Like `monthly_equivalent`, parsing the cycle first
    pub fn monthly_equivalent_str(&self, cost: f64, cycle: &str) -> Result<f64> {
        Ok(self.monthly_equivalent(cost, cycle.parse()?))
    }

    pub fn yearly_equivalent_str(&self, cost: f64, cycle: &str) -> Result<f64> {
        Ok(self.yearly_equivalent(cost, cycle.parse()?))
    }

    /// Monthly equivalent of a stored record, validating cost and cycle
    pub fn record_monthly(&self, record: &SubscriptionRecord) -> Result<f64> {
        let cycle = record.cycle()?;
        let cost = record.validated_cost()?;
        Ok(self.monthly_equivalent(cost, cycle))
    }
}

/// Monthly equivalent with default settings
pub fn monthly_equivalent(cost: f64, cycle: BillingCycle) -> f64 {
    BillingNormalizer::new().monthly_equivalent(cost, cycle)
}

/// Yearly equivalent with default settings
pub fn yearly_equivalent(cost: f64, cycle: BillingCycle) -> f64 {
    BillingNormalizer::new().yearly_equivalent(cost, cycle)
}

/// Round a money amount to cents for display
pub fn round_money(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Whole days from `reference` to `target`; negative when `target` is past
pub fn days_until(target: NaiveDate, reference: NaiveDate) -> i64 {
    (target - reference).num_days()
}

/// Days until an instant, rounding partial days up
pub fn days_until_instant(target: DateTime<Utc>, reference: DateTime<Utc>) -> i64 {
    let millis = (target - reference).num_milliseconds() as f64;
    (millis / MILLIS_PER_DAY).ceil() as i64
}

/// Advance `date` by `periods` billing periods (calendar-aware for months)
///
/// Month arithmetic clamps to the last valid day, so Jan 31 plus one month is
/// the last day of February.
pub fn add_periods(date: NaiveDate, cycle: BillingCycle, periods: u32) -> Option<NaiveDate> {
    match cycle {
        BillingCycle::Daily => date.checked_add_days(Days::new(u64::from(periods))),
        BillingCycle::Weekly => date.checked_add_days(Days::new(7 * u64::from(periods))),
        BillingCycle::Monthly | BillingCycle::Variable => {
            date.checked_add_months(Months::new(periods))
        }
        BillingCycle::Quarterly => date.checked_add_months(Months::new(periods.checked_mul(3)?)),
        BillingCycle::Yearly => date.checked_add_months(Months::new(periods.checked_mul(12)?)),
    }
}

/// First billing date on or after `reference`, stepping from `anchor`
///
/// Steps are counted from the anchor rather than chained, so a charge on the
/// 31st comes back to the 31st in long months.
pub fn next_occurrence(
    anchor: NaiveDate,
    cycle: BillingCycle,
    reference: NaiveDate,
) -> Option<NaiveDate> {
    if anchor >= reference {
        return Some(anchor);
    }

    // Longest possible period, so the estimate never overshoots
    let max_period_days: i64 = match cycle {
        BillingCycle::Daily => 1,
        BillingCycle::Weekly => 7,
        BillingCycle::Monthly | BillingCycle::Variable => 31,
        BillingCycle::Quarterly => 92,
        BillingCycle::Yearly => 366,
    };
    let gap = days_until(reference, anchor);
    let mut periods = u32::try_from((gap / max_period_days).max(1)).ok()?;

    loop {
        let candidate = add_periods(anchor, cycle, periods)?;
        if candidate >= reference {
            return Some(candidate);
        }
        periods = periods.checked_add(1)?;
    }
}

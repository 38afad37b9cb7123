//! Spend aggregation over tracked subscriptions
//!
//! Every report normalizes records to monthly equivalents first. Records that
//! fail validation are left out of the sums and listed in `skipped`, so one
//! bad row never blanks out a report. Sums keep full precision and are
//! rounded to cents only in the returned structs.

use std::collections::HashMap;

use chrono::{Datelike, Months, NaiveDate};
use tracing::{debug, warn};

use crate::billing::{days_until, next_occurrence, round_money, BillingNormalizer};
use crate::models::{
    CategoryBreakdown, CategoryBreakdownRow, DueStatus, MonthlyTrend, MonthlyTrendPoint,
    RankedSubscription, Reminder, ReminderKind, SkippedRecord, SpendSummary, StatusFilter,
    SubscriptionRecord, SubscriptionStatus, TopSubscriptions, UpcomingPayments,
};

/// Trailing months in a trend report unless the caller says otherwise
pub const DEFAULT_MONTHS_BACK: u32 = 12;
/// Rows in a top-N report unless the caller says otherwise
pub const DEFAULT_TOP_N: usize = 10;
/// Longest trend window (100 years)
pub const MAX_MONTHS_BACK: u32 = 1200;

/// A record that passed validation, with its monthly equivalent
struct Normalized<'a> {
    record: &'a SubscriptionRecord,
    monthly: f64,
}

/// Builds summaries, breakdowns and trends from subscription records
#[derive(Debug, Clone, Default)]
pub struct SpendAggregator {
    normalizer: BillingNormalizer,
    colors: HashMap<String, String>,
}

impl SpendAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_normalizer(normalizer: BillingNormalizer) -> Self {
        Self {
            normalizer,
            colors: HashMap::new(),
        }
    }

    /// Attach a category -> color palette used by `by_category`
    pub fn with_colors(self, colors: HashMap<String, String>) -> Self {
        Self { colors, ..self }
    }

    pub fn normalizer(&self) -> &BillingNormalizer {
        &self.normalizer
    }

    /// Totals over active subscriptions
    pub fn summarize(&self, subscriptions: &[SubscriptionRecord]) -> SpendSummary {
        self.summarize_with(subscriptions, &StatusFilter::active_only())
    }

    /// Totals over subscriptions whose status passes `filter`
    pub fn summarize_with(
        &self,
        subscriptions: &[SubscriptionRecord],
        filter: &StatusFilter,
    ) -> SpendSummary {
        let (items, skipped) = self.normalize(subscriptions, filter);

        let total: f64 = items.iter().map(|n| n.monthly).sum();
        let count = items.len();
        let average = if count == 0 { 0.0 } else { total / count as f64 };

        debug!(
            "Summarized {} subscriptions (${:.2}/mo), {} skipped",
            count,
            total,
            skipped.len()
        );

        SpendSummary {
            total_spent: round_money(total),
            count,
            average_spend: round_money(average),
            projected_yearly: round_money(total * 12.0),
            skipped,
        }
    }

    /// Monthly spend per category, largest first
    pub fn by_category(&self, subscriptions: &[SubscriptionRecord]) -> CategoryBreakdown {
        let (items, skipped) = self.normalize(subscriptions, &StatusFilter::active_only());

        // Rows in first-seen order, so the stable sort below breaks ties by it
        let mut rows: Vec<(String, f64, usize)> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();
        for item in &items {
            let category = item.record.category_label();
            match index.get(category) {
                Some(&i) => {
                    rows[i].1 += item.monthly;
                    rows[i].2 += 1;
                }
                None => {
                    index.insert(category, rows.len());
                    rows.push((category.to_string(), item.monthly, 1));
                }
            }
        }

        rows.sort_by(|a, b| b.1.total_cmp(&a.1));

        let rows = rows
            .into_iter()
            .map(|(category, total, count)| CategoryBreakdownRow {
                color: self.colors.get(&category).cloned(),
                category,
                total: round_money(total),
                count,
            })
            .collect();

        CategoryBreakdown { rows, skipped }
    }

    /// Monthly totals for the trailing `months_back` months ending with the
    /// reference month, oldest first
    ///
    /// Every active subscription counts toward every month in the window,
    /// regardless of when it was added or cancelled.
    pub fn by_month(
        &self,
        subscriptions: &[SubscriptionRecord],
        months_back: u32,
        reference: NaiveDate,
    ) -> MonthlyTrend {
        let (items, skipped) = self.normalize(subscriptions, &StatusFilter::active_only());

        let total: f64 = items.iter().map(|n| n.monthly).sum();
        let points = trailing_months(reference, months_back)
            .into_iter()
            .map(|month| MonthlyTrendPoint {
                month: month.format("%Y-%m").to_string(),
                total: round_money(total),
                count: items.len(),
            })
            .collect();

        MonthlyTrend { points, skipped }
    }

    /// The `n` most expensive active subscriptions by monthly equivalent
    pub fn top_n<'a>(
        &self,
        subscriptions: &'a [SubscriptionRecord],
        n: usize,
    ) -> TopSubscriptions<'a> {
        let (mut items, skipped) = self.normalize(subscriptions, &StatusFilter::active_only());

        items.sort_by(|a, b| b.monthly.total_cmp(&a.monthly));
        items.truncate(n);

        let ranked = items
            .into_iter()
            .map(|item| RankedSubscription {
                subscription: item.record,
                monthly_cost: round_money(item.monthly),
            })
            .collect();

        TopSubscriptions { ranked, skipped }
    }

    /// Payments and trial ends falling within `within_days` of `reference`
    ///
    /// Stale payment dates are rolled forward by whole billing periods.
    /// Trial ends that already passed are reported as overdue.
    pub fn upcoming(
        &self,
        subscriptions: &[SubscriptionRecord],
        within_days: i64,
        reference: NaiveDate,
    ) -> UpcomingPayments {
        let filter = StatusFilter::new([SubscriptionStatus::Active, SubscriptionStatus::Trial]);
        let mut reminders = Vec::new();
        let mut skipped = Vec::new();

        for record in subscriptions.iter().filter(|s| filter.includes(s.status)) {
            let validated = record
                .cycle()
                .and_then(|cycle| record.validated_cost().map(|cost| (cycle, cost)));
            let (cycle, cost) = match validated {
                Ok(pair) => pair,
                Err(e) => {
                    warn!("Skipping subscription {} ({}): {}", record.id, record.name, e);
                    skipped.push(SkippedRecord::new(&record.id, &record.name, &e));
                    continue;
                }
            };

            if let Some(anchor) = record.next_payment_date {
                if let Some(due) = next_occurrence(anchor, cycle, reference) {
                    let days = days_until(due, reference);
                    if days <= within_days {
                        reminders.push(reminder(record, ReminderKind::Payment, due, days, cost));
                    }
                }
            }

            if record.status == SubscriptionStatus::Trial {
                if let Some(end) = record.trial_end_date {
                    let days = days_until(end, reference);
                    if days <= within_days {
                        reminders.push(reminder(record, ReminderKind::TrialEnding, end, days, cost));
                    }
                }
            }
        }

        reminders.sort_by_key(|r| r.days_until);

        UpcomingPayments { reminders, skipped }
    }

    /// Split records into normalized items and skipped entries
    fn normalize<'a>(
        &self,
        subscriptions: &'a [SubscriptionRecord],
        filter: &StatusFilter,
    ) -> (Vec<Normalized<'a>>, Vec<SkippedRecord>) {
        let mut items = Vec::new();
        let mut skipped = Vec::new();

        for record in subscriptions.iter().filter(|s| filter.includes(s.status)) {
            match self.normalizer.record_monthly(record) {
                Ok(monthly) => items.push(Normalized { record, monthly }),
                Err(e) => {
                    warn!("Skipping subscription {} ({}): {}", record.id, record.name, e);
                    skipped.push(SkippedRecord::new(&record.id, &record.name, &e));
                }
            }
        }

        (items, skipped)
    }
}

fn reminder(
    record: &SubscriptionRecord,
    kind: ReminderKind,
    date: NaiveDate,
    days: i64,
    amount: f64,
) -> Reminder {
    Reminder {
        id: record.id.clone(),
        name: record.name.clone(),
        kind,
        date,
        days_until: days,
        status: DueStatus::from_days(days),
        amount: round_money(amount),
    }
}

/// First day of each of the last `count` months, oldest first, ending with
/// the month containing `reference`
///
/// `count` is capped at `MAX_MONTHS_BACK`.
pub fn trailing_months(reference: NaiveDate, count: u32) -> Vec<NaiveDate> {
    let Some(current) = NaiveDate::from_ymd_opt(reference.year(), reference.month(), 1) else {
        return Vec::new();
    };
    let mut months: Vec<NaiveDate> = (0..count.min(MAX_MONTHS_BACK))
        .map_while(|back| current.checked_sub_months(Months::new(back)))
        .collect();
    months.reverse();
    months
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BillingCycle;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sub(id: &str, category: &str, cost: f64, cycle: BillingCycle) -> SubscriptionRecord {
        SubscriptionRecord::new(id, format!("Sub {}", id), cost, cycle).with_category(category)
    }

    #[test]
    fn test_by_category_orders_by_total() {
        let subs = vec![
            sub("1", "A", 10.0, BillingCycle::Monthly),
            sub("2", "A", 5.0, BillingCycle::Monthly),
            sub("3", "B", 120.0, BillingCycle::Yearly),
        ];
        let breakdown = SpendAggregator::new().by_category(&subs);
        assert_eq!(
            breakdown.rows,
            vec![
                CategoryBreakdownRow {
                    category: "A".into(),
                    total: 15.0,
                    count: 2,
                    color: None
                },
                CategoryBreakdownRow {
                    category: "B".into(),
                    total: 10.0,
                    count: 1,
                    color: None
                },
            ]
        );
        assert!(breakdown.skipped.is_empty());
    }

    #[test]
    fn test_by_category_ties_keep_first_seen_order() {
        let subs = vec![
            sub("1", "Zeta", 10.0, BillingCycle::Monthly),
            sub("2", "Alpha", 10.0, BillingCycle::Monthly),
            sub("3", "", 3.0, BillingCycle::Monthly),
            SubscriptionRecord::new("4", "No category", 2.0, BillingCycle::Monthly),
        ];
        let rows = SpendAggregator::new().by_category(&subs).rows;
        let names: Vec<_> = rows.iter().map(|r| r.category.as_str()).collect();
        assert_eq!(names, vec!["Zeta", "Alpha", "Uncategorized"]);
        assert_eq!(rows[2].total, 5.0);
        assert_eq!(rows[2].count, 2);
    }

    #[test]
    fn test_by_category_colors_and_status() {
        let mut colors = HashMap::new();
        colors.insert("Streaming".to_string(), "#e50914".to_string());
        let aggregator = SpendAggregator::new().with_colors(colors);
        let subs = vec![
            sub("1", "Streaming", 15.49, BillingCycle::Monthly),
            sub("2", "Music", 10.99, BillingCycle::Monthly)
                .with_status(SubscriptionStatus::Cancelled),
        ];
        let rows = aggregator.by_category(&subs).rows;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].color.as_deref(), Some("#e50914"));
    }

    #[test]
    fn test_summarize_empty() {
        let summary = SpendAggregator::new().summarize(&[]);
        assert_eq!(summary.total_spent, 0.0);
        assert_eq!(summary.count, 0);
        assert_eq!(summary.average_spend, 0.0);
        assert_eq!(summary.projected_yearly, 0.0);
        assert!(summary.skipped.is_empty());
    }

    #[test]
    fn test_summarize_skips_bad_records() {
        let subs = vec![
            sub("1", "A", 10.0, BillingCycle::Monthly),
            SubscriptionRecord {
                billing_cycle: Some("bogus".into()),
                ..sub("2", "A", 99.0, BillingCycle::Monthly)
            },
            SubscriptionRecord {
                cost: None,
                ..sub("3", "A", 0.0, BillingCycle::Monthly)
            },
            sub("4", "B", 120.0, BillingCycle::Yearly),
        ];
        let summary = SpendAggregator::new().summarize(&subs);
        assert_eq!(summary.total_spent, 20.0);
        assert_eq!(summary.count, 2);
        assert_eq!(summary.average_spend, 10.0);
        assert_eq!(summary.projected_yearly, 240.0);
        assert_eq!(summary.skipped.len(), 2);
        assert_eq!(summary.skipped[0].id, "2");
        assert_eq!(summary.skipped[0].reason, "InvalidBillingCycle");
        assert_eq!(summary.skipped[1].id, "3");
        assert_eq!(summary.skipped[1].reason, "MalformedRecord");
    }

    #[test]
    fn test_summarize_with_status_filter() {
        let subs = vec![
            sub("1", "A", 10.0, BillingCycle::Monthly),
            sub("2", "A", 5.0, BillingCycle::Monthly).with_status(SubscriptionStatus::Trial),
            sub("3", "A", 7.0, BillingCycle::Monthly).with_status(SubscriptionStatus::Watchlist),
        ];
        let aggregator = SpendAggregator::new();
        assert_eq!(aggregator.summarize(&subs).count, 1);

        let filter = StatusFilter::new([SubscriptionStatus::Active, SubscriptionStatus::Trial]);
        let summary = aggregator.summarize_with(&subs, &filter);
        assert_eq!(summary.count, 2);
        assert_eq!(summary.total_spent, 15.0);
        assert_eq!(summary.average_spend, 7.5);
    }

    #[test]
    fn test_summarize_rounds_only_at_the_end() {
        // Three weekly 1.00 charges: 3 * 4.33 = 12.99 exactly once rounded
        let subs: Vec<_> = (0..3)
            .map(|i| sub(&i.to_string(), "A", 1.0, BillingCycle::Weekly))
            .collect();
        let summary = SpendAggregator::new().summarize(&subs);
        assert_eq!(summary.total_spent, 12.99);
        assert_eq!(summary.average_spend, 4.33);
    }

    #[test]
    fn test_by_month_window() {
        let subs = vec![
            sub("1", "A", 10.0, BillingCycle::Monthly),
            sub("2", "A", 120.0, BillingCycle::Yearly),
        ];
        let trend = SpendAggregator::new().by_month(&subs, 12, date(2026, 10, 17));
        assert_eq!(trend.points.len(), 12);
        assert_eq!(trend.points[0].month, "2025-11");
        assert_eq!(trend.points[11].month, "2026-10");
        assert!(trend.points.windows(2).all(|w| w[0].month < w[1].month));
        assert!(trend.points.iter().all(|p| p.total == 20.0 && p.count == 2));
    }

    #[test]
    fn test_by_month_empty_and_zero() {
        let aggregator = SpendAggregator::new();
        let trend = aggregator.by_month(&[], 3, date(2026, 1, 31));
        let months: Vec<_> = trend.points.iter().map(|p| p.month.as_str()).collect();
        assert_eq!(months, vec!["2025-11", "2025-12", "2026-01"]);
        assert!(trend.points.iter().all(|p| p.total == 0.0 && p.count == 0));

        assert!(aggregator.by_month(&[], 0, date(2026, 1, 31)).points.is_empty());
    }

    #[test]
    fn test_top_n() {
        let subs = vec![
            sub("1", "A", 5.0, BillingCycle::Monthly),
            sub("2", "A", 240.0, BillingCycle::Yearly),
            sub("3", "A", 20.0, BillingCycle::Monthly),
            sub("4", "A", 5.0, BillingCycle::Monthly),
            sub("5", "A", 50.0, BillingCycle::Monthly).with_status(SubscriptionStatus::Cancelled),
        ];
        let aggregator = SpendAggregator::new();
        let top = aggregator.top_n(&subs, 10);
        let ids: Vec<_> = top.ranked.iter().map(|r| r.subscription.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "3", "1", "4"]);
        assert_eq!(top.ranked[0].monthly_cost, 20.0);

        let top = aggregator.top_n(&subs, 2);
        assert_eq!(top.ranked.len(), 2);
        assert!(aggregator.top_n(&subs, 0).ranked.is_empty());
    }

    #[test]
    fn test_upcoming() {
        let today = date(2026, 10, 17);
        let subs = vec![
            sub("1", "A", 15.49, BillingCycle::Monthly).with_next_payment(date(2026, 10, 20)),
            // Stale date rolls forward to Oct 17
            sub("2", "A", 99.0, BillingCycle::Yearly).with_next_payment(date(2025, 10, 17)),
            // Beyond the window
            sub("3", "A", 5.0, BillingCycle::Monthly).with_next_payment(date(2026, 11, 30)),
            sub("4", "A", 8.0, BillingCycle::Monthly)
                .with_status(SubscriptionStatus::Trial)
                .with_trial_end(date(2026, 10, 15)),
            sub("5", "A", 8.0, BillingCycle::Monthly)
                .with_status(SubscriptionStatus::Cancelled)
                .with_next_payment(date(2026, 10, 18)),
        ];
        let upcoming = SpendAggregator::new().upcoming(&subs, 7, today);
        let summary: Vec<_> = upcoming
            .reminders
            .iter()
            .map(|r| (r.id.as_str(), r.kind, r.days_until, r.status))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("4", ReminderKind::TrialEnding, -2, DueStatus::Overdue),
                ("2", ReminderKind::Payment, 0, DueStatus::DueToday),
                ("1", ReminderKind::Payment, 3, DueStatus::Upcoming),
            ]
        );
        assert_eq!(upcoming.reminders[1].date, today);
        assert_eq!(upcoming.reminders[1].amount, 99.0);
    }

    #[test]
    fn test_upcoming_reports_bad_records() {
        let subs = vec![SubscriptionRecord {
            billing_cycle: Some("sometimes".into()),
            ..sub("1", "A", 1.0, BillingCycle::Monthly).with_next_payment(date(2026, 10, 18))
        }];
        let upcoming = SpendAggregator::new().upcoming(&subs, 7, date(2026, 10, 17));
        assert!(upcoming.reminders.is_empty());
        assert_eq!(upcoming.skipped.len(), 1);
    }

    #[test]
    fn test_trailing_months_crosses_years() {
        let months = trailing_months(date(2026, 2, 28), 3);
        assert_eq!(months, vec![date(2025, 12, 1), date(2026, 1, 1), date(2026, 2, 1)]);
    }

    #[test]
    fn test_trailing_months_caps_huge_windows() {
        let months = trailing_months(date(2026, 10, 17), u32::MAX);
        assert_eq!(months.len(), MAX_MONTHS_BACK as usize);
        assert_eq!(months[0], date(1926, 11, 1));
        assert_eq!(months[months.len() - 1], date(2026, 10, 1));

        let subs = vec![SubscriptionRecord::new("1", "A", 5.0, BillingCycle::Monthly)];
        let trend = SpendAggregator::new().by_month(&subs, u32::MAX, date(2026, 10, 17));
        assert_eq!(trend.points.len(), 1200);
    }
}

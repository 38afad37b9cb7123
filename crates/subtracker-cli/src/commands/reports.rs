//! Report command implementations

use std::path::Path;

use anyhow::{anyhow, Result};
use serde_json::json;
use subtracker_core::{ReminderKind, SkippedRecord, SpendSummary, StatusFilter, UpcomingPayments};

use super::{load_subscription_file, print_json, print_skipped, truncate, RunContext};

/// Import skips first, then the report's own
fn all_skipped(
    mut imported: Vec<SkippedRecord>,
    report: Vec<SkippedRecord>,
) -> Vec<SkippedRecord> {
    imported.extend(report);
    imported
}

fn parse_status(status: &str) -> Result<StatusFilter> {
    status
        .parse()
        .map_err(|e| anyhow!("Invalid --status '{}': {}", status, e))
}

pub fn summary_report(ctx: &RunContext, file: &Path, status: &str) -> Result<SpendSummary> {
    let filter = parse_status(status)?;
    let (subs, import_skipped) = load_subscription_file(file)?;

    let mut summary = ctx.config.aggregator().summarize_with(&subs, &filter);
    summary.skipped = all_skipped(import_skipped, summary.skipped);
    Ok(summary)
}

pub fn cmd_report_summary(ctx: &RunContext, file: &Path, status: &str) -> Result<()> {
    let filter = parse_status(status)?;
    let summary = summary_report(ctx, file, status)?;

    if ctx.json {
        return print_json(&summary);
    }

    let statuses: Vec<&str> = filter.statuses().iter().map(|s| s.as_str()).collect();

    println!();
    println!("📊 Spending Summary");
    println!("   Statuses: {}", statuses.join(", "));
    println!("   ─────────────────────────────────────────────────────────────");

    if summary.count == 0 {
        println!("   No subscriptions found.");
        print_skipped(&summary.skipped);
        return Ok(());
    }

    println!("   Monthly total:     ${:.2}", summary.total_spent);
    println!("   Projected yearly:  ${:.2}", summary.projected_yearly);
    println!("   Subscriptions:     {}", summary.count);
    println!("   Average per month: ${:.2}", summary.average_spend);

    print_skipped(&summary.skipped);
    Ok(())
}

pub fn cmd_report_categories(ctx: &RunContext, file: &Path) -> Result<()> {
    let (subs, import_skipped) = load_subscription_file(file)?;

    let mut breakdown = ctx.config.aggregator().by_category(&subs);
    breakdown.skipped = all_skipped(import_skipped, breakdown.skipped);

    if ctx.json {
        return print_json(&breakdown);
    }

    println!();
    println!("🏷️  Spending by Category");
    println!("   ─────────────────────────────────────────────────────────────");

    if breakdown.rows.is_empty() {
        println!("   No active subscriptions found.");
        print_skipped(&breakdown.skipped);
        return Ok(());
    }

    let total: f64 = breakdown.rows.iter().map(|r| r.total).sum();

    println!(
        "   {:25} │ {:>10} │ {:>6} │ {:>5} │ {:7}",
        "Category", "Monthly", "%", "Count", "Color"
    );
    println!("   ──────────────────────────┼────────────┼────────┼───────┼────────");

    for row in &breakdown.rows {
        let pct = if total > 0.0 {
            row.total / total * 100.0
        } else {
            0.0
        };
        println!(
            "   {:25} │ {:>10.2} │ {:>5.1}% │ {:>5} │ {:7}",
            truncate(&row.category, 25),
            row.total,
            pct,
            row.count,
            row.color.as_deref().unwrap_or("-")
        );
    }

    print_skipped(&breakdown.skipped);
    Ok(())
}

pub fn cmd_report_trends(ctx: &RunContext, file: &Path, months: Option<u32>) -> Result<()> {
    let months = months.unwrap_or(ctx.config.reports.months_back);
    let (subs, import_skipped) = load_subscription_file(file)?;

    let mut trend = ctx.config.aggregator().by_month(&subs, months, ctx.today);
    trend.skipped = all_skipped(import_skipped, trend.skipped);

    if ctx.json {
        return print_json(&trend);
    }

    println!();
    println!("📈 Monthly Trend");
    println!("   Last {} months through {}", months, ctx.today.format("%Y-%m"));
    println!("   ─────────────────────────────────────────────────────────────");

    if trend.points.is_empty() {
        println!("   No months in range.");
        print_skipped(&trend.skipped);
        return Ok(());
    }

    let max = trend.points.iter().map(|p| p.total).fold(0.0_f64, f64::max);

    println!("   {:7} │ {:>10} │ {:>5} │", "Month", "Total", "Count");
    println!("   ────────┼────────────┼───────┼──────────────────────────────");

    for point in &trend.points {
        let bar_len = if max > 0.0 {
            (point.total / max * 30.0).round() as usize
        } else {
            0
        };
        println!(
            "   {:7} │ {:>10.2} │ {:>5} │ {}",
            point.month,
            point.total,
            point.count,
            "█".repeat(bar_len)
        );
    }

    print_skipped(&trend.skipped);
    Ok(())
}

pub fn cmd_report_top(ctx: &RunContext, file: &Path, limit: Option<usize>) -> Result<()> {
    let limit = limit.unwrap_or(ctx.config.reports.top_n);
    let (subs, import_skipped) = load_subscription_file(file)?;

    let mut top = ctx.config.aggregator().top_n(&subs, limit);
    top.skipped = all_skipped(import_skipped, top.skipped);

    if ctx.json {
        return print_json(&top);
    }

    println!();
    println!("💸 Top {} Subscriptions", limit);
    println!("   ─────────────────────────────────────────────────────────────");

    if top.ranked.is_empty() {
        println!("   No active subscriptions found.");
        print_skipped(&top.skipped);
        return Ok(());
    }

    println!(
        "   {:>3} │ {:25} │ {:18} │ {:>10} │ {:>10}",
        "#", "Name", "Category", "Monthly", "Yearly"
    );
    println!("   ────┼───────────────────────────┼────────────────────┼────────────┼───────────");

    for (i, ranked) in top.ranked.iter().enumerate() {
        println!(
            "   {:>3} │ {:25} │ {:18} │ {:>10.2} │ {:>10.2}",
            i + 1,
            truncate(&ranked.subscription.name, 25),
            truncate(ranked.subscription.category_label(), 18),
            ranked.monthly_cost,
            ranked.monthly_cost * 12.0
        );
    }

    print_skipped(&top.skipped);
    Ok(())
}

/// Reminders due within `days` (config default when None)
pub fn upcoming_report(
    ctx: &RunContext,
    file: &Path,
    days: Option<i64>,
) -> Result<(i64, UpcomingPayments)> {
    let days = days.unwrap_or(ctx.config.reports.upcoming_days);
    let (subs, import_skipped) = load_subscription_file(file)?;

    let mut upcoming = ctx.config.aggregator().upcoming(&subs, days, ctx.today);
    upcoming.skipped = all_skipped(import_skipped, upcoming.skipped);
    Ok((days, upcoming))
}

pub fn cmd_report_upcoming(ctx: &RunContext, file: &Path, days: Option<i64>) -> Result<()> {
    let (days, upcoming) = upcoming_report(ctx, file, days)?;

    if ctx.json {
        return print_json(&json!({
            "today": ctx.today,
            "withinDays": days,
            "reminders": upcoming.reminders,
            "skipped": upcoming.skipped,
        }));
    }

    println!();
    println!("🔔 Upcoming in the next {} days", days);
    println!("   As of {}", ctx.today);
    println!("   ─────────────────────────────────────────────────────────────");

    if upcoming.reminders.is_empty() {
        println!("   Nothing due.");
        print_skipped(&upcoming.skipped);
        return Ok(());
    }

    println!(
        "   {:10} │ {:25} │ {:12} │ {:>9} │ {:>5} │ {}",
        "Date", "Name", "Kind", "Amount", "Days", "Status"
    );
    println!("   ───────────┼───────────────────────────┼──────────────┼───────────┼───────┼──────────");

    for r in &upcoming.reminders {
        let kind = match r.kind {
            ReminderKind::Payment => "payment",
            ReminderKind::TrialEnding => "trial ends",
        };
        println!(
            "   {:10} │ {:25} │ {:12} │ {:>9.2} │ {:>5} │ {}",
            r.date.to_string(),
            truncate(&r.name, 25),
            kind,
            r.amount,
            r.days_until,
            r.status.as_str()
        );
    }

    print_skipped(&upcoming.skipped);
    Ok(())
}

//! Normalization and date commands

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde_json::json;
use subtracker_core::{days_until, days_until_instant, round_money, BillingCycle, DueStatus};

use super::{print_json, resolve_today, RunContext};

/// A cost and its normalized equivalents
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedCost {
    pub cost: f64,
    pub cycle: BillingCycle,
    pub monthly: f64,
    pub yearly: f64,
}

/// Normalize with the configured multipliers and `variable` override
pub fn normalize_cost(ctx: &RunContext, cost: f64, cycle: &str) -> Result<NormalizedCost> {
    if !cost.is_finite() || cost < 0.0 {
        anyhow::bail!("Cost must be a non-negative number, got {}", cost);
    }
    let cycle: BillingCycle = cycle.parse().with_context(|| {
        format!(
            "Unknown billing cycle '{}'. Available: daily, weekly, monthly, quarterly, yearly, variable",
            cycle
        )
    })?;

    let normalizer = ctx.config.normalizer();
    Ok(NormalizedCost {
        cost,
        cycle,
        monthly: round_money(normalizer.monthly_equivalent(cost, cycle)),
        yearly: round_money(normalizer.yearly_equivalent(cost, cycle)),
    })
}

pub fn cmd_normalize(ctx: &RunContext, cost: f64, cycle: &str) -> Result<()> {
    let normalized = normalize_cost(ctx, cost, cycle)?;

    if ctx.json {
        return print_json(&normalized);
    }

    println!();
    println!("💱 ${:.2} billed {}", normalized.cost, normalized.cycle);
    println!("   Monthly: ${:.2}", normalized.monthly);
    println!("   Yearly:  ${:.2}", normalized.yearly);

    Ok(())
}

/// Days until a calendar date or an RFC 3339 instant
///
/// Instants are measured from midnight UTC of `--today` when given, otherwise
/// from now, rounding partial days up.
pub fn days_until_target(target: &str, today: Option<&str>) -> Result<i64> {
    let target = target.trim();
    if let Ok(date) = NaiveDate::parse_from_str(target, "%Y-%m-%d") {
        return Ok(days_until(date, resolve_today(today)?));
    }

    let instant = DateTime::parse_from_rfc3339(target)
        .with_context(|| format!("Invalid date '{}' (use YYYY-MM-DD or RFC 3339)", target))?
        .with_timezone(&Utc);
    let reference = match today {
        Some(_) => resolve_today(today)?.and_hms_opt(0, 0, 0).map(|d| d.and_utc()),
        None => Some(Utc::now()),
    }
    .context("Invalid reference date")?;
    Ok(days_until_instant(instant, reference))
}

pub fn cmd_days_until(target: &str, today: Option<&str>, json: bool) -> Result<()> {
    let days = days_until_target(target, today)?;
    let status = DueStatus::from_days(days);

    if json {
        return print_json(&json!({
            "date": target.trim(),
            "daysUntil": days,
            "status": status,
        }));
    }

    println!("{}: {} day(s) ({})", target.trim(), days, status.as_str());
    Ok(())
}

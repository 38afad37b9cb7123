//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use subtracker_core::{AnalyticsConfig, BillingCycle, Frequency};
use tempfile::TempDir;

use crate::commands::{self, resolve_today, truncate, RunContext};

fn test_context(json: bool) -> RunContext {
    RunContext {
        config: AnalyticsConfig::embedded().unwrap(),
        config_source: None,
        today: NaiveDate::from_ymd_opt(2026, 10, 17).unwrap(),
        json,
    }
}

fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn subscriptions_file(dir: &TempDir) -> PathBuf {
    write_file(
        dir,
        "subs.csv",
        "id,name,cost,billing_cycle,category,status,next_payment_date,trial_end_date
s1,Netflix,15.49,monthly,Streaming,active,2026-10-20,
s2,Gym,10,weekly,Fitness,active,2026-10-16,
s3,Notion,8,monthly,Software,trial,,2026-10-19
s4,Mystery,4,fortnightly,,active,,",
    )
}

fn transactions_file(dir: &TempDir) -> PathBuf {
    write_file(
        dir,
        "bank.csv",
        "Date,Description,Amount
2026-01-05,SPOTIFY USA,-10.99
2026-02-05,SPOTIFY USA,-10.99
2026-03-05,SPOTIFY USA,-10.99
2026-04-05,SPOTIFY USA,-10.99
2026-02-14,FLORIST,-45.00",
    )
}

// ========== Shared Utility Tests ==========

#[test]
fn test_truncate() {
    assert_eq!(truncate("Netflix", 25), "Netflix");
    assert_eq!(truncate("A very long subscription name", 10), "A very ...");
    assert_eq!(truncate("Café Crème Monthly", 8), "Café ...");
}

#[test]
fn test_resolve_today() {
    assert_eq!(
        resolve_today(Some("2026-10-17")).unwrap(),
        NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
    );
    assert!(resolve_today(Some("10/17/2026")).is_err());
    assert!(resolve_today(None).is_ok());
}

#[test]
fn test_run_context_with_explicit_config() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[reports]\nupcoming_days = 30").unwrap();

    let ctx = RunContext::load(Some(file.path()), Some("2026-10-17"), true).unwrap();
    assert_eq!(ctx.config.reports.upcoming_days, 30);
    assert_eq!(ctx.config_source.as_deref(), Some(file.path()));
    assert!(ctx.json);
    assert!(ctx.config_label().ends_with(&file.path().display().to_string()));
    assert_eq!(test_context(false).config_label(), "built-in config");
}

#[test]
fn test_run_context_missing_config_fails() {
    let result = RunContext::load(Some(Path::new("/nonexistent/config.toml")), None, false);
    assert!(result.is_err());
}

// ========== Normalize Command Tests ==========

#[test]
fn test_normalize_cost_values() {
    let ctx = test_context(false);
    let yearly = commands::normalize_cost(&ctx, 120.0, "yearly").unwrap();
    assert_eq!(yearly.cycle, BillingCycle::Yearly);
    assert_eq!(yearly.monthly, 10.0);
    assert_eq!(yearly.yearly, 120.0);

    let weekly = commands::normalize_cost(&ctx, 10.0, "Weekly").unwrap();
    assert_eq!(weekly.monthly, 43.3);
    assert_eq!(weekly.yearly, 519.6);

    assert!(commands::cmd_normalize(&ctx, 120.0, "yearly").is_ok());
    assert!(commands::cmd_normalize(&test_context(true), 10.0, "weekly").is_ok());
}

#[test]
fn test_normalize_uses_config_override() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "[billing]\nvariable_as = \"quarterly\"\nweeks_per_month = 4.0"
    )
    .unwrap();
    let ctx = RunContext::load(Some(file.path()), Some("2026-10-17"), false).unwrap();

    let variable = commands::normalize_cost(&ctx, 30.0, "variable").unwrap();
    assert_eq!(variable.monthly, 10.0);
    assert_eq!(variable.yearly, 120.0);

    let weekly = commands::normalize_cost(&ctx, 10.0, "weekly").unwrap();
    assert_eq!(weekly.monthly, 40.0);

    // Built-in config treats variable as monthly
    let default = commands::normalize_cost(&test_context(false), 30.0, "variable").unwrap();
    assert_eq!(default.monthly, 30.0);
}

#[test]
fn test_normalize_rejects_bad_input() {
    let ctx = test_context(false);
    assert!(commands::normalize_cost(&ctx, 10.0, "fortnightly").is_err());
    assert!(commands::normalize_cost(&ctx, -1.0, "monthly").is_err());
    assert!(commands::normalize_cost(&ctx, f64::NAN, "monthly").is_err());
}

#[test]
fn test_days_until_target() {
    let today = Some("2026-10-17");
    assert_eq!(commands::days_until_target("2026-10-20", today).unwrap(), 3);
    assert_eq!(commands::days_until_target("2026-10-16", today).unwrap(), -1);
    // Partial days round up from midnight UTC
    assert_eq!(
        commands::days_until_target("2026-10-17T18:00:00Z", today).unwrap(),
        1
    );
    assert!(commands::days_until_target("next tuesday", today).is_err());
    assert!(commands::days_until_target("2026-10-20", Some("bad")).is_err());

    assert!(commands::cmd_days_until("2026-10-20", today, false).is_ok());
    assert!(commands::cmd_days_until("2026-10-20", today, true).is_ok());
}

// ========== Detect Command Tests ==========

#[test]
fn test_detect_file_results() {
    let dir = TempDir::new().unwrap();
    let file = transactions_file(&dir);
    let report = commands::detect_file(&test_context(false), &file).unwrap();

    assert_eq!(report.summary.total_transactions, 5);
    assert_eq!(report.summary.candidates.len(), 1);
    let spotify = &report.summary.candidates[0];
    assert_eq!(spotify.name, "SPOTIFY USA");
    assert_eq!(spotify.amount, 10.99);
    assert_eq!(spotify.frequency, Frequency::Monthly);
    assert_eq!(spotify.next_charge, NaiveDate::from_ymd_opt(2026, 5, 5).unwrap());
    assert!(report.skipped.is_empty());

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["summary"]["candidates"][0]["frequency"], "monthly");
    assert_eq!(json["summary"]["candidates"][0]["nextCharge"], "2026-05-05");
    assert_eq!(json["summary"]["totalTransactions"], 5);

    assert!(commands::cmd_detect(&test_context(false), &file).is_ok());
    assert!(commands::cmd_detect(&test_context(true), &file).is_ok());
}

#[test]
fn test_detect_respects_config_policy() {
    let dir = TempDir::new().unwrap();
    let file = transactions_file(&dir);
    let mut config = tempfile::NamedTempFile::new().unwrap();
    writeln!(config, "[recurrence]\nmin_support = 5").unwrap();
    let ctx = RunContext::load(Some(config.path()), Some("2026-10-17"), false).unwrap();

    let report = commands::detect_file(&ctx, &file).unwrap();
    assert!(report.summary.candidates.is_empty());
}

#[test]
fn test_cmd_detect_missing_file() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("missing.csv");
    assert!(commands::cmd_detect(&test_context(false), &file).is_err());
}

#[test]
fn test_cmd_detect_unsupported_format() {
    let dir = TempDir::new().unwrap();
    let file = write_file(&dir, "bank.ofx", "");
    assert!(commands::cmd_detect(&test_context(false), &file).is_err());
}

// ========== Report Command Tests ==========

#[test]
fn test_summary_report_values() {
    let dir = TempDir::new().unwrap();
    let file = subscriptions_file(&dir);
    let ctx = test_context(false);

    // Netflix 15.49 + Gym 43.3; Mystery has an unknown cycle
    let summary = commands::summary_report(&ctx, &file, "active").unwrap();
    assert_eq!(summary.count, 2);
    assert_eq!(summary.total_spent, 58.79);
    assert_eq!(summary.skipped.len(), 1);
    assert_eq!(summary.skipped[0].id, "s4");
    assert_eq!(summary.skipped[0].reason, "InvalidBillingCycle");

    let with_trials = commands::summary_report(&ctx, &file, "active,trial").unwrap();
    assert_eq!(with_trials.count, 3);
    assert_eq!(with_trials.total_spent, 66.79);
}

#[test]
fn test_upcoming_report_values() {
    let dir = TempDir::new().unwrap();
    let file = subscriptions_file(&dir);

    let (days, upcoming) = commands::upcoming_report(&test_context(false), &file, None).unwrap();
    assert_eq!(days, 7);
    let got: Vec<(&str, i64)> = upcoming
        .reminders
        .iter()
        .map(|r| (r.name.as_str(), r.days_until))
        .collect();
    assert_eq!(got, vec![("Notion", 2), ("Netflix", 3), ("Gym", 6)]);

    let (_, upcoming) = commands::upcoming_report(&test_context(false), &file, Some(2)).unwrap();
    assert_eq!(upcoming.reminders.len(), 1);
}

#[test]
fn test_cmd_report_summary() {
    let dir = TempDir::new().unwrap();
    let file = subscriptions_file(&dir);
    assert!(commands::cmd_report_summary(&test_context(false), &file, "active").is_ok());
    assert!(commands::cmd_report_summary(&test_context(true), &file, "all").is_ok());
    assert!(commands::cmd_report_summary(&test_context(false), &file, "active,trial").is_ok());
}

#[test]
fn test_cmd_report_summary_bad_status() {
    let dir = TempDir::new().unwrap();
    let file = subscriptions_file(&dir);
    assert!(commands::cmd_report_summary(&test_context(false), &file, "paused").is_err());
}

#[test]
fn test_cmd_report_categories() {
    let dir = TempDir::new().unwrap();
    let file = subscriptions_file(&dir);
    assert!(commands::cmd_report_categories(&test_context(false), &file).is_ok());
    assert!(commands::cmd_report_categories(&test_context(true), &file).is_ok());
}

#[test]
fn test_cmd_report_trends() {
    let dir = TempDir::new().unwrap();
    let file = subscriptions_file(&dir);
    assert!(commands::cmd_report_trends(&test_context(false), &file, None).is_ok());
    assert!(commands::cmd_report_trends(&test_context(true), &file, Some(3)).is_ok());
    assert!(commands::cmd_report_trends(&test_context(false), &file, Some(0)).is_ok());
}

#[test]
fn test_cmd_report_top() {
    let dir = TempDir::new().unwrap();
    let file = subscriptions_file(&dir);
    assert!(commands::cmd_report_top(&test_context(false), &file, Some(2)).is_ok());
    assert!(commands::cmd_report_top(&test_context(true), &file, None).is_ok());
}

#[test]
fn test_cmd_report_upcoming() {
    let dir = TempDir::new().unwrap();
    let file = subscriptions_file(&dir);
    assert!(commands::cmd_report_upcoming(&test_context(false), &file, None).is_ok());
    assert!(commands::cmd_report_upcoming(&test_context(true), &file, Some(1)).is_ok());
}

#[test]
fn test_cmd_report_empty_file() {
    let dir = TempDir::new().unwrap();
    let file = write_file(&dir, "subs.json", "[]");
    let ctx = test_context(false);
    assert!(commands::cmd_report_summary(&ctx, &file, "active").is_ok());
    assert!(commands::cmd_report_categories(&ctx, &file).is_ok());
    assert!(commands::cmd_report_top(&ctx, &file, None).is_ok());
    assert!(commands::cmd_report_upcoming(&ctx, &file, None).is_ok());
}

#[test]
fn test_cmd_report_invalid_json() {
    let dir = TempDir::new().unwrap();
    let file = write_file(&dir, "subs.json", "{not json");
    assert!(commands::cmd_report_summary(&test_context(false), &file, "active").is_err());
}

// ========== Config Command Tests ==========

#[test]
fn test_cmd_config() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[recurrence]\nmin_support = 4").unwrap();
    assert!(commands::cmd_config(Some(file.path()), false).is_ok());
    assert!(commands::cmd_config(Some(file.path()), true).is_ok());
}

#[test]
fn test_cmd_config_invalid() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[recurrence]\nmin_support = \"many\"").unwrap();
    assert!(commands::cmd_config(Some(file.path()), false).is_err());
}

//! Shared command utilities
//!
//! This module contains:
//! - `RunContext` - Loaded config, reference date and output mode for a command
//! - `resolve_today` - Parse `--today` or read the clock
//! - `load_subscription_file` / `print_skipped` - Record loading and skip reporting
//! - `print_json` - JSON output

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use subtracker_core::{
    load_config, load_subscriptions, AnalyticsConfig, SkippedRecord, SubscriptionRecord,
};
use tracing::{debug, info};

/// Everything a data command needs besides its own arguments
pub struct RunContext {
    pub config: AnalyticsConfig,
    pub config_source: Option<PathBuf>,
    pub today: NaiveDate,
    pub json: bool,
}

impl RunContext {
    pub fn load(config_path: Option<&Path>, today: Option<&str>, json: bool) -> Result<Self> {
        let loaded = load_config(config_path).context("Failed to load configuration")?;
        let ctx = Self {
            config: loaded.config,
            config_source: loaded.source,
            today: resolve_today(today)?,
            json,
        };
        debug!("Using {} (today = {})", ctx.config_label(), ctx.today);
        Ok(ctx)
    }

    /// Where the config came from, for display
    pub fn config_label(&self) -> String {
        match &self.config_source {
            Some(path) => format!("config from {}", path.display()),
            None => "built-in config".to_string(),
        }
    }
}

/// `--today` when given, otherwise the current UTC date
pub fn resolve_today(today: Option<&str>) -> Result<NaiveDate> {
    match today {
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .context("Invalid --today date format (use YYYY-MM-DD)"),
        None => Ok(Utc::now().date_naive()),
    }
}

/// Load subscriptions, logging what was left out at import
pub fn load_subscription_file(
    path: &Path,
) -> Result<(Vec<SubscriptionRecord>, Vec<SkippedRecord>)> {
    let imported = load_subscriptions(path)
        .with_context(|| format!("Failed to read subscriptions from {}", path.display()))?;
    info!(
        "Loaded {} subscriptions from {}",
        imported.records.len(),
        path.display()
    );
    Ok((imported.records, imported.skipped))
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json =
        serde_json::to_string_pretty(value).context("Failed to serialize output to JSON")?;
    println!("{}", json);
    Ok(())
}

/// Footer listing records left out of a report
pub fn print_skipped(skipped: &[SkippedRecord]) {
    if skipped.is_empty() {
        return;
    }
    println!();
    println!("   ⚠️  Skipped {} record(s):", skipped.len());
    for s in skipped {
        let label = if s.name.is_empty() { &s.id } else { &s.name };
        println!("      {} ({}): {}", label, s.reason, s.message);
    }
}

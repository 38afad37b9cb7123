//! SubTracker CLI - Subscription spend analytics
//!
//! Usage:
//!   subtracker normalize --cost 120 --cycle yearly    Monthly/yearly equivalents
//!   subtracker detect --file bank.csv                 Find recurring charges
//!   subtracker report summary --file subs.json        Spend summary
//!   subtracker report upcoming --file subs.json       Payments due soon

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    // Logs go to stderr so --json output stays parseable
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();

    let load_context = || {
        commands::RunContext::load(cli.config.as_deref(), cli.today.as_deref(), cli.json)
    };

    match &cli.command {
        Commands::Normalize { cost, cycle } => {
            commands::cmd_normalize(&load_context()?, *cost, cycle)
        }
        Commands::DaysUntil { date } => {
            commands::cmd_days_until(date, cli.today.as_deref(), cli.json)
        }
        Commands::Config => commands::cmd_config(cli.config.as_deref(), cli.json),
        Commands::Detect { file } => commands::cmd_detect(&load_context()?, file),
        Commands::Report { report } => {
            let ctx = load_context()?;
            match report {
                ReportType::Summary { file, status } => {
                    commands::cmd_report_summary(&ctx, file, status)
                }
                ReportType::Categories { file } => commands::cmd_report_categories(&ctx, file),
                ReportType::Trends { file, months } => {
                    commands::cmd_report_trends(&ctx, file, *months)
                }
                ReportType::Top { file, limit } => commands::cmd_report_top(&ctx, file, *limit),
                ReportType::Upcoming { file, days } => {
                    commands::cmd_report_upcoming(&ctx, file, *days)
                }
            }
        }
    }
}

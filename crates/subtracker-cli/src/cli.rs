//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// SubTracker - Know what your subscriptions really cost
#[derive(Parser)]
#[command(name = "subtracker")]
#[command(about = "Subscription spend analytics and recurring charge detection", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (defaults to ~/.config/subtracker/config.toml, then built-in defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Reference date for time-relative reports (YYYY-MM-DD, defaults to today)
    #[arg(long, global = true)]
    pub today: Option<String>,

    /// Print results as JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a cost to its monthly and yearly equivalents
    Normalize {
        /// Amount charged per billing period
        #[arg(long)]
        cost: f64,

        /// Billing cycle: daily, weekly, monthly, quarterly, yearly, variable
        #[arg(long)]
        cycle: String,
    },

    /// Days from the reference date until a date (YYYY-MM-DD or RFC 3339 instant)
    DaysUntil {
        /// Target date
        date: String,
    },

    /// Detect recurring charges in a transaction export
    Detect {
        /// Transactions file (.csv or .json)
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Spend reports over tracked subscriptions
    Report {
        #[command(subcommand)]
        report: ReportType,
    },

    /// Show the effective configuration and where it came from
    Config,
}

#[derive(Subcommand)]
pub enum ReportType {
    /// Monthly total, count and average
    Summary {
        /// Subscriptions file (.csv or .json)
        #[arg(short, long)]
        file: PathBuf,

        /// Statuses to include: comma-separated (active,trial,...) or "all"
        #[arg(long, default_value = "active")]
        status: String,
    },

    /// Monthly spend per category
    Categories {
        /// Subscriptions file (.csv or .json)
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Monthly totals over a trailing window
    Trends {
        /// Subscriptions file (.csv or .json)
        #[arg(short, long)]
        file: PathBuf,

        /// Number of months, 1-1200 (defaults to config reports.months_back)
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=1200))]
        months: Option<u32>,
    },

    /// Most expensive subscriptions by monthly cost
    Top {
        /// Subscriptions file (.csv or .json)
        #[arg(short, long)]
        file: PathBuf,

        /// Number of subscriptions to show (defaults to config reports.top_n)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Payments and trial ends coming up soon
    Upcoming {
        /// Subscriptions file (.csv or .json)
        #[arg(short, long)]
        file: PathBuf,

        /// Look-ahead window in days (defaults to config reports.upcoming_days)
        #[arg(short, long)]
        days: Option<i64>,
    },
}

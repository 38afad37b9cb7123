//! Recurring charge detection command

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use subtracker_core::{load_transactions, round_money, ImportSummary, SkippedRecord};
use tracing::info;

use super::{print_json, print_skipped, truncate, RunContext};

/// Detection results plus the rows the import left out
#[derive(Debug, Clone, Serialize)]
pub struct DetectReport {
    pub summary: ImportSummary,
    pub skipped: Vec<SkippedRecord>,
}

pub fn detect_file(ctx: &RunContext, file: &Path) -> Result<DetectReport> {
    let imported = load_transactions(file)
        .with_context(|| format!("Failed to read transactions from {}", file.display()))?;

    let summary = ctx.config.detector().detect_summary(&imported.records);

    info!(
        "Found {} recurring charges in {} transactions",
        summary.candidates.len(),
        summary.total_transactions
    );

    Ok(DetectReport {
        summary,
        skipped: imported.skipped,
    })
}

pub fn cmd_detect(ctx: &RunContext, file: &Path) -> Result<()> {
    let report = detect_file(ctx, file)?;

    if ctx.json {
        return print_json(&report);
    }

    let summary = &report.summary;

    println!();
    println!("🔍 Recurring Charges");
    println!(
        "   {} transactions scanned, batch confidence {:.0}%",
        summary.total_transactions,
        summary.confidence * 100.0
    );
    println!("   ─────────────────────────────────────────────────────────────");

    if summary.candidates.is_empty() {
        println!("   No recurring charges found.");
        print_skipped(&report.skipped);
        return Ok(());
    }

    println!(
        "   {:25} │ {:>9} │ {:9} │ {:>9} │ {:10} │ {:>5}",
        "Name", "Amount", "Frequency", "Monthly", "Next", "Conf"
    );
    println!("   ──────────────────────────┼───────────┼───────────┼───────────┼────────────┼──────");

    let normalizer = ctx.config.normalizer();
    for c in &summary.candidates {
        println!(
            "   {:25} │ {:>9.2} │ {:9} │ {:>9.2} │ {:10} │ {:>4.0}%",
            truncate(&c.name, 25),
            c.amount,
            c.frequency.as_str(),
            round_money(c.monthly_equivalent(&normalizer)),
            c.next_charge.to_string(),
            c.confidence * 100.0
        );
    }

    print_skipped(&report.skipped);
    Ok(())
}

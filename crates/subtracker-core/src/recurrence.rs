//! Recurring charge detection
//!
//! Finds transactions that look like untracked subscriptions:
//! 1. Group by exact (case-insensitive) merchant/description and exact amount
//! 2. Require a minimum number of charges per group
//! 3. Classify the mean gap between charges as weekly, monthly or yearly
//! 4. Score how close the gap is to the ideal period and keep confident groups
//!
//! Merchant text is matched exactly. Descriptions that differ by a trailing
//! reference number land in different groups.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::billing::{add_periods, round_money};
use crate::models::{Frequency, ImportSummary, RecurrenceCandidate, Transaction};

/// Fewest charges that can establish a pattern
pub const MIN_SUPPORT: usize = 3;
/// Candidates must score strictly above this
pub const CONFIDENCE_THRESHOLD: f64 = 0.7;
/// Batch confidence never exceeds this
pub const BATCH_CONFIDENCE_CAP: f64 = 0.9;
/// Added to the identified/total ratio for batch confidence
pub const BATCH_CONFIDENCE_BASE: f64 = 0.3;

/// Inclusive range of mean gaps (days) mapped to one frequency
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntervalBand {
    pub min_days: f64,
    pub max_days: f64,
    /// Ideal gap used for scoring
    pub period_days: f64,
}

impl IntervalBand {
    pub const MONTHLY: Self = Self {
        min_days: 25.0,
        max_days: 35.0,
        period_days: 30.0,
    };
    pub const YEARLY: Self = Self {
        min_days: 350.0,
        max_days: 380.0,
        period_days: 365.0,
    };
    pub const WEEKLY: Self = Self {
        min_days: 6.0,
        max_days: 8.0,
        period_days: 7.0,
    };

    pub fn contains(&self, gap: f64) -> bool {
        gap >= self.min_days && gap <= self.max_days
    }

    pub fn confidence(&self, gap: f64) -> f64 {
        1.0 - (self.period_days - gap).abs() / self.period_days
    }
}

/// Detector thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecurrencePolicy {
    pub min_support: usize,
    pub confidence_threshold: f64,
    pub batch_confidence_cap: f64,
    pub batch_confidence_base: f64,
    pub monthly: IntervalBand,
    pub yearly: IntervalBand,
    pub weekly: IntervalBand,
}

impl Default for RecurrencePolicy {
    fn default() -> Self {
        Self {
            min_support: MIN_SUPPORT,
            confidence_threshold: CONFIDENCE_THRESHOLD,
            batch_confidence_cap: BATCH_CONFIDENCE_CAP,
            batch_confidence_base: BATCH_CONFIDENCE_BASE,
            monthly: IntervalBand::MONTHLY,
            yearly: IntervalBand::YEARLY,
            weekly: IntervalBand::WEEKLY,
        }
    }
}

/// Detects recurring charges in raw transaction lists
#[derive(Debug, Clone, Default)]
pub struct RecurrenceDetector {
    policy: RecurrencePolicy,
}

impl RecurrenceDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: RecurrencePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RecurrencePolicy {
        &self.policy
    }

    /// Detect recurring charges, ordered by grouping key
    pub fn detect(&self, transactions: &[Transaction]) -> Vec<RecurrenceCandidate> {
        let mut groups: BTreeMap<(String, i64), Vec<&Transaction>> = BTreeMap::new();
        for tx in transactions {
            if !tx.amount.is_finite() {
                debug!("Skipping transaction {} - amount is not a number", tx.id);
                continue;
            }
            groups.entry(grouping_key(tx)).or_default().push(tx);
        }

        let mut candidates = Vec::new();
        for ((payee, cents), mut txs) in groups {
            if txs.len() < self.policy.min_support {
                debug!(
                    "Skipping {} @ {} cents - only {} charges",
                    payee,
                    cents,
                    txs.len()
                );
                continue;
            }

            txs.sort_by_key(|t| t.date);
            let Some(gap) = mean_gap(&txs) else {
                continue;
            };

            let Some((frequency, confidence)) = self.classify(gap) else {
                debug!("Skipping {} - mean gap {:.1} days fits no cadence", payee, gap);
                continue;
            };

            if confidence <= self.policy.confidence_threshold {
                debug!(
                    "Skipping {} - confidence {:.2} at or below threshold",
                    payee, confidence
                );
                continue;
            }

            let first = txs[0];
            let last_charge = txs[txs.len() - 1].date;
            let Some(next_charge) = next_charge(last_charge, frequency) else {
                continue;
            };

            debug!(
                "Found recurring charge: {} @ ${:.2}/{} (confidence {:.2})",
                first.payee(),
                cents as f64 / 100.0,
                frequency.as_str(),
                confidence
            );

            candidates.push(RecurrenceCandidate {
                name: first.payee().to_string(),
                amount: cents as f64 / 100.0,
                frequency,
                last_charge,
                next_charge,
                confidence: round_money(confidence),
                occurrences: txs.len(),
            });
        }

        candidates
    }

    /// Detect and score a whole imported batch
    pub fn detect_summary(&self, transactions: &[Transaction]) -> ImportSummary {
        let candidates = self.detect(transactions);
        let confidence = self.batch_confidence(candidates.len(), transactions.len());
        ImportSummary {
            total_transactions: transactions.len(),
            candidates,
            confidence,
        }
    }

    /// `min(cap, identified / total + base)`; an empty batch scores 0
    pub fn batch_confidence(&self, identified: usize, total: usize) -> f64 {
        if total == 0 {
            return 0.0;
        }
        let ratio = identified as f64 / total as f64;
        (ratio + self.policy.batch_confidence_base).min(self.policy.batch_confidence_cap)
    }

    /// Map a mean gap to a frequency and raw confidence
    pub fn classify(&self, mean_gap: f64) -> Option<(Frequency, f64)> {
        let bands = [
            (Frequency::Monthly, self.policy.monthly),
            (Frequency::Yearly, self.policy.yearly),
            (Frequency::Weekly, self.policy.weekly),
        ];
        bands
            .into_iter()
            .find(|(_, band)| band.contains(mean_gap))
            .map(|(frequency, band)| (frequency, band.confidence(mean_gap)))
    }
}

/// Detect with the default policy
pub fn detect_recurring(transactions: &[Transaction]) -> Vec<RecurrenceCandidate> {
    RecurrenceDetector::new().detect(transactions)
}

fn grouping_key(tx: &Transaction) -> (String, i64) {
    let cents = (tx.amount * 100.0).round() as i64;
    (tx.payee().to_lowercase(), cents)
}

/// Arithmetic mean of consecutive day gaps; `txs` must be date-sorted
fn mean_gap(txs: &[&Transaction]) -> Option<f64> {
    let gaps: Vec<i64> = txs
        .windows(2)
        .map(|w| (w[1].date - w[0].date).num_days())
        .collect();
    if gaps.is_empty() {
        return None;
    }
    Some(gaps.iter().sum::<i64>() as f64 / gaps.len() as f64)
}

fn next_charge(last: NaiveDate, frequency: Frequency) -> Option<NaiveDate> {
    add_periods(last, frequency.billing_cycle(), 1)
}

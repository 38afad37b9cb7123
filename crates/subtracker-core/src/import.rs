//! Record import from CSV and JSON documents
//!
//! Turns the files the app exports (or a bank statement) into value objects
//! for the analytics engine. Rows that can't be read are reported as skipped
//! rather than failing the whole file.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::{ByteRecord, ReaderBuilder, StringRecord};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{SkippedRecord, SubscriptionRecord, SubscriptionStatus, Transaction};

/// Input document format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    Csv,
    Json,
}

impl RecordFormat {
    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);
        match ext.as_deref() {
            Some("csv") => Ok(Self::Csv),
            Some("json") => Ok(Self::Json),
            _ => Err(Error::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Records read from a document plus the rows that were left out
#[derive(Debug, Clone)]
pub struct Imported<T> {
    pub records: Vec<T>,
    pub skipped: Vec<SkippedRecord>,
}

impl<T> Default for Imported<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

impl<T> Imported<T> {
    fn skip(&mut self, id: &str, name: &str, error: Error) {
        warn!("Skipping row {}: {}", id, error);
        self.skipped.push(SkippedRecord::new(id, name, &error));
    }
}

pub fn load_transactions(path: &Path) -> Result<Imported<Transaction>> {
    let format = RecordFormat::from_path(path)?;
    let file = BufReader::new(File::open(path)?);
    read_transactions(file, format)
}

pub fn load_subscriptions(path: &Path) -> Result<Imported<SubscriptionRecord>> {
    let format = RecordFormat::from_path(path)?;
    let file = BufReader::new(File::open(path)?);
    read_subscriptions(file, format)
}

/// Read transactions; negative (debit-convention) amounts are stored as
/// absolute values
pub fn read_transactions<R: Read>(
    reader: R,
    format: RecordFormat,
) -> Result<Imported<Transaction>> {
    let mut imported = match format {
        RecordFormat::Csv => transactions_from_csv(reader)?,
        RecordFormat::Json => transactions_from_json(reader)?,
    };

    for tx in &mut imported.records {
        tx.amount = tx.amount.abs();
        if tx.id.trim().is_empty() {
            tx.id = derive_id(&[
                &tx.date.to_string(),
                &tx.description,
                &tx.amount.to_string(),
            ]);
        }
    }

    debug!(
        "Read {} transactions ({} skipped)",
        imported.records.len(),
        imported.skipped.len()
    );
    Ok(imported)
}

/// Read subscription records
pub fn read_subscriptions<R: Read>(
    reader: R,
    format: RecordFormat,
) -> Result<Imported<SubscriptionRecord>> {
    let mut imported = match format {
        RecordFormat::Csv => subscriptions_from_csv(reader)?,
        RecordFormat::Json => subscriptions_from_json(reader)?,
    };

    for sub in &mut imported.records {
        if sub.id.trim().is_empty() {
            sub.id = derive_id(&[
                &sub.name,
                &sub.cost.map(|c| c.to_string()).unwrap_or_default(),
                sub.billing_cycle.as_deref().unwrap_or_default(),
            ]);
        }
    }

    debug!(
        "Read {} subscriptions ({} skipped)",
        imported.records.len(),
        imported.skipped.len()
    );
    Ok(imported)
}

/// Case-insensitive header lookup accepting several spellings per column
struct Columns {
    index: HashMap<String, usize>,
}

impl Columns {
    fn new(headers: &StringRecord) -> Self {
        let index = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (normalize_header(h), i))
            .collect();
        Self { index }
    }

    fn position(&self, names: &[&str]) -> Option<usize> {
        names
            .iter()
            .find_map(|n| self.index.get(&normalize_header(n)).copied())
    }

    fn require(&self, names: &[&str]) -> Result<usize> {
        self.position(names)
            .ok_or_else(|| Error::malformed("header", format!("missing '{}' column", names[0])))
    }
}

fn normalize_header(h: &str) -> String {
    h.trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

/// Decode one CSV row, replacing invalid UTF-8 (Latin-1 merchant names)
///
/// Rows the reader can't split at all are recorded as skipped.
fn row_record<T>(
    imported: &mut Imported<T>,
    row: usize,
    result: std::result::Result<ByteRecord, csv::Error>,
) -> Option<StringRecord> {
    match result {
        Ok(bytes) => Some(StringRecord::from_byte_record_lossy(bytes)),
        Err(e) => {
            imported.skip(&format!("row {}", row + 1), "", Error::from(e));
            None
        }
    }
}

/// Non-empty trimmed field
fn field(record: &StringRecord, pos: Option<usize>) -> Option<&str> {
    pos.and_then(|i| record.get(i))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn transactions_from_csv<R: Read>(reader: R) -> Result<Imported<Transaction>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let columns = Columns::new(rdr.headers()?);
    let date_col = columns.require(&["date", "transaction date"])?;
    let desc_col = columns.require(&["description", "name"])?;
    let amount_col = columns.require(&["amount"])?;
    let merchant_col = columns.position(&["merchant"]);
    let account_col = columns.position(&["account_id", "account"]);
    let id_col = columns.position(&["id"]);

    let mut imported = Imported::default();
    for (row, result) in rdr.byte_records().enumerate() {
        let Some(record) = row_record(&mut imported, row, result) else {
            continue;
        };
        let row_id = field(&record, id_col)
            .map(str::to_string)
            .unwrap_or_else(|| format!("row {}", row + 1));
        let description = field(&record, Some(desc_col)).unwrap_or_default();

        let parsed = (|| -> Result<Transaction> {
            if description.is_empty() {
                return Err(Error::malformed(&row_id, "missing description"));
            }
            let date = field(&record, Some(date_col))
                .ok_or_else(|| Error::malformed(&row_id, "missing date"))
                .and_then(|s| parse_date(&row_id, s))?;
            let amount = field(&record, Some(amount_col))
                .ok_or_else(|| Error::malformed(&row_id, "missing amount"))
                .and_then(|s| parse_amount(&row_id, s))?;
            Ok(Transaction {
                id: field(&record, id_col).unwrap_or_default().to_string(),
                description: description.to_string(),
                amount,
                date,
                account_id: field(&record, account_col).map(str::to_string),
                merchant: field(&record, merchant_col).map(str::to_string),
            })
        })();

        match parsed {
            Ok(tx) => imported.records.push(tx),
            Err(e) => imported.skip(&row_id, description, e),
        }
    }

    Ok(imported)
}

fn subscriptions_from_csv<R: Read>(reader: R) -> Result<Imported<SubscriptionRecord>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let columns = Columns::new(rdr.headers()?);
    let name_col = columns.require(&["name"])?;
    let cost_col = columns.require(&["cost", "amount"])?;
    let cycle_col = columns.require(&["billing_cycle", "cycle"])?;
    let id_col = columns.position(&["id"]);
    let category_col = columns.position(&["category"]);
    let status_col = columns.position(&["status"]);
    let next_col = columns.position(&["next_payment_date", "next_payment"]);
    let trial_col = columns.position(&["trial_end_date", "trial_end"]);
    let added_col = columns.position(&["date_added"]);

    let mut imported = Imported::default();
    for (row, result) in rdr.byte_records().enumerate() {
        let Some(record) = row_record(&mut imported, row, result) else {
            continue;
        };
        let row_id = field(&record, id_col)
            .map(str::to_string)
            .unwrap_or_else(|| format!("row {}", row + 1));
        let name = field(&record, Some(name_col)).unwrap_or_default();

        let optional_date = |pos: Option<usize>| -> Result<Option<NaiveDate>> {
            field(&record, pos)
                .map(|s| parse_date(&row_id, s))
                .transpose()
        };

        let parsed = (|| -> Result<SubscriptionRecord> {
            if name.is_empty() {
                return Err(Error::malformed(&row_id, "missing name"));
            }
            // Blank cost/cycle stay None so the aggregator reports them
            let cost = field(&record, Some(cost_col))
                .map(|s| parse_amount(&row_id, s))
                .transpose()?;
            let status = match field(&record, status_col) {
                Some(s) => s
                    .parse::<SubscriptionStatus>()
                    .map_err(|e| Error::malformed(&row_id, e))?,
                None => SubscriptionStatus::default(),
            };
            Ok(SubscriptionRecord {
                id: field(&record, id_col).unwrap_or_default().to_string(),
                name: name.to_string(),
                cost,
                billing_cycle: field(&record, Some(cycle_col)).map(str::to_string),
                next_payment_date: optional_date(next_col)?,
                category: field(&record, category_col).map(str::to_string),
                status,
                trial_end_date: optional_date(trial_col)?,
                date_added: optional_date(added_col)?,
            })
        })();

        match parsed {
            Ok(sub) => imported.records.push(sub),
            Err(e) => imported.skip(&row_id, name, e),
        }
    }

    Ok(imported)
}

/// Parse a JSON array, deserializing each element on its own
fn json_elements<R: Read, T: serde::de::DeserializeOwned>(
    reader: R,
    label: fn(&Value) -> (String, String),
) -> Result<Imported<T>> {
    let values: Vec<Value> = serde_json::from_reader(reader)?;
    let mut imported = Imported::default();
    for (i, value) in values.into_iter().enumerate() {
        let (id, name) = label(&value);
        let id = if id.is_empty() {
            format!("item {}", i + 1)
        } else {
            id
        };
        match serde_json::from_value::<T>(value) {
            Ok(record) => imported.records.push(record),
            Err(e) => imported.skip(&id, &name, Error::malformed(&id, e.to_string())),
        }
    }
    Ok(imported)
}

fn json_label(value: &Value, name_key: &str) -> (String, String) {
    let id = match value.get("id") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    };
    let name = value
        .get(name_key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    (id, name)
}

fn transactions_from_json<R: Read>(reader: R) -> Result<Imported<Transaction>> {
    json_elements(reader, |v| json_label(v, "description"))
}

fn subscriptions_from_json<R: Read>(reader: R) -> Result<Imported<SubscriptionRecord>> {
    json_elements(reader, |v| json_label(v, "name"))
}

/// Stable id for records that arrive without one
fn derive_id(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    let mut id = hex::encode(hasher.finalize());
    id.truncate(16);
    id
}

/// Parse a date string in various common formats
///
/// Timestamps (RFC 3339, or ISO without an offset) keep their calendar date.
pub fn parse_date_text(s: &str) -> Option<NaiveDate> {
    let s = s.trim();

    let formats = [
        "%Y-%m-%d", // 2024-01-15
        "%m/%d/%Y", // 01/15/2024
        "%m/%d/%y", // 01/15/24
        "%m-%d-%Y", // 01-15-2024
    ];

    for fmt in formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }

    if let Ok(instant) = DateTime::parse_from_rfc3339(s) {
        return Some(instant.date_naive());
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|dt| dt.date())
}

fn parse_date(row: &str, s: &str) -> Result<NaiveDate> {
    parse_date_text(s)
        .ok_or_else(|| Error::malformed(row, format!("unable to parse date: {}", s.trim())))
}

/// Parse an amount string, handling currency symbols and commas
fn parse_amount(row: &str, s: &str) -> Result<f64> {
    let cleaned: String = s
        .trim()
        .replace(['$', ',', ' '], "")
        .replace('(', "-")
        .replace(')', "");

    cleaned
        .parse::<f64>()
        .ok()
        .filter(|a| a.is_finite())
        .ok_or_else(|| Error::malformed(row, format!("unable to parse amount: {}", s)))
}

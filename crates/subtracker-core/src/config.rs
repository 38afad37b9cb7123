//! Analytics configuration
//!
//! Holds the detector thresholds, billing multipliers, report defaults and
//! the category color palette.
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a two-layer resolution:
//! 1. An explicit path (`--config`), or the override in the user config dir
//!    (~/.config/subtracker/config.toml) when it exists
//! 2. Fall back to embedded defaults (compiled into binary)

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregate::{SpendAggregator, DEFAULT_MONTHS_BACK, DEFAULT_TOP_N};
use crate::billing::{BillingConfig, BillingNormalizer};
use crate::error::Result;
use crate::recurrence::{RecurrenceDetector, RecurrencePolicy};

/// Embedded default config (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../../../config/subtracker.toml");

/// Default window for upcoming-payment reminders
pub const DEFAULT_UPCOMING_DAYS: i64 = 7;

/// Report defaults used when the caller doesn't pass explicit values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub months_back: u32,
    pub top_n: usize,
    pub upcoming_days: i64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            months_back: DEFAULT_MONTHS_BACK,
            top_n: DEFAULT_TOP_N,
            upcoming_days: DEFAULT_UPCOMING_DAYS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryConfig {
    /// Category name -> display color
    pub colors: HashMap<String, String>,
}

/// Full analytics configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub billing: BillingConfig,
    pub recurrence: RecurrencePolicy,
    pub reports: ReportConfig,
    pub categories: CategoryConfig,
}

impl AnalyticsConfig {
    /// Embedded defaults
    pub fn embedded() -> Result<Self> {
        parse_config(DEFAULT_CONFIG)
    }

    pub fn normalizer(&self) -> BillingNormalizer {
        BillingNormalizer::with_config(self.billing.clone())
    }

    pub fn detector(&self) -> RecurrenceDetector {
        RecurrenceDetector::with_policy(self.recurrence.clone())
    }

    pub fn aggregator(&self) -> SpendAggregator {
        SpendAggregator::with_normalizer(self.normalizer())
            .with_colors(self.categories.colors.clone())
    }

    pub fn to_toml(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// A loaded configuration and the file it came from (None = embedded)
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: AnalyticsConfig,
    pub source: Option<PathBuf>,
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("subtracker").join("config.toml"))
}

pub fn parse_config(content: &str) -> Result<AnalyticsConfig> {
    Ok(toml::from_str(content)?)
}

/// Load configuration (explicit path, then default override, then embedded)
///
/// An explicit path must exist; the default override location is optional.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    if let Some(path) = explicit {
        let content = fs::read_to_string(path)?;
        debug!("Loaded config from {}", path.display());
        return Ok(LoadedConfig {
            config: parse_config(&content)?,
            source: Some(path.to_path_buf()),
        });
    }

    if let Some(path) = default_config_path() {
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            debug!("Loaded config override from {}", path.display());
            return Ok(LoadedConfig {
                config: parse_config(&content)?,
                source: Some(path),
            });
        }
    }

    Ok(LoadedConfig {
        config: AnalyticsConfig::embedded()?,
        source: None,
    })
}

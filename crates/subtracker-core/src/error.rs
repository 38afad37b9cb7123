//! Error types for SubTracker

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid billing cycle: {0}")]
    InvalidBillingCycle(String),

    #[error("Malformed record {id}: {reason}")]
    MalformedRecord { id: String, reason: String },

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),
}

impl Error {
    pub fn malformed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Short kind name used in skipped-record reports
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidBillingCycle(_) => "InvalidBillingCycle",
            Self::MalformedRecord { .. } => "MalformedRecord",
            Self::Csv(_) => "Csv",
            Self::Io(_) => "Io",
            Self::Json(_) => "Json",
            Self::Config(_) => "Config",
            Self::UnsupportedFormat(_) => "UnsupportedFormat",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

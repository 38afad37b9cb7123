//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `context` - Shared utilities (run context, reference date, record loading, JSON output)
//! - `config` - Show the effective configuration
//! - `detect` - Recurring charge detection over transaction exports
//! - `normalize` - Cost normalization and days-until
//! - `reports` - Report generation commands

pub mod config;
pub mod context;
pub mod detect;
pub mod normalize;
pub mod reports;

// Re-export command functions for main.rs
pub use config::*;
pub use context::*;
pub use detect::*;
pub use normalize::*;
pub use reports::*;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

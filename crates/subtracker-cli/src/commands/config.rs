//! Configuration display command

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::json;
use subtracker_core::config::{default_config_path, load_config};

use super::print_json;

pub fn cmd_config(config_path: Option<&Path>, json: bool) -> Result<()> {
    let loaded = load_config(config_path).context("Failed to load configuration")?;
    let source = loaded
        .source
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "built-in defaults".to_string());

    if json {
        return print_json(&json!({
            "source": source,
            "config": loaded.config,
        }));
    }

    let text = loaded
        .config
        .to_toml()
        .context("Failed to serialize configuration")?;

    println!("⚙️  Configuration");
    println!("   Source: {}", source);
    if loaded.source.is_none() {
        if let Some(path) = default_config_path() {
            println!("   Override: create {} to customize", path.display());
        }
    }
    println!("   ─────────────────────────────────────────────────────────────");
    println!("{}", text);

    Ok(())
}

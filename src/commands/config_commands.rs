//! Configuration management commands

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::commands::AppContext;
use crate::infrastructure::config::AppConfig;

/// Effective configuration as pretty JSON
pub fn show_config(ctx: &AppContext) -> Result<String> {
    serde_json::to_string_pretty(&ctx.config).context("Failed to serialize configuration")
}

pub fn config_path(ctx: &AppContext) -> PathBuf {
    ctx.config_manager.config_path().clone()
}

pub async fn reset_config(ctx: &AppContext) -> Result<AppConfig> {
    ctx.config_manager.reset_to_defaults().await
}

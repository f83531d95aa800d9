//! Command handlers behind the command line
//!
//! Each handler takes the loaded [`AppContext`] and returns plain data; the
//! binary decides how to print it.

pub mod config_commands;
pub mod history_commands;
pub mod search_commands;

use anyhow::Result;
use std::sync::Arc;

use crate::application::HistoryStore;
use crate::infrastructure::config::{AppConfig, ConfigManager};
use crate::infrastructure::history_repository::JsonHistoryRepository;

/// Loaded configuration plus where it came from
pub struct AppContext {
    pub config: AppConfig,
    pub config_manager: ConfigManager,
}

impl AppContext {
    pub async fn load(config_manager: ConfigManager) -> Result<Self> {
        let config = config_manager.load_config().await?;
        Ok(Self { config, config_manager })
    }

    /// History store backed by the configured JSON file
    pub fn history_store(&self) -> Result<HistoryStore> {
        let path = self.config.storage.history_path()?;
        Ok(HistoryStore::new(Arc::new(JsonHistoryRepository::new(path))))
    }
}

pub use config_commands::{config_path, reset_config, show_config};
pub use history_commands::{
    FileImport, HistoryReport, clear_history, export_history, format_imports, format_report, history_report,
    import_history, remove_entry,
};
pub use search_commands::{RunSearchRequest, run_search, run_search_with_session};

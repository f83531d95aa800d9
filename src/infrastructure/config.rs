//! Configuration infrastructure
//!
//! Contains configuration loading and management for the sell-through checker.
//!
//! Values are layered, later sources winning:
//! 1. Built-in defaults (the `defaults` module)
//! 2. The JSON config file under the user config directory
//! 3. `SELLTHROUGH__SECTION__KEY` environment variables

#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, ensure};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

use crate::domain::search::SearchConfig;

/// Environment variable prefix, e.g. `SELLTHROUGH__POLLING__MAX_ATTEMPTS=5`
pub const ENV_PREFIX: &str = "SELLTHROUGH";

/// Directory name used under the platform config and data directories
pub const APP_DIR_NAME: &str = "sell-through-checker";

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Marketplace search URL parts
    pub search: SearchSettings,

    /// Count polling policy
    pub polling: PollingConfig,

    /// How pages are loaded
    pub session: SessionConfig,

    /// Where history and exports live
    pub storage: StorageConfig,

    pub logging: LoggingConfig,

    /// Hidden/Advanced settings (config file only)
    pub advanced: AdvancedConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Search page URL the keyword and filter params are appended to
    pub base_url: String,

    /// Filter selecting completed/sold listings
    pub sold_query_params: String,

    /// Filter selecting live listings
    pub live_query_params: String,

    /// Query key for the search phrase
    pub keyword_param: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Extraction attempts per page before the count falls back to 0
    pub max_attempts: u32,

    /// Wait before each attempt in milliseconds
    pub delay_ms: u64,

    /// Keep the stored result for a term when either count of the new one
    /// came from an exhausted poll
    pub keep_previous_on_exhausted: bool,
}

/// Page session backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionDriver {
    /// Real browser through a WebDriver server (chromedriver, geckodriver)
    #[default]
    Webdriver,
    /// Plain HTTP fetch of the server-rendered page
    Http,
}

impl std::fmt::Display for SessionDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Webdriver => write!(f, "webdriver"),
            Self::Http => write!(f, "http"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub driver: SessionDriver,

    /// WebDriver endpoint
    pub webdriver_url: String,

    /// Start the browser without a window
    pub headless: bool,

    pub user_agent: String,

    /// Timeout for HTTP requests in seconds
    pub request_timeout_seconds: u64,

    /// Rate limit for the HTTP session
    pub max_requests_per_second: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Data directory; empty means the platform local data directory
    pub data_dir: String,

    pub history_file_name: String,

    pub export_file_name: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted logs
    pub json_format: bool,

    /// Enable console output
    pub console_output: bool,

    /// Enable file output
    pub file_output: bool,

    /// Number of log files to keep (older files will be deleted)
    pub max_files: u32,

    /// Enable automatic log cleanup on startup
    pub auto_cleanup_logs: bool,

    /// Module-specific log level filters (e.g., "reqwest": "info")
    pub module_filters: HashMap<String, String>,
}

/// Hidden/Advanced settings that are in config file but not exposed on the command line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvancedConfig {
    /// CSS selector of the element whose first child holds the result count
    pub count_selector: String,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            base_url: ebay::SEARCH_BASE_URL.to_string(),
            sold_query_params: ebay::SOLD_QUERY_PARAMS.to_string(),
            live_query_params: ebay::LIVE_QUERY_PARAMS.to_string(),
            keyword_param: ebay::KEYWORD_PARAM.to_string(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            max_attempts: defaults::POLL_MAX_ATTEMPTS,
            delay_ms: defaults::POLL_DELAY_MS,
            keep_previous_on_exhausted: defaults::KEEP_PREVIOUS_ON_EXHAUSTED,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            driver: SessionDriver::default(),
            webdriver_url: defaults::WEBDRIVER_URL.to_string(),
            headless: defaults::HEADLESS,
            user_agent: defaults::USER_AGENT.to_string(),
            request_timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
            max_requests_per_second: defaults::MAX_REQUESTS_PER_SECOND,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: String::new(),
            history_file_name: defaults::HISTORY_FILE_NAME.to_string(),
            export_file_name: defaults::EXPORT_FILE_NAME.to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: defaults::LOG_JSON_FORMAT,
            console_output: defaults::LOG_CONSOLE_OUTPUT,
            file_output: defaults::LOG_FILE_OUTPUT,
            max_files: defaults::LOG_MAX_FILES,
            auto_cleanup_logs: defaults::LOG_AUTO_CLEANUP,
            module_filters: {
                let mut filters = HashMap::new();
                filters.insert("reqwest".to_string(), "info".to_string());
                filters.insert("hyper".to_string(), "warn".to_string());
                filters.insert("fantoccini".to_string(), "info".to_string());
                filters.insert("html5ever".to_string(), "warn".to_string());
                filters
            },
        }
    }
}

impl Default for AdvancedConfig {
    fn default() -> Self {
        Self { count_selector: ebay::COUNT_HEADING_SELECTOR.to_string() }
    }
}

impl AppConfig {
    /// Check the values a run depends on
    pub fn validate(&self) -> Result<()> {
        ensure!(self.polling.max_attempts > 0, "polling.max_attempts must be at least 1");
        ensure!(
            self.session.max_requests_per_second > 0,
            "session.max_requests_per_second must be at least 1"
        );
        ensure!(!self.search.keyword_param.trim().is_empty(), "search.keyword_param must not be empty");
        ensure!(!self.advanced.count_selector.trim().is_empty(), "advanced.count_selector must not be empty");
        url::Url::parse(&self.search.base_url)
            .with_context(|| format!("search.base_url '{}' is not a valid URL", self.search.base_url))?;
        Ok(())
    }

    /// Search config for one run over `items`
    pub fn search_config(&self, items: Vec<String>) -> SearchConfig {
        let mut config = SearchConfig::new(
            &self.search.base_url,
            &self.search.sold_query_params,
            &self.search.live_query_params,
            items,
        );
        config.keyword_param.clone_from(&self.search.keyword_param);
        config
    }
}

impl StorageConfig {
    /// Configured data directory, or the platform default
    pub fn resolve_data_dir(&self) -> Result<PathBuf> {
        if self.data_dir.trim().is_empty() {
            ConfigManager::get_app_data_dir()
        } else {
            Ok(PathBuf::from(&self.data_dir))
        }
    }

    pub fn history_path(&self) -> Result<PathBuf> {
        Ok(self.resolve_data_dir()?.join(&self.history_file_name))
    }

    pub fn default_export_path(&self) -> Result<PathBuf> {
        Ok(self.resolve_data_dir()?.join("exports").join(&self.export_file_name))
    }

    pub fn logs_dir(&self) -> Result<PathBuf> {
        Ok(self.resolve_data_dir()?.join("logs"))
    }
}

/// Configuration manager for loading and saving settings
pub struct ConfigManager {
    pub config_path: PathBuf,
}

impl ConfigManager {
    /// Get the application configuration directory
    pub fn get_config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get user config directory")?
            .join(APP_DIR_NAME);

        Ok(config_dir)
    }

    /// Get application data directory
    pub fn get_app_data_dir() -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .context("Failed to get user data directory")?
            .join(APP_DIR_NAME);

        Ok(data_dir)
    }

    /// Configuration manager for the default config file location
    pub fn new() -> Result<Self> {
        let config_dir = Self::get_config_dir()?;
        let config_path = config_dir.join(defaults::CONFIG_FILE_NAME);

        Ok(Self { config_path })
    }

    /// Configuration manager for an explicit config file
    pub fn with_path(config_path: impl Into<PathBuf>) -> Self {
        Self { config_path: config_path.into() }
    }

    /// Load the layered configuration, creating the file on first run.
    ///
    /// A file that is not valid JSON is backed up to `*.json.corrupted` and
    /// replaced with defaults.
    pub async fn load_config(&self) -> Result<AppConfig> {
        if !self.config_path.exists() {
            info!("🎉 Configuration file not found, creating default: {:?}", self.config_path);
            self.save_config(&AppConfig::default()).await?;
        } else {
            let content = fs::read_to_string(&self.config_path)
                .await
                .context("Failed to read configuration file")?;

            if let Err(parse_error) = serde_json::from_str::<AppConfig>(&content) {
                warn!("⚠️  Configuration file is invalid: {}", parse_error);
                self.backup_corrupted().await;
                self.save_config(&AppConfig::default())
                    .await
                    .context("Failed to save default configuration")?;
                info!("✅ Reset to default configuration");
            }
        }

        let config = Self::layered(&self.config_path)?;
        info!("Loaded configuration from: {:?}", self.config_path);
        Ok(config)
    }

    /// Defaults, then the file, then the environment
    fn layered(path: &Path) -> Result<AppConfig> {
        let settings = Config::builder()
            .add_source(Config::try_from(&AppConfig::default()).context("Failed to build default configuration")?)
            .add_source(File::from(path).format(FileFormat::Json).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__").try_parsing(true))
            .build()
            .context("Failed to layer configuration sources")?;

        settings
            .try_deserialize::<AppConfig>()
            .context("Failed to deserialize configuration")
    }

    async fn backup_corrupted(&self) {
        let backup_path = self.config_path.with_extension("json.corrupted");
        if let Err(e) = fs::copy(&self.config_path, &backup_path).await {
            warn!("Failed to create backup of corrupted config: {}", e);
        } else {
            info!("Backed up corrupted config to: {:?}", backup_path);
        }
    }

    /// Save configuration to file
    pub async fn save_config(&self, config: &AppConfig) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create config directory")?;
        }

        let content = serde_json::to_string_pretty(config).context("Failed to serialize configuration")?;

        fs::write(&self.config_path, content)
            .await
            .context("Failed to write configuration file")?;

        info!("Saved configuration to: {:?}", self.config_path);
        Ok(())
    }

    /// Reset configuration to defaults (useful for troubleshooting)
    pub async fn reset_to_defaults(&self) -> Result<AppConfig> {
        info!("🔄 Resetting configuration to defaults");

        let default_config = AppConfig::default();
        self.save_config(&default_config).await?;

        info!("✅ Configuration reset to defaults");
        Ok(default_config)
    }

    /// Get the configuration file path
    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }
}

/// eBay search page constants
pub mod ebay {
    pub const SEARCH_BASE_URL: &str = "https://www.ebay.com/sch/i.html?";

    /// Completed and sold listings
    pub const SOLD_QUERY_PARAMS: &str = "LH_Sold=1&LH_Complete=1";

    /// New-condition live listings
    pub const LIVE_QUERY_PARAMS: &str = "LH_ItemCondition=1000";

    pub const KEYWORD_PARAM: &str = "_nkw";

    /// Result count heading; its first child element holds the number
    pub const COUNT_HEADING_SELECTOR: &str = "h1.srp-controls__count-heading";
}

/// Default configuration values
pub mod defaults {
    pub const CONFIG_FILE_NAME: &str = "sell_through_config.json";

    /// Extraction attempts per page
    pub const POLL_MAX_ATTEMPTS: u32 = 10;

    /// Wait before each extraction attempt
    pub const POLL_DELAY_MS: u64 = 1500;

    pub const KEEP_PREVIOUS_ON_EXHAUSTED: bool = false;

    pub const WEBDRIVER_URL: &str = "http://localhost:4444";

    pub const HEADLESS: bool = true;

    pub const USER_AGENT: &str =
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

    pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;

    pub const MAX_REQUESTS_PER_SECOND: u32 = 2;

    pub const HISTORY_FILE_NAME: &str = "search_history.json";

    pub const EXPORT_FILE_NAME: &str = "sell_through_results.csv";

    pub const LOG_LEVEL: &str = "info";
    pub const LOG_JSON_FORMAT: bool = false;
    pub const LOG_CONSOLE_OUTPUT: bool = true;
    pub const LOG_FILE_OUTPUT: bool = true;
    pub const LOG_MAX_FILES: u32 = 5;
    pub const LOG_AUTO_CLEANUP: bool = true;
}

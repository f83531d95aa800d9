//! Infrastructure layer for persistence, page sessions, parsing and file I/O
//!
//! Concrete implementations of the domain seams plus configuration and logging.

pub mod config; // Configuration layering and defaults
pub mod count_extractor;
pub mod csv_export;
pub mod csv_import;
pub mod history_repository;
pub mod http_client;
pub mod items_loader;
pub mod logging;
pub mod retry_manager;
pub mod webdriver_session;

// Re-export commonly used items
pub use config::{AppConfig, ConfigManager, SessionDriver, ebay};
pub use count_extractor::{HeadingCountExtractor, InvalidCountSelector};
pub use csv_export::{ExportError, export_history_to_file, history_csv_string};
pub use csv_import::{ImportError, SummaryCsv, read_history_csv};
pub use history_repository::{InMemoryHistoryRepository, JsonHistoryRepository};
pub use http_client::{HttpClient, HttpClientConfig, HttpPageSession};
pub use items_loader::{SearchInput, load_search_input};
pub use logging::init_logging_with_config;
pub use retry_manager::{Attempt, RetryOutcome, RetryPolicy, retry_with_delay};
pub use webdriver_session::WebDriverSession;

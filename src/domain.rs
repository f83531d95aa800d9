//! Domain module - search, history and run-state types
//!
//! Everything here is pure data and trait seams; no I/O.

pub mod count;
pub mod errors;
pub mod events;
pub mod history;
pub mod repositories;
pub mod search;
pub mod session;

// Re-export commonly used items for convenience
pub use count::{CountExtractor, ExtractionMiss, ExtractionResult, MalformedCount, parse_count};
pub use errors::{ConfigurationError, RunError, SessionError};
pub use events::{HistorySnapshot, ProgressEvent, RunStatus};
pub use history::{HistoryCollection, HistoryStats, UpsertOutcome};
pub use repositories::HistoryRepository;
pub use search::{SearchConfig, SearchResult, SearchTerm, sell_through_percentage};
pub use session::PageSession;

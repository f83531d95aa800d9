//! Application layer module
//!
//! Use cases that drive the domain through its seams: polling pages,
//! running a search over all items, and managing stored history.

pub mod history_store;
pub mod orchestrator;
pub mod poller;
pub mod progress;

pub use history_store::{HistoryStore, MergeCounts};
pub use orchestrator::{RunReport, SearchOrchestrator, validate_run_input};
pub use poller::{CountReading, PageCountPoller};
pub use progress::{ChannelProgressSink, CollectingProgressSink, FanOutProgressSink, ProgressSink, TracingProgressSink};

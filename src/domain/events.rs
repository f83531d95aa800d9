//! Run status and progress events
//!
//! These are what a front end observes while a run is in flight: the
//! [`RunStatus`] drives enablement of start/stop controls and the
//! [`ProgressEvent`] stream carries the human-readable status line plus the
//! incremental statistics recomputed after every item.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::domain::search::SearchResult;

/// Overall status of a search run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// No run has been started yet
    #[default]
    Idle,
    /// Items are being checked
    Running,
    /// Every item was checked
    Completed,
    /// The run was cancelled between items
    Stopped,
    /// A session or persistence failure ended the run
    Failed,
}

impl RunStatus {
    pub const fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }

    /// Completed, Stopped or Failed
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Stopped | Self::Failed)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Running => write!(f, "Running"),
            Self::Completed => write!(f, "Completed"),
            Self::Stopped => write!(f, "Stopped"),
            Self::Failed => write!(f, "Failed"),
        }
    }
}

/// Statistics over the whole persisted history after an item was stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistorySnapshot {
    pub average_percentage: Option<u32>,
    pub history_len: usize,
    /// Highest sell-through first
    pub ranked: Vec<SearchResult>,
}

/// Progress notification emitted during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ProgressEvent {
    Started {
        run_id: Uuid,
        total: usize,
    },
    ItemStarted {
        run_id: Uuid,
        item: String,
        qualifier: String,
        /// 1-based position of the item
        position: usize,
        total: usize,
    },
    ItemCompleted {
        run_id: Uuid,
        result: SearchResult,
        snapshot: HistorySnapshot,
    },
    Stopped {
        run_id: Uuid,
        checked: usize,
        total: usize,
    },
    Completed {
        run_id: Uuid,
        total: usize,
        snapshot: HistorySnapshot,
    },
    Failed {
        run_id: Uuid,
        message: String,
    },
}

impl ProgressEvent {
    pub const fn run_id(&self) -> Uuid {
        match self {
            Self::Started { run_id, .. }
            | Self::ItemStarted { run_id, .. }
            | Self::ItemCompleted { run_id, .. }
            | Self::Stopped { run_id, .. }
            | Self::Completed { run_id, .. }
            | Self::Failed { run_id, .. } => *run_id,
        }
    }

    /// Status line shown to the user
    pub fn message(&self) -> String {
        match self {
            Self::Started { total, .. } => format!("Starting search for {total} items..."),
            Self::ItemStarted { item, qualifier, position, total, .. } => {
                format!("Checking {item} - {qualifier} ({position}/{total})...")
            }
            Self::ItemCompleted { result, snapshot, .. } => {
                let average = snapshot
                    .average_percentage
                    .map_or_else(|| "-".to_string(), |avg| format!("{avg}%"));
                format!(
                    "{}: {}% ({} sold / {} live), average {} over {} searches",
                    result.search_term,
                    result.sell_through_percentage,
                    result.sold_count,
                    result.live_count,
                    average,
                    snapshot.history_len
                )
            }
            Self::Stopped { checked, total, .. } => format!("Stopped! Checked {checked}/{total} items"),
            Self::Completed { total, .. } => format!("Complete! Checked {total} items"),
            Self::Failed { message, .. } => format!("Error: {message}"),
        }
    }
}

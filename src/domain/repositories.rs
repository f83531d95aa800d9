//! Repository interfaces for search history persistence

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::history::HistoryCollection;

#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// Stored history, empty when nothing was saved yet. Unreadable storage
    /// is an error and is left as it is.
    async fn load_history(&self) -> Result<HistoryCollection>;

    /// Like [`load_history`](Self::load_history), but unreadable storage is
    /// set aside and an empty history returned so a run can start over it
    async fn recover_history(&self) -> Result<HistoryCollection> {
        self.load_history().await
    }

    /// Replace the stored history; a completed save is durable
    async fn save_history(&self, history: &HistoryCollection) -> Result<()>;

    async fn clear_history(&self) -> Result<()>;
}

//! History persistence: a JSON file on disk and an in-memory store

#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::domain::history::HistoryCollection;
use crate::domain::repositories::HistoryRepository;
use crate::domain::search::SearchResult;

/// Accepted on-disk shapes: a bare array, or an object wrapping it
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredHistory {
    Entries(Vec<SearchResult>),
    Wrapped {
        #[serde(rename = "searchHistory")]
        search_history: Vec<SearchResult>,
    },
}

impl From<StoredHistory> for HistoryCollection {
    fn from(stored: StoredHistory) -> Self {
        match stored {
            StoredHistory::Entries(entries) | StoredHistory::Wrapped { search_history: entries } => entries.into(),
        }
    }
}

/// History stored as a pretty-printed JSON array.
///
/// Saves write a sibling temp file and rename it over the target, so a
/// completed save never leaves a half-written file behind.
pub struct JsonHistoryRepository {
    path: PathBuf,
}

impl JsonHistoryRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }

    async fn backup_unreadable(&self) {
        let backup_path = self.path.with_extension("json.corrupted");
        match fs::rename(&self.path, &backup_path).await {
            Ok(()) => warn!("⚠️  Moved unreadable history to {:?}", backup_path),
            Err(e) => warn!("Failed to back up unreadable history {:?}: {}", self.path, e),
        }
    }
}

/// Why the history file could not be turned into a collection
enum LoadFailure {
    Io(anyhow::Error),
    Unreadable(serde_json::Error),
}

impl JsonHistoryRepository {
    async fn read_history(&self) -> Result<HistoryCollection, LoadFailure> {
        if !fs::try_exists(&self.path).await.unwrap_or(false) {
            debug!("No history file at {:?}", self.path);
            return Ok(HistoryCollection::new());
        }

        let content = fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read history file {:?}", self.path))
            .map_err(LoadFailure::Io)?;

        if content.trim().is_empty() {
            return Ok(HistoryCollection::new());
        }

        let stored = serde_json::from_str::<StoredHistory>(&content).map_err(LoadFailure::Unreadable)?;
        let history = HistoryCollection::from(stored);
        debug!("Loaded {} history entries from {:?}", history.len(), self.path);
        Ok(history)
    }
}

#[async_trait]
impl HistoryRepository for JsonHistoryRepository {
    async fn load_history(&self) -> Result<HistoryCollection> {
        match self.read_history().await {
            Ok(history) => Ok(history),
            Err(LoadFailure::Io(e)) => Err(e),
            Err(LoadFailure::Unreadable(e)) => {
                Err(e).with_context(|| format!("History file {:?} is not valid history JSON", self.path))
            }
        }
    }

    async fn recover_history(&self) -> Result<HistoryCollection> {
        match self.read_history().await {
            Ok(history) => Ok(history),
            Err(LoadFailure::Io(e)) => Err(e),
            Err(LoadFailure::Unreadable(parse_error)) => {
                warn!("⚠️  History file is invalid: {}", parse_error);
                self.backup_unreadable().await;
                Ok(HistoryCollection::new())
            }
        }
    }

    async fn save_history(&self, history: &HistoryCollection) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create history directory {:?}", parent))?;
        }

        let content = serde_json::to_string_pretty(history).context("Failed to serialize history")?;
        let temp_path = self.temp_path();

        fs::write(&temp_path, content)
            .await
            .with_context(|| format!("Failed to write {:?}", temp_path))?;
        fs::rename(&temp_path, &self.path)
            .await
            .with_context(|| format!("Failed to replace history file {:?}", self.path))?;

        debug!("Saved {} history entries to {:?}", history.len(), self.path);
        Ok(())
    }

    async fn clear_history(&self) -> Result<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                info!("🗑️ Cleared history file {:?}", self.path);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to remove history file {:?}", self.path)),
        }
    }
}

/// Process-local history, used by tests and dry runs
#[derive(Default)]
pub struct InMemoryHistoryRepository {
    history: RwLock<HistoryCollection>,
    saves: std::sync::atomic::AtomicUsize,
}

impl InMemoryHistoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history(history: HistoryCollection) -> Self {
        Self { history: RwLock::new(history), ..Self::default() }
    }

    /// Number of completed saves
    pub fn save_count(&self) -> usize {
        self.saves.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub async fn snapshot(&self) -> HistoryCollection {
        self.history.read().await.clone()
    }
}

#[async_trait]
impl HistoryRepository for InMemoryHistoryRepository {
    async fn load_history(&self) -> Result<HistoryCollection> {
        Ok(self.history.read().await.clone())
    }

    async fn save_history(&self, history: &HistoryCollection) -> Result<()> {
        *self.history.write().await = history.clone();
        self.saves.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }

    async fn clear_history(&self) -> Result<()> {
        self.history.write().await.clear();
        Ok(())
    }
}

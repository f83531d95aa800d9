//! History use cases on top of a [`HistoryRepository`]

use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::domain::history::{HistoryCollection, HistoryStats, UpsertOutcome};
use crate::domain::repositories::HistoryRepository;
use crate::domain::search::{SearchResult, SearchTerm};

/// How many results a merge added and how many were already stored
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeCounts {
    pub added: usize,
    pub duplicates: usize,
}

#[derive(Clone)]
pub struct HistoryStore {
    repository: Arc<dyn HistoryRepository>,
}

impl HistoryStore {
    pub fn new(repository: Arc<dyn HistoryRepository>) -> Self {
        Self { repository }
    }

    pub async fn load(&self) -> Result<HistoryCollection> {
        self.repository.load_history().await.context("Failed to load search history")
    }

    /// History a run starts from; unreadable storage is set aside instead of
    /// failing the run
    pub async fn load_for_run(&self) -> Result<HistoryCollection> {
        self.repository.recover_history().await.context("Failed to load search history")
    }

    pub async fn save(&self, history: &HistoryCollection) -> Result<()> {
        self.repository.save_history(history).await.context("Failed to save search history")
    }

    /// Merge a result into an in-memory collection by search term
    pub fn upsert(history: &mut HistoryCollection, result: SearchResult) -> UpsertOutcome {
        history.upsert(result)
    }

    pub fn average_percentage(history: &HistoryCollection) -> Option<u32> {
        history.average_percentage()
    }

    pub fn sorted_by_sell_through_desc(history: &HistoryCollection) -> Vec<SearchResult> {
        history.sorted_by_sell_through_desc()
    }

    /// Append results whose search term is not stored yet, then persist.
    /// Stored entries are never overwritten.
    pub async fn add_new(&self, results: Vec<SearchResult>) -> Result<MergeCounts> {
        let mut history = self.load().await?;
        let mut counts = MergeCounts::default();

        for result in results {
            if history.insert_if_absent(result) {
                counts.added += 1;
            } else {
                counts.duplicates += 1;
            }
        }

        if counts.added > 0 {
            self.save(&history).await?;
        }
        info!("📥 Added {} entries, skipped {} already stored", counts.added, counts.duplicates);
        Ok(counts)
    }

    /// Delete one entry and persist; false when the term was not stored
    pub async fn remove(&self, term: &SearchTerm) -> Result<bool> {
        let mut history = self.load().await?;
        if history.remove(term).is_none() {
            return Ok(false);
        }
        self.save(&history).await?;
        info!("🗑️ Removed '{}' from history", term);
        Ok(true)
    }

    /// Drop all history
    pub async fn clear(&self) -> Result<()> {
        self.repository.clear_history().await.context("Failed to clear search history")?;
        info!("🗑️ Search history cleared");
        Ok(())
    }

    pub async fn stats(&self) -> Result<HistoryStats> {
        Ok(self.load().await?.stats())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::history_repository::InMemoryHistoryRepository;
    use chrono::Utc;

    fn seeded() -> (Arc<InMemoryHistoryRepository>, HistoryStore) {
        let history: HistoryCollection = vec![
            SearchResult::new("CarA", "bumper", 3, 10, Utc::now()),
            SearchResult::new("CarB", "bumper", 0, 0, Utc::now()),
        ]
        .into();
        let repo = Arc::new(InMemoryHistoryRepository::with_history(history));
        let store = HistoryStore::new(repo.clone());
        (repo, store)
    }

    #[tokio::test]
    async fn remove_persists_and_reports_absence() {
        let (repo, store) = seeded();

        assert!(store.remove(&SearchTerm::from("CarA bumper")).await.unwrap());
        assert!(!store.remove(&SearchTerm::from("CarZ bumper")).await.unwrap());

        let remaining = repo.snapshot().await;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining.as_slice()[0].item, "CarB");
        assert_eq!(repo.save_count(), 1);
    }

    #[tokio::test]
    async fn add_new_skips_stored_and_repeated_terms() {
        let (repo, store) = seeded();
        let now = Utc::now();

        let counts = store
            .add_new(vec![
                SearchResult::from_summary(SearchTerm::from("CarA bumper"), 90, 9, now),
                SearchResult::from_summary(SearchTerm::from("CarC bumper"), 40, 4, now),
                SearchResult::from_summary(SearchTerm::from("CarC bumper"), 10, 1, now),
            ])
            .await
            .unwrap();

        assert_eq!(counts, MergeCounts { added: 1, duplicates: 2 });
        let history = repo.snapshot().await;
        assert_eq!(history.len(), 3);
        assert_eq!(history.get(&SearchTerm::from("CarA bumper")).unwrap().sell_through_percentage, 30);
        assert_eq!(history.get(&SearchTerm::from("CarC bumper")).unwrap().sell_through_percentage, 40);
    }

    #[tokio::test]
    async fn add_new_with_nothing_new_does_not_save() {
        let (repo, store) = seeded();
        let counts = store
            .add_new(vec![SearchResult::from_summary(SearchTerm::from("CarB bumper"), 5, 1, Utc::now())])
            .await
            .unwrap();

        assert_eq!(counts, MergeCounts { added: 0, duplicates: 1 });
        assert_eq!(repo.save_count(), 0);
    }

    #[tokio::test]
    async fn clear_and_stats() {
        let (_repo, store) = seeded();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.entries, 2);
        assert_eq!(stats.average_percentage, Some(15));

        store.clear().await.unwrap();
        assert_eq!(store.stats().await.unwrap().average_percentage, None);
    }

    #[test]
    fn pure_helpers_delegate_to_collection() {
        let mut history = HistoryCollection::new();
        HistoryStore::upsert(&mut history, SearchResult::new("CarA", "bumper", 5, 10, Utc::now()));
        HistoryStore::upsert(&mut history, SearchResult::new("CarB", "bumper", 9, 10, Utc::now()));

        assert_eq!(HistoryStore::average_percentage(&history), Some(70));
        assert_eq!(HistoryStore::sorted_by_sell_through_desc(&history)[0].item, "CarB");
    }
}

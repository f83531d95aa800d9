//! Deduplicated search history and its aggregate statistics

use serde::{Deserialize, Serialize};

use crate::domain::search::{SearchResult, SearchTerm};

/// What an upsert did to the collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Replaced { previous: SearchResult },
}

/// Ordered search results, unique by search term.
///
/// Building a collection from any sequence (including a deserialized file)
/// goes through [`HistoryCollection::upsert`], so a later duplicate replaces
/// the earlier entry in the earlier entry's position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<SearchResult>", into = "Vec<SearchResult>")]
pub struct HistoryCollection {
    entries: Vec<SearchResult>,
}

impl HistoryCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the entry with the same search term in place, or append
    pub fn upsert(&mut self, result: SearchResult) -> UpsertOutcome {
        match self.position(&result.search_term) {
            Some(index) => {
                let previous = std::mem::replace(&mut self.entries[index], result);
                UpsertOutcome::Replaced { previous }
            }
            None => {
                self.entries.push(result);
                UpsertOutcome::Inserted
            }
        }
    }

    /// Append only when the search term is not stored yet; stored entries win
    pub fn insert_if_absent(&mut self, result: SearchResult) -> bool {
        if self.contains(&result.search_term) {
            return false;
        }
        self.entries.push(result);
        true
    }

    /// Consuming form of [`Self::upsert`]
    #[must_use]
    pub fn with_upserted(mut self, result: SearchResult) -> Self {
        self.upsert(result);
        self
    }

    pub fn get(&self, term: &SearchTerm) -> Option<&SearchResult> {
        self.entries.iter().find(|entry| &entry.search_term == term)
    }

    pub fn contains(&self, term: &SearchTerm) -> bool {
        self.position(term).is_some()
    }

    /// Remove the entry for a search term, keeping the order of the rest
    pub fn remove(&mut self, term: &SearchTerm) -> Option<SearchResult> {
        self.position(term).map(|index| self.entries.remove(index))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SearchResult> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[SearchResult] {
        &self.entries
    }

    /// Mean sell-through percentage rounded half up, `None` when empty
    pub fn average_percentage(&self) -> Option<u32> {
        if self.entries.is_empty() {
            return None;
        }
        let count = self.entries.len() as u64;
        let sum: u64 = self.entries.iter().map(|e| u64::from(e.sell_through_percentage)).sum();
        let rounded = (2 * sum + count) / (2 * count);
        Some(u32::try_from(rounded).unwrap_or(u32::MAX))
    }

    /// Entries by sell-through percentage, highest first; ties keep input order
    pub fn sorted_by_sell_through_desc(&self) -> Vec<SearchResult> {
        let mut ranked = self.entries.clone();
        ranked.sort_by(|a, b| b.sell_through_percentage.cmp(&a.sell_through_percentage));
        ranked
    }

    pub fn stats(&self) -> HistoryStats {
        HistoryStats {
            entries: self.entries.len(),
            average_percentage: self.average_percentage(),
            total_sold: self.entries.iter().map(|e| e.sold_count).sum(),
            total_live: self.entries.iter().map(|e| e.live_count).sum(),
        }
    }

    fn position(&self, term: &SearchTerm) -> Option<usize> {
        self.entries.iter().position(|entry| &entry.search_term == term)
    }
}

impl FromIterator<SearchResult> for HistoryCollection {
    fn from_iter<I: IntoIterator<Item = SearchResult>>(iter: I) -> Self {
        let mut collection = Self::new();
        for result in iter {
            collection.upsert(result);
        }
        collection
    }
}

impl From<Vec<SearchResult>> for HistoryCollection {
    fn from(results: Vec<SearchResult>) -> Self {
        results.into_iter().collect()
    }
}

impl From<HistoryCollection> for Vec<SearchResult> {
    fn from(collection: HistoryCollection) -> Self {
        collection.entries
    }
}

impl<'a> IntoIterator for &'a HistoryCollection {
    type Item = &'a SearchResult;
    type IntoIter = std::slice::Iter<'a, SearchResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Aggregate view of a history collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryStats {
    pub entries: usize,
    pub average_percentage: Option<u32>,
    pub total_sold: u64,
    pub total_live: u64,
}

//! Test utilities for the sell-through checker
//!
//! A scripted page session and a ready-wired orchestrator over in-memory
//! history, so run scenarios need no browser, network or disk.

use anyhow::{Result, bail};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::application::{HistoryStore, PageCountPoller, SearchOrchestrator};
use crate::domain::count::{CountExtractor, ExtractionMiss, ExtractionResult};
use crate::domain::errors::SessionError;
use crate::domain::history::HistoryCollection;
use crate::domain::repositories::HistoryRepository;
use crate::domain::search::{SearchConfig, SearchTerm};
use crate::domain::session::PageSession;
use crate::infrastructure::history_repository::InMemoryHistoryRepository;
use crate::infrastructure::retry_manager::RetryPolicy;

/// Page session whose pages are count texts keyed by URL.
///
/// A URL without a scripted count yields `HeadingNotFound` on every read.
#[derive(Default)]
pub struct FakePageSession {
    pages: HashMap<String, String>,
    failing_urls: Vec<String>,
    failing_execute_urls: Vec<String>,
    cancel_on: Option<(String, CancellationToken)>,
    current: Mutex<Option<String>>,
    navigations: Mutex<Vec<String>>,
}

impl FakePageSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the sold and live count texts for one item
    #[must_use]
    pub fn with_counts(mut self, config: &SearchConfig, item: &str, qualifier: &str, sold: &str, live: &str) -> Self {
        let term = SearchTerm::new(item, qualifier);
        self.pages.insert(config.sold_url(&term), sold.to_string());
        self.pages.insert(config.live_url(&term), live.to_string());
        self
    }

    /// Navigation to this URL fails
    #[must_use]
    pub fn failing_on(mut self, url: String) -> Self {
        self.failing_urls.push(url);
        self
    }

    /// Reading the page loaded from this URL fails
    #[must_use]
    pub fn failing_execute_on(mut self, url: String) -> Self {
        self.failing_execute_urls.push(url);
        self
    }

    /// Cancel `token` when this URL is navigated to
    #[must_use]
    pub fn cancelling_on(mut self, url: String, token: CancellationToken) -> Self {
        self.cancel_on = Some((url, token));
        self
    }

    pub fn navigations(&self) -> Vec<String> {
        self.navigations.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageSession for FakePageSession {
    async fn navigate(&self, url: &str) -> Result<(), SessionError> {
        self.navigations.lock().unwrap().push(url.to_string());

        if self.failing_urls.iter().any(|failing| failing == url) {
            return Err(SessionError::navigation(url, "connection reset"));
        }
        if let Some((cancel_url, token)) = &self.cancel_on {
            if cancel_url == url {
                token.cancel();
            }
        }

        *self.current.lock().unwrap() = Some(url.to_string());
        Ok(())
    }

    async fn execute(&self, extractor: &dyn CountExtractor) -> Result<ExtractionResult, SessionError> {
        let current = self.current.lock().unwrap().clone();
        let url = current.ok_or_else(|| SessionError::execution("no page loaded"))?;
        if self.failing_execute_urls.contains(&url) {
            return Err(SessionError::execution("browser tab crashed"));
        }
        Ok(match self.pages.get(&url) {
            Some(text) => extractor.extract(text),
            None => Err(ExtractionMiss::HeadingNotFound),
        })
    }
}

/// Treats the whole page as the count text
pub struct PassThroughExtractor;

impl CountExtractor for PassThroughExtractor {
    fn extract(&self, page_html: &str) -> ExtractionResult {
        Ok(page_html.to_string())
    }
}

pub fn ebay_config(items: &[&str]) -> SearchConfig {
    SearchConfig::new(
        "https://www.ebay.com/sch/i.html?",
        "LH_Sold=1&LH_Complete=1",
        "LH_ItemCondition=1000",
        items.iter().map(|item| (*item).to_string()).collect(),
    )
}

/// In-memory history whose n-th save (1-based) fails
pub struct FailingSaveRepository {
    inner: InMemoryHistoryRepository,
    fail_on_save: Option<usize>,
    save_attempts: AtomicUsize,
}

impl FailingSaveRepository {
    pub fn new(history: HistoryCollection, fail_on_save: Option<usize>) -> Self {
        Self {
            inner: InMemoryHistoryRepository::with_history(history),
            fail_on_save,
            save_attempts: AtomicUsize::new(0),
        }
    }

    /// Completed saves
    pub fn save_count(&self) -> usize {
        self.inner.save_count()
    }

    pub async fn snapshot(&self) -> HistoryCollection {
        self.inner.snapshot().await
    }
}

#[async_trait]
impl HistoryRepository for FailingSaveRepository {
    async fn load_history(&self) -> Result<HistoryCollection> {
        self.inner.load_history().await
    }

    async fn save_history(&self, history: &HistoryCollection) -> Result<()> {
        let attempt = self.save_attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on_save == Some(attempt) {
            bail!("disk full");
        }
        self.inner.save_history(history).await
    }

    async fn clear_history(&self) -> Result<()> {
        self.inner.clear_history().await
    }
}

/// Orchestrator over a fake session and in-memory history
pub struct TestContext {
    pub session: Arc<FakePageSession>,
    pub repository: Arc<FailingSaveRepository>,
    pub orchestrator: SearchOrchestrator,
}

impl TestContext {
    pub fn new(session: FakePageSession) -> Self {
        Self::with_history(session, HistoryCollection::new())
    }

    pub fn with_history(session: FakePageSession, history: HistoryCollection) -> Self {
        Self::with_repository(session, FailingSaveRepository::new(history, None))
    }

    /// Context whose `save_number`-th save fails
    pub fn failing_save(session: FakePageSession, save_number: usize) -> Self {
        Self::with_repository(session, FailingSaveRepository::new(HistoryCollection::new(), Some(save_number)))
    }

    fn with_repository(session: FakePageSession, repository: FailingSaveRepository) -> Self {
        let session = Arc::new(session);
        let repository = Arc::new(repository);
        let poller = PageCountPoller::new(Arc::new(PassThroughExtractor), RetryPolicy::default());
        let orchestrator = SearchOrchestrator::new(
            session.clone(),
            poller,
            HistoryStore::new(repository.clone()),
        );
        Self { session, repository, orchestrator }
    }

    pub async fn history(&self) -> HistoryCollection {
        self.repository.snapshot().await
    }
}

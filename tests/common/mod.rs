//! Shared fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use tempfile::TempDir;

use sell_through_lib::commands::AppContext;
use sell_through_lib::domain::count::{CountExtractor, ExtractionResult};
use sell_through_lib::domain::errors::SessionError;
use sell_through_lib::domain::search::{SearchConfig, SearchTerm};
use sell_through_lib::domain::session::PageSession;
use sell_through_lib::infrastructure::config::ConfigManager;

/// Results page the way the marketplace renders its count heading
pub fn results_page(count: &str) -> String {
    format!(
        r#"<html><body><div class="srp-controls">
<h1 class="srp-controls__count-heading"><span class="BOLD">{count}</span> <span>results for query</span></h1>
</div></body></html>"#
    )
}

/// Page still loading: no count heading yet
pub fn loading_page() -> String {
    "<html><body><div class=\"srp-river\">Loading...</div></body></html>".to_string()
}

/// Serves fixed HTML per URL; unknown URLs serve a loading page
#[derive(Default)]
pub struct StaticHtmlSession {
    pages: HashMap<String, String>,
    current: Mutex<Option<String>>,
}

impl StaticHtmlSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(mut self, config: &SearchConfig, item: &str, qualifier: &str, sold: &str, live: &str) -> Self {
        let term = SearchTerm::new(item, qualifier);
        self.pages.insert(config.sold_url(&term), results_page(sold));
        self.pages.insert(config.live_url(&term), results_page(live));
        self
    }
}

#[async_trait]
impl PageSession for StaticHtmlSession {
    async fn navigate(&self, url: &str) -> Result<(), SessionError> {
        *self.current.lock().unwrap() = Some(url.to_string());
        Ok(())
    }

    async fn execute(&self, extractor: &dyn CountExtractor) -> Result<ExtractionResult, SessionError> {
        let current = self.current.lock().unwrap().clone();
        let url = current.ok_or(SessionError::Closed)?;
        let html = self.pages.get(&url).cloned().unwrap_or_else(loading_page);
        Ok(extractor.extract(&html))
    }
}

/// App context whose config and data live in a temp directory, with fast polling
pub async fn temp_context() -> (TempDir, AppContext) {
    let dir = TempDir::new().unwrap();
    let manager = ConfigManager::with_path(dir.path().join("config.json"));
    let mut ctx = AppContext::load(manager).await.unwrap();

    ctx.config.storage.data_dir = dir.path().join("data").to_string_lossy().into_owned();
    ctx.config.polling.max_attempts = 3;
    ctx.config.polling.delay_ms = 1;

    (dir, ctx)
}

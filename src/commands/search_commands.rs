//! Starting a search run

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::application::{PageCountPoller, RunReport, SearchOrchestrator, TracingProgressSink, validate_run_input};
use crate::commands::AppContext;
use crate::domain::search::SearchConfig;
use crate::domain::session::PageSession;
use crate::infrastructure::config::SessionDriver;
use crate::infrastructure::count_extractor::HeadingCountExtractor;
use crate::infrastructure::http_client::HttpPageSession;
use crate::infrastructure::items_loader::{SearchInput, load_search_input};
use crate::infrastructure::retry_manager::RetryPolicy;
use crate::infrastructure::webdriver_session::WebDriverSession;

/// Everything a run needs beyond the app config
#[derive(Debug, Clone, Default)]
pub struct RunSearchRequest {
    pub qualifier: String,
    /// Items file; its URL overrides apply on top of the app config
    pub items_file: Option<PathBuf>,
    /// Items given directly, appended after the file's items
    pub items: Vec<String>,
    /// Overrides `session.driver`
    pub driver: Option<SessionDriver>,
}

/// Search config for a request: app settings, then the items file, then inline items
pub async fn build_search_config(ctx: &AppContext, request: &RunSearchRequest) -> Result<SearchConfig> {
    let mut search = ctx.config.search_config(Vec::new());

    let mut input = match &request.items_file {
        Some(path) => load_search_input(path).await?,
        None => SearchInput::default(),
    };
    input.items.extend(SearchInput::from_items(request.items.clone()).items);
    input.apply_to(&mut search);

    Ok(search)
}

async fn open_session(ctx: &AppContext, driver: SessionDriver) -> Result<Arc<dyn PageSession>> {
    info!("🌐 Opening {} page session", driver);
    let session: Arc<dyn PageSession> = match driver {
        SessionDriver::Webdriver => Arc::new(
            WebDriverSession::connect(&ctx.config.session)
                .await
                .context("Failed to start WebDriver session (is chromedriver/geckodriver running?)")?,
        ),
        SessionDriver::Http => Arc::new(HttpPageSession::new(&ctx.config.session)?),
    };
    Ok(session)
}

/// Run a search with a page session chosen from config
pub async fn run_search(ctx: &AppContext, request: RunSearchRequest, cancel: CancellationToken) -> Result<RunReport> {
    ctx.config.validate()?;
    let search = build_search_config(ctx, &request).await?;
    validate_run_input(&search, &request.qualifier)?;

    let driver = request.driver.unwrap_or(ctx.config.session.driver);
    let session = open_session(ctx, driver).await?;

    let outcome = run_search_with_session(ctx, &search, &request.qualifier, Arc::clone(&session), cancel).await;

    if let Err(e) = session.close().await {
        warn!("⚠️  Page session did not close cleanly: {}", e);
    }
    outcome
}

/// Run a search over an already open page session
pub async fn run_search_with_session(
    ctx: &AppContext,
    search: &SearchConfig,
    qualifier: &str,
    session: Arc<dyn PageSession>,
    cancel: CancellationToken,
) -> Result<RunReport> {
    let extractor = HeadingCountExtractor::try_new(&ctx.config.advanced.count_selector)?;
    let poller = PageCountPoller::new(Arc::new(extractor), RetryPolicy::from_config(&ctx.config.polling));

    let orchestrator = SearchOrchestrator::new(session, poller, ctx.history_store()?)
        .with_keep_previous_on_exhausted(ctx.config.polling.keep_previous_on_exhausted);

    let report = orchestrator.run(search, qualifier, cancel, &TracingProgressSink).await?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::ConfigurationError;
    use crate::infrastructure::config::ConfigManager;
    use tempfile::TempDir;

    async fn context(dir: &TempDir) -> AppContext {
        let mut ctx = AppContext::load(ConfigManager::with_path(dir.path().join("config.json"))).await.unwrap();
        // nothing listens here; reaching the driver would fail with a connection error
        ctx.config.session.webdriver_url = "http://127.0.0.1:9".to_string();
        ctx.config.storage.data_dir = dir.path().to_string_lossy().into_owned();
        ctx
    }

    #[tokio::test]
    async fn invalid_request_is_rejected_before_a_session_opens() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir).await;

        let no_items = RunSearchRequest { qualifier: "bumper".into(), ..Default::default() };
        let err = run_search(&ctx, no_items, CancellationToken::new()).await.unwrap_err();
        assert_eq!(err.downcast_ref::<ConfigurationError>(), Some(&ConfigurationError::NoItems));

        let blank = RunSearchRequest { qualifier: "  ".into(), items: vec!["CarA".into()], ..Default::default() };
        let err = run_search(&ctx, blank, CancellationToken::new()).await.unwrap_err();
        assert_eq!(err.downcast_ref::<ConfigurationError>(), Some(&ConfigurationError::EmptyQualifier));
    }

    #[tokio::test]
    async fn inline_items_follow_file_items() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir).await;
        let items_file = dir.path().join("items.txt");
        std::fs::write(&items_file, "CarA\n\nCarB\n").unwrap();

        let request = RunSearchRequest {
            qualifier: "bumper".into(),
            items_file: Some(items_file),
            items: vec![" CarC ".into()],
            driver: None,
        };
        let search = build_search_config(&ctx, &request).await.unwrap();

        assert_eq!(search.items, vec!["CarA", "CarB", "CarC"]);
        assert_eq!(search.keyword_param, "_nkw");
    }
}

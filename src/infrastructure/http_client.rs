//! Rate-limited HTTP client and the page session built on it
//!
//! The HTTP session reads the server-rendered search page without a browser.
//! Navigation fetches and stores the body; execution runs the extractor on
//! the stored body.

use anyhow::{Context, Result};
use async_trait::async_trait;
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, direct::NotKeyed},
};
use reqwest::{
    Client,
    header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, USER_AGENT},
};
use std::num::NonZeroU32;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::domain::count::{CountExtractor, ExtractionResult};
use crate::domain::errors::SessionError;
use crate::domain::session::PageSession;
use crate::infrastructure::config::SessionConfig;

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_requests_per_second: u32,
}

impl From<&SessionConfig> for HttpClientConfig {
    fn from(config: &SessionConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            timeout_seconds: config.request_timeout_seconds,
            max_requests_per_second: config.max_requests_per_second,
        }
    }
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self::from(&SessionConfig::default())
    }
}

/// HTTP client with rate limiting
pub struct HttpClient {
    client: Client,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
}

impl HttpClient {
    /// Create a new HTTP client with the given configuration
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_str(&config.user_agent).context("Invalid user agent")?);
        headers.insert(ACCEPT, HeaderValue::from_static("text/html,application/xhtml+xml"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(headers)
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .context("Failed to create HTTP client")?;

        let quota = Quota::per_second(
            NonZeroU32::new(config.max_requests_per_second).context("Rate limit must be greater than 0")?,
        );
        let rate_limiter = RateLimiter::direct(quota);

        Ok(Self { client, rate_limiter })
    }

    /// Fetch a URL's body; transport failures are errors, HTTP error statuses are not
    pub async fn fetch(&self, url: &str) -> Result<String> {
        self.rate_limiter.until_ready().await;

        tracing::info!("Fetching URL: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch URL: {url}"))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read response body from: {url}"))?;

        if status.is_success() {
            tracing::debug!("Successfully fetched: {} ({} chars)", url, body.len());
        } else {
            tracing::warn!("⚠️  {} answered {}", url, status);
        }

        Ok(body)
    }
}

/// Page session over plain HTTP
pub struct HttpPageSession {
    client: HttpClient,
    /// Body of the last fetched page
    current_page: Mutex<Option<String>>,
}

impl HttpPageSession {
    pub fn new(config: &SessionConfig) -> Result<Self> {
        Ok(Self::with_client(HttpClient::new(HttpClientConfig::from(config))?))
    }

    pub fn with_client(client: HttpClient) -> Self {
        Self { client, current_page: Mutex::new(None) }
    }
}

#[async_trait]
impl PageSession for HttpPageSession {
    async fn navigate(&self, url: &str) -> Result<(), SessionError> {
        let page = self
            .client
            .fetch(url)
            .await
            .map_err(|e| SessionError::navigation(url, format!("{e:#}")))?;
        *self.current_page.lock().await = Some(page);
        Ok(())
    }

    async fn execute(&self, extractor: &dyn CountExtractor) -> Result<ExtractionResult, SessionError> {
        let guard = self.current_page.lock().await;
        let page = guard
            .as_ref()
            .ok_or_else(|| SessionError::execution("no page has been loaded"))?;
        Ok(extractor.extract(page))
    }

    async fn close(&self) -> Result<(), SessionError> {
        *self.current_page.lock().await = None;
        Ok(())
    }
}

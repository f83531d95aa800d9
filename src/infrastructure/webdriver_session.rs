//! Browser page session through a WebDriver server (fantoccini)

use async_trait::async_trait;
use fantoccini::{Client, ClientBuilder};
use serde_json::{Map, Value, json};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::domain::count::{CountExtractor, ExtractionResult};
use crate::domain::errors::SessionError;
use crate::domain::session::PageSession;
use crate::infrastructure::config::SessionConfig;

/// A real browser driven over WebDriver.
///
/// `execute` reads the rendered page source, so counts filled in by
/// client-side scripts are visible once the page settles.
pub struct WebDriverSession {
    client: Mutex<Option<Client>>,
}

/// Capabilities for a Chrome or Firefox session
fn capabilities(config: &SessionConfig) -> Map<String, Value> {
    let mut args = vec![format!("--user-agent={}", config.user_agent)];
    if config.headless {
        args.push("--headless".to_string());
    }

    let mut caps = Map::new();
    caps.insert("goog:chromeOptions".to_string(), json!({ "args": args }));
    let firefox_args: Vec<&str> = if config.headless { vec!["-headless"] } else { vec![] };
    caps.insert("moz:firefoxOptions".to_string(), json!({ "args": firefox_args }));
    caps
}

impl WebDriverSession {
    /// Connect to the WebDriver endpoint from the session config
    pub async fn connect(config: &SessionConfig) -> Result<Self, SessionError> {
        info!("🔗 Connecting to WebDriver at {}", config.webdriver_url);

        let client = ClientBuilder::native()
            .capabilities(capabilities(config))
            .connect(&config.webdriver_url)
            .await
            .map_err(|e| SessionError::navigation(&config.webdriver_url, e))?;

        info!("✅ WebDriver session connected");
        Ok(Self { client: Mutex::new(Some(client)) })
    }
}

#[async_trait]
impl PageSession for WebDriverSession {
    async fn navigate(&self, url: &str) -> Result<(), SessionError> {
        let guard = self.client.lock().await;
        let client = guard.as_ref().ok_or(SessionError::Closed)?;
        client.goto(url).await.map_err(|e| SessionError::navigation(url, e))
    }

    async fn execute(&self, extractor: &dyn CountExtractor) -> Result<ExtractionResult, SessionError> {
        let guard = self.client.lock().await;
        let client = guard.as_ref().ok_or(SessionError::Closed)?;
        let source = client.source().await.map_err(SessionError::execution)?;
        Ok(extractor.extract(&source))
    }

    async fn close(&self) -> Result<(), SessionError> {
        let Some(client) = self.client.lock().await.take() else {
            return Ok(());
        };
        info!("Closing WebDriver session");
        client.close().await.map_err(|e| {
            warn!("⚠️  WebDriver session did not close cleanly: {}", e);
            SessionError::execution(e)
        })
    }
}

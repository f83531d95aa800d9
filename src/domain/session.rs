//! Browsing session the orchestrator drives

use async_trait::async_trait;

use crate::domain::count::{CountExtractor, ExtractionResult};
use crate::domain::errors::SessionError;

/// One logical browsing session: navigate to a page, then read from it.
///
/// `execute` runs the extractor against whatever page the last `navigate`
/// loaded. An `Err` is an infrastructure failure and ends the run; a missing
/// count element is an `Ok(Err(ExtractionMiss))`.
#[async_trait]
pub trait PageSession: Send + Sync {
    async fn navigate(&self, url: &str) -> Result<(), SessionError>;

    async fn execute(&self, extractor: &dyn CountExtractor) -> Result<ExtractionResult, SessionError>;

    /// Release the underlying browser or connection
    async fn close(&self) -> Result<(), SessionError> {
        Ok(())
    }
}

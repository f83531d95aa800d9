//! Polling a navigated page for its listing count

use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::count::{CountExtractor, parse_count};
use crate::domain::errors::SessionError;
use crate::domain::session::PageSession;
use crate::infrastructure::retry_manager::{Attempt, RetryOutcome, RetryPolicy, retry_with_delay};

/// What one poll of a page produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountReading {
    Observed { count: u64, attempts: u32 },
    /// Every attempt missed; the count degrades to zero
    Exhausted { attempts: u32 },
}

impl CountReading {
    pub const fn count(self) -> u64 {
        match self {
            Self::Observed { count, .. } => count,
            Self::Exhausted { .. } => 0,
        }
    }

    pub const fn is_exhausted(self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }

    pub const fn attempts(self) -> u32 {
        match self {
            Self::Observed { attempts, .. } | Self::Exhausted { attempts } => attempts,
        }
    }
}

/// Repeatedly runs a [`CountExtractor`] on the current page until a count parses
#[derive(Clone)]
pub struct PageCountPoller {
    extractor: Arc<dyn CountExtractor>,
    policy: RetryPolicy,
}

impl PageCountPoller {
    pub fn new(extractor: Arc<dyn CountExtractor>, policy: RetryPolicy) -> Self {
        Self { extractor, policy }
    }

    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Count on the current page, 0 when every attempt missed
    pub async fn poll(&self, session: &dyn PageSession, label: &str) -> Result<u64, SessionError> {
        Ok(self.poll_reading(session, label).await?.count())
    }

    /// Poll the current page. Misses and unparsable text are retried;
    /// session failures abort at once.
    pub async fn poll_reading(&self, session: &dyn PageSession, label: &str) -> Result<CountReading, SessionError> {
        let extractor = self.extractor.as_ref();

        let outcome = retry_with_delay::<_, SessionError, _, _>(&self.policy, |attempt| async move {
            match session.execute(extractor).await? {
                Ok(text) => match parse_count(&text) {
                    Ok(count) => Ok(Attempt::Success(count)),
                    Err(malformed) => {
                        debug!("{} attempt {}: {}", label, attempt, malformed);
                        Ok(Attempt::Retry(malformed.to_string()))
                    }
                },
                Err(miss) => {
                    debug!("{} attempt {}: {}", label, attempt, miss);
                    Ok(Attempt::Retry(miss.to_string()))
                }
            }
        })
        .await?;

        Ok(match outcome {
            RetryOutcome::Succeeded { value, attempts } => {
                debug!("{}: {} after {} attempt(s)", label, value, attempts);
                CountReading::Observed { count: value, attempts }
            }
            RetryOutcome::Exhausted { attempts, last_failure } => {
                warn!(
                    "⚠️  {}: no count after {} attempts ({}); using 0",
                    label,
                    attempts,
                    last_failure.as_deref().unwrap_or("no attempt made")
                );
                CountReading::Exhausted { attempts }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::count::{ExtractionMiss, ExtractionResult};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Returns scripted extraction results, then misses
    struct ScriptedSession {
        script: Mutex<Vec<Result<ExtractionResult, SessionError>>>,
        calls: Mutex<u32>,
    }

    impl ScriptedSession {
        fn new(mut script: Vec<Result<ExtractionResult, SessionError>>) -> Self {
            script.reverse();
            Self { script: Mutex::new(script), calls: Mutex::new(0) }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl PageSession for ScriptedSession {
        async fn navigate(&self, _url: &str) -> Result<(), SessionError> {
            Ok(())
        }

        async fn execute(&self, _extractor: &dyn CountExtractor) -> Result<ExtractionResult, SessionError> {
            *self.calls.lock().unwrap() += 1;
            self.script.lock().unwrap().pop().unwrap_or(Ok(Err(ExtractionMiss::HeadingNotFound)))
        }
    }

    struct Unused;

    impl CountExtractor for Unused {
        fn extract(&self, _page_html: &str) -> ExtractionResult {
            Err(ExtractionMiss::HeadingNotFound)
        }
    }

    fn poller() -> PageCountPoller {
        PageCountPoller::new(Arc::new(Unused), RetryPolicy::default())
    }

    #[tokio::test(start_paused = true)]
    async fn first_parsable_text_wins() {
        let session = ScriptedSession::new(vec![
            Ok(Err(ExtractionMiss::HeadingNotFound)),
            Ok(Ok("abc".to_string())),
            Ok(Ok("1234".to_string())),
        ]);

        let reading = poller().poll_reading(&session, "sold").await.unwrap();

        assert_eq!(reading, CountReading::Observed { count: 1234, attempts: 3 });
        assert_eq!(session.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_poll_yields_zero_after_ten_attempts_and_fifteen_seconds() {
        let session = ScriptedSession::new(vec![]);
        let start = tokio::time::Instant::now();

        let reading = poller().poll_reading(&session, "live").await.unwrap();

        assert_eq!(reading, CountReading::Exhausted { attempts: 10 });
        assert_eq!(reading.count(), 0);
        assert_eq!(session.calls(), 10);
        assert_eq!(start.elapsed(), Duration::from_millis(15_000));
    }

    #[tokio::test(start_paused = true)]
    async fn session_error_aborts_polling() {
        let session = ScriptedSession::new(vec![Ok(Err(ExtractionMiss::FirstChildNotFound)), Err(SessionError::Closed)]);

        let result = poller().poll(&session, "sold").await;

        assert_eq!(result, Err(SessionError::Closed));
        assert_eq!(session.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_text_is_retried_not_zero() {
        let session = ScriptedSession::new(vec![Ok(Ok(String::new())), Ok(Ok("0".to_string()))]);

        let reading = poller().poll_reading(&session, "sold").await.unwrap();

        assert_eq!(reading, CountReading::Observed { count: 0, attempts: 2 });
        assert!(!reading.is_exhausted());
    }
}

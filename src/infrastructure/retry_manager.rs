//! Bounded fixed-delay retry
//!
//! [`retry_with_delay`] sleeps before every attempt (including the first, so a
//! freshly navigated page gets time to render) and stops at the first success
//! or after `max_attempts`. An attempt can ask for another try with
//! [`Attempt::Retry`] or abort the whole loop by returning `Err`.

use std::future::Future;
use std::time::Duration;
use tracing::debug;

use crate::infrastructure::config::PollingConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, delay_ms: u64) -> Self {
        Self { max_attempts, delay: Duration::from_millis(delay_ms) }
    }

    pub const fn from_config(config: &PollingConfig) -> Self {
        Self::new(config.max_attempts, config.delay_ms)
    }

    /// Upper bound on time spent sleeping for one exhausted loop
    pub fn worst_case_wait(&self) -> Duration {
        self.delay.saturating_mul(self.max_attempts)
    }
}

impl Default for RetryPolicy {
    /// 10 attempts, 1.5 s apart
    fn default() -> Self {
        Self::new(10, 1500)
    }
}

/// Result of a single attempt that did not fail fatally
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt<T> {
    Success(T),
    /// Not there yet; the string says why
    Retry(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryOutcome<T> {
    Succeeded { value: T, attempts: u32 },
    Exhausted { attempts: u32, last_failure: Option<String> },
}

impl<T> RetryOutcome<T> {
    pub const fn attempts(&self) -> u32 {
        match self {
            Self::Succeeded { attempts, .. } | Self::Exhausted { attempts, .. } => *attempts,
        }
    }

    pub fn value(self) -> Option<T> {
        match self {
            Self::Succeeded { value, .. } => Some(value),
            Self::Exhausted { .. } => None,
        }
    }
}

/// Run `attempt` until it succeeds or the policy is used up.
///
/// The closure receives the 1-based attempt number. `Err` from the closure
/// is returned as-is without further attempts.
pub async fn retry_with_delay<T, E, F, Fut>(policy: &RetryPolicy, mut attempt: F) -> Result<RetryOutcome<T>, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Attempt<T>, E>>,
{
    let mut last_failure = None;

    for number in 1..=policy.max_attempts {
        tokio::time::sleep(policy.delay).await;

        match attempt(number).await? {
            Attempt::Success(value) => {
                return Ok(RetryOutcome::Succeeded { value, attempts: number });
            }
            Attempt::Retry(reason) => {
                debug!("🔄 Attempt {}/{} not ready: {}", number, policy.max_attempts, reason);
                last_failure = Some(reason);
            }
        }
    }

    Ok(RetryOutcome::Exhausted { attempts: policy.max_attempts, last_failure })
}

//! Search run orchestration
//!
//! One run walks the configured items in order. For each item it loads the
//! sold and live result pages, polls both for a count, merges the result into
//! the history and saves the history before moving on. Cancellation is
//! observed only between items, so an item that has started always finishes
//! and is persisted.

use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::application::history_store::HistoryStore;
use crate::application::poller::{CountReading, PageCountPoller};
use crate::application::progress::ProgressSink;
use crate::domain::errors::{ConfigurationError, RunError, SessionError};
use crate::domain::events::{HistorySnapshot, ProgressEvent, RunStatus};
use crate::domain::history::HistoryCollection;
use crate::domain::search::{SearchConfig, SearchResult, SearchTerm};
use crate::domain::session::PageSession;

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub run_id: Uuid,
    pub status: RunStatus,
    /// Items whose result was persisted during this run
    pub processed: usize,
    pub total: usize,
    /// Average over the whole persisted history at the end of the run
    pub average_percentage: Option<u32>,
    pub failure: Option<String>,
}

/// Counts read for one item
struct ItemReadings {
    sold: CountReading,
    live: CountReading,
}

/// Check that a run can start with this input
pub fn validate_run_input(config: &SearchConfig, qualifier: &str) -> Result<(), ConfigurationError> {
    if config.items.is_empty() {
        return Err(ConfigurationError::NoItems);
    }
    if qualifier.trim().is_empty() {
        return Err(ConfigurationError::EmptyQualifier);
    }
    url::Url::parse(&config.base_url).map_err(|e| ConfigurationError::InvalidBaseUrl {
        url: config.base_url.clone(),
        reason: e.to_string(),
    })?;
    Ok(())
}

fn snapshot(history: &HistoryCollection) -> HistorySnapshot {
    HistorySnapshot {
        average_percentage: history.average_percentage(),
        history_len: history.len(),
        ranked: history.sorted_by_sell_through_desc(),
    }
}

/// Holds the Running status for one run. Dropped without
/// [`finish`](Self::finish), as when the run future is abandoned, it moves the
/// status to Stopped so later runs can start.
struct RunGuard<'a> {
    status_tx: &'a watch::Sender<RunStatus>,
    finished: bool,
}

impl RunGuard<'_> {
    fn finish(mut self, status: RunStatus) {
        self.finished = true;
        self.status_tx.send_replace(status);
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            warn!("⚠️  Run abandoned before it finished; marking it stopped");
            self.status_tx.send_replace(RunStatus::Stopped);
        }
    }
}

pub struct SearchOrchestrator {
    session: Arc<dyn PageSession>,
    poller: PageCountPoller,
    store: HistoryStore,
    keep_previous_on_exhausted: bool,
    status_tx: watch::Sender<RunStatus>,
}

impl SearchOrchestrator {
    pub fn new(session: Arc<dyn PageSession>, poller: PageCountPoller, store: HistoryStore) -> Self {
        let (status_tx, _) = watch::channel(RunStatus::Idle);
        Self { session, poller, store, keep_previous_on_exhausted: false, status_tx }
    }

    /// Keep a stored entry instead of overwriting it with a result whose
    /// counts came from an exhausted poll
    #[must_use]
    pub const fn with_keep_previous_on_exhausted(mut self, keep: bool) -> Self {
        self.keep_previous_on_exhausted = keep;
        self
    }

    pub fn status(&self) -> RunStatus {
        *self.status_tx.borrow()
    }

    /// Live view of the run status
    pub fn subscribe_status(&self) -> watch::Receiver<RunStatus> {
        self.status_tx.subscribe()
    }

    pub const fn store(&self) -> &HistoryStore {
        &self.store
    }

    /// Move to Running unless a run is already in flight
    fn try_begin(&self) -> Option<RunGuard<'_>> {
        let started = self.status_tx.send_if_modified(|status| {
            if status.is_running() {
                false
            } else {
                *status = RunStatus::Running;
                true
            }
        });
        started.then_some(RunGuard { status_tx: &self.status_tx, finished: false })
    }

    /// Run the search loop over every item in `config`.
    ///
    /// Returns `Err` only when the run could not start. Session and
    /// persistence failures end the run in [`RunStatus::Failed`] and are
    /// reported through the returned [`RunReport`].
    pub async fn run(
        &self,
        config: &SearchConfig,
        qualifier: &str,
        cancel: CancellationToken,
        sink: &dyn ProgressSink,
    ) -> Result<RunReport, RunError> {
        validate_run_input(config, qualifier)?;
        let guard = self.try_begin().ok_or(RunError::AlreadyRunning)?;

        let qualifier = qualifier.trim();
        let run_id = Uuid::new_v4();
        let total = config.items.len();
        let mut report = RunReport {
            run_id,
            status: RunStatus::Running,
            processed: 0,
            total,
            average_percentage: None,
            failure: None,
        };

        info!(%run_id, "🚀 Starting sell-through run: {} items, qualifier '{}'", total, qualifier);
        sink.emit(&ProgressEvent::Started { run_id, total });

        let mut history = match self.store.load_for_run().await {
            Ok(history) => history,
            Err(e) => return Ok(Self::fail(guard, report, format!("{e:#}"), sink)),
        };
        report.average_percentage = history.average_percentage();

        for (index, item) in config.items.iter().enumerate() {
            if cancel.is_cancelled() {
                info!(%run_id, "🛑 Run cancelled after {}/{} items", index, total);
                report.status = RunStatus::Stopped;
                sink.emit(&ProgressEvent::Stopped { run_id, checked: index, total });
                guard.finish(RunStatus::Stopped);
                return Ok(report);
            }

            let term = SearchTerm::new(item, qualifier);
            info!(%run_id, "🔄 Checking {} ({}/{})", term, index + 1, total);
            sink.emit(&ProgressEvent::ItemStarted {
                run_id,
                item: item.clone(),
                qualifier: qualifier.to_string(),
                position: index + 1,
                total,
            });

            let readings = match self.check_item(config, &term).await {
                Ok(readings) => readings,
                Err(e) => return Ok(Self::fail(guard, report, e.to_string(), sink)),
            };

            let result = SearchResult::new(item, qualifier, readings.sold.count(), readings.live.count(), Utc::now());
            let degraded = readings.sold.is_exhausted() || readings.live.is_exhausted();

            if degraded && self.keep_previous_on_exhausted && history.contains(&term) {
                warn!(%run_id, "⚠️  Keeping stored result for '{}'; new counts are incomplete", term);
            } else {
                history.upsert(result.clone());
            }

            if let Err(e) = self.store.save(&history).await {
                return Ok(Self::fail(guard, report, format!("{e:#}"), sink));
            }
            report.processed += 1;
            report.average_percentage = history.average_percentage();

            let stored = history.get(&term).cloned().unwrap_or(result);
            info!(
                %run_id,
                "✅ {}: {}% ({} sold / {} live)",
                term,
                stored.sell_through_percentage,
                stored.sold_count,
                stored.live_count
            );
            sink.emit(&ProgressEvent::ItemCompleted { run_id, result: stored, snapshot: snapshot(&history) });
        }

        report.status = RunStatus::Completed;
        info!(%run_id, "🎉 Run complete: checked {} items", total);
        sink.emit(&ProgressEvent::Completed { run_id, total, snapshot: snapshot(&history) });
        guard.finish(RunStatus::Completed);
        Ok(report)
    }

    /// Navigate to both result pages and poll each for its count
    async fn check_item(&self, config: &SearchConfig, term: &SearchTerm) -> Result<ItemReadings, SessionError> {
        let session = self.session.as_ref();

        self.session.navigate(&config.sold_url(term)).await?;
        let sold = self.poller.poll_reading(session, "sold").await?;

        self.session.navigate(&config.live_url(term)).await?;
        let live = self.poller.poll_reading(session, "live").await?;

        Ok(ItemReadings { sold, live })
    }

    /// End the run as Failed; the average stays that of the last persisted history
    fn fail(guard: RunGuard<'_>, mut report: RunReport, message: String, sink: &dyn ProgressSink) -> RunReport {
        error!(run_id = %report.run_id, "❌ Run failed after {} items: {}", report.processed, message);
        sink.emit(&ProgressEvent::Failed { run_id: report.run_id, message: message.clone() });
        report.status = RunStatus::Failed;
        report.failure = Some(message);
        guard.finish(RunStatus::Failed);
        report
    }
}

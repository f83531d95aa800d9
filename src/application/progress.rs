//! Progress sinks: where run notifications go

use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::domain::events::ProgressEvent;

/// Receives progress events from a run.
///
/// Emission is synchronous and infallible from the run's point of view: a
/// sink that cannot deliver an event drops it.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: &ProgressEvent);
}

/// Logs each event's status line
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgressSink;

impl ProgressSink for TracingProgressSink {
    fn emit(&self, event: &ProgressEvent) {
        let run_id = event.run_id();
        match event {
            ProgressEvent::Failed { .. } => error!(%run_id, "❌ {}", event.message()),
            ProgressEvent::Stopped { .. } => warn!(%run_id, "🛑 {}", event.message()),
            ProgressEvent::Completed { .. } => info!(%run_id, "✅ {}", event.message()),
            _ => info!(%run_id, "{}", event.message()),
        }
    }
}

/// Forwards events into an unbounded channel, e.g. for a UI task
#[derive(Debug, Clone)]
pub struct ChannelProgressSink {
    sender: mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelProgressSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: &ProgressEvent) {
        if self.sender.send(event.clone()).is_err() {
            debug!("Progress receiver dropped; event discarded");
        }
    }
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct CollectingProgressSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl CollectingProgressSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.events().iter().map(ProgressEvent::message).collect()
    }
}

impl ProgressSink for CollectingProgressSink {
    fn emit(&self, event: &ProgressEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

/// Sends every event to each inner sink in order
pub struct FanOutProgressSink<'a> {
    sinks: Vec<&'a dyn ProgressSink>,
}

impl<'a> FanOutProgressSink<'a> {
    pub fn new(sinks: Vec<&'a dyn ProgressSink>) -> Self {
        Self { sinks }
    }
}

impl ProgressSink for FanOutProgressSink<'_> {
    fn emit(&self, event: &ProgressEvent) {
        for sink in &self.sinks {
            sink.emit(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn stopped() -> ProgressEvent {
        ProgressEvent::Stopped { run_id: Uuid::nil(), checked: 1, total: 2 }
    }

    #[tokio::test]
    async fn channel_sink_forwards_events() {
        let (sink, mut receiver) = ChannelProgressSink::new();
        sink.emit(&stopped());
        assert_eq!(receiver.recv().await, Some(stopped()));
    }

    #[test]
    fn channel_sink_ignores_dropped_receiver() {
        let (sink, receiver) = ChannelProgressSink::new();
        drop(receiver);
        sink.emit(&stopped());
    }

    #[test]
    fn fan_out_reaches_every_sink() {
        let first = CollectingProgressSink::new();
        let second = CollectingProgressSink::new();
        let sinks: Vec<&dyn ProgressSink> = vec![&first, &second, &TracingProgressSink];
        let fan_out = FanOutProgressSink::new(sinks);

        fan_out.emit(&stopped());

        assert_eq!(first.messages(), vec!["Stopped! Checked 1/2 items"]);
        assert_eq!(second.events().len(), 1);
    }
}

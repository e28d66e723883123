//! Progress events and the non-blocking emitter
//!
//! A run owns one [`ProgressEmitter`]; the single observer holds the matching
//! [`EventStream`]. Emission never waits on the observer: when the channel is
//! full or the observer has gone away the event is dropped and the run carries
//! on. One slot is held back for the terminal event, so the observer always
//! sees how the run ended. Progress is clamped so the stream is
//! non-decreasing, and the first terminal event closes the channel.

use crate::{AnalysisResult, ErrorKind, Fundamentals, Headline, PriceSeries, SentimentReport};
use chrono::{DateTime, Utc};
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::pin::Pin;
use std::sync::{Mutex, PoisonError};
use std::task::{Context, Poll};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::debug;

/// Kind of progress event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Started,
    ToolStarted,
    ToolCompleted,
    Progress,
    Completed,
    Error,
    DebateStarted,
    BullDrafting,
    BearDrafting,
    BullComplete,
    BearComplete,
    RebuttalRound,
    SynthesisStarted,
    DebateCompleted,
}

impl EventType {
    /// Whether this event ends the stream
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::DebateCompleted | Self::Error)
    }
}

/// Partial result attached to an event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PartialData {
    Headlines(Vec<Headline>),
    PriceSeries(PriceSeries),
    Fundamentals(Fundamentals),
    Sentiment(SentimentReport),
    Analysis(Box<AnalysisResult>),
    /// Shapes owned by downstream crates (debate cases, verdicts)
    Structured { shape: String, body: Value },
}

/// One progress update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    #[serde(rename = "type")]
    pub event_type: EventType,
    /// Tool name or debate phase
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    pub progress: f64,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<PartialData>,
}

impl ProgressEvent {
    pub fn new(event_type: EventType, progress: f64, message: impl Into<String>) -> Self {
        Self {
            event_type,
            phase: None,
            progress,
            message: message.into(),
            timestamp: Utc::now(),
            data: None,
        }
    }

    pub fn with_phase(mut self, phase: impl Into<String>) -> Self {
        self.phase = Some(phase.into());
        self
    }

    pub fn with_data(mut self, data: PartialData) -> Self {
        self.data = Some(data);
        self
    }

    /// Render as a server-sent-events frame
    pub fn to_sse_frame(&self) -> crate::Result<String> {
        Ok(format!("data: {}\n\n", serde_json::to_string(self)?))
    }
}

struct EmitterState {
    tx: Option<mpsc::Sender<ProgressEvent>>,
    last_progress: f64,
    dropped: usize,
}

/// Append-only sender side of a run's event stream
pub struct ProgressEmitter {
    state: Mutex<EmitterState>,
}

impl ProgressEmitter {
    /// Create an emitter and the stream its observer reads
    ///
    /// Up to `capacity` non-terminal events are buffered; the terminal event
    /// has a slot of its own.
    pub fn channel(capacity: usize) -> (Self, EventStream) {
        let (tx, rx) = mpsc::channel(capacity.max(1) + 1);
        (
            Self {
                state: Mutex::new(EmitterState {
                    tx: Some(tx),
                    last_progress: 0.0,
                    dropped: 0,
                }),
            },
            EventStream { rx },
        )
    }

    /// Emitter without an observer
    pub fn detached() -> Self {
        Self {
            state: Mutex::new(EmitterState {
                tx: None,
                last_progress: 0.0,
                dropped: 0,
            }),
        }
    }

    /// Emit an event
    ///
    /// Progress is clamped into `[last, 1.0]`. Returns whether the event was
    /// handed to the observer.
    pub fn emit(&self, mut event: ProgressEvent) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(tx) = state.tx.as_ref() else {
            return false;
        };

        let progress = if event.progress.is_finite() {
            event.progress.clamp(state.last_progress, 1.0)
        } else {
            state.last_progress
        };
        event.progress = progress;
        let terminal = event.event_type.is_terminal();

        let delivered = if !terminal && tx.capacity() <= 1 {
            debug!(event_type = ?event.event_type, "Observer lagging, event dropped");
            false
        } else {
            match tx.try_send(event) {
                Ok(()) => true,
                Err(TrySendError::Full(event)) => {
                    debug!(event_type = ?event.event_type, "Observer lagging, event dropped");
                    false
                }
                Err(TrySendError::Closed(event)) => {
                    debug!(event_type = ?event.event_type, "Observer gone, event dropped");
                    false
                }
            }
        };
        if !delivered {
            state.dropped += 1;
        }
        state.last_progress = progress;

        if terminal {
            state.tx = None;
        }
        delivered
    }

    /// Emit a terminal error event naming the failure kind
    ///
    /// The event carries the last emitted progress.
    pub fn fail(&self, kind: ErrorKind, message: impl Into<String>) -> bool {
        let progress = self.last_progress();
        self.emit(ProgressEvent::new(EventType::Error, progress, message).with_phase(kind.as_str()))
    }

    /// Close without a terminal event
    pub fn close_silently(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.tx = None;
    }

    pub fn is_closed(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .tx
            .is_none()
    }

    pub fn last_progress(&self) -> f64 {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last_progress
    }

    /// Events that could not be delivered
    pub fn dropped(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .dropped
    }
}

impl std::fmt::Debug for ProgressEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressEmitter")
            .field("closed", &self.is_closed())
            .field("last_progress", &self.last_progress())
            .finish()
    }
}

/// Observer side of a run's event stream
#[derive(Debug)]
pub struct EventStream {
    rx: mpsc::Receiver<ProgressEvent>,
}

impl EventStream {
    /// Next event, or `None` once the run closed the stream
    pub async fn recv(&mut self) -> Option<ProgressEvent> {
        self.rx.recv().await
    }

    /// Drain everything buffered so far plus whatever arrives until close
    pub async fn collect_all(mut self) -> Vec<ProgressEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.rx.recv().await {
            events.push(event);
        }
        events
    }
}

impl Stream for EventStream {
    type Item = ProgressEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_progress_is_clamped_non_decreasing() {
        let (emitter, stream) = ProgressEmitter::channel(16);
        emitter.emit(ProgressEvent::new(EventType::Started, 0.0, "start"));
        emitter.emit(ProgressEvent::new(EventType::ToolStarted, 0.5, "half"));
        emitter.emit(ProgressEvent::new(EventType::ToolCompleted, 0.3, "behind"));
        emitter.emit(ProgressEvent::new(EventType::Completed, 1.0, "done"));

        let events = stream.collect_all().await;
        let progress: Vec<f64> = events.iter().map(|e| e.progress).collect();
        assert_eq!(progress, vec![0.0, 0.5, 0.5, 1.0]);
    }

    #[tokio::test]
    async fn test_terminal_event_closes_stream() {
        let (emitter, stream) = ProgressEmitter::channel(16);
        assert!(emitter.emit(ProgressEvent::new(EventType::Completed, 1.0, "done")));
        assert!(emitter.is_closed());
        assert!(!emitter.emit(ProgressEvent::new(EventType::Progress, 1.0, "late")));

        let events = stream.collect_all().await;
        assert_eq!(events.len(), 1);
        assert!(events[0].event_type.is_terminal());
    }

    #[tokio::test]
    async fn test_full_channel_drops_without_blocking() {
        let (emitter, mut stream) = ProgressEmitter::channel(1);
        assert!(emitter.emit(ProgressEvent::new(EventType::Started, 0.0, "a")));
        assert!(!emitter.emit(ProgressEvent::new(EventType::Progress, 0.1, "b")));
        assert_eq!(emitter.dropped(), 1);

        assert_eq!(stream.recv().await.unwrap().message, "a");
    }

    #[tokio::test]
    async fn test_terminal_event_survives_full_channel() {
        let (emitter, stream) = ProgressEmitter::channel(2);
        assert!(emitter.emit(ProgressEvent::new(EventType::Started, 0.0, "start")));
        assert!(emitter.emit(ProgressEvent::new(EventType::ToolStarted, 0.1, "fetching")));
        assert!(!emitter.emit(ProgressEvent::new(EventType::ToolCompleted, 0.2, "fetched")));
        assert!(emitter.emit(ProgressEvent::new(EventType::Completed, 1.0, "done")));
        assert!(emitter.is_closed());

        let events = stream.collect_all().await;
        let types: Vec<EventType> = events.iter().map(|e| e.event_type).collect();
        assert_eq!(
            types,
            vec![EventType::Started, EventType::ToolStarted, EventType::Completed]
        );
        assert_eq!(emitter.dropped(), 1);
    }

    #[tokio::test]
    async fn test_error_event_survives_full_channel() {
        let (emitter, stream) = ProgressEmitter::channel(1);
        emitter.emit(ProgressEvent::new(EventType::DebateStarted, 0.0, "start"));
        emitter.emit(ProgressEvent::new(EventType::BullDrafting, 0.3, "drafting"));
        assert!(emitter.fail(ErrorKind::ModelUnavailable, "model down"));

        let events = stream.collect_all().await;
        assert_eq!(events.last().unwrap().event_type, EventType::Error);
    }

    #[tokio::test]
    async fn test_observer_gone_counts_as_dropped() {
        let (emitter, stream) = ProgressEmitter::channel(4);
        drop(stream);
        assert!(!emitter.emit(ProgressEvent::new(EventType::Started, 0.0, "start")));
        assert_eq!(emitter.dropped(), 1);
    }

    #[tokio::test]
    async fn test_fail_uses_last_progress() {
        let (emitter, stream) = ProgressEmitter::channel(8);
        emitter.emit(ProgressEvent::new(EventType::ToolStarted, 0.4, "working"));
        emitter.fail(ErrorKind::ModelUnavailable, "model down");

        let events: Vec<_> = stream.collect().await;
        let last = events.last().unwrap();
        assert_eq!(last.event_type, EventType::Error);
        assert_eq!(last.progress, 0.4);
        assert_eq!(last.phase.as_deref(), Some("model_unavailable"));
    }

    #[tokio::test]
    async fn test_close_silently_sends_nothing() {
        let (emitter, stream) = ProgressEmitter::channel(8);
        emitter.close_silently();
        assert!(stream.collect_all().await.is_empty());
    }

    #[test]
    fn test_sse_frame() {
        let event = ProgressEvent::new(EventType::ToolStarted, 0.05, "Fetching headlines")
            .with_phase("fetch_headlines");
        let frame = event.to_sse_frame().unwrap();
        assert!(frame.starts_with("data: {"));
        assert!(frame.ends_with("\n\n"));
        assert!(frame.contains("\"type\":\"tool_started\""));
    }

    #[test]
    fn test_partial_data_is_tagged() {
        let data = PartialData::Headlines(vec![Headline::new("Apple beats")]);
        let value = serde_json::to_value(&data).unwrap();
        assert_eq!(value["kind"], "headlines");
        assert_eq!(value["value"][0]["title"], "Apple beats");
    }
}

//! Progress Channel: the ordered event stream of one run.
//!
//! Every event is appended to the run's history before it is broadcast, and
//! both happen under one lock. A subscriber therefore gets the full backlog
//! plus a live receiver that starts exactly where the backlog ends, so late
//! subscribers see every event once and in emission order.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use futures::stream::{self, Stream};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::warn;
use uuid::Uuid;

use crate::pipeline::stage::StageKind;

/// Live buffer per run. Runs emit at most a couple of dozen events.
const LIVE_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum EventKind {
    StageStarted { stage: StageKind },
    StageCompleted { stage: StageKind },
    StageFailed { stage: StageKind, reason: String },
    RunCancelled { before_stage: Option<StageKind> },
    RunCompleted,
}

impl EventKind {
    /// Wire name of the event, used as the SSE event name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::StageStarted { .. } => "stage-started",
            Self::StageCompleted { .. } => "stage-completed",
            Self::StageFailed { .. } => "stage-failed",
            Self::RunCancelled { .. } => "run-cancelled",
            Self::RunCompleted => "run-completed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::StageFailed { .. } | Self::RunCancelled { .. } | Self::RunCompleted
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressEvent {
    /// Position of the event within its run, starting at 0.
    pub seq: u64,
    pub run_id: Uuid,
    pub emitted_at: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: EventKind,
}

struct ChannelState {
    history: Vec<ProgressEvent>,
    sender: Option<broadcast::Sender<ProgressEvent>>,
}

pub struct ProgressChannel {
    run_id: Uuid,
    state: Mutex<ChannelState>,
}

impl ProgressChannel {
    pub fn new(run_id: Uuid) -> Self {
        let (sender, _) = broadcast::channel(LIVE_CAPACITY);
        Self {
            run_id,
            state: Mutex::new(ChannelState {
                history: Vec::new(),
                sender: Some(sender),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ChannelState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends an event and broadcasts it. Ignored once the channel is closed or
    /// a terminal event has been published.
    pub fn publish(&self, kind: EventKind) -> Option<ProgressEvent> {
        let mut state = self.lock();
        let sender = state.sender.clone()?;
        if state.history.last().is_some_and(|e| e.kind.is_terminal()) {
            warn!(run_id = %self.run_id, event = kind.name(), "event after run end dropped");
            return None;
        }
        let event = ProgressEvent {
            seq: state.history.len() as u64,
            run_id: self.run_id,
            emitted_at: Utc::now(),
            kind,
        };
        state.history.push(event.clone());
        // No live receivers is fine: the history still has the event.
        let _ = sender.send(event.clone());
        Some(event)
    }

    /// Ends the live stream. Subscribers drain what was already sent, then finish.
    pub fn close(&self) {
        self.lock().sender = None;
    }

    #[cfg(test)]
    pub fn history(&self) -> Vec<ProgressEvent> {
        self.lock().history.clone()
    }

    pub fn subscribe(&self) -> ProgressSubscription {
        let state = self.lock();
        ProgressSubscription {
            backlog: state.history.clone().into(),
            live: state.sender.as_ref().map(|s| s.subscribe()),
            next_seq: state.history.len() as u64,
        }
    }
}

/// Backlog-then-live view of one run's events.
pub struct ProgressSubscription {
    backlog: std::collections::VecDeque<ProgressEvent>,
    live: Option<broadcast::Receiver<ProgressEvent>>,
    next_seq: u64,
}

impl ProgressSubscription {
    /// Next event in emission order, or `None` once the run's stream has ended.
    pub async fn next(&mut self) -> Option<ProgressEvent> {
        if let Some(event) = self.backlog.pop_front() {
            return Some(event);
        }
        let live = self.live.as_mut()?;
        loop {
            match live.recv().await {
                Ok(event) if event.seq < self.next_seq => continue,
                Ok(event) => {
                    self.next_seq = event.seq + 1;
                    return Some(event);
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "progress subscriber lagged, events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    self.live = None;
                    return None;
                }
            }
        }
    }

    pub fn into_stream(self) -> impl Stream<Item = ProgressEvent> {
        stream::unfold(self, |mut sub| async move {
            let event = sub.next().await?;
            Some((event, sub))
        })
    }
}

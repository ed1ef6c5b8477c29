use std::sync::{Arc, PoisonError, RwLock};

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::models::{Run, RunFailure, RunStatus};
use crate::pipeline::progress::ProgressChannel;
use crate::pipeline::stage::StageKind;

/// Shared view of one run: its state record, cancellation token and progress channel.
///
/// Cloning is cheap. Only the orchestrator mutates the run record; everyone else reads
/// snapshots of it or requests cancellation.
#[derive(Clone)]
pub struct RunHandle {
    run: Arc<RwLock<Run>>,
    cancel: CancellationToken,
    progress: Arc<ProgressChannel>,
}

impl RunHandle {
    pub fn new(run: Run) -> Self {
        let progress = Arc::new(ProgressChannel::new(run.id));
        Self {
            run: Arc::new(RwLock::new(run)),
            cancel: CancellationToken::new(),
            progress,
        }
    }

    pub fn id(&self) -> Uuid {
        self.snapshot().id
    }

    pub fn snapshot(&self) -> Run {
        self.run
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn status(&self) -> RunStatus {
        self.run
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .status
    }

    /// Requests cancellation. Takes effect at the next stage boundary.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn progress(&self) -> &Arc<ProgressChannel> {
        &self.progress
    }

    fn update(&self, f: impl FnOnce(&mut Run)) {
        let mut run = self.run.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut run);
    }

    pub(super) fn mark_running(&self) {
        self.update(|run| run.status = RunStatus::Running);
    }

    pub(super) fn enter_stage(&self, stage: StageKind) {
        self.update(|run| run.current_stage = Some(stage));
    }

    pub(super) fn mark_completed(&self) {
        self.update(|run| {
            run.status = RunStatus::Completed;
            run.current_stage = None;
        });
    }

    pub(super) fn mark_cancelled(&self) {
        self.update(|run| run.status = RunStatus::Cancelled);
    }

    pub(super) fn mark_failed(&self, stage: StageKind, message: String) {
        self.update(|run| {
            run.status = RunStatus::Failed;
            run.failure = Some(RunFailure { stage, message });
        });
    }
}

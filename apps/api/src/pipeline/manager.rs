//! Run registry: accepts submissions, spawns their pipelines and hands results back.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::models::{DocumentHandle, IntakeForm, Run, RunFailure, RunStatus};
use crate::pipeline::context::RunContext;
use crate::pipeline::handle::RunHandle;
use crate::pipeline::orchestrator::Orchestrator;
use crate::pipeline::progress::ProgressSubscription;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunError {
    #[error("Run {0} not found")]
    NotFound(Uuid),

    #[error("Run is {0} and has no result yet")]
    NotReady(RunStatus),

    #[error("Run failed at stage '{}': {}", .0.stage, .0.message)]
    Failed(RunFailure),

    #[error("Run was cancelled")]
    Cancelled,
}

struct RunSlot {
    handle: RunHandle,
    /// Final context, stored once the orchestrator has returned.
    outcome: Mutex<Option<RunContext>>,
}

pub struct RunManager {
    orchestrator: Arc<Orchestrator>,
    runs: RwLock<HashMap<Uuid, Arc<RunSlot>>>,
}

impl RunManager {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            runs: RwLock::new(HashMap::new()),
        }
    }

    fn slot(&self, id: Uuid) -> Result<Arc<RunSlot>, RunError> {
        self.runs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
            .ok_or(RunError::NotFound(id))
    }

    /// Creates a run for the submission and starts its pipeline in the background.
    pub fn submit(&self, intake: IntakeForm) -> Run {
        let run = Run::new();
        let slot = Arc::new(RunSlot {
            handle: RunHandle::new(run.clone()),
            outcome: Mutex::new(None),
        });
        self.runs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(run.id, slot.clone());
        info!(run_id = %run.id, "run submitted");

        let orchestrator = self.orchestrator.clone();
        tokio::spawn(async move {
            let mut context = RunContext::with_intake(intake);
            orchestrator.execute(&slot.handle, &mut context).await;
            *slot.outcome.lock().unwrap_or_else(PoisonError::into_inner) = Some(context);
            // Subscribers only see the end of the stream once the outcome is readable.
            slot.handle.progress().close();
        });

        run
    }

    pub fn status(&self, id: Uuid) -> Result<Run, RunError> {
        Ok(self.slot(id)?.handle.snapshot())
    }

    /// Requests cancellation. A run that already finished is left untouched.
    pub fn cancel(&self, id: Uuid) -> Result<Run, RunError> {
        let slot = self.slot(id)?;
        if !slot.handle.status().is_terminal() {
            slot.handle.cancel();
            info!(run_id = %id, "cancellation requested");
        }
        Ok(slot.handle.snapshot())
    }

    pub fn subscribe(&self, id: Uuid) -> Result<ProgressSubscription, RunError> {
        Ok(self.slot(id)?.handle.progress().subscribe())
    }

    /// Hands over the rendered document of a completed run and forgets the run.
    ///
    /// Failed and cancelled runs report why they have no document and stay registered.
    pub fn take_document(&self, id: Uuid) -> Result<DocumentHandle, RunError> {
        let slot = self.slot(id)?;
        let run = slot.handle.snapshot();
        let mut outcome = slot.outcome.lock().unwrap_or_else(PoisonError::into_inner);
        if outcome.is_none() {
            return Err(RunError::NotReady(run.status));
        }
        match run.status {
            RunStatus::Completed => {}
            RunStatus::Cancelled => return Err(RunError::Cancelled),
            RunStatus::Failed => {
                return Err(run
                    .failure
                    .map(RunError::Failed)
                    .unwrap_or(RunError::NotReady(RunStatus::Failed)))
            }
            status => return Err(RunError::NotReady(status)),
        }

        let document = outcome.take().and_then(RunContext::into_document);
        drop(outcome);
        self.runs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
        info!(run_id = %id, "run result consumed");
        document.ok_or(RunError::NotFound(id))
    }
}

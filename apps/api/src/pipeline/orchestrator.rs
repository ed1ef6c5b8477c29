//! Orchestrator: runs the fixed stage sequence against one run and its context.
//!
//! Cancellation is cooperative and only checked at stage boundaries. A stage
//! that is already running always finishes its in-flight collaborator calls
//! (board searches, language-model requests, rendering); the token only keeps
//! the *next* stage from starting. Do not replace this with task abortion: an
//! aborted collaborator call can leave shared clients or half-written outputs
//! in an undefined state, and the context's single-writer guarantee assumes a
//! stage either returns or fails.

use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::models::RunStatus;
use crate::pipeline::context::{ContextField, RunContext, StageScope};
use crate::pipeline::handle::RunHandle;
use crate::pipeline::progress::EventKind;
use crate::pipeline::snapshot::SnapshotStore;
use crate::pipeline::stage::{StageKind, Step};

/// Rejected step lists. Raised once, when the pipeline is assembled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("stage '{stage}' reads '{field}' before any earlier stage writes it")]
    UnsatisfiedInput {
        stage: StageKind,
        field: ContextField,
    },

    #[error("stage '{stage}' writes '{field}', which is already written earlier")]
    DuplicateOutput {
        stage: StageKind,
        field: ContextField,
    },
}

pub struct Orchestrator {
    steps: Vec<Step>,
    snapshots: Option<Arc<dyn SnapshotStore>>,
}

impl Orchestrator {
    /// Validates that every declared input is produced by an earlier step (or is the
    /// intake) and that no field has two writers.
    pub fn new(steps: Vec<Step>) -> Result<Self, PipelineError> {
        let mut available: HashSet<ContextField> = HashSet::from([ContextField::Intake]);
        for step in &steps {
            let stage = step.kind();
            for field in stage.inputs() {
                if !available.contains(field) {
                    return Err(PipelineError::UnsatisfiedInput {
                        stage,
                        field: *field,
                    });
                }
            }
            for field in stage.outputs() {
                if !available.insert(*field) {
                    return Err(PipelineError::DuplicateOutput {
                        stage,
                        field: *field,
                    });
                }
            }
        }
        Ok(Self {
            steps,
            snapshots: None,
        })
    }

    pub fn with_snapshots(mut self, store: Arc<dyn SnapshotStore>) -> Self {
        self.snapshots = Some(store);
        self
    }

    pub fn stages(&self) -> Vec<StageKind> {
        self.steps.iter().map(Step::kind).collect()
    }

    /// Drives one run to a terminal status.
    ///
    /// The run record is always updated before the matching event is published, so a
    /// subscriber that sees a terminal event can immediately read the terminal status.
    pub async fn execute(&self, handle: &RunHandle, context: &mut RunContext) -> RunStatus {
        let run_id = handle.id();
        let progress = handle.progress();
        handle.mark_running();
        info!(%run_id, stages = self.steps.len(), "run started");

        for step in &self.steps {
            let stage = step.kind();

            if handle.is_cancel_requested() {
                handle.mark_cancelled();
                progress.publish(EventKind::RunCancelled {
                    before_stage: Some(stage),
                });
                info!(%run_id, %stage, "run cancelled before stage");
                return RunStatus::Cancelled;
            }

            handle.enter_stage(stage);
            progress.publish(EventKind::StageStarted { stage });
            info!(%run_id, %stage, "stage started");

            let result = {
                let mut scope = StageScope::new(run_id, stage, context);
                step.execute(&mut scope).await
            };

            match result {
                Ok(()) => {
                    progress.publish(EventKind::StageCompleted { stage });
                    info!(%run_id, %stage, "stage completed");
                    self.write_snapshot(run_id, stage, context).await;
                }
                Err(err) => {
                    let reason = err.to_string();
                    error!(%run_id, %stage, error = %reason, "stage failed");
                    handle.mark_failed(stage, reason.clone());
                    progress.publish(EventKind::StageFailed { stage, reason });
                    return RunStatus::Failed;
                }
            }
        }

        // A cancel that arrived during the last stage still wins over completion.
        if handle.is_cancel_requested() {
            handle.mark_cancelled();
            progress.publish(EventKind::RunCancelled { before_stage: None });
            info!(%run_id, "run cancelled after final stage");
            return RunStatus::Cancelled;
        }

        handle.mark_completed();
        progress.publish(EventKind::RunCompleted);
        info!(%run_id, "run completed");
        RunStatus::Completed
    }

    async fn write_snapshot(&self, run_id: Uuid, stage: StageKind, context: &RunContext) {
        let Some(store) = &self.snapshots else {
            return;
        };
        let snapshot = match serde_json::to_value(context) {
            Ok(value) => value,
            Err(e) => {
                warn!(%run_id, %stage, error = %e, "failed to serialize context snapshot");
                return;
            }
        };
        if let Err(e) = store.write(run_id, stage, snapshot).await {
            warn!(%run_id, %stage, error = %e, "failed to write context snapshot");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::sync::Notify;

    use super::*;
    use crate::boards::fixture::FixtureBoard;
    use crate::llm_client::ProviderError;
    use crate::models::{FetchDepth, Run, RunFailure};
    use crate::pipeline::progress::ProgressEvent;
    use crate::steps::{standard_steps, Collaborators, ScorerStep, SearcherStep};
    use crate::testing::{
        listing, sample_intake, FailingBoard, FailingRenderer, FakeGenerator, GatedBoard,
        MemorySnapshotStore, StaticBoard,
    };

    fn started_and_completed(events: &[ProgressEvent]) -> Vec<String> {
        events
            .iter()
            .filter_map(|e| match &e.kind {
                EventKind::StageStarted { stage } => Some(format!("start:{stage}")),
                EventKind::StageCompleted { stage } => Some(format!("done:{stage}")),
                _ => None,
            })
            .collect()
    }

    async fn run_to_end(orchestrator: &Orchestrator) -> (RunHandle, RunContext, RunStatus) {
        let handle = RunHandle::new(Run::new());
        let mut context = RunContext::with_intake(sample_intake());
        let status = orchestrator.execute(&handle, &mut context).await;
        (handle, context, status)
    }

    #[test]
    fn test_rejects_step_whose_input_is_never_written() {
        let steps = vec![Step::Scorer(ScorerStep::new(Default::default()))];
        let err = Orchestrator::new(steps).err().unwrap();
        assert_eq!(
            err,
            PipelineError::UnsatisfiedInput {
                stage: StageKind::Scorer,
                field: ContextField::CandidateProfile,
            }
        );
    }

    #[test]
    fn test_rejects_out_of_order_steps() {
        let mut steps = standard_steps(Collaborators::default());
        steps.swap(0, 1);
        assert!(matches!(
            Orchestrator::new(steps),
            Err(PipelineError::UnsatisfiedInput {
                stage: StageKind::Searcher,
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_duplicate_writer() {
        let mut steps = standard_steps(Collaborators::default());
        steps.insert(2, Step::Searcher(SearcherStep::new(vec![])));
        assert!(matches!(
            Orchestrator::new(steps),
            Err(PipelineError::DuplicateOutput {
                stage: StageKind::Searcher,
                field: ContextField::RawListings,
            })
        ));
    }

    #[tokio::test]
    async fn test_stages_run_in_order_and_complete() {
        let orchestrator = Orchestrator::new(standard_steps(Collaborators::default())).unwrap();
        assert_eq!(orchestrator.stages(), StageKind::ORDER.to_vec());

        let (handle, context, status) = run_to_end(&orchestrator).await;
        assert_eq!(status, RunStatus::Completed);
        assert_eq!(handle.status(), RunStatus::Completed);

        let events = handle.progress().history();
        let expected: Vec<String> = StageKind::ORDER
            .iter()
            .flat_map(|s| [format!("start:{s}"), format!("done:{s}")])
            .collect();
        assert_eq!(started_and_completed(&events), expected);
        assert_eq!(events.last().unwrap().kind, EventKind::RunCompleted);
        // seq numbers are dense and ordered
        for (i, event) in events.iter().enumerate() {
            assert_eq!(event.seq, i as u64);
        }
        assert!(context.generated_document().is_ok());
    }

    #[tokio::test]
    async fn test_failed_stage_stops_the_run() {
        let collaborators = Collaborators {
            renderer: Arc::new(FailingRenderer),
            ..Collaborators::default()
        };
        let orchestrator = Orchestrator::new(standard_steps(collaborators)).unwrap();
        let (handle, context, status) = run_to_end(&orchestrator).await;

        assert_eq!(status, RunStatus::Failed);
        let run = handle.snapshot();
        let failure: RunFailure = run.failure.unwrap();
        assert_eq!(failure.stage, StageKind::Generator);
        assert!(failure.message.contains("rendering"));

        let events = handle.progress().history();
        assert!(matches!(
            events.last().unwrap().kind,
            EventKind::StageFailed {
                stage: StageKind::Generator,
                ..
            }
        ));
        assert!(!events.iter().any(|e| e.kind
            == EventKind::StageStarted {
                stage: StageKind::Notifier
            }));
        // partial results are kept for diagnostics
        assert!(context.job_report().is_ok());
        assert!(context.generated_document().is_err());
    }

    #[tokio::test]
    async fn test_cancel_before_start_runs_nothing() {
        let orchestrator = Orchestrator::new(standard_steps(Collaborators::default())).unwrap();
        let handle = RunHandle::new(Run::new());
        handle.cancel();
        let mut context = RunContext::with_intake(sample_intake());

        let status = orchestrator.execute(&handle, &mut context).await;
        assert_eq!(status, RunStatus::Cancelled);
        let events = handle.progress().history();
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0].kind,
            EventKind::RunCancelled {
                before_stage: Some(StageKind::Profiler)
            }
        );
    }

    #[tokio::test]
    async fn test_cancel_during_stage_stops_at_next_boundary() {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let board = GatedBoard::new(
            "gated",
            StaticBoard::sample_listings("gated"),
            entered.clone(),
            release.clone(),
        );
        let collaborators = Collaborators {
            boards: vec![Arc::new(board)],
            ..Collaborators::default()
        };
        let orchestrator = Arc::new(Orchestrator::new(standard_steps(collaborators)).unwrap());
        let handle = RunHandle::new(Run::new());

        let task = {
            let orchestrator = orchestrator.clone();
            let handle = handle.clone();
            tokio::spawn(async move {
                let mut context = RunContext::with_intake(sample_intake());
                orchestrator.execute(&handle, &mut context).await
            })
        };

        entered.notified().await;
        handle.cancel();
        release.notify_one();
        let status = task.await.unwrap();

        assert_eq!(status, RunStatus::Cancelled);
        assert_eq!(handle.status(), RunStatus::Cancelled);
        let events = handle.progress().history();
        // the in-flight stage still completes
        assert!(events.iter().any(|e| e.kind
            == EventKind::StageCompleted {
                stage: StageKind::Searcher
            }));
        assert!(!events.iter().any(|e| e.kind
            == EventKind::StageStarted {
                stage: StageKind::Scorer
            }));
        assert_eq!(
            events.last().unwrap().kind,
            EventKind::RunCancelled {
                before_stage: Some(StageKind::Scorer)
            }
        );
    }

    #[tokio::test]
    async fn test_partial_board_failure_still_completes() {
        let collaborators = Collaborators {
            boards: vec![
                Arc::new(FailingBoard::new("broken")),
                Arc::new(StaticBoard::new("working", StaticBoard::sample_listings("working"))),
            ],
            ..Collaborators::default()
        };
        let orchestrator = Orchestrator::new(standard_steps(collaborators)).unwrap();
        let (_, context, status) = run_to_end(&orchestrator).await;

        assert_eq!(status, RunStatus::Completed);
        let failures = context.board_failures().unwrap();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].board, "broken");
        assert!(context
            .raw_listings()
            .unwrap()
            .iter()
            .all(|l| l.board == "working"));
    }

    #[tokio::test]
    async fn test_keyword_fallback_does_not_fail_the_run() {
        let collaborators = Collaborators {
            llm: Arc::new(FakeGenerator::new(|prompt, _| {
                if prompt.contains("search keywords") {
                    Ok("I'd rather not answer in JSON today.".to_string())
                } else {
                    Ok("Write about Python and SQL.".to_string())
                }
            })),
            ..Collaborators::default()
        };
        let orchestrator = Orchestrator::new(standard_steps(collaborators)).unwrap();
        let (_, context, status) = run_to_end(&orchestrator).await;

        assert_eq!(status, RunStatus::Completed);
        assert_eq!(
            context.search_keywords().unwrap(),
            ["python".to_string(), "sql".to_string()]
        );
    }

    #[tokio::test]
    async fn test_keyword_fallback_from_extra_keywords_completes() {
        let jobly = FixtureBoard::new(
            "jobly",
            concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures/boards/jobly.json"),
        );
        let collaborators = Collaborators {
            llm: Arc::new(FakeGenerator::new(|prompt, _| {
                if prompt.contains("search keywords") {
                    Err(ProviderError::EmptyContent)
                } else {
                    Ok("Write about Python.".to_string())
                }
            })),
            boards: vec![Arc::new(jobly)],
            ..Collaborators::default()
        };
        let orchestrator = Orchestrator::new(standard_steps(collaborators)).unwrap();

        let handle = RunHandle::new(Run::new());
        let mut intake = sample_intake();
        intake.skills.clear();
        intake.extra_keywords = vec!["python".to_string()];
        let mut context = RunContext::with_intake(intake);
        let status = orchestrator.execute(&handle, &mut context).await;

        assert_eq!(status, RunStatus::Completed, "{:?}", handle.snapshot().failure);
        assert_eq!(context.search_keywords().unwrap(), ["python".to_string()]);
        assert!(!context.raw_listings().unwrap().is_empty());
        assert!(context.generated_document().is_ok());
    }

    #[tokio::test]
    async fn test_snapshots_written_after_each_stage() {
        let store = Arc::new(MemorySnapshotStore::default());
        let orchestrator = Orchestrator::new(standard_steps(Collaborators::default()))
            .unwrap()
            .with_snapshots(store.clone());
        let (handle, _, status) = run_to_end(&orchestrator).await;

        assert_eq!(status, RunStatus::Completed);
        let written = store.written();
        assert_eq!(written.len(), StageKind::ORDER.len());
        assert!(written.iter().all(|(id, _, _)| *id == handle.id()));
        let (_, stage, snapshot) = &written[2];
        assert_eq!(*stage, StageKind::Scorer);
        assert!(snapshot["values"]["scoredListings"].is_array());
        assert!(snapshot["values"].get("jobReport").is_none());
    }

    #[tokio::test]
    async fn test_snapshot_failure_is_not_fatal() {
        let orchestrator = Orchestrator::new(standard_steps(Collaborators::default()))
            .unwrap()
            .with_snapshots(Arc::new(MemorySnapshotStore::failing()));
        let (_, _, status) = run_to_end(&orchestrator).await;
        assert_eq!(status, RunStatus::Completed);
    }

    #[tokio::test]
    async fn test_two_boards_rank_double_matches_first() {
        let board_a = StaticBoard::new(
            "a",
            vec![
                listing(0, "a", "https://jobs/u1", "Python developer", "python and sql", FetchDepth::Deep),
                listing(0, "a", "https://jobs/u2", "Designer", "figma", FetchDepth::Deep),
            ],
        );
        let board_b = StaticBoard::new(
            "b",
            vec![
                listing(0, "b", "https://jobs/u1", "Python developer", "", FetchDepth::Shallow),
                listing(0, "b", "https://jobs/u3", "Data engineer", "SQL pipelines in Python", FetchDepth::Deep),
            ],
        );
        let collaborators = Collaborators {
            boards: vec![Arc::new(board_a), Arc::new(board_b)],
            ..Collaborators::default()
        };
        let orchestrator = Orchestrator::new(standard_steps(collaborators)).unwrap();
        let (_, context, status) = run_to_end(&orchestrator).await;

        assert_eq!(status, RunStatus::Completed);
        assert_eq!(context.raw_listings().unwrap().len(), 4);
        let scored = context.scored_listings().unwrap();
        let urls: Vec<&str> = scored.iter().map(|s| s.listing.url.as_str()).collect();
        assert_eq!(urls, vec!["https://jobs/u1", "https://jobs/u3"]);
        assert_eq!(scored[0].listing.description, "python and sql");
    }
}

//! Stage contract: every pipeline unit is one variant of `Step`.
//!
//! Each stage declares which context fields it reads and which it writes. The
//! declarations are enforced twice: by `StageScope` on every access, and by
//! `Orchestrator::new` when the step list is assembled.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::llm_client::ProviderError;
use crate::notify::NotifyError;
use crate::pipeline::context::{ContextError, ContextField, StageScope};
use crate::render::RenderError;
use crate::steps::{
    GeneratorStep, NotifierStep, ProfilerStep, ReporterStep, ScorerStep, SearcherStep,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Profiler,
    Searcher,
    Scorer,
    Reporter,
    Generator,
    Notifier,
}

impl StageKind {
    /// The fixed execution order of a run.
    pub const ORDER: [StageKind; 6] = [
        StageKind::Profiler,
        StageKind::Searcher,
        StageKind::Scorer,
        StageKind::Reporter,
        StageKind::Generator,
        StageKind::Notifier,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Profiler => "profiler",
            Self::Searcher => "searcher",
            Self::Scorer => "scorer",
            Self::Reporter => "reporter",
            Self::Generator => "generator",
            Self::Notifier => "notifier",
        }
    }

    pub fn inputs(&self) -> &'static [ContextField] {
        use ContextField::*;
        match self {
            Self::Profiler => &[Intake],
            Self::Searcher => &[CandidateProfile, SearchKeywords],
            Self::Scorer => &[CandidateProfile, RawListings],
            Self::Reporter => &[CandidateProfile, ScoredListings, BoardFailures],
            Self::Generator => &[CandidateProfile, ScoredListings, JobReport],
            Self::Notifier => &[GeneratedDocument, ScoredListings],
        }
    }

    pub fn outputs(&self) -> &'static [ContextField] {
        use ContextField::*;
        match self {
            Self::Profiler => &[CandidateProfile, SearchKeywords],
            Self::Searcher => &[RawListings, BoardFailures],
            Self::Scorer => &[ScoredListings],
            Self::Reporter => &[JobReport],
            Self::Generator => &[GeneratedDocument],
            Self::Notifier => &[],
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a stage failed. Every variant is fatal for the run.
#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Context(#[from] ContextError),

    #[error("language model call failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("job search failed: {0}")]
    Search(String),

    #[error("document rendering failed: {0}")]
    Render(#[from] RenderError),

    #[error("notification failed: {0}")]
    Notify(#[from] NotifyError),

    #[error("{0}")]
    Invalid(String),
}

/// A pipeline unit. One variant per stage kind, each carrying its injected collaborators.
pub enum Step {
    Profiler(ProfilerStep),
    Searcher(SearcherStep),
    Scorer(ScorerStep),
    Reporter(ReporterStep),
    Generator(GeneratorStep),
    Notifier(NotifierStep),
}

impl Step {
    pub fn kind(&self) -> StageKind {
        match self {
            Self::Profiler(_) => StageKind::Profiler,
            Self::Searcher(_) => StageKind::Searcher,
            Self::Scorer(_) => StageKind::Scorer,
            Self::Reporter(_) => StageKind::Reporter,
            Self::Generator(_) => StageKind::Generator,
            Self::Notifier(_) => StageKind::Notifier,
        }
    }

    pub async fn execute(&self, scope: &mut StageScope<'_>) -> Result<(), StageError> {
        match self {
            Self::Profiler(step) => step.execute(scope).await,
            Self::Searcher(step) => step.execute(scope).await,
            Self::Scorer(step) => step.execute(scope),
            Self::Reporter(step) => step.execute(scope).await,
            Self::Generator(step) => step.execute(scope).await,
            Self::Notifier(step) => step.execute(scope).await,
        }
    }
}

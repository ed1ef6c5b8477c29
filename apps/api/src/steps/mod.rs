//! The six pipeline stages. Each is constructed with its collaborators injected and
//! exposes one `execute(scope)`; `Step` in `pipeline::stage` dispatches to them.

pub mod generator;
pub mod notifier;
pub mod profiler;
pub mod prompts;
pub mod reporter;
pub mod scorer;
pub mod searcher;

use std::sync::Arc;

use crate::boards::JobBoard;
use crate::llm_client::TextGenerator;
use crate::notify::Notifier;
use crate::pipeline::stage::{StageKind, Step};
use crate::render::DocumentRenderer;
use crate::scoring::ScoringConfig;

pub use generator::GeneratorStep;
pub use notifier::NotifierStep;
pub use profiler::ProfilerStep;
pub use reporter::ReporterStep;
pub use scorer::ScorerStep;
pub use searcher::SearcherStep;

/// Everything the stages call out to. Shared by all runs.
#[derive(Clone)]
pub struct Collaborators {
    pub llm: Arc<dyn TextGenerator>,
    /// In configuration order; the Searcher queries them in this order.
    pub boards: Vec<Arc<dyn JobBoard>>,
    pub renderer: Arc<dyn DocumentRenderer>,
    pub notifier: Arc<dyn Notifier>,
    pub scoring: ScoringConfig,
}

/// One step per stage, in `StageKind::ORDER`.
pub fn standard_steps(collaborators: Collaborators) -> Vec<Step> {
    let Collaborators {
        llm,
        boards,
        renderer,
        notifier,
        scoring,
    } = collaborators;
    StageKind::ORDER
        .iter()
        .map(|kind| match kind {
            StageKind::Profiler => Step::Profiler(ProfilerStep::new(llm.clone())),
            StageKind::Searcher => Step::Searcher(SearcherStep::new(boards.clone())),
            StageKind::Scorer => Step::Scorer(ScorerStep::new(scoring.clone())),
            StageKind::Reporter => Step::Reporter(ReporterStep::new(llm.clone())),
            StageKind::Generator => {
                Step::Generator(GeneratorStep::new(llm.clone(), renderer.clone()))
            }
            StageKind::Notifier => Step::Notifier(NotifierStep::new(notifier.clone())),
        })
        .collect()
}

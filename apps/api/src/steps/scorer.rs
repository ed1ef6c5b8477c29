use tracing::info;

use crate::pipeline::context::{ContextValue, StageScope};
use crate::pipeline::stage::StageError;
use crate::scoring::{score, ScoringConfig};

/// Scorer: ranks the raw listings with the Scoring Engine, keeping as many as letters requested.
pub struct ScorerStep {
    config: ScoringConfig,
}

impl ScorerStep {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self, scope: &mut StageScope<'_>) -> Result<(), StageError> {
        let profile = scope.candidate_profile()?;
        let listings = scope.raw_listings()?;
        let requested = profile.preferences.letter_count as usize;
        let scored = score(listings, profile, requested, &self.config);

        info!(
            run_id = %scope.run_id(),
            candidates = listings.len(),
            kept = scored.len(),
            top_score = scored.first().map(|s| s.total_score),
            "listings scored"
        );
        scope.set(ContextValue::ScoredListings(scored))?;
        Ok(())
    }
}

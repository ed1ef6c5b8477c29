//! Searcher: queries the selected job boards with the derived keywords.
//!
//! A failing board is recorded and skipped. The stage only fails when no board
//! succeeded, or when the boards that did succeed found nothing at all.

use std::sync::Arc;

use tracing::{info, warn};

use crate::boards::JobBoard;
use crate::models::{BoardFailure, JobListing};
use crate::pipeline::context::{ContextValue, StageScope};
use crate::pipeline::stage::StageError;

pub struct SearcherStep {
    boards: Vec<Arc<dyn JobBoard>>,
}

impl SearcherStep {
    pub fn new(boards: Vec<Arc<dyn JobBoard>>) -> Self {
        Self { boards }
    }

    pub async fn execute(&self, scope: &mut StageScope<'_>) -> Result<(), StageError> {
        let run_id = scope.run_id();
        let keywords = scope.search_keywords()?.to_vec();
        let (selection, deep_mode) = {
            let profile = scope.candidate_profile()?;
            (
                profile.preferences.job_boards.clone(),
                profile.preferences.deep_mode,
            )
        };

        let mut failures: Vec<BoardFailure> = selection
            .iter()
            .filter(|name| !self.boards.iter().any(|b| b.id() == name.as_str()))
            .map(|name| {
                warn!(%run_id, board = %name, "selected job board is not configured");
                BoardFailure {
                    board: name.clone(),
                    reason: "board is not configured".to_string(),
                }
            })
            .collect();

        let selected = self
            .boards
            .iter()
            .filter(|b| selection.is_empty() || selection.iter().any(|s| s == b.id()));

        let mut listings: Vec<JobListing> = Vec::new();
        let mut succeeded = 0usize;
        for board in selected {
            match board.search(&keywords, deep_mode).await {
                Ok(found) => {
                    succeeded += 1;
                    info!(%run_id, board = board.id(), count = found.len(), "job board searched");
                    for mut listing in found {
                        listing.board = board.id().to_string();
                        listing.discovery_index = listings.len();
                        listings.push(listing);
                    }
                }
                Err(e) => {
                    warn!(%run_id, board = board.id(), error = %e, "job board search failed");
                    failures.push(BoardFailure {
                        board: board.id().to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        if succeeded == 0 {
            return Err(StageError::Search(format!(
                "no job board succeeded ({} failed)",
                failures.len()
            )));
        }
        if listings.is_empty() {
            return Err(StageError::Search(format!(
                "no listings found for keywords {keywords:?}"
            )));
        }

        scope.set(ContextValue::RawListings(listings))?;
        scope.set(ContextValue::BoardFailures(failures))?;
        Ok(())
    }
}

//! Job board collaborators. One `JobBoard` per source; the Searcher stage
//! queries them in configuration order and tolerates individual failures.

pub mod fixture;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::JobListing;

pub use fixture::load_fixture_boards;

/// Failure of one board's search. Never fatal on its own.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed listings: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Board unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait JobBoard: Send + Sync {
    /// Stable lowercase identifier, matched against the profile's board selection.
    fn id(&self) -> &str;

    /// Listings matching any of `keywords`. In shallow mode descriptions are left empty.
    ///
    /// `discovery_index` on the returned listings is ignored; the Searcher assigns it.
    async fn search(
        &self,
        keywords: &[String],
        deep_mode: bool,
    ) -> Result<Vec<JobListing>, ScrapeError>;
}

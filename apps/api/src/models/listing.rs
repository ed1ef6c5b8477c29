use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// How much of a listing the scraper retrieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchDepth {
    /// Title (and maybe a snippet) from the search results page only.
    Shallow,
    /// Full description fetched from the listing's detail page.
    Deep,
}

/// A single job listing as returned by a job board scraper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobListing {
    pub board: String,
    pub title: String,
    pub company: String,
    /// Canonical URL. Used as the deduplication key.
    pub url: String,
    /// Empty when the listing was fetched shallowly.
    pub description: String,
    pub depth: FetchDepth,
    /// Position in which the Searcher discovered the listing across all boards.
    pub discovery_index: usize,
}

impl JobListing {
    pub fn has_description(&self) -> bool {
        !self.description.trim().is_empty()
    }
}

/// A listing ranked against a candidate profile. Read-only view produced by the Scoring Engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredListing {
    pub listing: JobListing,
    pub total_score: f64,
    /// Named sub-scores, e.g. `keyword_overlap`, `experience_alignment`, `board_weight`.
    pub components: BTreeMap<String, f64>,
    pub matched_keywords: Vec<String>,
    pub missing_keywords: Vec<String>,
    /// 1-based position after sorting.
    pub rank: usize,
}

/// A job board whose search failed during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardFailure {
    pub board: String,
    pub reason: String,
}

//! Scoring Engine: ranks job listings against a candidate profile.
//!
//! Pure and deterministic. No language-model calls, no clock, no randomness:
//! the same `(listings, profile, requested_count, config)` always produces the
//! same ordered output with the same scores.
//!
//! Algorithm:
//! 1. Deduplicate by canonical URL, keeping the deep fetch over the shallow one.
//! 2. Per listing compute three components in 0.0 – 1.0:
//!    - `keyword_overlap`: fraction of profile keywords found in title + description.
//!      Title-only listings are multiplied by `shallow_multiplier` since less text
//!      was available to match against.
//!    - `experience_alignment`: mean of `min(level, 7) / 7` over profile skills
//!      mentioned by the listing, 0.0 when none are.
//!    - `board_weight`: configured per board, 1.0 by default.
//! 3. Weighted sum, sort descending, ties by discovery order, truncate.

pub mod text;

use std::collections::{BTreeMap, BTreeSet};

use reqwest::Url;

use crate::models::{CandidateProfile, JobListing, ScoredListing};
use crate::models::profile::MAX_SKILL_LEVEL;

use self::text::{canonical_skill, contains_keyword, tokenize};

pub const KEYWORD_OVERLAP: &str = "keyword_overlap";
pub const EXPERIENCE_ALIGNMENT: &str = "experience_alignment";
pub const BOARD_WEIGHT: &str = "board_weight";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub keyword: f64,
    pub experience: f64,
    pub board: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            keyword: 0.5,
            experience: 0.3,
            board: 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoringConfig {
    pub weights: ScoringWeights,
    /// Board id → weight. Boards not listed get `default_board_weight`.
    pub board_weights: BTreeMap<String, f64>,
    pub default_board_weight: f64,
    /// Applied to the keyword component of listings without a description.
    pub shallow_multiplier: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            board_weights: BTreeMap::new(),
            default_board_weight: 1.0,
            shallow_multiplier: 0.5,
        }
    }
}

impl ScoringConfig {
    pub fn board_weight(&self, board: &str) -> f64 {
        self.board_weights
            .get(&board.to_lowercase())
            .copied()
            .unwrap_or(self.default_board_weight)
    }
}

/// The profile's matchable keywords: experienced skills by rank, then extra keywords.
pub fn profile_keywords(profile: &CandidateProfile) -> Vec<String> {
    let mut seen = BTreeSet::new();
    profile
        .ranked_skills()
        .into_iter()
        .map(|(skill, _)| skill.to_string())
        .chain(profile.extra_keywords.iter().map(|k| canonical_skill(k)))
        .filter(|k| !k.is_empty() && seen.insert(k.clone()))
        .collect()
}

/// Collapses listings sharing a URL into one, preferring the deep fetch.
///
/// The survivor keeps the earliest discovery index of its group, and borrows the
/// first available description in the group if it has none of its own. Output order is
/// the order in which each URL was first seen.
pub fn deduplicate(listings: &[JobListing]) -> Vec<JobListing> {
    let mut by_url: BTreeMap<String, usize> = BTreeMap::new();
    let mut unique: Vec<JobListing> = Vec::new();

    for listing in listings {
        let key = url_key(&listing.url);
        let Some(&slot) = by_url.get(&key) else {
            by_url.insert(key, unique.len());
            unique.push(listing.clone());
            continue;
        };

        let kept = &mut unique[slot];
        let discovery_index = kept.discovery_index.min(listing.discovery_index);
        if listing.depth > kept.depth {
            let previous = std::mem::replace(kept, listing.clone());
            if !kept.has_description() && previous.has_description() {
                kept.description = previous.description;
            }
        } else if listing.has_description() && !kept.has_description() {
            kept.description = listing.description.clone();
        }
        kept.discovery_index = discovery_index;
    }

    unique
}

/// Dedup key of a listing URL. Scheme and host are case-folded by the URL parser;
/// the path, query and fragment keep their case. Trailing slashes are ignored.
fn url_key(raw: &str) -> String {
    let raw = raw.trim();
    let normalized = match Url::parse(raw) {
        Ok(url) => url.to_string(),
        Err(_) => raw.to_string(),
    };
    normalized.trim_end_matches('/').to_string()
}

struct Components {
    keyword_overlap: f64,
    experience_alignment: f64,
    board_weight: f64,
    matched: Vec<String>,
    missing: Vec<String>,
}

fn components(
    listing: &JobListing,
    profile: &CandidateProfile,
    keywords: &[String],
    config: &ScoringConfig,
) -> Components {
    let tokens = if listing.has_description() {
        tokenize(&format!("{} {}", listing.title, listing.description))
    } else {
        tokenize(&listing.title)
    };

    let (matched, missing): (Vec<String>, Vec<String>) = keywords
        .iter()
        .cloned()
        .partition(|k| contains_keyword(&tokens, k));
    let mut keyword_overlap = matched.len() as f64 / keywords.len().max(1) as f64;
    if !listing.has_description() {
        keyword_overlap *= config.shallow_multiplier;
    }

    let levels: Vec<f64> = profile
        .skills
        .iter()
        .filter(|(skill, _)| contains_keyword(&tokens, skill))
        .map(|(_, level)| f64::from((*level).min(MAX_SKILL_LEVEL)) / f64::from(MAX_SKILL_LEVEL))
        .collect();
    let experience_alignment = if levels.is_empty() {
        0.0
    } else {
        levels.iter().sum::<f64>() / levels.len() as f64
    };

    Components {
        keyword_overlap,
        experience_alignment,
        board_weight: config.board_weight(&listing.board),
        matched,
        missing,
    }
}

/// Ranks `listings` for `profile` and returns at most `requested_count` of them.
pub fn score(
    listings: &[JobListing],
    profile: &CandidateProfile,
    requested_count: usize,
    config: &ScoringConfig,
) -> Vec<ScoredListing> {
    let keywords = profile_keywords(profile);
    let weights = config.weights;

    let mut scored: Vec<ScoredListing> = deduplicate(listings)
        .into_iter()
        .map(|listing| {
            let c = components(&listing, profile, &keywords, config);
            let total_score = weights.keyword * c.keyword_overlap
                + weights.experience * c.experience_alignment
                + weights.board * c.board_weight;
            ScoredListing {
                listing,
                total_score,
                components: BTreeMap::from([
                    (KEYWORD_OVERLAP.to_string(), c.keyword_overlap),
                    (EXPERIENCE_ALIGNMENT.to_string(), c.experience_alignment),
                    (BOARD_WEIGHT.to_string(), c.board_weight),
                ]),
                matched_keywords: c.matched,
                missing_keywords: c.missing,
                rank: 0,
            }
        })
        .collect();

    scored.sort_by(|a, b| {
        b.total_score
            .total_cmp(&a.total_score)
            .then_with(|| a.listing.discovery_index.cmp(&b.listing.discovery_index))
    });
    scored.truncate(requested_count);
    for (i, entry) in scored.iter_mut().enumerate() {
        entry.rank = i + 1;
    }
    scored
}

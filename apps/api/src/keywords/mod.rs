//! Keyword Deriver: turns a candidate profile into ranked search keywords.
//!
//! Primary path asks the language model. When the call fails or its answer does
//! not parse into a non-empty list, the deriver falls back to the profile's own
//! skill ranking followed by its extra keywords. The fallback is logged and
//! reported in the result, and never fails the run.

pub mod parse;
pub mod prompts;

use std::fmt;
use std::sync::Arc;

use tracing::{info, warn};

use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{GenerateOptions, TextGenerator};
use crate::models::CandidateProfile;
use crate::scoring::profile_keywords;

use self::parse::parse_keywords;
use self::prompts::{KEYWORD_PROMPT_TEMPLATE, MAX_KEYWORDS};

/// Where a keyword list came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeywordSource {
    Model,
    Fallback { reason: String },
}

impl fmt::Display for KeywordSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Model => f.write_str("model"),
            Self::Fallback { .. } => f.write_str("fallback"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordDerivation {
    pub keywords: Vec<String>,
    pub source: KeywordSource,
}

pub struct KeywordDeriver {
    llm: Arc<dyn TextGenerator>,
}

impl KeywordDeriver {
    pub fn new(llm: Arc<dyn TextGenerator>) -> Self {
        Self { llm }
    }

    pub async fn derive(&self, profile: &CandidateProfile) -> KeywordDerivation {
        let prompt = KEYWORD_PROMPT_TEMPLATE
            .replace("{max}", &MAX_KEYWORDS.to_string())
            .replace("{profile}", &profile.summary());
        let options = GenerateOptions::with_system(JSON_ONLY_SYSTEM).max_tokens(300);

        let reason = match self.llm.generate_text(&prompt, &options).await {
            Ok(raw) => match parse_keywords(&raw) {
                Some(mut keywords) => {
                    keywords.truncate(MAX_KEYWORDS);
                    info!(source = "model", count = keywords.len(), "search keywords derived");
                    return KeywordDerivation {
                        keywords,
                        source: KeywordSource::Model,
                    };
                }
                None => format!(
                    "unparsable model output: {}",
                    raw.chars().take(120).collect::<String>()
                ),
            },
            Err(e) => format!("provider error: {e}"),
        };

        let keywords = fallback_keywords(profile);
        warn!(
            source = "fallback",
            reason = %reason,
            count = keywords.len(),
            "search keywords derived from skill ranking"
        );
        KeywordDerivation {
            keywords,
            source: KeywordSource::Fallback { reason },
        }
    }
}

/// Skills with level ≥ 1, highest level first, ties alphabetical, then the
/// profile's extra keywords. Deduplicated and capped like a model answer.
pub fn fallback_keywords(profile: &CandidateProfile) -> Vec<String> {
    let mut keywords = profile_keywords(profile);
    keywords.truncate(MAX_KEYWORDS);
    keywords
}

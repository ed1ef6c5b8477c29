//! Profiler: normalises the intake submission into a `CandidateProfile` and
//! derives the search keywords from it.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::info;

use crate::keywords::KeywordDeriver;
use crate::llm_client::TextGenerator;
use crate::models::profile::{MAX_LETTER_COUNT, MAX_SKILL_LEVEL, MIN_LETTER_COUNT};
use crate::models::{CandidateProfile, IntakeForm, LetterStyle, ProfilePreferences};
use crate::pipeline::context::{ContextValue, StageScope};
use crate::pipeline::stage::StageError;
use crate::scoring::text::canonical_skill;

pub struct ProfilerStep {
    deriver: KeywordDeriver,
}

impl ProfilerStep {
    pub fn new(llm: Arc<dyn TextGenerator>) -> Self {
        Self {
            deriver: KeywordDeriver::new(llm),
        }
    }

    pub async fn execute(&self, scope: &mut StageScope<'_>) -> Result<(), StageError> {
        let profile = build_profile(scope.intake()?);
        let derivation = self.deriver.derive(&profile).await;
        info!(
            run_id = %scope.run_id(),
            skills = profile.skills.len(),
            keywords = ?derivation.keywords,
            source = %derivation.source,
            "candidate profile built"
        );

        scope.set(ContextValue::CandidateProfile(profile))?;
        scope.set(ContextValue::SearchKeywords(derivation.keywords))?;
        Ok(())
    }
}

/// Normalises a raw submission. Never fails: out-of-range values are clamped and
/// unknown values fall back to defaults.
pub fn build_profile(intake: &IntakeForm) -> CandidateProfile {
    let mut skills: BTreeMap<String, u8> = BTreeMap::new();
    for (raw, level) in &intake.skills {
        let key = canonical_skill(raw);
        if key.is_empty() {
            continue;
        }
        let level = (*level).min(MAX_SKILL_LEVEL);
        let entry = skills.entry(key).or_insert(level);
        *entry = (*entry).max(level);
    }

    let extra_keywords = dedup_lowercase(&intake.extra_keywords)
        .into_iter()
        .map(|k| canonical_skill(&k))
        .collect();

    CandidateProfile {
        narrative: intake.narrative.trim().to_string(),
        skills,
        extra_keywords,
        preferences: ProfilePreferences {
            job_levels: dedup_lowercase(&intake.job_levels),
            job_boards: dedup_lowercase(&intake.job_boards),
            deep_mode: intake.deep_mode,
            letter_count: intake.letter_count.clamp(MIN_LETTER_COUNT, MAX_LETTER_COUNT),
            letter_style: LetterStyle::parse_lenient(&intake.letter_style),
        },
    }
}

/// Trimmed, lowercased, first-occurrence-wins, blanks dropped.
fn dedup_lowercase(values: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for value in values {
        let v = value.trim().to_lowercase();
        if !v.is_empty() && !out.contains(&v) {
            out.push(v);
        }
    }
    out
}

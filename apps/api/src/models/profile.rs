use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Highest experience ordinal a questionnaire slider can carry.
pub const MAX_SKILL_LEVEL: u8 = 7;

/// Bounds on how many cover letters a single run may request.
pub const MIN_LETTER_COUNT: u32 = 1;
pub const MAX_LETTER_COUNT: u32 = 10;

/// Tone of the generated cover letters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LetterStyle {
    #[default]
    Professional,
    Friendly,
    Confident,
}

impl LetterStyle {
    /// Lenient parse used on questionnaire input. Unknown values fall back to the default.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "friendly" => Self::Friendly,
            "confident" => Self::Confident,
            _ => Self::Professional,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Professional => "professional",
            Self::Friendly => "friendly",
            Self::Confident => "confident",
        }
    }
}

impl fmt::Display for LetterStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw questionnaire submission, exactly as handed over by the intake layer.
///
/// Validation is the intake layer's job; the Profiler stage only normalises.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntakeForm {
    #[serde(default)]
    pub narrative: String,
    /// Skill/tool name → slider value. Values above 7 are clamped downstream.
    #[serde(default)]
    pub skills: BTreeMap<String, u8>,
    #[serde(default)]
    pub job_levels: Vec<String>,
    #[serde(default)]
    pub job_boards: Vec<String>,
    #[serde(default)]
    pub deep_mode: bool,
    #[serde(default = "default_letter_count")]
    pub letter_count: u32,
    #[serde(default)]
    pub letter_style: String,
    /// Free-text technologies typed into the "other" fields of the questionnaire.
    #[serde(default)]
    pub extra_keywords: Vec<String>,
}

fn default_letter_count() -> u32 {
    MIN_LETTER_COUNT
}

/// Selected preference fields of a candidate profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfilePreferences {
    pub job_levels: Vec<String>,
    /// Lowercased board ids. Empty means every configured board.
    pub job_boards: Vec<String>,
    pub deep_mode: bool,
    pub letter_count: u32,
    pub letter_style: LetterStyle,
}

/// Normalised candidate profile written by the Profiler stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub narrative: String,
    /// Canonical lowercase skill key → experience ordinal (0–7).
    pub skills: BTreeMap<String, u8>,
    /// Additional lowercase keywords supplied outside the slider map.
    pub extra_keywords: Vec<String>,
    pub preferences: ProfilePreferences,
}

impl CandidateProfile {
    /// Skill keys with any experience at all, most experienced first, ties alphabetical.
    pub fn ranked_skills(&self) -> Vec<(&str, u8)> {
        let mut ranked: Vec<(&str, u8)> = self
            .skills
            .iter()
            .filter(|(_, level)| **level >= 1)
            .map(|(key, level)| (key.as_str(), *level))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked
    }

    /// Prose summary handed to language-model prompts: the narrative followed by
    /// one sentence per skill describing its experience band.
    pub fn summary(&self) -> String {
        let mut summary = self.narrative.trim().to_string();
        for (skill, level) in self.ranked_skills() {
            if !summary.is_empty() {
                summary.push('\n');
            }
            summary.push_str(&format!(
                "I have {} of experience with {skill}.",
                experience_band(level)
            ));
        }
        if !self.preferences.job_levels.is_empty() {
            summary.push_str(&format!(
                "\nI am looking for {} level positions.",
                self.preferences.job_levels.join(", ")
            ));
        }
        summary
    }
}

/// Human-readable band for a slider ordinal.
pub fn experience_band(level: u8) -> &'static str {
    match level {
        0 => "no",
        1 => "less than half a year",
        2 => "less than a year",
        3 => "less than 1.5 years",
        4 => "less than 2 years",
        5 => "less than 2.5 years",
        6 => "less than 3 years",
        _ => "over 3 years",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(skills: &[(&str, u8)]) -> CandidateProfile {
        CandidateProfile {
            narrative: "Backend developer.".to_string(),
            skills: skills.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            extra_keywords: vec![],
            preferences: ProfilePreferences {
                job_levels: vec![],
                job_boards: vec![],
                deep_mode: true,
                letter_count: 1,
                letter_style: LetterStyle::Professional,
            },
        }
    }

    #[test]
    fn test_letter_style_parse_is_lenient() {
        assert_eq!(LetterStyle::parse_lenient(" Friendly "), LetterStyle::Friendly);
        assert_eq!(LetterStyle::parse_lenient("CONFIDENT"), LetterStyle::Confident);
        assert_eq!(LetterStyle::parse_lenient("sarcastic"), LetterStyle::Professional);
        assert_eq!(LetterStyle::parse_lenient(""), LetterStyle::Professional);
    }

    #[test]
    fn test_ranked_skills_orders_by_level_then_name() {
        let p = profile(&[("sql", 3), ("python", 5), ("bash", 3), ("cobol", 0)]);
        let ranked = p.ranked_skills();
        assert_eq!(ranked, vec![("python", 5), ("bash", 3), ("sql", 3)]);
    }

    #[test]
    fn test_summary_describes_experience_bands() {
        let p = profile(&[("python", 7), ("sql", 1)]);
        let summary = p.summary();
        assert!(summary.starts_with("Backend developer."));
        assert!(summary.contains("over 3 years of experience with python"));
        assert!(summary.contains("less than half a year of experience with sql"));
    }

    #[test]
    fn test_intake_defaults_letter_count_to_one() {
        let intake: IntakeForm = serde_json::from_str(r#"{"narrative": "hi"}"#).unwrap();
        assert_eq!(intake.letter_count, 1);
        assert!(intake.skills.is_empty());
        assert!(!intake.deep_mode);
    }
}

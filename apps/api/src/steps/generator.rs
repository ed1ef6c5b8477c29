//! Generator: drafts the cover letters and renders them into the run's document.

use std::sync::Arc;

use tracing::info;

use crate::llm_client::{GenerateOptions, TextGenerator};
use crate::pipeline::context::{ContextValue, StageScope};
use crate::pipeline::stage::StageError;
use crate::render::DocumentRenderer;
use crate::steps::prompts::{letter_system_prompt, LETTER_PROMPT_TEMPLATE};

const LETTER_MAX_TOKENS: u32 = 4000;

pub struct GeneratorStep {
    llm: Arc<dyn TextGenerator>,
    renderer: Arc<dyn DocumentRenderer>,
}

impl GeneratorStep {
    pub fn new(llm: Arc<dyn TextGenerator>, renderer: Arc<dyn DocumentRenderer>) -> Self {
        Self { llm, renderer }
    }

    pub async fn execute(&self, scope: &mut StageScope<'_>) -> Result<(), StageError> {
        let (summary, style) = {
            let profile = scope.candidate_profile()?;
            (profile.summary(), profile.preferences.letter_style)
        };
        // One letter per ranked listing; fewer may survive scoring than were requested.
        let count = scope.scored_listings()?.len();
        let report = scope.job_report()?.to_string();

        let prompt = LETTER_PROMPT_TEMPLATE
            .replace("{count}", &count.to_string())
            .replace("{profile}", &summary)
            .replace("{report}", &report);
        let options =
            GenerateOptions::with_system(letter_system_prompt(style)).max_tokens(LETTER_MAX_TOKENS);
        let draft = self.llm.generate_text(&prompt, &options).await?;

        let text = normalize_text(&draft);
        let document = self.renderer.render(&text, style).await?;
        info!(
            run_id = %scope.run_id(),
            %style,
            size_bytes = document.size_bytes,
            "cover letters rendered"
        );
        scope.set(ContextValue::GeneratedDocument(document))?;
        Ok(())
    }
}

/// CRLF to LF, trailing whitespace stripped, runs of blank lines collapsed to one.
pub fn normalize_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut blank_run = 0usize;
    for line in raw.replace("\r\n", "\n").replace('\r', "\n").lines() {
        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }
    out.trim().to_string()
}

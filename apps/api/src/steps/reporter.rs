//! Reporter: asks the language model how to pitch each ranked listing and
//! compiles the answers into the job report read by the Generator.

use std::fmt::Write as _;
use std::sync::Arc;

use tracing::info;

use crate::llm_client::{GenerateOptions, TextGenerator};
use crate::models::{BoardFailure, ScoredListing};
use crate::pipeline::context::{ContextValue, StageScope};
use crate::pipeline::stage::StageError;
use crate::steps::prompts::{INSTRUCTIONS_PROMPT_TEMPLATE, INSTRUCTIONS_SYSTEM};

/// Descriptions are cut to this many characters before prompting.
const MAX_DESCRIPTION_CHARS: usize = 4000;

pub struct ReporterStep {
    llm: Arc<dyn TextGenerator>,
}

impl ReporterStep {
    pub fn new(llm: Arc<dyn TextGenerator>) -> Self {
        Self { llm }
    }

    pub async fn execute(&self, scope: &mut StageScope<'_>) -> Result<(), StageError> {
        let summary = scope.candidate_profile()?.summary();
        let scored = scope.scored_listings()?.to_vec();
        let failures = scope.board_failures()?.to_vec();
        if scored.is_empty() {
            return Err(StageError::Invalid(
                "no scored listings to report on".to_string(),
            ));
        }

        let options = GenerateOptions::with_system(INSTRUCTIONS_SYSTEM).max_tokens(500);
        let mut sections = Vec::with_capacity(scored.len());
        for entry in &scored {
            let prompt = instructions_prompt(&summary, entry);
            let instructions = self.llm.generate_text(&prompt, &options).await?;
            sections.push(format_section(entry, instructions.trim()));
        }

        let report = assemble_report(&sections, &failures);
        info!(run_id = %scope.run_id(), listings = scored.len(), "job report written");
        scope.set(ContextValue::JobReport(report))?;
        Ok(())
    }
}

fn join_or_none(values: &[String]) -> String {
    if values.is_empty() {
        "none".to_string()
    } else {
        values.join(", ")
    }
}

fn instructions_prompt(summary: &str, entry: &ScoredListing) -> String {
    let listing = &entry.listing;
    let description = if listing.has_description() {
        listing
            .description
            .chars()
            .take(MAX_DESCRIPTION_CHARS)
            .collect::<String>()
    } else {
        "(not available, only the title was retrieved)".to_string()
    };
    INSTRUCTIONS_PROMPT_TEMPLATE
        .replace("{profile}", summary)
        .replace("{title}", &listing.title)
        .replace("{company}", &listing.company)
        .replace("{matched}", &join_or_none(&entry.matched_keywords))
        .replace("{missing}", &join_or_none(&entry.missing_keywords))
        .replace("{description}", &description)
}

fn format_section(entry: &ScoredListing, instructions: &str) -> String {
    let listing = &entry.listing;
    let mut section = String::new();
    let _ = writeln!(
        section,
        "{}. {} at {} ({})",
        entry.rank, listing.title, listing.company, listing.board
    );
    let _ = writeln!(section, "   Score: {:.0}%", entry.total_score * 100.0);
    let _ = writeln!(
        section,
        "   Matched keywords: {}",
        join_or_none(&entry.matched_keywords)
    );
    let _ = writeln!(
        section,
        "   Missing keywords: {}",
        join_or_none(&entry.missing_keywords)
    );
    let _ = writeln!(section, "   URL: {}", listing.url);
    let _ = writeln!(section, "   Cover letter instructions:");
    for line in instructions.lines() {
        let _ = writeln!(section, "   {line}");
    }
    section
}

fn assemble_report(sections: &[String], failures: &[BoardFailure]) -> String {
    let mut report = String::from("Job report\n==========\n\n");
    report.push_str(&sections.join("\n"));
    if !failures.is_empty() {
        report.push_str("\nBoards that could not be searched:\n");
        for failure in failures {
            let _ = writeln!(report, "- {}: {}", failure.board, failure.reason);
        }
    }
    report
}

// Prompt constants for the Reporter and Generator stages.
// Cross-cutting fragments come from llm_client::prompts.

use crate::models::LetterStyle;

/// System prompt for per-listing cover-letter instructions.
pub const INSTRUCTIONS_SYSTEM: &str = "You are an experienced career coach. \
    You read a job listing and a candidate profile and explain how the candidate \
    should pitch themselves in a cover letter for that listing. \
    Respond with plain text only, at most six short sentences. \
    Do NOT write the cover letter itself.";

/// Instructions prompt template.
/// Replace `{profile}`, `{title}`, `{company}`, `{matched}`, `{missing}`, `{description}`.
pub const INSTRUCTIONS_PROMPT_TEMPLATE: &str = r#"Candidate profile:
{profile}

Job listing:
Title: {title}
Company: {company}
Profile skills the listing mentions: {matched}
Profile skills the listing does not mention: {missing}
Description:
{description}

Explain which of the candidate's skills and experiences the cover letter should highlight for this listing, and how to address the gaps."#;

/// Letter drafting prompt template. Replace `{profile}`, `{report}`, `{count}`.
pub const LETTER_PROMPT_TEMPLATE: &str = r#"Write {count} cover letter(s), one for each job in the report below, in the order the report lists them.

Start each letter with a line of the form "=== <job title> at <company> ===".
Follow the cover letter instructions given for each job.

Candidate profile:
{profile}

Job report:
{report}"#;

/// System prompt for letter drafting, varying the tone with the requested style.
pub fn letter_system_prompt(style: LetterStyle) -> String {
    let tone = match style {
        LetterStyle::Professional => {
            "Write in a professional, formal tone. Keep sentences clear and measured."
        }
        LetterStyle::Friendly => {
            "Write in a warm, friendly tone while staying respectful. Show genuine enthusiasm."
        }
        LetterStyle::Confident => {
            "Write in a confident, direct tone. Lead with the candidate's strongest achievements."
        }
    };
    format!(
        "You are an expert cover letter writer. {tone} \
        Respond with plain text only. Do NOT use markdown formatting. {}",
        crate::llm_client::prompts::TRUTHFULNESS_INSTRUCTION
    )
}

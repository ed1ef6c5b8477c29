// Prompt constants for the Keyword Deriver.
// The JSON-only system prompt comes from llm_client::prompts.

/// Upper bound on keywords requested from the model.
pub const MAX_KEYWORDS: usize = 8;

/// Keyword prompt template. Replace `{profile}` and `{max}` before sending.
pub const KEYWORD_PROMPT_TEMPLATE: &str = r#"Based on the candidate profile below, choose the search keywords a job seeker should type into job board search boxes.

Return a JSON array of at most {max} strings, most important first, for example:
["python developer", "data engineer", "sql"]

Rules:
- Each keyword is a job title, technology or short skill phrase of one to three words.
- Prefer technologies the candidate has the most experience with.
- Do NOT repeat a keyword.
- Do NOT include seniority words on their own ("junior", "senior").

Candidate profile:
{profile}"#;

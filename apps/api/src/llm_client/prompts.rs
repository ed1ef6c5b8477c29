// Shared prompt fragments.
// Each module that needs LLM calls defines its own prompts.rs alongside it.

/// Default system prompt when a caller has nothing more specific.
pub const PLAIN_TEXT_SYSTEM: &str = "You are a careful career assistant. \
    Respond with plain text only. \
    Do NOT use markdown formatting. \
    Do NOT include explanations or apologies.";

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON value. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Appended to every prompt that writes about the candidate.
pub const TRUTHFULNESS_INSTRUCTION: &str = "\
    CRITICAL: Only use facts present in the candidate profile. \
    Do NOT invent employers, degrees, projects or years of experience.";

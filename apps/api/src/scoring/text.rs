//! Text normalisation shared by the Profiler and the Scoring Engine.

use std::collections::BTreeSet;

/// Common spellings folded onto one canonical skill key.
const SKILL_ALIASES: &[(&str, &str)] = &[
    ("py", "python"),
    ("python3", "python"),
    ("postgres", "postgresql"),
    ("psql", "postgresql"),
    ("js", "javascript"),
    ("ts", "typescript"),
    ("nodejs", "node.js"),
    ("node", "node.js"),
    ("reactjs", "react"),
    ("golang", "go"),
    ("k8s", "kubernetes"),
];

/// Maps a raw skill or token to its canonical lowercase spelling.
pub fn canonical_skill(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    SKILL_ALIASES
        .iter()
        .find(|(alias, _)| *alias == lowered)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(lowered)
}

/// Lowercased, alias-folded token set of a piece of text.
///
/// Tokens keep `+`, `#` and inner dots so `c++`, `c#` and `node.js` survive;
/// sentence punctuation around a token is dropped.
pub fn tokenize(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !(c.is_alphanumeric() || matches!(c, '+' | '#' | '.')))
        .map(|t| t.trim_matches('.'))
        .filter(|t| !t.is_empty())
        .map(canonical_skill)
        .collect()
}

/// True when every token of `keyword` occurs in `tokens`. Multi-word keywords
/// such as "machine learning" therefore match regardless of word distance.
pub fn contains_keyword(tokens: &BTreeSet<String>, keyword: &str) -> bool {
    let needed = tokenize(keyword);
    !needed.is_empty() && needed.iter().all(|t| tokens.contains(t))
}

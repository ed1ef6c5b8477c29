//! Lenient parsing of model output into a keyword list.
//!
//! Models wrap JSON in prose or code fences often enough that a plain
//! `serde_json::from_str` rejects usable answers. The parser strips fences,
//! then falls back to the first balanced JSON array or object in the text.

use std::collections::HashSet;

use serde_json::Value;

use crate::llm_client::strip_json_fences;

/// Parses `raw` into distinct, trimmed, non-empty keywords in model order.
///
/// Accepts a JSON array of strings, or an object whose values are strings or
/// arrays of strings (`{"keywords": [...]}`, `{"1": "rust", "2": "sql"}`).
/// Returns `None` when nothing usable is found.
pub fn parse_keywords(raw: &str) -> Option<Vec<String>> {
    let value = parse_json_value(raw)?;
    let mut collected = Vec::new();
    collect_strings(&value, &mut collected);

    let mut seen = HashSet::new();
    let keywords: Vec<String> = collected
        .into_iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty() && seen.insert(k.to_lowercase()))
        .collect();

    (!keywords.is_empty()).then_some(keywords)
}

fn parse_json_value(raw: &str) -> Option<Value> {
    let stripped = strip_json_fences(raw);
    if let Ok(value) = serde_json::from_str::<Value>(stripped) {
        return Some(value);
    }
    ['[', '{']
        .into_iter()
        .filter_map(|open| extract_balanced(stripped, open))
        .find_map(|candidate| serde_json::from_str::<Value>(candidate).ok())
}

/// First substring starting at `open` whose brackets balance, ignoring brackets in strings.
fn extract_balanced(text: &str, open: char) -> Option<&str> {
    let close = if open == '[' { ']' } else { '}' };
    let start = text.find(open)?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            c if c == open => depth += 1,
            c if c == close => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

fn collect_strings(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => out.push(s.clone()),
        Value::Array(items) => items.iter().for_each(|v| collect_strings(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_strings(v, out)),
        _ => {}
    }
}

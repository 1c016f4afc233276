//! Pure text classifiers shared by the extractor and the planner.
//!
//! Pure string matching, no I/O.

use std::sync::LazyLock;

use regex::Regex;

use crate::pipeline::types::Priority;

/// Currency symbol followed by digits, or digits followed by an ISO code.
static CURRENCY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[₹$€£]\s*\d+[,.\d]*|\d+\s*(?:INR|USD|EUR|GBP)").expect("valid currency regex")
});

/// Sentence boundary: terminal punctuation followed by whitespace.
static SENTENCE_END_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]\s+").expect("valid sentence regex"));

const HIGH_PRIORITY_KEYWORDS: &[&str] = &[
    "urgent",
    "asap",
    "immediately",
    "important",
    "high priority",
];

const LOW_PRIORITY_KEYWORDS: &[&str] = &["please", "when convenient", "whenever", "low", "minor"];

/// Return currency-like substrings in order of appearance, e.g. `["$150", "150 INR"]`.
pub fn extract_amounts(text: &str) -> Vec<String> {
    CURRENCY_RE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Infer urgency from free text. High keywords win over low ones.
pub fn infer_priority(text: &str) -> Priority {
    let lower = text.to_lowercase();
    if HIGH_PRIORITY_KEYWORDS.iter().any(|k| lower.contains(k)) {
        Priority::High
    } else if LOW_PRIORITY_KEYWORDS.iter().any(|k| lower.contains(k)) {
        Priority::Low
    } else {
        Priority::Medium
    }
}

/// Display name from an address: `jane.doe@x.com` → `Jane Doe`.
pub fn polite_name_from_email(email: &str) -> String {
    if email.is_empty() {
        return String::new();
    }
    let local = email.split('@').next().unwrap_or_default();
    title_case(&local.replace(['.', '_'], " "))
}

/// Uppercase the first letter of each alphabetic run, lowercase the rest.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_is_alpha = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if prev_is_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_alpha = true;
        } else {
            out.push(c);
            prev_is_alpha = false;
        }
    }
    out
}

/// First `max_sentences` sentences of `text`, joined by single spaces.
pub fn summarise_by_sentences(text: &str, max_sentences: usize) -> String {
    let text = text.trim();
    let mut parts = Vec::new();
    let mut start = 0;
    for m in SENTENCE_END_RE.find_iter(text) {
        // Keep the punctuation, drop the whitespace.
        let end = m.start() + 1;
        parts.push(&text[start..end]);
        start = m.end();
    }
    if start < text.len() || parts.is_empty() {
        parts.push(&text[start..]);
    }
    parts
        .into_iter()
        .take(max_sentences)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Truncate to `limit` characters, appending `...` when anything was cut.
pub fn truncate_with_ellipsis(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

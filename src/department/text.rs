use regex::Regex;
use std::sync::LazyLock;

static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\W").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Boilerplate words dropped before picking a department key.
pub const STOPWORDS: &[&str] = &[
    "department",
    "the",
    "of",
    "division",
    "medicine",
    "center",
    "and",
    "from",
    "a",
    "surgery",
];

/// Lowercase, turn every non-word character into a space, collapse runs of
/// whitespace and trim. Idempotent.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let spaced = NON_WORD.replace_all(&lowered, " ");
    WHITESPACE.replace_all(&spaced, " ").trim().to_string()
}

/// First token of the normalized text that is not a stop word, or `""`.
///
/// This is a heuristic: "Pediatric Cardiology" keys on "pediatric", not on
/// the specialty.
pub fn extract_key(department_text: &str, stopwords: &[&str]) -> String {
    normalize(department_text)
        .split(' ')
        .find(|token| !token.is_empty() && !stopwords.contains(token))
        .unwrap_or_default()
        .to_string()
}

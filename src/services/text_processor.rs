// Text Processing Service
// Normalisation and tokenising helpers shared by the detectors and the policy checks

use once_cell::sync::Lazy;
use regex::Regex;

static SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));
static SENTENCE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]+").expect("valid regex"));

/// Maximum characters kept in a candidate excerpt
pub const EXCERPT_MAX_CHARS: usize = 100;

/// Normalize extracted document text: smart quotes to ASCII, all whitespace
/// runs collapsed to a single space, trimmed.
pub fn normalize_whitespace(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let s = text
        .replace(['\u{201c}', '\u{201d}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'")
        .replace(['\u{3000}', '\u{00A0}'], " ");

    SPACE_RE.replace_all(&s, " ").trim().to_string()
}

/// Split on non-word characters and keep words longer than three characters.
///
/// Duplicates are preserved, order follows the input.
pub fn word_tokens(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|w| w.chars().count() > 3)
        .map(|w| w.to_string())
        .collect()
}

/// First `max_chars` characters of `text` (char-boundary safe).
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Candidate excerpt, at most 100 characters.
pub fn excerpt(text: &str) -> String {
    truncate_chars(text, EXCERPT_MAX_CHARS)
}

/// Slice of `text` spanning `radius` characters either side of `[start, end)`.
///
/// `start` and `end` must be char boundaries, as returned by `str::find`.
pub fn context_window(text: &str, start: usize, end: usize, radius: usize) -> &str {
    let lo = text[..start]
        .char_indices()
        .rev()
        .take(radius)
        .last()
        .map_or(start, |(i, _)| i);
    let hi = text[end..]
        .char_indices()
        .nth(radius)
        .map_or(text.len(), |(i, _)| end + i);
    &text[lo..hi]
}

/// Simple sentence splitting on terminal punctuation. Empty pieces are dropped.
pub fn split_sentences(text: &str) -> Vec<String> {
    if text.is_empty() {
        return vec![];
    }

    SENTENCE_RE
        .split(text)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// Whitespace-delimited word count.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

//! Fragment normalization: strips recognizer noise before any matching happens.

use lazy_static::lazy_static;
use regex::Regex;

use super::events::{ParseEvent, StageOutput};

lazy_static! {
    static ref BRACKETS: Regex = Regex::new(r"[\[\]{}|]").expect("valid bracket pattern");
    static ref DISALLOWED: Regex =
        Regex::new(r"[^\w\s\-.,/]").expect("valid disallowed-character pattern");
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("valid whitespace pattern");
}

/// Collapse whitespace runs to a single space and trim.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Normalize one fragment.
///
/// Brackets, braces and pipes are removed, then every character that is not a
/// word character, whitespace, `-`, `.`, `,` or `/`.
///
/// # Examples
///
/// ```rust
/// use address_ocr::address::normalize::normalize_fragment;
///
/// assert_eq!(normalize_fragment("  [ул.]   Ленина! "), "ул. Ленина");
/// assert_eq!(normalize_fragment("|*|"), "");
/// ```
pub fn normalize_fragment(text: &str) -> String {
    let text = BRACKETS.replace_all(text, "");
    let text = DISALLOWED.replace_all(&text, "");
    collapse_whitespace(&text)
}

/// Normalize every fragment, dropping those that end up empty.
pub fn normalize_fragments<S: AsRef<str>>(fragments: &[S]) -> StageOutput<Vec<String>> {
    let mut events = Vec::new();
    let mut normalized = Vec::with_capacity(fragments.len());

    for fragment in fragments {
        let original = fragment.as_ref();
        let cleaned = normalize_fragment(original);
        if cleaned.is_empty() {
            events.push(ParseEvent::FragmentDropped {
                original: original.to_string(),
            });
            continue;
        }
        if cleaned != original {
            events.push(ParseEvent::FragmentNormalized {
                original: original.to_string(),
                normalized: cleaned.clone(),
            });
        }
        normalized.push(cleaned);
    }

    StageOutput::new(normalized, events)
}

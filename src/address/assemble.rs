//! Street-name assembly and the fallbacks applied after it.

use lazy_static::lazy_static;
use regex::Regex;

use super::detect::{is_bare_number, HouseParts, StreetTypeMatch};
use super::events::{ParseEvent, SkipReason, StageOutput};
use super::normalize::collapse_whitespace;
use super::vocabulary::CompiledVocabulary;

lazy_static! {
    static ref TRAILING_NUMBER: Regex =
        Regex::new(r"(?i)^(.*\S)\s+(\d+[a-zа-яё]?)$").expect("valid trailing number pattern");
}

/// Join the fragments that are neither street type nor house number.
pub fn assemble_street_name(
    fragments: &[String],
    street_type: Option<&StreetTypeMatch>,
    house: &HouseParts,
    vocabulary: &CompiledVocabulary,
) -> StageOutput<String> {
    let mut events = Vec::new();
    let mut kept = Vec::new();

    for (index, fragment) in fragments.iter().enumerate() {
        let is_street_type = street_type.is_some_and(|st| {
            st.fragment_index == Some(index) || {
                let lower = fragment.trim().to_lowercase();
                lower == st.token || lower.strip_suffix('.') == Some(st.token.as_str())
            }
        });

        let reason = if is_street_type {
            Some(SkipReason::StreetType)
        } else if house.consumed.contains(&index) {
            Some(SkipReason::HousePart)
        } else if is_bare_number(fragment) {
            Some(SkipReason::BareNumber)
        } else if vocabulary.qualifier_word.is_match(fragment) {
            Some(SkipReason::Qualifier)
        } else {
            None
        };

        match reason {
            Some(reason) => events.push(ParseEvent::FragmentSkipped {
                fragment_index: index,
                text: fragment.clone(),
                reason,
            }),
            None => kept.push(fragment.as_str()),
        }
    }

    StageOutput::new(kept.join(" "), events)
}

/// Remove a street type that was found only in the combined text from the name.
///
/// A type detected as its own fragment was already skipped during assembly, so
/// the name is returned unchanged in that case.
pub fn remove_street_type_from_name(
    street_name: &str,
    street_type: &StreetTypeMatch,
    vocabulary: &CompiledVocabulary,
) -> String {
    if street_type.fragment_index.is_some() {
        return street_name.to_string();
    }
    match vocabulary
        .street_types
        .iter()
        .find(|t| t.token == street_type.token)
    {
        Some(token) => collapse_whitespace(&token.remove_from(street_name)),
        None => street_name.to_string(),
    }
}

/// Outcome of the trailing-number fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrailingSplit {
    /// `<name> <number>` was split
    Accepted { street_name: String, house_number: String },
    /// The trailing number exceeded the limit
    Rejected { number: String },
    /// The name does not end in a number
    NotFound,
}

/// Split a trailing house number off the street name.
///
/// The split is accepted only when the number's digits are at most
/// `max_house_number`, so years and postal indices stay in the name.
pub fn split_trailing_number(street_name: &str, max_house_number: u64) -> TrailingSplit {
    let Some(caps) = TRAILING_NUMBER.captures(street_name) else {
        return TrailingSplit::NotFound;
    };
    let number = caps[2].to_string();
    let digits: String = number.chars().take_while(|c| c.is_ascii_digit()).collect();

    match digits.parse::<u64>() {
        Ok(value) if value <= max_house_number => TrailingSplit::Accepted {
            street_name: caps[1].to_string(),
            house_number: number,
        },
        _ => TrailingSplit::Rejected { number },
    }
}

/// Find a street type inside the street name and remove it.
///
/// Returns the token and the remaining name.
pub fn backfill_street_type(
    street_name: &str,
    vocabulary: &CompiledVocabulary,
) -> Option<(String, String)> {
    vocabulary
        .street_types
        .iter()
        .find(|token| token.find_in(street_name).is_some())
        .map(|token| (token.token.clone(), token.remove_from(street_name)))
}

/// Collapse and trim whitespace in the street name.
pub fn finalize_street_name(street_name: &str) -> String {
    collapse_whitespace(street_name)
}

/// Strip separators (`.`, `,`, `-`, `/`) left at the edges of the street name.
pub fn strip_edge_separators(street_name: &str) -> String {
    street_name
        .trim_matches(|c: char| matches!(c, '.' | ',' | '-' | '/') || c.is_whitespace())
        .to_string()
}

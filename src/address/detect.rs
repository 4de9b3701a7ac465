//! Street-type and house-number detection over the repaired fragment list.

use std::collections::BTreeSet;

use lazy_static::lazy_static;
use regex::Regex;

use super::events::{HousePartKind, ParseEvent, StageOutput};
use super::vocabulary::CompiledVocabulary;

lazy_static! {
    static ref BARE_NUMBER: Regex =
        Regex::new(r"(?i)^\d+[a-zа-яё]?$").expect("valid bare number pattern");
}

/// A fragment made only of a number with an optional single letter ("25", "14а").
pub fn is_bare_number(fragment: &str) -> bool {
    BARE_NUMBER.is_match(fragment.trim())
}

/// Detected street type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreetTypeMatch {
    /// Vocabulary token, lowercase
    pub token: String,
    /// Fragment the token was found in; `None` when found in the combined text
    pub fragment_index: Option<usize>,
}

/// Find the street type.
///
/// Single fragments are tried first in their original order, each against the
/// vocabulary sorted longest first. When no fragment is a street type on its
/// own, the combined text is searched for a whole-word token instead.
pub fn detect_street_type(
    fragments: &[String],
    combined: &str,
    vocabulary: &CompiledVocabulary,
) -> Option<StreetTypeMatch> {
    let by_fragment = fragments.iter().enumerate().find_map(|(index, fragment)| {
        vocabulary
            .street_type_of_fragment(fragment)
            .map(|token| StreetTypeMatch {
                token: token.token.clone(),
                fragment_index: Some(index),
            })
    });
    if by_fragment.is_some() {
        return by_fragment;
    }

    vocabulary
        .street_types
        .iter()
        .find(|token| token.find_in(combined).is_some())
        .map(|token| StreetTypeMatch {
            token: token.token.clone(),
            fragment_index: None,
        })
}

/// House-number parts and the fragments they came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HouseParts {
    /// Bare numbers first (front-inserted), then qualified parts in encounter order
    pub parts: Vec<String>,
    /// Indices of fragments used for the house number
    pub consumed: BTreeSet<usize>,
}

impl HouseParts {
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Parts joined with single spaces.
    pub fn house_number(&self) -> String {
        self.parts.join(" ")
    }
}

/// Collect house-number parts.
///
/// A fragment containing a building qualifier followed by a number becomes a
/// qualified part and is appended. Otherwise a fragment that is a bare number
/// is inserted at the front, so a plain number precedes every qualifier.
pub fn detect_house_parts(
    fragments: &[String],
    vocabulary: &CompiledVocabulary,
) -> StageOutput<HouseParts> {
    let mut events = Vec::new();
    let mut house = HouseParts::default();

    for (index, fragment) in fragments.iter().enumerate() {
        let kind = if vocabulary.qualified_number.is_match(fragment) {
            house.parts.push(fragment.clone());
            HousePartKind::Qualified
        } else if is_bare_number(fragment) {
            house.parts.insert(0, fragment.clone());
            HousePartKind::BareNumber
        } else {
            continue;
        };

        house.consumed.insert(index);
        events.push(ParseEvent::HousePartDetected {
            fragment_index: index,
            part: fragment.clone(),
            kind,
        });
    }

    StageOutput::new(house, events)
}

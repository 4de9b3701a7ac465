//! # Address Parsing Module
//!
//! Turns the confidence-filtered fragment texts of one photograph into an
//! [`AddressRecord`]. Parsing is an ordered pipeline of pure stages:
//!
//! 1. normalize each fragment ([`normalize`])
//! 2. rejoin letters split inside a fragment, then words split across fragments ([`repair`])
//! 3. combine fragments into the raw text
//! 4. detect the street type and the house-number parts ([`detect`])
//! 5. assemble the street name, with trailing-number and street-type fallbacks ([`assemble`])
//!
//! Every stage decision is reported to a [`ParseObserver`].

pub mod assemble;
pub mod detect;
pub mod events;
pub mod fuzzy;
pub mod normalize;
pub mod repair;
pub mod vocabulary;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::ParserConfig;
use crate::errors::AppResult;
use crate::observability::{parse_span, record_parse_metrics};

use assemble::{
    assemble_street_name, backfill_street_type, finalize_street_name,
    remove_street_type_from_name, split_trailing_number, strip_edge_separators, TrailingSplit,
};
use detect::{detect_house_parts, detect_street_type};
use normalize::{collapse_whitespace, normalize_fragments};
use repair::{repair_across_fragments, repair_within_fragments};

pub use events::{
    HousePartKind, ParseEvent, ParseObserver, RecordingObserver, SkipReason, TracingObserver,
};
pub use vocabulary::{
    load_vocabulary, load_vocabulary_from, AddressVocabulary, CompiledVocabulary,
    DEFAULT_VOCABULARY,
};

/// Structured address extracted from a photograph.
///
/// Fields are never absent; an empty string means the part was not found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRecord {
    /// Street-type token as it appears in the vocabulary ("улица", "пр-т")
    pub street_type: String,
    pub street_name: String,
    /// Bare number first, then building qualifiers ("14 стр 1")
    pub house_number: String,
    /// Normalized, repaired fragments joined with spaces
    pub raw: String,
}

impl AddressRecord {
    /// No street type, name or house number was found.
    pub fn is_empty(&self) -> bool {
        self.street_type.is_empty() && self.street_name.is_empty() && self.house_number.is_empty()
    }

    /// One-line address for display.
    ///
    /// Joins street type, name and house number; falls back to the raw text when
    /// nothing was extracted.
    pub fn full_address(&self) -> String {
        let parts: Vec<&str> = [
            self.street_type.as_str(),
            self.street_name.as_str(),
            self.house_number.as_str(),
        ]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect();

        if parts.is_empty() {
            self.raw.clone()
        } else {
            parts.join(" ")
        }
    }
}

/// Noise-tolerant street address parser.
///
/// Cheap to clone and safe to share between threads.
#[derive(Clone)]
pub struct AddressParser {
    vocabulary: Arc<CompiledVocabulary>,
    observer: Arc<dyn ParseObserver>,
    max_trailing_house_number: u64,
    clean_street_name: bool,
}

impl std::fmt::Debug for AddressParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddressParser")
            .field("street_types", &self.vocabulary.street_types.len())
            .field("max_trailing_house_number", &self.max_trailing_house_number)
            .field("clean_street_name", &self.clean_street_name)
            .finish()
    }
}

impl Default for AddressParser {
    fn default() -> Self {
        Self {
            vocabulary: Arc::new(DEFAULT_VOCABULARY.clone()),
            observer: Arc::new(TracingObserver),
            max_trailing_house_number: ParserConfig::default().max_trailing_house_number as u64,
            clean_street_name: false,
        }
    }
}

impl AddressParser {
    /// Create a parser for `vocabulary`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use address_ocr::address::{AddressParser, AddressVocabulary};
    ///
    /// let parser = AddressParser::new(&AddressVocabulary::default())?;
    /// let record = parser.parse(&["Садовая", "25"]);
    /// assert_eq!(record.street_name, "Садовая");
    /// assert_eq!(record.house_number, "25");
    /// # Ok::<(), address_ocr::errors::AppError>(())
    /// ```
    pub fn new(vocabulary: &AddressVocabulary) -> AppResult<Self> {
        Ok(Self {
            vocabulary: Arc::new(CompiledVocabulary::compile(vocabulary)?),
            ..Self::default()
        })
    }

    /// Create a parser from configuration.
    ///
    /// An explicit vocabulary path must load; otherwise the default search
    /// locations are tried, ending with the built-in vocabulary.
    pub fn from_config(config: &ParserConfig) -> AppResult<Self> {
        config.validate()?;
        let vocabulary = match &config.vocabulary_path {
            Some(path) => load_vocabulary_from(path)?,
            None => load_vocabulary(),
        };
        Ok(Self::new(&vocabulary)?
            .with_max_trailing_house_number(config.max_trailing_house_number)
            .with_street_name_cleanup(config.clean_street_name))
    }

    /// Replace the observer that receives parse events.
    pub fn with_observer(mut self, observer: Arc<dyn ParseObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Largest trailing number that is split off the street name as a house number.
    pub fn with_max_trailing_house_number(mut self, max: u32) -> Self {
        self.max_trailing_house_number = max as u64;
        self
    }

    /// Also strip a street type found only in the combined text from the name,
    /// and separators left at the name's edges. Off by default.
    pub fn with_street_name_cleanup(mut self, enabled: bool) -> Self {
        self.clean_street_name = enabled;
        self
    }

    fn emit(&self, events: &[ParseEvent]) {
        for event in events {
            self.observer.on_event(event);
        }
    }

    /// Parse recognized fragment texts into an address.
    ///
    /// Never fails: empty or unusable input gives a record with empty fields.
    pub fn parse<S: AsRef<str>>(&self, fragments: &[S]) -> AddressRecord {
        let span = parse_span(fragments.len());
        let _enter = span.enter();
        let vocabulary = self.vocabulary.as_ref();

        let normalized = normalize_fragments(fragments);
        self.emit(&normalized.events);

        let repaired = repair_within_fragments(&normalized.value, vocabulary);
        self.emit(&repaired.events);

        let merged = repair_across_fragments(&repaired.value, vocabulary);
        self.emit(&merged.events);
        let fragments = merged.value;

        let raw = fragments.join(" ");

        let street_type = detect_street_type(&fragments, &raw, vocabulary);
        if let Some(st) = &street_type {
            self.emit(&[ParseEvent::StreetTypeDetected {
                token: st.token.clone(),
                fragment_index: st.fragment_index,
            }]);
        }

        let house = detect_house_parts(&fragments, vocabulary);
        self.emit(&house.events);
        let house = house.value;

        let mut street_name =
            assemble_street_name(&fragments, street_type.as_ref(), &house, vocabulary);
        self.emit(&street_name.events);
        if let Some(st) = street_type.as_ref().filter(|_| self.clean_street_name) {
            street_name.value = remove_street_type_from_name(&street_name.value, st, vocabulary);
        }

        let (street_name, house_number) = if house.is_empty() {
            match split_trailing_number(&street_name.value, self.max_trailing_house_number) {
                TrailingSplit::Accepted {
                    street_name,
                    house_number,
                } => {
                    self.emit(&[ParseEvent::TrailingNumberAccepted {
                        number: house_number.clone(),
                    }]);
                    (street_name, house_number)
                }
                TrailingSplit::Rejected { number } => {
                    self.emit(&[ParseEvent::TrailingNumberRejected { number }]);
                    (street_name.value, String::new())
                }
                TrailingSplit::NotFound => (street_name.value, String::new()),
            }
        } else {
            (street_name.value, house.house_number())
        };

        let (street_type, street_name) = match street_type {
            Some(st) => (st.token, street_name),
            None if !street_name.is_empty() => {
                match backfill_street_type(&street_name, vocabulary) {
                    Some((token, remaining)) => {
                        self.emit(&[ParseEvent::StreetTypeBackfilled {
                            token: token.clone(),
                        }]);
                        (token, remaining)
                    }
                    None => (String::new(), street_name),
                }
            }
            None => (String::new(), street_name),
        };

        let mut street_name = finalize_street_name(&street_name);
        if self.clean_street_name {
            street_name = strip_edge_separators(&street_name);
        }

        let record = AddressRecord {
            street_type,
            street_name,
            house_number: collapse_whitespace(&house_number),
            raw,
        };

        record_parse_metrics(!record.street_type.is_empty(), !record.house_number.is_empty());
        self.emit(&[ParseEvent::Completed {
            record: record.clone(),
        }]);
        record
    }
}

//! # Address Vocabulary
//!
//! Street-type tokens, building qualifiers and the repair tables the parser is
//! configured with. The vocabulary is plain data loaded from
//! `config/address_vocabulary.json` (or the built-in Russian default) and is
//! compiled once into [`CompiledVocabulary`] when a parser is built.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::errors::{AppError, AppResult};

/// One intra-fragment repair: a case-insensitive pattern and the word it restores.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RepairRule {
    pub pattern: String,
    pub replacement: String,
}

/// A street-type word that recognizers tend to emit as two adjacent boxes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SplitWord {
    pub prefix: String,
    pub suffix: String,
    pub word: String,
}

/// Vocabulary configuration loaded from JSON
///
/// Expected JSON structure in `config/address_vocabulary.json`:
/// ```json
/// {
///   "street_types": ["улица", "ул.", "ул"],
///   "building_qualifiers": ["корпус", "корп", "к"],
///   "intra_fragment_repairs": [{ "pattern": "у\\s*л\\s*и\\s*ц\\s*а", "replacement": "улица" }],
///   "spelled_keywords": ["улица"],
///   "split_words": [{ "prefix": "пр-", "suffix": "т", "word": "пр-т" }]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AddressVocabulary {
    pub street_types: Vec<String>,
    pub building_qualifiers: Vec<String>,
    #[serde(default)]
    pub intra_fragment_repairs: Vec<RepairRule>,
    /// Keywords whose letters may arrive spread over several fragments.
    /// Every two-way split of these words is also repaired.
    #[serde(default)]
    pub spelled_keywords: Vec<String>,
    #[serde(default)]
    pub split_words: Vec<SplitWord>,
}

const DEFAULT_STREET_TYPES: &[&str] = &[
    "улица", "ул.", "ул", "проспект", "пр-т", "пр.", "пр", "переулок", "пер.", "пер", "бульвар",
    "б-р", "бул.", "проезд", "пр-д", "шоссе", "ш.", "набережная", "наб.", "площадь", "пл.",
    "микрорайон", "мкр.", "мкр", "тупик", "аллея", "квартал",
];

const DEFAULT_BUILDING_QUALIFIERS: &[&str] =
    &["корпус", "корп", "к", "строение", "стр", "с", "литера", "лит", "block", "bldg"];

const DEFAULT_SPELLED_KEYWORDS: &[&str] = &[
    "улица", "проспект", "переулок", "бульвар", "проезд", "шоссе", "набережная", "площадь",
    "микрорайон", "тупик", "аллея", "квартал",
];

const DEFAULT_SPLIT_WORDS: &[(&str, &str, &str)] =
    &[("пр-", "т", "пр-т"), ("пр-", "д", "пр-д"), ("б-", "р", "б-р")];

/// Pattern matching the letters of `word` with optional whitespace between them.
pub fn spaced_letters_pattern(word: &str) -> String {
    word.chars()
        .map(|c| regex::escape(&c.to_string()))
        .collect::<Vec<_>>()
        .join(r"\s*")
}

impl Default for AddressVocabulary {
    fn default() -> Self {
        let to_strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Self {
            street_types: to_strings(DEFAULT_STREET_TYPES),
            building_qualifiers: to_strings(DEFAULT_BUILDING_QUALIFIERS),
            intra_fragment_repairs: DEFAULT_SPELLED_KEYWORDS
                .iter()
                .map(|word| RepairRule {
                    pattern: spaced_letters_pattern(word),
                    replacement: word.to_string(),
                })
                .collect(),
            spelled_keywords: to_strings(DEFAULT_SPELLED_KEYWORDS),
            split_words: DEFAULT_SPLIT_WORDS
                .iter()
                .map(|(prefix, suffix, word)| SplitWord {
                    prefix: prefix.to_string(),
                    suffix: suffix.to_string(),
                    word: word.to_string(),
                })
                .collect(),
        }
    }
}

impl AddressVocabulary {
    /// Validate vocabulary configuration
    pub fn validate(&self) -> AppResult<()> {
        if self.street_types.is_empty() {
            return Err(AppError::Config("street_types cannot be empty".to_string()));
        }
        if self.building_qualifiers.is_empty() {
            return Err(AppError::Config(
                "building_qualifiers cannot be empty".to_string(),
            ));
        }

        // Validate that all entries are non-empty and contain valid characters
        let validate_entries = |entries: &[String], category: &str| -> AppResult<()> {
            for (i, entry) in entries.iter().enumerate() {
                if entry.trim().is_empty() {
                    return Err(AppError::Config(format!(
                        "{}[{}] cannot be empty",
                        category, i
                    )));
                }
                if entry.chars().any(|c| c.is_control()) {
                    return Err(AppError::Config(format!(
                        "{}[{}] '{}' contains control characters",
                        category, i, entry
                    )));
                }
            }
            Ok(())
        };

        validate_entries(&self.street_types, "street_types")?;
        validate_entries(&self.building_qualifiers, "building_qualifiers")?;
        validate_entries(&self.spelled_keywords, "spelled_keywords")?;

        for (i, rule) in self.intra_fragment_repairs.iter().enumerate() {
            if rule.pattern.trim().is_empty() || rule.replacement.trim().is_empty() {
                return Err(AppError::Config(format!(
                    "intra_fragment_repairs[{}] needs a pattern and a replacement",
                    i
                )));
            }
            if Regex::new(&rule.pattern).is_err() {
                return Err(AppError::Config(format!(
                    "intra_fragment_repairs[{}] pattern '{}' is not a valid regex",
                    i, rule.pattern
                )));
            }
        }

        for (i, split) in self.split_words.iter().enumerate() {
            if split.prefix.trim().is_empty()
                || split.suffix.trim().is_empty()
                || split.word.trim().is_empty()
            {
                return Err(AppError::Config(format!(
                    "split_words[{}] needs a prefix, a suffix and a word",
                    i
                )));
            }
        }

        Ok(())
    }
}

/// Read, parse and validate a vocabulary file.
pub fn load_vocabulary_from(path: impl AsRef<Path>) -> AppResult<AddressVocabulary> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        AppError::Config(format!(
            "Failed to read vocabulary '{}': {}",
            path.display(),
            e
        ))
    })?;
    let vocabulary: AddressVocabulary = serde_json::from_str(&content).map_err(|e| {
        AppError::Config(format!(
            "Failed to parse vocabulary '{}': {}",
            path.display(),
            e
        ))
    })?;
    vocabulary.validate()?;
    Ok(vocabulary)
}

/// Load the address vocabulary.
///
/// Tries `ADDRESS_VOCABULARY_PATH`, then the conventional config locations, and
/// falls back to the built-in default when no usable file is found.
pub fn load_vocabulary() -> AddressVocabulary {
    // First, try to get path from environment variable
    if let Ok(config_path) = std::env::var("ADDRESS_VOCABULARY_PATH") {
        info!(
            "Loading address vocabulary from environment variable: {}",
            config_path
        );
        match load_vocabulary_from(&config_path) {
            Ok(vocabulary) => return vocabulary,
            Err(e) => warn!("{}. Falling back to default paths.", e),
        }
    }

    let possible_paths = [
        "/app/config/address_vocabulary.json", // Docker path
        "config/address_vocabulary.json",      // Local development path
        "../config/address_vocabulary.json",   // Test path
    ];

    for config_path in &possible_paths {
        if !Path::new(config_path).exists() {
            continue;
        }
        match load_vocabulary_from(config_path) {
            Ok(vocabulary) => {
                info!(
                    "Successfully loaded address vocabulary from fallback path: {}",
                    config_path
                );
                return vocabulary;
            }
            Err(e) => {
                warn!("{}. Trying next path.", e);
                continue;
            }
        }
    }

    warn!("No address vocabulary file found in any expected location. Using built-in vocabulary.");
    AddressVocabulary::default()
}

/// Regex that finds `alternatives` as a whole word and captures it in group 1.
///
/// `\b` cannot be used because tokens such as "ул." end in a non-word character.
fn whole_word_regex(alternatives: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r"(?i)(?:^|[^\w])({})(?:[^\w]|$)", alternatives))
}

fn sorted_longest_first(entries: &[String]) -> Vec<String> {
    let mut sorted: Vec<String> = Vec::with_capacity(entries.len());
    for entry in entries {
        let entry = entry.trim().to_lowercase();
        if !sorted.contains(&entry) {
            sorted.push(entry);
        }
    }
    // Stable: ties keep configuration order.
    sorted.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));
    sorted
}

fn alternation(tokens: &[String]) -> String {
    tokens
        .iter()
        .map(|t| regex::escape(t))
        .collect::<Vec<_>>()
        .join("|")
}

/// A street-type token together with its whole-word matcher.
#[derive(Debug, Clone)]
pub struct StreetTypeToken {
    pub token: String,
    matcher: Regex,
}

impl StreetTypeToken {
    /// Byte range of the first whole-word occurrence in `text`.
    pub fn find_in(&self, text: &str) -> Option<std::ops::Range<usize>> {
        self.matcher
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.range())
    }

    /// Removes every whole-word occurrence of the token from `text`.
    pub fn remove_from(&self, text: &str) -> String {
        let mut result = text.to_string();
        while let Some(range) = self.find_in(&result) {
            result.replace_range(range, " ");
        }
        result
    }
}

/// Vocabulary with every pattern compiled and every list in matching order.
#[derive(Debug, Clone)]
pub struct CompiledVocabulary {
    /// Street types, longest first
    pub street_types: Vec<StreetTypeToken>,
    /// Building qualifiers, longest first
    pub building_qualifiers: Vec<String>,
    /// Qualifier keyword followed by a number with an optional letter
    pub qualified_number: Regex,
    /// Qualifier keyword as a whole word
    pub qualifier_word: Regex,
    /// All repair rules as one alternation, group `r{i}` per rule
    pub repair_matcher: Option<Regex>,
    pub repair_replacements: Vec<String>,
    /// Lowercase spelled-out keywords for the three-fragment merge
    pub spelled_keywords: Vec<String>,
    /// (prefix, suffix) → word, lowercase
    pub split_words: Vec<SplitWord>,
}

impl CompiledVocabulary {
    /// Compile a validated vocabulary.
    pub fn compile(vocabulary: &AddressVocabulary) -> AppResult<Self> {
        vocabulary.validate()?;
        let regex_error = |e: regex::Error| AppError::Config(format!("Invalid vocabulary: {}", e));

        let street_types = sorted_longest_first(&vocabulary.street_types)
            .into_iter()
            .map(|token| {
                let matcher = whole_word_regex(&regex::escape(&token)).map_err(regex_error)?;
                Ok(StreetTypeToken { token, matcher })
            })
            .collect::<AppResult<Vec<_>>>()?;

        let building_qualifiers = sorted_longest_first(&vocabulary.building_qualifiers);
        let qualifiers = alternation(&building_qualifiers);
        let qualified_number = whole_word_regex(&format!(
            r"(?:{})[\s.,]*\d+[a-zа-яё]?",
            qualifiers
        ))
        .map_err(regex_error)?;
        let qualifier_word = whole_word_regex(&qualifiers).map_err(regex_error)?;

        let repair_matcher = if vocabulary.intra_fragment_repairs.is_empty() {
            None
        } else {
            let alternatives = vocabulary
                .intra_fragment_repairs
                .iter()
                .enumerate()
                .map(|(i, rule)| format!("(?P<r{}>{})", i, rule.pattern))
                .collect::<Vec<_>>()
                .join("|");
            Some(Regex::new(&format!("(?i){}", alternatives)).map_err(regex_error)?)
        };

        let spelled_keywords = sorted_longest_first(&vocabulary.spelled_keywords);

        let mut split_words: Vec<SplitWord> = vocabulary
            .split_words
            .iter()
            .map(|s| SplitWord {
                prefix: s.prefix.trim().to_lowercase(),
                suffix: s.suffix.trim().to_lowercase(),
                word: s.word.trim().to_lowercase(),
            })
            .collect();
        for keyword in &spelled_keywords {
            let chars: Vec<char> = keyword.chars().collect();
            for cut in 1..chars.len() {
                let split = SplitWord {
                    prefix: chars[..cut].iter().collect(),
                    suffix: chars[cut..].iter().collect(),
                    word: keyword.clone(),
                };
                if !split_words.contains(&split) {
                    split_words.push(split);
                }
            }
        }

        debug!(
            target: "address_parser",
            "Compiled vocabulary: {} street types, {} qualifiers, {} repair rules, {} split words",
            street_types.len(),
            building_qualifiers.len(),
            vocabulary.intra_fragment_repairs.len(),
            split_words.len()
        );

        Ok(Self {
            street_types,
            building_qualifiers,
            qualified_number,
            qualifier_word,
            repair_matcher,
            repair_replacements: vocabulary
                .intra_fragment_repairs
                .iter()
                .map(|r| r.replacement.clone())
                .collect(),
            spelled_keywords,
            split_words,
        })
    }

    /// Whole word for a two-fragment split, if `(prefix, suffix)` is one.
    pub fn split_word(&self, prefix: &str, suffix: &str) -> Option<&str> {
        self.split_words
            .iter()
            .find(|s| s.prefix == prefix && s.suffix == suffix)
            .map(|s| s.word.as_str())
    }

    /// Street-type token equal to `fragment`, with or without a trailing period.
    pub fn street_type_of_fragment(&self, fragment: &str) -> Option<&StreetTypeToken> {
        let lower = fragment.trim().to_lowercase();
        self.street_types.iter().find(|t| {
            lower == t.token || lower.strip_suffix('.').is_some_and(|stem| stem == t.token)
        })
    }
}

lazy_static! {
    /// The built-in vocabulary, compiled once.
    pub static ref DEFAULT_VOCABULARY: CompiledVocabulary =
        CompiledVocabulary::compile(&AddressVocabulary::default())
            .expect("Built-in address vocabulary should be valid");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_vocabulary_is_valid() {
        assert!(AddressVocabulary::default().validate().is_ok());
        assert!(!DEFAULT_VOCABULARY.street_types.is_empty());
    }

    #[test]
    fn test_street_types_sorted_longest_first() {
        let tokens: Vec<&str> = DEFAULT_VOCABULARY
            .street_types
            .iter()
            .map(|t| t.token.as_str())
            .collect();
        let lengths: Vec<usize> = tokens.iter().map(|t| t.chars().count()).collect();
        assert!(lengths.windows(2).all(|w| w[0] >= w[1]));
        // Ties keep configuration order.
        let ul_dot = tokens.iter().position(|t| *t == "ул.").unwrap();
        let pr_t = tokens.iter().position(|t| *t == "пр-т").unwrap();
        assert!(tokens.iter().position(|t| *t == "улица").unwrap() < ul_dot);
        assert!(pr_t < tokens.iter().position(|t| *t == "пр").unwrap());
    }

    #[test]
    fn test_whole_word_token_with_trailing_period() {
        let token = DEFAULT_VOCABULARY
            .street_types
            .iter()
            .find(|t| t.token == "ул.")
            .unwrap();
        assert!(token.find_in("Москва, ул. Ленина").is_some());
        assert!(token.find_in("ул.Ленина").is_none());
        assert_eq!(token.remove_from("ул. Ленина").trim(), "Ленина");
    }

    #[test]
    fn test_split_words_include_derived_splits() {
        assert_eq!(DEFAULT_VOCABULARY.split_word("ул", "ица"), Some("улица"));
        assert_eq!(DEFAULT_VOCABULARY.split_word("пр-", "т"), Some("пр-т"));
        assert_eq!(DEFAULT_VOCABULARY.split_word("лесной", "к"), None);
    }

    #[test]
    fn test_validate_rejects_bad_entries() {
        let mut vocabulary = AddressVocabulary::default();
        vocabulary.street_types.clear();
        assert!(vocabulary.validate().is_err());

        let mut vocabulary = AddressVocabulary::default();
        vocabulary.building_qualifiers.push("к\u{0007}".to_string());
        assert!(vocabulary.validate().is_err());

        let mut vocabulary = AddressVocabulary::default();
        vocabulary.intra_fragment_repairs.push(RepairRule {
            pattern: "(unclosed".to_string(),
            replacement: "x".to_string(),
        });
        assert!(matches!(vocabulary.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_vocabulary_json_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vocabulary.json");
        let json = serde_json::to_string(&AddressVocabulary::default()).unwrap();
        std::fs::write(&path, json).unwrap();

        let loaded = load_vocabulary_from(&path).unwrap();
        assert_eq!(loaded, AddressVocabulary::default());
    }

    #[test]
    fn test_load_vocabulary_from_missing_file() {
        assert!(matches!(
            load_vocabulary_from("/nonexistent/vocabulary.json"),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_optional_sections_default_to_empty() {
        let json = r#"{ "street_types": ["улица"], "building_qualifiers": ["корпус"] }"#;
        let vocabulary: AddressVocabulary = serde_json::from_str(json).unwrap();
        assert!(vocabulary.split_words.is_empty());
        let compiled = CompiledVocabulary::compile(&vocabulary).unwrap();
        assert!(compiled.repair_matcher.is_none());
    }
}

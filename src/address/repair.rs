//! Repairs for street-type words that the recognizer broke apart, either
//! inside one fragment ("У Л ИЦА") or across adjacent fragments ("УЛ", "ИЦА").

use super::events::{ParseEvent, StageOutput};
use super::vocabulary::CompiledVocabulary;

/// Rejoin street-type words whose letters were separated by spurious spaces
/// inside a single fragment.
///
/// Matching is leftmost first; at a given position the first rule in table
/// order wins. A match without whitespace is an intact word and is left as written.
pub fn repair_within_fragments(
    fragments: &[String],
    vocabulary: &CompiledVocabulary,
) -> StageOutput<Vec<String>> {
    let Some(matcher) = &vocabulary.repair_matcher else {
        return StageOutput::new(fragments.to_vec(), Vec::new());
    };

    let mut events = Vec::new();
    let repaired = fragments
        .iter()
        .map(|fragment| {
            let result = matcher.replace_all(fragment, |caps: &regex::Captures| {
                let whole = &caps[0];
                if !whole.chars().any(char::is_whitespace) {
                    return whole.to_string();
                }
                vocabulary
                    .repair_replacements
                    .iter()
                    .enumerate()
                    .find(|(i, _)| caps.name(&format!("r{}", i)).is_some())
                    .map(|(_, replacement)| replacement.clone())
                    .unwrap_or_else(|| whole.to_string())
            });
            let result = result.into_owned();
            if &result != fragment {
                events.push(ParseEvent::IntraFragmentRepaired {
                    before: fragment.clone(),
                    after: result.clone(),
                });
            }
            result
        })
        .collect();

    StageOutput::new(repaired, events)
}

/// Merge street-type words spread over adjacent fragments.
///
/// Scans left to right. Three fragments whose concatenation (spaces removed,
/// lowercased) spells a keyword are joined as written; otherwise two fragments
/// forming a known (prefix, suffix) split become the whole word; otherwise the
/// fragment is kept.
pub fn repair_across_fragments(
    fragments: &[String],
    vocabulary: &CompiledVocabulary,
) -> StageOutput<Vec<String>> {
    let mut events = Vec::new();
    let mut merged = Vec::with_capacity(fragments.len());
    let mut i = 0;

    while i < fragments.len() {
        if i + 3 <= fragments.len() {
            let window = &fragments[i..i + 3];
            let spelled: String = window
                .iter()
                .flat_map(|f| f.chars().filter(|c| !c.is_whitespace()))
                .collect::<String>()
                .to_lowercase();
            if vocabulary.spelled_keywords.contains(&spelled) {
                let joined: String = window
                    .iter()
                    .flat_map(|f| f.chars().filter(|c| !c.is_whitespace()))
                    .collect();
                events.push(ParseEvent::FragmentsMerged {
                    parts: window.to_vec(),
                    merged: joined.clone(),
                });
                merged.push(joined);
                i += 3;
                continue;
            }
        }

        if i + 2 <= fragments.len() {
            let prefix = fragments[i].trim().to_lowercase();
            let suffix = fragments[i + 1].trim().to_lowercase();
            if let Some(word) = vocabulary.split_word(&prefix, &suffix) {
                events.push(ParseEvent::FragmentsMerged {
                    parts: fragments[i..i + 2].to_vec(),
                    merged: word.to_string(),
                });
                merged.push(word.to_string());
                i += 2;
                continue;
            }
        }

        merged.push(fragments[i].clone());
        i += 1;
    }

    StageOutput::new(merged, events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::vocabulary::DEFAULT_VOCABULARY;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_rejoins_spaced_letters_inside_fragment() {
        let output = repair_within_fragments(&strings(&["У Л ИЦА Ленина"]), &DEFAULT_VOCABULARY);
        assert_eq!(output.value, strings(&["улица Ленина"]));
        assert_eq!(output.events.len(), 1);
    }

    #[test]
    fn test_intact_word_is_left_as_written() {
        let output = repair_within_fragments(&strings(&["УЛИЦА", "Проспект Мира"]), &DEFAULT_VOCABULARY);
        assert_eq!(output.value, strings(&["УЛИЦА", "Проспект Мира"]));
        assert!(output.events.is_empty());
    }

    #[test]
    fn test_first_rule_in_table_order_wins() {
        let vocabulary = crate::address::vocabulary::AddressVocabulary {
            intra_fragment_repairs: vec![
                crate::address::vocabulary::RepairRule {
                    pattern: r"п\s*р".to_string(),
                    replacement: "пр.".to_string(),
                },
                crate::address::vocabulary::RepairRule {
                    pattern: r"п\s*р\s*о\s*е\s*з\s*д".to_string(),
                    replacement: "проезд".to_string(),
                },
            ],
            ..Default::default()
        };
        let compiled = CompiledVocabulary::compile(&vocabulary).unwrap();
        let output = repair_within_fragments(&strings(&["п роезд"]), &compiled);
        assert_eq!(output.value, strings(&["пр.оезд"]));
    }

    #[test]
    fn test_merges_three_fragments_as_written() {
        let output = repair_across_fragments(&strings(&["УЛ", "И", "ЦА", "Ленина"]), &DEFAULT_VOCABULARY);
        assert_eq!(output.value, strings(&["УЛИЦА", "Ленина"]));
        assert_eq!(
            output.events,
            vec![ParseEvent::FragmentsMerged {
                parts: strings(&["УЛ", "И", "ЦА"]),
                merged: "УЛИЦА".to_string(),
            }]
        );
    }

    #[test]
    fn test_merges_two_fragment_split_into_whole_word() {
        let output = repair_across_fragments(&strings(&["Пер", "еулок", "Лесной"]), &DEFAULT_VOCABULARY);
        assert_eq!(output.value, strings(&["переулок", "Лесной"]));
    }

    #[test]
    fn test_unrelated_fragments_are_kept() {
        let fragments = strings(&["Садовая", "25"]);
        let output = repair_across_fragments(&fragments, &DEFAULT_VOCABULARY);
        assert_eq!(output.value, fragments);
        assert!(output.events.is_empty());
    }
}

//! # Address Parser Tests Module
//!
//! End-to-end tests of the address parser on noisy recognizer output,
//! including the parse events reported to observers.

#[cfg(test)]
mod tests {
    use address_ocr::address::{
        AddressParser, AddressRecord, AddressVocabulary, HousePartKind, ParseEvent,
        RecordingObserver, SkipReason,
    };
    use std::sync::Arc;

    fn parser_with_recorder() -> (AddressParser, Arc<RecordingObserver>) {
        let observer = Arc::new(RecordingObserver::new());
        let parser = AddressParser::default().with_observer(observer.clone());
        (parser, observer)
    }

    /// Empty input gives an all-empty record
    #[test]
    fn test_empty_input() {
        let record = AddressParser::default().parse::<String>(&[]);
        assert_eq!(record, AddressRecord::default());
        assert!(record.is_empty());
    }

    /// Punctuation-only and garbage input never fails
    #[test]
    fn test_garbage_input_gives_empty_record() {
        let parser = AddressParser::default();
        let record = parser.parse(&["!!!", "[]{}|", "???", "«»", "   "]);
        assert_eq!(record, AddressRecord::default());

        let record = parser.parse(&["...", ",", "-"]);
        assert_eq!(record.street_type, "");
        assert_eq!(record.house_number, "");
        assert_eq!(record.raw, "... , -");

        let record = parser
            .clone()
            .with_street_name_cleanup(true)
            .parse(&["...", ",", "-"]);
        assert!(record.is_empty());
    }

    /// Three fragments spelling a street type are merged
    #[test]
    fn test_street_type_split_over_three_fragments() {
        let (parser, observer) = parser_with_recorder();
        let record = parser.parse(&["УЛ", "И", "ЦА"]);

        assert_eq!(record.street_type, "улица");
        assert_eq!(record.raw, "УЛИЦА");
        assert_eq!(record.street_name, "");
        assert!(observer.events().contains(&ParseEvent::FragmentsMerged {
            parts: vec!["УЛ".to_string(), "И".to_string(), "ЦА".to_string()],
            merged: "УЛИЦА".to_string(),
        }));
    }

    /// Street name and bare house number
    #[test]
    fn test_street_name_and_house_number() {
        let record = AddressParser::default().parse(&["Садовая", "25"]);
        assert_eq!(record.street_name, "Садовая");
        assert_eq!(record.house_number, "25");
        assert_eq!(record.street_type, "");
        assert_eq!(record.raw, "Садовая 25");
    }

    /// Bare number precedes building qualifiers in the house number
    #[test]
    fn test_lane_with_building_qualifier() {
        let record = AddressParser::default().parse(&["переулок", "Лесной", "стр 1", "14"]);
        assert_eq!(record.street_type, "переулок");
        assert_eq!(record.street_name, "Лесной");
        assert_eq!(record.house_number, "14 стр 1");
    }

    /// House number and street name never share a fragment
    #[test]
    fn test_house_and_name_do_not_overlap() {
        let record = AddressParser::default().parse(&["ул.", "Ленина", "д", "5", "корп. 2"]);
        assert_eq!(record.street_type, "ул.");
        assert_eq!(record.house_number, "5 корп. 2");
        assert!(!record.street_name.contains('5'));
        assert!(!record.street_name.contains("корп"));
    }

    /// Noise characters are stripped before matching
    #[test]
    fn test_noisy_fragments() {
        let record = AddressParser::default().parse(&["[проспект]", "Мира|", "«12»"]);
        assert_eq!(record.street_type, "проспект");
        assert_eq!(record.street_name, "Мира");
        assert_eq!(record.house_number, "12");
    }

    /// Letters split by spaces inside one fragment are rejoined
    #[test]
    fn test_spaced_street_type_inside_fragment() {
        let record = AddressParser::default().parse(&["Н А Б Е Р Е Ж Н А Я", "Фонтанки", "20"]);
        assert_eq!(record.street_type, "набережная");
        assert_eq!(record.street_name, "Фонтанки");
        assert_eq!(record.house_number, "20");
    }

    /// Two-fragment split of a street type
    #[test]
    fn test_two_fragment_split() {
        let record = AddressParser::default().parse(&["буль", "вар", "Цветной", "7а"]);
        assert_eq!(record.street_type, "бульвар");
        assert_eq!(record.street_name, "Цветной");
        assert_eq!(record.house_number, "7а");
    }

    /// Longer tokens win over abbreviations they contain
    #[test]
    fn test_longer_token_preferred() {
        let record = AddressParser::default().parse(&["Пр-т", "Ветеранов", "3"]);
        assert_eq!(record.street_type, "пр-т");
        assert_eq!(record.street_name, "Ветеранов");
    }

    /// Trailing number is split off only when small enough to be a house number
    #[test]
    fn test_trailing_number_limit() {
        let parser = AddressParser::default();

        let record = parser.parse(&["Садовая 25"]);
        assert_eq!(record.street_name, "Садовая");
        assert_eq!(record.house_number, "25");

        let record = parser.parse(&["Победы 1945"]);
        assert_eq!(record.street_name, "Победы 1945");
        assert_eq!(record.house_number, "");

        let strict = AddressParser::default().with_max_trailing_house_number(10);
        let record = strict.parse(&["Садовая 25"]);
        assert_eq!(record.house_number, "");
    }

    /// Street type inside a longer fragment is detected but stays in the name
    #[test]
    fn test_street_type_inside_fragment() {
        let (parser, observer) = parser_with_recorder();
        let record = parser.parse(&["Тверская улица 8"]);

        assert_eq!(record.street_type, "улица");
        assert_eq!(record.street_name, "Тверская улица");
        assert_eq!(record.house_number, "8");
        assert!(observer
            .events()
            .iter()
            .any(|e| matches!(e, ParseEvent::StreetTypeDetected { fragment_index: None, .. })));

        let record = AddressParser::default()
            .with_street_name_cleanup(true)
            .parse(&["Тверская улица 8"]);
        assert_eq!(record.street_type, "улица");
        assert_eq!(record.street_name, "Тверская");
        assert_eq!(record.house_number, "8");
    }

    /// Parsing is deterministic
    #[test]
    fn test_parse_is_deterministic() {
        let parser = AddressParser::default();
        let fragments = ["ш.", "Энтузиастов", "к2", "31"];
        let first = parser.parse(&fragments);
        let second = parser.parse(&fragments);
        assert_eq!(first, second);
        assert_eq!(first.house_number, "31 к2");
    }

    /// Observers see stage decisions in pipeline order
    #[test]
    fn test_observer_receives_stage_events() {
        let (parser, observer) = parser_with_recorder();
        parser.parse(&["переулок", "Лесной", "стр 1", "14"]);
        let events = observer.events();

        assert_eq!(
            events[0],
            ParseEvent::StreetTypeDetected {
                token: "переулок".to_string(),
                fragment_index: Some(0),
            }
        );
        assert!(events.contains(&ParseEvent::HousePartDetected {
            fragment_index: 2,
            part: "стр 1".to_string(),
            kind: HousePartKind::Qualified,
        }));
        assert!(events.contains(&ParseEvent::FragmentSkipped {
            fragment_index: 3,
            text: "14".to_string(),
            reason: SkipReason::HousePart,
        }));
        assert!(matches!(events.last(), Some(ParseEvent::Completed { .. })));
    }

    /// A custom vocabulary replaces the built-in one
    #[test]
    fn test_custom_vocabulary() {
        let vocabulary = AddressVocabulary {
            street_types: vec!["street".to_string(), "st.".to_string(), "avenue".to_string()],
            building_qualifiers: vec!["bldg".to_string(), "block".to_string()],
            intra_fragment_repairs: Vec::new(),
            spelled_keywords: vec!["street".to_string()],
            split_words: Vec::new(),
        };
        let parser = AddressParser::new(&vocabulary).unwrap();

        let record = parser.parse(&["Baker", "ST", "REET", "221b", "bldg 2"]);
        assert_eq!(record.street_type, "street");
        assert_eq!(record.street_name, "Baker");
        assert_eq!(record.house_number, "221b bldg 2");
    }

    /// Records serialize with every field present
    #[test]
    fn test_record_serializes_all_fields() {
        let record = AddressParser::default().parse(&["Садовая", "25"]);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["street_type"], "");
        assert_eq!(json["street_name"], "Садовая");
        assert_eq!(json["house_number"], "25");
        assert_eq!(record.full_address(), "Садовая 25");
    }
}

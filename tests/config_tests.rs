//! # Configuration Tests Module
//!
//! Vocabulary files and parser construction from configuration.

#[cfg(test)]
mod tests {
    use address_ocr::address::{load_vocabulary_from, AddressParser, AddressVocabulary};
    use address_ocr::config::ParserConfig;
    use address_ocr::errors::AppError;
    use std::fs;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &str) -> String {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path.to_string_lossy().into_owned()
    }

    /// The shipped vocabulary file matches the built-in default
    #[test]
    fn test_shipped_vocabulary_matches_default() {
        let vocabulary = load_vocabulary_from("config/address_vocabulary.json").unwrap();
        assert_eq!(vocabulary, AddressVocabulary::default());
    }

    /// Optional tables may be omitted from the file
    #[test]
    fn test_minimal_vocabulary_file() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "vocabulary.json",
            r#"{ "street_types": ["avenue", "ave"], "building_qualifiers": ["bldg"] }"#,
        );

        let vocabulary = load_vocabulary_from(&path).unwrap();
        assert!(vocabulary.intra_fragment_repairs.is_empty());
        assert!(vocabulary.spelled_keywords.is_empty());
        assert!(vocabulary.split_words.is_empty());

        let parser = AddressParser::new(&vocabulary).unwrap();
        let record = parser.parse(&["Park", "Ave", "12", "bldg 3"]);
        assert_eq!(record.street_type, "ave");
        assert_eq!(record.street_name, "Park");
        assert_eq!(record.house_number, "12 bldg 3");
    }

    /// Malformed JSON is a configuration error
    #[test]
    fn test_invalid_json_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "broken.json", "{ \"street_types\": [");

        assert!(matches!(load_vocabulary_from(&path), Err(AppError::Config(_))));
    }

    /// Structurally valid but unusable vocabularies are rejected
    #[test]
    fn test_invalid_vocabulary_contents() {
        let dir = TempDir::new().unwrap();

        let empty_types = write_file(
            &dir,
            "empty.json",
            r#"{ "street_types": [], "building_qualifiers": ["к"] }"#,
        );
        assert!(load_vocabulary_from(&empty_types).is_err());

        let blank_entry = write_file(
            &dir,
            "blank.json",
            r#"{ "street_types": ["ул", "  "], "building_qualifiers": ["к"] }"#,
        );
        assert!(load_vocabulary_from(&blank_entry).is_err());

        let bad_pattern = write_file(
            &dir,
            "pattern.json",
            r#"{
                "street_types": ["ул"],
                "building_qualifiers": ["к"],
                "intra_fragment_repairs": [{ "pattern": "у(л", "replacement": "ул" }]
            }"#,
        );
        assert!(load_vocabulary_from(&bad_pattern).is_err());
    }

    /// Missing files are reported, not replaced by the default
    #[test]
    fn test_missing_explicit_vocabulary_fails() {
        let config = ParserConfig {
            vocabulary_path: Some("/nonexistent/address_vocabulary.json".to_string()),
            ..ParserConfig::default()
        };
        assert!(matches!(AddressParser::from_config(&config), Err(AppError::Config(_))));
    }

    /// Parser settings flow from configuration
    #[test]
    fn test_parser_from_config() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "vocabulary.json",
            &serde_json::to_string(&AddressVocabulary::default()).unwrap(),
        );
        let config = ParserConfig {
            max_trailing_house_number: 50,
            vocabulary_path: Some(path),
            clean_street_name: true,
        };
        let parser = AddressParser::from_config(&config).unwrap();

        assert_eq!(parser.parse(&["Садовая 25"]).house_number, "25");
        assert_eq!(parser.parse(&["Садовая 51"]).house_number, "");
        assert_eq!(parser.parse(&["ул Садовая", "25"]).street_name, "Садовая");
    }
}

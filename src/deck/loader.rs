// src/deck/loader.rs
// Reads the JSON content database into a `Catalog`.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde_json::Value;

use super::Catalog;
use crate::error::{Result, StudyError};

/// Loads a catalog from a JSON file on disk.
pub fn load_catalog(path: &Path) -> Result<Catalog> {
    log::info!("Loading catalog from {:?}", path);
    let raw = fs::read_to_string(path)?;
    let catalog = parse_catalog(&raw)?;
    log::info!(
        "Loaded {} categories and {} cards.",
        catalog.categories.len(),
        catalog.cards.len()
    );
    Ok(catalog)
}

/// Parses catalog JSON. Both `categories` and `flashcards` must be arrays.
/// Cards without an id are named `card_<n>` after their 1-based position.
pub fn parse_catalog(raw: &str) -> Result<Catalog> {
    let value: Value = serde_json::from_str(raw)?;
    for key in ["categories", "flashcards"] {
        if !value.get(key).map_or(false, Value::is_array) {
            return Err(StudyError::InvalidCatalog(format!("expected `{}` to be an array", key)));
        }
    }

    let mut catalog: Catalog = serde_json::from_value(value)?;

    let mut seen = HashSet::new();
    for (index, card) in catalog.cards.iter_mut().enumerate() {
        if card.id.is_empty() {
            card.id = format!("card_{}", index + 1);
        }
        if !seen.insert(card.id.clone()) {
            log::warn!("Duplicate card id {:?} in catalog", card.id);
        }
    }

    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r##"{
        "categories": [
            { "id": "law", "name": "Law", "icon": "⚖", "color": "#2b7a46" },
            { "id": "tax", "name": "Tax", "icon": "€", "color": "#aa3300" }
        ],
        "flashcards": [
            { "id": "q1", "category": "law", "difficulty": "basic", "question": "What?", "answer_short": "That." },
            { "category": "tax", "difficulty": "advanced", "question": "Why?", "answer_core_points": ["one", "two"] }
        ]
    }"##;

    #[test]
    fn test_parse_assigns_missing_ids() {
        let catalog = parse_catalog(SAMPLE).unwrap();
        assert_eq!(catalog.categories.len(), 2);
        assert_eq!(catalog.cards[0].id, "q1");
        assert_eq!(catalog.cards[1].id, "card_2");
        assert_eq!(catalog.cards[0].prompt(), "What?");
        assert_eq!(catalog.cards[0].answer(), "That.");
        assert_eq!(catalog.cards[1].answer_points(), vec!["one", "two"]);
        assert!(catalog.contains("card_2"));
    }

    #[test]
    fn test_rejects_missing_arrays() {
        let err = parse_catalog(r#"{ "categories": [] }"#).unwrap_err();
        assert!(matches!(err, StudyError::InvalidCatalog(_)));

        let err = parse_catalog(r#"{ "categories": {}, "flashcards": [] }"#).unwrap_err();
        assert!(matches!(err, StudyError::InvalidCatalog(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let catalog = load_catalog(file.path()).unwrap();
        assert_eq!(catalog.cards.len(), 2);
    }
}

// src/deck/mod.rs
// The study content: categories and the cards that belong to them.

pub mod loader;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A group of cards shown together on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub color: String,
}

/// A single flash card. Only `id`, `category` and `difficulty` matter for
/// scheduling; everything else is display content kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub difficulty: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Card {
    pub fn new(id: &str, category: &str, difficulty: &str) -> Self {
        Card {
            id: id.to_string(),
            category: category.to_string(),
            difficulty: difficulty.to_string(),
            fields: Map::new(),
        }
    }

    /// A display field, if present and textual.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str).filter(|s| !s.is_empty())
    }

    pub fn prompt(&self) -> &str {
        self.field("question").or_else(|| self.field("front")).unwrap_or(self.id.as_str())
    }

    pub fn answer(&self) -> &str {
        self.field("answer_short")
            .or_else(|| self.field("answer"))
            .or_else(|| self.field("back"))
            .unwrap_or("")
    }

    /// Bullet points under the short answer.
    pub fn answer_points(&self) -> Vec<&str> {
        self.fields
            .get("answer_core_points")
            .and_then(Value::as_array)
            .map(|points| points.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

/// The entire content database.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    pub categories: Vec<Category>,
    #[serde(rename = "flashcards")]
    pub cards: Vec<Card>,
}

impl Catalog {
    pub fn new(categories: Vec<Category>, cards: Vec<Card>) -> Self {
        Catalog { categories, cards }
    }

    pub fn card_index(&self) -> HashMap<&str, &Card> {
        self.cards.iter().map(|c| (c.id.as_str(), c)).collect()
    }

    pub fn card(&self, card_id: &str) -> Option<&Card> {
        self.cards.iter().find(|c| c.id == card_id)
    }

    pub fn contains(&self, card_id: &str) -> bool {
        self.card(card_id).is_some()
    }
}

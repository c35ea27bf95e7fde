// src/stats.rs
// Aggregates shown on the dashboard before a session starts.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};

use crate::config::Config;
use crate::deck::Catalog;
use crate::progress::ProgressStore;

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryStats {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub seen: u32,
    pub correct: u32,
}

impl CategoryStats {
    pub fn accuracy(&self) -> f64 {
        if self.seen == 0 {
            0.0
        } else {
            self.correct as f64 / self.seen as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardStats {
    pub total_cards: usize,
    pub due_now: usize,
    pub new_cards: usize,
    pub mastered: usize,
    /// Reviewed category with the lowest accuracy.
    pub weakest: Option<CategoryStats>,
    pub hard_marked: usize,
    pub streak: u32,
    pub total_reviews: u32,
    pub reviewed_today: u32,
}

pub fn dashboard(
    catalog: &Catalog,
    store: &ProgressStore,
    config: &Config,
    now: DateTime<Utc>,
    today: NaiveDate,
) -> DashboardStats {
    let cards = &catalog.cards;

    let mut by_category: HashMap<&str, CategoryStats> = catalog
        .categories
        .iter()
        .map(|cat| {
            let stats = CategoryStats {
                id: cat.id.clone(),
                name: cat.name.clone(),
                icon: cat.icon.clone(),
                seen: 0,
                correct: 0,
            };
            (cat.id.as_str(), stats)
        })
        .collect();

    let mut mastered = 0;
    for card in cards {
        let progress = store.get_or_init(&card.id, now);
        if progress.repetitions >= config.mastered_repetitions {
            mastered += 1;
        }
        if let Some(stats) = by_category.get_mut(card.category.as_str()) {
            stats.seen += progress.seen_count;
            stats.correct += progress.correct_count;
        }
    }

    // Walk categories in catalog order so ties resolve to the first one listed.
    let mut weakest: Option<CategoryStats> = None;
    for cat in &catalog.categories {
        let Some(stats) = by_category.remove(cat.id.as_str()) else {
            continue;
        };
        if stats.seen == 0 {
            continue;
        }
        if weakest.as_ref().map_or(true, |w| stats.accuracy() < w.accuracy()) {
            weakest = Some(stats);
        }
    }

    DashboardStats {
        total_cards: cards.len(),
        due_now: cards.iter().filter(|c| store.is_due(&c.id, now)).count(),
        new_cards: cards.iter().filter(|c| store.is_new(&c.id)).count(),
        mastered,
        weakest,
        hard_marked: store.cards.values().filter(|p| p.hard_count > 0).count(),
        streak: store.meta.streak,
        total_reviews: store.meta.total_reviews,
        reviewed_today: store.meta.reviews_on(today),
    }
}

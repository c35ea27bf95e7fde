// src/queue.rs
// Picks and orders the cards for a study session.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::deck::{Card, Catalog};
use crate::error::StudyError;
use crate::progress::ProgressStore;

/// Matches every category or difficulty.
pub const ANY: &str = "all";

/// Which cards a session draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudyMode {
    /// Due cards first, topped up with new ones.
    #[default]
    Daily,
    Due,
    New,
    Quick,
    All,
    /// Everything ever rated again or hard.
    HardMarked,
}

impl StudyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StudyMode::Daily => "daily",
            StudyMode::Due => "due",
            StudyMode::New => "new",
            StudyMode::Quick => "quick",
            StudyMode::All => "all",
            StudyMode::HardMarked => "hard_marked",
        }
    }
}

impl fmt::Display for StudyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StudyMode {
    type Err = StudyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(StudyMode::Daily),
            "due" => Ok(StudyMode::Due),
            "new" => Ok(StudyMode::New),
            "quick" => Ok(StudyMode::Quick),
            "all" => Ok(StudyMode::All),
            "hard_marked" => Ok(StudyMode::HardMarked),
            other => Err(StudyError::UnknownMode(other.to_string())),
        }
    }
}

/// The learner's filter and mode selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Setup {
    pub category: String,
    pub difficulty: String,
    pub mode: StudyMode,
}

impl Default for Setup {
    fn default() -> Self {
        Setup {
            category: ANY.to_string(),
            difficulty: ANY.to_string(),
            mode: StudyMode::Daily,
        }
    }
}

impl Setup {
    pub fn matches(&self, card: &Card) -> bool {
        let category_match = self.category == ANY || card.category == self.category;
        let difficulty_match = self.difficulty == ANY || card.difficulty == self.difficulty;
        category_match && difficulty_match
    }
}

pub fn filtered_cards<'a>(catalog: &'a Catalog, setup: &Setup) -> Vec<&'a Card> {
    catalog.cards.iter().filter(|card| setup.matches(card)).collect()
}

fn ids(cards: &[&Card]) -> Vec<String> {
    cards.iter().map(|c| c.id.clone()).collect()
}

/// Due cards, earliest `due_at` first. Ties keep catalog order.
fn due_sorted<'a>(cards: &[&'a Card], store: &ProgressStore, now: DateTime<Utc>) -> Vec<&'a Card> {
    let mut due: Vec<&Card> = cards.iter().copied().filter(|c| store.is_due(&c.id, now)).collect();
    due.sort_by_key(|c| store.get_or_init(&c.id, now).due_at);
    due
}

fn shuffled<'a, R: Rng + ?Sized>(cards: &[&'a Card], rng: &mut R) -> Vec<&'a Card> {
    let mut out = cards.to_vec();
    out.shuffle(rng);
    out
}

/// Builds the ordered list of card ids for a new session.
pub fn build_queue<R: Rng + ?Sized>(
    catalog: &Catalog,
    store: &ProgressStore,
    setup: &Setup,
    mode: StudyMode,
    config: &Config,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Vec<String> {
    let started = Instant::now();
    let cards = filtered_cards(catalog, setup);
    let fresh: Vec<&Card> = cards.iter().copied().filter(|c| store.is_new(&c.id)).collect();

    let queue = match mode {
        StudyMode::Due => ids(&due_sorted(&cards, store, now)),
        StudyMode::New => ids(&shuffled(&fresh, rng)),
        StudyMode::Quick => {
            let mut picked = shuffled(&cards, rng);
            picked.truncate(config.quick_limit);
            ids(&picked)
        }
        StudyMode::All => ids(&shuffled(&cards, rng)),
        StudyMode::HardMarked => hard_marked_queue(catalog, store),
        StudyMode::Daily => {
            let mut daily = due_sorted(&cards, store, now);
            daily.truncate(config.daily_limit);

            // Unseen cards are due too, so skip any already taken.
            let taken: HashSet<&str> = daily.iter().map(|c| c.id.as_str()).collect();
            let room = config.daily_limit.saturating_sub(daily.len());
            let padding: Vec<&Card> = shuffled(&fresh, rng)
                .into_iter()
                .filter(|c| !taken.contains(c.id.as_str()))
                .take(room)
                .collect();

            daily.extend(padding);
            ids(&daily)
        }
    };

    log::debug!(
        "Built {} queue with {} of {} filtered cards in {:.2?}",
        mode,
        queue.len(),
        cards.len(),
        started.elapsed()
    );
    queue
}

/// Every stored card that was ever rated again or hard and still exists in
/// the catalog, earliest `due_at` first.
pub fn hard_marked_queue(catalog: &Catalog, store: &ProgressStore) -> Vec<String> {
    let index = catalog.card_index();
    let mut marked: Vec<(&String, Option<DateTime<Utc>>)> = store
        .cards
        .iter()
        .filter(|(id, progress)| progress.hard_count > 0 && index.contains_key(id.as_str()))
        .map(|(id, progress)| (id, progress.due_at))
        .collect();
    // The store is a hash map; break ties by id for a stable order.
    marked.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));
    marked.into_iter().map(|(id, _)| id.clone()).collect()
}

// src/progress.rs
// Per-card review state and the learner-wide counters that outlive sessions.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Ease never drops below this, or intervals would stop growing.
pub const MIN_EASE: f64 = 1.3;
pub const DEFAULT_EASE: f64 = 2.5;

/// Review state of a single card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardProgress {
    #[serde(default)]
    pub repetitions: u32,
    #[serde(default)]
    pub interval_days: u32,
    #[serde(default = "default_ease")]
    pub ease: f64,
    /// `None` when the stored value was missing or unreadable; such a card is due.
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub due_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub last_reviewed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub lapse_count: u32,
    #[serde(default)]
    pub seen_count: u32,
    #[serde(default)]
    pub correct_count: u32,
    #[serde(default)]
    pub hard_count: u32,
}

fn default_ease() -> f64 {
    DEFAULT_EASE
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(|v| v.as_str())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc)))
}

impl CardProgress {
    /// The state of a card that has never been reviewed.
    pub fn new(now: DateTime<Utc>) -> Self {
        CardProgress {
            repetitions: 0,
            interval_days: 0,
            ease: DEFAULT_EASE,
            due_at: Some(now),
            last_reviewed_at: None,
            lapse_count: 0,
            seen_count: 0,
            correct_count: 0,
            hard_count: 0,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.due_at {
            Some(due_at) => due_at <= now,
            None => true,
        }
    }
}

/// Aggregate counters and streak tracking.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProgressMeta {
    pub total_reviews: u32,
    pub streak: u32,
    pub max_streak: u32,
    pub last_study_date: Option<NaiveDate>,
    /// Reviews per local day, keyed `YYYY-MM-DD`.
    pub daily_reviews: BTreeMap<String, u32>,
}

pub fn day_key(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

impl ProgressMeta {
    /// Counts one review made on `today` and advances the study streak.
    pub fn record_review(&mut self, today: NaiveDate) {
        self.total_reviews += 1;

        match self.last_study_date {
            None => self.streak = 1,
            Some(last) if last == today => {}
            Some(last) => {
                self.streak = if last.succ_opt() == Some(today) { self.streak + 1 } else { 1 };
            }
        }

        self.max_streak = self.max_streak.max(self.streak);
        self.last_study_date = Some(today);
        *self.daily_reviews.entry(day_key(today)).or_insert(0) += 1;
    }

    pub fn reviews_on(&self, day: NaiveDate) -> u32 {
        self.daily_reviews.get(&day_key(day)).copied().unwrap_or(0)
    }

    /// The last `length` days ending with `today`, oldest first.
    pub fn last_days(&self, today: NaiveDate, length: usize) -> Vec<(NaiveDate, u32)> {
        (0..length)
            .rev()
            .map(|back| {
                let day = today - Duration::days(back as i64);
                (day, self.reviews_on(day))
            })
            .collect()
    }
}

/// Every card's progress plus the learner-wide metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressStore {
    pub cards: HashMap<String, CardProgress>,
    #[serde(default)]
    pub meta: ProgressMeta,
}

impl ProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stored progress, or a fresh default. Never touches the store.
    pub fn get_or_init(&self, card_id: &str, now: DateTime<Utc>) -> CardProgress {
        self.cards
            .get(card_id)
            .cloned()
            .unwrap_or_else(|| CardProgress::new(now))
    }

    pub fn is_due(&self, card_id: &str, now: DateTime<Utc>) -> bool {
        match self.cards.get(card_id) {
            Some(progress) => progress.is_due(now),
            // A fresh card is due as of `now`.
            None => true,
        }
    }

    pub fn is_new(&self, card_id: &str) -> bool {
        !self.cards.contains_key(card_id)
    }

    pub fn insert(&mut self, card_id: &str, progress: CardProgress) {
        self.cards.insert(card_id.to_string(), progress);
    }

    /// Puts back a previously captured record; `None` forgets the card again.
    pub fn restore(&mut self, card_id: &str, previous: Option<CardProgress>) {
        match previous {
            Some(progress) => {
                self.cards.insert(card_id.to_string(), progress);
            }
            None => {
                self.cards.remove(card_id);
            }
        }
    }

    /// Raises any ease below the floor. Returns how many records changed.
    pub fn clamp_ease(&mut self) -> usize {
        let mut fixed = 0;
        for progress in self.cards.values_mut() {
            if progress.ease.is_nan() || progress.ease < MIN_EASE {
                progress.ease = MIN_EASE;
                fixed += 1;
            }
        }
        fixed
    }
}

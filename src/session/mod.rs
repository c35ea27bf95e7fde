// src/session/mod.rs
// An active study session: the running queue, its cursor, tallies and undo history.

pub mod requeue;

use std::collections::HashSet;

use chrono::{DateTime, Local, NaiveDate, Utc};
use rand::Rng;

use crate::config::Config;
use crate::progress::{CardProgress, ProgressMeta, ProgressStore};
use crate::queue::StudyMode;
use crate::scheduler::{IntervalPreview, Rating, Scheduler, Sm2Scheduler};
use self::requeue::{queue_again_card, queue_hard_card, AgainOptions};

/// How many times each rating was given this session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RatingTally {
    pub again: usize,
    pub hard: usize,
    pub good: usize,
    pub easy: usize,
}

impl RatingTally {
    fn bump(&mut self, rating: Rating) {
        match rating {
            Rating::Again => self.again += 1,
            Rating::Hard => self.hard += 1,
            Rating::Good => self.good += 1,
            Rating::Easy => self.easy += 1,
        }
    }
}

/// Everything a rating changes, captured just before it is applied.
#[derive(Debug, Clone)]
struct Snapshot {
    card_id: String,
    queue: Vec<String>,
    queue_index: usize,
    revealed: bool,
    tally: RatingTally,
    reviewed: usize,
    unique_reviewed: HashSet<String>,
    /// `None` when the card had never been reviewed.
    progress: Option<CardProgress>,
    meta: ProgressMeta,
}

/// The result of rating the current card.
#[derive(Debug, Clone)]
pub struct ReviewOutcome {
    pub card_id: String,
    pub rating: Rating,
    pub progress: CardProgress,
    pub session_complete: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub mode: StudyMode,
    pub reviewed: usize,
    pub unique_reviewed: usize,
    pub tally: RatingTally,
    /// Share of good and easy ratings.
    pub confidence: f64,
}

/// Contains the state of one pass through a queue.
pub struct Session<'a> {
    scheduler: Box<dyn Scheduler + 'a>,
    again_options: AgainOptions,
    mode: StudyMode,
    started_at: DateTime<Utc>,
    queue: Vec<String>,
    queue_index: usize,
    revealed: bool,
    tally: RatingTally,
    reviewed: usize,
    unique_reviewed: HashSet<String>,
    undo_stack: Vec<Snapshot>,
}

impl<'a> Session<'a> {
    pub fn new(
        scheduler: Box<dyn Scheduler + 'a>,
        config: &Config,
        mode: StudyMode,
        queue: Vec<String>,
        now: DateTime<Utc>,
    ) -> Self {
        log::info!("Starting {} session with {} cards", mode, queue.len());
        Session {
            scheduler,
            again_options: AgainOptions {
                min_offset: config.again_min_offset,
                max_offset: config.again_max_offset,
                offset: None,
            },
            mode,
            started_at: now,
            queue,
            queue_index: 0,
            revealed: false,
            tally: RatingTally::default(),
            reviewed: 0,
            unique_reviewed: HashSet::new(),
            undo_stack: Vec::new(),
        }
    }

    /// A session driven by the default SM-2 scheduler.
    pub fn start(config: &Config, mode: StudyMode, queue: Vec<String>, now: DateTime<Utc>) -> Self {
        Self::new(Box::new(Sm2Scheduler), config, mode, queue, now)
    }

    pub fn mode(&self) -> StudyMode {
        self.mode
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn queue(&self) -> &[String] {
        &self.queue
    }

    pub fn position(&self) -> usize {
        self.queue_index
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// The id under the cursor, or `None` once the queue is exhausted.
    pub fn current(&self) -> Option<&str> {
        self.queue.get(self.queue_index).map(String::as_str)
    }

    pub fn is_complete(&self) -> bool {
        self.queue_index >= self.queue.len()
    }

    /// Shows the answer side. Returns false when there is nothing to show.
    pub fn reveal(&mut self) -> bool {
        if self.current().is_none() {
            return false;
        }
        self.revealed = true;
        true
    }

    pub fn preview(&self, store: &ProgressStore, now: DateTime<Utc>) -> Option<IntervalPreview> {
        let card_id = self.current()?;
        let progress = store.get_or_init(card_id, now);
        Some(self.scheduler.preview_intervals(&progress, now))
    }

    /// Rates the current card, using the local calendar day for streaks.
    pub fn rate<R: Rng + ?Sized>(
        &mut self,
        store: &mut ProgressStore,
        rating: Rating,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Option<ReviewOutcome> {
        let today = now.with_timezone(&Local).date_naive();
        self.rate_on(store, rating, now, today, rng)
    }

    /// Rates the current card. Ignored until the answer has been revealed.
    pub fn rate_on<R: Rng + ?Sized>(
        &mut self,
        store: &mut ProgressStore,
        rating: Rating,
        now: DateTime<Utc>,
        today: NaiveDate,
        rng: &mut R,
    ) -> Option<ReviewOutcome> {
        if !self.revealed {
            return None;
        }
        let card_id = self.current()?.to_string();

        self.undo_stack.push(Snapshot {
            card_id: card_id.clone(),
            queue: self.queue.clone(),
            queue_index: self.queue_index,
            revealed: self.revealed,
            tally: self.tally,
            reviewed: self.reviewed,
            unique_reviewed: self.unique_reviewed.clone(),
            progress: store.cards.get(&card_id).cloned(),
            meta: store.meta.clone(),
        });

        let before = store.get_or_init(&card_id, now);
        let updated = self.scheduler.schedule_next(&before, rating, now);
        store.insert(&card_id, updated.clone());
        store.meta.record_review(today);

        self.tally.bump(rating);
        self.reviewed += 1;
        self.unique_reviewed.insert(card_id.clone());

        match rating {
            Rating::Again => {
                self.queue = queue_again_card(&self.queue, self.queue_index, &card_id, &self.again_options, rng);
            }
            Rating::Hard => {
                self.queue = queue_hard_card(&self.queue, self.queue_index, &card_id);
            }
            Rating::Good | Rating::Easy => {}
        }

        self.queue_index += 1;
        self.revealed = false;

        let session_complete = self.is_complete();
        if session_complete {
            log::info!("Session complete after {} reviews", self.reviewed);
        }

        Some(ReviewOutcome { card_id, rating, progress: updated, session_complete })
    }

    /// Reverts the most recent rating and returns the id of the card it
    /// restored, or `None` when there is nothing to undo.
    pub fn undo(&mut self, store: &mut ProgressStore) -> Option<String> {
        let previous = self.undo_stack.pop()?;
        log::debug!("Undoing last rating of {}", previous.card_id);

        self.queue = previous.queue;
        self.queue_index = previous.queue_index;
        self.revealed = previous.revealed;
        self.tally = previous.tally;
        self.reviewed = previous.reviewed;
        self.unique_reviewed = previous.unique_reviewed;

        store.restore(&previous.card_id, previous.progress);
        store.meta = previous.meta;
        Some(previous.card_id)
    }

    pub fn summary(&self) -> SessionSummary {
        let confidence = (self.tally.good + self.tally.easy) as f64 / self.reviewed.max(1) as f64;
        SessionSummary {
            mode: self.mode,
            reviewed: self.reviewed,
            unique_reviewed: self.unique_reviewed.len(),
            tally: self.tally,
            confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 1, 10, 0, 0).unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()
    }

    fn session(ids: &[&str]) -> Session<'static> {
        let queue = ids.iter().map(|s| s.to_string()).collect();
        Session::start(&Config::new(), StudyMode::All, queue, now())
    }

    fn rate(session: &mut Session, store: &mut ProgressStore, rating: Rating) -> Option<ReviewOutcome> {
        session.reveal();
        session.rate_on(store, rating, now(), today(), &mut StdRng::seed_from_u64(9))
    }

    #[test]
    fn test_rating_requires_reveal() {
        let mut session = session(&["a", "b"]);
        let mut store = ProgressStore::new();
        let outcome = session.rate_on(&mut store, Rating::Good, now(), today(), &mut StdRng::seed_from_u64(1));
        assert!(outcome.is_none());
        assert_eq!(session.position(), 0);
        assert!(store.is_new("a"));
    }

    #[test]
    fn test_review_flow() {
        let mut session = session(&["a", "b"]);
        let mut store = ProgressStore::new();

        let first = rate(&mut session, &mut store, Rating::Good).unwrap();
        assert_eq!(first.card_id, "a");
        assert!(!first.session_complete);
        assert!(!session.is_revealed());

        let second = rate(&mut session, &mut store, Rating::Easy).unwrap();
        assert!(second.session_complete);
        assert!(session.current().is_none());
        assert!(!session.reveal());
        assert!(rate(&mut session, &mut store, Rating::Good).is_none());

        let summary = session.summary();
        assert_eq!(summary.reviewed, 2);
        assert_eq!(summary.unique_reviewed, 2);
        assert_eq!(summary.confidence, 1.0);
        assert_eq!(store.meta.total_reviews, 2);
        assert_eq!(store.meta.reviews_on(today()), 2);
    }

    #[test]
    fn test_again_comes_back_later() {
        let mut session = session(&["a", "b", "c", "d", "e", "f", "g"]);
        let mut store = ProgressStore::new();

        rate(&mut session, &mut store, Rating::Again).unwrap();
        assert_eq!(session.len(), 8);
        let pos = session.queue().iter().rposition(|id| id == "a").unwrap();
        assert!((3..=5).contains(&pos));
        assert_eq!(store.cards["a"].lapse_count, 1);
    }

    #[test]
    fn test_hard_goes_to_end() {
        let mut session = session(&["a", "b", "c"]);
        let mut store = ProgressStore::new();
        rate(&mut session, &mut store, Rating::Hard).unwrap();
        assert_eq!(session.queue(), &["a", "b", "c", "a"]);
        assert_eq!(session.current(), Some("b"));
    }

    #[test]
    fn test_undo_restores_everything() {
        let mut session = session(&["a", "b", "c", "d", "e"]);
        let mut store = ProgressStore::new();
        rate(&mut session, &mut store, Rating::Good).unwrap();

        let queue_before = session.queue().to_vec();
        let store_before = store.clone();
        let summary_before = session.summary();

        rate(&mut session, &mut store, Rating::Again).unwrap();
        assert_ne!(session.queue(), queue_before.as_slice());

        assert_eq!(session.undo(&mut store).as_deref(), Some("b"));
        assert_eq!(session.queue(), queue_before.as_slice());
        assert_eq!(session.position(), 1);
        assert!(session.is_revealed());
        assert_eq!(session.summary(), summary_before);
        assert_eq!(store, store_before);
        assert!(store.is_new("b"));

        assert_eq!(session.undo(&mut store).as_deref(), Some("a"));
        assert_eq!(store, ProgressStore::new());
        assert!(session.undo(&mut store).is_none());
        assert!(!session.can_undo());
    }

    #[test]
    fn test_preview_for_current_card() {
        let session = session(&["a"]);
        let store = ProgressStore::new();
        let preview = session.preview(&store, now()).unwrap();
        assert_eq!(preview, IntervalPreview { again: 1, hard: 2, good: 1, easy: 3 });
    }

    #[test]
    fn test_empty_session_is_complete() {
        let session = session(&[]);
        assert!(session.is_complete());
        assert!(session.is_empty());
        assert!(session.preview(&ProgressStore::new(), now()).is_none());
        assert_eq!(session.summary().confidence, 0.0);
    }
}

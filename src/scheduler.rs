// src/scheduler.rs
// Contains the logic for the spaced repetition system.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StudyError;
use crate::progress::{CardProgress, MIN_EASE};

const AGAIN_EASE_PENALTY: f64 = 0.2;
const HARD_EASE_PENALTY: f64 = 0.15;
const EASY_EASE_BONUS: f64 = 0.15;
const HARD_INTERVAL_FACTOR: f64 = 1.2;
const EASY_INTERVAL_FACTOR: f64 = 1.25;
/// Longest interval ever scheduled, about a hundred years.
pub const MAX_INTERVAL_DAYS: u32 = 36_500;

/// Represents the user's rating for a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Again,
    Hard,
    Good,
    Easy,
}

impl Rating {
    pub const ALL: [Rating; 4] = [Rating::Again, Rating::Hard, Rating::Good, Rating::Easy];

    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::Again => "again",
            Rating::Hard => "hard",
            Rating::Good => "good",
            Rating::Easy => "easy",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rating {
    type Err = StudyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "again" => Ok(Rating::Again),
            "hard" => Ok(Rating::Hard),
            "good" => Ok(Rating::Good),
            "easy" => Ok(Rating::Easy),
            other => Err(StudyError::UnknownRating(other.to_string())),
        }
    }
}

/// The interval, in days, each rating would produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalPreview {
    pub again: u32,
    pub hard: u32,
    pub good: u32,
    pub easy: u32,
}

impl IntervalPreview {
    pub fn get(&self, rating: Rating) -> u32 {
        match rating {
            Rating::Again => self.again,
            Rating::Hard => self.hard,
            Rating::Good => self.good,
            Rating::Easy => self.easy,
        }
    }
}

/// A trait defining the core behavior of any scheduling algorithm.
pub trait Scheduler {
    /// Computes the progress that follows `rating`. The input is left untouched.
    fn schedule_next(&self, progress: &CardProgress, rating: Rating, now: DateTime<Utc>) -> CardProgress;

    /// What each rating would do, without committing anything.
    fn preview_intervals(&self, progress: &CardProgress, now: DateTime<Utc>) -> IntervalPreview {
        IntervalPreview {
            again: self.schedule_next(progress, Rating::Again, now).interval_days,
            hard: self.schedule_next(progress, Rating::Hard, now).interval_days,
            good: self.schedule_next(progress, Rating::Good, now).interval_days,
            easy: self.schedule_next(progress, Rating::Easy, now).interval_days,
        }
    }
}

/// An SM-2 style scheduler with a four-button ladder.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sm2Scheduler;

fn ceil_days(value: f64) -> u32 {
    let days = value.ceil();
    if days.is_nan() || days < 0.0 {
        return 0;
    }
    days.min(MAX_INTERVAL_DAYS as f64) as u32
}

impl Scheduler for Sm2Scheduler {
    fn schedule_next(&self, progress: &CardProgress, rating: Rating, now: DateTime<Utc>) -> CardProgress {
        let mut next = progress.clone();
        next.last_reviewed_at = Some(now);
        next.seen_count += 1;

        match rating {
            Rating::Again => {
                next.repetitions = 0;
                next.interval_days = 1;
                next.ease = (progress.ease - AGAIN_EASE_PENALTY).max(MIN_EASE);
                next.lapse_count += 1;
                next.hard_count += 1;
            }
            Rating::Hard => {
                next.repetitions += 1;
                next.interval_days = if progress.interval_days <= 1 {
                    2
                } else {
                    ceil_days(progress.interval_days as f64 * HARD_INTERVAL_FACTOR)
                };
                next.ease = (progress.ease - HARD_EASE_PENALTY).max(MIN_EASE);
                next.correct_count += 1;
                next.hard_count += 1;
            }
            Rating::Good => {
                next.repetitions += 1;
                next.interval_days = match next.repetitions {
                    1 => 1,
                    2 => 3,
                    _ => ceil_days(progress.interval_days as f64 * progress.ease),
                };
                next.correct_count += 1;
            }
            Rating::Easy => {
                next.repetitions += 1;
                next.interval_days = if next.repetitions == 1 {
                    3
                } else {
                    ceil_days(progress.interval_days as f64 * progress.ease * EASY_INTERVAL_FACTOR)
                };
                next.ease = progress.ease + EASY_EASE_BONUS;
                next.correct_count += 1;
            }
        }

        next.interval_days = next.interval_days.min(MAX_INTERVAL_DAYS);
        // Out-of-range dates become `None`, which reads as due.
        next.due_at = now.checked_add_signed(Duration::days(next.interval_days as i64));
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn progress_with(repetitions: u32, interval_days: u32, ease: f64) -> CardProgress {
        let mut progress = CardProgress::new(now());
        progress.repetitions = repetitions;
        progress.interval_days = interval_days;
        progress.ease = ease;
        progress
    }

    #[test]
    fn test_again_increments_lapse_and_hard_count() {
        let next = Sm2Scheduler.schedule_next(&CardProgress::new(now()), Rating::Again, now());
        assert_eq!(next.interval_days, 1);
        assert_eq!(next.repetitions, 0);
        assert_eq!(next.lapse_count, 1);
        assert_eq!(next.hard_count, 1);
        assert_eq!(next.correct_count, 0);
        assert_eq!(next.seen_count, 1);
        assert!((next.ease - 2.3).abs() < 1e-9);
        assert_eq!(next.last_reviewed_at, Some(now()));
        assert_eq!(next.due_at, Some(now() + Duration::days(1)));
    }

    #[test]
    fn test_again_respects_ease_floor() {
        for ease in [1.3, 1.35, 1.5, 2.0, 2.5, 3.7] {
            let next = Sm2Scheduler.schedule_next(&progress_with(6, 40, ease), Rating::Again, now());
            assert!(next.ease >= MIN_EASE, "ease {} dropped to {}", ease, next.ease);
            assert_eq!(next.interval_days, 1);
            assert_eq!(next.repetitions, 0);
        }
    }

    #[test]
    fn test_hard_sets_minimum_interval_and_hard_count() {
        let next = Sm2Scheduler.schedule_next(&progress_with(0, 1, 2.5), Rating::Hard, now());
        assert_eq!(next.interval_days, 2);
        assert_eq!(next.repetitions, 1);
        assert_eq!(next.hard_count, 1);
        assert_eq!(next.correct_count, 1);
        assert!((next.ease - 2.35).abs() < 1e-9);

        let next = Sm2Scheduler.schedule_next(&progress_with(3, 5, 1.35), Rating::Hard, now());
        assert_eq!(next.interval_days, 6);
        assert_eq!(next.ease, MIN_EASE);
    }

    #[test]
    fn test_good_ladder() {
        let first = Sm2Scheduler.schedule_next(&CardProgress::new(now()), Rating::Good, now());
        assert_eq!((first.repetitions, first.interval_days), (1, 1));

        let second = Sm2Scheduler.schedule_next(&first, Rating::Good, now());
        assert_eq!((second.repetitions, second.interval_days), (2, 3));

        let third = Sm2Scheduler.schedule_next(&second, Rating::Good, now());
        // ceil(3 * 2.5)
        assert_eq!((third.repetitions, third.interval_days), (3, 8));
        assert_eq!(third.ease, 2.5);
        assert_eq!(third.due_at, Some(now() + Duration::days(8)));
    }

    #[test]
    fn test_good_and_easy_do_not_increment_hard_count() {
        let from_good = Sm2Scheduler.schedule_next(&CardProgress::new(now()), Rating::Good, now());
        let from_easy = Sm2Scheduler.schedule_next(&CardProgress::new(now()), Rating::Easy, now());
        assert_eq!(from_good.hard_count, 0);
        assert_eq!(from_easy.hard_count, 0);
        assert_eq!(from_good.correct_count, 1);
        assert_eq!(from_easy.correct_count, 1);
    }

    #[test]
    fn test_easy_twice_from_fresh() {
        let first = Sm2Scheduler.schedule_next(&CardProgress::new(now()), Rating::Easy, now());
        assert_eq!(first.interval_days, 3);
        assert_eq!(first.repetitions, 1);
        assert!((first.ease - 2.65).abs() < 1e-9);

        let second = Sm2Scheduler.schedule_next(&first, Rating::Easy, now());
        assert_eq!(second.interval_days, 10);
        assert_eq!(second.repetitions, 2);
        assert!((second.ease - 2.8).abs() < 1e-9);
    }

    #[test]
    fn test_repetitions_follow_rating() {
        let start = progress_with(4, 12, 2.1);
        for rating in [Rating::Hard, Rating::Good, Rating::Easy] {
            assert_eq!(Sm2Scheduler.schedule_next(&start, rating, now()).repetitions, 5);
        }
        assert_eq!(Sm2Scheduler.schedule_next(&start, Rating::Again, now()).repetitions, 0);
    }

    #[test]
    fn test_preview_matches_schedule_and_leaves_input_alone() {
        let progress = progress_with(3, 7, 2.2);
        let before = progress.clone();
        let preview = Sm2Scheduler.preview_intervals(&progress, now());
        assert_eq!(progress, before);

        for rating in Rating::ALL {
            let scheduled = Sm2Scheduler.schedule_next(&progress, rating, now());
            assert_eq!(preview.get(rating), scheduled.interval_days);
        }
    }

    #[test]
    fn test_long_easy_streak_caps_interval() {
        let mut progress = CardProgress::new(now());
        for _ in 0..40 {
            progress = Sm2Scheduler.schedule_next(&progress, Rating::Easy, now());
        }
        assert_eq!(progress.repetitions, 40);
        assert_eq!(progress.interval_days, MAX_INTERVAL_DAYS);
        assert_eq!(progress.due_at, Some(now() + Duration::days(MAX_INTERVAL_DAYS as i64)));

        let hard = Sm2Scheduler.schedule_next(&progress, Rating::Hard, now());
        assert_eq!(hard.interval_days, MAX_INTERVAL_DAYS);
    }

    #[test]
    fn test_due_date_past_calendar_end_is_none() {
        let late = DateTime::<Utc>::MAX_UTC - Duration::days(10);
        let mut progress = CardProgress::new(late);
        progress.repetitions = 5;
        progress.interval_days = 400;
        let next = Sm2Scheduler.schedule_next(&progress, Rating::Good, late);
        assert_eq!(next.due_at, None);
        assert!(next.is_due(late));
    }

    #[test]
    fn test_rating_parsing() {
        assert_eq!("again".parse::<Rating>().unwrap(), Rating::Again);
        assert_eq!("easy".parse::<Rating>().unwrap(), Rating::Easy);
        assert!(matches!("maybe".parse::<Rating>(), Err(StudyError::UnknownRating(s)) if s == "maybe"));
        assert_eq!(Rating::Hard.to_string(), "hard");
    }
}
